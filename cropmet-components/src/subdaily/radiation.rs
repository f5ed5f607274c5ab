use super::{InterpolationMethod, SubDailyInputs};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Hourly share of the day's radiation.
///
/// Radiation follows a half sine between sunrise and sunset (sun on the
/// horizon). Each hour receives the integral of that curve over the part of
/// the hour that is daylight, so hours straddling sunrise or sunset are
/// weighted by their sunlit fraction. The 24 values sum to the daily total.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct HourlyRadiation {}

impl HourlyRadiation {
    /// Unnormalised radiation received between `from` and `to` hours.
    fn sunlit_integral(sunrise: f64, day_length: f64, from: f64, to: f64) -> f64 {
        let sunset = sunrise + day_length;
        let start = from.max(sunrise);
        let end = to.min(sunset);
        if end <= start {
            return 0.0;
        }
        let phase = |t: f64| (PI * (t - sunrise) / day_length).cos();
        day_length / PI * (phase(start) - phase(end))
    }
}

#[typetag::serde]
impl InterpolationMethod for HourlyRadiation {
    fn interpolate(&self, inputs: &SubDailyInputs) -> Vec<f64> {
        let day_length = inputs.solar_day_length.clamp(0.0, 24.0);
        if day_length <= 0.0 || inputs.radn <= 0.0 {
            return vec![0.0; 24];
        }
        let sunrise = 12.0 - day_length / 2.0;
        let weights: Vec<f64> = (0..24)
            .map(|h| Self::sunlit_integral(sunrise, day_length, h as f64, h as f64 + 1.0))
            .collect();
        let total: f64 = weights.iter().sum();
        weights.iter().map(|w| inputs.radn * w / total).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn inputs(radn: f64, solar_day_length: f64) -> SubDailyInputs {
        SubDailyInputs {
            max_t: 25.0,
            min_t: 10.0,
            radn,
            yesterday_max_t: 25.0,
            yesterday_min_t: 10.0,
            tomorrow_min_t: 10.0,
            day_length: solar_day_length + 1.0,
            sunrise: 12.0 - (solar_day_length + 1.0) / 2.0,
            sunset: 12.0 + (solar_day_length + 1.0) / 2.0,
            solar_day_length,
        }
    }

    #[test]
    fn hours_sum_to_daily_total() {
        for day_length in [9.3, 12.0, 15.75] {
            let hourly = HourlyRadiation {}.interpolate(&inputs(22.0, day_length));
            assert_eq!(hourly.len(), 24);
            assert_relative_eq!(hourly.iter().sum::<f64>(), 22.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn dark_hours_get_nothing() {
        let hourly = HourlyRadiation {}.interpolate(&inputs(22.0, 10.0));
        // Sun is up from 07:00 to 17:00.
        assert!(hourly[..7].iter().all(|&r| r == 0.0));
        assert!(hourly[17..].iter().all(|&r| r == 0.0));
        assert_relative_eq!(hourly[11], hourly[12], epsilon = 1e-12);
        assert!(hourly[11] > hourly[7]);
    }

    #[test]
    fn partial_hours_are_weighted() {
        // Sunrise at 07:30.
        let hourly = HourlyRadiation {}.interpolate(&inputs(20.0, 9.0));
        assert!(hourly[7] > 0.0);
        assert!(hourly[7] < hourly[8]);
        assert_eq!(hourly[6], 0.0);
    }

    #[test]
    fn polar_night() {
        assert_eq!(HourlyRadiation {}.interpolate(&inputs(5.0, 0.0)), vec![0.0; 24]);
    }
}
