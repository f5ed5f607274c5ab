//! Sub-daily air temperature
//!
//! Each method turns the day's extremes into a set of evenly spaced
//! temperatures. Sample `i` of `n` is taken at the middle of its period,
//! `(i + 0.5) * 24 / n` hours after midnight, except for [`ThreeHourSin`]
//! whose eight periods follow the fixed weights of its polynomial.

use super::{InterpolationMethod, SubDailyInputs};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

const HOURS_PER_DAY: f64 = 24.0;

fn sample_times(samples: usize) -> impl Iterator<Item = f64> {
    let step = HOURS_PER_DAY / samples as f64;
    (0..samples).map(move |i| (i as f64 + 0.5) * step)
}

/// Eight three-hourly temperatures from a cubic in the period number.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ThreeHourSin {}

impl ThreeHourSin {
    pub const PERIODS: usize = 8;

    /// Fraction of the daily range above MinT in period `p` (1 to 8).
    pub fn factor(p: usize) -> f64 {
        let p = p as f64;
        0.92105 + 0.1140 * p - 0.0703 * p.powi(2) + 0.0053 * p.powi(3)
    }
}

#[typetag::serde]
impl InterpolationMethod for ThreeHourSin {
    fn interpolate(&self, inputs: &SubDailyInputs) -> Vec<f64> {
        let range = inputs.max_t - inputs.min_t;
        (1..=Self::PERIODS)
            .map(|p| inputs.min_t + Self::factor(p) * range)
            .collect()
    }
}

/// Sine rise through the day, exponential fall overnight, with the
/// photoperiod setting the shape (Parton and Logan, 1981).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HourlySinPpAdjusted {
    /// Default: 24
    pub samples: usize,
    /// Hours between solar noon and the temperature peak.
    ///
    /// Default: 1.5
    pub p: f64,
    /// Night time decay coefficient.
    ///
    /// Default: 4.0
    pub tc: f64,
}

impl Default for HourlySinPpAdjusted {
    fn default() -> Self {
        Self {
            samples: 24,
            p: 1.5,
            tc: 4.0,
        }
    }
}

impl HourlySinPpAdjusted {
    /// Temperature at sunset for a day with the given extremes.
    fn sunset_temperature(&self, max_t: f64, min_t: f64, day_length: f64) -> f64 {
        min_t + (max_t - min_t) * (PI * day_length / (day_length + 2.0 * self.p)).sin()
    }

    /// Temperature `hour` hours after midnight.
    pub fn temperature(&self, inputs: &SubDailyInputs, hour: f64) -> f64 {
        let day_length = inputs.day_length.clamp(0.0, HOURS_PER_DAY);
        let night_length = HOURS_PER_DAY - day_length;
        let sunrise = inputs.sunrise;
        let sunset = inputs.sunset;

        if (sunrise..=sunset).contains(&hour) || night_length <= 0.0 {
            let phase = PI * (hour - sunrise) / (day_length + 2.0 * self.p);
            inputs.min_t + (inputs.max_t - inputs.min_t) * phase.sin()
        } else if hour > sunset {
            let start = self.sunset_temperature(inputs.max_t, inputs.min_t, day_length);
            let decay = (-self.tc * (hour - sunset) / night_length).exp();
            inputs.tomorrow_min_t + (start - inputs.tomorrow_min_t) * decay
        } else {
            let start = self.sunset_temperature(
                inputs.yesterday_max_t,
                inputs.yesterday_min_t,
                day_length,
            );
            let decay = (-self.tc * (hour + HOURS_PER_DAY - sunset) / night_length).exp();
            inputs.min_t + (start - inputs.min_t) * decay
        }
    }
}

#[typetag::serde]
impl InterpolationMethod for HourlySinPpAdjusted {
    fn interpolate(&self, inputs: &SubDailyInputs) -> Vec<f64> {
        sample_times(self.samples)
            .map(|hour| self.temperature(inputs, hour))
            .collect()
    }
}

/// Cosine segments joining the minimum at sunrise and the maximum at 14:00
/// (de Wit et al., 1978).
///
/// Before sunrise the curve falls from yesterday's maximum and after the
/// peak it falls towards tomorrow's minimum.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SubdailyDeWit {
    /// Default: 24
    pub samples: usize,
    /// Hour of the maximum temperature.
    ///
    /// Default: 14.0
    pub peak_hour: f64,
}

impl Default for SubdailyDeWit {
    fn default() -> Self {
        Self {
            samples: 24,
            peak_hour: 14.0,
        }
    }
}

impl SubdailyDeWit {
    pub fn temperature(&self, inputs: &SubDailyInputs, hour: f64) -> f64 {
        let peak = self.peak_hour;
        let sunrise = inputs.sunrise.min(peak - 1.0);
        // Hours from the previous peak to sunrise.
        let fall = HOURS_PER_DAY - peak + sunrise;
        let half_cosine = |from: f64, to: f64, phase: f64| {
            to + (from - to) * (1.0 + (PI * phase).cos()) / 2.0
        };

        if hour < sunrise {
            let phase = (hour + HOURS_PER_DAY - peak) / fall;
            half_cosine(inputs.yesterday_max_t, inputs.min_t, phase)
        } else if hour <= peak {
            let phase = (hour - sunrise) / (peak - sunrise);
            half_cosine(inputs.min_t, inputs.max_t, phase)
        } else {
            let phase = (hour - peak) / fall;
            half_cosine(inputs.max_t, inputs.tomorrow_min_t, phase)
        }
    }
}

#[typetag::serde]
impl InterpolationMethod for SubdailyDeWit {
    fn interpolate(&self, inputs: &SubDailyInputs) -> Vec<f64> {
        sample_times(self.samples)
            .map(|hour| self.temperature(inputs, hour))
            .collect()
    }
}
