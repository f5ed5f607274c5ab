use crate::clock::Clock;
use crate::errors::MetResult;
use crate::weather::{DailyWeather, WeatherProvider};
use crate::zone::Zone;
use serde::{Deserialize, Serialize};

/// Weather set directly by the user, as in a growth chamber.
///
/// Every day gets the same values. Hourly air temperature is a step between
/// the minimum at night and the maximum during the day.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlledEnvironment {
    pub name: String,
    /// Default: 25.0
    pub max_t: f64,
    /// Default: 15.0
    pub min_t: f64,
    /// Default: 0.0
    pub rain: f64,
    /// Default: 20.0
    pub radn: f64,
    /// Default: 15.0
    pub vp: f64,
    /// Default: 3.0
    pub wind: f64,
    /// Default: 350.0
    pub co2: f64,
    /// Default: 1010.0
    pub air_pressure: f64,
    /// Photoperiod (h). Computed from the latitude when unset.
    pub day_length: Option<f64>,
    /// Default: 0.0
    pub latitude: f64,
    /// Default: 0.0
    pub longitude: f64,
    /// Default: 20.0
    pub tav: f64,
    /// Default: 10.0
    pub amp: f64,
    /// Hours after sunrise before the day temperature applies.
    ///
    /// Default: 0.0
    pub lag: f64,

    #[serde(skip)]
    current: DailyWeather,
}

impl Default for ControlledEnvironment {
    fn default() -> Self {
        Self {
            name: "ControlledEnvironment".to_string(),
            max_t: 25.0,
            min_t: 15.0,
            rain: 0.0,
            radn: 20.0,
            vp: 15.0,
            wind: 3.0,
            co2: 350.0,
            air_pressure: 1010.0,
            day_length: None,
            latitude: 0.0,
            longitude: 0.0,
            tav: 20.0,
            amp: 10.0,
            lag: 0.0,
            current: DailyWeather::default(),
        }
    }
}

impl ControlledEnvironment {
    pub fn new(max_t: f64, min_t: f64) -> Self {
        Self {
            max_t,
            min_t,
            ..Default::default()
        }
    }

    pub fn with_latitude(mut self, latitude: f64) -> Self {
        self.latitude = latitude;
        self
    }

    pub fn with_radiation(mut self, radn: f64) -> Self {
        self.radn = radn;
        self
    }

    pub fn with_rain(mut self, rain: f64) -> Self {
        self.rain = rain;
        self
    }

    pub fn with_vapour_pressure(mut self, vp: f64) -> Self {
        self.vp = vp;
        self
    }

    /// Air temperature for each hour of today, hour `h` ending at `h + 1`.
    pub fn hourly_temperatures(&self) -> Vec<f64> {
        let sunrise = self.calculate_sunrise();
        let sunset = self.calculate_sunset();
        (0..24)
            .map(|h| {
                let hour = h as f64;
                if hour <= sunrise + self.lag || hour > sunset {
                    self.current.min_t
                } else {
                    self.current.max_t
                }
            })
            .collect()
    }
}

#[typetag::serde]
impl WeatherProvider for ControlledEnvironment {
    fn name(&self) -> &str {
        &self.name
    }

    fn on_start_of_simulation(&mut self, _clock: &Clock, _zone: &Zone) -> MetResult<()> {
        Ok(())
    }

    fn prepare_weather(&mut self, clock: &Clock) -> MetResult<()> {
        self.current = DailyWeather {
            date: clock.today(),
            max_t: self.max_t,
            min_t: self.min_t,
            radn: self.radn,
            rain: self.rain,
            wind: self.wind,
            co2: self.co2,
            vp: Some(self.vp),
            air_pressure: Some(self.air_pressure),
            day_length: self.day_length,
            ..Default::default()
        };
        Ok(())
    }

    fn finalise_weather(&mut self, _clock: &Clock, zone: &Zone) -> MetResult<Vec<String>> {
        self.current.derive(self.latitude, zone.altitude);
        Ok(self.current.sanity_check())
    }

    fn weather(&self) -> &DailyWeather {
        &self.current
    }

    fn weather_mut(&mut self) -> &mut DailyWeather {
        &mut self.current
    }

    fn latitude(&self) -> f64 {
        self.latitude
    }

    fn longitude(&self) -> f64 {
        self.longitude
    }

    fn tav(&mut self) -> MetResult<f64> {
        Ok(self.tav)
    }

    fn amp(&mut self) -> MetResult<f64> {
        Ok(self.amp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn prepared(env: &mut ControlledEnvironment) {
        let day = NaiveDate::from_ymd_opt(2022, 3, 21).unwrap();
        let clock = Clock::new(day, day).unwrap();
        env.prepare_weather(&clock).unwrap();
        env.finalise_weather(&clock, &Zone::default()).unwrap();
    }

    #[test]
    fn hourly_step_follows_day_length() {
        let mut env = ControlledEnvironment {
            day_length: Some(12.0),
            ..Default::default()
        };
        prepared(&mut env);
        let hourly = env.hourly_temperatures();
        // Sunrise at 6, sunset at 18.
        assert_eq!(hourly[6], 15.0);
        assert_eq!(hourly[7], 25.0);
        assert_eq!(hourly[18], 25.0);
        assert_eq!(hourly[19], 15.0);
        assert_eq!(hourly.iter().filter(|t| **t == 25.0).count(), 12);

        env.lag = 2.0;
        assert_eq!(env.hourly_temperatures()[8], 15.0);
        assert_eq!(env.hourly_temperatures()[9], 25.0);
    }

    #[test]
    fn constructed_values_are_the_day() {
        let mut env = ControlledEnvironment::new(12.0, 2.0)
            .with_latitude(-40.0)
            .with_radiation(8.0)
            .with_rain(4.0)
            .with_vapour_pressure(7.0);
        prepared(&mut env);
        let weather = env.weather();
        assert_eq!(weather.max_t, 12.0);
        assert_eq!(weather.min_t, 2.0);
        assert_eq!(weather.radn, 8.0);
        assert_eq!(weather.rain, 4.0);
        assert_eq!(weather.vp, Some(7.0));
        assert_eq!(env.latitude(), -40.0);
        assert_eq!(weather.wind, 3.0);
    }

    #[test]
    fn user_values_are_the_day() {
        let mut env = ControlledEnvironment::default();
        prepared(&mut env);
        let weather = env.weather();
        assert_eq!(weather.mean_t, Some(20.0));
        assert_eq!(weather.vp, Some(15.0));
        assert_eq!(weather.air_pressure, Some(1010.0));
        assert!(env.calculate_day_length(-6.0) > 12.0);
        assert!(env.validate().is_empty());
    }
}
