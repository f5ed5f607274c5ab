//! Weather providers
//!
//! A provider supplies one [`DailyWeather`] per simulated day. The
//! [`Simulation`](crate::model::Simulation) drives every provider through the
//! same daily protocol:
//!
//! 1. [`WeatherProvider::prepare_weather`] reads the day and copies the
//!    primary fields into [`WeatherProvider::weather`].
//! 2. Weather modifiers (slope correction, CO2 override) mutate those fields.
//! 3. [`WeatherProvider::finalise_weather`] fills any derived field that is
//!    still unset and runs the sanity checks.
//!
//! The file-backed variants are [`Weather`] (cached, with seasons) and
//! [`SimpleWeather`] (rolling three-day window). [`WeatherSampler`] replays
//! whole years of a file and [`ControlledEnvironment`] takes user-set values.

mod controlled;
mod file_weather;
mod sampler;
mod seasons;
mod simple;

pub use controlled::ControlledEnvironment;
pub use file_weather::Weather;
pub use sampler::{generate_sequence, SamplingMethod, WeatherSampler};
pub use seasons::{SeasonEvent, Seasons};
pub use simple::SimpleWeather;

use crate::clock::Clock;
use crate::errors::{MetError, MetResult};
use crate::met::record::DailyRecord;
use crate::met::utilities;
use crate::zone::Zone;
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

/// AMP above which a provider warns that the value looks wrong (oC).
pub const MAX_PLAUSIBLE_AMP: f64 = 20.0;

/// Upper bound on daily radiation accepted by the sanity checks (MJ/m2/d).
pub const MAX_RADIATION: f64 = 40.0;

/// The day's weather as seen by the rest of the simulation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyWeather {
    pub date: NaiveDate,
    /// Maximum air temperature (oC)
    pub max_t: f64,
    /// Minimum air temperature (oC)
    pub min_t: f64,
    /// Solar radiation (MJ/m2/d)
    pub radn: f64,
    /// Rainfall (mm)
    pub rain: f64,
    /// Wind speed (m/s)
    pub wind: f64,
    /// Atmospheric CO2 concentration (ppm)
    pub co2: f64,
    /// Mean air temperature (oC)
    pub mean_t: Option<f64>,
    /// Vapour pressure (hPa)
    pub vp: Option<f64>,
    /// Air pressure (hPa)
    pub air_pressure: Option<f64>,
    /// Fraction of radiation that is diffuse (0-1)
    pub diffuse_fraction: Option<f64>,
    /// Day length from the file (h). Computed from latitude when `None`.
    pub day_length: Option<f64>,
    pub pan_evap: Option<f64>,
    pub rainfall_hours: Option<f64>,
    pub pet: Option<f64>,
    pub pot_soil_evap: Option<f64>,
    pub actual_soil_evap: Option<f64>,
    /// Vapour pressure deficit (hPa)
    pub vpd: f64,
}

impl Default for DailyWeather {
    fn default() -> Self {
        Self {
            date: NaiveDate::MIN,
            max_t: 0.0,
            min_t: 0.0,
            radn: 0.0,
            rain: 0.0,
            wind: 0.0,
            co2: 0.0,
            mean_t: None,
            vp: None,
            air_pressure: None,
            diffuse_fraction: None,
            day_length: None,
            pan_evap: None,
            rainfall_hours: None,
            pet: None,
            pot_soil_evap: None,
            actual_soil_evap: None,
            vpd: 0.0,
        }
    }
}

impl DailyWeather {
    /// Copy the fields of a record, using `co2_default` when it has no CO2.
    pub fn from_record(record: &DailyRecord, co2_default: f64) -> Self {
        Self {
            date: record.date,
            max_t: record.max_t,
            min_t: record.min_t,
            radn: record.radn,
            rain: record.rain,
            wind: record.wind,
            co2: record.co2.unwrap_or(co2_default),
            mean_t: record.mean_t,
            vp: record.vp,
            air_pressure: record.air_pressure,
            diffuse_fraction: record.diffuse_fraction,
            day_length: record.day_length,
            pan_evap: record.pan_evap,
            rainfall_hours: record.rainfall_hours,
            pet: record.pet,
            pot_soil_evap: record.pot_soil_evap,
            actual_soil_evap: record.actual_soil_evap,
            vpd: 0.0,
        }
    }

    /// Fill the second-order fields that are still unset and compute VPD.
    pub fn derive(&mut self, latitude: f64, altitude: f64) {
        if self.mean_t.is_none() {
            self.mean_t = Some((self.min_t + self.max_t) / 2.0);
        }
        if self.diffuse_fraction.is_none() {
            self.diffuse_fraction = Some(utilities::diffuse_fraction(
                self.date.ordinal(),
                latitude,
                self.radn,
            ));
        }
        if self.vp.is_none() {
            self.vp = Some(utilities::svp(self.min_t).max(0.0));
        }
        if self.air_pressure.is_none() {
            self.air_pressure = Some(utilities::air_pressure(altitude));
        }
        self.vpd = utilities::vpd(self.vp(), self.min_t, self.max_t);
    }

    pub fn mean_t(&self) -> f64 {
        self.mean_t.unwrap_or((self.min_t + self.max_t) / 2.0)
    }

    /// Vapour pressure, saturated at the minimum temperature when unknown.
    pub fn vp(&self) -> f64 {
        self.vp.unwrap_or_else(|| utilities::svp(self.min_t).max(0.0))
    }

    /// Messages describing any implausible value.
    pub fn sanity_check(&self) -> Vec<String> {
        let mut messages = Vec::new();
        if self.min_t > self.max_t {
            messages.push(format!(
                "Minimum temperature ({}) is greater than maximum temperature ({})",
                self.min_t, self.max_t
            ));
        }
        if self.radn < 0.0 {
            messages.push(format!("Radiation ({}) is negative", self.radn));
        }
        if self.radn > MAX_RADIATION {
            messages.push(format!(
                "Radiation ({}) is greater than {MAX_RADIATION}",
                self.radn
            ));
        }
        if self.rain < 0.0 {
            messages.push(format!("Rainfall ({}) is negative", self.rain));
        }
        if let Some(vp) = self.vp.filter(|vp| *vp <= 0.0) {
            messages.push(format!("Vapour pressure ({vp}) is not positive"));
        }
        messages
    }
}

/// What a provider does with implausible daily values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SanityCheckPolicy {
    /// Report the problems and carry on.
    #[default]
    Warn,
    /// Stop the simulation.
    Fail,
}

/// Run the sanity checks of `weather` under `policy`.
///
/// Returns the warnings to report, or an error when the policy is
/// [`SanityCheckPolicy::Fail`] and any check failed.
pub fn apply_sanity(policy: SanityCheckPolicy, weather: &DailyWeather) -> MetResult<Vec<String>> {
    let messages = weather.sanity_check();
    match policy {
        SanityCheckPolicy::Fail if !messages.is_empty() => Err(MetError::SanityCheck {
            date: weather.date,
            message: messages.join("; "),
        }),
        _ => Ok(messages),
    }
}

/// A source of daily weather.
#[typetag::serde]
pub trait WeatherProvider: Debug + Send + Sync {
    fn name(&self) -> &str;

    /// Reset any state left from a previous run.
    fn on_commencing(&mut self, _clock: &Clock) -> MetResult<()> {
        Ok(())
    }

    /// Open sources and check the configuration before the first day.
    fn on_start_of_simulation(&mut self, clock: &Clock, zone: &Zone) -> MetResult<()>;

    /// Read today's weather into [`WeatherProvider::weather`].
    fn prepare_weather(&mut self, clock: &Clock) -> MetResult<()>;

    /// Compute derived values after modifiers have run.
    ///
    /// Returns sanity-check warnings for the day.
    fn finalise_weather(&mut self, clock: &Clock, zone: &Zone) -> MetResult<Vec<String>>;

    fn on_start_of_day(&mut self, _clock: &Clock) -> Vec<SeasonEvent> {
        Vec::new()
    }

    fn on_end_of_day(&mut self, _clock: &Clock) -> Vec<SeasonEvent> {
        Vec::new()
    }

    /// Release sources at the end of a run.
    fn on_completed(&mut self) {}

    fn weather(&self) -> &DailyWeather;

    fn weather_mut(&mut self) -> &mut DailyWeather;

    fn yesterday(&self) -> Option<&DailyRecord> {
        None
    }

    fn tomorrow(&self) -> Option<&DailyRecord> {
        None
    }

    /// Latitude (decimal degrees, negative south)
    fn latitude(&self) -> f64;

    fn longitude(&self) -> f64 {
        0.0
    }

    /// Annual average ambient temperature (oC)
    fn tav(&mut self) -> MetResult<f64>;

    /// Annual amplitude in mean monthly temperature (oC)
    fn amp(&mut self) -> MetResult<f64>;

    /// Day length (h) for a sun angle below the horizon (degrees).
    ///
    /// A day length read from the source is used as is.
    fn calculate_day_length(&self, twilight: f64) -> f64 {
        let weather = self.weather();
        weather.day_length.unwrap_or_else(|| {
            utilities::day_length(weather.date.ordinal(), twilight, self.latitude())
        })
    }

    /// Hour of sunrise, assuming the day is symmetric about noon.
    fn calculate_sunrise(&self) -> f64 {
        utilities::sunrise(self.calculate_day_length(utilities::CIVIL_TWILIGHT))
    }

    /// Hour of sunset, assuming the day is symmetric about noon.
    fn calculate_sunset(&self) -> f64 {
        utilities::sunset(self.calculate_day_length(utilities::CIVIL_TWILIGHT))
    }

    /// Today's value of a named source column.
    fn value(&self, column: &str) -> MetResult<f64> {
        Err(MetError::UnknownColumn(column.to_string()))
    }

    /// Human readable warnings about the configuration.
    fn validate(&mut self) -> Vec<String> {
        match self.amp() {
            Ok(amp) if amp > MAX_PLAUSIBLE_AMP => vec![format!(
                "The value of Weather.AMP ({amp}) is > {MAX_PLAUSIBLE_AMP} oC. Please check the value."
            )],
            _ => Vec::new(),
        }
    }
}
