//! Models that adjust or consume the daily weather produced by a
//! [`cropmet_core::weather::WeatherProvider`].
//!
//! - [`SlopeEffectsOnWeather`] corrects radiation and temperature for sloping ground
//! - [`CO2Value`] replaces CO2 with yearly values from a table
//! - [`SubDailyInterpolation`] evaluates responses at sub-daily resolution

pub mod co2_value;
pub mod slope_effects;
pub mod subdaily;

pub use co2_value::CO2Value;
pub use slope_effects::{SlopeEffectsOnWeather, SlopeEffectsParameters};
pub use subdaily::{
    Aggregation, HourlyRadiation, HourlySinPpAdjusted, InterpolationMethod, SubDailyInputs,
    SubDailyInterpolation, SubdailyDeWit, ThreeHourSin, XYPairs,
};
