//! Sub-daily interpolation
//!
//! Some physiological responses are strongly non-linear in temperature or
//! radiation, so applying them to daily means gives the wrong answer. An
//! [`InterpolationMethod`] expands the day's aggregates into a set of
//! sub-daily values. [`SubDailyInterpolation`] applies a response to each
//! value and reduces the results to a single daily output.

mod radiation;
mod response;
mod temperature;

pub use radiation::HourlyRadiation;
pub use response::XYPairs;
pub use temperature::{HourlySinPpAdjusted, SubdailyDeWit, ThreeHourSin};

use cropmet_core::clock::Clock;
use cropmet_core::component::DailyComponent;
use cropmet_core::errors::MetResult;
use cropmet_core::met::utilities::CIVIL_TWILIGHT;
use cropmet_core::weather::WeatherProvider;
use cropmet_core::zone::Zone;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use tracing::debug;

/// Daily aggregates an interpolation method may use.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SubDailyInputs {
    pub max_t: f64,
    pub min_t: f64,
    /// Daily radiation (MJ/m2)
    pub radn: f64,
    pub yesterday_max_t: f64,
    pub yesterday_min_t: f64,
    pub tomorrow_min_t: f64,
    /// Day length including civil twilight (h)
    pub day_length: f64,
    pub sunrise: f64,
    pub sunset: f64,
    /// Hours the sun is above the horizon.
    pub solar_day_length: f64,
}

impl SubDailyInputs {
    /// Today's values from a provider.
    ///
    /// Neighbouring days fall back to today at the ends of the record.
    pub fn from_provider(weather: &dyn WeatherProvider) -> Self {
        let today = weather.weather();
        let yesterday = weather.yesterday();
        let tomorrow = weather.tomorrow();
        Self {
            max_t: today.max_t,
            min_t: today.min_t,
            radn: today.radn,
            yesterday_max_t: yesterday.map_or(today.max_t, |r| r.max_t),
            yesterday_min_t: yesterday.map_or(today.min_t, |r| r.min_t),
            tomorrow_min_t: tomorrow.map_or(today.min_t, |r| r.min_t),
            day_length: weather.calculate_day_length(CIVIL_TWILIGHT),
            sunrise: weather.calculate_sunrise(),
            sunset: weather.calculate_sunset(),
            solar_day_length: weather.calculate_day_length(0.0),
        }
    }
}

#[typetag::serde]
pub trait InterpolationMethod: Debug + Send + Sync {
    /// Sub-daily values for one day, in time order.
    fn interpolate(&self, inputs: &SubDailyInputs) -> Vec<f64>;
}

/// How the sub-daily responses become one daily value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Aggregation {
    Sum,
    #[default]
    Average,
}

impl Aggregation {
    pub fn reduce(&self, values: &[f64]) -> f64 {
        let total: f64 = values.iter().sum();
        match self {
            Aggregation::Sum => total,
            Aggregation::Average if values.is_empty() => 0.0,
            Aggregation::Average => total / values.len() as f64,
        }
    }
}

/// Daily value of a response evaluated at sub-daily resolution.
///
/// The response is the identity when none is given, so the output is then
/// the sum or mean of the interpolated values themselves.
#[derive(Debug, Serialize, Deserialize)]
pub struct SubDailyInterpolation {
    /// Name of the daily output.
    pub name: String,
    pub method: Box<dyn InterpolationMethod>,
    #[serde(default)]
    pub response: Option<XYPairs>,
    #[serde(default)]
    pub aggregation: Aggregation,
    #[serde(skip)]
    sub_daily: Vec<f64>,
    #[serde(skip)]
    responses: Vec<f64>,
    #[serde(skip)]
    value: f64,
}

impl SubDailyInterpolation {
    pub fn new(name: &str, method: Box<dyn InterpolationMethod>) -> Self {
        Self {
            name: name.to_string(),
            method,
            response: None,
            aggregation: Aggregation::default(),
            sub_daily: Vec::new(),
            responses: Vec::new(),
            value: 0.0,
        }
    }

    pub fn with_response(mut self, response: XYPairs) -> Self {
        self.response = Some(response);
        self
    }

    pub fn with_aggregation(mut self, aggregation: Aggregation) -> Self {
        self.aggregation = aggregation;
        self
    }

    /// Interpolated values for today.
    pub fn sub_daily(&self) -> &[f64] {
        &self.sub_daily
    }

    /// Response at each sub-daily value.
    pub fn responses(&self) -> &[f64] {
        &self.responses
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    /// Interpolate, apply the response and reduce.
    pub fn calculate(&mut self, inputs: &SubDailyInputs) -> f64 {
        self.sub_daily = self.method.interpolate(inputs);
        self.responses = match &self.response {
            Some(response) => self.sub_daily.iter().map(|&x| response.value_at(x)).collect(),
            None => self.sub_daily.clone(),
        };
        self.value = self.aggregation.reduce(&self.responses);
        self.value
    }
}

#[typetag::serde]
impl DailyComponent for SubDailyInterpolation {
    fn name(&self) -> &str {
        &self.name
    }

    fn on_start_of_simulation(&mut self, _weather: &dyn WeatherProvider, _zone: &Zone) -> MetResult<()> {
        match &self.response {
            Some(response) => response.check(),
            None => Ok(()),
        }
    }

    fn on_daily_initialisation(
        &mut self,
        weather: &dyn WeatherProvider,
        clock: &Clock,
    ) -> MetResult<()> {
        let value = self.calculate(&SubDailyInputs::from_provider(weather));
        debug!(date = %clock.today(), name = %self.name, value, "Sub-daily interpolation");
        Ok(())
    }

    fn outputs(&self) -> Vec<(String, f64)> {
        vec![(self.name.clone(), self.value)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aggregation() {
        let values = [1.0, 2.0, 3.0, 6.0];
        assert_eq!(Aggregation::Sum.reduce(&values), 12.0);
        assert_eq!(Aggregation::Average.reduce(&values), 3.0);
        assert_eq!(Aggregation::Average.reduce(&[]), 0.0);
    }

    #[test]
    fn response_is_applied_per_sample() {
        let inputs = SubDailyInputs {
            max_t: 36.0,
            min_t: 20.0,
            radn: 20.0,
            yesterday_max_t: 36.0,
            yesterday_min_t: 20.0,
            tomorrow_min_t: 20.0,
            day_length: 13.0,
            sunrise: 5.5,
            sunset: 18.5,
            solar_day_length: 12.0,
        };
        let response = XYPairs::new(vec![0.0, 26.0, 34.0], vec![0.0, 26.0, 0.0]).unwrap();
        let mut thermal_time =
            SubDailyInterpolation::new("ThermalTime", Box::new(ThreeHourSin {})).with_response(response);
        let value = thermal_time.calculate(&inputs);

        assert_eq!(thermal_time.sub_daily().len(), 8);
        // Periods above the optimum give less than the daily mean would.
        assert!(value < 19.5);
        let mean_response: f64 = thermal_time.responses().iter().sum::<f64>() / 8.0;
        assert_eq!(value, mean_response);
        assert_eq!(thermal_time.outputs(), vec![("ThermalTime".to_string(), value)]);
    }
}
