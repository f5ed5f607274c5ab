//! Builder for simulations.

use crate::clock::Clock;
use crate::component::{DailyComponent, WeatherModifier};
use crate::errors::{MetError, MetResult};
use crate::weather::WeatherProvider;
use crate::zone::Zone;
use chrono::NaiveDate;

use super::runtime::Simulation;

/// Assemble a simulation from a provider, modifiers and components.
///
/// Modifiers and components keep the order they are added in.
#[derive(Debug, Default)]
pub struct SimulationBuilder {
    period: Option<(NaiveDate, NaiveDate)>,
    zone: Zone,
    weather: Option<Box<dyn WeatherProvider>>,
    modifiers: Vec<Box<dyn WeatherModifier>>,
    components: Vec<Box<dyn DailyComponent>>,
}

impl SimulationBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// First and last simulated days, inclusive.
    pub fn with_period(&mut self, start: NaiveDate, end: NaiveDate) -> &mut Self {
        self.period = Some((start, end));
        self
    }

    pub fn with_zone(&mut self, zone: Zone) -> &mut Self {
        self.zone = zone;
        self
    }

    pub fn with_weather(&mut self, weather: Box<dyn WeatherProvider>) -> &mut Self {
        self.weather = Some(weather);
        self
    }

    pub fn with_modifier(&mut self, modifier: Box<dyn WeatherModifier>) -> &mut Self {
        self.modifiers.push(modifier);
        self
    }

    pub fn with_component(&mut self, component: Box<dyn DailyComponent>) -> &mut Self {
        self.components.push(component);
        self
    }

    /// Build the simulation, leaving the builder empty.
    pub fn build(&mut self) -> MetResult<Simulation> {
        let (start, end) = self.period.ok_or_else(|| MetError::InvalidParameter {
            name: "period".to_string(),
            message: "no start and end date given".to_string(),
        })?;
        let clock = Clock::new(start, end)?;
        let weather = self.weather.take().ok_or(MetError::MissingWeather)?;
        Ok(Simulation::new(
            clock,
            std::mem::take(&mut self.zone),
            weather,
            std::mem::take(&mut self.modifiers),
            std::mem::take(&mut self.components),
        ))
    }
}
