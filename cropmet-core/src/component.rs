//! Models that work alongside a weather provider.
//!
//! A [`WeatherModifier`] rewrites the day's weather after the provider has
//! read it and before derived values are computed. A [`DailyComponent`]
//! reads the finished weather once a day and reports named outputs.
//! Both run in the order they were added to the simulation.

use crate::clock::Clock;
use crate::errors::MetResult;
use crate::weather::WeatherProvider;
use crate::zone::Zone;
use std::fmt::Debug;

#[typetag::serde]
pub trait WeatherModifier: Debug + Send + Sync {
    fn name(&self) -> &str;

    /// One-off setup once the provider is open.
    fn on_start_of_simulation(
        &mut self,
        _weather: &dyn WeatherProvider,
        _zone: &Zone,
    ) -> MetResult<()> {
        Ok(())
    }

    /// Adjust today's weather in place.
    fn on_weather_prepared(
        &mut self,
        weather: &mut dyn WeatherProvider,
        clock: &Clock,
    ) -> MetResult<()>;
}

#[typetag::serde]
pub trait DailyComponent: Debug + Send + Sync {
    fn name(&self) -> &str;

    fn on_start_of_simulation(
        &mut self,
        _weather: &dyn WeatherProvider,
        _zone: &Zone,
    ) -> MetResult<()> {
        Ok(())
    }

    /// Recompute from today's weather.
    fn on_daily_initialisation(
        &mut self,
        weather: &dyn WeatherProvider,
        clock: &Clock,
    ) -> MetResult<()>;

    /// Named values for today, in a stable order.
    fn outputs(&self) -> Vec<(String, f64)>;
}
