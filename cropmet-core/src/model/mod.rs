//! A simulation couples one weather provider with the models that modify or
//! consume its output.
//!
//! Each day the simulation fires its events in a fixed order:
//!
//! 1. the provider reads the day ("do weather"),
//! 2. every [`WeatherModifier`](crate::component::WeatherModifier) adjusts it
//!    ("weather prepared"), in the order added,
//! 3. the provider computes derived values and sanity checks them,
//! 4. season starts are raised ("start of day"),
//! 5. every [`DailyComponent`](crate::component::DailyComponent) reads the
//!    finished weather ("daily initialisation"),
//! 6. season ends are raised ("end of day") and the clock moves on.
//!
//! Reordering modifiers changes results, so the order they are added in is kept.

mod builder;
mod runtime;

#[cfg(test)]
mod tests;

pub use builder::SimulationBuilder;
pub use runtime::{DayReport, Simulation};
