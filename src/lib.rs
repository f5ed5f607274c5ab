//! Daily weather for crop simulations.
//!
//! Re-exports the weather providers of [`cropmet_core`] and the components of
//! [`cropmet_components`], and adds a TOML description of a whole simulation
//! ([`config`]) and a daily CSV report ([`report`]).

pub mod config;
pub mod report;

pub use cropmet_components as components;
pub use cropmet_core as core;

pub use config::SimulationConfig;
pub use report::write_report;
