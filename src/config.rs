//! TOML description of a simulation.
//!
//! ```toml
//! start = "2020-01-01"
//! end = "2020-12-31"
//! output = "daily.csv"
//!
//! [zone]
//! name = "Paddock"
//! slope = 12.0
//! aspect = 0.0
//!
//! [weather.Weather]
//! file_name = "dalby.met"
//!
//! [[modifiers]]
//! [modifiers.SlopeEffectsOnWeather]
//!
//! [[components]]
//! [components.SubDailyInterpolation]
//! name = "MeanAirT"
//! method = { SubdailyDeWit = {} }
//! ```
//!
//! Models are named by their type, as written by `typetag`. Relative file
//! names are taken relative to the directory of the configuration file when
//! loaded with [`SimulationConfig::from_file`].

use chrono::NaiveDate;
use cropmet_core::component::{DailyComponent, WeatherModifier};
use cropmet_core::errors::{MetError, MetResult};
use cropmet_core::model::{Simulation, SimulationBuilder};
use cropmet_core::weather::WeatherProvider;
use cropmet_core::zone::Zone;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Serialize, Deserialize)]
pub struct SimulationConfig {
    pub start: NaiveDate,
    pub end: NaiveDate,
    #[serde(default)]
    pub zone: Zone,
    pub weather: Box<dyn WeatherProvider>,
    #[serde(default)]
    pub modifiers: Vec<Box<dyn WeatherModifier>>,
    #[serde(default)]
    pub components: Vec<Box<dyn DailyComponent>>,
    /// Where to write the daily report.
    #[serde(default)]
    pub output: Option<PathBuf>,
    /// Directory relative paths are resolved against.
    #[serde(skip)]
    pub base_dir: Option<PathBuf>,
}

impl SimulationConfig {
    pub fn from_toml_str(text: &str) -> MetResult<Self> {
        Ok(toml::from_str(text)?)
    }

    pub fn from_file(path: &Path) -> MetResult<Self> {
        if !path.exists() {
            return Err(MetError::Error(format!(
                "Cannot find configuration file '{}'",
                path.display()
            )));
        }
        let mut config = Self::from_toml_str(&fs::read_to_string(path)?)?;
        config.base_dir = path.canonicalize()?.parent().map(Path::to_path_buf);
        info!(file = %path.display(), "Read configuration");
        Ok(config)
    }

    /// The report path, resolved against the configuration's directory.
    pub fn output_path(&self) -> Option<PathBuf> {
        self.output.as_ref().map(|output| self.resolve(output))
    }

    pub fn resolve(&self, path: &Path) -> PathBuf {
        match &self.base_dir {
            Some(base) if path.is_relative() => base.join(path),
            _ => path.to_path_buf(),
        }
    }

    /// Assemble the simulation this configuration describes.
    ///
    /// Relative paths inside the models are opened from the current
    /// directory, so callers change into [`SimulationConfig::base_dir`] or
    /// give absolute paths.
    pub fn into_simulation(self) -> MetResult<Simulation> {
        let mut builder = SimulationBuilder::new();
        builder
            .with_period(self.start, self.end)
            .with_zone(self.zone)
            .with_weather(self.weather);
        for modifier in self.modifiers {
            builder.with_modifier(modifier);
        }
        for component in self.components {
            builder.with_component(component);
        }
        builder.build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONFIG: &str = r#"
start = "2021-06-01"
end = "2021-06-03"

[zone]
name = "Chamber"

[weather.ControlledEnvironment]
max_t = 28.0
min_t = 12.0
"#;

    #[test]
    fn parse_minimal_config() {
        let config = SimulationConfig::from_toml_str(CONFIG).unwrap();
        assert_eq!(config.zone.name, "Chamber");
        assert_eq!(config.zone.altitude, 50.0);
        assert!(config.modifiers.is_empty());
        assert!(config.output.is_none());

        let mut simulation = config.into_simulation().unwrap();
        let reports = simulation.run().unwrap();
        assert_eq!(reports.len(), 3);
        assert_eq!(reports[2].weather.max_t, 28.0);
    }

    #[test]
    fn bad_toml_is_an_error() {
        assert!(matches!(
            SimulationConfig::from_toml_str("start = "),
            Err(MetError::Toml(_))
        ));
    }

    #[test]
    fn relative_output_follows_config() {
        let mut config = SimulationConfig::from_toml_str(&format!("output = \"out.csv\"\n{CONFIG}")).unwrap();
        config.base_dir = Some(PathBuf::from("/runs"));
        assert_eq!(config.output_path(), Some(PathBuf::from("/runs/out.csv")));
    }
}
