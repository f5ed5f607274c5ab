//! Atmospheric CO2 from a yearly table
//!
//! Overrides the day's CO2 concentration with the value for the current
//! calendar year, read from a two column csv file:
//!
//! ```text
//! Year,CO2
//! 2019,411.4
//! 2020,413.9
//! ```
//!
//! Header names are matched without regard to case. Each year may appear
//! once. A year missing from the table stops the simulation on the first
//! day it is needed.

use cropmet_core::clock::Clock;
use cropmet_core::component::WeatherModifier;
use cropmet_core::errors::{MetError, MetResult};
use cropmet_core::weather::WeatherProvider;
use cropmet_core::zone::Zone;
use chrono::Datelike;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const YEAR_COLUMN: &str = "year";
const CO2_COLUMN: &str = "co2";

/// Yearly CO2 values keyed by calendar year.
pub type Co2Table = BTreeMap<i32, f64>;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CO2Value {
    /// Path to the Year/CO2 table.
    pub file_name: PathBuf,
    #[serde(skip)]
    values: Co2Table,
}

impl CO2Value {
    pub fn new(file_name: impl Into<PathBuf>) -> Self {
        Self {
            file_name: file_name.into(),
            values: Co2Table::new(),
        }
    }

    /// The values read at the start of the simulation.
    pub fn values(&self) -> &Co2Table {
        &self.values
    }

    /// CO2 concentration (ppm) for a year.
    pub fn value_for(&self, year: i32) -> MetResult<f64> {
        self.values
            .get(&year)
            .copied()
            .ok_or_else(|| MetError::Co2MissingYear {
                file: self.file_name.display().to_string(),
                year,
            })
    }
}

/// Read a Year/CO2 table.
pub fn read_co2_table(path: &Path) -> MetResult<Co2Table> {
    let file = path.display().to_string();
    if !path.exists() {
        return Err(MetError::WeatherFileNotFound(file));
    }
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_path(path)?;

    let headers = reader.headers()?.clone();
    let position = |name: &str| {
        headers
            .iter()
            .position(|h| h.eq_ignore_ascii_case(name))
            .ok_or_else(|| MetError::Co2MissingColumn {
                file: file.clone(),
                column: name.to_string(),
            })
    };
    let year_index = position(YEAR_COLUMN)?;
    let co2_index = position(CO2_COLUMN)?;

    let mut table = Co2Table::new();
    for (i, row) in reader.records().enumerate() {
        let row = row?;
        // Header is line 1.
        let line = i + 2;
        let field = |index: usize, column: &str| {
            let value = row.get(index).unwrap_or("");
            value.parse::<f64>().map_err(|_| MetError::Parse {
                file: file.clone(),
                line,
                column: column.to_string(),
                value: value.to_string(),
            })
        };
        if row.iter().all(str::is_empty) {
            continue;
        }
        let year = field(year_index, "Year")?;
        if year.fract() != 0.0 {
            return Err(MetError::Parse {
                file: file.clone(),
                line,
                column: "Year".to_string(),
                value: year.to_string(),
            });
        }
        let year = year as i32;
        let co2 = field(co2_index, "CO2")?;
        if table.insert(year, co2).is_some() {
            return Err(MetError::Co2DuplicateYear {
                file: file.clone(),
                year,
            });
        }
    }
    Ok(table)
}

#[typetag::serde]
impl WeatherModifier for CO2Value {
    fn name(&self) -> &str {
        "CO2Value"
    }

    fn on_start_of_simulation(&mut self, _weather: &dyn WeatherProvider, _zone: &Zone) -> MetResult<()> {
        self.values = read_co2_table(&self.file_name)?;
        info!(
            file = %self.file_name.display(),
            years = self.values.len(),
            "Read CO2 table"
        );
        Ok(())
    }

    fn on_weather_prepared(
        &mut self,
        weather: &mut dyn WeatherProvider,
        clock: &Clock,
    ) -> MetResult<()> {
        let co2 = self.value_for(clock.today().year())?;
        debug!(date = %clock.today(), co2, "CO2 override");
        weather.weather_mut().co2 = co2;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn table(text: &str) -> MetResult<Co2Table> {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("co2.csv");
        fs::write(&path, text).unwrap();
        read_co2_table(&path)
    }

    #[test]
    fn reads_years_in_any_case() {
        let values = table("YEAR, co2\n2019, 411.4\n2020, 413.9\n").unwrap();
        assert_eq!(values.len(), 2);
        assert_eq!(values[&2020], 413.9);
    }

    #[test]
    fn missing_column() {
        match table("Year,Carbon\n2019,411\n") {
            Err(MetError::Co2MissingColumn { column, .. }) => assert_eq!(column, "co2"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn duplicate_year() {
        assert!(matches!(
            table("Year,CO2\n2019,411\n2019,412\n"),
            Err(MetError::Co2DuplicateYear { year: 2019, .. })
        ));
    }

    #[test]
    fn fractional_year_is_rejected() {
        match table("Year,CO2\n2019,411\n2019.7,412\n") {
            Err(MetError::Parse { line, column, value, .. }) => {
                assert_eq!(line, 3);
                assert_eq!(column, "Year");
                assert_eq!(value, "2019.7");
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(table("Year,CO2\n2019.0,411\n").unwrap()[&2019], 411.0);
    }

    #[test]
    fn missing_year_names_the_year() {
        let co2 = CO2Value::new("co2.csv");
        let err = co2.value_for(1999).unwrap_err();
        assert!(err.to_string().contains("1999"));
    }
}
