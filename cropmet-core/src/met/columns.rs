//! Mapping of met-file headings to weather fields.
//!
//! Each field resolves once, when a file is opened, to a column, a named
//! constant or the field's default. MaxT, MinT, Radn and Rain must resolve to
//! a column or a constant.

use crate::errors::{MetError, MetResult};
use crate::met::file::{MetFile, MetRow};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MetField {
    MaxT,
    MinT,
    MeanT,
    Radn,
    Rain,
    PanEvap,
    RainHours,
    VP,
    Wind,
    CO2,
    AirPressure,
    PET,
    PotEvap,
    ActualEvap,
    DiffuseFraction,
    DayLength,
}

impl MetField {
    pub const ALL: [MetField; 16] = [
        MetField::MaxT,
        MetField::MinT,
        MetField::MeanT,
        MetField::Radn,
        MetField::Rain,
        MetField::PanEvap,
        MetField::RainHours,
        MetField::VP,
        MetField::Wind,
        MetField::CO2,
        MetField::AirPressure,
        MetField::PET,
        MetField::PotEvap,
        MetField::ActualEvap,
        MetField::DiffuseFraction,
        MetField::DayLength,
    ];

    /// Heading names recognised for the field, ignoring case.
    ///
    /// The first alias is also the name of the fallback constant.
    pub fn aliases(&self) -> &'static [&'static str] {
        match self {
            MetField::MaxT => &["maxt"],
            MetField::MinT => &["mint"],
            MetField::MeanT => &["meant"],
            MetField::Radn => &["radn"],
            MetField::Rain => &["rain"],
            MetField::PanEvap => &["evap"],
            MetField::RainHours => &["rainhours"],
            MetField::VP => &["vp"],
            MetField::Wind => &["wind"],
            MetField::CO2 => &["co2"],
            MetField::AirPressure => &["airpressure"],
            MetField::PET => &["pet"],
            MetField::PotEvap => &["potevap"],
            // Some files in circulation carry the misspelt heading.
            MetField::ActualEvap => &["actualevap", "actaulevap"],
            MetField::DiffuseFraction => &["difr", "diffr"],
            MetField::DayLength => &["daylength"],
        }
    }

    pub fn key(&self) -> &'static str {
        self.aliases()[0]
    }

    /// Fields that must come from a column or a constant.
    pub fn is_required(&self) -> bool {
        matches!(
            self,
            MetField::MaxT | MetField::MinT | MetField::Radn | MetField::Rain
        )
    }
}

impl fmt::Display for MetField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MetField::VP => "VP".to_string(),
            MetField::CO2 => "CO2".to_string(),
            MetField::PET => "PET".to_string(),
            other => format!("{other:?}"),
        };
        write!(f, "{name}")
    }
}

/// Where a field's daily value comes from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Resolution {
    Column(usize),
    Constant(f64),
    Default,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColumnIndexMap {
    file: String,
    entries: HashMap<MetField, Resolution>,
}

impl ColumnIndexMap {
    /// Resolve every field against the headings and constants of `file`.
    pub fn resolve(file: &MetFile) -> MetResult<Self> {
        let mut entries = HashMap::new();
        for field in MetField::ALL {
            let column = field
                .aliases()
                .iter()
                .find_map(|alias| file.heading_index(alias));
            let resolution = match column {
                Some(index) => Resolution::Column(index),
                None => match file.constants().value(field.key())? {
                    Some(value) => Resolution::Constant(value),
                    None if field.is_required() => {
                        return Err(MetError::MissingField {
                            field: field.to_string(),
                            file: file.file_name(),
                        })
                    }
                    None => Resolution::Default,
                },
            };
            entries.insert(field, resolution);
        }
        Ok(Self {
            file: file.file_name(),
            entries,
        })
    }

    pub fn get(&self, field: MetField) -> Resolution {
        self.entries
            .get(&field)
            .copied()
            .unwrap_or(Resolution::Default)
    }

    pub fn has_column(&self, field: MetField) -> bool {
        matches!(self.get(field), Resolution::Column(_))
    }

    /// Value of `field` for a row, `None` when it falls back to its default.
    pub fn value(&self, field: MetField, row: &MetRow) -> MetResult<Option<f64>> {
        match self.get(field) {
            Resolution::Column(index) => {
                let text = row.values.get(index).map(String::as_str).unwrap_or_default();
                text.parse::<f64>().map(Some).map_err(|_| MetError::Parse {
                    file: self.file.clone(),
                    line: row.line,
                    column: field.to_string(),
                    value: text.to_string(),
                })
            }
            Resolution::Constant(value) => Ok(Some(value)),
            Resolution::Default => Ok(None),
        }
    }

    /// Value of a required field.
    pub fn required(&self, field: MetField, row: &MetRow) -> MetResult<f64> {
        self.value(field, row)?.ok_or_else(|| MetError::MissingField {
            field: field.to_string(),
            file: self.file.clone(),
        })
    }
}
