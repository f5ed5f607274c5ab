use crate::errors::MetResult;
use crate::met::columns::{ColumnIndexMap, MetField};
use crate::met::file::MetRow;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Wind speed (m/s) used when a file has neither a column nor a constant.
pub const DEFAULT_WIND: f64 = 3.0;

/// One day of weather as read from a source.
///
/// Fields that a file does not provide stay `None` until a provider derives
/// them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyRecord {
    pub date: NaiveDate,
    /// Raw values of the row, in heading order.
    pub raw: Vec<String>,
    pub max_t: f64,
    pub min_t: f64,
    pub radn: f64,
    pub rain: f64,
    pub wind: f64,
    pub mean_t: Option<f64>,
    pub pan_evap: Option<f64>,
    pub rainfall_hours: Option<f64>,
    pub vp: Option<f64>,
    pub co2: Option<f64>,
    pub air_pressure: Option<f64>,
    pub day_length: Option<f64>,
    pub diffuse_fraction: Option<f64>,
    pub pet: Option<f64>,
    pub pot_soil_evap: Option<f64>,
    pub actual_soil_evap: Option<f64>,
}

impl DailyRecord {
    /// A record with only the required fields set.
    pub fn new(date: NaiveDate, max_t: f64, min_t: f64, radn: f64, rain: f64) -> Self {
        Self {
            date,
            raw: Vec::new(),
            max_t,
            min_t,
            radn,
            rain,
            wind: DEFAULT_WIND,
            mean_t: None,
            pan_evap: None,
            rainfall_hours: None,
            vp: None,
            co2: None,
            air_pressure: None,
            day_length: None,
            diffuse_fraction: None,
            pet: None,
            pot_soil_evap: None,
            actual_soil_evap: None,
        }
    }

    /// Resolve every field of a row through the column map.
    pub fn from_row(row: &MetRow, columns: &ColumnIndexMap) -> MetResult<Self> {
        let value = |field: MetField| columns.value(field, row);
        let mut record = Self::new(
            row.date,
            columns.required(MetField::MaxT, row)?,
            columns.required(MetField::MinT, row)?,
            columns.required(MetField::Radn, row)?,
            columns.required(MetField::Rain, row)?,
        );
        record.raw = row.values.clone();
        record.wind = value(MetField::Wind)?.unwrap_or(DEFAULT_WIND);
        record.mean_t = value(MetField::MeanT)?;
        record.pan_evap = value(MetField::PanEvap)?;
        record.rainfall_hours = value(MetField::RainHours)?;
        record.vp = value(MetField::VP)?;
        record.co2 = value(MetField::CO2)?;
        record.air_pressure = value(MetField::AirPressure)?;
        record.day_length = value(MetField::DayLength)?;
        record.diffuse_fraction = value(MetField::DiffuseFraction)?;
        record.pet = value(MetField::PET)?;
        record.pot_soil_evap = value(MetField::PotEvap)?;
        record.actual_soil_evap = value(MetField::ActualEvap)?;
        Ok(record)
    }

    /// Same values, moved to another date.
    pub fn redated(&self, date: NaiveDate) -> Self {
        Self {
            date,
            ..self.clone()
        }
    }

    pub fn mean_temperature(&self) -> f64 {
        self.mean_t.unwrap_or((self.max_t + self.min_t) / 2.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::met::file::MetFile;
    use std::path::Path;

    #[test]
    fn optional_fields_fall_back_to_constant_then_default() {
        let text = "co2 = 400\nyear day maxt mint radn rain vp\n() () () () () () ()\n2020 1 25 10 20 0 12.5\n";
        let met = MetFile::parse_text(Path::new("test.met"), text).unwrap();
        let columns = ColumnIndexMap::resolve(&met).unwrap();
        let record = DailyRecord::from_row(&met.rows()[0], &columns).unwrap();

        assert_eq!(record.max_t, 25.0);
        assert_eq!(record.vp, Some(12.5));
        assert_eq!(record.co2, Some(400.0));
        assert_eq!(record.wind, DEFAULT_WIND);
        assert_eq!(record.day_length, None);
        assert_eq!(record.raw.len(), 7);
        assert_eq!(record.mean_temperature(), 17.5);
    }
}
