//! Thermal time queries straight from a met file
//!
//! These run outside the simulation clock. Each call opens the file afresh
//! and closes it when done, so calls with different date ranges never share
//! a cursor.

use crate::errors::MetResult;
use crate::met::reader::{MetDataReader, MetSource};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::debug;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GetTempSum {
    #[serde(flatten)]
    pub source: MetSource,
    /// Temperature below which no thermal time accumulates (oC).
    ///
    /// Default: 0.0
    pub base_temperature: f64,
}

impl Default for GetTempSum {
    fn default() -> Self {
        Self {
            source: MetSource::default(),
            base_temperature: 0.0,
        }
    }
}

impl GetTempSum {
    pub fn new(file_name: impl Into<PathBuf>) -> Self {
        Self {
            source: MetSource::new(file_name),
            ..Default::default()
        }
    }

    pub fn with_base_temperature(mut self, base_temperature: f64) -> Self {
        self.base_temperature = base_temperature;
        self
    }

    /// Degree days for one day.
    pub fn thermal_time(&self, max_t: f64, min_t: f64) -> f64 {
        degree_days(max_t, min_t, self.base_temperature)
    }

    fn with_reader<T>(&mut self, f: impl FnOnce(&mut MetDataReader) -> MetResult<T>) -> MetResult<T> {
        self.source.close();
        let result = self.source.reader().and_then(f);
        self.source.close();
        result
    }

    /// Thermal time accumulated from `start` to `end` inclusive.
    pub fn sum_thermal_time(&mut self, start: NaiveDate, end: NaiveDate) -> MetResult<f64> {
        let base = self.base_temperature;
        self.with_reader(|reader| {
            let mut sum = 0.0;
            for date in start.iter_days().take_while(|d| *d <= end) {
                let record = reader.read(date)?;
                sum += degree_days(record.max_t, record.min_t, base);
            }
            debug!(%start, %end, sum, "Summed thermal time");
            Ok(sum)
        })
    }

    /// First date on which thermal time accumulated from `start` reaches
    /// `target`, or `None` if the file ends first.
    pub fn harvest_date(&mut self, start: NaiveDate, target: f64) -> MetResult<Option<NaiveDate>> {
        let base = self.base_temperature;
        self.with_reader(|reader| {
            let Some(last) = reader.last_date() else {
                return Ok(None);
            };
            let mut sum = 0.0;
            for date in start.iter_days().take_while(|d| *d <= last) {
                let record = reader.read(date)?;
                sum += degree_days(record.max_t, record.min_t, base);
                if sum >= target {
                    return Ok(Some(date));
                }
            }
            Ok(None)
        })
    }
}

fn degree_days(max_t: f64, min_t: f64, base: f64) -> f64 {
    ((max_t + min_t) / 2.0 - base).max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::MetError;
    use is_close::is_close;
    use std::fs;

    const MET: &str = "\
latitude = -20
year day maxt mint radn rain
() () () () () ()
2019 100 30 10 20 0
2019 101 20 0 20 0
2019 102 4 -4 20 0
2019 103 30 20 20 0
";

    fn day(doy: u32) -> NaiveDate {
        NaiveDate::from_yo_opt(2019, doy).unwrap()
    }

    fn helper(dir: &std::path::Path) -> GetTempSum {
        let path = dir.join("temps.met");
        fs::write(&path, MET).unwrap();
        GetTempSum::new(path).with_base_temperature(5.0)
    }

    #[test]
    fn sums_between_dates() {
        let dir = tempfile::tempdir().unwrap();
        let mut temp_sum = helper(dir.path());
        // 15 + 5 + 0 + 20
        assert!(is_close!(temp_sum.sum_thermal_time(day(100), day(103)).unwrap(), 40.0));
        // Repeated calls with other ranges start from a fresh reader.
        assert!(is_close!(temp_sum.sum_thermal_time(day(101), day(102)).unwrap(), 5.0));
        assert!(!temp_sum.source.is_open());
    }

    #[test]
    fn sum_matches_daily_thermal_time() {
        let dir = tempfile::tempdir().unwrap();
        let mut temp_sum = helper(dir.path());
        let daily = temp_sum.thermal_time(30.0, 10.0)
            + temp_sum.thermal_time(20.0, 0.0)
            + temp_sum.thermal_time(4.0, -4.0);
        assert!(is_close!(daily, 20.0));
        assert!(is_close!(temp_sum.sum_thermal_time(day(100), day(102)).unwrap(), daily));
    }

    #[test]
    fn harvest_date_is_first_crossing() {
        let dir = tempfile::tempdir().unwrap();
        let mut temp_sum = helper(dir.path());
        assert_eq!(temp_sum.harvest_date(day(100), 20.0).unwrap(), Some(day(101)));
        assert_eq!(temp_sum.harvest_date(day(100), 21.0).unwrap(), Some(day(103)));
        assert_eq!(temp_sum.harvest_date(day(100), 100.0).unwrap(), None);
    }

    #[test]
    fn range_before_the_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let mut temp_sum = helper(dir.path());
        assert!(matches!(
            temp_sum.sum_thermal_time(day(90), day(101)),
            Err(MetError::DateBeforeStart { .. })
        ));
    }
}
