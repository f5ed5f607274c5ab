//! Date-addressed access to a met file.

use crate::errors::{MetError, MetResult};
use crate::met::columns::{ColumnIndexMap, MetField};
use crate::met::constants::ConstantsTable;
use crate::met::file::{read_constants, MetFile};
use crate::met::record::DailyRecord;
use crate::met::utilities;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Extension appended to a file name that has none.
pub const DEFAULT_EXTENSION: &str = "met";

/// An open met file with its columns resolved.
///
/// Reads are sequential while dates follow on from one another; any other
/// date triggers a seek. Every row read is checked against the date asked
/// for, which catches gaps, duplicates and rows out of order.
#[derive(Debug, Clone)]
pub struct MetDataReader {
    file: MetFile,
    columns: ColumnIndexMap,
    next_expected: Option<NaiveDate>,
}

impl MetDataReader {
    /// Append the default extension to a path that has none and does not exist.
    pub fn resolve_path(path: &Path) -> PathBuf {
        if !path.exists() && path.extension().is_none() {
            path.with_extension(DEFAULT_EXTENSION)
        } else {
            path.to_path_buf()
        }
    }

    /// Open a met file.
    ///
    /// Returns `Ok(None)` when the file does not exist so that callers can
    /// tell a missing file from a malformed one. Constants from
    /// `constants_file` are merged in, without replacing those of the file.
    pub fn open(
        path: &Path,
        sheet: Option<&str>,
        constants_file: Option<&Path>,
    ) -> MetResult<Option<Self>> {
        let path = Self::resolve_path(path);
        if !path.exists() {
            return Ok(None);
        }
        let mut file = MetFile::open(&path, sheet)?;
        if let Some(constants_file) = constants_file {
            let extra = read_constants(constants_file)?;
            debug!(file = %constants_file.display(), count = extra.len(), "Merging constants");
            file.constants_mut().merge(&extra);
        }
        let columns = ColumnIndexMap::resolve(&file)?;
        Ok(Some(Self {
            file,
            columns,
            next_expected: None,
        }))
    }

    pub fn file(&self) -> &MetFile {
        &self.file
    }

    pub fn file_name(&self) -> String {
        self.file.file_name()
    }

    pub fn columns(&self) -> &ColumnIndexMap {
        &self.columns
    }

    pub fn constants(&self) -> &ConstantsTable {
        self.file.constants()
    }

    pub fn constant(&self, name: &str) -> MetResult<Option<f64>> {
        self.file.constants().value(name)
    }

    pub fn set_constant(&mut self, name: &str, value: f64) {
        self.file.constants_mut().set(name, value);
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.file.first_date()
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.file.last_date()
    }

    /// Latitude constant (decimal degrees).
    pub fn latitude(&self) -> MetResult<f64> {
        self.constant("latitude")?
            .ok_or_else(|| MetError::MissingConstant {
                name: "Latitude".to_string(),
                file: self.file_name(),
            })
    }

    /// Longitude constant, zero when absent.
    pub fn longitude(&self) -> MetResult<f64> {
        Ok(self.constant("longitude")?.unwrap_or(0.0))
    }

    /// Back to the first row.
    pub fn rewind(&mut self) {
        self.file.seek_to_position(0);
        self.next_expected = None;
    }

    /// Read the record for `date`.
    pub fn read(&mut self, date: NaiveDate) -> MetResult<DailyRecord> {
        if self.next_expected != Some(date) {
            self.file.seek_to_date(date)?;
        }
        self.next_expected = None;

        let file_name = self.file.file_name();
        let row = self
            .file
            .next_row()
            .ok_or(MetError::NoDataForDate {
                file: file_name.clone(),
                date,
            })?;
        if row.date != date {
            return Err(MetError::DateMismatch {
                file: file_name,
                expected: date,
                found: row.date,
            });
        }
        let record = DailyRecord::from_row(row, &self.columns)?;
        self.next_expected = date.succ_opt();
        Ok(record)
    }

    /// Every record in the file, checking that dates are consecutive.
    pub fn read_all(&self) -> MetResult<Vec<DailyRecord>> {
        let mut records = Vec::with_capacity(self.file.rows().len());
        let mut expected = self.first_date();
        for row in self.file.rows() {
            if let Some(expected) = expected.filter(|d| *d != row.date) {
                return Err(MetError::DateMismatch {
                    file: self.file_name(),
                    expected,
                    found: row.date,
                });
            }
            records.push(DailyRecord::from_row(row, &self.columns)?);
            expected = row.date.succ_opt();
        }
        Ok(records)
    }

    /// Value of a named column in a record's raw data.
    pub fn column_value(&self, record: &DailyRecord, column: &str) -> MetResult<f64> {
        let index = self
            .file
            .heading_index(column)
            .ok_or_else(|| MetError::UnknownColumn(column.to_string()))?;
        let text = record.raw.get(index).map(String::as_str).unwrap_or_default();
        text.parse::<f64>().map_err(|_| MetError::Parse {
            file: self.file_name(),
            line: 0,
            column: column.to_string(),
            value: text.to_string(),
        })
    }

    /// TAV and AMP computed from the whole file.
    pub fn calculate_tav_amp(&self) -> MetResult<(f64, f64)> {
        let means = self
            .file
            .rows()
            .iter()
            .map(|row| {
                let max_t = self.columns.required(MetField::MaxT, row)?;
                let min_t = self.columns.required(MetField::MinT, row)?;
                Ok((row.date, (max_t + min_t) / 2.0))
            })
            .collect::<MetResult<Vec<_>>>()?;
        utilities::tav_amp(means).ok_or_else(|| {
            MetError::Error(format!(
                "No data to calculate TAV and AMP from in weather file: {}",
                self.file_name()
            ))
        })
    }
}

/// Configuration of a file-backed weather source and its open reader.
///
/// The reader opens on first use and stays open until [`MetSource::close`]
/// or a change of file name.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MetSource {
    /// Path of the met file. `.met` is appended when the path has no
    /// extension and does not exist.
    pub file_name: PathBuf,
    /// Optional file of extra constants.
    pub constants_file: Option<PathBuf>,
    /// Worksheet to read when the file is a spreadsheet.
    pub excel_worksheet_name: Option<String>,
    #[serde(skip)]
    reader: Option<MetDataReader>,
}

impl MetSource {
    pub fn new(file_name: impl Into<PathBuf>) -> Self {
        Self {
            file_name: file_name.into(),
            ..Default::default()
        }
    }

    pub fn with_constants_file(mut self, constants_file: impl Into<PathBuf>) -> Self {
        self.constants_file = Some(constants_file.into());
        self
    }

    /// Open the file if it is not already open.
    ///
    /// An already open reader is rewound to the first row. Returns `false`
    /// when the file does not exist.
    pub fn open(&mut self) -> MetResult<bool> {
        if let Some(reader) = self.reader.as_mut() {
            reader.rewind();
            return Ok(true);
        }
        let opened = MetDataReader::open(
            &self.file_name,
            self.excel_worksheet_name.as_deref(),
            self.constants_file.as_deref(),
        )?;
        match opened {
            Some(reader) => {
                info!(file = %reader.file_name(), "Opened weather file");
                self.reader = Some(reader);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// The open reader, opening the file if needed.
    pub fn reader(&mut self) -> MetResult<&mut MetDataReader> {
        if self.reader.is_none() && !self.open()? {
            return Err(MetError::WeatherFileNotFound(
                self.file_name.display().to_string(),
            ));
        }
        self.reader
            .as_mut()
            .ok_or_else(|| MetError::WeatherFileNotFound(self.file_name.display().to_string()))
    }

    /// The reader if the file is open.
    pub fn opened(&self) -> Option<&MetDataReader> {
        self.reader.as_ref()
    }

    pub fn is_open(&self) -> bool {
        self.reader.is_some()
    }

    pub fn close(&mut self) {
        if self.reader.take().is_some() {
            debug!(file = %self.file_name.display(), "Closed weather file");
        }
    }

    /// Point at another file, closing the current one.
    pub fn set_file_name(&mut self, file_name: impl Into<PathBuf>) {
        self.close();
        self.file_name = file_name.into();
    }

    pub fn display_name(&self) -> String {
        self.file_name.display().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const MET: &str = "\
latitude = -27.5
year day maxt mint radn rain
() () () () () ()
2020 1 25 10 20 0
2020 2 26 11 21 0
2020 4 24 9 19 5
";

    fn write(dir: &Path, name: &str, text: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, text).unwrap();
        path
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2020, 1, d).unwrap()
    }

    #[test]
    fn missing_file_is_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let opened = MetDataReader::open(&dir.path().join("nothing.met"), None, None).unwrap();
        assert!(opened.is_none());
    }

    #[test]
    fn default_extension_is_appended() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "site.met", MET);
        let reader = MetDataReader::open(&dir.path().join("site"), None, None)
            .unwrap()
            .unwrap();
        assert!(reader.file_name().ends_with("site.met"));
    }

    #[test]
    fn sequential_reads_detect_a_gap() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "gap.met", MET);
        let mut reader = MetDataReader::open(&path, None, None).unwrap().unwrap();

        assert_eq!(reader.read(day(1)).unwrap().max_t, 25.0);
        assert_eq!(reader.read(day(2)).unwrap().max_t, 26.0);
        match reader.read(day(3)) {
            Err(MetError::DateMismatch {
                expected, found, ..
            }) => {
                assert_eq!(expected, day(3));
                assert_eq!(found, day(4));
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(matches!(
            reader.read_all(),
            Err(MetError::DateMismatch { .. })
        ));
    }

    #[test]
    fn constants_file_does_not_override() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "site.met", MET);
        let constants = write(
            dir.path(),
            "constants.txt",
            "latitude = 10.0\ntav = 18.2 (oC)\n",
        );
        let reader = MetDataReader::open(&path, None, Some(&constants))
            .unwrap()
            .unwrap();
        assert_eq!(reader.latitude().unwrap(), -27.5);
        assert_eq!(reader.constant("tav").unwrap(), Some(18.2));
    }

    #[test]
    fn source_opens_lazily_and_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut source = MetSource::new(dir.path().join("absent.met"));
        assert!(!source.open().unwrap());
        assert!(matches!(
            source.reader(),
            Err(MetError::WeatherFileNotFound(_))
        ));

        let path = write(dir.path(), "site.met", MET);
        source.set_file_name(&path);
        assert!(!source.is_open());
        assert_eq!(source.reader().unwrap().latitude().unwrap(), -27.5);
        assert!(source.is_open());
        source.close();
        assert!(!source.is_open());
    }

    #[test]
    fn column_value_by_name() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "site.met", MET);
        let mut reader = MetDataReader::open(&path, None, None).unwrap().unwrap();
        let record = reader.read(day(2)).unwrap();
        assert_eq!(reader.column_value(&record, "RADN").unwrap(), 21.0);
        assert!(matches!(
            reader.column_value(&record, "evap"),
            Err(MetError::UnknownColumn(_))
        ));
    }
}
