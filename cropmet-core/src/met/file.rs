//! Tabular met files
//!
//! Two layouts are read:
//!
//! * APSIM text (`.met` and anything else): a metadata block of
//!   `name = value (units) ! comment` lines, a whitespace separated heading
//!   line, a units line whose first character is `(`, then one row per day.
//!   `!` starts a comment and `[section]` lines are ignored.
//! * CSV (`.csv`): constants as above, then a heading row and data rows.
//!   An optional units row directly after the headings is skipped.
//!
//! The whole table is held in memory and read through a cursor, so seeking
//! is a constant-time jump from the first date.

use crate::errors::{MetError, MetResult};
use crate::met::constants::{Constant, ConstantsTable};
use chrono::NaiveDate;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// One data row of a met file.
#[derive(Debug, Clone, PartialEq)]
pub struct MetRow {
    /// 1-based line number in the source file.
    pub line: usize,
    pub date: NaiveDate,
    pub values: Vec<String>,
}

/// How the date of a row is assembled from its columns.
#[derive(Debug, Clone, Copy, PartialEq)]
enum DateColumns {
    Date(usize),
    YearMonthDay(usize, usize, usize),
    YearDayOfYear(usize, usize),
}

#[derive(Debug, Clone)]
pub struct MetFile {
    path: PathBuf,
    headings: Vec<String>,
    units: Vec<String>,
    constants: ConstantsTable,
    rows: Vec<MetRow>,
    cursor: usize,
}

fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| extensions.iter().any(|x| e.eq_ignore_ascii_case(x)))
        .unwrap_or(false)
}

/// Whether the path names an Excel workbook.
pub fn is_spreadsheet(path: &Path) -> bool {
    has_extension(path, &["xls", "xlsx"])
}

fn is_csv(path: &Path) -> bool {
    has_extension(path, &["csv"])
}

/// Parse `name = value (units) ! comment`.
fn parse_constant(line: &str) -> Option<Constant> {
    let (body, comment) = match line.split_once('!') {
        Some((body, comment)) => (body, Some(comment.trim().to_string())),
        None => (line, None),
    };
    let (name, rest) = body.split_once('=')?;
    let name = name.trim();
    if name.is_empty() {
        return None;
    }
    let rest = rest.trim();
    let (value, units) = match (rest.find('('), rest.rfind(')')) {
        (Some(open), Some(close)) if close > open && !name.eq_ignore_ascii_case("title") => (
            format!("{}{}", &rest[..open], &rest[close + 1..]),
            Some(rest[open + 1..close].trim().to_string()),
        ),
        _ => (rest.to_string(), None),
    };
    Some(Constant {
        name: name.to_string(),
        value: value.trim().to_string(),
        units,
        comment: comment.filter(|c| !c.is_empty()),
    })
}

/// Read only the constants of a file, such as a separate constants file.
pub fn read_constants(path: &Path) -> MetResult<ConstantsTable> {
    let text = fs::read_to_string(path)?;
    let mut constants = ConstantsTable::new();
    text.lines()
        .map(str::trim)
        .filter(|line| !line.starts_with('!') && line.contains('='))
        .filter_map(parse_constant)
        .for_each(|constant| {
            constants.add(constant);
        });
    Ok(constants)
}

fn clean_heading(word: &str) -> String {
    word.trim().trim_matches('"').to_string()
}

impl MetFile {
    /// Open a met file.
    ///
    /// Spreadsheets need a worksheet name; a missing one is reported as such
    /// before anything else is checked.
    pub fn open(path: &Path, sheet: Option<&str>) -> MetResult<Self> {
        if is_spreadsheet(path) {
            return Err(match sheet.filter(|s| !s.is_empty()) {
                None => MetError::MissingWorksheet(path.display().to_string()),
                Some(sheet) => MetError::UnsupportedFormat {
                    file: path.display().to_string(),
                    sheet: sheet.to_string(),
                },
            });
        }
        let text = fs::read_to_string(path)?;
        let file = if is_csv(path) {
            Self::parse_csv(path, &text)?
        } else {
            Self::parse_text(path, &text)?
        };
        debug!(
            file = %path.display(),
            rows = file.rows.len(),
            columns = file.headings.len(),
            "Opened met file"
        );
        Ok(file)
    }

    /// Parse the APSIM text layout.
    pub fn parse_text(path: &Path, text: &str) -> MetResult<Self> {
        let mut constants = ConstantsTable::new();
        let mut header: Option<(Vec<String>, Vec<String>)> = None;
        let mut previous: Option<&str> = None;
        let mut raw_rows: Vec<(usize, Vec<String>)> = Vec::new();

        for (index, line) in text.lines().enumerate() {
            let trimmed = line.trim();
            if header.is_none() {
                if trimmed.is_empty() || trimmed.starts_with('!') || trimmed.starts_with('[') {
                    continue;
                }
                if trimmed.contains('=') {
                    if let Some(constant) = parse_constant(trimmed) {
                        constants.add(constant);
                    }
                } else if trimmed.starts_with('(') {
                    let headings: Vec<String> = previous
                        .unwrap_or_default()
                        .split_whitespace()
                        .map(clean_heading)
                        .collect();
                    let units: Vec<String> =
                        trimmed.split_whitespace().map(str::to_string).collect();
                    if headings.len() != units.len() {
                        return Err(MetError::Error(format!(
                            "The number of headings and units doesn't match in file: {}",
                            path.display()
                        )));
                    }
                    header = Some((headings, units));
                } else {
                    previous = Some(trimmed);
                }
                continue;
            }

            let data = trimmed.split('!').next().unwrap_or_default().trim();
            if !data.is_empty() {
                raw_rows.push((
                    index + 1,
                    data.split_whitespace().map(str::to_string).collect(),
                ));
            }
        }

        let (headings, units) =
            header.ok_or_else(|| MetError::MissingHeader(path.display().to_string()))?;
        Self::build(path, headings, units, constants, raw_rows)
    }

    /// Parse the CSV layout.
    pub fn parse_csv(path: &Path, text: &str) -> MetResult<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(text.as_bytes());

        let mut constants = ConstantsTable::new();
        let mut headings: Option<Vec<String>> = None;
        let mut units_checked = false;
        let mut raw_rows: Vec<(usize, Vec<String>)> = Vec::new();

        for record in reader.records() {
            let record = record?;
            let line = record.position().map(|p| p.line() as usize).unwrap_or(0);
            let fields: Vec<String> = record.iter().map(str::to_string).collect();
            if fields.iter().all(|f| f.is_empty()) || fields[0].starts_with('!') {
                continue;
            }
            match &headings {
                None => {
                    let joined = fields.join(",");
                    if joined.contains('=') {
                        if let Some(constant) = parse_constant(&joined) {
                            constants.add(constant);
                        }
                    } else {
                        let mut names: Vec<String> =
                            fields.iter().map(|f| clean_heading(f)).collect();
                        while names.last().is_some_and(|n| n.is_empty()) {
                            names.pop();
                        }
                        headings = Some(names);
                    }
                }
                Some(_) => {
                    if !units_checked {
                        units_checked = true;
                        if fields[0].starts_with('(') {
                            continue;
                        }
                    }
                    raw_rows.push((line, fields));
                }
            }
        }

        let headings = headings.ok_or_else(|| MetError::MissingHeader(path.display().to_string()))?;
        let units = vec!["()".to_string(); headings.len()];
        Self::build(path, headings, units, constants, raw_rows)
    }

    fn build(
        path: &Path,
        headings: Vec<String>,
        units: Vec<String>,
        constants: ConstantsTable,
        raw_rows: Vec<(usize, Vec<String>)>,
    ) -> MetResult<Self> {
        let file_name = path.display().to_string();
        let date_columns = Self::date_columns(&headings)
            .ok_or_else(|| MetError::MissingDateColumns(file_name.clone()))?;

        let rows = raw_rows
            .into_iter()
            .map(|(line, values)| {
                let date = Self::row_date(&file_name, &headings, date_columns, line, &values)?;
                Ok(MetRow { line, date, values })
            })
            .collect::<MetResult<Vec<_>>>()?;

        Ok(Self {
            path: path.to_path_buf(),
            headings,
            units,
            constants,
            rows,
            cursor: 0,
        })
    }

    fn date_columns(headings: &[String]) -> Option<DateColumns> {
        let find = |name: &str| headings.iter().position(|h| h.eq_ignore_ascii_case(name));
        if let Some(date) = find("date") {
            return Some(DateColumns::Date(date));
        }
        match (find("year"), find("month"), find("day")) {
            (Some(y), Some(m), Some(d)) => Some(DateColumns::YearMonthDay(y, m, d)),
            (Some(y), None, Some(d)) => Some(DateColumns::YearDayOfYear(y, d)),
            _ => None,
        }
    }

    fn row_date(
        file: &str,
        headings: &[String],
        columns: DateColumns,
        line: usize,
        values: &[String],
    ) -> MetResult<NaiveDate> {
        let field = |index: usize| values.get(index).map(String::as_str).unwrap_or_default();
        let parse_error = |index: usize| MetError::Parse {
            file: file.to_string(),
            line,
            column: headings[index].clone(),
            value: field(index).to_string(),
        };
        let int = |index: usize| -> MetResult<i64> {
            field(index)
                .parse::<f64>()
                .ok()
                .filter(|v| v.fract() == 0.0)
                .map(|v| v as i64)
                .ok_or_else(|| parse_error(index))
        };

        match columns {
            DateColumns::Date(index) => {
                let text = field(index);
                ["%Y-%m-%d", "%d/%m/%Y", "%Y/%m/%d"]
                    .iter()
                    .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
                    .ok_or_else(|| parse_error(index))
            }
            DateColumns::YearMonthDay(y, m, d) => {
                NaiveDate::from_ymd_opt(int(y)? as i32, int(m)? as u32, int(d)? as u32)
                    .ok_or_else(|| parse_error(d))
            }
            DateColumns::YearDayOfYear(y, d) => {
                NaiveDate::from_yo_opt(int(y)? as i32, int(d)? as u32).ok_or_else(|| parse_error(d))
            }
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The path as text, for messages.
    pub fn file_name(&self) -> String {
        self.path.display().to_string()
    }

    pub fn headings(&self) -> &[String] {
        &self.headings
    }

    pub fn units(&self) -> &[String] {
        &self.units
    }

    /// Position of a heading, ignoring case.
    pub fn heading_index(&self, name: &str) -> Option<usize> {
        self.headings
            .iter()
            .position(|h| h.eq_ignore_ascii_case(name))
    }

    pub fn constants(&self) -> &ConstantsTable {
        &self.constants
    }

    pub fn constants_mut(&mut self) -> &mut ConstantsTable {
        &mut self.constants
    }

    pub fn rows(&self) -> &[MetRow] {
        &self.rows
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.rows.first().map(|r| r.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.rows.last().map(|r| r.date)
    }

    /// Index of the next row to be read.
    pub fn position(&self) -> usize {
        self.cursor
    }

    pub fn seek_to_position(&mut self, position: usize) {
        self.cursor = position.min(self.rows.len());
    }

    /// Move the cursor to where `date` should be, assuming one row per day.
    ///
    /// Dates after the last row leave the cursor at the end of the file. The
    /// caller is responsible for checking the date of the row it then reads.
    pub fn seek_to_date(&mut self, date: NaiveDate) -> MetResult<()> {
        let first = self.first_date().ok_or_else(|| MetError::NoDataForDate {
            file: self.file_name(),
            date,
        })?;
        if date < first {
            return Err(MetError::DateBeforeStart {
                file: self.file_name(),
                date,
                first,
            });
        }
        let offset = (date - first).num_days() as usize;
        self.seek_to_position(offset);
        Ok(())
    }

    pub fn peek(&self) -> Option<&MetRow> {
        self.rows.get(self.cursor)
    }

    pub fn next_row(&mut self) -> Option<&MetRow> {
        let row = self.rows.get(self.cursor)?;
        self.cursor += 1;
        Some(row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MET: &str = "\
[weather.met.weather]
!station: Gatton
latitude = -27.55  (DECIMAL DEGREES)  ! from SILO
tav = 19.57 (oC) ! annual average ambient temperature
amp = 10.3 (oC)

year  day radn  maxt   mint  rain
 ()   () (MJ/m^2) (oC) (oC)  (mm)
2020   1  20.0  25.0  10.0   0.0
2020   2  21.0  26.0  11.0   0.0 ! hot
2020   3  19.0  24.0   9.0   5.0
";

    fn parse(text: &str) -> MetFile {
        MetFile::parse_text(Path::new("test.met"), text).unwrap()
    }

    #[test]
    fn reads_constants_and_headings() {
        let file = parse(MET);
        assert_eq!(file.headings(), ["year", "day", "radn", "maxt", "mint", "rain"]);
        assert_eq!(file.units()[2], "(MJ/m^2)");
        let latitude = file.constants().get("Latitude").unwrap();
        assert_eq!(latitude.value, "-27.55");
        assert_eq!(latitude.units.as_deref(), Some("DECIMAL DEGREES"));
        assert_eq!(latitude.comment.as_deref(), Some("from SILO"));
        assert_eq!(file.constants().value("amp").unwrap(), Some(10.3));
    }

    #[test]
    fn builds_dates_from_year_and_day_of_year() {
        let file = parse(MET);
        assert_eq!(file.rows().len(), 3);
        assert_eq!(file.first_date(), NaiveDate::from_ymd_opt(2020, 1, 1));
        assert_eq!(file.last_date(), NaiveDate::from_ymd_opt(2020, 1, 3));
        assert_eq!(file.rows()[1].values[3], "26.0");
        assert_eq!(file.rows()[1].line, 10);
    }

    #[test]
    fn seek_positions_cursor_by_date() {
        let mut file = parse(MET);
        file.seek_to_date(NaiveDate::from_ymd_opt(2020, 1, 2).unwrap())
            .unwrap();
        assert_eq!(file.next_row().unwrap().values[3], "26.0");
        assert_eq!(file.next_row().unwrap().values[3], "24.0");
        assert!(file.next_row().is_none());

        file.seek_to_date(NaiveDate::from_ymd_opt(2021, 1, 1).unwrap())
            .unwrap();
        assert!(file.peek().is_none());
    }

    #[test]
    fn seek_before_first_date_fails() {
        let mut file = parse(MET);
        let result = file.seek_to_date(NaiveDate::from_ymd_opt(2019, 12, 31).unwrap());
        assert!(matches!(result, Err(MetError::DateBeforeStart { .. })));
    }

    #[test]
    fn missing_header_is_reported() {
        let result = MetFile::parse_text(Path::new("bad.met"), "latitude = -27\n");
        assert!(matches!(result, Err(MetError::MissingHeader(_))));
    }

    #[test]
    fn heading_and_unit_counts_must_match() {
        let text = "year day maxt\n() ()\n2020 1 20\n";
        let result = MetFile::parse_text(Path::new("bad.met"), text);
        assert!(matches!(result, Err(MetError::Error(_))));
    }

    #[test]
    fn bad_day_is_a_parse_error() {
        let text = "year day maxt\n() () ()\n2020 x 20\n";
        match MetFile::parse_text(Path::new("bad.met"), text) {
            Err(MetError::Parse {
                line, column, value, ..
            }) => {
                assert_eq!(line, 3);
                assert_eq!(column, "day");
                assert_eq!(value, "x");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn reads_csv_with_date_column() {
        let text = "latitude = 45.2\nDate,MaxT,MinT,Radn,Rain,\n(),(oC),(oC),(MJ),(mm)\n2001-03-01,12,2,10,0\n2001-03-02,13,3,11,1.5\n";
        let file = MetFile::parse_csv(Path::new("site.csv"), text).unwrap();
        assert_eq!(file.headings(), ["Date", "MaxT", "MinT", "Radn", "Rain"]);
        assert_eq!(file.constants().value("latitude").unwrap(), Some(45.2));
        assert_eq!(file.rows().len(), 2);
        assert_eq!(file.first_date(), NaiveDate::from_ymd_opt(2001, 3, 1));
        assert_eq!(file.rows()[1].values[4], "1.5");
    }

    #[test]
    fn spreadsheet_needs_a_sheet_name() {
        let result = MetFile::open(Path::new("weather.xlsx"), None);
        assert!(matches!(result, Err(MetError::MissingWorksheet(_))));
        let result = MetFile::open(Path::new("weather.xlsx"), Some("Sheet1"));
        assert!(matches!(result, Err(MetError::UnsupportedFormat { .. })));
    }
}
