use chrono::NaiveDate;
use thiserror::Error;

/// Error type for weather provision.
///
/// Configuration errors (missing columns, missing files, too few sample years)
/// surface when a source is opened or a simulation starts. Data integrity errors
/// surface at the offending read. Sanity-check violations only become errors for
/// providers configured with [`SanityCheckPolicy::Fail`](crate::weather::SanityCheckPolicy).
#[derive(Error, Debug)]
pub enum MetError {
    #[error("{0}")]
    Error(String),
    #[error("Cannot find weather file '{0}'")]
    WeatherFileNotFound(String),
    #[error("Unable to open excel file {0}: no sheet name is specified")]
    MissingWorksheet(String),
    #[error("Unable to read sheet '{sheet}' of {file}: spreadsheet weather sources are not supported, export the sheet as csv")]
    UnsupportedFormat { file: String, sheet: String },
    #[error("Cannot find the expected header in weather file: {0}")]
    MissingHeader(String),
    #[error("Cannot find {field} in weather file: {file}")]
    MissingField { field: String, file: String },
    #[error("Cannot find a date (date, or year and day) column in weather file: {0}")]
    MissingDateColumns(String),
    #[error("Invalid value '{value}' for {column} on line {line} of {file}")]
    Parse {
        file: String,
        line: usize,
        column: String,
        value: String,
    },
    #[error("Non consecutive dates found in file: {file}. Expected {expected} but found {found}. Another possibility is that more than one clock is advancing the same weather source")]
    DateMismatch {
        file: String,
        expected: NaiveDate,
        found: NaiveDate,
    },
    #[error("Date {date} is before the first date ({first}) in weather file: {file}")]
    DateBeforeStart {
        file: String,
        date: NaiveDate,
        first: NaiveDate,
    },
    #[error("Unable to retrieve weather data on {date} in file {file}")]
    NoDataForDate { file: String, date: NaiveDate },
    #[error("Constant '{name}' has a non-numeric value '{value}'")]
    InvalidConstant { name: String, value: String },
    #[error("Cannot find constant '{name}' in weather file: {file}")]
    MissingConstant { name: String, file: String },
    #[error("Cannot find column '{0}' in the weather data")]
    UnknownColumn(String),
    #[error("Weather file {file} has {available} complete year(s) available for sampling but {required} are needed")]
    InsufficientYears {
        file: String,
        available: usize,
        required: usize,
    },
    #[error("Year {year} does not have a complete record in weather file: {file}")]
    IncompleteYear { file: String, year: i32 },
    #[error("Cannot find a '{column}' column in CO2 file: {file}")]
    Co2MissingColumn { file: String, column: String },
    #[error("CO2 file {file} has more than one value for year {year}")]
    Co2DuplicateYear { file: String, year: i32 },
    #[error("CO2 file {file} has no value for year {year}")]
    Co2MissingYear { file: String, year: i32 },
    #[error("Bad weather data on {date}: {message}")]
    SanityCheck { date: NaiveDate, message: String },
    #[error("Invalid value for {name}: {message}")]
    InvalidParameter { name: String, message: String },
    #[error("Unable to parse '{0}' as a day and month (expected e.g. 1-dec)")]
    InvalidDayMonth(String),
    #[error("No weather provider has been configured")]
    MissingWeather,
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    Toml(#[from] toml::de::Error),
}

/// Convenience type for `Result<T, MetError>`.
pub type MetResult<T> = Result<T, MetError>;
