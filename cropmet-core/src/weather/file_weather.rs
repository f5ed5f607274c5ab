//! Cached file-backed weather with seasons.

use crate::clock::{Clock, DayMonth};
use crate::errors::{MetError, MetResult};
use crate::met::reader::MetSource;
use crate::met::record::DailyRecord;
use crate::met::utilities;
use crate::weather::seasons::{SeasonEvent, Seasons};
use crate::weather::{apply_sanity, DailyWeather, SanityCheckPolicy, WeatherProvider};
use crate::zone::Zone;
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::debug;

/// Reads daily weather from a met file.
///
/// Records are kept in a small date-keyed cache so that the look-ahead to
/// tomorrow and any lookups of nearby days avoid re-reading the file. When
/// the file runs out, the last day is repeated.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Weather {
    pub name: String,
    #[serde(flatten)]
    pub source: MetSource,
    /// Default: 1-dec
    pub first_date_of_summer: DayMonth,
    /// Default: 1-mar
    pub first_date_of_autumn: DayMonth,
    /// Default: 1-jun
    pub first_date_of_winter: DayMonth,
    /// Default: 1-sep
    pub first_date_of_spring: DayMonth,
    /// What to do with implausible values.
    ///
    /// Default: Warn
    pub sanity_check: SanityCheckPolicy,
    /// Number of records kept in the lookup cache.
    ///
    /// Default: 7
    pub cache_size: usize,
    /// CO2 concentration used when the file has none (ppm).
    ///
    /// Default: 350.0
    pub co2: f64,

    #[serde(skip)]
    cache: BTreeMap<NaiveDate, DailyRecord>,
    #[serde(skip)]
    yesterday: Option<DailyRecord>,
    #[serde(skip)]
    today: Option<DailyRecord>,
    #[serde(skip)]
    tomorrow: Option<DailyRecord>,
    #[serde(skip)]
    current: DailyWeather,
    #[serde(skip)]
    seasons: Seasons,
    #[serde(skip)]
    latitude: f64,
    #[serde(skip)]
    longitude: f64,
    #[serde(skip)]
    days_since_winter_solstice: Option<i64>,
    #[serde(skip)]
    qmax: f64,
}

impl Default for Weather {
    fn default() -> Self {
        let seasons = Seasons::default();
        Self {
            name: "Weather".to_string(),
            source: MetSource::default(),
            first_date_of_summer: seasons.summer,
            first_date_of_autumn: seasons.autumn,
            first_date_of_winter: seasons.winter,
            first_date_of_spring: seasons.spring,
            sanity_check: SanityCheckPolicy::Warn,
            cache_size: 7,
            co2: 350.0,
            cache: BTreeMap::new(),
            yesterday: None,
            today: None,
            tomorrow: None,
            current: DailyWeather::default(),
            seasons,
            latitude: 0.0,
            longitude: 0.0,
            days_since_winter_solstice: None,
            qmax: 0.0,
        }
    }
}

impl Weather {
    pub fn new(file_name: impl Into<PathBuf>) -> Self {
        Self {
            source: MetSource::new(file_name),
            ..Default::default()
        }
    }

    /// Open the met file. Returns `false` when it does not exist.
    pub fn open_data_file(&mut self) -> MetResult<bool> {
        self.source.open()
    }

    pub fn close_data_file(&mut self) {
        self.source.close();
    }

    /// Read from another file from now on.
    pub fn set_file_name(&mut self, file_name: impl Into<PathBuf>) {
        self.source.set_file_name(file_name);
        self.cache.clear();
    }

    /// The record for `date`, from the cache if possible.
    pub fn get_met_data(&mut self, date: NaiveDate) -> MetResult<DailyRecord> {
        if let Some(record) = self.cache.get(&date) {
            return Ok(record.clone());
        }
        let record = self.source.reader()?.read(date)?;
        debug!(%date, "Weather cache miss");
        self.cache.insert(date, record.clone());
        while self.cache.len() > self.cache_size.max(1) {
            self.cache.pop_first();
        }
        Ok(record)
    }

    /// Tomorrow's record, repeating `today` once the file has run out.
    fn read_tomorrow(&mut self, today: &DailyRecord) -> MetResult<DailyRecord> {
        let Some(date) = today.date.succ_opt() else {
            return Ok(today.clone());
        };
        let last_date = self.source.reader()?.last_date();
        if last_date.map_or(true, |last| date > last) {
            return Ok(today.redated(date));
        }
        self.get_met_data(date)
    }

    /// Name of the season today falls in.
    pub fn season(&self) -> &'static str {
        self.seasons.season(self.current.date)
    }

    /// Clear-sky radiation for today (MJ/m2).
    pub fn qmax(&self) -> f64 {
        self.qmax
    }

    pub fn days_since_winter_solstice(&self) -> i64 {
        self.days_since_winter_solstice.unwrap_or(0)
    }

    pub fn today(&self) -> Option<&DailyRecord> {
        self.today.as_ref()
    }

    fn reset(&mut self) {
        self.cache.clear();
        self.yesterday = None;
        self.today = None;
        self.tomorrow = None;
        self.current = DailyWeather::default();
        self.days_since_winter_solstice = None;
        self.qmax = 0.0;
    }

    /// TAV or AMP from the file constants, computing both if absent.
    fn long_term_constant(&mut self, name: &str) -> MetResult<f64> {
        let reader = self.source.reader()?;
        if let Some(value) = reader.constant(name)? {
            return Ok(value);
        }
        let (tav, amp) = reader.calculate_tav_amp()?;
        if reader.constant("tav")?.is_none() {
            reader.set_constant("tav", tav);
        }
        if reader.constant("amp")?.is_none() {
            reader.set_constant("amp", amp);
        }
        reader.constant(name)?.ok_or_else(|| MetError::MissingConstant {
            name: name.to_string(),
            file: reader.file_name(),
        })
    }
}

#[typetag::serde]
impl WeatherProvider for Weather {
    fn name(&self) -> &str {
        &self.name
    }

    fn on_commencing(&mut self, _clock: &Clock) -> MetResult<()> {
        self.close_data_file();
        self.reset();
        Ok(())
    }

    fn on_start_of_simulation(&mut self, _clock: &Clock, _zone: &Zone) -> MetResult<()> {
        let reader = self.source.reader()?;
        self.latitude = reader.latitude()?;
        self.longitude = reader.longitude()?;
        self.seasons = Seasons {
            summer: self.first_date_of_summer,
            autumn: self.first_date_of_autumn,
            winter: self.first_date_of_winter,
            spring: self.first_date_of_spring,
        }
        .for_latitude(self.latitude);
        Ok(())
    }

    fn prepare_weather(&mut self, clock: &Clock) -> MetResult<()> {
        let date = clock.today();
        match self.tomorrow.take() {
            Some(next) if next.date == date => {
                self.yesterday = self.today.take();
                self.today = Some(next);
            }
            _ => {
                let today = self.get_met_data(date)?;
                self.yesterday = Some(today.clone());
                self.today = Some(today);
            }
        }
        let today = self
            .today
            .clone()
            .ok_or_else(|| MetError::NoDataForDate {
                file: self.source.display_name(),
                date,
            })?;
        self.tomorrow = Some(self.read_tomorrow(&today)?);
        self.current = DailyWeather::from_record(&today, self.co2);
        Ok(())
    }

    fn finalise_weather(&mut self, clock: &Clock, zone: &Zone) -> MetResult<Vec<String>> {
        let date = clock.today();
        self.current.derive(self.latitude, zone.altitude);

        // The first day is counted from the solstice and then advanced like any other.
        let days = self
            .days_since_winter_solstice
            .unwrap_or_else(|| utilities::days_since_winter_solstice(date, self.latitude));
        self.days_since_winter_solstice = Some(
            if date.ordinal() == utilities::winter_solstice_day(self.latitude, date.year()) {
                0
            } else {
                days + 1
            },
        );
        self.qmax = utilities::qmax(
            date.ordinal() + 1,
            self.latitude,
            utilities::TAZ,
            utilities::ALPHA,
            self.current.vp(),
        );

        apply_sanity(self.sanity_check, &self.current)
    }

    fn on_start_of_day(&mut self, clock: &Clock) -> Vec<SeasonEvent> {
        self.seasons.starting(clock.today())
    }

    fn on_end_of_day(&mut self, clock: &Clock) -> Vec<SeasonEvent> {
        self.seasons.ending(clock.today())
    }

    fn on_completed(&mut self) {
        self.close_data_file();
    }

    fn weather(&self) -> &DailyWeather {
        &self.current
    }

    fn weather_mut(&mut self) -> &mut DailyWeather {
        &mut self.current
    }

    fn yesterday(&self) -> Option<&DailyRecord> {
        self.yesterday.as_ref()
    }

    fn tomorrow(&self) -> Option<&DailyRecord> {
        self.tomorrow.as_ref()
    }

    fn latitude(&self) -> f64 {
        self.latitude
    }

    fn longitude(&self) -> f64 {
        self.longitude
    }

    fn tav(&mut self) -> MetResult<f64> {
        self.long_term_constant("tav")
    }

    fn amp(&mut self) -> MetResult<f64> {
        self.long_term_constant("amp")
    }

    fn value(&self, column: &str) -> MetResult<f64> {
        let reader = self
            .source
            .opened()
            .ok_or_else(|| MetError::WeatherFileNotFound(self.source.display_name()))?;
        let today = self
            .today
            .as_ref()
            .ok_or_else(|| MetError::UnknownColumn(column.to_string()))?;
        reader.column_value(today, column)
    }
}
