use crate::clock::Clock;
use crate::errors::{MetError, MetResult};
use crate::met::reader::MetSource;
use crate::met::record::DailyRecord;
use crate::met::utilities;
use crate::weather::{apply_sanity, DailyWeather, SanityCheckPolicy, WeatherProvider};
use crate::zone::Zone;
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// File-backed weather that keeps only yesterday, today and tomorrow.
///
/// Implausible values stop the simulation by default.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimpleWeather {
    pub name: String,
    #[serde(flatten)]
    pub source: MetSource,
    /// Default: Fail
    pub sanity_check: SanityCheckPolicy,
    /// CO2 concentration used when the file has none (ppm).
    ///
    /// Default: 420.0
    pub co2: f64,

    #[serde(skip)]
    yesterday: Option<DailyRecord>,
    #[serde(skip)]
    today: Option<DailyRecord>,
    #[serde(skip)]
    tomorrow: Option<DailyRecord>,
    #[serde(skip)]
    current: DailyWeather,
    #[serde(skip)]
    latitude: f64,
    #[serde(skip)]
    longitude: f64,
}

impl Default for SimpleWeather {
    fn default() -> Self {
        Self {
            name: "SimpleWeather".to_string(),
            source: MetSource::default(),
            sanity_check: SanityCheckPolicy::Fail,
            co2: 420.0,
            yesterday: None,
            today: None,
            tomorrow: None,
            current: DailyWeather::default(),
            latitude: 0.0,
            longitude: 0.0,
        }
    }
}

impl SimpleWeather {
    pub fn new(file_name: impl Into<PathBuf>) -> Self {
        Self {
            source: MetSource::new(file_name),
            ..Default::default()
        }
    }

    /// Read a record and fill in its diffuse fraction.
    fn read(&mut self, date: NaiveDate) -> MetResult<DailyRecord> {
        let latitude = self.latitude;
        let mut record = self.source.reader()?.read(date)?;
        if record.diffuse_fraction.is_none() {
            record.diffuse_fraction = Some(utilities::diffuse_fraction(
                date.ordinal(),
                latitude,
                record.radn,
            ));
        }
        Ok(record)
    }

    /// The record for `date`, or `fallback` moved to `date` when the file
    /// does not cover it.
    fn read_or(&mut self, date: NaiveDate, fallback: &DailyRecord) -> MetResult<DailyRecord> {
        let reader = self.source.reader()?;
        let covered = match (reader.first_date(), reader.last_date()) {
            (Some(first), Some(last)) => first <= date && date <= last,
            _ => false,
        };
        if covered {
            self.read(date)
        } else {
            Ok(fallback.redated(date))
        }
    }
}

#[typetag::serde]
impl WeatherProvider for SimpleWeather {
    fn name(&self) -> &str {
        &self.name
    }

    fn on_commencing(&mut self, _clock: &Clock) -> MetResult<()> {
        self.source.close();
        self.yesterday = None;
        self.today = None;
        self.tomorrow = None;
        self.current = DailyWeather::default();
        Ok(())
    }

    fn on_start_of_simulation(&mut self, _clock: &Clock, _zone: &Zone) -> MetResult<()> {
        let reader = self.source.reader()?;
        self.latitude = reader.latitude()?;
        self.longitude = reader.longitude()?;
        Ok(())
    }

    fn prepare_weather(&mut self, clock: &Clock) -> MetResult<()> {
        let date = clock.today();
        let today = match self.tomorrow.take() {
            Some(next) if next.date == date => {
                self.yesterday = self.today.take();
                next
            }
            _ => {
                let today = self.read(date)?;
                self.yesterday = Some(match date.pred_opt() {
                    Some(previous) => self.read_or(previous, &today)?,
                    None => today.clone(),
                });
                today
            }
        };
        let tomorrow = match date.succ_opt() {
            Some(next) => self.read_or(next, &today)?,
            None => today.clone(),
        };
        self.current = DailyWeather::from_record(&today, self.co2);
        self.today = Some(today);
        self.tomorrow = Some(tomorrow);
        Ok(())
    }

    fn finalise_weather(&mut self, _clock: &Clock, zone: &Zone) -> MetResult<Vec<String>> {
        self.current.derive(self.latitude, zone.altitude);
        apply_sanity(self.sanity_check, &self.current)
    }

    fn on_completed(&mut self) {
        self.source.close();
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
        let reader = self.source.reader()?;
        match reader.constant("tav")? {
            Some(tav) => Ok(tav),
            None => Ok(reader.calculate_tav_amp()?.0),
        }
    }

    fn amp(&mut self) -> MetResult<f64> {
        let reader = self.source.reader()?;
        match reader.constant("amp")? {
            Some(amp) => Ok(amp),
            None => Ok(reader.calculate_tav_amp()?.1),
        }
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

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const MET: &str = "\
latitude = -35.0
year day maxt mint radn rain
() () () () () ()
2021 10 20 8 15 0
2021 11 21 9 16 2
2021 12 22 25 17 0
";

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2021, 1, d).unwrap()
    }

    fn provider(dir: &std::path::Path) -> SimpleWeather {
        let path = dir.join("simple.met");
        fs::write(&path, MET).unwrap();
        SimpleWeather::new(path)
    }

    #[test]
    fn window_uses_neighbouring_days() {
        let dir = tempfile::tempdir().unwrap();
        let mut weather = provider(dir.path());
        let clock = Clock::new(date(11), date(11)).unwrap();
        let zone = Zone::default();
        weather.on_start_of_simulation(&clock, &zone).unwrap();
        weather.prepare_weather(&clock).unwrap();

        assert_eq!(weather.yesterday().unwrap().max_t, 20.0);
        assert_eq!(weather.tomorrow().unwrap().max_t, 22.0);
        assert_eq!(weather.weather().co2, 420.0);
        assert!(weather.weather().diffuse_fraction.is_some());
        assert!(weather.finalise_weather(&clock, &zone).unwrap().is_empty());
    }

    #[test]
    fn first_day_of_file_is_its_own_yesterday() {
        let dir = tempfile::tempdir().unwrap();
        let mut weather = provider(dir.path());
        let clock = Clock::new(date(10), date(10)).unwrap();
        weather
            .on_start_of_simulation(&clock, &Zone::default())
            .unwrap();
        weather.prepare_weather(&clock).unwrap();
        let yesterday = weather.yesterday().unwrap();
        assert_eq!(yesterday.date, date(9));
        assert_eq!(yesterday.max_t, 20.0);
    }

    #[test]
    fn inverted_temperatures_stop_the_run() {
        let dir = tempfile::tempdir().unwrap();
        let mut weather = provider(dir.path());
        let mut clock = Clock::new(date(11), date(12)).unwrap();
        let zone = Zone::default();
        weather.on_start_of_simulation(&clock, &zone).unwrap();
        weather.prepare_weather(&clock).unwrap();
        weather.finalise_weather(&clock, &zone).unwrap();
        clock.advance();
        weather.prepare_weather(&clock).unwrap();
        // Last row: tomorrow repeats today.
        assert_eq!(weather.tomorrow().unwrap().date, date(13));
        assert!(matches!(
            weather.finalise_weather(&clock, &zone),
            Err(MetError::SanityCheck { .. })
        ));

        weather.sanity_check = SanityCheckPolicy::Warn;
        assert_eq!(weather.finalise_weather(&clock, &zone).unwrap().len(), 1);
    }
}
