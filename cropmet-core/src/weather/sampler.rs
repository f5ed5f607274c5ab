//! Year resampling of a weather file
//!
//! The simulation is cut into periods at a split date (1 January by
//! default). Each period replays one whole year of the file, chosen from a
//! sequence that is either given by the user or drawn at random. Only years
//! whose full period, from the split date to the day before the next split
//! date, lies inside the file can be drawn.
//!
//! A simulated 29th of February falling in a common source year reuses the
//! 28th; a source 29th of February with no simulated counterpart is skipped.

use crate::clock::{Clock, DayMonth};
use crate::errors::{MetError, MetResult};
use crate::met::reader::MetSource;
use crate::met::record::DailyRecord;
use crate::weather::{apply_sanity, DailyWeather, SanityCheckPolicy, WeatherProvider};
use crate::zone::Zone;
use chrono::{Datelike, NaiveDate};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SamplingMethod {
    /// Replay the listed years in order, starting again once exhausted.
    #[default]
    SpecificYears,
    /// Draw each period's year independently.
    RandomSample,
    /// Draw a first year and continue with consecutive years.
    RandomChooseFirstYear,
}

/// Build the sequence of source years.
///
/// `complete` lists the years that can be sampled in ascending order and
/// `required` is the number of periods in the simulation. Returns `None`
/// when the method cannot be satisfied.
pub fn generate_sequence<R: Rng + ?Sized>(
    method: SamplingMethod,
    years: &[i32],
    complete: &[i32],
    required: usize,
    rng: &mut R,
) -> Option<Vec<i32>> {
    match method {
        SamplingMethod::SpecificYears => {
            if years.is_empty() || years.iter().any(|y| !complete.contains(y)) {
                None
            } else {
                Some(years.to_vec())
            }
        }
        SamplingMethod::RandomSample => {
            if complete.is_empty() {
                return None;
            }
            Some(
                (0..required)
                    .map(|_| complete[rng.gen_range(0..complete.len())])
                    .collect(),
            )
        }
        SamplingMethod::RandomChooseFirstYear => {
            if required == 0 || complete.len() < required {
                return None;
            }
            let first = rng.gen_range(0..=complete.len() - required);
            Some(complete[first..first + required].to_vec())
        }
    }
}

/// Replays whole years of a met file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WeatherSampler {
    pub name: String,
    #[serde(flatten)]
    pub source: MetSource,
    /// Default: SpecificYears
    pub type_of_sampling: SamplingMethod,
    /// Years to replay with [`SamplingMethod::SpecificYears`].
    pub years: Vec<i32>,
    /// Seed for the random methods. Entropy from the system when unset.
    pub seed: Option<u64>,
    /// Day on which the next sampled year starts.
    ///
    /// Default: 1-jan
    pub split_date: DayMonth,
    /// Default: Warn
    pub sanity_check: SanityCheckPolicy,
    /// Default: 350.0
    pub co2: f64,

    #[serde(skip)]
    records: BTreeMap<NaiveDate, DailyRecord>,
    #[serde(skip)]
    sequence: Vec<i32>,
    #[serde(skip)]
    index: usize,
    /// Calendar year of the split date that opened the current period.
    #[serde(skip)]
    period_year: i32,
    #[serde(skip)]
    yesterday: Option<DailyRecord>,
    #[serde(skip)]
    tomorrow: Option<DailyRecord>,
    #[serde(skip)]
    current: DailyWeather,
    #[serde(skip)]
    latitude: f64,
    #[serde(skip)]
    longitude: f64,
}

impl Default for WeatherSampler {
    fn default() -> Self {
        Self {
            name: "WeatherSampler".to_string(),
            source: MetSource::default(),
            type_of_sampling: SamplingMethod::SpecificYears,
            years: Vec::new(),
            seed: None,
            split_date: DayMonth::first_of(1),
            sanity_check: SanityCheckPolicy::Warn,
            co2: 350.0,
            records: BTreeMap::new(),
            sequence: Vec::new(),
            index: 0,
            period_year: 0,
            yesterday: None,
            tomorrow: None,
            current: DailyWeather::default(),
            latitude: 0.0,
            longitude: 0.0,
        }
    }
}

impl WeatherSampler {
    pub fn new(file_name: impl Into<PathBuf>) -> Self {
        Self {
            source: MetSource::new(file_name),
            ..Default::default()
        }
    }

    pub fn with_years(mut self, years: Vec<i32>) -> Self {
        self.type_of_sampling = SamplingMethod::SpecificYears;
        self.years = years;
        self
    }

    pub fn with_random(mut self, method: SamplingMethod, seed: Option<u64>) -> Self {
        self.type_of_sampling = method;
        self.seed = seed;
        self
    }

    /// The split date in `year`, the 28th for a 29th of February split in a
    /// common year.
    fn split_in(&self, year: i32) -> Option<NaiveDate> {
        self.split_date
            .in_year(year)
            .or_else(|| NaiveDate::from_ymd_opt(year, self.split_date.month(), 28))
    }

    fn is_split(&self, date: NaiveDate) -> bool {
        self.split_in(date.year()) == Some(date)
    }

    /// Year of the most recent split on or before `date`.
    fn period_year_of(&self, date: NaiveDate) -> i32 {
        match self.split_in(date.year()) {
            Some(split) if split <= date => date.year(),
            _ => date.year() - 1,
        }
    }

    /// Years whose whole period is in the file.
    pub fn complete_years(&self) -> Vec<i32> {
        let (Some(first), Some(last)) = (
            self.records.keys().next().copied(),
            self.records.keys().next_back().copied(),
        ) else {
            return Vec::new();
        };
        (first.year() - 1..=last.year())
            .filter(|&year| {
                match (self.split_in(year), self.split_in(year + 1)) {
                    (Some(start), Some(next)) => {
                        first <= start && next.pred_opt().is_some_and(|end| end <= last)
                    }
                    _ => false,
                }
            })
            .collect()
    }

    /// Number of periods between `start` and `end` inclusive.
    pub fn required_years(&self, start: NaiveDate, end: NaiveDate) -> usize {
        1 + start
            .iter_days()
            .skip(1)
            .take_while(|d| *d <= end)
            .filter(|d| self.is_split(*d))
            .count()
    }

    /// Years replayed, in order.
    pub fn sequence(&self) -> &[i32] {
        &self.sequence
    }

    /// Year of the file being replayed for the current period.
    pub fn current_year(&self) -> Option<i32> {
        if self.sequence.is_empty() {
            None
        } else {
            Some(self.sequence[self.index % self.sequence.len()])
        }
    }

    /// Source date replayed on simulated `date`.
    fn source_date(&self, date: NaiveDate) -> Option<NaiveDate> {
        let year = self.current_year()? + (date.year() - self.period_year);
        NaiveDate::from_ymd_opt(year, date.month(), date.day())
            .or_else(|| NaiveDate::from_ymd_opt(year, date.month(), 28))
    }

    fn record_for(&self, date: NaiveDate) -> Option<DailyRecord> {
        let source = self.source_date(date)?;
        self.records.get(&source).map(|r| r.redated(date))
    }

    fn file_name(&self) -> String {
        self.source.display_name()
    }
}

#[typetag::serde]
impl WeatherProvider for WeatherSampler {
    fn name(&self) -> &str {
        &self.name
    }

    fn on_commencing(&mut self, _clock: &Clock) -> MetResult<()> {
        self.source.close();
        self.records.clear();
        self.sequence.clear();
        self.index = 0;
        Ok(())
    }

    fn on_start_of_simulation(&mut self, clock: &Clock, _zone: &Zone) -> MetResult<()> {
        let reader = self.source.reader()?;
        self.latitude = reader.latitude()?;
        self.longitude = reader.longitude()?;
        self.records = reader
            .read_all()?
            .into_iter()
            .map(|record| (record.date, record))
            .collect();

        let complete = self.complete_years();
        let required = self.required_years(clock.start_date(), clock.end_date());
        if complete.is_empty() {
            return Err(MetError::InsufficientYears {
                file: self.file_name(),
                available: 0,
                required: 1,
            });
        }
        if self.type_of_sampling == SamplingMethod::SpecificYears {
            if self.years.is_empty() {
                return Err(MetError::InvalidParameter {
                    name: "years".to_string(),
                    message: "no years given to sample".to_string(),
                });
            }
            if let Some(year) = self.years.iter().find(|y| !complete.contains(y)) {
                return Err(MetError::IncompleteYear {
                    file: self.file_name(),
                    year: *year,
                });
            }
        }

        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        self.sequence = generate_sequence(
            self.type_of_sampling,
            &self.years,
            &complete,
            required,
            &mut rng,
        )
        .ok_or_else(|| MetError::InsufficientYears {
            file: self.file_name(),
            available: complete.len(),
            required,
        })?;
        self.index = 0;
        self.period_year = self.period_year_of(clock.start_date());
        info!(
            file = %self.file_name(),
            sequence = ?self.sequence,
            "Sampling weather years"
        );
        Ok(())
    }

    fn prepare_weather(&mut self, clock: &Clock) -> MetResult<()> {
        let date = clock.today();
        if date != clock.start_date() && self.is_split(date) {
            self.index += 1;
            self.period_year = date.year();
            debug!(%date, year = ?self.current_year(), "Next sampled year");
        }
        let today = self.record_for(date).ok_or_else(|| MetError::NoDataForDate {
            file: self.file_name(),
            date,
        })?;
        self.yesterday = date.pred_opt().and_then(|d| self.record_for(d));
        self.tomorrow = date.succ_opt().and_then(|d| self.record_for(d));
        self.current = DailyWeather::from_record(&today, self.co2);
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
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fmt::Write as _;
    use std::fs;
    use std::path::Path;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    /// Daily file from `start` to `end` whose max temperature is the year.
    fn write_met(dir: &Path, start: NaiveDate, end: NaiveDate) -> PathBuf {
        let mut text = String::from("latitude = -30\nyear day maxt mint radn rain\n() () () () () ()\n");
        for d in start.iter_days().take_while(|d| *d <= end) {
            let max_t = d.year() as f64 / 100.0;
            writeln!(text, "{} {} {max_t} 5 15 0", d.year(), d.ordinal()).unwrap();
        }
        let path = dir.join("sample.met");
        fs::write(&path, text).unwrap();
        path
    }

    #[test]
    fn random_sample_stays_within_complete_years() {
        let complete: Vec<i32> = (2001..=2005).collect();
        let mut rng = StdRng::seed_from_u64(42);
        let drawn = generate_sequence(
            SamplingMethod::RandomSample,
            &[],
            &complete,
            10_000,
            &mut rng,
        )
        .unwrap();
        assert_eq!(drawn.len(), 10_000);
        assert!(drawn.iter().all(|y| (2001..=2005).contains(y)));
        // Every year gets drawn.
        assert!(complete.iter().all(|y| drawn.contains(y)));
    }

    #[test]
    fn random_first_year_is_contiguous() {
        let complete: Vec<i32> = (2001..=2005).collect();
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..100 {
            let run = generate_sequence(
                SamplingMethod::RandomChooseFirstYear,
                &[],
                &complete,
                3,
                &mut rng,
            )
            .unwrap();
            assert_eq!(run.len(), 3);
            assert!(run.windows(2).all(|w| w[1] == w[0] + 1));
            assert!(run[2] <= 2005);
        }
        assert!(generate_sequence(
            SamplingMethod::RandomChooseFirstYear,
            &[],
            &complete,
            6,
            &mut rng
        )
        .is_none());
    }

    #[test]
    fn partial_years_are_not_complete() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_met(dir.path(), date(2000, 6, 1), date(2003, 3, 31));
        let mut sampler = WeatherSampler::new(path).with_years(vec![2001]);
        let clock = Clock::new(date(2020, 1, 1), date(2020, 1, 1)).unwrap();
        sampler
            .on_start_of_simulation(&clock, &Zone::default())
            .unwrap();
        assert_eq!(sampler.complete_years(), vec![2001, 2002]);
    }

    #[test]
    fn specific_years_cycle() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_met(dir.path(), date(2001, 1, 1), date(2003, 12, 31));
        let mut sampler = WeatherSampler::new(path).with_years(vec![2003, 2001]);
        let mut clock = Clock::new(date(2010, 12, 31), date(2013, 1, 1)).unwrap();
        let zone = Zone::default();
        sampler.on_start_of_simulation(&clock, &zone).unwrap();

        let mut by_year = BTreeMap::new();
        loop {
            sampler.prepare_weather(&clock).unwrap();
            by_year
                .entry(clock.today().year())
                .or_insert(sampler.weather().max_t);
            if !clock.advance() {
                break;
            }
        }
        assert_eq!(by_year[&2010], 20.03);
        assert_eq!(by_year[&2011], 20.01);
        assert_eq!(by_year[&2012], 20.03);
        assert_eq!(by_year[&2013], 20.01);
    }

    #[test]
    fn leap_day_reuses_the_28th() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_met(dir.path(), date(2001, 1, 1), date(2001, 12, 31));
        let mut sampler = WeatherSampler::new(path).with_years(vec![2001]);
        let mut clock = Clock::new(date(2004, 2, 28), date(2004, 3, 1)).unwrap();
        sampler
            .on_start_of_simulation(&clock, &Zone::default())
            .unwrap();
        let mut dates = Vec::new();
        loop {
            sampler.prepare_weather(&clock).unwrap();
            dates.push(sampler.weather().date);
            if !clock.advance() {
                break;
            }
        }
        assert_eq!(dates, [date(2004, 2, 28), date(2004, 2, 29), date(2004, 3, 1)]);
    }

    #[test]
    fn leap_day_split_falls_on_the_28th_in_common_years() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_met(dir.path(), date(2001, 1, 1), date(2003, 12, 31));
        let mut sampler = WeatherSampler::new(path).with_years(vec![2001]);
        sampler.split_date = "29-feb".parse().unwrap();
        let mut clock = Clock::new(date(2010, 3, 1), date(2011, 3, 5)).unwrap();
        assert_eq!(sampler.required_years(clock.start_date(), clock.end_date()), 2);
        sampler
            .on_start_of_simulation(&clock, &Zone::default())
            .unwrap();

        let mut max_t = BTreeMap::new();
        loop {
            sampler.prepare_weather(&clock).unwrap();
            max_t.insert(clock.today(), sampler.weather().max_t);
            if !clock.advance() {
                break;
            }
        }
        assert_eq!(max_t[&date(2010, 3, 1)], 20.01);
        // The tail of the 2001 period is read from early 2002.
        assert_eq!(max_t[&date(2011, 2, 27)], 20.02);
        assert_eq!(max_t[&date(2011, 2, 28)], 20.01);
        assert_eq!(max_t[&date(2011, 3, 5)], 20.01);
    }

    #[test]
    fn incomplete_year_is_a_configuration_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_met(dir.path(), date(2001, 1, 1), date(2002, 6, 30));
        let mut sampler = WeatherSampler::new(path).with_years(vec![2002]);
        let clock = Clock::new(date(2020, 1, 1), date(2020, 12, 31)).unwrap();
        assert!(matches!(
            sampler.on_start_of_simulation(&clock, &Zone::default()),
            Err(MetError::IncompleteYear { year: 2002, .. })
        ));

        let mut sampler = WeatherSampler::new(sampler.source.file_name.clone())
            .with_random(SamplingMethod::RandomChooseFirstYear, Some(1));
        let clock = Clock::new(date(2020, 1, 1), date(2021, 12, 31)).unwrap();
        assert!(matches!(
            sampler.on_start_of_simulation(&clock, &Zone::default()),
            Err(MetError::InsufficientYears {
                available: 1,
                required: 2,
                ..
            })
        ));
    }
}
