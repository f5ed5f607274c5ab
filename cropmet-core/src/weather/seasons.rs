use crate::clock::DayMonth;
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Season boundary notifications raised by [`Weather`](crate::weather::Weather).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SeasonEvent {
    StartOfSummer,
    StartOfAutumn,
    StartOfWinter,
    StartOfSpring,
    EndOfSummer,
    EndOfAutumn,
    EndOfWinter,
    EndOfSpring,
}

impl fmt::Display for SeasonEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

/// First day of each season.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Seasons {
    pub summer: DayMonth,
    pub autumn: DayMonth,
    pub winter: DayMonth,
    pub spring: DayMonth,
}

impl Default for Seasons {
    /// Southern hemisphere seasons.
    fn default() -> Self {
        Self {
            summer: DayMonth::first_of(12),
            autumn: DayMonth::first_of(3),
            winter: DayMonth::first_of(6),
            spring: DayMonth::first_of(9),
        }
    }
}

impl Seasons {
    /// Swap summer with winter and spring with autumn north of the equator.
    pub fn for_latitude(self, latitude: f64) -> Self {
        if latitude > 0.0 {
            Self {
                summer: self.winter,
                autumn: self.spring,
                winter: self.summer,
                spring: self.autumn,
            }
        } else {
            self
        }
    }

    fn starts(&self) -> [(DayMonth, SeasonEvent, SeasonEvent); 4] {
        [
            (self.summer, SeasonEvent::StartOfSummer, SeasonEvent::EndOfSpring),
            (self.autumn, SeasonEvent::StartOfAutumn, SeasonEvent::EndOfSummer),
            (self.winter, SeasonEvent::StartOfWinter, SeasonEvent::EndOfAutumn),
            (self.spring, SeasonEvent::StartOfSpring, SeasonEvent::EndOfWinter),
        ]
    }

    /// Seasons starting on `today`.
    pub fn starting(&self, today: NaiveDate) -> Vec<SeasonEvent> {
        self.starts()
            .iter()
            .filter(|(start, _, _)| start.matches(today))
            .map(|(_, event, _)| *event)
            .collect()
    }

    /// Seasons ending on `today`, i.e. whose successor starts tomorrow.
    pub fn ending(&self, today: NaiveDate) -> Vec<SeasonEvent> {
        let Some(tomorrow) = today.succ_opt() else {
            return Vec::new();
        };
        self.starts()
            .iter()
            .filter(|(start, _, _)| start.matches(tomorrow))
            .map(|(_, _, event)| *event)
            .collect()
    }

    /// Name of the season `date` falls in.
    pub fn season(&self, date: NaiveDate) -> &'static str {
        let names = ["Summer", "Autumn", "Winter", "Spring"];
        let most_recent_start = |start: DayMonth| {
            let in_year = |year: i32| {
                start
                    .in_year(year)
                    .or_else(|| NaiveDate::from_ymd_opt(year, start.month(), 28))
            };
            match in_year(date.year()) {
                Some(d) if d <= date => Some(d),
                _ => in_year(date.year() - 1),
            }
        };
        let starts = [self.summer, self.autumn, self.winter, self.spring];
        starts
            .iter()
            .zip(names)
            .filter_map(|(start, name)| most_recent_start(*start).map(|d| (d, name)))
            .max_by_key(|(d, _)| *d)
            .map(|(_, name)| name)
            .unwrap_or("Summer")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn northern_hemisphere_swaps_seasons() {
        let seasons = Seasons::default().for_latitude(45.0);
        assert_eq!(seasons.summer, "1-jun".parse().unwrap());
        assert_eq!(seasons.winter, "1-dec".parse().unwrap());
        assert_eq!(seasons.spring, "1-mar".parse().unwrap());
        assert_eq!(seasons.autumn, "1-sep".parse().unwrap());
        assert_eq!(Seasons::default().for_latitude(-27.0), Seasons::default());
    }

    #[test]
    fn start_and_end_events() {
        let seasons = Seasons::default();
        assert_eq!(seasons.starting(date(2021, 3, 1)), [SeasonEvent::StartOfAutumn]);
        assert!(seasons.starting(date(2021, 3, 2)).is_empty());
        assert_eq!(seasons.ending(date(2021, 2, 28)), [SeasonEvent::EndOfSummer]);
        assert_eq!(seasons.ending(date(2021, 11, 30)), [SeasonEvent::EndOfSpring]);
        assert!(seasons.ending(date(2021, 3, 1)).is_empty());
    }

    #[test]
    fn season_names() {
        let seasons = Seasons::default();
        assert_eq!(seasons.season(date(2021, 1, 15)), "Summer");
        assert_eq!(seasons.season(date(2021, 4, 15)), "Autumn");
        assert_eq!(seasons.season(date(2021, 7, 15)), "Winter");
        assert_eq!(seasons.season(date(2021, 9, 1)), "Spring");
        assert_eq!(seasons.season(date(2021, 12, 1)), "Summer");
    }
}
