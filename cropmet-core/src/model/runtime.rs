//! Simulation struct and the daily event loop.

use crate::clock::Clock;
use crate::component::{DailyComponent, WeatherModifier};
use crate::errors::{MetError, MetResult};
use crate::summary::{MessageType, Summary};
use crate::weather::{DailyWeather, SeasonEvent, WeatherProvider};
use crate::zone::Zone;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Everything known about one simulated day once it has been run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayReport {
    pub date: NaiveDate,
    pub weather: DailyWeather,
    /// Season starts then season ends raised on the day.
    pub events: Vec<SeasonEvent>,
    /// Outputs of each daily component, in the order they were added.
    pub outputs: Vec<(String, f64)>,
}

/// A weather provider with its modifiers and consumers, run one day at a time.
#[derive(Debug, Serialize, Deserialize)]
pub struct Simulation {
    clock: Clock,
    zone: Zone,
    weather: Box<dyn WeatherProvider>,
    modifiers: Vec<Box<dyn WeatherModifier>>,
    components: Vec<Box<dyn DailyComponent>>,
    #[serde(skip)]
    summary: Summary,
    #[serde(skip)]
    started: bool,
}

impl Simulation {
    pub fn new(
        clock: Clock,
        zone: Zone,
        weather: Box<dyn WeatherProvider>,
        modifiers: Vec<Box<dyn WeatherModifier>>,
        components: Vec<Box<dyn DailyComponent>>,
    ) -> Self {
        Self {
            clock,
            zone,
            weather,
            modifiers,
            components,
            summary: Summary::new(),
            started: false,
        }
    }

    /// Fire the commencing and start of simulation events.
    ///
    /// Called by [`Simulation::step`] on the first day if not called before.
    pub fn start(&mut self) -> MetResult<()> {
        self.clock.reset();
        self.summary.clear();
        self.weather.on_commencing(&self.clock)?;
        if let Err(e) = self.start_models() {
            self.weather.on_completed();
            return Err(e);
        }
        self.started = true;
        info!(
            weather = self.weather.name(),
            start = %self.clock.start_date(),
            end = %self.clock.end_date(),
            "Simulation started"
        );
        Ok(())
    }

    fn start_models(&mut self) -> MetResult<()> {
        self.weather.on_start_of_simulation(&self.clock, &self.zone)?;
        for modifier in self.modifiers.iter_mut() {
            modifier.on_start_of_simulation(self.weather.as_ref(), &self.zone)?;
        }
        for component in self.components.iter_mut() {
            component.on_start_of_simulation(self.weather.as_ref(), &self.zone)?;
        }
        let name = self.weather.name().to_string();
        for warning in self.weather.validate() {
            self.summary
                .write_message(&name, None, warning, MessageType::Warning);
        }
        Ok(())
    }

    /// Run the current day and move the clock to the next.
    pub fn step(&mut self) -> MetResult<DayReport> {
        if !self.started {
            self.start()?;
        }
        if self.finished() {
            return Err(MetError::Error(format!(
                "Simulation finished on {}",
                self.clock.end_date()
            )));
        }
        match self.step_day() {
            Ok(report) => {
                if !self.clock.advance() {
                    self.weather.on_completed();
                }
                Ok(report)
            }
            Err(e) => {
                self.weather.on_completed();
                Err(e)
            }
        }
    }

    fn step_day(&mut self) -> MetResult<DayReport> {
        let date = self.clock.today();
        let name = self.weather.name().to_string();

        self.weather.prepare_weather(&self.clock)?;
        for modifier in self.modifiers.iter_mut() {
            modifier.on_weather_prepared(self.weather.as_mut(), &self.clock)?;
        }
        for warning in self.weather.finalise_weather(&self.clock, &self.zone)? {
            self.summary
                .write_message(&name, Some(date), warning, MessageType::Warning);
        }

        let mut events = self.weather.on_start_of_day(&self.clock);
        for component in self.components.iter_mut() {
            component.on_daily_initialisation(self.weather.as_ref(), &self.clock)?;
        }
        let outputs = self
            .components
            .iter()
            .flat_map(|component| component.outputs())
            .collect();
        events.extend(self.weather.on_end_of_day(&self.clock));
        for event in &events {
            self.summary
                .write_message(&name, Some(date), event.to_string(), MessageType::Information);
        }
        debug!(%date, "Simulated day");

        Ok(DayReport {
            date,
            weather: self.weather.weather().clone(),
            events,
            outputs,
        })
    }

    /// Run every remaining day.
    pub fn run(&mut self) -> MetResult<Vec<DayReport>> {
        let mut reports = Vec::new();
        while !self.started || !self.finished() {
            reports.push(self.step()?);
        }
        Ok(reports)
    }

    pub fn finished(&self) -> bool {
        self.clock.finished()
    }

    pub fn current_date(&self) -> NaiveDate {
        self.clock.today()
    }

    pub fn clock(&self) -> &Clock {
        &self.clock
    }

    pub fn zone(&self) -> &Zone {
        &self.zone
    }

    pub fn weather(&self) -> &dyn WeatherProvider {
        self.weather.as_ref()
    }

    pub fn weather_mut(&mut self) -> &mut dyn WeatherProvider {
        self.weather.as_mut()
    }

    pub fn components(&self) -> &[Box<dyn DailyComponent>] {
        &self.components
    }

    pub fn summary(&self) -> &Summary {
        &self.summary
    }
}
