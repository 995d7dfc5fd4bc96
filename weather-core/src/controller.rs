//! Presentation state machine.
//!
//! [`State::update`] is the only place state changes. It performs no I/O and
//! instead hands back the next [`Command`] to run; [`Controller`] runs those
//! commands against a [`WeatherProvider`] and feeds the results back in.
//!
//! Every search gets a sequence number. Results tagged with an older number
//! belong to a superseded search and are dropped.

use chrono::{Datelike, Days, FixedOffset, Local, NaiveDate, Offset};
use tracing::{debug, info, warn};

use crate::{
    CurrentWeather, DayOffset, ForecastEntry, ForecastList, WeatherError, WeatherProvider,
    WeatherView,
};

pub const EMPTY_QUERY_MESSAGE: &str = "Please Enter a City.";
pub const NOT_FOUND_MESSAGE: &str = "City not found.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Empty,
    Loading,
    ShownCurrent,
    ShownForecast,
    Error,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ForecastStatus {
    /// No lookup yet, or the current result carried no location id.
    NotRequested,
    Pending,
    Ready(ForecastList),
    /// The forecast lookup failed; current weather stays on display.
    Failed(String),
}

#[derive(Debug)]
pub enum Event {
    QueryChanged(String),
    SearchRequested,
    CurrentLoaded {
        seq: u64,
        result: Result<CurrentWeather, WeatherError>,
    },
    ForecastLoaded {
        seq: u64,
        result: Result<ForecastList, WeatherError>,
    },
    DaySelected {
        offset: DayOffset,
        today: NaiveDate,
        utc_offset: FixedOffset,
    },
}

/// Side effect requested by a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    FetchCurrent { seq: u64, city: String },
    FetchForecast { seq: u64, location_id: u64 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct State {
    query: String,
    phase: Phase,
    error: Option<String>,
    current: Option<CurrentWeather>,
    forecast: ForecastStatus,
    view: Option<WeatherView>,
    selected_day: Option<DayOffset>,
    seq: u64,
}

impl Default for State {
    fn default() -> Self {
        Self {
            query: String::new(),
            phase: Phase::Empty,
            error: None,
            current: None,
            forecast: ForecastStatus::NotRequested,
            view: None,
            selected_day: None,
            seq: 0,
        }
    }
}

impl State {
    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn current(&self) -> Option<&CurrentWeather> {
        self.current.as_ref()
    }

    pub fn forecast(&self) -> &ForecastStatus {
        &self.forecast
    }

    pub fn view(&self) -> Option<&WeatherView> {
        self.view.as_ref()
    }

    pub fn selected_day(&self) -> Option<DayOffset> {
        self.selected_day
    }

    pub fn update(&mut self, event: Event) -> Option<Command> {
        match event {
            Event::QueryChanged(text) => self.on_query_changed(text),
            Event::SearchRequested => self.on_search(),
            Event::CurrentLoaded { seq, result } => self.on_current(seq, result),
            Event::ForecastLoaded { seq, result } => self.on_forecast(seq, result),
            Event::DaySelected {
                offset,
                today,
                utc_offset,
            } => self.on_day_selected(offset, today, utc_offset),
        }
    }

    fn on_query_changed(&mut self, text: String) -> Option<Command> {
        if text.trim().is_empty() {
            // Keep the counter moving so in-flight responses go stale.
            let seq = self.seq + 1;
            *self = Self {
                seq,
                query: text,
                ..Self::default()
            };
        } else {
            self.query = text;
        }
        None
    }

    fn on_search(&mut self) -> Option<Command> {
        let city = self.query.trim();
        if city.is_empty() {
            self.phase = Phase::Error;
            self.error = Some(EMPTY_QUERY_MESSAGE.to_string());
            self.view = None;
            return None;
        }

        let city = city.to_string();
        self.seq += 1;
        self.phase = Phase::Loading;
        self.error = None;
        info!(%city, seq = self.seq, "searching");

        Some(Command::FetchCurrent { seq: self.seq, city })
    }

    fn on_current(
        &mut self,
        seq: u64,
        result: Result<CurrentWeather, WeatherError>,
    ) -> Option<Command> {
        if self.is_stale(seq) {
            return None;
        }

        match result {
            Ok(current) => {
                self.phase = Phase::ShownCurrent;
                self.error = None;
                self.selected_day = None;
                self.view = Some(WeatherView::from_current(&current));

                let command = current.location_id.map(|location_id| Command::FetchForecast {
                    seq,
                    location_id,
                });
                self.forecast = if command.is_some() {
                    ForecastStatus::Pending
                } else {
                    ForecastStatus::NotRequested
                };
                self.current = Some(current);
                command
            }
            Err(e) => {
                warn!(error = %e, "current weather lookup failed");
                self.phase = Phase::Error;
                self.error = Some(NOT_FOUND_MESSAGE.to_string());
                self.current = None;
                self.view = None;
                self.selected_day = None;
                self.forecast = ForecastStatus::NotRequested;
                None
            }
        }
    }

    fn on_forecast(
        &mut self,
        seq: u64,
        result: Result<ForecastList, WeatherError>,
    ) -> Option<Command> {
        if self.is_stale(seq) {
            return None;
        }

        self.forecast = match result {
            Ok(list) => ForecastStatus::Ready(list),
            Err(e) => {
                warn!(error = %e, "forecast lookup failed");
                ForecastStatus::Failed(e.to_string())
            }
        };
        None
    }

    fn on_day_selected(
        &mut self,
        offset: DayOffset,
        today: NaiveDate,
        utc_offset: FixedOffset,
    ) -> Option<Command> {
        self.select_day(offset, today, utc_offset);
        None
    }

    /// Apply a day selection; `true` when a forecast entry matched and is now shown.
    fn select_day(&mut self, offset: DayOffset, today: NaiveDate, utc_offset: FixedOffset) -> bool {
        if !matches!(self.phase, Phase::ShownCurrent | Phase::ShownForecast) {
            debug!(%offset, phase = ?self.phase, "day selected while nothing is shown");
            return false;
        }

        let (Some(current), ForecastStatus::Ready(list)) = (&self.current, &self.forecast) else {
            debug!(%offset, "day selected without a forecast");
            return false;
        };

        let Some(target) = today.checked_add_days(Days::new(u64::from(offset.days()))) else {
            return false;
        };

        match find_entry_for_day(list, target, utc_offset) {
            Some(entry) => {
                self.view = Some(WeatherView::from_forecast(entry, current));
                self.phase = Phase::ShownForecast;
                self.selected_day = Some(offset);
                true
            }
            None => {
                debug!(%offset, %target, "no forecast entry for day");
                false
            }
        }
    }

    fn is_stale(&self, seq: u64) -> bool {
        if seq != self.seq {
            debug!(seq, latest = self.seq, "dropping stale response");
            return true;
        }
        false
    }
}

/// First entry, in upstream order, whose local day-of-month and month match `target`.
pub fn find_entry_for_day(
    list: &[ForecastEntry],
    target: NaiveDate,
    utc_offset: FixedOffset,
) -> Option<&ForecastEntry> {
    list.iter().find(|entry| {
        let date = entry.timestamp.with_timezone(&utc_offset).date_naive();
        date.day() == target.day() && date.month() == target.month()
    })
}

/// Drives [`State`] against a provider.
#[derive(Debug)]
pub struct Controller<P> {
    provider: P,
    state: State,
}

impl<P: WeatherProvider> Controller<P> {
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            state: State::default(),
        }
    }

    pub fn state(&self) -> &State {
        &self.state
    }

    pub fn set_query(&mut self, query: impl Into<String>) {
        let command = self.state.update(Event::QueryChanged(query.into()));
        debug_assert!(command.is_none());
    }

    /// Run a search for the current query, including the follow-up forecast lookup.
    pub async fn search(&mut self) {
        self.dispatch(Event::SearchRequested).await;
    }

    /// Select a forecast day relative to `today` at `utc_offset`.
    ///
    /// Returns `true` when a matching forecast entry is now displayed.
    pub fn select_day(
        &mut self,
        offset: DayOffset,
        today: NaiveDate,
        utc_offset: FixedOffset,
    ) -> bool {
        self.state.select_day(offset, today, utc_offset)
    }

    /// [`select_day`](Self::select_day) using the local clock and timezone.
    pub fn select_day_local(&mut self, offset: DayOffset) -> bool {
        let now = Local::now();
        self.select_day(offset, now.date_naive(), now.offset().fix())
    }

    pub async fn dispatch(&mut self, event: Event) {
        let mut next = self.state.update(event);
        while let Some(command) = next {
            let event = self.run(command).await;
            next = self.state.update(event);
        }
    }

    async fn run(&self, command: Command) -> Event {
        match command {
            Command::FetchCurrent { seq, city } => Event::CurrentLoaded {
                seq,
                result: self.provider.fetch_current(&city).await,
            },
            Command::FetchForecast { seq, location_id } => Event::ForecastLoaded {
                seq,
                result: self.provider.fetch_forecast(location_id).await,
            },
        }
    }
}
