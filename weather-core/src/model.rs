use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::units::{kelvin_to_celsius, mps_to_kmh};

/// Weather condition summary, e.g. `Clouds` / `broken clouds`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub main: String,
    pub description: String,
}

impl Default for Condition {
    fn default() -> Self {
        Self {
            main: "Unknown".to_string(),
            description: "unknown".to_string(),
        }
    }
}

/// Measurements in the API's native units (Kelvin, m/s).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Measurements {
    pub temperature_k: f64,
    pub humidity_pct: u8,
    pub wind_speed_mps: f64,
    pub condition: Condition,
}

/// Current conditions for a city, as returned by the current-weather lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentWeather {
    pub name: String,
    pub country: String,
    /// Key for the forecast lookup; absent when the API returned none.
    pub location_id: Option<u64>,
    pub timestamp: DateTime<Utc>,
    pub measurements: Measurements,
}

/// One 3-hour slot of the forecast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastEntry {
    pub timestamp: DateTime<Utc>,
    pub measurements: Measurements,
}

/// Forecast entries in upstream order.
pub type ForecastList = Vec<ForecastEntry>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ViewKind {
    Current,
    Forecast,
}

/// The payload that gets displayed: metric units, city taken from the current
/// observation.
///
/// Only constructed from native [`Measurements`], so the unit conversion is
/// applied exactly once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherView {
    pub kind: ViewKind,
    pub name: String,
    pub country: String,
    pub timestamp: DateTime<Utc>,
    pub temperature_c: f64,
    pub humidity_pct: u8,
    pub wind_kmh: f64,
    pub condition: Condition,
}

impl WeatherView {
    pub fn from_current(current: &CurrentWeather) -> Self {
        Self::build(ViewKind::Current, current, current.timestamp, &current.measurements)
    }

    /// Forecast slot with the city and country of `current` spliced in.
    pub fn from_forecast(entry: &ForecastEntry, current: &CurrentWeather) -> Self {
        Self::build(ViewKind::Forecast, current, entry.timestamp, &entry.measurements)
    }

    fn build(
        kind: ViewKind,
        current: &CurrentWeather,
        timestamp: DateTime<Utc>,
        m: &Measurements,
    ) -> Self {
        Self {
            kind,
            name: current.name.clone(),
            country: current.country.clone(),
            timestamp,
            temperature_c: kelvin_to_celsius(m.temperature_k),
            humidity_pct: m.humidity_pct,
            wind_kmh: mps_to_kmh(m.wind_speed_mps),
            condition: m.condition.clone(),
        }
    }
}

/// Relative forecast day, 0 (today) through 5.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct DayOffset(u8);

impl DayOffset {
    pub const MAX: u8 = 5;

    pub fn all() -> impl Iterator<Item = DayOffset> {
        (0..=Self::MAX).map(DayOffset)
    }

    pub fn days(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for DayOffset {
    type Error = anyhow::Error;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        if value > Self::MAX {
            return Err(anyhow::anyhow!(
                "Day offset {value} is out of range. Allowed: 0 (today) .. {}.",
                Self::MAX
            ));
        }
        Ok(Self(value))
    }
}

impl From<DayOffset> for u8 {
    fn from(value: DayOffset) -> Self {
        value.0
    }
}

impl std::fmt::Display for DayOffset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
