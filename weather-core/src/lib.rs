//! Core library for the `weather` CLI.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - The OpenWeather client behind the [`WeatherProvider`] trait
//! - Domain models and unit conversion
//! - The presentation state machine that drives a lookup and day selection
//!
//! It is used by `weather-cli`, but can also be reused by other binaries or services.

pub mod config;
pub mod controller;
pub mod error;
pub mod model;
pub mod provider;
pub mod units;

pub use config::Config;
pub use controller::{Command, Controller, Event, ForecastStatus, Phase, State};
pub use error::WeatherError;
pub use model::{
    Condition, CurrentWeather, DayOffset, ForecastEntry, ForecastList, Measurements, ViewKind,
    WeatherView,
};
pub use provider::{WeatherProvider, openweather::OpenWeatherProvider, provider_from_config};
