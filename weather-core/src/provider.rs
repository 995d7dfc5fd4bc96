use crate::{Config, CurrentWeather, ForecastList, WeatherError, provider::openweather::OpenWeatherProvider};
use async_trait::async_trait;
use std::fmt::Debug;

pub mod openweather;

/// Source of current conditions and forecasts.
#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    /// Current conditions for a city name.
    async fn fetch_current(&self, city: &str) -> Result<CurrentWeather, WeatherError>;

    /// Forecast slots for a location id returned by [`fetch_current`](Self::fetch_current).
    async fn fetch_forecast(&self, location_id: u64) -> Result<ForecastList, WeatherError>;
}

#[async_trait]
impl<T: WeatherProvider + ?Sized> WeatherProvider for Box<T> {
    async fn fetch_current(&self, city: &str) -> Result<CurrentWeather, WeatherError> {
        (**self).fetch_current(city).await
    }

    async fn fetch_forecast(&self, location_id: u64) -> Result<ForecastList, WeatherError> {
        (**self).fetch_forecast(location_id).await
    }
}

/// Construct the OpenWeather provider from config.
pub fn provider_from_config(config: &Config) -> anyhow::Result<Box<dyn WeatherProvider>> {
    let api_key = config.api_key()?;
    let provider = OpenWeatherProvider::with_timeout(
        api_key.to_owned(),
        config.base_url.clone(),
        config.timeout(),
    )?;

    Ok(Box::new(provider))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    #[test]
    fn provider_from_config_errors_when_missing_api_key() {
        let cfg = Config::default();
        let err = provider_from_config(&cfg).unwrap_err();
        assert!(err.to_string().contains("No OpenWeather API key configured"));
    }

    #[test]
    fn provider_from_config_works_when_configured() {
        let mut cfg = Config::default();
        cfg.set_api_key("KEY".to_string());

        let provider = provider_from_config(&cfg);
        assert!(provider.is_ok());
    }
}
