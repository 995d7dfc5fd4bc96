use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::{Deserialize, Deserializer, de::DeserializeOwned};
use tracing::{debug, instrument, warn};

use crate::{
    error::WeatherError,
    model::{Condition, CurrentWeather, ForecastEntry, ForecastList, Measurements},
};

use super::WeatherProvider;

pub const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org/data/2.5";

#[derive(Debug, Clone)]
pub struct OpenWeatherProvider {
    api_key: String,
    base_url: String,
    http: Client,
}

impl OpenWeatherProvider {
    pub fn new(api_key: String, base_url: String) -> Self {
        Self {
            api_key,
            base_url,
            http: Client::new(),
        }
    }

    pub fn with_timeout(
        api_key: String,
        base_url: String,
        timeout: Duration,
    ) -> Result<Self, WeatherError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| WeatherError::Transport(e.to_string()))?;

        Ok(Self {
            api_key,
            base_url,
            http,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), path)
    }

    /// GET an endpoint and decode the body once the embedded status code says success.
    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, WeatherError> {
        let url = self.endpoint(path);
        debug!(%url, "sending OpenWeather request");

        let res = self
            .http
            .get(&url)
            .query(query)
            .query(&[("appid", self.api_key.as_str())])
            .send()
            .await
            .map_err(|e| WeatherError::Transport(e.to_string()))?;

        let status = res.status();
        let body = res
            .text()
            .await
            .map_err(|e| WeatherError::Transport(e.to_string()))?;

        check_status(status.as_u16(), &body)?;

        serde_json::from_str(&body).map_err(|e| WeatherError::Parse(e.to_string()))
    }
}

#[async_trait]
impl WeatherProvider for OpenWeatherProvider {
    #[instrument(skip(self))]
    async fn fetch_current(&self, city: &str) -> Result<CurrentWeather, WeatherError> {
        let parsed: OwCurrentResponse = self
            .get_json("weather", &[("q", city)])
            .await
            .inspect_err(|e| warn!(error = %e, "Failed to fetch weather"))?;

        let current = parsed.into_model()?;
        debug!(location_id = ?current.location_id, "current weather received");
        Ok(current)
    }

    #[instrument(skip(self))]
    async fn fetch_forecast(&self, location_id: u64) -> Result<ForecastList, WeatherError> {
        let id = location_id.to_string();
        let parsed: OwForecastResponse = self
            .get_json("forecast", &[("id", id.as_str())])
            .await
            .inspect_err(|e| warn!(error = %e, "Failed to fetch forecast"))?;

        let list = parsed
            .list
            .into_iter()
            .map(OwForecastEntry::into_model)
            .collect::<Result<ForecastList, _>>()?;

        debug!(entries = list.len(), "forecast received");
        Ok(list)
    }
}

/// Decide the outcome from the `cod` embedded in the body, falling back to the
/// HTTP status when the body is not a status envelope.
fn check_status(status: u16, body: &str) -> Result<(), WeatherError> {
    match serde_json::from_str::<OwEnvelope>(body) {
        Ok(envelope) if envelope.cod == 200 => Ok(()),
        Ok(envelope) => Err(WeatherError::Upstream {
            code: envelope.cod,
            message: envelope.message_text(),
        }),
        Err(_) if !(200..300).contains(&status) => Err(WeatherError::Http {
            status,
            body: truncate_body(body),
        }),
        Err(e) => Err(WeatherError::Parse(e.to_string())),
    }
}

/// The API sends `cod` as a number on `/weather` success and as a string
/// everywhere else.
fn deserialize_cod<'de, D>(deserializer: D) -> Result<u16, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawCod {
        Number(u16),
        Text(String),
    }

    match RawCod::deserialize(deserializer)? {
        RawCod::Number(n) => Ok(n),
        RawCod::Text(s) => s
            .trim()
            .parse()
            .map_err(|_| serde::de::Error::custom(format!("invalid cod '{s}'"))),
    }
}

#[derive(Debug, Deserialize)]
struct OwEnvelope {
    #[serde(deserialize_with = "deserialize_cod")]
    cod: u16,
    // A string on errors, the number 0 on forecast success.
    #[serde(default)]
    message: Option<serde_json::Value>,
}

impl OwEnvelope {
    fn message_text(&self) -> String {
        match &self.message {
            Some(serde_json::Value::String(s)) if !s.is_empty() => s.clone(),
            _ => "unknown error".to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: f64,
    humidity: u8,
}

#[derive(Debug, Deserialize)]
struct OwWeather {
    main: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct OwWind {
    speed: f64,
}

#[derive(Debug, Default, Deserialize)]
struct OwSys {
    #[serde(default)]
    country: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    #[serde(default)]
    id: Option<u64>,
    name: String,
    dt: i64,
    #[serde(default)]
    sys: OwSys,
    main: OwMain,
    #[serde(default)]
    weather: Vec<OwWeather>,
    wind: OwWind,
}

impl OwCurrentResponse {
    fn into_model(self) -> Result<CurrentWeather, WeatherError> {
        Ok(CurrentWeather {
            name: self.name,
            country: self.sys.country.unwrap_or_default(),
            location_id: self.id.filter(|id| *id != 0),
            timestamp: unix_to_utc(self.dt)?,
            measurements: measurements(self.main, self.weather, self.wind),
        })
    }
}

#[derive(Debug, Deserialize)]
struct OwForecastEntry {
    dt: i64,
    main: OwMain,
    #[serde(default)]
    weather: Vec<OwWeather>,
    wind: OwWind,
}

impl OwForecastEntry {
    fn into_model(self) -> Result<ForecastEntry, WeatherError> {
        Ok(ForecastEntry {
            timestamp: unix_to_utc(self.dt)?,
            measurements: measurements(self.main, self.weather, self.wind),
        })
    }
}

#[derive(Debug, Deserialize)]
struct OwForecastResponse {
    #[serde(default)]
    list: Vec<OwForecastEntry>,
}

fn measurements(main: OwMain, weather: Vec<OwWeather>, wind: OwWind) -> Measurements {
    let condition = weather
        .into_iter()
        .next()
        .map(|w| Condition {
            main: w.main,
            description: w.description,
        })
        .unwrap_or_default();

    Measurements {
        temperature_k: main.temp,
        humidity_pct: main.humidity,
        wind_speed_mps: wind.speed,
        condition,
    }
}

fn unix_to_utc(ts: i64) -> Result<DateTime<Utc>, WeatherError> {
    DateTime::from_timestamp(ts, 0)
        .ok_or_else(|| WeatherError::Parse(format!("timestamp {ts} out of range")))
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_and_string_cod_are_both_success() {
        assert!(check_status(200, r#"{"cod":200,"name":"London"}"#).is_ok());
        assert!(check_status(200, r#"{"cod":"200","message":0,"list":[]}"#).is_ok());
    }

    #[test]
    fn embedded_failure_carries_upstream_message() {
        let err = check_status(404, r#"{"cod":"404","message":"city not found"}"#).unwrap_err();
        assert_eq!(
            err,
            WeatherError::Upstream {
                code: 404,
                message: "city not found".into()
            }
        );
    }

    #[test]
    fn embedded_failure_inside_http_ok_is_still_a_failure() {
        let err = check_status(200, r#"{"cod":401,"message":"Invalid API key"}"#).unwrap_err();
        assert!(matches!(err, WeatherError::Upstream { code: 401, .. }));
    }

    #[test]
    fn missing_message_falls_back_to_generic_text() {
        let err = check_status(200, r#"{"cod":"500"}"#).unwrap_err();
        assert_eq!(err.to_string(), "upstream error 500: unknown error");
    }

    #[test]
    fn non_json_error_body_reports_http_status() {
        let err = check_status(502, "<html>Bad Gateway</html>").unwrap_err();
        assert!(matches!(err, WeatherError::Http { status: 502, .. }));
    }

    #[test]
    fn non_json_success_body_is_a_parse_error() {
        let err = check_status(200, "not json").unwrap_err();
        assert!(matches!(err, WeatherError::Parse(_)));
    }

    #[test]
    fn current_response_maps_zero_id_to_none() {
        let raw: OwCurrentResponse = serde_json::from_str(
            r#"{"cod":200,"id":0,"name":"Nowhere","dt":1760875200,
                "main":{"temp":280.0,"humidity":50},"weather":[],"wind":{"speed":1.0}}"#,
        )
        .unwrap();

        let model = raw.into_model().unwrap();
        assert_eq!(model.location_id, None);
        assert_eq!(model.country, "");
        assert_eq!(model.measurements.condition, Condition::default());
    }

    #[test]
    fn truncate_body_limits_length() {
        let long = "x".repeat(500);
        let truncated = truncate_body(&long);
        assert_eq!(truncated.len(), 203);
        assert!(truncated.ends_with("..."));
        assert_eq!(truncate_body("short"), "short");
    }
}
