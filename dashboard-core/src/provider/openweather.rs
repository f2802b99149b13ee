use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode, Url};
use serde::Deserialize;
use std::fmt;

use crate::{
    error::WeatherError,
    model::{Condition, LocationQuery, WeatherSnapshot},
};

use super::WeatherProvider;

pub const DEFAULT_ENDPOINT: &str = "https://api.openweathermap.org/data/2.5/weather";

#[derive(Clone)]
pub struct OpenWeatherProvider {
    api_key: String,
    endpoint: Url,
    http: Client,
}

impl fmt::Debug for OpenWeatherProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenWeatherProvider")
            .field("endpoint", &self.endpoint.as_str())
            .field("api_key", &"<redacted>")
            .finish()
    }
}

impl OpenWeatherProvider {
    pub fn with_endpoint(api_key: String, endpoint: &str) -> Result<Self, WeatherError> {
        let endpoint = Url::parse(endpoint).map_err(|e| {
            WeatherError::Transport(format!("invalid weather endpoint '{endpoint}': {e}"))
        })?;

        Ok(Self { api_key, endpoint, http: Client::new() })
    }

    fn query_params(&self, query: &LocationQuery) -> Vec<(&'static str, String)> {
        let mut params = match query {
            LocationQuery::Coordinates(c) => {
                vec![("lat", c.latitude.to_string()), ("lon", c.longitude.to_string())]
            }
            LocationQuery::Place(name) => vec![("q", name.as_str().to_string())],
        };
        params.push(("appid", self.api_key.clone()));
        params.push(("units", "metric".to_string()));
        params
    }
}

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: f64,
    feels_like: f64,
    humidity: u8,
    pressure: f64,
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
    country: String,
}

#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    name: String,
    dt: Option<i64>,
    main: OwMain,
    weather: Vec<OwWeather>,
    wind: OwWind,
    #[serde(default)]
    sys: OwSys,
}

impl OwCurrentResponse {
    fn into_snapshot(self) -> Result<WeatherSnapshot, WeatherError> {
        let weather = self.weather.into_iter().next().ok_or_else(|| {
            WeatherError::Transport("OpenWeather response contained no weather entry".into())
        })?;

        let observed_at = self.dt.and_then(unix_to_utc).unwrap_or_else(Utc::now);

        Ok(WeatherSnapshot {
            place: self.name,
            country: self.sys.country,
            temperature_c: self.main.temp,
            feels_like_c: self.main.feels_like,
            humidity_pct: self.main.humidity,
            pressure_hpa: self.main.pressure,
            wind_speed_mps: self.wind.speed,
            condition: Condition::from_label(&weather.main),
            description: weather.description,
            observed_at,
        })
    }
}

#[async_trait]
impl WeatherProvider for OpenWeatherProvider {
    async fn current(&self, query: &LocationQuery) -> Result<WeatherSnapshot, WeatherError> {
        tracing::debug!(%query, "requesting current weather");

        let res = self
            .http
            .get(self.endpoint.clone())
            .query(&self.query_params(query))
            .send()
            .await
            .map_err(|e| {
                WeatherError::Transport(format!("Failed to send request to OpenWeather: {e}"))
            })?;

        let status = res.status();
        let body = res.text().await.map_err(|e| {
            WeatherError::Transport(format!("Failed to read OpenWeather response body: {e}"))
        })?;

        if !status.is_success() {
            let err = classify_status(status, &body);
            tracing::info!(%status, %query, body = %truncate_body(&body), "OpenWeather request rejected");
            return Err(err);
        }

        let parsed: OwCurrentResponse = serde_json::from_str(&body).map_err(|e| {
            WeatherError::Transport(format!("Failed to parse OpenWeather JSON: {e}"))
        })?;

        parsed.into_snapshot()
    }
}

/// Map a non-success status onto the error taxonomy.
pub fn classify_status(status: StatusCode, body: &str) -> WeatherError {
    match status {
        StatusCode::NOT_FOUND => WeatherError::NotFound,
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => WeatherError::Unauthorized,
        _ => WeatherError::Transport(format!(
            "OpenWeather request failed with status {}: {}",
            status,
            truncate_body(body)
        )),
    }
}

fn unix_to_utc(ts: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(ts, 0)
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.chars().count() > MAX {
        format!("{}...", body.chars().take(MAX).collect::<String>())
    } else {
        body.to_string()
    }
}
