use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;

use crate::{
    config::DEFAULT_BASE_URL,
    error::TransportError,
    model::{WeatherCondition, WeatherSnapshot},
};

use super::WeatherProvider;

/// Error for a success status whose body names no city.
pub const EMPTY_RESPONSE_MESSAGE: &str = "Weather response contained no city data";

#[derive(Debug, Clone)]
pub struct OpenWeatherProvider {
    api_key: String,
    base_url: String,
    http: Client,
}

impl OpenWeatherProvider {
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            http: Client::new(),
        }
    }

    /// Point the provider at another endpoint (a proxy, a mock server).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> anyhow::Result<Self> {
        self.http = Client::builder().timeout(timeout).build()?;
        Ok(self)
    }

    async fn fetch_current(&self, city: &str) -> Result<OwCurrentResponse, TransportError> {
        let res = self
            .http
            .get(&self.base_url)
            .query(&[("q", city), ("appid", self.api_key.as_str())])
            .send()
            .await
            .map_err(|e| {
                // The request URL carries the API key in its query string.
                let e = e.without_url();
                tracing::warn!(city, error = %e, "OpenWeather request could not complete");
                TransportError::new(e.to_string())
            })?;

        let status = res.status();
        if !status.is_success() {
            tracing::warn!(city, %status, "OpenWeather request failed");
            return Err(TransportError::new(status_text(status)));
        }

        let body = res
            .text()
            .await
            .map_err(|e| TransportError::new(e.without_url().to_string()))?;

        let parsed: OwCurrentResponse = serde_json::from_str(&body).map_err(|e| {
            tracing::warn!(city, error = %e, "OpenWeather returned unparsable JSON");
            TransportError::new(e.to_string())
        })?;

        if parsed.id == 0 && parsed.name.is_empty() {
            tracing::warn!(city, "OpenWeather returned no city data");
            return Err(TransportError::new(EMPTY_RESPONSE_MESSAGE));
        }

        Ok(parsed)
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct OwMain {
    temp: f64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct OwWeather {
    id: i64,
    main: String,
    description: String,
    icon: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct OwCurrentResponse {
    id: i64,
    name: String,
    dt: i64,
    main: OwMain,
    weather: Vec<OwWeather>,
}

impl From<OwCurrentResponse> for WeatherSnapshot {
    fn from(parsed: OwCurrentResponse) -> Self {
        let icon_code = parsed
            .weather
            .first()
            .map(|w| w.icon.clone())
            .unwrap_or_default();

        let weather_conditions = parsed
            .weather
            .into_iter()
            .map(|w| WeatherCondition {
                id: w.id,
                main: w.main,
                description: w.description,
                icon: w.icon,
            })
            .collect();

        WeatherSnapshot {
            id: parsed.id,
            city_name: parsed.name,
            temperature_kelvin: parsed.main.temp,
            icon_code,
            weather_conditions,
            observed_at: unix_to_utc(parsed.dt),
        }
    }
}

#[async_trait]
impl WeatherProvider for OpenWeatherProvider {
    async fn lookup(&self, city: &str) -> Result<WeatherSnapshot, TransportError> {
        tracing::debug!(city, "looking up current weather");
        let parsed = self.fetch_current(city).await?;
        Ok(parsed.into())
    }
}

/// Reason phrase for a status, e.g. "Not Found"; the bare code when none is known.
fn status_text(status: StatusCode) -> String {
    status
        .canonical_reason()
        .map(str::to_owned)
        .unwrap_or_else(|| status.as_str().to_owned())
}

fn unix_to_utc(ts: i64) -> Option<DateTime<Utc>> {
    if ts == 0 {
        return None;
    }
    DateTime::from_timestamp(ts, 0)
}
