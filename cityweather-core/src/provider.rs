use crate::{Config, TransportError, WeatherSnapshot, provider::openweather::OpenWeatherProvider};
use async_trait::async_trait;
use std::fmt::Debug;

pub mod openweather;

/// Remote source of current weather, looked up by city name.
///
/// Implementations hold no state between calls and never retry.
#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    async fn lookup(&self, city: &str) -> Result<WeatherSnapshot, TransportError>;
}

/// Construct the OpenWeather provider from config.
pub fn provider_from_config(config: &Config) -> anyhow::Result<Box<dyn WeatherProvider>> {
    let api_key = config.api_key()?;
    let mut provider =
        OpenWeatherProvider::new(api_key.to_owned()).with_base_url(config.base_url.clone());
    if let Some(timeout) = config.request_timeout() {
        provider = provider.with_timeout(timeout)?;
    }

    Ok(Box::new(provider))
}
