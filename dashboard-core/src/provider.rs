use crate::{
    Config, LocationQuery, WeatherSnapshot, error::WeatherError,
    provider::openweather::OpenWeatherProvider,
};
use async_trait::async_trait;
use std::{fmt::Debug, sync::Arc};

pub mod openweather;

/// Source of current-weather data. One call is one network request.
#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    async fn current(&self, query: &LocationQuery) -> Result<WeatherSnapshot, WeatherError>;
}

/// Construct the OpenWeather provider from config, resolving the API key.
pub fn provider_from_config(config: &Config) -> Result<Arc<dyn WeatherProvider>, WeatherError> {
    let api_key = config.resolve_api_key();
    tracing::debug!(source = ?api_key.source, endpoint = config.weather_endpoint(), "building weather provider");

    let provider = OpenWeatherProvider::with_endpoint(api_key.value, config.weather_endpoint())?;
    Ok(Arc::new(provider))
}
