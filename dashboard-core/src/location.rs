//! Location resolution: ask the host for a position, fall back to a
//! default city when it cannot answer.

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::Deserialize;
use std::{fmt::Debug, sync::Arc};

use crate::{
    Config,
    error::LocationError,
    model::{Coordinates, LocationQuery, PlaceName},
};

/// City queried when the position cannot be determined.
pub const DEFAULT_CITY: &str = "Warsaw";

pub const DEFAULT_IP_LOOKUP_ENDPOINT: &str = "http://ip-api.com/json";

/// A host capability that can report the current position.
#[async_trait]
pub trait LocationService: Send + Sync + Debug {
    async fn current_position(&self) -> Result<Coordinates, LocationError>;
}

/// Position pinned by the user.
#[derive(Debug, Clone, Copy)]
pub struct StaticLocation(pub Coordinates);

#[async_trait]
impl LocationService for StaticLocation {
    async fn current_position(&self) -> Result<Coordinates, LocationError> {
        Ok(self.0)
    }
}

/// Approximate position from an ip-api compatible lookup.
#[derive(Debug, Clone)]
pub struct IpGeolocation {
    endpoint: Url,
    http: Client,
}

#[derive(Debug, Deserialize)]
struct IpApiResponse {
    status: String,
    message: Option<String>,
    lat: Option<f64>,
    lon: Option<f64>,
}

impl IpGeolocation {
    pub fn with_endpoint(endpoint: &str) -> Result<Self, LocationError> {
        let endpoint = Url::parse(endpoint)
            .map_err(|e| LocationError::Other(format!("invalid lookup endpoint '{endpoint}': {e}")))?;
        Ok(Self { endpoint, http: Client::new() })
    }
}

#[async_trait]
impl LocationService for IpGeolocation {
    async fn current_position(&self) -> Result<Coordinates, LocationError> {
        let response = self.http.get(self.endpoint.clone()).send().await.map_err(|e| {
            tracing::debug!("IP lookup request failed: {}", e);
            LocationError::ServiceUnavailable
        })?;

        let status = response.status();
        if status == reqwest::StatusCode::FORBIDDEN {
            return Err(LocationError::PermissionDenied);
        }
        if !status.is_success() {
            tracing::debug!("IP lookup returned status {}", status);
            return Err(LocationError::ServiceUnavailable);
        }

        let body: IpApiResponse = response
            .json()
            .await
            .map_err(|e| LocationError::Other(format!("malformed lookup response: {e}")))?;

        if body.status != "success" {
            return Err(LocationError::Other(
                body.message.unwrap_or_else(|| format!("lookup status '{}'", body.status)),
            ));
        }

        match (body.lat, body.lon) {
            (Some(lat), Some(lon)) => Ok(Coordinates::new(lat, lon)),
            _ => Err(LocationError::Other("lookup response has no coordinates".into())),
        }
    }
}

/// Picks what the first request of a view activation asks for.
#[derive(Debug, Clone)]
pub struct LocationResolver {
    service: Option<Arc<dyn LocationService>>,
    fallback: PlaceName,
}

impl LocationResolver {
    /// `None` means the host has no location capability at all.
    pub fn new(service: Option<Arc<dyn LocationService>>) -> Self {
        Self { service, fallback: default_city() }
    }

    /// Resolver wired according to the `[geolocation]` config section.
    pub fn from_config(config: &Config) -> Self {
        let geo = &config.geolocation;
        if !geo.enabled {
            return Self::new(None);
        }

        if let Some(coords) = config.pinned_coordinates() {
            return Self::new(Some(Arc::new(StaticLocation(coords))));
        }

        let endpoint = geo.endpoint.as_deref().unwrap_or(DEFAULT_IP_LOOKUP_ENDPOINT);
        match IpGeolocation::with_endpoint(endpoint) {
            Ok(service) => Self::new(Some(Arc::new(service))),
            Err(e) => {
                tracing::warn!("geolocation disabled: {}", e);
                Self::new(None)
            }
        }
    }

    pub fn has_capability(&self) -> bool {
        self.service.is_some()
    }

    pub async fn resolve(&self) -> LocationQuery {
        let Some(service) = &self.service else {
            tracing::debug!(fallback = %self.fallback, "no location service, using default city");
            return LocationQuery::Place(self.fallback.clone());
        };

        match service.current_position().await {
            Ok(coords) => {
                tracing::info!("Got location: {}, {}", coords.latitude, coords.longitude);
                LocationQuery::Coordinates(coords)
            }
            Err(e) => {
                tracing::info!(error = %e, fallback = %self.fallback, "location unavailable, using default city");
                LocationQuery::Place(self.fallback.clone())
            }
        }
    }
}

fn default_city() -> PlaceName {
    PlaceName::from_trusted(DEFAULT_CITY)
}
