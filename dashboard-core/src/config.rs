use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::Path, path::PathBuf};

use crate::{error::API_KEY_ENV, model::Coordinates, provider::openweather::DEFAULT_ENDPOINT};

/// Credential used when nothing is configured. Requests made with it are
/// expected to be rejected as unauthorized.
pub const FALLBACK_API_KEY: &str = "demo";

/// Geolocation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeolocationConfig {
    /// When false the widget behaves as if the host had no location service.
    pub enabled: bool,

    /// ip-api compatible lookup endpoint, used when no coordinates are pinned.
    pub endpoint: Option<String>,

    /// Pinned coordinates; take precedence over the network lookup.
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl Default for GeolocationConfig {
    fn default() -> Self {
        Self { enabled: true, endpoint: None, latitude: None, longitude: None }
    }
}

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// api_key = "..."
///
/// [geolocation]
/// enabled = true
/// latitude = 52.23
/// longitude = 21.01
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Config {
    pub api_key: Option<String>,

    /// Override of the current-weather endpoint.
    pub endpoint: Option<String>,

    #[serde(default)]
    pub geolocation: GeolocationConfig,
}

/// Where the effective API key came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeySource {
    Environment,
    File,
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiKey {
    pub value: String,
    pub source: KeySource,
}

impl ApiKey {
    pub fn is_fallback(&self) -> bool {
        self.source == KeySource::Fallback
    }
}

impl Config {
    /// Load config from disk, or return an empty default if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_file_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<PathBuf> {
        let path = Self::config_file_path()?;
        self.save_to(&path)?;
        Ok(path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "dashboard", "dashboard")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Effective API key: `WEATHER_API_KEY`, then the config file, then the
    /// fallback literal.
    pub fn resolve_api_key(&self) -> ApiKey {
        self.resolve_api_key_with(std::env::var(API_KEY_ENV).ok())
    }

    fn resolve_api_key_with(&self, env_value: Option<String>) -> ApiKey {
        let non_empty = |s: &String| !s.trim().is_empty();

        if let Some(value) = env_value.filter(non_empty) {
            return ApiKey { value, source: KeySource::Environment };
        }

        if let Some(value) = self.api_key.clone().filter(non_empty) {
            return ApiKey { value, source: KeySource::File };
        }

        tracing::warn!(
            "no API key configured (set {API_KEY_ENV} or run `dashboard configure`), using fallback key"
        );
        ApiKey { value: FALLBACK_API_KEY.to_string(), source: KeySource::Fallback }
    }

    pub fn set_api_key(&mut self, api_key: String) {
        self.api_key = Some(api_key).filter(|k| !k.trim().is_empty());
    }

    pub fn weather_endpoint(&self) -> &str {
        self.endpoint.as_deref().unwrap_or(DEFAULT_ENDPOINT)
    }

    /// Coordinates pinned in the config, if both halves are present.
    pub fn pinned_coordinates(&self) -> Option<Coordinates> {
        match (self.geolocation.latitude, self.geolocation.longitude) {
            (Some(lat), Some(lon)) => Some(Coordinates::new(lat, lon)),
            _ => None,
        }
    }
}
