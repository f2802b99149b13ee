use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::WeatherError;

/// Geographic position in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4}, {:.4}", self.latitude, self.longitude)
    }
}

/// A place name that is guaranteed to be non-empty after trimming.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PlaceName(String);

impl PlaceName {
    /// Validate raw user input. Whitespace-only input is rejected.
    pub fn new(raw: &str) -> Result<Self, WeatherError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(WeatherError::Validation);
        }
        Ok(Self(trimmed.to_string()))
    }

    /// For compile-time constants known to be non-empty.
    pub(crate) fn from_trusted(name: &str) -> Self {
        debug_assert!(!name.trim().is_empty());
        Self(name.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for PlaceName {
    type Error = WeatherError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(&value)
    }
}

impl From<PlaceName> for String {
    fn from(value: PlaceName) -> Self {
        value.0
    }
}

impl fmt::Display for PlaceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// What a single weather request asks for.
#[derive(Debug, Clone, PartialEq)]
pub enum LocationQuery {
    Coordinates(Coordinates),
    Place(PlaceName),
}

impl fmt::Display for LocationQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LocationQuery::Coordinates(c) => write!(f, "({c})"),
            LocationQuery::Place(name) => write!(f, "\"{name}\""),
        }
    }
}

/// Coarse weather category reported by the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Condition {
    Clear,
    Clouds,
    Rain,
    Drizzle,
    Snow,
    Other,
}

impl Condition {
    /// Parse the provider's `weather[0].main` label. Matching ignores case;
    /// anything outside the known vocabulary becomes [`Condition::Other`].
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_lowercase().as_str() {
            "clear" => Self::Clear,
            "clouds" => Self::Clouds,
            "rain" => Self::Rain,
            "drizzle" => Self::Drizzle,
            "snow" => Self::Snow,
            _ => Self::Other,
        }
    }

    /// Icon shown for this condition. Unknown conditions use the cloud icon.
    pub fn presentation(self) -> Presentation {
        match self {
            Self::Clear => Presentation::Sun,
            Self::Clouds => Presentation::Cloud,
            Self::Rain | Self::Drizzle => Presentation::Rain,
            Self::Snow => Presentation::Snow,
            Self::Other => Presentation::Cloud,
        }
    }
}

/// Icon vocabulary of the widget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Presentation {
    Sun,
    Cloud,
    Rain,
    Snow,
}

impl Presentation {
    pub fn icon_name(self) -> &'static str {
        match self {
            Self::Sun => "sun",
            Self::Cloud => "cloud",
            Self::Rain => "cloud-rain",
            Self::Snow => "cloud-snow",
        }
    }

    pub fn glyph(self) -> &'static str {
        match self {
            Self::Sun => "☀",
            Self::Cloud => "☁",
            Self::Rain => "🌧",
            Self::Snow => "🌨",
        }
    }
}

/// Normalised result of a successful weather lookup (metric units).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    pub place: String,
    pub country: String,
    pub temperature_c: f64,
    pub feels_like_c: f64,
    pub humidity_pct: u8,
    pub pressure_hpa: f64,
    pub wind_speed_mps: f64,
    pub condition: Condition,
    pub description: String,
    pub observed_at: DateTime<Utc>,
}

impl WeatherSnapshot {
    pub fn presentation(&self) -> Presentation {
        self.condition.presentation()
    }
}
