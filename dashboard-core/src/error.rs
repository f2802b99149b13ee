//! Error taxonomy of the weather widget.

use thiserror::Error;

/// Where users can sign up for an OpenWeather API key.
pub const API_KEY_SIGNUP_URL: &str = "https://openweathermap.org/api";

/// Environment variable that carries the API key.
pub const API_KEY_ENV: &str = "WEATHER_API_KEY";

/// Failures a weather lookup can end in. The `Display` text is what the
/// widget shows; `Transport` keeps the underlying detail for logs only.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WeatherError {
    #[error("Please enter a city name")]
    Validation,

    #[error("City not found. Please check the spelling.")]
    NotFound,

    #[error(
        "Invalid API key. Please set WEATHER_API_KEY in your environment or run `dashboard configure`."
    )]
    Unauthorized,

    #[error("Failed to fetch weather data")]
    Transport(String),
}

impl WeatherError {
    /// Extra guidance shown below the message, if any.
    pub fn guidance(&self) -> Option<String> {
        match self {
            Self::Unauthorized => Some(format!(
                "Get your free API key at openweathermap.org and add it to your environment as {API_KEY_ENV}"
            )),
            _ => None,
        }
    }

    /// Link that accompanies the guidance text.
    pub fn help_link(&self) -> Option<&'static str> {
        match self {
            Self::Unauthorized => Some(API_KEY_SIGNUP_URL),
            _ => None,
        }
    }

    /// Diagnostic detail that is not shown to the user.
    pub fn detail(&self) -> Option<&str> {
        match self {
            Self::Transport(detail) => Some(detail),
            _ => None,
        }
    }
}

/// Location service errors. These never reach the user; any of them makes
/// the resolver fall back to the default city.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LocationError {
    #[error("Location permission denied")]
    PermissionDenied,
    #[error("Location service unavailable")]
    ServiceUnavailable,
    #[error("Location error: {0}")]
    Other(String),
}
