//! Core library for the `dashboard` weather widget.
//!
//! This crate defines:
//! - Configuration & credential resolution
//! - The weather provider abstraction and its OpenWeather implementation
//! - Location resolution with a default-city fallback
//! - The fetch state machine and the widget lifecycle around it
//! - Text rendering and the navigation menu of the dashboard shell
//!
//! It is used by `dashboard-cli`, but can also be embedded by other hosts.

pub mod config;
pub mod controller;
pub mod error;
pub mod location;
pub mod menu;
pub mod model;
pub mod provider;
pub mod render;
pub mod widget;

pub use config::{ApiKey, Config, GeolocationConfig, KeySource};
pub use controller::{FetchState, PendingFetch, RequestId, WeatherController};
pub use error::{LocationError, WeatherError};
pub use location::{LocationResolver, LocationService};
pub use model::{Condition, Coordinates, LocationQuery, PlaceName, Presentation, WeatherSnapshot};
pub use provider::WeatherProvider;
pub use widget::WeatherWidget;
