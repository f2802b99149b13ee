//! Plain-text rendering of the widget card.

use std::fmt::Write;

use crate::{controller::FetchState, error::WeatherError, model::WeatherSnapshot};

pub const EMPTY_STATE_TEXT: &str = "Enter a city name above to see the weather";
pub const LOADING_TEXT: &str = "Loading...";

/// Whole degrees, rounding halves up (22.5 → 23, -2.5 → -2).
pub fn format_temperature(celsius: f64) -> String {
    format!("{}°C", round_half_up(celsius))
}

fn round_half_up(value: f64) -> i64 {
    let floor = value.floor();
    let rounded = if value - floor >= 0.5 { floor + 1.0 } else { floor };
    rounded as i64
}

pub fn render_state(state: &FetchState) -> String {
    match state {
        FetchState::Idle => EMPTY_STATE_TEXT.to_string(),
        FetchState::Loading { .. } => LOADING_TEXT.to_string(),
        FetchState::Success(snapshot) => render_snapshot(snapshot),
        FetchState::Failure(err) => render_error(err),
    }
}

pub fn render_snapshot(snapshot: &WeatherSnapshot) -> String {
    let mut out = String::new();

    let place = if snapshot.country.is_empty() {
        snapshot.place.clone()
    } else {
        format!("{}, {}", snapshot.place, snapshot.country)
    };

    // Writing into a String cannot fail.
    let _ = writeln!(out, "{place}  {}", snapshot.presentation().glyph());
    let _ = writeln!(out, "{}", format_temperature(snapshot.temperature_c));
    let _ = writeln!(out, "{}", snapshot.description);
    let _ = writeln!(out, "Feels like {}", format_temperature(snapshot.feels_like_c));
    let _ = writeln!(out);
    let _ = writeln!(out, "Wind Speed  {} m/s", snapshot.wind_speed_mps);
    let _ = writeln!(out, "Humidity    {}%", snapshot.humidity_pct);
    let _ = write!(out, "Pressure    {} hPa", snapshot.pressure_hpa);

    out
}

pub fn render_error(err: &WeatherError) -> String {
    let mut out = format!("Error: {err}");
    if let Some(guidance) = err.guidance() {
        let _ = write!(out, "\n{guidance}");
    }
    if let Some(link) = err.help_link() {
        let _ = write!(out, "\n{link}");
    }
    out
}
