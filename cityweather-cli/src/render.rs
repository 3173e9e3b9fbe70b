//! Plain-text rendering of lookup and favorite cards.

use chrono::{DateTime, Local, Utc};
use cityweather_core::{CardView, ErrorKind, LookupView, WeatherSnapshot};

pub fn card(card: &CardView) -> String {
    format!(
        "{city} [{id}]  {temp}°C\n  {icon}",
        city = card.city_name,
        id = card.id,
        temp = card.temperature_celsius,
        icon = card.icon_url,
    )
}

/// Current lookup: error line, loading line, or the card with its conditions.
pub fn lookup(view: &LookupView, snapshot: &WeatherSnapshot) -> String {
    if let Some(err) = &view.error {
        let label = match err.kind() {
            ErrorKind::Validation => "invalid input",
            ErrorKind::Api => "lookup failed",
        };
        return format!("{label}: {}", err.message());
    }

    if view.is_loading {
        return "Loading...".to_string();
    }

    if !view.shows_card() {
        return String::new();
    }

    let mut out = format!(
        "{city} [{id}]  {temp}°C\n  {icon}",
        city = view.city_name,
        id = snapshot.id,
        temp = view.temperature_celsius,
        icon = view.icon_url,
    );

    let conditions: Vec<&str> = snapshot
        .weather_conditions
        .iter()
        .map(|c| c.description.as_str())
        .filter(|d| !d.is_empty())
        .collect();
    if !conditions.is_empty() {
        out.push_str(&format!("\n  {}", conditions.join(", ")));
    }

    if let Some(observed) = snapshot.observed_at {
        out.push_str(&format!("\n  observed {}", local_time(observed)));
    }

    out
}

fn local_time(at: DateTime<Utc>) -> String {
    at.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string()
}
