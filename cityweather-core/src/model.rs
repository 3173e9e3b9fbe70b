use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Offset between the Kelvin and Celsius scales.
pub const KELVIN_OFFSET: f64 = 273.15;

/// One entry of the provider's `weather` array.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WeatherCondition {
    pub id: i64,
    pub main: String,
    pub description: String,
    pub icon: String,
}

/// Result of one successful lookup.
///
/// The `Default` value is the empty sentinel (`id == 0`, empty name) that
/// stands for "no result yet". Any other value was produced by a provider.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    pub id: i64,
    pub city_name: String,
    pub temperature_kelvin: f64,
    pub icon_code: String,
    pub weather_conditions: Vec<WeatherCondition>,
    pub observed_at: Option<DateTime<Utc>>,
}

impl WeatherSnapshot {
    /// The sentinel snapshot.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.id == 0 && self.city_name.is_empty()
    }

    /// Whole degrees Celsius, rounded toward negative infinity.
    pub fn temperature_celsius(&self) -> i64 {
        (self.temperature_kelvin - KELVIN_OFFSET).floor() as i64
    }

    /// `<icon_base_url>/<icon_code>.png`. An empty icon code is not special-cased.
    pub fn icon_url(&self, icon_base_url: &str) -> String {
        format!("{}/{}.png", icon_base_url.trim_end_matches('/'), self.icon_code)
    }
}
