//! Render-ready values for whatever presents lookups and favorites.

use crate::{
    controller::{LookupPhase, LookupState},
    error::LookupError,
    model::WeatherSnapshot,
};

/// One weather card: a saved favorite or the current result.
#[derive(Debug, Clone, PartialEq)]
pub struct CardView {
    pub id: i64,
    pub city_name: String,
    pub temperature_celsius: i64,
    pub icon_url: String,
}

impl CardView {
    pub fn new(snapshot: &WeatherSnapshot, icon_base_url: &str) -> Self {
        Self {
            id: snapshot.id,
            city_name: snapshot.city_name.clone(),
            temperature_celsius: snapshot.temperature_celsius(),
            icon_url: snapshot.icon_url(icon_base_url),
        }
    }
}

/// What the lookup screen shows.
#[derive(Debug, Clone, PartialEq)]
pub struct LookupView {
    pub phase: LookupPhase,
    pub city_name: String,
    pub temperature_celsius: i64,
    pub icon_url: String,
    pub error: Option<LookupError>,
    pub is_loading: bool,
}

impl LookupView {
    pub fn new(state: &LookupState, icon_base_url: &str) -> Self {
        Self {
            phase: state.phase,
            city_name: state.result.city_name.clone(),
            temperature_celsius: state.result.temperature_celsius(),
            icon_url: state.result.icon_url(icon_base_url),
            error: state.error.clone(),
            is_loading: state.is_loading(),
        }
    }

    /// The card is drawn while loading or once a city has been resolved.
    pub fn shows_card(&self) -> bool {
        self.is_loading || !self.city_name.is_empty()
    }
}
