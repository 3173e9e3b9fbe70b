//! Core library for the `cityweather` CLI.
//!
//! This crate defines:
//! - Input validation for city lookups
//! - Abstraction over weather providers (OpenWeather over HTTP)
//! - The lookup state machine and the shared favorites store
//! - Configuration & credentials handling
//!
//! It is used by `cityweather-cli`, but any other front end can drive the
//! same controller and store and render the values in [`view`].

pub mod config;
pub mod controller;
pub mod error;
pub mod favorites;
pub mod model;
pub mod provider;
pub mod validation;
pub mod view;

pub use config::Config;
pub use controller::{
    LookupController, LookupOutcome, LookupPhase, LookupState, LookupTask, Submission,
};
pub use error::{ErrorKind, LookupError, TransportError, ValidationError};
pub use favorites::FavoritesStore;
pub use model::{WeatherCondition, WeatherSnapshot};
pub use provider::{WeatherProvider, openweather::OpenWeatherProvider, provider_from_config};
pub use validation::{ValidationOutcome, validate};
pub use view::{CardView, LookupView};
