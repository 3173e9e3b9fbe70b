//! Error types surfaced by a lookup.
//!
//! Both kinds render through one error surface; `ErrorKind` is the
//! discriminator presentation uses to style them apart.

use serde::Serialize;
use thiserror::Error;

/// Input rejected before any network activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Enter a city name!")]
    EmptyCityName,
}

/// Network failure or non-success HTTP status. The message is passed through unmodified.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct TransportError {
    pub message: String,
}

impl TransportError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorKind {
    Validation,
    Api,
}

/// Why a lookup ended in `Failed`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl LookupError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            LookupError::Validation(_) => ErrorKind::Validation,
            LookupError::Transport(_) => ErrorKind::Api,
        }
    }

    pub fn message(&self) -> String {
        self.to_string()
    }
}
