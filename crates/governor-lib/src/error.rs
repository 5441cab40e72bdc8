//! Error types for the governor library
//!
//! Degraded device conditions (thermal escalation, memory pressure, low
//! battery) are modeled as governor state, never as errors. The variants here
//! cover the handful of genuinely fallible surfaces: talking to a governor that
//! has been torn down, rejecting an invalid configuration, and parsing signal
//! names received from a host or the command line.

use thiserror::Error;

/// Errors surfaced by the governor library
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GovernorError {
    /// The owner task has stopped; the event or request was dropped
    #[error("governor is not running")]
    NotRunning,

    /// Configuration failed validation
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A signal name could not be parsed
    #[error("unknown {kind} value '{value}'")]
    UnknownValue { kind: &'static str, value: String },
}

impl GovernorError {
    pub(crate) fn unknown(kind: &'static str, value: &str) -> Self {
        GovernorError::UnknownValue {
            kind,
            value: value.to_string(),
        }
    }
}

/// Result alias used across the library
pub type Result<T> = std::result::Result<T, GovernorError>;
