//! Core error types for greentrigger-core.
//!
//! Every failure of an evaluation cycle is a [`TriggerError`]. The variants
//! split into client errors (the request itself is at fault) and server
//! errors (a collaborator failed); see [`TriggerError::is_client_error`].

use std::path::PathBuf;
use thiserror::Error;

/// Errors produced while evaluating a trigger request.
#[derive(Error, Debug)]
pub enum TriggerError {
    /// The request body could not be parsed or carries an invalid value
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// A required request field is missing or empty
    #[error("Missing {field}")]
    MissingField { field: &'static str },

    /// A store append was attempted with an empty trigger identity
    #[error("Trigger identity must not be empty")]
    InvalidIdentity,

    /// The from/to window boundaries could not be parsed
    #[error("Malformed window: could not parse '{value}' as a time of day")]
    MalformedWindow { value: String },

    /// The external measurement provider failed
    #[error("Measurement unavailable: {message}")]
    MeasurementUnavailable {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The event store failed
    #[error("Persistence unavailable: {message}")]
    PersistenceUnavailable {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl TriggerError {
    pub fn measurement(message: impl Into<String>) -> Self {
        TriggerError::MeasurementUnavailable {
            message: message.into(),
            source: None,
        }
    }

    pub fn persistence(message: impl Into<String>) -> Self {
        TriggerError::PersistenceUnavailable {
            message: message.into(),
            source: None,
        }
    }

    /// Whether the caller, not a collaborator, is at fault.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            TriggerError::InvalidRequest(_)
                | TriggerError::MissingField { .. }
                | TriggerError::InvalidIdentity
                | TriggerError::MalformedWindow { .. }
        )
    }
}

impl From<rusqlite::Error> for TriggerError {
    fn from(err: rusqlite::Error) -> Self {
        let message = match &err {
            rusqlite::Error::SqliteFailure(code, _)
                if code.code == rusqlite::ErrorCode::DatabaseBusy
                    || code.code == rusqlite::ErrorCode::DatabaseLocked =>
            {
                "database is locked".to_string()
            }
            other => other.to_string(),
        };
        TriggerError::PersistenceUnavailable {
            message,
            source: Some(Box::new(err)),
        }
    }
}

impl From<reqwest::Error> for TriggerError {
    fn from(err: reqwest::Error) -> Self {
        TriggerError::MeasurementUnavailable {
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    }
}

impl From<serde_json::Error> for TriggerError {
    fn from(err: serde_json::Error) -> Self {
        TriggerError::InvalidRequest(err.to_string())
    }
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Unknown configuration key
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Data directory could not be resolved or created
    #[error("Failed to access data directory: {0}")]
    DataDir(#[from] std::io::Error),
}

/// Result type alias for TriggerError
pub type Result<T, E = TriggerError> = std::result::Result<T, E>;
