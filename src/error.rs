//! Error types shared across the application.
//!
//! Each external collaborator gets its own error enum so callers can decide
//! which failures are recoverable (all AI and diagram failures are) and which
//! should surface as an HTTP error (store failures).

use thiserror::Error;

/// Failures of the persistence layer.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sled::Error),

    #[error("stored value is not valid UTF-8 under key {0}")]
    Encoding(String),

    #[error("failed to (de)serialize entries: {0}")]
    Json(#[from] serde_json::Error),
}

/// Failures talking to the AI provider.
#[derive(Debug, Error)]
pub enum AiError {
    #[error("no API key configured")]
    MissingApiKey,

    #[error("network request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("provider returned status {0}")]
    Status(u16),

    #[error("provider returned no response text")]
    EmptyResponse,

    #[error("provider response was not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Failures of the external diagram engine.
#[derive(Debug, Error)]
pub enum DiagramError {
    #[error("diagram service request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("invalid diagram syntax: {0}")]
    InvalidSyntax(String),
}

/// Rejected practice-session transitions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PracticeError {
    #[error("cannot {action} while {state}")]
    InvalidTransition {
        action: &'static str,
        state: &'static str,
    },

    #[error("answer must not be blank")]
    BlankAnswer,
}

/// Category label the model produced that is not part of the fixed set.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown category: {0:?}")]
pub struct UnknownCategory(pub String);

/// Invalid environment configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{var} is not a valid URL: {source}")]
    InvalidUrl {
        var: &'static str,
        #[source]
        source: url::ParseError,
    },

    #[error("{var} must be a number, got {value:?}")]
    InvalidNumber { var: &'static str, value: String },
}
