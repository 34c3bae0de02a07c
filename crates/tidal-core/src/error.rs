//! Configuration errors.

use thiserror::Error;

/// Result type alias for configuration validation.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Problems found while validating a `TidalConfig`.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("service entry has an empty id")]
    EmptyServiceId,

    #[error("duplicate service id: {0}")]
    DuplicateServiceId(String),

    #[error("confidence must be within 0.0..=1.0, got {0}")]
    ConfidenceOutOfRange(f64),

    #[error("invalid listen address: {0}")]
    ListenAddress(String),

    #[error("history_len must be at most {max}, got {got}")]
    HistoryTooLong { got: usize, max: usize },

    #[error("max_services must be at least 1")]
    NoServiceCapacity,

    #[error("{0} must be a finite number")]
    NonFinite(&'static str),
}
