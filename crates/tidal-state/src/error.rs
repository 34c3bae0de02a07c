//! Error types for the Tidal state layer.

use thiserror::Error;

use tidal_core::ConfigError;

/// Result type alias for state operations.
pub type StateResult<T> = Result<T, StateError>;

/// Errors raised by registry bootstrap or state mutation.
#[derive(Debug, Error, PartialEq)]
pub enum StateError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("service id must not be empty")]
    EmptyServiceId,

    #[error("duplicate service: {0}")]
    DuplicateService(String),

    #[error("unknown service: {0}")]
    UnknownService(String),

    #[error("service registry is full ({0} services)")]
    RegistryFull(usize),
}
