//! tidal-core — shared types and configuration for Tidal.
//!
//! Everything that crosses a crate boundary lives here: the closed
//! consistency/service-type enums, the per-service record, the telemetry
//! and policy wire documents, and the `tidal.toml` configuration model.

pub mod config;
pub mod error;
pub mod types;

pub use config::{
    DEFAULT_MAX_SERVICES, MAX_HISTORY_LEN, OptimizerConfig, ServiceEntry, TidalConfig,
};
pub use error::{ConfigError, ConfigResult};
pub use types::*;
