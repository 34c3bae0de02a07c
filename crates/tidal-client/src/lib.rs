//! tidal-client — the service-side half of Tidal.
//!
//! Embedded in instrumented services (or run as a sidecar agent):
//!
//! ```text
//! TidalClient
//!   ├── record_operation() → fire-and-forget POST /metrics
//!   ├── consistency_level() ← last policy received (STRONG until then)
//!   └── poll_policy()      → periodic GET /api/v1/services/:id/policy
//!
//! TelemetrySource
//!   ├── LoadSimulator  random latency/throughput (demo agents)
//!   └── FixedSource    literal samples, replayed in order
//! ```
//!
//! Transport failures never reach application code: a failed push is a
//! missed update and the optimizer carries on with the previous sample.

pub mod client;
pub mod error;
pub mod simulator;
pub mod transport;

pub use client::TidalClient;
pub use error::{ClientError, ClientResult};
pub use simulator::{FixedSource, LoadSimulator, TelemetrySource};
