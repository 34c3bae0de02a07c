//! tidal-state — the optimizer's shared state.
//!
//! # Architecture
//!
//! ```text
//! IngestGateway::ingest(sample)
//!   └── validate ── reject (state untouched)
//!        └── GlobalState::apply_and_decide  [write lock]
//!              ├── merge sample into record (discover if allowed)
//!              └── DecisionEngine::run_cycle over whole registry
//!
//! SnapshotExporter::export_state()          [read lock]
//!   └── owned GlobalStateView
//! ```
//!
//! `GlobalState` is `Clone` + `Send` + `Sync` (backed by `Arc<RwLock<_>>`)
//! and is meant to be built once by the composition root and handed to
//! every handler. Nothing in this crate is reachable through statics, so
//! independent instances can live side by side.

pub mod error;
pub mod exporter;
pub mod gateway;
pub mod registry;
pub mod store;

pub use error::{StateError, StateResult};
pub use exporter::SnapshotExporter;
pub use gateway::{Ack, IngestGateway, Rejected};
pub use registry::ServiceRegistry;
pub use store::{GlobalState, StateSettings, StateSnapshot};
