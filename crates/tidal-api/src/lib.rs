//! tidal-api — HTTP boundary for the Tidal optimizer.
//!
//! Thin axum layer over `tidal-state`: handlers never hold the state lock
//! across an await, and all decision logic stays below this crate.
//!
//! # Routes
//!
//! | Method | Path | Description |
//! |---|---|---|
//! | POST | `/metrics` | Ingest one telemetry sample |
//! | GET | `/metrics` | Prometheus exposition |
//! | GET | `/state` | Dashboard snapshot |
//! | GET | `/api/v1/services` | List service records |
//! | GET | `/api/v1/services/:id` | Get one service record |
//! | GET | `/api/v1/services/:id/policy` | Current consistency policy |
//! | GET | `/api/v1/stats` | Fleet counters |
//! | GET | `/api/v1/decisions` | Recent surviving decisions |

pub mod handlers;

use axum::Router;
use axum::routing::get;
use tidal_state::{GlobalState, IngestGateway, SnapshotExporter};

/// Shared state for API handlers.
#[derive(Clone)]
pub struct ApiState {
    pub state: GlobalState,
    pub gateway: IngestGateway,
    pub exporter: SnapshotExporter,
}

impl ApiState {
    pub fn new(state: GlobalState) -> Self {
        Self {
            gateway: IngestGateway::new(state.clone()),
            exporter: SnapshotExporter::new(state.clone()),
            state,
        }
    }
}

/// Build the complete router (ingest + snapshot + inspection + metrics).
pub fn build_router(state: GlobalState) -> Router {
    let api_state = ApiState::new(state);

    let api_routes = Router::new()
        .route("/services", get(handlers::list_services))
        .route("/services/{id}", get(handlers::get_service))
        .route("/services/{id}/policy", get(handlers::get_policy))
        .route("/stats", get(handlers::get_stats))
        .route("/decisions", get(handlers::list_decisions))
        .with_state(api_state.clone());

    Router::new()
        .nest("/api/v1", api_routes)
        .route(
            "/metrics",
            get(handlers::prometheus_metrics).post(handlers::ingest),
        )
        .route("/state", get(handlers::export_state))
        .with_state(api_state)
}
