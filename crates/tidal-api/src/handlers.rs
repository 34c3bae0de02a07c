//! HTTP handlers.
//!
//! `/metrics` and `/state` keep the bare wire shapes agents and dashboards
//! already speak; the `/api/v1` routes use the `ApiResponse` envelope.

use axum::Json;
use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;

use crate::ApiState;

/// Response wrapper for consistent API format.
#[derive(serde::Serialize)]
struct ApiResponse<T: serde::Serialize> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T: serde::Serialize> ApiResponse<T> {
    fn ok(data: T) -> Json<Self> {
        Json(Self {
            success: true,
            data: Some(data),
            error: None,
        })
    }
}

fn error_response(msg: &str, status: StatusCode) -> impl IntoResponse {
    (
        status,
        Json(ApiResponse::<()> {
            success: false,
            data: None,
            error: Some(msg.to_string()),
        }),
    )
}

// ── Ingest ─────────────────────────────────────────────────────

/// POST /metrics
///
/// Takes the raw body so schema errors go through the gateway's
/// rejection path instead of axum's extractor rejection. Every rejection,
/// including an unknown id under static discovery, is a 400.
pub async fn ingest(State(state): State<ApiState>, body: Bytes) -> impl IntoResponse {
    match state.gateway.ingest_json(&body) {
        Ok(_) => StatusCode::OK.into_response(),
        Err(e) => error_response(&e.to_string(), StatusCode::BAD_REQUEST).into_response(),
    }
}

// ── Snapshot ───────────────────────────────────────────────────

/// GET /state
pub async fn export_state(State(state): State<ApiState>) -> impl IntoResponse {
    Json(state.exporter.export_state())
}

// ── Services ───────────────────────────────────────────────────

/// GET /api/v1/services
pub async fn list_services(State(state): State<ApiState>) -> impl IntoResponse {
    ApiResponse::ok(state.state.records())
}

/// GET /api/v1/services/:id
pub async fn get_service(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    match state.state.record(&id) {
        Some(record) => ApiResponse::ok(record).into_response(),
        None => error_response("service not found", StatusCode::NOT_FOUND).into_response(),
    }
}

/// GET /api/v1/services/:id/policy
///
/// Returns the bare `PolicyUpdate` document agents consume.
pub async fn get_policy(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    match state.state.policy_for(&id) {
        Some(policy) => Json(policy).into_response(),
        None => error_response("service not found", StatusCode::NOT_FOUND).into_response(),
    }
}

// ── Fleet ──────────────────────────────────────────────────────

/// GET /api/v1/stats
pub async fn get_stats(State(state): State<ApiState>) -> impl IntoResponse {
    ApiResponse::ok(state.state.counters())
}

/// GET /api/v1/decisions
pub async fn list_decisions(State(state): State<ApiState>) -> impl IntoResponse {
    ApiResponse::ok(state.state.recent_decisions())
}

// ── Prometheus ─────────────────────────────────────────────────

/// GET /metrics
pub async fn prometheus_metrics(State(state): State<ApiState>) -> impl IntoResponse {
    let body = tidal_metrics::render_prometheus(&state.state.snapshot());
    (
        StatusCode::OK,
        [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
        body,
    )
}
