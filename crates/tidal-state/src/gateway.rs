//! Ingest gateway — validation in front of `apply_and_decide`.
//!
//! Malformed samples are turned away before the lock is taken. Unknown
//! ids in static mode are refused before anything is mutated.

use thiserror::Error;
use tracing::{debug, warn};

use tidal_core::TelemetrySample;

use crate::error::StateError;
use crate::store::GlobalState;

/// Acknowledgement of an accepted sample. Carries no payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ack;

/// Why a sample was turned away.
#[derive(Debug, Error, PartialEq)]
pub enum Rejected {
    #[error("malformed telemetry: {0}")]
    MalformedInput(String),

    #[error("unknown service: {0}")]
    UnknownService(String),

    #[error("service registry is full ({0} services)")]
    RegistryFull(usize),
}

impl From<StateError> for Rejected {
    fn from(e: StateError) -> Self {
        match e {
            StateError::UnknownService(id) => Rejected::UnknownService(id),
            StateError::RegistryFull(max) => Rejected::RegistryFull(max),
            other => Rejected::MalformedInput(other.to_string()),
        }
    }
}

#[derive(Clone)]
pub struct IngestGateway {
    state: GlobalState,
}

impl IngestGateway {
    pub fn new(state: GlobalState) -> Self {
        Self { state }
    }

    /// Validate and apply one sample, running a full decision cycle.
    pub fn ingest(&self, sample: TelemetrySample) -> Result<Ack, Rejected> {
        if let Err(e) = validate(&sample) {
            warn!(service = %sample.service_id, error = %e, "telemetry rejected");
            return Err(e);
        }

        match self.state.apply_and_decide(&sample) {
            Ok(report) => {
                debug!(
                    service = %sample.service_id,
                    cycle = report.cycle,
                    fired = report.events.len(),
                    "telemetry accepted"
                );
                Ok(Ack)
            }
            Err(e) => {
                warn!(service = %sample.service_id, error = %e, "telemetry rejected");
                Err(e.into())
            }
        }
    }

    /// Parse a JSON ingest document and hand it to `ingest`.
    pub fn ingest_json(&self, body: &[u8]) -> Result<Ack, Rejected> {
        let sample: TelemetrySample = serde_json::from_slice(body).map_err(|e| {
            warn!(error = %e, "telemetry document did not parse");
            Rejected::MalformedInput(e.to_string())
        })?;
        self.ingest(sample)
    }
}

fn validate(sample: &TelemetrySample) -> Result<(), Rejected> {
    if sample.service_id.trim().is_empty() {
        return Err(Rejected::MalformedInput("service_id is empty".to_string()));
    }
    if !sample.latency_ms.is_finite() {
        return Err(Rejected::MalformedInput(format!(
            "latency_ms is not a finite number: {}",
            sample.latency_ms
        )));
    }
    Ok(())
}
