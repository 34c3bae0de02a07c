//! TidalClient — what an instrumented service links against.

use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use tokio::sync::watch;
use tracing::{debug, info};

use tidal_core::{ConsistencyLevel, PolicyUpdate, ServiceId, TelemetrySample};

use crate::error::ClientResult;
use crate::transport::{self, DEFAULT_TIMEOUT};

/// Handle to the optimizer for one service. Cheap to clone.
#[derive(Clone)]
pub struct TidalClient {
    service_id: ServiceId,
    /// Optimizer address (host:port).
    optimizer: String,
    level: Arc<RwLock<ConsistencyLevel>>,
}

impl TidalClient {
    pub fn new(service_id: impl Into<ServiceId>, optimizer: impl Into<String>) -> Self {
        Self {
            service_id: service_id.into(),
            optimizer: optimizer.into(),
            level: Arc::new(RwLock::new(ConsistencyLevel::Strong)),
        }
    }

    pub fn service_id(&self) -> &str {
        &self.service_id
    }

    /// Report one operation. Returns immediately; delivery happens on a
    /// background task and failures are only logged.
    ///
    /// Each call counts as a single request. Outside a tokio runtime the
    /// sample is dropped.
    pub fn record_operation(&self, operation: &str, latency_ms: f64) {
        let sample = TelemetrySample::new(self.service_id.clone(), operation, latency_ms, 1);

        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            debug!(service = %self.service_id, "no runtime, telemetry dropped");
            return;
        };

        let optimizer = self.optimizer.clone();
        handle.spawn(async move {
            if let Err(e) = transport::push_sample(&optimizer, &sample).await {
                debug!(service = %sample.service_id, error = %e, "telemetry push failed");
            }
        });
    }

    /// Level mandated by the last policy received; STRONG until then.
    pub fn consistency_level(&self) -> ConsistencyLevel {
        *self.level.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Adopt a policy addressed to this service. Returns whether the
    /// level changed; policies for other services are ignored.
    pub fn apply_policy(&self, policy: &PolicyUpdate) -> bool {
        if policy.service_id != self.service_id {
            return false;
        }
        let mut level = self.level.write().unwrap_or_else(PoisonError::into_inner);
        if *level == policy.consistency {
            return false;
        }
        info!(
            service = %self.service_id,
            from = %*level,
            to = %policy.consistency,
            "policy update received"
        );
        *level = policy.consistency;
        true
    }

    /// Fetch the current policy once and apply it.
    pub async fn refresh_policy(&self) -> ClientResult<ConsistencyLevel> {
        let path = transport::policy_path(&self.service_id);
        let policy: PolicyUpdate =
            transport::get_json(&self.optimizer, &path, DEFAULT_TIMEOUT).await?;
        self.apply_policy(&policy);
        Ok(self.consistency_level())
    }

    /// Poll the policy endpoint until shutdown. Errors keep the last
    /// known level.
    pub async fn poll_policy(&self, interval: Duration, mut shutdown: watch::Receiver<bool>) {
        loop {
            tokio::select! {
                _ = tokio::time::sleep(interval) => {
                    if let Err(e) = self.refresh_policy().await {
                        debug!(service = %self.service_id, error = %e, "policy poll failed");
                    }
                }
                _ = shutdown.changed() => {
                    debug!(service = %self.service_id, "policy poller shutting down");
                    break;
                }
            }
        }
    }
}
