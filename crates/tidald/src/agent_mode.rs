//! Agent mode — a stand-in for an instrumented service.
//!
//! In this mode, the daemon:
//! 1. Pushes a simulated sample to the optimizer every `interval` seconds
//! 2. Polls its own policy and adopts the mandated consistency level
//! 3. On Ctrl-C, stops both loops

use std::time::Duration;

use tokio::sync::watch;
use tracing::{debug, info, warn};

use tidal_client::{LoadSimulator, TelemetrySource, TidalClient, transport};

/// Run the demo agent until Ctrl-C.
pub async fn run_agent(
    service_id: String,
    optimizer: String,
    interval: u64,
    policy_interval: u64,
) -> anyhow::Result<()> {
    info!(service = %service_id, %optimizer, "Tidal agent starting");

    let client = TidalClient::new(service_id.clone(), optimizer.clone());
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    // ── Policy poller ────────────────────────────────────────────
    let poller = client.clone();
    let poll_shutdown = shutdown_rx.clone();
    let poll_handle = tokio::spawn(async move {
        poller
            .poll_policy(Duration::from_secs(policy_interval.max(1)), poll_shutdown)
            .await;
    });

    // ── Telemetry loop ───────────────────────────────────────────
    let mut push_shutdown = shutdown_rx;
    let push_handle = tokio::spawn(async move {
        let mut source = LoadSimulator::new(service_id);
        let mut ticker = tokio::time::interval(Duration::from_secs(interval.max(1)));
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let sample = source.next_sample();
                    match transport::push_sample(&optimizer, &sample).await {
                        Ok(()) => debug!(
                            latency_ms = sample.latency_ms,
                            rps = sample.requests_per_sec,
                            level = %client.consistency_level(),
                            "telemetry pushed"
                        ),
                        Err(e) => warn!(error = %e, "telemetry push failed"),
                    }
                }
                _ = push_shutdown.changed() => break,
            }
        }
    });

    tokio::signal::ctrl_c().await?;
    info!("shutdown signal received");
    let _ = shutdown_tx.send(true);

    let _ = push_handle.await;
    let _ = poll_handle.await;

    info!("agent stopped");
    Ok(())
}
