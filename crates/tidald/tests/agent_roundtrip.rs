//! Agent round-trip tests.
//!
//! Binds a real optimizer on an ephemeral port and drives it through the
//! client library: push telemetry, fetch the resulting policy.

use std::net::SocketAddr;
use std::time::Duration;

use tidal_client::{FixedSource, TelemetrySource, TidalClient, transport};
use tidal_core::{ConsistencyLevel, TelemetrySample, TidalConfig};
use tidal_state::GlobalState;

async fn start_optimizer(config: TidalConfig) -> (SocketAddr, GlobalState) {
    let state = GlobalState::from_config(&config).unwrap();
    let router = tidal_api::build_router(state.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });
    (addr, state)
}

#[tokio::test]
async fn pushed_load_changes_the_served_policy() {
    let (addr, state) = start_optimizer(TidalConfig::default()).await;
    let optimizer = addr.to_string();

    let client = TidalClient::new("edge-cache", optimizer.clone());
    assert_eq!(client.consistency_level(), ConsistencyLevel::Strong);

    transport::push_sample(
        &optimizer,
        &TelemetrySample::new("edge-cache", "GET", 30.0, 480),
    )
    .await
    .unwrap();

    assert_eq!(state.counters().decisions, 1);
    let level = client.refresh_policy().await.unwrap();
    assert_eq!(level, ConsistencyLevel::Eventual);
    assert_eq!(client.consistency_level(), ConsistencyLevel::Eventual);
}

#[tokio::test]
async fn refresh_for_unregistered_service_is_a_status_error() {
    let (addr, _) = start_optimizer(TidalConfig::default()).await;
    let client = TidalClient::new("never-reported", addr.to_string());

    let err = client.refresh_policy().await.unwrap_err();
    assert!(matches!(err, tidal_client::ClientError::Status(404)));
    assert_eq!(client.consistency_level(), ConsistencyLevel::Strong);
}

#[tokio::test]
async fn fixed_source_drives_relief_then_upgrade() {
    let (addr, state) = start_optimizer(TidalConfig::default()).await;
    let optimizer = addr.to_string();

    let mut source = FixedSource::new(vec![
        TelemetrySample::new("batch-jobs", "SCAN", 55.0, 450),
        TelemetrySample::new("batch-jobs", "SCAN", 12.0, 20),
    ])
    .unwrap();

    transport::push_sample(&optimizer, &source.next_sample())
        .await
        .unwrap();
    assert_eq!(
        state.policy_for("batch-jobs").unwrap().consistency,
        ConsistencyLevel::Eventual
    );

    transport::push_sample(&optimizer, &source.next_sample())
        .await
        .unwrap();
    assert_eq!(
        state.policy_for("batch-jobs").unwrap().consistency,
        ConsistencyLevel::Session
    );
}

#[tokio::test]
async fn record_operation_reaches_the_optimizer() {
    let (addr, state) = start_optimizer(TidalConfig::default()).await;
    let client = TidalClient::new("checkout-ui", addr.to_string());

    client.record_operation("RENDER", 8.0);

    // Delivery is asynchronous; wait for the background push to land.
    for _ in 0..50 {
        if state.record("checkout-ui").is_some() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    let record = state.record("checkout-ui").unwrap();
    assert_eq!(record.requests_per_sec, 1);
    assert_eq!(record.latency_ms, 8.0);
}
