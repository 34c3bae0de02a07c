//! tidal-metrics — observability for the Tidal optimizer.
//!
//! Renders a `StateSnapshot` into the Prometheus text exposition format:
//! fleet-wide counters (reward, decisions, latency saved, confidence) and
//! per-service gauges labelled with `service`.

pub mod prometheus;

pub use prometheus::render_prometheus;
