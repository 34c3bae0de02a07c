//! Telemetry sources for agents and tests.

use std::ops::Range;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use tidal_core::{ServiceId, TelemetrySample};

/// Anything that can produce the next sample to push.
pub trait TelemetrySource {
    fn next_sample(&mut self) -> TelemetrySample;
}

/// Random load: latency in `[10, 60)` ms, throughput in `[50, 150)` rps.
pub struct LoadSimulator<R: Rng = StdRng> {
    service_id: ServiceId,
    operation: String,
    latency_ms: Range<u32>,
    requests_per_sec: Range<i64>,
    rng: R,
}

impl LoadSimulator<StdRng> {
    pub fn new(service_id: impl Into<ServiceId>) -> Self {
        Self::with_rng(service_id, StdRng::from_entropy())
    }
}

impl<R: Rng> LoadSimulator<R> {
    pub fn with_rng(service_id: impl Into<ServiceId>, rng: R) -> Self {
        Self {
            service_id: service_id.into(),
            operation: "DB_READ".to_string(),
            latency_ms: 10..60,
            requests_per_sec: 50..150,
            rng,
        }
    }

    pub fn operation(mut self, operation: impl Into<String>) -> Self {
        self.operation = operation.into();
        self
    }

    /// Override the latency range. Empty ranges are ignored.
    pub fn latency_ms(mut self, range: Range<u32>) -> Self {
        if !range.is_empty() {
            self.latency_ms = range;
        }
        self
    }

    /// Override the throughput range. Empty ranges are ignored.
    pub fn requests_per_sec(mut self, range: Range<i64>) -> Self {
        if !range.is_empty() {
            self.requests_per_sec = range;
        }
        self
    }
}

impl<R: Rng> TelemetrySource for LoadSimulator<R> {
    fn next_sample(&mut self) -> TelemetrySample {
        let latency = self.rng.gen_range(self.latency_ms.clone());
        let rps = self.rng.gen_range(self.requests_per_sec.clone());
        TelemetrySample::new(self.service_id.clone(), &self.operation, f64::from(latency), rps)
    }
}

/// Replays a fixed list of samples, wrapping around at the end.
pub struct FixedSource {
    samples: Vec<TelemetrySample>,
    next: usize,
}

impl FixedSource {
    /// Returns `None` for an empty list.
    pub fn new(samples: Vec<TelemetrySample>) -> Option<Self> {
        if samples.is_empty() {
            return None;
        }
        Some(Self { samples, next: 0 })
    }
}

impl TelemetrySource for FixedSource {
    fn next_sample(&mut self) -> TelemetrySample {
        let sample = self.samples[self.next].clone();
        self.next = (self.next + 1) % self.samples.len();
        sample
    }
}
