//! Domain types shared across Tidal crates.
//!
//! `ServiceRecord` is the optimizer's per-service view; `TelemetrySample`,
//! `PolicyUpdate`, and `GlobalStateView` are the JSON documents exchanged
//! at the ingest, policy, and snapshot boundaries.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Unique identifier for a tracked service.
pub type ServiceId = String;

// ── Consistency ───────────────────────────────────────────────────

/// Data-consistency guarantee mandated for a service's storage accesses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConsistencyLevel {
    #[default]
    Strong,
    Eventual,
    Session,
}

impl ConsistencyLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConsistencyLevel::Strong => "STRONG",
            ConsistencyLevel::Eventual => "EVENTUAL",
            ConsistencyLevel::Session => "SESSION",
        }
    }

    /// Numeric code used by the Prometheus exposition (0 = strong).
    pub fn code(&self) -> u8 {
        match self {
            ConsistencyLevel::Strong => 0,
            ConsistencyLevel::Session => 1,
            ConsistencyLevel::Eventual => 2,
        }
    }
}

impl fmt::Display for ConsistencyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Service ───────────────────────────────────────────────────────

/// Closed set of service kinds the engine knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ServiceType {
    Payment,
    Inventory,
    Catalog,
    UserCart,
    Analytics,
}

impl ServiceType {
    /// Payment and inventory writes must never run below STRONG.
    pub fn is_transactional(&self) -> bool {
        matches!(self, ServiceType::Payment | ServiceType::Inventory)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceType::Payment => "PAYMENT",
            ServiceType::Inventory => "INVENTORY",
            ServiceType::Catalog => "CATALOG",
            ServiceType::UserCart => "USER_CART",
            ServiceType::Analytics => "ANALYTICS",
        }
    }
}

impl fmt::Display for ServiceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The optimizer's view of one service: static attributes plus the
/// latest merged telemetry and the currently mandated consistency level.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServiceRecord {
    pub id: ServiceId,
    /// Human-readable name used in decision messages.
    pub name: String,
    #[serde(rename = "type")]
    pub service_type: ServiceType,
    pub consistency: ConsistencyLevel,
    /// Latest observed operation latency in milliseconds.
    pub latency_ms: f64,
    /// Latest observed throughput.
    pub requests_per_sec: i64,
    /// Error rate (0.0–1.0). Not fed by telemetry yet.
    pub error_rate: f64,
    /// SLA compliance (0.0–1.0). Not fed by telemetry yet.
    pub sla_compliance: f64,
    pub critical: bool,
    /// Eligible for automatic consistency changes.
    pub autopilot: bool,
}

impl ServiceRecord {
    pub fn new(
        id: impl Into<ServiceId>,
        name: impl Into<String>,
        service_type: ServiceType,
        consistency: ConsistencyLevel,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            service_type,
            consistency,
            latency_ms: 0.0,
            requests_per_sec: 0,
            error_rate: 0.0,
            sla_compliance: 1.0,
            critical: false,
            autopilot: true,
        }
    }

    pub fn critical(mut self, critical: bool) -> Self {
        self.critical = critical;
        self
    }

    pub fn autopilot(mut self, autopilot: bool) -> Self {
        self.autopilot = autopilot;
        self
    }

    /// Overwrite the latest-known telemetry fields from a sample.
    pub fn merge_sample(&mut self, sample: &TelemetrySample) {
        self.latency_ms = sample.latency_ms;
        self.requests_per_sec = sample.requests_per_sec;
    }

    /// The policy document for this record's current level.
    pub fn policy(&self) -> PolicyUpdate {
        PolicyUpdate {
            service_id: self.id.clone(),
            consistency: self.consistency,
        }
    }
}

// ── Wire documents ────────────────────────────────────────────────

/// One point-in-time measurement pushed by an instrumented service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TelemetrySample {
    pub service_id: ServiceId,
    pub operation: String,
    pub latency_ms: f64,
    /// Requests per second. Older agents send this as `rps`.
    #[serde(alias = "rps")]
    pub requests_per_sec: i64,
}

impl TelemetrySample {
    pub fn new(
        service_id: impl Into<ServiceId>,
        operation: impl Into<String>,
        latency_ms: f64,
        requests_per_sec: i64,
    ) -> Self {
        Self {
            service_id: service_id.into(),
            operation: operation.into(),
            latency_ms,
            requests_per_sec,
        }
    }
}

/// Consistency mandate delivered to an instrumented service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PolicyUpdate {
    pub service_id: ServiceId,
    pub consistency: ConsistencyLevel,
}

/// Dashboard-facing projection of the optimizer state.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct GlobalStateView {
    /// Last ingested sample per service id.
    pub services: BTreeMap<ServiceId, TelemetrySample>,
    pub last_decision: String,
    pub reward: f64,
}

/// Fleet-wide bookkeeping counters.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FleetCounters {
    /// Cumulative reward; never decreases.
    pub reward: f64,
    /// Completed decision cycles.
    pub decisions: u64,
    /// Text of the most recent decision that fired.
    pub last_decision: String,
    /// Static bookkeeping value.
    pub confidence: f64,
    /// Cumulative estimated latency saved, in milliseconds.
    pub latency_reduction_ms: f64,
}

impl FleetCounters {
    pub fn new(initial_reward: f64, confidence: f64) -> Self {
        Self {
            reward: initial_reward,
            decisions: 0,
            last_decision: String::new(),
            confidence,
            latency_reduction_ms: 0.0,
        }
    }
}

// ── Engine tuning ─────────────────────────────────────────────────

/// Guard thresholds and payouts for the decision rules.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RuleThresholds {
    /// Non-critical services above this rps are relaxed to EVENTUAL.
    pub relief_rps: i64,
    /// Critical services above this rps trigger a protection notice.
    pub protect_rps: i64,
    /// EVENTUAL services below this rps are upgraded to SESSION.
    pub upgrade_rps: i64,
    pub relief_reward: f64,
    pub integrity_reward: f64,
    /// Latency credited per load-relief action, in milliseconds.
    pub relief_latency_gain_ms: f64,
}

impl Default for RuleThresholds {
    fn default() -> Self {
        Self {
            relief_rps: 400,
            protect_rps: 480,
            upgrade_rps: 100,
            relief_reward: 10.0,
            integrity_reward: 5.0,
            relief_latency_gain_ms: 15.5,
        }
    }
}

/// Whether telemetry from unknown ids creates new records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscoveryMode {
    #[default]
    Dynamic,
    Static,
}
