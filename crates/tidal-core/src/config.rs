//! tidal.toml configuration parser.
//!
//! ```toml
//! [optimizer]
//! listen = "0.0.0.0:8080"
//! discovery = "dynamic"
//!
//! [engine]
//! relief_rps = 400
//!
//! [[services]]
//! id = "payment-gateway"
//! name = "Payment Gateway"
//! type = "PAYMENT"
//! consistency = "STRONG"
//! critical = true
//! ```
//!
//! Every section is optional. A file without `[[services]]` bootstraps
//! the default five-service fleet.

use std::collections::HashSet;
use std::net::SocketAddr;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};
use crate::types::{ConsistencyLevel, DiscoveryMode, RuleThresholds, ServiceRecord, ServiceType};

/// Upper bound on `optimizer.history_len`.
pub const MAX_HISTORY_LEN: usize = 10_000;

pub const DEFAULT_MAX_SERVICES: usize = 1_024;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TidalConfig {
    pub optimizer: OptimizerConfig,
    pub engine: RuleThresholds,
    pub services: Vec<ServiceEntry>,
}

impl Default for TidalConfig {
    fn default() -> Self {
        Self {
            optimizer: OptimizerConfig::default(),
            engine: RuleThresholds::default(),
            services: default_fleet(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct OptimizerConfig {
    /// Address the HTTP boundary binds to.
    pub listen: String,
    pub discovery: DiscoveryMode,
    pub initial_reward: f64,
    pub confidence: f64,
    /// How many surviving per-cycle decisions to keep for inspection.
    pub history_len: usize,
    /// Type assigned to services discovered from telemetry.
    pub discovered_type: ServiceType,
    /// Registry size past which unknown ids are no longer discovered.
    pub max_services: usize,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            listen: "0.0.0.0:8080".to_string(),
            discovery: DiscoveryMode::Dynamic,
            initial_reward: 100.0,
            confidence: 0.95,
            history_len: 10,
            discovered_type: ServiceType::Catalog,
            max_services: DEFAULT_MAX_SERVICES,
        }
    }
}

/// One statically registered service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServiceEntry {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub service_type: ServiceType,
    #[serde(default)]
    pub consistency: ConsistencyLevel,
    #[serde(default)]
    pub critical: bool,
    #[serde(default = "default_autopilot")]
    pub autopilot: bool,
}

fn default_autopilot() -> bool {
    true
}

impl From<&ServiceEntry> for ServiceRecord {
    fn from(entry: &ServiceEntry) -> Self {
        ServiceRecord::new(
            entry.id.clone(),
            entry.name.clone(),
            entry.service_type,
            entry.consistency,
        )
        .critical(entry.critical)
        .autopilot(entry.autopilot)
    }
}

impl TidalConfig {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: TidalConfig = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> anyhow::Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Check everything that would make registry bootstrap or binding fail.
    pub fn validate(&self) -> ConfigResult<()> {
        self.listen_addr()?;

        if !(0.0..=1.0).contains(&self.optimizer.confidence) {
            return Err(ConfigError::ConfidenceOutOfRange(self.optimizer.confidence));
        }
        if self.optimizer.history_len > MAX_HISTORY_LEN {
            return Err(ConfigError::HistoryTooLong {
                got: self.optimizer.history_len,
                max: MAX_HISTORY_LEN,
            });
        }
        if self.optimizer.max_services == 0 {
            return Err(ConfigError::NoServiceCapacity);
        }

        let numbers = [
            ("optimizer.initial_reward", self.optimizer.initial_reward),
            ("engine.relief_reward", self.engine.relief_reward),
            ("engine.integrity_reward", self.engine.integrity_reward),
            ("engine.relief_latency_gain_ms", self.engine.relief_latency_gain_ms),
        ];
        if let Some((field, _)) = numbers.iter().find(|(_, v)| !v.is_finite()) {
            return Err(ConfigError::NonFinite(*field));
        }

        let mut seen = HashSet::new();
        for entry in &self.services {
            if entry.id.trim().is_empty() {
                return Err(ConfigError::EmptyServiceId);
            }
            if !seen.insert(entry.id.as_str()) {
                return Err(ConfigError::DuplicateServiceId(entry.id.clone()));
            }
        }
        Ok(())
    }

    pub fn listen_addr(&self) -> ConfigResult<SocketAddr> {
        self.optimizer
            .listen
            .parse()
            .map_err(|_| ConfigError::ListenAddress(self.optimizer.listen.clone()))
    }
}

/// The five-service demo fleet the optimizer starts with by default.
pub fn default_fleet() -> Vec<ServiceEntry> {
    let entry = |id: &str, name: &str, service_type, consistency, critical| ServiceEntry {
        id: id.to_string(),
        name: name.to_string(),
        service_type,
        consistency,
        critical,
        autopilot: true,
    };

    vec![
        entry("payment-gateway", "Payment Gateway", ServiceType::Payment, ConsistencyLevel::Strong, true),
        entry("inventory-service", "Inventory Manager", ServiceType::Inventory, ConsistencyLevel::Strong, true),
        entry("product-catalog", "Product Catalog", ServiceType::Catalog, ConsistencyLevel::Eventual, false),
        entry(
            "recommendation-engine",
            "Recommendation Engine",
            ServiceType::Analytics,
            ConsistencyLevel::Eventual,
            false,
        ),
        entry("user-sessions", "User Sessions", ServiceType::UserCart, ConsistencyLevel::Session, true),
    ]
}
