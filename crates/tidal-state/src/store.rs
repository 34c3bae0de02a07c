//! GlobalState — the single lock-guarded store behind the optimizer.
//!
//! One `RwLock` covers the registry, the last-sample projection, the
//! counters, and the decision history. `apply_and_decide` holds the write
//! lock for the whole merge-plus-cycle, so readers only ever see state
//! produced by complete cycles. Nothing inside the lock performs I/O.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::Serialize;
use tracing::{debug, info};

use tidal_core::{
    ConsistencyLevel, DiscoveryMode, FleetCounters, PolicyUpdate, ServiceId, ServiceRecord,
    ServiceType, TelemetrySample, TidalConfig,
};
use tidal_engine::{CycleReport, DecisionEngine, DecisionEvent};

use crate::error::{StateError, StateResult};
use crate::registry::ServiceRegistry;

/// Knobs that shape state behaviour but never change at runtime.
#[derive(Debug, Clone, PartialEq)]
pub struct StateSettings {
    pub discovery: DiscoveryMode,
    pub discovered_type: ServiceType,
    pub history_len: usize,
    /// Discovery stops once the registry holds this many services.
    pub max_services: usize,
    pub initial_reward: f64,
    pub confidence: f64,
}

impl Default for StateSettings {
    fn default() -> Self {
        let optimizer = tidal_core::OptimizerConfig::default();
        Self {
            discovery: optimizer.discovery,
            discovered_type: optimizer.discovered_type,
            history_len: optimizer.history_len,
            max_services: optimizer.max_services,
            initial_reward: optimizer.initial_reward,
            confidence: optimizer.confidence,
        }
    }
}

pub(crate) struct Inner {
    pub(crate) registry: ServiceRegistry,
    /// Last ingested sample per id (dashboard projection).
    pub(crate) samples: HashMap<ServiceId, TelemetrySample>,
    pub(crate) counters: FleetCounters,
    /// Surviving decision of each cycle that fired anything, oldest first.
    pub(crate) history: VecDeque<DecisionEvent>,
}

/// Deep copy of everything the store holds.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StateSnapshot {
    pub services: Vec<ServiceRecord>,
    pub samples: BTreeMap<ServiceId, TelemetrySample>,
    pub counters: FleetCounters,
    pub recent_decisions: Vec<DecisionEvent>,
}

/// Thread-safe optimizer state.
#[derive(Clone)]
pub struct GlobalState {
    inner: Arc<RwLock<Inner>>,
    engine: Arc<DecisionEngine>,
    settings: Arc<StateSettings>,
}

impl GlobalState {
    /// Validate the config and bootstrap the registry from it.
    pub fn from_config(config: &TidalConfig) -> StateResult<Self> {
        config.validate()?;
        let registry = ServiceRegistry::from_entries(&config.services)?;
        let settings = StateSettings {
            discovery: config.optimizer.discovery,
            discovered_type: config.optimizer.discovered_type,
            history_len: config.optimizer.history_len,
            max_services: config.optimizer.max_services,
            initial_reward: config.optimizer.initial_reward,
            confidence: config.optimizer.confidence,
        };
        Ok(Self::new(
            registry,
            DecisionEngine::new(config.engine.clone()),
            settings,
        ))
    }

    pub fn new(registry: ServiceRegistry, engine: DecisionEngine, settings: StateSettings) -> Self {
        info!(
            services = registry.len(),
            discovery = ?settings.discovery,
            "global state initialized"
        );
        let inner = Inner {
            registry,
            samples: HashMap::new(),
            counters: FleetCounters::new(settings.initial_reward, settings.confidence),
            history: VecDeque::new(),
        };
        Self {
            inner: Arc::new(RwLock::new(inner)),
            engine: Arc::new(engine),
            settings: Arc::new(settings),
        }
    }

    pub fn settings(&self) -> &StateSettings {
        &self.settings
    }

    // A panic can't leave a half-applied cycle behind (the pipeline is
    // total), so a poisoned lock is safe to keep using.
    fn read(&self) -> RwLockReadGuard<'_, Inner> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Inner> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run `f` against the live state under the read lock.
    pub(crate) fn with_read<R>(&self, f: impl FnOnce(&Inner) -> R) -> R {
        f(&self.read())
    }

    /// Merge one sample and run one decision cycle over the whole fleet.
    ///
    /// In static discovery mode an unknown id fails before anything is
    /// mutated. The decision counter moves by exactly one on success.
    pub fn apply_and_decide(&self, sample: &TelemetrySample) -> StateResult<CycleReport> {
        let mut guard = self.write();
        let inner = &mut *guard;

        if !inner.registry.contains(&sample.service_id) {
            match self.settings.discovery {
                DiscoveryMode::Static => {
                    return Err(StateError::UnknownService(sample.service_id.clone()));
                }
                DiscoveryMode::Dynamic => {
                    if inner.registry.len() >= self.settings.max_services {
                        return Err(StateError::RegistryFull(self.settings.max_services));
                    }
                    let record = ServiceRecord::new(
                        sample.service_id.clone(),
                        sample.service_id.clone(),
                        self.settings.discovered_type,
                        ConsistencyLevel::Strong,
                    );
                    inner.registry.insert(record)?;
                    info!(service = %sample.service_id, "discovered new service");
                }
            }
        }

        if let Some(record) = inner.registry.get_mut(&sample.service_id) {
            record.merge_sample(sample);
        }
        inner
            .samples
            .insert(sample.service_id.clone(), sample.clone());

        let report = self
            .engine
            .run_cycle(inner.registry.records_mut(), &mut inner.counters);

        if self.settings.history_len > 0
            && let Some(last) = report.last_event()
        {
            if inner.history.len() == self.settings.history_len {
                inner.history.pop_front();
            }
            inner.history.push_back(last.clone());
        }

        debug!(
            service = %sample.service_id,
            cycle = report.cycle,
            "sample applied"
        );
        Ok(report)
    }

    /// Independent copy of the whole state.
    pub fn snapshot(&self) -> StateSnapshot {
        let inner = self.read();
        StateSnapshot {
            services: inner.registry.iter().cloned().collect(),
            samples: inner
                .samples
                .iter()
                .map(|(id, s)| (id.clone(), s.clone()))
                .collect(),
            counters: inner.counters.clone(),
            recent_decisions: inner.history.iter().cloned().collect(),
        }
    }

    /// Current policy for one service, if it is registered.
    pub fn policy_for(&self, id: &str) -> Option<PolicyUpdate> {
        self.read().registry.get(id).map(ServiceRecord::policy)
    }

    pub fn record(&self, id: &str) -> Option<ServiceRecord> {
        self.read().registry.get(id).cloned()
    }

    pub fn records(&self) -> Vec<ServiceRecord> {
        self.read().registry.iter().cloned().collect()
    }

    pub fn counters(&self) -> FleetCounters {
        self.read().counters.clone()
    }

    pub fn recent_decisions(&self) -> Vec<DecisionEvent> {
        self.read().history.iter().cloned().collect()
    }
}
