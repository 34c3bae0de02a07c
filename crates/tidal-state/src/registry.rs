//! Service registry — the ordered set of tracked services.
//!
//! Iteration order is registration order, and it decides which message
//! survives in `last_decision` when several rules fire in one cycle.

use std::collections::HashMap;

use tracing::debug;

use tidal_core::{ServiceEntry, ServiceId, ServiceRecord};

use crate::error::{StateError, StateResult};

#[derive(Debug, Clone, Default)]
pub struct ServiceRegistry {
    records: Vec<ServiceRecord>,
    /// id → position in `records`.
    index: HashMap<ServiceId, usize>,
}

impl ServiceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bootstrap from configured entries, failing on blank or repeated ids.
    pub fn from_entries(entries: &[ServiceEntry]) -> StateResult<Self> {
        let mut registry = Self::new();
        for entry in entries {
            registry.insert(ServiceRecord::from(entry))?;
        }
        debug!(services = registry.len(), "service registry bootstrapped");
        Ok(registry)
    }

    /// Register a new record. Records are never removed.
    pub fn insert(&mut self, record: ServiceRecord) -> StateResult<()> {
        if record.id.trim().is_empty() {
            return Err(StateError::EmptyServiceId);
        }
        if self.index.contains_key(&record.id) {
            return Err(StateError::DuplicateService(record.id));
        }
        self.index.insert(record.id.clone(), self.records.len());
        self.records.push(record);
        Ok(())
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn get(&self, id: &str) -> Option<&ServiceRecord> {
        self.index.get(id).map(|&i| &self.records[i])
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut ServiceRecord> {
        self.index.get(id).map(|&i| &mut self.records[i])
    }

    /// All records in registration order, for a decision pass.
    pub fn records_mut(&mut self) -> &mut [ServiceRecord] {
        &mut self.records
    }

    pub fn iter(&self) -> impl Iterator<Item = &ServiceRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
