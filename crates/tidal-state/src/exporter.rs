//! Snapshot exporter — the dashboard-facing projection.

use tidal_core::GlobalStateView;

use crate::store::GlobalState;

/// Hands out owned `GlobalStateView` copies; never a reference into the
/// live maps.
#[derive(Clone)]
pub struct SnapshotExporter {
    state: GlobalState,
}

impl SnapshotExporter {
    pub fn new(state: GlobalState) -> Self {
        Self { state }
    }

    /// Last sample per id, the surviving decision text, and the reward,
    /// all read under one lock so they belong to the same cycle.
    pub fn export_state(&self) -> GlobalStateView {
        self.state.with_read(|inner| GlobalStateView {
            services: inner
                .samples
                .iter()
                .map(|(id, sample)| (id.clone(), sample.clone()))
                .collect(),
            last_decision: inner.counters.last_decision.clone(),
            reward: inner.counters.reward,
        })
    }
}
