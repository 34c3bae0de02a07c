//! Decision cycle — one pipeline pass over the whole fleet.
//!
//! Runs `evaluate()` over every record in registry order, writes the
//! results back in place, and folds fired events into the fleet counters.
//! The decision counter moves by exactly one per cycle, whatever fired.

use tracing::{debug, info};

use tidal_core::{FleetCounters, PolicyUpdate, RuleThresholds, ServiceRecord};

use crate::rules::{evaluate, DecisionEvent, FleetContext};

/// Summary of one completed cycle.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CycleReport {
    /// Value of the decision counter after this cycle.
    pub cycle: u64,
    /// Every event that fired, in firing order.
    pub events: Vec<DecisionEvent>,
    /// Services whose level differs from where the cycle started.
    pub policy_changes: Vec<PolicyUpdate>,
}

impl CycleReport {
    /// The event whose message ended up in `last_decision`.
    pub fn last_event(&self) -> Option<&DecisionEvent> {
        self.events.last()
    }
}

/// Applies the rule pipeline with a fixed set of thresholds.
#[derive(Debug, Clone, Default)]
pub struct DecisionEngine {
    thresholds: RuleThresholds,
}

impl DecisionEngine {
    pub fn new(thresholds: RuleThresholds) -> Self {
        Self { thresholds }
    }

    pub fn thresholds(&self) -> &RuleThresholds {
        &self.thresholds
    }

    /// Run one decision cycle over `records`, mutating them and `counters`.
    pub fn run_cycle(
        &self,
        records: &mut [ServiceRecord],
        counters: &mut FleetCounters,
    ) -> CycleReport {
        let cycle = counters.decisions + 1;
        let ctx = FleetContext::new(&self.thresholds, cycle);
        let mut report = CycleReport {
            cycle,
            ..CycleReport::default()
        };

        for record in records.iter_mut() {
            let eval = evaluate(record, &ctx);
            if eval.changed_from(record) {
                info!(
                    service = %record.id,
                    from = %record.consistency,
                    to = %eval.record.consistency,
                    cycle,
                    "consistency level changed"
                );
                report.policy_changes.push(eval.record.policy());
            }
            *record = eval.record;

            for event in eval.events {
                apply_event(counters, &event);
                report.events.push(event);
            }
        }

        counters.decisions = cycle;
        debug!(
            cycle,
            fired = report.events.len(),
            reward = counters.reward,
            "decision cycle complete"
        );
        report
    }
}

/// Fold one event into the counters. The decision text is overwritten,
/// never accumulated.
fn apply_event(counters: &mut FleetCounters, event: &DecisionEvent) {
    counters.reward += event.reward_delta;
    counters.latency_reduction_ms += event.latency_reduction_ms;
    counters.last_decision.clone_from(&event.message);
}

#[cfg(test)]
mod tests {
    use super::*;
    use tidal_core::{ConsistencyLevel, ServiceType};

    fn svc(id: &str, name: &str, ty: ServiceType, level: ConsistencyLevel, rps: i64) -> ServiceRecord {
        let mut r = ServiceRecord::new(id, name, ty, level);
        r.requests_per_sec = rps;
        r
    }

    fn counters() -> FleetCounters {
        FleetCounters::new(100.0, 0.95)
    }

    #[test]
    fn counter_moves_once_per_cycle() {
        let engine = DecisionEngine::default();
        let mut records = vec![
            svc("a", "A", ServiceType::Catalog, ConsistencyLevel::Strong, 420),
            svc("b", "B", ServiceType::Analytics, ConsistencyLevel::Eventual, 10),
        ];
        let mut c = counters();

        let report = engine.run_cycle(&mut records, &mut c);
        assert_eq!(report.cycle, 1);
        assert_eq!(report.events.len(), 2);
        assert_eq!(c.decisions, 1);

        engine.run_cycle(&mut records, &mut c);
        assert_eq!(c.decisions, 2);
    }

    #[test]
    fn empty_fleet_still_counts_a_cycle() {
        let engine = DecisionEngine::default();
        let mut c = counters();
        let report = engine.run_cycle(&mut [], &mut c);
        assert_eq!(report.cycle, 1);
        assert!(report.events.is_empty());
        assert_eq!(c.decisions, 1);
        assert_eq!(c.reward, 100.0);
    }

    #[test]
    fn last_decision_is_last_fired_in_registry_order() {
        let engine = DecisionEngine::default();
        let mut records = vec![
            svc("a", "First", ServiceType::Catalog, ConsistencyLevel::Strong, 420),
            svc("b", "Second", ServiceType::Analytics, ConsistencyLevel::Eventual, 10),
        ];
        let mut c = counters();
        let report = engine.run_cycle(&mut records, &mut c);

        assert_eq!(c.last_decision, "Improving consistency for Second (Low Load)");
        assert_eq!(report.last_event().map(|e| e.service_id.as_str()), Some("b"));
    }

    #[test]
    fn last_decision_survives_quiet_cycle() {
        let engine = DecisionEngine::default();
        let mut records = vec![svc("a", "A", ServiceType::Catalog, ConsistencyLevel::Strong, 420)];
        let mut c = counters();
        engine.run_cycle(&mut records, &mut c);
        let after_first = c.last_decision.clone();

        // Now EVENTUAL at high load: nothing fires.
        let report = engine.run_cycle(&mut records, &mut c);
        assert!(report.events.is_empty());
        assert_eq!(c.last_decision, after_first);
    }

    #[test]
    fn load_relief_payouts_are_exact() {
        let engine = DecisionEngine::default();
        let mut records = vec![svc("cat", "Catalog", ServiceType::Catalog, ConsistencyLevel::Strong, 420)];
        let mut c = counters();
        engine.run_cycle(&mut records, &mut c);

        assert_eq!(records[0].consistency, ConsistencyLevel::Eventual);
        assert_eq!(c.reward, 110.0);
        assert_eq!(c.latency_reduction_ms, 15.5);
        assert_eq!(c.last_decision, "Relaxed Catalog due to high load");
    }

    #[test]
    fn stable_telemetry_stops_paying_reward() {
        let engine = DecisionEngine::default();
        let mut records = vec![
            svc("cat", "Catalog", ServiceType::Catalog, ConsistencyLevel::Strong, 420),
            svc("pay", "Pay", ServiceType::Payment, ConsistencyLevel::Eventual, 450).critical(true),
        ];
        let mut c = counters();
        engine.run_cycle(&mut records, &mut c);
        let settled = c.reward;
        assert_eq!(settled, 115.0);

        for _ in 0..5 {
            let report = engine.run_cycle(&mut records, &mut c);
            assert!(report.policy_changes.is_empty());
            assert_eq!(c.reward, settled);
        }
    }

    #[test]
    fn relief_then_integrity_reports_no_policy_change() {
        let engine = DecisionEngine::default();
        let mut records = vec![svc("inv", "Inv", ServiceType::Inventory, ConsistencyLevel::Strong, 450)];
        let mut c = counters();
        let report = engine.run_cycle(&mut records, &mut c);

        assert_eq!(report.events.len(), 2);
        assert!(report.policy_changes.is_empty());
        assert_eq!(c.reward, 115.0);
        assert_eq!(c.last_decision, "Ensuring Perfect mode for Inv");
    }

    #[test]
    fn policy_changes_carry_final_level() {
        let engine = DecisionEngine::default();
        let mut records = vec![svc("cat", "Cat", ServiceType::Catalog, ConsistencyLevel::Strong, 420)];
        let mut c = counters();
        let report = engine.run_cycle(&mut records, &mut c);
        assert_eq!(
            report.policy_changes,
            vec![PolicyUpdate {
                service_id: "cat".to_string(),
                consistency: ConsistencyLevel::Eventual,
            }]
        );
    }

    #[test]
    fn reward_never_decreases_over_mixed_load() {
        let engine = DecisionEngine::default();
        let mut records = vec![
            svc("cat", "Cat", ServiceType::Catalog, ConsistencyLevel::Strong, 0),
            svc("inv", "Inv", ServiceType::Inventory, ConsistencyLevel::Session, 0),
            svc("ana", "Ana", ServiceType::Analytics, ConsistencyLevel::Eventual, 0),
        ];
        let mut c = counters();
        let loads = [500, 20, 450, -3, 0, 99, 101, 401, 10_000];
        let mut previous = c.reward;

        for rps in loads {
            for r in records.iter_mut() {
                r.requests_per_sec = rps;
            }
            engine.run_cycle(&mut records, &mut c);
            assert!(c.reward >= previous);
            previous = c.reward;
        }
    }
}
