//! Decision rules — pure evaluation of one record.
//!
//! `evaluate()` never touches shared state. It returns the updated record
//! and the events that fired, in firing order; folding those events into
//! the fleet counters is the caller's job (see `cycle`).

use serde::{Deserialize, Serialize};
use tracing::debug;

use tidal_core::{ConsistencyLevel, RuleThresholds, ServiceId, ServiceRecord};

/// The four pipeline stages, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rule {
    LoadRelief,
    CriticalProtection,
    TransactionalIntegrity,
    LowLoadUpgrade,
}

impl Rule {
    pub const PIPELINE: [Rule; 4] = [
        Rule::LoadRelief,
        Rule::CriticalProtection,
        Rule::TransactionalIntegrity,
        Rule::LowLoadUpgrade,
    ];

    /// Check the guard and, if it holds, mutate the record and describe
    /// what happened.
    fn apply(
        self,
        record: &mut ServiceRecord,
        ctx: &FleetContext<'_>,
    ) -> Option<DecisionEvent> {
        let t = ctx.thresholds;
        let rps = record.requests_per_sec;

        match self {
            Rule::LoadRelief => {
                if record.critical
                    || rps <= t.relief_rps
                    || record.consistency == ConsistencyLevel::Eventual
                {
                    return None;
                }
                let from = record.consistency;
                record.consistency = ConsistencyLevel::Eventual;
                Some(
                    ctx.event(record, self, format!("Relaxed {} due to high load", record.name))
                        .level_change(from, ConsistencyLevel::Eventual)
                        .reward(t.relief_reward)
                        .latency_gain(t.relief_latency_gain_ms),
                )
            }
            Rule::CriticalProtection => {
                if !record.critical || rps <= t.protect_rps {
                    return None;
                }
                Some(ctx.event(
                    record,
                    self,
                    format!("Protecting {} by throttling non-criticals", record.name),
                ))
            }
            Rule::TransactionalIntegrity => {
                if !record.service_type.is_transactional()
                    || record.consistency == ConsistencyLevel::Strong
                {
                    return None;
                }
                let from = record.consistency;
                record.consistency = ConsistencyLevel::Strong;
                Some(
                    ctx.event(record, self, format!("Ensuring Perfect mode for {}", record.name))
                        .level_change(from, ConsistencyLevel::Strong)
                        .reward(t.integrity_reward),
                )
            }
            Rule::LowLoadUpgrade => {
                // Only reached for non-transactional services.
                if record.service_type.is_transactional()
                    || rps >= t.upgrade_rps
                    || record.consistency != ConsistencyLevel::Eventual
                {
                    return None;
                }
                record.consistency = ConsistencyLevel::Session;
                Some(
                    ctx.event(
                        record,
                        self,
                        format!("Improving consistency for {} (Low Load)", record.name),
                    )
                    .level_change(ConsistencyLevel::Eventual, ConsistencyLevel::Session),
                )
            }
        }
    }
}

/// Read-only inputs shared by every evaluation within one cycle.
#[derive(Debug, Clone, Copy)]
pub struct FleetContext<'a> {
    pub thresholds: &'a RuleThresholds,
    /// Number the cycle will carry once it completes.
    pub cycle: u64,
}

impl<'a> FleetContext<'a> {
    pub fn new(thresholds: &'a RuleThresholds, cycle: u64) -> Self {
        Self { thresholds, cycle }
    }

    fn event(&self, record: &ServiceRecord, rule: Rule, message: String) -> DecisionEvent {
        DecisionEvent {
            cycle: self.cycle,
            service_id: record.id.clone(),
            rule,
            message,
            from: None,
            to: None,
            reward_delta: 0.0,
            latency_reduction_ms: 0.0,
        }
    }
}

/// One rule firing against one record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionEvent {
    pub cycle: u64,
    pub service_id: ServiceId,
    pub rule: Rule,
    pub message: String,
    /// Level before the rule fired, if it changed the level.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<ConsistencyLevel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to: Option<ConsistencyLevel>,
    pub reward_delta: f64,
    pub latency_reduction_ms: f64,
}

impl DecisionEvent {
    fn level_change(mut self, from: ConsistencyLevel, to: ConsistencyLevel) -> Self {
        self.from = Some(from);
        self.to = Some(to);
        self
    }

    fn reward(mut self, delta: f64) -> Self {
        // Payouts are configured, so clamp rather than trust the sign.
        self.reward_delta = delta.max(0.0);
        self
    }

    fn latency_gain(mut self, ms: f64) -> Self {
        self.latency_reduction_ms = ms;
        self
    }
}

/// Result of running the pipeline over one record.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub record: ServiceRecord,
    /// Fired events, in pipeline order.
    pub events: Vec<DecisionEvent>,
}

impl Evaluation {
    /// Whether the record left the pipeline at a different level.
    pub fn changed_from(&self, before: &ServiceRecord) -> bool {
        self.record.consistency != before.consistency
    }
}

/// Run the full rule pipeline against one record.
///
/// Records without autopilot pass through untouched. Total over every
/// numeric input: guards are plain comparisons, so zero, negative, or
/// extreme throughput just selects a branch.
pub fn evaluate(record: &ServiceRecord, ctx: &FleetContext<'_>) -> Evaluation {
    let mut next = record.clone();
    let mut events = Vec::new();

    if !record.autopilot {
        return Evaluation { record: next, events };
    }

    for rule in Rule::PIPELINE {
        if let Some(event) = rule.apply(&mut next, ctx) {
            debug!(
                service = %next.id,
                rule = ?rule,
                rps = next.requests_per_sec,
                level = %next.consistency,
                "rule fired"
            );
            events.push(event);
        }
    }

    Evaluation { record: next, events }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tidal_core::ServiceType;

    fn record(service_type: ServiceType, level: ConsistencyLevel, rps: i64) -> ServiceRecord {
        let mut r = ServiceRecord::new("svc", "Svc", service_type, level);
        r.requests_per_sec = rps;
        r
    }

    fn run(r: &ServiceRecord) -> Evaluation {
        let thresholds = RuleThresholds::default();
        evaluate(r, &FleetContext::new(&thresholds, 1))
    }

    #[test]
    fn load_relief_relaxes_non_critical_catalog() {
        let r = record(ServiceType::Catalog, ConsistencyLevel::Strong, 420);
        let eval = run(&r);

        assert_eq!(eval.record.consistency, ConsistencyLevel::Eventual);
        assert_eq!(eval.events.len(), 1);
        let event = &eval.events[0];
        assert_eq!(event.rule, Rule::LoadRelief);
        assert_eq!(event.message, "Relaxed Svc due to high load");
        assert_eq!(event.reward_delta, 10.0);
        assert_eq!(event.latency_reduction_ms, 15.5);
        assert_eq!(event.from, Some(ConsistencyLevel::Strong));
        assert_eq!(event.to, Some(ConsistencyLevel::Eventual));
    }

    #[test]
    fn load_relief_boundary_is_exclusive() {
        let r = record(ServiceType::Catalog, ConsistencyLevel::Strong, 400);
        let eval = run(&r);
        assert_eq!(eval.record.consistency, ConsistencyLevel::Strong);
        assert!(eval.events.is_empty());
    }

    #[test]
    fn load_relief_skips_already_eventual() {
        let r = record(ServiceType::Catalog, ConsistencyLevel::Eventual, 450);
        let eval = run(&r);
        assert_eq!(eval.record.consistency, ConsistencyLevel::Eventual);
        assert!(eval.events.is_empty());
    }

    #[test]
    fn load_relief_skips_critical() {
        let r = record(ServiceType::UserCart, ConsistencyLevel::Session, 450).critical(true);
        let eval = run(&r);
        assert_eq!(eval.record.consistency, ConsistencyLevel::Session);
        assert!(eval.events.is_empty());
    }

    #[test]
    fn protection_threshold_is_exact() {
        let at = record(ServiceType::UserCart, ConsistencyLevel::Session, 480).critical(true);
        assert!(run(&at).events.is_empty());

        let above = record(ServiceType::UserCart, ConsistencyLevel::Session, 481).critical(true);
        let eval = run(&above);
        assert_eq!(eval.events.len(), 1);
        assert_eq!(eval.events[0].rule, Rule::CriticalProtection);
        assert_eq!(eval.events[0].message, "Protecting Svc by throttling non-criticals");
        assert_eq!(eval.events[0].reward_delta, 0.0);
        assert_eq!(eval.record.consistency, ConsistencyLevel::Session);
    }

    #[test]
    fn integrity_restores_strong_for_critical_payment() {
        let r = record(ServiceType::Payment, ConsistencyLevel::Eventual, 450).critical(true);
        let eval = run(&r);

        assert_eq!(eval.record.consistency, ConsistencyLevel::Strong);
        let rules: Vec<Rule> = eval.events.iter().map(|e| e.rule).collect();
        assert_eq!(rules, vec![Rule::TransactionalIntegrity]);
        let reward: f64 = eval.events.iter().map(|e| e.reward_delta).sum();
        assert_eq!(reward, 5.0);
    }

    #[test]
    fn integrity_overrides_relief_in_same_pass() {
        // Non-critical inventory under load: relief fires, then integrity undoes it.
        let r = record(ServiceType::Inventory, ConsistencyLevel::Strong, 450);
        let eval = run(&r);

        assert_eq!(eval.record.consistency, ConsistencyLevel::Strong);
        let rules: Vec<Rule> = eval.events.iter().map(|e| e.rule).collect();
        assert_eq!(rules, vec![Rule::LoadRelief, Rule::TransactionalIntegrity]);
        assert_eq!(eval.events[1].message, "Ensuring Perfect mode for Svc");
    }

    #[test]
    fn upgrade_moves_low_load_eventual_to_session() {
        let r = record(ServiceType::Analytics, ConsistencyLevel::Eventual, 50);
        let eval = run(&r);

        assert_eq!(eval.record.consistency, ConsistencyLevel::Session);
        assert_eq!(eval.events.len(), 1);
        assert_eq!(eval.events[0].message, "Improving consistency for Svc (Low Load)");
        assert_eq!(eval.events[0].reward_delta, 0.0);
    }

    #[test]
    fn upgrade_boundary_is_exclusive() {
        let r = record(ServiceType::Analytics, ConsistencyLevel::Eventual, 100);
        assert!(run(&r).events.is_empty());
    }

    #[test]
    fn upgrade_never_applies_to_transactional_types() {
        // Payment at EVENTUAL with low load goes straight to STRONG, never SESSION.
        let r = record(ServiceType::Payment, ConsistencyLevel::Eventual, 10);
        let eval = run(&r);
        assert_eq!(eval.record.consistency, ConsistencyLevel::Strong);
        assert_eq!(eval.events.len(), 1);
    }

    #[test]
    fn upgrade_applies_to_critical_non_transactional() {
        let r = record(ServiceType::UserCart, ConsistencyLevel::Eventual, 20).critical(true);
        assert_eq!(run(&r).record.consistency, ConsistencyLevel::Session);
    }

    #[test]
    fn non_autopilot_records_are_skipped() {
        let r = record(ServiceType::Catalog, ConsistencyLevel::Strong, 900).autopilot(false);
        let eval = run(&r);
        assert_eq!(eval.record, r);
        assert!(eval.events.is_empty());
    }

    #[test]
    fn pathological_throughput_does_not_fail() {
        for rps in [i64::MIN, -1, 0, i64::MAX] {
            let r = record(ServiceType::Catalog, ConsistencyLevel::Eventual, rps);
            let eval = run(&r);
            assert!(eval.events.len() <= 1);
        }
        let mut nan = record(ServiceType::Catalog, ConsistencyLevel::Strong, 0);
        nan.latency_ms = f64::NAN;
        let _ = run(&nan);
    }

    #[test]
    fn stable_record_fires_nothing() {
        // Strong catalog at moderate load satisfies every guard.
        let r = record(ServiceType::Catalog, ConsistencyLevel::Strong, 250);
        let eval = run(&r);
        assert!(!eval.changed_from(&r));
        assert!(eval.events.is_empty());
    }

    #[test]
    fn custom_thresholds_are_honoured() {
        let thresholds = RuleThresholds {
            relief_rps: 100,
            relief_reward: 3.0,
            ..RuleThresholds::default()
        };
        let r = record(ServiceType::Catalog, ConsistencyLevel::Strong, 150);
        let eval = evaluate(&r, &FleetContext::new(&thresholds, 7));
        assert_eq!(eval.record.consistency, ConsistencyLevel::Eventual);
        assert_eq!(eval.events[0].reward_delta, 3.0);
        assert_eq!(eval.events[0].cycle, 7);
    }

    #[test]
    fn negative_configured_reward_is_clamped() {
        let thresholds = RuleThresholds {
            integrity_reward: -5.0,
            ..RuleThresholds::default()
        };
        let r = record(ServiceType::Payment, ConsistencyLevel::Session, 10);
        let eval = evaluate(&r, &FleetContext::new(&thresholds, 1));
        assert_eq!(eval.events[0].reward_delta, 0.0);
    }

    #[test]
    fn event_serializes_rule_snake_case() {
        let r = record(ServiceType::Catalog, ConsistencyLevel::Strong, 420);
        let json = serde_json::to_value(&run(&r).events[0]).unwrap();
        assert_eq!(json["rule"], "load_relief");
        assert_eq!(json["to"], "EVENTUAL");
    }
}
