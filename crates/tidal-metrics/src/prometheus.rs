//! Prometheus text exposition format.

use std::fmt::Write;

use tidal_core::ServiceRecord;
use tidal_state::StateSnapshot;

/// Render a state snapshot into Prometheus text format.
///
/// Per-service gauges come from the registry records, so services that
/// have not reported yet show up with zeroed telemetry.
pub fn render_prometheus(snapshot: &StateSnapshot) -> String {
    let mut out = String::new();
    let c = &snapshot.counters;

    fleet_metric(&mut out, "tidal_reward_total", "counter", "Cumulative optimizer reward.", c.reward);
    fleet_metric(
        &mut out,
        "tidal_decisions_total",
        "counter",
        "Completed decision cycles.",
        c.decisions as f64,
    );
    fleet_metric(
        &mut out,
        "tidal_latency_reduction_ms_total",
        "counter",
        "Estimated latency saved by load relief, in milliseconds.",
        c.latency_reduction_ms,
    );
    fleet_metric(&mut out, "tidal_confidence", "gauge", "Optimizer confidence.", c.confidence);

    service_metric(
        &mut out,
        &snapshot.services,
        "tidal_service_requests_per_second",
        "Latest reported requests per second.",
        |r| r.requests_per_sec.to_string(),
    );
    service_metric(
        &mut out,
        &snapshot.services,
        "tidal_service_latency_ms",
        "Latest reported operation latency in milliseconds.",
        |r| format!("{:.2}", r.latency_ms),
    );
    service_metric(
        &mut out,
        &snapshot.services,
        "tidal_service_consistency",
        "Mandated consistency level (0 = STRONG, 1 = SESSION, 2 = EVENTUAL).",
        |r| r.consistency.code().to_string(),
    );

    out
}

fn fleet_metric(out: &mut String, name: &str, kind: &str, help: &str, value: f64) {
    let _ = writeln!(out, "# HELP {name} {help}");
    let _ = writeln!(out, "# TYPE {name} {kind}");
    let _ = writeln!(out, "{name} {value:.2}");
}

fn service_metric(
    out: &mut String,
    records: &[ServiceRecord],
    name: &str,
    help: &str,
    value: impl Fn(&ServiceRecord) -> String,
) {
    let _ = writeln!(out, "# HELP {name} {help}");
    let _ = writeln!(out, "# TYPE {name} gauge");
    for r in records {
        let _ = writeln!(
            out,
            "{name}{{service=\"{}\",type=\"{}\"}} {}",
            escape_label(&r.id),
            r.service_type,
            value(r)
        );
    }
}

/// Escape a label value per the exposition format.
fn escape_label(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
}
