//! Performance anomaly detection.
//!
//! Like the orphan detector this is a per-flow rule table, but every
//! triggered rule yields its own record instead of being merged.

use crate::config::AnomalyConfig;
use crate::models::{serialize_flow_ref, Flow, Frequency, Severity};
use serde::Serialize;
use std::fmt;
use tracing::debug;

/// Kind of performance anomaly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AnomalyKind {
    SlowExecution,
    LowSuccessRate,
    HighCost,
    /// Realtime trigger on a flow that rarely runs.
    TriggerUsageMismatch,
}

impl fmt::Display for AnomalyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnomalyKind::SlowExecution => write!(f, "Slow execution"),
            AnomalyKind::LowSuccessRate => write!(f, "Low success rate"),
            AnomalyKind::HighCost => write!(f, "High cost"),
            AnomalyKind::TriggerUsageMismatch => write!(f, "Trigger/usage mismatch"),
        }
    }
}

/// One triggered anomaly rule for one flow.
#[derive(Debug, Clone, Serialize)]
pub struct Anomaly<'a> {
    #[serde(serialize_with = "serialize_flow_ref")]
    pub flow: &'a Flow,
    pub kind: AnomalyKind,
    /// Description including the observed value.
    pub anomaly: String,
    pub impact: Severity,
    pub recommendation: &'static str,
}

struct Rule {
    kind: AnomalyKind,
    impact: Severity,
    recommendation: &'static str,
    matches: fn(&Flow, &AnomalyConfig) -> bool,
    describe: fn(&Flow) -> String,
}

static RULES: [Rule; 4] = [
    Rule {
        kind: AnomalyKind::SlowExecution,
        impact: Severity::Medium,
        recommendation: "Review flow complexity and optimize triggers",
        matches: |flow, config| flow.avg_execution_time > config.slow_execution_seconds,
        describe: |flow| format!("Slow execution time: {}s", flow.avg_execution_time),
    },
    Rule {
        kind: AnomalyKind::LowSuccessRate,
        impact: Severity::High,
        recommendation: "Review error logs and fix failing conditions",
        matches: |flow, config| flow.success_rate < config.min_success_rate,
        describe: |flow| format!("Low success rate: {}%", flow.success_rate),
    },
    Rule {
        kind: AnomalyKind::HighCost,
        impact: Severity::Medium,
        recommendation: "Consider optimizing to reduce API calls",
        matches: |flow, config| flow.cost.per_execution > config.max_cost_per_execution,
        describe: |flow| format!("High cost per execution: ${}", flow.cost.per_execution),
    },
    Rule {
        kind: AnomalyKind::TriggerUsageMismatch,
        impact: Severity::Low,
        recommendation: "Consider changing to scheduled trigger",
        matches: |flow, config| {
            flow.frequency == Frequency::Realtime
                && flow.monthly_executions < config.realtime_min_monthly_executions
        },
        describe: |_| "Real-time trigger with low usage".to_string(),
    },
];

/// Detect anomalies with the default thresholds.
pub fn detect_anomalies(flows: &[Flow]) -> Vec<Anomaly<'_>> {
    detect_anomalies_with(flows, &AnomalyConfig::default())
}

/// Detect anomalies, grouped by flow in input order and by rule in table order.
pub fn detect_anomalies_with<'a>(flows: &'a [Flow], config: &AnomalyConfig) -> Vec<Anomaly<'a>> {
    let anomalies: Vec<_> = flows
        .iter()
        .flat_map(|flow| {
            RULES
                .iter()
                .filter(move |rule| (rule.matches)(flow, config))
                .map(move |rule| Anomaly {
                    flow,
                    kind: rule.kind,
                    anomaly: (rule.describe)(flow),
                    impact: rule.impact,
                    recommendation: rule.recommendation,
                })
        })
        .collect();

    debug!(
        "Anomaly detection: {} anomalies over {} flows",
        anomalies.len(),
        flows.len()
    );

    anomalies
}
