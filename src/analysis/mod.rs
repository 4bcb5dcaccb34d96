//! Analysis passes over a flow inventory.
//!
//! Every pass is a pure function of the flow slice (plus the evaluation
//! time for staleness). [`analyze`] runs them all and collects the
//! independent results; no pass reads another pass's output.

pub mod aggregator;
pub mod anomalies;
pub mod duplicates;
pub mod metrics;
pub mod orphans;
pub mod roi;
pub mod similarity;

pub use aggregator::*;
pub use anomalies::{detect_anomalies, detect_anomalies_with, Anomaly, AnomalyKind};
pub use duplicates::{
    detect_duplicates, detect_duplicates_with, pair_score, pair_score_with, DuplicateGroup,
    DuplicateMatch,
};
pub use metrics::{compute_metrics, FlowMetrics};
pub use orphans::{detect_orphans, detect_orphans_with, OrphanReport, OrphanRule};
pub use roi::{
    calculate_roi, calculate_roi_with, department_breakdown, department_efficiency,
    hourly_rate, revenue_attribution, total_monthly_savings, DepartmentEfficiency,
    RevenueAttribution, RoiEstimate,
};
pub use similarity::{action_set_similarity, levenshtein, string_similarity};

use crate::config::Config;
use crate::models::{Flow, Severity};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

/// Results of every analysis pass over one flow inventory.
#[derive(Debug, Clone, Serialize)]
pub struct AnalyticsReport<'a> {
    /// Time the staleness rule was evaluated against.
    pub evaluated_at: DateTime<Utc>,
    pub metrics: FlowMetrics,
    pub duplicates: Vec<DuplicateGroup<'a>>,
    pub orphans: Vec<OrphanReport<'a>>,
    pub anomalies: Vec<Anomaly<'a>>,
    pub roi: Vec<RoiEstimate<'a>>,
    pub departments: Vec<DepartmentEfficiency>,
    pub revenue: Vec<RevenueAttribution<'a>>,
    pub total_monthly_savings: f64,
}

impl AnalyticsReport<'_> {
    /// Highest orphan severity or anomaly impact, if anything was flagged.
    pub fn highest_severity(&self) -> Option<Severity> {
        self.orphans
            .iter()
            .map(|o| o.severity)
            .chain(self.anomalies.iter().map(|a| a.impact))
            .max()
    }

    /// True when any orphan or anomaly is at or above `threshold`.
    pub fn has_findings_at_or_above(&self, threshold: Severity) -> bool {
        self.highest_severity().is_some_and(|s| s >= threshold)
    }
}

/// Run every analysis pass over `flows`.
pub fn analyze<'a>(flows: &'a [Flow], now: DateTime<Utc>, config: &Config) -> AnalyticsReport<'a> {
    let report = AnalyticsReport {
        evaluated_at: now,
        metrics: compute_metrics(flows),
        duplicates: detect_duplicates_with(flows, &config.duplicates),
        orphans: detect_orphans_with(flows, now, &config.orphans),
        anomalies: detect_anomalies_with(flows, &config.anomalies),
        roi: flows
            .iter()
            .map(|f| calculate_roi_with(f, &config.roi))
            .collect(),
        departments: department_breakdown(flows, &config.roi),
        revenue: revenue_attribution(flows, &config.roi),
        total_monthly_savings: total_monthly_savings(flows, &config.roi),
    };

    info!(
        "Analyzed {} flows: {} duplicate groups, {} orphans, {} anomalies",
        flows.len(),
        report.duplicates.len(),
        report.orphans.len(),
        report.anomalies.len()
    );

    report
}
