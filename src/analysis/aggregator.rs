//! Finding aggregation and statistics.
//!
//! This module provides utilities for summarizing orphan and anomaly
//! findings by severity and kind, and for ranking the flows that need
//! the most attention.

use super::anomalies::Anomaly;
use super::orphans::OrphanReport;
use crate::models::{Flow, Severity};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

/// Counts of findings per severity and per kind.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SeveritySummary {
    pub total: usize,
    pub high: usize,
    pub medium: usize,
    pub low: usize,
    /// Findings grouped by rule or anomaly kind.
    pub by_kind: BTreeMap<String, usize>,
}

impl SeveritySummary {
    fn record(&mut self, severity: Severity) {
        self.total += 1;
        match severity {
            Severity::High => self.high += 1,
            Severity::Medium => self.medium += 1,
            Severity::Low => self.low += 1,
        }
    }
}

/// Summarize orphan reports. Each matched rule counts once in `by_kind`.
pub fn summarize_orphans(orphans: &[OrphanReport<'_>]) -> SeveritySummary {
    let mut summary = SeveritySummary::default();

    for orphan in orphans {
        summary.record(orphan.severity);
        for rule in &orphan.rules {
            *summary.by_kind.entry(rule.to_string()).or_insert(0) += 1;
        }
    }

    summary
}

/// Summarize anomalies by impact and kind.
pub fn summarize_anomalies(anomalies: &[Anomaly<'_>]) -> SeveritySummary {
    let mut summary = SeveritySummary::default();

    for anomaly in anomalies {
        summary.record(anomaly.impact);
        *summary
            .by_kind
            .entry(anomaly.kind.to_string())
            .or_insert(0) += 1;
    }

    summary
}

/// Group anomalies by flow id, preserving the order of first appearance.
pub fn group_anomalies_by_flow<'r, 'a>(
    anomalies: &'r [Anomaly<'a>],
) -> Vec<(&'a Flow, Vec<&'r Anomaly<'a>>)> {
    let mut positions: HashMap<&str, usize> = HashMap::new();
    let mut grouped: Vec<(&'a Flow, Vec<&'r Anomaly<'a>>)> = Vec::new();

    for anomaly in anomalies {
        let flow: &'a Flow = anomaly.flow;
        match positions.get(flow.id.as_str()) {
            Some(&index) => grouped[index].1.push(anomaly),
            None => {
                positions.insert(flow.id.as_str(), grouped.len());
                grouped.push((flow, vec![anomaly]));
            }
        }
    }

    grouped
}

/// Flows with the most anomalies, highest impact breaking ties.
pub fn most_anomalous_flows<'a>(anomalies: &[Anomaly<'a>], n: usize) -> Vec<(&'a Flow, usize)> {
    let mut ranked: Vec<(&'a Flow, usize, Severity)> = group_anomalies_by_flow(anomalies)
        .into_iter()
        .map(|(flow, items)| {
            let worst = items
                .iter()
                .map(|a| a.impact)
                .max()
                .unwrap_or(Severity::Low);
            (flow, items.len(), worst)
        })
        .collect();

    ranked.sort_by(|a, b| b.1.cmp(&a.1).then(b.2.cmp(&a.2)));
    ranked.truncate(n);

    ranked
        .into_iter()
        .map(|(flow, count, _)| (flow, count))
        .collect()
}

/// Orphan reports at or above `min` severity, most severe first.
pub fn orphans_at_or_above<'r, 'a>(
    orphans: &'r [OrphanReport<'a>],
    min: Severity,
) -> Vec<&'r OrphanReport<'a>> {
    let mut filtered: Vec<_> = orphans.iter().filter(|o| o.severity >= min).collect();
    filtered.sort_by(|a, b| b.severity.cmp(&a.severity));
    filtered
}

/// Generate a text summary of finding statistics.
pub fn generate_summary_text(title: &str, summary: &SeveritySummary) -> String {
    let mut lines = Vec::new();

    lines.push(format!("{}: {}", title, summary.total));
    lines.push(format!("- {} High: {}", Severity::High.emoji(), summary.high));
    lines.push(format!(
        "- {} Medium: {}",
        Severity::Medium.emoji(),
        summary.medium
    ));
    lines.push(format!("- {} Low: {}", Severity::Low.emoji(), summary.low));

    if !summary.by_kind.is_empty() {
        lines.push(String::new());
        lines.push("By Kind:".to_string());

        let mut kinds: Vec<_> = summary.by_kind.iter().collect();
        kinds.sort_by_key(|(_, count)| std::cmp::Reverse(*count));

        for (kind, count) in kinds {
            lines.push(format!("- {}: {}", kind, count));
        }
    }

    lines.join("\n")
}
