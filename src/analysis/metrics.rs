//! Inventory-wide flow metrics.
//!
//! Headline numbers for the whole data set: counts, spend, reliability,
//! and the flows worth highlighting at either end of the success range.

use crate::models::{Flow, FlowStatus};
use serde::Serialize;

/// Flows listed as top performers.
const TOP_PERFORMER_COUNT: usize = 3;

/// Success rate (percent) below which a flow is a problem flow.
const PROBLEM_SUCCESS_RATE: f64 = 80.0;

/// Error count above which a flow is a problem flow.
const PROBLEM_ERROR_COUNT: u64 = 5;

/// Headline metrics over a flow inventory.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FlowMetrics {
    pub total_flows: usize,
    pub active_flows: usize,
    /// Flows whose source platform declares them a duplicate.
    pub declared_duplicates: usize,
    /// Flows the source store marks as orphaned.
    pub declared_orphans: usize,
    pub total_executions: u64,
    pub monthly_executions: u64,
    pub average_success_rate: f64,
    pub monthly_cost: f64,
    pub avg_execution_time: f64,
    /// Ids of the most reliable active flows.
    pub top_performing_flows: Vec<String>,
    /// Ids of flows with a low success rate or repeated errors.
    pub problem_flows: Vec<String>,
}

/// Compute inventory metrics. Empty input yields all-zero metrics.
pub fn compute_metrics(flows: &[Flow]) -> FlowMetrics {
    if flows.is_empty() {
        return FlowMetrics::default();
    }

    let count = flows.len() as f64;

    let mut active: Vec<&Flow> = flows
        .iter()
        .filter(|f| f.status == FlowStatus::Active)
        .collect();
    let active_flows = active.len();

    // Stable sort keeps input order among equal success rates.
    active.sort_by(|a, b| {
        b.success_rate
            .partial_cmp(&a.success_rate)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    FlowMetrics {
        total_flows: flows.len(),
        active_flows,
        declared_duplicates: flows.iter().filter(|f| f.duplicate_of.is_some()).count(),
        declared_orphans: flows.iter().filter(|f| f.orphan).count(),
        total_executions: flows
            .iter()
            .map(|f| f.total_executions)
            .fold(0u64, u64::saturating_add),
        monthly_executions: flows
            .iter()
            .map(|f| f.monthly_executions)
            .fold(0u64, u64::saturating_add),
        average_success_rate: flows.iter().map(|f| f.success_rate).sum::<f64>() / count,
        monthly_cost: flows.iter().map(|f| f.cost.monthly).sum(),
        avg_execution_time: flows.iter().map(|f| f.avg_execution_time).sum::<f64>() / count,
        top_performing_flows: active
            .iter()
            .take(TOP_PERFORMER_COUNT)
            .map(|f| f.id.clone())
            .collect(),
        problem_flows: flows
            .iter()
            .filter(|f| {
                f.success_rate < PROBLEM_SUCCESS_RATE
                    || f.performance.error_count > PROBLEM_ERROR_COUNT
            })
            .map(|f| f.id.clone())
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::fixtures::flow;

    #[test]
    fn test_empty_metrics() {
        assert_eq!(compute_metrics(&[]), FlowMetrics::default());
    }

    #[test]
    fn test_metrics_totals() {
        let mut a = flow("f1", "A");
        a.success_rate = 90.0;
        a.cost.monthly = 20.0;
        a.avg_execution_time = 2.0;
        let mut b = flow("f2", "B");
        b.success_rate = 70.0;
        b.cost.monthly = 5.0;
        b.avg_execution_time = 4.0;
        b.status = FlowStatus::Disabled;
        b.duplicate_of = Some("f1".to_string());
        b.orphan = true;
        let flows = vec![a, b];

        let metrics = compute_metrics(&flows);
        assert_eq!(metrics.total_flows, 2);
        assert_eq!(metrics.active_flows, 1);
        assert_eq!(metrics.declared_duplicates, 1);
        assert_eq!(metrics.declared_orphans, 1);
        assert_eq!(metrics.total_executions, 10_000);
        assert_eq!(metrics.monthly_executions, 1000);
        assert_eq!(metrics.average_success_rate, 80.0);
        assert_eq!(metrics.monthly_cost, 25.0);
        assert_eq!(metrics.avg_execution_time, 3.0);
        assert_eq!(metrics.problem_flows, vec!["f2"]);
    }

    #[test]
    fn test_top_performers_active_only() {
        let mut flows: Vec<_> = [("f1", 95.0), ("f2", 99.0), ("f3", 97.0), ("f4", 99.0), ("f5", 100.0)]
            .iter()
            .map(|(id, rate)| {
                let mut f = flow(id, id);
                f.success_rate = *rate;
                f
            })
            .collect();
        flows[4].status = FlowStatus::Disabled;

        let metrics = compute_metrics(&flows);
        assert_eq!(metrics.top_performing_flows, vec!["f2", "f4", "f3"]);
    }

    #[test]
    fn test_execution_totals_saturate() {
        let mut a = flow("f1", "A");
        a.total_executions = u64::MAX;
        a.monthly_executions = u64::MAX - 1;
        let flows = vec![a, flow("f2", "B")];

        let metrics = compute_metrics(&flows);
        assert_eq!(metrics.total_executions, u64::MAX);
        assert_eq!(metrics.monthly_executions, u64::MAX);
    }

    #[test]
    fn test_problem_flows_by_error_count() {
        let mut f = flow("f1", "Noisy");
        f.performance.error_count = 6;
        let flows = vec![f, flow("f2", "Quiet")];

        assert_eq!(compute_metrics(&flows).problem_flows, vec!["f1"]);
    }
}
