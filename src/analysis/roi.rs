//! ROI and business impact estimation.
//!
//! Savings are modelled as manual work avoided: every action of a flow is
//! assumed to replace a fixed number of minutes of labor, priced at the
//! owning department's hourly rate.

use crate::config::RoiConfig;
use crate::models::{serialize_flow_ref, Department, Flow, FlowStatus};
use serde::Serialize;

/// Financial estimate for one flow.
#[derive(Debug, Clone, Serialize)]
pub struct RoiEstimate<'a> {
    #[serde(serialize_with = "serialize_flow_ref")]
    pub flow: &'a Flow,
    pub time_saved_minutes: f64,
    pub hourly_rate: f64,
    pub monthly_savings: f64,
    pub annual_savings: f64,
    /// Setup cost plus twelve months of tool spend.
    pub total_cost: f64,
    /// Percentage return over the first year.
    pub roi: f64,
    /// Months until savings cover `total_cost`; `None` when the flow saves nothing.
    pub payback_period_months: Option<f64>,
}

/// Aggregate efficiency of one department.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DepartmentEfficiency {
    pub department: Department,
    pub total_flows: usize,
    pub active_flows: usize,
    pub average_success_rate: f64,
    pub total_monthly_savings: f64,
    /// Share of estimated automatable processes already covered (percent).
    pub automation_coverage: f64,
}

/// Revenue credited to a sales or marketing flow.
#[derive(Debug, Clone, Serialize)]
pub struct RevenueAttribution<'a> {
    #[serde(serialize_with = "serialize_flow_ref")]
    pub flow: &'a Flow,
    pub estimated_monthly_revenue: f64,
    /// Assumed conversion improvement in percent.
    pub conversion_impact: f64,
}

/// Hourly rate for a department, falling back to the default rate.
pub fn hourly_rate(department: &Department, config: &RoiConfig) -> f64 {
    config
        .hourly_rates
        .get(department.key())
        .copied()
        .unwrap_or(config.default_hourly_rate)
}

/// Estimate ROI for one flow with the default model.
pub fn calculate_roi(flow: &Flow) -> RoiEstimate<'_> {
    calculate_roi_with(flow, &RoiConfig::default())
}

/// Estimate ROI for one flow.
pub fn calculate_roi_with<'a>(flow: &'a Flow, config: &RoiConfig) -> RoiEstimate<'a> {
    let time_saved_minutes = flow.actions.len() as f64 * config.minutes_per_action;
    let rate = hourly_rate(&flow.department, config);

    let monthly_savings = (flow.monthly_executions as f64 * time_saved_minutes / 60.0) * rate;
    let annual_savings = monthly_savings * 12.0;

    let total_cost = config.setup_cost + flow.cost.monthly * 12.0;
    let roi = (annual_savings - total_cost) / total_cost * 100.0;
    let payback_period_months = (monthly_savings > 0.0).then(|| total_cost / monthly_savings);

    RoiEstimate {
        flow,
        time_saved_minutes,
        hourly_rate: rate,
        monthly_savings,
        annual_savings,
        total_cost,
        roi,
        payback_period_months,
    }
}

/// Sum of monthly savings across all flows.
pub fn total_monthly_savings(flows: &[Flow], config: &RoiConfig) -> f64 {
    flows
        .iter()
        .map(|f| calculate_roi_with(f, config).monthly_savings)
        .sum()
}

/// Efficiency figures for the flows owned by `department`.
pub fn department_efficiency(
    flows: &[Flow],
    department: &Department,
    config: &RoiConfig,
) -> DepartmentEfficiency {
    let dept_flows: Vec<&Flow> = flows.iter().filter(|f| &f.department == department).collect();
    let total_flows = dept_flows.len();

    let active_flows = dept_flows
        .iter()
        .filter(|f| f.status == FlowStatus::Active)
        .count();

    let average_success_rate = if total_flows > 0 {
        dept_flows.iter().map(|f| f.success_rate).sum::<f64>() / total_flows as f64
    } else {
        0.0
    };

    let total_monthly_savings = dept_flows
        .iter()
        .map(|f| calculate_roi_with(f, config).monthly_savings)
        .sum();

    // Flows over estimated automatable processes; constant for any non-empty
    // department (1 / multiplier).
    let automation_coverage = if total_flows > 0 {
        let estimated_processes = total_flows as f64 * config.coverage_multiplier;
        total_flows as f64 / estimated_processes * 100.0
    } else {
        0.0
    };

    DepartmentEfficiency {
        department: department.clone(),
        total_flows,
        active_flows,
        average_success_rate,
        total_monthly_savings,
        automation_coverage,
    }
}

/// Efficiency for every known department, then any other department seen
/// in the input in first-seen order.
pub fn department_breakdown(flows: &[Flow], config: &RoiConfig) -> Vec<DepartmentEfficiency> {
    let mut departments: Vec<Department> = Department::KNOWN.to_vec();
    for flow in flows {
        if !departments.contains(&flow.department) {
            departments.push(flow.department.clone());
        }
    }

    departments
        .iter()
        .map(|d| department_efficiency(flows, d, config))
        .collect()
}

/// Revenue attribution for sales and marketing flows, highest first.
///
/// Flows from other departments are excluded. Ties keep input order.
pub fn revenue_attribution<'a>(flows: &'a [Flow], config: &RoiConfig) -> Vec<RevenueAttribution<'a>> {
    let mut attributions: Vec<_> = flows
        .iter()
        .filter_map(|flow| {
            let (per_execution, conversion_impact) = match flow.department {
                Department::Sales => (
                    config.sales_revenue_per_execution,
                    config.sales_conversion_impact,
                ),
                Department::Marketing => (
                    config.marketing_revenue_per_execution,
                    config.marketing_conversion_impact,
                ),
                _ => return None,
            };

            Some(RevenueAttribution {
                flow,
                estimated_monthly_revenue: flow.monthly_executions as f64 * per_execution,
                conversion_impact,
            })
        })
        .collect();

    attributions.sort_by(|a, b| {
        b.estimated_monthly_revenue
            .partial_cmp(&a.estimated_monthly_revenue)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    attributions
}
