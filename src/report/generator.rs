//! Markdown and JSON report generation.
//!
//! This module renders the results of every analysis pass into a single
//! human-readable Markdown document, or a JSON document for tooling.

use crate::analysis::{
    group_anomalies_by_flow, most_anomalous_flows, summarize_anomalies, summarize_orphans,
    AnalyticsReport, DepartmentEfficiency, DuplicateGroup, FlowMetrics, OrphanReport,
    RevenueAttribution, RoiEstimate, SeveritySummary,
};
use crate::models::Severity;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::Path;

/// Metadata about a generated report.
#[derive(Debug, Clone, Serialize)]
pub struct ReportMetadata {
    /// File or directory the flows were loaded from.
    pub source: String,
    pub generated_at: DateTime<Utc>,
    pub flows_analyzed: usize,
    /// Department the analysis was restricted to, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department_filter: Option<String>,
    pub duration_seconds: f64,
}

/// Top-level JSON document.
#[derive(Serialize)]
struct ReportDocument<'r, 'a> {
    metadata: &'r ReportMetadata,
    orphan_summary: SeveritySummary,
    anomaly_summary: SeveritySummary,
    #[serde(flatten)]
    analytics: &'r AnalyticsReport<'a>,
}

/// Generate a complete Markdown report.
pub fn generate_markdown_report(report: &AnalyticsReport<'_>, metadata: &ReportMetadata) -> String {
    let mut output = String::new();

    output.push_str("# Automation Atlas Report\n\n");
    output.push_str(&generate_metadata_section(metadata, report.evaluated_at));
    output.push_str(&generate_table_of_contents());
    output.push_str(&generate_summary_section(report));
    output.push_str(&generate_duplicates_section(&report.duplicates));
    output.push_str(&generate_orphans_section(&report.orphans));
    output.push_str(&generate_anomalies_section(report));
    output.push_str(&generate_roi_section(&report.roi, report.total_monthly_savings));
    output.push_str(&generate_departments_section(&report.departments));
    output.push_str(&generate_revenue_section(&report.revenue));
    output.push_str(&generate_footer());

    output
}

fn generate_metadata_section(metadata: &ReportMetadata, evaluated_at: DateTime<Utc>) -> String {
    let mut section = String::new();

    section.push_str("## Metadata\n\n");
    section.push_str(&format!("- **Source:** `{}`\n", metadata.source));
    section.push_str(&format!(
        "- **Generated:** {}\n",
        metadata.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    section.push_str(&format!(
        "- **Evaluated At:** {}\n",
        evaluated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    section.push_str(&format!(
        "- **Flows Analyzed:** {}\n",
        metadata.flows_analyzed
    ));
    if let Some(ref department) = metadata.department_filter {
        section.push_str(&format!("- **Department:** {}\n", department));
    }
    section.push_str(&format!(
        "- **Analysis Duration:** {:.3}s\n",
        metadata.duration_seconds
    ));
    section.push('\n');

    section
}

fn generate_table_of_contents() -> String {
    let mut toc = String::new();

    toc.push_str("## Table of Contents\n\n");
    for (title, anchor) in [
        ("Metadata", "metadata"),
        ("Summary", "summary"),
        ("Duplicate Flows", "duplicate-flows"),
        ("Orphaned Flows", "orphaned-flows"),
        ("Performance Anomalies", "performance-anomalies"),
        ("ROI by Flow", "roi-by-flow"),
        ("Department Efficiency", "department-efficiency"),
        ("Revenue Attribution", "revenue-attribution"),
    ] {
        toc.push_str(&format!("- [{}](#{})\n", title, anchor));
    }
    toc.push('\n');

    toc
}

fn generate_summary_section(report: &AnalyticsReport<'_>) -> String {
    let mut section = String::new();

    section.push_str("## Summary\n\n");
    section.push_str(&generate_metrics_table(&report.metrics));

    section.push_str(&format!(
        "- **Duplicate Groups:** {}\n",
        report.duplicates.len()
    ));
    section.push_str(&format!(
        "- **Total Monthly Savings:** {}\n\n",
        money(report.total_monthly_savings)
    ));

    section.push_str("### Findings by Severity\n\n");
    section.push_str(&format!(
        "| Finding | {} High | {} Medium | {} Low | **Total** |\n",
        Severity::High.emoji(),
        Severity::Medium.emoji(),
        Severity::Low.emoji(),
    ));
    section.push_str("|:---|:---:|:---:|:---:|:---:|\n");
    for (label, summary) in [
        ("Orphans", summarize_orphans(&report.orphans)),
        ("Anomalies", summarize_anomalies(&report.anomalies)),
    ] {
        section.push_str(&format!(
            "| {} | {} | {} | {} | **{}** |\n",
            label, summary.high, summary.medium, summary.low, summary.total
        ));
    }
    section.push('\n');

    let noisy = most_anomalous_flows(&report.anomalies, 5);
    if !noisy.is_empty() {
        section.push_str("### Flows Needing Attention\n\n");
        section.push_str("| Flow | Anomalies |\n");
        section.push_str("|:---|:---:|\n");

        for (flow, count) in noisy {
            section.push_str(&format!(
                "| {} (`{}`) | {} |\n",
                cell(&flow.name),
                cell(&flow.id),
                count
            ));
        }
        section.push('\n');
    }

    section
}

fn generate_metrics_table(metrics: &FlowMetrics) -> String {
    let mut table = String::new();

    table.push_str("| Metric | Value |\n");
    table.push_str("|:---|---:|\n");
    table.push_str(&format!("| Total Flows | {} |\n", metrics.total_flows));
    table.push_str(&format!("| Active Flows | {} |\n", metrics.active_flows));
    table.push_str(&format!(
        "| Declared Duplicates | {} |\n",
        metrics.declared_duplicates
    ));
    table.push_str(&format!(
        "| Declared Orphans | {} |\n",
        metrics.declared_orphans
    ));
    table.push_str(&format!(
        "| Total Executions | {} |\n",
        metrics.total_executions
    ));
    table.push_str(&format!(
        "| Monthly Executions | {} |\n",
        metrics.monthly_executions
    ));
    table.push_str(&format!(
        "| Average Success Rate | {:.1}% |\n",
        metrics.average_success_rate
    ));
    table.push_str(&format!(
        "| Monthly Cost | {} |\n",
        money(metrics.monthly_cost)
    ));
    table.push_str(&format!(
        "| Avg Execution Time | {:.1}s |\n",
        metrics.avg_execution_time
    ));
    if !metrics.top_performing_flows.is_empty() {
        table.push_str(&format!(
            "| Top Performers | {} |\n",
            code_list(&metrics.top_performing_flows)
        ));
    }
    if !metrics.problem_flows.is_empty() {
        table.push_str(&format!(
            "| Problem Flows | {} |\n",
            code_list(&metrics.problem_flows)
        ));
    }
    table.push('\n');

    table
}

fn generate_duplicates_section(groups: &[DuplicateGroup<'_>]) -> String {
    let mut section = String::new();

    section.push_str("## Duplicate Flows\n\n");

    if groups.is_empty() {
        section.push_str("No duplicate flows detected.\n\n");
        return section;
    }

    for group in groups {
        section.push_str(&format!(
            "### {} (`{}`)\n\n",
            group.flow.name, group.flow.id
        ));
        section.push_str(&format!(
            "*{}* (mean similarity {:.0}%)\n\n",
            group.reason,
            group.similarity * 100.0
        ));
        for dup in &group.duplicates {
            section.push_str(&format!(
                "- {} (`{}`, {}) - score {:.2}\n",
                dup.flow.name, dup.flow.id, dup.flow.tool, dup.score
            ));
        }
        section.push('\n');
    }

    section
}

fn generate_orphans_section(orphans: &[OrphanReport<'_>]) -> String {
    let mut section = String::new();

    section.push_str("## Orphaned Flows\n\n");

    if orphans.is_empty() {
        section.push_str("No orphaned flows detected.\n\n");
        return section;
    }

    section.push_str("| Severity | Flow | Reason |\n");
    section.push_str("|:---:|:---|:---|\n");
    for orphan in orphans {
        section.push_str(&format!(
            "| {} {} | {} (`{}`) | {} |\n",
            orphan.severity.emoji(),
            orphan.severity,
            cell(&orphan.flow.name),
            cell(&orphan.flow.id),
            orphan.reason
        ));
    }
    section.push('\n');

    section
}

fn generate_anomalies_section(report: &AnalyticsReport<'_>) -> String {
    let mut section = String::new();

    section.push_str("## Performance Anomalies\n\n");

    if report.anomalies.is_empty() {
        section.push_str("No performance anomalies detected.\n\n");
        return section;
    }

    for (flow, anomalies) in group_anomalies_by_flow(&report.anomalies) {
        section.push_str(&format!("### {} (`{}`)\n\n", flow.name, flow.id));
        for anomaly in anomalies {
            section.push_str(&format!(
                "- {} **{}** {}\n  - **Recommendation:** {}\n",
                anomaly.impact.emoji(),
                anomaly.impact.to_string().to_uppercase(),
                anomaly.anomaly,
                anomaly.recommendation
            ));
        }
        section.push('\n');
    }

    section
}

fn generate_roi_section(estimates: &[RoiEstimate<'_>], total_monthly_savings: f64) -> String {
    let mut section = String::new();

    section.push_str("## ROI by Flow\n\n");

    if estimates.is_empty() {
        section.push_str("No flows to estimate.\n\n");
        return section;
    }

    section.push_str("| Flow | Monthly Savings | Annual Savings | Total Cost | ROI | Payback |\n");
    section.push_str("|:---|---:|---:|---:|---:|---:|\n");
    for roi in estimates {
        section.push_str(&format!(
            "| {} (`{}`) | {} | {} | {} | {:.0}% | {} |\n",
            cell(&roi.flow.name),
            cell(&roi.flow.id),
            money(roi.monthly_savings),
            money(roi.annual_savings),
            money(roi.total_cost),
            roi.roi,
            payback(roi.payback_period_months)
        ));
    }
    section.push_str(&format!(
        "\n**Total monthly savings:** {}\n\n",
        money(total_monthly_savings)
    ));

    section
}

fn generate_departments_section(departments: &[DepartmentEfficiency]) -> String {
    let mut section = String::new();

    section.push_str("## Department Efficiency\n\n");
    section.push_str("| Department | Flows | Active | Avg Success | Monthly Savings | Coverage |\n");
    section.push_str("|:---|:---:|:---:|---:|---:|---:|\n");

    for dept in departments {
        section.push_str(&format!(
            "| {} | {} | {} | {:.1}% | {} | {:.1}% |\n",
            cell(&dept.department.to_string()),
            dept.total_flows,
            dept.active_flows,
            dept.average_success_rate,
            money(dept.total_monthly_savings),
            dept.automation_coverage
        ));
    }
    section.push('\n');

    section
}

fn generate_revenue_section(revenue: &[RevenueAttribution<'_>]) -> String {
    let mut section = String::new();

    section.push_str("## Revenue Attribution\n\n");

    if revenue.is_empty() {
        section.push_str("No sales or marketing flows to attribute.\n\n");
        return section;
    }

    section.push_str("| Flow | Department | Est. Monthly Revenue | Conversion Impact |\n");
    section.push_str("|:---|:---|---:|---:|\n");
    for item in revenue {
        section.push_str(&format!(
            "| {} (`{}`) | {} | {} | +{}% |\n",
            cell(&item.flow.name),
            cell(&item.flow.id),
            cell(&item.flow.department.to_string()),
            money(item.estimated_monthly_revenue),
            item.conversion_impact
        ));
    }
    section.push('\n');

    section
}

fn generate_footer() -> String {
    "---\n\n*Generated by flowatlas*\n".to_string()
}

/// Escapes text for a Markdown table cell.
fn cell(text: &str) -> String {
    text.replace('|', "\\|").replace('\n', " ")
}

fn money(amount: f64) -> String {
    format!("${:.2}", amount)
}

fn payback(months: Option<f64>) -> String {
    match months {
        Some(m) => format!("{:.1} mo", m),
        None => "never".to_string(),
    }
}

fn code_list(ids: &[String]) -> String {
    ids.iter()
        .map(|id| format!("`{}`", id))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Generate a JSON report.
pub fn generate_json_report(report: &AnalyticsReport<'_>, metadata: &ReportMetadata) -> Result<String> {
    let document = ReportDocument {
        metadata,
        orphan_summary: summarize_orphans(&report.orphans),
        anomaly_summary: summarize_anomalies(&report.anomalies),
        analytics: report,
    };

    serde_json::to_string_pretty(&document).map_err(Into::into)
}

/// Write report content to a file.
pub fn write_report(content: &str, path: &Path) -> Result<()> {
    std::fs::write(path, content)
        .with_context(|| format!("Failed to write report to {}", path.display()))
}
