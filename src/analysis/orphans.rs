//! Orphaned flow detection.
//!
//! Each flow is classified on its own against a fixed rule table; there is
//! no comparison between flows. The evaluation time is passed in so the
//! staleness rule stays deterministic.

use crate::config::OrphanConfig;
use crate::models::{serialize_flow_ref, Flow, FlowStatus, Severity};
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::fmt;
use tracing::debug;

/// Why a flow counts as orphaned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OrphanRule {
    /// Never run, or not run within the staleness window.
    Stale,
    LowSuccess,
    HighErrors,
    Disabled,
}

impl fmt::Display for OrphanRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrphanRule::Stale => write!(f, "Stale"),
            OrphanRule::LowSuccess => write!(f, "Low success"),
            OrphanRule::HighErrors => write!(f, "High errors"),
            OrphanRule::Disabled => write!(f, "Disabled"),
        }
    }
}

/// A flow flagged by at least one orphan rule.
#[derive(Debug, Clone, Serialize)]
pub struct OrphanReport<'a> {
    #[serde(serialize_with = "serialize_flow_ref")]
    pub flow: &'a Flow,
    /// Matched rules, in table order.
    pub rules: Vec<OrphanRule>,
    /// Matched rule descriptions joined with ", ".
    pub reason: String,
    pub severity: Severity,
}

struct RuleContext<'c> {
    config: &'c OrphanConfig,
    stale_before: DateTime<Utc>,
}

struct Rule {
    rule: OrphanRule,
    severity: Severity,
    matches: fn(&Flow, &RuleContext<'_>) -> bool,
    describe: fn(&OrphanConfig) -> String,
}

static RULES: [Rule; 4] = [
    Rule {
        rule: OrphanRule::Stale,
        severity: Severity::Medium,
        matches: is_stale,
        describe: describe_stale,
    },
    Rule {
        rule: OrphanRule::LowSuccess,
        severity: Severity::High,
        matches: has_low_success,
        describe: describe_low_success,
    },
    Rule {
        rule: OrphanRule::HighErrors,
        severity: Severity::High,
        matches: has_high_errors,
        describe: describe_high_errors,
    },
    Rule {
        rule: OrphanRule::Disabled,
        severity: Severity::Medium,
        matches: is_disabled,
        describe: describe_disabled,
    },
];

fn is_stale(flow: &Flow, ctx: &RuleContext<'_>) -> bool {
    flow.last_run.map_or(true, |last| last < ctx.stale_before)
}

fn has_low_success(flow: &Flow, ctx: &RuleContext<'_>) -> bool {
    flow.success_rate < ctx.config.min_success_rate
}

fn has_high_errors(flow: &Flow, ctx: &RuleContext<'_>) -> bool {
    flow.performance.error_count > ctx.config.max_error_count
}

fn is_disabled(flow: &Flow, _ctx: &RuleContext<'_>) -> bool {
    flow.status == FlowStatus::Disabled
}

fn describe_stale(config: &OrphanConfig) -> String {
    format!("No executions in {}+ days", config.stale_days)
}

fn describe_low_success(config: &OrphanConfig) -> String {
    format!("Success rate below {}%", config.min_success_rate)
}

fn describe_high_errors(_config: &OrphanConfig) -> String {
    "High error count".to_string()
}

fn describe_disabled(_config: &OrphanConfig) -> String {
    "Flow is disabled".to_string()
}

/// Flag orphaned flows with the default thresholds.
pub fn detect_orphans(flows: &[Flow], now: DateTime<Utc>) -> Vec<OrphanReport<'_>> {
    detect_orphans_with(flows, now, &OrphanConfig::default())
}

/// Flag orphaned flows.
///
/// The severity of a report is the highest severity among its matched
/// rules, so a high finding is never downgraded by a later medium one.
/// Flows matching no rule are left out.
pub fn detect_orphans_with<'a>(
    flows: &'a [Flow],
    now: DateTime<Utc>,
    config: &OrphanConfig,
) -> Vec<OrphanReport<'a>> {
    let stale_before = Duration::try_days(config.stale_days)
        .and_then(|window| now.checked_sub_signed(window))
        .unwrap_or(DateTime::<Utc>::MIN_UTC);
    let ctx = RuleContext {
        config,
        stale_before,
    };

    let reports: Vec<_> = flows
        .iter()
        .filter_map(|flow| classify(flow, &ctx))
        .collect();

    debug!(
        "Orphan detection: {} of {} flows flagged",
        reports.len(),
        flows.len()
    );

    reports
}

fn classify<'a>(flow: &'a Flow, ctx: &RuleContext<'_>) -> Option<OrphanReport<'a>> {
    let matched: Vec<&Rule> = RULES.iter().filter(|r| (r.matches)(flow, ctx)).collect();

    let severity = matched.iter().map(|r| r.severity).max()?;
    let reason = matched
        .iter()
        .map(|r| (r.describe)(ctx.config))
        .collect::<Vec<_>>()
        .join(", ");

    Some(OrphanReport {
        flow,
        rules: matched.iter().map(|r| r.rule).collect(),
        reason,
        severity,
    })
}
