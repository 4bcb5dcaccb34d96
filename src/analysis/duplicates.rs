//! Near-duplicate flow detection.
//!
//! Every unordered pair of flows is scored once from three signals: name
//! similarity, an exact trigger type match, and action-type overlap. The
//! `duplicateOf` field declared by the source platform is never consulted.

use super::similarity::{action_set_similarity, string_similarity};
use crate::config::DuplicateConfig;
use crate::models::{serialize_flow_ref, Flow};
use serde::Serialize;
use tracing::debug;

/// Reason attached to every duplicate group.
pub const DUPLICATE_REASON: &str = "Similar name, trigger, and actions detected";

/// A later flow matched against the group's head flow.
#[derive(Debug, Clone, Serialize)]
pub struct DuplicateMatch<'a> {
    #[serde(serialize_with = "serialize_flow_ref")]
    pub flow: &'a Flow,
    /// Composite score of this pair.
    pub score: f64,
}

/// A flow together with every later flow that looks like a copy of it.
#[derive(Debug, Clone, Serialize)]
pub struct DuplicateGroup<'a> {
    #[serde(serialize_with = "serialize_flow_ref")]
    pub flow: &'a Flow,
    pub duplicates: Vec<DuplicateMatch<'a>>,
    /// Mean pair score over `duplicates`.
    pub similarity: f64,
    pub reason: &'static str,
}

/// Weighted similarity of two flows in `[0, 1]` with the default weights.
pub fn pair_score(a: &Flow, b: &Flow) -> f64 {
    pair_score_with(a, b, &DuplicateConfig::default())
}

/// Weighted similarity of two flows using `config` weights.
pub fn pair_score_with(a: &Flow, b: &Flow, config: &DuplicateConfig) -> f64 {
    let name = string_similarity(&a.name, &b.name);
    let trigger = if a.trigger.trigger_type == b.trigger.trigger_type {
        1.0
    } else {
        0.0
    };
    let actions = action_set_similarity(&a.actions, &b.actions);

    config.name_weight * name + config.trigger_weight * trigger + config.action_weight * actions
}

/// Group near-duplicate flows with the default weights and threshold.
pub fn detect_duplicates(flows: &[Flow]) -> Vec<DuplicateGroup<'_>> {
    detect_duplicates_with(flows, &DuplicateConfig::default())
}

/// Group near-duplicate flows.
///
/// Each flow heads a group of the later flows (by input position) whose
/// pair score is strictly above `config.threshold`. A flow already listed
/// as a duplicate may still head its own group, or appear in several
/// groups. Groups come out in input order.
pub fn detect_duplicates_with<'a>(
    flows: &'a [Flow],
    config: &DuplicateConfig,
) -> Vec<DuplicateGroup<'a>> {
    let mut groups = Vec::new();

    for (index, flow) in flows.iter().enumerate() {
        let duplicates: Vec<DuplicateMatch<'a>> = flows[index + 1..]
            .iter()
            .filter_map(|other| {
                let score = pair_score_with(flow, other, config);
                (score > config.threshold).then_some(DuplicateMatch { flow: other, score })
            })
            .collect();

        if duplicates.is_empty() {
            continue;
        }

        let similarity =
            duplicates.iter().map(|d| d.score).sum::<f64>() / duplicates.len() as f64;

        groups.push(DuplicateGroup {
            flow,
            duplicates,
            similarity,
            reason: DUPLICATE_REASON,
        });
    }

    debug!(
        "Duplicate detection: {} groups over {} flows",
        groups.len(),
        flows.len()
    );

    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::fixtures::{action, flow};
    use crate::models::TriggerType;

    #[test]
    fn test_identical_flows_score_one() {
        let a = flow("f1", "Deal Won → Slack");
        let b = flow("f2", "Deal Won → Slack");

        assert!((pair_score(&a, &b) - 1.0).abs() < 1e-12);

        let flows = [a, b];
        let groups = detect_duplicates(&flows);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].flow.id, "f1");
        assert_eq!(groups[0].duplicates.len(), 1);
        assert_eq!(groups[0].duplicates[0].flow.id, "f2");
        assert!((groups[0].similarity - 1.0).abs() < 1e-12);
        assert_eq!(groups[0].reason, DUPLICATE_REASON);
    }

    #[test]
    fn test_pair_score_is_symmetric() {
        let a = flow("f1", "Lead Score Update");
        let mut b = flow("f2", "Lead Scoring Refresh");
        b.trigger.trigger_type = TriggerType::Schedule;
        b.actions.push(action("a2", "update_property"));

        assert_eq!(pair_score(&a, &b), pair_score(&b, &a));
    }

    #[test]
    fn test_threshold_is_strict() {
        // Same trigger and actions, completely different names: 0.3 + 0.3 = 0.6
        let a = flow("f1", "aaaa");
        let b = flow("f2", "bbbb");
        assert!((pair_score(&a, &b) - 0.6).abs() < 1e-12);
        assert!(detect_duplicates(&[a.clone(), b.clone()]).is_empty());

        let config = DuplicateConfig {
            threshold: 0.6,
            ..DuplicateConfig::default()
        };
        assert!(detect_duplicates_with(&[a.clone(), b.clone()], &config).is_empty());

        let config = DuplicateConfig {
            threshold: 0.59,
            ..DuplicateConfig::default()
        };
        assert_eq!(detect_duplicates_with(&[a, b], &config).len(), 1);
    }

    #[test]
    fn test_different_trigger_and_actions_not_duplicates() {
        let a = flow("f1", "Deal Won → Slack");
        let mut b = flow("f2", "Deal Won → Slack");
        b.trigger.trigger_type = TriggerType::Manual;
        b.actions = vec![action("a9", "send_email")];

        // Name alone contributes 0.4
        assert!((pair_score(&a, &b) - 0.4).abs() < 1e-12);
        assert!(detect_duplicates(&[a, b]).is_empty());
    }

    #[test]
    fn test_no_mutual_exclusion_between_groups() {
        let flows = vec![
            flow("f1", "Deal Won → Slack"),
            flow("f2", "Deal Won → Slack"),
            flow("f3", "Deal Won → Slack"),
        ];

        let groups = detect_duplicates(&flows);
        assert_eq!(groups.len(), 2);

        let first: Vec<_> = groups[0].duplicates.iter().map(|d| d.flow.id.as_str()).collect();
        assert_eq!(first, vec!["f2", "f3"]);

        // f2 was already reported under f1 and still heads its own group
        assert_eq!(groups[1].flow.id, "f2");
        let second: Vec<_> = groups[1].duplicates.iter().map(|d| d.flow.id.as_str()).collect();
        assert_eq!(second, vec!["f3"]);
    }

    #[test]
    fn test_similarity_is_mean_of_pair_scores() {
        let a = flow("f1", "abcdefghij");
        let b = flow("f2", "abcdefghij");
        let c = flow("f3", "abcdefghiX");

        let expected = (pair_score(&a, &b) + pair_score(&a, &c)) / 2.0;
        let flows = [a, b, c];
        let groups = detect_duplicates(&flows);
        assert!((groups[0].similarity - expected).abs() < 1e-12);
        assert!(groups[0].similarity < 1.0);
    }

    #[test]
    fn test_declared_duplicate_of_is_ignored() {
        let a = flow("f1", "aaaa");
        let mut b = flow("f2", "zzzz");
        b.trigger.trigger_type = TriggerType::Event;
        b.duplicate_of = Some("f1".to_string());

        assert!(detect_duplicates(&[a, b]).is_empty());
    }

    #[test]
    fn test_empty_input() {
        assert!(detect_duplicates(&[]).is_empty());
    }
}
