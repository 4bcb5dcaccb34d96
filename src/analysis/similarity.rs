//! String and structural similarity primitives.

use crate::models::Action;
use std::collections::HashSet;

/// Edit distance with unit costs for insertion, deletion and substitution.
///
/// Operates on `char`s, so multi-byte names such as `Deal → Slack` count
/// one edit per visible character.
pub fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();

    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    // Two rolling rows of the DP matrix.
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let substitution = prev[j] + usize::from(ca != cb);
            curr[j + 1] = substitution.min(prev[j + 1] + 1).min(curr[j] + 1);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}

/// Normalized edit similarity in `[0, 1]`; `1.0` for two empty strings.
pub fn string_similarity(a: &str, b: &str) -> f64 {
    let longest = a.chars().count().max(b.chars().count());
    if longest == 0 {
        return 1.0;
    }

    1.0 - levenshtein(a, b) as f64 / longest as f64
}

/// Jaccard index over the sets of action type tags.
///
/// Order and repetition of actions are ignored. Two empty lists are
/// identical (`1.0`); one empty list shares nothing (`0.0`).
pub fn action_set_similarity(actions1: &[Action], actions2: &[Action]) -> f64 {
    match (actions1.is_empty(), actions2.is_empty()) {
        (true, true) => return 1.0,
        (true, false) | (false, true) => return 0.0,
        _ => {}
    }

    let types1: HashSet<&str> = actions1.iter().map(|a| a.action_type.as_str()).collect();
    let types2: HashSet<&str> = actions2.iter().map(|a| a.action_type.as_str()).collect();

    let intersection = types1.intersection(&types2).count();
    let union = types1.union(&types2).count();

    intersection as f64 / union as f64
}
