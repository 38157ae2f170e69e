//! Candidate records and the merge-by-value combinator.
//!
//! # Invariants
//! - A Multi-rule candidate is complete only once it holds exactly as many
//!   line-data entries as the rule has patterns (two).
//! - The serialized record is format-stable: rule name, severity, confidence,
//!   nullable ML decision and the line-data list round-trip unchanged.

use serde::{Deserialize, Serialize};

use crate::line_data::LineData;
use crate::rule::Severity;

/// Decision attached by the external ML re-ranking stage.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct MlDecision {
    pub accepted: bool,
    pub probability: f64,
}

/// A potential secret detection, possibly spanning multiple matched lines.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub rule_name: String,
    pub severity: Severity,
    pub confidence: f32,
    pub use_ml: bool,
    pub line_data_list: Vec<LineData>,
    /// Unset until the post-processing stage runs.
    pub ml_decision: Option<MlDecision>,
}

/// Structural identity of a candidate: where it is and what it found.
///
/// Used for ML grouping; the dispatcher's deep-decoder merge deliberately
/// uses only the value (see `augment_candidates`).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CandidateKey {
    pub path: String,
    pub line_num: usize,
    pub value: String,
}

impl Candidate {
    pub fn key(&self) -> CandidateKey {
        let first = &self.line_data_list[0];
        CandidateKey {
            path: first.path.clone(),
            line_num: first.line_num,
            value: first.value.clone().unwrap_or_default(),
        }
    }
}

/// Merge `new_candidates` into `candidates`, appending only those whose
/// line-data values are all unseen.
///
/// Position is deliberately ignored: two deep decoders that both interpret
/// the same bytes must not double-report the same secret.
pub fn augment_candidates(candidates: &mut Vec<Candidate>, new_candidates: Vec<Candidate>) {
    if new_candidates.is_empty() {
        return;
    }
    let mut found: ahash::AHashSet<String> = candidates
        .iter()
        .flat_map(|c| c.line_data_list.iter())
        .filter_map(|ld| ld.value.clone())
        .collect();
    for new_candidate in new_candidates {
        let fresh = new_candidate
            .line_data_list
            .iter()
            .any(|ld| ld.value.as_ref().is_some_and(|v| !found.contains(v)));
        if fresh {
            for ld in &new_candidate.line_data_list {
                if let Some(v) = &ld.value {
                    found.insert(v.clone());
                }
            }
            candidates.push(new_candidate);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::line_data::Capture;

    fn candidate(value: &str) -> Candidate {
        let line = format!("key = {value}");
        let ld = LineData::new(
            &line,
            1,
            0,
            "f",
            "f",
            Capture::Present(0, 3),
            Capture::Present(4, 5),
            Capture::Present(6, 6 + value.len()),
        );
        Candidate {
            rule_name: "Test".into(),
            severity: Severity::Medium,
            confidence: 0.5,
            use_ml: false,
            line_data_list: vec![ld],
            ml_decision: None,
        }
    }

    #[test]
    fn merge_drops_duplicate_values() {
        let mut all = vec![candidate("abcd1234")];
        augment_candidates(
            &mut all,
            vec![candidate("abcd1234"), candidate("zzzz9999")],
        );
        assert_eq!(all.len(), 2);
        assert_eq!(
            all[1].line_data_list[0].value.as_deref(),
            Some("zzzz9999")
        );
    }

    #[test]
    fn merge_of_empty_is_noop() {
        let mut all = vec![candidate("abcd1234")];
        augment_candidates(&mut all, vec![]);
        assert_eq!(all.len(), 1);
    }

    #[test]
    fn record_roundtrips() {
        let c = candidate("abcd1234");
        let json = serde_json::to_string(&c).unwrap();
        let back: Candidate = serde_json::from_str(&json).unwrap();
        assert_eq!(back.rule_name, c.rule_name);
        assert_eq!(back.line_data_list[0].value, c.line_data_list[0].value);
        assert!(back.ml_decision.is_none());
    }
}
