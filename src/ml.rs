//! Machine-learning re-ranking contract.
//!
//! The model itself is an external collaborator; this module fixes the
//! interface. Candidates are grouped by their `(path, line, value)` key and
//! offered to the ranker in batches. A group containing any member whose
//! rule opted out of ML skips ranking entirely and is accepted as-is.

use ahash::AHashMap;

use crate::candidate::{Candidate, CandidateKey, MlDecision};

/// Re-ranker consumed after scanning.
pub trait MlRanker {
    /// Preferred number of groups per `rank_groups` call.
    fn batch_size(&self) -> usize {
        16
    }

    /// One decision per group, in order.
    fn rank_groups(&self, groups: &[&[Candidate]]) -> Vec<MlDecision>;
}

/// Accepts everything with certainty; the default when no model is loaded.
pub struct NoopRanker;

impl MlRanker for NoopRanker {
    fn rank_groups(&self, groups: &[&[Candidate]]) -> Vec<MlDecision> {
        groups
            .iter()
            .map(|_| MlDecision {
                accepted: true,
                probability: 1.0,
            })
            .collect()
    }
}

/// Run the ranker over a candidate list. Rejected candidates are removed;
/// survivors of ranked groups carry the group's decision, bypassed ones
/// keep `ml_decision` unset.
pub fn apply_ranker(ranker: &dyn MlRanker, candidates: Vec<Candidate>) -> Vec<Candidate> {
    let mut grouped: AHashMap<CandidateKey, Vec<Candidate>> = AHashMap::new();
    let mut order: Vec<CandidateKey> = Vec::new();
    for c in candidates {
        let key = c.key();
        match grouped.get_mut(&key) {
            Some(group) => group.push(c),
            None => {
                order.push(key.clone());
                grouped.insert(key, vec![c]);
            }
        }
    }

    let mut out = Vec::new();
    let mut batch_keys: Vec<&CandidateKey> = Vec::new();
    for key in &order {
        if grouped[key].iter().any(|c| !c.use_ml) {
            out.extend(grouped[key].iter().cloned());
        } else {
            batch_keys.push(key);
        }
    }

    for chunk in batch_keys.chunks(ranker.batch_size().max(1)) {
        let groups: Vec<&[Candidate]> = chunk.iter().map(|k| grouped[*k].as_slice()).collect();
        let decisions = ranker.rank_groups(&groups);
        for (key, decision) in chunk.iter().zip(decisions) {
            if !decision.accepted {
                continue;
            }
            for mut c in grouped[*key].iter().cloned() {
                c.ml_decision = Some(decision);
                out.push(c);
            }
        }
    }
    out
}
