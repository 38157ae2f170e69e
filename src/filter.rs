//! False-positive filter predicates.
//!
//! The full heuristic catalog lives outside this engine; what ships here is
//! the contract plus a small set of real predicates so rules and tests have
//! something to run against.
//!
//! # Invariants
//! - Filters run in the order the rule's set declares; the first `true`
//!   rejects the match.
//! - Set names resolve through an exhaustive registry at rule load time;
//!   an unknown name is a load error, never a silent no-op.

use crate::entropy::{shannon_entropy, BASE64_CHARS};
use crate::line_data::LineData;
use crate::target::AnalysisTarget;

/// Identical/ascending/descending run length treated as a synthetic value.
pub const PATTERN_RUN_LEN: usize = 5;

/// One rejection predicate. `reject` returning true drops the match.
#[derive(Clone, Debug)]
pub enum Filter {
    /// Reject values shorter than `min` characters.
    ValueLength { min: usize },
    /// Reject values containing an identical, ascending or descending run of
    /// `run` characters (for example `AAAAA`, `12345`, `edcba`).
    ValuePattern { run: usize },
    /// Reject values whose base64-alphabet entropy falls below `min`.
    /// Short values (< `min_len`) pass unconditionally.
    ValueEntropy { min: f64, min_len: usize },
    /// Reject when the variable name marks a non-secret (public keys,
    /// file paths, URLs handed around as "keys").
    VariableNotSecret,
    /// Reject values that are template placeholders (`${...}`, `%s`, `<...>`).
    ValueTemplate,
}

impl Filter {
    /// Evaluate the predicate. True means "drop this match".
    pub fn reject(&self, line_data: &LineData, _target: &AnalysisTarget) -> bool {
        match self {
            Filter::ValueLength { min } => {
                line_data.value.as_deref().is_none_or(|v| v.len() < *min)
            }
            Filter::ValuePattern { run } => line_data
                .value
                .as_deref()
                .is_some_and(|v| has_uniform_run(v.as_bytes(), *run)),
            Filter::ValueEntropy { min, min_len } => {
                line_data.value.as_deref().is_some_and(|v| {
                    v.len() >= *min_len && shannon_entropy(v.as_bytes(), BASE64_CHARS) < *min
                })
            }
            Filter::VariableNotSecret => line_data.variable.as_deref().is_some_and(|var| {
                let var = var.to_lowercase();
                ["public", "pubkey", "endpoint", "username", "user_name"]
                    .iter()
                    .any(|w| var.contains(w))
            }),
            Filter::ValueTemplate => line_data.value.as_deref().is_some_and(|v| {
                (v.starts_with("${") && v.ends_with('}'))
                    || (v.starts_with('<') && v.ends_with('>'))
                    || (v.starts_with('{') && v.ends_with('}'))
                    || v.contains("%s")
            }),
        }
    }
}

/// True when `data` holds `run` consecutive identical bytes, or an ascending
/// or descending byte staircase of the same length.
pub fn has_uniform_run(data: &[u8], run: usize) -> bool {
    if run == 0 || data.len() < run {
        return false;
    }
    for window in data.windows(run) {
        let equal = window.windows(2).all(|p| p[0] == p[1]);
        let asc = window.windows(2).all(|p| p[1] == p[0].wrapping_add(1));
        let desc = window.windows(2).all(|p| p[1] == p[0].wrapping_sub(1));
        if equal || asc || desc {
            return true;
        }
    }
    false
}

/// Resolve a named filter set. Returns None for unknown names; the rule
/// compiler turns that into a load-time error.
pub fn filter_set(name: &str) -> Option<Vec<Filter>> {
    match name {
        "" => Some(vec![]),
        "GeneralKeyword" => Some(vec![
            Filter::ValueLength { min: 4 },
            Filter::ValueTemplate,
            Filter::ValuePattern {
                run: PATTERN_RUN_LEN,
            },
            Filter::VariableNotSecret,
        ]),
        "GeneralPattern" => Some(vec![
            Filter::ValueLength { min: 4 },
            Filter::ValuePattern {
                run: PATTERN_RUN_LEN,
            },
            Filter::ValueEntropy {
                min: 1.5,
                min_len: 16,
            },
        ]),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::line_data::Capture;
    use crate::target::Descriptor;

    fn line_data(value: &str, variable: &str) -> LineData {
        let line = format!("{variable} = {value}");
        LineData::new(
            &line,
            1,
            0,
            "f",
            "f",
            Capture::Present(0, variable.len()),
            Capture::Present(variable.len() + 1, variable.len() + 2),
            Capture::Present(variable.len() + 3, line.len()),
        )
    }

    fn with_target<R>(f: impl FnOnce(&AnalysisTarget) -> R) -> R {
        let descriptor = Descriptor::new("f", "");
        let lines = vec![String::new()];
        let nums = vec![1];
        let target = AnalysisTarget {
            line: &lines[0],
            line_num: 1,
            line_pos: 0,
            lines: &lines,
            line_nums: &nums,
            descriptor: &descriptor,
        };
        f(&target)
    }

    #[test]
    fn uniform_runs() {
        assert!(has_uniform_run(b"xxAAAAAzz", 5));
        assert!(has_uniform_run(b"ab12345cd", 5));
        assert!(has_uniform_run(b"zyxwv", 5));
        assert!(!has_uniform_run(b"Secret123!", 5));
        assert!(!has_uniform_run(b"abc", 5));
    }

    #[test]
    fn keyword_set_accepts_real_secret() {
        with_target(|t| {
            let ld = line_data("Secret123!", "password");
            let rejected = filter_set("GeneralKeyword")
                .unwrap()
                .iter()
                .any(|f| f.reject(&ld, t));
            assert!(!rejected);
        });
    }

    #[test]
    fn keyword_set_rejects_template() {
        with_target(|t| {
            let ld = line_data("${DB_PASSWORD}", "password");
            let rejected = filter_set("GeneralKeyword")
                .unwrap()
                .iter()
                .any(|f| f.reject(&ld, t));
            assert!(rejected);
        });
    }

    #[test]
    fn unknown_set_is_none() {
        assert!(filter_set("NoSuchSet").is_none());
        assert_eq!(filter_set("").unwrap().len(), 0);
    }
}
