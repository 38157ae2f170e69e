//! Rule model and the pattern compiler.
//!
//! # Invariants
//! - Rules are immutable after `Rule::compile` and safe to share read-only
//!   across concurrent scans.
//! - Kind/arity/filter problems are load-time errors (configuration
//!   mistakes), never silently downgraded.

pub mod builtin;
pub mod keyword;

use aho_corasick::AhoCorasick;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::filter::{filter_set, Filter};
use keyword::KeywordMatcher;

/// How a rule's raw patterns are interpreted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleKind {
    /// Each value is a keyword substituted into the keyword grammar.
    Keyword,
    /// Each value is a regular expression; with several values all must
    /// match the same line.
    Pattern,
    /// Exactly two patterns: an anchor and a neighborhood pattern.
    Multi,
    /// One pattern recognizing the PEM BEGIN marker; the body is validated
    /// by the PEM state machine.
    PemKey,
}

/// Assumed impact of a leaked credential of this type.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Low,
    Medium,
    High,
    Critical,
}

/// Declarative rule definition, as loaded from configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RuleSpec {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: RuleKind,
    pub severity: Severity,
    #[serde(default = "default_confidence")]
    pub confidence: f32,
    pub values: Vec<String>,
    #[serde(default)]
    pub filter_set: String,
    #[serde(default)]
    pub use_ml: bool,
    #[serde(default)]
    pub required_substrings: Vec<String>,
    #[serde(default)]
    pub min_line_len: usize,
}

fn default_confidence() -> f32 {
    1.0
}

/// Rule loading errors. These indicate configuration mistakes and abort
/// startup; they are never produced by scanned data.
#[derive(Debug, Error)]
pub enum RuleError {
    #[error("rule `{name}`: {kind:?} rules require {expected} pattern(s), got {got}")]
    PatternArity {
        name: String,
        kind: RuleKind,
        expected: &'static str,
        got: usize,
    },
    #[error("rule `{name}`: invalid pattern `{pattern}`")]
    BadPattern {
        name: String,
        pattern: String,
        #[source]
        source: regex::Error,
    },
    #[error("rule `{name}`: unknown filter set `{set}`")]
    UnknownFilterSet { name: String, set: String },
    #[error("rule `{name}`: bad required substring list")]
    BadRequiredSubstrings {
        name: String,
        #[source]
        source: aho_corasick::BuildError,
    },
}

/// One executable matcher compiled from a raw pattern.
#[derive(Clone, Debug)]
pub enum Matcher {
    Keyword(KeywordMatcher),
    Regex(Regex),
}

/// A compiled rule: immutable after load, shared read-only by every scan.
#[derive(Debug)]
pub struct Rule {
    pub name: String,
    pub kind: RuleKind,
    pub severity: Severity,
    pub confidence: f32,
    pub matchers: Vec<Matcher>,
    pub filters: Vec<Filter>,
    pub use_ml: bool,
    pub required_substrings: Vec<String>,
    required: Option<AhoCorasick>,
    pub min_line_len: usize,
}

impl Rule {
    /// Compile a declarative spec into executable matchers.
    pub fn compile(spec: RuleSpec) -> Result<Rule, RuleError> {
        let arity_ok = match spec.kind {
            RuleKind::Keyword | RuleKind::Pattern => !spec.values.is_empty(),
            RuleKind::Multi => spec.values.len() == 2,
            RuleKind::PemKey => spec.values.len() == 1,
        };
        if !arity_ok {
            let expected = match spec.kind {
                RuleKind::Keyword | RuleKind::Pattern => "one or more",
                RuleKind::Multi => "exactly two",
                RuleKind::PemKey => "exactly one",
            };
            return Err(RuleError::PatternArity {
                name: spec.name,
                kind: spec.kind,
                expected,
                got: spec.values.len(),
            });
        }

        let mut matchers = Vec::with_capacity(spec.values.len());
        for value in &spec.values {
            let m = match spec.kind {
                RuleKind::Keyword => Matcher::Keyword(KeywordMatcher::new(value)),
                RuleKind::Pattern | RuleKind::Multi | RuleKind::PemKey => {
                    Matcher::Regex(Regex::new(value).map_err(|source| {
                        RuleError::BadPattern {
                            name: spec.name.clone(),
                            pattern: value.clone(),
                            source,
                        }
                    })?)
                }
            };
            matchers.push(m);
        }

        let filters = filter_set(&spec.filter_set).ok_or_else(|| RuleError::UnknownFilterSet {
            name: spec.name.clone(),
            set: spec.filter_set.clone(),
        })?;

        let required_substrings: Vec<String> = spec
            .required_substrings
            .iter()
            .map(|s| s.to_lowercase())
            .collect();
        let required = if required_substrings.is_empty() {
            None
        } else {
            Some(
                AhoCorasick::builder()
                    .ascii_case_insensitive(true)
                    .build(&required_substrings)
                    .map_err(|source| RuleError::BadRequiredSubstrings {
                        name: spec.name.clone(),
                        source,
                    })?,
            )
        };

        Ok(Rule {
            name: spec.name,
            kind: spec.kind,
            severity: spec.severity,
            confidence: spec.confidence,
            matchers,
            filters,
            use_ml: spec.use_ml,
            required_substrings,
            required,
            min_line_len: spec.min_line_len,
        })
    }

    /// Cheap prefilter: true when the line contains at least one of the
    /// rule's required substrings (or the rule declares none).
    #[inline]
    pub fn required_present(&self, line: &str) -> bool {
        match &self.required {
            None => true,
            Some(ac) => ac.is_match(line),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(kind: RuleKind, values: &[&str]) -> RuleSpec {
        RuleSpec {
            name: "Test".into(),
            kind,
            severity: Severity::Medium,
            confidence: 0.8,
            values: values.iter().map(|s| s.to_string()).collect(),
            filter_set: String::new(),
            use_ml: false,
            required_substrings: vec![],
            min_line_len: 0,
        }
    }

    #[test]
    fn multi_requires_two_patterns() {
        let err = Rule::compile(spec(RuleKind::Multi, &["only-one"])).unwrap_err();
        assert!(matches!(err, RuleError::PatternArity { .. }));
        assert!(Rule::compile(spec(RuleKind::Multi, &["a.{4}", "b.{4}"])).is_ok());
    }

    #[test]
    fn pem_requires_one_pattern() {
        let err = Rule::compile(spec(RuleKind::PemKey, &["a", "b"])).unwrap_err();
        assert!(matches!(err, RuleError::PatternArity { .. }));
    }

    #[test]
    fn bad_regex_is_load_error() {
        let err = Rule::compile(spec(RuleKind::Pattern, &["(unclosed"])).unwrap_err();
        assert!(matches!(err, RuleError::BadPattern { .. }));
    }

    #[test]
    fn unknown_filter_set_is_load_error() {
        let mut s = spec(RuleKind::Pattern, &["x{4}"]);
        s.filter_set = "Bogus".into();
        let err = Rule::compile(s).unwrap_err();
        assert!(matches!(err, RuleError::UnknownFilterSet { .. }));
    }

    #[test]
    fn required_substrings_are_case_insensitive() {
        let mut s = spec(RuleKind::Pattern, &["x{4}"]);
        s.required_substrings = vec!["AKIA".into()];
        let rule = Rule::compile(s).unwrap();
        assert!(rule.required_present("key = akiaSOMETHING"));
        assert!(!rule.required_present("nothing here"));
    }

    #[test]
    fn spec_deserializes_from_json() {
        let json = r#"{
            "name": "Password",
            "type": "keyword",
            "severity": "medium",
            "values": ["password"],
            "filter_set": "GeneralKeyword",
            "use_ml": true,
            "min_line_len": 10
        }"#;
        let spec: RuleSpec = serde_json::from_str(json).unwrap();
        assert_eq!(spec.kind, RuleKind::Keyword);
        assert_eq!(spec.severity, Severity::Medium);
        let rule = Rule::compile(spec).unwrap();
        assert_eq!(rule.filters.len(), 4);
    }

    #[test]
    fn severity_orders() {
        assert!(Severity::Critical > Severity::High);
        assert!(Severity::Low > Severity::Info);
    }
}
