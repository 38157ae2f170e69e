//! Credential scanning engine with bounded container traversal and explicit
//! provenance.
//!
//! ## Scope
//! This crate finds credential-like secrets (API keys, passwords, tokens,
//! private keys) in lines of text and in arbitrary nested byte containers,
//! using four rule kinds: keyword grammar matching, plain regex patterns,
//! two-pattern multi-line correlation and a PEM-boundary state machine.
//!
//! ## Key invariants
//! - Work is bounded by explicit budgets: oversized lines scan in
//!   overlapping windows, container recursion carries a depth counter and a
//!   byte budget charged per extracted payload.
//! - Compiled rules are immutable after load and shared read-only across
//!   every concurrent scan; all mutable state is owned by one scan's call
//!   stack.
//! - Malformed data never aborts a run: decode failures downgrade to
//!   not-applicable and the remaining inputs still scan.
//! - Every decode step appends a `|TAG` segment to the provenance chain, so
//!   any candidate traces back to the original input.
//!
//! ## Flow (one input)
//! `bytes -> DeepScanner (sniff, decode, recurse under budget) -> leaf text
//! -> Scanner (classify, chunk, match, filter) -> Candidates -> ML re-rank`
//!
//! ## Notable entry points
//! - `Scanner`: compiled rules applied to lines.
//! - `DeepScanner` / `ByteBudget`: recursive container traversal.
//! - `scan_inputs` / `ScanOptions`: worker pool over top-level inputs.
//! - `RuleSpec` / `builtin_rules`: rule definitions.
//! - `Candidate` / `LineData`: the format-stable result records.

pub mod candidate;
pub mod deep;
pub mod entropy;
pub mod filter;
pub mod line_data;
pub mod ml;
pub mod pool;
pub mod provider;
pub mod rule;
pub mod scanner;
pub mod target;

pub use candidate::{augment_candidates, Candidate, CandidateKey, MlDecision};
pub use deep::{ByteBudget, DeepScanner, DEFAULT_BYTE_BUDGET};
pub use line_data::{LineData, Span};
pub use ml::{apply_ranker, MlRanker, NoopRanker};
pub use pool::{scan_inputs, ScanOptions};
pub use provider::{Content, InputUnit};
pub use rule::builtin::builtin_rules;
pub use rule::{Rule, RuleError, RuleKind, RuleSpec, Severity};
pub use scanner::Scanner;
pub use target::{AnalysisTarget, Descriptor};
