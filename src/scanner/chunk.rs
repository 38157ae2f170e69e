//! Overlapping windows for oversized lines.
//!
//! # Invariants
//! - Lines at or below `CHUNK_THRESHOLD` bytes are scanned as one window.
//! - Consecutive windows start `CHUNK_STEP` bytes apart with `CHUNK_WINDOW`
//!   bytes each, so adjacent windows overlap by 1000 bytes and a secret
//!   shorter than the overlap can never straddle both boundaries unseen.
//! - Window edges are snapped to char boundaries, widening only.
//! - Matches repeated in an overlap are collapsed by `MatchKey` before they
//!   leave the engine.

use crate::line_data::{LineData, Span};
use std::ops::Range;

/// Lines longer than this are scanned in windows.
pub const CHUNK_THRESHOLD: usize = 8000;
/// Window size in bytes.
pub const CHUNK_WINDOW: usize = 4000;
/// Distance between consecutive window starts.
pub const CHUNK_STEP: usize = 3000;

/// Byte ranges to scan for one line. Always non-empty; the last range ends
/// at the line end.
pub fn windows(line: &str) -> Vec<Range<usize>> {
    if line.len() <= CHUNK_THRESHOLD {
        return vec![0..line.len()];
    }
    let mut out = Vec::new();
    let mut start = 0;
    loop {
        let end = (start + CHUNK_WINDOW).min(line.len());
        out.push(snap_down(line, start)..snap_up(line, end));
        if end == line.len() {
            return out;
        }
        start += CHUNK_STEP;
    }
}

fn snap_down(line: &str, mut at: usize) -> usize {
    while at > 0 && !line.is_char_boundary(at) {
        at -= 1;
    }
    at
}

fn snap_up(line: &str, mut at: usize) -> usize {
    while at < line.len() && !line.is_char_boundary(at) {
        at += 1;
    }
    at
}

/// Structural identity of a match: line number plus all three spans, in
/// original-line coordinates. Matches found twice in an overlap compare
/// equal and are reported once.
#[derive(Clone, Debug, Hash, PartialEq, Eq)]
pub struct MatchKey {
    line_num: usize,
    variable: (i64, i64),
    separator: (i64, i64),
    value: (i64, i64),
}

impl MatchKey {
    pub fn of(ld: &LineData) -> Self {
        fn pair(s: &Span) -> (i64, i64) {
            (s.start, s.end)
        }
        MatchKey {
            line_num: ld.line_num,
            variable: pair(&ld.variable_span),
            separator: pair(&ld.separator_span),
            value: pair(&ld.value_span),
        }
    }
}
