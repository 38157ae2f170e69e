//! Match results for a single line.
//!
//! # Invariants
//! - Spans are relative to the *original* line, never to a chunk window;
//!   callers that match inside a window must rebase before constructing.
//! - `value_span.start <= value_span.end` whenever a value exists.
//! - The serialized shape is format-stable and round-trips unchanged.

use std::ops::Range;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Span sentinel: the group was never resolved.
pub const SPAN_NOT_RESOLVED: i64 = -3;
/// Span sentinel: the group was looked up but the engine had no span for it.
pub const SPAN_LOOKUP_FAILED: i64 = -2;

/// Byte span inside the original line, or one of the two sentinels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub start: i64,
    pub end: i64,
}

impl Span {
    pub const fn not_resolved() -> Self {
        Span {
            start: SPAN_NOT_RESOLVED,
            end: SPAN_NOT_RESOLVED,
        }
    }

    pub const fn lookup_failed() -> Self {
        Span {
            start: SPAN_LOOKUP_FAILED,
            end: SPAN_LOOKUP_FAILED,
        }
    }

    pub fn from_range(r: Range<usize>) -> Self {
        Span {
            start: r.start as i64,
            end: r.end as i64,
        }
    }

    #[inline]
    pub fn is_resolved(&self) -> bool {
        self.start >= 0 && self.end >= self.start
    }

    pub fn as_range(&self) -> Option<Range<usize>> {
        if self.is_resolved() {
            Some(self.start as usize..self.end as usize)
        } else {
            None
        }
    }
}

impl Default for Span {
    fn default() -> Self {
        Span::not_resolved()
    }
}

/// Prefixes that mark a whole line as a comment.
const COMMENT_STARTS: &[&str] = &[
    "//", "*", "#", "/*", "<!--", "%{", "%", "...", "(*", "--", "--[[", "#=",
];

fn bash_param_split() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+(-|\||>|\w+?>|&)").expect("static pattern"))
}

/// One rule hit on one line: resolved variable/separator/value strings and
/// their spans, after line-specific cleanup.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LineData {
    pub line: String,
    pub line_num: usize,
    #[serde(default)]
    pub line_pos: usize,
    pub path: String,
    /// Provenance chain of the payload this line came from.
    pub info: String,

    pub variable: Option<String>,
    #[serde(default)]
    pub variable_span: Span,
    pub separator: Option<String>,
    #[serde(default)]
    pub separator_span: Span,
    pub value: Option<String>,
    #[serde(default)]
    pub value_span: Span,
}

/// Raw group capture handed to `LineData::new`: the resolved text range, or
/// which sentinel applies.
#[derive(Clone, Copy, Debug)]
pub enum Capture {
    /// Group resolved to this byte range of the original line.
    Present(usize, usize),
    /// Group exists in the pattern but matched nothing here.
    Missing,
    /// Group is not part of the pattern at all.
    Absent,
}

impl Capture {
    fn span(self) -> Span {
        match self {
            Capture::Present(s, e) => Span::from_range(s..e),
            Capture::Missing => Span::lookup_failed(),
            Capture::Absent => Span::not_resolved(),
        }
    }

    fn text(self, line: &str) -> Option<String> {
        match self {
            Capture::Present(s, e) => Some(line[s..e].to_string()),
            _ => None,
        }
    }
}

impl LineData {
    /// Build a line-data record and apply the standard cleanups.
    pub fn new(
        line: &str,
        line_num: usize,
        line_pos: usize,
        path: &str,
        info: &str,
        variable: Capture,
        separator: Capture,
        value: Capture,
    ) -> Self {
        let mut ld = LineData {
            line: line.to_string(),
            line_num,
            line_pos,
            path: path.to_string(),
            info: info.to_string(),
            variable: variable.text(line),
            variable_span: variable.span(),
            separator: separator.text(line),
            separator_span: separator.span(),
            value: value.text(line),
            value_span: value.span(),
        };
        ld.clean_url_parameters();
        ld.clean_bash_parameters();
        ld.sanitize_variable();
        ld
    }

    /// If the line looks like a URL, split the variable and value on query
    /// delimiters: the variable keeps its rightmost `&`/`?` component, the
    /// value its leftmost `&` component.
    fn clean_url_parameters(&mut self) {
        if !(self.line.contains("http://") || self.line.contains("https://")) {
            return;
        }
        if let Some(var) = self.variable.take() {
            let tail = var.rsplit(['&', '?']).next().unwrap_or("").to_string();
            let cut = var.len() - tail.len();
            if cut > 0 {
                if let Some(r) = self.variable_span.as_range() {
                    self.variable_span = Span::from_range(r.start + cut..r.end);
                }
            }
            self.variable = Some(tail);
        }
        if let Some(val) = self.value.take() {
            let head = val.split('&').next().unwrap_or("").to_string();
            if head.len() < val.len() {
                if let Some(r) = self.value_span.as_range() {
                    self.value_span = Span::from_range(r.start..r.start + head.len());
                }
            }
            self.value = Some(head);
        }
    }

    /// For CLI-looking lines (variable starts with `-`), cut the value at the
    /// first bash special token.
    fn clean_bash_parameters(&mut self) {
        let (Some(var), Some(val)) = (self.variable.as_deref(), self.value.as_deref()) else {
            return;
        };
        if !var.starts_with('-') {
            return;
        }
        if let Some(m) = bash_param_split().find(val) {
            if m.start() > 0 {
                let head = val[..m.start()].to_string();
                if let Some(r) = self.value_span.as_range() {
                    self.value_span = Span::from_range(r.start..r.start + head.len());
                }
                self.value = Some(head);
            }
        }
    }

    /// Trim surrounding whitespace, leading dashes and quotes from the
    /// variable, keeping its span aligned with the trimmed text.
    fn sanitize_variable(&mut self) {
        let Some(var) = self.variable.take() else {
            return;
        };
        let trimmed = var
            .trim()
            .trim_matches('-')
            .trim_matches('"')
            .trim_matches('\'');
        if trimmed.len() != var.len() {
            if let Some(start) = var.find(trimmed) {
                if let Some(r) = self.variable_span.as_range() {
                    self.variable_span =
                        Span::from_range(r.start + start..r.start + start + trimmed.len());
                }
            }
        }
        self.variable = Some(trimmed.to_string());
    }

    /// True when the whole line starts with a known comment marker.
    pub fn is_comment(&self) -> bool {
        let cleaned = self.line.trim_start();
        COMMENT_STARTS.iter().any(|c| cleaned.starts_with(c))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn simple(line: &str, variable: Capture, separator: Capture, value: Capture) -> LineData {
        LineData::new(line, 1, 0, "test.txt", "test.txt", variable, separator, value)
    }

    #[test]
    fn sentinels_roundtrip() {
        assert!(!Span::not_resolved().is_resolved());
        assert!(!Span::lookup_failed().is_resolved());
        assert_eq!(Span::not_resolved().start, SPAN_NOT_RESOLVED);
        assert_eq!(Span::lookup_failed().start, SPAN_LOOKUP_FAILED);
        assert!(Span::from_range(3..9).is_resolved());
    }

    #[test]
    fn url_query_split() {
        let line = "https://host/api?user=bob&token=abcd1234&lang=en";
        // variable "user=bob&token", value "abcd1234&lang=en" as a raw
        // grammar match would produce before cleanup.
        let ld = simple(
            line,
            Capture::Present(17, 31),
            Capture::Present(31, 32),
            Capture::Present(32, 48),
        );
        assert_eq!(ld.variable.as_deref(), Some("token"));
        assert_eq!(ld.value.as_deref(), Some("abcd1234"));
        assert_eq!(ld.value_span, Span::from_range(32..40));
    }

    #[test]
    fn bash_parameter_split() {
        let line = "run --password hunter2345 --verbose";
        let ld = simple(
            line,
            Capture::Present(4, 14),
            Capture::Present(14, 15),
            Capture::Present(15, 35),
        );
        assert_eq!(ld.variable.as_deref(), Some("password"));
        assert_eq!(ld.value.as_deref(), Some("hunter2345"));
    }

    #[test]
    fn variable_quote_trim() {
        let line = "\"api_key\": \"abcd1234\"";
        let ld = simple(
            line,
            Capture::Present(0, 9),
            Capture::Present(9, 10),
            Capture::Present(12, 20),
        );
        assert_eq!(ld.variable.as_deref(), Some("api_key"));
        assert_eq!(ld.variable_span, Span::from_range(1..8));
    }

    #[test]
    fn comment_detection() {
        let ld = simple("  // password = x", Capture::Absent, Capture::Absent, Capture::Absent);
        assert!(ld.is_comment());
        let ld = simple("password = x", Capture::Absent, Capture::Absent, Capture::Absent);
        assert!(!ld.is_comment());
    }

    #[test]
    fn serde_shape_is_stable() {
        let ld = simple(
            "password = \"Secret123!\"",
            Capture::Present(0, 8),
            Capture::Present(9, 10),
            Capture::Present(12, 22),
        );
        let json = serde_json::to_string(&ld).unwrap();
        let back: LineData = serde_json::from_str(&json).unwrap();
        assert_eq!(ld, back);
    }
}
