//! Input descriptors and per-line analysis targets.
//!
//! # Invariants
//! - `Descriptor` is never mutated in place: every decode step derives a new
//!   one with an extended provenance chain.
//! - `AnalysisTarget` borrows the full line sequence of its source so
//!   multi-line rules can search a neighborhood without copying.

use std::sync::Arc;

/// Describes one unit of input: logical path, declared type and the
/// provenance chain that produced it.
///
/// The provenance chain starts at the logical path and grows one `|TAG:detail`
/// segment per decode step, so any candidate can be traced back through every
/// nesting level.
#[derive(Clone, Debug)]
pub struct Descriptor {
    pub path: Arc<str>,
    /// Declared type hint, usually the lowercase file extension with the dot
    /// (for example `.env`, `.json`). Empty when unknown.
    pub file_type: String,
    pub info: String,
}

impl Descriptor {
    pub fn new(path: &str, file_type: &str) -> Self {
        Self {
            path: Arc::from(path),
            file_type: file_type.to_lowercase(),
            info: path.to_string(),
        }
    }

    /// Derive a descriptor for a nested payload, appending `tag` to the
    /// provenance chain. The type hint is replaced by `file_type`.
    pub fn derive(&self, tag: &str, file_type: &str) -> Self {
        Self {
            path: Arc::clone(&self.path),
            file_type: file_type.to_lowercase(),
            info: format!("{}|{}", self.info, tag),
        }
    }

    /// Lowercase extension (with dot) of a name, or empty.
    pub fn extension_of(name: &str) -> String {
        match name.rfind('.') {
            Some(i) if i + 1 < name.len() => name[i..].to_lowercase(),
            _ => String::new(),
        }
    }
}

/// One line of a source plus its position and surrounding context.
///
/// Constructed per line during a scan and discarded after matching.
#[derive(Clone, Copy)]
pub struct AnalysisTarget<'a> {
    pub line: &'a str,
    /// 1-based line number reported in results. For binary `strings` output
    /// this carries the byte offset instead.
    pub line_num: usize,
    /// 0-based index into `lines`.
    pub line_pos: usize,
    pub lines: &'a [String],
    pub line_nums: &'a [usize],
    pub descriptor: &'a Descriptor,
}

impl<'a> AnalysisTarget<'a> {
    /// Target for another position of the same source.
    pub fn at(&self, line_pos: usize) -> AnalysisTarget<'a> {
        AnalysisTarget {
            line: &self.lines[line_pos],
            line_num: self.line_nums[line_pos],
            line_pos,
            lines: self.lines,
            line_nums: self.line_nums,
            descriptor: self.descriptor,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derive_extends_provenance() {
        let d = Descriptor::new("a/b.zip", ".zip");
        let inner = d.derive("ZIP:.env", ".env");
        assert_eq!(inner.info, "a/b.zip|ZIP:.env");
        assert_eq!(inner.file_type, ".env");
        // parent untouched
        assert_eq!(d.info, "a/b.zip");
    }

    #[test]
    fn extension_of_names() {
        assert_eq!(Descriptor::extension_of("x/y/cred.JSON"), ".json");
        assert_eq!(Descriptor::extension_of("noext"), "");
        assert_eq!(Descriptor::extension_of("tail."), "");
    }
}
