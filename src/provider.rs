//! Content-provider contract: what a unit of input looks like.
//!
//! I/O adapters (filesystem walkers, diff readers, anything else) stay
//! outside this crate; they hand over either a line sequence with stable
//! line numbers or a raw byte blob plus a type hint.

use crate::target::Descriptor;

/// The payload of one logical input unit.
#[derive(Clone, Debug)]
pub enum Content {
    /// Pre-split text with caller-stable line numbers.
    Lines {
        lines: Vec<String>,
        line_nums: Vec<usize>,
    },
    /// Raw bytes that may be a container; the hint is usually the lowercase
    /// file extension with the dot.
    Bytes { data: Vec<u8>, type_hint: String },
}

/// One unit of input to scan.
#[derive(Clone, Debug)]
pub struct InputUnit {
    pub path: String,
    pub content: Content,
}

impl InputUnit {
    pub fn lines(path: &str, lines: Vec<String>) -> Self {
        let line_nums = (1..=lines.len()).collect();
        Self {
            path: path.to_string(),
            content: Content::Lines { lines, line_nums },
        }
    }

    pub fn bytes(path: &str, data: Vec<u8>) -> Self {
        Self {
            path: path.to_string(),
            content: Content::Bytes {
                data,
                type_hint: Descriptor::extension_of(path),
            },
        }
    }

    pub fn descriptor(&self) -> Descriptor {
        let type_hint = match &self.content {
            Content::Lines { .. } => Descriptor::extension_of(&self.path),
            Content::Bytes { type_hint, .. } => type_hint.clone(),
        };
        Descriptor::new(&self.path, &type_hint)
    }
}
