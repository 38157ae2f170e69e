//! Printable-string extraction from binary payloads.
//!
//! The last-resort reading of bytes nothing else recognized: runs of
//! printable ASCII (TAB plus 0x20..=0x7E) of at least `MIN_RUN` bytes are
//! scanned as individual lines, numbered by their byte offset so a finding
//! can be located inside the blob.

use crate::candidate::Candidate;
use crate::scanner::Scanner;
use crate::target::Descriptor;

/// Shortest printable run worth scanning.
pub const MIN_RUN: usize = 8;

pub(crate) fn scan_strings(
    scanner: &Scanner,
    data: &[u8],
    descriptor: &Descriptor,
) -> Vec<Candidate> {
    let (lines, offsets) = extract(data);
    if lines.is_empty() {
        return Vec::new();
    }
    let inner = descriptor.derive("STRINGS", "");
    scanner.scan_numbered(&inner, &lines, &offsets)
}

/// Printable runs and the byte offset each one starts at.
fn extract(data: &[u8]) -> (Vec<String>, Vec<usize>) {
    let mut lines = Vec::new();
    let mut offsets = Vec::new();
    let mut start = None;
    for (i, &b) in data.iter().enumerate() {
        let printable = b == b'\t' || (0x20..=0x7e).contains(&b);
        match (printable, start) {
            (true, None) => start = Some(i),
            (false, Some(s)) => {
                if i - s >= MIN_RUN {
                    lines.push(String::from_utf8_lossy(&data[s..i]).into_owned());
                    offsets.push(s);
                }
                start = None;
            }
            _ => {}
        }
    }
    if let Some(s) = start {
        if data.len() - s >= MIN_RUN {
            lines.push(String::from_utf8_lossy(&data[s..]).into_owned());
            offsets.push(s);
        }
    }
    (lines, offsets)
}
