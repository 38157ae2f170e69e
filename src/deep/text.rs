//! Leaf text scanning.

use crate::candidate::Candidate;
use crate::scanner::Scanner;
use crate::target::Descriptor;

/// Split UTF-8 text into lines and hand them to the match engine. Returns
/// None when the payload is not valid UTF-8 (the strings fallback applies
/// instead).
pub(crate) fn scan_text(
    scanner: &Scanner,
    data: &[u8],
    descriptor: &Descriptor,
) -> Option<Vec<Candidate>> {
    let text = std::str::from_utf8(data).ok()?;
    let lines: Vec<String> = text
        .split('\n')
        .map(|l| l.strip_suffix('\r').unwrap_or(l).to_string())
        .collect();
    let inner = descriptor.derive("RAW", &descriptor.file_type);
    Some(scanner.scan(&inner, &lines))
}
