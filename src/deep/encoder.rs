//! Whole-payload base64 decoding.
//!
//! Text that is one base64 blob (possibly wrapped, whitespace-injected or
//! escape-littered) decodes into a sub-payload that recurses like any other
//! container layer. The URL-safe alphabet is detected by the presence of
//! `-`/`_`; padding is accepted but not required.

use base64::alphabet;
use base64::engine::{DecodePaddingMode, Engine, GeneralPurpose, GeneralPurposeConfig};
use tracing::debug;

use crate::candidate::Candidate;
use crate::target::Descriptor;

use super::budget::ByteBudget;
use super::DeepScanner;

/// Shortest encoded text worth decoding.
pub const MIN_ENCODED_LEN: usize = 12;

pub(crate) fn decode(
    deep: &DeepScanner,
    data: &[u8],
    descriptor: &Descriptor,
    depth: usize,
    budget: &mut ByteBudget,
) -> Option<Vec<Candidate>> {
    let cleaned = strip_noise(data)?;
    if cleaned.len() < MIN_ENCODED_LEN {
        return None;
    }
    let urlsafe = cleaned.iter().any(|&b| b == b'-' || b == b'_');
    let engine = GeneralPurpose::new(
        if urlsafe {
            &alphabet::URL_SAFE
        } else {
            &alphabet::STANDARD
        },
        GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
    );
    let payload = match engine.decode(&cleaned) {
        Ok(p) => p,
        Err(err) => {
            debug!(path = %descriptor.path, %err, "base64 decode failed");
            return None;
        }
    };
    if !budget.reserve(payload.len() as u64) {
        debug!(
            path = %descriptor.path,
            size = payload.len(),
            remaining = budget.remaining(),
            "base64 payload exceeds byte budget"
        );
        return Some(Vec::new());
    }
    Some(deep.scan(&payload, &descriptor.derive("BASE64", ""), depth - 1, budget))
}

/// Drop whitespace and backslash escapes; None when any remaining byte can
/// belong to neither base64 alphabet. An escape sequence (`\n`, `\r`, `\t`)
/// is consumed whole so its letter never leaks into the decoded stream.
fn strip_noise(data: &[u8]) -> Option<Vec<u8>> {
    let mut out = Vec::with_capacity(data.len());
    let mut i = 0;
    while i < data.len() {
        match data[i] {
            b' ' | b'\t' | b'\r' | b'\n' => i += 1,
            b'\\' => {
                if matches!(data.get(i + 1), Some(b'n' | b'r' | b't')) {
                    i += 2;
                } else {
                    i += 1;
                }
            }
            b @ (b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'+' | b'/' | b'-' | b'_' | b'=') => {
                out.push(b);
                i += 1;
            }
            _ => return None,
        }
    }
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn noise_stripping() {
        assert_eq!(
            strip_noise(b"QVBJX0tF\\nWT1hYmMxMjM=\n").unwrap(),
            b"QVBJX0tFWT1hYmMxMjM="
        );
        assert_eq!(
            strip_noise(b"QVBJ\\r\\nX0tF\\tWT1h\\YmMxMjM=").unwrap(),
            b"QVBJX0tFWT1hYmMxMjM="
        );
        assert!(strip_noise(b"not base64!").is_none());
    }

    #[test]
    fn urlsafe_detection_and_decode() {
        let engine = GeneralPurpose::new(
            &alphabet::URL_SAFE,
            GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
        );
        assert!(engine.decode(b"YWJjP2/fcg" as &[u8]).is_err());
        assert!(engine.decode(b"YWJjP2_fcg" as &[u8]).is_ok());
    }
}
