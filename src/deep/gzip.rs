//! Gzip stream decoding.
//!
//! Single-member streams only; the decompressed size is unknown up front,
//! so decompression reads at most one byte past the remaining budget and
//! aborts when that extra byte arrives. A `.gz` suffix is stripped to
//! derive the inner descriptor's type hint.

use std::io::Read;

use flate2::read::GzDecoder;
use tracing::{debug, warn};

use crate::candidate::Candidate;
use crate::target::Descriptor;

use super::budget::ByteBudget;
use super::DeepScanner;

pub(crate) fn decode(
    deep: &DeepScanner,
    data: &[u8],
    descriptor: &Descriptor,
    depth: usize,
    budget: &mut ByteBudget,
) -> Option<Vec<Candidate>> {
    let limit = budget.remaining();
    let mut payload = Vec::new();
    let mut decoder = GzDecoder::new(data).take(limit.saturating_add(1));
    if let Err(err) = decoder.read_to_end(&mut payload) {
        debug!(path = %descriptor.path, %err, "gzip decode failed");
        return None;
    }
    if payload.len() as u64 > limit {
        warn!(
            path = %descriptor.path,
            remaining = limit,
            "gzip payload exceeds byte budget"
        );
        return Some(Vec::new());
    }
    // reserve cannot fail here, the length was capped above
    budget.reserve(payload.len() as u64);
    let inner_name = inner_name(&descriptor.path);
    let inner = descriptor.derive("GZIP", &Descriptor::extension_of(&inner_name));
    Some(deep.scan(&payload, &inner, depth - 1, budget))
}

/// Logical name of the decompressed payload: the path without its `.gz`.
fn inner_name(path: &str) -> String {
    path.strip_suffix(".gz").unwrap_or(path).to_string()
}
