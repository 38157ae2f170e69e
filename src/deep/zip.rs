//! Safe in-memory Zip32 reader.
//!
//! # Invariants
//! - All sizes/offsets are untrusted and validated against the slice length.
//! - An entry's uncompressed size is reserved from the byte budget before
//!   any decompression happens; an entry that would overrun is skipped and
//!   its siblings still run.
//!
//! # Supported
//! - Zip32 (EOCD + central directory).
//! - Entries: stored (method 0) and deflate (method 8).
//! - Encrypted entries are skipped (flag bit 0).
//!
//! # Not Supported
//! - Zip64 (sentinel 0xFFFF/0xFFFFFFFF fields), multi-disk archives.

use std::io::Read;

use flate2::read::DeflateDecoder;
use tracing::{debug, warn};

use crate::candidate::Candidate;
use crate::target::Descriptor;

use super::budget::ByteBudget;
use super::DeepScanner;

const SIG_EOCD: u32 = 0x0605_4b50;
const SIG_CDFH: u32 = 0x0201_4b50;
const SIG_LFH: u32 = 0x0403_4b50;

const EOCD_MIN_LEN: usize = 22;
const EOCD_SEARCH_MAX: usize = 66 * 1024; // 64 KiB comment + header margin
const CDFH_LEN: usize = 46;
const LFH_LEN: usize = 30;

pub(super) struct Entry<'a> {
    pub(super) name: &'a [u8],
    flags: u16,
    method: u16,
    compressed_size: u64,
    pub(super) uncompressed_size: u64,
    local_header_offset: u64,
}

impl Entry<'_> {
    #[inline(always)]
    pub(super) fn is_encrypted(&self) -> bool {
        (self.flags & 0x0001) != 0
    }

    #[inline(always)]
    fn is_dir(&self) -> bool {
        self.name.ends_with(b"/")
    }
}

/// Walk every member of the archive, recursing into each under the budget.
/// Returns None when the bytes are not a readable Zip32 archive.
pub(crate) fn decode(
    deep: &DeepScanner,
    data: &[u8],
    descriptor: &Descriptor,
    depth: usize,
    budget: &mut ByteBudget,
) -> Option<Vec<Candidate>> {
    let entries = parse_central_directory(data)?;
    let mut out = Vec::new();
    for entry in &entries {
        let name = String::from_utf8_lossy(entry.name).into_owned();
        if entry.is_dir() {
            continue;
        }
        if entry.is_encrypted() {
            debug!(path = %descriptor.path, entry = %name, "skipping encrypted zip entry");
            continue;
        }
        if !matches!(entry.method, 0 | 8) {
            debug!(
                path = %descriptor.path,
                entry = %name,
                method = entry.method,
                "unsupported zip compression method"
            );
            continue;
        }
        if !budget.reserve(entry.uncompressed_size) {
            warn!(
                path = %descriptor.path,
                entry = %name,
                size = entry.uncompressed_size,
                remaining = budget.remaining(),
                "zip entry exceeds byte budget"
            );
            continue;
        }
        let Some(payload) = read_entry(data, entry) else {
            warn!(path = %descriptor.path, entry = %name, "malformed zip entry");
            continue;
        };
        let inner = descriptor.derive(&format!("ZIP:{name}"), &Descriptor::extension_of(&name));
        out.extend(deep.scan(&payload, &inner, depth - 1, budget));
    }
    Some(out)
}

pub(super) fn parse_central_directory(data: &[u8]) -> Option<Vec<Entry<'_>>> {
    if data.len() < EOCD_MIN_LEN {
        return None;
    }
    let search_from = data.len().saturating_sub(EOCD_SEARCH_MAX);
    let eocd = search_from + rfind_sig(&data[search_from..], SIG_EOCD)?;
    let tail = &data[eocd..];
    if tail.len() < EOCD_MIN_LEN {
        return None;
    }
    let total = le_u16(&tail[10..12]);
    let cd_offset = le_u32(&tail[16..20]);
    if total == u16::MAX || cd_offset == u32::MAX {
        // Zip64 sentinel values.
        return None;
    }

    let mut pos = cd_offset as usize;
    let mut entries = Vec::with_capacity(total as usize);
    for _ in 0..total {
        if pos + CDFH_LEN > data.len() || le_u32(&data[pos..pos + 4]) != SIG_CDFH {
            return None;
        }
        let h = &data[pos..pos + CDFH_LEN];
        let name_len = le_u16(&h[28..30]) as usize;
        let extra_len = le_u16(&h[30..32]) as usize;
        let comment_len = le_u16(&h[32..34]) as usize;
        let name_end = pos + CDFH_LEN + name_len;
        if name_end > data.len() {
            return None;
        }
        entries.push(Entry {
            name: &data[pos + CDFH_LEN..name_end],
            flags: le_u16(&h[8..10]),
            method: le_u16(&h[10..12]),
            compressed_size: le_u32(&h[20..24]) as u64,
            uncompressed_size: le_u32(&h[24..28]) as u64,
            local_header_offset: le_u32(&h[42..46]) as u64,
        });
        pos = name_end + extra_len + comment_len;
    }
    Some(entries)
}

pub(super) fn read_entry(data: &[u8], entry: &Entry<'_>) -> Option<Vec<u8>> {
    let lfh = usize::try_from(entry.local_header_offset).ok()?;
    if lfh + LFH_LEN > data.len() || le_u32(&data[lfh..lfh + 4]) != SIG_LFH {
        return None;
    }
    let name_len = le_u16(&data[lfh + 26..lfh + 28]) as usize;
    let extra_len = le_u16(&data[lfh + 28..lfh + 30]) as usize;
    let start = lfh + LFH_LEN + name_len + extra_len;
    let compressed = usize::try_from(entry.compressed_size).ok()?;
    let end = start.checked_add(compressed)?;
    if end > data.len() {
        return None;
    }
    let raw = &data[start..end];
    match entry.method {
        0 => Some(raw.to_vec()),
        8 => {
            let limit = entry.uncompressed_size;
            let mut decoder = DeflateDecoder::new(raw).take(limit);
            let mut payload = Vec::with_capacity(limit.min(1 << 20) as usize);
            decoder.read_to_end(&mut payload).ok()?;
            Some(payload)
        }
        _ => None,
    }
}

fn rfind_sig(hay: &[u8], sig: u32) -> Option<usize> {
    let needle = sig.to_le_bytes();
    if hay.len() < 4 {
        return None;
    }
    (0..=hay.len() - 4).rev().find(|&i| hay[i..i + 4] == needle)
}

#[inline(always)]
fn le_u16(b: &[u8]) -> u16 {
    u16::from_le_bytes([b[0], b[1]])
}

#[inline(always)]
fn le_u32(b: &[u8]) -> u32 {
    u32::from_le_bytes([b[0], b[1], b[2], b[3]])
}
