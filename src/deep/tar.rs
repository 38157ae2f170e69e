//! Sequential ustar reader.
//!
//! # Invariants
//! - Header size fields are untrusted octal text; a malformed field stops
//!   the walk rather than guessing an offset.
//! - Only regular-file members recurse; directories, links and extended
//!   headers advance the cursor and are otherwise ignored.
//! - Each member's declared size is reserved from the budget before its
//!   bytes are touched.

use tracing::warn;

use crate::candidate::Candidate;
use crate::target::Descriptor;

use super::budget::ByteBudget;
use super::DeepScanner;

const BLOCK: usize = 512;
const NAME_LEN: usize = 100;
const SIZE_OFF: usize = 124;
const SIZE_LEN: usize = 12;
const TYPE_OFF: usize = 156;
const MAGIC_OFF: usize = 257;

pub(crate) fn decode(
    deep: &DeepScanner,
    data: &[u8],
    descriptor: &Descriptor,
    depth: usize,
    budget: &mut ByteBudget,
) -> Option<Vec<Candidate>> {
    if data.len() < BLOCK || !data[MAGIC_OFF..].starts_with(b"ustar") {
        return None;
    }
    let mut out = Vec::new();
    let mut pos = 0;
    while pos + BLOCK <= data.len() {
        let header = &data[pos..pos + BLOCK];
        if header.iter().all(|&b| b == 0) {
            break;
        }
        if !header[MAGIC_OFF..].starts_with(b"ustar") {
            break;
        }
        let Some(size) = parse_octal(&header[SIZE_OFF..SIZE_OFF + SIZE_LEN]) else {
            warn!(path = %descriptor.path, offset = pos, "malformed tar size field");
            break;
        };
        let body_start = pos + BLOCK;
        let body_end = body_start + size as usize;
        pos = body_start + padded(size as usize);

        // '0' and NUL mark regular files.
        if !matches!(header[TYPE_OFF], b'0' | 0) {
            continue;
        }
        if body_end > data.len() {
            warn!(path = %descriptor.path, "tar member truncated");
            break;
        }
        let name = member_name(header);
        if !budget.reserve(size) {
            warn!(
                path = %descriptor.path,
                member = %name,
                size,
                remaining = budget.remaining(),
                "tar member exceeds byte budget"
            );
            continue;
        }
        let inner = descriptor.derive(&format!("TAR:{name}"), &Descriptor::extension_of(&name));
        out.extend(deep.scan(&data[body_start..body_end], &inner, depth - 1, budget));
    }
    Some(out)
}

fn member_name(header: &[u8]) -> String {
    let raw = &header[..NAME_LEN];
    let end = raw.iter().position(|&b| b == 0).unwrap_or(NAME_LEN);
    String::from_utf8_lossy(&raw[..end]).into_owned()
}

/// Octal size field: digits, optionally NUL/space terminated.
fn parse_octal(field: &[u8]) -> Option<u64> {
    let mut value: u64 = 0;
    let mut seen = false;
    for &b in field {
        match b {
            b'0'..=b'7' => {
                value = value.checked_mul(8)?.checked_add((b - b'0') as u64)?;
                seen = true;
            }
            b' ' | 0 => {
                if seen {
                    break;
                }
            }
            _ => return None,
        }
    }
    seen.then_some(value)
}

fn padded(size: usize) -> usize {
    size.div_ceil(BLOCK) * BLOCK
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tarball(members: &[(&str, &[u8])]) -> Vec<u8> {
        let mut builder = tar::Builder::new(Vec::new());
        for (name, body) in members {
            let mut header = tar::Header::new_ustar();
            header.set_size(body.len() as u64);
            header.set_mode(0o644);
            header.set_cksum();
            builder.append_data(&mut header, name, *body).unwrap();
        }
        builder.into_inner().unwrap()
    }

    #[test]
    fn octal_sizes() {
        assert_eq!(parse_octal(b"0000644\0"), Some(0o644));
        assert_eq!(parse_octal(b"00000000017 "), Some(15));
        assert_eq!(parse_octal(b"xyz"), None);
    }

    #[test]
    fn walks_real_archive_headers() {
        let data = tarball(&[("creds/.env", b"API_KEY=abc123\n"), ("b.txt", b"hi there")]);
        assert!(data[MAGIC_OFF..].starts_with(b"ustar"));
        let first = member_name(&data[..BLOCK]);
        assert_eq!(first, "creds/.env");
        let size = parse_octal(&data[SIZE_OFF..SIZE_OFF + SIZE_LEN]).unwrap();
        assert_eq!(size, 15);
        let second_header = BLOCK + padded(15);
        assert_eq!(member_name(&data[second_header..second_header + BLOCK]), "b.txt");
    }

    #[test]
    fn block_padding() {
        assert_eq!(padded(0), 0);
        assert_eq!(padded(1), BLOCK);
        assert_eq!(padded(BLOCK), BLOCK);
        assert_eq!(padded(BLOCK + 1), 2 * BLOCK);
    }
}
