//! Cheap content identification for the decoder registry.
//!
//! Magic-number checks only look at fixed byte prefixes (or the ustar
//! signature at its fixed offset); nothing here parses a container. The
//! registry in the parent module combines these predicates with the
//! declared file extension to pick deep and fallback decoders.

/// Container/compression formats recognized by magic number.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Format {
    Zip,
    Gzip,
    Tar,
    Pdf,
}

/// First matching format, checked in fixed order.
pub fn detect(data: &[u8]) -> Option<Format> {
    if is_zip(data) {
        Some(Format::Zip)
    } else if is_gzip(data) {
        Some(Format::Gzip)
    } else if is_tar(data) {
        Some(Format::Tar)
    } else if is_pdf(data) {
        Some(Format::Pdf)
    } else {
        None
    }
}

pub fn is_zip(data: &[u8]) -> bool {
    data.starts_with(b"PK\x03\x04") || data.starts_with(b"PK\x05\x06")
}

pub fn is_gzip(data: &[u8]) -> bool {
    data.starts_with(&[0x1f, 0x8b])
}

pub fn is_tar(data: &[u8]) -> bool {
    data.len() > 262 && &data[257..262] == b"ustar"
}

pub fn is_pdf(data: &[u8]) -> bool {
    data.starts_with(b"%PDF-")
}

/// True when the payload plausibly starts a JSON document.
pub fn looks_like_json(data: &[u8]) -> bool {
    data.iter()
        .find(|b| !b.is_ascii_whitespace())
        .is_some_and(|b| matches!(b, b'{' | b'['))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn magic_prefixes() {
        assert_eq!(detect(b"PK\x03\x04rest"), Some(Format::Zip));
        assert_eq!(detect(&[0x1f, 0x8b, 0x08]), Some(Format::Gzip));
        assert_eq!(detect(b"%PDF-1.7"), Some(Format::Pdf));
        assert_eq!(detect(b"plain text"), None);
    }

    #[test]
    fn tar_signature_at_offset() {
        let mut block = vec![0u8; 512];
        block[257..262].copy_from_slice(b"ustar");
        assert_eq!(detect(&block), Some(Format::Tar));
        assert_eq!(detect(&block[..262]), None);
    }

    #[test]
    fn json_sniff_skips_whitespace() {
        assert!(looks_like_json(b"  {\"a\": 1}"));
        assert!(looks_like_json(b"[1, 2]"));
        assert!(!looks_like_json(b"key = 1"));
    }
}
