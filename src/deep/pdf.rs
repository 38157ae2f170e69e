//! Stream extraction for PDF payloads.
//!
//! Credentials in a PDF sit inside its content streams, most often
//! Flate-compressed. Rather than parse the object graph, this reader walks
//! every `stream`..`endstream` section: zlib bodies are inflated and the
//! result recursed into, anything else (uncompressed text streams, embedded
//! files) is recursed into as-is. Every payload is charged to the byte
//! budget before recursion. Returns None when the file carries no stream at
//! all, so the printable-string leaf still applies.

use std::io::Read;

use flate2::read::ZlibDecoder;
use memchr::memmem;
use tracing::{debug, warn};

use crate::candidate::Candidate;
use crate::target::Descriptor;

use super::budget::{ByteBudget, MIN_DATA_LEN};
use super::DeepScanner;

const STREAM: &[u8] = b"stream";
const ENDSTREAM: &[u8] = b"endstream";

pub(crate) fn decode(
    deep: &DeepScanner,
    data: &[u8],
    descriptor: &Descriptor,
    depth: usize,
    budget: &mut ByteBudget,
) -> Option<Vec<Candidate>> {
    let open = memmem::Finder::new(STREAM);
    let close = memmem::Finder::new(ENDSTREAM);
    let mut out = Vec::new();
    let mut streams = 0usize;
    let mut pos = 0;
    while let Some(rel) = open.find(&data[pos..]) {
        let at = pos + rel;
        // the finder also lands on the tail of "endstream"
        if at >= 3 && &data[at - 3..at] == b"end" {
            pos = at + STREAM.len();
            continue;
        }
        let mut body = at + STREAM.len();
        if data.get(body) == Some(&b'\r') {
            body += 1;
        }
        if data.get(body) == Some(&b'\n') {
            body += 1;
        }
        let Some(end) = close.find(&data[body..]).map(|i| body + i) else {
            break;
        };
        pos = end + ENDSTREAM.len();
        let mut raw = &data[body..end];
        while matches!(raw.last(), Some(b'\r' | b'\n')) {
            raw = &raw[..raw.len() - 1];
        }
        if raw.len() < MIN_DATA_LEN {
            continue;
        }
        streams += 1;
        let inner = descriptor.derive(&format!("PDF:{streams}"), "");
        let limit = budget.remaining();
        match inflate(raw, limit) {
            Some(payload) if payload.len() as u64 > limit => {
                warn!(
                    path = %descriptor.path,
                    stream = streams,
                    remaining = limit,
                    "pdf stream exceeds byte budget"
                );
            }
            Some(payload) => {
                if budget.reserve(payload.len() as u64) {
                    out.extend(deep.scan(&payload, &inner, depth - 1, budget));
                }
            }
            None => {
                // not Flate; scan the stream bytes as they are
                if budget.reserve(raw.len() as u64) {
                    out.extend(deep.scan(raw, &inner, depth - 1, budget));
                } else {
                    warn!(
                        path = %descriptor.path,
                        stream = streams,
                        size = raw.len(),
                        remaining = budget.remaining(),
                        "pdf stream exceeds byte budget"
                    );
                }
            }
        }
    }
    if streams == 0 {
        return None;
    }
    debug!(path = %descriptor.path, streams, "pdf streams scanned");
    Some(out)
}

fn inflate(raw: &[u8], limit: u64) -> Option<Vec<u8>> {
    let mut decoder = ZlibDecoder::new(raw).take(limit.saturating_add(1));
    let mut payload = Vec::new();
    decoder.read_to_end(&mut payload).ok()?;
    Some(payload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::builtin::builtin_rules;
    use crate::scanner::Scanner;
    use flate2::write::ZlibEncoder;
    use flate2::Compression;
    use std::io::Write;
    use std::sync::Arc;

    fn deep() -> DeepScanner {
        DeepScanner::new(Arc::new(Scanner::new(builtin_rules()).unwrap()))
    }

    fn pdf_with_stream(body: &[u8]) -> Vec<u8> {
        let mut data = Vec::new();
        data.extend_from_slice(b"%PDF-1.7\n1 0 obj\n<</Filter /FlateDecode>>\nstream\n");
        data.extend_from_slice(body);
        data.extend_from_slice(b"\nendstream\nendobj\ntrailer\n%%EOF\n");
        data
    }

    #[test]
    fn flate_content_stream_is_inflated_and_scanned() {
        let mut enc = ZlibEncoder::new(Vec::new(), Compression::default());
        enc.write_all(b"BT (password = \"Secret123!\") Tj ET\n").unwrap();
        let data = pdf_with_stream(&enc.finish().unwrap());
        let d = Descriptor::new("doc.pdf", ".pdf");
        let mut b = ByteBudget::default();
        let out = deep().scan(&data, &d, 2, &mut b);
        assert!(out.iter().any(|c| {
            let ld = &c.line_data_list[0];
            ld.value.as_deref() == Some("Secret123!") && ld.info.contains("|PDF:1")
        }));
    }

    #[test]
    fn plain_stream_is_scanned_as_is() {
        let data = pdf_with_stream(b"api_key = \"RealOne42\"");
        let d = Descriptor::new("doc.pdf", ".pdf");
        let mut b = ByteBudget::default();
        let out = deep().scan(&data, &d, 2, &mut b);
        assert!(out.iter().any(|c| {
            let ld = &c.line_data_list[0];
            ld.value.as_deref() == Some("RealOne42") && ld.info.contains("|PDF:1")
        }));
    }

    #[test]
    fn pdf_without_streams_is_not_applicable() {
        let d = Descriptor::new("doc.pdf", ".pdf");
        let mut b = ByteBudget::default();
        assert!(decode(
            &deep(),
            b"%PDF-1.7\n1 0 obj\n<</Type /Catalog>>\nendobj\n%%EOF\n",
            &d,
            2,
            &mut b
        )
        .is_none());
    }

    #[test]
    fn oversized_stream_is_skipped() {
        let mut enc = ZlibEncoder::new(Vec::new(), Compression::default());
        enc.write_all(&vec![b'a'; 64 * 1024]).unwrap();
        let data = pdf_with_stream(&enc.finish().unwrap());
        let d = Descriptor::new("doc.pdf", ".pdf");
        let mut b = ByteBudget::new(1024);
        assert!(decode(&deep(), &data, &d, 2, &mut b).unwrap().is_empty());
        assert_eq!(b.remaining(), 1024);
    }
}
