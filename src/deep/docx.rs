//! Text extraction for Office Open XML documents.
//!
//! A `.docx` is an ordinary zip archive with a well-known member layout, so
//! the container walk already reaches its parts as raw XML. This reader adds
//! the document-level view: it pulls the main part, joins the text runs of
//! each paragraph back into one line and hands the result to the match
//! engine, so a credential split across formatting runs is still seen whole.

use memchr::memmem;
use tracing::{debug, warn};

use crate::candidate::Candidate;
use crate::target::Descriptor;

use super::budget::ByteBudget;
use super::{zip, DeepScanner};

const DOCUMENT_PART: &[u8] = b"word/document.xml";

/// Scan the main document part of an Office Open XML archive. Returns None
/// when the zip carries no such part.
pub(crate) fn decode(
    deep: &DeepScanner,
    data: &[u8],
    descriptor: &Descriptor,
    budget: &mut ByteBudget,
) -> Option<Vec<Candidate>> {
    let entries = zip::parse_central_directory(data)?;
    let entry = entries
        .iter()
        .find(|e| e.name == DOCUMENT_PART && !e.is_encrypted())?;
    if !budget.reserve(entry.uncompressed_size) {
        warn!(
            path = %descriptor.path,
            size = entry.uncompressed_size,
            remaining = budget.remaining(),
            "document part exceeds byte budget"
        );
        return Some(Vec::new());
    }
    let Some(xml) = zip::read_entry(data, entry) else {
        warn!(path = %descriptor.path, "malformed document part");
        return None;
    };
    let lines = paragraph_lines(&xml);
    debug!(path = %descriptor.path, paragraphs = lines.len(), "document text extracted");
    let inner = descriptor.derive("DOCX", "");
    Some(deep.scanner().scan(&inner, &lines))
}

/// One line per `<w:p>` paragraph, text runs concatenated in order.
fn paragraph_lines(xml: &[u8]) -> Vec<String> {
    let close = memmem::Finder::new(b"</w:p>");
    let mut lines = Vec::new();
    let mut start = 0;
    loop {
        let end = match close.find(&xml[start..]) {
            Some(rel) => start + rel,
            None => xml.len(),
        };
        let text = run_text(&xml[start..end]);
        if !text.trim().is_empty() {
            lines.push(text);
        }
        if end == xml.len() {
            return lines;
        }
        start = end + close.needle().len();
    }
}

/// Concatenate the character data of every `<w:t>` element in the slice.
fn run_text(para: &[u8]) -> String {
    let mut out = String::new();
    let mut pos = 0;
    while let Some(rel) = memmem::find(&para[pos..], b"<w:t") {
        let open = pos + rel;
        // not <w:tab/>, <w:tbl>, table rows or cells
        if !matches!(para.get(open + 4), Some(b'>' | b' ')) {
            pos = open + 4;
            continue;
        }
        let Some(gt) = memmem::find(&para[open..], b">").map(|i| open + i) else {
            break;
        };
        pos = gt + 1;
        if para[..gt].ends_with(b"/") {
            continue;
        }
        let Some(close) = memmem::find(&para[pos..], b"</w:t>").map(|i| pos + i) else {
            break;
        };
        out.push_str(&decode_entities(&String::from_utf8_lossy(
            &para[pos..close],
        )));
        pos = close + 6;
    }
    out
}

fn decode_entities(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::builtin::builtin_rules;
    use crate::scanner::Scanner;
    use std::io::{Cursor, Write};
    use std::sync::Arc;
    use ::zip::write::SimpleFileOptions;
    use ::zip::{CompressionMethod, ZipWriter};

    fn document(body_xml: &str) -> Vec<u8> {
        let xml = format!(
            "<?xml version=\"1.0\"?><w:document><w:body>{body_xml}</w:body></w:document>"
        );
        let mut w = ZipWriter::new(Cursor::new(Vec::new()));
        let opts = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        w.start_file("word/document.xml", opts).unwrap();
        w.write_all(xml.as_bytes()).unwrap();
        w.finish().unwrap().into_inner()
    }

    fn deep() -> DeepScanner {
        DeepScanner::new(Arc::new(Scanner::new(builtin_rules()).unwrap()))
    }

    #[test]
    fn paragraph_runs_are_joined() {
        let xml = b"<w:p><w:r><w:t>password = \"Secr</w:t></w:r>\
                    <w:r><w:t>et123!\"</w:t></w:r></w:p>\
                    <w:p><w:r><w:t xml:space=\"preserve\">plain text</w:t></w:r></w:p>";
        let lines = paragraph_lines(xml);
        assert_eq!(
            lines,
            vec!["password = \"Secret123!\"".to_string(), "plain text".to_string()]
        );
    }

    #[test]
    fn tabs_and_entities_are_handled() {
        let xml = b"<w:p><w:r><w:tab/><w:t>key = &quot;abc&amp;def&quot;</w:t></w:r></w:p>";
        assert_eq!(paragraph_lines(xml), vec!["key = \"abc&def\"".to_string()]);
    }

    #[test]
    fn split_runs_still_match() {
        let body = "<w:p><w:r><w:t>password = \"Secr</w:t></w:r>\
                    <w:r><w:t>et123!\"</w:t></w:r></w:p>";
        let data = document(body);
        let d = Descriptor::new("report.docx", ".docx");
        let mut b = ByteBudget::default();
        let out = deep().scan(&data, &d, 2, &mut b);
        assert!(out.iter().any(|c| {
            let ld = &c.line_data_list[0];
            ld.value.as_deref() == Some("Secret123!") && ld.info.contains("|DOCX")
        }));
    }

    #[test]
    fn plain_zip_is_not_a_document() {
        let mut w = ZipWriter::new(Cursor::new(Vec::new()));
        let opts = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
        w.start_file("notes.txt", opts).unwrap();
        w.write_all(b"nothing secret here").unwrap();
        let data = w.finish().unwrap().into_inner();
        let d = Descriptor::new("bundle.zip", ".zip");
        let mut b = ByteBudget::default();
        assert!(decode(&deep(), &data, &d, &mut b).is_none());
    }
}
