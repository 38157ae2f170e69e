//! Hand-built matcher for the keyword grammar.
//!
//! # Scope
//! Recognizes, around a configured keyword: a variable-name run (optionally
//! quoted or URL/escape-prefixed), a separator from a broad token table, an
//! optional wrapping construct (`new Foo(`, `[`, `{`, up to 8 nested opens),
//! an optional string-literal prefix, a quoted or unquoted value run, and a
//! closing quote symmetric to the opening one.
//!
//! # Invariants
//! - All spans are byte ranges into the original line and always land on
//!   ASCII stop characters or line ends, so they are valid char boundaries.
//! - The closing quote must repeat the opening token exactly (same escape
//!   backslashes, same quote character, same repetition count); regex
//!   back-references are not available here, so the token is tracked
//!   explicitly.
//! - Matching never backtracks across the separator: the variable-tail
//!   character class excludes every byte a separator token can start with.
//!
//! # Design Notes
//! - The engine is a forward scan with per-occurrence retry: if parsing
//!   fails after one keyword occurrence, the next occurrence is tried.
//! - Byte-wise scanning is safe for UTF-8 because every stop set is pure
//!   ASCII; multi-byte sequences are consumed opaquely.

use std::ops::Range;

/// Minimum accepted value length, in bytes.
pub const MIN_VALUE_LEN: usize = 4;
/// Maximum accepted value length, in bytes.
pub const MAX_VALUE_LEN: usize = 8000;
/// Maximum variable-tail run after the keyword.
const MAX_VARIABLE_TAIL: usize = 80;
/// Maximum nested wrap constructs consumed after the separator.
const MAX_WRAP_DEPTH: usize = 8;
/// Maximum escape-backslash run length recognized anywhere.
const MAX_ESCAPES: usize = 8;

/// Bytes that terminate the variable run to the left of the keyword.
const VAR_LEFT_STOP: &[u8] = b":=\"'`}<>()\\/&?;,% \t";
/// Bytes that terminate the variable tail to the right of the keyword.
const VAR_RIGHT_STOP: &[u8] = b"%:=\"'`<>({?!&;\n \t";
/// Separator tokens, longest first. `:` additionally requires the next byte
/// not to be another `:` (C++ scope operators are not separators).
const SEPARATORS: &[&[u8]] = &[
    b"!==", b"===", b"=&gt;", b"==", b"!=", b"=>", b"=~", b":=", b"%3d", b"%3D", b"=", b":",
];
/// Quote characters accepted around values and variables.
const QUOTES: &[u8] = b"\"'`";
/// HTML-entity spellings of a quote.
const QUOTE_ENTITIES: &[&[u8]] = &[b"&quot;", b"&apos;", b"&#39;", b"&#34;"];
/// Authentication schemes that may precede the credential inside the value
/// position; they are consumed so the value starts at the secret itself.
const AUTH_SCHEMES: &[&[u8]] = &[
    b"oauth", b"bot", b"basic", b"bearer", b"apikey", b"accesskey", b"ssws", b"ntlm",
];
/// String-literal prefixes (Python/C/C# spellings), longest first.
const STRING_PREFIXES: &[&[u8]] = &[
    b"br", b"rb", b"rf", b"fr", b"b", b"r", b"u", b"f", b"l", b"@",
];

/// Spans of one grammar match, relative to the scanned line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeywordHit {
    pub variable: Range<usize>,
    pub separator: Range<usize>,
    pub value: Range<usize>,
}

/// Compiled matcher for one keyword.
#[derive(Clone, Debug)]
pub struct KeywordMatcher {
    keyword: Vec<u8>,
}

impl KeywordMatcher {
    pub fn new(keyword: &str) -> Self {
        Self {
            keyword: keyword.to_ascii_lowercase().into_bytes(),
        }
    }

    pub fn keyword(&self) -> &str {
        // constructed from &str, ascii-lowercased
        std::str::from_utf8(&self.keyword).unwrap_or_default()
    }

    /// Find the first grammar match whose keyword occurrence starts at or
    /// after `from`. Returns None when no occurrence parses.
    pub fn find(&self, line: &str, from: usize) -> Option<KeywordHit> {
        let bytes = line.as_bytes();
        let mut at = from.min(bytes.len());
        while let Some(k_start) = find_ascii_ci(bytes, &self.keyword, at) {
            let k_end = k_start + self.keyword.len();
            if let Some(hit) = parse_occurrence(bytes, k_start, k_end) {
                return Some(hit);
            }
            at = k_start + 1;
        }
        None
    }
}

/// Case-insensitive (ASCII) substring search.
fn find_ascii_ci(hay: &[u8], needle_lower: &[u8], from: usize) -> Option<usize> {
    if needle_lower.is_empty() || hay.len() < needle_lower.len() {
        return None;
    }
    let last = hay.len() - needle_lower.len();
    let mut i = from;
    while i <= last {
        if hay[i].to_ascii_lowercase() == needle_lower[0]
            && hay[i..i + needle_lower.len()]
                .iter()
                .zip(needle_lower)
                .all(|(a, b)| a.to_ascii_lowercase() == *b)
        {
            return Some(i);
        }
        i += 1;
    }
    None
}

/// Attempt a full grammar parse around one keyword occurrence.
fn parse_occurrence(b: &[u8], k_start: usize, k_end: usize) -> Option<KeywordHit> {
    // Variable run to the left of the keyword.
    let mut var_start = k_start;
    while var_start > 0 && !VAR_LEFT_STOP.contains(&b[var_start - 1]) {
        var_start -= 1;
    }

    // Variable tail to the right, bounded.
    let mut j = k_end;
    let tail_limit = (k_end + MAX_VARIABLE_TAIL).min(b.len());
    while j < tail_limit && !VAR_RIGHT_STOP.contains(&b[j]) {
        j += 1;
    }
    let mut var_end = j;
    // Closing quotes or quote entities belong to the variable; the caller's
    // sanitize step strips them from the resolved string.
    loop {
        if j < b.len() && QUOTES.contains(&b[j]) {
            j += 1;
            var_end = j;
        } else if let Some(len) = entity_at(b, j) {
            j += len;
            var_end = j;
        } else {
            break;
        }
    }

    // Whitespace/escapes, optional `]`, more whitespace.
    j = skip_space_and_escapes(b, j);
    if j < b.len() && b[j] == b']' {
        j += 1;
    }
    j = skip_space_and_escapes(b, j);

    // Separator token.
    let (sep_start, sep_end) = match_separator(b, j)?;
    j = skip_space_and_escapes(b, sep_end);

    // Optional wrapping constructs.
    let (after_wrap, wrap_depth) = consume_wrap(b, j);
    j = after_wrap;

    // Optional string-literal prefix directly before a quote.
    if let Some(n) = string_prefix_at(b, j) {
        j += n;
    }

    // Opening quote token (escape backslashes + quote chars, or entity).
    let (after_quote, quote) = open_quote_at(b, j);
    j = after_quote;

    // Optional auth scheme inside the value position.
    j = skip_auth_scheme(b, j);

    let value = match &quote {
        Some(q) => quoted_value(b, j, q)?,
        None => unquoted_value(b, j, wrap_depth)?,
    };
    if value.len() < MIN_VALUE_LEN || value.len() > MAX_VALUE_LEN {
        return None;
    }

    Some(KeywordHit {
        variable: var_start..var_end,
        separator: sep_start..sep_end,
        value,
    })
}

fn entity_at(b: &[u8], at: usize) -> Option<usize> {
    QUOTE_ENTITIES
        .iter()
        .find(|e| b[at.min(b.len())..].starts_with(e))
        .map(|e| e.len())
}

/// Skip whitespace and literal escape sequences (`\t`, `\\n`, ...) of up to
/// `MAX_ESCAPES` backslashes.
fn skip_space_and_escapes(b: &[u8], mut at: usize) -> usize {
    loop {
        if at < b.len() && (b[at] == b' ' || b[at] == b'\t') {
            at += 1;
            continue;
        }
        if at < b.len() && b[at] == b'\\' {
            let mut n = 0;
            while at + n < b.len() && b[at + n] == b'\\' && n < MAX_ESCAPES {
                n += 1;
            }
            if at + n < b.len() && matches!(b[at + n], b't' | b'n' | b'r') {
                at += n + 1;
                continue;
            }
        }
        return at;
    }
}

fn match_separator(b: &[u8], at: usize) -> Option<(usize, usize)> {
    for sep in SEPARATORS {
        if b[at.min(b.len())..].starts_with(sep) {
            if *sep == b":" && b.get(at + 1) == Some(&b':') {
                return None;
            }
            return Some((at, at + sep.len()));
        }
    }
    None
}

/// Consume up to `MAX_WRAP_DEPTH` wrapping constructs: an optional
/// identifier-ish run followed by an opening bracket that is not immediately
/// closed. Returns the position after the last wrap and the open count.
fn consume_wrap(b: &[u8], mut at: usize) -> (usize, usize) {
    let mut depth = 0;
    while depth < MAX_WRAP_DEPTH {
        let snapshot = at;
        let mut p = at;
        // leading type/allocation keywords: `new Secret(`, `byte [`, ...
        let mut lead = 0;
        while lead < MAX_WRAP_DEPTH {
            let kw = [b"new" as &[u8], b"byte", b"char", b"string"]
                .into_iter()
                .find(|kw| {
                    b[p.min(b.len())..].starts_with(kw)
                        && b.get(p + kw.len()).is_some_and(|c| *c == b' ' || *c == b'\t')
                });
            match kw {
                Some(kw) => {
                    p += kw.len();
                    while p < b.len() && (b[p] == b' ' || b[p] == b'\t') {
                        p += 1;
                    }
                    lead += 1;
                }
                None => break,
            }
        }
        // identifier run: names, field paths, `->`, `::`, array types
        while p < b.len() {
            let c = b[p];
            if c.is_ascii_alphanumeric() || matches!(c, b'_' | b'.' | b'$') {
                p += 1;
            } else if c == b':' && b.get(p + 1) == Some(&b':') {
                p += 2;
            } else if c == b'-' && b.get(p + 1) == Some(&b'>') {
                p += 2;
            } else if c == b'[' && b.get(p + 1) == Some(&b']') {
                p += 2;
            } else {
                break;
            }
        }
        while p < b.len() && (b[p] == b' ' || b[p] == b'\t') {
            p += 1;
        }
        let open = match b.get(p) {
            Some(b'(') if b.get(p + 1) != Some(&b')') => true,
            Some(b'[') if b.get(p + 1) != Some(&b']') => true,
            Some(b'{') if b.get(p + 1) != Some(&b'}') => true,
            _ => false,
        };
        if !open {
            return (snapshot, depth);
        }
        p += 1;
        while p < b.len() && (b[p] == b' ' || b[p] == b'\t') {
            p += 1;
        }
        at = p;
        depth += 1;
    }
    (at, depth)
}

fn string_prefix_at(b: &[u8], at: usize) -> Option<usize> {
    for pfx in STRING_PREFIXES {
        let end = at + pfx.len();
        if end <= b.len()
            && b[at..end].eq_ignore_ascii_case(pfx)
            && b.get(end)
                .is_some_and(|c| QUOTES.contains(c) || *c == b'\\')
        {
            return Some(pfx.len());
        }
    }
    None
}

/// Opening-quote token: optional escape backslashes plus a quote character
/// repeated up to 4 times, or an HTML quote entity.
#[derive(Clone, Debug)]
struct QuoteToken {
    /// The exact opening byte sequence; the closing token must repeat it.
    token: Vec<u8>,
}

fn open_quote_at(b: &[u8], at: usize) -> (usize, Option<QuoteToken>) {
    let mut p = at;
    let mut esc = 0;
    while p < b.len() && b[p] == b'\\' && esc < MAX_ESCAPES {
        p += 1;
        esc += 1;
    }
    if p < b.len() && QUOTES.contains(&b[p]) {
        let ch = b[p];
        let mut reps = 0;
        while p < b.len() && b[p] == ch && reps < 4 {
            p += 1;
            reps += 1;
        }
        let token = b[at..p].to_vec();
        return (p, Some(QuoteToken { token }));
    }
    if esc == 0 {
        if let Some(len) = entity_at(b, at) {
            let token = b[at..at + len].to_vec();
            return (at + len, Some(QuoteToken { token }));
        }
    }
    // Backslashes without a quote are left for the value scanner.
    (at, None)
}

fn skip_auth_scheme(b: &[u8], at: usize) -> usize {
    for scheme in AUTH_SCHEMES {
        let end = at + scheme.len();
        if end < b.len() && b[at..end].eq_ignore_ascii_case(scheme) && b[end] == b' ' {
            return end + 1;
        }
    }
    at
}

/// Value bounded by a symmetric closing quote. The closing token must equal
/// the opening byte sequence and not be escaped by an extra backslash.
fn quoted_value(b: &[u8], start: usize, quote: &QuoteToken) -> Option<Range<usize>> {
    let tok = &quote.token;
    let mut i = start;
    while i + tok.len() <= b.len() {
        if b[i..].starts_with(tok) && (i == 0 || b[i - 1] != b'\\' || tok[0] == b'\\') {
            return Some(start..i);
        }
        i += 1;
    }
    // No closing quote on this line: accept a line-continuation backslash or
    // a line ending mid-token (string concatenation across lines).
    if b.last() == Some(&b'\\') {
        return Some(start..b.len());
    }
    if b
        .last()
        .is_some_and(|c| c.is_ascii_alphanumeric() || matches!(c, b'+' | b'_' | b'/' | b'-'))
    {
        return Some(start..b.len());
    }
    None
}

/// Unquoted value: stops at whitespace, quotes, `,`, `;`, a bare backslash,
/// and (inside a wrap) closing brackets; tolerates escape sequences and
/// percent-encoded bytes.
fn unquoted_value(b: &[u8], start: usize, wrap_depth: usize) -> Option<Range<usize>> {
    let mut i = start;
    while i < b.len() {
        let c = b[i];
        if c == b' ' || c == b'\t' || c == b',' || c == b';' || QUOTES.contains(&c) {
            break;
        }
        if wrap_depth > 0 && matches!(c, b')' | b']' | b'}') {
            break;
        }
        if c == b'\\' {
            let mut n = 0;
            while i + n < b.len() && b[i + n] == b'\\' && n < MAX_ESCAPES {
                n += 1;
            }
            match b.get(i + n) {
                Some(e) if !e.is_ascii_whitespace() || matches!(e, b' ') => {
                    i += n + 1;
                    continue;
                }
                _ => break,
            }
        }
        if c == b'%' {
            if i + 2 < b.len()
                && b[i + 1].is_ascii_hexdigit()
                && b[i + 2].is_ascii_hexdigit()
            {
                i += 3;
                continue;
            }
        }
        i += 1;
    }
    if i > start {
        Some(start..i)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hit(line: &str, keyword: &str) -> Option<KeywordHit> {
        KeywordMatcher::new(keyword).find(line, 0)
    }

    fn parts<'l>(line: &'l str, h: &KeywordHit) -> (&'l str, &'l str, &'l str) {
        (
            &line[h.variable.clone()],
            &line[h.separator.clone()],
            &line[h.value.clone()],
        )
    }

    #[test]
    fn plain_assignment() {
        let line = r#"password = "Secret123!""#;
        let h = hit(line, "password").unwrap();
        let (var, sep, val) = parts(line, &h);
        assert_eq!(var, "password");
        assert_eq!(sep, "=");
        assert_eq!(val, "Secret123!");
    }

    #[test]
    fn unquoted_env_style() {
        let line = "API_KEY=abc123xyz";
        let h = hit(line, "api_key").unwrap();
        let (var, sep, val) = parts(line, &h);
        assert_eq!(var, "API_KEY");
        assert_eq!(sep, "=");
        assert_eq!(val, "abc123xyz");
    }

    #[test]
    fn json_colon_separator() {
        let line = r#"  "db_password": "hunter2345","#;
        let h = hit(line, "password").unwrap();
        let (var, sep, val) = parts(line, &h);
        assert_eq!(var, "db_password\"");
        assert_eq!(sep, ":");
        assert_eq!(val, "hunter2345");
    }

    #[test]
    fn symmetric_quotes_required() {
        // Mismatched closing quote: value run continues to the matching one,
        // or fails when none exists and the tail is not continuation-like.
        let line = r#"password = "Secret123!'  "#;
        assert!(hit(line, "password").is_none());
    }

    #[test]
    fn backtick_quotes() {
        let line = "token = `abcd-efgh-9876`;";
        let h = hit(line, "token").unwrap();
        assert_eq!(&line[h.value], "abcd-efgh-9876");
    }

    #[test]
    fn wrap_construct() {
        let line = r#"secret = new Secret("deep_hidden_value")"#;
        let h = hit(line, "secret").unwrap();
        let (var, sep, val) = parts(line, &h);
        assert_eq!(var, "secret");
        assert_eq!(sep, "=");
        assert_eq!(val, "deep_hidden_value");
    }

    #[test]
    fn double_colon_is_not_separator() {
        assert!(hit("secret::rotate()", "secret").is_none());
    }

    #[test]
    fn url_percent_encoded_value() {
        let line = "https://x.io/login?password=p%40ssw0rd%21&next=1";
        let h = hit(line, "password").unwrap();
        assert_eq!(&line[h.value], "p%40ssw0rd%21&next=1");
        // the URL-query cleanup in LineData trims the &next tail
    }

    #[test]
    fn auth_scheme_is_skipped() {
        let line = r#"authorization = "Bearer xyzzy-plugh-4242""#;
        let h = hit(line, "authorization").unwrap();
        assert_eq!(&line[h.value], "xyzzy-plugh-4242");
    }

    #[test]
    fn short_value_rejected() {
        assert!(hit("password = ab", "password").is_none());
    }

    #[test]
    fn string_prefix_and_symmetry() {
        let line = r#"pwd = r"raw\value\str""#;
        let h = hit(line, "pwd").unwrap();
        assert_eq!(&line[h.value], r"raw\value\str");
    }

    #[test]
    fn resume_finds_second_occurrence() {
        let line = r#"password = "first_secret"; password = "second_secret""#;
        let m = KeywordMatcher::new("password");
        let h1 = m.find(line, 0).unwrap();
        assert_eq!(&line[h1.value.clone()], "first_secret");
        let h2 = m.find(line, h1.variable.end + 1).unwrap();
        assert_eq!(&line[h2.value], "second_secret");
    }

    #[test]
    fn keyword_case_insensitive() {
        let line = "PASSWORD: topsecret99";
        let h = hit(line, "password").unwrap();
        assert_eq!(&line[h.value], "topsecret99");
    }

    #[test]
    fn html_entity_quotes() {
        let line = "password = &quot;ent1tyV4lue&quot;";
        let h = hit(line, "password").unwrap();
        assert_eq!(&line[h.value], "ent1tyV4lue");
    }
}
