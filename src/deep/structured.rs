//! Field-by-field scanning of parsed structured data.
//!
//! # Algorithm
//! JSON and TOML documents parse into a common `StructValue` tree which is
//! walked one level per recursion step:
//! - nested maps and multi-element lists recurse with a `|STRUCT:key` tag;
//! - byte and string fields recurse as fresh sub-payloads (`|BYTES:key`,
//!   `|STRING:key`), charged against the byte budget;
//! - single-element lists are flattened to their element, matching YAML-ish
//!   configs where each value sits alone on a nested line;
//! - scalar fields whose name contains a configured keyword are
//!   re-serialized as a synthetic `name = "value"; ` line and run through
//!   the keyword rules, catching values with no recognizable shape;
//! - a `{"key": K, "value": V}` map is additionally rewritten as the line
//!   `K = "V"` for the same reason.

use tracing::debug;

use crate::candidate::{augment_candidates, Candidate};
use crate::target::Descriptor;

use super::budget::ByteBudget;
use super::DeepScanner;

/// Parsed structured data, format-independent.
#[derive(Clone, Debug, PartialEq)]
pub enum StructValue {
    Null,
    Bool(bool),
    Number(String),
    Str(String),
    Bytes(Vec<u8>),
    List(Vec<StructValue>),
    Map(Vec<(String, StructValue)>),
}

pub(crate) fn decode_json(
    deep: &DeepScanner,
    data: &[u8],
    descriptor: &Descriptor,
    depth: usize,
    budget: &mut ByteBudget,
) -> Option<Vec<Candidate>> {
    let parsed: serde_json::Value = match serde_json::from_slice(data) {
        Ok(v) => v,
        Err(err) => {
            debug!(path = %descriptor.path, %err, "json parse failed");
            return None;
        }
    };
    Some(walk(deep, &from_json(parsed), descriptor, depth, budget))
}

pub(crate) fn decode_toml(
    deep: &DeepScanner,
    data: &[u8],
    descriptor: &Descriptor,
    depth: usize,
    budget: &mut ByteBudget,
) -> Option<Vec<Candidate>> {
    let text = std::str::from_utf8(data).ok()?;
    let parsed: toml::Value = match toml::from_str(text) {
        Ok(v) => v,
        Err(err) => {
            debug!(path = %descriptor.path, %err, "toml parse failed");
            return None;
        }
    };
    Some(walk(deep, &from_toml(parsed), descriptor, depth, budget))
}

fn from_json(value: serde_json::Value) -> StructValue {
    match value {
        serde_json::Value::Null => StructValue::Null,
        serde_json::Value::Bool(b) => StructValue::Bool(b),
        serde_json::Value::Number(n) => StructValue::Number(n.to_string()),
        serde_json::Value::String(s) => StructValue::Str(s),
        serde_json::Value::Array(items) => {
            StructValue::List(items.into_iter().map(from_json).collect())
        }
        serde_json::Value::Object(map) => {
            StructValue::Map(map.into_iter().map(|(k, v)| (k, from_json(v))).collect())
        }
    }
}

fn from_toml(value: toml::Value) -> StructValue {
    match value {
        toml::Value::String(s) => StructValue::Str(s),
        toml::Value::Integer(n) => StructValue::Number(n.to_string()),
        toml::Value::Float(n) => StructValue::Number(n.to_string()),
        toml::Value::Boolean(b) => StructValue::Bool(b),
        toml::Value::Datetime(d) => StructValue::Number(d.to_string()),
        toml::Value::Array(items) => {
            StructValue::List(items.into_iter().map(from_toml).collect())
        }
        toml::Value::Table(map) => {
            StructValue::Map(map.into_iter().map(|(k, v)| (k, from_toml(v))).collect())
        }
    }
}

/// One level of the structure walk. `depth` gates nesting exactly like the
/// byte-payload recursion it mirrors.
pub(crate) fn walk(
    deep: &DeepScanner,
    value: &StructValue,
    descriptor: &Descriptor,
    depth: usize,
    budget: &mut ByteBudget,
) -> Vec<Candidate> {
    let mut out = Vec::new();
    if depth == 0 {
        return out;
    }

    let items: Vec<(String, &StructValue)> = match value {
        StructValue::Map(pairs) => pairs
            .iter()
            .map(|(k, v)| (k.clone(), flatten_single(v)))
            .collect(),
        StructValue::List(items) => items
            .iter()
            .enumerate()
            .map(|(i, v)| (i.to_string(), flatten_single(v)))
            .collect(),
        _ => Vec::new(),
    };

    let mut keyword_line = String::new();
    for (key, item) in &items {
        match item {
            StructValue::Map(_) => {
                let inner = descriptor.derive(&format!("STRUCT:{key}"), &descriptor.file_type);
                out.extend(walk(deep, item, &inner, depth - 1, budget));
            }
            StructValue::List(list) if list.len() > 1 => {
                let inner = descriptor.derive(&format!("STRUCT:{key}"), &descriptor.file_type);
                out.extend(walk(deep, item, &inner, depth - 1, budget));
            }
            StructValue::List(_) => {}
            StructValue::Bytes(bytes) => {
                if budget.reserve(bytes.len() as u64) {
                    let inner =
                        descriptor.derive(&format!("BYTES:{key}"), &descriptor.file_type);
                    out.extend(deep.scan(bytes, &inner, depth - 1, budget));
                }
            }
            StructValue::Str(s) => {
                if budget.reserve(s.len() as u64) {
                    let inner =
                        descriptor.derive(&format!("STRING:{key}"), &descriptor.file_type);
                    out.extend(deep.scan(s.as_bytes(), &inner, depth - 1, budget));
                }
                if deep.scanner().keyword_hint(key) {
                    keyword_line.push_str(&format!("{key} = \"{s}\"; "));
                }
            }
            StructValue::Number(n) => {
                if deep.scanner().keyword_hint(key) {
                    keyword_line.push_str(&format!("{key} = \"{n}\"; "));
                }
            }
            StructValue::Bool(_) | StructValue::Null => {}
        }
    }

    if !keyword_line.is_empty() {
        let inner = descriptor.derive(&format!("KEYWORD:`{keyword_line}`"), ".toml");
        let lines = vec![keyword_line];
        augment_candidates(&mut out, deep.scanner().scan(&inner, &lines));
    }

    // {"key": "api_key", "value": "XXXX"} style records.
    if let StructValue::Map(pairs) = value {
        let field = |name: &str| {
            pairs.iter().find_map(|(k, v)| match v {
                StructValue::Str(s) if k == name => Some(s.as_str()),
                _ => None,
            })
        };
        if let (Some(k), Some(v)) = (field("key"), field("value")) {
            let line = format!("{k} = \"{v}\"");
            let inner = descriptor.derive(&format!("KEY_VALUE:`{line}`"), ".toml");
            let lines = vec![line];
            augment_candidates(&mut out, deep.scanner().scan(&inner, &lines));
        }
    }

    out
}

fn flatten_single(value: &StructValue) -> &StructValue {
    match value {
        StructValue::List(items) if items.len() == 1 => &items[0],
        other => other,
    }
}
