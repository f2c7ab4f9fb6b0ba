//! Shallow, remote-precedence merge of two JSON config objects.
//!
//! Keys present only locally are kept, keys present only remotely are added,
//! and on collision the remote value replaces the local one wholesale. Nested
//! objects are never merged recursively.

use crate::models::{ParseCause, Side, SyncError};
use serde_json::{Map, Value as Json};
use std::path::Path;

/// A parsed config file: always a top-level JSON object.
pub type ConfigDocument = Map<String, Json>;

#[derive(Debug, Clone, PartialEq)]
pub enum MergeOutcome {
    Unchanged,
    Merged(ConfigDocument),
}

/// Parse raw file contents as a config object for `side`.
///
/// Whitespace-only input is reported as `Empty`, anything else that is not a
/// JSON object (including bytes that are not UTF-8) as `Malformed`.
pub fn parse_document(raw: &[u8], side: Side, path: &Path) -> Result<ConfigDocument, SyncError> {
    let fail = |cause| SyncError::ConfigParse {
        side,
        path: path.to_path_buf(),
        cause,
    };
    if raw.iter().all(u8::is_ascii_whitespace) {
        return Err(fail(ParseCause::Empty));
    }
    match serde_json::from_slice::<Json>(raw) {
        Ok(Json::Object(map)) => Ok(map),
        Ok(other) => Err(fail(ParseCause::Malformed(format!(
            "top level is {}, expected an object",
            json_kind(&other)
        )))),
        Err(e) => Err(fail(ParseCause::Malformed(e.to_string()))),
    }
}

/// Compare by value (key order is ignored), then union with remote winning.
pub fn merge(local: &ConfigDocument, remote: &ConfigDocument) -> MergeOutcome {
    if local == remote {
        return MergeOutcome::Unchanged;
    }
    let mut result = ConfigDocument::new();
    for (k, v) in local {
        result.insert(k.clone(), v.clone());
    }
    // insert over an existing key keeps the local position
    for (k, v) in remote {
        result.insert(k.clone(), v.clone());
    }
    MergeOutcome::Merged(result)
}

/// Pretty-print a document for writing: two-space indent, trailing newline.
pub fn render(doc: &ConfigDocument) -> String {
    let mut out =
        serde_json::to_string_pretty(doc).expect("string-keyed JSON map always serializes");
    out.push('\n');
    out
}

fn json_kind(v: &Json) -> &'static str {
    match v {
        Json::Null => "null",
        Json::Bool(_) => "a boolean",
        Json::Number(_) => "a number",
        Json::String(_) => "a string",
        Json::Array(_) => "an array",
        Json::Object(_) => "an object",
    }
}
