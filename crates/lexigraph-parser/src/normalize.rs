//! Text normalization for upstream markup
//!
//! The provider embeds brace-delimited tokens in every text field:
//! emphasis markers (`{it}…{/it}`), reference tokens carrying display text
//! (`{sx|dog:1||}`), and bare formatting tokens (`{bc}`, `{ldquo}`).
//! [`clean_text`] reduces a raw field to plain display text in one pass.

use regex::{Captures, Regex};
use serde_json::Value;
use std::sync::LazyLock;

/// Any single brace-delimited token.
static BRACE_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{[^{}]*\}").expect("brace token pattern"));

/// Runs of whitespace, collapsed after token replacement.
static WHITESPACE_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("whitespace pattern"));

/// Trailing homograph marker on a reference target, e.g. `dog:1`.
static HOMOGRAPH_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r":\d+$").expect("homograph pattern"));

/// Emphasis tokens preserved verbatim for downstream rendering.
const EMPHASIS_TOKENS: &[&str] = &[
    "{it}", "{/it}", "{b}", "{/b}", "{inf}", "{/inf}", "{sup}", "{/sup}",
];

/// Reference-style tags whose first field is the display text.
const REFERENCE_TAGS: &[&str] = &["sx", "dxt", "a_link", "d_link", "i_link", "et_link", "mat"];

/// Strip markup from a raw text field.
///
/// Emphasis tokens survive, reference tokens collapse to their display
/// text (homograph marker removed), every other token is deleted.
/// Whitespace is collapsed and trimmed; an all-markup or blank input
/// yields `None`.
pub fn clean_text(raw: &str) -> Option<String> {
    let replaced = BRACE_TOKEN.replace_all(raw, |caps: &Captures| {
        let token = &caps[0];
        if EMPHASIS_TOKENS.contains(&token) {
            return token.to_string();
        }
        let inner = &token[1..token.len() - 1];
        if let Some((tag, fields)) = inner.split_once('|') {
            if REFERENCE_TAGS.contains(&tag) {
                let display = fields.split('|').next().unwrap_or("");
                return HOMOGRAPH_MARKER.replace(display, "").into_owned();
            }
        }
        String::new()
    });

    let collapsed = WHITESPACE_RUN.replace_all(&replaced, " ");
    let trimmed = collapsed.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Remove the `*` syllable markers used in headword and variant fields.
pub fn strip_syllable_markers(raw: &str) -> String {
    raw.replace('*', "")
}

/// Remove a trailing homograph marker (`go:1` → `go`).
pub fn strip_homograph_marker(raw: &str) -> String {
    HOMOGRAPH_MARKER.replace(raw, "").into_owned()
}

/// Coerce a payload expected to be text into a raw string.
///
/// Strings pass through, scalar numbers and booleans stringify, anything
/// else (null, arrays, objects) yields `None`. The caller decides whether
/// a coercion or a `None` is worth a warning.
pub fn coerce_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
