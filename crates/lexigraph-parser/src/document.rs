//! Upstream entry document model
//!
//! One entry arrives as a JSON object in the provider's tagged-array
//! dialect. The regular list items below deserialize with serde; the
//! irregular parts (the sense tree, token lists) stay as `serde_json::Value`
//! and are walked manually so one malformed node degrades to a warning
//! instead of failing the entry.

use serde::Deserialize;
use serde_json::Value;

/// `hwi.prs[]` item: one pronunciation.
#[derive(Debug, Clone, Deserialize)]
pub struct Pronunciation {
    /// Provider's own phonetic alphabet spelling
    pub mw: Option<String>,
    /// IPA spelling when present
    pub ipa: Option<String>,
    pub sound: Option<SoundReference>,
}

impl Pronunciation {
    /// Preferred phonetic text: IPA first, provider spelling second.
    pub fn phonetic(&self) -> Option<&str> {
        self.ipa.as_deref().or(self.mw.as_deref())
    }
}

/// `sound` payload within a pronunciation.
#[derive(Debug, Clone, Deserialize)]
pub struct SoundReference {
    #[serde(rename = "ref")]
    pub reference: String,
}

/// `ins[]` item: one inflected form.
#[derive(Debug, Clone, Deserialize)]
pub struct Inflection {
    /// Inflected surface form, with syllable markers
    #[serde(rename = "if")]
    pub form: Option<String>,
    /// Explicit inflection label, e.g. "plural"
    #[serde(rename = "il")]
    pub label: Option<String>,
}

/// `cxs[]` item: one cross-reference block.
#[derive(Debug, Clone, Deserialize)]
pub struct CrossReference {
    /// Label, e.g. "past tense of"
    pub cxl: Option<String>,
    /// Referenced base forms
    #[serde(default)]
    pub cxtis: Vec<CrossReferenceTarget>,
}

/// One target within a cross-reference block.
#[derive(Debug, Clone, Deserialize)]
pub struct CrossReferenceTarget {
    /// Base form text, possibly with a homograph marker
    pub cxt: Option<String>,
}

/// `vrs[]` item: one variant spelling.
#[derive(Debug, Clone, Deserialize)]
pub struct Variant {
    /// Variant form, with syllable markers
    pub va: Option<String>,
    /// Variant label, e.g. "or less commonly"
    pub vl: Option<String>,
}

/// `dros[]` item: one defined (idiomatic) run-on.
#[derive(Debug, Clone, Deserialize)]
pub struct DefinedRunOn {
    /// Run-on phrase
    pub drp: Option<String>,
    /// Grammatical tag; "phrasal verb" marks phrasal verbs
    pub gram: Option<String>,
    /// Surface variants of the run-on
    #[serde(default)]
    pub vrs: Vec<Value>,
    /// Sense tree sections for the run-on's own definitions
    #[serde(default)]
    pub def: Vec<Value>,
}

impl DefinedRunOn {
    pub fn is_phrasal_verb(&self) -> bool {
        self.gram.as_deref() == Some("phrasal verb")
    }
}

/// `uros[]` item: one undefined run-on.
#[derive(Debug, Clone, Deserialize)]
pub struct UndefinedRunOn {
    /// Run-on form, with syllable markers
    pub ure: Option<String>,
    /// Part of speech of the run-on
    pub fl: Option<String>,
    /// Inflections of the run-on
    #[serde(default)]
    pub ins: Vec<Value>,
}

/// Split a `[tag, payload]` token pair.
///
/// Returns `None` for anything that is not a two-element array with a
/// string tag; the caller records the defect.
pub fn tagged_pair(value: &Value) -> Option<(&str, &Value)> {
    let pair = value.as_array()?;
    let tag = pair.first()?.as_str()?;
    let payload = pair.get(1)?;
    Some((tag, payload))
}

/// Human-readable JSON type name for diagnostics.
pub fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
