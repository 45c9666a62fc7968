//! Entry parsing orchestration
//!
//! [`parse_entry`] turns one upstream document into a [`ParsedEntry`]:
//! headword attributes, walked sense definitions, and sub-word
//! descriptors for every inflection, variant, cross-reference, run-on,
//! synonym and antonym. Edges are left empty; the resolver fills them
//! from descriptor provenance.
//!
//! Parse defects never abort the entry. Each one is logged and recorded
//! on the output so callers (and tests) can inspect what was skipped.

use crate::audio::pronunciation_url;
use crate::document::{
    tagged_pair, value_kind, CrossReference, DefinedRunOn, Inflection, Pronunciation,
    UndefinedRunOn, Variant,
};
use crate::normalize::{clean_text, coerce_text, strip_homograph_marker, strip_syllable_markers};
use crate::senses::walk_definition_sections;
use lexigraph_core::{
    DefinitionNode, ParsedEntry, SubWordDescriptor, SubWordOrigin, WordNode,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashSet;
use thiserror::Error;
use tracing::{debug, warn};

/// Errors for documents that cannot be treated as an entry at all.
///
/// Shape defects inside an otherwise usable entry are warnings, not
/// errors; a headword-less entry is `Ok(None)`.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("unsupported entry document shape: expected object, found {found}")]
    UnsupportedDocument { found: &'static str },
}

/// Shared state threaded through section extraction and the sense walker.
pub(crate) struct ParseContext {
    pub(crate) word: String,
    pub(crate) language: String,
    pub(crate) source: String,
    /// Cleaned short-definition strings for membership flagging
    pub(crate) short_defs: HashSet<String>,
    /// Recovered defects, mirrored onto the parse output
    pub(crate) warnings: Vec<String>,
    seen_definitions: HashSet<(String, String)>,
}

impl ParseContext {
    pub(crate) fn new(
        word: impl Into<String>,
        language: impl Into<String>,
        source: impl Into<String>,
    ) -> Self {
        Self {
            word: word.into(),
            language: language.into(),
            source: source.into(),
            short_defs: HashSet::new(),
            warnings: Vec::new(),
            seen_definitions: HashSet::new(),
        }
    }

    pub(crate) fn warn(&mut self, message: impl Into<String>) {
        let message = message.into();
        warn!(word = %self.word, source = %self.source, "{message}");
        self.warnings.push(message);
    }

    /// Clean a payload expected to be text, warning on coercion or on a
    /// non-text shape.
    pub(crate) fn clean_field(&mut self, value: &Value, field: &str) -> Option<String> {
        match coerce_text(value) {
            Some(raw) => {
                if !value.is_string() {
                    self.warn(format!("coerced non-string '{field}' payload to text"));
                }
                clean_text(&raw)
            }
            None => {
                if !value.is_null() {
                    self.warn(format!("'{field}' is {}, expected text", value_kind(value)));
                }
                None
            }
        }
    }

    /// Record a (text, part of speech) pair; false when already seen.
    pub(crate) fn first_occurrence(&mut self, text: &str, part_of_speech: &str) -> bool {
        self.seen_definitions
            .insert((text.to_string(), part_of_speech.to_string()))
    }

    /// Decode the items of an array-valued section, skipping malformed
    /// items with a warning.
    fn decode_items<T: DeserializeOwned>(&mut self, parent: &Value, key: &str) -> Vec<T> {
        let Some(value) = parent.get(key) else {
            return Vec::new();
        };
        let Some(items) = value.as_array() else {
            self.warn(format!("'{key}' is {}, expected array", value_kind(value)));
            return Vec::new();
        };
        self.decode_value_items(items, key)
    }

    fn decode_value_items<T: DeserializeOwned>(&mut self, items: &[Value], key: &str) -> Vec<T> {
        items
            .iter()
            .filter_map(|item| match serde_json::from_value::<T>(item.clone()) {
                Ok(decoded) => Some(decoded),
                Err(err) => {
                    self.warn(format!("skipping malformed '{key}' item: {err}"));
                    None
                }
            })
            .collect()
    }
}

/// Parse one upstream entry document into the intermediate graph.
///
/// Returns `Ok(None)` when the document carries no usable headword; the
/// provider answers unknown words with plain suggestion strings, so a
/// string document is the expected no-result shape.
pub fn parse_entry(document: &Value, language: &str) -> Result<Option<ParsedEntry>, ParseError> {
    if document.is_string() {
        debug!("entry document is a suggestion string, no headword");
        return Ok(None);
    }
    if !document.is_object() {
        return Err(ParseError::UnsupportedDocument {
            found: value_kind(document),
        });
    }

    let source_id = document.pointer("/meta/id").and_then(coerce_text);
    let source = document
        .pointer("/meta/src")
        .and_then(coerce_text)
        .unwrap_or_else(|| "unknown".to_string());

    let headword = document
        .pointer("/hwi/hw")
        .and_then(coerce_text)
        .map(|raw| strip_syllable_markers(&raw))
        .and_then(|raw| clean_text(&raw));
    let Some(headword) = headword else {
        debug!(source = %source, "entry without usable headword, skipping");
        return Ok(None);
    };

    let mut ctx = ParseContext::new(headword.clone(), language, source);

    let part_of_speech = document
        .get("fl")
        .and_then(|v| ctx.clean_field(v, "fl"))
        .unwrap_or_default();

    if let Some(items) = document.get("shortdef").and_then(Value::as_array) {
        for item in items {
            if let Some(text) = ctx.clean_field(item, "shortdef") {
                ctx.short_defs.insert(text);
            }
        }
    }

    let mut main = WordNode::new(headword, language);
    main.source_id = source_id;

    if let Some(hwi) = document.get("hwi") {
        for pronunciation in ctx.decode_items::<Pronunciation>(hwi, "prs") {
            if main.phonetic.is_none() {
                main.phonetic = pronunciation.phonetic().map(str::to_string);
            }
            if let Some(sound) = &pronunciation.sound {
                if !sound.reference.is_empty() {
                    main.audio_urls
                        .push(pronunciation_url(&sound.reference, &ctx.language));
                }
            }
        }
    }

    if let Some(et) = document.get("et").and_then(Value::as_array) {
        for token in et {
            if let Some(("text", payload)) = tagged_pair(token) {
                main.etymology = ctx.clean_field(payload, "et");
                break;
            }
        }
    }

    let mut entry = ParsedEntry {
        main,
        ..Default::default()
    };

    match document.get("def") {
        Some(Value::Array(sections)) => {
            walk_definition_sections(&mut ctx, sections, &part_of_speech, &mut entry.definitions);
        }
        Some(other) => ctx.warn(format!("'def' is {}, expected array", value_kind(other))),
        None => {}
    }

    collect_inflections(&mut ctx, &mut entry, document, &part_of_speech);
    collect_variants(&mut ctx, &mut entry, document);
    collect_cross_references(&mut ctx, &mut entry, document, &part_of_speech);
    collect_defined_run_ons(&mut ctx, &mut entry, document);
    collect_undefined_run_ons(&mut ctx, &mut entry, document);
    collect_word_list(&mut ctx, &mut entry, document, "syns", SubWordOrigin::Synonym);
    collect_word_list(&mut ctx, &mut entry, document, "ants", SubWordOrigin::Antonym);

    if !ctx.warnings.is_empty() {
        debug!(
            word = %ctx.word,
            defects = ctx.warnings.len(),
            "entry parsed with recovered defects"
        );
    }
    entry.warnings = ctx.warnings;
    Ok(Some(entry))
}

fn collect_inflections(
    ctx: &mut ParseContext,
    entry: &mut ParsedEntry,
    document: &Value,
    part_of_speech: &str,
) {
    for inflection in ctx.decode_items::<Inflection>(document, "ins") {
        let Some(form) = inflected_form(&inflection) else {
            ctx.warn("inflection without usable form, skipping");
            continue;
        };
        let label = inflection.label.as_deref().and_then(clean_text);
        entry.add_sub_word(SubWordDescriptor::new(
            WordNode::new(form, ctx.language.as_str()),
            SubWordOrigin::Inflection {
                label,
                part_of_speech: Some(part_of_speech.to_string()).filter(|p| !p.is_empty()),
            },
        ));
    }
}

fn inflected_form(inflection: &Inflection) -> Option<String> {
    let raw = inflection.form.as_deref()?;
    clean_text(&strip_syllable_markers(raw))
}

fn collect_variants(ctx: &mut ParseContext, entry: &mut ParsedEntry, document: &Value) {
    for variant in ctx.decode_items::<Variant>(document, "vrs") {
        add_variant(ctx, entry, &variant, None);
    }
}

/// Add one variant sub-word, attached to the main word or (for run-on
/// variants) to the run-on named by `of_run_on`. A variant identical to
/// its base form is dropped.
fn add_variant(
    ctx: &mut ParseContext,
    entry: &mut ParsedEntry,
    variant: &Variant,
    of_run_on: Option<&str>,
) {
    let Some(raw) = variant.va.as_deref() else {
        ctx.warn("variant without form, skipping");
        return;
    };
    let Some(form) = clean_text(&strip_syllable_markers(raw)) else {
        ctx.warn("variant without usable form, skipping");
        return;
    };
    let base = of_run_on.unwrap_or(entry.main.text.as_str());
    if form == base {
        debug!(word = %ctx.word, variant = %form, "variant identical to its base, dropping");
        return;
    }

    let label = variant.vl.as_deref().and_then(clean_text);
    let mut word = WordNode::new(form, ctx.language.as_str());
    word.etymology = label.clone();

    let origin = match of_run_on {
        Some(of) => SubWordOrigin::PhrasalVerbVariant { of: of.to_string() },
        None => SubWordOrigin::Variant { label },
    };
    entry.add_sub_word(SubWordDescriptor::new(word, origin));
}

fn collect_cross_references(
    ctx: &mut ParseContext,
    entry: &mut ParsedEntry,
    document: &Value,
    part_of_speech: &str,
) {
    for cross in ctx.decode_items::<CrossReference>(document, "cxs") {
        let Some(label) = cross.cxl.as_deref().and_then(clean_text) else {
            ctx.warn("cross-reference without label, skipping");
            continue;
        };
        for target in &cross.cxtis {
            let base = target
                .cxt
                .as_deref()
                .and_then(clean_text)
                .map(|t| strip_homograph_marker(&t));
            let Some(base) = base else {
                ctx.warn("cross-reference without target, skipping");
                continue;
            };

            let generated = cross_reference_definition(&label, &base);
            // The generated text doubles as the headword's etymology note.
            entry.main.etymology = Some(generated.clone());
            if ctx.first_occurrence(&generated, part_of_speech) {
                let mut def = DefinitionNode::new(
                    generated,
                    part_of_speech,
                    ctx.language.as_str(),
                    ctx.source.as_str(),
                );
                def.in_short_def = ctx.short_defs.contains(&def.text);
                entry.definitions.push(def);
            }

            entry.add_sub_word(SubWordDescriptor::new(
                WordNode::new(base, ctx.language.as_str()),
                SubWordOrigin::CrossReference {
                    label: label.clone(),
                },
            ));
        }
    }
}

/// `("past tense of", "go")` → `Past tense of "go"`.
fn cross_reference_definition(label: &str, base: &str) -> String {
    let trimmed = label.trim().trim_end_matches(" of").trim_end();
    let mut text = String::with_capacity(trimmed.len() + base.len() + 8);
    let mut chars = trimmed.chars();
    if let Some(first) = chars.next() {
        text.extend(first.to_uppercase());
        text.push_str(chars.as_str());
    }
    text.push_str(" of \"");
    text.push_str(base);
    text.push('"');
    text
}

fn collect_defined_run_ons(ctx: &mut ParseContext, entry: &mut ParsedEntry, document: &Value) {
    for run_on in ctx.decode_items::<DefinedRunOn>(document, "dros") {
        let Some(raw) = run_on.drp.as_deref() else {
            ctx.warn("run-on without phrase, skipping");
            continue;
        };
        let Some(phrase) = clean_text(&strip_syllable_markers(raw)) else {
            ctx.warn("run-on without usable phrase, skipping");
            continue;
        };

        let part_of_speech = run_on.gram.clone().unwrap_or_else(|| "phrase".to_string());
        let origin = if run_on.is_phrasal_verb() {
            SubWordOrigin::PhrasalVerb
        } else {
            SubWordOrigin::Phrase
        };

        let mut descriptor =
            SubWordDescriptor::new(WordNode::new(phrase, ctx.language.as_str()), origin);
        walk_definition_sections(ctx, &run_on.def, &part_of_speech, &mut descriptor.definitions);
        let key = entry.add_sub_word(descriptor);

        if run_on.is_phrasal_verb() {
            for variant in ctx.decode_value_items::<Variant>(&run_on.vrs, "dros variant") {
                add_variant(ctx, entry, &variant, Some(&key));
            }
        }
    }
}

fn collect_undefined_run_ons(ctx: &mut ParseContext, entry: &mut ParsedEntry, document: &Value) {
    for run_on in ctx.decode_items::<UndefinedRunOn>(document, "uros") {
        let Some(raw) = run_on.ure.as_deref() else {
            ctx.warn("undefined run-on without form, skipping");
            continue;
        };
        let Some(form) = clean_text(&strip_syllable_markers(raw)) else {
            ctx.warn("undefined run-on without usable form, skipping");
            continue;
        };

        let mut word = WordNode::new(form, ctx.language.as_str());
        word.etymology = Some(format!("Form of \"{}\"", entry.main.text));
        let key = entry.add_sub_word(SubWordDescriptor::new(word, SubWordOrigin::UndefinedRunOn));

        for inflection in ctx.decode_value_items::<Inflection>(&run_on.ins, "uros inflection") {
            let Some(inflected) = inflected_form(&inflection) else {
                ctx.warn("run-on inflection without usable form, skipping");
                continue;
            };
            let label = inflection.label.as_deref().and_then(clean_text);
            entry.add_sub_word(SubWordDescriptor::new(
                WordNode::new(inflected, ctx.language.as_str()),
                SubWordOrigin::RunOnInflection {
                    label,
                    of: key.clone(),
                    part_of_speech: run_on.fl.clone(),
                },
            ));
        }
    }
}

fn collect_word_list(
    ctx: &mut ParseContext,
    entry: &mut ParsedEntry,
    document: &Value,
    key: &str,
    origin: SubWordOrigin,
) {
    let Some(value) = document.get(key) else {
        return;
    };
    let Some(items) = value.as_array() else {
        ctx.warn(format!("'{key}' is {}, expected array", value_kind(value)));
        return;
    };
    for item in items {
        let Some(text) = ctx.clean_field(item, key) else {
            continue;
        };
        entry.add_sub_word(SubWordDescriptor::new(
            WordNode::new(text, ctx.language.as_str()),
            origin.clone(),
        ));
    }
}
