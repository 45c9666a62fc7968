//! Sense-tree walker
//!
//! A `def` block is a list of sections, each holding sense sequences of
//! `[tag, payload]` tokens. Two pieces of context thread across sibling
//! tokens: `sen` metadata is carried forward and consumed by the next
//! definition-bearing sense, and a `wsgram` token sets the grammatical
//! note applied to every later example in the same sense until the next
//! `wsgram`. The walker folds an explicit accumulator over the token
//! lists so both behaviors are testable against literal fixtures.

use crate::document::{tagged_pair, value_kind};
use crate::entry::ParseContext;
use crate::normalize::{clean_text, coerce_text};
use lexigraph_core::{DefinitionNode, ExampleNode};
use serde_json::Value;
use std::mem;
use tracing::debug;

/// Metadata carried from a `sen` token to the next sense.
#[derive(Debug, Default, Clone)]
struct SenseCarry {
    subject_status: Option<String>,
    labels: Option<String>,
    grammatical_note: Option<String>,
}

/// Walk the `def` sections of an entry or run-on, appending one
/// [`DefinitionNode`] per usable sense.
pub(crate) fn walk_definition_sections(
    ctx: &mut ParseContext,
    sections: &[Value],
    part_of_speech: &str,
    out: &mut Vec<DefinitionNode>,
) {
    for section in sections {
        let Some(sseq) = section.get("sseq").and_then(Value::as_array) else {
            ctx.warn("definition section without a sense sequence, skipping");
            continue;
        };
        for sequence in sseq {
            let Some(items) = sequence.as_array() else {
                ctx.warn(format!(
                    "sense sequence is {}, expected array",
                    value_kind(sequence)
                ));
                continue;
            };
            // Carried `sen` metadata is scoped to one sequence.
            let mut carry = SenseCarry::default();
            walk_sense_sequence(ctx, items, part_of_speech, &mut carry, out);
        }
    }
}

fn walk_sense_sequence(
    ctx: &mut ParseContext,
    items: &[Value],
    part_of_speech: &str,
    carry: &mut SenseCarry,
    out: &mut Vec<DefinitionNode>,
) {
    for item in items {
        let Some((tag, payload)) = tagged_pair(item) else {
            ctx.warn("malformed sense item, expected [tag, payload]");
            continue;
        };
        match tag {
            "sense" => {
                let pending = mem::take(carry);
                if let Some(def) = build_sense(ctx, payload, part_of_speech, pending) {
                    out.push(def);
                }
            }
            "sen" => {
                if payload.is_object() {
                    *carry = sense_carry(ctx, payload);
                } else {
                    ctx.warn(format!(
                        "sen payload is {}, expected object",
                        value_kind(payload)
                    ));
                }
            }
            "bs" => {
                let Some(sense) = payload.get("sense") else {
                    ctx.warn("bs token without a nested sense, skipping");
                    continue;
                };
                let pending = mem::take(carry);
                if let Some(def) = build_sense(ctx, sense, part_of_speech, pending) {
                    out.push(def);
                }
            }
            "pseq" => {
                let Some(nested) = payload.as_array() else {
                    ctx.warn(format!(
                        "pseq payload is {}, expected array",
                        value_kind(payload)
                    ));
                    continue;
                };
                walk_sense_sequence(ctx, nested, part_of_speech, carry, out);
            }
            other => ctx.warn(format!("unknown sense tag '{other}', skipping")),
        }
    }
}

/// Extract carried metadata from a `sen` payload.
fn sense_carry(ctx: &mut ParseContext, payload: &Value) -> SenseCarry {
    SenseCarry {
        subject_status: label_list(ctx, payload.get("sls"), "sls"),
        labels: label_list(ctx, payload.get("lbs"), "lbs"),
        grammatical_note: payload
            .get("sgram")
            .and_then(|v| ctx.clean_field(v, "sgram")),
    }
}

/// Join a label array (`sls`/`lbs`) into one comma-separated string.
fn label_list(ctx: &mut ParseContext, value: Option<&Value>, field: &str) -> Option<String> {
    let items = match value {
        Some(Value::Array(items)) => items,
        Some(other) => {
            ctx.warn(format!(
                "'{field}' is {}, expected array",
                value_kind(other)
            ));
            return None;
        }
        None => return None,
    };

    let labels: Vec<String> = items
        .iter()
        .filter_map(|item| ctx.clean_field(item, field))
        .collect();
    if labels.is_empty() {
        None
    } else {
        Some(labels.join(", "))
    }
}

/// Build one definition from a `sense` payload, or skip it.
///
/// A sense is skipped when its only text is a cross-reference block, when
/// no usable text remains after cleaning, or when the (text, part of
/// speech) pair already occurred in this entry.
fn build_sense(
    ctx: &mut ParseContext,
    sense: &Value,
    part_of_speech: &str,
    carried: SenseCarry,
) -> Option<DefinitionNode> {
    let Some(dt) = sense.get("dt").and_then(Value::as_array) else {
        ctx.warn("sense without defining text, skipping");
        return None;
    };

    let own = SenseCarry {
        subject_status: label_list(ctx, sense.get("sls"), "sls"),
        labels: label_list(ctx, sense.get("lbs"), "lbs"),
        grammatical_note: sense.get("sgram").and_then(|v| ctx.clean_field(v, "sgram")),
    };

    let mut text_parts: Vec<String> = Vec::new();
    let mut usage_parts: Vec<String> = Vec::new();
    let mut examples: Vec<ExampleNode> = Vec::new();
    let mut example_note: Option<String> = None;

    for token in dt {
        let Some((tag, payload)) = tagged_pair(token) else {
            ctx.warn("malformed defining-text token, expected [tag, payload]");
            continue;
        };
        match tag {
            "text" => {
                let Some(raw) = coerce_text(payload) else {
                    ctx.warn(format!(
                        "defining text is {}, expected text",
                        value_kind(payload)
                    ));
                    continue;
                };
                if !payload.is_string() {
                    ctx.warn("coerced non-string defining text");
                }
                // Text runs that open with a cross-reference block carry
                // no definition of their own.
                if raw.trim_start().starts_with("{dx") {
                    continue;
                }
                if let Some(cleaned) = clean_text(&raw) {
                    text_parts.push(cleaned);
                }
            }
            "vis" => collect_examples(ctx, payload, &example_note, &mut examples),
            "wsgram" => {
                example_note = ctx.clean_field(payload, "wsgram");
            }
            "uns" => collect_usage_notes(ctx, payload, &example_note, &mut usage_parts, &mut examples),
            "snote" => {
                collect_supplemental_note(ctx, payload, &example_note, &mut usage_parts, &mut examples)
            }
            other => ctx.warn(format!("unknown defining-text tag '{other}', skipping")),
        }
    }

    if text_parts.is_empty() {
        debug!(word = %ctx.word, "sense yielded no definition text, skipping");
        return None;
    }
    let text = text_parts.join(" ");

    if !ctx.first_occurrence(&text, part_of_speech) {
        debug!(word = %ctx.word, definition = %text, "duplicate definition, skipping");
        return None;
    }

    let grammatical_note = own.grammatical_note.or(carried.grammatical_note);
    let plural_only = grammatical_note
        .as_deref()
        .map(|note| {
            let note = note.trim().to_lowercase();
            note == "pl" || note == "plural"
        })
        .unwrap_or(false);

    let mut def = DefinitionNode::new(text, part_of_speech, ctx.language.as_str(), ctx.source.as_str());
    def.in_short_def = ctx.short_defs.contains(&def.text);
    def.subject_status = own.subject_status.or(carried.subject_status);
    def.labels = own.labels.or(carried.labels);
    def.grammatical_note = grammatical_note;
    def.plural_only = plural_only;
    def.usage_note = if usage_parts.is_empty() {
        None
    } else {
        Some(usage_parts.join("; "))
    };
    for example in examples {
        def.push_example(example);
    }
    Some(def)
}

/// Extract examples from a `vis` payload.
fn collect_examples(
    ctx: &mut ParseContext,
    payload: &Value,
    note: &Option<String>,
    out: &mut Vec<ExampleNode>,
) {
    let Some(items) = payload.as_array() else {
        ctx.warn(format!(
            "vis payload is {}, expected array",
            value_kind(payload)
        ));
        return;
    };
    for item in items {
        let Some(raw) = item.get("t").and_then(coerce_text) else {
            ctx.warn("example without usable text, skipping");
            continue;
        };
        if let Some(text) = clean_text(&raw) {
            out.push(ExampleNode {
                text,
                grammatical_note: note.clone(),
                language: ctx.language.clone(),
            });
        }
    }
}

/// Extract usage-note text and nested examples from a `uns` payload.
///
/// The payload is a list of groups, each its own token list contributing
/// one note text plus optional examples.
fn collect_usage_notes(
    ctx: &mut ParseContext,
    payload: &Value,
    note: &Option<String>,
    usage_parts: &mut Vec<String>,
    examples: &mut Vec<ExampleNode>,
) {
    let Some(groups) = payload.as_array() else {
        ctx.warn(format!(
            "uns payload is {}, expected array",
            value_kind(payload)
        ));
        return;
    };
    for group in groups {
        let Some(tokens) = group.as_array() else {
            ctx.warn("usage-note group is not an array, skipping");
            continue;
        };
        for token in tokens {
            match tagged_pair(token) {
                Some(("text", p)) => {
                    if let Some(cleaned) = ctx.clean_field(p, "uns text") {
                        usage_parts.push(cleaned);
                    }
                }
                Some(("vis", p)) => collect_examples(ctx, p, note, examples),
                Some((other, _)) => {
                    ctx.warn(format!("unknown usage-note tag '{other}', skipping"))
                }
                None => ctx.warn("malformed usage-note token"),
            }
        }
    }
}

/// Extract a supplemental note (`snote`): one `t` text plus optional
/// nested examples.
fn collect_supplemental_note(
    ctx: &mut ParseContext,
    payload: &Value,
    note: &Option<String>,
    usage_parts: &mut Vec<String>,
    examples: &mut Vec<ExampleNode>,
) {
    let Some(tokens) = payload.as_array() else {
        ctx.warn(format!(
            "snote payload is {}, expected array",
            value_kind(payload)
        ));
        return;
    };
    for token in tokens {
        match tagged_pair(token) {
            Some(("t", p)) => {
                if let Some(cleaned) = ctx.clean_field(p, "snote text") {
                    usage_parts.push(cleaned);
                }
            }
            Some(("vis", p)) => collect_examples(ctx, p, note, examples),
            Some((other, _)) => {
                ctx.warn(format!("unknown supplemental-note tag '{other}', skipping"))
            }
            None => ctx.warn("malformed supplemental-note token"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ctx() -> ParseContext {
        ParseContext::new("walk", "en", "collegiate")
    }

    fn walk(ctx: &mut ParseContext, sections: Value) -> Vec<DefinitionNode> {
        let sections = sections.as_array().unwrap().clone();
        let mut out = Vec::new();
        walk_definition_sections(ctx, &sections, "verb", &mut out);
        out
    }

    #[test]
    fn sense_with_text_and_examples() {
        let mut ctx = ctx();
        let defs = walk(
            &mut ctx,
            json!([{"sseq": [[
                ["sense", {
                    "dt": [
                        ["text", "{bc}to move along on foot"],
                        ["vis", [{"t": "we {it}walked{/it} home"}]]
                    ]
                }]
            ]]}]),
        );

        assert_eq!(defs.len(), 1);
        assert_eq!(defs[0].text, "to move along on foot");
        assert_eq!(defs[0].part_of_speech, "verb");
        assert_eq!(defs[0].examples.len(), 1);
        assert_eq!(defs[0].examples[0].text, "we {it}walked{/it} home");
        assert!(ctx.warnings.is_empty());
    }

    #[test]
    fn wsgram_annotates_later_examples_until_overwritten() {
        let mut ctx = ctx();
        let defs = walk(
            &mut ctx,
            json!([{"sseq": [[
                ["sense", {
                    "dt": [
                        ["text", "{bc}to traverse"],
                        ["vis", [{"t": "before any note"}]],
                        ["wsgram", "transitive"],
                        ["vis", [{"t": "first noted"}]],
                        ["wsgram", "intransitive"],
                        ["vis", [{"t": "second noted"}]]
                    ]
                }]
            ]]}]),
        );

        let examples = &defs[0].examples;
        assert_eq!(examples[0].grammatical_note, None);
        assert_eq!(examples[1].grammatical_note.as_deref(), Some("transitive"));
        assert_eq!(
            examples[2].grammatical_note.as_deref(),
            Some("intransitive")
        );
    }

    #[test]
    fn sen_metadata_is_consumed_by_next_sense() {
        let mut ctx = ctx();
        let defs = walk(
            &mut ctx,
            json!([{"sseq": [[
                ["sen", {"sls": ["informal"], "sgram": "pl"}],
                ["sense", {"dt": [["text", "{bc}first"]]}],
                ["sense", {"dt": [["text", "{bc}second"]]}]
            ]]}]),
        );

        assert_eq!(defs.len(), 2);
        assert_eq!(defs[0].subject_status.as_deref(), Some("informal"));
        assert_eq!(defs[0].grammatical_note.as_deref(), Some("pl"));
        assert!(defs[0].plural_only);
        assert_eq!(defs[1].subject_status, None);
        assert_eq!(defs[1].grammatical_note, None);
        assert!(!defs[1].plural_only);
    }

    #[test]
    fn own_sense_metadata_wins_over_carried() {
        let mut ctx = ctx();
        let defs = walk(
            &mut ctx,
            json!([{"sseq": [[
                ["sen", {"sgram": "pl"}],
                ["sense", {"sgram": "count", "dt": [["text", "{bc}a thing"]]}]
            ]]}]),
        );

        assert_eq!(defs[0].grammatical_note.as_deref(), Some("count"));
        assert!(!defs[0].plural_only);
    }

    #[test]
    fn usage_notes_contribute_text_and_nested_examples() {
        let mut ctx = ctx();
        let defs = walk(
            &mut ctx,
            json!([{"sseq": [[
                ["sense", {
                    "dt": [
                        ["text", "{bc}to proceed"],
                        ["uns", [
                            [
                                ["text", "often used with {it}of{/it}"],
                                ["vis", [{"t": "walked {it}of{/it}ten"}]]
                            ],
                            [
                                ["text", "sometimes figurative"]
                            ]
                        ]]
                    ]
                }]
            ]]}]),
        );

        assert_eq!(
            defs[0].usage_note.as_deref(),
            Some("often used with {it}of{/it}; sometimes figurative")
        );
        assert_eq!(defs[0].examples.len(), 1);
        assert_eq!(defs[0].examples[0].text, "walked {it}of{/it}ten");
    }

    #[test]
    fn supplemental_note_contributes_text_and_examples() {
        let mut ctx = ctx();
        let defs = walk(
            &mut ctx,
            json!([{"sseq": [[
                ["sense", {
                    "dt": [
                        ["text", "{bc}to go on strike"],
                        ["snote", [
                            ["t", "chiefly in labor contexts"],
                            ["vis", [{"t": "the crew {it}walked{/it}"}]]
                        ]]
                    ]
                }]
            ]]}]),
        );

        assert_eq!(
            defs[0].usage_note.as_deref(),
            Some("chiefly in labor contexts")
        );
        assert_eq!(defs[0].examples.len(), 1);
    }

    #[test]
    fn pseq_and_bs_are_walked_recursively() {
        let mut ctx = ctx();
        let defs = walk(
            &mut ctx,
            json!([{"sseq": [[
                ["pseq", [
                    ["bs", {"sense": {"dt": [["text", "{bc}wrapped"]]}}],
                    ["sense", {"dt": [["text", "{bc}nested"]]}]
                ]]
            ]]}]),
        );

        let texts: Vec<&str> = defs.iter().map(|d| d.text.as_str()).collect();
        assert_eq!(texts, vec!["wrapped", "nested"]);
    }

    #[test]
    fn cross_reference_text_is_excluded() {
        let mut ctx = ctx();
        let defs = walk(
            &mut ctx,
            json!([{"sseq": [[
                ["sense", {"dt": [["text", "{dx}compare {dxt|run|run:1|}{/dx}"]]}],
                ["sense", {"dt": [
                    ["text", "{bc}kept"],
                    ["text", "{dx}see also {dxt|stroll||}{/dx}"]
                ]}]
            ]]}]),
        );

        assert_eq!(defs.len(), 1);
        assert_eq!(defs[0].text, "kept");
    }

    #[test]
    fn duplicate_text_and_part_of_speech_is_skipped() {
        let mut ctx = ctx();
        let defs = walk(
            &mut ctx,
            json!([{"sseq": [
                [["sense", {"dt": [["text", "{bc}to move along on foot"]]}]],
                [["sense", {"dt": [["text", "to move along on foot"]]}]]
            ]}]),
        );

        assert_eq!(defs.len(), 1);
    }

    #[test]
    fn short_definition_membership_is_flagged() {
        let mut ctx = ctx();
        ctx.short_defs.insert("to move along on foot".to_string());
        let defs = walk(
            &mut ctx,
            json!([{"sseq": [[
                ["sense", {"dt": [["text", "{bc}to move along on foot"]]}],
                ["sense", {"dt": [["text", "{bc}to traverse"]]}]
            ]]}]),
        );

        assert!(defs[0].in_short_def);
        assert!(!defs[1].in_short_def);
    }

    #[test]
    fn unknown_tags_warn_and_skip() {
        let mut ctx = ctx();
        let defs = walk(
            &mut ctx,
            json!([{"sseq": [[
                ["mystery", {"dt": []}],
                ["sense", {"dt": [
                    ["text", "{bc}still parsed"],
                    ["strange", "payload"]
                ]}]
            ]]}]),
        );

        assert_eq!(defs.len(), 1);
        assert_eq!(defs[0].text, "still parsed");
        assert!(ctx.warnings.iter().any(|w| w.contains("mystery")));
        assert!(ctx.warnings.iter().any(|w| w.contains("strange")));
    }

    #[test]
    fn non_string_defining_text_is_coerced_with_warning() {
        let mut ctx = ctx();
        let defs = walk(
            &mut ctx,
            json!([{"sseq": [[
                ["sense", {"dt": [["text", 42]]}]
            ]]}]),
        );

        assert_eq!(defs[0].text, "42");
        assert!(ctx
            .warnings
            .iter()
            .any(|w| w.contains("coerced non-string")));
    }

    #[test]
    fn duplicate_example_text_merges_preferring_note() {
        let mut ctx = ctx();
        let defs = walk(
            &mut ctx,
            json!([{"sseq": [[
                ["sense", {
                    "dt": [
                        ["text", "{bc}to traverse"],
                        ["vis", [{"t": "a walked mile"}]],
                        ["wsgram", "transitive"],
                        ["vis", [{"t": "a walked mile"}]]
                    ]
                }]
            ]]}]),
        );

        assert_eq!(defs[0].examples.len(), 1);
        assert_eq!(
            defs[0].examples[0].grammatical_note.as_deref(),
            Some("transitive")
        );
    }
}
