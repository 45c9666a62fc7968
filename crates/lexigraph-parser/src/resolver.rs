//! Relationship resolver
//!
//! Classifies each sub-word's connection to the main word (or to another
//! sub-word) into the closed relationship vocabulary. Explicit labels win;
//! surface patterns are the fallback. The resolver is a pure function over
//! the parsed entry: it reads descriptor provenance and writes symbolic
//! edges, nothing else.

use lexigraph_core::{ParsedEntry, RelationType, RelationshipEdge, SubWordOrigin, WordKey};

/// Cross-reference label keywords, checked in order. The combined
/// past-tense entry must precede its parts.
const CROSS_REFERENCE_LABELS: &[(&str, RelationType)] = &[
    ("past tense and past participle", RelationType::PastTense),
    ("past participle", RelationType::PastParticiple),
    ("past tense", RelationType::PastTense),
    ("present participle", RelationType::PresentParticiple),
    ("third person singular", RelationType::ThirdPerson),
    ("less common spelling", RelationType::AlternativeSpelling),
];

/// Map a cross-reference label to a relationship type, if it matches the
/// keyword table.
pub fn classify_cross_reference(label: &str) -> Option<RelationType> {
    let label = label.to_lowercase();
    CROSS_REFERENCE_LABELS
        .iter()
        .find(|(keyword, _)| label.contains(keyword))
        .map(|(_, relation)| *relation)
}

/// Classify an inflected form against its base.
///
/// An explicit label always wins; otherwise the base's part of speech
/// selects the pattern family. Unclassifiable forms still get their
/// generic `related` edge from the caller.
pub fn classify_inflection(
    base: &str,
    form: &str,
    label: Option<&str>,
    part_of_speech: Option<&str>,
) -> Option<RelationType> {
    if let Some(relation) = label.and_then(classify_inflection_label) {
        return Some(relation);
    }

    let pos = part_of_speech.map(str::to_lowercase).unwrap_or_default();
    if pos.contains("verb") && !pos.contains("adverb") {
        classify_verb_pattern(base, form)
    } else if pos.contains("adjective") || pos.contains("adverb") {
        classify_degree_pattern(base, form)
    } else {
        None
    }
}

fn classify_inflection_label(label: &str) -> Option<RelationType> {
    let label = label.to_lowercase();
    // Regular verbs collapse past tense and past participle into one
    // past-tense edge; the combined label lands there via the first check.
    if label.contains("past tense") {
        Some(RelationType::PastTense)
    } else if label.contains("past participle") {
        Some(RelationType::PastParticiple)
    } else if label.contains("present participle") {
        Some(RelationType::PresentParticiple)
    } else if label.contains("third person") {
        Some(RelationType::ThirdPerson)
    } else if label.contains("plural") {
        Some(RelationType::Plural)
    } else if label.contains("comparative") {
        Some(RelationType::Comparative)
    } else if label.contains("superlative") {
        Some(RelationType::Superlative)
    } else {
        None
    }
}

fn classify_verb_pattern(base: &str, form: &str) -> Option<RelationType> {
    if form.ends_with("ing") {
        Some(RelationType::PresentParticiple)
    } else if form.ends_with('s') && form.len() == base.len() + 1 {
        Some(RelationType::ThirdPerson)
    } else if form.ends_with("ed") {
        Some(RelationType::PastTense)
    } else {
        None
    }
}

fn classify_degree_pattern(base: &str, form: &str) -> Option<RelationType> {
    if let Some(stem) = form.strip_suffix("est") {
        if degree_stem_matches(stem, base) {
            return Some(RelationType::Superlative);
        }
    }
    if let Some(stem) = form.strip_suffix("er") {
        if degree_stem_matches(stem, base) {
            return Some(RelationType::Comparative);
        }
    }
    None
}

/// `hot` matches `hott` (doubled final consonant) and `large` matches
/// `larg` (elided trailing e). An empty base matches nothing.
fn degree_stem_matches(stem: &str, base: &str) -> bool {
    if base.is_empty() {
        return false;
    }
    if stem == base {
        return true;
    }
    if let Some(elided) = base.strip_suffix('e') {
        if stem == elided {
            return true;
        }
    }
    if stem.len() == base.len() + 1 && stem.starts_with(base) {
        return stem.as_bytes()[stem.len() - 1] == base.as_bytes()[base.len() - 1];
    }
    false
}

/// Fill the entry's symbolic edges from its sub-word descriptors.
///
/// Edges point from the base form to the derived form; cross-references
/// invert this because the entry headword is itself the derived form.
/// Assigning (rather than appending) keeps the call idempotent.
pub fn resolve_edges(entry: &mut ParsedEntry) {
    let base = entry.main.text.clone();
    let mut edges = Vec::new();

    for sub in &entry.sub_words {
        let target = WordKey::sub(&sub.key);
        match &sub.origin {
            SubWordOrigin::Variant { label } => {
                let mut edge =
                    RelationshipEdge::new(WordKey::Main, target, RelationType::Related);
                if let Some(label) = label {
                    edge = edge.with_description(label);
                }
                edges.push(edge);
            }
            SubWordOrigin::Inflection {
                label,
                part_of_speech,
            } => {
                let mut related =
                    RelationshipEdge::new(WordKey::Main, target.clone(), RelationType::Related);
                if let Some(label) = label {
                    related = related.with_description(label);
                }
                edges.push(related);
                if let Some(relation) = classify_inflection(
                    &base,
                    &sub.word.text,
                    label.as_deref(),
                    part_of_speech.as_deref(),
                ) {
                    edges.push(RelationshipEdge::new(WordKey::Main, target, relation));
                }
            }
            SubWordOrigin::CrossReference { label } => {
                edges.push(
                    RelationshipEdge::new(target.clone(), WordKey::Main, RelationType::Related)
                        .with_description(label),
                );
                if let Some(relation) = classify_cross_reference(label) {
                    edges.push(RelationshipEdge::new(target, WordKey::Main, relation));
                }
            }
            SubWordOrigin::Synonym => {
                edges.push(RelationshipEdge::new(
                    WordKey::Main,
                    target,
                    RelationType::Synonym,
                ));
            }
            SubWordOrigin::Antonym => {
                edges.push(RelationshipEdge::new(
                    WordKey::Main,
                    target,
                    RelationType::Antonym,
                ));
            }
            SubWordOrigin::PhrasalVerb => {
                edges.push(RelationshipEdge::new(
                    WordKey::Main,
                    target.clone(),
                    RelationType::Related,
                ));
                edges.push(RelationshipEdge::new(
                    WordKey::Main,
                    target,
                    RelationType::PhrasalVerb,
                ));
            }
            SubWordOrigin::Phrase => {
                edges.push(RelationshipEdge::new(
                    WordKey::Main,
                    target.clone(),
                    RelationType::Related,
                ));
                edges.push(RelationshipEdge::new(
                    WordKey::Main,
                    target,
                    RelationType::Phrase,
                ));
            }
            SubWordOrigin::PhrasalVerbVariant { of } => {
                edges.push(RelationshipEdge::new(
                    WordKey::sub(of),
                    target,
                    RelationType::VariantForm,
                ));
            }
            SubWordOrigin::UndefinedRunOn => {
                edges.push(RelationshipEdge::new(
                    WordKey::Main,
                    target.clone(),
                    RelationType::Related,
                ));
                edges.push(RelationshipEdge::new(
                    WordKey::Main,
                    target,
                    RelationType::Stem,
                ));
            }
            SubWordOrigin::RunOnInflection {
                label,
                of,
                part_of_speech,
            } => {
                let from = WordKey::sub(of);
                let mut related =
                    RelationshipEdge::new(from.clone(), target.clone(), RelationType::Related);
                if let Some(label) = label {
                    related = related.with_description(label);
                }
                edges.push(related);
                if let Some(relation) = classify_inflection(
                    of,
                    &sub.word.text,
                    label.as_deref(),
                    part_of_speech.as_deref(),
                ) {
                    edges.push(RelationshipEdge::new(from, target, relation));
                }
            }
        }
    }

    entry.edges = edges;
}
