//! Intermediate word graph
//!
//! The parser turns one upstream entry document into a [`ParsedEntry`]: the
//! main word, its definitions, a set of [`SubWordDescriptor`]s and, once
//! the resolver has run, symbolic [`RelationshipEdge`]s. Nothing here has
//! a durable id yet; endpoints are [`WordKey`] symbols that the
//! materializer resolves to row ids after upserting the words.

use crate::relation::RelationType;
use serde::{Deserialize, Serialize};

/// Symbolic endpoint of an edge before durable ids exist.
///
/// `Main` is the sentinel for the entry's headword; `Sub` carries the
/// cleaned text of a sub-word, which doubles as its natural key within the
/// entry (language is shared entry-wide).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WordKey {
    /// The entry's main word
    Main,
    /// A sub-word, keyed by its cleaned text
    Sub(String),
}

impl WordKey {
    /// Convenience constructor for sub-word keys.
    pub fn sub(text: impl Into<String>) -> Self {
        WordKey::Sub(text.into())
    }
}

impl std::fmt::Display for WordKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WordKey::Main => write!(f, "main"),
            WordKey::Sub(text) => write!(f, "{}", text),
        }
    }
}

/// A word as extracted from one entry, durable identity (text, language).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WordNode {
    /// Cleaned word text (syllable markers and markup stripped)
    pub text: String,
    /// BCP-47-ish language code, e.g. "en"
    pub language: String,
    /// Phonetic transcription when the entry carries one
    pub phonetic: Option<String>,
    /// Resolved pronunciation audio URLs
    pub audio_urls: Vec<String>,
    /// Etymology note; cross-reference generated text overrides it
    pub etymology: Option<String>,
    /// Opaque provenance identifier from the upstream document
    pub source_id: Option<String>,
}

impl WordNode {
    /// A bare word with only text and language set.
    pub fn new(text: impl Into<String>, language: impl Into<String>) -> Self {
        WordNode {
            text: text.into(),
            language: language.into(),
            ..Default::default()
        }
    }
}

/// One usage example attached to a definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExampleNode {
    pub text: String,
    /// Grammatical-note context carried from the sense walker
    pub grammatical_note: Option<String>,
    pub language: String,
}

/// One sense definition.
///
/// Durable identity is the full content tuple: every field except
/// `examples` participates, so two definitions differing in a single label
/// are distinct rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DefinitionNode {
    pub text: String,
    pub part_of_speech: String,
    pub language: String,
    /// Provenance source tag from the upstream document
    pub source: String,
    /// Subject/status labels, joined
    pub subject_status: Option<String>,
    /// General labels, joined
    pub labels: Option<String>,
    pub grammatical_note: Option<String>,
    pub usage_note: Option<String>,
    /// Cleaned text matched a member of the entry's short-definition set
    pub in_short_def: bool,
    /// Sense is marked as plural-only usage
    pub plural_only: bool,
    pub examples: Vec<ExampleNode>,
}

impl DefinitionNode {
    /// A minimal definition with labels unset.
    pub fn new(
        text: impl Into<String>,
        part_of_speech: impl Into<String>,
        language: impl Into<String>,
        source: impl Into<String>,
    ) -> Self {
        DefinitionNode {
            text: text.into(),
            part_of_speech: part_of_speech.into(),
            language: language.into(),
            source: source.into(),
            subject_status: None,
            labels: None,
            grammatical_note: None,
            usage_note: None,
            in_short_def: false,
            plural_only: false,
            examples: Vec::new(),
        }
    }

    /// Merge `example` into this definition, deduplicating on text and
    /// preferring a non-null grammatical note when texts collide.
    pub fn push_example(&mut self, example: ExampleNode) {
        if let Some(existing) = self.examples.iter_mut().find(|e| e.text == example.text) {
            if existing.grammatical_note.is_none() {
                existing.grammatical_note = example.grammatical_note;
            }
            return;
        }
        self.examples.push(example);
    }
}

/// Symbolic typed edge between two word keys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationshipEdge {
    pub from: WordKey,
    pub to: WordKey,
    pub relation: RelationType,
    /// Optional free-text annotation (e.g. a variant label)
    pub description: Option<String>,
}

impl RelationshipEdge {
    pub fn new(from: WordKey, to: WordKey, relation: RelationType) -> Self {
        RelationshipEdge {
            from,
            to,
            relation,
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Where a sub-word came from in the entry document.
///
/// The resolver classifies this (plus the surface form) into edge types;
/// the parser records only provenance and any explicit label it saw.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SubWordOrigin {
    /// Variant spelling of the main word (`vrs`)
    Variant {
        /// Variant label, e.g. "or less commonly"
        label: Option<String>,
    },
    /// Inflection of the main word (`ins`)
    Inflection {
        /// Explicit inflection label when present
        label: Option<String>,
        /// Part of speech of the base entry, drives pattern heuristics
        part_of_speech: Option<String>,
    },
    /// Cross-referenced base form (`cxs`); main is the derived form here
    CrossReference {
        /// Raw cross-reference label, matched against the keyword table
        label: String,
    },
    /// Listed synonym
    Synonym,
    /// Listed antonym
    Antonym,
    /// Defined run-on marked as a phrasal verb (`dros` + gram)
    PhrasalVerb,
    /// Defined run-on without the phrasal-verb marker
    Phrase,
    /// Surface variant of a phrasal verb, linked to it rather than to main
    PhrasalVerbVariant {
        /// Key of the phrasal-verb sub-word this varies
        of: String,
    },
    /// Undefined run-on (`uros`)
    UndefinedRunOn,
    /// Inflection nested under an undefined run-on, linked to the run-on
    RunOnInflection {
        label: Option<String>,
        /// Key of the run-on sub-word this inflects
        of: String,
        part_of_speech: Option<String>,
    },
}

/// A sub-word bundled with its own definitions and provenance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubWordDescriptor {
    /// Natural key within the entry; always equals `word.text`
    pub key: String,
    pub word: WordNode,
    pub definitions: Vec<DefinitionNode>,
    pub origin: SubWordOrigin,
}

impl SubWordDescriptor {
    pub fn new(word: WordNode, origin: SubWordOrigin) -> Self {
        SubWordDescriptor {
            key: word.text.clone(),
            word,
            definitions: Vec::new(),
            origin,
        }
    }
}

/// The intermediate graph for one ingested entry.
///
/// `edges` is empty as produced by the parser; the resolver fills it from
/// the descriptors' origins. The materializer requires every edge endpoint
/// to name either `Main` or the key of a descriptor in `sub_words`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParsedEntry {
    pub main: WordNode,
    pub definitions: Vec<DefinitionNode>,
    pub sub_words: Vec<SubWordDescriptor>,
    pub edges: Vec<RelationshipEdge>,
    /// Parse defects recovered along the way, for diagnostics and tests
    pub warnings: Vec<String>,
}

impl ParsedEntry {
    /// Look up a sub-word descriptor by its natural key.
    pub fn sub_word(&self, key: &str) -> Option<&SubWordDescriptor> {
        self.sub_words.iter().find(|s| s.key == key)
    }

    /// The word node a symbolic key refers to, if it exists in this entry.
    pub fn word_for_key(&self, key: &WordKey) -> Option<&WordNode> {
        match key {
            WordKey::Main => Some(&self.main),
            WordKey::Sub(text) => self.sub_word(text).map(|s| &s.word),
        }
    }

    /// Push a descriptor unless one with the same key already exists;
    /// returns the key either way. Upsert semantics collapse duplicate
    /// texts at persistence time, so the first descriptor wins in memory.
    pub fn add_sub_word(&mut self, descriptor: SubWordDescriptor) -> String {
        let key = descriptor.key.clone();
        if self.sub_word(&key).is_none() {
            self.sub_words.push(descriptor);
        }
        key
    }
}
