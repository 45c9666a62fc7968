//! The closed relationship vocabulary
//!
//! Every edge in the word graph carries exactly one of these types. The set
//! is closed on purpose: the resolver classifies into it exhaustively, and
//! the store round-trips it through a TEXT column via [`RelationType::as_str`]
//! and [`RelationType::parse`].

use serde::{Deserialize, Serialize};

/// Typed, directed connection between two word nodes.
///
/// Edges point from the base form to the derived/associated form
/// (e.g. `walk --past-tense--> walked`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RelationType {
    /// Noun plural form
    Plural,
    /// Verb past tense (also covers the collapsed past participle of
    /// regular verbs, see the resolver)
    PastTense,
    /// Verb past participle (fires only for an explicit cross-reference
    /// label, never from the surface pattern)
    PastParticiple,
    /// Verb present participle ("-ing" form)
    PresentParticiple,
    /// Verb third person singular
    ThirdPerson,
    /// Adjective/adverb comparative ("-er" form)
    Comparative,
    /// Adjective/adverb superlative ("-est" form)
    Superlative,
    /// Synonym listed on the entry
    Synonym,
    /// Antonym listed on the entry
    Antonym,
    /// Derived form without a more specific classification
    /// (undefined run-ons)
    Stem,
    /// Idiomatic phrase run-on
    Phrase,
    /// Phrasal verb run-on
    PhrasalVerb,
    /// Surface variant of a phrasal verb
    VariantForm,
    /// Less common spelling of the same word
    AlternativeSpelling,
    /// Generic association; accompanies most specific types
    Related,
}

impl RelationType {
    /// Stable string form used in the `relationships.relation_type` column.
    pub fn as_str(&self) -> &'static str {
        match self {
            RelationType::Plural => "plural",
            RelationType::PastTense => "past-tense",
            RelationType::PastParticiple => "past-participle",
            RelationType::PresentParticiple => "present-participle",
            RelationType::ThirdPerson => "third-person",
            RelationType::Comparative => "comparative",
            RelationType::Superlative => "superlative",
            RelationType::Synonym => "synonym",
            RelationType::Antonym => "antonym",
            RelationType::Stem => "stem",
            RelationType::Phrase => "phrase",
            RelationType::PhrasalVerb => "phrasal-verb",
            RelationType::VariantForm => "variant-form",
            RelationType::AlternativeSpelling => "alternative-spelling",
            RelationType::Related => "related",
        }
    }

    /// Inverse of [`as_str`](Self::as_str); `None` for unknown strings.
    pub fn parse(s: &str) -> Option<Self> {
        Some(match s {
            "plural" => RelationType::Plural,
            "past-tense" => RelationType::PastTense,
            "past-participle" => RelationType::PastParticiple,
            "present-participle" => RelationType::PresentParticiple,
            "third-person" => RelationType::ThirdPerson,
            "comparative" => RelationType::Comparative,
            "superlative" => RelationType::Superlative,
            "synonym" => RelationType::Synonym,
            "antonym" => RelationType::Antonym,
            "stem" => RelationType::Stem,
            "phrase" => RelationType::Phrase,
            "phrasal-verb" => RelationType::PhrasalVerb,
            "variant-form" => RelationType::VariantForm,
            "alternative-spelling" => RelationType::AlternativeSpelling,
            "related" => RelationType::Related,
            _ => return None,
        })
    }
}

impl std::fmt::Display for RelationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [RelationType; 15] = [
        RelationType::Plural,
        RelationType::PastTense,
        RelationType::PastParticiple,
        RelationType::PresentParticiple,
        RelationType::ThirdPerson,
        RelationType::Comparative,
        RelationType::Superlative,
        RelationType::Synonym,
        RelationType::Antonym,
        RelationType::Stem,
        RelationType::Phrase,
        RelationType::PhrasalVerb,
        RelationType::VariantForm,
        RelationType::AlternativeSpelling,
        RelationType::Related,
    ];

    #[test]
    fn string_form_round_trips() {
        for rel in ALL {
            assert_eq!(RelationType::parse(rel.as_str()), Some(rel));
        }
    }

    #[test]
    fn unknown_string_is_none() {
        assert_eq!(RelationType::parse("holonym"), None);
        assert_eq!(RelationType::parse(""), None);
    }

    #[test]
    fn serde_uses_kebab_case() {
        let json = serde_json::to_string(&RelationType::PhrasalVerb).unwrap();
        assert_eq!(json, "\"phrasal-verb\"");
    }
}
