//! Lexigraph Entry Parser
//!
//! Decodes provider entry documents (tagged-array JSON trees) into the
//! intermediate word graph defined by `lexigraph-core`. This crate
//! provides:
//! - Markup normalization for defining text and labels
//! - Recursive sense-tree walking with carried annotation context
//! - Sub-word extraction for inflections, variants, cross-references,
//!   run-ons, synonyms and antonyms
//! - Relationship edge resolution from sub-word provenance

pub mod audio;
pub mod document;
pub mod entry;
pub mod normalize;
pub mod resolver;

mod senses;

// Re-export the main entry points for convenience
pub use audio::pronunciation_url;
pub use entry::{parse_entry, ParseError};
pub use normalize::{clean_text, coerce_text, strip_homograph_marker, strip_syllable_markers};
pub use resolver::{classify_cross_reference, classify_inflection, resolve_edges};
