//! Pronunciation audio URL derivation
//!
//! The provider serves pronunciation audio at a path derived from the
//! sound reference itself; the subdirectory rules below are the documented
//! ones for the `bix`/`gg`/numeric buckets.

const AUDIO_BASE: &str = "https://media.lexicornu.com/audio/prons";
const AUDIO_FORMAT: &str = "mp3";

/// Resolve a sound reference to a fetchable URL.
pub fn pronunciation_url(audio_ref: &str, language: &str) -> String {
    format!(
        "{AUDIO_BASE}/{language}/{AUDIO_FORMAT}/{}/{audio_ref}.{AUDIO_FORMAT}",
        subdirectory(audio_ref)
    )
}

/// Bucket directory for a sound reference.
fn subdirectory(audio_ref: &str) -> String {
    if audio_ref.starts_with("bix") {
        return "bix".to_string();
    }
    if audio_ref.starts_with("gg") {
        return "gg".to_string();
    }
    match audio_ref.chars().next() {
        Some(c) if c.is_ascii_alphabetic() => c.to_ascii_lowercase().to_string(),
        _ => "number".to_string(),
    }
}
