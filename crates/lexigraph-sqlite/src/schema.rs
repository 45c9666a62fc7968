//! Schema management and migrations

use crate::error::{SqliteError, SqliteResult};
use rusqlite::Connection;
use tracing::{debug, info};

/// Schema version - increment when making schema changes
const SCHEMA_VERSION: i32 = 1;

/// Apply all pending migrations
pub fn apply_migrations(conn: &Connection) -> SqliteResult<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );",
    )?;

    let current_version = get_current_version(conn)?;
    debug!(current_version, target_version = SCHEMA_VERSION, "Checking migrations");

    if current_version < SCHEMA_VERSION {
        info!(
            from = current_version,
            to = SCHEMA_VERSION,
            "Migrating word graph schema"
        );
        apply_migration_v1(conn)?;
    }

    Ok(())
}

/// Get current schema version
fn get_current_version(conn: &Connection) -> SqliteResult<i32> {
    let version: Option<i32> = conn
        .query_row(
            "SELECT MAX(version) FROM schema_migrations",
            [],
            |row| row.get(0),
        )
        .unwrap_or(None);

    Ok(version.unwrap_or(0))
}

/// Record that a migration was applied
fn record_migration(conn: &Connection, version: i32) -> SqliteResult<()> {
    conn.execute(
        "INSERT INTO schema_migrations (version) VALUES (?)",
        [version],
    )?;
    Ok(())
}

/// Migration v1: Initial word graph schema
fn apply_migration_v1(conn: &Connection) -> SqliteResult<()> {
    debug!("Creating v1 word graph tables");

    conn.execute_batch(SCHEMA_V1)
        .map_err(|e| SqliteError::Schema(format!("v1 schema failed: {}", e)))?;

    record_migration(conn, 1)?;
    info!("Schema v1 in place");
    Ok(())
}

/// Initial schema SQL
const SCHEMA_V1: &str = r#"
-- ============================================================================
-- TABLE: words
-- ============================================================================
-- One row per distinct surface form and language

CREATE TABLE IF NOT EXISTS words (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    text TEXT NOT NULL,
    language TEXT NOT NULL,
    phonetic TEXT,
    etymology TEXT,
    source_id TEXT,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now')),
    UNIQUE(text, language)
);

CREATE INDEX IF NOT EXISTS idx_words_text ON words(text);

-- ============================================================================
-- TABLE: definitions
-- ============================================================================
-- Sense rows; the same text may legitimately recur across sources or
-- parts of speech, so rows are matched on the full attribute tuple
-- before insert instead of a unique constraint

CREATE TABLE IF NOT EXISTS definitions (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    text TEXT NOT NULL,
    part_of_speech TEXT NOT NULL,
    language TEXT NOT NULL,
    source TEXT NOT NULL,
    subject_status TEXT,
    labels TEXT,
    grammatical_note TEXT,
    usage_note TEXT,
    in_short_def INTEGER NOT NULL DEFAULT 0,
    plural_only INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_definitions_text ON definitions(text);

-- ============================================================================
-- TABLE: word_definitions
-- ============================================================================
-- Many-to-many word/definition links; the first link for a word is its
-- primary definition

CREATE TABLE IF NOT EXISTS word_definitions (
    word_id INTEGER NOT NULL REFERENCES words(id) ON DELETE CASCADE,
    definition_id INTEGER NOT NULL REFERENCES definitions(id) ON DELETE CASCADE,
    is_primary INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    PRIMARY KEY (word_id, definition_id)
);

CREATE INDEX IF NOT EXISTS idx_word_definitions_definition ON word_definitions(definition_id);

-- ============================================================================
-- TABLE: examples
-- ============================================================================
-- Usage examples owned by a definition

CREATE TABLE IF NOT EXISTS examples (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    definition_id INTEGER NOT NULL REFERENCES definitions(id) ON DELETE CASCADE,
    text TEXT NOT NULL,
    grammatical_note TEXT,
    language TEXT NOT NULL,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    UNIQUE(definition_id, text)
);

-- ============================================================================
-- TABLE: audio
-- ============================================================================
-- Pronunciation recordings keyed by URL

CREATE TABLE IF NOT EXISTS audio (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    word_id INTEGER NOT NULL REFERENCES words(id) ON DELETE CASCADE,
    url TEXT NOT NULL UNIQUE,
    source TEXT,
    language TEXT NOT NULL,
    is_primary INTEGER NOT NULL DEFAULT 0,
    is_orphaned INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_audio_word ON audio(word_id);

-- ============================================================================
-- TABLE: relationships
-- ============================================================================
-- Typed directed edges between words

CREATE TABLE IF NOT EXISTS relationships (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    from_word_id INTEGER NOT NULL REFERENCES words(id) ON DELETE CASCADE,
    to_word_id INTEGER NOT NULL REFERENCES words(id) ON DELETE CASCADE,
    relation_type TEXT NOT NULL,
    description TEXT,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    UNIQUE(from_word_id, to_word_id, relation_type)
);

CREATE INDEX IF NOT EXISTS idx_relationships_from ON relationships(from_word_id, relation_type);
CREATE INDEX IF NOT EXISTS idx_relationships_to ON relationships(to_word_id, relation_type);
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_applies_cleanly() {
        let conn = Connection::open_in_memory().unwrap();
        apply_migrations(&conn).unwrap();

        let version = get_current_version(&conn).unwrap();
        assert_eq!(version, SCHEMA_VERSION);
    }

    #[test]
    fn test_schema_idempotent() {
        let conn = Connection::open_in_memory().unwrap();

        // Re-running against an up-to-date database is a no-op
        apply_migrations(&conn).unwrap();
        apply_migrations(&conn).unwrap();

        let version = get_current_version(&conn).unwrap();
        assert_eq!(version, SCHEMA_VERSION);
    }

    #[test]
    fn test_cascading_deletes() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("PRAGMA foreign_keys = ON;").unwrap();
        apply_migrations(&conn).unwrap();

        conn.execute(
            "INSERT INTO words (text, language) VALUES ('walk', 'en')",
            [],
        )
        .unwrap();
        let word_id = conn.last_insert_rowid();

        conn.execute(
            "INSERT INTO definitions (text, part_of_speech, language, source) \
             VALUES ('to move along on foot', 'verb', 'en', 'collegiate')",
            [],
        )
        .unwrap();
        let definition_id = conn.last_insert_rowid();

        conn.execute(
            "INSERT INTO word_definitions (word_id, definition_id, is_primary) VALUES (?1, ?2, 1)",
            [word_id, definition_id],
        )
        .unwrap();
        conn.execute(
            "INSERT INTO audio (word_id, url, language) VALUES (?1, 'https://example.com/walk.mp3', 'en')",
            [word_id],
        )
        .unwrap();

        // Delete the word - links and audio must cascade
        conn.execute("DELETE FROM words WHERE id = ?1", [word_id])
            .unwrap();

        let links: i64 = conn
            .query_row("SELECT COUNT(*) FROM word_definitions", [], |row| row.get(0))
            .unwrap();
        let audio: i64 = conn
            .query_row("SELECT COUNT(*) FROM audio", [], |row| row.get(0))
            .unwrap();
        assert_eq!(links, 0);
        assert_eq!(audio, 0);

        // The definition itself survives; only the link is gone
        let definitions: i64 = conn
            .query_row("SELECT COUNT(*) FROM definitions", [], |row| row.get(0))
            .unwrap();
        assert_eq!(definitions, 1);
    }

    #[test]
    fn test_duplicate_relationship_rejected_without_upsert() {
        let conn = Connection::open_in_memory().unwrap();
        apply_migrations(&conn).unwrap();

        conn.execute(
            "INSERT INTO words (text, language) VALUES ('walk', 'en'), ('walked', 'en')",
            [],
        )
        .unwrap();

        conn.execute(
            "INSERT INTO relationships (from_word_id, to_word_id, relation_type) VALUES (1, 2, 'past-tense')",
            [],
        )
        .unwrap();
        let duplicate = conn.execute(
            "INSERT INTO relationships (from_word_id, to_word_id, relation_type) VALUES (1, 2, 'past-tense')",
            [],
        );
        assert!(duplicate.is_err());
    }
}
