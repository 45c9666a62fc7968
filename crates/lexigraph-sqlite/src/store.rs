//! GraphStore implementation backed by SQLite
//!
//! Materializes one parsed entry per IMMEDIATE transaction: words are
//! upserted by (text, language), definitions matched in full or freshly
//! inserted, links and audio receive their primary flags on first
//! write, and relationship edges land in bounded multi-row batches with
//! their symbolic endpoints resolved to row ids.

use crate::connection::SqlitePool;
use crate::error::{SqliteError, SqliteResult};
use async_trait::async_trait;
use chrono::Utc;
use lexigraph_core::{
    DefinitionNode, GraphStore, MaterializedEntry, ParsedEntry, StoreError, StoreResult,
    StoreStats, WordKey, WordNode,
};
use rusqlite::{params, Connection, ToSql, Transaction, TransactionBehavior};
use std::collections::HashMap;
use std::time::Instant;
use tracing::debug;

/// Upper bounds for multi-row VALUES batches inside the entry transaction
const EXAMPLE_BATCH: usize = 10;
const RELATIONSHIP_BATCH: usize = 20;

/// SQLite implementation of the word graph store
#[derive(Clone)]
pub struct SqliteGraphStore {
    pool: SqlitePool,
}

impl SqliteGraphStore {
    /// Create a new store on top of the given connection pool
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl GraphStore for SqliteGraphStore {
    async fn materialize(
        &self,
        entry: &ParsedEntry,
        deadline: Option<Instant>,
    ) -> StoreResult<MaterializedEntry> {
        let pool = self.pool.clone();
        let entry = entry.clone();

        tokio::task::spawn_blocking(move || {
            pool.with_connection_mut(|conn| materialize_entry(conn, &entry, deadline))
        })
        .await
        .map_err(|e| StoreError::Internal(e.to_string()))?
        .map_err(Into::into)
    }

    async fn stats(&self) -> StoreResult<StoreStats> {
        let pool = self.pool.clone();

        tokio::task::spawn_blocking(move || pool.with_connection(count_rows))
            .await
            .map_err(|e| StoreError::Internal(e.to_string()))?
            .map_err(Into::into)
    }
}

/// Persist one parsed entry inside a single write transaction.
///
/// The deadline is checked once the connection is held and again before
/// commit; an expired deadline aborts the entry, never commits it.
fn materialize_entry(
    conn: &mut Connection,
    entry: &ParsedEntry,
    deadline: Option<Instant>,
) -> SqliteResult<MaterializedEntry> {
    check_deadline(deadline)?;

    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let now = Utc::now().to_rfc3339();

    let main_word_id = upsert_word(&tx, &entry.main, &now)?;

    let mut sub_word_ids = HashMap::with_capacity(entry.sub_words.len());
    for sub in &entry.sub_words {
        let id = upsert_word(&tx, &sub.word, &now)?;
        sub_word_ids.insert(sub.key.clone(), id);
    }

    let mut definitions_linked = 0;
    let mut examples_written = 0;

    for definition in &entry.definitions {
        examples_written += link_definition(&tx, main_word_id, definition, &now)?;
        definitions_linked += 1;
    }
    for sub in &entry.sub_words {
        let word_id = sub_word_ids[&sub.key];
        for definition in &sub.definitions {
            examples_written += link_definition(&tx, word_id, definition, &now)?;
            definitions_linked += 1;
        }
    }

    let relationships_written = write_relationships(&tx, entry, main_word_id, &sub_word_ids, &now)?;

    check_deadline(deadline)?;
    tx.commit()?;

    debug!(
        word = %entry.main.text,
        words = sub_word_ids.len() + 1,
        definitions = definitions_linked,
        examples = examples_written,
        relationships = relationships_written,
        "Materialized entry"
    );

    Ok(MaterializedEntry {
        main_word_id,
        sub_word_ids,
        definitions_linked,
        examples_written,
        relationships_written,
    })
}

/// Insert or update a word by its (text, language) natural key.
///
/// Detail columns only move forward: an upsert never overwrites an
/// existing value with NULL.
fn upsert_word(tx: &Transaction, word: &WordNode, now: &str) -> SqliteResult<i64> {
    let id = tx.query_row(
        r#"
        INSERT INTO words (text, language, phonetic, etymology, source_id, created_at, updated_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)
        ON CONFLICT(text, language) DO UPDATE SET
            phonetic = COALESCE(excluded.phonetic, words.phonetic),
            etymology = COALESCE(excluded.etymology, words.etymology),
            source_id = COALESCE(excluded.source_id, words.source_id),
            updated_at = excluded.updated_at
        RETURNING id
        "#,
        params![
            word.text,
            word.language,
            word.phonetic,
            word.etymology,
            word.source_id,
            now,
        ],
        |row| row.get(0),
    )?;

    write_audio(tx, id, word, now)?;

    Ok(id)
}

/// Upsert the word's audio rows, keyed by URL.
///
/// The first URL becomes primary when the word has no primary yet;
/// re-linking an existing URL clears its orphan flag.
fn write_audio(tx: &Transaction, word_id: i64, word: &WordNode, now: &str) -> SqliteResult<()> {
    if word.audio_urls.is_empty() {
        return Ok(());
    }

    let has_primary: bool = tx.query_row(
        "SELECT EXISTS(SELECT 1 FROM audio WHERE word_id = ?1 AND is_primary = 1)",
        [word_id],
        |row| row.get(0),
    )?;

    for (index, url) in word.audio_urls.iter().enumerate() {
        let is_primary = !has_primary && index == 0;
        tx.execute(
            r#"
            INSERT INTO audio (word_id, url, source, language, is_primary, is_orphaned, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, 0, ?6)
            ON CONFLICT(url) DO UPDATE SET
                is_orphaned = 0
            "#,
            params![word_id, url, word.source_id, word.language, is_primary, now],
        )?;
    }

    Ok(())
}

/// Match or insert the definition row, link it to the word, and write
/// its examples. Returns the number of examples written.
fn link_definition(
    tx: &Transaction,
    word_id: i64,
    definition: &DefinitionNode,
    now: &str,
) -> SqliteResult<usize> {
    let definition_id = find_or_create_definition(tx, definition, now)?;
    attach_definition(tx, word_id, definition_id, now)?;
    write_examples(tx, definition_id, definition, now)
}

/// Definitions carry no unique constraint; an existing row must match
/// on the full attribute tuple (NULL-safe via IS) to be reused.
fn find_or_create_definition(
    tx: &Transaction,
    definition: &DefinitionNode,
    now: &str,
) -> SqliteResult<i64> {
    let existing: Option<i64> = tx
        .query_row(
            r#"
            SELECT id FROM definitions
            WHERE text = ?1 AND part_of_speech = ?2 AND language = ?3 AND source = ?4
              AND subject_status IS ?5 AND labels IS ?6
              AND grammatical_note IS ?7 AND usage_note IS ?8
              AND in_short_def = ?9 AND plural_only = ?10
            LIMIT 1
            "#,
            params![
                definition.text,
                definition.part_of_speech,
                definition.language,
                definition.source,
                definition.subject_status,
                definition.labels,
                definition.grammatical_note,
                definition.usage_note,
                definition.in_short_def,
                definition.plural_only,
            ],
            |row| row.get(0),
        )
        .optional()?;

    if let Some(id) = existing {
        return Ok(id);
    }

    tx.execute(
        r#"
        INSERT INTO definitions
            (text, part_of_speech, language, source, subject_status, labels,
             grammatical_note, usage_note, in_short_def, plural_only, created_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
        "#,
        params![
            definition.text,
            definition.part_of_speech,
            definition.language,
            definition.source,
            definition.subject_status,
            definition.labels,
            definition.grammatical_note,
            definition.usage_note,
            definition.in_short_def,
            definition.plural_only,
            now,
        ],
    )?;

    Ok(tx.last_insert_rowid())
}

/// Link a definition to a word; the word's first link is primary and
/// stays primary across re-ingests.
fn attach_definition(
    tx: &Transaction,
    word_id: i64,
    definition_id: i64,
    now: &str,
) -> SqliteResult<()> {
    let has_primary: bool = tx.query_row(
        "SELECT EXISTS(SELECT 1 FROM word_definitions WHERE word_id = ?1 AND is_primary = 1)",
        [word_id],
        |row| row.get(0),
    )?;

    tx.execute(
        r#"
        INSERT INTO word_definitions (word_id, definition_id, is_primary, created_at)
        VALUES (?1, ?2, ?3, ?4)
        ON CONFLICT(word_id, definition_id) DO NOTHING
        "#,
        params![word_id, definition_id, !has_primary, now],
    )?;

    Ok(())
}

fn write_examples(
    tx: &Transaction,
    definition_id: i64,
    definition: &DefinitionNode,
    now: &str,
) -> SqliteResult<usize> {
    let mut written = 0;
    for batch in definition.examples.chunks(EXAMPLE_BATCH) {
        let sql = format!(
            "INSERT INTO examples (definition_id, text, grammatical_note, language, created_at) \
             VALUES {} \
             ON CONFLICT(definition_id, text) DO UPDATE SET \
                 grammatical_note = COALESCE(excluded.grammatical_note, examples.grammatical_note)",
            values_placeholders(batch.len(), 5)
        );
        let mut bindings: Vec<&dyn ToSql> = Vec::with_capacity(batch.len() * 5);
        for example in batch {
            bindings.push(&definition_id);
            bindings.push(&example.text);
            bindings.push(&example.grammatical_note);
            bindings.push(&example.language);
            bindings.push(&now);
        }
        tx.execute(&sql, bindings.as_slice())?;
        written += batch.len();
    }
    Ok(written)
}

/// Resolve each edge's symbolic endpoints against the ids upserted
/// earlier in this transaction, then write the edges in batches.
fn write_relationships(
    tx: &Transaction,
    entry: &ParsedEntry,
    main_word_id: i64,
    sub_word_ids: &HashMap<String, i64>,
    now: &str,
) -> SqliteResult<usize> {
    let mut resolved = Vec::with_capacity(entry.edges.len());
    for edge in &entry.edges {
        let from = word_id_for(&edge.from, main_word_id, sub_word_ids)?;
        let to = word_id_for(&edge.to, main_word_id, sub_word_ids)?;
        resolved.push((from, to, edge.relation.as_str(), edge.description.as_deref()));
    }

    let mut written = 0;
    for batch in resolved.chunks(RELATIONSHIP_BATCH) {
        let sql = format!(
            "INSERT INTO relationships \
                 (from_word_id, to_word_id, relation_type, description, created_at) \
             VALUES {} \
             ON CONFLICT(from_word_id, to_word_id, relation_type) DO UPDATE SET \
                 description = COALESCE(excluded.description, relationships.description)",
            values_placeholders(batch.len(), 5)
        );
        let mut bindings: Vec<&dyn ToSql> = Vec::with_capacity(batch.len() * 5);
        for (from, to, relation, description) in batch {
            bindings.push(from);
            bindings.push(to);
            bindings.push(relation);
            bindings.push(description);
            bindings.push(&now);
        }
        tx.execute(&sql, bindings.as_slice())?;
        written += batch.len();
    }
    Ok(written)
}

/// Cancellation from the async side never reaches a blocking task, so
/// the write deadline is enforced here: past it the entry errors out
/// and the open transaction, if any, rolls back on drop.
fn check_deadline(deadline: Option<Instant>) -> SqliteResult<()> {
    match deadline {
        Some(deadline) if Instant::now() >= deadline => Err(SqliteError::Timeout),
        _ => Ok(()),
    }
}

fn word_id_for(
    key: &WordKey,
    main_word_id: i64,
    sub_word_ids: &HashMap<String, i64>,
) -> SqliteResult<i64> {
    match key {
        WordKey::Main => Ok(main_word_id),
        WordKey::Sub(name) => sub_word_ids
            .get(name)
            .copied()
            .ok_or_else(|| SqliteError::UnknownEdgeEndpoint(name.clone())),
    }
}

/// `(?1, ?2, ..), (?3, ?4, ..), ..` for a multi-row VALUES clause
fn values_placeholders(rows: usize, width: usize) -> String {
    let mut sql = String::new();
    for row in 0..rows {
        if row > 0 {
            sql.push_str(", ");
        }
        sql.push('(');
        for col in 0..width {
            if col > 0 {
                sql.push_str(", ");
            }
            sql.push('?');
            sql.push_str(&(row * width + col + 1).to_string());
        }
        sql.push(')');
    }
    sql
}

fn count_rows(conn: &Connection) -> SqliteResult<StoreStats> {
    Ok(StoreStats {
        words: table_count(conn, "words")?,
        definitions: table_count(conn, "definitions")?,
        examples: table_count(conn, "examples")?,
        relationships: table_count(conn, "relationships")?,
        audio: table_count(conn, "audio")?,
    })
}

fn table_count(conn: &Connection, table: &str) -> SqliteResult<u64> {
    let count: i64 = conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| {
        row.get(0)
    })?;
    Ok(count as u64)
}

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> rusqlite::Result<Option<T>>;
}

impl<T> OptionalExt<T> for rusqlite::Result<T> {
    fn optional(self) -> rusqlite::Result<Option<T>> {
        match self {
            Ok(v) => Ok(Some(v)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lexigraph_core::{
        ExampleNode, RelationType, RelationshipEdge, SubWordDescriptor, SubWordOrigin,
    };

    fn walk_entry() -> ParsedEntry {
        let mut main = WordNode::new("walk", "en");
        main.phonetic = Some("ˈwȯk".to_string());
        main.etymology = Some("Middle English walken".to_string());
        main.source_id = Some("walk:2".to_string());
        main.audio_urls = vec![
            "https://media.lexicornu.com/audio/prons/en/mp3/w/walk0001.mp3".to_string(),
            "https://media.lexicornu.com/audio/prons/en/mp3/w/walk0002.mp3".to_string(),
        ];

        let mut first = DefinitionNode::new("to move along on foot", "verb", "en", "collegiate");
        first.in_short_def = true;
        first.examples.push(ExampleNode {
            text: "He walked to the store.".to_string(),
            grammatical_note: None,
            language: "en".to_string(),
        });
        let second = DefinitionNode::new("to traverse on foot", "verb", "en", "collegiate");

        let mut entry = ParsedEntry {
            main,
            ..Default::default()
        };
        entry.definitions = vec![first, second];
        entry.add_sub_word(SubWordDescriptor::new(
            WordNode::new("walked", "en"),
            SubWordOrigin::Inflection {
                label: None,
                part_of_speech: Some("verb".to_string()),
            },
        ));
        entry.edges = vec![
            RelationshipEdge::new(WordKey::Main, WordKey::sub("walked"), RelationType::Related),
            RelationshipEdge::new(
                WordKey::Main,
                WordKey::sub("walked"),
                RelationType::PastTense,
            ),
        ];
        entry
    }

    #[tokio::test]
    async fn test_materialize_writes_the_full_graph() {
        let pool = SqlitePool::memory().unwrap();
        let store = SqliteGraphStore::new(pool);

        let receipt = store.materialize(&walk_entry(), None).await.unwrap();
        assert_eq!(receipt.words_touched(), 2);
        assert_eq!(receipt.definitions_linked, 2);
        assert_eq!(receipt.examples_written, 1);
        assert_eq!(receipt.relationships_written, 2);

        let stats = store.stats().await.unwrap();
        assert_eq!(stats.words, 2);
        assert_eq!(stats.definitions, 2);
        assert_eq!(stats.examples, 1);
        assert_eq!(stats.relationships, 2);
        assert_eq!(stats.audio, 2);
    }

    #[tokio::test]
    async fn test_reingest_is_idempotent() {
        let pool = SqlitePool::memory().unwrap();
        let store = SqliteGraphStore::new(pool);

        store.materialize(&walk_entry(), None).await.unwrap();
        let first = store.stats().await.unwrap();
        store.materialize(&walk_entry(), None).await.unwrap();
        let second = store.stats().await.unwrap();

        assert_eq!(first.words, second.words);
        assert_eq!(first.definitions, second.definitions);
        assert_eq!(first.examples, second.examples);
        assert_eq!(first.relationships, second.relationships);
        assert_eq!(first.audio, second.audio);
    }

    #[tokio::test]
    async fn test_upsert_never_overwrites_detail_with_null() {
        let pool = SqlitePool::memory().unwrap();
        let store = SqliteGraphStore::new(pool.clone());

        store.materialize(&walk_entry(), None).await.unwrap();

        // Same word from a sparse second entry: no phonetic, new etymology
        let mut sparse = ParsedEntry {
            main: WordNode::new("walk", "en"),
            ..Default::default()
        };
        sparse.main.etymology = Some("updated note".to_string());
        store.materialize(&sparse, None).await.unwrap();

        let (phonetic, etymology): (Option<String>, Option<String>) = pool
            .with_connection(|conn| {
                Ok(conn.query_row(
                    "SELECT phonetic, etymology FROM words WHERE text = 'walk'",
                    [],
                    |row| Ok((row.get(0)?, row.get(1)?)),
                )?)
            })
            .unwrap();

        assert_eq!(phonetic.as_deref(), Some("ˈwȯk"));
        assert_eq!(etymology.as_deref(), Some("updated note"));
    }

    #[tokio::test]
    async fn test_first_links_are_primary_and_stay_primary() {
        let pool = SqlitePool::memory().unwrap();
        let store = SqliteGraphStore::new(pool.clone());

        store.materialize(&walk_entry(), None).await.unwrap();
        store.materialize(&walk_entry(), None).await.unwrap();

        let (primary_links, primary_audio): (i64, i64) = pool
            .with_connection(|conn| {
                let links = conn.query_row(
                    "SELECT COUNT(*) FROM word_definitions wd \
                     JOIN words w ON w.id = wd.word_id \
                     WHERE w.text = 'walk' AND wd.is_primary = 1",
                    [],
                    |row| row.get(0),
                )?;
                let audio = conn.query_row(
                    "SELECT COUNT(*) FROM audio WHERE is_primary = 1",
                    [],
                    |row| row.get(0),
                )?;
                Ok((links, audio))
            })
            .unwrap();

        assert_eq!(primary_links, 1);
        assert_eq!(primary_audio, 1);

        let first_is_primary: bool = pool
            .with_connection(|conn| {
                Ok(conn.query_row(
                    "SELECT wd.is_primary FROM word_definitions wd \
                     JOIN definitions d ON d.id = wd.definition_id \
                     WHERE d.text = 'to move along on foot'",
                    [],
                    |row| row.get(0),
                )?)
            })
            .unwrap();
        assert!(first_is_primary);
    }

    #[tokio::test]
    async fn test_example_note_backfills_on_reingest() {
        let pool = SqlitePool::memory().unwrap();
        let store = SqliteGraphStore::new(pool.clone());

        store.materialize(&walk_entry(), None).await.unwrap();

        let mut annotated = walk_entry();
        annotated.definitions[0].examples[0].grammatical_note =
            Some("used intransitively".to_string());
        store.materialize(&annotated, None).await.unwrap();

        let note: Option<String> = pool
            .with_connection(|conn| {
                Ok(conn.query_row(
                    "SELECT grammatical_note FROM examples WHERE text = 'He walked to the store.'",
                    [],
                    |row| row.get(0),
                )?)
            })
            .unwrap();
        assert_eq!(note.as_deref(), Some("used intransitively"));
    }

    #[tokio::test]
    async fn test_unknown_edge_endpoint_rolls_back_the_entry() {
        let pool = SqlitePool::memory().unwrap();
        let store = SqliteGraphStore::new(pool);

        let mut entry = walk_entry();
        entry.edges.push(RelationshipEdge::new(
            WordKey::Main,
            WordKey::sub("ghost"),
            RelationType::Synonym,
        ));

        let err = store.materialize(&entry, None).await.unwrap_err();
        assert!(matches!(err, StoreError::UnknownEdgeKey { .. }));

        // The whole transaction rolled back, including the word upserts
        let stats = store.stats().await.unwrap();
        assert_eq!(stats.words, 0);
        assert_eq!(stats.definitions, 0);
        assert_eq!(stats.relationships, 0);
    }

    #[tokio::test]
    async fn test_expired_deadline_aborts_without_writing() {
        let pool = SqlitePool::memory().unwrap();
        let store = SqliteGraphStore::new(pool);

        let err = store
            .materialize(&walk_entry(), Some(Instant::now()))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Timeout));

        // The reported timeout and the database agree: no rows landed
        let stats = store.stats().await.unwrap();
        assert_eq!(stats.words, 0);
        assert_eq!(stats.definitions, 0);
        assert_eq!(stats.examples, 0);
        assert_eq!(stats.audio, 0);
        assert_eq!(stats.relationships, 0);
    }

    #[tokio::test]
    async fn test_many_examples_span_batches() {
        let pool = SqlitePool::memory().unwrap();
        let store = SqliteGraphStore::new(pool);

        let mut entry = ParsedEntry {
            main: WordNode::new("run", "en"),
            ..Default::default()
        };
        let mut definition = DefinitionNode::new("to move swiftly", "verb", "en", "collegiate");
        for i in 0..23 {
            definition.examples.push(ExampleNode {
                text: format!("example sentence {i}"),
                grammatical_note: None,
                language: "en".to_string(),
            });
        }
        entry.definitions = vec![definition];

        let receipt = store.materialize(&entry, None).await.unwrap();
        assert_eq!(receipt.examples_written, 23);

        let stats = store.stats().await.unwrap();
        assert_eq!(stats.examples, 23);
    }
}
