//! Entry Ingestion Pipeline Orchestrator
//!
//! This module implements the pipeline that turns provider entry
//! documents into persisted word graph rows.
//!
//! ## Pipeline Architecture
//!
//! 1. **Parse**: Decode the tagged-array document into the intermediate
//!    graph (headword, definitions, sub-words) using lexigraph-parser
//! 2. **Resolve**: Derive typed relationship edges from sub-word
//!    provenance
//! 3. **Materialize**: Persist the whole graph in one store transaction
//!
//! ## Design Principles
//!
//! - **Orchestration Only**: This crate coordinates; parsing and
//!   persistence live in their own crates
//! - **Dependency Injection**: The store arrives as `Arc<dyn GraphStore>`
//! - **Failure Isolation**: One bad entry never aborts the batch; each
//!   entry reports its own outcome

use anyhow::{Context, Result};
use lexigraph_core::{BatchReport, EntryReport, GraphStore, IngestOutcome, StoreError};
use lexigraph_parser::{parse_entry, resolve_edges};
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Configuration for ingestion behavior
#[derive(Debug, Clone)]
pub struct IngestOptions {
    /// Language code stamped on every node the pipeline produces
    pub language: String,
    /// Per-entry write budget; an entry that exceeds it rolls back
    pub store_timeout: Duration,
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self {
            language: "en".to_string(),
            store_timeout: Duration::from_secs(30),
        }
    }
}

/// The main ingestion orchestrator
///
/// Coordinates all phases of entry ingestion. This is the single entry
/// point for turning provider documents into graph rows, shared by the
/// CLI and any future frontends.
///
/// # Architecture
///
/// ```text
/// EntryIngestor (orchestration)
///   ├─> lexigraph-parser (Phase 1: intermediate graph)
///   ├─> resolve_edges    (Phase 2: typed edges)
///   └─> GraphStore       (Phase 3: one transaction per entry)
/// ```
pub struct EntryIngestor {
    /// Persistence backend (Phase 3) - backend-agnostic via GraphStore
    store: Arc<dyn GraphStore>,

    /// Configuration
    options: IngestOptions,
}

impl EntryIngestor {
    /// Create a new ingestor with default options
    pub fn new(store: Arc<dyn GraphStore>) -> Self {
        Self::with_options(store, IngestOptions::default())
    }

    /// Create a new ingestor with custom options
    pub fn with_options(store: Arc<dyn GraphStore>, options: IngestOptions) -> Self {
        Self { store, options }
    }

    /// Ingest one entry document through all phases.
    ///
    /// `label` identifies the entry in logs and the report; the parsed
    /// headword replaces it once known. Never fails the caller: parse
    /// and storage errors become a `Failed` outcome in the report.
    pub async fn ingest_value(&self, label: &str, document: &Value) -> EntryReport {
        let start = Instant::now();
        debug!(entry = %label, "Ingesting entry");

        // Phase 1: Parse
        let mut entry = match parse_entry(document, &self.options.language) {
            Ok(Some(entry)) => entry,
            Ok(None) => {
                debug!(entry = %label, "No headword; treating as a suggestion response");
                return EntryReport {
                    label: label.to_string(),
                    outcome: IngestOutcome::NoHeadword,
                    warnings: Vec::new(),
                    elapsed: start.elapsed(),
                };
            }
            Err(err) => {
                warn!(entry = %label, error = %err, "Entry rejected by parser");
                return EntryReport {
                    label: label.to_string(),
                    outcome: IngestOutcome::Failed {
                        error: err.to_string(),
                    },
                    warnings: Vec::new(),
                    elapsed: start.elapsed(),
                };
            }
        };
        let label = entry.main.text.clone();

        // Phase 2: Resolve relationship edges
        resolve_edges(&mut entry);
        debug!(
            entry = %label,
            sub_words = entry.sub_words.len(),
            edges = entry.edges.len(),
            "Resolved relationship edges"
        );

        // Phase 3: Materialize inside one store transaction, bounded by a
        // write deadline. The store enforces the deadline itself: an
        // expired entry rolls back rather than committing behind a
        // failure report.
        let deadline = Instant::now() + self.options.store_timeout;
        let outcome = match self.store.materialize(&entry, Some(deadline)).await {
            Ok(receipt) => {
                info!(
                    entry = %label,
                    words = receipt.words_touched(),
                    definitions = receipt.definitions_linked,
                    examples = receipt.examples_written,
                    relationships = receipt.relationships_written,
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "Entry materialized"
                );
                IngestOutcome::Ingested(receipt)
            }
            Err(StoreError::Timeout) => {
                warn!(
                    entry = %label,
                    timeout_ms = self.options.store_timeout.as_millis() as u64,
                    "Materialization timed out"
                );
                IngestOutcome::Failed {
                    error: format!(
                        "storage timed out after {}ms",
                        self.options.store_timeout.as_millis()
                    ),
                }
            }
            Err(err) => {
                warn!(entry = %label, error = %err, "Failed to materialize entry");
                IngestOutcome::Failed {
                    error: err.to_string(),
                }
            }
        };

        EntryReport {
            label,
            outcome,
            warnings: entry.warnings,
            elapsed: start.elapsed(),
        }
    }

    /// Ingest every entry in a provider response document.
    ///
    /// Provider lookups answer with an array of entry documents; a bare
    /// object is treated as a single-entry response. Entries are
    /// processed sequentially, one transaction each.
    pub async fn ingest_response(&self, label: &str, response: &Value) -> BatchReport {
        let mut report = BatchReport::default();

        match response {
            Value::Array(documents) => {
                for (index, document) in documents.iter().enumerate() {
                    let entry_label = format!("{label}#{index}");
                    report.push(self.ingest_value(&entry_label, document).await);
                }
            }
            document => report.push(self.ingest_value(label, document).await),
        }

        info!(
            response = %label,
            entries = report.entries.len(),
            ingested = report.ingested(),
            skipped = report.skipped(),
            failed = report.failed(),
            "Response ingested"
        );
        report
    }

    /// Read a JSON response file from disk and ingest its entries.
    pub async fn ingest_file(&self, path: &Path) -> Result<BatchReport> {
        let raw = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read entry file '{}'", path.display()))?;
        let response: Value = serde_json::from_str(&raw)
            .with_context(|| format!("Invalid JSON in entry file '{}'", path.display()))?;

        let label = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        Ok(self.ingest_response(&label, &response).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use lexigraph_core::{
        MaterializedEntry, ParsedEntry, StoreError, StoreResult, StoreStats,
    };
    use parking_lot::Mutex;
    use serde_json::json;

    /// Store double that records entries and can be told to fail or stall
    #[derive(Default)]
    struct RecordingStore {
        entries: Mutex<Vec<ParsedEntry>>,
        fail: bool,
        stall: Option<Duration>,
    }

    #[async_trait]
    impl GraphStore for RecordingStore {
        async fn materialize(
            &self,
            entry: &ParsedEntry,
            deadline: Option<Instant>,
        ) -> StoreResult<MaterializedEntry> {
            if let Some(stall) = self.stall {
                tokio::time::sleep(stall).await;
            }
            // Honor the deadline contract the way a real backend must
            if deadline.is_some_and(|deadline| Instant::now() >= deadline) {
                return Err(StoreError::Timeout);
            }
            if self.fail {
                return Err(StoreError::Query("disk on fire".to_string()));
            }

            self.entries.lock().push(entry.clone());
            let sub_word_ids = entry
                .sub_words
                .iter()
                .enumerate()
                .map(|(i, sub)| (sub.key.clone(), i as i64 + 2))
                .collect();
            Ok(MaterializedEntry {
                main_word_id: 1,
                sub_word_ids,
                definitions_linked: entry.definitions.len(),
                examples_written: 0,
                relationships_written: entry.edges.len(),
            })
        }

        async fn stats(&self) -> StoreResult<StoreStats> {
            Ok(StoreStats::default())
        }
    }

    fn walk_document() -> Value {
        json!({
            "meta": {"id": "walk:2", "src": "collegiate"},
            "hwi": {"hw": "walk"},
            "fl": "verb",
            "ins": [{"if": "walked"}],
            "shortdef": ["to move along on foot"],
            "def": [{"sseq": [[
                ["sense", {"dt": [["text", "{bc}to move along on foot"]]}]
            ]]}]
        })
    }

    #[tokio::test]
    async fn ingest_runs_all_three_phases() {
        let store = Arc::new(RecordingStore::default());
        let ingestor = EntryIngestor::new(store.clone());

        let report = ingestor.ingest_value("entry 0", &walk_document()).await;

        assert!(report.outcome.is_ingested());
        assert_eq!(report.label, "walk");

        let recorded = store.entries.lock();
        assert_eq!(recorded.len(), 1);
        // Edges were resolved before the store saw the entry
        assert!(!recorded[0].edges.is_empty());
    }

    #[tokio::test]
    async fn suggestion_documents_are_skipped_not_failed() {
        let store = Arc::new(RecordingStore::default());
        let ingestor = EntryIngestor::new(store.clone());

        let report = ingestor.ingest_value("entry 0", &json!("walker")).await;

        assert_eq!(report.outcome, IngestOutcome::NoHeadword);
        assert!(store.entries.lock().is_empty());
    }

    #[tokio::test]
    async fn unparseable_documents_fail_without_reaching_the_store() {
        let store = Arc::new(RecordingStore::default());
        let ingestor = EntryIngestor::new(store.clone());

        let report = ingestor.ingest_value("entry 0", &json!(42)).await;

        assert!(matches!(report.outcome, IngestOutcome::Failed { .. }));
        assert!(store.entries.lock().is_empty());
    }

    #[tokio::test]
    async fn store_errors_become_failed_outcomes() {
        let store = Arc::new(RecordingStore {
            fail: true,
            ..Default::default()
        });
        let ingestor = EntryIngestor::new(store);

        let report = ingestor.ingest_value("entry 0", &walk_document()).await;

        match report.outcome {
            IngestOutcome::Failed { error } => assert!(error.contains("disk on fire")),
            other => panic!("expected failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn slow_stores_hit_the_timeout() {
        let store = Arc::new(RecordingStore {
            stall: Some(Duration::from_millis(200)),
            ..Default::default()
        });
        let ingestor = EntryIngestor::with_options(
            store.clone(),
            IngestOptions {
                store_timeout: Duration::from_millis(10),
                ..Default::default()
            },
        );

        let report = ingestor.ingest_value("entry 0", &walk_document()).await;

        match report.outcome {
            IngestOutcome::Failed { error } => assert!(error.contains("timed out")),
            other => panic!("expected timeout failure, got {other:?}"),
        }
        // Timed-out entries are never recorded by the store
        assert!(store.entries.lock().is_empty());
    }

    #[tokio::test]
    async fn batch_isolates_failures_per_entry() {
        let store = Arc::new(RecordingStore::default());
        let ingestor = EntryIngestor::new(store.clone());

        let response = json!([walk_document(), "stroll", 42]);
        let report = ingestor.ingest_response("walk", &response).await;

        assert_eq!(report.entries.len(), 3);
        assert_eq!(report.ingested(), 1);
        assert_eq!(report.skipped(), 1);
        assert_eq!(report.failed(), 1);
        assert_eq!(store.entries.lock().len(), 1);
    }

    #[tokio::test]
    async fn bare_object_responses_ingest_as_one_entry() {
        let store = Arc::new(RecordingStore::default());
        let ingestor = EntryIngestor::new(store);

        let report = ingestor.ingest_response("walk", &walk_document()).await;

        assert_eq!(report.entries.len(), 1);
        assert_eq!(report.ingested(), 1);
    }

    #[tokio::test]
    async fn ingest_file_reports_missing_and_malformed_files() {
        let store = Arc::new(RecordingStore::default());
        let ingestor = EntryIngestor::new(store);

        let missing = ingestor.ingest_file(Path::new("/no/such/file.json")).await;
        assert!(missing.is_err());

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "{not json").unwrap();
        let malformed = ingestor.ingest_file(&path).await;
        assert!(malformed.unwrap_err().to_string().contains("Invalid JSON"));
    }
}
