//! Storage abstraction
//!
//! The pipeline depends on [`GraphStore`] rather than on a concrete
//! backend, so ingestion logic can be tested against an in-memory mock and
//! backends can evolve independently.

use crate::graph::ParsedEntry;
use async_trait::async_trait;
use std::collections::HashMap;
use std::time::Instant;
use thiserror::Error;

/// Errors surfaced by a graph store backend.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("connection error: {0}")]
    Connection(String),

    #[error("migration error: {0}")]
    Migration(String),

    #[error("query error: {0}")]
    Query(String),

    /// An edge endpoint named a key with no matching word in the entry.
    #[error("edge references unknown word key '{key}'")]
    UnknownEdgeKey { key: String },

    /// The entry's write deadline passed before it committed.
    #[error("storage timed out")]
    Timeout,

    #[error("storage error: {0}")]
    Internal(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// What one materialization call wrote, for reporting and tests.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MaterializedEntry {
    /// Durable id of the entry's main word
    pub main_word_id: i64,
    /// Durable ids of sub-words, keyed by their cleaned text
    pub sub_word_ids: HashMap<String, i64>,
    /// Definitions linked to words in this call (new or pre-existing rows)
    pub definitions_linked: usize,
    /// Example rows touched in this call
    pub examples_written: usize,
    /// Relationship rows touched in this call
    pub relationships_written: usize,
}

impl MaterializedEntry {
    /// Words touched, main included.
    pub fn words_touched(&self) -> usize {
        1 + self.sub_word_ids.len()
    }
}

/// Row counts across the whole store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreStats {
    pub words: u64,
    pub definitions: u64,
    pub examples: u64,
    pub relationships: u64,
    pub audio: u64,
}

/// Persistence boundary for parsed entries.
///
/// Implementations must make `materialize` atomic and idempotent: the
/// whole entry lands in one transaction, and replaying the same entry
/// converges on identical rows instead of duplicating them.
#[async_trait]
pub trait GraphStore: Send + Sync {
    /// Persist one resolved entry and report what was written.
    ///
    /// A deadline, when given, bounds the whole write including any wait
    /// for the backend's connection: once it passes, the implementation
    /// must give up with [`StoreError::Timeout`] rather than commit.
    async fn materialize(
        &self,
        entry: &ParsedEntry,
        deadline: Option<Instant>,
    ) -> StoreResult<MaterializedEntry>;

    /// Current row counts, for status display.
    async fn stats(&self) -> StoreResult<StoreStats>;
}
