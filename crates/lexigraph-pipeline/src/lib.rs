//! Lexigraph Ingestion Pipeline
//!
//! Orchestrates the parse → resolve → materialize flow for provider
//! entry documents. The pipeline owns sequencing, per-entry failure
//! isolation, and the storage timeout; parsing lives in
//! `lexigraph-parser` and persistence behind `lexigraph_core::GraphStore`.

pub mod ingest;

pub use ingest::{EntryIngestor, IngestOptions};
