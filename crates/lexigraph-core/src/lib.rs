//! Core types for the lexigraph ingestion pipeline
//!
//! This crate is the foundation of the workspace: it defines the
//! intermediate word graph produced by the parser, the closed relationship
//! vocabulary, and the storage abstraction the materializer implements.
//!
//! ## Type Ownership
//!
//! - **Graph types** (`WordNode`, `DefinitionNode`, `ExampleNode`,
//!   `RelationshipEdge`, `ParsedEntry`): canonical definitions live here;
//!   the parser crate builds them, the storage crate consumes them.
//! - **Storage abstraction** (`GraphStore`, `StoreError`): defined here so
//!   the pipeline depends on the trait, not on a backend (Dependency
//!   Inversion, same split as the rest of the workspace).
//!
//! Nothing in this crate performs I/O.

pub mod graph;
pub mod relation;
pub mod report;
pub mod store;

pub use graph::{
    DefinitionNode, ExampleNode, ParsedEntry, RelationshipEdge, SubWordDescriptor, SubWordOrigin,
    WordKey, WordNode,
};
pub use relation::RelationType;
pub use report::{BatchReport, EntryReport, IngestOutcome};
pub use store::{GraphStore, MaterializedEntry, StoreError, StoreResult, StoreStats};
