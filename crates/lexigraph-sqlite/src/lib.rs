//! SQLite storage backend for lexigraph
//!
//! This crate persists the parsed word graph into SQLite, one entry per
//! write transaction.
//!
//! ## Features
//!
//! - **GraphStore**: transactional materialization of a parsed entry
//!   (words, definitions, examples, audio, relationship edges)
//! - **Idempotent upserts**: natural-key conflict handling so the same
//!   entry can be ingested repeatedly without duplicate rows
//! - **WAL Mode**: optimized for concurrent read access with
//!   write-ahead logging
//! - **Thread Safety**: Arc<Mutex<Connection>> pattern wrapped for
//!   async callers via spawn_blocking
//!
//! ## Usage
//!
//! ```rust,ignore
//! use lexigraph_sqlite::{SqliteConfig, SqliteGraphStore, SqlitePool};
//! use lexigraph_core::GraphStore;
//!
//! let pool = SqlitePool::new(SqliteConfig::new("./lexigraph.db"))?;
//! let store = SqliteGraphStore::new(pool);
//!
//! let receipt = store.materialize(&entry, None).await?;
//! ```

pub mod config;
pub mod connection;
pub mod error;
pub mod schema;
pub mod store;

// Re-exports
pub use config::SqliteConfig;
pub use connection::{DbStats, SqlitePool};
pub use error::{SqliteError, SqliteResult};
pub use store::SqliteGraphStore;
