//! Error types for SQLite storage

use lexigraph_core::StoreError;
use thiserror::Error;

/// SQLite storage error type
#[derive(Error, Debug)]
pub enum SqliteError {
    /// Database connection error
    #[error("Connection error: {0}")]
    Connection(String),

    /// Query execution error
    #[error("Query error: {0}")]
    Query(String),

    /// Schema/migration error
    #[error("Schema error: {0}")]
    Schema(String),

    /// A relationship edge names a word that was never upserted
    #[error("Unknown edge endpoint: {0}")]
    UnknownEdgeEndpoint(String),

    /// The entry's write deadline passed before commit
    #[error("Entry write timed out")]
    Timeout,

    /// Passthrough for raw rusqlite failures
    #[error("SQLite error: {0}")]
    Rusqlite(#[from] rusqlite::Error),
}

/// Result type for SQLite operations
pub type SqliteResult<T> = Result<T, SqliteError>;

impl From<SqliteError> for StoreError {
    fn from(err: SqliteError) -> Self {
        match err {
            SqliteError::Connection(msg) => Self::Connection(msg),
            SqliteError::Query(msg) => Self::Query(msg),
            SqliteError::Schema(msg) => Self::Migration(msg),
            SqliteError::UnknownEdgeEndpoint(key) => Self::UnknownEdgeKey { key },
            SqliteError::Timeout => Self::Timeout,
            SqliteError::Rusqlite(e) => Self::Query(e.to_string()),
        }
    }
}
