//! SQLite storage configuration

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Connection and pragma settings for the SQLite backend
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SqliteConfig {
    /// Database file path; `:memory:` opens an in-memory database
    pub path: PathBuf,
    /// WAL journaling for concurrent reads alongside the single writer
    pub wal_mode: bool,
    /// Enforce foreign key constraints
    pub foreign_keys: bool,
    /// How long a statement waits on a locked database before failing
    pub busy_timeout_ms: u32,
    /// Page cache size; negative values are KiB
    pub cache_size: i64,
    /// Memory-mapped I/O window in bytes; 0 disables mmap
    pub mmap_size: u64,
}

impl SqliteConfig {
    /// Configuration for a database at the given path, with default pragmas
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            ..Self::default()
        }
    }

    /// In-memory database, used by tests
    pub fn memory() -> Self {
        Self::new(":memory:")
    }
}

impl Default for SqliteConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("lexigraph.db"),
            wal_mode: true,
            foreign_keys: true,
            busy_timeout_ms: 5000,
            cache_size: -64000,
            mmap_size: 268_435_456,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_keeps_default_pragmas() {
        let config = SqliteConfig::new("/tmp/words.db");
        assert_eq!(config.path, PathBuf::from("/tmp/words.db"));
        assert!(config.wal_mode);
        assert!(config.foreign_keys);
        assert_eq!(config.busy_timeout_ms, 5000);
    }

    #[test]
    fn memory_config_uses_the_magic_path() {
        assert_eq!(SqliteConfig::memory().path.to_str(), Some(":memory:"));
    }
}
