//! SQLite connection pool management
//!
//! Uses a simple Arc<Mutex<Connection>> pattern. SQLite in WAL mode
//! allows many readers but a single writer, so one guarded connection
//! keeps writer ordering trivial.

use crate::config::SqliteConfig;
use crate::error::{SqliteError, SqliteResult};
use crate::schema;
use parking_lot::Mutex;
use rusqlite::Connection;
use std::sync::Arc;
use tracing::{debug, info};

/// Thread-safe SQLite connection wrapper
#[derive(Clone)]
pub struct SqlitePool {
    conn: Arc<Mutex<Connection>>,
    config: SqliteConfig,
}

impl SqlitePool {
    /// Open (or create) the database at the configured path, apply
    /// pragmas, and run any pending migrations.
    pub fn new(config: SqliteConfig) -> SqliteResult<Self> {
        info!(path = ?config.path, "Opening SQLite database");

        let conn = match config.path.to_str() {
            Some(":memory:") => Connection::open_in_memory()?,
            _ => {
                let parent = config.path.parent().filter(|p| !p.as_os_str().is_empty());
                if let Some(dir) = parent {
                    std::fs::create_dir_all(dir).map_err(|e| {
                        SqliteError::Connection(format!("Failed to create directory: {}", e))
                    })?;
                }
                Connection::open(&config.path)?
            }
        };

        let pool = Self {
            conn: Arc::new(Mutex::new(conn)),
            config,
        };
        pool.initialize()?;

        Ok(pool)
    }

    /// In-memory pool for tests.
    pub fn memory() -> SqliteResult<Self> {
        Self::new(SqliteConfig::memory())
    }

    /// Run a closure against the shared connection.
    pub fn with_connection<F, T>(&self, f: F) -> SqliteResult<T>
    where
        F: FnOnce(&Connection) -> SqliteResult<T>,
    {
        let conn = self.conn.lock();
        f(&conn)
    }

    /// Run a closure that needs `&mut Connection` (transactions).
    pub fn with_connection_mut<F, T>(&self, f: F) -> SqliteResult<T>
    where
        F: FnOnce(&mut Connection) -> SqliteResult<T>,
    {
        let mut conn = self.conn.lock();
        f(&mut conn)
    }

    fn initialize(&self) -> SqliteResult<()> {
        self.with_connection(|conn| {
            self.configure_pragmas(conn)?;
            schema::apply_migrations(conn)?;

            info!("SQLite database initialized");
            Ok(())
        })
    }

    /// Apply connection pragmas as a single batch.
    fn configure_pragmas(&self, conn: &Connection) -> SqliteResult<()> {
        debug!("Applying connection pragmas");

        let mut batch = String::new();
        if self.config.wal_mode {
            batch.push_str("PRAGMA journal_mode = WAL;\n");
            batch.push_str("PRAGMA synchronous = NORMAL;\n");
        }
        if self.config.foreign_keys {
            batch.push_str("PRAGMA foreign_keys = ON;\n");
        }
        batch.push_str(&format!(
            "PRAGMA busy_timeout = {};\n",
            self.config.busy_timeout_ms
        ));
        batch.push_str(&format!("PRAGMA cache_size = {};\n", self.config.cache_size));
        if self.config.mmap_size > 0 {
            batch.push_str(&format!("PRAGMA mmap_size = {};\n", self.config.mmap_size));
        }
        batch.push_str("PRAGMA temp_store = MEMORY;\n");

        conn.execute_batch(&batch)?;
        Ok(())
    }

    /// File-level statistics from the SQLite page allocator.
    pub fn stats(&self) -> SqliteResult<DbStats> {
        self.with_connection(|conn| {
            let pragma = |name: &str| -> SqliteResult<u64> {
                let value: i64 =
                    conn.query_row(&format!("PRAGMA {};", name), [], |row| row.get(0))?;
                Ok(value as u64)
            };

            let page_count = pragma("page_count")?;
            let page_size = pragma("page_size")?;
            Ok(DbStats {
                page_count,
                page_size,
                freelist_count: pragma("freelist_count")?,
                total_size_bytes: page_count * page_size,
            })
        })
    }
}

/// Database file statistics
#[derive(Debug, Clone)]
pub struct DbStats {
    pub page_count: u64,
    pub page_size: u64,
    pub freelist_count: u64,
    pub total_size_bytes: u64,
}
