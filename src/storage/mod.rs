// src/storage/mod.rs — Database manager

pub mod schema;
pub mod store;

use rusqlite::Connection;
use std::path::Path;
use std::time::Duration;

pub use store::Store;

/// Overlapping sweeps may hold write locks briefly; wait rather than fail.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Owns the SQLite connection behind the engine's [`Store`].
pub struct Database {
    pub store: Store,
}

impl Database {
    /// Open (or create) the database at the given path.
    pub fn open(path: &Path) -> anyhow::Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;
        // Enable WAL mode for better concurrent performance
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        conn.busy_timeout(BUSY_TIMEOUT)?;

        schema::run_migrations(&conn)?;

        Ok(Self {
            store: Store::new(conn),
        })
    }

    /// Create an in-memory database (for testing).
    pub fn in_memory() -> anyhow::Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        schema::run_migrations(&conn)?;
        Ok(Self {
            store: Store::new(conn),
        })
    }
}
