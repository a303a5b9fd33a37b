use rusqlite::{Connection, Result};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::debug;

/// The sample catalog. One instance is safe to share across threads; every
/// call takes the connection lock for its duration.
pub struct Catalog {
    conn: Mutex<Connection>,
}

impl Catalog {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path)?;
        let catalog = Catalog {
            conn: Mutex::new(conn),
        };
        catalog.configure_pragmas()?;
        catalog.migrate_schema()?;
        Ok(catalog)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let catalog = Catalog {
            conn: Mutex::new(conn),
        };
        catalog.configure_pragmas()?;
        catalog.migrate_schema()?;
        Ok(catalog)
    }

    fn configure_pragmas(&self) -> Result<()> {
        self.connection().execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;
             PRAGMA foreign_keys = ON;
             PRAGMA busy_timeout = 5000;",
        )?;
        debug!("SQLite pragmas configured (WAL mode, foreign keys on)");
        Ok(())
    }

    fn migrate_schema(&self) -> Result<()> {
        let conn = self.connection();
        let version: i64 = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;
        conn.execute_batch(include_str!("schema.sql"))?;
        debug!("Catalog schema ready (was version {})", version);
        Ok(())
    }

    /// Locks the underlying connection, recovering from a poisoned lock.
    pub fn connection(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
