//! The SQLite handle behind [`crate::services::local_store::LocalStore`].

use std::path::Path;
use std::time::Duration;

use rusqlite::Connection;

use super::migrations;

/// A migrated SQLite connection. Shared as `Arc<Database>`.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Opens or creates the store file at `path`, creating missing parent
    /// directories, and migrates it to the current schema.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, rusqlite::Error> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            // Connection::open reports the real failure if this did not work.
            let _ = std::fs::create_dir_all(parent);
        }
        let conn = Connection::open(path)?;
        conn.busy_timeout(Duration::from_secs(2))?;
        conn.execute_batch("PRAGMA journal_mode = WAL;")?;
        Self::migrated(conn)
    }

    /// A throwaway store, used by tests and when no data directory exists.
    pub fn open_in_memory() -> Result<Self, rusqlite::Error> {
        Self::migrated(Connection::open_in_memory()?)
    }

    fn migrated(conn: Connection) -> Result<Self, rusqlite::Error> {
        migrations::run_all(&conn)?;
        Ok(Self { conn })
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}
