//! Versioned schema for the NeuroMark store.
//!
//! Steps are listed in [`MIGRATIONS`] and applied in order. Each applied
//! step is recorded in `schema_version`, so reopening an existing file only
//! runs the steps it has not seen.

use rusqlite::{params, Connection};

/// One schema step: the version it brings the file to, a note for the
/// `schema_version` row, and the SQL that performs it.
struct Migration {
    version: i32,
    description: &'static str,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    description: "Key-value store for library collections",
    sql: "CREATE TABLE IF NOT EXISTS kv_store (
              key TEXT PRIMARY KEY,
              value TEXT NOT NULL,
              updated_at INTEGER NOT NULL
          );",
}];

/// Version of the newest step in [`MIGRATIONS`].
pub const CURRENT_SCHEMA_VERSION: i32 = 1;

/// Highest applied version, or 0 for a fresh file.
pub fn get_schema_version(conn: &Connection) -> i32 {
    conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |row| row.get(0),
    )
    .unwrap_or(0)
}

/// Brings the schema up to [`CURRENT_SCHEMA_VERSION`].
///
/// Each pending step runs inside its own transaction together with its
/// `schema_version` row.
pub fn run_all(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (
             version INTEGER PRIMARY KEY,
             applied_at INTEGER NOT NULL,
             description TEXT NOT NULL
         );",
    )?;

    let current = get_schema_version(conn);
    for step in MIGRATIONS.iter().filter(|m| m.version > current) {
        tracing::debug!("applying schema v{}: {}", step.version, step.description);
        let tx = conn.unchecked_transaction()?;
        tx.execute_batch(step.sql)?;
        tx.execute(
            "INSERT INTO schema_version (version, applied_at, description) VALUES (?1, ?2, ?3)",
            params![step.version, chrono::Utc::now().timestamp(), step.description],
        )?;
        tx.commit()?;
    }
    Ok(())
}
