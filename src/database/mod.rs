//! SQLite persistence for the local store.
//!
//! A single `kv_store` table holds the JSON-encoded bookmarks, projects,
//! categories and the theme string, one row per key:
//!
//! ```no_run
//! use neuromark::database::Database;
//!
//! let db = Database::open("neuromark.db").expect("failed to open database");
//! let rows: i64 = db
//!     .connection()
//!     .query_row("SELECT COUNT(*) FROM kv_store", [], |row| row.get(0))
//!     .expect("count rows");
//! ```

pub mod connection;
pub mod migrations;

pub use connection::Database;
