//! Local persistence for the library collections.
//!
//! Each collection lives under its own key in the `kv_store` table as JSON;
//! the theme is stored as its bare wire string. Reads never fail: a missing
//! or unreadable key yields that key's built-in default, independently of
//! the others. Writes never fail either: when storage is unavailable the
//! in-memory state stays authoritative and the error is only logged.

use std::sync::Arc;

use rusqlite::{params, OptionalExtension};
use serde::Serialize;

use crate::database::connection::Database;
use crate::services::migration;
use crate::services::seed_data;
use crate::types::bookmark::{Bookmark, Project};
use crate::types::errors::StoreError;
use crate::types::state::{FullState, ThemePreference};

pub const BOOKMARKS_KEY: &str = "neuromark-data";
pub const CATEGORIES_KEY: &str = "neuromark-categories";
pub const PROJECTS_KEY: &str = "neuromark-projects";
pub const THEME_KEY: &str = "neuromark-theme";

/// Trait defining the local store interface.
pub trait LocalStoreTrait {
    fn get_raw(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set_raw(&self, key: &str, value: &str) -> Result<(), StoreError>;

    fn load_bookmarks(&self) -> Vec<Bookmark>;
    fn load_categories(&self) -> Vec<String>;
    fn load_projects(&self) -> Vec<Project>;
    fn load_theme(&self) -> ThemePreference;

    fn save_bookmarks(&self, bookmarks: &[Bookmark]);
    fn save_categories(&self, categories: &[String]);
    fn save_projects(&self, projects: &[Project]);
    fn save_theme(&self, theme: ThemePreference);

    /// Loads every collection, each with its own fallback.
    fn load_state(&self) -> FullState {
        FullState {
            bookmarks: self.load_bookmarks(),
            projects: self.load_projects(),
            categories: self.load_categories(),
            theme: self.load_theme(),
        }
    }

    /// Writes every collection.
    fn save_state(&self, state: &FullState) {
        self.save_bookmarks(&state.bookmarks);
        self.save_categories(&state.categories);
        self.save_projects(&state.projects);
        self.save_theme(state.theme);
    }
}

/// Local store backed by the SQLite key-value table, or by nothing at all.
#[derive(Clone)]
pub struct LocalStore {
    db: Option<Arc<Database>>,
}

impl LocalStore {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db: Some(db) }
    }

    /// A store for environments that deny persistence. Reads return the
    /// defaults and writes are dropped.
    pub fn unavailable() -> Self {
        Self { db: None }
    }

    pub fn is_available(&self) -> bool {
        self.db.is_some()
    }

    fn now() -> i64 {
        chrono::Utc::now().timestamp()
    }

    fn write_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) {
        let result = serde_json::to_string(value)
            .map_err(|e| StoreError::SerializationError(e.to_string()))
            .and_then(|json| self.set_raw(key, &json));
        if let Err(e) = result {
            tracing::debug!("local write of {} skipped: {}", key, e);
        }
    }

    fn read_json<T, F>(&self, key: &str, fallback: F) -> T
    where
        T: serde::de::DeserializeOwned,
        F: FnOnce() -> T,
    {
        match self.get_raw(key) {
            Ok(Some(raw)) => match serde_json::from_str(&raw) {
                Ok(value) => value,
                Err(e) => {
                    tracing::warn!("stored {} is unreadable, using defaults: {}", key, e);
                    fallback()
                }
            },
            Ok(None) => fallback(),
            Err(e) => {
                tracing::debug!("local read of {} failed, using defaults: {}", key, e);
                fallback()
            }
        }
    }
}

impl LocalStoreTrait for LocalStore {
    fn get_raw(&self, key: &str) -> Result<Option<String>, StoreError> {
        let db = self.db.as_ref().ok_or(StoreError::Unavailable)?;
        db.connection()
            .query_row(
                "SELECT value FROM kv_store WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| StoreError::DatabaseError(e.to_string()))
    }

    fn set_raw(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let db = self.db.as_ref().ok_or(StoreError::Unavailable)?;
        db.connection()
            .execute(
                "INSERT OR REPLACE INTO kv_store (key, value, updated_at) VALUES (?1, ?2, ?3)",
                params![key, value, Self::now()],
            )
            .map_err(|e| StoreError::DatabaseError(e.to_string()))?;
        Ok(())
    }

    /// Bookmarks pass through the migration function; an unreadable blob
    /// falls back to the starter bookmarks.
    fn load_bookmarks(&self) -> Vec<Bookmark> {
        match self.get_raw(BOOKMARKS_KEY) {
            Ok(Some(raw)) => match migration::migrate_records(&raw) {
                Ok(bookmarks) => bookmarks,
                Err(e) => {
                    tracing::warn!("stored bookmarks are unreadable, using defaults: {}", e);
                    seed_data::default_bookmarks()
                }
            },
            Ok(None) => seed_data::default_bookmarks(),
            Err(e) => {
                tracing::debug!("local read of bookmarks failed, using defaults: {}", e);
                seed_data::default_bookmarks()
            }
        }
    }

    fn load_categories(&self) -> Vec<String> {
        self.read_json(CATEGORIES_KEY, seed_data::default_categories)
    }

    fn load_projects(&self) -> Vec<Project> {
        self.read_json(PROJECTS_KEY, seed_data::default_projects)
    }

    fn load_theme(&self) -> ThemePreference {
        match self.get_raw(THEME_KEY) {
            Ok(Some(raw)) => ThemePreference::parse(raw.trim()).unwrap_or_default(),
            _ => ThemePreference::default(),
        }
    }

    fn save_bookmarks(&self, bookmarks: &[Bookmark]) {
        self.write_json(BOOKMARKS_KEY, bookmarks);
    }

    fn save_categories(&self, categories: &[String]) {
        self.write_json(CATEGORIES_KEY, categories);
    }

    fn save_projects(&self, projects: &[Project]) {
        self.write_json(PROJECTS_KEY, projects);
    }

    fn save_theme(&self, theme: ThemePreference) {
        if let Err(e) = self.set_raw(THEME_KEY, theme.as_str()) {
            tracing::debug!("local write of {} skipped: {}", THEME_KEY, e);
        }
    }
}
