//! Upgrades persisted bookmark records to the current shape.
//!
//! Records are decoded as a [`PersistedBookmark`]: either the current shape,
//! which passes through untouched, or the legacy revision where categories
//! and project links were single values and several fields were optional.
//! Each legacy revision has its own explicit upgrade into [`Bookmark`].

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Value;

use crate::types::bookmark::{Bookmark, Project};
use crate::types::errors::MigrationError;
use crate::types::state::{CloudState, ThemePreference};

/// Category assigned to legacy records that carry none.
pub const FALLBACK_CATEGORY: &str = "Other";

/// A bookmark record as found in storage, tagged by schema revision.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum PersistedBookmark {
    Current(Bookmark),
    Legacy(LegacyBookmark),
}

/// Pre-projects revision: singular `category` and `projectId`, no contexts
/// and no pin flag. Later partial upgrades may carry some plural fields.
///
/// Every field decodes leniently: a value of the wrong type reads as absent
/// and non-string list elements are skipped, so any JSON object upgrades.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyBookmark {
    #[serde(default, deserialize_with = "lenient::text")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub url: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub summary: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub category: Option<String>,
    #[serde(default, deserialize_with = "lenient::texts")]
    pub categories: Option<Vec<String>>,
    #[serde(default, deserialize_with = "lenient::texts")]
    pub tags: Option<Vec<String>>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub project_id: Option<String>,
    #[serde(default, deserialize_with = "lenient::texts")]
    pub project_ids: Option<Vec<String>>,
    #[serde(default, deserialize_with = "lenient::contexts")]
    pub project_contexts: Option<BTreeMap<String, String>>,
    #[serde(default, deserialize_with = "lenient::millis")]
    pub created_at: Option<i64>,
    #[serde(default, deserialize_with = "lenient::flag")]
    pub is_favorite: Option<bool>,
    #[serde(default, deserialize_with = "lenient::flag")]
    pub is_pinned: Option<bool>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub icon_emoji: Option<String>,
}

mod lenient {
    use std::collections::BTreeMap;

    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    pub fn text<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
        Ok(match Value::deserialize(d)? {
            Value::String(s) => Some(s),
            _ => None,
        })
    }

    /// Only an array counts; its string elements are kept.
    pub fn texts<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Vec<String>>, D::Error> {
        Ok(match Value::deserialize(d)? {
            Value::Array(items) => Some(
                items
                    .into_iter()
                    .filter_map(|v| match v {
                        Value::String(s) => Some(s),
                        _ => None,
                    })
                    .collect(),
            ),
            _ => None,
        })
    }

    pub fn contexts<'de, D: Deserializer<'de>>(
        d: D,
    ) -> Result<Option<BTreeMap<String, String>>, D::Error> {
        Ok(match Value::deserialize(d)? {
            Value::Object(map) => Some(
                map.into_iter()
                    .filter_map(|(k, v)| match v {
                        Value::String(s) => Some((k, s)),
                        _ => None,
                    })
                    .collect(),
            ),
            _ => None,
        })
    }

    pub fn millis<'de, D: Deserializer<'de>>(d: D) -> Result<Option<i64>, D::Error> {
        let value = Value::deserialize(d)?;
        Ok(value.as_i64().or_else(|| value.as_f64().map(|f| f as i64)))
    }

    pub fn flag<'de, D: Deserializer<'de>>(d: D) -> Result<Option<bool>, D::Error> {
        Ok(Value::deserialize(d)?.as_bool())
    }
}

impl LegacyBookmark {
    /// Legacy -> current.
    pub fn upgrade(self) -> Bookmark {
        let categories = match (self.categories, self.category) {
            (Some(list), _) => list,
            (None, Some(single)) if !single.is_empty() => vec![single],
            _ => vec![FALLBACK_CATEGORY.to_string()],
        };
        let project_ids = match (self.project_ids, self.project_id) {
            (Some(list), _) => list,
            (None, Some(single)) if !single.is_empty() => vec![single],
            _ => Vec::new(),
        };

        let mut bookmark = Bookmark {
            id: self.id.unwrap_or_default(),
            url: self.url.unwrap_or_default(),
            title: self.title.unwrap_or_default(),
            summary: self.summary.unwrap_or_default(),
            categories,
            tags: self.tags.unwrap_or_default(),
            project_ids,
            project_contexts: self.project_contexts.unwrap_or_default(),
            created_at: self.created_at.unwrap_or(0),
            is_favorite: self.is_favorite.unwrap_or(false),
            is_pinned: self.is_pinned.unwrap_or(false),
            icon_emoji: self.icon_emoji,
        };
        bookmark.prune_project_contexts();
        bookmark
    }
}

impl PersistedBookmark {
    pub fn into_current(self) -> Bookmark {
        match self {
            PersistedBookmark::Current(bookmark) => bookmark,
            PersistedBookmark::Legacy(legacy) => legacy.upgrade(),
        }
    }
}

/// Migrates a single decoded record.
pub fn migrate_value(value: Value) -> Result<Bookmark, MigrationError> {
    if !value.is_object() {
        return Err(MigrationError::InvalidRecord(format!(
            "expected an object, got {}",
            value
        )));
    }
    let record: PersistedBookmark = serde_json::from_value(value)
        .map_err(|e| MigrationError::InvalidRecord(e.to_string()))?;
    Ok(record.into_current())
}

/// Migrates every record in an array, skipping entries that are not records.
pub fn migrate_values(values: Vec<Value>) -> Vec<Bookmark> {
    values
        .into_iter()
        .filter_map(|value| match migrate_value(value) {
            Ok(bookmark) => Some(bookmark),
            Err(e) => {
                tracing::warn!("dropping unreadable bookmark record: {}", e);
                None
            }
        })
        .collect()
}

/// Migrates a JSON-encoded array of bookmark records.
///
/// A blob that is not a JSON array is an error; callers fall back to the
/// built-in dataset.
pub fn migrate_records(json: &str) -> Result<Vec<Bookmark>, MigrationError> {
    let value: Value =
        serde_json::from_str(json).map_err(|e| MigrationError::ParseError(e.to_string()))?;
    match value {
        Value::Array(items) => Ok(migrate_values(items)),
        _ => Err(MigrationError::NotAnArray),
    }
}

/// Decodes a remote state document leniently.
///
/// Missing or non-array collections become empty, bookmarks are migrated,
/// unreadable projects and non-string categories are skipped, and a missing
/// or unknown theme decodes as `None`.
pub fn decode_cloud_document(document: Value) -> CloudState {
    let array = |key: &str| -> Vec<Value> {
        match document.get(key) {
            Some(Value::Array(items)) => items.clone(),
            _ => Vec::new(),
        }
    };

    let bookmarks = migrate_values(array("bookmarks"));
    let categories = array("categories")
        .into_iter()
        .filter_map(|v| v.as_str().map(str::to_string))
        .collect();
    let projects = array("projects")
        .into_iter()
        .filter_map(|v| serde_json::from_value::<Project>(v).ok())
        .collect();
    let theme = document
        .get("theme")
        .and_then(Value::as_str)
        .and_then(ThemePreference::parse);
    let version = document
        .get("version")
        .and_then(Value::as_u64)
        .map(|v| v as u32)
        .unwrap_or(crate::types::state::CLOUD_STATE_VERSION);

    CloudState {
        version,
        bookmarks,
        categories,
        projects,
        theme,
    }
}
