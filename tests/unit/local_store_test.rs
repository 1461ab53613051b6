//! Unit tests for the local store: per-key fallbacks, migration on load and
//! tolerance of unavailable storage.

use std::sync::Arc;

use neuromark::database::Database;
use neuromark::services::local_store::{
    LocalStore, LocalStoreTrait, BOOKMARKS_KEY, CATEGORIES_KEY, PROJECTS_KEY, THEME_KEY,
};
use neuromark::services::seed_data;
use neuromark::types::state::ThemePreference;
use tempfile::TempDir;

fn memory_store() -> LocalStore {
    LocalStore::new(Arc::new(Database::open_in_memory().expect("open_in_memory failed")))
}

#[test]
fn test_empty_store_loads_defaults() {
    let store = memory_store();
    let state = store.load_state();

    let ids: Vec<&str> = state.bookmarks.iter().map(|b| b.id.as_str()).collect();
    assert_eq!(ids, vec!["1", "2", "3"]);
    assert_eq!(state.projects, seed_data::default_projects());
    assert_eq!(state.categories, seed_data::default_categories());
    assert_eq!(state.theme, ThemePreference::Auto);
}

#[test]
fn test_state_roundtrips_through_store() {
    let store = memory_store();
    let mut state = store.load_state();
    state.categories = vec!["Reading".to_string()];
    state.projects.truncate(1);
    state.bookmarks.remove(0);
    state.theme = ThemePreference::Dark;

    store.save_state(&state);
    assert_eq!(store.load_state(), state);
}

#[test]
fn test_fallback_is_independent_per_key() {
    let store = memory_store();
    store.save_categories(&["Only".to_string()]);
    store.set_raw(PROJECTS_KEY, "{not json").unwrap();

    let state = store.load_state();
    assert_eq!(state.categories, vec!["Only".to_string()]);
    assert_eq!(state.projects, seed_data::default_projects());
}

#[test]
fn test_unreadable_bookmarks_fall_back_to_seed() {
    let store = memory_store();
    store.set_raw(BOOKMARKS_KEY, "\"just a string\"").unwrap();
    assert_eq!(store.load_bookmarks().len(), 3);
}

#[test]
fn test_legacy_bookmarks_are_migrated_on_load() {
    let store = memory_store();
    store
        .set_raw(
            BOOKMARKS_KEY,
            r#"[{"id":"old","url":"https://old.dev","title":"Old","summary":"","category":"Design","tags":[],"projectId":"p1","createdAt":5,"isFavorite":true}]"#,
        )
        .unwrap();

    let bookmarks = store.load_bookmarks();
    assert_eq!(bookmarks.len(), 1);
    assert_eq!(bookmarks[0].categories, vec!["Design".to_string()]);
    assert_eq!(bookmarks[0].project_ids, vec!["p1".to_string()]);
    assert!(bookmarks[0].project_contexts.is_empty());
    assert!(!bookmarks[0].is_pinned);
    assert!(bookmarks[0].is_favorite);
}

#[test]
fn test_theme_is_stored_as_bare_string() {
    let store = memory_store();
    store.save_theme(ThemePreference::Light);
    assert_eq!(store.get_raw(THEME_KEY).unwrap(), Some("light".to_string()));
}

#[test]
fn test_categories_are_stored_as_json() {
    let store = memory_store();
    store.save_categories(&["A".to_string(), "B".to_string()]);
    assert_eq!(store.get_raw(CATEGORIES_KEY).unwrap(), Some(r#"["A","B"]"#.to_string()));
}

#[test]
fn test_unavailable_store_reads_defaults_and_drops_writes() {
    let store = LocalStore::unavailable();
    store.save_categories(&["Ignored".to_string()]);
    store.save_theme(ThemePreference::Dark);

    let state = store.load_state();
    assert_eq!(state.categories, seed_data::default_categories());
    assert_eq!(state.theme, ThemePreference::Auto);
}

#[test]
fn test_file_store_persists_across_instances() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("neuromark.db");
    {
        let store = LocalStore::new(Arc::new(Database::open(&path).unwrap()));
        store.save_theme(ThemePreference::Dark);
    }
    let store = LocalStore::new(Arc::new(Database::open(&path).unwrap()));
    assert_eq!(store.load_theme(), ThemePreference::Dark);
}
