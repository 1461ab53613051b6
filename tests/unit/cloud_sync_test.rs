//! Unit tests for the cloud sync driver: first-sync seeding, merging,
//! debounced saves, failures and identity changes during a load.
//!
//! A scripted in-memory remote stands in for the hosted store.

use std::collections::{BTreeMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tempfile::TempDir;
use tokio::sync::{Notify, Semaphore};

use neuromark::app::App;
use neuromark::database::Database;
use neuromark::managers::library_manager::{Library, LibraryManagerTrait};
use neuromark::services::ai_assistant::GeminiAssistant;
use neuromark::services::cloud_sync::{CloudSync, RemoteStateStore, SyncOutcome};
use neuromark::services::local_store::{LocalStore, LocalStoreTrait};
use neuromark::services::settings_engine::SettingsEngine;
use neuromark::services::sync_session::{SyncIdentity, SyncStatus};
use neuromark::types::bookmark::{Bookmark, BookmarkDraft, Project};
use neuromark::types::errors::SyncError;
use neuromark::types::settings::AISettings;
use neuromark::types::state::{CloudState, FullState, ThemePreference, CLOUD_STATE_VERSION};

const DEBOUNCE: Duration = Duration::from_millis(800);

#[derive(Default)]
struct ScriptedRemote {
    fetches: Mutex<VecDeque<Result<Option<CloudState>, SyncError>>>,
    upserts: Mutex<Vec<(SyncIdentity, CloudState)>>,
    upsert_error: Mutex<Option<SyncError>>,
    gate: Option<Semaphore>,
    fetch_started: Notify,
}

impl ScriptedRemote {
    fn with_fetches(fetches: Vec<Result<Option<CloudState>, SyncError>>) -> Self {
        Self {
            fetches: Mutex::new(fetches.into()),
            ..Self::default()
        }
    }

    /// Every fetch waits for a permit on the returned remote.
    fn gated() -> Self {
        Self {
            gate: Some(Semaphore::new(0)),
            ..Self::default()
        }
    }

    fn release(&self, fetches: usize) {
        if let Some(gate) = &self.gate {
            gate.add_permits(fetches);
        }
    }

    fn upserts(&self) -> Vec<(SyncIdentity, CloudState)> {
        self.upserts.lock().unwrap().clone()
    }
}

impl RemoteStateStore for ScriptedRemote {
    async fn fetch(&self, _identity: &SyncIdentity) -> Result<Option<CloudState>, SyncError> {
        self.fetch_started.notify_one();
        if let Some(gate) = &self.gate {
            gate.acquire().await.unwrap().forget();
        }
        let next = self.fetches.lock().unwrap().pop_front();
        next.unwrap_or(Ok(None))
    }

    async fn upsert(&self, identity: &SyncIdentity, state: &CloudState) -> Result<(), SyncError> {
        if let Some(e) = self.upsert_error.lock().unwrap().clone() {
            return Err(e);
        }
        self.upserts.lock().unwrap().push((identity.clone(), state.clone()));
        Ok(())
    }
}

fn identity(user: &str) -> SyncIdentity {
    SyncIdentity {
        user_id: user.to_string(),
        access_token: format!("jwt-{}", user),
    }
}

fn bookmark(id: &str) -> Bookmark {
    Bookmark {
        id: id.to_string(),
        url: format!("https://{}.dev", id),
        title: id.to_string(),
        summary: String::new(),
        categories: vec![],
        tags: vec![],
        project_ids: vec![],
        project_contexts: BTreeMap::new(),
        created_at: 1,
        is_favorite: false,
        is_pinned: false,
        icon_emoji: None,
    }
}

fn local_state(ids: &[&str]) -> FullState {
    FullState {
        bookmarks: ids.iter().map(|id| bookmark(id)).collect(),
        projects: vec![],
        categories: vec!["Local".to_string()],
        theme: ThemePreference::Light,
    }
}

fn remote_document(ids: &[&str]) -> CloudState {
    CloudState {
        version: CLOUD_STATE_VERSION,
        bookmarks: ids.iter().map(|id| bookmark(id)).collect(),
        categories: vec!["Remote".to_string()],
        projects: vec![Project {
            id: "rp".to_string(),
            name: "Remote project".to_string(),
            color: "#111111".to_string(),
            description: None,
        }],
        theme: Some(ThemePreference::Dark),
    }
}

// === Sign-in load cycle ===

#[tokio::test]
async fn test_absent_remote_is_seeded_once_with_local_state() {
    let cloud = CloudSync::new(ScriptedRemote::with_fetches(vec![Ok(None)]), DEBOUNCE);
    let local = local_state(&["a", "b"]);

    let outcome = cloud.sign_in(identity("u1"), &local).await.unwrap();
    assert_eq!(outcome, SyncOutcome::Seeded);

    let upserts = cloud.store().upserts();
    assert_eq!(upserts.len(), 1);
    let (who, document) = &upserts[0];
    assert_eq!(who.user_id, "u1");
    assert_eq!(document.version, 1);
    assert_eq!(document, &CloudState::from_state(&local));

    let status = cloud.status();
    assert_eq!(status.status, SyncStatus::Ready);
    assert!(status.loaded);
    assert_eq!(status.user_id.as_deref(), Some("u1"));
}

#[tokio::test]
async fn test_existing_remote_is_merged_remote_first_and_written_back() {
    let remote = remote_document(&["r1", "shared"]);
    let cloud = CloudSync::new(ScriptedRemote::with_fetches(vec![Ok(Some(remote))]), DEBOUNCE);
    let local = local_state(&["shared", "l1"]);

    let outcome = cloud.sign_in(identity("u1"), &local).await.unwrap();
    let SyncOutcome::Merged(merged) = outcome else {
        panic!("expected a merge");
    };
    let ids: Vec<&str> = merged.bookmarks.iter().map(|b| b.id.as_str()).collect();
    assert_eq!(ids, vec!["r1", "shared", "l1"]);
    assert_eq!(merged.categories, vec!["Remote".to_string(), "Local".to_string()]);
    assert_eq!(merged.theme, ThemePreference::Dark);
    assert_eq!(merged.projects.len(), 1);

    let upserts = cloud.store().upserts();
    assert_eq!(upserts.len(), 1);
    assert_eq!(upserts[0].1, CloudState::from_state(&merged));
}

#[tokio::test]
async fn test_fetch_failure_surfaces_error_and_sync_now_retries() {
    let remote = ScriptedRemote::with_fetches(vec![Err(SyncError::Auth("401 expired".to_string())), Ok(None)]);
    let cloud = CloudSync::new(remote, DEBOUNCE);
    let local = local_state(&["a"]);

    let err = cloud.sign_in(identity("u1"), &local).await.unwrap_err();
    assert_eq!(err, SyncError::Auth("401 expired".to_string()));
    let status = cloud.status();
    assert_eq!(status.status, SyncStatus::Error);
    assert_eq!(status.error.as_deref(), Some("Sync authentication failed: 401 expired"));
    assert!(!status.loaded);
    assert!(cloud.store().upserts().is_empty());

    assert!(!cloud.on_local_change(&local), "nothing is saved before the first load");

    let retried = cloud.sync_now(&local).await.unwrap();
    assert_eq!(retried, SyncOutcome::Seeded);
    assert!(cloud.status().loaded);
}

#[tokio::test]
async fn test_write_back_failure_leaves_session_unloaded() {
    let remote = ScriptedRemote::with_fetches(vec![Ok(None)]);
    *remote.upsert_error.lock().unwrap() = Some(SyncError::Remote("500 boom".to_string()));
    let cloud = CloudSync::new(remote, DEBOUNCE);

    let err = cloud.sign_in(identity("u1"), &local_state(&["a"])).await.unwrap_err();
    assert!(matches!(err, SyncError::Remote(_)));
    assert_eq!(cloud.status().status, SyncStatus::Error);
    assert!(!cloud.status().loaded);
}

#[tokio::test]
async fn test_signing_in_again_only_refreshes_token() {
    let cloud = CloudSync::new(ScriptedRemote::default(), DEBOUNCE);
    let local = local_state(&["a"]);
    cloud.sign_in(identity("u1"), &local).await.unwrap();

    let again = SyncIdentity {
        user_id: "u1".to_string(),
        access_token: "fresh".to_string(),
    };
    assert_eq!(cloud.sign_in(again, &local).await.unwrap(), SyncOutcome::Unchanged);
    assert_eq!(cloud.store().upserts().len(), 1);
}

#[tokio::test]
async fn test_sync_now_requires_sign_in() {
    let cloud = CloudSync::new(ScriptedRemote::default(), DEBOUNCE);
    let err = cloud.sync_now(&local_state(&[])).await.unwrap_err();
    assert_eq!(err, SyncError::SignedOut);
}

#[tokio::test]
async fn test_sync_now_pushes_immediately_once_loaded() {
    let cloud = CloudSync::new(ScriptedRemote::default(), DEBOUNCE);
    cloud.sign_in(identity("u1"), &local_state(&["a"])).await.unwrap();

    let latest = local_state(&["a", "b"]);
    assert_eq!(cloud.sync_now(&latest).await.unwrap(), SyncOutcome::Saved);
    let upserts = cloud.store().upserts();
    assert_eq!(upserts.len(), 2);
    assert_eq!(upserts[1].1.bookmarks.len(), 2);
    assert_eq!(cloud.status().status, SyncStatus::Ready);
}

// === Identity changes while loading ===

#[tokio::test]
async fn test_sign_out_during_fetch_discards_the_result() {
    let cloud = CloudSync::new(ScriptedRemote::gated(), DEBOUNCE);
    let local = local_state(&["a"]);

    let load = cloud.sign_in(identity("u1"), &local);
    let interrupt = async {
        cloud.store().fetch_started.notified().await;
        cloud.sign_out();
        cloud.store().release(1);
    };
    let (outcome, ()) = tokio::join!(load, interrupt);

    assert_eq!(outcome.unwrap(), SyncOutcome::Discarded);
    assert!(cloud.store().upserts().is_empty());
    assert_eq!(cloud.status().status, SyncStatus::SignedOut);
}

#[tokio::test]
async fn test_new_identity_during_fetch_loads_after_discard() {
    let cloud = CloudSync::new(ScriptedRemote::gated(), DEBOUNCE);
    let local = local_state(&["a"]);

    let first = cloud.sign_in(identity("u1"), &local);
    let second = async {
        cloud.store().fetch_started.notified().await;
        let queued = cloud.sign_in(identity("u2"), &local).await;
        cloud.store().release(2);
        queued
    };
    let (first, second) = tokio::join!(first, second);

    assert_eq!(second.unwrap(), SyncOutcome::Queued);
    assert_eq!(first.unwrap(), SyncOutcome::Seeded);
    let upserts = cloud.store().upserts();
    assert_eq!(upserts.len(), 1);
    assert_eq!(upserts[0].0.user_id, "u2");
    assert_eq!(cloud.status().user_id.as_deref(), Some("u2"));
}

// === Debounced saves ===

#[tokio::test(start_paused = true)]
async fn test_rapid_changes_coalesce_into_one_save() {
    let cloud = CloudSync::new(ScriptedRemote::default(), DEBOUNCE);
    cloud.sign_in(identity("u1"), &local_state(&["a"])).await.unwrap();

    for n in 1..=5 {
        let ids: Vec<String> = (0..n).map(|i| format!("b{}", i)).collect();
        let ids: Vec<&str> = ids.iter().map(String::as_str).collect();
        assert!(cloud.on_local_change(&local_state(&ids)));
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    assert_eq!(cloud.store().upserts().len(), 1, "only the seed before the window elapses");

    tokio::time::sleep(DEBOUNCE * 2).await;

    let upserts = cloud.store().upserts();
    assert_eq!(upserts.len(), 2);
    assert_eq!(upserts[1].1.bookmarks.len(), 5);
    assert_eq!(cloud.status().status, SyncStatus::Ready);
}

#[tokio::test(start_paused = true)]
async fn test_sign_out_cancels_pending_save() {
    let cloud = CloudSync::new(ScriptedRemote::default(), DEBOUNCE);
    cloud.sign_in(identity("u1"), &local_state(&["a"])).await.unwrap();
    assert!(cloud.on_local_change(&local_state(&["a", "b"])));

    cloud.sign_out();
    tokio::time::sleep(DEBOUNCE * 2).await;

    assert_eq!(cloud.store().upserts().len(), 1);
    assert!(!cloud.on_local_change(&local_state(&["a", "b", "c"])));
}

// === Through the App ===

fn app_with(remote: ScriptedRemote, dir: &TempDir) -> App<ScriptedRemote> {
    let db = Database::open(&dir.path().join("neuromark.db")).unwrap();
    let library = Library::with_state(local_state(&["l1"]), LocalStore::new(Arc::new(db)));
    let settings = SettingsEngine::new(Some(dir.path().join("settings.json").to_string_lossy().to_string()));
    App::from_parts(
        library,
        Some(CloudSync::new(remote, DEBOUNCE)),
        GeminiAssistant::new(AISettings::default()),
        settings,
    )
}

#[tokio::test(start_paused = true)]
async fn test_app_applies_merge_locally_without_echo_save() {
    let dir = TempDir::new().unwrap();
    let mut app = app_with(ScriptedRemote::with_fetches(vec![Ok(Some(remote_document(&["r1"])))]), &dir);

    let outcome = app.sign_in(identity("u1")).await.unwrap();
    assert_eq!(outcome.label(), "merged");
    let ids: Vec<&str> = app.library.bookmarks().iter().map(|b| b.id.as_str()).collect();
    assert_eq!(ids, vec!["r1", "l1"]);
    assert_eq!(app.library.theme(), ThemePreference::Dark);

    let reopened = LocalStore::new(Arc::new(Database::open(&dir.path().join("neuromark.db")).unwrap()));
    assert_eq!(reopened.load_bookmarks().len(), 2, "merged state is written locally");

    tokio::time::sleep(DEBOUNCE * 2).await;
    assert_eq!(app.cloud.as_ref().unwrap().store().upserts().len(), 1, "no save echoes the merge");

    let draft = BookmarkDraft {
        url: "https://after.dev".to_string(),
        ..BookmarkDraft::default()
    };
    app.library.add_bookmark(draft).unwrap();
    app.after_change();
    tokio::time::sleep(DEBOUNCE * 2).await;

    let upserts = app.cloud.as_ref().unwrap().store().upserts();
    assert_eq!(upserts.len(), 2);
    assert_eq!(upserts[1].1.bookmarks.len(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_app_saves_first_change_after_seeding() {
    let dir = TempDir::new().unwrap();
    let mut app = app_with(ScriptedRemote::with_fetches(vec![Ok(None)]), &dir);

    let outcome = app.sign_in(identity("u1")).await.unwrap();
    assert_eq!(outcome, SyncOutcome::Seeded);

    let draft = BookmarkDraft {
        url: "https://first.dev".to_string(),
        ..BookmarkDraft::default()
    };
    app.library.add_bookmark(draft).unwrap();
    app.after_change();
    tokio::time::sleep(DEBOUNCE * 10).await;

    let upserts = app.cloud.as_ref().unwrap().store().upserts();
    assert_eq!(upserts.len(), 2, "seed plus the first change");
    assert_eq!(upserts[1].1.bookmarks.len(), app.library.bookmarks().len());
    assert_eq!(upserts[1].1.bookmarks.len(), 2);
}

#[tokio::test]
async fn test_app_without_cloud_reports_disabled() {
    let dir = TempDir::new().unwrap();
    let db = Database::open_in_memory().unwrap();
    let library = Library::with_state(local_state(&[]), LocalStore::new(Arc::new(db)));
    let settings = SettingsEngine::new(Some(dir.path().join("settings.json").to_string_lossy().to_string()));
    let mut app: App<ScriptedRemote> =
        App::from_parts(library, None, GeminiAssistant::new(AISettings::default()), settings);

    assert_eq!(app.cloud_status().status, SyncStatus::Disabled);
    assert_eq!(app.sign_in(identity("u1")).await.unwrap_err(), SyncError::NotConfigured);
    assert_eq!(app.sync_now().await.unwrap_err(), SyncError::NotConfigured);
}
