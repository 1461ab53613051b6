//! App Core for NeuroMark.
//!
//! Central struct holding the library, the optional cloud sync driver, the
//! AI assistant and the settings engine. Collaborator failures that have a
//! user-facing fallback are resolved here.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;

use crate::database::connection::Database;
use crate::host_bridge::{HostStatus, StatusEmitter};
use crate::managers::library_manager::{Library, LibraryManagerTrait};
use crate::services::ai_assistant::{AIAssistantTrait, GeminiAssistant};
use crate::services::cloud_sync::{CloudSync, RemoteStateStore, SupabaseStateStore, SyncOutcome};
use crate::services::local_store::LocalStore;
use crate::services::settings_engine::{self, SettingsEngine, SettingsEngineTrait};
use crate::services::sync_session::{SyncIdentity, SyncStatusReport};
use crate::services::view_state;
use crate::types::ai::{
    AIAnalysisResult, EmojiRequest, ASK_LIBRARY_FALLBACK, EMPTY_ANSWER_FALLBACK, FALLBACK_EMOJI,
};
use crate::types::errors::{AIError, SyncError};

/// Central application struct.
pub struct App<R: RemoteStateStore = SupabaseStateStore> {
    pub library: Library,
    pub cloud: Option<CloudSync<R>>,
    pub ai: GeminiAssistant,
    pub settings_engine: SettingsEngine,
    status: StatusEmitter,
}

impl App<SupabaseStateStore> {
    /// Creates the App from the settings file (platform default when
    /// `settings_path` is `None`) and the environment.
    ///
    /// An unopenable database leaves the library running without
    /// persistence. Cloud sync is only started when configured, and then
    /// needs a Tokio runtime.
    pub fn new(settings_path: Option<String>) -> Result<Self, Box<dyn std::error::Error>> {
        let mut settings_engine = SettingsEngine::new(settings_path);
        if let Err(e) = settings_engine.load() {
            tracing::warn!("settings load failed, using defaults: {}", e);
        }
        let settings = settings_engine.effective();

        let db_path = settings_engine::database_path(&settings);
        let store = match Database::open(&db_path) {
            Ok(db) => LocalStore::new(Arc::new(db)),
            Err(e) => {
                tracing::warn!("local storage unavailable at {}: {}", db_path.display(), e);
                LocalStore::unavailable()
            }
        };
        let library = Library::load(store);

        let cloud = if settings.cloud.is_configured() {
            let store = SupabaseStateStore::new(&settings.cloud)?;
            Some(CloudSync::new(store, Duration::from_millis(settings.sync.debounce_ms)))
        } else {
            tracing::info!("cloud sync not configured");
            None
        };
        let ai = GeminiAssistant::new(settings.ai.clone());

        Ok(Self::from_parts(library, cloud, ai, settings_engine))
    }
}

impl<R: RemoteStateStore> App<R> {
    pub fn from_parts(
        library: Library,
        cloud: Option<CloudSync<R>>,
        ai: GeminiAssistant,
        settings_engine: SettingsEngine,
    ) -> Self {
        Self {
            library,
            cloud,
            ai,
            settings_engine,
            status: StatusEmitter::new(),
        }
    }

    /// Forwards a library change to cloud sync. Call after every mutation.
    pub fn after_change(&mut self) {
        if !self.library.take_changed() {
            return;
        }
        if let Some(cloud) = &self.cloud {
            if cloud.on_local_change(self.library.state()) {
                tracing::debug!("cloud save scheduled");
            }
        }
    }

    /// The host status payload when it changed since the last call.
    pub fn status_event(&mut self) -> Option<Value> {
        self.status.publish(HostStatus::from_library(&self.library))
    }

    pub fn cloud_status(&self) -> SyncStatusReport {
        self.cloud
            .as_ref()
            .map(CloudSync::status)
            .unwrap_or_else(SyncStatusReport::disabled)
    }

    fn apply_outcome(&mut self, outcome: &SyncOutcome) {
        if let SyncOutcome::Merged(merged) = outcome {
            self.library.replace_state(merged.clone());
            self.after_change();
        }
    }

    pub async fn sign_in(&mut self, identity: SyncIdentity) -> Result<SyncOutcome, SyncError> {
        let cloud = self.cloud.as_ref().ok_or(SyncError::NotConfigured)?;
        let outcome = cloud.sign_in(identity, self.library.state()).await?;
        self.apply_outcome(&outcome);
        Ok(outcome)
    }

    pub fn sign_out(&mut self) -> Result<(), SyncError> {
        let cloud = self.cloud.as_ref().ok_or(SyncError::NotConfigured)?;
        cloud.sign_out();
        Ok(())
    }

    pub async fn sync_now(&mut self) -> Result<SyncOutcome, SyncError> {
        let cloud = self.cloud.as_ref().ok_or(SyncError::NotConfigured)?;
        let outcome = cloud.sync_now(self.library.state()).await?;
        self.apply_outcome(&outcome);
        Ok(outcome)
    }

    /// Suggested metadata for a URL, or placeholder metadata on failure.
    pub async fn analyze_bookmark(&self, url: &str, notes: &str) -> AIAnalysisResult {
        match self.ai.analyze_bookmark(url, notes).await {
            Ok(result) => result,
            Err(e) => {
                tracing::error!("bookmark analysis failed: {}", e);
                AIAnalysisResult::fallback(url)
            }
        }
    }

    pub async fn generate_emoji(&self, request: &EmojiRequest) -> String {
        match self.ai.generate_emoji(request).await {
            Ok(emoji) => emoji,
            Err(e) => {
                tracing::error!("emoji generation failed: {}", e);
                FALLBACK_EMOJI.to_string()
            }
        }
    }

    /// Answers a question from the bookmarks in scope of the current view.
    pub async fn ask_library(&self, query: &str) -> String {
        let scope = view_state::ask_library_scope(self.library.bookmarks(), self.library.filter());
        match self.ai.ask_library(query, &scope).await {
            Ok(answer) => answer,
            Err(AIError::EmptyResponse) => EMPTY_ANSWER_FALLBACK.to_string(),
            Err(e) => {
                tracing::error!("library question failed: {}", e);
                ASK_LIBRARY_FALLBACK.to_string()
            }
        }
    }
}

