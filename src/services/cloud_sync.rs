//! Cloud sync for NeuroMark.
//!
//! [`RemoteStateStore`] is the remote persistence seam; [`SupabaseStateStore`]
//! implements it over the PostgREST API. [`CloudSync`] drives the sign-in
//! load cycle through a [`SyncSession`] and pushes later local changes with
//! a debounced background save worker.

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use reqwest::StatusCode;
use serde_json::{json, Value};
use tokio::sync::mpsc;

use crate::services::migration;
use crate::services::sync_session::{
    LoadCompletion, LoadResolution, LoadTicket, SyncIdentity, SyncSession, SyncStatusReport,
};
use crate::types::errors::SyncError;
use crate::types::settings::CloudSettings;
use crate::types::state::{CloudState, FullState};

/// Whole-document remote storage keyed by identity.
pub trait RemoteStateStore: Send + Sync + 'static {
    /// `Ok(None)` when the identity has no stored document.
    fn fetch(&self, identity: &SyncIdentity) -> impl Future<Output = Result<Option<CloudState>, SyncError>> + Send;

    /// Replaces the identity's document.
    fn upsert(&self, identity: &SyncIdentity, state: &CloudState) -> impl Future<Output = Result<(), SyncError>> + Send;
}

/// Remote store backed by a Supabase table with `user_id` and `state` columns.
pub struct SupabaseStateStore {
    client: reqwest::Client,
    base_url: String,
    anon_key: String,
    table: String,
}

impl SupabaseStateStore {
    pub fn new(settings: &CloudSettings) -> Result<Self, SyncError> {
        match (&settings.supabase_url, &settings.anon_key) {
            (Some(url), Some(key)) if !url.is_empty() && !key.is_empty() => Ok(Self {
                client: reqwest::Client::new(),
                base_url: url.trim_end_matches('/').to_string(),
                anon_key: key.clone(),
                table: settings.table.clone(),
            }),
            _ => Err(SyncError::NotConfigured),
        }
    }

    fn table_url(&self) -> String {
        format!("{}/rest/v1/{}", self.base_url, self.table)
    }

    fn authorized(&self, request: reqwest::RequestBuilder, identity: &SyncIdentity) -> reqwest::RequestBuilder {
        request
            .header("apikey", &self.anon_key)
            .header("Authorization", format!("Bearer {}", identity.access_token))
    }

    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, SyncError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        let message = format!("{} {}", status.as_u16(), body.trim());
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(SyncError::Auth(message)),
            _ => Err(SyncError::Remote(message)),
        }
    }
}

/// Extracts the state document from a PostgREST row list.
pub fn decode_rows(rows: Value) -> Result<Option<CloudState>, SyncError> {
    let rows = match rows {
        Value::Array(rows) => rows,
        other => return Err(SyncError::Decode(format!("expected a row list, got {}", other))),
    };
    let state = rows.into_iter().next().and_then(|row| match row {
        Value::Object(mut columns) => columns.remove("state"),
        _ => None,
    });
    match state {
        None | Some(Value::Null) => Ok(None),
        Some(document @ Value::Object(_)) => Ok(Some(migration::decode_cloud_document(document))),
        Some(other) => Err(SyncError::Decode(format!("state is not an object: {}", other))),
    }
}

impl RemoteStateStore for SupabaseStateStore {
    async fn fetch(&self, identity: &SyncIdentity) -> Result<Option<CloudState>, SyncError> {
        let request = self
            .client
            .get(self.table_url())
            .query(&[("select", "state".to_string()), ("user_id", format!("eq.{}", identity.user_id))]);
        let response = self
            .authorized(request, identity)
            .send()
            .await
            .map_err(|e| SyncError::Transport(e.to_string()))?;
        let response = Self::check_status(response).await?;
        let rows: Value = response.json().await.map_err(|e| SyncError::Decode(e.to_string()))?;
        decode_rows(rows)
    }

    async fn upsert(&self, identity: &SyncIdentity, state: &CloudState) -> Result<(), SyncError> {
        let body = json!({
            "user_id": identity.user_id,
            "state": state,
            "updated_at": chrono::Utc::now().to_rfc3339(),
        });
        let request = self
            .client
            .post(self.table_url())
            .query(&[("on_conflict", "user_id")])
            .header("Prefer", "resolution=merge-duplicates")
            .json(&body);
        let response = self
            .authorized(request, identity)
            .send()
            .await
            .map_err(|e| SyncError::Transport(e.to_string()))?;
        Self::check_status(response).await?;
        Ok(())
    }
}

/// What a sign-in or manual sync did.
#[derive(Debug, Clone, PartialEq)]
pub enum SyncOutcome {
    /// Another cycle is running; this identity loads after it.
    Queued,
    /// The remote document was merged in; apply this state locally.
    Merged(FullState),
    /// No remote document existed; local state was published.
    Seeded,
    /// Local state was pushed.
    Saved,
    /// The identity changed before the cycle finished.
    Discarded,
    /// Nothing to do.
    Unchanged,
}

impl SyncOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            SyncOutcome::Queued => "queued",
            SyncOutcome::Merged(_) => "merged",
            SyncOutcome::Seeded => "seeded",
            SyncOutcome::Saved => "saved",
            SyncOutcome::Discarded => "discarded",
            SyncOutcome::Unchanged => "unchanged",
        }
    }
}

enum SaveCommand {
    Schedule(CloudState),
    Cancel,
}

fn lock(session: &Mutex<SyncSession>) -> MutexGuard<'_, SyncSession> {
    session.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Pushes one snapshot for the current identity and records the result.
async fn push_snapshot<R: RemoteStateStore>(store: &R, session: &Mutex<SyncSession>, state: CloudState) {
    let claimed = { lock(session).save_started() };
    let Some((generation, identity)) = claimed else {
        return;
    };
    let result = store.upsert(&identity, &state).await;
    if let Err(e) = &result {
        tracing::error!("cloud save failed: {}", e);
    }
    lock(session).save_finished(generation, &result);
}

/// Debounced save loop. Each scheduled snapshot restarts the quiet period;
/// only the latest snapshot is pushed once it elapses.
async fn run_save_worker<R: RemoteStateStore>(
    store: Arc<R>,
    session: Arc<Mutex<SyncSession>>,
    mut commands: mpsc::UnboundedReceiver<SaveCommand>,
    delay: Duration,
) {
    let mut pending: Option<CloudState> = None;
    loop {
        let command = match pending.take() {
            None => commands.recv().await,
            Some(state) => {
                tokio::select! {
                    command = commands.recv() => command,
                    _ = tokio::time::sleep(delay) => {
                        push_snapshot(store.as_ref(), &session, state).await;
                        continue;
                    }
                }
            }
        };
        match command {
            Some(SaveCommand::Schedule(state)) => pending = Some(state),
            Some(SaveCommand::Cancel) => {}
            None => break,
        }
    }
}

/// Cloud sync driver for one remote store.
pub struct CloudSync<R: RemoteStateStore> {
    store: Arc<R>,
    session: Arc<Mutex<SyncSession>>,
    saves: mpsc::UnboundedSender<SaveCommand>,
}

impl<R: RemoteStateStore> CloudSync<R> {
    /// Creates the driver and spawns its save worker. Must be called within
    /// a Tokio runtime.
    pub fn new(store: R, debounce: Duration) -> Self {
        let store = Arc::new(store);
        let session = Arc::new(Mutex::new(SyncSession::new()));
        let (saves, commands) = mpsc::unbounded_channel();
        tokio::spawn(run_save_worker(Arc::clone(&store), Arc::clone(&session), commands, debounce));
        Self { store, session, saves }
    }

    pub fn status(&self) -> SyncStatusReport {
        lock(&self.session).report()
    }

    pub fn store(&self) -> &R {
        &self.store
    }

    fn cancel_pending_save(&self) {
        // The worker only stops when this sender is dropped.
        let _ = self.saves.send(SaveCommand::Cancel);
    }

    /// Signs in and, unless another cycle is running, fetches the remote
    /// document once and reconciles it with `local`.
    pub async fn sign_in(&self, identity: SyncIdentity, local: &FullState) -> Result<SyncOutcome, SyncError> {
        self.cancel_pending_save();
        let ticket = lock(&self.session).sign_in(identity);
        match ticket {
            Some(ticket) => {
                tracing::info!("cloud sign-in for {}", ticket.identity.user_id);
                self.run_load_cycle(ticket, local).await
            }
            None if lock(&self.session).is_in_flight() => Ok(SyncOutcome::Queued),
            None => Ok(SyncOutcome::Unchanged),
        }
    }

    pub fn sign_out(&self) {
        self.cancel_pending_save();
        lock(&self.session).sign_out();
        tracing::info!("cloud signed out");
    }

    /// Runs load cycles until one finishes for the current generation or
    /// none is left to run.
    async fn run_load_cycle(&self, mut ticket: LoadTicket, local: &FullState) -> Result<SyncOutcome, SyncError> {
        loop {
            let fetched = self.store.fetch(&ticket.identity).await;
            let resolution = lock(&self.session).resolve_fetch(&ticket, fetched, local);

            let (written, outcome, seeded) = match resolution {
                LoadResolution::Stale { next: Some(next) } => {
                    tracing::debug!("discarding load for a previous identity");
                    ticket = next;
                    continue;
                }
                LoadResolution::Stale { next: None } => return Ok(SyncOutcome::Discarded),
                LoadResolution::Failed(e) => {
                    tracing::error!("cloud load failed: {}", e);
                    return Err(e);
                }
                LoadResolution::Merged(merged) => {
                    let written = self.store.upsert(&ticket.identity, &CloudState::from_state(&merged)).await;
                    (written, SyncOutcome::Merged(merged), false)
                }
                LoadResolution::Seed(document) => {
                    let written = self.store.upsert(&ticket.identity, &document).await;
                    (written, SyncOutcome::Seeded, true)
                }
            };

            let completion = {
                let mut session = lock(&self.session);
                if seeded {
                    session.finish_seed(&ticket, written)
                } else {
                    session.complete_load(&ticket, written)
                }
            };
            match completion {
                LoadCompletion::Ready => return Ok(outcome),
                LoadCompletion::Failed(e) => {
                    tracing::error!("cloud write-back failed: {}", e);
                    return Err(e);
                }
                LoadCompletion::Stale { next: Some(next) } => ticket = next,
                LoadCompletion::Stale { next: None } => return Ok(SyncOutcome::Discarded),
            }
        }
    }

    /// Notes a local change. Schedules a debounced save of `state` and
    /// returns true unless the session suppresses it.
    pub fn on_local_change(&self, state: &FullState) -> bool {
        if !lock(&self.session).note_local_change() {
            return false;
        }
        let _ = self.saves.send(SaveCommand::Schedule(CloudState::from_state(state)));
        true
    }

    /// Manual sync. Pushes `local` immediately once loaded; before that it
    /// retries the load cycle.
    pub async fn sync_now(&self, local: &FullState) -> Result<SyncOutcome, SyncError> {
        let (loaded, retry) = {
            let mut session = lock(&self.session);
            if session.is_loaded() {
                (true, None)
            } else {
                (false, session.retry_load()?)
            }
        };
        if !loaded {
            return match retry {
                Some(ticket) => self.run_load_cycle(ticket, local).await,
                None => Ok(SyncOutcome::Queued),
            };
        }

        self.cancel_pending_save();
        let (generation, identity) = lock(&self.session).manual_save_started()?;
        let result = self.store.upsert(&identity, &CloudState::from_state(local)).await;
        lock(&self.session).save_finished(generation, &result);
        result.map(|_| SyncOutcome::Saved)
    }
}
