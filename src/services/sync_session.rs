//! Sign-in session state for cloud sync.
//!
//! `SyncSession` is a plain state machine with no I/O. The async driver in
//! `cloud_sync` asks it what to do at every step and reports results back.
//!
//! Every sign-in and sign-out bumps a generation counter. A load cycle
//! carries the generation it started under in its [`LoadTicket`]; results
//! from an older generation are discarded. Only one load cycle runs at a
//! time: a sign-in that arrives while a cycle is in flight is queued and
//! starts once the running cycle has been discarded.

use serde::{Deserialize, Serialize};

use crate::services::merge::{merge_full_state, FirstAuthority};
use crate::types::errors::SyncError;
use crate::types::state::{CloudState, FullState};

/// An authenticated remote identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncIdentity {
    pub user_id: String,
    pub access_token: String,
}

/// Session status as shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SyncStatus {
    Disabled,
    SignedOut,
    Loading,
    Ready,
    Saving,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncStatusReport {
    pub status: SyncStatus,
    pub error: Option<String>,
    pub user_id: Option<String>,
    pub loaded: bool,
}

impl SyncStatusReport {
    pub fn disabled() -> Self {
        Self {
            status: SyncStatus::Disabled,
            error: None,
            user_id: None,
            loaded: false,
        }
    }
}

/// Permission to run one fetch-and-merge cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadTicket {
    pub generation: u64,
    pub identity: SyncIdentity,
}

/// What to do with a fetch result.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadResolution {
    /// The identity changed while fetching. Drop the result and run `next`
    /// when present.
    Stale { next: Option<LoadTicket> },
    /// Remote existed: write this merged state locally and remotely.
    Merged(FullState),
    /// Remote absent: publish this document.
    Seed(CloudState),
    /// The fetch failed; the session is in the error state.
    Failed(SyncError),
}

/// How a load cycle ended after its write-back.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadCompletion {
    Ready,
    Failed(SyncError),
    Stale { next: Option<LoadTicket> },
}

#[derive(Debug)]
pub struct SyncSession {
    status: SyncStatus,
    last_error: Option<String>,
    identity: Option<SyncIdentity>,
    generation: u64,
    loaded: bool,
    in_flight: bool,
    skip_next_save: bool,
    queued: Option<SyncIdentity>,
}

impl Default for SyncSession {
    fn default() -> Self {
        Self::new()
    }
}

impl SyncSession {
    pub fn new() -> Self {
        Self {
            status: SyncStatus::SignedOut,
            last_error: None,
            identity: None,
            generation: 0,
            loaded: false,
            in_flight: false,
            skip_next_save: false,
            queued: None,
        }
    }

    pub fn status(&self) -> SyncStatus {
        self.status
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn identity(&self) -> Option<&SyncIdentity> {
        self.identity.as_ref()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight
    }

    pub fn report(&self) -> SyncStatusReport {
        SyncStatusReport {
            status: self.status,
            error: self.last_error.clone(),
            user_id: self.identity.as_ref().map(|i| i.user_id.clone()),
            loaded: self.loaded,
        }
    }

    /// Establishes an identity.
    ///
    /// Signing in again as the already-loaded user only refreshes the
    /// access token. Any other identity starts a new generation and needs a
    /// load cycle; the ticket is withheld while another cycle is running.
    pub fn sign_in(&mut self, identity: SyncIdentity) -> Option<LoadTicket> {
        if let Some(current) = &mut self.identity {
            if current.user_id == identity.user_id && (self.loaded || self.in_flight) {
                current.access_token = identity.access_token;
                return None;
            }
        }

        self.generation += 1;
        self.identity = Some(identity.clone());
        self.loaded = false;
        self.skip_next_save = false;
        self.status = SyncStatus::Loading;
        self.last_error = None;

        if self.in_flight {
            self.queued = Some(identity);
            return None;
        }
        self.in_flight = true;
        Some(LoadTicket {
            generation: self.generation,
            identity,
        })
    }

    /// Starts another load cycle for the current identity after a failure.
    pub fn retry_load(&mut self) -> Result<Option<LoadTicket>, SyncError> {
        let identity = self.identity.clone().ok_or(SyncError::SignedOut)?;
        if self.in_flight {
            return Ok(None);
        }
        self.in_flight = true;
        self.status = SyncStatus::Loading;
        self.last_error = None;
        Ok(Some(LoadTicket {
            generation: self.generation,
            identity,
        }))
    }

    pub fn sign_out(&mut self) {
        self.generation += 1;
        self.identity = None;
        self.loaded = false;
        self.skip_next_save = false;
        self.queued = None;
        self.status = SyncStatus::SignedOut;
        self.last_error = None;
    }

    fn is_current(&self, ticket: &LoadTicket) -> bool {
        ticket.generation == self.generation
    }

    /// Ends a discarded cycle and hands out the queued identity's ticket.
    fn discard(&mut self) -> Option<LoadTicket> {
        self.in_flight = false;
        let identity = self.queued.take()?;
        self.in_flight = true;
        Some(LoadTicket {
            generation: self.generation,
            identity,
        })
    }

    fn fail(&mut self, error: &SyncError) {
        self.in_flight = false;
        self.status = SyncStatus::Error;
        self.last_error = Some(error.to_string());
    }

    /// Decides what a fetch result means for the given local snapshot.
    pub fn resolve_fetch(
        &mut self,
        ticket: &LoadTicket,
        fetched: Result<Option<CloudState>, SyncError>,
        local: &FullState,
    ) -> LoadResolution {
        if !self.is_current(ticket) {
            return LoadResolution::Stale { next: self.discard() };
        }
        match fetched {
            Ok(Some(remote)) => LoadResolution::Merged(merge_full_state(&FirstAuthority, &remote, local)),
            Ok(None) => LoadResolution::Seed(CloudState::from_state(local)),
            Err(e) => {
                self.fail(&e);
                LoadResolution::Failed(e)
            }
        }
    }

    /// Records the write-back of a merging load cycle. On success the session
    /// is loaded and the next local change, which is the merged state being
    /// applied locally, is not saved.
    pub fn complete_load(&mut self, ticket: &LoadTicket, written: Result<(), SyncError>) -> LoadCompletion {
        if !self.is_current(ticket) {
            return LoadCompletion::Stale { next: self.discard() };
        }
        match written {
            Ok(()) => {
                self.in_flight = false;
                self.loaded = true;
                self.skip_next_save = true;
                self.status = SyncStatus::Ready;
                self.last_error = None;
                LoadCompletion::Ready
            }
            Err(e) => {
                self.fail(&e);
                LoadCompletion::Failed(e)
            }
        }
    }

    /// The seed path is a load cycle whose write-back is the first publish.
    /// Nothing is applied locally, so the next change is saved as usual.
    pub fn finish_seed(&mut self, ticket: &LoadTicket, written: Result<(), SyncError>) -> LoadCompletion {
        let completion = self.complete_load(ticket, written);
        if completion == LoadCompletion::Ready {
            self.skip_next_save = false;
        }
        completion
    }

    /// Returns whether a local change should schedule a remote save.
    pub fn note_local_change(&mut self) -> bool {
        if self.identity.is_none() || !self.loaded {
            return false;
        }
        if self.skip_next_save {
            self.skip_next_save = false;
            return false;
        }
        true
    }

    /// Claims the identity for a debounced save. A save that started from
    /// `Ready` shows as `Saving`; other statuses are left alone.
    pub fn save_started(&mut self) -> Option<(u64, SyncIdentity)> {
        if !self.loaded {
            return None;
        }
        let identity = self.identity.clone()?;
        if self.status == SyncStatus::Ready {
            self.status = SyncStatus::Saving;
        }
        Some((self.generation, identity))
    }

    /// Claims the identity for an immediate save requested by the user.
    pub fn manual_save_started(&mut self) -> Result<(u64, SyncIdentity), SyncError> {
        let identity = self.identity.clone().ok_or(SyncError::SignedOut)?;
        self.status = SyncStatus::Saving;
        Ok((self.generation, identity))
    }

    /// Results of saves from an older generation are ignored.
    pub fn save_finished(&mut self, generation: u64, result: &Result<(), SyncError>) {
        if generation != self.generation {
            return;
        }
        match result {
            Ok(()) => {
                self.status = SyncStatus::Ready;
                self.last_error = None;
            }
            Err(e) => {
                self.status = SyncStatus::Error;
                self.last_error = Some(e.to_string());
            }
        }
    }
}
