//! Prompt synchronization against the remote API.
//!
//! `ResourceSyncEngine` owns the local prompt list, the edit target and the
//! draft form. Every operation makes one API call and only touches local
//! state once that call has come back. The lock around the state is never
//! held across an await, so several operations can be in flight at once;
//! each one remembers the session epoch it started in and drops its result
//! if the session has changed since.

use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{debug, info, warn};

use crate::api::ApiClient;
use crate::error::{reason, SyncError};
use crate::models::{Prompt, PromptId};

use super::state::{DraftForm, DraftIntent, SyncState};

/// Handle to the shared prompt state. Clones share the same state.
#[derive(Clone)]
pub struct ResourceSyncEngine {
    api: ApiClient,
    state: Arc<Mutex<SyncState>>,
}

impl ResourceSyncEngine {
    pub fn new(api: ApiClient) -> Self {
        Self {
            api,
            state: Arc::new(Mutex::new(SyncState::default())),
        }
    }

    fn lock(&self) -> MutexGuard<'_, SyncState> {
        // Every mutation leaves the state consistent before it can panic
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    // =========================================================================
    // Session hooks
    // =========================================================================

    /// Start serving a new session. Previous data and in-flight results are
    /// discarded.
    pub fn attach(&self, token: String) {
        let mut state = self.lock();
        state.attach(token);
        debug!(epoch = state.epoch, "Sync engine attached to session");
    }

    /// Forget the collection, edit target, draft and token.
    pub fn reset(&self) {
        let mut state = self.lock();
        state.reset();
        debug!(epoch = state.epoch, "Sync engine reset");
    }

    // =========================================================================
    // Read access
    // =========================================================================

    pub fn prompts(&self) -> Vec<Prompt> {
        self.lock().prompts.clone()
    }

    pub fn prompt(&self, id: &PromptId) -> Option<Prompt> {
        self.lock().prompts.iter().find(|p| &p.id == id).cloned()
    }

    pub fn len(&self) -> usize {
        self.lock().prompts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().prompts.is_empty()
    }

    pub fn edit_target(&self) -> Option<PromptId> {
        self.lock().edit_target.clone()
    }

    pub fn draft(&self) -> DraftForm {
        self.lock().draft.clone()
    }

    pub fn intent(&self) -> DraftIntent {
        self.lock().intent()
    }

    // =========================================================================
    // Local-only operations
    // =========================================================================

    /// Record what the user has typed into the form
    pub fn set_draft(&self, name: impl Into<String>, text: impl Into<String>) {
        self.lock().draft = DraftForm::new(name, text);
    }

    pub fn begin_edit(&self, id: &PromptId) -> Result<(), SyncError> {
        let result = self.lock().begin_edit(id);
        if let Err(ref e) = result {
            warn!(%id, error = %e, "Cannot edit prompt");
        }
        result
    }

    pub fn cancel_edit(&self) {
        self.lock().cancel_edit();
    }

    // =========================================================================
    // Remote operations
    // =========================================================================

    /// Client and epoch for an operation about to start
    fn start(&self) -> Result<(ApiClient, u64), SyncError> {
        let state = self.lock();
        let token = state.token.clone().ok_or(SyncError::NotAuthenticated)?;
        Ok((self.api.with_token(token), state.epoch))
    }

    /// Lock the state for a completion, unless the session moved on
    fn finish(&self, epoch: u64, op: &'static str) -> Result<MutexGuard<'_, SyncState>, SyncError> {
        let state = self.lock();
        if state.epoch != epoch {
            debug!(op, started = epoch, current = state.epoch, "Discarding stale completion");
            return Err(SyncError::StaleCompletion);
        }
        Ok(state)
    }

    /// Replace the local list with the server's, in server order
    pub async fn hydrate(&self) -> Result<usize, SyncError> {
        let (api, epoch) = self.start()?;
        let result = api.list_prompts().await;

        let mut state = self.finish(epoch, "hydrate")?;
        match result {
            Ok(prompts) => {
                let count = prompts.len();
                state.replace_all(prompts);
                info!(count, "Prompts loaded");
                Ok(count)
            }
            Err(e) => {
                warn!(error = %e, "Failed to load prompts");
                Err(SyncError::FetchFailure(reason(&e)))
            }
        }
    }

    pub async fn create(&self, name: &str, text: &str) -> Result<Prompt, SyncError> {
        let (api, epoch) = self.start()?;
        let result = api.create_prompt(name, text).await;

        let mut state = self.finish(epoch, "create")?;
        match result {
            Ok(prompt) => {
                info!(id = %prompt.id, "Prompt created");
                state.apply_created(prompt.clone());
                Ok(prompt)
            }
            Err(e) => {
                warn!(error = %e, "Failed to create prompt");
                Err(SyncError::CreateFailure(reason(&e)))
            }
        }
    }

    /// Save new field values for the prompt currently being edited
    pub async fn update(&self, name: &str, text: &str) -> Result<Prompt, SyncError> {
        let (api, epoch) = self.start()?;
        let id = self.lock().edit_target.clone().ok_or(SyncError::NotEditing)?;
        let result = api.update_prompt(&id, name, text).await;

        let mut state = self.finish(epoch, "update")?;
        match result {
            Ok(prompt) if prompt.id != id => {
                warn!(expected = %id, got = %prompt.id, "Update returned a different prompt");
                Err(SyncError::UpdateFailure(format!(
                    "server returned prompt {} for prompt {}",
                    prompt.id, id
                )))
            }
            Ok(prompt) => {
                if !state.apply_updated(prompt.clone()) {
                    // Deleted while the update was in flight; do not bring it back
                    debug!(%id, "Updated prompt no longer present");
                    return Err(SyncError::StaleCompletion);
                }
                info!(%id, "Prompt updated");
                Ok(prompt)
            }
            Err(e) => {
                warn!(%id, error = %e, "Failed to update prompt");
                Err(SyncError::UpdateFailure(reason(&e)))
            }
        }
    }

    pub async fn delete(&self, id: &PromptId) -> Result<(), SyncError> {
        let (api, epoch) = self.start()?;
        let result = api.delete_prompt(id).await;

        let mut state = self.finish(epoch, "delete")?;
        match result {
            Ok(()) => {
                let removed = state.apply_deleted(id);
                info!(%id, removed, "Prompt deleted");
                Ok(())
            }
            Err(e) => {
                warn!(%id, error = %e, "Failed to delete prompt");
                Err(SyncError::DeleteFailure(reason(&e)))
            }
        }
    }

    /// Submit the draft form: update when editing, create otherwise
    pub async fn submit_draft(&self) -> Result<Prompt, SyncError> {
        let (draft, intent) = {
            let state = self.lock();
            (state.draft.clone(), state.intent())
        };
        match intent {
            DraftIntent::Create => self.create(&draft.name, &draft.text).await,
            DraftIntent::Update(_) => self.update(&draft.name, &draft.text).await,
        }
    }
}
