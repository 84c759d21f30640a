// Local prompt collection, edit target and draft form.
//
// Everything here is synchronous and network-free; `ResourceSyncEngine`
// decides when each mutation is allowed to run.

use serde::Serialize;

use crate::error::SyncError;
use crate::models::{Prompt, PromptId};

/// Field values of the prompt form
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DraftForm {
    pub name: String,
    pub text: String,
}

impl DraftForm {
    pub fn new(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            text: text.into(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_empty() && self.text.is_empty()
    }

    pub fn clear(&mut self) {
        self.name.clear();
        self.text.clear();
    }
}

/// What submitting the draft form will do
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DraftIntent {
    Create,
    Update(PromptId),
}

#[derive(Debug, Default)]
pub(crate) struct SyncState {
    pub(crate) prompts: Vec<Prompt>,
    pub(crate) edit_target: Option<PromptId>,
    pub(crate) draft: DraftForm,
    pub(crate) token: Option<String>,
    /// Bumped on every attach/reset; in-flight work compares against it
    pub(crate) epoch: u64,
}

impl SyncState {
    fn position(&self, id: &PromptId) -> Option<usize> {
        self.prompts.iter().position(|p| &p.id == id)
    }

    pub(crate) fn intent(&self) -> DraftIntent {
        match self.edit_target {
            Some(ref id) => DraftIntent::Update(id.clone()),
            None => DraftIntent::Create,
        }
    }

    /// Start a new session epoch with `token`, discarding any previous data
    pub(crate) fn attach(&mut self, token: String) {
        self.reset();
        self.token = Some(token);
    }

    /// Drop everything and start a new (anonymous) epoch
    pub(crate) fn reset(&mut self) {
        self.prompts.clear();
        self.edit_target = None;
        self.draft.clear();
        self.token = None;
        self.epoch += 1;
    }

    pub(crate) fn replace_all(&mut self, prompts: Vec<Prompt>) {
        self.prompts = prompts;
        let target_gone = self
            .edit_target
            .as_ref()
            .is_some_and(|id| self.position(id).is_none());
        if target_gone {
            self.cancel_edit();
        }
    }

    /// Append a created prompt. An id that is already present (a refresh
    /// finished first) is replaced where it sits instead of duplicated.
    pub(crate) fn apply_created(&mut self, prompt: Prompt) {
        match self.position(&prompt.id) {
            Some(idx) => self.prompts[idx] = prompt,
            None => self.prompts.push(prompt),
        }
        if self.edit_target.is_none() {
            self.draft.clear();
        }
    }

    /// Replace the matching entry in place. Returns false when the id is no
    /// longer present, in which case nothing is inserted.
    pub(crate) fn apply_updated(&mut self, prompt: Prompt) -> bool {
        let Some(idx) = self.position(&prompt.id) else {
            return false;
        };
        if self.edit_target.as_ref() == Some(&prompt.id) {
            self.cancel_edit();
        }
        self.prompts[idx] = prompt;
        true
    }

    /// Remove the entry with `id`, clearing the edit form if it pointed there.
    /// Returns whether an entry was removed.
    pub(crate) fn apply_deleted(&mut self, id: &PromptId) -> bool {
        let before = self.prompts.len();
        self.prompts.retain(|p| &p.id != id);
        if self.edit_target.as_ref() == Some(id) {
            self.cancel_edit();
        }
        self.prompts.len() != before
    }

    pub(crate) fn begin_edit(&mut self, id: &PromptId) -> Result<(), SyncError> {
        let idx = self
            .position(id)
            .ok_or_else(|| SyncError::StaleReference(id.clone()))?;
        let prompt = &self.prompts[idx];
        self.draft = DraftForm::new(prompt.name.clone(), prompt.text.clone());
        self.edit_target = Some(id.clone());
        Ok(())
    }

    pub(crate) fn cancel_edit(&mut self) {
        self.edit_target = None;
        self.draft.clear();
    }
}
