//! Failure conditions surfaced by the session and prompt sync layers.
//!
//! Every operation on `SessionController` and `ResourceSyncEngine` returns one
//! of these instead of panicking. Network errors and application-level
//! rejections of the same operation collapse into the same variant; the
//! string is only for showing to the user.

use thiserror::Error;

use crate::models::PromptId;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SyncError {
    #[error("Sign-in failed: {0}")]
    AuthFailure(String),

    #[error("Could not load prompts: {0}")]
    FetchFailure(String),

    #[error("Could not create prompt: {0}")]
    CreateFailure(String),

    #[error("Could not update prompt: {0}")]
    UpdateFailure(String),

    #[error("Could not delete prompt: {0}")]
    DeleteFailure(String),

    #[error("Prompt {0} is no longer in the list")]
    StaleReference(PromptId),

    #[error("Result arrived after the session changed and was discarded")]
    StaleCompletion,

    #[error("Not signed in")]
    NotAuthenticated,

    #[error("Already signed in")]
    AlreadyAuthenticated,

    #[error("No prompt is being edited")]
    NotEditing,
}

impl SyncError {
    /// True for failures the user can retry by repeating the same action
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            SyncError::AuthFailure(_)
                | SyncError::FetchFailure(_)
                | SyncError::CreateFailure(_)
                | SyncError::UpdateFailure(_)
                | SyncError::DeleteFailure(_)
        )
    }
}

/// Flatten an error chain into a single line for a user-facing message
pub(crate) fn reason(err: &anyhow::Error) -> String {
    format!("{:#}", err)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reason_includes_context_chain() {
        let err = anyhow::anyhow!("connection refused").context("Failed to fetch prompts");
        assert_eq!(reason(&err), "Failed to fetch prompts: connection refused");
    }

    #[test]
    fn test_is_retryable() {
        assert!(SyncError::CreateFailure("x".into()).is_retryable());
        assert!(!SyncError::StaleCompletion.is_retryable());
        assert!(!SyncError::StaleReference(PromptId::from(1)).is_retryable());
    }
}
