//! promptkeeper core: session handling and prompt synchronization.
//!
//! A `SessionController` signs the user in against the remote API and keeps
//! the session token in a `CredentialStore`. A `ResourceSyncEngine` holds the
//! local list of prompts plus the edit form, and applies create, update and
//! delete results once the server has confirmed them.

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod models;
pub mod sync;

pub use api::{ApiClient, ApiError};
pub use auth::{AuthForm, AuthState, CredentialStore, LoginOutcome, SessionController};
pub use config::Config;
pub use error::SyncError;
pub use models::{AuthUser, Prompt, PromptId};
pub use sync::{DraftForm, DraftIntent, ResourceSyncEngine};
