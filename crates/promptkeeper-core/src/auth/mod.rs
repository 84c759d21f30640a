//! Authentication module for managing the user session.
//!
//! This module provides:
//! - `CredentialStore`: durable storage for the single session token, backed
//!   by a JSON file, the OS keychain, or memory
//! - `SessionController`: the Anonymous/Authenticated state machine driving
//!   login, registration and logout
//!
//! A stored token is trusted on startup without asking the server.

pub mod credentials;
pub mod session;
pub mod token_file;

pub use credentials::{CredentialStore, KeyringCredentialStore, MemoryCredentialStore, DEFAULT_KEYRING_ACCOUNT};
pub use session::{AuthForm, AuthState, LoginOutcome, SessionController};
pub use token_file::FileCredentialStore;
