//! REST API client module for the prompt service.
//!
//! This module provides the `ApiClient` for the `auth/local` login and
//! registration endpoints and the `prompts` CRUD endpoints.
//!
//! The API uses JWT bearer token authentication; the token comes back from
//! login or registration and is attached with `ApiClient::with_token`.

pub mod client;
pub mod error;

pub use client::{ApiClient, AuthResponse};
pub use error::ApiError;
