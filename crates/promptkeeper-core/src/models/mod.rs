//! Data models for prompts and accounts.
//!
//! This module contains the local domain types (`Prompt`, `PromptId`,
//! `AuthUser`) and the wire envelopes the prompt endpoints speak
//! (`{data: {id, attributes: {name, prompt}}}`).

pub mod prompt;
pub mod user;

pub use prompt::{
    DataEnvelope, Prompt, PromptAttributes, PromptId, PromptListResponse, PromptRecord,
    PromptRequest, PromptResponse,
};
pub use user::AuthUser;
