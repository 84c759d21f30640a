//! Local prompt collection kept in step with the remote API.
//!
//! - `ResourceSyncEngine`: async CRUD operations that commit to local state
//!   only after the server has answered
//! - `DraftForm` / `DraftIntent`: the single create-or-edit form

pub mod engine;
mod state;

pub use engine::ResourceSyncEngine;
pub use state::{DraftForm, DraftIntent};
