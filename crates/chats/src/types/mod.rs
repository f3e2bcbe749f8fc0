//! Shared types for the synchronization layer.
//!
//! This module contains the identifier aliases, error definitions, the
//! channel wire codec and snapshot types used across the crate.

pub mod errors;
pub mod events;
pub mod responses;

// Re-export common types
pub use errors::{SyncError, SyncResult};
pub use events::*;
pub use responses::*;

// Identifiers are opaque strings issued by the backend
pub type ConversationId = String;
pub type MessageId = String;
pub type UserId = String;
