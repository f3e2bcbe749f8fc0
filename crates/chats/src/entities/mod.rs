//! Domain entities cached on the client.
//!
//! Conversations own their messages; both are plain data mutated only by the
//! conversation store.

pub mod conversation;
pub mod message;

// Re-export all entity types
pub use conversation::{Conversation, ConversationSummary, LastMessage, MessagePage, UnreadCounts};
pub use message::{DeliveryStatus, Message};
