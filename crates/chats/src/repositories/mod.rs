//! Client-side data access layer.
//!
//! The conversation store is the only repository: an in-memory cache of
//! conversations refreshed by REST baselines and channel events.

pub mod conversation_store;

pub use conversation_store::ConversationStore;
