//! # chatsync chats crate
//!
//! Client-side conversation cache and the real-time synchronizer that keeps
//! it consistent with events pushed over the backend's event channel.
//!
//! ## Architecture
//!
//! - **Entities**: cached domain data (Conversation, Message)
//! - **Repositories**: the in-memory conversation store
//! - **Services**: presence, typing and the presence synchronizer
//! - **Types**: identifiers, errors and the channel wire codec
//! - **Api**: the event channel collaborator interface
//!
//! ## Usage
//!
//! ```rust
//! use std::time::Duration;
//! use chatsync_chats::{ChannelFrame, PresenceSynchronizer};
//! use chatsync_chats::test_support::RecordingChannel;
//!
//! let mut sync = PresenceSynchronizer::new(RecordingChannel::default(), Duration::from_secs(5));
//! sync.attach("alice");
//!
//! let frame = ChannelFrame::parse(r#"{"event":"presence:update","data":["bob"]}"#).unwrap();
//! assert!(sync.dispatch_frame(&frame).is_applied());
//! assert!(sync.presence().is_online("bob"));
//! ```

pub mod api;
pub mod entities;
pub mod repositories;
pub mod services;
pub mod test_support;
pub mod types;
pub mod utils;

// Re-export main types for convenience
pub use api::EventChannel;
pub use entities::{
    Conversation, ConversationSummary, DeliveryStatus, LastMessage, Message, MessagePage,
    UnreadCounts,
};
pub use repositories::ConversationStore;
pub use services::{Dispatch, IgnoreReason, PresenceSet, PresenceSynchronizer, TypingIndicators};
pub use types::{
    ChannelFrame, ConversationId, InboundEvent, MessageId, OutboundSignal, StatusChange,
    SyncError, SyncResult, SyncSnapshot, TypingSignal, UserId,
};
