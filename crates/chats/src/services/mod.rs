//! Synchronization services.
//!
//! The synchronizer is the only stateful coordinator; presence and typing
//! state are owned by it and mutated from its event handlers.

pub mod presence_service;
pub mod synchronizer_service;
pub mod typing_service;

// Re-export all services
pub use presence_service::PresenceSet;
pub use synchronizer_service::{Dispatch, IgnoreReason, PresenceSynchronizer};
pub use typing_service::TypingIndicators;
