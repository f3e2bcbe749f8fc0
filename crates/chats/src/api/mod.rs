//! Collaborator interfaces consumed by the synchronizer.

pub mod channel;

pub use channel::EventChannel;
