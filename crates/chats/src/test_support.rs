//! Helpers for exercising the synchronizer without a live connection.

use serde_json::Value;

use crate::api::EventChannel;
use crate::types::{ChannelFrame, OutboundSignal, UserId};

/// Channel that records every interaction instead of talking to a backend
#[derive(Debug, Clone, Default)]
pub struct RecordingChannel {
    connected_as: Option<UserId>,
    /// Identities passed to `connect`, in order
    pub connects: Vec<UserId>,
    pub disconnects: usize,
    /// Signals emitted while connected
    pub emitted: Vec<OutboundSignal>,
    /// Signals emitted while disconnected
    pub dropped: Vec<OutboundSignal>,
}

impl RecordingChannel {
    pub fn connected_as(&self) -> Option<&str> {
        self.connected_as.as_deref()
    }

    /// Take the emitted signals, leaving the record empty
    pub fn take_emitted(&mut self) -> Vec<OutboundSignal> {
        std::mem::take(&mut self.emitted)
    }
}

impl EventChannel for RecordingChannel {
    fn connect(&mut self, identity: &str) {
        self.connected_as = Some(identity.to_string());
        self.connects.push(identity.to_string());
    }

    fn disconnect(&mut self) {
        if self.connected_as.take().is_some() {
            self.disconnects += 1;
        }
    }

    fn is_connected(&self) -> bool {
        self.connected_as.is_some()
    }

    fn emit(&mut self, signal: OutboundSignal) {
        if self.is_connected() {
            self.emitted.push(signal);
        } else {
            self.dropped.push(signal);
        }
    }
}

/// Build a channel frame
pub fn frame(event: &str, data: Value) -> ChannelFrame {
    ChannelFrame::new(event, data)
}
