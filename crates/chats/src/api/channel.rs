//! The event channel seen from the synchronizer.
//!
//! Transport, authentication handshakes and reconnection all live behind
//! this trait; the synchronizer only connects, disconnects and emits.

use crate::types::OutboundSignal;

/// Persistent, authenticated event connection
pub trait EventChannel {
    /// Open the connection on behalf of `identity`
    fn connect(&mut self, identity: &str);

    /// Tear the connection down
    fn disconnect(&mut self);

    fn is_connected(&self) -> bool;

    /// Send a signal without waiting for acknowledgement
    fn emit(&mut self, signal: OutboundSignal);
}

impl<C: EventChannel + ?Sized> EventChannel for Box<C> {
    fn connect(&mut self, identity: &str) {
        (**self).connect(identity)
    }

    fn disconnect(&mut self) {
        (**self).disconnect()
    }

    fn is_connected(&self) -> bool {
        (**self).is_connected()
    }

    fn emit(&mut self, signal: OutboundSignal) {
        (**self).emit(signal)
    }
}
