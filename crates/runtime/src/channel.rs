//! Bridge between the synchronizer and a transport task.
//!
//! The synchronizer talks to [`ForwardingChannel`]; whatever owns the socket
//! drains the matching receiver and performs the actual connect, disconnect
//! and send.

use chatsync_chats::{ChannelFrame, EventChannel, OutboundSignal, UserId};
use tokio::sync::mpsc;
use tracing::{debug, info};

/// Work for the transport task
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelCommand {
    Connect { identity: UserId },
    Disconnect,
    Send(ChannelFrame),
}

/// [`EventChannel`] that forwards everything to an unbounded queue
#[derive(Debug)]
pub struct ForwardingChannel {
    outbound: mpsc::UnboundedSender<ChannelCommand>,
    identity: Option<UserId>,
}

impl ForwardingChannel {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<ChannelCommand>) {
        let (outbound, receiver) = mpsc::unbounded_channel();
        (
            Self {
                outbound,
                identity: None,
            },
            receiver,
        )
    }

    fn forward(&self, command: ChannelCommand) -> bool {
        match self.outbound.send(command) {
            Ok(()) => true,
            Err(error) => {
                debug!(command = ?error.0, "transport gone, command dropped");
                false
            }
        }
    }
}

impl EventChannel for ForwardingChannel {
    fn connect(&mut self, identity: &str) {
        if self.identity.as_deref() == Some(identity) {
            return;
        }
        info!(identity, "connecting event channel");
        if self.forward(ChannelCommand::Connect {
            identity: identity.to_string(),
        }) {
            self.identity = Some(identity.to_string());
        }
    }

    fn disconnect(&mut self) {
        if self.identity.take().is_some() {
            info!("disconnecting event channel");
            self.forward(ChannelCommand::Disconnect);
        }
    }

    fn is_connected(&self) -> bool {
        self.identity.is_some() && !self.outbound.is_closed()
    }

    fn emit(&mut self, signal: OutboundSignal) {
        if !self.is_connected() {
            debug!(?signal, "channel offline, signal dropped");
            return;
        }
        self.forward(ChannelCommand::Send(signal.to_frame()));
    }
}
