//! Session event loop.
//!
//! One task owns the session. Inbound frames and session commands share one
//! queue and are serviced in arrival order, interleaved with the typing
//! sweep; every handler runs to completion before the next input is looked at.

use std::time::Duration;

use chatsync_chats::{ChannelFrame, ConversationId, EventChannel};
use tokio::sync::mpsc;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, info};

use crate::session::SyncSession;

/// Requests from the UI side
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionCommand {
    /// The user opened (or closed, with `None`) a conversation
    SetActive(Option<ConversationId>),
    Logout,
}

/// One entry of the session's input queue
#[derive(Debug, Clone, PartialEq)]
pub enum SessionInput {
    Frame(ChannelFrame),
    Command(SessionCommand),
}

impl From<ChannelFrame> for SessionInput {
    fn from(frame: ChannelFrame) -> Self {
        SessionInput::Frame(frame)
    }
}

impl From<SessionCommand> for SessionInput {
    fn from(command: SessionCommand) -> Self {
        SessionInput::Command(command)
    }
}

/// Drive `session` until logout is requested or the input queue closes, then
/// hand the session back.
pub async fn run<C: EventChannel>(
    mut session: SyncSession<C>,
    mut inputs: mpsc::Receiver<SessionInput>,
    sweep_interval: Duration,
) -> SyncSession<C> {
    let mut sweep = time::interval(sweep_interval);
    sweep.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;

            input = inputs.recv() => match input {
                Some(SessionInput::Frame(frame)) => {
                    let outcome = session.synchronizer_mut().dispatch_frame(&frame);
                    debug!(event = %frame.event, ?outcome, "frame handled");
                }
                Some(SessionInput::Command(SessionCommand::SetActive(conversation_id))) => {
                    session
                        .synchronizer_mut()
                        .set_active_conversation(conversation_id);
                }
                Some(SessionInput::Command(SessionCommand::Logout)) => {
                    info!("logout requested, stopping event loop");
                    break;
                }
                None => {
                    info!("input queue closed, stopping event loop");
                    break;
                }
            },

            _ = sweep.tick() => {
                session.synchronizer_mut().expire_typing(Instant::now());
            }
        }
    }

    session
}
