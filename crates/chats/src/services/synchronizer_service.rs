//! Presence synchronizer.
//!
//! Translates inbound channel events into mutations of the locally cached
//! conversation, presence and typing state, and tells the backend which
//! conversation the user currently has open.
//!
//! The synchronizer is a plain owned value driven through `&mut self`, so
//! each event is applied to completion before the next one is looked at and
//! the leave/join pair of an active-conversation change is never observed
//! half done. Events are best effort: anything that cannot be applied is
//! dropped with a debug trace and reported through [`Dispatch`].

use std::collections::BTreeMap;
use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::api::EventChannel;
use crate::entities::{LastMessage, Message, UnreadCounts};
use crate::repositories::ConversationStore;
use crate::services::{PresenceSet, TypingIndicators};
use crate::types::{
    ChannelFrame, ConversationId, InboundEvent, OutboundSignal, StatusChange, SyncSnapshot,
    TypingSignal, UserId,
};
use crate::utils::Validator;

/// Why an inbound event left the state untouched
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    /// No local identity; listeners are not attached
    Detached,
    /// Unknown event name or unusable payload
    Malformed,
    /// Typing signal sent by the local user
    SelfEcho,
    /// Message id already stored
    Duplicate,
    /// Status change whose conversation could not be determined
    Unresolved,
    /// Target found nothing to change
    NoChange,
}

/// Outcome of handling one inbound event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    Applied,
    Ignored(IgnoreReason),
}

impl Dispatch {
    pub fn is_applied(&self) -> bool {
        matches!(self, Dispatch::Applied)
    }
}

/// Reconciles channel events with local state
pub struct PresenceSynchronizer<C> {
    channel: C,
    identity: Option<UserId>,
    store: ConversationStore,
    presence: PresenceSet,
    typing: TypingIndicators,
    /// Conversation the user has open
    active_conversation: Option<ConversationId>,
    /// Conversation last announced with a join
    joined_conversation: Option<ConversationId>,
}

impl<C: EventChannel> PresenceSynchronizer<C> {
    /// Create a detached synchronizer with an empty store
    pub fn new(channel: C, typing_ttl: Duration) -> Self {
        Self {
            channel,
            identity: None,
            store: ConversationStore::new(),
            presence: PresenceSet::new(),
            typing: TypingIndicators::new(typing_ttl),
            active_conversation: None,
            joined_conversation: None,
        }
    }

    /// Connect the channel on behalf of `identity` and start handling events.
    ///
    /// Attaching under a different identity detaches first. If a conversation
    /// is already active it is joined as soon as the channel is up.
    pub fn attach(&mut self, identity: impl Into<UserId>) {
        let identity = identity.into();
        if identity.is_empty() {
            warn!("refusing to attach without an identity");
            return;
        }
        if self.identity.as_deref() == Some(identity.as_str()) {
            return;
        }
        if self.identity.is_some() {
            self.detach();
        }

        info!(identity = %identity, "attaching synchronizer");
        self.channel.connect(&identity);
        self.identity = Some(identity);

        if let Some(active) = self.active_conversation.clone() {
            self.announce(Some(active));
        }
    }

    /// Disconnect the channel and stop handling events.
    ///
    /// Cached conversations are kept; the joined baseline is forgotten since
    /// the backend drops memberships with the connection.
    pub fn detach(&mut self) {
        let Some(identity) = self.identity.take() else {
            return;
        };

        info!(identity = %identity, "detaching synchronizer");
        self.channel.disconnect();
        self.joined_conversation = None;
    }

    pub fn is_attached(&self) -> bool {
        self.identity.is_some()
    }

    pub fn identity(&self) -> Option<&str> {
        self.identity.as_deref()
    }

    /// Change the conversation the user has open.
    ///
    /// While connected this emits `leave(previous)` when the previous one
    /// differs, then `join(next)`. While disconnected only the reference is
    /// recorded.
    pub fn set_active_conversation(&mut self, next: Option<ConversationId>) {
        let next = Validator::optional(next);
        if next == self.active_conversation {
            return;
        }

        debug!(previous = ?self.active_conversation, next = ?next, "active conversation changed");
        self.active_conversation = next.clone();
        self.announce(next);
    }

    fn announce(&mut self, next: Option<ConversationId>) {
        if !self.channel.is_connected() {
            debug!(next = ?next, "channel offline, membership signals deferred");
            return;
        }

        if let Some(previous) = self.joined_conversation.take() {
            if Some(&previous) != next.as_ref() {
                self.channel
                    .emit(OutboundSignal::LeaveConversation(previous));
            }
        }

        if let Some(conversation_id) = &next {
            self.channel
                .emit(OutboundSignal::JoinConversation(conversation_id.clone()));
        }

        self.joined_conversation = next;
    }

    pub fn active_conversation(&self) -> Option<&str> {
        self.active_conversation.as_deref()
    }

    pub fn joined_conversation(&self) -> Option<&str> {
        self.joined_conversation.as_deref()
    }

    /// Decode a raw frame and handle it
    pub fn dispatch_frame(&mut self, frame: &ChannelFrame) -> Dispatch {
        if self.identity.is_none() {
            debug!(event = %frame.event, "detached, ignoring frame");
            return Dispatch::Ignored(IgnoreReason::Detached);
        }

        match InboundEvent::decode(frame) {
            Ok(event) => self.handle(event),
            Err(error) => {
                debug!(event = %frame.event, %error, "dropping undecodable frame");
                Dispatch::Ignored(IgnoreReason::Malformed)
            }
        }
    }

    /// Apply one decoded event
    pub fn handle(&mut self, event: InboundEvent) -> Dispatch {
        let event_type = event.event_type_name();
        if self.identity.is_none() {
            debug!(event = event_type, "detached, ignoring event");
            return Dispatch::Ignored(IgnoreReason::Detached);
        }

        let outcome = match event {
            InboundEvent::ConversationUpdate {
                conversation_id,
                last_message,
                unread_counts,
            } => self.on_conversation_update(&conversation_id, last_message, unread_counts),
            InboundEvent::MessageNew(message) => self.on_message_new(message),
            InboundEvent::MessageStatus(change) => self.on_message_status(change),
            InboundEvent::PresenceSnapshot(user_ids) => self.on_presence(user_ids),
            InboundEvent::Typing(signal) => self.on_typing(signal),
        };

        if let Dispatch::Ignored(reason) = outcome {
            debug!(event = event_type, ?reason, "event left state unchanged");
        }
        outcome
    }

    fn on_conversation_update(
        &mut self,
        conversation_id: &str,
        last_message: Option<LastMessage>,
        unread_counts: UnreadCounts,
    ) -> Dispatch {
        self.store
            .upsert_summary(conversation_id, last_message, unread_counts);
        Dispatch::Applied
    }

    fn on_message_new(&mut self, message: Message) -> Dispatch {
        if !self.store.contains(&message.conversation_id) {
            debug!(
                conversation_id = %message.conversation_id,
                "creating conversation for first message"
            );
        }

        if self.store.append_message(message) {
            Dispatch::Applied
        } else {
            Dispatch::Ignored(IgnoreReason::Duplicate)
        }
    }

    fn on_message_status(&mut self, change: StatusChange) -> Dispatch {
        let Some(conversation_id) = self.resolve_conversation(&change) else {
            return Dispatch::Ignored(IgnoreReason::Unresolved);
        };

        let changed = self.store.update_message_status(
            &conversation_id,
            &change.message_id,
            &change.user_id,
            change.status,
        );
        if changed {
            Dispatch::Applied
        } else {
            Dispatch::Ignored(IgnoreReason::NoChange)
        }
    }

    /// Conversation a status change applies to.
    ///
    /// Tried in order: the id carried by the event, the conversation holding
    /// the message, the active conversation.
    pub fn resolve_conversation(&self, change: &StatusChange) -> Option<ConversationId> {
        change
            .conversation_id
            .clone()
            .or_else(|| self.store.locate(&change.message_id).map(str::to_string))
            .or_else(|| self.active_conversation.clone())
    }

    fn on_presence(&mut self, user_ids: Vec<UserId>) -> Dispatch {
        self.presence.replace(user_ids);
        Dispatch::Applied
    }

    fn on_typing(&mut self, signal: TypingSignal) -> Dispatch {
        if self.identity.as_deref() == Some(signal.user_id.as_str()) {
            return Dispatch::Ignored(IgnoreReason::SelfEcho);
        }

        let changed = self.typing.set(
            &signal.conversation_id,
            &signal.user_id,
            signal.is_typing,
            Instant::now(),
        );
        if changed {
            Dispatch::Applied
        } else {
            Dispatch::Ignored(IgnoreReason::NoChange)
        }
    }

    /// Remove lapsed typing indicators, returning how many were cleared
    pub fn expire_typing(&mut self, now: Instant) -> usize {
        let expired = self.typing.expire(now);
        for (conversation_id, user_id) in &expired {
            debug!(%conversation_id, %user_id, "typing indicator expired");
        }
        expired.len()
    }

    pub fn store(&self) -> &ConversationStore {
        &self.store
    }

    /// Mutable store access for REST baselines
    pub fn store_mut(&mut self) -> &mut ConversationStore {
        &mut self.store
    }

    pub fn presence(&self) -> &PresenceSet {
        &self.presence
    }

    pub fn typing(&self) -> &TypingIndicators {
        &self.typing
    }

    pub fn channel(&self) -> &C {
        &self.channel
    }

    pub fn channel_mut(&mut self) -> &mut C {
        &mut self.channel
    }

    /// Detach and hand back the channel
    pub fn into_channel(mut self) -> C {
        self.detach();
        self.channel
    }

    /// Copy the current state
    pub fn snapshot(&self) -> SyncSnapshot {
        let now = Instant::now();

        let mut conversations: Vec<_> = self.store.conversations().cloned().collect();
        conversations.sort_by(|a, b| a.id.cmp(&b.id));

        let typing: BTreeMap<ConversationId, Vec<UserId>> = self
            .typing
            .conversations(now)
            .into_iter()
            .map(|conversation_id| {
                let users = self
                    .typing
                    .typing_users(conversation_id, now)
                    .into_iter()
                    .map(str::to_string)
                    .collect();
                (conversation_id.to_string(), users)
            })
            .collect();

        SyncSnapshot {
            identity: self.identity.clone(),
            active_conversation: self.active_conversation.clone(),
            conversations,
            online_users: self
                .presence
                .online_users()
                .into_iter()
                .map(str::to_string)
                .collect(),
            typing,
        }
    }
}
