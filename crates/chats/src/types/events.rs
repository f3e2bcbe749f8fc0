//! Event channel wire codec.
//!
//! Every frame on the channel is a named event with a JSON payload. Inbound
//! frames decode into [`InboundEvent`]; the client only ever sends
//! [`OutboundSignal`]s.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{ConversationId, MessageId, SyncError, SyncResult, UserId};
use crate::entities::{DeliveryStatus, LastMessage, Message, UnreadCounts};
use crate::utils::Validator;

pub const CONVERSATION_UPDATE: &str = "conversation:update";
pub const MESSAGE_NEW: &str = "message:new";
pub const MESSAGE_STATUS: &str = "message:status";
pub const PRESENCE_UPDATE: &str = "presence:update";
pub const TYPING: &str = "typing";
pub const CONVERSATION_JOIN: &str = "conversation:join";
pub const CONVERSATION_LEAVE: &str = "conversation:leave";

/// A named event as carried by the channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelFrame {
    pub event: String,
    #[serde(default)]
    pub data: Value,
}

impl ChannelFrame {
    pub fn new(event: impl Into<String>, data: Value) -> Self {
        Self {
            event: event.into(),
            data,
        }
    }

    /// Parse a text frame
    pub fn parse(text: &str) -> SyncResult<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Encode as a text frame
    pub fn to_text(&self) -> SyncResult<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Status change reported for a single message
#[derive(Debug, Clone, PartialEq)]
pub struct StatusChange {
    pub message_id: MessageId,
    /// User whose action produced the change
    pub user_id: UserId,
    /// Present only when the backend knows it
    pub conversation_id: Option<ConversationId>,
    pub status: DeliveryStatus,
}

/// Typing signal from another participant
#[derive(Debug, Clone, PartialEq)]
pub struct TypingSignal {
    pub conversation_id: ConversationId,
    pub user_id: UserId,
    pub is_typing: bool,
}

/// Decoded inbound event
#[derive(Debug, Clone, PartialEq)]
pub enum InboundEvent {
    /// Conversation summary changed
    ConversationUpdate {
        conversation_id: ConversationId,
        last_message: Option<LastMessage>,
        unread_counts: UnreadCounts,
    },

    /// A message was posted
    MessageNew(Message),

    /// Delivery or read status of a message changed
    MessageStatus(StatusChange),

    /// Authoritative list of online users
    PresenceSnapshot(Vec<UserId>),

    /// A participant started or stopped typing
    Typing(TypingSignal),
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConversationUpdateWire {
    conversation_id: Option<String>,
    #[serde(default)]
    last_message: Option<LastMessage>,
    #[serde(default)]
    unread_counts: Option<UnreadCounts>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct MessageWire {
    #[serde(alias = "_id")]
    id: Option<String>,
    conversation_id: Option<String>,
    sender_id: Option<String>,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    image: Option<String>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    created_at: Option<chrono::DateTime<chrono::Utc>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct MessageStatusWire {
    message_id: Option<String>,
    user_id: Option<String>,
    #[serde(default)]
    conversation_id: Option<String>,
    #[serde(default)]
    status: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TypingWire {
    conversation_id: Option<String>,
    user_id: Option<String>,
    #[serde(default)]
    is_typing: Option<bool>,
}

fn payload<T: for<'de> Deserialize<'de>>(event: &'static str, data: &Value) -> SyncResult<T> {
    T::deserialize(data).map_err(|source| SyncError::malformed(event, source))
}

impl InboundEvent {
    /// Decode a channel frame into a typed event.
    ///
    /// Payloads lacking a required identifier are rejected with
    /// [`SyncError::MissingField`].
    pub fn decode(frame: &ChannelFrame) -> SyncResult<Self> {
        match frame.event.as_str() {
            CONVERSATION_UPDATE => {
                let wire: ConversationUpdateWire = payload(CONVERSATION_UPDATE, &frame.data)?;
                Ok(InboundEvent::ConversationUpdate {
                    conversation_id: Validator::required(
                        CONVERSATION_UPDATE,
                        "conversationId",
                        wire.conversation_id,
                    )?,
                    last_message: wire.last_message,
                    unread_counts: wire.unread_counts.unwrap_or_default(),
                })
            }
            MESSAGE_NEW => {
                let wire: MessageWire = payload(MESSAGE_NEW, &frame.data)?;
                let conversation_id =
                    Validator::required(MESSAGE_NEW, "conversationId", wire.conversation_id)?;
                let id = Validator::required(MESSAGE_NEW, "_id", wire.id)?;
                let sender_id = Validator::optional(wire.sender_id).unwrap_or_default();

                Ok(InboundEvent::MessageNew(Message {
                    id,
                    conversation_id,
                    sender_id,
                    text: wire.text,
                    image: wire.image,
                    status: wire
                        .status
                        .as_deref()
                        .map(DeliveryStatus::from)
                        .unwrap_or_default(),
                    created_at: wire.created_at.unwrap_or_else(chrono::Utc::now),
                    receipts: Default::default(),
                }))
            }
            MESSAGE_STATUS => {
                let wire: MessageStatusWire = payload(MESSAGE_STATUS, &frame.data)?;
                Ok(InboundEvent::MessageStatus(StatusChange {
                    message_id: Validator::required(MESSAGE_STATUS, "messageId", wire.message_id)?,
                    user_id: Validator::required(MESSAGE_STATUS, "userId", wire.user_id)?,
                    conversation_id: Validator::optional(wire.conversation_id),
                    status: wire
                        .status
                        .as_deref()
                        .map(DeliveryStatus::from)
                        .unwrap_or(DeliveryStatus::Read),
                }))
            }
            PRESENCE_UPDATE => {
                let ids: Option<Vec<String>> = payload(PRESENCE_UPDATE, &frame.data)?;
                Ok(InboundEvent::PresenceSnapshot(
                    ids.unwrap_or_default()
                        .into_iter()
                        .filter(|id| !id.is_empty())
                        .collect(),
                ))
            }
            TYPING => {
                let wire: TypingWire = payload(TYPING, &frame.data)?;
                Ok(InboundEvent::Typing(TypingSignal {
                    conversation_id: Validator::required(
                        TYPING,
                        "conversationId",
                        wire.conversation_id,
                    )?,
                    user_id: Validator::required(TYPING, "userId", wire.user_id)?,
                    is_typing: wire.is_typing.unwrap_or(false),
                }))
            }
            other => Err(SyncError::unknown_event(other)),
        }
    }

    /// Channel name of the event
    pub fn event_type_name(&self) -> &'static str {
        match self {
            InboundEvent::ConversationUpdate { .. } => CONVERSATION_UPDATE,
            InboundEvent::MessageNew(_) => MESSAGE_NEW,
            InboundEvent::MessageStatus(_) => MESSAGE_STATUS,
            InboundEvent::PresenceSnapshot(_) => PRESENCE_UPDATE,
            InboundEvent::Typing(_) => TYPING,
        }
    }

    /// Conversation the event explicitly names, if any
    pub fn conversation_id(&self) -> Option<&str> {
        match self {
            InboundEvent::ConversationUpdate {
                conversation_id, ..
            } => Some(conversation_id),
            InboundEvent::MessageNew(message) => Some(&message.conversation_id),
            InboundEvent::MessageStatus(change) => change.conversation_id.as_deref(),
            InboundEvent::Typing(signal) => Some(&signal.conversation_id),
            InboundEvent::PresenceSnapshot(_) => None,
        }
    }
}

/// Membership signal sent when the active conversation changes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundSignal {
    JoinConversation(ConversationId),
    LeaveConversation(ConversationId),
}

impl OutboundSignal {
    pub fn event_name(&self) -> &'static str {
        match self {
            OutboundSignal::JoinConversation(_) => CONVERSATION_JOIN,
            OutboundSignal::LeaveConversation(_) => CONVERSATION_LEAVE,
        }
    }

    pub fn conversation_id(&self) -> &str {
        match self {
            OutboundSignal::JoinConversation(id) | OutboundSignal::LeaveConversation(id) => id,
        }
    }

    pub fn to_frame(&self) -> ChannelFrame {
        ChannelFrame::new(
            self.event_name(),
            Value::String(self.conversation_id().to_string()),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn decode(event: &str, data: Value) -> SyncResult<InboundEvent> {
        InboundEvent::decode(&ChannelFrame::new(event, data))
    }

    #[test]
    fn decodes_conversation_update() {
        let event = decode(
            CONVERSATION_UPDATE,
            json!({
                "conversationId": "c1",
                "lastMessage": { "_id": "m9", "text": "latest" },
                "unreadCounts": { "alice": 4 }
            }),
        )
        .unwrap();

        match event {
            InboundEvent::ConversationUpdate {
                conversation_id,
                last_message,
                unread_counts,
            } => {
                assert_eq!(conversation_id, "c1");
                assert_eq!(last_message.unwrap().id.as_deref(), Some("m9"));
                assert_eq!(unread_counts.get("alice"), Some(&4));
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn conversation_update_without_payload_is_malformed() {
        let error = decode(CONVERSATION_UPDATE, Value::Null).unwrap_err();
        assert!(matches!(error, SyncError::MalformedPayload { .. }));
    }

    #[test]
    fn new_message_requires_conversation_id() {
        let error = decode(MESSAGE_NEW, json!({ "_id": "m1", "senderId": "bob" })).unwrap_err();
        assert!(matches!(
            error,
            SyncError::MissingField {
                field: "conversationId",
                ..
            }
        ));
    }

    #[test]
    fn new_message_without_sender_is_accepted() {
        let event = decode(
            MESSAGE_NEW,
            json!({ "_id": "m1", "conversationId": "c1", "text": "hi" }),
        )
        .unwrap();

        let InboundEvent::MessageNew(message) = event else {
            panic!("expected a new message");
        };
        assert_eq!(message.id, "m1");
        assert_eq!(message.conversation_id, "c1");
        assert_eq!(message.sender_id, "");
    }

    #[test]
    fn new_message_requires_id() {
        let error = decode(MESSAGE_NEW, json!({ "conversationId": "c1", "text": "hi" })).unwrap_err();
        assert!(matches!(error, SyncError::MissingField { field: "_id", .. }));
    }

    #[test]
    fn new_message_defaults_status_to_sent() {
        let event = decode(
            MESSAGE_NEW,
            json!({ "_id": "m1", "conversationId": "c1", "senderId": "bob", "text": "yo" }),
        )
        .unwrap();

        let InboundEvent::MessageNew(message) = event else {
            panic!("expected a new message");
        };
        assert_eq!(message.status, DeliveryStatus::Sent);
        assert_eq!(message.text.as_deref(), Some("yo"));
    }

    #[test]
    fn status_event_treats_empty_conversation_as_absent() {
        let event = decode(
            MESSAGE_STATUS,
            json!({ "messageId": "m1", "userId": "bob", "conversationId": "" }),
        )
        .unwrap();

        assert_eq!(
            event,
            InboundEvent::MessageStatus(StatusChange {
                message_id: "m1".into(),
                user_id: "bob".into(),
                conversation_id: None,
                status: DeliveryStatus::Read,
            })
        );
        assert_eq!(event.conversation_id(), None);
    }

    #[test]
    fn status_event_requires_user_id() {
        let error = decode(MESSAGE_STATUS, json!({ "messageId": "m1" })).unwrap_err();
        assert!(error.is_payload_error());
    }

    #[test]
    fn null_presence_is_an_empty_snapshot() {
        assert_eq!(
            decode(PRESENCE_UPDATE, Value::Null).unwrap(),
            InboundEvent::PresenceSnapshot(Vec::new())
        );
    }

    #[test]
    fn typing_flag_defaults_to_false() {
        let event = decode(TYPING, json!({ "conversationId": "c1", "userId": "bob" })).unwrap();
        assert_eq!(
            event,
            InboundEvent::Typing(TypingSignal {
                conversation_id: "c1".into(),
                user_id: "bob".into(),
                is_typing: false,
            })
        );
    }

    #[test]
    fn unknown_event_names_are_rejected() {
        let error = decode("post:new", json!({})).unwrap_err();
        assert!(matches!(error, SyncError::UnknownEvent { .. }));
        assert!(!error.is_payload_error());
    }

    #[test]
    fn outbound_signals_encode_as_named_frames() {
        let frame = OutboundSignal::LeaveConversation("c7".into()).to_frame();
        assert_eq!(frame.to_text().unwrap(), r#"{"event":"conversation:leave","data":"c7"}"#);
    }

    #[test]
    fn parses_text_frames() {
        let frame = ChannelFrame::parse(r#"{"event":"presence:update","data":["a","b"]}"#).unwrap();
        assert_eq!(frame.event, PRESENCE_UPDATE);
        assert_eq!(frame.data, json!(["a", "b"]));
    }
}
