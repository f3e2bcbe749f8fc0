use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{ConversationId, MessageId, UserId};

/// Delivery progress of a message, ordered from least to most advanced
#[derive(
    Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash,
)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryStatus {
    #[default]
    Sent,
    Delivered,
    Read,
}

impl From<&str> for DeliveryStatus {
    fn from(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "delivered" => DeliveryStatus::Delivered,
            "read" | "seen" => DeliveryStatus::Read,
            _ => DeliveryStatus::Sent,
        }
    }
}

impl From<DeliveryStatus> for String {
    fn from(status: DeliveryStatus) -> Self {
        match status {
            DeliveryStatus::Sent => "sent".to_string(),
            DeliveryStatus::Delivered => "delivered".to_string(),
            DeliveryStatus::Read => "read".to_string(),
        }
    }
}

/// A message inside a conversation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    /// Backend identifier
    #[serde(alias = "_id")]
    pub id: MessageId,
    /// Conversation this message was appended under
    pub conversation_id: ConversationId,
    /// User who sent the message, empty when the backend omits it
    #[serde(default)]
    pub sender_id: UserId,
    /// Text body
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Image reference
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    /// Most advanced delivery status reported by any recipient
    #[serde(default)]
    pub status: DeliveryStatus,
    /// Creation timestamp
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    /// Per-recipient receipts
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub receipts: BTreeMap<UserId, DeliveryStatus>,
}

impl Message {
    /// Create a freshly sent text message
    pub fn new(
        id: impl Into<MessageId>,
        conversation_id: impl Into<ConversationId>,
        sender_id: impl Into<UserId>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            conversation_id: conversation_id.into(),
            sender_id: sender_id.into(),
            text: Some(text.into()),
            image: None,
            status: DeliveryStatus::Sent,
            created_at: Utc::now(),
            receipts: BTreeMap::new(),
        }
    }

    /// Record that `user_id` reached `status` for this message.
    ///
    /// Neither the receipt nor the overall status ever moves backwards. Returns
    /// whether anything changed.
    pub fn apply_status(&mut self, user_id: &str, status: DeliveryStatus) -> bool {
        let mut changed = false;

        let receipt = self
            .receipts
            .entry(user_id.to_string())
            .or_insert(DeliveryStatus::Sent);
        if status > *receipt {
            *receipt = status;
            changed = true;
        }

        if status > self.status {
            self.status = status;
            changed = true;
        }

        changed
    }
}
