use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::message::Message;
use crate::types::{ConversationId, MessageId, UserId};

/// Unread message count per participant
pub type UnreadCounts = BTreeMap<UserId, u32>;

/// Summary of the most recent message, as pushed with conversation updates
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LastMessage {
    #[serde(default, alias = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<MessageId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender_id: Option<UserId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

/// A locally cached conversation
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    pub id: ConversationId,
    /// Messages in chronological order
    pub messages: Vec<Message>,
    pub last_message: Option<LastMessage>,
    pub unread_counts: UnreadCounts,
    /// Cursor for the next page of older history
    pub next_cursor: Option<String>,
    pub has_more: bool,
}

impl Conversation {
    /// Create an empty conversation
    pub fn new(id: impl Into<ConversationId>) -> Self {
        Self {
            id: id.into(),
            messages: Vec::new(),
            last_message: None,
            unread_counts: UnreadCounts::new(),
            next_cursor: None,
            has_more: false,
        }
    }

    /// Find a message by id
    pub fn message(&self, message_id: &str) -> Option<&Message> {
        self.messages.iter().find(|message| message.id == message_id)
    }

    pub(crate) fn message_mut(&mut self, message_id: &str) -> Option<&mut Message> {
        self.messages
            .iter_mut()
            .find(|message| message.id == message_id)
    }

    /// Unread count for a user, zero when unknown
    pub fn unread_for(&self, user_id: &str) -> u32 {
        self.unread_counts.get(user_id).copied().unwrap_or(0)
    }

    /// Most recently appended message
    pub fn latest(&self) -> Option<&Message> {
        self.messages.last()
    }
}

/// A conversation entry from the REST conversation list
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ConversationSummary {
    #[serde(alias = "_id", alias = "conversationId")]
    pub id: ConversationId,
    #[serde(default)]
    pub last_message: Option<LastMessage>,
    #[serde(default)]
    pub unread_counts: UnreadCounts,
}

/// A page of older messages from the REST history endpoint
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MessagePage {
    /// Messages in chronological order
    #[serde(default)]
    pub items: Vec<Message>,
    #[serde(default)]
    pub next_cursor: Option<String>,
}

impl MessagePage {
    pub fn has_more(&self) -> bool {
        self.next_cursor.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unread_for_defaults_to_zero() {
        let mut conversation = Conversation::new("c1");
        conversation.unread_counts.insert("bob".into(), 3);

        assert_eq!(conversation.unread_for("bob"), 3);
        assert_eq!(conversation.unread_for("carol"), 0);
    }

    #[test]
    fn summary_accepts_mongo_style_id() {
        let summary: ConversationSummary = serde_json::from_value(serde_json::json!({
            "_id": "c9",
            "lastMessage": { "text": "see you", "senderId": "bob" },
            "unreadCounts": { "alice": 2 }
        }))
        .unwrap();

        assert_eq!(summary.id, "c9");
        assert_eq!(summary.unread_counts.get("alice"), Some(&2));
        assert_eq!(
            summary.last_message.and_then(|last| last.text).as_deref(),
            Some("see you")
        );
    }

    #[test]
    fn page_without_cursor_has_no_more_history() {
        let page: MessagePage = serde_json::from_str(r#"{ "items": [] }"#).unwrap();
        assert!(!page.has_more());
    }
}
