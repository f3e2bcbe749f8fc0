//! In-memory conversation cache with a message-id index.

use std::collections::HashMap;

use tracing::{debug, warn};

use crate::entities::{
    Conversation, ConversationSummary, DeliveryStatus, LastMessage, Message, MessagePage,
    UnreadCounts,
};
use crate::types::{ConversationId, MessageId};

/// Conversations keyed by id, plus a secondary index from message id to the
/// conversation the message was appended under.
#[derive(Debug, Default)]
pub struct ConversationStore {
    conversations: HashMap<ConversationId, Conversation>,
    message_index: HashMap<MessageId, ConversationId>,
}

impl ConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn conversation(&self, id: &str) -> Option<&Conversation> {
        self.conversations.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.conversations.contains_key(id)
    }

    /// Messages of a conversation, empty when it was never loaded
    pub fn messages(&self, id: &str) -> &[Message] {
        self.conversations
            .get(id)
            .map(|conversation| conversation.messages.as_slice())
            .unwrap_or_default()
    }

    /// Conversation ids in ascending order
    pub fn conversation_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.conversations.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    pub fn conversations(&self) -> impl Iterator<Item = &Conversation> {
        self.conversations.values()
    }

    pub fn len(&self) -> usize {
        self.conversations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.conversations.is_empty()
    }

    /// Conversation holding `message_id`, if any loaded conversation has it
    pub fn locate(&self, message_id: &str) -> Option<&str> {
        self.message_index.get(message_id).map(String::as_str)
    }

    fn entry(&mut self, id: &str) -> &mut Conversation {
        self.conversations
            .entry(id.to_string())
            .or_insert_with(|| Conversation::new(id))
    }

    /// Overwrite the summary fields of a conversation, creating it if needed.
    ///
    /// Last write wins: there is no ordering check against earlier updates.
    pub fn upsert_summary(
        &mut self,
        id: &str,
        last_message: Option<LastMessage>,
        unread_counts: UnreadCounts,
    ) -> &Conversation {
        let conversation = self.entry(id);
        conversation.last_message = last_message;
        conversation.unread_counts = unread_counts;
        conversation
    }

    /// Apply a REST conversation list
    pub fn apply_summaries(&mut self, summaries: impl IntoIterator<Item = ConversationSummary>) {
        for summary in summaries {
            self.upsert_summary(&summary.id, summary.last_message, summary.unread_counts);
        }
    }

    /// Append a message to the end of its conversation.
    ///
    /// The conversation is created on first reference. A message id that is
    /// already indexed is never appended again; returns `false` in that case.
    pub fn append_message(&mut self, message: Message) -> bool {
        if let Some(owner) = self.message_index.get(&message.id) {
            if *owner != message.conversation_id {
                warn!(
                    message_id = %message.id,
                    conversation_id = %message.conversation_id,
                    indexed_under = %owner,
                    "message id already belongs to another conversation"
                );
            } else {
                debug!(message_id = %message.id, "skipping duplicate message");
            }
            return false;
        }

        self.message_index
            .insert(message.id.clone(), message.conversation_id.clone());
        let conversation_id = message.conversation_id.clone();
        self.entry(&conversation_id).messages.push(message);
        true
    }

    /// Record a status change for one message of one conversation.
    ///
    /// Returns `false` when the conversation or message is unknown, or when
    /// the status would not advance.
    pub fn update_message_status(
        &mut self,
        conversation_id: &str,
        message_id: &str,
        user_id: &str,
        status: DeliveryStatus,
    ) -> bool {
        let Some(conversation) = self.conversations.get_mut(conversation_id) else {
            debug!(conversation_id, message_id, "status for unloaded conversation");
            return false;
        };

        match conversation.message_mut(message_id) {
            Some(message) => message.apply_status(user_id, status),
            None => {
                debug!(conversation_id, message_id, "status for unknown message");
                false
            }
        }
    }

    /// Merge a page of older history into a conversation.
    ///
    /// Page messages are placed by their position in the page relative to
    /// messages already stored, so a page overlapping live messages keeps the
    /// conversation chronological. Messages already present, or addressed to
    /// another conversation, are skipped. Returns the number of messages
    /// inserted.
    pub fn load_history(&mut self, conversation_id: &str, page: MessagePage) -> usize {
        let has_more = page.has_more();
        let conversation = self
            .conversations
            .entry(conversation_id.to_string())
            .or_insert_with(|| Conversation::new(conversation_id));

        let mut at = 0;
        let mut inserted = 0;
        for message in page.items {
            if message.conversation_id != conversation_id {
                warn!(
                    conversation_id,
                    message_id = %message.id,
                    owner = %message.conversation_id,
                    "history page contains a foreign message"
                );
                continue;
            }
            if self.message_index.contains_key(&message.id) {
                // Known messages anchor everything after them in the page.
                if let Some(position) = conversation
                    .messages
                    .iter()
                    .position(|stored| stored.id == message.id)
                {
                    at = at.max(position + 1);
                }
                continue;
            }

            self.message_index
                .insert(message.id.clone(), conversation_id.to_string());
            conversation.messages.insert(at, message);
            at += 1;
            inserted += 1;
        }

        conversation.next_cursor = page.next_cursor;
        conversation.has_more = has_more;
        inserted
    }
}
