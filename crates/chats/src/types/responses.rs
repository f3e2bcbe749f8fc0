//! Read-only views of the synchronized state.

use std::collections::BTreeMap;

use serde::Serialize;

use super::{ConversationId, UserId};
use crate::entities::Conversation;

/// Point-in-time copy of everything the synchronizer holds
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncSnapshot {
    pub identity: Option<UserId>,
    pub active_conversation: Option<ConversationId>,
    /// Conversations ordered by id
    pub conversations: Vec<Conversation>,
    pub online_users: Vec<UserId>,
    /// Users currently typing, per conversation
    pub typing: BTreeMap<ConversationId, Vec<UserId>>,
}

impl SyncSnapshot {
    pub fn conversation(&self, id: &str) -> Option<&Conversation> {
        self.conversations
            .iter()
            .find(|conversation| conversation.id == id)
    }
}
