//! Typing indicators with expiry.
//!
//! A participant counts as typing until they send a stop signal or the TTL
//! elapses without a refresh, whichever comes first. The TTL keeps an
//! indicator from sticking when the stop signal is lost.

use std::collections::HashMap;
use std::time::Duration;

use tokio::time::Instant;

use crate::types::{ConversationId, UserId};

/// Typing state per conversation, holding an expiry deadline per user
#[derive(Debug, Clone)]
pub struct TypingIndicators {
    ttl: Duration,
    active: HashMap<ConversationId, HashMap<UserId, Instant>>,
}

impl TypingIndicators {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            active: HashMap::new(),
        }
    }

    /// Start or stop a typing indicator. Returns whether an entry was added,
    /// refreshed or removed.
    pub fn set(&mut self, conversation_id: &str, user_id: &str, is_typing: bool, now: Instant) -> bool {
        if is_typing {
            self.active
                .entry(conversation_id.to_string())
                .or_default()
                .insert(user_id.to_string(), now + self.ttl);
            return true;
        }

        let Some(users) = self.active.get_mut(conversation_id) else {
            return false;
        };
        let removed = users.remove(user_id).is_some();
        if users.is_empty() {
            self.active.remove(conversation_id);
        }
        removed
    }

    pub fn is_typing(&self, conversation_id: &str, user_id: &str, now: Instant) -> bool {
        self.active
            .get(conversation_id)
            .and_then(|users| users.get(user_id))
            .is_some_and(|deadline| now < *deadline)
    }

    /// Users typing in a conversation, in ascending order
    pub fn typing_users(&self, conversation_id: &str, now: Instant) -> Vec<&str> {
        let mut users: Vec<&str> = self
            .active
            .get(conversation_id)
            .map(|users| {
                users
                    .iter()
                    .filter(|(_, deadline)| now < **deadline)
                    .map(|(user, _)| user.as_str())
                    .collect()
            })
            .unwrap_or_default();
        users.sort_unstable();
        users
    }

    /// Conversations with at least one live indicator
    pub fn conversations(&self, now: Instant) -> Vec<&str> {
        let mut ids: Vec<&str> = self
            .active
            .iter()
            .filter(|(_, users)| users.values().any(|deadline| now < *deadline))
            .map(|(id, _)| id.as_str())
            .collect();
        ids.sort_unstable();
        ids
    }

    /// Drop every indicator whose deadline has passed and return the removed
    /// (conversation, user) pairs.
    pub fn expire(&mut self, now: Instant) -> Vec<(ConversationId, UserId)> {
        let mut expired = Vec::new();

        self.active.retain(|conversation_id, users| {
            users.retain(|user_id, deadline| {
                let alive = now < *deadline;
                if !alive {
                    expired.push((conversation_id.clone(), user_id.clone()));
                }
                alive
            });
            !users.is_empty()
        });

        expired.sort();
        expired
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }
}
