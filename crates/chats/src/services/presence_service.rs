//! Online presence tracking.

use std::collections::HashSet;

use crate::types::UserId;

/// Users currently online. Every snapshot replaces the whole set.
#[derive(Debug, Clone, Default)]
pub struct PresenceSet {
    online: HashSet<UserId>,
}

impl PresenceSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the set with an authoritative snapshot
    pub fn replace(&mut self, user_ids: impl IntoIterator<Item = UserId>) {
        self.online = user_ids.into_iter().collect();
    }

    pub fn is_online(&self, user_id: &str) -> bool {
        self.online.contains(user_id)
    }

    /// Online users in ascending order
    pub fn online_users(&self) -> Vec<&str> {
        let mut users: Vec<&str> = self.online.iter().map(String::as_str).collect();
        users.sort_unstable();
        users
    }

    pub fn len(&self) -> usize {
        self.online.len()
    }

    pub fn is_empty(&self) -> bool {
        self.online.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replace_discards_previous_members() {
        let mut presence = PresenceSet::new();
        presence.replace(vec!["a".to_string(), "b".to_string()]);
        presence.replace(vec!["c".to_string()]);

        assert_eq!(presence.online_users(), vec!["c"]);
        assert!(!presence.is_online("a"));
    }

    #[test]
    fn duplicate_ids_collapse() {
        let mut presence = PresenceSet::new();
        presence.replace(vec!["a".to_string(), "a".to_string()]);
        assert_eq!(presence.len(), 1);
    }
}
