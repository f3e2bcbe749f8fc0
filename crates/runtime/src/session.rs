//! Authenticated session lifecycle.
//!
//! A session is created at login with a fresh conversation store and
//! consumed at logout, so no cached state outlives the identity it was
//! fetched for.

use anyhow::{bail, Context, Result};
use chatsync_chats::{EventChannel, PresenceSynchronizer, SyncSnapshot, UserId};
use chatsync_config::AppConfig;
use tracing::{debug, info};

use crate::api::ConversationApi;

pub struct SyncSession<C> {
    synchronizer: PresenceSynchronizer<C>,
    page_size: u32,
}

impl<C: EventChannel> SyncSession<C> {
    /// Start a session for `identity`, connecting `channel`
    pub fn login(identity: impl Into<UserId>, channel: C, config: &AppConfig) -> Result<Self> {
        let identity = identity.into();
        if identity.is_empty() {
            bail!("cannot start a session without an identity");
        }

        let mut synchronizer = PresenceSynchronizer::new(channel, config.realtime.typing_ttl());
        synchronizer.attach(identity.as_str());
        info!(%identity, "session started");

        Ok(Self {
            synchronizer,
            page_size: config.api.page_size.max(1),
        })
    }

    /// Fetch the conversation list and the newest page of each conversation.
    ///
    /// Returns the number of conversations loaded.
    pub async fn load_baseline<A>(&mut self, api: &A) -> Result<usize>
    where
        A: ConversationApi + ?Sized,
    {
        let summaries = api
            .list_conversations()
            .await
            .context("failed to fetch conversation list")?;
        let ids: Vec<String> = summaries.iter().map(|summary| summary.id.clone()).collect();
        self.synchronizer.store_mut().apply_summaries(summaries);

        for conversation_id in &ids {
            let page = api
                .fetch_messages(conversation_id, None, self.page_size)
                .await
                .with_context(|| format!("failed to fetch history for {conversation_id}"))?;
            let inserted = self
                .synchronizer
                .store_mut()
                .load_history(conversation_id, page);
            debug!(%conversation_id, inserted, "history page loaded");
        }

        info!(conversations = ids.len(), "conversation baseline loaded");
        Ok(ids.len())
    }

    /// Fetch the next page of older history for one conversation.
    ///
    /// Returns the number of messages inserted, zero when there is nothing
    /// older to fetch.
    pub async fn load_older<A>(&mut self, api: &A, conversation_id: &str) -> Result<usize>
    where
        A: ConversationApi + ?Sized,
    {
        let cursor = match self.synchronizer.store().conversation(conversation_id) {
            Some(conversation) if conversation.has_more => conversation.next_cursor.clone(),
            _ => return Ok(0),
        };

        let page = api
            .fetch_messages(conversation_id, cursor.as_deref(), self.page_size)
            .await
            .with_context(|| format!("failed to fetch older history for {conversation_id}"))?;
        Ok(self
            .synchronizer
            .store_mut()
            .load_history(conversation_id, page))
    }

    pub fn synchronizer(&self) -> &PresenceSynchronizer<C> {
        &self.synchronizer
    }

    pub fn synchronizer_mut(&mut self) -> &mut PresenceSynchronizer<C> {
        &mut self.synchronizer
    }

    pub fn snapshot(&self) -> SyncSnapshot {
        self.synchronizer.snapshot()
    }

    /// End the session: disconnect, drop the cached state, and return the
    /// channel.
    pub fn logout(self) -> C {
        info!(identity = ?self.synchronizer.identity(), "session ended");
        self.synchronizer.into_channel()
    }
}
