//! REST collaborator used to fetch the conversation baseline.

use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chatsync_chats::{ConversationSummary, MessagePage};
use chatsync_config::ApiConfig;
use reqwest::{Client, Url};
use tracing::debug;

/// Conversation list and history endpoints
#[async_trait]
pub trait ConversationApi: Send + Sync {
    async fn list_conversations(&self) -> Result<Vec<ConversationSummary>>;

    /// Fetch a page of history older than `cursor`, or the newest page
    async fn fetch_messages(
        &self,
        conversation_id: &str,
        cursor: Option<&str>,
        limit: u32,
    ) -> Result<MessagePage>;
}

/// [`ConversationApi`] over HTTP
#[derive(Clone)]
pub struct HttpConversationApi {
    client: Client,
    base_url: Url,
    token: Option<String>,
}

impl HttpConversationApi {
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let base_url = Url::parse(&config.base_url)
            .with_context(|| format!("invalid api base url {}", config.base_url))?;
        if base_url.cannot_be_a_base() {
            return Err(anyhow!("api base url cannot carry paths: {}", config.base_url));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .build()
            .context("failed to build http client")?;

        Ok(Self {
            client,
            base_url,
            token: config.token.clone(),
        })
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn get(&self, url: Url) -> reqwest::RequestBuilder {
        let request = self.client.get(url);
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }
}

#[async_trait]
impl ConversationApi for HttpConversationApi {
    async fn list_conversations(&self) -> Result<Vec<ConversationSummary>> {
        let url = self.endpoint(&["conversations"]);
        debug!(%url, "fetching conversation list");

        self.get(url)
            .send()
            .await
            .context("conversation list request failed")?
            .error_for_status()
            .context("conversation list request rejected")?
            .json()
            .await
            .context("invalid conversation list response")
    }

    async fn fetch_messages(
        &self,
        conversation_id: &str,
        cursor: Option<&str>,
        limit: u32,
    ) -> Result<MessagePage> {
        let url = self.endpoint(&["conversations", conversation_id, "messages"]);
        debug!(%url, cursor, limit, "fetching message page");

        let mut query = vec![("limit", limit.to_string())];
        if let Some(cursor) = cursor {
            query.push(("cursor", cursor.to_string()));
        }

        self.get(url)
            .query(&query)
            .send()
            .await
            .with_context(|| format!("message request for {conversation_id} failed"))?
            .error_for_status()
            .with_context(|| format!("message request for {conversation_id} rejected"))?
            .json()
            .await
            .with_context(|| format!("invalid message page for {conversation_id}"))
    }
}
