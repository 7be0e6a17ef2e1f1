// src/post/webhook.rs
use super::{ReplyPoster, ReplyStatus};
use anyhow::{anyhow, Result};
use reqwest::Client;
use serde::Serialize;

/// Hands replies to an HTTP relay that owns the forum credentials.
/// One attempt per reply; a failed post is retried by a later run.
#[derive(Clone)]
pub struct WebhookPoster {
    url: String,
    client: Client,
}

#[derive(Serialize)]
struct ReplyPayload<'a> {
    thread_id: &'a str,
    body: &'a str,
}

impl WebhookPoster {
    pub fn new(url: String, client: Client) -> Self {
        Self { url, client }
    }
}

#[async_trait::async_trait]
impl ReplyPoster for WebhookPoster {
    async fn post_reply(&self, thread_id: &str, body: &str) -> Result<()> {
        let rsp = self
            .client
            .post(&self.url)
            .json(&ReplyPayload { thread_id, body })
            .send()
            .await
            .map_err(|e| anyhow!("reply webhook request failed: {e}"))?;
        rsp.error_for_status_ref()
            .map_err(|e| anyhow!("reply webhook HTTP error: {e}"))?;
        Ok(())
    }

    // A fire-and-forget relay keeps no record we can query.
    async fn reply_status(&self, _thread_id: &str) -> Result<ReplyStatus> {
        Ok(ReplyStatus::Unknown)
    }

    fn name(&self) -> &'static str {
        "webhook"
    }
}
