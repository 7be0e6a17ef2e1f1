// src/post/mod.rs
//! Reply transport. The gate only needs two things from it: post a reply,
//! and say whether a reply is already there (for crash reconciliation).

pub mod webhook;

use anyhow::Result;
use std::collections::HashSet;
use tokio::sync::Mutex;

/// Whether a thread already carries our reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyStatus {
    Present,
    Absent,
    /// The transport cannot tell.
    Unknown,
}

#[async_trait::async_trait]
pub trait ReplyPoster: Send + Sync {
    async fn post_reply(&self, thread_id: &str, body: &str) -> Result<()>;
    async fn reply_status(&self, thread_id: &str) -> Result<ReplyStatus>;
    fn name(&self) -> &'static str;
}

/// Dry-run transport: logs the reply and remembers the thread id.
#[derive(Debug, Default)]
pub struct LogPoster {
    posted: Mutex<HashSet<String>>,
}

impl LogPoster {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl ReplyPoster for LogPoster {
    async fn post_reply(&self, thread_id: &str, body: &str) -> Result<()> {
        tracing::info!(target: "post", thread_id, "dry-run reply:\n{body}");
        self.posted.lock().await.insert(thread_id.to_string());
        Ok(())
    }

    async fn reply_status(&self, thread_id: &str) -> Result<ReplyStatus> {
        Ok(if self.posted.lock().await.contains(thread_id) {
            ReplyStatus::Present
        } else {
            ReplyStatus::Absent
        })
    }

    fn name(&self) -> &'static str {
        "log"
    }
}
