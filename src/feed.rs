// src/feed.rs
use anyhow::{Context, Result};
use std::path::PathBuf;

use crate::thread::DiscussionThread;

/// Candidate discovery: the threads of the current run window.
#[async_trait::async_trait]
pub trait ThreadFeed: Send + Sync {
    async fn candidates(&self) -> Result<Vec<DiscussionThread>>;
    fn name(&self) -> &'static str;
}

/// Reads a JSON array of threads exported by the listing job.
pub struct JsonFeed {
    path: PathBuf,
}

impl JsonFeed {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait::async_trait]
impl ThreadFeed for JsonFeed {
    async fn candidates(&self) -> Result<Vec<DiscussionThread>> {
        let s = tokio::fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("reading thread feed {}", self.path.display()))?;
        serde_json::from_str(&s).context("parsing thread feed json")
    }

    fn name(&self) -> &'static str {
        "json-file"
    }
}

/// Fixed list, for tests and replays.
#[derive(Debug, Clone, Default)]
pub struct StaticFeed(pub Vec<DiscussionThread>);

#[async_trait::async_trait]
impl ThreadFeed for StaticFeed {
    async fn candidates(&self) -> Result<Vec<DiscussionThread>> {
        Ok(self.0.clone())
    }

    fn name(&self) -> &'static str {
        "static"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn json_feed_reads_threads_and_defaults_body() {
        let tmp = tempfile::tempdir().unwrap();
        let p = tmp.path().join("threads.json");
        std::fs::write(
            &p,
            r#"[{"id":"9dq1","title":"Official Discussion: Mandy [SPOILERS]"},
               {"id":"9dq2","title":"t","body":"b"}]"#,
        )
        .unwrap();
        let threads = JsonFeed::new(&p).candidates().await.unwrap();
        assert_eq!(threads.len(), 2);
        assert_eq!(threads[0].body, "");
        assert_eq!(threads[1].body, "b");
    }

    #[tokio::test]
    async fn missing_feed_is_an_error() {
        let feed = JsonFeed::new("/definitely/not/here.json");
        assert!(feed.candidates().await.is_err());
    }
}
