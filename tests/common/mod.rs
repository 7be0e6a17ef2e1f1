// tests/common/mod.rs
#![allow(dead_code)]

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use movie_score_bot::collect::providers::catalog::Catalog;
use movie_score_bot::collect::types::{FilmMetadata, MetadataLookup};
use movie_score_bot::collect::Collector;
use movie_score_bot::dedup::{DedupGate, ProcessedStore};
use movie_score_bot::error::LookupError;
use movie_score_bot::feed::StaticFeed;
use movie_score_bot::post::{ReplyPoster, ReplyStatus};
use movie_score_bot::thread::{DiscussionThread, OfficialDiscussion};
use movie_score_bot::Bot;

pub const CATALOG: &str = r#"{
    "films": {
        "Example Movie": {
            "imdb_rating": 7.8,
            "metascore": 71,
            "metacritic_url": "https://www.metacritic.com/movie/example-movie?ftag=abc",
            "metacritic_user_score": "7.4",
            "tomatoes_url": "https://example.com/m/example",
            "tomatoes_all": { "liked_pct": 88, "avg_rating": 7.2 },
            "tomatoes_top": { "liked_pct": 80, "avg_rating": 6.9 },
            "tomatoes_audience": { "liked_pct": 81, "avg_rating": 4.0 }
        },
        "Quiet Film": {
            "imdb_rating": 6.1
        }
    },
    "grades": { "EXAMPLE MOVIE (2018)": "A-" }
}"#;

pub fn catalog() -> Arc<Catalog> {
    Arc::new(Catalog::from_json_str(CATALOG).expect("catalog fixture"))
}

pub fn collector_from(catalog: Arc<Catalog>) -> Collector {
    Collector {
        metadata: catalog.clone(),
        tomatoes: catalog.clone(),
        metacritic_users: catalog.clone(),
        grades: catalog,
    }
}

pub fn thread(id: &str, title: &str, body: &str) -> DiscussionThread {
    DiscussionThread {
        id: id.to_string(),
        title: title.to_string(),
        body: body.to_string(),
    }
}

pub fn example_thread(id: &str) -> DiscussionThread {
    thread(
        id,
        "Official Discussion: Example Movie [SPOILERS]",
        "Poll link up top\n---\n**Rotten Tomatoes:** [88%](https://example.com/m/example)\n**Metacritic:** [71/100](https://www.metacritic.com/movie/example-movie)\n",
    )
}

/// Records every reply; can be switched to fail.
#[derive(Default)]
pub struct RecordingPoster {
    pub posts: Mutex<Vec<(String, String)>>,
    pub fail: AtomicBool,
    pub status: Mutex<Option<ReplyStatus>>,
}

impl RecordingPoster {
    pub fn failing() -> Self {
        let p = Self::default();
        p.fail.store(true, Ordering::SeqCst);
        p
    }

    pub fn count(&self) -> usize {
        self.posts.lock().unwrap().len()
    }

    pub fn bodies(&self) -> Vec<String> {
        self.posts
            .lock()
            .unwrap()
            .iter()
            .map(|(_, b)| b.clone())
            .collect()
    }
}

#[async_trait]
impl ReplyPoster for RecordingPoster {
    async fn post_reply(&self, thread_id: &str, body: &str) -> Result<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(anyhow!("transport down"));
        }
        self.posts
            .lock()
            .unwrap()
            .push((thread_id.to_string(), body.to_string()));
        Ok(())
    }

    async fn reply_status(&self, thread_id: &str) -> Result<ReplyStatus> {
        if let Some(s) = *self.status.lock().unwrap() {
            return Ok(s);
        }
        let posted = self.posts.lock().unwrap().iter().any(|(t, _)| t == thread_id);
        Ok(if posted {
            ReplyStatus::Present
        } else {
            ReplyStatus::Absent
        })
    }

    fn name(&self) -> &'static str {
        "recording"
    }
}

/// Metadata service that is down.
pub struct DownMetadata {
    pub calls: AtomicUsize,
}

#[async_trait]
impl MetadataLookup for DownMetadata {
    async fn lookup(&self, _title: &str) -> Result<FilmMetadata, LookupError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(LookupError::Unavailable("connection refused".into()))
    }

    fn name(&self) -> &'static str {
        "down"
    }
}

pub fn bot<S: ProcessedStore>(
    threads: Vec<DiscussionThread>,
    collector: Collector,
    store: S,
    poster: Arc<RecordingPoster>,
) -> Bot<S> {
    Bot {
        feed: Arc::new(StaticFeed(threads)),
        format: Arc::new(OfficialDiscussion),
        collector,
        gate: DedupGate::new(store),
        poster,
    }
}
