// src/dedup/store.rs
//! Processed-thread state: the append-only set of posted thread ids plus the
//! claims of work in flight.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tokio::sync::Mutex;

use crate::error::StoreError;

/// Opaque token proving who holds a claim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClaimToken(pub String);

impl ClaimToken {
    /// Fresh token for `thread_id`: sha256 over the id, pid and current time.
    pub fn mint(thread_id: &str) -> Self {
        use sha2::{Digest, Sha256};
        let nanos = Utc::now().timestamp_nanos_opt().unwrap_or_default();
        let mut hasher = Sha256::new();
        hasher.update(thread_id.as_bytes());
        hasher.update(std::process::id().to_le_bytes());
        hasher.update(nanos.to_le_bytes());
        let digest = hasher.finalize();
        let mut out = String::with_capacity(16);
        for b in digest.iter().take(8) {
            use std::fmt::Write as _;
            let _ = write!(&mut out, "{:02x}", b);
        }
        ClaimToken(out)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "state")]
pub enum ThreadMark {
    /// Work in flight; becomes `Posted` or disappears.
    Claimed { token: ClaimToken, at: DateTime<Utc> },
    /// Reply confirmed. Never removed nor rewritten.
    Posted { at: DateTime<Utc> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClaimOutcome {
    Claimed,
    AlreadyProcessed,
    /// Someone else holds a live claim on the thread.
    InFlight,
}

/// Serialized form of the whole state. Map keys enforce one record per id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateDoc {
    #[serde(default)]
    pub threads: BTreeMap<String, ThreadMark>,
}

impl StateDoc {
    pub fn claim(&mut self, thread_id: &str, token: &ClaimToken) -> ClaimOutcome {
        match self.threads.get(thread_id) {
            Some(ThreadMark::Posted { .. }) => ClaimOutcome::AlreadyProcessed,
            Some(ThreadMark::Claimed { .. }) => ClaimOutcome::InFlight,
            None => {
                self.threads.insert(
                    thread_id.to_string(),
                    ThreadMark::Claimed {
                        token: token.clone(),
                        at: Utc::now(),
                    },
                );
                ClaimOutcome::Claimed
            }
        }
    }

    pub fn commit(&mut self, thread_id: &str, token: &ClaimToken) -> Result<(), StoreError> {
        match self.threads.get(thread_id) {
            Some(ThreadMark::Claimed { token: held, .. }) if held == token => {
                self.threads
                    .insert(thread_id.to_string(), ThreadMark::Posted { at: Utc::now() });
                Ok(())
            }
            _ => Err(StoreError::TokenMismatch(thread_id.to_string())),
        }
    }

    /// Drop a claim. Posted records are never touched.
    pub fn release(&mut self, thread_id: &str, token: &ClaimToken) -> Result<(), StoreError> {
        match self.threads.get(thread_id) {
            Some(ThreadMark::Claimed { token: held, .. }) if held == token => {
                self.threads.remove(thread_id);
                Ok(())
            }
            _ => Err(StoreError::TokenMismatch(thread_id.to_string())),
        }
    }

    pub fn claims(&self) -> Vec<(String, ClaimToken)> {
        self.threads
            .iter()
            .filter_map(|(id, m)| match m {
                ThreadMark::Claimed { token, .. } => Some((id.clone(), token.clone())),
                ThreadMark::Posted { .. } => None,
            })
            .collect()
    }

    pub fn is_posted(&self, thread_id: &str) -> bool {
        matches!(self.threads.get(thread_id), Some(ThreadMark::Posted { .. }))
    }

    pub fn posted_count(&self) -> usize {
        self.threads
            .values()
            .filter(|m| matches!(m, ThreadMark::Posted { .. }))
            .count()
    }
}

/// Check-and-claim must be serialized per thread id; implementations hold a
/// single writer lock around every mutation.
#[async_trait::async_trait]
pub trait ProcessedStore: Send + Sync {
    async fn try_claim(&self, thread_id: &str, token: &ClaimToken)
        -> Result<ClaimOutcome, StoreError>;
    async fn commit(&self, thread_id: &str, token: &ClaimToken) -> Result<(), StoreError>;
    async fn release(&self, thread_id: &str, token: &ClaimToken) -> Result<(), StoreError>;
    /// Claims left behind (by a crashed run, when called at startup).
    async fn pending_claims(&self) -> Result<Vec<(String, ClaimToken)>, StoreError>;
    async fn is_processed(&self, thread_id: &str) -> Result<bool, StoreError>;
    async fn processed_count(&self) -> Result<usize, StoreError>;
}

/// In-process store, for tests and dry runs.
#[derive(Debug, Default)]
pub struct MemoryStore {
    doc: Mutex<StateDoc>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_doc(doc: StateDoc) -> Self {
        Self {
            doc: Mutex::new(doc),
        }
    }

    pub async fn snapshot(&self) -> StateDoc {
        self.doc.lock().await.clone()
    }
}

#[async_trait::async_trait]
impl ProcessedStore for MemoryStore {
    async fn try_claim(
        &self,
        thread_id: &str,
        token: &ClaimToken,
    ) -> Result<ClaimOutcome, StoreError> {
        Ok(self.doc.lock().await.claim(thread_id, token))
    }

    async fn commit(&self, thread_id: &str, token: &ClaimToken) -> Result<(), StoreError> {
        self.doc.lock().await.commit(thread_id, token)
    }

    async fn release(&self, thread_id: &str, token: &ClaimToken) -> Result<(), StoreError> {
        self.doc.lock().await.release(thread_id, token)
    }

    async fn pending_claims(&self) -> Result<Vec<(String, ClaimToken)>, StoreError> {
        Ok(self.doc.lock().await.claims())
    }

    async fn is_processed(&self, thread_id: &str) -> Result<bool, StoreError> {
        Ok(self.doc.lock().await.is_posted(thread_id))
    }

    async fn processed_count(&self) -> Result<usize, StoreError> {
        Ok(self.doc.lock().await.posted_count())
    }
}
