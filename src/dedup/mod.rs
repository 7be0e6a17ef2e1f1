// src/dedup/mod.rs
//! At-most-once gate around the per-thread pipeline.
//!
//! Order per thread: claim → prepare reply → post → commit. A post failure
//! releases the claim so a later run retries. A crash between post and commit
//! leaves a claim on disk; [`DedupGate::reconcile`] settles those at startup
//! by asking the transport whether the reply is already there. A claim the
//! transport cannot vouch for is never reposted.

pub mod file;
pub mod store;

use metrics::{counter, describe_counter};
use once_cell::sync::OnceCell;
use std::future::Future;

use crate::error::RunError;
use crate::post::{ReplyPoster, ReplyStatus};
pub use file::JsonFileStore;
pub use store::{ClaimOutcome, ClaimToken, MemoryStore, ProcessedStore, StateDoc, ThreadMark};

fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("bot_replies_posted_total", "Replies posted and committed.");
        describe_counter!(
            "bot_post_failures_total",
            "Replies whose post failed; the thread stays unprocessed."
        );
        describe_counter!(
            "bot_threads_skipped_total",
            "Threads skipped by the gate (already processed or in flight)."
        );
        describe_counter!(
            "bot_claims_reconciled_total",
            "Stale claims settled at startup, by outcome."
        );
    });
}

#[derive(Debug)]
pub enum GateOutcome {
    Posted,
    AlreadyProcessed,
    InFlight,
    /// Nothing persisted; the thread is retried by a later run.
    PostFailed(anyhow::Error),
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReconcileReport {
    pub committed: usize,
    pub released: usize,
    /// Left claimed; their threads are skipped as in flight.
    pub unresolved: usize,
}

pub struct DedupGate<S: ProcessedStore> {
    store: S,
}

impl<S: ProcessedStore> DedupGate<S> {
    pub fn new(store: S) -> Self {
        ensure_metrics_described();
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Settle claims left by an interrupted run. Reply present → commit;
    /// absent → release so the thread is retried. When the transport cannot
    /// tell, the claim stays and the thread is skipped: a reply may already
    /// be out, and a second one is worse than none.
    pub async fn reconcile(&self, poster: &dyn ReplyPoster) -> Result<ReconcileReport, RunError> {
        let mut report = ReconcileReport::default();
        for (thread_id, token) in self.store.pending_claims().await? {
            let status = match poster.reply_status(&thread_id).await {
                Ok(s) => s,
                Err(e) => {
                    tracing::warn!(target: "dedup", thread_id = %thread_id, error = %format!("{e:#}"), "reply status lookup failed");
                    ReplyStatus::Unknown
                }
            };
            match status {
                ReplyStatus::Present => {
                    self.store.commit(&thread_id, &token).await?;
                    report.committed += 1;
                    counter!("bot_claims_reconciled_total", "outcome" => "committed").increment(1);
                    tracing::info!(target: "dedup", thread_id = %thread_id, "stale claim committed, reply already present");
                }
                ReplyStatus::Absent => {
                    self.store.release(&thread_id, &token).await?;
                    report.released += 1;
                    counter!("bot_claims_reconciled_total", "outcome" => "released").increment(1);
                    tracing::info!(target: "dedup", thread_id = %thread_id, "stale claim released, reply absent");
                }
                ReplyStatus::Unknown => {
                    report.unresolved += 1;
                    counter!("bot_claims_reconciled_total", "outcome" => "unresolved").increment(1);
                    tracing::warn!(
                        target: "dedup",
                        thread_id = %thread_id,
                        transport = poster.name(),
                        "cannot tell whether the reply went out; claim kept, thread skipped"
                    );
                }
            }
        }
        Ok(report)
    }

    /// Run `prepare` and post its reply at most once for `thread_id`.
    ///
    /// A fatal error from `prepare` releases the claim and propagates. A store
    /// failure after a successful post leaves the claim for reconciliation.
    pub async fn process<F, Fut>(
        &self,
        thread_id: &str,
        poster: &dyn ReplyPoster,
        prepare: F,
    ) -> Result<GateOutcome, RunError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<String, RunError>>,
    {
        let token = ClaimToken::mint(thread_id);
        match self.store.try_claim(thread_id, &token).await? {
            ClaimOutcome::Claimed => {}
            ClaimOutcome::AlreadyProcessed => {
                counter!("bot_threads_skipped_total", "reason" => "processed").increment(1);
                tracing::info!(target: "dedup", thread_id, "already posted in thread");
                return Ok(GateOutcome::AlreadyProcessed);
            }
            ClaimOutcome::InFlight => {
                counter!("bot_threads_skipped_total", "reason" => "in_flight").increment(1);
                tracing::warn!(target: "dedup", thread_id, "thread holds an open claim, skipped");
                return Ok(GateOutcome::InFlight);
            }
        }

        let body = match prepare().await {
            Ok(b) => b,
            Err(e) => {
                if let Err(re) = self.store.release(thread_id, &token).await {
                    tracing::warn!(target: "dedup", thread_id, error = %re, "release after failure");
                }
                return Err(e);
            }
        };

        if let Err(e) = poster.post_reply(thread_id, &body).await {
            counter!("bot_post_failures_total").increment(1);
            tracing::warn!(target: "dedup", thread_id, error = %format!("{e:#}"), "post failed, thread left for a later run");
            self.store.release(thread_id, &token).await?;
            return Ok(GateOutcome::PostFailed(e));
        }

        self.store.commit(thread_id, &token).await?;
        counter!("bot_replies_posted_total").increment(1);
        Ok(GateOutcome::Posted)
    }
}
