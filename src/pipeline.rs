//! # Run driver
//! One linear pass over the candidate threads: parse → gate → collect →
//! normalize → aggregate → classify → render → post → commit.
//!
//! Threads are handled strictly one after another. A metadata-service or
//! store failure aborts the run; the thread in progress is left unprocessed.

use chrono::{DateTime, Datelike, Utc};
use metrics::{counter, describe_counter, describe_gauge, gauge};
use once_cell::sync::OnceCell;
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::collect::{CollectRequest, Collector};
use crate::consensus::{classify, Verdict};
use crate::dedup::{DedupGate, GateOutcome, ProcessedStore};
use crate::error::RunError;
use crate::feed::ThreadFeed;
use crate::post::ReplyPoster;
use crate::render::{render_reply, ReplyInput};
use crate::scores::{aggregate, normalize, AggregateResult, NormalizedScore, ScoreSheet};
use crate::thread::{DiscussionThread, ThreadFormat, ROTTEN_TOMATOES_LABEL};

fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("bot_threads_seen_total", "Candidate threads read from the feed.");
        describe_counter!(
            "bot_threads_ineligible_total",
            "Candidates whose title is not an official discussion."
        );
        describe_counter!("bot_verdicts_total", "Consensus verdicts, by verdict.");
        describe_gauge!("bot_last_run_ts", "Unix ts when the last run finished.");
    });
}

/// Normalized view of one film plus its verdict.
#[derive(Debug, Clone, Serialize)]
pub struct FilmScores {
    #[serde(skip)]
    pub normalized: Vec<NormalizedScore>,
    pub aggregate: AggregateResult,
    pub verdict: Verdict,
}

/// Pure scoring of a collected sheet.
pub fn score_sheet(sheet: &ScoreSheet) -> FilmScores {
    let normalized: Vec<NormalizedScore> = sheet.records().iter().map(normalize).collect();
    let aggregate = aggregate(&normalized);
    let verdict = classify(aggregate.critic, aggregate.audience);
    FilmScores {
        normalized,
        aggregate,
        verdict,
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub seen: usize,
    pub ineligible: usize,
    pub posted: usize,
    pub already_processed: usize,
    pub in_flight: usize,
    pub post_failed: usize,
    pub reconciled_committed: usize,
    pub reconciled_released: usize,
    pub reconciled_unresolved: usize,
    #[serde(skip)]
    pub elapsed: Duration,
}

/// All collaborators of a run.
pub struct Bot<S: ProcessedStore> {
    pub feed: Arc<dyn ThreadFeed>,
    pub format: Arc<dyn ThreadFormat>,
    pub collector: Collector,
    pub gate: DedupGate<S>,
    pub poster: Arc<dyn ReplyPoster>,
}

impl<S: ProcessedStore> Bot<S> {
    /// Build the reply for one eligible thread.
    pub async fn prepare_reply(
        &self,
        title: &str,
        thread: &DiscussionThread,
        now: DateTime<Utc>,
    ) -> Result<String, RunError> {
        let tomato_url = self.format.source_url(&thread.body, ROTTEN_TOMATOES_LABEL);
        let sheet = self
            .collector
            .collect(CollectRequest {
                title,
                tomato_url: tomato_url.as_deref(),
                year: now.year(),
            })
            .await?;
        let scores = score_sheet(&sheet);
        counter!("bot_verdicts_total", "verdict" => scores.verdict.to_string()).increment(1);
        tracing::info!(
            target: "pipeline",
            thread_id = %thread.id,
            title,
            critic = ?scores.aggregate.critic,
            audience = ?scores.aggregate.audience,
            verdict = %scores.verdict,
            "film scored"
        );
        Ok(render_reply(&ReplyInput {
            title,
            sheet: &sheet,
            aggregate: &scores.aggregate,
            verdict: scores.verdict,
            as_of: now,
        }))
    }

    /// Reconcile leftovers, then process every candidate once.
    pub async fn run_once(&self, now: DateTime<Utc>) -> Result<RunSummary, RunError> {
        ensure_metrics_described();
        let started = Instant::now();
        let mut summary = RunSummary::default();

        let rec = self.gate.reconcile(self.poster.as_ref()).await?;
        summary.reconciled_committed = rec.committed;
        summary.reconciled_released = rec.released;
        summary.reconciled_unresolved = rec.unresolved;

        let threads = self.feed.candidates().await.map_err(RunError::Feed)?;
        counter!("bot_threads_seen_total").increment(threads.len() as u64);
        summary.seen = threads.len();

        for thread in &threads {
            let Some(title) = self.format.film_title(&thread.title) else {
                summary.ineligible += 1;
                counter!("bot_threads_ineligible_total").increment(1);
                tracing::debug!(target: "pipeline", thread_id = %thread.id, "not an official discussion");
                continue;
            };

            let outcome = self
                .gate
                .process(&thread.id, self.poster.as_ref(), || {
                    self.prepare_reply(&title, thread, now)
                })
                .await?;

            match outcome {
                GateOutcome::Posted => summary.posted += 1,
                GateOutcome::AlreadyProcessed => summary.already_processed += 1,
                GateOutcome::InFlight => summary.in_flight += 1,
                GateOutcome::PostFailed(_) => summary.post_failed += 1,
            }
        }

        summary.elapsed = started.elapsed();
        gauge!("bot_last_run_ts").set(Utc::now().timestamp().max(0) as f64);
        tracing::info!(
            target: "pipeline",
            posted = summary.posted,
            skipped = summary.already_processed + summary.in_flight,
            ineligible = summary.ineligible,
            post_failed = summary.post_failed,
            elapsed_ms = summary.elapsed.as_millis() as u64,
            "{} posts in {}",
            summary.posted,
            hms(summary.elapsed)
        );
        Ok(summary)
    }
}

fn hms(d: Duration) -> String {
    let s = d.as_secs();
    format!("{:02}:{:02}:{:02}", s / 3600, (s / 60) % 60, s % 60)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scores::{AudienceTier, CriticTier, Grade, Reading, TomatoCritics};

    #[test]
    fn sheet_to_verdict() {
        let sheet = ScoreSheet {
            metacritic: Reading::Available(75.0),
            rotten_tomatoes: Reading::Available(TomatoCritics {
                all: CriticTier {
                    liked_pct: 90,
                    avg_rating: 8.5,
                },
                top: Reading::Unavailable,
            }),
            metacritic_users: Reading::Unavailable,
            rotten_tomatoes_audience: Reading::Available(AudienceTier {
                liked_pct: 60,
                avg_rating: 3.0,
            }),
            imdb_users: Reading::Available(6.0),
            cinemascore: Reading::Available(Grade::C),
        };
        let s = score_sheet(&sheet);
        assert_eq!(s.aggregate.critic, Some(8.0));
        assert_eq!(s.aggregate.critic_count, 2);
        // (6.0 + 6.0 + 5.0) / 3 = 5.666.. → 5.7
        assert_eq!(s.aggregate.audience, Some(5.7));
        assert_eq!(s.aggregate.audience_count, 3);
        // cross-boundary, gap 2.3 > 2.0
        assert_eq!(s.verdict, Verdict::Disagree);
    }

    #[test]
    fn empty_sheet_is_unknown() {
        let s = score_sheet(&ScoreSheet::default());
        assert_eq!(s.aggregate, AggregateResult::default());
        assert_eq!(s.verdict, Verdict::Unknown);
    }

    #[test]
    fn hms_formats_elapsed() {
        assert_eq!(hms(Duration::from_secs(3_725)), "01:02:05");
    }
}
