// src/collect/mod.rs
pub mod providers;
pub mod types;

use metrics::{counter, describe_counter, describe_histogram, histogram};
use once_cell::sync::OnceCell;
use std::sync::Arc;

use crate::collect::types::{
    CriticTierKind, FilmMetadata, GradeLookup, MetadataLookup, ReviewPage, UserScorePage,
};
use crate::error::LookupError;
use crate::scores::{Reading, ScoreSheet, SourceId, TomatoCritics};
use crate::thread::strip_query;

/// One-time metrics registration (so series show up in the exposition).
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!(
            "bot_source_errors_total",
            "Per-source fetch/parse errors converted to unavailable."
        );
        describe_counter!(
            "bot_source_values_total",
            "Source figures found during collection."
        );
        describe_histogram!("bot_collect_ms", "Collection time per film in milliseconds.");
    });
}

/// Search key of the exit-poll panel: uppercase title with a leading "THE"
/// moved to the end, followed by the release year.
pub fn grade_panel_key(title: &str, year: i32) -> String {
    let upper = title.trim().to_uppercase();
    let words: Vec<&str> = upper.split_whitespace().collect();
    let name = match words.split_first() {
        Some((&"THE", rest)) if !rest.is_empty() => format!("{}, THE", rest.join(" ")),
        _ => words.join(" "),
    };
    format!("{name} ({year})")
}

/// What collection needs to know about one thread.
#[derive(Debug, Clone, Copy)]
pub struct CollectRequest<'a> {
    pub title: &'a str,
    /// Tomato meter link from the thread body; no link → no tomato data at all.
    pub tomato_url: Option<&'a str>,
    /// Year used for the exit-poll search key.
    pub year: i32,
}

/// Fans out to every configured source and builds a [`ScoreSheet`].
#[derive(Clone)]
pub struct Collector {
    pub metadata: Arc<dyn MetadataLookup>,
    pub tomatoes: Arc<dyn ReviewPage>,
    pub metacritic_users: Arc<dyn UserScorePage>,
    pub grades: Arc<dyn GradeLookup>,
}

impl Collector {
    /// Only a metadata-service failure escapes; every other source failure is
    /// logged and becomes `Unavailable`.
    pub async fn collect(&self, req: CollectRequest<'_>) -> Result<ScoreSheet, LookupError> {
        ensure_metrics_described();
        let t0 = std::time::Instant::now();

        let meta: FilmMetadata = self.metadata.lookup(req.title).await?;
        let mut sheet = ScoreSheet {
            imdb_users: meta.imdb_rating,
            ..Default::default()
        };

        let key = grade_panel_key(req.title, req.year);
        sheet.cinemascore = absorb(SourceId::CinemaScore, self.grades.grade(&key).await);

        if let Some(url) = meta.metacritic_url.as_deref() {
            let url = strip_query(url);
            sheet.metacritic = meta.metascore;
            sheet.metacritic_users = absorb(
                SourceId::MetacriticUsers,
                self.metacritic_users.user_score(url).await,
            );
        }

        if let Some(url) = req.tomato_url {
            self.collect_tomatoes(url, &mut sheet).await;
        }

        let found = sheet.records().iter().filter(|r| r.value.is_available()).count();
        counter!("bot_source_values_total").increment(found as u64);
        histogram!("bot_collect_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);
        tracing::debug!(target: "collect", title = req.title, found, "collection done");
        Ok(sheet)
    }

    // Top critics and audience are only asked for when the all-critics tier
    // exists: a page without it has nothing else either.
    async fn collect_tomatoes(&self, url: &str, sheet: &mut ScoreSheet) {
        let all = absorb(
            SourceId::RottenTomatoes,
            self.tomatoes.critic_tier(url, CriticTierKind::All).await,
        );
        let Reading::Available(all) = all else {
            return;
        };
        let top = absorb(
            SourceId::RottenTomatoes,
            self.tomatoes.critic_tier(url, CriticTierKind::Top).await,
        );
        sheet.rotten_tomatoes = Reading::Available(TomatoCritics { all, top });
        sheet.rotten_tomatoes_audience = absorb(
            SourceId::RottenTomatoesAudience,
            self.tomatoes.audience(url).await,
        );
    }
}

fn absorb<T>(source: SourceId, res: anyhow::Result<Reading<T>>) -> Reading<T> {
    match res {
        Ok(r) => r,
        Err(e) => {
            tracing::warn!(target: "collect", error = %format!("{e:#}"), source = source.name(), "source error");
            counter!("bot_source_errors_total", "source" => source.name()).increment(1);
            Reading::Unavailable
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grade_key_rotates_leading_the() {
        assert_eq!(grade_panel_key("The Nun", 2018), "NUN, THE (2018)");
        assert_eq!(grade_panel_key("Searching", 2018), "SEARCHING (2018)");
        assert_eq!(grade_panel_key("The", 2018), "THE (2018)");
        assert_eq!(grade_panel_key("  theory  of  everything ", 2014), "THEORY OF EVERYTHING (2014)");
    }
}
