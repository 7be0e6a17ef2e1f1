//! movie-score-bot: one scoring run over the current candidate threads.
//!
//! Exit status is non-zero when the run aborts (store unavailable, metadata
//! service down, feed unreadable). Threads whose reply could not be posted
//! are simply retried by the next run.

use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use movie_score_bot::collect::providers::catalog::Catalog;
use movie_score_bot::collect::providers::metadata_http::HttpMetadataLookup;
use movie_score_bot::collect::types::MetadataLookup;
use movie_score_bot::collect::Collector;
use movie_score_bot::config::BotConfig;
use movie_score_bot::dedup::{DedupGate, JsonFileStore};
use movie_score_bot::feed::{JsonFeed, ThreadFeed};
use movie_score_bot::http::{build_client, TlsPolicy};
use movie_score_bot::metrics::Metrics;
use movie_score_bot::post::webhook::WebhookPoster;
use movie_score_bot::post::{LogPoster, ReplyPoster};
use movie_score_bot::thread::OfficialDiscussion;
use movie_score_bot::Bot;

/// Compact logs by default, JSON lines with BOT_LOG_JSON=1.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("movie_score_bot=info,warn"));
    let json = std::env::var("BOT_LOG_JSON").ok().is_some_and(|v| v == "1");

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer().compact()).init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();
    init_tracing();

    let cfg = BotConfig::load_default().context("loading bot config")?;
    let metrics = Metrics::init()?;

    // Persistence first: without it nothing may be posted.
    let store = JsonFileStore::open_with(&cfg.state_path, Duration::from_secs(cfg.stale_lock_secs))
        .await
        .context("opening processed-thread state")?;

    let client = build_client(&cfg.http, TlsPolicy::VerifiedOnly)?;

    let catalog = Arc::new(match &cfg.catalog_path {
        Some(p) => Catalog::load_from(p)?,
        None => {
            tracing::warn!("no catalog_path configured; page-based sources will be unavailable");
            Catalog::default()
        }
    });

    let metadata: Arc<dyn MetadataLookup> = match &cfg.metadata_endpoint {
        Some(url) => Arc::new(HttpMetadataLookup::new(url.clone(), client.clone())),
        None => catalog.clone(),
    };

    let poster: Arc<dyn ReplyPoster> = match &cfg.webhook_url {
        Some(url) => Arc::new(WebhookPoster::new(url.clone(), client.clone())),
        None => {
            tracing::warn!("no webhook_url configured; replies are only logged");
            Arc::new(LogPoster::new())
        }
    };

    let feed = Arc::new(JsonFeed::new(&cfg.feed_path));

    tracing::info!(
        feed = feed.name(),
        metadata = metadata.name(),
        poster = poster.name(),
        state = %store.path().display(),
        "bot starting"
    );

    let bot = Bot {
        feed,
        format: Arc::new(OfficialDiscussion),
        collector: Collector {
            metadata,
            tomatoes: catalog.clone(),
            metacritic_users: catalog.clone(),
            grades: catalog,
        },
        gate: DedupGate::new(store),
        poster,
    };

    let result = bot.run_once(chrono::Utc::now()).await;

    if let Some(path) = &cfg.metrics_textfile {
        if let Err(e) = metrics.write_textfile(path) {
            tracing::warn!("metrics textfile: {e:#}");
        }
    }

    let summary = result.context("run aborted")?;
    tracing::info!(?summary, "run finished");
    Ok(())
}
