// tests/metrics.rs
// One test per binary: the Prometheus recorder is process-global.
mod common;

use chrono::Utc;
use std::sync::Arc;

use common::{bot, catalog, collector_from, example_thread, thread, RecordingPoster};
use movie_score_bot::dedup::MemoryStore;
use movie_score_bot::metrics::Metrics;

#[tokio::test]
async fn run_exports_series_and_textfile() {
    let metrics = Metrics::init().expect("recorder installs once");

    let poster = Arc::new(RecordingPoster::default());
    let bot = bot(
        vec![
            example_thread("t1"),
            thread("x", "Box office weekend", ""),
        ],
        collector_from(catalog()),
        MemoryStore::new(),
        poster,
    );
    bot.run_once(Utc::now()).await.unwrap();

    let text = metrics.render();
    for needle in [
        "bot_threads_seen_total",
        "bot_threads_ineligible_total",
        "bot_replies_posted_total",
        "bot_verdicts_total",
        "bot_collect_ms",
        "bot_last_run_ts",
    ] {
        assert!(
            text.contains(needle),
            "metrics exposition missing '{needle}'\n{text}"
        );
    }

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out").join("bot.prom");
    metrics.write_textfile(&path).unwrap();
    let on_disk = std::fs::read_to_string(&path).unwrap();
    assert!(on_disk.contains("bot_replies_posted_total"));
}
