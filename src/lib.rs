// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod collect;
pub mod config;
pub mod consensus;
pub mod dedup;
pub mod error;
pub mod feed;
pub mod http;
pub mod metrics;
pub mod pipeline;
pub mod post;
pub mod render;
pub mod scores;
pub mod thread;

// ---- Re-exports for stable public API ----
pub use crate::consensus::{classify, Verdict};
pub use crate::error::{LookupError, RunError, StoreError};
pub use crate::pipeline::{score_sheet, Bot, RunSummary};
pub use crate::scores::{Reading, ScoreSheet, SourceId};
