// src/error.rs
//! Typed errors at the boundaries that decide whether a run goes on.
//!
//! Per-source failures never show up here: collection turns them into
//! `Reading::Unavailable`. What remains either aborts the run or is reported
//! per thread.

use thiserror::Error;

/// Review-metadata service failure. Fatal for the whole run.
#[derive(Debug, Error)]
pub enum LookupError {
    #[error("metadata service unavailable: {0}")]
    Unavailable(String),

    #[error("metadata request failed: {0}")]
    Request(#[from] reqwest::Error),
}

/// Processed-thread store failure.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("state file {path} is locked by another run")]
    Locked { path: String },

    #[error("state io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("state file is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),

    #[error("claim token mismatch for thread {0}")]
    TokenMismatch(String),
}

/// Anything that stops a run before its candidate list is exhausted.
#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Lookup(#[from] LookupError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("candidate feed failed: {0:#}")]
    Feed(anyhow::Error),
}
