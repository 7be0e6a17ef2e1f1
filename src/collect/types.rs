// src/collect/types.rs
use anyhow::Result;

use crate::error::LookupError;
use crate::scores::{AudienceTier, CriticTier, Grade, Reading};

/// What the review-metadata service knows about a title.
#[derive(Debug, Clone, PartialEq, Default, serde::Serialize, serde::Deserialize)]
pub struct FilmMetadata {
    #[serde(default)]
    pub imdb_rating: Reading<f64>,
    #[serde(default)]
    pub metascore: Reading<f64>,
    /// Present whenever the service has any Metacritic data for the film.
    #[serde(default)]
    pub metacritic_url: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CriticTierKind {
    All,
    Top,
}

/// Title search against the review-metadata service. An `Err` means the
/// service itself is unusable and aborts the run; an unknown title is an
/// empty `FilmMetadata`.
#[async_trait::async_trait]
pub trait MetadataLookup: Send + Sync {
    async fn lookup(&self, title: &str) -> Result<FilmMetadata, LookupError>;
    fn name(&self) -> &'static str;
}

/// Tomato meter page of a film.
#[async_trait::async_trait]
pub trait ReviewPage: Send + Sync {
    async fn critic_tier(&self, url: &str, tier: CriticTierKind) -> Result<Reading<CriticTier>>;
    async fn audience(&self, url: &str) -> Result<Reading<AudienceTier>>;
}

/// Metacritic user-review page of a film.
#[async_trait::async_trait]
pub trait UserScorePage: Send + Sync {
    async fn user_score(&self, url: &str) -> Result<Reading<f64>>;
}

/// Exit-poll panel search. `key` is built by [`super::grade_panel_key`].
#[async_trait::async_trait]
pub trait GradeLookup: Send + Sync {
    async fn grade(&self, key: &str) -> Result<Reading<Grade>>;
}
