// src/collect/providers/catalog.rs
//! Snapshot-backed sources: every collaborator trait answered from one JSON
//! document. Used for dry runs, replays of captured data and tests.
//!
//! JSON shape:
//! {
//!   "films": {
//!     "Example Movie": {
//!       "imdb_rating": 7.8,
//!       "metascore": 71,
//!       "metacritic_url": "https://www.metacritic.com/movie/example-movie?ref=x",
//!       "metacritic_user_score": "7.4",
//!       "tomatoes_url": "https://example.com/m/example",
//!       "tomatoes_all": { "liked_pct": 88, "avg_rating": 7.2 },
//!       "tomatoes_top": { "liked_pct": 80, "avg_rating": 6.9 },
//!       "tomatoes_audience": { "liked_pct": 81, "avg_rating": 4.0 }
//!     }
//!   },
//!   "grades": { "EXAMPLE MOVIE (2018)": "A-" }
//! }

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

use crate::collect::types::{
    CriticTierKind, FilmMetadata, GradeLookup, MetadataLookup, ReviewPage, UserScorePage,
};
use crate::error::LookupError;
use crate::scores::{AudienceTier, CriticTier, Grade, Reading};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CatalogFilm {
    #[serde(default)]
    pub imdb_rating: Option<f64>,
    #[serde(default)]
    pub metascore: Option<f64>,
    #[serde(default)]
    pub metacritic_url: Option<String>,
    /// Kept as text: the user page shows "tbd" until enough votes exist.
    #[serde(default)]
    pub metacritic_user_score: Option<String>,
    #[serde(default)]
    pub tomatoes_url: Option<String>,
    #[serde(default)]
    pub tomatoes_all: Option<CriticTier>,
    #[serde(default)]
    pub tomatoes_top: Option<CriticTier>,
    #[serde(default)]
    pub tomatoes_audience: Option<AudienceTier>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    pub films: HashMap<String, CatalogFilm>,
    #[serde(default)]
    pub grades: HashMap<String, Grade>,
}

impl Catalog {
    pub fn from_json_str(s: &str) -> Result<Self> {
        serde_json::from_str(s).context("parsing score catalog json")
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading score catalog from {}", path.display()))?;
        Self::from_json_str(&content)
    }

    fn film_by_title(&self, title: &str) -> Option<&CatalogFilm> {
        self.films
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(title.trim()))
            .map(|(_, f)| f)
    }

    fn film_by_tomato_url(&self, url: &str) -> Result<&CatalogFilm> {
        self.films
            .values()
            .find(|f| f.tomatoes_url.as_deref() == Some(url))
            .ok_or_else(|| anyhow!("no tomato page captured for {url}"))
    }

    fn film_by_metacritic_url(&self, url: &str) -> Result<&CatalogFilm> {
        self.films
            .values()
            .find(|f| {
                f.metacritic_url
                    .as_deref()
                    .map(crate::thread::strip_query)
                    == Some(url)
            })
            .ok_or_else(|| anyhow!("no metacritic user page captured for {url}"))
    }
}

/// Parse the user-score text of a Metacritic page. "tbd" or empty → unavailable.
pub fn parse_user_score(text: &str) -> Result<Reading<f64>> {
    let t = text.trim();
    if t.is_empty() || t.eq_ignore_ascii_case("tbd") {
        return Ok(Reading::Unavailable);
    }
    let v: f64 = t
        .parse()
        .with_context(|| format!("metacritic user score {t:?} is not a number"))?;
    Ok(Reading::Available(v))
}

#[async_trait::async_trait]
impl MetadataLookup for Catalog {
    async fn lookup(&self, title: &str) -> Result<FilmMetadata, LookupError> {
        let Some(f) = self.film_by_title(title) else {
            return Ok(FilmMetadata::default());
        };
        Ok(FilmMetadata {
            imdb_rating: f.imdb_rating.into(),
            metascore: f.metascore.into(),
            metacritic_url: f.metacritic_url.clone(),
        })
    }

    fn name(&self) -> &'static str {
        "catalog"
    }
}

#[async_trait::async_trait]
impl ReviewPage for Catalog {
    async fn critic_tier(&self, url: &str, tier: CriticTierKind) -> Result<Reading<CriticTier>> {
        let f = self.film_by_tomato_url(url)?;
        Ok(match tier {
            CriticTierKind::All => f.tomatoes_all.into(),
            CriticTierKind::Top => f.tomatoes_top.into(),
        })
    }

    async fn audience(&self, url: &str) -> Result<Reading<AudienceTier>> {
        Ok(self.film_by_tomato_url(url)?.tomatoes_audience.into())
    }
}

#[async_trait::async_trait]
impl UserScorePage for Catalog {
    async fn user_score(&self, url: &str) -> Result<Reading<f64>> {
        let f = self.film_by_metacritic_url(url)?;
        match f.metacritic_user_score.as_deref() {
            Some(text) => parse_user_score(text),
            None => Ok(Reading::Unavailable),
        }
    }
}

#[async_trait::async_trait]
impl GradeLookup for Catalog {
    async fn grade(&self, key: &str) -> Result<Reading<Grade>> {
        Ok(self.grades.get(key).copied().into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SNAPSHOT: &str = r#"{
        "films": {
            "Example Movie": {
                "imdb_rating": 7.8,
                "metascore": 71,
                "metacritic_url": "https://www.metacritic.com/movie/example-movie?ref=x",
                "metacritic_user_score": "tbd",
                "tomatoes_url": "https://example.com/m/example",
                "tomatoes_all": { "liked_pct": 88, "avg_rating": 7.2 }
            }
        },
        "grades": { "EXAMPLE MOVIE (2018)": "A-" }
    }"#;

    #[tokio::test]
    async fn answers_every_role() {
        let c = Catalog::from_json_str(SNAPSHOT).unwrap();

        let meta = c.lookup("example movie").await.unwrap();
        assert_eq!(meta.imdb_rating, Reading::Available(7.8));
        assert_eq!(meta.metascore, Reading::Available(71.0));

        let url = "https://example.com/m/example";
        assert!(c.critic_tier(url, CriticTierKind::All).await.unwrap().is_available());
        assert_eq!(
            c.critic_tier(url, CriticTierKind::Top).await.unwrap(),
            Reading::Unavailable
        );
        assert!(c.critic_tier("https://other", CriticTierKind::All).await.is_err());

        let users = c
            .user_score("https://www.metacritic.com/movie/example-movie")
            .await
            .unwrap();
        assert_eq!(users, Reading::Unavailable);

        assert_eq!(
            c.grade("EXAMPLE MOVIE (2018)").await.unwrap(),
            Reading::Available(Grade::AMinus)
        );
    }

    #[tokio::test]
    async fn unknown_title_is_empty_metadata() {
        let c = Catalog::default();
        let meta = c.lookup("Nothing").await.unwrap();
        assert_eq!(meta, FilmMetadata::default());
    }

    #[test]
    fn user_score_text() {
        assert_eq!(parse_user_score("7.4").unwrap(), Reading::Available(7.4));
        assert_eq!(parse_user_score(" TBD ").unwrap(), Reading::Unavailable);
        assert!(parse_user_score("n/a").is_err());
    }
}
