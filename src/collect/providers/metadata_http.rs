// src/collect/providers/metadata_http.rs
//! Review-metadata service over HTTP.
//!
//! `GET {endpoint}?title=<title>` returns
//! `{"results": [{"title": "...", "imdb_rating": 7.8, "metascore": 71, "metacritic_url": "..."}]}`.
//! The first result is taken as-is; titles are not disambiguated.

use reqwest::Client;
use serde::Deserialize;

use crate::collect::types::{FilmMetadata, MetadataLookup};
use crate::error::LookupError;

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    #[serde(default)]
    imdb_rating: Option<f64>,
    #[serde(default)]
    metascore: Option<f64>,
    #[serde(default)]
    metacritic_url: Option<String>,
}

impl From<SearchHit> for FilmMetadata {
    fn from(h: SearchHit) -> Self {
        FilmMetadata {
            imdb_rating: h.imdb_rating.into(),
            metascore: h.metascore.into(),
            metacritic_url: h.metacritic_url,
        }
    }
}

pub struct HttpMetadataLookup {
    endpoint: String,
    client: Client,
}

impl HttpMetadataLookup {
    pub fn new(endpoint: impl Into<String>, client: Client) -> Self {
        Self {
            endpoint: endpoint.into(),
            client,
        }
    }

    fn parse_body(body: &str) -> Result<FilmMetadata, LookupError> {
        let resp: SearchResponse = serde_json::from_str(body)
            .map_err(|e| LookupError::Unavailable(format!("unreadable search response: {e}")))?;
        Ok(resp
            .results
            .into_iter()
            .next()
            .map(FilmMetadata::from)
            .unwrap_or_default())
    }
}

#[async_trait::async_trait]
impl MetadataLookup for HttpMetadataLookup {
    async fn lookup(&self, title: &str) -> Result<FilmMetadata, LookupError> {
        let resp = self
            .client
            .get(&self.endpoint)
            .query(&[("title", title)])
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(LookupError::Unavailable(format!(
                "search returned HTTP {status}"
            )));
        }
        let body = resp.text().await?;
        Self::parse_body(&body)
    }

    fn name(&self) -> &'static str {
        "metadata-http"
    }
}
