//! Discogs catalog adapter
//!
//! Searches releases by a free-text "title artist" query and fetches each
//! release for its artists and label. Discogs matches albums, so the
//! candidate's title and album are both the release title.

use crate::error::Result;
use crate::http::{build_client, decode_hits, fetch_json, RateLimiter};
use crate::provider::{sort_by_confidence, CatalogProvider, MAX_CANDIDATES};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info, warn};
use track_primitives::{CatalogSource, TrackMetadata};

const API_BASE_URL: &str = "https://api.discogs.com";
/// Authenticated clients get 60 requests a minute
const RATE_LIMIT: Duration = Duration::from_secs(1);
const UNKNOWN_ARTIST: &str = "Unknown Artist";

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    id: u64,
}

#[derive(Debug, Deserialize)]
struct DgRelease {
    title: String,
    #[serde(default)]
    artists: Vec<DgArtist>,
    #[serde(default)]
    labels: Vec<DgLabel>,
}

#[derive(Debug, Deserialize)]
struct DgArtist {
    name: String,
}

#[derive(Debug, Deserialize)]
struct DgLabel {
    name: String,
    catno: Option<String>,
}

pub struct DiscogsProvider {
    http_client: reqwest::Client,
    rate_limiter: RateLimiter,
    token: String,
    base_url: String,
}

impl DiscogsProvider {
    pub fn new(token: impl Into<String>) -> Result<Self> {
        Ok(Self {
            http_client: build_client(CatalogSource::Discogs)?,
            rate_limiter: RateLimiter::new(RATE_LIMIT),
            token: token.into(),
            base_url: API_BASE_URL.to_string(),
        })
    }

    /// Point the adapter at another server
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    async fn get<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T> {
        self.rate_limiter.wait().await;

        let request = self
            .http_client
            .get(format!("{}/{}", self.base_url, path))
            .header("Authorization", format!("Discogs token={}", self.token))
            .query(query);

        fetch_json(CatalogSource::Discogs, request).await
    }
}

#[async_trait]
impl CatalogProvider for DiscogsProvider {
    fn source(&self) -> CatalogSource {
        CatalogSource::Discogs
    }

    async fn search(&self, title: &str, artist: &str) -> Result<Vec<TrackMetadata>> {
        let query = format!("{} {}", title, artist);
        let per_page = MAX_CANDIDATES.to_string();

        info!(query = %query, "Discogs search");

        let response: SearchResponse = self
            .get(
                "database/search",
                &[
                    ("q", query.as_str()),
                    ("type", "release"),
                    ("format", "album"),
                    ("per_page", per_page.as_str()),
                ],
            )
            .await?;

        let hits: Vec<SearchHit> = decode_hits(CatalogSource::Discogs, response.results);

        let mut results = Vec::new();
        let mut last_error = None;

        for hit in hits.iter().take(MAX_CANDIDATES) {
            let release: DgRelease = match self.get(&format!("releases/{}", hit.id), &[]).await {
                Ok(release) => release,
                Err(e) => {
                    warn!(release_id = hit.id, error = %e, "Skipping Discogs hit");
                    last_error = Some(e);
                    continue;
                }
            };
            let candidate = to_candidate(title, artist, &release);
            debug!(?candidate, "Discogs candidate");
            results.push(candidate);
        }

        if let (true, Some(e)) = (results.is_empty(), last_error) {
            return Err(e);
        }

        sort_by_confidence(&mut results);

        info!(count = results.len(), "Discogs results");
        Ok(results)
    }
}

fn to_candidate(query_title: &str, query_artist: &str, release: &DgRelease) -> TrackMetadata {
    let artist_name = release
        .artists
        .first()
        .map(|a| a.name.as_str())
        .unwrap_or(UNKNOWN_ARTIST);

    let label = release.labels.first();

    let confidence =
        similarity::confidence(query_title, query_artist, &release.title, artist_name);

    TrackMetadata::candidate(
        CatalogSource::Discogs,
        release.title.clone(),
        artist_name,
        release.title.clone(),
        confidence,
    )
    .with_label(label.map(|l| l.name.clone()))
    .with_catalog_number(label.and_then(|l| l.catno.clone()))
}
