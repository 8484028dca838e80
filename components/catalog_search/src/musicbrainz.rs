//! MusicBrainz catalog adapter
//!
//! Searches recordings by cleaned title and first credited artist, then
//! fetches the first release of each hit to find its label. At most one
//! request per second is sent, as MusicBrainz asks of anonymous clients.

use crate::error::Result;
use crate::http::{build_client, decode_hits, fetch_json, RateLimiter};
use crate::provider::{sort_by_confidence, CatalogProvider, MAX_CANDIDATES};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info, warn};
use track_primitives::{CatalogSource, TrackMetadata};

const MUSICBRAINZ_BASE_URL: &str = "https://musicbrainz.org/ws/2";
const RATE_LIMIT: Duration = Duration::from_secs(1);

#[derive(Debug, Deserialize)]
struct RecordingSearch {
    #[serde(default)]
    recordings: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct MbRecording {
    title: String,
    #[serde(rename = "artist-credit", default)]
    artist_credit: Vec<MbArtistCredit>,
    #[serde(default)]
    releases: Vec<MbReleaseRef>,
}

#[derive(Debug, Deserialize)]
struct MbArtistCredit {
    artist: MbArtist,
}

#[derive(Debug, Deserialize)]
struct MbArtist {
    name: String,
    #[serde(rename = "sort-name")]
    sort_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MbReleaseRef {
    id: String,
    #[serde(default)]
    title: String,
}

#[derive(Debug, Deserialize)]
struct ArtistSearch {
    #[serde(default)]
    artists: Vec<MbArtist>,
}

#[derive(Debug, Default, Deserialize)]
struct MbRelease {
    #[serde(rename = "label-info", default)]
    label_info: Vec<MbLabelInfo>,
}

#[derive(Debug, Deserialize)]
struct MbLabelInfo {
    #[serde(rename = "catalog-number")]
    catalog_number: Option<String>,
    label: Option<MbLabel>,
}

#[derive(Debug, Deserialize)]
struct MbLabel {
    name: String,
}

pub struct MusicBrainzProvider {
    http_client: reqwest::Client,
    rate_limiter: RateLimiter,
    base_url: String,
}

impl MusicBrainzProvider {
    pub fn new() -> Result<Self> {
        Ok(Self {
            http_client: build_client(CatalogSource::MusicBrainz)?,
            rate_limiter: RateLimiter::new(RATE_LIMIT),
            base_url: MUSICBRAINZ_BASE_URL.to_string(),
        })
    }

    /// Point the adapter at another server, e.g. a local mirror
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

        let url = format!("{}/{}", self.base_url, path);
        debug!(url = %url, "Querying MusicBrainz API");

        let request = self
            .http_client
            .get(&url)
            .query(query)
            .query(&[("fmt", "json")]);

        fetch_json(CatalogSource::MusicBrainz, request).await
    }

    async fn search_recordings(&self, title: &str, artist: &str) -> Result<Vec<MbRecording>> {
        let query = recording_query(title, artist);
        let limit = MAX_CANDIDATES.to_string();

        let search: RecordingSearch = self
            .get("recording", &[("query", query.as_str()), ("limit", limit.as_str())])
            .await?;

        Ok(decode_hits(CatalogSource::MusicBrainz, search.recordings))
    }

    /// Sort name of the best artist match; lookup failures only cost the sort name
    async fn artist_sort_name(&self, artist: &str) -> Option<String> {
        let query = format!("artist:\"{}\"", escape_term(artist));
        let result: Result<ArtistSearch> = self
            .get("artist", &[("query", query.as_str()), ("limit", "1")])
            .await;

        match result {
            Ok(search) => {
                let sort_name = search
                    .artists
                    .into_iter()
                    .next()
                    .map(|a| a.sort_name.unwrap_or_else(|| artist.to_string()));
                if let Some(name) = &sort_name {
                    info!(sort_name = %name, "MusicBrainz sort name found");
                }
                sort_name
            }
            Err(e) => {
                warn!(artist = %artist, error = %e, "MusicBrainz artist lookup failed");
                None
            }
        }
    }

    async fn release(&self, release_id: &str) -> Result<MbRelease> {
        debug!(release_id = %release_id, "Fetching MusicBrainz release");
        self.get(&format!("release/{}", release_id), &[("inc", "labels")])
            .await
    }
}

#[async_trait]
impl CatalogProvider for MusicBrainzProvider {
    fn source(&self) -> CatalogSource {
        CatalogSource::MusicBrainz
    }

    async fn search(&self, title: &str, artist: &str) -> Result<Vec<TrackMetadata>> {
        let clean_title = search_title(title);
        let clean_artist = search_artist(artist);

        info!(title = %clean_title, artist = %clean_artist, "MusicBrainz search");

        let recordings = self.search_recordings(clean_title, clean_artist).await?;
        let artist_sort = self.artist_sort_name(clean_artist).await;

        let mut results = Vec::new();
        let mut last_error = None;

        for recording in recordings {
            let Some(release_ref) = recording.releases.first() else {
                continue;
            };
            if recording.artist_credit.is_empty() {
                continue;
            }

            let release = match self.release(&release_ref.id).await {
                Ok(release) => release,
                Err(e) => {
                    warn!(release_id = %release_ref.id, error = %e, "Skipping MusicBrainz hit");
                    last_error = Some(e);
                    continue;
                }
            };
            let candidate = to_candidate(title, artist, &recording, &release, artist_sort.clone());
            debug!(?candidate, "MusicBrainz candidate");
            results.push(candidate);
        }

        // Only a search that lost every hit to a failed lookup counts as failed
        if let (true, Some(e)) = (results.is_empty(), last_error) {
            return Err(e);
        }

        sort_by_confidence(&mut results);

        info!(count = results.len(), "MusicBrainz results");
        Ok(results)
    }
}

/// Title as sent to MusicBrainz: everything before the first parenthesis
fn search_title(title: &str) -> &str {
    title.split('(').next().unwrap_or(title).trim()
}

/// Artist as sent to MusicBrainz: the first of an `&`-joined credit
fn search_artist(artist: &str) -> &str {
    artist.split('&').next().unwrap_or(artist).trim()
}

fn escape_term(term: &str) -> String {
    term.replace('"', "\\\"")
}

fn recording_query(title: &str, artist: &str) -> String {
    format!(
        "recording:\"{}\" AND artist:\"{}\"",
        escape_term(title),
        escape_term(artist)
    )
}

/// Build a candidate scored against the caller's unmodified query
fn to_candidate(
    query_title: &str,
    query_artist: &str,
    recording: &MbRecording,
    release: &MbRelease,
    artist_sort: Option<String>,
) -> TrackMetadata {
    let artist_name = recording
        .artist_credit
        .first()
        .map(|credit| credit.artist.name.as_str())
        .unwrap_or_default();

    let album = recording
        .releases
        .first()
        .map(|r| r.title.as_str())
        .unwrap_or_default();

    let (label, catalog_number) = match release.label_info.first() {
        Some(info) => (
            info.label.as_ref().map(|l| l.name.clone()),
            info.catalog_number.clone(),
        ),
        None => (None, None),
    };

    let confidence =
        similarity::confidence(query_title, query_artist, &recording.title, artist_name);

    TrackMetadata::candidate(
        CatalogSource::MusicBrainz,
        recording.title.clone(),
        artist_name,
        album,
        confidence,
    )
    .with_label(label)
    .with_catalog_number(catalog_number)
    .with_artist_sort(artist_sort)
}
