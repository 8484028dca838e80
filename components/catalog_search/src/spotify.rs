//! Spotify catalog adapter (client-credentials flow)

use crate::error::{Result, SearchError};
use crate::http::{build_client, decode_hits, fetch_json};
use crate::provider::{sort_by_confidence, CatalogProvider, MAX_CANDIDATES};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use track_primitives::{CatalogSource, TrackMetadata};

const API_BASE_URL: &str = "https://api.spotify.com/v1";
const TOKEN_URL: &str = "https://accounts.spotify.com/api/token";

/// Refresh this long before the token actually expires
const EXPIRY_MARGIN: Duration = Duration::from_secs(60);

#[derive(Debug, Clone)]
pub struct SpotifyCredentials {
    pub client_id: String,
    pub client_secret: String,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

struct CachedToken {
    value: String,
    expires_at: Instant,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    tracks: Option<TrackPage>,
}

#[derive(Debug, Deserialize)]
struct TrackPage {
    #[serde(default)]
    items: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct SpTrack {
    name: String,
    #[serde(default)]
    artists: Vec<SpArtist>,
    album: SpAlbumRef,
}

#[derive(Debug, Deserialize)]
struct SpArtist {
    name: String,
}

#[derive(Debug, Deserialize)]
struct SpAlbumRef {
    id: String,
    name: String,
}

#[derive(Debug, Deserialize)]
struct SpAlbum {
    label: Option<String>,
}

pub struct SpotifyProvider {
    http_client: reqwest::Client,
    credentials: SpotifyCredentials,
    token: Mutex<Option<CachedToken>>,
    api_base_url: String,
    token_url: String,
}

impl SpotifyProvider {
    pub fn new(credentials: SpotifyCredentials) -> Result<Self> {
        Ok(Self {
            http_client: build_client(CatalogSource::Spotify)?,
            credentials,
            token: Mutex::new(None),
            api_base_url: API_BASE_URL.to_string(),
            token_url: TOKEN_URL.to_string(),
        })
    }

    /// Send API and token requests elsewhere, e.g. through a proxy
    pub fn with_endpoints(
        mut self,
        api_base_url: impl Into<String>,
        token_url: impl Into<String>,
    ) -> Self {
        self.api_base_url = api_base_url.into().trim_end_matches('/').to_string();
        self.token_url = token_url.into();
        self
    }

    async fn access_token(&self) -> Result<String> {
        let mut cached = self.token.lock().await;

        if let Some(token) = cached.as_ref() {
            if Instant::now() < token.expires_at {
                return Ok(token.value.clone());
            }
        }

        debug!("Requesting Spotify access token");

        let request = self
            .http_client
            .post(self.token_url.as_str())
            .basic_auth(
                &self.credentials.client_id,
                Some(&self.credentials.client_secret),
            )
            .form(&[("grant_type", "client_credentials")]);

        let response: TokenResponse = fetch_json(CatalogSource::Spotify, request)
            .await
            .map_err(|e| match e {
                SearchError::Api { message, .. } => SearchError::Auth {
                    provider: CatalogSource::Spotify,
                    message,
                },
                other => other,
            })?;

        let lifetime = Duration::from_secs(response.expires_in).saturating_sub(EXPIRY_MARGIN);
        let value = response.access_token;

        *cached = Some(CachedToken {
            value: value.clone(),
            expires_at: Instant::now() + lifetime,
        });

        Ok(value)
    }

    async fn album_label(&self, token: &str, album_id: &str) -> Result<Option<String>> {
        let request = self
            .http_client
            .get(format!("{}/albums/{}", self.api_base_url, album_id))
            .bearer_auth(token);

        let album: SpAlbum = fetch_json(CatalogSource::Spotify, request).await?;
        Ok(album.label)
    }
}

#[async_trait]
impl CatalogProvider for SpotifyProvider {
    fn source(&self) -> CatalogSource {
        CatalogSource::Spotify
    }

    async fn search(&self, title: &str, artist: &str) -> Result<Vec<TrackMetadata>> {
        let token = self.access_token().await?;
        let query = track_query(title, artist);
        let limit = MAX_CANDIDATES.to_string();

        info!(query = %query, "Spotify search");

        let request = self
            .http_client
            .get(format!("{}/search", self.api_base_url))
            .bearer_auth(&token)
            .query(&[("q", query.as_str()), ("type", "track"), ("limit", limit.as_str())]);

        let response: SearchResponse = fetch_json(CatalogSource::Spotify, request).await?;
        let items = response.tracks.map(|page| page.items).unwrap_or_default();
        let tracks: Vec<SpTrack> = decode_hits(CatalogSource::Spotify, items);

        let mut results = Vec::new();
        let mut last_error = None;

        for track in tracks.iter().filter(|t| !t.artists.is_empty()) {
            let label = match self.album_label(&token, &track.album.id).await {
                Ok(label) => label,
                Err(e) => {
                    warn!(album_id = %track.album.id, error = %e, "Skipping Spotify track");
                    last_error = Some(e);
                    continue;
                }
            };
            debug!(album = %track.album.name, label = ?label, "Spotify album detail");
            results.push(to_candidate(title, artist, track, label));
        }

        if let (true, Some(e)) = (results.is_empty(), last_error) {
            return Err(e);
        }

        sort_by_confidence(&mut results);

        info!(count = results.len(), "Spotify results");
        Ok(results)
    }
}

fn track_query(title: &str, artist: &str) -> String {
    format!("track:\"{}\" artist:\"{}\"", title, artist)
}

fn to_candidate(
    query_title: &str,
    query_artist: &str,
    track: &SpTrack,
    label: Option<String>,
) -> TrackMetadata {
    let artist_name = track
        .artists
        .first()
        .map(|a| a.name.as_str())
        .unwrap_or_default();

    let confidence = similarity::confidence(query_title, query_artist, &track.name, artist_name);

    TrackMetadata::candidate(
        CatalogSource::Spotify,
        track.name.clone(),
        artist_name,
        track.album.name.clone(),
        confidence,
    )
    .with_label(label)
}
