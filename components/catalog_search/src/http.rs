//! Shared HTTP plumbing for the catalog adapters

use crate::error::{Result, SearchError};
use serde::de::DeserializeOwned;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use track_primitives::CatalogSource;

pub(crate) const USER_AGENT: &str = concat!(
    "label-sync/",
    env!("CARGO_PKG_VERSION"),
    " (https://github.com/your-org/mdma)"
);

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

pub(crate) fn build_client(provider: CatalogSource) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(REQUEST_TIMEOUT)
        .build()
        .map_err(|e| SearchError::network(provider, e))
}

/// Send a request and decode a JSON body, mapping HTTP status to errors
pub(crate) async fn fetch_json<T: DeserializeOwned>(
    provider: CatalogSource,
    request: reqwest::RequestBuilder,
) -> Result<T> {
    let response = request
        .send()
        .await
        .map_err(|e| SearchError::network(provider, e))?;

    let status = response.status();

    if status.as_u16() == 429 || status.as_u16() == 503 {
        return Err(SearchError::RateLimited { provider });
    }

    if status.as_u16() == 401 || status.as_u16() == 403 {
        let message = response.text().await.unwrap_or_default();
        return Err(SearchError::Auth { provider, message });
    }

    if !status.is_success() {
        let message = response.text().await.unwrap_or_default();
        return Err(SearchError::Api {
            provider,
            status: status.as_u16(),
            message,
        });
    }

    response
        .json()
        .await
        .map_err(|e| SearchError::parse(provider, e))
}

/// Decode each raw hit on its own, dropping the ones that do not fit
pub(crate) fn decode_hits<T: DeserializeOwned>(
    provider: CatalogSource,
    hits: Vec<serde_json::Value>,
) -> Vec<T> {
    hits.into_iter()
        .filter_map(|hit| match serde_json::from_value(hit) {
            Ok(decoded) => Some(decoded),
            Err(e) => {
                tracing::debug!(provider = %provider, error = %e, "Skipping malformed hit");
                None
            }
        })
        .collect()
}

/// Enforces a minimum interval between requests
pub(crate) struct RateLimiter {
    last_request: Mutex<Option<Instant>>,
    min_interval: Duration,
}

impl RateLimiter {
    pub(crate) fn new(min_interval: Duration) -> Self {
        Self {
            last_request: Mutex::new(None),
            min_interval,
        }
    }

    /// Wait if necessary to comply with rate limit
    pub(crate) async fn wait(&self) {
        let mut last = self.last_request.lock().await;

        if let Some(last_time) = *last {
            let elapsed = last_time.elapsed();
            if elapsed < self.min_interval {
                let wait_time = self.min_interval - elapsed;
                tracing::debug!("Rate limiting: waiting {:?}", wait_time);
                tokio::time::sleep(wait_time).await;
            }
        }

        *last = Some(Instant::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_server::{Reply, TestServer};
    use assert_matches::assert_matches;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Deserialize)]
    struct Hit {
        name: String,
    }

    #[test]
    fn malformed_hits_are_dropped() {
        let hits = vec![json!({"name": "ok"}), json!({"other": 1}), json!({"name": "also"})];
        let decoded: Vec<Hit> = decode_hits(CatalogSource::Discogs, hits);
        let names: Vec<_> = decoded.iter().map(|h| h.name.as_str()).collect();
        assert_eq!(names, vec!["ok", "also"]);
    }

    #[tokio::test]
    async fn first_request_does_not_wait() {
        let limiter = RateLimiter::new(Duration::from_secs(60));
        let started = Instant::now();
        limiter.wait().await;
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    async fn fetch_hit(server: &TestServer, path: &str) -> Result<Hit> {
        let client = build_client(CatalogSource::MusicBrainz).unwrap();
        let request = client.get(format!("{}{}", server.base_url, path));
        fetch_json(CatalogSource::MusicBrainz, request).await
    }

    #[tokio::test]
    async fn http_status_maps_to_search_errors() {
        let server = TestServer::start(|_, path| match path {
            "/ok" => Reply::json(json!({"name": "fine"})),
            "/garbled" => Reply::raw("{ not json"),
            other => Reply::status(other.trim_start_matches('/').parse().unwrap_or(500)),
        })
        .await;

        assert_eq!(fetch_hit(&server, "/ok").await.unwrap().name, "fine");

        for path in ["/429", "/503"] {
            assert_matches!(fetch_hit(&server, path).await, Err(SearchError::RateLimited { .. }));
        }
        for path in ["/401", "/403"] {
            assert_matches!(fetch_hit(&server, path).await, Err(SearchError::Auth { .. }));
        }

        let not_found = fetch_hit(&server, "/404").await.unwrap_err();
        assert_matches!(not_found, SearchError::Api { status: 404, .. });
        assert!(!not_found.is_transient());

        let server_error = fetch_hit(&server, "/500").await.unwrap_err();
        assert_matches!(server_error, SearchError::Api { status: 500, .. });
        assert!(server_error.is_transient());

        assert_matches!(fetch_hit(&server, "/garbled").await, Err(SearchError::Parse { .. }));
    }
}
