//! Best-result selection across catalogs
//!
//! Providers are consulted one after another in
//! [`track_primitives::CatalogSource::PRIORITY`]
//! order. Each provider's highest-confidence candidate competes for the
//! overall best, but only if it carries a label, and it only replaces an
//! earlier best when its confidence is strictly higher.

use crate::error::{Result, SearchError};
use crate::provider::{CatalogProvider, ServiceSelection};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};
use track_primitives::TrackMetadata;

#[derive(Debug, Clone)]
pub struct SearchOptions {
    /// Attempts made before a failing search is given up
    pub retries: u32,
    /// Pause between attempts
    pub retry_delay: Duration,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            retries: 3,
            retry_delay: Duration::from_secs(1),
        }
    }
}

pub struct CatalogSearch {
    providers: Vec<Arc<dyn CatalogProvider>>,
    services: ServiceSelection,
    options: SearchOptions,
}

impl CatalogSearch {
    pub fn new(providers: Vec<Arc<dyn CatalogProvider>>, services: ServiceSelection) -> Self {
        Self::with_options(providers, services, SearchOptions::default())
    }

    pub fn with_options(
        mut providers: Vec<Arc<dyn CatalogProvider>>,
        services: ServiceSelection,
        options: SearchOptions,
    ) -> Self {
        providers.sort_by_key(|p| p.source().priority());

        Self {
            providers,
            services,
            options,
        }
    }

    /// Search all enabled catalogs, retrying failed pipelines
    ///
    /// Returns zero or one record. An empty result without errors returns
    /// straight away; an error is retried and, once attempts run out,
    /// returned as [`SearchError::Exhausted`].
    pub async fn search_track(&self, title: &str, artist: &str) -> Result<Vec<TrackMetadata>> {
        info!(title = %title, artist = %artist, "Searching catalogs");

        let attempts = self.options.retries.max(1);
        let mut attempt = 0;

        loop {
            attempt += 1;

            match self.execute_search(title, artist).await {
                Ok(results) => return Ok(results),
                Err(e) => {
                    warn!(attempt, attempts, error = %e, "Search attempt failed");

                    if attempt >= attempts {
                        error!(title = %title, artist = %artist, "All search attempts failed");
                        return Err(SearchError::Exhausted {
                            attempts,
                            title: title.to_string(),
                            artist: artist.to_string(),
                            source: Box::new(e),
                        });
                    }

                    tokio::time::sleep(self.options.retry_delay).await;
                }
            }
        }
    }

    /// One pass over the enabled providers
    ///
    /// A failing provider does not stop the others. The pass fails only when
    /// no labelled candidate was found and at least one provider hit a
    /// transient error.
    pub async fn execute_search(&self, title: &str, artist: &str) -> Result<Vec<TrackMetadata>> {
        let mut best: Option<TrackMetadata> = None;
        let mut transient_failure: Option<SearchError> = None;

        for provider in &self.providers {
            let source = provider.source();
            if !self.services.is_enabled(source) {
                continue;
            }

            info!(provider = %source, "Searching provider");

            let results = match provider.search(title, artist).await {
                Ok(results) => results,
                Err(e) => {
                    warn!(provider = %source, error = %e, "Provider search failed");
                    if e.is_transient() {
                        transient_failure = Some(e);
                    }
                    continue;
                }
            };

            let Some(candidate) = best_candidate(results) else {
                continue;
            };

            if candidate.label.is_none() {
                info!(
                    provider = %source,
                    confidence = candidate.confidence,
                    "Best candidate has no label"
                );
                continue;
            }

            let replaces = best
                .as_ref()
                .map_or(true, |current| candidate.confidence > current.confidence);

            if replaces {
                info!(
                    provider = %source,
                    confidence = candidate.confidence,
                    "New best result"
                );
                best = Some(candidate);
            }
        }

        match (best, transient_failure) {
            (Some(best), _) => {
                info!(
                    provider = %best.source,
                    confidence = best.confidence,
                    "Final best result"
                );
                Ok(vec![best])
            }
            (None, Some(e)) => Err(e),
            (None, None) => {
                info!("No labelled result found");
                Ok(Vec::new())
            }
        }
    }
}

/// Highest-confidence candidate; the first one wins ties
fn best_candidate(results: Vec<TrackMetadata>) -> Option<TrackMetadata> {
    results.into_iter().fold(None, |best, candidate| match best {
        Some(b) if b.confidence >= candidate.confidence => Some(b),
        _ => Some(candidate),
    })
}
