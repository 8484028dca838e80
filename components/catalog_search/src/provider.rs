use crate::error::Result;
use async_trait::async_trait;
use track_primitives::{CatalogSource, TrackMetadata};

/// Most candidates any provider hands back for one query
pub const MAX_CANDIDATES: usize = 5;

/// A music catalog that can be searched by title and artist
#[async_trait]
pub trait CatalogProvider: Send + Sync {
    /// Which catalog this is; fixes its place in the lookup order
    fn source(&self) -> CatalogSource;

    /// Up to [`MAX_CANDIDATES`] candidates, each scored against the query
    async fn search(&self, title: &str, artist: &str) -> Result<Vec<TrackMetadata>>;
}

/// Order candidates best first, keeping at most [`MAX_CANDIDATES`]
pub(crate) fn sort_by_confidence(results: &mut Vec<TrackMetadata>) {
    results.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
    results.truncate(MAX_CANDIDATES);
}

/// Which catalogs take part in a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceSelection {
    pub musicbrainz: bool,
    pub spotify: bool,
    pub discogs: bool,
}

impl Default for ServiceSelection {
    fn default() -> Self {
        Self {
            musicbrainz: true,
            spotify: false,
            discogs: false,
        }
    }
}

impl ServiceSelection {
    pub fn is_enabled(&self, source: CatalogSource) -> bool {
        match source {
            CatalogSource::MusicBrainz => self.musicbrainz,
            CatalogSource::Spotify => self.spotify,
            CatalogSource::Discogs => self.discogs,
            CatalogSource::Local => false,
        }
    }

    pub fn any_enabled(&self) -> bool {
        self.musicbrainz || self.spotify || self.discogs
    }
}

#[cfg(test)]
pub mod stub {
    use super::*;
    use crate::error::SearchError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Provider returning canned candidates, optionally failing first
    pub struct ProviderStub {
        source: CatalogSource,
        candidates: Vec<TrackMetadata>,
        failures_left: AtomicUsize,
        calls: AtomicUsize,
    }

    impl ProviderStub {
        pub fn returning(source: CatalogSource, candidates: Vec<TrackMetadata>) -> Self {
            Self {
                source,
                candidates,
                failures_left: AtomicUsize::new(0),
                calls: AtomicUsize::new(0),
            }
        }

        pub fn failing(source: CatalogSource, failures: usize) -> Self {
            Self {
                failures_left: AtomicUsize::new(failures),
                ..Self::returning(source, Vec::new())
            }
        }

        pub fn then_returning(mut self, candidates: Vec<TrackMetadata>) -> Self {
            self.candidates = candidates;
            self
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl CatalogProvider for ProviderStub {
        fn source(&self) -> CatalogSource {
            self.source
        }

        async fn search(&self, _title: &str, _artist: &str) -> Result<Vec<TrackMetadata>> {
            self.calls.fetch_add(1, Ordering::SeqCst);

            let remaining = self.failures_left.load(Ordering::SeqCst);
            if remaining > 0 {
                self.failures_left.store(remaining - 1, Ordering::SeqCst);
                return Err(SearchError::network(self.source, "connection reset"));
            }

            Ok(self.candidates.clone())
        }
    }

    pub fn labelled(source: CatalogSource, confidence: f64, label: Option<&str>) -> TrackMetadata {
        TrackMetadata::candidate(source, "Track", "Artist", "Album", confidence)
            .with_label(label.map(str::to_string))
    }
}
