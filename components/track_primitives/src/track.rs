use crate::CatalogSource;
use serde::{Deserialize, Serialize};

/// Minimum confidence a catalog result needs before it may touch any file
pub const ACCEPTANCE_THRESHOLD: f64 = 60.0;

/// Normalise an optional string so that blank text means "unknown"
pub fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

/// Metadata for one track, either read locally or returned by a catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackMetadata {
    pub title: String,
    pub artist: String,
    pub album: String,

    pub label: Option<String>,
    pub catalog_number: Option<String>,
    pub artist_sort: Option<String>,
    pub genre: Option<String>,

    /// 0-100, only meaningful for catalog results
    pub confidence: f64,
    pub source: CatalogSource,

    // Carried but not consulted by scoring or merging
    pub is_single: bool,
    pub year: Option<u32>,
}

impl TrackMetadata {
    /// A record read from a file's own tags
    pub fn local(
        title: impl Into<String>,
        artist: impl Into<String>,
        album: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            artist: artist.into(),
            album: album.into(),
            label: None,
            catalog_number: None,
            artist_sort: None,
            genre: None,
            confidence: 0.0,
            source: CatalogSource::Local,
            is_single: false,
            year: None,
        }
    }

    /// A candidate returned by a catalog
    pub fn candidate(
        source: CatalogSource,
        title: impl Into<String>,
        artist: impl Into<String>,
        album: impl Into<String>,
        confidence: f64,
    ) -> Self {
        Self {
            confidence: confidence.clamp(0.0, 100.0),
            source,
            ..Self::local(title, artist, album)
        }
    }

    pub fn with_label(mut self, label: Option<String>) -> Self {
        self.label = non_empty(label);
        self
    }

    pub fn with_catalog_number(mut self, catalog_number: Option<String>) -> Self {
        self.catalog_number = non_empty(catalog_number);
        self
    }

    pub fn with_artist_sort(mut self, artist_sort: Option<String>) -> Self {
        self.artist_sort = non_empty(artist_sort);
        self
    }

    pub fn with_genre(mut self, genre: Option<String>) -> Self {
        self.genre = non_empty(genre);
        self
    }

    /// A catalog result that is allowed to be merged into files
    pub fn is_acceptable(&self) -> bool {
        self.label.is_some() && self.confidence >= ACCEPTANCE_THRESHOLD
    }

    /// Both fields a catalog query needs are present
    pub fn is_searchable(&self) -> bool {
        !self.title.trim().is_empty() && !self.artist.trim().is_empty()
    }

    /// Get a display name for the track
    pub fn display_name(&self) -> String {
        match (self.artist.is_empty(), self.title.is_empty()) {
            (false, false) => format!("{} - {}", self.artist, self.title),
            (false, true) => self.artist.clone(),
            (true, false) => self.title.clone(),
            (true, true) => "Unknown".to_string(),
        }
    }
}
