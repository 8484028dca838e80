use serde::{Deserialize, Serialize};
use std::fmt;

/// Provenance of a metadata record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CatalogSource {
    MusicBrainz,
    Spotify,
    Discogs,

    /// Read from the file itself, never submitted to a catalog
    #[default]
    Local,
}

impl CatalogSource {
    /// Catalogs in the order they are consulted
    pub const PRIORITY: [CatalogSource; 3] = [
        CatalogSource::MusicBrainz,
        CatalogSource::Spotify,
        CatalogSource::Discogs,
    ];

    /// Position in the lookup order; lower is consulted first
    pub fn priority(&self) -> usize {
        match self {
            CatalogSource::MusicBrainz => 0,
            CatalogSource::Spotify => 1,
            CatalogSource::Discogs => 2,
            CatalogSource::Local => usize::MAX,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CatalogSource::MusicBrainz => "MusicBrainz",
            CatalogSource::Spotify => "Spotify",
            CatalogSource::Discogs => "Discogs",
            CatalogSource::Local => "",
        }
    }
}

impl fmt::Display for CatalogSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
