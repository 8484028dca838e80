//! Genre classification from label, artist and existing genre text
//!
//! Three rule tables map a lowercase key to a canonical genre:
//! - genre aliases (`"dnb"` → `"Drum & Bass"`)
//! - label substrings (`"hospital records"` → `"Drum & Bass"`)
//! - artist substrings (`"skrillex"` → `"Dubstep"`)
//!
//! Lookups are case-insensitive containment: a key matches when the
//! lowercased input contains it. When several keys match, the longest key
//! wins so `"progressive house"` beats `"house"`.

mod defaults;
mod table;

use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use track_primitives::TrackMetadata;
use tracing::{info, warn};

pub use table::RuleTable;

/// Genre written when nothing else matches
pub const FALLBACK_GENRE: &str = "Electronic";

#[derive(Error, Debug)]
pub enum GenreRulesError {
    #[error("failed to read genre mappings from {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed genre mappings in {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Override file layout; every section is optional
#[derive(Debug, Default, Deserialize)]
pub struct CustomMappings {
    #[serde(default)]
    pub genres: BTreeMap<String, String>,
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
    #[serde(default)]
    pub artists: BTreeMap<String, String>,
}

#[derive(Debug, Clone)]
pub struct GenreRules {
    genre_aliases: RuleTable,
    label_rules: RuleTable,
    artist_rules: RuleTable,
}

impl Default for GenreRules {
    fn default() -> Self {
        Self {
            genre_aliases: RuleTable::from_pairs(defaults::GENRE_ALIASES),
            label_rules: RuleTable::from_pairs(defaults::LABEL_RULES),
            artist_rules: RuleTable::from_pairs(defaults::ARTIST_RULES),
        }
    }
}

impl GenreRules {
    /// Built-in rules extended from an optional override file
    ///
    /// A missing or malformed file is reported and the built-in rules are
    /// used unchanged.
    pub fn with_custom_mappings(path: Option<&Path>) -> Self {
        let mut rules = Self::default();

        if let Some(path) = path {
            if let Err(e) = rules.load_custom_mappings(path) {
                warn!(error = %e, "Using built-in genre rules");
            }
        }

        rules
    }

    /// Merge a JSON override file on top of the current tables
    pub fn load_custom_mappings(&mut self, path: impl AsRef<Path>) -> Result<(), GenreRulesError> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path).map_err(|source| GenreRulesError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let mappings: CustomMappings =
            serde_json::from_str(&content).map_err(|source| GenreRulesError::Parse {
                path: path.to_path_buf(),
                source,
            })?;

        info!(
            path = %path.display(),
            genres = mappings.genres.len(),
            labels = mappings.labels.len(),
            artists = mappings.artists.len(),
            "Loaded custom genre mappings"
        );

        self.merge(mappings);
        Ok(())
    }

    pub fn merge(&mut self, mappings: CustomMappings) {
        self.genre_aliases.extend(mappings.genres);
        self.label_rules.extend(mappings.labels);
        self.artist_rules.extend(mappings.artists);
    }

    pub fn genre_for_label(&self, label: &str) -> Option<&str> {
        self.label_rules.lookup(label)
    }

    pub fn genre_for_artist(&self, artist: &str) -> Option<&str> {
        self.artist_rules.lookup(artist)
    }

    /// Canonical spelling for a known genre alias
    pub fn canonical_genre(&self, genre: &str) -> Option<&str> {
        self.genre_aliases.lookup(genre)
    }

    /// Best-effort genre for a record: label rule, artist rule, alias of the
    /// record's own genre, the record's own genre, then [`FALLBACK_GENRE`]
    pub fn detect_genre(&self, metadata: &TrackMetadata) -> String {
        if let Some(genre) = metadata
            .label
            .as_deref()
            .and_then(|label| self.genre_for_label(label))
        {
            return genre.to_string();
        }

        if !metadata.artist.is_empty() {
            if let Some(genre) = self.genre_for_artist(&metadata.artist) {
                return genre.to_string();
            }
        }

        if let Some(existing) = metadata.genre.as_deref() {
            return self
                .canonical_genre(existing)
                .unwrap_or(existing)
                .to_string();
        }

        FALLBACK_GENRE.to_string()
    }
}
