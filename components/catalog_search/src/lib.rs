//! Catalog lookups for tag reconciliation
//!
//! Each catalog sits behind [`CatalogProvider`]; [`CatalogSearch`] runs the
//! enabled ones in priority order and keeps the best labelled candidate.

mod aggregator;
mod discogs;
mod error;
mod http;
mod musicbrainz;
mod provider;
mod spotify;
#[cfg(test)]
mod test_server;

pub use aggregator::{CatalogSearch, SearchOptions};
pub use discogs::DiscogsProvider;
pub use error::{Result, SearchError};
pub use musicbrainz::MusicBrainzProvider;
pub use provider::{CatalogProvider, ServiceSelection, MAX_CANDIDATES};
pub use spotify::{SpotifyCredentials, SpotifyProvider};
