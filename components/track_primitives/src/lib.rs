//! Shared value types for tag reconciliation
//!
//! A [`TrackMetadata`] is either read from a local file
//! ([`CatalogSource::Local`], confidence 0) or produced by a catalog lookup,
//! in which case it carries the provider it came from and a 0-100 confidence.

mod source;
mod track;

pub use source::CatalogSource;
pub use track::{non_empty, TrackMetadata, ACCEPTANCE_THRESHOLD};
