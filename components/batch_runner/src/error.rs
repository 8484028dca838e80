use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RunError {
    #[error("library directory not found: {path}")]
    LibraryNotFound { path: PathBuf },

    #[error("cannot write ledger {path}: {source}")]
    Ledger {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("cannot export ledger to {path}: {source}")]
    Export {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot read first file of '{album}': {source}")]
    CohortRead {
        album: String,
        #[source]
        source: tag_merge::TagReadError,
    },

    #[error("lookup failed for '{album}': {source}")]
    Lookup {
        album: String,
        #[source]
        source: catalog_search::SearchError,
    },
}

pub type Result<T> = std::result::Result<T, RunError>;
