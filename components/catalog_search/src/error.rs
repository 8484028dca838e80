use thiserror::Error;
use track_primitives::CatalogSource;

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("{provider} network error: {message}")]
    Network {
        provider: CatalogSource,
        message: String,
    },

    #[error("{provider} rate limit exceeded")]
    RateLimited { provider: CatalogSource },

    #[error("{provider} API error {status}: {message}")]
    Api {
        provider: CatalogSource,
        status: u16,
        message: String,
    },

    #[error("{provider} returned an unreadable response: {message}")]
    Parse {
        provider: CatalogSource,
        message: String,
    },

    #[error("{provider} authentication failed: {message}")]
    Auth {
        provider: CatalogSource,
        message: String,
    },

    #[error("all {attempts} search attempts failed for '{title}' by '{artist}'")]
    Exhausted {
        attempts: u32,
        title: String,
        artist: String,
        #[source]
        source: Box<SearchError>,
    },
}

impl SearchError {
    /// Failures worth retrying at the aggregator boundary
    pub fn is_transient(&self) -> bool {
        match self {
            SearchError::Network { .. }
            | SearchError::RateLimited { .. }
            | SearchError::Parse { .. } => true,
            SearchError::Api { status, .. } => *status >= 500,
            SearchError::Auth { .. } | SearchError::Exhausted { .. } => false,
        }
    }

    pub fn network(provider: CatalogSource, error: impl std::fmt::Display) -> Self {
        SearchError::Network {
            provider,
            message: error.to_string(),
        }
    }

    pub fn parse(provider: CatalogSource, error: impl std::fmt::Display) -> Self {
        SearchError::Parse {
            provider,
            message: error.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, SearchError>;
