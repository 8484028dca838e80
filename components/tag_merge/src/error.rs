use lofty::LoftyError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TagReadError {
    #[error("cannot read tags of {path}: {source}")]
    Lofty {
        path: PathBuf,
        #[source]
        source: LoftyError,
    },
}

#[derive(Debug, Error)]
pub enum MergeError {
    #[error("cannot open ID3 tag of {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: id3::Error,
    },

    #[error("cannot write ID3 tag of {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: id3::Error,
    },

    #[error("cannot preserve file times of {path}: {source}")]
    FileTimes {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

