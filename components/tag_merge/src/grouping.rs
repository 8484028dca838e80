//! Partition a file set into album and EP cohorts
//!
//! One catalog lookup is made per cohort, so grouping decides how many
//! external requests a run costs.

use crate::error::TagReadError;
use crate::reader::{is_system_artifact, read_tags};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Cohorts with at least this many files are albums, smaller ones EPs
pub const ALBUM_MIN_FILES: usize = 7;

/// Files sharing one album tag, looked up once and merged together
#[derive(Debug, Clone, PartialEq)]
pub struct Cohort {
    pub album: String,
    pub is_ep: bool,
    pub files: Vec<PathBuf>,
}

impl Cohort {
    /// The file whose tags drive the cohort's lookup
    pub fn first_file(&self) -> Option<&Path> {
        self.files.first().map(PathBuf::as_path)
    }

    pub fn kind(&self) -> &'static str {
        if self.is_ep {
            "EP"
        } else {
            "album"
        }
    }
}

#[derive(Debug, Default)]
pub struct Grouping {
    /// In order of first appearance
    pub cohorts: Vec<Cohort>,
    /// Files whose tag container could not be opened
    pub unreadable: Vec<(PathBuf, TagReadError)>,
    /// Readable files without an album tag
    pub ungrouped: Vec<PathBuf>,
}

impl Grouping {
    pub fn albums(&self) -> usize {
        self.cohorts.iter().filter(|c| !c.is_ep).count()
    }

    pub fn eps(&self) -> usize {
        self.cohorts.iter().filter(|c| c.is_ep).count()
    }

    pub fn grouped_files(&self) -> usize {
        self.cohorts.iter().map(|c| c.files.len()).sum()
    }
}

/// Group files by exact album tag, classifying each cohort by its size
pub fn group_files_by_album(files: &[PathBuf]) -> Grouping {
    let mut grouping = Grouping::default();
    let mut index: HashMap<String, usize> = HashMap::new();

    for path in files {
        if is_system_artifact(path) {
            debug!(path = %path.display(), "Skipping system artifact");
            continue;
        }

        let metadata = match read_tags(path) {
            Ok(metadata) => metadata,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Unreadable file excluded from grouping");
                grouping.unreadable.push((path.clone(), e));
                continue;
            }
        };

        if metadata.album.is_empty() {
            debug!(path = %path.display(), "No album tag");
            grouping.ungrouped.push(path.clone());
            continue;
        }

        let slot = *index.entry(metadata.album.clone()).or_insert_with(|| {
            grouping.cohorts.push(Cohort {
                album: metadata.album.clone(),
                is_ep: true,
                files: Vec::new(),
            });
            grouping.cohorts.len() - 1
        });

        grouping.cohorts[slot].files.push(path.clone());
    }

    // Every valid file carrying the album is in its cohort, so the cohort
    // size is the final per-album count.
    for cohort in &mut grouping.cohorts {
        cohort.is_ep = cohort.files.len() < ALBUM_MIN_FILES;
    }

    grouping
}
