use std::path::{Path, PathBuf};
use tag_merge::is_system_artifact;
use tracing::debug;
use walkdir::WalkDir;

/// All MP3 files below `root`, in file-name order within each directory
pub fn find_audio_files(root: impl AsRef<Path>) -> Vec<PathBuf> {
    WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                debug!(error = %e, "Skipping unreadable directory entry");
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| !is_system_artifact(path))
        .collect()
}
