use crate::error::TagReadError;
use lofty::{Accessor, ItemKey, Probe, TaggedFileExt};
use std::path::Path;
use track_primitives::{non_empty, TrackMetadata};

const AUDIO_EXTENSION: &str = "mp3";
const SYSTEM_FOLDERS: &[&str] = &["__MACOSX"];

/// Read the fields reconciliation cares about from a file's own tags
///
/// The label lives in the composer slot and the catalog number in the
/// content-group slot. A file without any tag reads as an empty record.
/// Title and artist are trimmed for lookups; the album is kept verbatim
/// because cohorts group on the exact album string.
pub fn read_tags(path: impl AsRef<Path>) -> Result<TrackMetadata, TagReadError> {
    let path = path.as_ref();

    let lofty_error = |source| TagReadError::Lofty {
        path: path.to_path_buf(),
        source,
    };

    let tagged_file = Probe::open(path)
        .map_err(lofty_error)?
        .read()
        .map_err(lofty_error)?;

    // Try to get the primary tag, fall back to first available tag
    let Some(tag) = tagged_file
        .primary_tag()
        .or_else(|| tagged_file.first_tag())
    else {
        return Ok(TrackMetadata::local("", "", ""));
    };

    let metadata = TrackMetadata::local(
        tag.title().map(|s| s.trim().to_string()).unwrap_or_default(),
        tag.artist().map(|s| s.trim().to_string()).unwrap_or_default(),
        tag.album().map(|s| s.to_string()).unwrap_or_default(),
    )
    .with_label(trimmed(tag.get_string(&ItemKey::Composer)))
    .with_catalog_number(trimmed(tag.get_string(&ItemKey::ContentGroup)))
    .with_genre(tag.genre().map(|s| s.to_string()));

    Ok(metadata)
}

fn trimmed(value: Option<&str>) -> Option<String> {
    non_empty(value.map(|s| s.trim().to_string()))
}

/// Hidden files, resource forks and files outside the target format
pub fn is_system_artifact(path: &Path) -> bool {
    let hidden = path
        .file_name()
        .and_then(|name| name.to_str())
        .map_or(true, |name| name.starts_with('.'));

    let in_system_folder = path.components().any(|component| {
        component
            .as_os_str()
            .to_str()
            .is_some_and(|name| SYSTEM_FOLDERS.contains(&name))
    });

    let wrong_extension = !path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(AUDIO_EXTENSION));

    hidden || in_system_folder || wrong_extension
}

/// An MP3 file that is not a system artifact and whose tags can be opened
pub fn is_valid_audio_file(path: impl AsRef<Path>) -> bool {
    let path = path.as_ref();
    !is_system_artifact(path) && read_tags(path).is_ok()
}
