//! Apply one reconciled record to a file's ID3 tag
//!
//! Only the label, catalog number, genre, album title and album artist
//! frames are ever changed. The file is rewritten only when one of them
//! changes, and its access and modification times are put back afterwards.

use crate::error::MergeError;
use crate::summary::{FieldChanges, RunSummary};
use genre_rules::GenreRules;
use id3::{ErrorKind, Tag, TagLike, Version};
use std::fs::{File, FileTimes};
use std::path::Path;
use tracing::{debug, info};
use track_primitives::TrackMetadata;

pub const TITLE_FRAME: &str = "TIT2";
pub const ARTIST_FRAME: &str = "TPE1";
pub const ALBUM_FRAME: &str = "TALB";
pub const LABEL_FRAME: &str = "TCOM";
pub const CATALOG_FRAME: &str = "TIT1";
pub const GENRE_FRAME: &str = "TCON";
pub const ALBUM_ARTIST_FRAME: &str = "TPE2";
pub const DATE_ADDED_FRAME: &str = "TDTG";

/// Which frames count as a genre when an old genre is cleared
#[derive(Debug, Clone)]
pub struct GenreFrameMatcher {
    pub frame_ids: Vec<String>,
    /// Case-insensitive substrings of user-defined text frame descriptions
    pub description_markers: Vec<String>,
}

impl Default for GenreFrameMatcher {
    fn default() -> Self {
        Self {
            frame_ids: vec![GENRE_FRAME.to_string()],
            description_markers: vec!["genre".to_string()],
        }
    }
}

impl GenreFrameMatcher {
    pub fn matches_description(&self, description: &str) -> bool {
        let description = description.to_lowercase();
        self.description_markers
            .iter()
            .any(|marker| description.contains(&marker.to_lowercase()))
    }

    /// Remove every genre representation from the tag, returning how many
    pub fn clear(&self, tag: &mut Tag) -> usize {
        let mut removed = 0;

        for id in &self.frame_ids {
            removed += tag.remove(id.as_str()).len();
        }

        let descriptions: Vec<String> = tag
            .extended_texts()
            .filter(|text| self.matches_description(&text.description))
            .map(|text| text.description.clone())
            .collect();

        for description in &descriptions {
            tag.remove_extended_text(Some(description.as_str()), None);
            removed += 1;
        }

        removed
    }
}

/// Frames re-asserted after the merge so a rewrite cannot lose them
struct Snapshot {
    title: String,
    artist: String,
    album: String,
    date_added: String,
}

impl Snapshot {
    fn take(tag: &Tag) -> Self {
        Self {
            title: frame_text(tag, TITLE_FRAME).unwrap_or_default(),
            artist: frame_text(tag, ARTIST_FRAME).unwrap_or_default(),
            album: frame_text(tag, ALBUM_FRAME).unwrap_or_default(),
            date_added: frame_text(tag, DATE_ADDED_FRAME).unwrap_or_default(),
        }
    }

    fn restore(&self, tag: &mut Tag) {
        for (id, value) in [
            (TITLE_FRAME, &self.title),
            (ARTIST_FRAME, &self.artist),
            (ALBUM_FRAME, &self.album),
            (DATE_ADDED_FRAME, &self.date_added),
        ] {
            if !value.is_empty() {
                tag.set_text(id, value.as_str());
            }
        }
    }
}

fn frame_text(tag: &Tag, id: &str) -> Option<String> {
    tag.get(id)
        .and_then(|frame| frame.content().text())
        .map(str::to_string)
}

/// Strip a trailing "- Single" or "(Single)" from an album title
pub fn clean_album_title(album: &str) -> String {
    let steps: [fn(&str) -> &str; 4] = [
        strip_dash_single,
        strip_paren_single,
        strip_dash_single,
        strip_paren_single,
    ];

    let mut cleaned = album;
    for strip in steps {
        cleaned = strip(cleaned);
    }
    cleaned.trim().to_string()
}

fn strip_suffix_ignore_case<'a>(text: &'a str, suffix: &str) -> Option<&'a str> {
    let text = text.trim_end();
    let split = text.len().checked_sub(suffix.len())?;
    if !text.is_char_boundary(split) {
        return None;
    }
    let (head, tail) = text.split_at(split);
    tail.eq_ignore_ascii_case(suffix).then_some(head)
}

fn strip_dash_single(text: &str) -> &str {
    strip_suffix_ignore_case(text, "single")
        .and_then(|head| head.trim_end().strip_suffix('-'))
        .map(str::trim_end)
        .unwrap_or(text)
}

fn strip_paren_single(text: &str) -> &str {
    strip_suffix_ignore_case(text, "(single)")
        .map(str::trim_end)
        .unwrap_or(text)
}

/// Writes reconciled records into files
pub struct TagMerger {
    rules: GenreRules,
    genre_frames: GenreFrameMatcher,
}

impl TagMerger {
    pub fn new(rules: GenreRules) -> Self {
        Self {
            rules,
            genre_frames: GenreFrameMatcher::default(),
        }
    }

    /// Genre the file should carry, if the rules have an opinion
    ///
    /// A label rule beats an artist rule. Without either, an existing genre
    /// is only ever canonicalised, and a file without a genre gets the
    /// generic detection result.
    pub fn resolve_genre(&self, metadata: &TrackMetadata, current: Option<&str>) -> Option<String> {
        if let Some(genre) = metadata
            .label
            .as_deref()
            .and_then(|label| self.rules.genre_for_label(label))
        {
            return Some(genre.to_string());
        }

        if let Some(genre) = self.rules.genre_for_artist(&metadata.artist) {
            return Some(genre.to_string());
        }

        match current {
            Some(existing) => self
                .rules
                .canonical_genre(existing)
                .filter(|canonical| *canonical != existing)
                .map(str::to_string),
            None => Some(self.rules.detect_genre(metadata)),
        }
    }

    /// Merge `metadata` into the file, returning whether it was rewritten
    ///
    /// Counters in `summary` move only once the file is safely persisted.
    pub fn update_metadata(
        &self,
        path: impl AsRef<Path>,
        metadata: &TrackMetadata,
        summary: &mut RunSummary,
    ) -> Result<bool, MergeError> {
        let path = path.as_ref();
        let mut tag = open_tag(path)?;
        let mut snapshot = Snapshot::take(&tag);
        let mut changes = FieldChanges::default();

        if let Some(label) = &metadata.label {
            let current = frame_text(&tag, LABEL_FRAME).unwrap_or_default();
            if current.to_lowercase() != label.to_lowercase() {
                info!(from = %current, to = %label, "Label updated");
                tag.set_text(LABEL_FRAME, label.as_str());
                changes.label = Some(label.clone());
            }
        }

        if let Some(catalog) = &metadata.catalog_number {
            let current = frame_text(&tag, CATALOG_FRAME).unwrap_or_default();
            if current.to_lowercase() != catalog.to_lowercase() {
                info!(from = %current, to = %catalog, "Catalog number updated");
                tag.set_text(CATALOG_FRAME, catalog.as_str());
                changes.catalog_number = Some(catalog.clone());
            }
        }

        let current_genre = frame_text(&tag, GENRE_FRAME).filter(|g| !g.trim().is_empty());
        if let Some(genre) = self.resolve_genre(metadata, current_genre.as_deref()) {
            if current_genre.as_deref() != Some(genre.as_str()) {
                let cleared = self.genre_frames.clear(&mut tag);
                debug!(cleared, "Cleared previous genre frames");
                info!(from = ?current_genre, to = %genre, "Genre updated");
                tag.set_text(GENRE_FRAME, genre.as_str());
                changes.genre = Some(genre);
            }
        }

        let album = clean_album_title(&snapshot.album);
        if album != snapshot.album {
            info!(from = %snapshot.album, to = %album, "Album title cleaned");
            tag.set_text(ALBUM_FRAME, album.as_str());
            snapshot.album = album.clone();
            changes.album = Some(album);
        }

        if !metadata.artist.is_empty() {
            let current = frame_text(&tag, ALBUM_ARTIST_FRAME).unwrap_or_default();
            if current != metadata.artist {
                info!(from = %current, to = %metadata.artist, "Album artist updated");
                tag.set_text(ALBUM_ARTIST_FRAME, metadata.artist.as_str());
                changes.album_artist = Some(metadata.artist.clone());
            }
        }

        snapshot.restore(&mut tag);

        if !changes.any() {
            debug!(path = %path.display(), "Tags already up to date");
            summary.record_unchanged();
            return Ok(false);
        }

        persist(path, &tag)?;
        summary.record_update(metadata.source, &changes);
        info!(path = %path.display(), "File saved");

        verify(path);

        Ok(true)
    }
}

fn open_tag(path: &Path) -> Result<Tag, MergeError> {
    match Tag::read_from_path(path) {
        Ok(tag) => Ok(tag),
        Err(e) if matches!(e.kind, ErrorKind::NoTag) => {
            debug!(path = %path.display(), "No ID3 tag, starting a new one");
            Ok(Tag::new())
        }
        Err(source) => Err(MergeError::Open {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Write the tag and put the file's original times back
fn persist(path: &Path, tag: &Tag) -> Result<(), MergeError> {
    let times_error = |source| MergeError::FileTimes {
        path: path.to_path_buf(),
        source,
    };

    let metadata = std::fs::metadata(path).map_err(times_error)?;
    let times = FileTimes::new()
        .set_accessed(metadata.accessed().map_err(times_error)?)
        .set_modified(metadata.modified().map_err(times_error)?);

    tag.write_to_path(path, Version::Id3v24)
        .map_err(|source| MergeError::Write {
            path: path.to_path_buf(),
            source,
        })?;

    File::options()
        .write(true)
        .open(path)
        .and_then(|file| file.set_times(times))
        .map_err(times_error)
}

fn verify(path: &Path) {
    match Tag::read_from_path(path) {
        Ok(tag) => debug!(
            path = %path.display(),
            label = ?frame_text(&tag, LABEL_FRAME),
            catalog = ?frame_text(&tag, CATALOG_FRAME),
            date_added = ?frame_text(&tag, DATE_ADDED_FRAME),
            "Verified after save"
        ),
        Err(e) => debug!(path = %path.display(), error = %e, "Could not re-read tag after save"),
    }
}
