//! Fixture MP3 files for tests
//!
//! Files are a run of silent MPEG-1 Layer III frames (128 kbit/s,
//! 44.1 kHz) behind an ID3v2.4 tag.

use id3::{Tag, TagLike, Version};
use std::path::Path;

const FRAME_HEADER: [u8; 4] = [0xFF, 0xFB, 0x90, 0x64];
const FRAME_LEN: usize = 417;
const FRAME_COUNT: usize = 20;

/// Tag values for a fixture file; empty strings are left out
#[derive(Debug, Clone, Default)]
pub struct Mp3Tags {
    pub title: String,
    pub artist: String,
    pub album: String,
    pub label: Option<String>,
    pub catalog: Option<String>,
    pub genre: Option<String>,
    pub album_artist: Option<String>,
    pub date_added: Option<String>,
    /// Extra user-defined text frames as (description, value)
    pub extended: Vec<(String, String)>,
}

impl Mp3Tags {
    pub fn new(
        title: impl Into<String>,
        artist: impl Into<String>,
        album: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            artist: artist.into(),
            album: album.into(),
            ..Default::default()
        }
    }

    pub fn label(mut self, label: &str) -> Self {
        self.label = Some(label.to_string());
        self
    }

    pub fn catalog(mut self, catalog: &str) -> Self {
        self.catalog = Some(catalog.to_string());
        self
    }

    pub fn genre(mut self, genre: &str) -> Self {
        self.genre = Some(genre.to_string());
        self
    }

    pub fn album_artist(mut self, album_artist: &str) -> Self {
        self.album_artist = Some(album_artist.to_string());
        self
    }

    pub fn date_added(mut self, date: &str) -> Self {
        self.date_added = Some(date.to_string());
        self
    }

    pub fn extended(mut self, description: &str, value: &str) -> Self {
        self.extended
            .push((description.to_string(), value.to_string()));
        self
    }
}

/// Silent MPEG audio without any tag
pub fn silent_audio() -> Vec<u8> {
    let mut frame = vec![0u8; FRAME_LEN];
    frame[..FRAME_HEADER.len()].copy_from_slice(&FRAME_HEADER);
    frame.repeat(FRAME_COUNT)
}

/// Write a playable MP3 file carrying the given tags
pub fn write_mp3(path: &Path, tags: &Mp3Tags) -> Result<(), id3::Error> {
    std::fs::write(path, silent_audio())?;

    let mut tag = Tag::new();
    let mut set = |id: &str, value: &str| {
        if !value.is_empty() {
            tag.set_text(id, value);
        }
    };

    set("TIT2", &tags.title);
    set("TPE1", &tags.artist);
    set("TALB", &tags.album);
    set("TCOM", tags.label.as_deref().unwrap_or_default());
    set("TIT1", tags.catalog.as_deref().unwrap_or_default());
    set("TCON", tags.genre.as_deref().unwrap_or_default());
    set("TPE2", tags.album_artist.as_deref().unwrap_or_default());
    set("TDTG", tags.date_added.as_deref().unwrap_or_default());

    for (description, value) in &tags.extended {
        tag.add_frame(id3::frame::ExtendedText {
            description: description.clone(),
            value: value.clone(),
        });
    }

    tag.write_to_path(path, Version::Id3v24)
}
