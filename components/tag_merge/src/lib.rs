//! Reading, grouping and rewriting MP3 tags
//!
//! Reads go through `lofty`'s generic accessors; writes go through `id3`
//! at frame level so that frames the merge does not touch survive.

mod error;
mod grouping;
mod merge;
mod reader;
mod summary;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use error::{MergeError, TagReadError};
pub use grouping::{group_files_by_album, Cohort, Grouping, ALBUM_MIN_FILES};
pub use merge::{clean_album_title, GenreFrameMatcher, TagMerger};
pub use reader::{is_system_artifact, is_valid_audio_file, read_tags};
pub use summary::{FieldChanges, RunSummary};
