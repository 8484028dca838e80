//! CSV ledgers of files that were not updated
//!
//! A ledger keeps every record of the run in memory and rewrites its whole
//! file after each append, so the file on disk is always complete.

use crate::error::{Result, RunError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const ERROR_LEDGER_FILE: &str = "error_log.csv";
pub const NOT_FOUND_LEDGER_FILE: &str = "not_found_log.csv";

pub const REASON_NO_RESULT: &str = "no result";
pub const REASON_NO_LABEL: &str = "no label";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorRecord {
    pub file: String,
    pub title: String,
    pub artist: String,
    pub album: String,
    pub error: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotFoundRecord {
    pub file: String,
    pub title: String,
    pub artist: String,
    pub album: String,
    pub reason: String,
}

#[derive(Debug)]
pub struct Ledger<R> {
    path: PathBuf,
    records: Vec<R>,
}

impl<R: Serialize> Ledger<R> {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            records: Vec::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn records(&self) -> &[R] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Add a record and rewrite the ledger file
    ///
    /// The record is kept even if the file cannot be written.
    pub fn append(&mut self, record: R) -> Result<()> {
        self.records.push(record);
        self.write()
    }

    fn write(&self) -> Result<()> {
        let ledger_error = |source| RunError::Ledger {
            path: self.path.clone(),
            source,
        };

        let mut writer = csv::Writer::from_path(&self.path).map_err(ledger_error)?;
        for record in &self.records {
            writer.serialize(record).map_err(ledger_error)?;
        }
        writer
            .flush()
            .map_err(|e| ledger_error(csv::Error::from(e)))
    }

    /// Copy a non-empty ledger to `<dir>/<prefix>_<stamp>.csv`
    pub fn export(&self, dir: &Path, prefix: &str, stamp: &str) -> Result<Option<PathBuf>> {
        if self.records.is_empty() {
            return Ok(None);
        }

        let target = dir.join(format!("{}_{}.csv", prefix, stamp));
        std::fs::copy(&self.path, &target).map_err(|source| RunError::Export {
            path: target.clone(),
            source,
        })?;

        Ok(Some(target))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn not_found(file: &str) -> NotFoundRecord {
        NotFoundRecord {
            file: file.to_string(),
            title: "Song".to_string(),
            artist: "Artist".to_string(),
            album: "Album, Vol. 1".to_string(),
            reason: REASON_NO_LABEL.to_string(),
        }
    }

    #[test]
    fn every_append_rewrites_the_whole_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut ledger = Ledger::new(dir.path().join(NOT_FOUND_LEDGER_FILE));

        ledger.append(not_found("a.mp3")).unwrap();
        ledger.append(not_found("b.mp3")).unwrap();

        let mut reader = csv::Reader::from_path(ledger.path()).unwrap();
        let headers = reader.headers().unwrap().clone();
        assert_eq!(
            headers.iter().collect::<Vec<_>>(),
            vec!["file", "title", "artist", "album", "reason"]
        );

        let rows: Vec<NotFoundRecord> = reader.deserialize().map(|r| r.unwrap()).collect();
        assert_eq!(rows, vec![not_found("a.mp3"), not_found("b.mp3")]);
    }

    #[test]
    fn unwritable_ledger_keeps_the_record() {
        let dir = tempfile::tempdir().unwrap();
        let mut ledger = Ledger::new(dir.path().join("missing").join(ERROR_LEDGER_FILE));

        let result = ledger.append(ErrorRecord {
            file: "a.mp3".to_string(),
            title: String::new(),
            artist: String::new(),
            album: String::new(),
            error: "boom".to_string(),
        });

        assert_matches!(result, Err(RunError::Ledger { .. }));
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn export_skips_empty_ledgers() {
        let dir = tempfile::tempdir().unwrap();
        let mut ledger: Ledger<NotFoundRecord> = Ledger::new(dir.path().join(NOT_FOUND_LEDGER_FILE));

        assert_eq!(ledger.export(dir.path(), "not_found", "20240101_120000").unwrap(), None);

        ledger.append(not_found("a.mp3")).unwrap();
        let exported = ledger
            .export(dir.path(), "not_found", "20240101_120000")
            .unwrap()
            .unwrap();

        assert_eq!(exported, dir.path().join("not_found_20240101_120000.csv"));
        assert_eq!(
            std::fs::read_to_string(&exported).unwrap(),
            std::fs::read_to_string(ledger.path()).unwrap()
        );
    }
}
