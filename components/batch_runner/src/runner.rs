//! The batch run: grouping, one lookup per cohort, then merge or skip
//!
//! A run walks `Grouping -> per cohort (Lookup -> Decide -> Merge | Skip)
//! -> Summarize`. Cancellation is checked between cohorts only, so a file
//! is never left half written because of it.

use crate::discovery::find_audio_files;
use crate::error::{Result, RunError};
use crate::ledger::{
    ErrorRecord, Ledger, NotFoundRecord, ERROR_LEDGER_FILE, NOT_FOUND_LEDGER_FILE,
    REASON_NO_LABEL, REASON_NO_RESULT,
};
use crate::progress::ProgressSender;
use catalog_search::CatalogSearch;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tag_merge::{group_files_by_album, read_tags, Cohort, RunSummary, TagMerger};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use track_primitives::TrackMetadata;

#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Pause before each catalog lookup
    pub lookup_delay: Duration,
    /// Where the error and not-found ledgers are kept during the run
    pub ledger_dir: PathBuf,
    /// Where timestamped ledger copies go at the end of the run
    pub export_dir: Option<PathBuf>,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            lookup_delay: Duration::from_millis(500),
            ledger_dir: PathBuf::from("."),
            export_dir: None,
        }
    }
}

/// What a finished (or canceled) run did
#[derive(Debug, Default)]
pub struct RunReport {
    pub files_found: usize,
    pub albums: usize,
    pub eps: usize,
    pub ungrouped: usize,
    pub summary: RunSummary,
    pub errors: Vec<ErrorRecord>,
    pub not_found: Vec<NotFoundRecord>,
    pub canceled: bool,
    pub exported: Vec<PathBuf>,
}

enum Decision {
    Accept(TrackMetadata),
    Skip(&'static str),
}

/// Mutable state of one run
struct RunState {
    summary: RunSummary,
    errors: Ledger<ErrorRecord>,
    not_found: Ledger<NotFoundRecord>,
    processed: usize,
    total: usize,
}

impl RunState {
    fn new(options: &RunOptions, total: usize) -> Self {
        Self {
            summary: RunSummary::new(),
            errors: Ledger::new(options.ledger_dir.join(ERROR_LEDGER_FILE)),
            not_found: Ledger::new(options.ledger_dir.join(NOT_FOUND_LEDGER_FILE)),
            processed: 0,
            total,
        }
    }

    fn record_error(&mut self, path: &Path, message: &str) {
        let local = read_local(path);

        let record = ErrorRecord {
            file: path.display().to_string(),
            title: local.title,
            artist: local.artist,
            album: local.album,
            error: message.to_string(),
        };

        if let Err(e) = self.errors.append(record) {
            warn!(error = %e, "Error ledger not written");
        }
    }

    fn record_not_found(&mut self, path: &Path, reason: &str) {
        let local = read_local(path);

        let record = NotFoundRecord {
            file: path.display().to_string(),
            title: local.title,
            artist: local.artist,
            album: local.album,
            reason: reason.to_string(),
        };

        if let Err(e) = self.not_found.append(record) {
            warn!(error = %e, "Not-found ledger not written");
        }
    }

    fn percent(&self) -> f64 {
        if self.total == 0 {
            return 100.0;
        }
        self.processed as f64 / self.total as f64 * 100.0
    }
}

/// A file's own tags for ledger rows, blank when unreadable
fn read_local(path: &Path) -> TrackMetadata {
    read_tags(path).unwrap_or_else(|_| TrackMetadata::local("", "", ""))
}

pub struct BatchRunner {
    search: CatalogSearch,
    merger: TagMerger,
    options: RunOptions,
}

impl BatchRunner {
    pub fn new(search: CatalogSearch, merger: TagMerger, options: RunOptions) -> Self {
        Self {
            search,
            merger,
            options,
        }
    }

    /// Reconcile every MP3 file below `directory`
    ///
    /// Per-file and per-cohort failures go to the error ledger and the run
    /// carries on; only a missing library directory fails the run itself.
    pub async fn run(
        &self,
        directory: &Path,
        events: ProgressSender,
        cancel: CancellationToken,
    ) -> Result<RunReport> {
        if !directory.is_dir() {
            return Err(RunError::LibraryNotFound {
                path: directory.to_path_buf(),
            });
        }

        let files = find_audio_files(directory);
        let total = files.len();

        if total == 0 {
            events
                .log(format!("No MP3 files found in {}", directory.display()))
                .await;
            return Ok(RunReport::default());
        }

        info!(directory = %directory.display(), files = total, "Starting run");
        events
            .progress(0.0, format!("Analysing files - {} files found", total))
            .await;

        let mut state = RunState::new(&self.options, total);

        events.log("Grouping files by album/EP...").await;
        let grouping = group_files_by_album(&files);

        let unreadable: Vec<(PathBuf, String)> = grouping
            .unreadable
            .iter()
            .map(|(path, e)| (path.clone(), e.to_string()))
            .collect();
        for (path, message) in &unreadable {
            state.record_error(path, message);
        }

        info!(
            cohorts = grouping.cohorts.len(),
            grouped = grouping.grouped_files(),
            unreadable = grouping.unreadable.len(),
            "Files grouped"
        );

        let mut report = RunReport {
            files_found: total,
            albums: grouping.albums(),
            eps: grouping.eps(),
            ungrouped: grouping.ungrouped.len(),
            ..Default::default()
        };

        events
            .log(format!(
                "Grouping summary: {} albums, {} EPs, {} ungrouped files",
                report.albums, report.eps, report.ungrouped
            ))
            .await;

        for cohort in &grouping.cohorts {
            if cancel.is_cancelled() {
                info!("Run canceled");
                events.log("Processing canceled by user").await;
                report.canceled = true;
                break;
            }

            self.process_cohort(cohort, &mut state, &events).await;
        }

        if !report.canceled {
            events.progress(100.0, "Processing complete").await;
            events.log(state.summary.render()).await;
            events
                .log(format!(
                    "Statistics: {} files not found, {} errors",
                    state.not_found.len(),
                    state.errors.len()
                ))
                .await;
        }

        if let Some(export_dir) = &self.options.export_dir {
            report.exported = self.export(&state, export_dir, &events).await;
        }

        report.summary = state.summary;
        report.errors = state.errors.records().to_vec();
        report.not_found = state.not_found.records().to_vec();

        Ok(report)
    }

    async fn process_cohort(&self, cohort: &Cohort, state: &mut RunState, events: &ProgressSender) {
        let Some(first_file) = cohort.first_file() else {
            return;
        };

        events
            .log(format!("Processing {}: {}", cohort.kind(), cohort.album))
            .await;

        match self.decide(cohort, first_file, events).await {
            Ok(Decision::Accept(record)) => {
                info!(album = %cohort.album, label = ?record.label, "Applying record to cohort");
                for path in &cohort.files {
                    self.merge_file(path, &record, state, events).await;
                }
            }
            Ok(Decision::Skip(reason)) => {
                info!(album = %cohort.album, reason, "Cohort skipped");
                for path in &cohort.files {
                    state.record_not_found(path, reason);
                }
            }
            Err(e) => {
                error!(album = %cohort.album, error = %e, "Cohort failed");
                let message = e.to_string();
                state.record_error(first_file, &message);
                events.log(format!("Error: {}", message)).await;
            }
        }
    }

    /// Look up the cohort's first file and judge the result
    async fn decide(
        &self,
        cohort: &Cohort,
        first_file: &Path,
        events: &ProgressSender,
    ) -> Result<Decision> {
        let local = read_tags(first_file).map_err(|source| RunError::CohortRead {
            album: cohort.album.clone(),
            source,
        })?;

        if !local.is_searchable() {
            events.log("  Missing or incomplete metadata").await;
            return Ok(Decision::Skip(REASON_NO_RESULT));
        }

        events
            .log(format!("  Searching for {}", local.display_name()))
            .await;

        tokio::time::sleep(self.options.lookup_delay).await;

        let results = self
            .search
            .search_track(&local.title, &local.artist)
            .await
            .map_err(|source| RunError::Lookup {
                album: cohort.album.clone(),
                source,
            })?;

        let Some(best) = results.into_iter().next() else {
            events.log("  No result found").await;
            return Ok(Decision::Skip(REASON_NO_RESULT));
        };

        events
            .log(format!(
                "  Best match ({}): {:.1}%",
                best.source, best.confidence
            ))
            .await;
        events
            .log(format!(
                "  Label: {}",
                best.label.as_deref().unwrap_or("not found")
            ))
            .await;
        events
            .log(format!(
                "  Catalog number: {}",
                best.catalog_number.as_deref().unwrap_or("not found")
            ))
            .await;

        if best.is_acceptable() {
            Ok(Decision::Accept(best))
        } else if best.label.is_none() {
            Ok(Decision::Skip(REASON_NO_LABEL))
        } else {
            info!(confidence = best.confidence, "Result below acceptance threshold");
            Ok(Decision::Skip(REASON_NO_RESULT))
        }
    }

    async fn merge_file(
        &self,
        path: &Path,
        record: &TrackMetadata,
        state: &mut RunState,
        events: &ProgressSender,
    ) {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        match self.merger.update_metadata(path, record, &mut state.summary) {
            Ok(_) => {
                state.processed += 1;
                events
                    .progress(
                        state.percent(),
                        format!("[{}/{}] Updated {}", state.processed, state.total, name),
                    )
                    .await;
            }
            Err(e) => {
                let message = format!("Failed to update {}: {}", name, e);
                error!(path = %path.display(), error = %e, "Merge failed");
                state.record_error(path, &message);
                events.log(message).await;
            }
        }
    }

    async fn export(&self, state: &RunState, dir: &Path, events: &ProgressSender) -> Vec<PathBuf> {
        let stamp = chrono::Local::now().format("%Y%m%d_%H%M%S").to_string();

        let results = [
            state.errors.export(dir, "error_log", &stamp),
            state.not_found.export(dir, "not_found", &stamp),
        ];

        let mut exported = Vec::new();
        for result in results {
            match result {
                Ok(Some(path)) => {
                    events
                        .log(format!("Ledger exported to {}", path.display()))
                        .await;
                    exported.push(path);
                }
                Ok(None) => {}
                Err(e) => warn!(error = %e, "Ledger export failed"),
            }
        }
        exported
    }
}
