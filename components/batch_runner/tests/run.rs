use assert_matches::assert_matches;
use async_trait::async_trait;
use batch_runner::{
    channel, BatchRunner, CancellationToken, ProgressSender, RunError, RunEvent, RunOptions,
    REASON_NO_RESULT,
};
use catalog_search::{CatalogProvider, CatalogSearch, SearchError, SearchOptions, ServiceSelection};
use genre_rules::GenreRules;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tag_merge::test_support::{write_mp3, Mp3Tags};
use tag_merge::{read_tags, TagMerger};
use tempfile::TempDir;
use track_primitives::{CatalogSource, TrackMetadata};

/// MusicBrainz stand-in answering by query title; titles it does not know
/// fail like a dropped connection
struct StubMusicBrainz {
    answers: HashMap<String, Vec<TrackMetadata>>,
    calls: AtomicUsize,
    /// Deleted while the lookup is in flight, after grouping has seen it
    vanishing: Option<PathBuf>,
}

impl StubMusicBrainz {
    fn new() -> Self {
        Self {
            answers: HashMap::new(),
            calls: AtomicUsize::new(0),
            vanishing: None,
        }
    }

    fn answer(mut self, title: &str, results: Vec<TrackMetadata>) -> Self {
        self.answers.insert(title.to_string(), results);
        self
    }

    fn removing(mut self, path: PathBuf) -> Self {
        self.vanishing = Some(path);
        self
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CatalogProvider for StubMusicBrainz {
    fn source(&self) -> CatalogSource {
        CatalogSource::MusicBrainz
    }

    async fn search(&self, title: &str, _artist: &str) -> catalog_search::Result<Vec<TrackMetadata>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(path) = &self.vanishing {
            let _ = std::fs::remove_file(path);
        }
        self.answers
            .get(title)
            .cloned()
            .ok_or_else(|| SearchError::network(CatalogSource::MusicBrainz, "connection reset"))
    }
}

fn hit(label: Option<&str>, confidence: f64) -> TrackMetadata {
    TrackMetadata::candidate(CatalogSource::MusicBrainz, "Track 0", "Artist", "Record", confidence)
        .with_label(label.map(str::to_string))
}

struct Fixture {
    library: TempDir,
    ledgers: TempDir,
}

impl Fixture {
    fn new() -> Self {
        Self {
            library: tempfile::tempdir().unwrap(),
            ledgers: tempfile::tempdir().unwrap(),
        }
    }

    /// `count` files sharing one album, titled "<prefix> 0", "<prefix> 1", ...
    fn album(&self, album: &str, prefix: &str, count: usize) -> Vec<PathBuf> {
        let dir = self.library.path().join(album);
        std::fs::create_dir_all(&dir).unwrap();
        (0..count)
            .map(|i| {
                let path = dir.join(format!("{:02}.mp3", i));
                write_mp3(&path, &Mp3Tags::new(format!("{} {}", prefix, i), "Artist", album))
                    .unwrap();
                path
            })
            .collect()
    }

    fn options(&self) -> RunOptions {
        RunOptions {
            lookup_delay: Duration::ZERO,
            ledger_dir: self.ledgers.path().to_path_buf(),
            export_dir: None,
        }
    }

    fn runner(&self, provider: Arc<StubMusicBrainz>, options: RunOptions) -> BatchRunner {
        let providers: Vec<Arc<dyn CatalogProvider>> = vec![provider];
        let search = CatalogSearch::with_options(
            providers,
            ServiceSelection::default(),
            SearchOptions {
                retries: 3,
                retry_delay: Duration::ZERO,
            },
        );
        BatchRunner::new(search, TagMerger::new(GenreRules::default()), options)
    }
}

#[tokio::test]
async fn labelled_album_is_written_to_every_file() {
    let fixture = Fixture::new();
    let files = fixture.album("Record - Single", "Track", 7);
    let provider = Arc::new(
        StubMusicBrainz::new().answer("Track 0", vec![hit(Some("Hospital Records"), 82.0)]),
    );
    let runner = fixture.runner(provider.clone(), fixture.options());

    let report = runner
        .run(fixture.library.path(), ProgressSender::disabled(), CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(report.files_found, 7);
    assert_eq!(report.albums, 1);
    assert_eq!(report.eps, 0);
    assert_eq!(report.summary.updated_files, 7);
    assert_eq!(report.summary.label_updates, 7);
    assert!(report.not_found.is_empty());
    assert!(report.errors.is_empty());
    assert_eq!(provider.calls(), 1);

    for path in &files {
        let tags = read_tags(path).unwrap();
        assert_eq!(tags.label.as_deref(), Some("Hospital Records"));
        assert_eq!(tags.genre.as_deref(), Some("Drum & Bass"));
        assert_eq!(tags.album, "Record");
    }
}

#[tokio::test]
async fn second_run_changes_nothing() {
    let fixture = Fixture::new();
    fixture.album("Record", "Track", 3);
    let provider = Arc::new(
        StubMusicBrainz::new().answer("Track 0", vec![hit(Some("Hospital Records"), 82.0)]),
    );
    let runner = fixture.runner(provider, fixture.options());

    let first = runner
        .run(fixture.library.path(), ProgressSender::disabled(), CancellationToken::new())
        .await
        .unwrap();
    let second = runner
        .run(fixture.library.path(), ProgressSender::disabled(), CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(first.summary.updated_files, 3);
    assert_eq!(first.eps, 1);
    assert_eq!(second.summary.total_files, 3);
    assert_eq!(second.summary.updated_files, 0);
}

#[tokio::test]
async fn rejected_lookups_go_to_the_not_found_ledger() {
    let fixture = Fixture::new();
    fixture.album("Unlabelled", "Quiet", 2);
    fixture.album("Weak", "Faint", 2);
    let provider = Arc::new(
        StubMusicBrainz::new()
            .answer("Quiet 0", vec![hit(None, 95.0)])
            .answer("Faint 0", vec![hit(Some("Some Label"), 40.0)]),
    );
    let runner = fixture.runner(provider, fixture.options());

    let report = runner
        .run(fixture.library.path(), ProgressSender::disabled(), CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(report.summary.updated_files, 0);
    assert_eq!(report.not_found.len(), 4);
    assert!(report.not_found.iter().all(|r| r.reason == REASON_NO_RESULT));

    let ledger = std::fs::read_to_string(fixture.ledgers.path().join("not_found_log.csv")).unwrap();
    assert_eq!(ledger.lines().count(), 5);
    assert!(ledger.starts_with("file,title,artist,album,reason"));
}

#[tokio::test]
async fn failed_lookup_is_logged_and_the_run_continues() {
    let fixture = Fixture::new();
    fixture.album("Broken", "Unknown", 2);
    let good = fixture.album("Fine", "Track", 2);
    let provider = Arc::new(
        StubMusicBrainz::new().answer("Track 0", vec![hit(Some("Hospital Records"), 82.0)]),
    );
    let runner = fixture.runner(provider.clone(), fixture.options());

    let report = runner
        .run(fixture.library.path(), ProgressSender::disabled(), CancellationToken::new())
        .await
        .unwrap();

    // three attempts for the failing cohort, one for the good one
    assert_eq!(provider.calls(), 4);
    assert_eq!(report.errors.len(), 1);
    assert!(report.errors[0].file.ends_with("00.mp3"));
    assert_eq!(report.errors[0].title, "Unknown 0");
    assert_eq!(report.summary.updated_files, 2);
    for path in &good {
        assert_eq!(read_tags(path).unwrap().label.as_deref(), Some("Hospital Records"));
    }
}

#[tokio::test]
async fn incomplete_first_file_is_not_looked_up() {
    let fixture = Fixture::new();
    let dir = fixture.library.path().join("Anon");
    std::fs::create_dir_all(&dir).unwrap();
    write_mp3(&dir.join("00.mp3"), &Mp3Tags::new("Nameless", "", "Anon")).unwrap();
    let provider = Arc::new(StubMusicBrainz::new());
    let runner = fixture.runner(provider.clone(), fixture.options());

    let report = runner
        .run(fixture.library.path(), ProgressSender::disabled(), CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(provider.calls(), 0);
    assert_eq!(report.not_found.len(), 1);
    assert_eq!(report.not_found[0].reason, REASON_NO_RESULT);
}

#[tokio::test]
async fn unreadable_files_are_recorded_as_errors() {
    let fixture = Fixture::new();
    let broken = fixture.library.path().join("broken.mp3");
    std::fs::write(&broken, b"not audio at all").unwrap();
    let provider = Arc::new(StubMusicBrainz::new());
    let runner = fixture.runner(provider, fixture.options());

    let report = runner
        .run(fixture.library.path(), ProgressSender::disabled(), CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(report.errors.len(), 1);
    assert_eq!(report.errors[0].file, broken.display().to_string());
    assert!(fixture.ledgers.path().join("error_log.csv").exists());
}

#[tokio::test]
async fn canceled_run_stops_before_the_next_cohort() {
    let fixture = Fixture::new();
    let files = fixture.album("Record", "Track", 2);
    let provider = Arc::new(
        StubMusicBrainz::new().answer("Track 0", vec![hit(Some("Hospital Records"), 82.0)]),
    );
    let runner = fixture.runner(provider.clone(), fixture.options());
    let cancel = CancellationToken::new();
    cancel.cancel();

    let report = runner
        .run(fixture.library.path(), ProgressSender::disabled(), cancel)
        .await
        .unwrap();

    assert!(report.canceled);
    assert_eq!(provider.calls(), 0);
    assert_eq!(read_tags(&files[0]).unwrap().label, None);
}

#[tokio::test]
async fn empty_library_only_reports() {
    let fixture = Fixture::new();
    let runner = fixture.runner(Arc::new(StubMusicBrainz::new()), fixture.options());
    let (events, mut rx) = channel(16);

    let report = runner
        .run(fixture.library.path(), events, CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(report.files_found, 0);
    assert_matches!(rx.recv().await, Some(RunEvent::Log(message)) if message.starts_with("No MP3 files found"));
    assert!(!fixture.ledgers.path().join("error_log.csv").exists());
}

#[tokio::test]
async fn missing_library_fails_the_run() {
    let fixture = Fixture::new();
    let runner = fixture.runner(Arc::new(StubMusicBrainz::new()), fixture.options());

    let result = runner
        .run(
            &fixture.library.path().join("nope"),
            ProgressSender::disabled(),
            CancellationToken::new(),
        )
        .await;

    assert_matches!(result, Err(RunError::LibraryNotFound { .. }));
}

#[tokio::test]
async fn progress_ends_with_summary_and_export() {
    let fixture = Fixture::new();
    fixture.album("Record", "Track", 2);
    fixture.album("Other", "Missing", 1);
    let export = tempfile::tempdir().unwrap();
    let provider = Arc::new(
        StubMusicBrainz::new()
            .answer("Track 0", vec![hit(Some("Hospital Records"), 82.0)])
            .answer("Missing 0", vec![]),
    );
    let options = RunOptions {
        export_dir: Some(export.path().to_path_buf()),
        ..fixture.options()
    };
    let runner = fixture.runner(provider, options);
    let (events, mut rx) = channel(1024);

    let report = runner
        .run(fixture.library.path(), events, CancellationToken::new())
        .await
        .unwrap();

    let mut received = Vec::new();
    while let Ok(event) = rx.try_recv() {
        received.push(event);
    }

    assert!(received.iter().any(|e| matches!(
        e,
        RunEvent::Progress { percent, .. } if *percent == 100.0
    )));
    assert!(received.iter().any(|e| matches!(
        e,
        RunEvent::Log(message) if message.contains("Hospital Records")
    )));

    assert_eq!(report.exported.len(), 1);
    let exported = &report.exported[0];
    assert!(exported.starts_with(export.path()));
    assert!(file_name(exported).starts_with("not_found_"));
}

fn file_name(path: &Path) -> String {
    path.file_name().unwrap().to_string_lossy().into_owned()
}

#[tokio::test]
async fn failed_file_update_is_logged_and_cohort_continues() {
    let fixture = Fixture::new();
    let files = fixture.album("Record", "Track", 3);
    let provider = Arc::new(
        StubMusicBrainz::new()
            .answer("Track 0", vec![hit(Some("Hospital Records"), 82.0)])
            .removing(files[1].clone()),
    );
    let runner = fixture.runner(provider, fixture.options());

    let report = runner
        .run(fixture.library.path(), ProgressSender::disabled(), CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(report.errors.len(), 1);
    assert_eq!(report.errors[0].file, files[1].display().to_string());
    assert!(report.errors[0].error.starts_with("Failed to update 01.mp3"));
    assert!(report.not_found.is_empty());

    assert_eq!(report.summary.updated_files, 2);
    assert_eq!(report.summary.total_files, 2);
    for path in [&files[0], &files[2]] {
        let tags = read_tags(path).unwrap();
        assert_eq!(tags.label.as_deref(), Some("Hospital Records"));
    }

    let ledger = std::fs::read_to_string(fixture.ledgers.path().join("error_log.csv")).unwrap();
    assert_eq!(ledger.lines().count(), 2);
}
