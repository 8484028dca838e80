use std::collections::BTreeSet;
use std::fmt::Write;
use track_primitives::CatalogSource;

/// Counters for one batch run, owned by the orchestrator
#[derive(Debug, Default, Clone, PartialEq)]
pub struct RunSummary {
    /// Files the merge engine finished, written or not
    pub total_files: usize,
    pub updated_files: usize,
    pub label_updates: usize,
    pub catalog_updates: usize,
    pub genre_updates: usize,

    pub labels: BTreeSet<String>,
    pub catalogs: BTreeSet<String>,
    pub genres: BTreeSet<String>,

    /// Provenance of the last record written to a file
    pub source_used: Option<CatalogSource>,
}

/// Fields one merge actually changed
#[derive(Debug, Default, Clone, PartialEq)]
pub struct FieldChanges {
    pub label: Option<String>,
    pub catalog_number: Option<String>,
    pub genre: Option<String>,
    pub album: Option<String>,
    pub album_artist: Option<String>,
}

impl FieldChanges {
    pub fn any(&self) -> bool {
        self.label.is_some()
            || self.catalog_number.is_some()
            || self.genre.is_some()
            || self.album.is_some()
            || self.album_artist.is_some()
    }
}

impl RunSummary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count a file that was merged without needing a write
    pub fn record_unchanged(&mut self) {
        self.total_files += 1;
    }

    /// Count a file whose changes were persisted
    pub fn record_update(&mut self, source: CatalogSource, changes: &FieldChanges) {
        self.total_files += 1;
        self.updated_files += 1;
        self.source_used = Some(source);

        if let Some(label) = &changes.label {
            self.label_updates += 1;
            self.labels.insert(label.clone());
        }

        if let Some(catalog) = &changes.catalog_number {
            self.catalog_updates += 1;
            self.catalogs.insert(catalog.clone());
        }

        if let Some(genre) = &changes.genre {
            self.genre_updates += 1;
            self.genres.insert(genre.clone());
        }
    }

    /// Human-readable report for the end of a run
    pub fn render(&self) -> String {
        let mut out = String::new();

        let source = self
            .source_used
            .map(|s| s.to_string())
            .unwrap_or_else(|| "none".to_string());

        let _ = writeln!(out, "Update summary");
        let _ = writeln!(out, "  Source used:      {}", source);
        let _ = writeln!(out, "  Files processed:  {}", self.total_files);
        let _ = writeln!(out, "  Files updated:    {}", self.updated_files);

        render_set(&mut out, "Labels", self.label_updates, &self.labels);
        render_set(&mut out, "Catalog numbers", self.catalog_updates, &self.catalogs);
        render_set(&mut out, "Genres", self.genre_updates, &self.genres);

        out
    }
}

fn render_set(out: &mut String, heading: &str, updates: usize, values: &BTreeSet<String>) {
    if values.is_empty() {
        return;
    }

    let _ = writeln!(out, "  {} ({} updates):", heading, updates);
    for value in values {
        let _ = writeln!(out, "    - {}", value);
    }
}
