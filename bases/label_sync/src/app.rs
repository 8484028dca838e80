use crate::config::Config;
use crate::output::OutputHandler;
use batch_runner::{BatchRunner, CancellationToken, RunOptions, DEFAULT_CAPACITY};
use catalog_search::{
    CatalogProvider, CatalogSearch, DiscogsProvider, MusicBrainzProvider, SearchOptions,
    SpotifyProvider,
};
use color_eyre::Result;
use genre_rules::GenreRules;
use std::sync::Arc;
use tag_merge::TagMerger;
use tracing::info;

pub struct App {
    config: Config,
    output: OutputHandler,
}

impl App {
    pub fn new(config: Config) -> Self {
        let output = OutputHandler::new(config.verbose);
        Self { config, output }
    }

    pub async fn run(&self) -> Result<()> {
        let search = CatalogSearch::with_options(
            self.build_providers()?,
            self.config.services,
            SearchOptions {
                retries: self.config.retries,
                ..SearchOptions::default()
            },
        );

        let rules = GenreRules::with_custom_mappings(self.config.genre_mappings.as_deref());
        let runner = BatchRunner::new(
            search,
            TagMerger::new(rules),
            RunOptions {
                lookup_delay: self.config.lookup_delay,
                ledger_dir: self.config.ledger_dir.clone(),
                export_dir: self.config.export_dir.clone(),
            },
        );

        let (events, mut rx) = batch_runner::channel(DEFAULT_CAPACITY);
        let cancel = CancellationToken::new();

        let library = self.config.library.clone();
        let worker_cancel = cancel.clone();
        let worker =
            tokio::spawn(async move { runner.run(&library, events, worker_cancel).await });

        loop {
            tokio::select! {
                event = rx.recv() => match event {
                    Some(event) => self.output.print_event(&event),
                    None => break,
                },
                _ = tokio::signal::ctrl_c(), if !cancel.is_cancelled() => {
                    info!("Interrupt received");
                    self.output.print_cancel_requested();
                    cancel.cancel();
                }
            }
        }

        let report = worker.await??;
        self.output.print_report(&report);

        Ok(())
    }

    fn build_providers(&self) -> Result<Vec<Arc<dyn CatalogProvider>>> {
        let services = self.config.services;
        let mut providers: Vec<Arc<dyn CatalogProvider>> = Vec::new();

        if services.musicbrainz {
            providers.push(Arc::new(MusicBrainzProvider::new()?));
        }

        if let (true, Some(credentials)) = (services.spotify, &self.config.spotify) {
            providers.push(Arc::new(SpotifyProvider::new(credentials.clone())?));
        }

        if let (true, Some(token)) = (services.discogs, &self.config.discogs_token) {
            providers.push(Arc::new(DiscogsProvider::new(token.clone())?));
        }

        info!(count = providers.len(), "Catalog providers ready");
        Ok(providers)
    }

    pub fn print_error(&self, error: &color_eyre::Report) {
        self.output.print_error(error);
    }
}
