use catalog_search::{ServiceSelection, SpotifyCredentials};
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

/// Reconcile record labels, catalog numbers and genres of an MP3 library
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct CliArgs {
    /// Directory scanned recursively for MP3 files
    pub library: PathBuf,

    /// Do not query MusicBrainz
    #[arg(long)]
    pub no_musicbrainz: bool,

    /// Query Spotify (needs client credentials)
    #[arg(long)]
    pub spotify: bool,

    /// Query Discogs (needs a personal access token)
    #[arg(long)]
    pub discogs: bool,

    #[arg(long, env = "SPOTIFY_CLIENT_ID", hide_env_values = true)]
    pub spotify_client_id: Option<String>,

    #[arg(long, env = "SPOTIFY_CLIENT_SECRET", hide_env_values = true)]
    pub spotify_client_secret: Option<String>,

    #[arg(long, env = "DISCOGS_TOKEN", hide_env_values = true)]
    pub discogs_token: Option<String>,

    /// JSON file with extra "genres", "labels" and "artists" mappings
    #[arg(long)]
    pub genre_mappings: Option<PathBuf>,

    /// Where error_log.csv and not_found_log.csv are written
    #[arg(long, default_value = ".")]
    pub ledger_dir: PathBuf,

    /// Also copy non-empty ledgers here with a timestamp in the name
    #[arg(long)]
    pub export_dir: Option<PathBuf>,

    /// Attempts per lookup before giving up on a cohort
    #[arg(long, default_value_t = 3)]
    pub retries: u32,

    /// Pause before each lookup, in milliseconds
    #[arg(long, default_value_t = 500)]
    pub lookup_delay_ms: u64,

    /// Print error causes and extra detail
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub library: PathBuf,
    pub services: ServiceSelection,
    pub spotify: Option<SpotifyCredentials>,
    pub discogs_token: Option<String>,
    pub genre_mappings: Option<PathBuf>,
    pub ledger_dir: PathBuf,
    pub export_dir: Option<PathBuf>,
    pub retries: u32,
    pub lookup_delay: Duration,
    pub verbose: bool,

    /// Problems found while building the config; none of them are fatal
    pub warnings: Vec<String>,
}

impl Config {
    /// Create configuration from CLI arguments
    pub fn from_args(args: CliArgs) -> Self {
        let mut warnings = Vec::new();

        let spotify = match (
            non_blank(args.spotify_client_id),
            non_blank(args.spotify_client_secret),
        ) {
            (Some(client_id), Some(client_secret)) => Some(SpotifyCredentials {
                client_id,
                client_secret,
            }),
            _ => None,
        };
        let discogs_token = non_blank(args.discogs_token);

        let mut services = ServiceSelection {
            musicbrainz: !args.no_musicbrainz,
            spotify: args.spotify,
            discogs: args.discogs,
        };

        if services.spotify && spotify.is_none() {
            warnings.push("Spotify disabled: client id and secret are required".to_string());
            services.spotify = false;
        }

        if services.discogs && discogs_token.is_none() {
            warnings.push("Discogs disabled: a token is required".to_string());
            services.discogs = false;
        }

        if !services.any_enabled() {
            warnings.push("No catalog enabled: every cohort will be reported as not found".to_string());
        }

        Self {
            library: args.library,
            services,
            spotify,
            discogs_token,
            genre_mappings: args.genre_mappings,
            ledger_dir: args.ledger_dir,
            export_dir: args.export_dir,
            retries: args.retries.max(1),
            lookup_delay: Duration::from_millis(args.lookup_delay_ms),
            verbose: args.verbose,
            warnings,
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
