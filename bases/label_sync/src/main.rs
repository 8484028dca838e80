mod app;
mod config;
mod output;

use app::App;
use clap::Parser;
use color_eyre::Result;
use config::{CliArgs, Config};

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "label_sync=info,batch_runner=info,catalog_search=info,tag_merge=info,genre_rules=info"
                    .into()
            }),
        )
        .init();

    let args = CliArgs::parse();
    let config = Config::from_args(args);

    for warning in &config.warnings {
        tracing::warn!("{}", warning);
    }

    let app = App::new(config);

    if let Err(error) = app.run().await {
        app.print_error(&error);
        std::process::exit(1);
    }
    Ok(())
}
