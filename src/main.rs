use anyhow::{Result, anyhow};
use clap::Parser;

use domwatch::Settings;
use domwatch::cli::commands::{demo, init, rewrite};
use domwatch::cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let settings = match &cli.config {
        Some(path) => Settings::load_from(path),
        None => Settings::load(),
    }
    .unwrap_or_else(|e| {
        eprintln!("Configuration error: {e}");
        Settings::default()
    });

    domwatch::logging::init_with_config(&settings.logging);

    match cli.command {
        Commands::Init { force } => init::run_init(force),
        Commands::Config => init::run_config(&settings),
        Commands::Rewrite { url, query, chip } => {
            rewrite::run_rewrite(&settings.sticky, &url, &query, chip)
        }
        Commands::Demo { delay_ms, shadow } => demo::run_demo(&settings, delay_ms, shadow)
            .await
            .map_err(|e| anyhow!("demo failed: {e}")),
    }
}
