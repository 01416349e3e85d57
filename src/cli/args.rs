//! CLI argument parsing using clap.

use clap::{
    Parser, Subcommand,
    builder::styling::{AnsiColor, Effects, Styles},
};
use std::path::PathBuf;

fn clap_cargo_style() -> Styles {
    Styles::styled()
        .header(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .usage(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .literal(AnsiColor::Green.on_default())
        .placeholder(AnsiColor::Green.on_default())
}

/// Element appearance watcher
#[derive(Parser, Debug)]
#[command(
    name = "domwatch",
    version = env!("CARGO_PKG_VERSION"),
    about = "Watch for elements appearing in a document",
    long_about = "Detect elements matching CSS selectors as they are rendered, \
                  including inside open shadow roots, and rewrite sticky search URLs.",
    styles = clap_cargo_style()
)]
pub struct Cli {
    /// Path to custom settings.toml file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize project
    #[command(about = "Set up .domwatch directory with default configuration")]
    Init {
        /// Force overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },

    /// Show current configuration
    #[command(about = "Print the effective settings as TOML")]
    Config,

    /// Rewrite a search URL the way the sticky search interceptor would
    #[command(about = "Print the sticky search URL for a query")]
    Rewrite {
        /// Current page location (absolute URL or path with query)
        #[arg(long)]
        url: String,

        /// Search terms typed into the search box
        #[arg(long)]
        query: String,

        /// Community scope chip is shown
        #[arg(long)]
        chip: bool,
    },

    /// Render an element late and watch for it
    #[command(about = "Simulate late rendering and report detection timing")]
    Demo {
        /// Delay before the element is rendered
        #[arg(long, default_value_t = 250)]
        delay_ms: u64,

        /// Render the element inside an open shadow root
        #[arg(long)]
        shadow: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_rewrite() {
        let cli = Cli::parse_from([
            "domwatch", "rewrite", "--url", "/r/rust/?sort=new", "--query", "tokio", "--chip",
        ]);
        match cli.command {
            Commands::Rewrite { url, query, chip } => {
                assert_eq!(url, "/r/rust/?sort=new");
                assert_eq!(query, "tokio");
                assert!(chip);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_demo_defaults() {
        let cli = Cli::parse_from(["domwatch", "demo"]);
        assert!(matches!(
            cli.command,
            Commands::Demo { delay_ms: 250, shadow: false }
        ));
    }
}
