//! Forgesync CLI - mirror Forgejo repositories to another forge.

mod commands;
mod config;
mod shutdown;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::commands::sync::SyncArgs;

#[derive(Parser)]
#[command(name = "forgesync")]
#[command(version)]
#[command(about = "Mirror Forgejo repositories to GitHub, Codeberg or another Forgejo")]
#[command(
    long_about = "Forgesync creates or updates a destination repository for every repository \
you own on a Forgejo instance, keeps its description, visibility and topics in line with \
the source, and configures a push mirror on the source so new commits keep flowing."
)]
#[command(after_long_help = r#"EXAMPLES
    Mirror everything to GitHub:
        $ forgesync sync https://git.example.com github

    Mirror to another Forgejo, only app-* repositories, recreating mirrors every night:
        $ forgesync sync https://git.example.com forgejo=https://backup.example.com \
            --include 'app-.*' --remirror '*-*-* 03:00:00'

    See what would happen:
        $ forgesync sync https://git.example.com codeberg --dry-run

CONFIGURATION
    Forgesync reads configuration from:
      1. ~/.config/forgesync/config.toml (or $XDG_CONFIG_HOME/forgesync/config.toml)
      2. ./forgesync.toml
      3. Environment variables (FORGESYNC_* prefix, e.g. FORGESYNC_REMIRROR)
      4. .env file in current directory

ENVIRONMENT VARIABLES
    SOURCE_TOKEN    API token for the source Forgejo instance
    TARGET_TOKEN    API token for the destination
    MIRROR_TOKEN    Token the source pushes to the destination with
"#)]
struct Cli {
    /// Log level (overridden by RUST_LOG)
    #[arg(long, global = true, default_value = "info")]
    log: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sync repositories and their push mirrors
    Sync(SyncArgs),
    /// Generate shell completion scripts
    Completions {
        /// Shell to generate completions for
        shell: clap_complete::Shell,
    },
    /// Generate man page(s)
    Man {
        /// Output directory for man pages (prints to stdout if not specified)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn init_tracing(level: &str) {
    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::new(format!("forgesync={level},forgesync_cli={level}")),
    };

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    match cli.command {
        Commands::Completions { shell } => commands::meta::handle_completions(shell),
        Commands::Man { output } => commands::meta::handle_man(output),
        Commands::Sync(args) => {
            init_tracing(&cli.log);
            shutdown::setup_shutdown_handler();

            let config = config::Config::load();

            match commands::sync::handle_sync(args, &config).await {
                Ok(_) => Ok(()),
                Err(e) => {
                    tracing::error!("{}", e);
                    std::process::exit(1);
                }
            }
        }
    }
}
