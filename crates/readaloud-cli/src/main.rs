use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use readaloud_core::{AppConfig, NarrationBackend};

mod commands;

#[derive(Parser)]
#[command(name = "readaloud")]
#[command(author, version, about = "Reveal a document word by word and read it aloud")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Configuration file (defaults to ~/.config/readaloud/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Narration backend: simulated or command
    #[arg(short, long, global = true)]
    backend: Option<NarrationBackend>,
}

#[derive(Subcommand)]
enum Commands {
    /// Open a document in the terminal reader
    Run {
        /// Text file to read
        file: Option<PathBuf>,
    },
    /// Print a document word by word to stdout ("-" reads stdin)
    Reveal {
        /// Text file to reveal
        file: PathBuf,
        /// Narrate the document while it is revealed
        #[arg(short, long)]
        speak: bool,
    },
    /// List the voices offered by the narration backend
    Voices,
    /// Show the configuration file path and effective settings
    Config {
        /// Write a default configuration file if none exists
        #[arg(long)]
        init: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = cli.config.clone().unwrap_or_else(AppConfig::config_path);
    let mut config = AppConfig::load_from(&config_path)
        .with_context(|| format!("Failed to load {}", config_path.display()))?;
    if let Some(backend) = cli.backend {
        config.narration.backend = backend;
    }

    // The TUI owns the terminal, so its logs go to a file
    let log_to_file = matches!(cli.command, Some(Commands::Run { .. }) | None);
    init_logging(&config, log_to_file)?;

    let config = Arc::new(config);

    match cli.command {
        Some(Commands::Run { file }) => commands::run::run(config, file).await,
        None => commands::run::run(config, None).await,
        Some(Commands::Reveal { file, speak }) => commands::reveal::run(&config, &file, speak).await,
        Some(Commands::Voices) => commands::voices::run(&config).await,
        Some(Commands::Config { init }) => commands::config::run(&config, &config_path, init),
    }
}

fn init_logging(config: &AppConfig, log_to_file: bool) -> Result<()> {
    let filter = EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| config.general.log_level.clone()),
    );

    if log_to_file {
        let log_path = config.log_path();
        if let Some(parent) = log_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_path)
            .with_context(|| format!("Failed to open log file {}", log_path.display()))?;

        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(false)
                    .with_ansi(false)
                    .with_writer(Mutex::new(file)),
            )
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    }

    Ok(())
}
