use anyhow::{Context, Result};
use clap::Parser;
use sightline_core::{CancellationToken, Settings};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

mod commands;

use commands::Commands;

#[derive(Debug, Parser)]
#[command(name = "sightline")]
#[command(about = "Image transforms, cloud OCR and intent detection")]
#[command(version)]
pub struct Cli {
    /// Settings file; defaults to the platform config directory
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
    /// Per-request timeout in seconds, overriding the settings file
    #[arg(long, global = true)]
    timeout: Option<u64>,
    #[command(subcommand)]
    command: Commands,
}

fn load_settings(explicit: Option<&PathBuf>) -> Result<Settings> {
    let settings = match explicit {
        Some(path) => Settings::load(path).with_context(|| format!("Failed to load {}", path.display()))?,
        None => match directories::ProjectDirs::from("com", "sightline", "Sightline") {
            Some(dirs) => {
                let path = dirs.config_dir().join("config.toml");
                Settings::load_or_default(&path)
                    .with_context(|| format!("Failed to load {}", path.display()))?
            }
            None => Settings::default(),
        },
    };
    Ok(settings.with_env_overrides())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let settings = load_settings(cli.config.as_ref())?;

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupted, cancelling in-flight request");
            on_interrupt.cancel();
        }
    });

    let mut call = settings.call_options().with_cancel(cancel);
    if let Some(secs) = cli.timeout {
        call = call.with_timeout(Duration::from_secs(secs));
    }

    commands::run(cli.command, &settings, &call).await
}
