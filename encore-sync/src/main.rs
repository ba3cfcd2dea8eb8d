//! encore-sync - Encore catalog mirror
//!
//! `sync` (the default) exits 0 when anything changed, 78 when the run found
//! nothing new so downstream automation can skip, and 1 on a fatal error.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{error, info, warn};

use encore_sync::config::{CliOverrides, SyncSettings};
use encore_sync::services::manifest_builder::ManifestBuilder;
use encore_sync::services::{EncoreClient, WebpTranscoder};
use encore_sync::workflow::run_coordinator::EXIT_FATAL;
use encore_sync::{build_coordinator, build_enricher};

/// Command-line arguments for encore-sync
#[derive(Parser, Debug)]
#[command(name = "encore-sync")]
#[command(about = "Mirror the Encore character catalog, portraits and voice lines")]
#[command(version)]
struct Cli {
    /// Config file (default: ENCORE_SYNC_CONFIG, ./encore-sync.toml, user config dir)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Data root holding data/ and voices/
    #[arg(short, long, global = true)]
    data_root: Option<PathBuf>,

    /// Catalog API origin
    #[arg(long, global = true)]
    api_origin: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    /// Ingest new characters, refresh voices and rebuild the manifest
    Sync,
    /// Re-fetch every character record and portrait
    FetchAll,
    /// Rebuild the voice manifest only
    Manifest,
    /// Add upgrade materials and their icons to characters.json
    Enrich,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let code = match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            error!("{:#}", e);
            eprintln!("encore-sync: {:#}", e);
            EXIT_FATAL
        }
    };

    std::process::exit(code);
}

async fn run(cli: Cli) -> Result<i32> {
    let loaded = encore_common::config::load_config(cli.config.as_deref())
        .context("Failed to load configuration")?;
    let toml_config = loaded.config;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&toml_config.logging.level)),
        )
        .init();

    info!(
        "Starting encore-sync v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );
    match &loaded.source {
        Some(path) => info!("Configuration: {}", path.display()),
        None => warn!("No configuration file found, using compiled defaults"),
    }

    let overrides = CliOverrides {
        data_root: cli.data_root,
        api_origin: cli.api_origin,
    };
    let settings = SyncSettings::resolve(&toml_config, &overrides)?;
    info!("Data root: {}", settings.layout.root().display());

    let command = cli.command.unwrap_or(Command::Sync);

    if command == Command::Manifest {
        let layout = settings.layout.clone();
        let manifest =
            tokio::task::spawn_blocking(move || ManifestBuilder::new(layout).build_and_write())
                .await??;
        info!("Manifest lists {} files", manifest.files.len());
        return Ok(0);
    }

    let catalog = Arc::new(
        EncoreClient::new(settings.client.clone()).context("Failed to build HTTP client")?,
    );
    let transcoder = Arc::new(WebpTranscoder);

    match command {
        Command::Sync => {
            let coordinator = build_coordinator(&settings, catalog, transcoder);
            let summary = coordinator.run().await?;
            info!("{}", summary.report.display_string());
            for (character_id, task) in summary.report.failures() {
                info!(character_id, target = %task.target(), "Failed: {:?}", task);
            }
            info!(
                "Run outcome {:?} (exit {})",
                summary.outcome,
                summary.outcome.exit_code()
            );
            Ok(summary.outcome.exit_code())
        }
        Command::FetchAll => {
            let coordinator = build_coordinator(&settings, catalog, transcoder);
            let report = coordinator.refresh_all().await?;
            info!("{}", report.display_string());
            Ok(0)
        }
        Command::Enrich => {
            let enricher = build_enricher(&settings, catalog, transcoder);
            let report = enricher.enrich().await?;
            info!("{}", report.display_string());
            Ok(0)
        }
        Command::Manifest => Ok(0),
    }
}
