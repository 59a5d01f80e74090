//! post-relay CLI - forwards new profile posts to a webhook.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use relay::{
    BrowserSettings, BrowserSource, FileMarkerStore, LogNotifier, MarkerStore, MemoryMarkerStore,
    Notifier, Relay, RelayConfig, RunOutcome, WebhookNotifier,
};

/// Poll a profile page once and forward new posts to a webhook.
///
/// Required environment: ACCOUNT_IDENTIFIER, WEBHOOK_URL.
#[derive(Parser)]
#[command(name = "post-relay")]
#[command(about = "Forward new posts from a profile page to a webhook")]
#[command(version)]
pub struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Marker file path (overrides MARKER_PATH)
    #[arg(long)]
    marker_path: Option<PathBuf>,

    /// Fetch and diff only; log messages instead of sending them and leave the marker untouched
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose {
        EnvFilter::new("relay=debug,post_relay=debug,info")
    } else {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("relay=info,post_relay=info,warn"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    // Configuration errors end the run before any browser or HTTP client exists.
    let mut config = match RelayConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "Invalid configuration");
            return ExitCode::FAILURE;
        }
    };
    if let Some(path) = cli.marker_path {
        config.marker_path = path;
    }

    match run(config, cli.dry_run).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %format!("{e:#}"), "Relay run failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(config: RelayConfig, dry_run: bool) -> Result<()> {
    tracing::info!(
        account = %config.account,
        marker_path = %config.marker_path.display(),
        policy = %config.failure_policy,
        dry_run,
        "Starting post relay"
    );

    let file_store = FileMarkerStore::new(config.marker_path.clone());
    let source = Arc::new(BrowserSource::new(BrowserSettings::from_config(&config)));

    let notifier: Arc<dyn Notifier>;
    let store: Box<dyn MarkerStore>;
    if dry_run {
        notifier = Arc::new(LogNotifier);
        store = Box::new(MemoryMarkerStore::snapshot_of(&file_store)?);
    } else {
        notifier = Arc::new(
            WebhookNotifier::new(config.webhook_url.clone())
                .context("Failed to build webhook client")?,
        );
        store = Box::new(file_store);
    }

    let relay = Relay::new(config, source, notifier);
    let outcome = relay
        .run(&*store)
        .await
        .with_context(|| format!("Failed to relay posts for {}", relay.config().account))?;

    match outcome {
        RunOutcome::NoPosts => println!("No posts extracted."),
        RunOutcome::Bootstrapped { marker } => {
            println!("Initialised marker with {marker}; nothing sent on the first run.");
        }
        RunOutcome::UpToDate => println!("No new posts."),
        RunOutcome::Delivered(summary) => {
            println!("Sent: {}", summary.sent);
            if summary.failed > 0 {
                println!("Failed: {}", summary.failed);
            }
            if summary.pending > 0 {
                println!("Deferred to next run: {}", summary.pending);
            }
            if let Some(marker) = summary.marker {
                println!("Marker: {marker}");
            }
        }
    }

    Ok(())
}
