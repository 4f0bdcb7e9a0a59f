use clap::{ArgAction, Parser};
use indicatif::MultiProgress;
use std::process::ExitCode;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn, Level};
use tracing_subscriber::EnvFilter;

mod catalog;
mod download;
mod error;
mod settings;
mod utils;

use catalog::snap::SnapCatalog;
use download::{download_all, Coordinator, HttpAssetFetcher, Summary};
use error::Error;
use settings::{load_settings, Overrides, DEFAULT_CONFIG_FILE};
use utils::http::build_client;
use utils::images::CanonicalFormat;
use utils::progress::IndicatifWriter;

/// Download Marvel SNAP card, variant and location art
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Path where to save the images
    #[arg(short, long)]
    path: Option<String>,

    /// Number of images to download concurrently
    #[arg(short, long)]
    threads: Option<usize>,

    /// Image format every download is converted to
    #[arg(short, long, value_enum)]
    format: Option<CanonicalFormat>,

    /// Configuration file, ignored when missing
    #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
    config: String,

    /// Sets the level of verbosity
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    let progress = MultiProgress::new();
    init_tracing(args.verbose, &progress);

    match run(args, progress).await {
        Ok(total) => {
            println!("Total: {}", total);
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: u8, progress: &MultiProgress) {
    let log_level = match verbose {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(log_level.into())
                .from_env_lossy(),
        )
        .with_writer(IndicatifWriter::new(progress.clone()))
        .init();
}

async fn run(args: Args, progress: MultiProgress) -> Result<Summary, Error> {
    let overrides = Overrides {
        root: args.path,
        concurrency: args.threads,
        format: args.format,
    };
    let settings = load_settings(&args.config, &overrides)?;
    info!(
        root = %settings.root.display(),
        concurrency = settings.concurrency,
        format = ?settings.format,
        "Starting"
    );

    let client = build_client(
        &settings.user_agent,
        Duration::from_secs(settings.request_timeout_secs),
    )?;
    let catalog = SnapCatalog::new(&client, &settings.cards_url, &settings.locations_url);

    let cancel = CancellationToken::new();
    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_err() {
                return;
            }
            warn!("Interrupted, waiting for running downloads. Press Ctrl-C again to abort");
            cancel.cancel();
            if tokio::signal::ctrl_c().await.is_ok() {
                error!("Aborted");
                std::process::exit(130);
            }
        }
    });

    let coordinator = Coordinator::new(HttpAssetFetcher::new(client.clone()), settings.concurrency)
        .with_cancellation(cancel);

    let total = download_all(
        &settings.root,
        settings.format,
        catalog.entries(),
        &coordinator,
        &progress,
    )
    .await?;
    Ok(total)
}
