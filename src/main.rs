mod coords;
mod docs;
mod error;
mod geocode;
mod pipeline;
mod settings;
mod watch;

use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use tracing::warn;

use coords::is_maps_url;
use docs::api::GoogleDocsClient;
use docs::auth::{ServiceAccountKey, TokenSource};
use docs::writer::Archiver;
use docs::DocumentStore;
use error::ArchiveError;
use geocode::{Geocoder, GeocodingClient};
use pipeline::Report;
use settings::{Overrides, Settings};

#[derive(Parser)]
#[command(
    name = "streetview_archiver",
    about = "Archive Google Street View locations into a Google Doc, grouped by country and state"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Settings file (default: ./archiver.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Google Doc to append to
    #[arg(long, global = true)]
    document_id: Option<String>,

    /// Service-account key JSON
    #[arg(long, global = true)]
    credentials: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Archive a single Google Maps URL
    Archive { url: String },
    /// Wait for a Google Maps URL to be copied to the clipboard, then archive it
    Watch {
        /// Keep watching after the first URL instead of exiting
        #[arg(long)]
        continuous: bool,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();
    let settings = Settings::load(&Overrides {
        config_file: cli.config,
        document_id: cli.document_id,
        credentials_file: cli.credentials,
    })
    .context("Failed to load settings")?;

    let geocoder = GeocodingClient::new(
        &settings.geocode_endpoint,
        &settings.api_key,
        settings.request_timeout(),
    )
    .context("Failed to build geocoding client")?;

    let key = ServiceAccountKey::from_file(&settings.credentials_file)?;
    let docs = GoogleDocsClient::new(
        &settings.docs_endpoint,
        &settings.document_id,
        TokenSource::service_account(key),
        settings.request_timeout(),
    )
    .context("Failed to build Google Docs client")?;
    let mut archiver = Archiver::new(docs);

    match cli.command {
        Commands::Archive { url } => {
            if !is_maps_url(&url, &settings.maps_marker) {
                bail!("Not a Google Maps URL: {}", url);
            }
            run_one(&url, &geocoder, &mut archiver)?;
            Ok(())
        }
        Commands::Watch { continuous } => {
            println!("Waiting for a Google Maps URL to be copied to the clipboard...");
            let mut watcher =
                watch::ClipboardWatcher::new(&settings.maps_marker, settings.poll_interval())?;
            watcher.run(|url| {
                // A failed URL is reported by run_one and does not stop the watch.
                run_one(url, &geocoder, &mut archiver).ok();
                continuous
            })
        }
    }
}

fn run_one<G: Geocoder, S: DocumentStore>(
    url: &str,
    geocoder: &G,
    archiver: &mut Archiver<S>,
) -> Result<Report, ArchiveError> {
    println!("\nProcessing URL: {}", url);
    match pipeline::process(url, geocoder, archiver) {
        Ok(report) => {
            println!("{}", report);
            Ok(report)
        }
        Err(e) => {
            warn!(stage = e.stage(), "Failed to archive {}", url);
            println!("Error ({}): {}", e.stage(), e);
            Err(e)
        }
    }
}
