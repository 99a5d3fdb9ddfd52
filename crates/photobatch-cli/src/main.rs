//! Photobatch CLI: classify, rename and publish photo folders.
//!
//! Reads configuration from the environment (or `.env`); see `Config::from_env`.

use anyhow::Context;
use clap::{Parser, Subcommand};
use photobatch_cli::{init_tracing, load_batch};
use photobatch_core::{Config, StoreBackend};
use photobatch_processing::FolderClassifier;
use photobatch_services::{BatchOrchestrator, BatchRequest, FolderTools, TracingProgress};
use photobatch_storage::create_store;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

#[derive(Parser)]
#[command(name = "photobatch", about = "Photo batch classification and publishing")]
struct Cli {
    /// Use a local directory as the remote store (overrides LOCAL_STORE_PATH)
    #[arg(long, global = true)]
    store_path: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze folders and codes without touching anything
    Preview {
        /// Article folder name
        #[arg(long)]
        article: String,
        /// Comma-separated product codes
        #[arg(long)]
        codes: String,
        /// Directories to read
        #[arg(required = true)]
        dirs: Vec<PathBuf>,
    },
    /// Rename, convert and publish folders
    Process {
        /// Article folder name
        #[arg(long)]
        article: String,
        /// Comma-separated product codes
        #[arg(long)]
        codes: String,
        /// Ignore non-image files instead of failing their folder
        #[arg(long)]
        only_images: bool,
        /// Directories to read
        #[arg(required = true)]
        dirs: Vec<PathBuf>,
    },
    /// List the country folders under the remote root
    Countries,
    /// Create an article folder in several countries
    CreateFolders {
        /// Article folder name
        #[arg(long)]
        name: String,
        /// Country folder names
        #[arg(long, value_delimiter = ',', required = true)]
        countries: Vec<String>,
    },
    /// Collect every photo of an article into one ZIP
    Gather {
        /// Country folder name
        #[arg(long)]
        country: String,
        /// Article folder name
        #[arg(long)]
        folder: String,
    },
}

fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(value).context("Serialize response")?;
    println!("{}", out);
    Ok(())
}

fn load_config(store_path: Option<PathBuf>) -> anyhow::Result<Config> {
    let mut config = Config::from_env().context("Failed to load configuration")?;
    if let Some(path) = store_path {
        config.store_backend = StoreBackend::Local;
        config.local_store_path = Some(path);
    }
    Ok(config)
}

/// Cancel the batch on Ctrl-C; folders already started still finish.
fn cancel_on_ctrl_c() -> CancellationToken {
    let token = CancellationToken::new();
    let child = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, cancelling remaining folders");
            child.cancel();
        }
    });
    token
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    if let Commands::Preview {
        article,
        codes,
        dirs,
    } = &cli.command
    {
        let batch = load_batch(dirs)?;
        tracing::info!(article = %article, folders = batch.len(), "Preview");
        print_json(&FolderClassifier::analyze(&batch, codes))?;
        return Ok(());
    }

    let config = load_config(cli.store_path)?;
    let store = create_store(&config)
        .await
        .context("Failed to initialize remote store")?;
    tracing::info!(
        backend = %store.backend_type(),
        root = %config.remote_root.display_path(),
        environment = %config.environment,
        "Store ready"
    );
    let progress = Arc::new(TracingProgress);

    match cli.command {
        Commands::Preview { .. } => {}
        Commands::Process {
            article,
            codes,
            only_images,
            dirs,
        } => {
            let request = BatchRequest {
                article,
                codes,
                batch: load_batch(&dirs)?,
                only_images,
            };
            let orchestrator = BatchOrchestrator::new(store, &config, progress);
            let report = orchestrator
                .process_batch(request, cancel_on_ctrl_c())
                .await?;
            print_json(&report)?;
        }
        Commands::Countries => {
            let report = FolderTools::new(store, &config, progress)
                .list_countries()
                .await?;
            print_json(&report)?;
        }
        Commands::CreateFolders { name, countries } => {
            let report = FolderTools::new(store, &config, progress)
                .create_article_folders(&name, &countries)
                .await?;
            print_json(&report)?;
        }
        Commands::Gather { country, folder } => {
            let report = FolderTools::new(store, &config, progress)
                .gather_photos(&country, &folder)
                .await?;
            print_json(&report)?;
        }
    }

    Ok(())
}
