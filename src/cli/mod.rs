//! CLI host for the interceptor: drives lifecycle events against a disk-backed store.

mod output;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use url::Url;

use crate::config::SYNC_TAG;
use crate::{
    AppConfig, CacheStore, Destination, DiskStore, HttpFetcher, Request, RequestMode,
    ServiceWorker,
};

use output::{describe_outcome, describe_sync, partition_table};

/// Offline cache interceptor for the DrCare appointment app
#[derive(Parser, Debug)]
#[command(name = "drcare-sw")]
#[command(version)]
pub struct Cli {
    /// Config file (TOML). Defaults to the user config directory.
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Directory holding the cache partitions.
    #[arg(long, global = true, value_name = "DIR")]
    pub store: Option<PathBuf>,

    /// Application origin, e.g. https://drcare.example
    #[arg(long, global = true, value_name = "URL")]
    pub origin: Option<Url>,

    #[command(subcommand)]
    pub command: Command,
}

/// Lifecycle event to run.
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Pre-cache the app shell into the static partition
    Install,
    /// Delete partitions left over from older versions
    Activate,
    /// Intercept one request
    Fetch {
        /// Absolute URL or path relative to the origin
        url: String,
        /// Request destination: document, image or other
        #[arg(long, default_value = "other")]
        destination: Destination,
        /// HTTP method
        #[arg(long, default_value = "GET")]
        method: String,
        /// Write the response body to this file instead of stdout
        #[arg(long, value_name = "FILE")]
        output: Option<PathBuf>,
    },
    /// Replay queued API requests
    Sync {
        /// Sync tag
        #[arg(long, default_value = SYNC_TAG)]
        tag: String,
    },
    /// List partitions and their entry counts
    Partitions,
}

/// Resolves the effective configuration from the config file and CLI overrides.
///
/// # Errors
///
/// Returns an error if the config file exists but cannot be parsed.
pub fn resolve_config(cli: &Cli) -> crate::Result<AppConfig> {
    let path = cli.config.clone().unwrap_or_else(AppConfig::default_path);
    let mut config = AppConfig::load_or_default(&path)?;
    if let Some(origin) = &cli.origin {
        config.worker.origin = origin.clone();
    }
    if let Some(store) = &cli.store {
        config.paths.store_dir = store.clone();
    }
    Ok(config)
}

/// Runs one parsed command.
///
/// # Errors
///
/// Returns any error from configuration loading, the store, or the handler.
pub async fn execute(cli: Cli) -> crate::Result<()> {
    let config = resolve_config(&cli)?;
    log::debug!("Cache store at {}", config.paths.store_dir.display());

    let fetcher = HttpFetcher::new(&config.worker.origin, &config.http)?;
    let store = DiskStore::new(&config.paths.store_dir);
    let worker = ServiceWorker::new(config.worker.clone(), store, fetcher);

    match cli.command {
        Command::Install => {
            let count = worker.install().await?;
            println!("Cached {count} resource(s) in {}", config.worker.static_cache);
        }
        Command::Activate => {
            let deleted = worker.activate().await?;
            if deleted.is_empty() {
                println!("No old caches to delete");
            } else {
                println!("Deleted: {}", deleted.join(", "));
            }
        }
        Command::Fetch {
            url,
            destination,
            method,
            output,
        } => {
            let url = config.worker.resolve(&url)?;
            let request = Request::get(url.clone())
                .with_method(&method)
                .with_destination(destination);
            let request = if destination == Destination::Document {
                request.with_mode(RequestMode::Navigate)
            } else {
                request
            };

            let outcome = worker.handle_fetch(request).await?;
            eprintln!("{}", describe_outcome(url.as_str(), &outcome));
            if let Some(response) = outcome.response() {
                match output {
                    Some(path) => tokio::fs::write(path, &response.body).await?,
                    None => {
                        use tokio::io::AsyncWriteExt;
                        let mut stdout = tokio::io::stdout();
                        stdout.write_all(&response.body).await?;
                        stdout.flush().await?;
                    }
                }
            }
            worker.settle().await;
        }
        Command::Sync { tag } => {
            let report = worker.sync(&tag).await?;
            println!("{}", describe_sync(&tag, report.as_ref()));
        }
        Command::Partitions => {
            let store = worker.store();
            let mut rows = Vec::new();
            for name in store.partitions().await? {
                let count = store.len(&name).await?;
                rows.push((name, count));
            }
            if !rows.is_empty() {
                println!("{}", partition_table(&rows));
            }
        }
    }
    Ok(())
}

/// Parses process arguments and runs the command.
///
/// # Errors
///
/// See [`execute`].
pub async fn run() -> crate::Result<()> {
    execute(Cli::parse()).await
}
