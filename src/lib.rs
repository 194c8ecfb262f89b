//! drcare-offline - offline cache interceptor for the DrCare appointment app.
//!
//! The interceptor mediates every request the app issues to its own origin
//! and a short allow-list of CDN hosts. It serves cache-first from three
//! partitions (static shell, API responses, images), writes successful
//! same-origin responses back, falls back to offline content when the
//! network is unreachable, and replays queued appointment requests on
//! background sync.
//!
//! # Example
//!
//! ```no_run
//! use drcare_offline::{
//!     HttpConfig, HttpFetcher, MemoryStore, Request, ServiceWorker, WorkerConfig,
//! };
//!
//! # async fn example() -> drcare_offline::Result<()> {
//! let config = WorkerConfig::default();
//! let fetcher = HttpFetcher::new(&config.origin, &HttpConfig::default())?;
//! let worker = ServiceWorker::new(config.clone(), MemoryStore::new(), fetcher);
//!
//! worker.install().await?;
//! worker.activate().await?;
//!
//! let outcome = worker.handle_fetch(Request::navigate(config.resolve("/")?)).await?;
//! println!("served from {}", outcome.source());
//! worker.settle().await;
//! # Ok(())
//! # }
//! ```

#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod error;
pub mod http;
pub mod network;
pub mod routing;
pub mod store;
pub mod sync;
pub mod worker;

// Re-export main types for convenience
pub use config::{AppConfig, HttpConfig, PathConfig, WorkerConfig};
pub use error::{Error, Result};
pub use http::{Destination, Request, RequestKey, RequestMode, Response, ResponseType};
pub use network::{Fetcher, HttpFetcher};
pub use routing::{Partition, Predicate, Router, RoutingRule};
pub use store::{CacheStore, DiskStore, MemoryStore};
pub use sync::SyncReport;
pub use worker::{Event, EventOutcome, FetchOutcome, ServiceWorker, offline_api_response};
