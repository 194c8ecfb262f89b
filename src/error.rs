//! Error types for the drcare-offline library.

use thiserror::Error;

/// Errors that can occur while handling lifecycle events.
#[derive(Error, Debug)]
pub enum Error {
    /// HTTP transport error from the network fetcher.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The network could not be reached (offline, DNS failure, refused).
    #[error("Network request failed: {0}")]
    Network(String),

    /// I/O error from a persistent cache store.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A stored cache entry could not be encoded or decoded.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration file could not be parsed.
    #[error("Config parse error: {0}")]
    Config(#[from] toml::de::Error),

    /// A URL could not be parsed or resolved against the origin.
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// A manifest entry could not be fetched during install.
    #[error("Install failed for {url}: {reason}")]
    Install {
        /// URL of the manifest entry that failed.
        url: String,
        /// Why it failed.
        reason: String,
    },

    /// The offline fallback for a failed request is not in any partition.
    #[error("No cached fallback for {0}")]
    FallbackMissing(String),

    /// A stored entry is present but unusable.
    #[error("Corrupt cache entry: {0}")]
    Corrupt(String),
}

/// A specialized `Result` type for drcare-offline operations.
pub type Result<T> = std::result::Result<T, Error>;
