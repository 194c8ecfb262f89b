//! Configuration types for the offline cache interceptor.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::Result;
use crate::routing::Partition;

/// Version tag of the static shell partition.
pub const STATIC_CACHE_NAME: &str = "drcare-v1.1";
/// Name of the API response partition.
pub const API_CACHE_NAME: &str = "drcare-api-v1";
/// Name of the image partition.
pub const IMAGES_CACHE_NAME: &str = "drcare-images-v1";
/// Sync tag that triggers replay of queued appointment requests.
pub const SYNC_TAG: &str = "background-sync-appointments";

const DEFAULT_ORIGIN: &str = "http://localhost:5000";

const DEFAULT_PRECACHE: &[&str] = &[
    "/",
    "/offline.html",
    "/static/styles.css",
    "/static/manifest.json",
    "https://cdn.tailwindcss.com",
    "https://cdnjs.cloudflare.com/ajax/libs/font-awesome/6.0.0-beta3/css/all.min.css",
    "https://cdn.jsdelivr.net/npm/bootstrap@5.3.0/dist/css/bootstrap.min.css",
    "https://cdn.jsdelivr.net/npm/bootstrap-icons@1.10.0/font/bootstrap-icons.css",
    "https://fonts.googleapis.com/css2?family=Poppins:wght@300;400;500;600;700&display=swap",
];

const DEFAULT_ALLOWED_ORIGINS: &[&str] = &[
    "https://cdn.tailwindcss.com",
    "https://cdnjs.cloudflare.com",
    "https://cdn.jsdelivr.net",
    "https://fonts.googleapis.com",
    "https://fonts.gstatic.com",
];

fn default_origin() -> Url {
    Url::parse(DEFAULT_ORIGIN).expect("default origin literal")
}

/// Behaviour of the interceptor: partition names, manifest, origins and fallbacks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerConfig {
    /// Origin of the application the worker is installed for.
    pub origin: Url,
    /// Versioned static partition name.
    pub static_cache: String,
    /// API partition name.
    pub api_cache: String,
    /// Image partition name.
    pub images_cache: String,
    /// App shell manifest fetched at install. Relative entries resolve against `origin`.
    pub precache: Vec<String>,
    /// Cross-origin hosts whose requests are intercepted.
    pub allowed_origins: Vec<String>,
    /// Page served for failed navigations.
    pub offline_page: String,
    /// Image served for failed image loads.
    pub placeholder_image: String,
    /// Tag that triggers background sync.
    pub sync_tag: String,
    /// Maximum number of concurrent replays during background sync.
    pub sync_concurrency: usize,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            origin: default_origin(),
            static_cache: STATIC_CACHE_NAME.to_string(),
            api_cache: API_CACHE_NAME.to_string(),
            images_cache: IMAGES_CACHE_NAME.to_string(),
            precache: DEFAULT_PRECACHE.iter().map(ToString::to_string).collect(),
            allowed_origins: DEFAULT_ALLOWED_ORIGINS
                .iter()
                .map(ToString::to_string)
                .collect(),
            offline_page: "/offline.html".to_string(),
            placeholder_image: "/static/icons/placeholder.png".to_string(),
            sync_tag: SYNC_TAG.to_string(),
            sync_concurrency: 4,
        }
    }
}

impl WorkerConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the application origin.
    #[must_use]
    pub fn with_origin(mut self, origin: Url) -> Self {
        self.origin = origin;
        self
    }

    /// Replaces the install manifest.
    #[must_use]
    pub fn with_precache<I, S>(mut self, urls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.precache = urls.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the static partition version tag.
    #[must_use]
    pub fn with_static_cache(mut self, name: impl Into<String>) -> Self {
        self.static_cache = name.into();
        self
    }

    /// Sets the replay concurrency for background sync.
    #[must_use]
    pub const fn with_sync_concurrency(mut self, concurrency: usize) -> Self {
        self.sync_concurrency = concurrency;
        self
    }

    /// Resolves a manifest or fallback path against the origin.
    ///
    /// # Errors
    ///
    /// Returns an error if the result is not a valid URL.
    pub fn resolve(&self, path: &str) -> Result<Url> {
        Ok(self.origin.join(path)?)
    }

    /// Resolves every manifest entry.
    ///
    /// # Errors
    ///
    /// Returns the first entry that does not resolve.
    pub fn precache_urls(&self) -> Result<Vec<Url>> {
        self.precache.iter().map(|p| self.resolve(p)).collect()
    }

    /// Whether requests to `origin` are intercepted.
    #[must_use]
    pub fn is_intercepted_origin(&self, origin: &str) -> bool {
        let own = self.origin.origin().ascii_serialization();
        origin == own
            || self
                .allowed_origins
                .iter()
                .any(|o| o.trim_end_matches('/') == origin)
    }

    /// Name of the store partition backing `partition`.
    #[must_use]
    pub fn partition_name(&self, partition: Partition) -> &str {
        match partition {
            Partition::Static => &self.static_cache,
            Partition::Api => &self.api_cache,
            Partition::Images => &self.images_cache,
        }
    }

    /// Partition names that survive activation.
    #[must_use]
    pub fn retained_partitions(&self) -> [&str; 2] {
        [&self.static_cache, &self.api_cache]
    }
}

/// HTTP client settings for the network fetcher.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Per-request timeout in seconds. `None` leaves the client default.
    pub request_timeout_secs: Option<u64>,
    /// Optional `User-Agent` override.
    pub user_agent: Option<String>,
}

/// Filesystem locations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathConfig {
    /// Directory holding one subdirectory per cache partition.
    pub store_dir: PathBuf,
}

impl Default for PathConfig {
    fn default() -> Self {
        let data_dir = dirs::data_dir().unwrap_or_else(|| PathBuf::from("."));
        Self {
            store_dir: data_dir.join("drcare-offline").join("caches"),
        }
    }
}

/// Complete application configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Interceptor behaviour.
    pub worker: WorkerConfig,
    /// Network client settings.
    pub http: HttpConfig,
    /// Filesystem locations.
    pub paths: PathConfig,
}

impl AppConfig {
    /// Creates a new config with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Default location of the config file.
    #[must_use]
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("drcare-offline")
            .join("config.toml")
    }

    /// Loads configuration from a TOML file. Missing keys take defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&text)?)
    }

    /// Loads `path` if it exists, otherwise returns defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            log::debug!("Loading config from {}", path.display());
            Self::load(path)
        } else {
            log::debug!("No config at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }
}
