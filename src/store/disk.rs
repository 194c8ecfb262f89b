//! Persistent cache store on the local filesystem.
//!
//! Layout under the root directory:
//!
//! ```text
//! partitions.json          partition names, oldest first
//! <partition>/<sha256>.json one file per entry, keyed by the request key hash
//! ```
//!
//! Writes go to a temporary file that is renamed into place, so readers never
//! observe a half-written entry.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tokio::sync::Mutex;
use url::Url;

use super::CacheStore;
use crate::error::{Error, Result};
use crate::http::{Destination, Request, RequestKey, RequestMode, Response, ResponseType};

const INDEX_FILE: &str = "partitions.json";

#[derive(Debug, Serialize, Deserialize)]
struct StoredRequest {
    method: String,
    url: String,
    destination: Destination,
    mode: RequestMode,
    headers: Vec<(String, String)>,
    body: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct StoredResponse {
    status: u16,
    status_text: String,
    headers: Vec<(String, String)>,
    body: String,
    kind: ResponseType,
}

#[derive(Debug, Serialize, Deserialize)]
struct StoredEntry {
    key: RequestKey,
    request: StoredRequest,
    response: StoredResponse,
    stored_at: DateTime<Utc>,
}

impl StoredEntry {
    fn new(request: &Request, response: &Response) -> Self {
        Self {
            key: request.key(),
            request: StoredRequest {
                method: request.method.clone(),
                url: request.url.to_string(),
                destination: request.destination,
                mode: request.mode,
                headers: request.headers.clone(),
                body: request.body.as_ref().map(|b| BASE64.encode(b)),
            },
            response: StoredResponse {
                status: response.status,
                status_text: response.status_text.clone(),
                headers: response.headers.clone(),
                body: BASE64.encode(&response.body),
                kind: response.kind,
            },
            stored_at: Utc::now(),
        }
    }

    fn request(&self) -> Result<Request> {
        let stored = &self.request;
        let body = match &stored.body {
            Some(b) => Some(bytes::Bytes::from(decode(b)?)),
            None => None,
        };
        Ok(Request {
            method: stored.method.clone(),
            url: Url::parse(&stored.url)?,
            destination: stored.destination,
            mode: stored.mode,
            headers: stored.headers.clone(),
            body,
        })
    }

    fn response(&self) -> Result<Response> {
        let stored = &self.response;
        Ok(Response {
            status: stored.status,
            status_text: stored.status_text.clone(),
            headers: stored.headers.clone(),
            body: decode(&stored.body)?.into(),
            kind: stored.kind,
        })
    }
}

fn decode(data: &str) -> Result<Vec<u8>> {
    BASE64
        .decode(data)
        .map_err(|e| Error::Corrupt(format!("invalid body encoding: {e}")))
}

/// File name for an entry: hex SHA-256 of the key's display form.
fn entry_file_name(key: &RequestKey) -> String {
    let digest = Sha256::digest(key.to_string().as_bytes());
    format!("{digest:x}.json")
}

/// Rejects partition names that would escape the root directory.
fn check_partition_name(name: &str) -> Result<()> {
    let valid = !name.is_empty()
        && name != "."
        && name != ".."
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_'));
    if valid {
        Ok(())
    } else {
        Err(Error::Corrupt(format!("invalid partition name '{name}'")))
    }
}

async fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    let tmp_path = path.with_extension("json.tmp");
    tokio::fs::write(&tmp_path, contents).await?;
    tokio::fs::rename(&tmp_path, path).await?;
    Ok(())
}

/// Cache store persisted as JSON files under a root directory.
#[derive(Debug)]
pub struct DiskStore {
    root: PathBuf,
    // Serialises index updates and entry writes.
    lock: Mutex<()>,
}

impl DiskStore {
    /// Creates a store rooted at `root`. The directory is created on first write.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            lock: Mutex::new(()),
        }
    }

    /// Root directory of the store.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn index_path(&self) -> PathBuf {
        self.root.join(INDEX_FILE)
    }

    fn partition_dir(&self, partition: &str) -> PathBuf {
        self.root.join(partition)
    }

    async fn read_index(&self) -> Result<Vec<String>> {
        match tokio::fs::read(self.index_path()).await {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn write_index(&self, names: &[String]) -> Result<()> {
        tokio::fs::create_dir_all(&self.root).await?;
        write_atomic(&self.index_path(), &serde_json::to_vec_pretty(names)?).await
    }

    /// Registers and creates a partition. Caller holds `self.lock`.
    async fn ensure_partition(&self, partition: &str) -> Result<()> {
        check_partition_name(partition)?;
        let mut names = self.read_index().await?;
        if !names.iter().any(|n| n == partition) {
            log::debug!("Creating cache partition {partition}");
            names.push(partition.to_string());
            self.write_index(&names).await?;
        }
        tokio::fs::create_dir_all(self.partition_dir(partition)).await?;
        Ok(())
    }

    async fn read_entry(path: &Path) -> Result<Option<StoredEntry>> {
        match tokio::fs::read(path).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn entries(&self, partition: &str) -> Result<Vec<StoredEntry>> {
        check_partition_name(partition)?;
        let dir = self.partition_dir(partition);
        let mut read_dir = match tokio::fs::read_dir(&dir).await {
            Ok(rd) => rd,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut entries = Vec::new();
        while let Some(item) = read_dir.next_entry().await? {
            let path = item.path();
            if path.extension().is_none_or(|ext| ext != "json") {
                continue;
            }
            match Self::read_entry(&path).await {
                Ok(Some(entry)) => entries.push(entry),
                Ok(None) => {}
                Err(e) => log::warn!("Skipping unreadable cache entry {}: {e}", path.display()),
            }
        }
        entries.sort_by_key(|e| e.stored_at);
        Ok(entries)
    }
}

#[async_trait]
impl CacheStore for DiskStore {
    async fn partitions(&self) -> Result<Vec<String>> {
        self.read_index().await
    }

    async fn open(&self, partition: &str) -> Result<()> {
        let _guard = self.lock.lock().await;
        self.ensure_partition(partition).await
    }

    async fn delete_partition(&self, partition: &str) -> Result<bool> {
        check_partition_name(partition)?;
        let _guard = self.lock.lock().await;
        let mut names = self.read_index().await?;
        let before = names.len();
        names.retain(|n| n != partition);
        if names.len() == before {
            return Ok(false);
        }
        self.write_index(&names).await?;
        match tokio::fs::remove_dir_all(self.partition_dir(partition)).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
        Ok(true)
    }

    async fn match_in(&self, partition: &str, key: &RequestKey) -> Result<Option<Response>> {
        check_partition_name(partition)?;
        let path = self.partition_dir(partition).join(entry_file_name(key));
        match Self::read_entry(&path).await? {
            Some(entry) if &entry.key == key => Ok(Some(entry.response()?)),
            Some(entry) => Err(Error::Corrupt(format!(
                "{} holds {} instead of {key}",
                path.display(),
                entry.key
            ))),
            None => Ok(None),
        }
    }

    async fn put(&self, partition: &str, request: &Request, response: &Response) -> Result<()> {
        let _guard = self.lock.lock().await;
        self.ensure_partition(partition).await?;
        let entry = StoredEntry::new(request, response);
        let path = self.partition_dir(partition).join(entry_file_name(&entry.key));
        write_atomic(&path, &serde_json::to_vec(&entry)?).await
    }

    async fn delete(&self, partition: &str, key: &RequestKey) -> Result<bool> {
        check_partition_name(partition)?;
        let _guard = self.lock.lock().await;
        let path = self.partition_dir(partition).join(entry_file_name(key));
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn requests(&self, partition: &str) -> Result<Vec<Request>> {
        let requests = self
            .entries(partition)
            .await?
            .iter()
            .filter_map(|entry| match entry.request() {
                Ok(request) => Some(request),
                Err(e) => {
                    log::warn!("Skipping unusable cache entry {}: {e}", entry.key);
                    None
                }
            })
            .collect();
        Ok(requests)
    }

    async fn len(&self, partition: &str) -> Result<usize> {
        Ok(self.entries(partition).await?.len())
    }
}
