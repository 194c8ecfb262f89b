//! Cache partition storage abstraction.
//!
//! A store holds named partitions, each mapping a [`RequestKey`] to the
//! request it was stored under and a response snapshot. Partitions are kept
//! in creation order, which is the order [`CacheStore::match_any`] searches.

mod disk;
mod memory;

use async_trait::async_trait;

use crate::error::Result;
use crate::http::{Request, RequestKey, Response};

pub use disk::DiskStore;
pub use memory::MemoryStore;

/// Abstraction over the cache partitions the worker reads and writes.
///
/// Implementations must be internally synchronised; concurrent writers to
/// the same key resolve last-writer-wins.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Names of all existing partitions, oldest first.
    async fn partitions(&self) -> Result<Vec<String>>;

    /// Creates `partition` if it does not exist yet.
    async fn open(&self, partition: &str) -> Result<()>;

    /// Deletes `partition` and all its entries. Returns whether it existed.
    async fn delete_partition(&self, partition: &str) -> Result<bool>;

    /// Looks up `key` in one partition.
    async fn match_in(&self, partition: &str, key: &RequestKey) -> Result<Option<Response>>;

    /// Stores `response` under `request`, creating the partition if needed.
    /// An existing entry with the same key is replaced.
    async fn put(&self, partition: &str, request: &Request, response: &Response) -> Result<()>;

    /// Removes one entry. Returns whether it existed.
    async fn delete(&self, partition: &str, key: &RequestKey) -> Result<bool>;

    /// Requests stored in `partition`, in storage order. Empty if the
    /// partition does not exist.
    async fn requests(&self, partition: &str) -> Result<Vec<Request>>;

    /// Looks up `key` across every partition, oldest partition first.
    async fn match_any(&self, key: &RequestKey) -> Result<Option<Response>> {
        for name in self.partitions().await? {
            if let Some(response) = self.match_in(&name, key).await? {
                return Ok(Some(response));
            }
        }
        Ok(None)
    }

    /// Number of entries in `partition`.
    async fn len(&self, partition: &str) -> Result<usize> {
        Ok(self.requests(partition).await?.len())
    }
}
