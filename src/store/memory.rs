//! In-memory cache store.

use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use super::CacheStore;
use crate::error::Result;
use crate::http::{Request, RequestKey, Response};

#[derive(Debug, Clone)]
struct Entry {
    key: RequestKey,
    request: Request,
    response: Response,
}

#[derive(Debug, Default)]
struct Partition {
    name: String,
    entries: Vec<Entry>,
}

/// Volatile store backed by a mutex-guarded list of partitions.
///
/// Used by tests and by hosts that do not need caches to survive restarts.
#[derive(Debug, Default)]
pub struct MemoryStore {
    partitions: Mutex<Vec<Partition>>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Partition>> {
        self.partitions.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn find<'a>(partitions: &'a mut Vec<Partition>, name: &str) -> Option<&'a mut Partition> {
    partitions.iter_mut().find(|p| p.name == name)
}

fn open_in<'a>(partitions: &'a mut Vec<Partition>, name: &str) -> &'a mut Partition {
    if let Some(index) = partitions.iter().position(|p| p.name == name) {
        &mut partitions[index]
    } else {
        partitions.push(Partition {
            name: name.to_string(),
            entries: Vec::new(),
        });
        let last = partitions.len() - 1;
        &mut partitions[last]
    }
}

#[async_trait]
impl CacheStore for MemoryStore {
    async fn partitions(&self) -> Result<Vec<String>> {
        Ok(self.lock().iter().map(|p| p.name.clone()).collect())
    }

    async fn open(&self, partition: &str) -> Result<()> {
        open_in(&mut self.lock(), partition);
        Ok(())
    }

    async fn delete_partition(&self, partition: &str) -> Result<bool> {
        let mut partitions = self.lock();
        let before = partitions.len();
        partitions.retain(|p| p.name != partition);
        Ok(partitions.len() != before)
    }

    async fn match_in(&self, partition: &str, key: &RequestKey) -> Result<Option<Response>> {
        Ok(find(&mut self.lock(), partition).and_then(|p| {
            p.entries
                .iter()
                .find(|e| &e.key == key)
                .map(|e| e.response.clone())
        }))
    }

    async fn put(&self, partition: &str, request: &Request, response: &Response) -> Result<()> {
        let mut partitions = self.lock();
        let target = open_in(&mut partitions, partition);
        let entry = Entry {
            key: request.key(),
            request: request.clone(),
            response: response.clone(),
        };
        target.entries.retain(|e| e.key != entry.key);
        target.entries.push(entry);
        Ok(())
    }

    async fn delete(&self, partition: &str, key: &RequestKey) -> Result<bool> {
        Ok(find(&mut self.lock(), partition).is_some_and(|p| {
            let before = p.entries.len();
            p.entries.retain(|e| &e.key != key);
            p.entries.len() != before
        }))
    }

    async fn requests(&self, partition: &str) -> Result<Vec<Request>> {
        Ok(find(&mut self.lock(), partition)
            .map(|p| p.entries.iter().map(|e| e.request.clone()).collect())
            .unwrap_or_default())
    }
}
