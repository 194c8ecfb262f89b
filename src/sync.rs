//! Background-sync replay of queued API requests.

use futures::{StreamExt, stream};

use crate::error::Result;
use crate::http::Request;
use crate::network::Fetcher;
use crate::store::CacheStore;

/// Outcome of one background-sync run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Entries replayed successfully and removed from the partition.
    pub replayed: usize,
    /// Entries whose replay failed; they stay queued for the next run.
    pub failed: usize,
}

impl SyncReport {
    /// Number of entries processed.
    #[must_use]
    pub const fn total(&self) -> usize {
        self.replayed + self.failed
    }

    /// True when nothing is left queued.
    #[must_use]
    pub const fn is_clean(&self) -> bool {
        self.failed == 0
    }
}

/// Replays one stored request. Returns whether it was delivered and dequeued.
async fn replay_one<S, F>(store: &S, fetcher: &F, partition: &str, request: Request) -> bool
where
    S: CacheStore + ?Sized,
    F: Fetcher + ?Sized,
{
    match fetcher.fetch(&request).await {
        Ok(response) if response.is_ok() => {
            match store.delete(partition, &request.key()).await {
                Ok(_) => {
                    log::info!("Synced {} {}", request.method, request.url);
                    true
                }
                Err(e) => {
                    log::warn!("Synced {} but could not dequeue it: {e}", request.url);
                    false
                }
            }
        }
        Ok(response) => {
            log::warn!(
                "Failed to sync {} {}: HTTP {}",
                request.method,
                request.url,
                response.status
            );
            false
        }
        Err(e) => {
            log::warn!("Failed to sync {} {}: {e}", request.method, request.url);
            false
        }
    }
}

/// Replays every request stored in `partition` against the network.
///
/// Delivered entries are deleted; failed ones are left in place. Individual
/// failures never abort the run, so delivery is at-least-once.
///
/// # Errors
///
/// Returns an error only if the partition cannot be enumerated.
pub async fn replay_partition<S, F>(
    store: &S,
    fetcher: &F,
    partition: &str,
    concurrency: usize,
) -> Result<SyncReport>
where
    S: CacheStore + ?Sized,
    F: Fetcher + ?Sized,
{
    let queued = store.requests(partition).await?;
    log::info!("Replaying {} queued request(s) from {partition}", queued.len());

    let results: Vec<bool> = stream::iter(queued)
        .map(|request| replay_one(store, fetcher, partition, request))
        .buffer_unordered(concurrency.max(1))
        .collect()
        .await;

    let replayed = results.iter().filter(|ok| **ok).count();
    Ok(SyncReport {
        replayed,
        failed: results.len() - replayed,
    })
}
