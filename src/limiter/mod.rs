//! Per-pool bound on in-flight remote calls
//!
//! Every resource kind gets its own pool (keyed by kind name) so that fanning
//! out describe and log calls for one kind never bursts more than `capacity`
//! requests at the API server. Slots are held by a [`Permit`] and returned when
//! it is dropped, so a failing operation can never leak one.

use crate::error::{Result, SupportError};
use dashmap::DashMap;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::trace;

/// Default number of concurrent per-item operations for one kind
pub const DEFAULT_CAPACITY: usize = 5;

/// Counting gate keyed by pool name
#[derive(Debug)]
pub struct ConcurrencyLimiter {
    capacity: usize,
    pools: DashMap<String, Arc<Semaphore>>,
}

/// A held slot in one pool; dropping it frees the slot
#[derive(Debug)]
pub struct Permit {
    pool: String,
    _permit: OwnedSemaphorePermit,
}

impl Permit {
    pub fn pool(&self) -> &str {
        &self.pool
    }

    /// Give the slot back explicitly
    pub fn release(self) {
        trace!(pool = %self.pool, "released slot");
    }
}

impl ConcurrencyLimiter {
    /// A capacity of zero is treated as one
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            pools: DashMap::new(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn pool(&self, key: &str) -> Arc<Semaphore> {
        // Clone out of the entry so no map shard lock is held across an await
        self.pools
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(Semaphore::new(self.capacity)))
            .clone()
    }

    /// Wait for a free slot in `key`'s pool
    ///
    /// Waiters are served in arrival order, so none starves.
    pub async fn acquire(&self, key: &str) -> Result<Permit> {
        let permit = self
            .pool(key)
            .acquire_owned()
            .await
            .map_err(|_| SupportError::LimiterClosed(key.to_string()))?;
        trace!(pool = key, "acquired slot");

        Ok(Permit {
            pool: key.to_string(),
            _permit: permit,
        })
    }

    /// Run `operation` while holding a slot in `key`'s pool
    pub async fn run<F, T>(&self, key: &str, operation: F) -> Result<T>
    where
        F: Future<Output = T>,
    {
        let _permit = self.acquire(key).await?;
        Ok(operation.await)
    }

    /// Free slots in `key`'s pool
    pub fn available(&self, key: &str) -> usize {
        self.pools
            .get(key)
            .map(|pool| pool.available_permits())
            .unwrap_or(self.capacity)
    }
}

impl Default for ConcurrencyLimiter {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
