//! Per-resource-key mutual exclusion for local preparation work.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use review_core::ResourceKey;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tokio_util::sync::CancellationToken;

use crate::error::{EngineError, EngineResult};

/// Lazily-populated map from resource key to an async mutex.
///
/// Lookups of existing keys only take the read side of the map lock, so
/// unrelated keys never queue behind each other here. Creation takes the
/// write side and re-checks before inserting.
#[derive(Debug, Default)]
pub struct ResourceLockRegistry {
    locks: RwLock<HashMap<ResourceKey, Arc<Mutex<()>>>>,
}

impl ResourceLockRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The mutex for `key`, created on first use. Every caller with an equal
    /// key receives the same mutex.
    pub fn lock_for(&self, key: &ResourceKey) -> Arc<Mutex<()>> {
        {
            let map = self.locks.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(lock) = map.get(key) {
                return Arc::clone(lock);
            }
        }

        let mut map = self.locks.write().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(map.entry(key.clone()).or_default())
    }

    /// Lock `key`, giving up if the run is cancelled first.
    pub async fn acquire(
        &self,
        key: &ResourceKey,
        cancel: &CancellationToken,
    ) -> EngineResult<OwnedMutexGuard<()>> {
        let lock = self.lock_for(key);
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(EngineError::Cancelled),
            guard = lock.lock_owned() => Ok(guard),
        }
    }

    /// Number of distinct keys seen so far.
    pub fn len(&self) -> usize {
        self.locks
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
