//! # Per-Process Locks
//!
//! Serializes load-modify-save cycles on one key within an engine instance.
//! Distinct keys never contend. Guards must not be held across outbound sends.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// Entries beyond this count trigger pruning of idle locks.
const PRUNE_THRESHOLD: usize = 1024;

/// Registry of async locks keyed by process id or correlation id.
#[derive(Default)]
pub struct ProcessLocks {
    locks: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

/// Held while a process is being mutated.
pub struct ProcessGuard {
    _guard: OwnedMutexGuard<()>,
}

impl ProcessLocks {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `key`.
    pub async fn acquire(&self, key: &str) -> ProcessGuard {
        let lock = {
            let mut locks = self.locks.lock();
            if locks.len() > PRUNE_THRESHOLD {
                locks.retain(|_, lock| Arc::strong_count(lock) > 1);
            }
            locks
                .entry(key.to_string())
                .or_insert_with(|| Arc::new(AsyncMutex::new(())))
                .clone()
        };
        ProcessGuard {
            _guard: lock.lock_owned().await,
        }
    }

    /// Number of registered keys.
    pub fn len(&self) -> usize {
        self.locks.lock().len()
    }

    /// No keys registered.
    pub fn is_empty(&self) -> bool {
        self.locks.lock().is_empty()
    }
}
