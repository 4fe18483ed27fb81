//! Per-fingerprint async locks.
//!
//! Fetches of the same fingerprint queue behind one another so only the first
//! reaches the network; the rest find the entry it wrote. Unrelated
//! fingerprints never contend. Idle locks are dropped from the table when
//! their last guard goes away.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use super::request::Fingerprint;

type LockTable = Mutex<HashMap<Fingerprint, Arc<AsyncMutex<()>>>>;

#[derive(Debug, Default)]
pub struct KeyLocks {
    table: Arc<LockTable>,
}

impl KeyLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn lock(&self, key: &Fingerprint) -> KeyGuard {
        let lock = {
            let mut table = self.table.lock().unwrap_or_else(|e| e.into_inner());
            Arc::clone(table.entry(key.clone()).or_default())
        };
        let guard = lock.lock_owned().await;
        KeyGuard {
            key: key.clone(),
            table: Arc::clone(&self.table),
            guard: Some(guard),
        }
    }

    /// Number of fingerprints with a live lock.
    #[cfg(test)]
    pub fn active(&self) -> usize {
        self.table.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

pub struct KeyGuard {
    key: Fingerprint,
    table: Arc<LockTable>,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for KeyGuard {
    fn drop(&mut self) {
        // Release the async lock before inspecting the count so a waiter's
        // clone is the only other reference left.
        drop(self.guard.take());
        let mut table = self.table.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(lock) = table.get(&self.key) {
            if Arc::strong_count(lock) == 1 {
                table.remove(&self.key);
            }
        }
    }
}
