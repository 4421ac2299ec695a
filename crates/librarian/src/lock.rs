//! Per-key serialization of long-running operations.
//!
//! Analyses are serialized per paper id and reconciliations per scanned folder. Work on
//! different keys proceeds in parallel. A guard is held across `.await` points, so the
//! per-key lock is an async mutex; the map of keys itself is only touched briefly.

use std::{collections::HashMap, hash::Hash, sync::Mutex};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use super::*;

/// A set of async locks addressed by key.
#[derive(Debug)]
pub struct KeyedLocks<K> {
  /// One lock per key ever requested
  locks: Mutex<HashMap<K, Arc<AsyncMutex<()>>>>,
}

impl<K> Default for KeyedLocks<K> {
  fn default() -> Self { Self { locks: Mutex::new(HashMap::new()) } }
}

impl<K: Eq + Hash + Clone> KeyedLocks<K> {
  /// Creates an empty lock set.
  pub fn new() -> Self { Self::default() }

  /// Waits until the lock for `key` is free and takes it.
  ///
  /// The lock is released when the returned guard is dropped.
  pub async fn lock(&self, key: K) -> OwnedMutexGuard<()> {
    let lock = {
      let mut locks = self.locks.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
      // drop entries nobody holds or waits for
      locks.retain(|_, lock| Arc::strong_count(lock) > 1);
      Arc::clone(locks.entry(key).or_default())
    };
    lock.lock_owned().await
  }
}

#[cfg(test)]
mod tests {
  use std::time::Duration;

  use super::*;

  #[tokio::test]
  async fn test_same_key_is_serialized() {
    let locks = Arc::new(KeyedLocks::new());
    let guard = locks.lock(1).await;

    let waiter = {
      let locks = Arc::clone(&locks);
      tokio::spawn(async move {
        let _guard = locks.lock(1).await;
      })
    };
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(!waiter.is_finished());

    drop(guard);
    tokio::time::timeout(Duration::from_secs(5), waiter).await.unwrap().unwrap();
  }

  #[tokio::test]
  async fn test_different_keys_are_independent() {
    let locks = KeyedLocks::new();
    let _first = locks.lock("a".to_string()).await;
    let second = tokio::time::timeout(Duration::from_secs(1), locks.lock("b".to_string())).await;
    assert!(second.is_ok());
  }
}
