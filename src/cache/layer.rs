//! Cache layer that orchestrates caching logic with network fetching.

use chrono::{Duration, Utc};
use color_eyre::Result;
use serde::{de::DeserializeOwned, Serialize};
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};

use super::traits::{CacheResult, CacheStorage};

/// Read-through cache keyed by query key.
///
/// Fresh entries are served without touching the network. Stale or
/// missing entries fetch through a per-key async lock, so concurrent
/// readers of the same key share a single in-flight request: whoever
/// wins the lock fetches and stores, and the waiters pick up the
/// stored result when they re-check the cache.
pub struct CacheLayer<S: CacheStorage> {
  storage: Arc<S>,
  /// How long before cached data is considered stale
  stale_time: Duration,
  /// One async lock per key, shared across clones; at most one fetch
  /// per key is in flight
  locks: Arc<Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>>,
}

impl<S: CacheStorage> CacheLayer<S> {
  /// Create a new cache layer with the given storage backend.
  pub fn new(storage: S) -> Self {
    Self {
      storage: Arc::new(storage),
      stale_time: Duration::minutes(5),
      locks: Arc::new(Mutex::new(HashMap::new())),
    }
  }

  /// Set the staleness window for cached data.
  pub fn with_stale_time(mut self, stale_time: Duration) -> Self {
    self.stale_time = stale_time;
    self
  }

  /// Check if cached data is stale based on its cached_at timestamp.
  fn is_stale(&self, cached_at: chrono::DateTime<Utc>) -> bool {
    Utc::now() - cached_at > self.stale_time
  }

  fn key_lock(&self, key: &str) -> Arc<tokio::sync::Mutex<()>> {
    let mut locks = match self.locks.lock() {
      Ok(locks) => locks,
      Err(poisoned) => poisoned.into_inner(),
    };
    Arc::clone(locks.entry(key.to_string()).or_default())
  }

  /// Fetch a list with cache-first strategy.
  ///
  /// 1. Fresh cache entry: return immediately, no network
  /// 2. Stale or missing: fetch under the per-key lock and store
  /// 3. Network failure with a stale entry present: return the stale
  ///    entry (offline fallback)
  pub async fn fetch_list<T, F, Fut>(&self, key: &str, fetcher: F) -> Result<CacheResult<Vec<T>>>
  where
    T: Serialize + DeserializeOwned,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<Vec<T>>>,
  {
    if let Some(cached) = self.storage.get_query_result::<T>(key)? {
      if !self.is_stale(cached.cached_at) {
        return Ok(CacheResult::from_cache(cached.entities, cached.cached_at));
      }
    }

    let lock = self.key_lock(key);
    let _guard = lock.lock().await;

    // Re-check after acquiring the lock: the fetch we queued behind may
    // have refreshed the entry already.
    match self.storage.get_query_result::<T>(key)? {
      Some(cached) if !self.is_stale(cached.cached_at) => {
        Ok(CacheResult::from_cache(cached.entities, cached.cached_at))
      }
      Some(cached) => match fetcher().await {
        Ok(data) => {
          self.storage.store_query_result(key, &data)?;
          Ok(CacheResult::from_network(data))
        }
        Err(error) => {
          tracing::warn!(%error, key, "fetch failed, serving stale cache");
          Ok(CacheResult::offline(cached.entities, cached.cached_at))
        }
      },
      None => {
        let data = fetcher().await?;
        self.storage.store_query_result(key, &data)?;
        Ok(CacheResult::from_network(data))
      }
    }
  }

  /// Force a network fetch regardless of staleness and replace the
  /// entry on success. Errors propagate; an explicit refresh does not
  /// fall back to the cache.
  #[allow(dead_code)]
  pub async fn refetch_list<T, F, Fut>(&self, key: &str, fetcher: F) -> Result<CacheResult<Vec<T>>>
  where
    T: Serialize + DeserializeOwned,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<Vec<T>>>,
  {
    let lock = self.key_lock(key);
    let _guard = lock.lock().await;

    let data = fetcher().await?;
    self.storage.store_query_result(key, &data)?;
    Ok(CacheResult::from_network(data))
  }

  /// Drop the entry for a key so the next read must fetch.
  pub fn invalidate(&self, key: &str) -> Result<()> {
    self.storage.remove(key)
  }
}

impl<S: CacheStorage> Clone for CacheLayer<S> {
  fn clone(&self) -> Self {
    Self {
      storage: Arc::clone(&self.storage),
      stale_time: self.stale_time,
      locks: Arc::clone(&self.locks),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::cache::memory::{MemoryStorage, NoopStorage};
  use crate::cache::traits::CacheSource;
  use color_eyre::eyre::eyre;
  use std::sync::atomic::{AtomicU32, Ordering};

  fn counting_fetcher(
    counter: Arc<AtomicU32>,
  ) -> impl FnOnce() -> std::pin::Pin<Box<dyn Future<Output = Result<Vec<u32>>> + Send>> {
    move || {
      Box::pin(async move {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(vec![1, 2, 3])
      })
    }
  }

  #[tokio::test]
  async fn test_fresh_hit_skips_network() {
    let layer = CacheLayer::new(MemoryStorage::new());
    let counter = Arc::new(AtomicU32::new(0));

    let first = layer
      .fetch_list("users", counting_fetcher(counter.clone()))
      .await
      .unwrap();
    assert_eq!(first.source, CacheSource::Network);

    let second = layer
      .fetch_list("users", counting_fetcher(counter.clone()))
      .await
      .unwrap();
    assert_eq!(second.source, CacheSource::CacheFresh);
    assert_eq!(second.data, vec![1, 2, 3]);
    assert_eq!(counter.load(Ordering::SeqCst), 1);
  }

  #[tokio::test]
  async fn test_stale_entry_refetches() {
    let layer = CacheLayer::new(MemoryStorage::new()).with_stale_time(Duration::zero());
    let counter = Arc::new(AtomicU32::new(0));

    layer
      .fetch_list("users", counting_fetcher(counter.clone()))
      .await
      .unwrap();
    let second = layer
      .fetch_list("users", counting_fetcher(counter.clone()))
      .await
      .unwrap();

    assert_eq!(second.source, CacheSource::Network);
    assert_eq!(counter.load(Ordering::SeqCst), 2);
  }

  #[tokio::test]
  async fn test_offline_fallback_serves_stale_cache() {
    let layer = CacheLayer::new(MemoryStorage::new()).with_stale_time(Duration::zero());
    let counter = Arc::new(AtomicU32::new(0));

    layer
      .fetch_list("users", counting_fetcher(counter.clone()))
      .await
      .unwrap();

    let result = layer
      .fetch_list::<u32, _, _>("users", || async { Err(eyre!("connection refused")) })
      .await
      .unwrap();

    assert_eq!(result.source, CacheSource::Offline);
    assert_eq!(result.data, vec![1, 2, 3]);
  }

  #[tokio::test]
  async fn test_error_propagates_without_cache() {
    let layer = CacheLayer::new(MemoryStorage::new());

    let result = layer
      .fetch_list::<u32, _, _>("users", || async { Err(eyre!("connection refused")) })
      .await;

    assert!(result.is_err());
  }

  #[tokio::test]
  async fn test_concurrent_reads_share_one_fetch() {
    let layer = Arc::new(CacheLayer::new(MemoryStorage::new()));
    let counter = Arc::new(AtomicU32::new(0));

    let slow_fetcher = |counter: Arc<AtomicU32>| {
      move || async move {
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(vec![1u32, 2, 3])
      }
    };

    let (a, b) = tokio::join!(
      layer.fetch_list("users", slow_fetcher(counter.clone())),
      layer.fetch_list("users", slow_fetcher(counter.clone())),
    );

    assert_eq!(a.unwrap().data, vec![1, 2, 3]);
    assert_eq!(b.unwrap().data, vec![1, 2, 3]);
    // One caller fetched; the other waited on the key lock and reused
    // the stored entry.
    assert_eq!(counter.load(Ordering::SeqCst), 1);
  }

  #[tokio::test]
  async fn test_refetch_bypasses_fresh_cache() {
    let layer = CacheLayer::new(MemoryStorage::new());
    let counter = Arc::new(AtomicU32::new(0));

    layer
      .fetch_list("users", counting_fetcher(counter.clone()))
      .await
      .unwrap();
    let result = layer
      .refetch_list("users", counting_fetcher(counter.clone()))
      .await
      .unwrap();

    assert_eq!(result.source, CacheSource::Network);
    assert_eq!(counter.load(Ordering::SeqCst), 2);
  }

  #[tokio::test]
  async fn test_invalidate_forces_fetch() {
    let layer = CacheLayer::new(MemoryStorage::new());
    let counter = Arc::new(AtomicU32::new(0));

    layer
      .fetch_list("users", counting_fetcher(counter.clone()))
      .await
      .unwrap();
    layer.invalidate("users").unwrap();
    layer
      .fetch_list("users", counting_fetcher(counter.clone()))
      .await
      .unwrap();

    assert_eq!(counter.load(Ordering::SeqCst), 2);
  }

  #[tokio::test]
  async fn test_noop_storage_always_fetches() {
    let layer = CacheLayer::new(NoopStorage);
    let counter = Arc::new(AtomicU32::new(0));

    layer
      .fetch_list("users", counting_fetcher(counter.clone()))
      .await
      .unwrap();
    let second = layer
      .fetch_list("users", counting_fetcher(counter.clone()))
      .await
      .unwrap();

    assert_eq!(second.source, CacheSource::Network);
    assert_eq!(counter.load(Ordering::SeqCst), 2);
  }
}
