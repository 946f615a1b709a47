//! In-memory cache storage.
//!
//! Entries live only for the lifetime of the process; there is no
//! on-disk persistence. Values are stored JSON-encoded so the map does
//! not depend on the entity type.

use chrono::{DateTime, Utc};
use color_eyre::{eyre::eyre, Result};
use serde::{de::DeserializeOwned, Serialize};
use std::collections::HashMap;
use std::sync::Mutex;

use super::traits::{CacheStorage, CachedQuery};

#[derive(Debug, Clone)]
struct StoredEntry {
  payload: serde_json::Value,
  cached_at: DateTime<Utc>,
}

/// Process-local storage backend keyed by query key.
#[derive(Debug, Default)]
pub struct MemoryStorage {
  entries: Mutex<HashMap<String, StoredEntry>>,
}

impl MemoryStorage {
  pub fn new() -> Self {
    Self::default()
  }

  fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, StoredEntry>>> {
    self.entries.lock().map_err(|_| eyre!("cache storage mutex poisoned"))
  }
}

impl CacheStorage for MemoryStorage {
  fn store_query_result<T: Serialize>(&self, key: &str, entities: &[T]) -> Result<()> {
    let payload = serde_json::to_value(entities)?;
    self.lock()?.insert(
      key.to_string(),
      StoredEntry {
        payload,
        cached_at: Utc::now(),
      },
    );
    Ok(())
  }

  fn get_query_result<T: DeserializeOwned>(&self, key: &str) -> Result<Option<CachedQuery<T>>> {
    let entries = self.lock()?;
    let Some(entry) = entries.get(key) else {
      return Ok(None);
    };

    let entities: Vec<T> = serde_json::from_value(entry.payload.clone())?;
    Ok(Some(CachedQuery {
      entities,
      cached_at: entry.cached_at,
    }))
  }

  fn remove(&self, key: &str) -> Result<()> {
    self.lock()?.remove(key);
    Ok(())
  }
}

/// Storage implementation that doesn't cache anything.
/// Every read misses, so the layer always goes to the network.
#[derive(Debug, Default)]
pub struct NoopStorage;

impl CacheStorage for NoopStorage {
  fn store_query_result<T: Serialize>(&self, _key: &str, _entities: &[T]) -> Result<()> {
    Ok(()) // Discard
  }

  fn get_query_result<T: DeserializeOwned>(&self, _key: &str) -> Result<Option<CachedQuery<T>>> {
    Ok(None) // Always miss
  }

  fn remove(&self, _key: &str) -> Result<()> {
    Ok(())
  }
}

/// Storage backend selected at startup.
///
/// `Disabled` makes every read miss, so the layer re-fetches on each
/// access and nothing is retained between reads.
#[derive(Debug)]
pub enum CacheBackend {
  Memory(MemoryStorage),
  Disabled(NoopStorage),
}

impl CacheBackend {
  pub fn new(enabled: bool) -> Self {
    if enabled {
      Self::Memory(MemoryStorage::new())
    } else {
      Self::Disabled(NoopStorage)
    }
  }
}

impl CacheStorage for CacheBackend {
  fn store_query_result<T: Serialize>(&self, key: &str, entities: &[T]) -> Result<()> {
    match self {
      Self::Memory(storage) => storage.store_query_result(key, entities),
      Self::Disabled(storage) => storage.store_query_result(key, entities),
    }
  }

  fn get_query_result<T: DeserializeOwned>(&self, key: &str) -> Result<Option<CachedQuery<T>>> {
    match self {
      Self::Memory(storage) => storage.get_query_result(key),
      Self::Disabled(storage) => storage.get_query_result(key),
    }
  }

  fn remove(&self, key: &str) -> Result<()> {
    match self {
      Self::Memory(storage) => storage.remove(key),
      Self::Disabled(storage) => storage.remove(key),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_store_and_get_roundtrip() {
    let storage = MemoryStorage::new();
    storage.store_query_result("nums", &[1u32, 2, 3]).unwrap();

    let cached = storage.get_query_result::<u32>("nums").unwrap().unwrap();
    assert_eq!(cached.entities, vec![1, 2, 3]);
    assert!(cached.cached_at <= Utc::now());
  }

  #[test]
  fn test_missing_key_is_none() {
    let storage = MemoryStorage::new();
    assert!(storage.get_query_result::<u32>("nope").unwrap().is_none());
  }

  #[test]
  fn test_store_replaces_entry() {
    let storage = MemoryStorage::new();
    storage.store_query_result("k", &["a"]).unwrap();
    storage.store_query_result("k", &["b", "c"]).unwrap();

    let cached = storage.get_query_result::<String>("k").unwrap().unwrap();
    assert_eq!(cached.entities, vec!["b", "c"]);
  }

  #[test]
  fn test_remove_drops_entry() {
    let storage = MemoryStorage::new();
    storage.store_query_result("k", &[1u32]).unwrap();
    storage.remove("k").unwrap();
    assert!(storage.get_query_result::<u32>("k").unwrap().is_none());
  }

  #[test]
  fn test_noop_storage_never_hits() {
    let storage = NoopStorage;
    storage.store_query_result("k", &[1u32]).unwrap();
    assert!(storage.get_query_result::<u32>("k").unwrap().is_none());
  }
}
