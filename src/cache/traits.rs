//! Core types for the in-memory query cache.

use chrono::{DateTime, Utc};
use color_eyre::Result;
use serde::{de::DeserializeOwned, Serialize};

/// A cached query result with its storage timestamp.
#[derive(Debug, Clone)]
pub struct CachedQuery<T> {
  /// The cached entities in their original order
  pub entities: Vec<T>,
  /// When the result was stored
  pub cached_at: DateTime<Utc>,
}

/// Trait for cache storage backends.
///
/// Entries are keyed by query key and replaced wholesale; values are
/// serialized so backends do not need to know the entity type.
pub trait CacheStorage: Send + Sync {
  /// Store a query result, replacing any previous entry for the key.
  fn store_query_result<T: Serialize>(&self, key: &str, entities: &[T]) -> Result<()>;

  /// Get the cached result for a key, if any.
  fn get_query_result<T: DeserializeOwned>(&self, key: &str) -> Result<Option<CachedQuery<T>>>;

  /// Drop the entry for a key so the next read must fetch.
  fn remove(&self, key: &str) -> Result<()>;
}

/// Result from a cache operation, including data and metadata about the source.
#[derive(Debug, Clone)]
pub struct CacheResult<T> {
  /// The actual data
  pub data: T,
  /// Where the data came from
  pub source: CacheSource,
  /// When the data was cached (if from cache)
  pub cached_at: Option<DateTime<Utc>>,
}

impl<T> CacheResult<T> {
  /// Create a new cache result from fresh network data.
  pub fn from_network(data: T) -> Self {
    Self {
      data,
      source: CacheSource::Network,
      cached_at: None,
    }
  }

  /// Create a new cache result from a fresh cache hit.
  pub fn from_cache(data: T, cached_at: DateTime<Utc>) -> Self {
    Self {
      data,
      source: CacheSource::CacheFresh,
      cached_at: Some(cached_at),
    }
  }

  /// Create a new cache result for offline mode.
  pub fn offline(data: T, cached_at: DateTime<Utc>) -> Self {
    Self {
      data,
      source: CacheSource::Offline,
      cached_at: Some(cached_at),
    }
  }
}

/// Indicates where cached data came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheSource {
  /// Fresh data from network
  Network,
  /// Data from cache, still within the staleness window
  CacheFresh,
  /// Network unavailable, serving the last cached data
  Offline,
}
