//! Cached user client that wraps UserClient with the in-memory query
//! cache.

use chrono::Duration;
use color_eyre::Result;

use crate::cache::{CacheBackend, CacheLayer, CacheResult};
use crate::config::Config;

use super::client::UserClient;
use super::types::User;

/// Cache key for the user list. The directory has exactly one
/// collection, so the key is static.
pub const USERS_KEY: &str = "users";

/// User client with transparent caching.
///
/// Wraps the underlying UserClient and provides the same data, but
/// serves fresh cache hits without a network round trip and falls back
/// to stale data when the network is down.
#[derive(Clone)]
pub struct CachedUserClient {
  inner: UserClient,
  cache: CacheLayer<CacheBackend>,
}

impl CachedUserClient {
  /// Create a new cached user client.
  pub fn new(config: &Config) -> Result<Self> {
    let inner = UserClient::new(config)?;
    let backend = CacheBackend::new(config.cache_enabled);
    let cache =
      CacheLayer::new(backend).with_stale_time(Duration::seconds(config.stale_secs as i64));

    Ok(Self { inner, cache })
  }

  /// Fetch the user list through the cache.
  pub async fn fetch_users(&self) -> Result<CacheResult<Vec<User>>> {
    self
      .cache
      .fetch_list(USERS_KEY, || {
        let inner = self.inner.clone();
        async move { Ok(inner.fetch_users().await?) }
      })
      .await
  }

  /// Drop the cached user list so the next read hits the network.
  /// A forced refresh is this plus `Query::refetch` on the caller's
  /// side, which supersedes whatever fetch is in flight.
  pub fn invalidate(&self) {
    if let Err(error) = self.cache.invalidate(USERS_KEY) {
      tracing::warn!(%error, "failed to invalidate user cache");
    }
  }

  /// Warm the cache in the background, ahead of the first render.
  pub fn prefetch(&self) {
    let client = self.clone();
    tokio::spawn(async move {
      match client.fetch_users().await {
        Ok(result) => {
          tracing::debug!(source = ?result.source, count = result.data.len(), "prefetched users")
        }
        Err(error) => tracing::warn!(%error, "user prefetch failed"),
      }
    });
  }
}
