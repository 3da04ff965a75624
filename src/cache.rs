//! Cache facade with read-through fetch and atomic counters

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use crate::backend::CacheBackend;
use crate::config::{validate_ttl, CacheConfig};
use crate::error::{CacheError, CacheResult};
use crate::store::{CacheStats, MemoryStore};

/// Source of fresh values for [`Cache::fetch`] misses, typically a
/// database lookup or an upstream call
#[async_trait]
pub trait Loader: Send + Sync {
  async fn load(&self, key: &str) -> anyhow::Result<Vec<u8>>;
}

/// Read-through cache over a [`CacheBackend`]
#[derive(Clone)]
pub struct Cache {
  backend: Arc<dyn CacheBackend>,
  name: String,
  default_ttl: Duration,
}

impl Cache {
  /// Create a cache over the built-in sharded in-memory store
  pub fn in_memory(config: CacheConfig) -> CacheResult<Self> {
    Self::with_backend(Arc::new(MemoryStore::new()), config)
  }

  /// Create a cache over an explicit backend. The configured default
  /// TTL is validated against the backend's minimum resolution.
  pub fn with_backend(backend: Arc<dyn CacheBackend>, config: CacheConfig) -> CacheResult<Self> {
    let default_ttl = config.default_ttl();
    validate_ttl(default_ttl, backend.min_ttl())?;
    Ok(Self {
      backend,
      name: config.name,
      default_ttl,
    })
  }

  /// Cache name used in log output
  pub fn name(&self) -> &str {
    &self.name
  }

  /// Get a value through the cache, loading it on a miss.
  ///
  /// A hit returns the cached value without touching the loader. On a
  /// miss the loader runs with no cache lock held, and its result is
  /// written back with the default TTL and returned. A loader failure
  /// propagates unchanged and nothing is written for the key.
  ///
  /// Concurrent misses on the same key are not coalesced: each invokes
  /// the loader and the last write-back wins.
  pub async fn fetch(&self, key: &str, loader: &dyn Loader) -> CacheResult<Vec<u8>> {
    self.fetch_with_ttl(key, loader, self.default_ttl).await
  }

  /// Same as [`Cache::fetch`] with an explicit TTL for the write-back.
  /// A zero TTL caches the loaded value without an expiry.
  pub async fn fetch_with_ttl(
    &self,
    key: &str,
    loader: &dyn Loader,
    ttl: Duration,
  ) -> CacheResult<Vec<u8>> {
    validate_ttl(ttl, self.backend.min_ttl())?;

    if let Some(value) = self.backend.get(key).await? {
      return Ok(value);
    }

    tracing::debug!("Cache {} miss for {}, invoking loader", self.name, key);
    let value = loader.load(key).await.map_err(CacheError::Loader)?;

    // The caller gets the loaded value whether or not the write-back
    // lands; a failed write only costs the next caller a reload.
    if let Err(e) = self.backend.set(key, value.clone(), ttl).await {
      tracing::warn!(
        "Cache {} failed to store {} after fetch: {}",
        self.name,
        key,
        e
      );
    }

    Ok(value)
  }

  /// Read a value. Absent and expired keys report [`CacheError::NotFound`].
  pub async fn get(&self, key: &str) -> CacheResult<Vec<u8>> {
    match self.backend.get(key).await? {
      Some(value) => Ok(value),
      None => Err(CacheError::NotFound),
    }
  }

  /// Write a value with the default TTL
  pub async fn set(&self, key: &str, value: Vec<u8>) -> CacheResult<()> {
    self.set_with_ttl(key, value, self.default_ttl).await
  }

  /// Write a value with an explicit TTL. A zero TTL never expires.
  pub async fn set_with_ttl(&self, key: &str, value: Vec<u8>, ttl: Duration) -> CacheResult<()> {
    validate_ttl(ttl, self.backend.min_ttl())?;
    self.backend.set(key, value, ttl).await
  }

  /// Write several values with the default TTL
  pub async fn set_batch(&self, pairs: Vec<(String, Vec<u8>)>) -> CacheResult<()> {
    self.set_batch_with_ttl(pairs, self.default_ttl).await
  }

  /// Write several values with an explicit shared TTL
  pub async fn set_batch_with_ttl(
    &self,
    pairs: Vec<(String, Vec<u8>)>,
    ttl: Duration,
  ) -> CacheResult<()> {
    validate_ttl(ttl, self.backend.min_ttl())?;
    self.backend.set_batch(pairs, ttl).await
  }

  /// Remove a key. Returns whether an entry was removed.
  pub async fn delete(&self, key: &str) -> CacheResult<bool> {
    self.backend.delete(key).await
  }

  /// Add `delta` to the counter under `key` and return the new value.
  ///
  /// An absent or expired key counts from zero. The counter is stored
  /// without an expiry; overflow wraps around. The read-modify-write is
  /// serialized per key, so no concurrent increment is lost.
  pub async fn increment(&self, key: &str, delta: u64) -> CacheResult<u64> {
    self.backend.increment(key, delta, Duration::ZERO).await
  }

  /// Same as [`Cache::increment`], but every call stamps the counter
  /// with `ttl` as its new lifetime
  pub async fn increment_with_ttl(
    &self,
    key: &str,
    delta: u64,
    ttl: Duration,
  ) -> CacheResult<u64> {
    validate_ttl(ttl, self.backend.min_ttl())?;
    self.backend.increment(key, delta, ttl).await
  }

  /// Operation statistics. The key count is approximate (see
  /// [`MemoryStore::key_count`]).
  pub async fn stats(&self) -> CacheResult<CacheStats> {
    self.backend.stats().await
  }

  /// Serialize all live entries into a byte stream for [`Cache::restore`]
  pub async fn backup(&self) -> CacheResult<Vec<u8>> {
    self.backend.backup().await
  }

  /// Restore entries from a [`Cache::backup`] byte stream. Returns the
  /// number of entries restored.
  pub async fn restore(&self, data: &[u8]) -> CacheResult<u64> {
    self.backend.restore(data).await
  }

  /// Release the backend
  pub async fn close(&self) -> CacheResult<()> {
    tracing::info!("Cache {} closing", self.name);
    self.backend.close().await
  }
}
