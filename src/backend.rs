//! Backend trait for cache storage

use async_trait::async_trait;
use std::time::Duration;

use crate::error::CacheResult;
use crate::store::CacheStats;

/// Trait for cache storage backends (the built-in sharded map, or a
/// wrapper around an external storage engine)
#[async_trait]
pub trait CacheBackend: Send + Sync {
  /// Read a value. Returns `None` when the key is absent or expired.
  async fn get(&self, key: &str) -> CacheResult<Option<Vec<u8>>>;

  /// Write a value with a TTL. A zero TTL never expires.
  async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> CacheResult<()>;

  /// Write several values with a shared TTL. Backends with transactions
  /// can override this with a single batched write.
  async fn set_batch(&self, pairs: Vec<(String, Vec<u8>)>, ttl: Duration) -> CacheResult<()> {
    for (key, value) in pairs {
      self.set(&key, value, ttl).await?;
    }
    Ok(())
  }

  /// Add `delta` to the counter under `key` and return the new value.
  /// An absent or expired key counts from zero; the result is stored
  /// with `ttl`, replacing any previous deadline.
  async fn increment(&self, key: &str, delta: u64, ttl: Duration) -> CacheResult<u64>;

  /// Remove a key. Returns whether an entry was removed.
  async fn delete(&self, key: &str) -> CacheResult<bool>;

  /// Operation statistics
  async fn stats(&self) -> CacheResult<CacheStats>;

  /// Serialize every live entry into a snapshot byte stream
  async fn backup(&self) -> CacheResult<Vec<u8>>;

  /// Restore entries from a [`CacheBackend::backup`] byte stream.
  /// Returns the number of entries restored.
  async fn restore(&self, data: &[u8]) -> CacheResult<u64>;

  /// Release the backend's resources
  async fn close(&self) -> CacheResult<()>;

  /// Smallest positive TTL the backend honors. Positive TTLs below this
  /// are rejected before they reach the backend.
  fn min_ttl(&self) -> Duration {
    Duration::from_secs(1)
  }
}
