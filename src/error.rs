//! Cache error types

use std::time::Duration;

/// Result type for cache operations
pub type CacheResult<T> = Result<T, CacheError>;

/// Cache operation error
#[derive(Debug)]
pub enum CacheError {
  /// The key is absent or its entry has expired
  NotFound,
  /// A positive TTL below the backend's minimum resolution
  InvalidTtl { ttl: Duration, minimum: Duration },
  /// The stored value cannot be used for the requested operation
  InvalidValue(String),
  /// The loader failed during a fetch; nothing was cached for the key
  Loader(anyhow::Error),
  /// The backing store failed an operation
  Backend(anyhow::Error),
}

impl std::fmt::Display for CacheError {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      CacheError::NotFound => write!(f, "Key not found"),
      CacheError::InvalidTtl { ttl, minimum } => write!(
        f,
        "TTL must be 0 or at least {:?}, got {:?}",
        minimum, ttl
      ),
      CacheError::InvalidValue(msg) => write!(f, "Invalid value: {}", msg),
      CacheError::Loader(e) => write!(f, "Loader error: {}", e),
      CacheError::Backend(e) => write!(f, "Backend error: {}", e),
    }
  }
}

impl std::error::Error for CacheError {}
