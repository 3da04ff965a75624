//! Cache configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{CacheError, CacheResult};

/// Cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
  /// Cache name, used in log output
  #[serde(default = "default_name")]
  pub name: String,

  /// Default TTL in milliseconds applied by `fetch` and `set` (0 = no expiry)
  #[serde(default)]
  pub default_ttl_ms: u64,
}

fn default_name() -> String {
  "cache".to_string()
}

impl Default for CacheConfig {
  fn default() -> Self {
    Self {
      name: default_name(),
      default_ttl_ms: 0,
    }
  }
}

impl CacheConfig {
  /// Default TTL as a duration
  pub fn default_ttl(&self) -> Duration {
    Duration::from_millis(self.default_ttl_ms)
  }
}

/// Reject TTLs between zero and the backend's minimum resolution.
///
/// A zero TTL means "never expires" and is always valid; any other TTL
/// must be at least `minimum`. Too-small values are rejected rather
/// than silently rounded up.
pub fn validate_ttl(ttl: Duration, minimum: Duration) -> CacheResult<()> {
  if !ttl.is_zero() && ttl < minimum {
    return Err(CacheError::InvalidTtl { ttl, minimum });
  }
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_config_defaults() {
    let config = CacheConfig::default();
    assert_eq!(config.name, "cache");
    assert_eq!(config.default_ttl_ms, 0);
    assert_eq!(config.default_ttl(), Duration::ZERO);
  }

  #[test]
  fn test_config_from_json() {
    let config: CacheConfig = serde_json::from_str(r#"{"default_ttl_ms": 5000}"#).unwrap();
    assert_eq!(config.name, "cache");
    assert_eq!(config.default_ttl_ms, 5000);
  }

  #[test]
  fn test_validate_ttl() {
    let minimum = Duration::from_secs(1);
    assert!(validate_ttl(Duration::ZERO, minimum).is_ok());
    assert!(validate_ttl(Duration::from_secs(1), minimum).is_ok());
    assert!(validate_ttl(Duration::from_secs(30), minimum).is_ok());
    assert!(validate_ttl(Duration::from_millis(999), minimum).is_err());
    assert!(validate_ttl(Duration::from_millis(1), minimum).is_err());
    assert!(validate_ttl(Duration::from_nanos(1), minimum).is_err());
  }
}
