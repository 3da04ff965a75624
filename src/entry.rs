//! Cache entry types

use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// Effective lifetime of an entry written with a zero TTL, roughly 100
/// years. Storing a concrete far-future deadline instead of an "immortal"
/// flag keeps every expiry check a single instant comparison. Explicit
/// TTLs are capped at the same bound so computing a deadline cannot
/// overflow.
pub(crate) const NEVER_EXPIRES: Duration = Duration::from_secs(100 * 365 * 24 * 60 * 60);

/// Width of a stored counter value in bytes
pub(crate) const COUNTER_WIDTH: usize = 8;

/// A cached value and the deadline after which it stops being served
#[derive(Debug, Clone)]
pub struct CacheEntry {
  pub data: Vec<u8>,
  pub expires_at: Instant,
}

impl CacheEntry {
  /// Create an entry whose deadline is `ttl` from now. A zero `ttl`
  /// means the entry never expires.
  pub fn new(data: Vec<u8>, ttl: Duration) -> Self {
    let lifetime = if ttl.is_zero() {
      NEVER_EXPIRES
    } else {
      ttl.min(NEVER_EXPIRES)
    };
    Self {
      data,
      expires_at: Instant::now() + lifetime,
    }
  }

  pub fn is_expired(&self) -> bool {
    Instant::now() >= self.expires_at
  }

  /// Remaining lifetime, or `None` for entries that effectively never
  /// expire (more than half the lifetime cap left).
  pub fn ttl_remaining(&self) -> Option<Duration> {
    let left = self.expires_at.saturating_duration_since(Instant::now());
    if left > NEVER_EXPIRES / 2 {
      None
    } else {
      Some(left)
    }
  }
}

/// Decode a stored counter. Counters are exactly eight bytes, unsigned,
/// big-endian; anything else returns `None`.
pub(crate) fn decode_counter(data: &[u8]) -> Option<u64> {
  let bytes: [u8; COUNTER_WIDTH] = data.try_into().ok()?;
  Some(u64::from_be_bytes(bytes))
}

pub(crate) fn encode_counter(value: u64) -> [u8; COUNTER_WIDTH] {
  value.to_be_bytes()
}

/// Snapshot-serializable entry (for backup and restore)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotEntry {
  pub key: String,
  pub value: Vec<u8>,
  /// TTL remaining in milliseconds (None = no expiry)
  pub ttl_ms: Option<u64>,
}

impl SnapshotEntry {
  pub(crate) fn from_entry(key: &str, entry: &CacheEntry) -> Self {
    Self {
      key: key.to_string(),
      value: entry.data.clone(),
      ttl_ms: entry.ttl_remaining().map(|d| d.as_millis() as u64),
    }
  }
}
