//! Built-in sharded in-memory store

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use crate::backend::CacheBackend;
use crate::entry::{decode_counter, encode_counter, CacheEntry, SnapshotEntry, COUNTER_WIDTH};
use crate::error::{CacheError, CacheResult};
use crate::snapshot;

/// Number of shards in a store, one per letter of the latin alphabet
pub const SHARD_COUNT: usize = 26;

type Shard = RwLock<HashMap<String, CacheEntry>>;

/// Route a key to its shard.
///
/// The key's first byte is case-folded; `a` through `z` map to shards 0
/// through 25, and any other lead byte (digits, punctuation, non-ASCII,
/// the empty key) shares shard 25 with `z`. The mapping is pure and
/// stable, so a key lands on the same shard for the life of the process.
/// It is not a uniform hash: keyspaces that lead with digits or share a
/// first letter pile onto a single shard.
pub fn shard_index(key: &str) -> usize {
  match key.as_bytes().first().map(|b| b.to_ascii_lowercase()) {
    Some(b @ b'a'..=b'z') => (b - b'a') as usize,
    _ => SHARD_COUNT - 1,
  }
}

/// Cache statistics
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CacheStats {
  /// Approximate live-key count (see [`MemoryStore::key_count`])
  pub keys: u64,
  pub hits: u64,
  pub misses: u64,
  pub expired: u64,
}

impl CacheStats {
  pub fn hit_rate(&self) -> f64 {
    let total = self.hits + self.misses;
    if total == 0 {
      0.0
    } else {
      self.hits as f64 / total as f64
    }
  }
}

/// Sharded in-memory cache store.
///
/// Keys route to one of [`SHARD_COUNT`] independently locked maps, so
/// operations on different shards never contend. Expired entries are
/// dropped lazily by the read that finds them; there is no background
/// sweep.
pub struct MemoryStore {
  shards: [Shard; SHARD_COUNT],
  key_count: AtomicU64,
  hits: AtomicU64,
  misses: AtomicU64,
  expired: AtomicU64,
}

impl MemoryStore {
  pub fn new() -> Self {
    Self {
      shards: std::array::from_fn(|_| RwLock::new(HashMap::new())),
      key_count: AtomicU64::new(0),
      hits: AtomicU64::new(0),
      misses: AtomicU64::new(0),
      expired: AtomicU64::new(0),
    }
  }

  /// Approximate number of live keys.
  ///
  /// Counts writes minus observed expiries and deletes. An overwrite
  /// counts as a fresh write, and an expired entry stays counted until
  /// a read touches it, so the value over-reports under overwrite-heavy
  /// or write-once workloads. Treat it as a statistic, never as an
  /// exact size.
  pub fn key_count(&self) -> u64 {
    self.key_count.load(Ordering::Relaxed)
  }

  /// Drop every entry. Read statistics are preserved.
  pub fn clear(&self) {
    for shard in &self.shards {
      shard.write().clear();
    }
    self.key_count.store(0, Ordering::Relaxed);
  }

  /// Collect all live entries for a snapshot
  pub(crate) fn snapshot_entries(&self) -> Vec<SnapshotEntry> {
    let mut entries = Vec::new();
    for shard in &self.shards {
      let map = shard.read();
      for (key, entry) in map.iter() {
        if entry.is_expired() {
          continue;
        }
        let snap = SnapshotEntry::from_entry(key, entry);
        // a sub-millisecond remainder would deserialize as "no expiry"
        if snap.ttl_ms == Some(0) {
          continue;
        }
        entries.push(snap);
      }
    }
    entries
  }

  /// Insert snapshot entries with their remaining lifetimes
  pub(crate) fn restore_entries(&self, entries: Vec<SnapshotEntry>) -> u64 {
    let mut count = 0;
    for snap in entries {
      let ttl = snap.ttl_ms.map(Duration::from_millis).unwrap_or(Duration::ZERO);
      let mut map = self.shards[shard_index(&snap.key)].write();
      map.insert(snap.key, CacheEntry::new(snap.value, ttl));
      self.key_count.fetch_add(1, Ordering::Relaxed);
      count += 1;
    }
    count
  }
}

impl Default for MemoryStore {
  fn default() -> Self {
    Self::new()
  }
}

#[async_trait]
impl CacheBackend for MemoryStore {
  async fn get(&self, key: &str) -> CacheResult<Option<Vec<u8>>> {
    let shard = &self.shards[shard_index(key)];

    {
      let map = shard.read();
      match map.get(key) {
        Some(entry) if !entry.is_expired() => {
          self.hits.fetch_add(1, Ordering::Relaxed);
          return Ok(Some(entry.data.clone()));
        }
        Some(_) => {}
        None => {
          self.misses.fetch_add(1, Ordering::Relaxed);
          return Ok(None);
        }
      }
    }

    // The entry looked expired under the shared lock. Re-check under
    // the exclusive lock so a write that raced in between is not
    // thrown away.
    let mut map = shard.write();
    match map.get(key) {
      Some(entry) if entry.is_expired() => {
        map.remove(key);
        self.key_count.fetch_sub(1, Ordering::Relaxed);
        self.expired.fetch_add(1, Ordering::Relaxed);
        self.misses.fetch_add(1, Ordering::Relaxed);
        Ok(None)
      }
      Some(entry) => {
        self.hits.fetch_add(1, Ordering::Relaxed);
        Ok(Some(entry.data.clone()))
      }
      None => {
        self.misses.fetch_add(1, Ordering::Relaxed);
        Ok(None)
      }
    }
  }

  async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> CacheResult<()> {
    let mut map = self.shards[shard_index(key)].write();
    map.insert(key.to_string(), CacheEntry::new(value, ttl));
    self.key_count.fetch_add(1, Ordering::Relaxed);
    Ok(())
  }

  async fn increment(&self, key: &str, delta: u64, ttl: Duration) -> CacheResult<u64> {
    let mut map = self.shards[shard_index(key)].write();

    // The exclusive lock is held across the whole read-modify-write, so
    // concurrent increments on the same key never lose updates.
    let current = match map.get(key) {
      Some(entry) if entry.is_expired() => {
        // reusing the slot in place, the live count stays put
        self.expired.fetch_add(1, Ordering::Relaxed);
        0
      }
      Some(entry) => match decode_counter(&entry.data) {
        Some(value) => value,
        None => {
          return Err(CacheError::InvalidValue(format!(
            "value is not a counter ({} bytes, expected {})",
            entry.data.len(),
            COUNTER_WIDTH
          )))
        }
      },
      None => {
        self.key_count.fetch_add(1, Ordering::Relaxed);
        0
      }
    };

    let value = current.wrapping_add(delta);
    map.insert(key.to_string(), CacheEntry::new(encode_counter(value).to_vec(), ttl));
    Ok(value)
  }

  async fn delete(&self, key: &str) -> CacheResult<bool> {
    let mut map = self.shards[shard_index(key)].write();
    if map.remove(key).is_some() {
      self.key_count.fetch_sub(1, Ordering::Relaxed);
      Ok(true)
    } else {
      Ok(false)
    }
  }

  async fn stats(&self) -> CacheResult<CacheStats> {
    Ok(CacheStats {
      keys: self.key_count.load(Ordering::Relaxed),
      hits: self.hits.load(Ordering::Relaxed),
      misses: self.misses.load(Ordering::Relaxed),
      expired: self.expired.load(Ordering::Relaxed),
    })
  }

  async fn backup(&self) -> CacheResult<Vec<u8>> {
    let entries = self.snapshot_entries();
    snapshot::encode_snapshot(&entries).map_err(|e| CacheError::Backend(e.into()))
  }

  async fn restore(&self, data: &[u8]) -> CacheResult<u64> {
    let entries = snapshot::decode_snapshot(data).map_err(|e| CacheError::Backend(e.into()))?;
    Ok(self.restore_entries(entries))
  }

  async fn close(&self) -> CacheResult<()> {
    self.clear();
    Ok(())
  }
}
