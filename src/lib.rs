//! Sharded in-process cache with read-through loading
//!
//! Provides a cache-aside layer with:
//! - Per-entry TTLs and lazy expiry (entries are dropped by the read
//!   that finds them stale, never by a background sweep)
//! - 26-way first-letter sharding with one read/write lock per shard
//! - A fetch protocol that hydrates misses from a caller-supplied loader
//! - Lock-serialized unsigned counters
//! - Snapshot backup and restore

mod backend;
mod cache;
pub mod config;
mod entry;
mod error;
mod snapshot;
mod store;

pub use backend::CacheBackend;
pub use cache::{Cache, Loader};
pub use config::CacheConfig;
pub use error::{CacheError, CacheResult};
pub use snapshot::{SnapshotError, SnapshotManager};
pub use store::{shard_index, CacheStats, MemoryStore, SHARD_COUNT};
