//! Cache snapshot persistence

use std::path::Path;
use tokio::fs::{self, File};
use tokio::io::{AsyncReadExt, AsyncWriteExt};

use crate::cache::Cache;
use crate::entry::SnapshotEntry;
use crate::error::CacheError;

/// Snapshot file header
const SNAPSHOT_MAGIC: &[u8] = b"HOARDSNAP";
const SNAPSHOT_VERSION: u8 = 1;

/// Encode entries into the framed snapshot format: magic, version,
/// entry count, JSON payload length, JSON payload
pub(crate) fn encode_snapshot(entries: &[SnapshotEntry]) -> Result<Vec<u8>, SnapshotError> {
  let json = serde_json::to_vec(entries).map_err(SnapshotError::Serialize)?;

  let mut data = Vec::with_capacity(SNAPSHOT_MAGIC.len() + 17 + json.len());
  data.extend_from_slice(SNAPSHOT_MAGIC);
  data.push(SNAPSHOT_VERSION);
  data.extend_from_slice(&(entries.len() as u64).to_le_bytes());
  data.extend_from_slice(&(json.len() as u64).to_le_bytes());
  data.extend_from_slice(&json);
  Ok(data)
}

/// Decode a snapshot byte stream, verifying the header
pub(crate) fn decode_snapshot(data: &[u8]) -> Result<Vec<SnapshotEntry>, SnapshotError> {
  let header_len = SNAPSHOT_MAGIC.len() + 17;
  if data.len() < header_len {
    return Err(SnapshotError::InvalidFormat("truncated header".to_string()));
  }
  if &data[..SNAPSHOT_MAGIC.len()] != SNAPSHOT_MAGIC {
    return Err(SnapshotError::InvalidFormat("invalid magic header".to_string()));
  }
  let version = data[SNAPSHOT_MAGIC.len()];
  if version != SNAPSHOT_VERSION {
    return Err(SnapshotError::InvalidFormat(format!(
      "unsupported version: {}",
      version
    )));
  }

  let mut offset = SNAPSHOT_MAGIC.len() + 1;
  let mut count_bytes = [0u8; 8];
  count_bytes.copy_from_slice(&data[offset..offset + 8]);
  let expected_count = u64::from_le_bytes(count_bytes);
  offset += 8;

  let mut len_bytes = [0u8; 8];
  len_bytes.copy_from_slice(&data[offset..offset + 8]);
  let json_len = u64::from_le_bytes(len_bytes) as usize;
  offset += 8;

  // The length field is wire data; bound it against the remaining bytes
  // rather than adding it to the offset.
  let payload = &data[offset..];
  if json_len > payload.len() {
    return Err(SnapshotError::InvalidFormat("truncated payload".to_string()));
  }

  let entries: Vec<SnapshotEntry> =
    serde_json::from_slice(&payload[..json_len]).map_err(SnapshotError::Deserialize)?;

  if entries.len() as u64 != expected_count {
    return Err(SnapshotError::InvalidFormat(format!(
      "entry count mismatch: header says {}, payload has {}",
      expected_count,
      entries.len()
    )));
  }

  Ok(entries)
}

/// Snapshot persistence manager
pub struct SnapshotManager {
  path: String,
}

impl SnapshotManager {
  pub fn new(path: &str) -> Self {
    Self {
      path: path.to_string(),
    }
  }

  /// Save the cache's live entries to the snapshot file. Returns the
  /// number of bytes written.
  pub async fn save(&self, cache: &Cache) -> Result<usize, SnapshotError> {
    let data = cache.backup().await.map_err(SnapshotError::Cache)?;

    // Ensure parent directory exists
    if let Some(parent) = Path::new(&self.path).parent() {
      fs::create_dir_all(parent).await.map_err(SnapshotError::Io)?;
    }

    // Write to temp file first
    let temp_path = format!("{}.tmp", self.path);
    let mut file = File::create(&temp_path).await.map_err(SnapshotError::Io)?;
    file.write_all(&data).await.map_err(SnapshotError::Io)?;
    file.sync_all().await.map_err(SnapshotError::Io)?;
    drop(file);

    // Atomic rename
    fs::rename(&temp_path, &self.path).await.map_err(SnapshotError::Io)?;

    tracing::info!("Cache snapshot saved: {} bytes to {}", data.len(), self.path);
    Ok(data.len())
  }

  /// Load a snapshot file into the cache. Returns the number of entries
  /// restored; a missing file restores nothing.
  pub async fn load(&self, cache: &Cache) -> Result<u64, SnapshotError> {
    if !Path::new(&self.path).exists() {
      return Ok(0);
    }

    let mut file = File::open(&self.path).await.map_err(SnapshotError::Io)?;
    let mut data = Vec::new();
    file.read_to_end(&mut data).await.map_err(SnapshotError::Io)?;

    let count = cache.restore(&data).await.map_err(SnapshotError::Cache)?;

    tracing::info!("Cache snapshot loaded: {} entries from {}", count, self.path);
    Ok(count)
  }

  /// Delete the snapshot file
  pub async fn delete(&self) -> Result<(), SnapshotError> {
    if Path::new(&self.path).exists() {
      fs::remove_file(&self.path).await.map_err(SnapshotError::Io)?;
    }
    Ok(())
  }

  /// Snapshot file size
  pub async fn size(&self) -> Option<u64> {
    fs::metadata(&self.path).await.ok().map(|m| m.len())
  }
}

/// Snapshot errors
#[derive(Debug)]
pub enum SnapshotError {
  Io(std::io::Error),
  Serialize(serde_json::Error),
  Deserialize(serde_json::Error),
  InvalidFormat(String),
  Cache(CacheError),
}

impl std::fmt::Display for SnapshotError {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      SnapshotError::Io(e) => write!(f, "IO error: {}", e),
      SnapshotError::Serialize(e) => write!(f, "Serialization error: {}", e),
      SnapshotError::Deserialize(e) => write!(f, "Deserialization error: {}", e),
      SnapshotError::InvalidFormat(msg) => write!(f, "Invalid snapshot format: {}", msg),
      SnapshotError::Cache(e) => write!(f, "Cache error: {}", e),
    }
  }
}

impl std::error::Error for SnapshotError {}
