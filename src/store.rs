//! Per-video clip persistence behind a small key-value interface.

use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::{Context, Result};
use directories::ProjectDirs;
use tracing::warn;

use crate::clip::ClipSettings;
use crate::constants::constants;

/// Minimal persistent string store. The production backend is a JSON document
/// on disk; tests substitute an in-memory map.
pub trait KvStore {
  fn get(&self, key: &str) -> Option<String>;
  fn set(&mut self, key: &str, value: &str) -> Result<()>;
}

// --- File-backed store ---

/// All keys live in one JSON object at `path`, loaded once on open and
/// written through on every `set`.
pub struct FileKvStore {
  path: PathBuf,
  entries: BTreeMap<String, String>,
}

impl FileKvStore {
  /// Open the store in the platform data directory (`…/ytloop/clips.json`).
  pub fn open_default() -> Result<Self> {
    let dirs = ProjectDirs::from("", "", "ytloop").context("No usable home directory for the data dir")?;
    Self::open(dirs.data_dir().join(&constants().store_file))
  }

  /// Open the store at an explicit path. A missing file starts empty; a
  /// corrupt one is logged and replaced on the next write.
  pub fn open(path: PathBuf) -> Result<Self> {
    let entries = match std::fs::read_to_string(&path) {
      Ok(content) => match serde_json::from_str(&content) {
        Ok(map) => map,
        Err(e) => {
          warn!(path = %path.display(), err = %e, "store: unreadable store file, starting empty");
          BTreeMap::new()
        }
      },
      Err(_) => BTreeMap::new(),
    };
    Ok(Self { path, entries })
  }

  fn persist(&self) -> Result<()> {
    if let Some(dir) = self.path.parent() {
      std::fs::create_dir_all(dir).with_context(|| format!("Failed to create {}", dir.display()))?;
    }
    let content = serde_json::to_string_pretty(&self.entries).context("Failed to serialize clip store")?;
    std::fs::write(&self.path, content).with_context(|| format!("Failed to write {}", self.path.display()))
  }
}

impl KvStore for FileKvStore {
  fn get(&self, key: &str) -> Option<String> {
    self.entries.get(key).cloned()
  }

  fn set(&mut self, key: &str, value: &str) -> Result<()> {
    self.entries.insert(key.to_string(), value.to_string());
    self.persist()
  }
}

// --- Clip store ---

/// Persists one `ClipSettings` record per video id. Keys for different ids
/// never collide; the same id always resolves to the same record.
pub struct ClipStore {
  kv: Box<dyn KvStore>,
}

impl ClipStore {
  pub fn new(kv: Box<dyn KvStore>) -> Self {
    Self { kv }
  }

  fn key(video_id: &str) -> String {
    format!("{}{}", constants().clip_key_prefix, video_id)
  }

  /// Load the record for `video_id`. Absent or unparseable records read as
  /// `None`; the caller falls back to defaults.
  pub fn load(&self, video_id: &str) -> Option<ClipSettings> {
    if video_id.is_empty() {
      return None;
    }
    let raw = self.kv.get(&Self::key(video_id))?;
    match serde_json::from_str(&raw) {
      Ok(settings) => Some(settings),
      Err(e) => {
        warn!(video_id, err = %e, "store: corrupt clip record, falling back to defaults");
        None
      }
    }
  }

  /// Save the record for `video_id`, overwriting any prior value. A missing
  /// video id (a page without a video) is a no-op, not an error.
  pub fn save(&mut self, video_id: &str, settings: &ClipSettings) -> Result<()> {
    if video_id.is_empty() {
      return Ok(());
    }
    let raw = serde_json::to_string(settings).context("Failed to serialize clip settings")?;
    self.kv.set(&Self::key(video_id), &raw)
  }
}

// --- In-memory fake ---

/// Test double for [`KvStore`]: a plain map, no I/O.
#[cfg(test)]
#[derive(Default)]
pub(crate) struct MemoryStore {
  entries: BTreeMap<String, String>,
}

#[cfg(test)]
impl KvStore for MemoryStore {
  fn get(&self, key: &str) -> Option<String> {
    self.entries.get(key).cloned()
  }

  fn set(&mut self, key: &str, value: &str) -> Result<()> {
    self.entries.insert(key.to_string(), value.to_string());
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn memory_clip_store() -> ClipStore {
    ClipStore::new(Box::new(MemoryStore::default()))
  }

  fn clip(start: u64, end: u64) -> ClipSettings {
    ClipSettings { start, end, count: 2, infinite: false }
  }

  #[test]
  fn round_trips_settings() {
    let mut store = memory_clip_store();
    let settings = clip(10, 20);
    store.save("abc", &settings).unwrap();
    assert_eq!(store.load("abc"), Some(settings));
  }

  #[test]
  fn distinct_ids_do_not_collide() {
    let mut store = memory_clip_store();
    let a = clip(1, 2);
    let b = clip(30, 40);
    store.save("A", &a).unwrap();
    store.save("B", &b).unwrap();
    assert_eq!(store.load("A"), Some(a));
    assert_eq!(store.load("B"), Some(b));
  }

  #[test]
  fn save_overwrites_prior_value() {
    let mut store = memory_clip_store();
    store.save("abc", &clip(1, 2)).unwrap();
    store.save("abc", &clip(5, 9)).unwrap();
    assert_eq!(store.load("abc"), Some(clip(5, 9)));
  }

  #[test]
  fn absent_record_reads_as_none() {
    assert_eq!(memory_clip_store().load("missing"), None);
  }

  #[test]
  fn corrupt_record_reads_as_none() {
    let mut kv = MemoryStore::default();
    kv.set(&ClipStore::key("abc"), "{not json").unwrap();
    kv.set(&ClipStore::key("def"), r#"{"start": "nope"}"#).unwrap();
    let store = ClipStore::new(Box::new(kv));
    assert_eq!(store.load("abc"), None);
    assert_eq!(store.load("def"), None);
  }

  #[test]
  fn empty_video_id_is_a_noop() {
    let mut store = memory_clip_store();
    store.save("", &clip(1, 2)).unwrap();
    assert_eq!(store.load(""), None);
  }

  #[test]
  fn file_store_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("clips.json");
    let settings = clip(70, 85);
    {
      let mut store = ClipStore::new(Box::new(FileKvStore::open(path.clone()).unwrap()));
      store.save("abc", &settings).unwrap();
    }
    let store = ClipStore::new(Box::new(FileKvStore::open(path).unwrap()));
    assert_eq!(store.load("abc"), Some(settings));
  }

  #[test]
  fn file_store_tolerates_corrupt_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("clips.json");
    std::fs::write(&path, "not json at all").unwrap();
    let store = ClipStore::new(Box::new(FileKvStore::open(path).unwrap()));
    assert_eq!(store.load("abc"), None);
  }
}
