use crate::resolver::ArticleCache;
use serde_json::Value;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use thiserror::Error;

pub const TOPICS_KEY: &str = "topics";
pub const CACHE_KEY: &str = "newsCache";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("stored record is not valid json: {0}")]
    Json(#[from] serde_json::Error),
}

/// Durable key-value storage for the app's named records.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<Value>, StorageError>;
    fn set(&self, key: &str, value: &Value) -> Result<(), StorageError>;
}

/// One JSON file per key inside a directory.
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<Value>, StorageError> {
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(None);
        }
        let raw = fs::read_to_string(&path)?;
        Ok(Some(serde_json::from_str(&raw)?))
    }

    fn set(&self, key: &str, value: &Value) -> Result<(), StorageError> {
        fs::create_dir_all(&self.dir)?;
        let path = self.path_for(key);
        // Replace atomically.
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_vec_pretty(value)?)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryStore {
    records: Mutex<HashMap<String, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Value>, StorageError> {
        let records = self.records.lock().unwrap_or_else(|e| e.into_inner());
        Ok(records.get(key).cloned())
    }

    fn set(&self, key: &str, value: &Value) -> Result<(), StorageError> {
        let mut records = self.records.lock().unwrap_or_else(|e| e.into_inner());
        records.insert(key.to_string(), value.clone());
        Ok(())
    }
}

/// Reads the persisted topic list. Absent, unreadable or malformed records
/// all come back as `None`.
pub fn load_topics(store: &dyn KeyValueStore) -> Option<Vec<String>> {
    match store.get(TOPICS_KEY) {
        Ok(Some(value)) => match serde_json::from_value(value) {
            Ok(topics) => Some(topics),
            Err(e) => {
                tracing::warn!(error = %e, "ignoring malformed topic list");
                None
            }
        },
        Ok(None) => None,
        Err(e) => {
            tracing::warn!(error = %e, "failed to read topic list");
            None
        }
    }
}

pub fn save_topics(store: &dyn KeyValueStore, topics: &[String]) -> Result<(), StorageError> {
    store.set(TOPICS_KEY, &serde_json::to_value(topics)?)
}

/// Reads the persisted article cache, falling back to an empty one.
pub fn load_cache(store: &dyn KeyValueStore) -> ArticleCache {
    match store.get(CACHE_KEY) {
        Ok(Some(value)) => serde_json::from_value(value).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "ignoring malformed news cache");
            ArticleCache::new()
        }),
        Ok(None) => ArticleCache::new(),
        Err(e) => {
            tracing::warn!(error = %e, "failed to read news cache");
            ArticleCache::new()
        }
    }
}

pub fn save_cache(store: &dyn KeyValueStore, cache: &ArticleCache) -> Result<(), StorageError> {
    store.set(CACHE_KEY, &serde_json::to_value(cache)?)
}
