//! Local persistence: one JSON document per logical record.
//!
//! Best-effort by policy: reads fall back to defaults, writes log and
//! continue. The workflow never blocks on a broken disk.

pub mod key;
pub mod record;

use std::{
    collections::HashMap,
    fs,
    path::PathBuf,
    sync::Mutex,
};

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_with::serde_as;

pub use self::key::Key;
use crate::prelude::*;

/// Where records physically live.
pub trait Backend {
    fn read(&self, key: Key) -> Result<Option<String>>;
    fn write(&self, key: Key, payload: &str) -> Result<()>;
    fn remove(&self, key: Key) -> Result<()>;
}

/// One file per key under the data directory.
#[derive(Debug)]
pub struct FileBackend {
    root: PathBuf,
}

impl FileBackend {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn path(&self, key: Key) -> PathBuf {
        self.root.join(format!("{key}.json"))
    }
}

impl Backend for FileBackend {
    fn read(&self, key: Key) -> Result<Option<String>> {
        let path = self.path(key);
        if !path.is_file() {
            return Ok(None);
        }
        fs::read_to_string(&path)
            .map(Some)
            .with_context(|| format!("failed to read {}", path.display()))
    }

    fn write(&self, key: Key, payload: &str) -> Result<()> {
        fs::create_dir_all(&self.root)
            .with_context(|| format!("failed to create {}", self.root.display()))?;
        fs::write(self.path(key), payload).with_context(|| format!("failed to write `{key}`"))
    }

    fn remove(&self, key: Key) -> Result<()> {
        let path = self.path(key);
        if path.is_file() {
            fs::remove_file(&path)
                .with_context(|| format!("failed to remove {}", path.display()))?;
        }
        Ok(())
    }
}

/// In-memory stand-in, used by tests and dry runs.
#[derive(Debug, Default)]
pub struct MemoryBackend(Mutex<HashMap<Key, String>>);

impl MemoryBackend {
    fn entries(&self) -> Result<std::sync::MutexGuard<'_, HashMap<Key, String>>> {
        self.0.lock().map_err(|_| Error::msg("the in-memory store is poisoned"))
    }
}

impl Backend for MemoryBackend {
    fn read(&self, key: Key) -> Result<Option<String>> {
        Ok(self.entries()?.get(&key).cloned())
    }

    fn write(&self, key: Key, payload: &str) -> Result<()> {
        self.entries()?.insert(key, payload.to_owned());
        Ok(())
    }

    fn remove(&self, key: Key) -> Result<()> {
        self.entries()?.remove(&key);
        Ok(())
    }
}

/// Typed repository over a backend.
#[derive(Debug)]
pub struct Store<B> {
    backend: B,
}

pub type FileStore = Store<FileBackend>;

impl<B: Backend> Store<B> {
    pub const fn new(backend: B) -> Self {
        Self { backend }
    }

    /// Read a durable record, falling back to its default on absence or damage.
    pub fn get<T: DeserializeOwned + Default>(&self, key: Key) -> T {
        match self.backend.read(key) {
            Ok(Some(payload)) => serde_json::from_str(&payload).unwrap_or_else(|error| {
                error!(%key, "discarding a damaged record: {error:#}");
                T::default()
            }),
            Ok(None) => T::default(),
            Err(error) => {
                error!(%key, "failed to load: {error:#}");
                T::default()
            }
        }
    }

    /// Replace a durable record. Failures are logged and swallowed.
    pub fn set<T: Serialize>(&self, key: Key, value: &T) {
        let written = serde_json::to_string_pretty(value)
            .map_err(Error::from)
            .and_then(|payload| self.backend.write(key, &payload));
        if let Err(error) = written {
            error!(%key, "failed to save: {error:#}");
        }
    }

    pub fn clear(&self, key: Key) {
        if let Err(error) = self.backend.remove(key) {
            error!(%key, "failed to clear: {error:#}");
        }
    }

    /// Read a cache entry, discarding it silently when stale or damaged.
    pub fn get_cached<T: DeserializeOwned>(
        &self,
        key: Key,
        ttl: TimeDelta,
        now: DateTime<Utc>,
    ) -> Option<T> {
        let payload = self.backend.read(key).ok().flatten()?;
        let entry: CacheEntry<T> = serde_json::from_str(&payload).ok()?;
        (now - entry.timestamp <= ttl).then_some(entry.data)
    }

    pub fn set_cached<T: Serialize>(&self, key: Key, data: &T, now: DateTime<Utc>) {
        self.set(key, &CacheEntry { timestamp: now, data });
    }
}

/// Cache envelope: `{timestamp, data}`, timestamp in Unix milliseconds.
#[serde_as]
#[derive(Serialize, Deserialize)]
struct CacheEntry<T> {
    #[serde_as(as = "serde_with::TimestampMilliSeconds<i64>")]
    timestamp: DateTime<Utc>,

    data: T,
}
