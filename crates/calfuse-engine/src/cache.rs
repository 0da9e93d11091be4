//! Cache entries and the stores that hold them.
//!
//! An entry is the merged, sorted event list of one successful refresh plus
//! the instant it was written. Stores only ever see the serialized form, in
//! which every timestamp is RFC 3339 text; [`decode_entry`] restores real
//! instants and re-validates each event, so a tampered or truncated entry
//! surfaces as [`CacheError::Corrupt`] instead of bad data.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, Duration, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use calfuse_core::{Event, EventSource};
use calfuse_providers::BoxFuture;

use crate::error::{CacheError, CacheResult};

/// The merged result of one successful refresh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    /// Events sorted by start.
    pub events: Vec<Event>,
    /// When the refresh completed.
    pub timestamp: DateTime<Utc>,
}

impl CacheEntry {
    pub fn new(events: Vec<Event>, timestamp: DateTime<Utc>) -> Self {
        Self { events, timestamp }
    }

    /// Returns how old the entry is at `now`.
    pub fn age(&self, now: DateTime<Utc>) -> Duration {
        now - self.timestamp
    }

    /// Returns true if the entry is strictly younger than `freshness`.
    pub fn is_fresh(&self, now: DateTime<Utc>, freshness: Duration) -> bool {
        self.age(now) < freshness
    }
}

#[derive(Serialize, Deserialize)]
struct StoredEntry {
    events: Vec<StoredEvent>,
    timestamp: String,
}

#[derive(Serialize, Deserialize)]
struct StoredEvent {
    id: String,
    #[serde(default)]
    title: String,
    start: String,
    end: String,
    source: EventSource,
    busy: bool,
}

impl From<&Event> for StoredEvent {
    fn from(event: &Event) -> Self {
        Self {
            id: event.id().to_string(),
            title: event.title().to_string(),
            start: format_instant(event.start()),
            end: format_instant(event.end()),
            source: event.source(),
            busy: event.is_busy(),
        }
    }
}

fn format_instant(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

fn parse_instant(key: &str, value: &str) -> CacheResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| CacheError::corrupt(key, format!("bad timestamp '{}': {}", value, e)))
}

/// Serializes an entry to its stored text form.
pub fn encode_entry(entry: &CacheEntry) -> CacheResult<String> {
    let stored = StoredEntry {
        events: entry.events.iter().map(StoredEvent::from).collect(),
        timestamp: format_instant(entry.timestamp),
    };
    Ok(serde_json::to_string(&stored)?)
}

/// Restores an entry from its stored text form.
///
/// # Errors
///
/// Returns [`CacheError::Corrupt`] if the text is not a valid entry or any
/// event in it is invalid.
pub fn decode_entry(key: &str, text: &str) -> CacheResult<CacheEntry> {
    let stored: StoredEntry =
        serde_json::from_str(text).map_err(|e| CacheError::corrupt(key, e.to_string()))?;

    let timestamp = parse_instant(key, &stored.timestamp)?;
    let events = stored
        .events
        .into_iter()
        .map(|e| {
            let start = parse_instant(key, &e.start)?;
            let end = parse_instant(key, &e.end)?;
            Event::new(e.id, e.source, start, end)
                .map(|event| event.with_title(e.title).with_busy(e.busy))
                .map_err(|err| CacheError::corrupt(key, err.to_string()))
        })
        .collect::<CacheResult<Vec<_>>>()?;

    Ok(CacheEntry { events, timestamp })
}

/// Persistent key/value storage for cache entries.
///
/// The engine is the only writer. Implementations need no locking beyond
/// what keeps a single `get` or `set` consistent: concurrent writers are
/// last-write-wins.
pub trait CacheStore: Send + Sync {
    /// Reads the entry under `key`. A missing entry is `Ok(None)`.
    fn get<'a>(&'a self, key: &'a str) -> BoxFuture<'a, CacheResult<Option<CacheEntry>>>;

    /// Replaces the entry under `key`.
    fn set<'a>(&'a self, key: &'a str, entry: CacheEntry) -> BoxFuture<'a, CacheResult<()>>;
}

/// In-process store. Entries are kept in serialized form so reads go
/// through the same decode path as a persistent store.
#[derive(Debug, Default)]
pub struct MemoryCacheStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryCacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the stored text under `key`.
    pub fn raw(&self, key: &str) -> Option<String> {
        self.lock().ok()?.get(key).cloned()
    }

    /// Stores text under `key` as-is, bypassing encoding.
    pub fn insert_raw(&self, key: impl Into<String>, text: impl Into<String>) {
        if let Ok(mut entries) = self.lock() {
            entries.insert(key.into(), text.into());
        }
    }

    fn lock(&self) -> CacheResult<std::sync::MutexGuard<'_, HashMap<String, String>>> {
        self.entries
            .lock()
            .map_err(|_| CacheError::unavailable("memory store lock poisoned"))
    }
}

impl CacheStore for MemoryCacheStore {
    fn get<'a>(&'a self, key: &'a str) -> BoxFuture<'a, CacheResult<Option<CacheEntry>>> {
        Box::pin(async move {
            let text = self.lock()?.get(key).cloned();
            text.map(|t| decode_entry(key, &t)).transpose()
        })
    }

    fn set<'a>(&'a self, key: &'a str, entry: CacheEntry) -> BoxFuture<'a, CacheResult<()>> {
        Box::pin(async move {
            let text = encode_entry(&entry)?;
            self.lock()?.insert(key.to_string(), text);
            trace!(key, events = entry.events.len(), "stored cache entry in memory");
            Ok(())
        })
    }
}

/// Store that keeps one JSON file per key in a directory.
#[derive(Debug, Clone)]
pub struct FileCacheStore {
    dir: PathBuf,
}

impl FileCacheStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the file backing `key`. Characters outside `[A-Za-z0-9_-]`
    /// are replaced so a key can never escape the directory.
    pub fn path_for(&self, key: &str) -> PathBuf {
        let name: String = key
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.dir.join(format!("{}.json", name))
    }
}

impl CacheStore for FileCacheStore {
    fn get<'a>(&'a self, key: &'a str) -> BoxFuture<'a, CacheResult<Option<CacheEntry>>> {
        Box::pin(async move {
            let path = self.path_for(key);
            let text = match tokio::fs::read_to_string(&path).await {
                Ok(text) => text,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    trace!(path = %path.display(), "no cache file");
                    return Ok(None);
                }
                Err(e) => {
                    return Err(CacheError::io(
                        format!("failed to read {}", path.display()),
                        e,
                    ));
                }
            };
            decode_entry(key, &text).map(Some)
        })
    }

    fn set<'a>(&'a self, key: &'a str, entry: CacheEntry) -> BoxFuture<'a, CacheResult<()>> {
        Box::pin(async move {
            let text = encode_entry(&entry)?;
            let path = self.path_for(key);
            let tmp = path.with_extension("json.tmp");

            tokio::fs::create_dir_all(&self.dir).await.map_err(|e| {
                CacheError::io(format!("failed to create {}", self.dir.display()), e)
            })?;
            tokio::fs::write(&tmp, text.as_bytes())
                .await
                .map_err(|e| CacheError::io(format!("failed to write {}", tmp.display()), e))?;
            tokio::fs::rename(&tmp, &path)
                .await
                .map_err(|e| CacheError::io(format!("failed to replace {}", path.display()), e))?;

            debug!(path = %path.display(), events = entry.events.len(), "wrote cache file");
            Ok(())
        })
    }
}
