use crate::data::{HistoryEntry, WordEntry};
use crate::date::DateKey;
use crate::error::StoreError;
use crate::words::DEFAULT_DAILY_COUNT;
use parking_lot::RwLock;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

pub const KEY_DARK_MODE: &str = "darkMode";
pub const KEY_DAILY_WORD_COUNT: &str = "dailyWordCount";
pub const KEY_LAST_DATE: &str = "lastDate";
pub const KEY_TODAY_WORDS: &str = "todayWords";
pub const KEY_HISTORY: &str = "history";
pub const KEY_FAVORITES: &str = "favorites";

/// A flat string-to-string store with the semantics of browser local storage:
/// global keys, whole-value writes, no transactions.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: String) -> Result<(), StoreError>;
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    values: RwLock<BTreeMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.read().get(key).cloned()
    }

    fn set(&self, key: &str, value: String) -> Result<(), StoreError> {
        self.values.write().insert(key.to_string(), value);
        Ok(())
    }
}

/// Store persisted as one JSON object on disk.
///
/// The file is read once at open and rewritten in full on every `set`.
/// Separate processes sharing a file can overwrite each other's updates.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    values: RwLock<BTreeMap<String, String>>,
}

impl FileStore {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let values = match fs::read(&path) {
            Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => BTreeMap::new(),
            Ok(bytes) => serde_json::from_slice(&bytes)?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(err) => return Err(err.into()),
        };
        Ok(Self {
            path,
            values: RwLock::new(values),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self, values: &BTreeMap<String, String>) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let bytes = serde_json::to_vec_pretty(values)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, bytes)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.read().get(key).cloned()
    }

    fn set(&self, key: &str, value: String) -> Result<(), StoreError> {
        let mut guard = self.values.write();
        let mut next = guard.clone();
        next.insert(key.to_string(), value);
        self.flush(&next)?;
        *guard = next;
        Ok(())
    }
}

/// Read-modify-write paths use this so an unreadable value is never replaced.
fn read_json_strict<T: DeserializeOwned>(
    store: &dyn KeyValueStore,
    key: &str,
) -> Result<Option<T>, StoreError> {
    match store.get(key) {
        Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
        None => Ok(None),
    }
}

fn read_json<T: DeserializeOwned>(store: &dyn KeyValueStore, key: &str) -> Option<T> {
    match read_json_strict(store, key) {
        Ok(value) => value,
        Err(err) => {
            warn!(key, error = %err, "ignoring unreadable stored value");
            None
        }
    }
}

fn write_json<T: Serialize + ?Sized>(
    store: &dyn KeyValueStore,
    key: &str,
    value: &T,
) -> Result<(), StoreError> {
    store.set(key, serde_json::to_string(value)?)
}

pub fn favorites(store: &dyn KeyValueStore) -> Vec<WordEntry> {
    read_json(store, KEY_FAVORITES).unwrap_or_default()
}

/// Appends `entry` unless a favorite with the same word and meaning exists.
/// Returns whether the entry was added.
///
/// Fails without writing if the stored list cannot be read.
pub fn save_favorite(store: &dyn KeyValueStore, entry: &WordEntry) -> Result<bool, StoreError> {
    let mut list: Vec<WordEntry> = read_json_strict(store, KEY_FAVORITES)?.unwrap_or_default();
    if list.iter().any(|existing| existing.same_sense(entry)) {
        return Ok(false);
    }
    list.push(entry.clone());
    write_json(store, KEY_FAVORITES, &list)?;
    Ok(true)
}

/// Newest first.
pub fn history(store: &dyn KeyValueStore) -> Vec<HistoryEntry> {
    read_json(store, KEY_HISTORY).unwrap_or_default()
}

/// Records `words` as the history for `date`.
///
/// If the newest entry is already for `date` its words are replaced,
/// otherwise a new entry is put in front. Fails without writing if the
/// stored history cannot be read.
pub fn push_today_to_history(
    store: &dyn KeyValueStore,
    date: DateKey,
    words: &[WordEntry],
) -> Result<(), StoreError> {
    let mut list: Vec<HistoryEntry> = read_json_strict(store, KEY_HISTORY)?.unwrap_or_default();
    match list.first_mut() {
        Some(latest) if latest.date == date => latest.words = words.to_vec(),
        _ => list.insert(
            0,
            HistoryEntry {
                date,
                words: words.to_vec(),
            },
        ),
    }
    write_json(store, KEY_HISTORY, &list)
}

/// Stored as plain text rather than JSON.
pub fn last_date(store: &dyn KeyValueStore) -> Option<String> {
    store.get(KEY_LAST_DATE)
}

/// `None` when nothing is cached or the stored value is not a list.
pub fn today_words(store: &dyn KeyValueStore) -> Option<Vec<WordEntry>> {
    read_json(store, KEY_TODAY_WORDS)
}

pub fn save_today_words(
    store: &dyn KeyValueStore,
    date: DateKey,
    words: &[WordEntry],
) -> Result<(), StoreError> {
    write_json(store, KEY_TODAY_WORDS, words)?;
    store.set(KEY_LAST_DATE, date.to_string())
}

pub fn daily_word_count(store: &dyn KeyValueStore) -> usize {
    store
        .get(KEY_DAILY_WORD_COUNT)
        .and_then(|raw| raw.trim().parse::<usize>().ok())
        .filter(|count| *count > 0)
        .unwrap_or(DEFAULT_DAILY_COUNT)
}

pub fn set_daily_word_count(store: &dyn KeyValueStore, count: usize) -> Result<(), StoreError> {
    store.set(KEY_DAILY_WORD_COUNT, count.to_string())
}

pub fn dark_mode(store: &dyn KeyValueStore) -> bool {
    store.get(KEY_DARK_MODE).as_deref() == Some("true")
}

pub fn set_dark_mode(store: &dyn KeyValueStore, enabled: bool) -> Result<(), StoreError> {
    store.set(KEY_DARK_MODE, enabled.to_string())
}
