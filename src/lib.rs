pub mod config;
pub mod counter;
mod data;
pub mod date;
mod error;
mod normalize;
pub mod pages;
pub mod sources;
pub mod store;
pub mod words;

#[cfg(test)]
mod test_helpers;

#[cfg(feature = "web")]
pub mod web;

pub use config::AppConfig;
pub use data::{EXAMPLE_PLACEHOLDER, HistoryEntry, WordEntry};
pub use date::{Clock, DateKey, FixedClock, SystemClock};
pub use error::{FetchError, StoreError};
pub use normalize::normalize_dictionary_entry;
pub use pages::{CategoryOutcome, CategoryView, DailyWords, WordOfTheDay};
pub use sources::Sources;
pub use store::{FileStore, KeyValueStore, MemoryStore};

use std::sync::Arc;

/// Wires the configured HTTP sources and store to the system clock.
pub fn open(config: &AppConfig) -> Result<WordOfTheDay, Box<dyn std::error::Error + Send + Sync>> {
    let sources = Sources::from_config(config)?;
    let store: Arc<dyn KeyValueStore> = match &config.store_path {
        Some(path) => Arc::new(FileStore::open(path)?),
        None => Arc::new(MemoryStore::new()),
    };
    Ok(WordOfTheDay::new(sources, store, Arc::new(SystemClock)))
}
