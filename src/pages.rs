use crate::data::{HistoryEntry, WordEntry};
use crate::date::{Clock, DateKey};
use crate::error::StoreError;
use crate::sources::Sources;
use crate::store::{self, KeyValueStore};
use crate::words::{self, CategoryWords, DEFAULT_MAX_ATTEMPTS};
use parking_lot::Mutex;
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

const MAX_DAILY_WORDS: usize = 10;

/// What the daily page should show.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "words", rename_all = "snake_case")]
pub enum DailyWords {
    /// Served from today's cache without touching the network.
    Cached(Vec<WordEntry>),
    /// Freshly fetched and persisted.
    Fresh(Vec<WordEntry>),
    /// Nothing validated after every attempt.
    Unavailable,
}

impl DailyWords {
    pub fn words(&self) -> &[WordEntry] {
        match self {
            DailyWords::Cached(words) | DailyWords::Fresh(words) => words,
            DailyWords::Unavailable => &[],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CategoryOutcome {
    Found { words: Vec<WordEntry> },
    Fallback { words: Vec<WordEntry> },
    Failed { message: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryView {
    pub topic: String,
    #[serde(flatten)]
    pub outcome: CategoryOutcome,
}

/// Page entry points over one store and one set of upstream services.
pub struct WordOfTheDay {
    sources: Sources,
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    last_category: Mutex<Option<String>>,
}

impl WordOfTheDay {
    pub fn new(sources: Sources, store: Arc<dyn KeyValueStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            sources,
            store,
            clock,
            last_category: Mutex::new(None),
        }
    }

    pub fn store(&self) -> &dyn KeyValueStore {
        self.store.as_ref()
    }

    pub fn today(&self) -> DateKey {
        DateKey::today(self.clock.as_ref())
    }

    /// Today's words, from cache when the cache is for today.
    pub async fn load_words(&self) -> Result<DailyWords, StoreError> {
        let today = self.today();
        let store = self.store();
        let fresh_cache = store::last_date(store).is_some_and(|date| date == today.to_string());
        if fresh_cache {
            if let Some(words) = store::today_words(store).filter(|w| !w.is_empty()) {
                return Ok(DailyWords::Cached(words));
            }
        }

        let count = store::daily_word_count(store);
        let words = words::fetch_valid_random_words(
            self.sources.random.as_ref(),
            self.sources.dictionary.as_ref(),
            count,
            DEFAULT_MAX_ATTEMPTS,
        )
        .await;
        if words.is_empty() {
            warn!(%today, count, "could not assemble daily words");
            return Ok(DailyWords::Unavailable);
        }

        store::save_today_words(store, today, &words)?;
        store::push_today_to_history(store, today, &words)?;
        info!(%today, count = words.len(), "stored daily words");
        Ok(DailyWords::Fresh(words))
    }

    pub fn load_history(&self) -> Vec<HistoryEntry> {
        store::history(self.store())
    }

    pub fn load_favorites(&self) -> Vec<WordEntry> {
        store::favorites(self.store())
    }

    /// Words for `topic`, remembered for [`Self::refresh_category`].
    pub async fn load_category(&self, topic: &str) -> CategoryView {
        let topic = topic.trim().to_string();
        *self.last_category.lock() = Some(topic.clone());

        let result = words::fetch_category_words(
            self.sources.topics.as_ref(),
            self.sources.random.as_ref(),
            self.sources.dictionary.as_ref(),
            &topic,
        )
        .await;
        let outcome = match result {
            Ok(CategoryWords::Found(words)) => CategoryOutcome::Found { words },
            Ok(CategoryWords::Fallback(words)) => CategoryOutcome::Fallback { words },
            Err(err) => {
                warn!(topic = %topic, error = %err, "category load failed");
                CategoryOutcome::Failed {
                    message: format!("⚠ Could not load words for {topic}."),
                }
            }
        };
        CategoryView { topic, outcome }
    }

    /// Re-runs the most recent category; `None` before any category was loaded.
    pub async fn refresh_category(&self) -> Option<CategoryView> {
        let topic = self.last_category.lock().clone()?;
        Some(self.load_category(&topic).await)
    }

    pub fn last_category(&self) -> Option<String> {
        self.last_category.lock().clone()
    }

    pub fn add_favorite(&self, entry: &WordEntry) -> Result<bool, StoreError> {
        store::save_favorite(self.store(), entry)
    }

    pub fn dark_mode(&self) -> bool {
        store::dark_mode(self.store())
    }

    pub fn set_dark_mode(&self, enabled: bool) -> Result<(), StoreError> {
        store::set_dark_mode(self.store(), enabled)
    }

    pub fn daily_word_count(&self) -> usize {
        store::daily_word_count(self.store())
    }

    pub fn set_daily_word_count(&self, count: usize) -> Result<usize, StoreError> {
        let count = count.clamp(1, MAX_DAILY_WORDS);
        store::set_daily_word_count(self.store(), count)?;
        Ok(count)
    }
}
