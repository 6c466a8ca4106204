use std::env;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_RANDOM_WORD_URL: &str = "https://random-word-api.herokuapp.com/word";
pub const DEFAULT_DICTIONARY_URL: &str = "https://api.dictionaryapi.dev/api/v2/entries/en";
pub const DEFAULT_TOPIC_URL: &str = "https://api.datamuse.com/words";

/// Upstream endpoints, storage location and client limits.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub random_word_url: String,
    pub dictionary_url: String,
    pub topic_url: String,
    /// JSON file backing the key-value store. `None` keeps everything in memory.
    pub store_path: Option<PathBuf>,
    pub request_timeout: Duration,
    pub dictionary_cache_size: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            random_word_url: DEFAULT_RANDOM_WORD_URL.to_string(),
            dictionary_url: DEFAULT_DICTIONARY_URL.to_string(),
            topic_url: DEFAULT_TOPIC_URL.to_string(),
            store_path: None,
            request_timeout: Duration::from_secs(15),
            dictionary_cache_size: 512,
        }
    }
}

impl AppConfig {
    /// Defaults overridden by `DAILY_WORDS_*` environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let request_timeout = env::var("DAILY_WORDS_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(defaults.request_timeout);

        let dictionary_cache_size = env::var("DAILY_WORDS_CACHE_SIZE")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.dictionary_cache_size);

        Self {
            random_word_url: env::var("DAILY_WORDS_RANDOM_URL")
                .unwrap_or(defaults.random_word_url),
            dictionary_url: env::var("DAILY_WORDS_DICTIONARY_URL")
                .unwrap_or(defaults.dictionary_url),
            topic_url: env::var("DAILY_WORDS_TOPIC_URL").unwrap_or(defaults.topic_url),
            store_path: env::var_os("DAILY_WORDS_STORE")
                .map(PathBuf::from)
                .or(defaults.store_path),
            request_timeout,
            dictionary_cache_size,
        }
    }
}
