use crate::config::AppConfig;
use crate::data::TopicWord;
use crate::error::FetchError;
use async_trait::async_trait;
use lru::LruCache;
use parking_lot::Mutex;
use percent_encoding::{NON_ALPHANUMERIC, utf8_percent_encode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::num::NonZeroUsize;
use std::sync::Arc;
use tracing::debug;

const TOPIC_RESULT_LIMIT: usize = 10;
const TOPIC_VOCABULARY: &str = "enwiki";

/// Supplies random candidate words.
#[async_trait]
pub trait RandomWordSource: Send + Sync {
    async fn random_words(&self, count: usize) -> Result<Vec<String>, FetchError>;
}

/// Looks a word up in a dictionary service.
///
/// `Ok(None)` means the service answered but has no entry for the word.
#[async_trait]
pub trait DictionarySource: Send + Sync {
    async fn lookup(&self, word: &str) -> Result<Option<Value>, FetchError>;
}

/// How a topic query relates words to the topic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TopicRelation {
    /// Words that appear in the topic's context.
    Topic,
    /// Words with a similar meaning.
    MeansLike,
}

impl TopicRelation {
    fn query_key(&self) -> &'static str {
        match self {
            TopicRelation::Topic => "topics",
            TopicRelation::MeansLike => "ml",
        }
    }
}

/// Suggests words related to a topic.
#[async_trait]
pub trait TopicSource: Send + Sync {
    async fn related_words(
        &self,
        topic: &str,
        relation: TopicRelation,
    ) -> Result<Vec<String>, FetchError>;
}

/// The three upstream services a page needs, bundled for sharing.
#[derive(Clone)]
pub struct Sources {
    pub random: Arc<dyn RandomWordSource>,
    pub dictionary: Arc<dyn DictionarySource>,
    pub topics: Arc<dyn TopicSource>,
}

impl Sources {
    /// HTTP clients for the configured endpoints, with a cached dictionary.
    pub fn from_config(config: &AppConfig) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .user_agent(concat!("daily-words/", env!("CARGO_PKG_VERSION")))
            .build()?;
        let dictionary = DictionaryApi::new(client.clone(), config.dictionary_url.clone());
        Ok(Self {
            random: Arc::new(RandomWordApi::new(
                client.clone(),
                config.random_word_url.clone(),
            )),
            dictionary: Arc::new(CachedDictionary::new(
                dictionary,
                config.dictionary_cache_size,
            )),
            topics: Arc::new(TopicApi::new(client, config.topic_url.clone())),
        })
    }
}

#[derive(Clone)]
pub struct RandomWordApi {
    client: reqwest::Client,
    base_url: String,
}

impl RandomWordApi {
    pub fn new(client: reqwest::Client, base_url: String) -> Self {
        Self { client, base_url }
    }
}

#[async_trait]
impl RandomWordSource for RandomWordApi {
    async fn random_words(&self, count: usize) -> Result<Vec<String>, FetchError> {
        let response = self
            .client
            .get(&self.base_url)
            .query(&[("number", count)])
            .send()
            .await?;
        let response = ensure_success(response)?;
        decode_json(response).await
    }
}

#[derive(Clone)]
pub struct DictionaryApi {
    client: reqwest::Client,
    base_url: String,
}

impl DictionaryApi {
    pub fn new(client: reqwest::Client, base_url: String) -> Self {
        Self { client, base_url }
    }

    fn entry_url(&self, word: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            utf8_percent_encode(word, NON_ALPHANUMERIC)
        )
    }
}

#[async_trait]
impl DictionarySource for DictionaryApi {
    async fn lookup(&self, word: &str) -> Result<Option<Value>, FetchError> {
        let response = self.client.get(self.entry_url(word)).send().await?;
        if !response.status().is_success() {
            debug!(word, status = %response.status(), "dictionary has no entry");
            return Ok(None);
        }
        decode_json(response).await.map(Some)
    }
}

#[derive(Clone)]
pub struct TopicApi {
    client: reqwest::Client,
    base_url: String,
}

impl TopicApi {
    pub fn new(client: reqwest::Client, base_url: String) -> Self {
        Self { client, base_url }
    }
}

#[async_trait]
impl TopicSource for TopicApi {
    async fn related_words(
        &self,
        topic: &str,
        relation: TopicRelation,
    ) -> Result<Vec<String>, FetchError> {
        let max = TOPIC_RESULT_LIMIT.to_string();
        let response = self
            .client
            .get(&self.base_url)
            .query(&[
                (relation.query_key(), topic),
                ("max", max.as_str()),
                ("v", TOPIC_VOCABULARY),
            ])
            .send()
            .await?;
        let response = ensure_success(response)?;
        let rows: Vec<TopicWord> = decode_json(response).await?;
        Ok(rows.into_iter().map(|row| row.word).collect())
    }
}

fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, FetchError> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(FetchError::Status {
            url: response.url().to_string(),
            status,
        })
    }
}

async fn decode_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, FetchError> {
    let url = response.url().to_string();
    let body = response.text().await?;
    serde_json::from_str(&body).map_err(|err| FetchError::Decode(format!("{url}: {err}")))
}

/// Memoizes dictionary answers, including "no entry", in a bounded LRU.
///
/// Transport errors are never cached.
pub struct CachedDictionary<D> {
    inner: D,
    cache: Mutex<LruCache<String, Option<Value>>>,
}

impl<D> CachedDictionary<D> {
    pub fn new(inner: D, capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner,
            cache: Mutex::new(LruCache::new(capacity)),
        }
    }
}

#[async_trait]
impl<D: DictionarySource> DictionarySource for CachedDictionary<D> {
    async fn lookup(&self, word: &str) -> Result<Option<Value>, FetchError> {
        let key = word.to_lowercase();
        let cached = self.cache.lock().get(&key).cloned();
        if let Some(hit) = cached {
            return Ok(hit);
        }
        let value = self.inner.lookup(word).await?;
        self.cache.lock().put(key, value.clone());
        Ok(value)
    }
}
