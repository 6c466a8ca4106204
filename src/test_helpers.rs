//! In-process stand-ins for the upstream word services.

use crate::error::FetchError;
use crate::sources::{DictionarySource, RandomWordSource, Sources, TopicRelation, TopicSource};
use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{Value, json};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

fn unavailable(what: &str) -> FetchError {
    FetchError::Decode(format!("{what} unavailable"))
}

/// Replays canned batches, repeating the last one once the script runs out.
#[derive(Clone, Default)]
pub struct ScriptedRandomWords {
    batches: Arc<Vec<Vec<String>>>,
    requested: Arc<Mutex<Vec<usize>>>,
}

impl ScriptedRandomWords {
    pub fn new(batches: Vec<Vec<&str>>) -> Self {
        Self {
            batches: Arc::new(
                batches
                    .into_iter()
                    .map(|batch| batch.into_iter().map(str::to_string).collect())
                    .collect(),
            ),
            requested: Arc::default(),
        }
    }

    /// Every request errors.
    pub fn failing() -> Self {
        Self::default()
    }

    pub fn requested(&self) -> Vec<usize> {
        self.requested.lock().clone()
    }
}

#[async_trait]
impl RandomWordSource for ScriptedRandomWords {
    async fn random_words(&self, count: usize) -> Result<Vec<String>, FetchError> {
        let call = {
            let mut requested = self.requested.lock();
            requested.push(count);
            requested.len() - 1
        };
        if self.batches.is_empty() {
            return Err(unavailable("random words"));
        }
        let idx = call.min(self.batches.len() - 1);
        Ok(self.batches[idx].clone())
    }
}

/// Dictionary answering from a fixed word list, counting every lookup.
#[derive(Clone, Default)]
pub struct MapDictionary {
    entries: HashMap<String, Value>,
    failing: HashSet<String>,
    calls: Arc<AtomicUsize>,
}

impl MapDictionary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entry(mut self, word: &str, definition: &str, example: Option<&str>) -> Self {
        let mut def = json!({ "definition": definition });
        if let Some(example) = example {
            def["example"] = json!(example);
        }
        self.entries.insert(
            word.to_string(),
            json!([{ "word": word, "meanings": [{ "partOfSpeech": "noun", "definitions": [def] }] }]),
        );
        self
    }

    pub fn failing_on(mut self, word: &str) -> Self {
        self.failing.insert(word.to_string());
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DictionarySource for MapDictionary {
    async fn lookup(&self, word: &str) -> Result<Option<Value>, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.contains(word) {
            return Err(unavailable("dictionary"));
        }
        Ok(self.entries.get(&word.to_lowercase()).cloned())
    }
}

/// Topic service with canned answers per (relation, topic).
#[derive(Clone, Default)]
pub struct StaticTopics {
    answers: HashMap<(TopicRelation, String), Vec<String>>,
    fail: bool,
    calls: Arc<AtomicUsize>,
}

impl StaticTopics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, relation: TopicRelation, topic: &str, words: &[&str]) -> Self {
        self.answers.insert(
            (relation, topic.to_string()),
            words.iter().map(|w| w.to_string()).collect(),
        );
        self
    }

    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TopicSource for StaticTopics {
    async fn related_words(
        &self,
        topic: &str,
        relation: TopicRelation,
    ) -> Result<Vec<String>, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(unavailable("topics"));
        }
        Ok(self
            .answers
            .get(&(relation, topic.to_string()))
            .cloned()
            .unwrap_or_default())
    }
}

/// Fakes wired into [`Sources`], with handles kept for assertions.
pub struct FakeSources {
    pub random: ScriptedRandomWords,
    pub dictionary: MapDictionary,
    pub topics: StaticTopics,
}

impl FakeSources {
    pub fn new(
        random: ScriptedRandomWords,
        dictionary: MapDictionary,
        topics: StaticTopics,
    ) -> Self {
        Self {
            random,
            dictionary,
            topics,
        }
    }

    pub fn sources(&self) -> Sources {
        Sources {
            random: Arc::new(self.random.clone()),
            dictionary: Arc::new(self.dictionary.clone()),
            topics: Arc::new(self.topics.clone()),
        }
    }

    /// Total upstream requests of any kind.
    pub fn network_calls(&self) -> usize {
        self.random.requested().len() + self.dictionary.calls() + self.topics.calls()
    }
}
