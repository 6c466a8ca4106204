use crate::data::WordEntry;
use crate::error::FetchError;
use crate::normalize::normalize_dictionary_entry;
use crate::sources::{DictionarySource, RandomWordSource, TopicRelation, TopicSource};
use futures_util::future::{join_all, try_join, try_join_all};
use std::collections::HashSet;
use tracing::{debug, warn};

pub const FALLBACK_WORDS: [&str; 5] = ["apple", "sky", "river", "music", "light"];
pub const DEFAULT_DAILY_COUNT: usize = 2;
pub const DEFAULT_MAX_ATTEMPTS: usize = 5;
pub const CATEGORY_DISPLAY_LIMIT: usize = 3;
const CANDIDATE_MULTIPLIER: usize = 3;

/// Requests `count` random words, substituting the fallback list on any failure.
pub async fn fetch_random_words(source: &dyn RandomWordSource, count: usize) -> Vec<String> {
    match source.random_words(count).await {
        Ok(words) => words,
        Err(err) => {
            warn!(error = %err, count, "random word service failed, using fallback list");
            fallback_words(count)
        }
    }
}

/// `count` words cycling through [`FALLBACK_WORDS`] from the start.
pub fn fallback_words(count: usize) -> Vec<String> {
    FALLBACK_WORDS
        .iter()
        .cycle()
        .take(count)
        .map(|word| word.to_string())
        .collect()
}

/// Keeps drawing random candidates until some have dictionary definitions.
///
/// Each attempt asks for three times `count` candidates and looks them all up
/// concurrently. The first attempt that yields any valid entry wins, so the
/// result can hold fewer than `count` words. An empty result means every
/// attempt came back without a single definition.
pub async fn fetch_valid_random_words(
    random: &dyn RandomWordSource,
    dictionary: &dyn DictionarySource,
    count: usize,
    max_attempts: usize,
) -> Vec<WordEntry> {
    for attempt in 1..=max_attempts {
        let candidates = fetch_random_words(random, count * CANDIDATE_MULTIPLIER).await;
        debug!(attempt, ?candidates, "candidate random words");

        let lookups = join_all(candidates.iter().map(|word| async move {
            match dictionary.lookup(word).await {
                Ok(payload) => {
                    let normalized = normalize_dictionary_entry(payload.as_ref());
                    if normalized.is_none() {
                        debug!(word = %word, "no definition");
                    }
                    normalized
                }
                Err(err) => {
                    debug!(word = %word, error = %err, "dictionary lookup failed");
                    None
                }
            }
        }))
        .await;

        let valid: Vec<WordEntry> = lookups.into_iter().flatten().take(count).collect();
        if !valid.is_empty() {
            return valid;
        }
    }
    warn!(count, max_attempts, "no valid words after all attempts");
    Vec::new()
}

/// Result of a topic lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CategoryWords {
    /// Up to [`CATEGORY_DISPLAY_LIMIT`] words related to the topic.
    Found(Vec<WordEntry>),
    /// Nothing related validated; generic random words instead.
    Fallback(Vec<WordEntry>),
}

impl CategoryWords {
    pub fn words(&self) -> &[WordEntry] {
        match self {
            CategoryWords::Found(words) | CategoryWords::Fallback(words) => words,
        }
    }
}

/// Words related to `topic`, validated against the dictionary.
///
/// Both topic queries run concurrently and either failing fails the whole
/// call, as does any dictionary transport error. There is no retry.
pub async fn fetch_category_words(
    topics: &dyn TopicSource,
    random: &dyn RandomWordSource,
    dictionary: &dyn DictionarySource,
    topic: &str,
) -> Result<CategoryWords, FetchError> {
    let (by_topic, means_like) = try_join(
        topics.related_words(topic, TopicRelation::Topic),
        topics.related_words(topic, TopicRelation::MeansLike),
    )
    .await?;

    let mut seen = HashSet::new();
    let candidates: Vec<String> = by_topic
        .into_iter()
        .chain(means_like)
        .filter(|word| seen.insert(word.to_lowercase()))
        .collect();
    debug!(topic, ?candidates, "category candidates");

    let lookups = try_join_all(candidates.iter().map(|word| async move {
        let payload = dictionary.lookup(word).await?;
        Ok::<_, FetchError>(normalize_dictionary_entry(payload.as_ref()))
    }))
    .await?;

    let valid: Vec<WordEntry> = lookups
        .into_iter()
        .flatten()
        .take(CATEGORY_DISPLAY_LIMIT)
        .collect();
    if !valid.is_empty() {
        return Ok(CategoryWords::Found(valid));
    }

    warn!(topic, "no valid words for topic, falling back to random words");
    let fallback = fetch_valid_random_words(
        random,
        dictionary,
        CATEGORY_DISPLAY_LIMIT,
        DEFAULT_MAX_ATTEMPTS,
    )
    .await;
    Ok(CategoryWords::Fallback(fallback))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{MapDictionary, ScriptedRandomWords, StaticTopics};

    #[test]
    fn fallback_cycles_from_the_start() {
        assert_eq!(
            fallback_words(7),
            vec!["apple", "sky", "river", "music", "light", "apple", "sky"]
        );
        assert!(fallback_words(0).is_empty());
    }

    #[tokio::test]
    async fn random_words_fall_back_on_failure() {
        let source = ScriptedRandomWords::failing();
        let words = fetch_random_words(&source, 5).await;
        assert_eq!(words, vec!["apple", "sky", "river", "music", "light"]);
        assert_eq!(source.requested(), vec![5]);
    }

    #[tokio::test]
    async fn random_words_pass_through_on_success() {
        let source = ScriptedRandomWords::new(vec![vec!["alpha", "beta"]]);
        assert_eq!(fetch_random_words(&source, 2).await, vec!["alpha", "beta"]);
    }

    #[tokio::test]
    async fn validated_fetch_requests_triple_and_truncates() {
        let random = ScriptedRandomWords::new(vec![vec![
            "alpha", "nope", "beta", "gamma", "delta", "zzz",
        ]]);
        let dictionary = MapDictionary::new()
            .with_entry("alpha", "First letter.", Some("Alpha male."))
            .with_entry("beta", "Second letter.", None)
            .with_entry("gamma", "Third letter.", None);

        let words = fetch_valid_random_words(&random, &dictionary, 2, 5).await;
        let names: Vec<_> = words.iter().map(WordEntry::word).collect();
        assert_eq!(names, vec!["alpha", "beta"]);
        assert_eq!(random.requested(), vec![6]);
        assert_eq!(dictionary.calls(), 6, "every candidate is looked up");
    }

    #[tokio::test]
    async fn validated_fetch_may_return_fewer_than_requested() {
        let random = ScriptedRandomWords::new(vec![vec!["alpha", "x", "y", "z", "q", "r"]]);
        let dictionary = MapDictionary::new().with_entry("alpha", "First letter.", None);
        let words = fetch_valid_random_words(&random, &dictionary, 2, 5).await;
        assert_eq!(words.len(), 1);
    }

    #[tokio::test]
    async fn validated_fetch_retries_until_something_validates() {
        let random = ScriptedRandomWords::new(vec![
            vec!["x", "y", "z"],
            vec!["q", "r", "s"],
            vec!["x", "beta", "z"],
        ]);
        let dictionary = MapDictionary::new().with_entry("beta", "Second letter.", None);
        let words = fetch_valid_random_words(&random, &dictionary, 1, 5).await;
        assert_eq!(words[0].word(), "beta");
        assert_eq!(random.requested(), vec![3, 3, 3]);
    }

    #[tokio::test]
    async fn validated_fetch_gives_up_after_max_attempts() {
        let random = ScriptedRandomWords::new(vec![vec!["x", "y", "z"]]);
        let dictionary = MapDictionary::new();
        let words = fetch_valid_random_words(&random, &dictionary, 1, 4).await;
        assert!(words.is_empty());
        assert_eq!(random.requested().len(), 4);
    }

    #[tokio::test]
    async fn validated_fetch_treats_lookup_errors_as_missing() {
        let random = ScriptedRandomWords::new(vec![vec!["river", "sky", "x"]]);
        let dictionary = MapDictionary::new()
            .failing_on("river")
            .with_entry("sky", "The expanse above.", None);
        let words = fetch_valid_random_words(&random, &dictionary, 1, 1).await;
        assert_eq!(words[0].word(), "sky");
    }

    #[tokio::test]
    async fn category_merges_dedupes_and_limits() {
        let topics = StaticTopics::new()
            .with(TopicRelation::Topic, "ocean", &["wave", "tide", "x"])
            .with(TopicRelation::MeansLike, "ocean", &["sea", "wave", "deep"]);
        let dictionary = MapDictionary::new()
            .with_entry("wave", "A moving ridge of water.", None)
            .with_entry("tide", "Rise and fall of the sea.", None)
            .with_entry("sea", "Salt water.", None)
            .with_entry("deep", "Far down.", None);
        let random = ScriptedRandomWords::failing();

        let result = fetch_category_words(&topics, &random, &dictionary, "ocean")
            .await
            .unwrap();
        let CategoryWords::Found(words) = result else {
            panic!("expected topic words");
        };
        let names: Vec<_> = words.iter().map(WordEntry::word).collect();
        assert_eq!(names, vec!["wave", "tide", "sea"]);
        assert_eq!(dictionary.calls(), 5, "duplicate `wave` is looked up once");
        assert!(random.requested().is_empty());
    }

    #[tokio::test]
    async fn category_falls_back_to_three_random_words() {
        let topics = StaticTopics::new().with(TopicRelation::Topic, "void", &["zzz"]);
        let random = ScriptedRandomWords::new(vec![vec![
            "apple", "sky", "river", "x", "y", "z", "q", "r", "s",
        ]]);
        let dictionary = MapDictionary::new()
            .with_entry("apple", "A fruit.", None)
            .with_entry("sky", "The expanse above.", None)
            .with_entry("river", "A large stream.", None);

        let result = fetch_category_words(&topics, &random, &dictionary, "void")
            .await
            .unwrap();
        assert!(matches!(result, CategoryWords::Fallback(_)));
        assert_eq!(result.words().len(), 3);
        assert_eq!(random.requested(), vec![9]);
    }

    #[tokio::test]
    async fn category_propagates_topic_failure() {
        let topics = StaticTopics::new().failing();
        let random = ScriptedRandomWords::failing();
        let dictionary = MapDictionary::new();
        let result = fetch_category_words(&topics, &random, &dictionary, "music").await;
        assert!(result.is_err());
        assert_eq!(dictionary.calls(), 0);
    }

    #[tokio::test]
    async fn category_propagates_dictionary_failure() {
        let topics = StaticTopics::new().with(TopicRelation::Topic, "music", &["jazz"]);
        let random = ScriptedRandomWords::failing();
        let dictionary = MapDictionary::new().failing_on("jazz");
        let result = fetch_category_words(&topics, &random, &dictionary, "music").await;
        assert!(result.is_err());
    }
}
