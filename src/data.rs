use crate::date::DateKey;
use serde::{Deserialize, Serialize};

pub const EXAMPLE_PLACEHOLDER: &str = "No example available.";

/// A normalized dictionary hit shown on every card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordEntry {
    word: String,
    meaning: String,
    #[serde(default = "placeholder_example")]
    example: String,
}

fn placeholder_example() -> String {
    EXAMPLE_PLACEHOLDER.to_string()
}

impl WordEntry {
    pub fn new(
        word: impl Into<String>,
        meaning: impl Into<String>,
        example: Option<impl Into<String>>,
    ) -> Self {
        Self {
            word: word.into(),
            meaning: meaning.into(),
            example: example
                .map(Into::into)
                .unwrap_or_else(|| EXAMPLE_PLACEHOLDER.to_string()),
        }
    }

    pub fn word(&self) -> &str {
        &self.word
    }

    pub fn meaning(&self) -> &str {
        &self.meaning
    }

    pub fn example(&self) -> &str {
        &self.example
    }

    /// Favorites are unique by word and meaning; the example is ignored.
    pub fn same_sense(&self, other: &WordEntry) -> bool {
        self.word == other.word && self.meaning == other.meaning
    }
}

/// The words served on one calendar day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub date: DateKey,
    #[serde(default)]
    pub words: Vec<WordEntry>,
}

// Upstream dictionary payload. Every field is optional so that partial or
// oddly shaped responses still deserialize and get rejected by the normalizer.

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawLexicalEntry {
    pub word: Option<String>,
    #[serde(default)]
    pub meanings: Option<Vec<RawMeaning>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawMeaning {
    #[serde(default)]
    pub definitions: Option<Vec<RawDefinition>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawDefinition {
    pub definition: Option<String>,
    pub example: Option<String>,
}

/// One row from the topic suggestion service.
#[derive(Debug, Clone, Deserialize)]
pub struct TopicWord {
    pub word: String,
}
