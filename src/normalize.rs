use crate::data::{RawDefinition, RawLexicalEntry, WordEntry};
use serde_json::Value;

/// Flattens a dictionary API response into a single [`WordEntry`].
///
/// The first definition (across all meaning groups) that carries a non-empty
/// example wins. Without any example, the first definition of the first group
/// that has definitions is used and the example falls back to the
/// placeholder. Anything that does not match the expected shape yields `None`.
pub fn normalize_dictionary_entry(payload: Option<&Value>) -> Option<WordEntry> {
    let first = payload?.as_array()?.first()?;
    let entry: RawLexicalEntry = serde_json::from_value(first.clone()).ok()?;
    let word = entry.word?;
    let meanings = entry.meanings.filter(|m| !m.is_empty())?;

    let with_example = meanings
        .iter()
        .filter_map(|meaning| meaning.definitions.as_deref())
        .find_map(|defs| defs.iter().find(|def| has_text(def.example.as_deref())));
    let chosen: &RawDefinition = match with_example {
        Some(def) => def,
        None => meanings
            .iter()
            .filter_map(|meaning| meaning.definitions.as_deref())
            .find_map(|defs| defs.first())?,
    };

    let meaning = chosen.definition.as_deref().filter(|d| !d.is_empty())?;
    let example = chosen.example.as_deref().filter(|e| !e.is_empty());
    Some(WordEntry::new(word, meaning, example))
}

fn has_text(value: Option<&str>) -> bool {
    value.is_some_and(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::EXAMPLE_PLACEHOLDER;
    use serde_json::json;

    fn normalize(value: Value) -> Option<WordEntry> {
        normalize_dictionary_entry(Some(&value))
    }

    #[test]
    fn prefers_first_definition_with_example() {
        let payload = json!([{
            "word": "light",
            "meanings": [
                {
                    "partOfSpeech": "noun",
                    "definitions": [
                        { "definition": "Visible electromagnetic radiation." },
                        { "definition": "A source of illumination.", "example": "Turn on the light." }
                    ]
                },
                {
                    "partOfSpeech": "adjective",
                    "definitions": [
                        { "definition": "Not heavy.", "example": "A light bag." }
                    ]
                }
            ]
        }]);
        let entry = normalize(payload).expect("normalized");
        assert_eq!(entry.word(), "light");
        assert_eq!(entry.meaning(), "A source of illumination.");
        assert_eq!(entry.example(), "Turn on the light.");
    }

    #[test]
    fn example_in_later_group_beats_exampleless_first_group() {
        let payload = json!([{
            "word": "river",
            "meanings": [
                { "definitions": [{ "definition": "A large stream." }] },
                { "definitions": [{ "definition": "To flow.", "example": "Rivers river." }] }
            ]
        }]);
        let entry = normalize(payload).unwrap();
        assert_eq!(entry.meaning(), "To flow.");
        assert_eq!(entry.example(), "Rivers river.");
    }

    #[test]
    fn empty_example_is_ignored() {
        let payload = json!([{
            "word": "sky",
            "meanings": [{ "definitions": [
                { "definition": "The expanse above.", "example": "" },
                { "definition": "Heaven.", "example": "Praise the sky." }
            ]}]
        }]);
        assert_eq!(normalize(payload).unwrap().meaning(), "Heaven.");
    }

    #[test]
    fn falls_back_to_first_definition_with_placeholder() {
        let payload = json!([{
            "word": "music",
            "meanings": [
                { "definitions": [
                    { "definition": "Organized sound." },
                    { "definition": "A musical score." }
                ]},
                { "definitions": [{ "definition": "Something pleasant." }] }
            ]
        }]);
        let entry = normalize(payload).unwrap();
        assert_eq!(entry.meaning(), "Organized sound.");
        assert_eq!(entry.example(), EXAMPLE_PLACEHOLDER);
    }

    #[test]
    fn skips_groups_without_definitions_when_falling_back() {
        let payload = json!([{
            "word": "apple",
            "meanings": [
                { "definitions": [] },
                { "definitions": [{ "definition": "A fruit." }] }
            ]
        }]);
        assert_eq!(normalize(payload).unwrap().meaning(), "A fruit.");
    }

    #[test]
    fn malformed_payloads_are_rejected() {
        assert!(normalize_dictionary_entry(None).is_none());
        assert!(normalize(Value::Null).is_none());
        assert!(normalize(json!([])).is_none());
        assert!(normalize(json!({ "title": "No Definitions Found" })).is_none());
        assert!(normalize(json!([{ "word": "x" }])).is_none());
        assert!(normalize(json!([{ "word": "x", "meanings": [] }])).is_none());
        assert!(normalize(json!([{ "word": "x", "meanings": "oops" }])).is_none());
        assert!(normalize(json!([{ "word": "x", "meanings": [{ "definitions": [{}] }] }])).is_none());
    }
}
