//! Vocabulary card: a hanzi/english pair plus optional study aids.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Content fields of a card, as entered by the user or read from an export file.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NewCard {
    pub hanzi: String,
    pub english: String,
    pub pinyin: String,
    pub traditional: String,
    pub measure_word: String,
    pub part_of_speech: String,
    pub example_sentence: String,
    pub notes: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub base64_audio: String,
}

impl NewCard {
    pub fn new(hanzi: &str, english: &str) -> Self {
        Self {
            hanzi: hanzi.to_string(),
            english: english.to_string(),
            ..Default::default()
        }
    }

    pub fn with_pinyin(mut self, pinyin: &str) -> Self {
        self.pinyin = pinyin.to_string();
        self
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Card {
    pub id: i64,
    pub deck_id: i64,
    #[serde(flatten)]
    pub content: NewCard,
    pub is_archived: bool,
    pub created_at: DateTime<Utc>,
}

/// Card joined with the two progress columns list views need.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CardWithProgress {
    #[serde(flatten)]
    pub card: Card,
    pub srs_level: Option<u32>,
    pub next_review: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_card_defaults() {
        let card = NewCard::new("你好", "hello").with_pinyin("nǐ hǎo");

        assert_eq!(card.hanzi, "你好");
        assert_eq!(card.english, "hello");
        assert_eq!(card.pinyin, "nǐ hǎo");
        assert!(card.notes.is_empty());
    }

    #[test]
    fn test_missing_fields_deserialize_empty() {
        let card: NewCard =
            serde_json::from_str(r#"{"hanzi": "谢谢", "english": "thanks"}"#).unwrap();
        assert_eq!(card.hanzi, "谢谢");
        assert!(card.measure_word.is_empty());
        assert!(card.base64_audio.is_empty());
    }
}
