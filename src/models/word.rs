//! Word is a learnable vocabulary entry plus the fields the scheduler owns.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Interval assigned to every freshly added word, in days.
pub const DEFAULT_INTERVAL_DAYS: f64 = 1.0;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Word {
    pub id: i64,
    pub text: String,
    pub translation: Option<String>,
    pub example: Option<String>,
    pub phonetic: Option<String>,
    pub image_path: Option<String>,
    pub added_at: DateTime<Utc>,
    pub review_count: u32,
    pub last_reviewed_at: Option<DateTime<Utc>>,
    pub next_due_at: Option<DateTime<Utc>>,
    pub review_interval: f64,
}

impl Word {
    /// True when the word has never been judged or its due date has passed.
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.next_due_at.is_none_or(|due| due <= now)
    }
}

/// Fields supplied when a word is added to the store.
///
/// A second insert with the same `text` updates the details in place and keeps
/// the scheduling fields untouched.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct NewWord {
    pub text: String,
    #[serde(default)]
    pub translation: Option<String>,
    #[serde(default)]
    pub example: Option<String>,
    #[serde(default)]
    pub phonetic: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_path: Option<String>,
}

impl NewWord {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    pub fn with_translation(mut self, translation: impl Into<String>) -> Self {
        self.translation = Some(translation.into());
        self
    }

    pub fn with_example(mut self, example: impl Into<String>) -> Self {
        self.example = Some(example.into());
        self
    }

    pub fn with_image(mut self, image_path: impl Into<String>) -> Self {
        self.image_path = Some(image_path.into());
        self
    }
}
