//! Boundary to the vision/dictionary service and the flow that turns a
//! recognized photo into stored words.
//!
//! The HTTP client lives outside this crate. Implementations of
//! [`RecognitionGateway`] hand back the model's raw reply text, which is parsed
//! here.

use crate::database::{SqliteStore, Upsert};
use crate::error::RecognitionError;
use crate::models::NewWord;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;
use std::path::Path;

/// A word found in a photo and where its label should be drawn.
#[derive(Clone, Debug, PartialEq)]
pub struct RecognizedWord {
    pub text: String,
    pub position: (f64, f64),
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Recognition {
    pub words: Vec<RecognizedWord>,
    /// One sentence describing the scene using the recognized words.
    pub description: String,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct WordDetails {
    #[serde(default)]
    pub translation: String,
    #[serde(default)]
    pub phonetic: String,
    #[serde(default)]
    pub example: String,
}

pub trait RecognitionGateway {
    /// Raw reply for "which words are in this image".
    fn recognize(&self, image: &Path) -> Result<String, RecognitionError>;

    /// Raw reply for "translation, phonetic and example of this word".
    fn lookup(&self, word: &str) -> Result<String, RecognitionError>;
}

/// Models often wrap JSON replies in a markdown code fence.
fn strip_code_fence(reply: &str) -> &str {
    let trimmed = reply.trim();
    let trimmed = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .unwrap_or(trimmed);
    trimmed.strip_suffix("```").unwrap_or(trimmed).trim()
}

/// Parses `[{"word": .., "position": [x, y]}, .., {"sentence": ..}]`.
///
/// Items that are neither a positioned word nor a sentence are skipped.
pub fn parse_recognition(reply: &str) -> Result<Recognition, RecognitionError> {
    let value: Value = serde_json::from_str(strip_code_fence(reply))?;
    let items = value
        .as_array()
        .ok_or_else(|| RecognitionError::MalformedPayload("expected a JSON array".to_string()))?;

    let mut recognition = Recognition::default();
    for item in items {
        if let (Some(word), Some(position)) = (item.get("word"), item.get("position")) {
            let Some(text) = word.as_str().map(str::trim).filter(|t| !t.is_empty()) else {
                continue;
            };
            let Some(position) = parse_position(position) else {
                tracing::warn!("Skipping '{}': unreadable position {}", text, position);
                continue;
            };
            recognition.words.push(RecognizedWord {
                text: text.to_string(),
                position,
            });
        } else if let Some(sentence) = item.get("sentence").and_then(Value::as_str) {
            recognition.description = sentence.to_string();
        }
    }
    Ok(recognition)
}

fn parse_position(value: &Value) -> Option<(f64, f64)> {
    match value.as_array()?.as_slice() {
        [x, y] => Some((x.as_f64()?, y.as_f64()?)),
        _ => None,
    }
}

/// Parses `{"translation": .., "phonetic": .., "example": ..}`; missing keys become empty.
pub fn parse_word_details(reply: &str) -> Result<WordDetails, RecognitionError> {
    Ok(serde_json::from_str(strip_code_fence(reply))?)
}

/// What happened to each word of an ingested photo.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct IngestReport {
    pub description: String,
    pub added: Vec<String>,
    pub updated: Vec<String>,
    /// Words stored without details because the lookup failed.
    pub lookup_failed: Vec<String>,
}

/// Recognizes the words in `image`, looks each one up and stores it linked to the photo.
///
/// A failed recognition aborts the whole ingestion. A failed lookup only costs
/// that word its details.
pub fn ingest_image<G: RecognitionGateway + ?Sized>(
    store: &SqliteStore,
    gateway: &G,
    image: &Path,
    now: DateTime<Utc>,
) -> Result<IngestReport, RecognitionError> {
    let recognition = parse_recognition(&gateway.recognize(image)?)?;
    tracing::info!(
        "Recognized {} words in {}",
        recognition.words.len(),
        image.display()
    );

    let image_path = image.to_string_lossy().into_owned();
    let mut report = IngestReport {
        description: recognition.description,
        ..Default::default()
    };

    for word in recognition.words {
        let mut entry = NewWord::new(word.text.clone()).with_image(image_path.clone());
        match gateway.lookup(&word.text).and_then(|reply| parse_word_details(&reply)) {
            Ok(details) => {
                entry.translation = non_empty(details.translation);
                entry.phonetic = non_empty(details.phonetic);
                entry.example = non_empty(details.example);
            }
            Err(e) => {
                tracing::warn!("Lookup of '{}' failed: {}", word.text, e);
                report.lookup_failed.push(word.text.clone());
            }
        }

        match store.upsert_word(&entry, now)? {
            Upsert::Inserted(_) => report.added.push(word.text),
            Upsert::Updated(_) => report.updated.push(word.text),
        }
    }
    Ok(report)
}

fn non_empty(value: String) -> Option<String> {
    if value.trim().is_empty() { None } else { Some(value) }
}
