//! JSON import/export of the wordbook.
//! Only the word details travel; scheduling state stays in the local store.

use crate::database::{SqliteStore, Upsert, WordSort};
use crate::error::ExportError;
use crate::models::NewWord;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Wordbook {
    pub words: Vec<NewWord>,
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub added: usize,
    pub updated: usize,
}

/// Writes every stored word, alphabetically, to a JSON file. Returns the word count.
pub fn export_json_to_path(store: &SqliteStore, path: impl AsRef<Path>) -> Result<usize, ExportError> {
    let words = store
        .list_words(WordSort::Text, None)?
        .into_iter()
        .map(|word| NewWord {
            text: word.text,
            translation: word.translation,
            example: word.example,
            phonetic: word.phonetic,
            image_path: word.image_path,
        })
        .collect::<Vec<_>>();

    let count = words.len();
    let json_string = serde_json::to_string_pretty(&Wordbook { words })?;
    let mut file = File::create(path.as_ref())?;
    file.write_all(json_string.as_bytes())?;

    tracing::info!("Exported {} words to {}", count, path.as_ref().display());
    Ok(count)
}

/// Reads a JSON wordbook and upserts each entry by text.
pub fn import_json(
    store: &SqliteStore,
    path: impl AsRef<Path>,
    now: DateTime<Utc>,
) -> Result<ImportSummary, ExportError> {
    let mut file = File::open(path.as_ref())?;
    let mut contents = String::new();
    file.read_to_string(&mut contents)?;

    let wordbook: Wordbook = serde_json::from_str(&contents)?;

    let mut summary = ImportSummary::default();
    for word in wordbook.words.iter().filter(|w| !w.text.trim().is_empty()) {
        match store.upsert_word(word, now)? {
            Upsert::Inserted(_) => summary.added += 1,
            Upsert::Updated(_) => summary.updated += 1,
        }
    }

    tracing::info!(
        "Imported {} new and {} updated words from {}",
        summary.added,
        summary.updated,
        path.as_ref().display()
    );
    Ok(summary)
}
