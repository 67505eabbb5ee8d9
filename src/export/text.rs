//! Plain-text wordbook export, one `word<TAB>translation<TAB>example` line per word.

use crate::database::{SqliteStore, WordSort};
use crate::error::ExportError;
use crate::models::Word;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Tabs and newlines inside a field would break the line format.
fn clean_field(field: Option<&str>) -> String {
    field
        .unwrap_or_default()
        .replace(['\t', '\n', '\r'], " ")
}

pub fn format_line(word: &Word) -> String {
    format!(
        "{}\t{}\t{}",
        clean_field(Some(&word.text)),
        clean_field(word.translation.as_deref()),
        clean_field(word.example.as_deref())
    )
}

/// Writes every stored word, alphabetically. Returns the word count.
pub fn export_tsv_to_path(store: &SqliteStore, path: impl AsRef<Path>) -> Result<usize, ExportError> {
    let words = store.list_words(WordSort::Text, None)?;
    let mut writer = BufWriter::new(File::create(path.as_ref())?);
    for word in &words {
        writeln!(writer, "{}", format_line(word))?;
    }
    writer.flush()?;

    tracing::info!("Exported {} words to {}", words.len(), path.as_ref().display());
    Ok(words.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewWord;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_export_tsv() {
        let now = Utc.with_ymd_and_hms(2024, 7, 1, 0, 0, 0).unwrap();
        let store = SqliteStore::open_in_memory().unwrap();
        store
            .upsert_word(&NewWord::new("pear").with_translation("梨"), now)
            .unwrap();
        store
            .upsert_word(
                &NewWord::new("apple")
                    .with_translation("苹果")
                    .with_example("An apple\ta day."),
                now,
            )
            .unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wordbook.txt");
        assert_eq!(export_tsv_to_path(&store, &path).unwrap(), 2);

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents, "apple\t苹果\tAn apple a day.\npear\t梨\t\n");
    }
}
