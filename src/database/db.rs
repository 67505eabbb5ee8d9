//! SQLite word store
//!
//! Handles database initialization, word CRUD, the review record log and the
//! selection queries used to build review batches.

use super::store::{ReviewLog, WordStore};
use crate::error::StoreError;
use crate::models::{
    HistorySummary, RecallStatus, ReviewRecord, ScheduleUpdate, SelectionMode, Word, NewWord,
    word::DEFAULT_INTERVAL_DAYS,
};
use chrono::{DateTime, SecondsFormat, Utc};
use rand::seq::SliceRandom;
use rusqlite::{Connection, OptionalExtension, Row, params};
use std::path::Path;

const WORD_COLUMNS: &str = "id, text, translation, example, phonetic, image_path, added_at, \
                            review_count, last_reviewed_at, next_due_at, review_interval";

/// Ordering of the wordbook listing.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum WordSort {
    #[default]
    AddedAt,
    Text,
    ReviewCount,
}

impl WordSort {
    fn order_clause(self) -> &'static str {
        match self {
            WordSort::AddedAt => "ORDER BY added_at DESC, id DESC",
            WordSort::Text => "ORDER BY text ASC",
            WordSort::ReviewCount => "ORDER BY review_count DESC, text ASC",
        }
    }
}

/// Result of adding a word whose text may already be stored.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Upsert {
    Inserted(i64),
    Updated(i64),
}

impl Upsert {
    pub fn id(self) -> i64 {
        match self {
            Upsert::Inserted(id) | Upsert::Updated(id) => id,
        }
    }
}

pub struct SqliteStore {
    conn: Connection,
}

/// Timestamps are stored with fixed precision so text order matches time order.
fn to_db_time(time: DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn from_db_time(text: &str) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(text)
        .map(|time| time.with_timezone(&Utc))
        .map_err(|_| StoreError::InvalidTimestamp(text.to_string()))
}

fn from_db_time_opt(text: Option<String>) -> Result<Option<DateTime<Utc>>, StoreError> {
    text.as_deref().map(from_db_time).transpose()
}

/// Raw `words` row, before timestamps are parsed.
struct WordRow {
    id: i64,
    text: String,
    translation: Option<String>,
    example: Option<String>,
    phonetic: Option<String>,
    image_path: Option<String>,
    added_at: String,
    review_count: u32,
    last_reviewed_at: Option<String>,
    next_due_at: Option<String>,
    review_interval: f64,
}

impl WordRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            text: row.get(1)?,
            translation: row.get(2)?,
            example: row.get(3)?,
            phonetic: row.get(4)?,
            image_path: row.get(5)?,
            added_at: row.get(6)?,
            review_count: row.get(7)?,
            last_reviewed_at: row.get(8)?,
            next_due_at: row.get(9)?,
            review_interval: row.get(10)?,
        })
    }

    fn into_word(self) -> Result<Word, StoreError> {
        Ok(Word {
            id: self.id,
            text: self.text,
            translation: self.translation,
            example: self.example,
            phonetic: self.phonetic,
            image_path: self.image_path,
            added_at: from_db_time(&self.added_at)?,
            review_count: self.review_count,
            last_reviewed_at: from_db_time_opt(self.last_reviewed_at)?,
            next_due_at: from_db_time_opt(self.next_due_at)?,
            review_interval: self.review_interval,
        })
    }
}

/// `LIKE` pattern matching `term` literally anywhere in the value.
fn contains_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

fn sql_limit(limit: Option<usize>) -> i64 {
    // SQLite treats a negative LIMIT as "no limit"
    limit.map_or(-1, |n| i64::try_from(n).unwrap_or(i64::MAX))
}

impl SqliteStore {
    /// Opens (or creates) the database file and makes sure the tables exist.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        let conn = Connection::open(path)?;
        tracing::info!("Opened word store at {}", path.display());
        Self::with_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    #[cfg(test)]
    pub(crate) fn conn(&self) -> &Connection {
        &self.conn
    }

    fn with_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS words (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                text TEXT NOT NULL UNIQUE,
                translation TEXT,
                example TEXT,
                phonetic TEXT,
                image_path TEXT,
                added_at TEXT NOT NULL,
                review_count INTEGER NOT NULL DEFAULT 0,
                last_reviewed_at TEXT,
                next_due_at TEXT,
                review_interval REAL NOT NULL DEFAULT 1.0 CHECK (review_interval > 0)
            )",
            (),
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS review_records (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                word_id INTEGER NOT NULL,
                recorded_at TEXT NOT NULL,
                status TEXT NOT NULL,
                FOREIGN KEY (word_id) REFERENCES words(id) ON DELETE CASCADE
            )",
            (),
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_review_records_word ON review_records(word_id)",
            (),
        )?;

        Ok(Self { conn })
    }

    /// Adds a word, or updates its details in place when the text is already stored.
    ///
    /// Scheduling fields and `added_at` of an existing word are left alone. An
    /// existing image link is kept when the new entry carries none.
    pub fn upsert_word(&self, word: &NewWord, now: DateTime<Utc>) -> Result<Upsert, StoreError> {
        let existing: Option<i64> = self
            .conn
            .query_row(
                "SELECT id FROM words WHERE text = ?1",
                params![word.text],
                |row| row.get(0),
            )
            .optional()?;

        match existing {
            Some(id) => {
                self.conn.execute(
                    "UPDATE words
                     SET translation = ?1, example = ?2, phonetic = ?3,
                         image_path = COALESCE(?4, image_path)
                     WHERE id = ?5",
                    params![word.translation, word.example, word.phonetic, word.image_path, id],
                )?;
                tracing::debug!("Updated word '{}' ({})", word.text, id);
                Ok(Upsert::Updated(id))
            }
            None => {
                self.conn.execute(
                    "INSERT INTO words (text, translation, example, phonetic, image_path, added_at, review_interval)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                    params![
                        word.text,
                        word.translation,
                        word.example,
                        word.phonetic,
                        word.image_path,
                        to_db_time(now),
                        DEFAULT_INTERVAL_DAYS
                    ],
                )?;
                let id = self.conn.last_insert_rowid();
                tracing::debug!("Added word '{}' ({})", word.text, id);
                Ok(Upsert::Inserted(id))
            }
        }
    }

    pub fn get_by_text(&self, text: &str) -> Result<Option<Word>, StoreError> {
        let sql = format!("SELECT {} FROM words WHERE text = ?1", WORD_COLUMNS);
        self.conn
            .query_row(&sql, params![text], WordRow::from_row)
            .optional()?
            .map(WordRow::into_word)
            .transpose()
    }

    /// Wordbook listing, optionally filtered by a substring of text or translation.
    pub fn list_words(&self, sort: WordSort, search: Option<&str>) -> Result<Vec<Word>, StoreError> {
        match search.filter(|term| !term.is_empty()) {
            Some(term) => {
                let sql = format!(
                    "SELECT {} FROM words
                     WHERE text LIKE ?1 ESCAPE '\\' OR translation LIKE ?1 ESCAPE '\\' {}",
                    WORD_COLUMNS,
                    sort.order_clause()
                );
                self.fetch_words(&sql, params![contains_pattern(term)])
            }
            None => {
                let sql = format!("SELECT {} FROM words {}", WORD_COLUMNS, sort.order_clause());
                self.fetch_words(&sql, [])
            }
        }
    }

    pub fn search(&self, term: &str) -> Result<Vec<Word>, StoreError> {
        self.list_words(WordSort::AddedAt, Some(term))
    }

    /// Removes every word linked to a photo. Returns how many were deleted.
    pub fn delete_by_image(&self, image_path: &str) -> Result<usize, StoreError> {
        let deleted = self
            .conn
            .execute("DELETE FROM words WHERE image_path = ?1", params![image_path])?;
        tracing::info!("Deleted {} words linked to {}", deleted, image_path);
        Ok(deleted)
    }

    /// Review records of a word, newest first.
    pub fn history(&self, word_id: i64) -> Result<Vec<ReviewRecord>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, word_id, recorded_at, status FROM review_records
             WHERE word_id = ?1
             ORDER BY recorded_at DESC, id DESC",
        )?;

        let rows = stmt
            .query_map(params![word_id], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                ))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        rows.into_iter()
            .map(|(id, word_id, recorded_at, status)| -> Result<ReviewRecord, StoreError> {
                Ok(ReviewRecord {
                    id,
                    word_id,
                    recorded_at: from_db_time(&recorded_at)?,
                    status: status.parse().map_err(StoreError::InvalidStatus)?,
                })
            })
            .collect()
    }

    pub fn history_summary(&self, word_id: i64) -> Result<HistorySummary, StoreError> {
        Ok(HistorySummary::from_records(&self.history(word_id)?))
    }

    pub fn word_count(&self) -> Result<usize, StoreError> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM words", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Number of words that are never reviewed or due at `now`.
    pub fn due_count(&self, now: DateTime<Utc>) -> Result<usize, StoreError> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM words WHERE next_due_at IS NULL OR next_due_at <= ?1",
            params![to_db_time(now)],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    fn fetch_words<P: rusqlite::Params>(&self, sql: &str, params: P) -> Result<Vec<Word>, StoreError> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt
            .query_map(params, WordRow::from_row)?
            .collect::<rusqlite::Result<Vec<WordRow>>>()?;
        rows.into_iter().map(WordRow::into_word).collect()
    }
}

impl WordStore for SqliteStore {
    fn get(&self, id: i64) -> Result<Option<Word>, StoreError> {
        let sql = format!("SELECT {} FROM words WHERE id = ?1", WORD_COLUMNS);
        self.conn
            .query_row(&sql, params![id], WordRow::from_row)
            .optional()?
            .map(WordRow::into_word)
            .transpose()
    }

    fn update_schedule(&self, update: &ScheduleUpdate) -> Result<(), StoreError> {
        write_schedule(&self.conn, update)
    }

    fn query(&self, mode: SelectionMode, limit: Option<usize>) -> Result<Vec<Word>, StoreError> {
        match mode {
            SelectionMode::AllWords => self.fetch_words(
                &format!("SELECT {} FROM words ORDER BY id ASC LIMIT ?1", WORD_COLUMNS),
                params![sql_limit(limit)],
            ),
            SelectionMode::RecentlyAdded => self.fetch_words(
                &format!(
                    "SELECT {} FROM words ORDER BY added_at DESC, id DESC LIMIT ?1",
                    WORD_COLUMNS
                ),
                params![sql_limit(limit)],
            ),
            SelectionMode::LeastReviewed => self.fetch_words(
                &format!(
                    "SELECT {} FROM words ORDER BY review_count ASC, added_at DESC, id DESC LIMIT ?1",
                    WORD_COLUMNS
                ),
                params![sql_limit(limit)],
            ),
            SelectionMode::RandomSample => {
                let mut words = self.fetch_words(
                    &format!("SELECT {} FROM words", WORD_COLUMNS),
                    [],
                )?;
                words.shuffle(&mut rand::rng());
                if let Some(n) = limit {
                    words.truncate(n);
                }
                Ok(words)
            }
            SelectionMode::Due { as_of } => self.fetch_words(
                &format!(
                    "SELECT {} FROM words
                     WHERE next_due_at IS NULL OR next_due_at <= ?1
                     ORDER BY next_due_at ASC, id ASC
                     LIMIT ?2",
                    WORD_COLUMNS
                ),
                params![to_db_time(as_of), sql_limit(limit)],
            ),
        }
    }

    fn delete(&self, id: i64) -> Result<bool, StoreError> {
        let deleted = self
            .conn
            .execute("DELETE FROM words WHERE id = ?1", params![id])?;
        if deleted > 0 {
            tracing::info!("Deleted word {}", id);
        }
        Ok(deleted > 0)
    }
}

impl ReviewLog for SqliteStore {
    fn append(&self, word_id: i64, status: RecallStatus, at: DateTime<Utc>) -> Result<i64, StoreError> {
        insert_record(&self.conn, word_id, status, at)
    }

    fn record_judgment(&self, update: &ScheduleUpdate, status: RecallStatus) -> Result<i64, StoreError> {
        // Dropping the transaction without commit rolls back the schedule write.
        let tx = self.conn.unchecked_transaction()?;
        write_schedule(&tx, update)?;
        let record_id = insert_record(&tx, update.word_id, status, update.last_reviewed_at)?;
        tx.commit()?;
        Ok(record_id)
    }
}

/// `review_count` is incremented in place so concurrent sessions never lose a judgment.
fn write_schedule(conn: &Connection, update: &ScheduleUpdate) -> Result<(), StoreError> {
    let changed = conn.execute(
        "UPDATE words
         SET review_interval = ?1, review_count = review_count + 1,
             last_reviewed_at = ?2, next_due_at = ?3
         WHERE id = ?4",
        params![
            update.review_interval,
            to_db_time(update.last_reviewed_at),
            to_db_time(update.next_due_at),
            update.word_id
        ],
    )?;

    if changed == 0 {
        return Err(StoreError::NotFound(update.word_id));
    }
    Ok(())
}

fn insert_record(
    conn: &Connection,
    word_id: i64,
    status: RecallStatus,
    at: DateTime<Utc>,
) -> Result<i64, StoreError> {
    conn.execute(
        "INSERT INTO review_records (word_id, recorded_at, status) VALUES (?1, ?2, ?3)",
        params![word_id, to_db_time(at), status.as_str()],
    )?;
    Ok(conn.last_insert_rowid())
}
