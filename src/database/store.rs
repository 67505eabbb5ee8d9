//! Persistence seams the review session depends on.

use crate::error::StoreError;
use crate::models::{RecallStatus, ScheduleUpdate, SelectionMode, Word};
use chrono::{DateTime, Utc};

/// Table of learnable words with their scheduling fields.
pub trait WordStore {
    fn get(&self, id: i64) -> Result<Option<Word>, StoreError>;

    /// Writes the schedule of one word as a single atomic row update.
    fn update_schedule(&self, update: &ScheduleUpdate) -> Result<(), StoreError>;

    /// Words ordered as `mode` requires, at most `limit` of them (`None` = no limit).
    fn query(&self, mode: SelectionMode, limit: Option<usize>) -> Result<Vec<Word>, StoreError>;

    /// Deletes a word together with its review records. Returns false if it did not exist.
    fn delete(&self, id: i64) -> Result<bool, StoreError>;
}

/// Append-only log of recall judgments.
pub trait ReviewLog {
    fn append(&self, word_id: i64, status: RecallStatus, at: DateTime<Utc>) -> Result<i64, StoreError>;

    /// Writes a judged word's new schedule and its log entry as one unit.
    ///
    /// Either both land or neither does. Returns the id of the log entry.
    fn record_judgment(&self, update: &ScheduleUpdate, status: RecallStatus) -> Result<i64, StoreError>;
}
