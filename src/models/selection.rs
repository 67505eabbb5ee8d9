//! How a review batch is picked from the word store.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer, de::Error};
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionMode {
    /// Store order.
    AllWords,
    /// Newest `added_at` first.
    RecentlyAdded,
    /// Lowest `review_count` first, newest first among ties.
    LeastReviewed,
    /// Fresh uniform shuffle on every request.
    RandomSample,
    /// Never-reviewed words, then words whose due date is at or before `as_of`.
    Due { as_of: DateTime<Utc> },
}

impl SelectionMode {
    /// Modes the review screen offers. `Due` is built on demand with the current time.
    pub const FIXED: [SelectionMode; 4] = [
        SelectionMode::AllWords,
        SelectionMode::RecentlyAdded,
        SelectionMode::LeastReviewed,
        SelectionMode::RandomSample,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            SelectionMode::AllWords => "All words",
            SelectionMode::RecentlyAdded => "Recently added",
            SelectionMode::LeastReviewed => "Least reviewed",
            SelectionMode::RandomSample => "Random sample",
            SelectionMode::Due { .. } => "Due now",
        }
    }
}

impl fmt::Display for SelectionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Number of words a review batch may hold.
///
/// Written as a plain number or the string `"all"` in config files.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BatchSize {
    Limit(usize),
    All,
}

impl BatchSize {
    pub const CHOICES: [BatchSize; 5] = [
        BatchSize::Limit(10),
        BatchSize::Limit(20),
        BatchSize::Limit(30),
        BatchSize::Limit(50),
        BatchSize::All,
    ];

    /// `None` means no limit.
    pub fn limit(self) -> Option<usize> {
        match self {
            BatchSize::Limit(n) => Some(n),
            BatchSize::All => None,
        }
    }
}

impl Default for BatchSize {
    fn default() -> Self {
        BatchSize::Limit(10)
    }
}

impl fmt::Display for BatchSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BatchSize::Limit(n) => write!(f, "{}", n),
            BatchSize::All => f.write_str("all"),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawBatchSize {
    Limit(usize),
    Word(String),
}

impl<'de> Deserialize<'de> for BatchSize {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match RawBatchSize::deserialize(deserializer)? {
            RawBatchSize::Limit(n) => Ok(BatchSize::Limit(n)),
            RawBatchSize::Word(word) if word.eq_ignore_ascii_case("all") => Ok(BatchSize::All),
            RawBatchSize::Word(word) => Err(D::Error::custom(format!(
                "expected a number or \"all\", found \"{}\"",
                word
            ))),
        }
    }
}

impl Serialize for BatchSize {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            BatchSize::Limit(n) => serializer.serialize_u64(*n as u64),
            BatchSize::All => serializer.serialize_str("all"),
        }
    }
}
