//! The three-bucket self report a user gives for a word at review time.
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecallStatus {
    /// Remembered clearly.
    Recognized,
    /// Partially remembered.
    Fuzzy,
    /// Not remembered.
    Forgotten,
}

impl RecallStatus {
    pub const ALL: [RecallStatus; 3] = [
        RecallStatus::Recognized,
        RecallStatus::Fuzzy,
        RecallStatus::Forgotten,
    ];

    /// Name stored in the review record log.
    pub fn as_str(self) -> &'static str {
        match self {
            RecallStatus::Recognized => "recognized",
            RecallStatus::Fuzzy => "fuzzy",
            RecallStatus::Forgotten => "forgotten",
        }
    }

    /// Fuzzy and Forgotten words are replayed in a difficult-words restart.
    pub fn is_difficult(self) -> bool {
        !matches!(self, RecallStatus::Recognized)
    }
}

impl fmt::Display for RecallStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecallStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "recognized" => Ok(RecallStatus::Recognized),
            "fuzzy" => Ok(RecallStatus::Fuzzy),
            "forgotten" => Ok(RecallStatus::Forgotten),
            other => Err(other.to_string()),
        }
    }
}
