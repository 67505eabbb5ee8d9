use super::RecallStatus;
use chrono::{DateTime, Utc};

/// One entry of the append-only judgment log.
#[derive(Clone, Debug, PartialEq)]
pub struct ReviewRecord {
    pub id: i64,
    pub word_id: i64,
    pub recorded_at: DateTime<Utc>,
    pub status: RecallStatus,
}

/// Count of logged judgments per status for one word.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct HistorySummary {
    pub recognized: usize,
    pub fuzzy: usize,
    pub forgotten: usize,
}

impl HistorySummary {
    pub fn from_records(records: &[ReviewRecord]) -> Self {
        let mut summary = Self::default();
        for record in records {
            match record.status {
                RecallStatus::Recognized => summary.recognized += 1,
                RecallStatus::Fuzzy => summary.fuzzy += 1,
                RecallStatus::Forgotten => summary.forgotten += 1,
            }
        }
        summary
    }

    pub fn total(&self) -> usize {
        self.recognized + self.fuzzy + self.forgotten
    }
}
