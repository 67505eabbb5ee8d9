//! Interval scheduling for recall judgments.
//!
//! Each word carries a review interval in days. A judgment rescales it:
//! - Recognized: the interval doubles, so successful words drift further apart
//! - Fuzzy: the interval stays as it is
//! - Forgotten: the interval halves, but never drops below one day
//!
//! The next due date is always `now + new interval`.

use super::{RecallStatus, Word};
use chrono::{DateTime, TimeDelta, Utc};

/// Lower bound for any interval the scheduler hands out, in days.
pub const MIN_INTERVAL_DAYS: f64 = 1.0;

/// Upper bound; doubling saturates here instead of overflowing to infinity.
pub const MAX_INTERVAL_DAYS: f64 = f64::MAX;

const MILLIS_PER_DAY: f64 = 24.0 * 60.0 * 60.0 * 1000.0;

/// 9999-12-31T23:59:59Z, the last instant that still round-trips through RFC 3339 text.
const LATEST_DUE_SECS: i64 = 253_402_300_799;

/// Scheduling fields written back to the store after a judgment.
#[derive(Clone, Debug, PartialEq)]
pub struct ScheduleUpdate {
    pub word_id: i64,
    pub review_interval: f64,
    pub review_count: u32,
    pub last_reviewed_at: DateTime<Utc>,
    pub next_due_at: DateTime<Utc>,
}

impl ScheduleUpdate {
    /// Copies the new schedule onto an in-memory word.
    pub fn apply_to(&self, word: &mut Word) {
        word.review_interval = self.review_interval;
        word.review_count = self.review_count;
        word.last_reviewed_at = Some(self.last_reviewed_at);
        word.next_due_at = Some(self.next_due_at);
    }
}

/// Returns the interval that follows `current` after a judgment.
///
/// A non-positive or NaN `current` is treated as one day, an infinite one as
/// [`MAX_INTERVAL_DAYS`].
pub fn next_interval(current: f64, status: RecallStatus) -> f64 {
    let current = if current.is_nan() || current <= 0.0 {
        MIN_INTERVAL_DAYS
    } else {
        current.min(MAX_INTERVAL_DAYS)
    };

    match status {
        RecallStatus::Recognized => (current * 2.0).min(MAX_INTERVAL_DAYS),
        RecallStatus::Fuzzy => current,
        RecallStatus::Forgotten => (current / 2.0).max(MIN_INTERVAL_DAYS),
    }
}

/// Latest due date the scheduler will hand out.
pub fn latest_due() -> DateTime<Utc> {
    DateTime::from_timestamp(LATEST_DUE_SECS, 0).unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// Adds `days` to `now`, saturating at [`latest_due`].
pub fn due_after(now: DateTime<Utc>, days: f64) -> DateTime<Utc> {
    let latest = latest_due();
    let millis = (days * MILLIS_PER_DAY).round();
    if millis >= i64::MAX as f64 {
        return latest;
    }

    TimeDelta::try_milliseconds(millis as i64)
        .and_then(|delta| now.checked_add_signed(delta))
        .map_or(latest, |due| due.min(latest))
}

/// Calculates the schedule a word gets when judged at `now`.
pub fn calculate_next_review(word: &Word, status: RecallStatus, now: DateTime<Utc>) -> ScheduleUpdate {
    let review_interval = next_interval(word.review_interval, status);

    ScheduleUpdate {
        word_id: word.id,
        review_interval,
        review_count: word.review_count.saturating_add(1),
        last_reviewed_at: now,
        next_due_at: due_after(now, review_interval),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::word::DEFAULT_INTERVAL_DAYS;
    use chrono::{Duration, TimeZone};

    fn word_with_interval(interval: f64) -> Word {
        Word {
            id: 7,
            text: "window".to_string(),
            translation: None,
            example: None,
            phonetic: None,
            image_path: None,
            added_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            review_count: 3,
            last_reviewed_at: None,
            next_due_at: None,
            review_interval: interval,
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 10, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_recognized_doubles() {
        for i in [0.5, 1.0, 3.0, 17.25, 400.0] {
            assert_eq!(next_interval(i, RecallStatus::Recognized), 2.0 * i);
        }
    }

    #[test]
    fn test_fuzzy_keeps_interval() {
        for i in [0.5, 1.0, 3.0, 17.25] {
            assert_eq!(next_interval(i, RecallStatus::Fuzzy), i);
        }
    }

    #[test]
    fn test_forgotten_halves_with_floor() {
        assert_eq!(next_interval(8.0, RecallStatus::Forgotten), 4.0);
        assert_eq!(next_interval(3.0, RecallStatus::Forgotten), 1.5);
        assert_eq!(next_interval(1.5, RecallStatus::Forgotten), 1.0);
        assert_eq!(next_interval(1.0, RecallStatus::Forgotten), 1.0);
        assert_eq!(next_interval(0.5, RecallStatus::Forgotten), 1.0);
    }

    #[test]
    fn test_repeated_forgetting_stays_at_floor() {
        let once = next_interval(1.0, RecallStatus::Forgotten);
        let twice = next_interval(once, RecallStatus::Forgotten);
        let thrice = next_interval(twice, RecallStatus::Forgotten);
        assert_eq!(thrice, 1.0);
    }

    #[test]
    fn test_judgments_are_ordered_by_recall() {
        for i in [1.5, 2.0, 6.0, 90.0] {
            let recognized = next_interval(i, RecallStatus::Recognized);
            let fuzzy = next_interval(i, RecallStatus::Fuzzy);
            let forgotten = next_interval(i, RecallStatus::Forgotten);
            assert!(recognized > fuzzy);
            assert!(fuzzy > forgotten);
        }
    }

    #[test]
    fn test_degenerate_interval_is_clamped() {
        assert_eq!(next_interval(0.0, RecallStatus::Fuzzy), 1.0);
        assert_eq!(next_interval(-4.0, RecallStatus::Recognized), 2.0);
        assert_eq!(next_interval(f64::NAN, RecallStatus::Forgotten), 1.0);
    }

    #[test]
    fn test_interval_saturates_instead_of_overflowing() {
        let top = next_interval(f64::MAX, RecallStatus::Recognized);
        assert_eq!(top, MAX_INTERVAL_DAYS);
        assert_eq!(next_interval(top, RecallStatus::Recognized), MAX_INTERVAL_DAYS);
        assert_eq!(next_interval(f64::INFINITY, RecallStatus::Recognized), MAX_INTERVAL_DAYS);
        assert_eq!(next_interval(f64::INFINITY, RecallStatus::Fuzzy), MAX_INTERVAL_DAYS);

        let forgotten = next_interval(top, RecallStatus::Forgotten);
        assert!(forgotten.is_finite());
        assert!(forgotten < top);
    }

    #[test]
    fn test_calculate_next_review_updates_word_fields() {
        let word = word_with_interval(DEFAULT_INTERVAL_DAYS);
        let update = calculate_next_review(&word, RecallStatus::Recognized, now());

        assert_eq!(update.word_id, 7);
        assert_eq!(update.review_interval, 2.0);
        assert_eq!(update.review_count, 4);
        assert_eq!(update.last_reviewed_at, now());
        assert_eq!(update.next_due_at, now() + Duration::days(2));
    }

    #[test]
    fn test_fractional_interval_due_date() {
        let word = word_with_interval(3.0);
        let update = calculate_next_review(&word, RecallStatus::Forgotten, now());

        assert_eq!(update.review_interval, 1.5);
        assert_eq!(update.next_due_at, now() + Duration::hours(36));
    }

    #[test]
    fn test_huge_interval_saturates() {
        let word = word_with_interval(1.0e300);
        let update = calculate_next_review(&word, RecallStatus::Recognized, now());
        assert_eq!(update.next_due_at, latest_due());
        assert_eq!(update.next_due_at.to_rfc3339(), "9999-12-31T23:59:59+00:00");
    }

    #[test]
    fn test_apply_to_word() {
        let mut word = word_with_interval(4.0);
        let update = calculate_next_review(&word, RecallStatus::Fuzzy, now());
        update.apply_to(&mut word);

        assert_eq!(word.review_interval, 4.0);
        assert_eq!(word.review_count, 4);
        assert_eq!(word.last_reviewed_at, Some(now()));
        assert_eq!(word.next_due_at, Some(now() + Duration::days(4)));
    }
}
