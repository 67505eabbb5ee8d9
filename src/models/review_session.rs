//! Review session management for spaced repetition practice.
//! Walks a fixed batch of words, records judgments through the scheduler and
//! offers a replay of the words that were not recalled cleanly.

use super::scheduler::calculate_next_review;
use super::{BatchSize, RecallStatus, SelectionMode, Word};
use crate::database::{ReviewLog, WordStore};
use crate::error::SessionError;
use chrono::{DateTime, Utc};
use std::collections::HashMap;

/// Which end of the batch the cursor bumped into.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Boundary {
    First,
    Last,
}

/// Distinct words judged in one pass, split by their last judgment.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Tally {
    pub recognized: usize,
    pub fuzzy: usize,
    pub forgotten: usize,
    pub total: usize,
}

impl Tally {
    fn from_judgments(judgments: &HashMap<i64, RecallStatus>) -> Self {
        let mut tally = Tally {
            total: judgments.len(),
            ..Default::default()
        };
        for status in judgments.values() {
            match status {
                RecallStatus::Recognized => tally.recognized += 1,
                RecallStatus::Fuzzy => tally.fuzzy += 1,
                RecallStatus::Forgotten => tally.forgotten += 1,
            }
        }
        tally
    }

    pub fn all_recognized(&self) -> bool {
        self.fuzzy == 0 && self.forgotten == 0
    }
}

/// What the presentation shell should show after the last session call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CompletionState {
    /// No session and no failed start.
    Idle,
    InProgress,
    /// The last start request found no words.
    EmptyInput,
    AlreadyAtBoundary(Boundary),
    FullSuccess(Tally),
    OfferRestart(Tally),
    Completed(Tally),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Reviewing,
    AwaitingRestart,
    Completed,
}

/// A fixed batch of words reviewed in order.
///
/// Words are snapshots taken at selection time. Only the schedule fields of a
/// judged word are refreshed, from the values that were just written.
#[derive(Debug)]
pub struct ReviewSession {
    batch: Vec<Word>,
    cursor: usize,
    judgments: HashMap<i64, RecallStatus>,
    phase: Phase,
    state: CompletionState,
    round: usize,
}

impl ReviewSession {
    /// Selects a batch from the store and opens a session on its first word.
    pub fn start<S: WordStore + ?Sized>(
        store: &S,
        mode: SelectionMode,
        size: BatchSize,
    ) -> Result<Self, SessionError> {
        let batch = store.query(mode, size.limit())?;
        tracing::info!("Selected {} words ({}, limit {})", batch.len(), mode, size);
        Self::from_batch(batch)
    }

    /// Opens a session over an already selected batch.
    pub fn from_batch(batch: Vec<Word>) -> Result<Self, SessionError> {
        if batch.is_empty() {
            return Err(SessionError::EmptyBatch);
        }

        Ok(Self {
            batch,
            cursor: 0,
            judgments: HashMap::new(),
            phase: Phase::Reviewing,
            state: CompletionState::InProgress,
            round: 1,
        })
    }

    /// The word under the cursor, while the session is reviewing.
    pub fn current(&self) -> Option<&Word> {
        match self.phase {
            Phase::Reviewing => self.batch.get(self.cursor),
            _ => None,
        }
    }

    /// Moves to the next word. At the last word this runs the completion check.
    pub fn next(&mut self) -> &CompletionState {
        if self.phase != Phase::Reviewing {
            return &self.state;
        }

        if self.cursor + 1 < self.batch.len() {
            self.cursor += 1;
            self.state = CompletionState::InProgress;
        } else {
            self.check_completion();
        }
        &self.state
    }

    pub fn previous(&mut self) -> &CompletionState {
        if self.phase != Phase::Reviewing {
            return &self.state;
        }

        if self.cursor > 0 {
            self.cursor -= 1;
            self.state = CompletionState::InProgress;
        } else {
            self.state = CompletionState::AlreadyAtBoundary(Boundary::First);
        }
        &self.state
    }

    /// Records a judgment for the current word and advances.
    ///
    /// The word update and the log entry are written together. The session
    /// only remembers the judgment once both have landed.
    pub fn record<S: WordStore + ReviewLog + ?Sized>(
        &mut self,
        store: &S,
        status: RecallStatus,
        now: DateTime<Utc>,
    ) -> Result<&CompletionState, SessionError> {
        if self.phase != Phase::Reviewing {
            return Err(SessionError::NotReviewing);
        }
        let word = self
            .batch
            .get_mut(self.cursor)
            .ok_or(SessionError::NotReviewing)?;

        let update = calculate_next_review(word, status, now);
        store.record_judgment(&update, status)?;

        tracing::debug!(
            "'{}' judged {}: interval {} -> {} days",
            word.text,
            status,
            word.review_interval,
            update.review_interval
        );
        update.apply_to(word);
        self.judgments.insert(word.id, status);

        Ok(self.next())
    }

    /// Replaces the batch with the words whose last judgment was Fuzzy or Forgotten.
    pub fn accept_restart(&mut self) -> Result<&CompletionState, SessionError> {
        if self.phase != Phase::AwaitingRestart {
            return Err(SessionError::NothingToRestart);
        }

        let difficult: Vec<Word> = self
            .batch
            .iter()
            .filter(|word| {
                self.judgments
                    .get(&word.id)
                    .is_some_and(|status| status.is_difficult())
            })
            .cloned()
            .collect();

        if difficult.is_empty() {
            self.phase = Phase::Completed;
            self.state = CompletionState::Completed(Tally::from_judgments(&self.judgments));
            return Err(SessionError::NothingToRestart);
        }

        tracing::info!(
            "Restarting round {} with {} difficult words",
            self.round + 1,
            difficult.len()
        );
        self.batch = difficult;
        self.cursor = 0;
        self.judgments.clear();
        self.phase = Phase::Reviewing;
        self.state = CompletionState::InProgress;
        self.round += 1;
        Ok(&self.state)
    }

    /// Ends the session with the final tally instead of replaying.
    pub fn decline_restart(&mut self) -> &CompletionState {
        if self.phase == Phase::AwaitingRestart {
            self.phase = Phase::Completed;
            self.state = CompletionState::Completed(Tally::from_judgments(&self.judgments));
        }
        &self.state
    }

    /// One-based position of the cursor and the batch size.
    pub fn progress(&self) -> (usize, usize) {
        (self.cursor + 1, self.batch.len())
    }

    pub fn completion_state(&self) -> &CompletionState {
        &self.state
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn round(&self) -> usize {
        self.round
    }

    pub fn batch(&self) -> &[Word] {
        &self.batch
    }

    /// Last judgment of `word_id` in the current pass.
    pub fn judgment(&self, word_id: i64) -> Option<RecallStatus> {
        self.judgments.get(&word_id).copied()
    }

    pub fn tally(&self) -> Tally {
        Tally::from_judgments(&self.judgments)
    }

    pub fn phase_message(&self) -> String {
        if self.round == 1 {
            format!("Round {}: {} words", self.round, self.batch.len())
        } else {
            format!(
                "Round {} (Review): {} words to retry",
                self.round,
                self.batch.len()
            )
        }
    }

    fn check_completion(&mut self) {
        if self.judgments.is_empty() {
            self.state = CompletionState::AlreadyAtBoundary(Boundary::Last);
            return;
        }

        let tally = Tally::from_judgments(&self.judgments);
        if tally.all_recognized() {
            tracing::info!("Round {} finished: all {} words recognized", self.round, tally.total);
            self.phase = Phase::Completed;
            self.state = CompletionState::FullSuccess(tally);
        } else {
            tracing::info!(
                "Round {} finished: {} recognized, {} fuzzy, {} forgotten",
                self.round,
                tally.recognized,
                tally.fuzzy,
                tally.forgotten
            );
            self.phase = Phase::AwaitingRestart;
            self.state = CompletionState::OfferRestart(tally);
        }
    }
}

/// Holds at most one session for the presentation shell and remembers
/// whether the last start request came back empty.
#[derive(Debug, Default)]
pub struct ReviewDesk {
    session: Option<ReviewSession>,
    last_start_empty: bool,
}

impl ReviewDesk {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a new session, replacing any active one.
    ///
    /// An empty selection leaves the desk idle.
    pub fn start<S: WordStore + ?Sized>(
        &mut self,
        store: &S,
        mode: SelectionMode,
        size: BatchSize,
    ) -> Result<&mut ReviewSession, SessionError> {
        self.session = None;
        match ReviewSession::start(store, mode, size) {
            Ok(session) => {
                self.last_start_empty = false;
                Ok(self.session.insert(session))
            }
            Err(SessionError::EmptyBatch) => {
                tracing::info!("No words to review for {}", mode);
                self.last_start_empty = true;
                Err(SessionError::EmptyBatch)
            }
            Err(e) => Err(e),
        }
    }

    pub fn session(&self) -> Option<&ReviewSession> {
        self.session.as_ref()
    }

    pub fn session_mut(&mut self) -> Option<&mut ReviewSession> {
        self.session.as_mut()
    }

    pub fn discard(&mut self) {
        self.session = None;
        self.last_start_empty = false;
    }

    pub fn completion_state(&self) -> CompletionState {
        match &self.session {
            Some(session) => session.completion_state().clone(),
            None if self.last_start_empty => CompletionState::EmptyInput,
            None => CompletionState::Idle,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::SqliteStore;
    use crate::error::StoreError;
    use crate::models::{NewWord, ScheduleUpdate};
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap()
    }

    /// Store with `texts` added one minute apart, in order.
    fn store_with(texts: &[&str]) -> SqliteStore {
        let store = SqliteStore::open_in_memory().unwrap();
        for (i, text) in texts.iter().enumerate() {
            store
                .upsert_word(&NewWord::new(*text), t0() + Duration::minutes(i as i64))
                .unwrap();
        }
        store
    }

    fn start_all(store: &SqliteStore) -> ReviewSession {
        ReviewSession::start(store, SelectionMode::AllWords, BatchSize::All).unwrap()
    }

    #[test]
    fn test_scenario_a_offer_restart() {
        let store = store_with(&["w1", "w2"]);
        let mut session = start_all(&store);
        let w1 = session.current().unwrap().id;

        let state = session.record(&store, RecallStatus::Recognized, t0()).unwrap();
        assert_eq!(state, &CompletionState::InProgress);
        assert_eq!(store.get(w1).unwrap().unwrap().review_interval, 2.0);
        assert_eq!(session.progress(), (2, 2));

        let w2 = session.current().unwrap().id;
        let state = session
            .record(&store, RecallStatus::Forgotten, t0())
            .unwrap()
            .clone();
        assert_eq!(store.get(w2).unwrap().unwrap().review_interval, 1.0);
        assert_eq!(
            state,
            CompletionState::OfferRestart(Tally {
                recognized: 1,
                fuzzy: 0,
                forgotten: 1,
                total: 2,
            })
        );
        assert_eq!(session.phase(), Phase::AwaitingRestart);
        assert!(session.current().is_none());
    }

    #[test]
    fn test_scenario_b_restart_with_difficult_words() {
        let store = store_with(&["w1", "w2"]);
        let mut session = start_all(&store);
        session.record(&store, RecallStatus::Recognized, t0()).unwrap();
        let w2 = session.current().unwrap().id;
        session.record(&store, RecallStatus::Forgotten, t0()).unwrap();

        let state = session.accept_restart().unwrap();
        assert_eq!(state, &CompletionState::InProgress);
        assert_eq!(session.batch().len(), 1);
        assert_eq!(session.current().unwrap().id, w2);
        assert_eq!(session.progress(), (1, 1));
        assert_eq!(session.tally(), Tally::default());
        assert_eq!(session.round(), 2);
    }

    #[test]
    fn test_restart_keeps_prior_batch_order() {
        let store = store_with(&["a", "b", "c", "d"]);
        let mut session = start_all(&store);
        let order: Vec<i64> = session.batch().iter().map(|w| w.id).collect();

        session.record(&store, RecallStatus::Fuzzy, t0()).unwrap();
        session.record(&store, RecallStatus::Recognized, t0()).unwrap();
        session.record(&store, RecallStatus::Forgotten, t0()).unwrap();
        session.record(&store, RecallStatus::Fuzzy, t0()).unwrap();
        session.accept_restart().unwrap();

        let replay: Vec<i64> = session.batch().iter().map(|w| w.id).collect();
        assert_eq!(replay, vec![order[0], order[2], order[3]]);
    }

    #[test]
    fn test_decline_restart_completes() {
        let store = store_with(&["w1"]);
        let mut session = start_all(&store);
        session.record(&store, RecallStatus::Fuzzy, t0()).unwrap();

        let state = session.decline_restart().clone();
        assert_eq!(
            state,
            CompletionState::Completed(Tally {
                recognized: 0,
                fuzzy: 1,
                forgotten: 0,
                total: 1,
            })
        );
        assert_eq!(session.phase(), Phase::Completed);
        assert!(matches!(
            session.record(&store, RecallStatus::Recognized, t0()),
            Err(SessionError::NotReviewing)
        ));
    }

    #[test]
    fn test_full_success() {
        let store = store_with(&["w1", "w2"]);
        let mut session = start_all(&store);
        session.record(&store, RecallStatus::Recognized, t0()).unwrap();
        let state = session.record(&store, RecallStatus::Recognized, t0()).unwrap();

        assert!(matches!(state, CompletionState::FullSuccess(t) if t.total == 2));
        assert!(matches!(
            session.accept_restart(),
            Err(SessionError::NothingToRestart)
        ));
    }

    #[test]
    fn test_last_judgment_wins() {
        let store = store_with(&["w1", "w2"]);
        let mut session = start_all(&store);

        session.record(&store, RecallStatus::Forgotten, t0()).unwrap();
        assert_eq!(session.previous(), &CompletionState::InProgress);
        session.record(&store, RecallStatus::Recognized, t0()).unwrap();
        let state = session.record(&store, RecallStatus::Recognized, t0()).unwrap();

        assert_eq!(
            state,
            &CompletionState::FullSuccess(Tally {
                recognized: 2,
                fuzzy: 0,
                forgotten: 0,
                total: 2,
            })
        );
    }

    #[test]
    fn test_second_judgment_compounds_interval() {
        let store = store_with(&["w1", "w2"]);
        let mut session = start_all(&store);
        let w1 = session.current().unwrap().id;

        session.record(&store, RecallStatus::Recognized, t0()).unwrap();
        session.previous();
        session.record(&store, RecallStatus::Recognized, t0()).unwrap();

        let stored = store.get(w1).unwrap().unwrap();
        assert_eq!(stored.review_interval, 4.0);
        assert_eq!(stored.review_count, 2);
        assert_eq!(session.batch()[0].review_interval, 4.0);
    }

    #[test]
    fn test_scenario_d_empty_store() {
        let store = SqliteStore::open_in_memory().unwrap();
        for mode in SelectionMode::FIXED {
            assert!(matches!(
                ReviewSession::start(&store, mode, BatchSize::Limit(10)),
                Err(SessionError::EmptyBatch)
            ));
        }

        let mut desk = ReviewDesk::new();
        assert_eq!(desk.completion_state(), CompletionState::Idle);
        assert!(desk.start(&store, SelectionMode::AllWords, BatchSize::All).is_err());
        assert!(desk.session().is_none());
        assert_eq!(desk.completion_state(), CompletionState::EmptyInput);
    }

    #[test]
    fn test_scenario_e_next_without_judgments() {
        let store = store_with(&["only"]);
        let mut session = start_all(&store);

        let state = session.next();
        assert_eq!(state, &CompletionState::AlreadyAtBoundary(Boundary::Last));
        assert_eq!(session.phase(), Phase::Reviewing);
        assert_eq!(session.current().unwrap().text, "only");
        assert_eq!(session.progress(), (1, 1));
    }

    #[test]
    fn test_previous_at_first_word() {
        let store = store_with(&["w1", "w2"]);
        let mut session = start_all(&store);

        assert_eq!(
            session.previous(),
            &CompletionState::AlreadyAtBoundary(Boundary::First)
        );
        assert_eq!(session.progress(), (1, 2));
    }

    #[test]
    fn test_cursor_stays_in_bounds() {
        let store = store_with(&["a", "b", "c"]);
        let mut session = start_all(&store);

        for step in [true, true, false, true, false, false, false, true, true, true] {
            if step {
                session.next();
            } else {
                session.previous();
            }
            let (position, total) = session.progress();
            assert!(position >= 1 && position <= total);
            assert!(session.current().is_some());
        }
    }

    #[test]
    fn test_record_writes_review_log() {
        let store = store_with(&["w1"]);
        let mut session = start_all(&store);
        let id = session.current().unwrap().id;
        session.record(&store, RecallStatus::Fuzzy, t0()).unwrap();

        let history = store.history(id).unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].status, RecallStatus::Fuzzy);
        assert_eq!(history[0].recorded_at, t0());
    }

    /// Store whose judgment writes always fail.
    struct FailingStore {
        inner: SqliteStore,
    }

    impl WordStore for FailingStore {
        fn get(&self, id: i64) -> Result<Option<Word>, StoreError> {
            self.inner.get(id)
        }

        fn update_schedule(&self, update: &ScheduleUpdate) -> Result<(), StoreError> {
            Err(StoreError::NotFound(update.word_id))
        }

        fn query(&self, mode: SelectionMode, limit: Option<usize>) -> Result<Vec<Word>, StoreError> {
            self.inner.query(mode, limit)
        }

        fn delete(&self, id: i64) -> Result<bool, StoreError> {
            self.inner.delete(id)
        }
    }

    impl ReviewLog for FailingStore {
        fn append(
            &self,
            word_id: i64,
            _status: RecallStatus,
            _at: DateTime<Utc>,
        ) -> Result<i64, StoreError> {
            Err(StoreError::NotFound(word_id))
        }

        fn record_judgment(
            &self,
            update: &ScheduleUpdate,
            _status: RecallStatus,
        ) -> Result<i64, StoreError> {
            Err(StoreError::NotFound(update.word_id))
        }
    }

    #[test]
    fn test_store_failure_leaves_session_untouched() {
        let store = FailingStore {
            inner: store_with(&["w1", "w2"]),
        };
        let mut session = ReviewSession::start(&store, SelectionMode::AllWords, BatchSize::All).unwrap();
        let id = session.current().unwrap().id;

        let result = session.record(&store, RecallStatus::Forgotten, t0());
        assert!(matches!(result, Err(SessionError::Store(StoreError::NotFound(_)))));
        assert_eq!(session.judgment(id), None);
        assert_eq!(session.progress(), (1, 2));
        assert_eq!(session.current().unwrap().review_count, 0);
        assert_eq!(store.inner.get(id).unwrap().unwrap().review_count, 0);
    }

    #[test]
    fn test_failed_log_write_is_not_counted_on_retry() {
        let store = store_with(&["w1", "w2"]);
        store
            .conn()
            .execute_batch(
                "CREATE TABLE log_outage (active INTEGER);
                 INSERT INTO log_outage VALUES (1);
                 CREATE TRIGGER reject_review_records BEFORE INSERT ON review_records
                 WHEN EXISTS (SELECT 1 FROM log_outage)
                 BEGIN SELECT RAISE(ABORT, 'review log unavailable'); END;",
            )
            .unwrap();
        let mut session = start_all(&store);
        let id = session.current().unwrap().id;

        let result = session.record(&store, RecallStatus::Recognized, t0());
        assert!(matches!(result, Err(SessionError::Store(StoreError::Sqlite(_)))));
        let stored = store.get(id).unwrap().unwrap();
        assert_eq!(stored.review_count, 0);
        assert_eq!(stored.review_interval, 1.0);
        assert_eq!(session.judgment(id), None);

        store.conn().execute("DELETE FROM log_outage", []).unwrap();
        session.record(&store, RecallStatus::Recognized, t0()).unwrap();

        let stored = store.get(id).unwrap().unwrap();
        assert_eq!(stored.review_count, 1);
        assert_eq!(stored.review_interval, 2.0);
        assert_eq!(store.history(id).unwrap().len(), 1);
        assert_eq!(session.batch()[0].review_count, 1);
        assert_eq!(session.judgment(id), Some(RecallStatus::Recognized));
    }
}
