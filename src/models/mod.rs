pub mod recall_status;
pub mod review_record;
pub mod review_session;
pub mod scheduler;
pub mod selection;
pub mod word;

pub use recall_status::RecallStatus;
pub use review_record::{HistorySummary, ReviewRecord};
pub use review_session::{Boundary, CompletionState, Phase, ReviewDesk, ReviewSession, Tally};
pub use scheduler::ScheduleUpdate;
pub use selection::{BatchSize, SelectionMode};
pub use word::{NewWord, Word};
