pub mod config;
pub mod database;
pub mod error;
pub mod export;
pub mod models;
pub mod recognition;

pub use database::{ReviewLog, SqliteStore, WordStore};
pub use error::{SessionError, StoreError};
pub use models::{
    BatchSize, CompletionState, NewWord, RecallStatus, ReviewDesk, ReviewSession, SelectionMode,
    Word,
};
