//! Error types shared across the store, session, export and ingestion layers.

use thiserror::Error;

/// Failures raised by the word store and the review record log.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Word {0} does not exist")]
    NotFound(i64),

    #[error("Invalid timestamp in store: {0}")]
    InvalidTimestamp(String),

    #[error("Invalid recall status in store: {0}")]
    InvalidStatus(String),
}

/// Failures surfaced to the presentation shell by a review session.
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("No words to review")]
    EmptyBatch,

    #[error("Session is not accepting judgments")]
    NotReviewing,

    #[error("No difficult words to restart with")]
    NothingToRestart,

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Error, Debug)]
pub enum RecognitionError {
    #[error("Recognition service failed: {0}")]
    Service(String),

    #[error("Malformed recognition payload: {0}")]
    MalformedPayload(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config.toml: {0}")]
    Toml(#[from] toml::de::Error),
}
