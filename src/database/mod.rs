pub mod db;
pub mod store;

pub use db::{SqliteStore, Upsert, WordSort};
pub use store::{ReviewLog, WordStore};
