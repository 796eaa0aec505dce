pub mod app;
pub mod cache;
pub mod config;
pub mod database;
pub mod errors;
pub mod export;
pub mod models;

pub use app::{App, AppSnapshot, Selection};
pub use database::{RemoteStore, SqliteStore};
pub use errors::{AppError, StoreError};
pub use models::{Flashcard, Identity, ScoreRecord, Topic};
