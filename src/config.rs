//! Configuration for the flashcards binary.
//!
//! Loaded from environment variables (and a `.env` file if present) with
//! sensible defaults.

use std::env;
use std::path::PathBuf;

use crate::models::Identity;

#[derive(Debug, Clone)]
pub struct Config {
    /// Path to SQLite database file
    pub db_path: PathBuf,
    /// Identity to sign in as on startup, signed out when unset
    pub identity: Option<Identity>,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
}

impl Config {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let db_path = env::var("FLASHCARDS_DB_PATH")
            .unwrap_or_else(|_| "./db.sqlite3".to_string())
            .into();

        let identity = env::var("FLASHCARDS_IDENTITY")
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .map(Identity::new);

        let log_level = env::var("FLASHCARDS_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Self {
            db_path,
            identity,
            log_level,
        }
    }
}
