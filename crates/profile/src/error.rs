//! Profile store errors

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Invalid timestamp for {employee}: {value}")]
    InvalidTimestamp { employee: String, value: String },

    #[error("Corrupt profile record: {0}")]
    Corrupt(String),

    #[error("Profile store lock poisoned")]
    LockPoisoned,
}
