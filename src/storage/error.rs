//! Storage error types
//!
//! Defines all errors that can occur in the storage layer.

use thiserror::Error;

/// Errors that can occur in the score store
#[derive(Error, Debug)]
pub enum StorageError {
    /// SQLite reported an error
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// I/O operation failed (creating the database directory)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Requested row does not exist
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },

    /// Write would violate the one-score-per-player-per-gameweek rule
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Input rejected before reaching the database
    #[error("Validation error: {0}")]
    Validation(String),
}

impl StorageError {
    pub fn player_not_found(id: i64) -> Self {
        StorageError::NotFound {
            entity: "Player",
            id,
        }
    }

    pub fn score_not_found(id: i64) -> Self {
        StorageError::NotFound {
            entity: "Score",
            id,
        }
    }
}

/// Result type alias for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = StorageError::player_not_found(7);
        assert_eq!(err.to_string(), "Player 7 not found");

        let err = StorageError::Validation("gameweek must be between 1 and 38".to_string());
        assert_eq!(
            err.to_string(),
            "Validation error: gameweek must be between 1 and 38"
        );
    }

    #[test]
    fn test_sqlite_error_conversion() {
        let sqlite_err = rusqlite::Error::QueryReturnedNoRows;
        let storage_err: StorageError = sqlite_err.into();
        assert!(matches!(storage_err, StorageError::Sqlite(_)));
    }
}
