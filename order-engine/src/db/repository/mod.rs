//! Repository Module
//!
//! Plain SQL over SQLite. Every function takes a `&mut SqliteConnection` so it
//! can run against a pooled connection or inside an open unit of work
//! (`&mut *tx`).

// Catalog
pub mod catalog;
pub mod recipe;

// Orders
pub mod order;
pub mod payment;

// Inventory
pub mod ingredient;
pub mod stock_log;

use thiserror::Error;

/// Repository error types
#[derive(Debug, Error)]
pub enum RepoError {
    /// SQLITE_BUSY / SQLITE_LOCKED, or no pooled connection within the timeout
    #[error("Database busy: {0}")]
    Busy(String),

    #[error("Duplicate: {0}")]
    Duplicate(String),

    #[error("Database error: {0}")]
    Database(String),

    /// A stored value no longer parses into its domain type
    #[error("Corrupt row: {0}")]
    Corrupt(String),
}

/// Primary result codes for SQLITE_BUSY (5) and SQLITE_LOCKED (6).
/// Extended codes carry the primary code in their low byte.
fn is_lock_contention(code: &str) -> bool {
    code.parse::<i32>()
        .map(|c| matches!(c & 0xff, 5 | 6))
        .unwrap_or(false)
}

impl From<sqlx::Error> for RepoError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::PoolTimedOut => RepoError::Busy(err.to_string()),
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                RepoError::Duplicate(db_err.message().to_string())
            }
            sqlx::Error::Database(db_err) => match db_err.code() {
                Some(code) if is_lock_contention(&code) => RepoError::Busy(err.to_string()),
                _ => RepoError::Database(err.to_string()),
            },
            _ => RepoError::Database(err.to_string()),
        }
    }
}

/// Result type for repository operations
pub type RepoResult<T> = Result<T, RepoError>;

/// Parse a TEXT column into its enum, reporting bad values as corruption
pub(crate) fn parse_column<T>(column: &str, raw: &str) -> RepoResult<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.parse::<T>()
        .map_err(|e| RepoError::Corrupt(format!("{column}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lock_contention_codes() {
        assert!(is_lock_contention("5"));
        assert!(is_lock_contention("6"));
        // SQLITE_BUSY_SNAPSHOT, SQLITE_BUSY_TIMEOUT
        assert!(is_lock_contention("517"));
        assert!(is_lock_contention("773"));
        // SQLITE_CONSTRAINT_CHECK
        assert!(!is_lock_contention("275"));
        assert!(!is_lock_contention("not-a-code"));
    }

    #[test]
    fn test_pool_timeout_is_busy() {
        assert!(matches!(
            RepoError::from(sqlx::Error::PoolTimedOut),
            RepoError::Busy(_)
        ));
        assert!(matches!(
            RepoError::from(sqlx::Error::RowNotFound),
            RepoError::Database(_)
        ));
    }
}
