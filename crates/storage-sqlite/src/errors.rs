//! Storage-specific error types for SQLite operations.
//!
//! Diesel, r2d2 and migration errors are wrapped here and converted to the
//! database-agnostic errors of `dompet_core` before they leave this crate.

use diesel::result::{DatabaseErrorKind, Error as DieselError};
use dompet_core::errors::{DatabaseError, Error};
use thiserror::Error;

/// Storage-specific errors that wrap Diesel and r2d2 types.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Database connection failed: {0}")]
    ConnectionFailed(#[from] diesel::ConnectionError),

    #[error("Connection pool error: {0}")]
    PoolError(#[from] r2d2::Error),

    #[error("Query execution failed: {0}")]
    QueryFailed(#[from] DieselError),

    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    #[error("Stored record is not valid JSON: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A core error raised inside a unit of work. Kept intact so callers still
    /// see `DuplicateKey`, `NotFound` and friends after the transaction unwinds.
    #[error(transparent)]
    Core(#[from] Error),
}

impl From<StorageError> for Error {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::ConnectionFailed(e) => {
                Error::Database(DatabaseError::ConnectionFailed(e.to_string()))
            }
            // Pool construction errors are mapped where the pool is built;
            // anything reaching here is a checkout from a live pool.
            StorageError::PoolError(e) => Error::Database(DatabaseError::ConnectionFailed(
                format!("no connection available: {}", e),
            )),
            StorageError::QueryFailed(DieselError::NotFound) => {
                Error::Database(DatabaseError::NotFound("Record not found".to_string()))
            }
            StorageError::QueryFailed(DieselError::DatabaseError(
                DatabaseErrorKind::UniqueViolation,
                info,
            )) => Error::Database(DatabaseError::DuplicateKey(info.message().to_string())),
            StorageError::QueryFailed(e) => {
                Error::Database(DatabaseError::QueryFailed(e.to_string()))
            }
            StorageError::MigrationFailed(e) => Error::Database(DatabaseError::MigrationFailed(e)),
            StorageError::Serialization(e) => {
                Error::Database(DatabaseError::InvalidRecord(e.to_string()))
            }
            StorageError::Core(e) => e,
        }
    }
}

/// Extension trait for converting Diesel and r2d2 results to core results.
pub trait IntoCore<T> {
    fn into_core(self) -> dompet_core::Result<T>;
}

impl<T> IntoCore<T> for std::result::Result<T, DieselError> {
    fn into_core(self) -> dompet_core::Result<T> {
        self.map_err(|e| StorageError::from(e).into())
    }
}

impl<T> IntoCore<T> for std::result::Result<T, r2d2::Error> {
    fn into_core(self) -> dompet_core::Result<T> {
        self.map_err(|e| StorageError::from(e).into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_core_errors_survive_the_round_trip() {
        let original = Error::Database(DatabaseError::DuplicateKey("wallets/w1".to_string()));
        let back: Error = StorageError::from(original).into();
        assert!(matches!(
            back,
            Error::Database(DatabaseError::DuplicateKey(ref key)) if key == "wallets/w1"
        ));
    }

    #[test]
    fn test_diesel_not_found_maps_to_not_found() {
        let err: Error = StorageError::from(DieselError::NotFound).into();
        assert!(err.is_not_found());
    }
}
