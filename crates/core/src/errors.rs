//! Core error types for the Dompet store.
//!
//! This module defines database-agnostic error types. Storage-specific errors
//! (from Diesel, SQLite, etc.) are converted to these types by the storage layer.

use thiserror::Error;

/// Type alias for Result using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Root error type for the store and the services built on it.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Database operation failed: {0}")]
    Database(#[from] DatabaseError),

    #[error("Input validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// A snapshot document could not be used for restore.
    #[error("Invalid backup file format: {0}")]
    InvalidFormat(String),

    #[error("Serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

/// Database-agnostic error type for storage operations.
///
/// Every payload is a `String` so the storage layer can convert its own error
/// types into this one, and so the value can be cloned and handed to every
/// caller waiting on the same open attempt.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DatabaseError {
    /// The store could not be opened or upgraded.
    #[error("Failed to open store: {0}")]
    ConnectionFailed(String),

    /// Failed to create or configure the connection pool.
    #[error("Failed to create database pool: {0}")]
    PoolCreationFailed(String),

    /// A database query failed to execute.
    #[error("Database query failed: {0}")]
    QueryFailed(String),

    /// The requested record was not found.
    #[error("Record not found: {0}")]
    NotFound(String),

    /// A record with the same primary key already exists.
    #[error("Duplicate key: {0}")]
    DuplicateKey(String),

    /// A record violates the shape its collection requires.
    #[error("Invalid record: {0}")]
    InvalidRecord(String),

    /// A unit of work did not commit.
    #[error("Transaction failed: {0}")]
    TransactionFailed(String),

    /// Schema migration failed.
    #[error("Database migration failed: {0}")]
    MigrationFailed(String),

    /// Backup operation failed.
    #[error("Backup failed: {0}")]
    BackupFailed(String),

    /// Restore operation failed.
    #[error("Restore failed: {0}")]
    RestoreFailed(String),

    /// Internal/unexpected database error.
    #[error("Internal database error: {0}")]
    Internal(String),
}

/// Validation errors for user input.
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Required field '{0}' is missing")]
    MissingField(String),

    #[error("Unknown collection '{0}'")]
    UnknownCollection(String),
}

impl Error {
    /// True when the error is a primary-key collision on insert.
    pub fn is_duplicate_key(&self) -> bool {
        matches!(self, Error::Database(DatabaseError::DuplicateKey(_)))
    }

    /// True when the error reports a missing record.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::Database(DatabaseError::NotFound(_)))
    }
}
