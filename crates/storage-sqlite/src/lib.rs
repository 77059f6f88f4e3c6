//! SQLite storage implementation for the Dompet document store.
//!
//! This crate provides all database-related functionality using Diesel ORM with SQLite.
//! It implements the store traits defined in `dompet-core` and contains:
//! - Connection pooling and the open gate shared by every caller
//! - Diesel table migrations and the collection schema-version runner
//! - The single writer that runs each write as one transaction
//! - Collection and key-value settings repositories
//!
//! ```text
//!   dompet-core (records, services)
//!              │
//!              ▼
//!   storage-sqlite (this crate)
//!              │
//!              ▼
//!          SQLite DB
//! ```

pub mod collections;
pub mod config;
pub mod db;
pub mod errors;
pub mod schema;
pub mod settings;

pub use collections::CollectionRepository;
pub use config::{ReadFaultPolicy, StoreConfig};
pub use db::{
    create_pool, get_connection, get_db_path, init, run_migrations, DbConnection, DbPool,
    MigrationReport, StoreConnection, StoreHandle, StoreState, UnitOfWork, WriteHandle,
};
pub use settings::SettingsRepository;

// Re-export storage errors and conversion helpers
pub use errors::{IntoCore, StorageError};

// Re-export from dompet-core for convenience
pub use dompet_core::errors::{DatabaseError, Error, Result};
