//! SQLite storage implementation for record collections.

pub(crate) mod model;
pub mod queries;
mod repository;

pub use model::{CollectionDB, RecordDB};
pub use repository::CollectionRepository;

// Re-export trait from core for convenience
pub use dompet_core::collections::CollectionStoreTrait;
