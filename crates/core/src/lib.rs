//! Dompet Core - collections, schema, seeding, and the services built on them.
//!
//! This crate is storage-agnostic. It defines the collection store and
//! settings traits that the `storage-sqlite` crate implements.

pub mod collections;
pub mod errors;
pub mod finance;
pub mod seed;
pub mod settings;
pub mod snapshot;
pub mod utils;

pub use collections::{Collection, CollectionStoreTrait, Record};

// Re-export error types
pub use errors::Error;
pub use errors::Result;
