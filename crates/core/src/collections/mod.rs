//! Collections module - record model, schema registry, and the store trait.

mod collections_model;
mod collections_traits;
mod memory_store;
mod schema_registry;

pub use collections_model::{
    validate_batch, validate_record, Collection, Record, CURRENT_GOLD_PRICE_ID, USER_PROFILE_ID,
};
pub use collections_traits::CollectionStoreTrait;
pub use memory_store::MemoryCollectionStore;
pub use schema_registry::{MigrationStep, SchemaRegistry, CURRENT_SCHEMA_VERSION};
