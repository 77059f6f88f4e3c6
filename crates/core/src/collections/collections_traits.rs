use crate::collections::{Collection, Record};
use crate::errors::Result;
use async_trait::async_trait;

/// Trait for collection-scoped record access.
///
/// Reads never fail under the default read-fault policy of an implementation:
/// a fault yields an empty sequence or `None`. Writes always report faults.
#[async_trait]
pub trait CollectionStoreTrait: Send + Sync {
    /// All records of a collection, ordered by key.
    async fn get_all(&self, collection: Collection) -> Result<Vec<Record>>;

    async fn get_by_id(&self, collection: Collection, id: &str) -> Result<Option<Record>>;

    async fn count(&self, collection: Collection) -> Result<usize>;

    /// Inserts a new record. Fails with `DuplicateKey` if the key exists.
    async fn add(&self, collection: Collection, record: Record) -> Result<Record>;

    /// Inserts or replaces a record by key.
    async fn put(&self, collection: Collection, record: Record) -> Result<Record>;

    /// Shallow-merges `patch` over the stored record. Fails with `NotFound`
    /// when no record has this key.
    async fn update(&self, collection: Collection, id: &str, patch: Record) -> Result<Record>;

    /// Removes a record. Returns `true` whether or not it existed.
    async fn delete(&self, collection: Collection, id: &str) -> Result<bool>;

    /// Atomically replaces the whole content of a collection.
    async fn replace_all(&self, collection: Collection, records: Vec<Record>) -> Result<bool>;

    /// Atomically replaces the content of several collections in one unit of work.
    async fn replace_many(&self, batches: Vec<(Collection, Vec<Record>)>) -> Result<bool>;
}
