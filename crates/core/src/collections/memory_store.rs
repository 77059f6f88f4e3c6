//! In-memory collection store.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::collections_model::{validate_batch, validate_record};
use super::{Collection, CollectionStoreTrait, Record};
use crate::errors::{DatabaseError, Result};

type Tables = BTreeMap<Collection, BTreeMap<String, Record>>;

/// Collection store that keeps everything in `BTreeMap`s; nothing touches disk.
///
/// Every operation takes the lock once, so a `replace_all` is observed either
/// entirely or not at all. Used for tests and for running services without a
/// database.
#[derive(Default)]
pub struct MemoryCollectionStore {
    tables: RwLock<Tables>,
}

impl MemoryCollectionStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Tables>> {
        self.tables
            .read()
            .map_err(|_| DatabaseError::Internal("memory store lock poisoned".to_string()).into())
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Tables>> {
        self.tables
            .write()
            .map_err(|_| DatabaseError::Internal("memory store lock poisoned".to_string()).into())
    }
}

#[async_trait]
impl CollectionStoreTrait for MemoryCollectionStore {
    async fn get_all(&self, collection: Collection) -> Result<Vec<Record>> {
        let tables = self.read()?;
        Ok(tables
            .get(&collection)
            .map(|t| t.values().cloned().collect())
            .unwrap_or_default())
    }

    async fn get_by_id(&self, collection: Collection, id: &str) -> Result<Option<Record>> {
        let tables = self.read()?;
        Ok(tables.get(&collection).and_then(|t| t.get(id)).cloned())
    }

    async fn count(&self, collection: Collection) -> Result<usize> {
        let tables = self.read()?;
        Ok(tables.get(&collection).map(|t| t.len()).unwrap_or(0))
    }

    async fn add(&self, collection: Collection, record: Record) -> Result<Record> {
        let id = validate_record(collection, &record)?.to_string();
        let mut tables = self.write()?;
        let table = tables.entry(collection).or_default();
        if table.contains_key(&id) {
            return Err(DatabaseError::DuplicateKey(format!("{}/{}", collection, id)).into());
        }
        table.insert(id, record.clone());
        Ok(record)
    }

    async fn put(&self, collection: Collection, record: Record) -> Result<Record> {
        let id = validate_record(collection, &record)?.to_string();
        let mut tables = self.write()?;
        tables
            .entry(collection)
            .or_default()
            .insert(id, record.clone());
        Ok(record)
    }

    async fn update(&self, collection: Collection, id: &str, patch: Record) -> Result<Record> {
        let mut tables = self.write()?;
        let existing = tables
            .get_mut(&collection)
            .and_then(|t| t.get_mut(id))
            .ok_or_else(|| DatabaseError::NotFound(format!("{}/{}", collection, id)))?;
        existing.merge(patch, collection.key_field());
        Ok(existing.clone())
    }

    async fn delete(&self, collection: Collection, id: &str) -> Result<bool> {
        let mut tables = self.write()?;
        if let Some(table) = tables.get_mut(&collection) {
            table.remove(id);
        }
        Ok(true)
    }

    async fn replace_all(&self, collection: Collection, records: Vec<Record>) -> Result<bool> {
        self.replace_many(vec![(collection, records)]).await
    }

    async fn replace_many(&self, batches: Vec<(Collection, Vec<Record>)>) -> Result<bool> {
        for (collection, records) in &batches {
            validate_batch(*collection, records)?;
        }

        let mut tables = self.write()?;
        for (collection, records) in batches {
            let table = tables.entry(collection).or_default();
            table.clear();
            for record in records {
                if let Some(id) = record.key(collection.key_field()).map(str::to_string) {
                    table.insert(id, record);
                }
            }
        }
        Ok(true)
    }
}
