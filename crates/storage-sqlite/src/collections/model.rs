//! Database models for collections and their records.

use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use crate::errors::StorageError;
use dompet_core::collections::{validate_record, Collection, Record};
use dompet_core::errors::Result;

/// A stored record. `data` holds the whole record as JSON text, key included.
#[derive(Queryable, Selectable, Insertable, Identifiable, PartialEq, Debug, Clone)]
#[diesel(table_name = crate::schema::records)]
#[diesel(primary_key(collection, id))]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct RecordDB {
    pub collection: String,
    pub id: String,
    pub data: String,
}

impl RecordDB {
    /// Validates `record` for `collection` and serializes it for storage.
    pub fn from_record(collection: Collection, record: &Record) -> Result<Self> {
        let id = validate_record(collection, record)?;
        Ok(RecordDB {
            collection: collection.name().to_string(),
            id: id.to_string(),
            data: serde_json::to_string(record)?,
        })
    }

    pub fn into_record(self) -> Result<Record> {
        let value: serde_json::Value =
            serde_json::from_str(&self.data).map_err(StorageError::from)?;
        Record::from_value(value)
    }
}

/// Registration row for a declared collection.
#[derive(Queryable, Selectable, Insertable, Serialize, Deserialize, Debug, Clone)]
#[diesel(table_name = crate::schema::collections)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[serde(rename_all = "camelCase")]
pub struct CollectionDB {
    pub name: String,
    pub key_path: String,
    pub created_at: String,
}

impl CollectionDB {
    pub fn new(collection: Collection, created_at: &str) -> Self {
        CollectionDB {
            name: collection.name().to_string(),
            key_path: collection.key_field().to_string(),
            created_at: created_at.to_string(),
        }
    }
}

#[derive(Queryable, Insertable, Debug, Clone)]
#[diesel(table_name = crate::schema::store_meta)]
pub struct StoreMetaDB {
    pub meta_key: String,
    pub meta_value: String,
}
