//! Record queries shared by the read path, the writer and the schema runner.

use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use diesel::sqlite::SqliteConnection;

use super::model::RecordDB;
use crate::errors::{IntoCore, StorageError};
use crate::schema::records;
use dompet_core::collections::{validate_batch, Collection, Record};
use dompet_core::errors::{DatabaseError, Error, Result};

// Keeps each multi-row insert well below SQLite's bound-parameter limit.
const INSERT_CHUNK_SIZE: usize = 300;

fn record_key(collection: Collection, id: &str) -> String {
    format!("{}/{}", collection, id)
}

fn map_insert_error(err: DieselError, collection: Collection, id: &str) -> Error {
    match err {
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
            DatabaseError::DuplicateKey(record_key(collection, id)).into()
        }
        other => StorageError::from(other).into(),
    }
}

/// Every record of `collection`, ordered by key.
pub fn load_records(conn: &mut SqliteConnection, collection: Collection) -> Result<Vec<Record>> {
    records::table
        .filter(records::collection.eq(collection.name()))
        .order(records::id.asc())
        .select(RecordDB::as_select())
        .load::<RecordDB>(conn)
        .into_core()?
        .into_iter()
        .map(RecordDB::into_record)
        .collect()
}

pub fn find_record(
    conn: &mut SqliteConnection,
    collection: Collection,
    id: &str,
) -> Result<Option<Record>> {
    records::table
        .find((collection.name(), id))
        .select(RecordDB::as_select())
        .first::<RecordDB>(conn)
        .optional()
        .into_core()?
        .map(RecordDB::into_record)
        .transpose()
}

pub fn count_records(conn: &mut SqliteConnection, collection: Collection) -> Result<usize> {
    let count = records::table
        .filter(records::collection.eq(collection.name()))
        .count()
        .get_result::<i64>(conn)
        .into_core()?;
    Ok(count as usize)
}

/// Inserts a new record; an existing key is a `DuplicateKey` error.
pub fn insert_record(
    conn: &mut SqliteConnection,
    collection: Collection,
    record: Record,
) -> Result<Record> {
    let row = RecordDB::from_record(collection, &record)?;
    diesel::insert_into(records::table)
        .values(&row)
        .execute(conn)
        .map_err(|e| map_insert_error(e, collection, &row.id))?;
    Ok(record)
}

pub fn upsert_record(
    conn: &mut SqliteConnection,
    collection: Collection,
    record: Record,
) -> Result<Record> {
    let row = RecordDB::from_record(collection, &record)?;
    diesel::replace_into(records::table)
        .values(&row)
        .execute(conn)
        .into_core()?;
    Ok(record)
}

/// Shallow-merges `patch` over the stored record and writes it back.
pub fn update_record(
    conn: &mut SqliteConnection,
    collection: Collection,
    id: &str,
    patch: Record,
) -> Result<Record> {
    let mut record = find_record(conn, collection, id)?.ok_or_else(|| {
        Error::from(DatabaseError::NotFound(record_key(collection, id)))
    })?;
    record.merge(patch, collection.key_field());

    let row = RecordDB::from_record(collection, &record)?;
    diesel::update(records::table.find((collection.name(), id)))
        .set(records::data.eq(&row.data))
        .execute(conn)
        .into_core()?;
    Ok(record)
}

/// Deletes one record. Deleting a missing key is not an error.
pub fn delete_record(conn: &mut SqliteConnection, collection: Collection, id: &str) -> Result<()> {
    diesel::delete(records::table.find((collection.name(), id)))
        .execute(conn)
        .into_core()?;
    Ok(())
}

pub fn clear_collection(conn: &mut SqliteConnection, collection: Collection) -> Result<usize> {
    diesel::delete(records::table.filter(records::collection.eq(collection.name())))
        .execute(conn)
        .into_core()
}

/// Clears `collection` and inserts `batch`. Must run inside a transaction so
/// a failure leaves the previous content in place.
pub fn replace_collection(
    conn: &mut SqliteConnection,
    collection: Collection,
    batch: Vec<Record>,
) -> Result<usize> {
    validate_batch(collection, &batch)?;
    let rows = batch
        .iter()
        .map(|record| RecordDB::from_record(collection, record))
        .collect::<Result<Vec<_>>>()?;

    clear_collection(conn, collection)?;
    for chunk in rows.chunks(INSERT_CHUNK_SIZE) {
        diesel::insert_into(records::table)
            .values(chunk)
            .execute(conn)
            .into_core()?;
    }
    Ok(rows.len())
}
