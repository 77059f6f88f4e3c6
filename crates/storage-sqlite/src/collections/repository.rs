use async_trait::async_trait;
use diesel::sqlite::SqliteConnection;
use log::{debug, error, warn};
use std::sync::Arc;

use super::queries;
use crate::config::ReadFaultPolicy;
use crate::db::{StoreConnection, UnitOfWork};
use dompet_core::collections::{Collection, CollectionStoreTrait, Record};
use dompet_core::errors::{DatabaseError, Error, Result};

/// SQLite-backed collection store.
///
/// Reads go to pooled connections and run concurrently. Writes go through
/// the single writer, one transaction per call.
pub struct CollectionRepository {
    connection: Arc<StoreConnection>,
}

impl CollectionRepository {
    pub fn new(connection: Arc<StoreConnection>) -> Self {
        CollectionRepository { connection }
    }

    pub fn connection(&self) -> &Arc<StoreConnection> {
        &self.connection
    }

    async fn read<T, F>(&self, collection: Collection, fallback: T, query: F) -> Result<T>
    where
        F: FnOnce(&mut SqliteConnection) -> Result<T> + Send,
        T: Send,
    {
        let outcome = match self.connection.ensure_ready().await {
            Ok(handle) => handle
                .get_connection()
                .and_then(|mut conn| query(&mut *conn)),
            Err(e) => Err(e),
        };

        match outcome {
            Ok(value) => Ok(value),
            Err(e) => match self.connection.config().read_fault_policy {
                ReadFaultPolicy::Degrade => {
                    warn!("Read of '{}' failed, returning empty: {}", collection, e);
                    Ok(fallback)
                }
                ReadFaultPolicy::Propagate => Err(e),
            },
        }
    }

    async fn write<T, F>(&self, job: F) -> Result<T>
    where
        F: FnOnce(&mut UnitOfWork<'_>) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let handle = self.connection.ensure_ready().await?;
        handle.writer().exec(job).await.map_err(|e| {
            error!("Write failed: {}", e);
            e
        })
    }
}

#[async_trait]
impl CollectionStoreTrait for CollectionRepository {
    async fn get_all(&self, collection: Collection) -> Result<Vec<Record>> {
        self.read(collection, Vec::new(), |conn| {
            queries::load_records(conn, collection)
        })
        .await
    }

    async fn get_by_id(&self, collection: Collection, id: &str) -> Result<Option<Record>> {
        self.read(collection, None, |conn| {
            queries::find_record(conn, collection, id)
        })
        .await
    }

    async fn count(&self, collection: Collection) -> Result<usize> {
        self.read(collection, 0, |conn| queries::count_records(conn, collection))
            .await
    }

    async fn add(&self, collection: Collection, record: Record) -> Result<Record> {
        self.write(move |uow| uow.add(collection, record)).await
    }

    async fn put(&self, collection: Collection, record: Record) -> Result<Record> {
        self.write(move |uow| uow.put(collection, record)).await
    }

    async fn update(&self, collection: Collection, id: &str, patch: Record) -> Result<Record> {
        let id = id.to_string();
        self.write(move |uow| uow.update(collection, &id, patch))
            .await
    }

    async fn delete(&self, collection: Collection, id: &str) -> Result<bool> {
        let id = id.to_string();
        self.write(move |uow| uow.delete(collection, &id)).await?;
        Ok(true)
    }

    async fn replace_all(&self, collection: Collection, records: Vec<Record>) -> Result<bool> {
        let written = self
            .write(move |uow| uow.replace_all(collection, records))
            .await
            .map_err(bulk_failure)?;
        debug!("Replaced '{}' with {} record(s)", collection, written);
        Ok(true)
    }

    async fn replace_many(&self, batches: Vec<(Collection, Vec<Record>)>) -> Result<bool> {
        self.write(move |uow| {
            for (collection, records) in batches {
                uow.replace_all(collection, records)?;
            }
            Ok(())
        })
        .await
        .map_err(bulk_failure)?;
        Ok(true)
    }
}

/// A bulk write that the engine refused did not commit. Input errors keep
/// their own kind so callers can tell bad data from a failed transaction.
fn bulk_failure(err: Error) -> Error {
    match err {
        Error::Database(
            DatabaseError::DuplicateKey(_)
            | DatabaseError::InvalidRecord(_)
            | DatabaseError::NotFound(_)
            | DatabaseError::TransactionFailed(_),
        )
        | Error::Validation(_)
        | Error::InvalidFormat(_) => err,
        other => Error::Database(DatabaseError::TransactionFailed(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_failures_become_transaction_failures() {
        let err = bulk_failure(Error::Database(DatabaseError::QueryFailed(
            "FOREIGN KEY constraint failed".to_string(),
        )));
        assert!(matches!(
            err,
            Error::Database(DatabaseError::TransactionFailed(ref msg)) if msg.contains("FOREIGN KEY")
        ));
    }

    #[test]
    fn test_input_errors_keep_their_kind() {
        let err = bulk_failure(Error::Database(DatabaseError::DuplicateKey(
            "wallets/w1".to_string(),
        )));
        assert!(err.is_duplicate_key());
    }
}
