use diesel::sqlite::SqliteConnection;

use crate::collections::queries;
use dompet_core::collections::{Collection, Record};
use dompet_core::errors::Result;
use dompet_core::seed::SeedTarget;

/// Record operations bound to one open transaction.
///
/// Handed to writer jobs and to the schema runner. Nothing done through it is
/// visible to other connections until the surrounding transaction commits.
pub struct UnitOfWork<'c> {
    conn: &'c mut SqliteConnection,
}

impl<'c> UnitOfWork<'c> {
    pub fn new(conn: &'c mut SqliteConnection) -> Self {
        UnitOfWork { conn }
    }

    /// The transaction's connection, for writes outside the record tables.
    pub fn connection(&mut self) -> &mut SqliteConnection {
        self.conn
    }

    pub fn get_all(&mut self, collection: Collection) -> Result<Vec<Record>> {
        queries::load_records(self.conn, collection)
    }

    pub fn get_by_id(&mut self, collection: Collection, id: &str) -> Result<Option<Record>> {
        queries::find_record(self.conn, collection, id)
    }

    pub fn count(&mut self, collection: Collection) -> Result<usize> {
        queries::count_records(self.conn, collection)
    }

    pub fn add(&mut self, collection: Collection, record: Record) -> Result<Record> {
        queries::insert_record(self.conn, collection, record)
    }

    pub fn put(&mut self, collection: Collection, record: Record) -> Result<Record> {
        queries::upsert_record(self.conn, collection, record)
    }

    pub fn update(&mut self, collection: Collection, id: &str, patch: Record) -> Result<Record> {
        queries::update_record(self.conn, collection, id, patch)
    }

    pub fn delete(&mut self, collection: Collection, id: &str) -> Result<()> {
        queries::delete_record(self.conn, collection, id)
    }

    pub fn replace_all(&mut self, collection: Collection, records: Vec<Record>) -> Result<usize> {
        queries::replace_collection(self.conn, collection, records)
    }
}

impl SeedTarget for UnitOfWork<'_> {
    fn count(&mut self, collection: Collection) -> Result<usize> {
        queries::count_records(self.conn, collection)
    }

    fn insert(&mut self, collection: Collection, record: Record) -> Result<()> {
        queries::insert_record(self.conn, collection, record).map(|_| ())
    }
}
