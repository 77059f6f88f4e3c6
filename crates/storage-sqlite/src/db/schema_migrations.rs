//! Collection schema versioning.
//!
//! The table layout itself comes from the embedded Diesel migrations. This
//! runner tracks which collections are declared, stored as a single version
//! number in `store_meta`, and seeds a collection only in the step that
//! introduces it. That keeps seeding to once per collection for the life of
//! the database, even if the user later empties it.

use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use log::{debug, info, warn};

use super::{get_connection, DbPool, UnitOfWork};
use crate::collections::model::{CollectionDB, StoreMetaDB};
use crate::errors::{IntoCore, StorageError};
use crate::schema::{collections, store_meta};
use dompet_core::collections::{Collection, SchemaRegistry};
use dompet_core::errors::{DatabaseError, Error, Result};
use dompet_core::seed::{default_seed, seed_if_empty};
use dompet_core::utils::time_utils::now_timestamp;

pub const SCHEMA_VERSION_KEY: &str = "schema_version";

/// What an open did to the collection schema.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationReport {
    pub from_version: u32,
    pub to_version: u32,
    /// Collections seeded by this run and how many records each received.
    pub seeded: Vec<(Collection, usize)>,
}

impl MigrationReport {
    pub fn upgraded(&self) -> bool {
        self.to_version > self.from_version
    }
}

/// Stored schema version; `0` for a database no runner has touched.
pub fn read_schema_version(conn: &mut SqliteConnection) -> Result<u32> {
    let stored = store_meta::table
        .find(SCHEMA_VERSION_KEY)
        .select(store_meta::meta_value)
        .first::<String>(conn)
        .optional()
        .into_core()?;

    match stored {
        None => Ok(0),
        Some(raw) => raw.trim().parse::<u32>().map_err(|e| {
            Error::Database(DatabaseError::MigrationFailed(format!(
                "unreadable schema version '{}': {}",
                raw, e
            )))
        }),
    }
}

fn write_schema_version(conn: &mut SqliteConnection, version: u32) -> Result<()> {
    diesel::replace_into(store_meta::table)
        .values(&StoreMetaDB {
            meta_key: SCHEMA_VERSION_KEY.to_string(),
            meta_value: version.to_string(),
        })
        .execute(conn)
        .into_core()?;
    Ok(())
}

/// Brings the stored schema up to `registry`'s version in one immediate
/// transaction. Either every pending step lands or none does.
///
/// A stored version newer than the registry's is refused.
pub fn run_schema_migrations(pool: &DbPool, registry: &SchemaRegistry) -> Result<MigrationReport> {
    let mut conn = get_connection(pool)?;
    conn.immediate_transaction::<_, StorageError, _>(|conn| {
        apply_pending_steps(conn, registry).map_err(StorageError::from)
    })
    .map_err(Error::from)
}

fn apply_pending_steps(
    conn: &mut SqliteConnection,
    registry: &SchemaRegistry,
) -> Result<MigrationReport> {
    let from_version = read_schema_version(conn)?;
    let steps = registry.pending_steps(from_version)?;
    let mut report = MigrationReport {
        from_version,
        to_version: from_version,
        seeded: Vec::new(),
    };

    if steps.is_empty() {
        debug!("Collection schema is current at version {}", from_version);
        return Ok(report);
    }

    let now = now_timestamp();
    for step in steps {
        info!(
            "Upgrading collection schema to version {}: {}",
            step.version, step.description
        );

        let rows: Vec<CollectionDB> = step
            .collections
            .iter()
            .map(|collection| CollectionDB::new(*collection, &now))
            .collect();
        diesel::insert_or_ignore_into(collections::table)
            .values(&rows)
            .execute(conn)
            .into_core()?;

        for &collection in step.collections {
            let defaults = default_seed(collection);
            if defaults.is_empty() {
                continue;
            }
            // A savepoint per collection: a failed seed is dropped on its own
            // and the upgrade goes on.
            let seeded = conn.transaction::<_, StorageError, _>(|conn| {
                let mut uow = UnitOfWork::new(conn);
                seed_if_empty(&mut uow, collection, defaults).map_err(StorageError::from)
            });
            match seeded {
                Ok(0) => {}
                Ok(count) => report.seeded.push((collection, count)),
                Err(e) => warn!("Seeding '{}' failed, continuing without it: {}", collection, e),
            }
        }

        write_schema_version(conn, step.version)?;
        report.to_version = step.version;
    }

    info!(
        "Collection schema upgraded from version {} to {}",
        report.from_version, report.to_version
    );
    Ok(report)
}
