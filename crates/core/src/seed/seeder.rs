//! Default starter content inserted when a collection is first created.

use log::{debug, info};
use serde_json::json;

use crate::collections::{validate_batch, Collection, Record, CURRENT_GOLD_PRICE_ID};
use crate::errors::Result;

/// Stamped on every seeded record.
pub const SEED_VERSION: u32 = 1;

/// Minimal record access the seeder needs.
///
/// Implemented by the storage layer over the open migration transaction, so
/// seeding commits or rolls back together with schema creation.
pub trait SeedTarget {
    fn count(&mut self, collection: Collection) -> Result<usize>;
    fn insert(&mut self, collection: Collection, record: Record) -> Result<()>;
}

/// Deterministic starter records for a collection. Empty for collections
/// that start out empty.
pub fn default_seed(collection: Collection) -> Vec<Record> {
    let values = match collection {
        Collection::Wallets => vec![
            json!({"id": "seed-wallet-cash", "name": "Cash", "balance": 500000, "emoji": "💵"}),
            json!({"id": "seed-wallet-bank", "name": "Bank Account", "balance": 1500000, "emoji": "💳"}),
        ],
        Collection::Categories => vec![
            json!({"id": "seed-category-food", "name": "Food", "type": "expense", "emoji": "🍔"}),
            json!({"id": "seed-category-transport", "name": "Transport", "type": "expense", "emoji": "🚌"}),
            json!({"id": "seed-category-salary", "name": "Salary", "type": "income", "emoji": "💰"}),
        ],
        Collection::CurrentGoldPrice => vec![
            json!({"id": CURRENT_GOLD_PRICE_ID, "buy": 1200000, "sell": 1150000, "source": "Default"}),
        ],
        _ => Vec::new(),
    };

    values
        .into_iter()
        .filter_map(|value| match value {
            serde_json::Value::Object(map) => {
                Some(Record::from(map).with("seedVersion", SEED_VERSION))
            }
            _ => None,
        })
        .collect()
}

/// Inserts `records` into `collection` only if it holds no records yet.
///
/// Returns the number of records inserted.
pub fn seed_if_empty<T: SeedTarget + ?Sized>(
    target: &mut T,
    collection: Collection,
    records: Vec<Record>,
) -> Result<usize> {
    if records.is_empty() {
        return Ok(0);
    }

    let existing = target.count(collection)?;
    if existing > 0 {
        debug!(
            "Skipping seed for '{}': {} record(s) already present",
            collection, existing
        );
        return Ok(0);
    }

    validate_batch(collection, &records)?;
    let inserted = records.len();
    for record in records {
        target.insert(collection, record)?;
    }
    info!("Seeded '{}' with {} record(s)", collection, inserted);
    Ok(inserted)
}
