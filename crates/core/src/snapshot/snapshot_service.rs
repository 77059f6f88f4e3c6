use async_trait::async_trait;
use chrono::Utc;
use futures::future::try_join_all;
use log::{info, warn};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::snapshot_model::{Snapshot, SNAPSHOT_FORMAT_VERSION};
use crate::collections::{Collection, CollectionStoreTrait, Record, CURRENT_GOLD_PRICE_ID};
use crate::errors::{DatabaseError, Error, Result};
use crate::finance::GoldPrice;
use crate::utils::time_utils::{date_stamp, timestamp};

const BACKUP_FILE_PREFIX: &str = "finance_backup_";

/// File name a backup taken on `date` (`YYYY-MM-DD`) is written to.
pub fn backup_file_name(date: &str) -> String {
    format!("{}{}.json", BACKUP_FILE_PREFIX, date)
}

#[async_trait]
pub trait SnapshotServiceTrait: Send + Sync {
    /// Reads every collection and returns one versioned document.
    async fn export_snapshot(&self) -> Result<Snapshot>;

    /// Writes the exported document to `dir` and returns the file path.
    async fn backup(&self, dir: &Path) -> Result<PathBuf>;

    /// Replaces the store content with a validated document.
    async fn restore(&self, document: serde_json::Value) -> Result<()>;

    async fn restore_json(&self, text: &str) -> Result<()>;

    /// Empties every collection and resets the gold price. There is no undo.
    async fn clear_all(&self) -> Result<()>;
}

pub struct SnapshotService {
    store: Arc<dyn CollectionStoreTrait>,
}

impl SnapshotService {
    pub fn new(store: Arc<dyn CollectionStoreTrait>) -> Self {
        SnapshotService { store }
    }

    async fn current_gold_price(&self) -> Result<Record> {
        match self
            .store
            .get_by_id(Collection::CurrentGoldPrice, CURRENT_GOLD_PRICE_ID)
            .await?
        {
            Some(record) => Ok(record),
            None => Record::from_model(&GoldPrice::fallback()),
        }
    }

    /// Builds the single unit of work a restore or reset commits.
    fn replacement_batches(
        snapshot: Snapshot,
        gold_price: Record,
    ) -> Vec<(Collection, Vec<Record>)> {
        let mut collections = snapshot.collections;
        let mut batches: Vec<(Collection, Vec<Record>)> = Collection::non_singletons()
            .map(|collection| {
                let records = collections.remove(&collection).unwrap_or_default();
                (collection, records)
            })
            .collect();
        batches.push((Collection::CurrentGoldPrice, vec![gold_price]));
        batches
    }

    async fn apply(&self, batches: Vec<(Collection, Vec<Record>)>) -> Result<()> {
        if self.store.replace_many(batches).await? {
            Ok(())
        } else {
            Err(DatabaseError::TransactionFailed("replacement was not committed".to_string()).into())
        }
    }
}

#[async_trait]
impl SnapshotServiceTrait for SnapshotService {
    async fn export_snapshot(&self) -> Result<Snapshot> {
        let reads = Collection::non_singletons().map(|collection| {
            let store = Arc::clone(&self.store);
            async move {
                let records = store.get_all(collection).await?;
                Ok::<_, Error>((collection, records))
            }
        });
        let (collections, gold_price) =
            futures::try_join!(try_join_all(reads), self.current_gold_price())?;

        Ok(Snapshot {
            collections: collections.into_iter().collect(),
            current_gold_price: Some(gold_price),
            exported_at: Some(timestamp(Utc::now())),
            version: Some(SNAPSHOT_FORMAT_VERSION.to_string()),
        })
    }

    async fn backup(&self, dir: &Path) -> Result<PathBuf> {
        let snapshot = self.export_snapshot().await?;
        let content = snapshot.to_json_pretty()?;

        tokio::fs::create_dir_all(dir).await?;
        let path = dir.join(backup_file_name(&date_stamp(Utc::now())));
        tokio::fs::write(&path, content).await.map_err(|e| {
            DatabaseError::BackupFailed(format!("{}: {}", path.display(), e))
        })?;

        info!("Backup written to {}", path.display());
        Ok(path)
    }

    async fn restore(&self, document: serde_json::Value) -> Result<()> {
        let snapshot = Snapshot::from_value(document)?;
        let gold_price = match snapshot.current_gold_price.clone() {
            Some(record) => record.with("id", CURRENT_GOLD_PRICE_ID),
            None => Record::from_model(&GoldPrice::restored())?,
        };
        let restored: usize = snapshot.collections.values().map(Vec::len).sum();

        self.apply(Self::replacement_batches(snapshot, gold_price))
            .await
            .map_err(|e| match e {
                Error::Database(DatabaseError::TransactionFailed(msg)) => {
                    Error::Database(DatabaseError::RestoreFailed(msg))
                }
                other => other,
            })?;

        info!("Restored {} record(s) from snapshot", restored);
        Ok(())
    }

    async fn restore_json(&self, text: &str) -> Result<()> {
        let snapshot = Snapshot::from_json(text)?;
        self.restore(snapshot.to_value()).await
    }

    async fn clear_all(&self) -> Result<()> {
        warn!("Clearing every collection");
        let empty = Snapshot {
            collections: Default::default(),
            current_gold_price: None,
            exported_at: None,
            version: None,
        };
        let gold_price = Record::from_model(&GoldPrice::reset())?;
        self.apply(Self::replacement_batches(empty, gold_price)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collections::{MemoryCollectionStore, USER_PROFILE_ID};
    use serde_json::json;

    fn record(value: serde_json::Value) -> Record {
        Record::from_value(value).unwrap()
    }

    async fn populated_store() -> Arc<MemoryCollectionStore> {
        let store = Arc::new(MemoryCollectionStore::new());
        store
            .replace_all(
                Collection::Wallets,
                vec![record(json!({"id": "w1", "name": "Cash", "balance": 10}))],
            )
            .await
            .unwrap();
        store
            .replace_all(
                Collection::Categories,
                vec![record(json!({"id": "c1", "name": "Food", "type": "expense"}))],
            )
            .await
            .unwrap();
        store
            .put(
                Collection::Transactions,
                record(json!({"id": "t1", "walletId": "w1", "amount": 5})),
            )
            .await
            .unwrap();
        store
    }

    async fn contents(store: &MemoryCollectionStore) -> Vec<(Collection, Vec<Record>)> {
        let mut all = Vec::new();
        for collection in Collection::ALL {
            all.push((collection, store.get_all(collection).await.unwrap()));
        }
        all
    }

    #[tokio::test]
    async fn test_export_contains_every_collection() {
        let store = populated_store().await;
        let service = SnapshotService::new(store.clone());

        let snapshot = service.export_snapshot().await.unwrap();
        assert_eq!(snapshot.collections.len(), 12);
        assert_eq!(snapshot.records(Collection::Wallets).len(), 1);
        assert_eq!(snapshot.version.as_deref(), Some("3.1"));
        assert!(snapshot.exported_at.is_some());

        let price: GoldPrice = snapshot.current_gold_price.unwrap().into_model().unwrap();
        assert_eq!(price, GoldPrice::fallback());
    }

    #[tokio::test]
    async fn test_restore_without_categories_changes_nothing() {
        let store = populated_store().await;
        let service = SnapshotService::new(store.clone());
        let before = contents(&store).await;

        let err = service
            .restore(json!({"wallets": [{"id": "w9"}]}))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::InvalidFormat(_)));
        assert_eq!(contents(&store).await, before);
    }

    #[tokio::test]
    async fn test_backup_then_restore_round_trips() {
        let store = populated_store().await;
        let service = SnapshotService::new(store.clone());
        let exported = service.export_snapshot().await.unwrap().to_value();
        let before = contents(&store).await;

        service.clear_all().await.unwrap();
        assert!(store.get_all(Collection::Wallets).await.unwrap().is_empty());

        service.restore(exported).await.unwrap();
        let after = contents(&store).await;
        for ((collection, expected), (_, actual)) in before.iter().zip(after.iter()) {
            if *collection == Collection::CurrentGoldPrice {
                continue;
            }
            assert_eq!(expected, actual, "collection {}", collection);
        }
    }

    #[tokio::test]
    async fn test_restore_without_price_uses_restore_default() {
        let store = populated_store().await;
        let service = SnapshotService::new(store.clone());

        service
            .restore(json!({"wallets": [], "categories": []}))
            .await
            .unwrap();

        let price: GoldPrice = store
            .get_by_id(Collection::CurrentGoldPrice, CURRENT_GOLD_PRICE_ID)
            .await
            .unwrap()
            .unwrap()
            .into_model()
            .unwrap();
        assert_eq!(price.source, "Restored");
        assert_eq!(price.buy, 1_000_000.0);
        assert!(store.get_all(Collection::Transactions).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_clear_all_resets_price_and_keeps_profile() {
        let store = populated_store().await;
        store
            .put(
                Collection::UserProfile,
                record(json!({"id": USER_PROFILE_ID, "name": "Sari"})),
            )
            .await
            .unwrap();
        let service = SnapshotService::new(store.clone());

        service.clear_all().await.unwrap();

        for collection in Collection::non_singletons() {
            assert_eq!(store.count(collection).await.unwrap(), 0);
        }
        let price: GoldPrice = store
            .get_by_id(Collection::CurrentGoldPrice, CURRENT_GOLD_PRICE_ID)
            .await
            .unwrap()
            .unwrap()
            .into_model()
            .unwrap();
        assert_eq!(price.source, "Reset");
        assert_eq!(store.count(Collection::UserProfile).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_backup_writes_dated_file() {
        let store = populated_store().await;
        let service = SnapshotService::new(store.clone());
        let dir = tempfile::tempdir().unwrap();

        let path = service.backup(dir.path()).await.unwrap();
        let name = path.file_name().unwrap().to_str().unwrap().to_string();
        assert!(name.starts_with("finance_backup_"));
        assert!(name.ends_with(".json"));

        let text = std::fs::read_to_string(&path).unwrap();
        service.clear_all().await.unwrap();
        service.restore_json(&text).await.unwrap();
        assert_eq!(store.count(Collection::Transactions).await.unwrap(), 1);
    }
}
