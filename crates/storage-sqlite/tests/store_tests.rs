//! Integration tests for the SQLite document store.
//!
//! Each test opens a fresh database in a temp directory and goes through the
//! same open gate, writer and repositories the CLI uses.

use diesel::RunQueryDsl;
use dompet_core::collections::{
    Collection, CollectionStoreTrait, MigrationStep, Record, SchemaRegistry,
};
use dompet_core::errors::{DatabaseError, Error};
use dompet_core::finance::{FinanceService, NewSchedule, Wallet};
use dompet_core::settings::{SettingsService, SettingsServiceTrait};
use dompet_core::snapshot::{SnapshotService, SnapshotServiceTrait};
use dompet_storage_sqlite::{
    CollectionRepository, ReadFaultPolicy, SettingsRepository, StoreConfig, StoreConnection,
    StoreState,
};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tempfile::{tempdir, TempDir};

fn store_config(dir: &TempDir) -> StoreConfig {
    StoreConfig::new(dir.path().join("store.db").to_string_lossy().into_owned())
}

fn open_repository(config: StoreConfig) -> (Arc<StoreConnection>, Arc<CollectionRepository>) {
    let connection = Arc::new(StoreConnection::new(config));
    let repository = Arc::new(CollectionRepository::new(Arc::clone(&connection)));
    (connection, repository)
}

fn record(value: serde_json::Value) -> Record {
    Record::from_value(value).unwrap()
}

#[tokio::test]
async fn concurrent_first_calls_share_one_open_and_seed_once() {
    let dir = tempdir().unwrap();
    let (connection, repo) = open_repository(store_config(&dir));
    assert_eq!(connection.state(), StoreState::Uninitialized);

    let reads = (0..8).map(|_| {
        let repo = Arc::clone(&repo);
        tokio::spawn(async move { repo.get_all(Collection::Categories).await })
    });
    for read in futures::future::join_all(reads).await {
        assert_eq!(read.unwrap().unwrap().len(), 3);
    }

    assert_eq!(connection.state(), StoreState::Ready);
    assert_eq!(repo.count(Collection::Categories).await.unwrap(), 3);
    assert_eq!(repo.count(Collection::Wallets).await.unwrap(), 2);

    let handle = connection.open().await.unwrap();
    assert_eq!(handle.report().from_version, 0);
    assert_eq!(handle.report().to_version, 3);
}

#[tokio::test]
async fn replace_all_leaves_exactly_the_new_batch() {
    let dir = tempdir().unwrap();
    let (_connection, repo) = open_repository(store_config(&dir));

    let batch = vec![
        record(json!({"id": "b", "name": "Bank", "balance": 100})),
        record(json!({"id": "a", "name": "Cash", "balance": 5, "meta": {"pinned": true}})),
    ];
    assert!(repo
        .replace_all(Collection::Wallets, batch.clone())
        .await
        .unwrap());

    let stored = repo.get_all(Collection::Wallets).await.unwrap();
    assert_eq!(stored, vec![batch[1].clone(), batch[0].clone()]);
}

#[tokio::test]
async fn add_then_get_returns_the_same_record() {
    let dir = tempdir().unwrap();
    let (_connection, repo) = open_repository(store_config(&dir));

    let transaction = record(json!({
        "id": "t1",
        "walletId": "seed-wallet-cash",
        "amount": 12500.5,
        "tags": ["lunch", "work"],
        "note": null
    }));
    repo.add(Collection::Transactions, transaction.clone())
        .await
        .unwrap();

    let stored = repo
        .get_by_id(Collection::Transactions, "t1")
        .await
        .unwrap();
    assert_eq!(stored, Some(transaction.clone()));

    let err = repo
        .add(Collection::Transactions, transaction)
        .await
        .unwrap_err();
    assert!(err.is_duplicate_key());
}

#[tokio::test]
async fn update_merges_and_keeps_unmentioned_fields() {
    let dir = tempdir().unwrap();
    let (_connection, repo) = open_repository(store_config(&dir));
    repo.add(
        Collection::Budgets,
        record(json!({"id": "food", "limit": 1000, "spent": 10, "month": "2024-05"})),
    )
    .await
    .unwrap();

    let updated = repo
        .update(
            Collection::Budgets,
            "food",
            record(json!({"id": "ignored", "spent": 250})),
        )
        .await
        .unwrap();
    assert_eq!(
        updated.into_value(),
        json!({"id": "food", "limit": 1000, "spent": 250, "month": "2024-05"})
    );

    let err = repo
        .update(Collection::Budgets, "missing", record(json!({"spent": 1})))
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn delete_is_idempotent() {
    let dir = tempdir().unwrap();
    let (_connection, repo) = open_repository(store_config(&dir));

    assert!(repo
        .delete(Collection::Wallets, "seed-wallet-cash")
        .await
        .unwrap());
    assert!(repo
        .delete(Collection::Wallets, "seed-wallet-cash")
        .await
        .unwrap());
    assert!(repo
        .get_by_id(Collection::Wallets, "seed-wallet-cash")
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn failed_replace_all_keeps_the_previous_content() {
    let dir = tempdir().unwrap();
    let (_connection, repo) = open_repository(store_config(&dir));
    let before = repo.get_all(Collection::Categories).await.unwrap();

    let missing_key = vec![
        record(json!({"id": "new", "name": "New"})),
        record(json!({"name": "No key"})),
    ];
    assert!(repo
        .replace_all(Collection::Categories, missing_key)
        .await
        .is_err());

    let duplicate = vec![record(json!({"id": "x"})), record(json!({"id": "x"}))];
    let err = repo
        .replace_all(Collection::Categories, duplicate)
        .await
        .unwrap_err();
    assert!(err.is_duplicate_key());

    assert_eq!(repo.get_all(Collection::Categories).await.unwrap(), before);
}

#[tokio::test]
async fn engine_failure_after_the_clear_rolls_back_the_whole_batch() {
    let dir = tempdir().unwrap();
    // Only the first schema step: savings goals are not a registered collection,
    // so inserting into them breaks the foreign key after wallets were cleared.
    let first_step = SchemaRegistry::default().steps()[..1].to_vec();
    let connection = Arc::new(StoreConnection::with_registry(
        store_config(&dir),
        SchemaRegistry::new(first_step).unwrap(),
    ));
    let repo = CollectionRepository::new(Arc::clone(&connection));
    let before = repo.get_all(Collection::Wallets).await.unwrap();
    assert_eq!(before.len(), 2);

    let err = repo
        .replace_many(vec![
            (Collection::Wallets, vec![record(json!({"id": "new"}))]),
            (Collection::SavingsGoals, vec![record(json!({"id": "g1"}))]),
        ])
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        Error::Database(DatabaseError::TransactionFailed(_))
    ));
    assert_eq!(repo.get_all(Collection::Wallets).await.unwrap(), before);

    let err = repo
        .replace_all(Collection::SavingsGoals, vec![record(json!({"id": "g1"}))])
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        Error::Database(DatabaseError::TransactionFailed(_))
    ));
}

#[tokio::test]
async fn float_fields_read_back_exactly() {
    let dir = tempdir().unwrap();
    let (_connection, repo) = open_repository(store_config(&dir));
    let amounts = [
        1.0715660391465826e-75,
        0.1 + 0.2,
        1e308,
        -2.5e-300,
        123456.789,
        5e-324,
    ];

    for (i, amount) in amounts.iter().enumerate() {
        let added = record(json!({"id": format!("t{}", i), "amount": amount}));
        repo.add(Collection::Transactions, added.clone())
            .await
            .unwrap();
        let stored = repo
            .get_by_id(Collection::Transactions, &format!("t{}", i))
            .await
            .unwrap();
        assert_eq!(stored, Some(added));
    }
}

#[tokio::test]
async fn single_read_connection_is_not_taken_by_the_writer() {
    let dir = tempdir().unwrap();
    let config = store_config(&dir)
        .with_pool_size(1)
        .with_busy_timeout(Duration::from_secs(2))
        .with_read_fault_policy(ReadFaultPolicy::Propagate);
    let (_connection, repo) = open_repository(config);

    assert_eq!(repo.get_all(Collection::Wallets).await.unwrap().len(), 2);
    repo.add(Collection::Budgets, record(json!({"id": "b1"})))
        .await
        .unwrap();
    assert_eq!(repo.count(Collection::Budgets).await.unwrap(), 1);
}

#[tokio::test]
async fn exhausted_pool_reports_a_connection_failure() {
    let dir = tempdir().unwrap();
    let config = store_config(&dir)
        .with_pool_size(1)
        .with_busy_timeout(Duration::from_millis(200));
    let (connection, _repo) = open_repository(config);
    let handle = connection.open().await.unwrap();

    let _held = handle.get_connection().unwrap();
    let err = handle.get_connection().err().unwrap();
    assert!(matches!(
        err,
        Error::Database(DatabaseError::ConnectionFailed(_))
    ));
}

#[tokio::test]
async fn failed_seed_is_skipped_and_the_upgrade_still_commits() {
    static LEDGER: [Collection; 1] = [Collection::Transactions];
    static STARTERS: [Collection; 2] = [Collection::Wallets, Collection::Categories];
    let steps = vec![
        MigrationStep {
            version: 1,
            description: "ledger",
            collections: &LEDGER,
        },
        MigrationStep {
            version: 2,
            description: "starter data",
            collections: &STARTERS,
        },
    ];

    let dir = tempdir().unwrap();
    let v1 = StoreConnection::with_registry(
        store_config(&dir),
        SchemaRegistry::new(steps[..1].to_vec()).unwrap(),
    );
    let handle = v1.open().await.unwrap();
    {
        let mut conn = handle.get_connection().unwrap();
        diesel::sql_query(
            "CREATE TRIGGER refuse_wallets BEFORE INSERT ON records \
             WHEN NEW.collection = 'wallets' \
             BEGIN SELECT RAISE(ABORT, 'wallets are read-only'); END",
        )
        .execute(&mut conn)
        .unwrap();
    }
    drop(handle);
    v1.close().unwrap();

    let v2 = Arc::new(StoreConnection::with_registry(
        store_config(&dir),
        SchemaRegistry::new(steps.clone()).unwrap(),
    ));
    let report = v2.open().await.unwrap().report().clone();
    assert_eq!((report.from_version, report.to_version), (1, 2));
    assert_eq!(report.seeded, vec![(Collection::Categories, 3)]);

    let repo = CollectionRepository::new(Arc::clone(&v2));
    assert_eq!(repo.count(Collection::Wallets).await.unwrap(), 0);
    assert_eq!(repo.count(Collection::Categories).await.unwrap(), 3);

    v2.close().unwrap();
    let reopened = StoreConnection::with_registry(
        store_config(&dir),
        SchemaRegistry::new(steps).unwrap(),
    );
    let report = reopened.open().await.unwrap().report().clone();
    assert_eq!(report.from_version, 2);
    assert!(!report.upgraded());
}

#[tokio::test]
async fn concurrent_writes_are_all_applied() {
    let dir = tempdir().unwrap();
    let config = store_config(&dir)
        .with_pool_size(2)
        .with_busy_timeout(Duration::from_secs(5));
    let (_connection, repo) = open_repository(config);

    let writes = (0..20).map(|i| {
        let repo = Arc::clone(&repo);
        tokio::spawn(async move {
            repo.add(
                Collection::SavingsTransactions,
                record(json!({"id": format!("st-{:02}", i), "amount": i})),
            )
            .await
        })
    });
    for write in futures::future::join_all(writes).await {
        write.unwrap().unwrap();
    }

    assert_eq!(
        repo.count(Collection::SavingsTransactions).await.unwrap(),
        20
    );
}

#[tokio::test]
async fn emptied_collections_are_not_reseeded() {
    let dir = tempdir().unwrap();
    let (connection, repo) = open_repository(store_config(&dir));
    let finance = FinanceService::new(repo.clone());

    let wallets = finance.get_wallets().await.unwrap();
    let seeded: Vec<(&str, f64)> = wallets
        .iter()
        .map(|w| (w.name.as_str(), w.balance))
        .collect();
    assert_eq!(seeded, vec![("Bank Account", 1_500_000.0), ("Cash", 500_000.0)]);
    assert!(finance.save_wallets(&[]).await.unwrap());
    assert!(finance.get_wallets().await.unwrap().is_empty());

    connection.close().unwrap();
    assert_eq!(connection.state(), StoreState::Uninitialized);

    let (reopened, repo) = open_repository(store_config(&dir));
    let finance = FinanceService::new(repo);
    assert!(finance.get_wallets().await.unwrap().is_empty());

    let report = reopened.ensure_ready().await.unwrap().report().clone();
    assert_eq!(report.from_version, 3);
    assert!(!report.upgraded());
    assert!(report.seeded.is_empty());
}

#[tokio::test]
async fn upgrade_adds_collections_without_touching_existing_data() {
    let dir = tempdir().unwrap();
    let first_step = SchemaRegistry::default().steps()[..1].to_vec();
    let v1 = StoreConnection::with_registry(
        store_config(&dir),
        SchemaRegistry::new(first_step).unwrap(),
    );
    let v1 = Arc::new(v1);
    let repo = CollectionRepository::new(Arc::clone(&v1));
    repo.replace_all(Collection::Wallets, vec![record(json!({"id": "w1"}))])
        .await
        .unwrap();
    assert_eq!(v1.ensure_ready().await.unwrap().report().to_version, 1);
    v1.close().unwrap();

    let (current, repo) = open_repository(store_config(&dir));
    let report = current.ensure_ready().await.unwrap().report().clone();
    assert_eq!((report.from_version, report.to_version), (1, 3));
    assert!(report.seeded.is_empty());

    assert_eq!(
        repo.get_all(Collection::Wallets).await.unwrap(),
        vec![record(json!({"id": "w1"}))]
    );
    repo.add(Collection::Schedules, record(json!({"id": "s1"})))
        .await
        .unwrap();
}

#[tokio::test]
async fn newer_schema_version_is_refused_and_the_open_is_retryable() {
    let dir = tempdir().unwrap();
    let (connection, _repo) = open_repository(store_config(&dir));
    let handle = connection.ensure_ready().await.unwrap();
    let set_version = |version: u32| {
        let mut conn = handle.get_connection().unwrap();
        diesel::sql_query(format!(
            "UPDATE store_meta SET meta_value = '{}' WHERE meta_key = 'schema_version'",
            version
        ))
        .execute(&mut conn)
        .unwrap();
    };
    set_version(99);

    let config = store_config(&dir).with_read_fault_policy(ReadFaultPolicy::Propagate);
    let (newer, repo) = open_repository(config);
    let err = newer.ensure_ready().await.err().unwrap();
    assert!(matches!(
        err,
        Error::Database(DatabaseError::ConnectionFailed(_))
    ));
    assert_eq!(newer.state(), StoreState::Uninitialized);
    assert!(repo.get_all(Collection::Wallets).await.is_err());

    set_version(3);
    assert_eq!(repo.get_all(Collection::Wallets).await.unwrap().len(), 2);
    assert_eq!(newer.state(), StoreState::Ready);
}

#[tokio::test]
async fn read_fault_policy_decides_what_a_failed_open_returns() {
    let dir = tempdir().unwrap();
    // The database directory cannot be created under a regular file.
    let blocker = dir.path().join("blocker");
    std::fs::write(&blocker, b"not a directory").unwrap();
    let unusable = blocker.join("store.db").to_string_lossy().into_owned();

    let (_connection, degrade) = open_repository(StoreConfig::new(unusable.clone()));
    assert!(degrade
        .get_all(Collection::Wallets)
        .await
        .unwrap()
        .is_empty());
    assert!(degrade
        .get_by_id(Collection::Wallets, "any")
        .await
        .unwrap()
        .is_none());
    assert!(degrade
        .add(Collection::Wallets, record(json!({"id": "w1"})))
        .await
        .is_err());

    let (_connection, propagate) = open_repository(
        StoreConfig::new(unusable).with_read_fault_policy(ReadFaultPolicy::Propagate),
    );
    assert!(propagate.get_all(Collection::Wallets).await.is_err());
}

#[tokio::test]
async fn schedule_lifecycle() {
    let dir = tempdir().unwrap();
    let (_connection, repo) = open_repository(store_config(&dir));
    let finance = FinanceService::new(repo);

    let schedule = finance
        .add_schedule(NewSchedule {
            title: "Pay rent".to_string(),
            date: "2024-06-01".to_string(),
            ..Default::default()
        })
        .await
        .unwrap();
    assert!(!schedule.id.is_empty());
    assert!(schedule.created_at.is_some());
    assert_eq!(
        finance.get_schedule(&schedule.id).await.unwrap(),
        Some(schedule.clone())
    );

    let updated = finance
        .update_schedule(&schedule.id, record(json!({"status": "done"})))
        .await
        .unwrap();
    assert_eq!(updated.status.as_deref(), Some("done"));
    assert_eq!(updated.title, "Pay rent");

    assert!(finance.delete_schedule(&schedule.id).await.unwrap());
    assert!(finance.get_schedule(&schedule.id).await.unwrap().is_none());
    assert!(finance
        .update_schedule(&schedule.id, record(json!({"status": "pending"})))
        .await
        .unwrap_err()
        .is_not_found());
}

#[tokio::test]
async fn restore_without_categories_leaves_everything_unchanged() {
    let dir = tempdir().unwrap();
    let (_connection, repo) = open_repository(store_config(&dir));
    let snapshots = SnapshotService::new(repo.clone());
    let before = snapshots.export_snapshot().await.unwrap();

    let err = snapshots
        .restore(json!({"wallets": [{"id": "w9", "name": "Other"}]}))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidFormat(_)));

    let after = snapshots.export_snapshot().await.unwrap();
    assert_eq!(after.collections, before.collections);
    assert_eq!(after.current_gold_price, before.current_gold_price);
}

#[tokio::test]
async fn backup_then_restore_round_trips_every_collection() {
    let dir = tempdir().unwrap();
    let (_connection, repo) = open_repository(store_config(&dir));
    let finance = FinanceService::new(repo.clone());
    let snapshots = SnapshotService::new(repo.clone());

    finance
        .save_wallets(&[Wallet {
            id: "w1".to_string(),
            name: "Savings".to_string(),
            balance: 2_500_000.0,
            ..Default::default()
        }])
        .await
        .unwrap();
    repo.add(
        Collection::Liabilities,
        record(json!({"id": "l1", "name": "Car loan", "remaining": 12_000_000})),
    )
    .await
    .unwrap();
    let before = snapshots.export_snapshot().await.unwrap();

    let backup_dir = dir.path().join("backups");
    let path = snapshots.backup(&backup_dir).await.unwrap();
    let text = std::fs::read_to_string(path).unwrap();

    snapshots.clear_all().await.unwrap();
    assert!(finance.get_wallets().await.unwrap().is_empty());
    assert_eq!(finance.get_gold_price().await.unwrap().source, "Reset");

    snapshots.restore_json(&text).await.unwrap();
    let after = snapshots.export_snapshot().await.unwrap();
    assert_eq!(after.collections, before.collections);
    assert_eq!(after.current_gold_price, before.current_gold_price);
}

#[tokio::test]
async fn settings_are_kept_outside_the_collections() {
    let dir = tempdir().unwrap();
    let (connection, repo) = open_repository(store_config(&dir));
    let settings = SettingsService::new(Arc::new(SettingsRepository::new(Arc::clone(
        &connection,
    ))));

    settings
        .save_saved_themes(&[json!({"name": "Ocean", "primary": "#0ea5e9"})])
        .await
        .unwrap();
    settings.save_quick_note("check gold price").await.unwrap();
    SnapshotService::new(repo).clear_all().await.unwrap();

    assert_eq!(settings.get_saved_themes().await.unwrap().len(), 1);
    assert_eq!(settings.get_quick_note().await.unwrap(), "check gold price");
    settings.clear_quick_note().await.unwrap();
    assert_eq!(settings.get_quick_note().await.unwrap(), "");
}
