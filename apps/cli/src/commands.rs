use anyhow::{bail, Context};
use serde_json::Value;
use std::path::Path;

use crate::main_lib::AppState;
use dompet_core::collections::{Collection, CollectionStoreTrait, Record};
use dompet_core::settings::SettingsServiceTrait;
use dompet_core::snapshot::SnapshotServiceTrait;

fn print_json(value: &Value) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn parse_collection(name: &str) -> anyhow::Result<Collection> {
    name.parse::<Collection>()
        .with_context(|| format!("known collections: {}", collection_names()))
}

fn collection_names() -> String {
    Collection::ALL
        .iter()
        .map(|c| c.name())
        .collect::<Vec<_>>()
        .join(", ")
}

pub async fn init(state: &AppState) -> anyhow::Result<()> {
    let handle = state.connection.open().await?;
    let report = handle.report();

    println!("Data directory: {}", state.config.data_dir.display());
    println!("Database: {}", state.config.db_path);
    if report.upgraded() {
        println!(
            "Schema upgraded from version {} to {}",
            report.from_version, report.to_version
        );
    } else {
        println!("Schema version {} (up to date)", report.to_version);
    }
    for (collection, count) in &report.seeded {
        println!("  seeded {:<20} {} record(s)", collection.name(), count);
    }

    let wallets = state.finance_service.get_wallets().await?;
    let price = state.finance_service.get_gold_price().await?;
    println!("Wallets: {}", wallets.len());
    println!(
        "Gold price: buy {} / sell {} ({})",
        price.buy, price.sell, price.source
    );
    Ok(())
}

pub async fn export(state: &AppState) -> anyhow::Result<()> {
    let snapshot = state.snapshot_service.export_snapshot().await?;
    println!("{}", snapshot.to_json_pretty()?);
    Ok(())
}

pub async fn backup(state: &AppState) -> anyhow::Result<()> {
    let path = state
        .snapshot_service
        .backup(&state.config.backup_dir)
        .await?;
    println!("Backup written to {}", path.display());
    Ok(())
}

pub async fn restore(state: &AppState, file: &str) -> anyhow::Result<()> {
    let text = tokio::fs::read_to_string(Path::new(file))
        .await
        .with_context(|| format!("cannot read {}", file))?;
    state.snapshot_service.restore_json(&text).await?;
    println!("Restored from {}", file);
    Ok(())
}

pub async fn clear(state: &AppState, confirmed: bool) -> anyhow::Result<()> {
    if !confirmed {
        bail!("clear removes every record and cannot be undone; pass --yes to confirm");
    }
    state.snapshot_service.clear_all().await?;
    println!("All collections cleared");
    Ok(())
}

pub async fn list(state: &AppState, collection: &str) -> anyhow::Result<()> {
    let collection = parse_collection(collection)?;
    let records = state.collections.get_all(collection).await?;
    print_json(&Value::Array(
        records.into_iter().map(Record::into_value).collect(),
    ))
}

pub async fn get(state: &AppState, collection: &str, id: &str) -> anyhow::Result<()> {
    let collection = parse_collection(collection)?;
    match state.collections.get_by_id(collection, id).await? {
        Some(record) => print_json(&record.into_value()),
        None => bail!("no record '{}' in {}", id, collection),
    }
}

pub async fn put(state: &AppState, collection: &str, json: &str) -> anyhow::Result<()> {
    let collection = parse_collection(collection)?;
    let value: Value = serde_json::from_str(json).context("record is not valid JSON")?;
    let record = Record::from_value(value)?;

    let stored = if collection.is_singleton() {
        state.collections.put(collection, record).await?
    } else {
        state.collections.add(collection, record).await?
    };
    print_json(&stored.into_value())
}

pub async fn delete(state: &AppState, collection: &str, id: &str) -> anyhow::Result<()> {
    let collection = parse_collection(collection)?;
    state.collections.delete(collection, id).await?;
    println!("Deleted {}/{}", collection, id);
    Ok(())
}

pub async fn note(state: &AppState, text: Option<&str>, clear: bool) -> anyhow::Result<()> {
    let settings = &state.settings_service;
    if clear {
        settings.clear_quick_note().await?;
    } else if let Some(text) = text {
        settings.save_quick_note(text).await?;
    } else {
        println!("{}", settings.get_quick_note().await?);
    }
    Ok(())
}
