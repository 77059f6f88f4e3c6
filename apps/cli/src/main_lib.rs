use std::sync::Arc;

use crate::config::Config;
use dompet_core::{
    collections::CollectionStoreTrait,
    finance::FinanceService,
    settings::{SettingsService, SettingsServiceTrait},
    snapshot::{SnapshotService, SnapshotServiceTrait},
};
use dompet_storage_sqlite::{
    CollectionRepository, SettingsRepository, StoreConfig, StoreConnection,
};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

pub struct AppState {
    pub connection: Arc<StoreConnection>,
    pub collections: Arc<dyn CollectionStoreTrait>,
    pub finance_service: Arc<FinanceService>,
    pub snapshot_service: Arc<dyn SnapshotServiceTrait>,
    pub settings_service: Arc<dyn SettingsServiceTrait>,
    pub config: Config,
}

/// Installs the tracing subscriber. `log` records from the library crates
/// are forwarded to it.
pub fn init_tracing() {
    let log_format = std::env::var("DOMPET_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let registry = tracing_subscriber::registry().with(filter);

    if log_format.eq_ignore_ascii_case("json") {
        registry
            .with(
                fmt::layer()
                    .json()
                    .with_current_span(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}

/// Wires the store and the services. The store itself opens on first use.
pub fn build_state(config: &Config) -> anyhow::Result<Arc<AppState>> {
    let store_config =
        StoreConfig::new(config.db_path.clone()).with_read_fault_policy(config.read_fault_policy);
    tracing::debug!("Database path in use: {}", store_config.db_path);

    let connection = Arc::new(StoreConnection::new(store_config));
    let collections: Arc<dyn CollectionStoreTrait> =
        Arc::new(CollectionRepository::new(Arc::clone(&connection)));
    let settings_repository = Arc::new(SettingsRepository::new(Arc::clone(&connection)));

    Ok(Arc::new(AppState {
        finance_service: Arc::new(FinanceService::new(Arc::clone(&collections))),
        snapshot_service: Arc::new(SnapshotService::new(Arc::clone(&collections))),
        settings_service: Arc::new(SettingsService::new(settings_repository)),
        collections,
        connection,
        config: config.clone(),
    }))
}
