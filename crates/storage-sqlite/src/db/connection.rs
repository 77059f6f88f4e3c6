//! The store's open gate.
//!
//! The first caller starts the open; every caller that arrives while it is in
//! flight awaits the same shared attempt, so the table migrations, the schema
//! runner and the writer are set up once. A failed attempt returns the gate to
//! `Uninitialized` and the next caller tries again.

use futures::future::{BoxFuture, FutureExt, Shared};
use log::{error, info};
use std::sync::{Arc, Mutex, MutexGuard};

use super::{
    create_pool, get_connection, init, run_migrations, run_schema_migrations, spawn_writer,
    DbConnection, DbPool, MigrationReport, WriteHandle,
};
use crate::config::StoreConfig;
use dompet_core::collections::SchemaRegistry;
use dompet_core::errors::{DatabaseError, Error, Result};

type OpenResult = std::result::Result<StoreHandle, DatabaseError>;
type OpenAttempt = Shared<BoxFuture<'static, OpenResult>>;

/// Resources of an open store.
#[derive(Clone)]
pub struct StoreHandle {
    pool: Arc<DbPool>,
    writer: WriteHandle,
    report: MigrationReport,
}

impl StoreHandle {
    pub fn pool(&self) -> &Arc<DbPool> {
        &self.pool
    }

    pub fn writer(&self) -> &WriteHandle {
        &self.writer
    }

    pub fn get_connection(&self) -> Result<DbConnection> {
        get_connection(&self.pool)
    }

    /// What the open that produced this handle did to the schema.
    pub fn report(&self) -> &MigrationReport {
        &self.report
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreState {
    Uninitialized,
    Opening,
    Ready,
}

enum ConnectionState {
    Uninitialized,
    Opening(OpenAttempt),
    Ready(StoreHandle),
}

pub struct StoreConnection {
    config: StoreConfig,
    registry: Arc<SchemaRegistry>,
    state: Mutex<ConnectionState>,
}

impl StoreConnection {
    pub fn new(config: StoreConfig) -> Self {
        Self::with_registry(config, SchemaRegistry::default())
    }

    pub fn with_registry(config: StoreConfig, registry: SchemaRegistry) -> Self {
        StoreConnection {
            config,
            registry: Arc::new(registry),
            state: Mutex::new(ConnectionState::Uninitialized),
        }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }

    pub fn state(&self) -> StoreState {
        match self.lock() {
            Ok(state) => match &*state {
                ConnectionState::Uninitialized => StoreState::Uninitialized,
                ConnectionState::Opening(_) => StoreState::Opening,
                ConnectionState::Ready(_) => StoreState::Ready,
            },
            Err(_) => StoreState::Uninitialized,
        }
    }

    /// Opens the store, or returns the handle of an already open one.
    ///
    /// Concurrent callers share one attempt and all see its outcome.
    pub async fn open(&self) -> Result<StoreHandle> {
        let attempt = {
            let mut state = self.lock()?;
            match &*state {
                ConnectionState::Ready(handle) => return Ok(handle.clone()),
                ConnectionState::Opening(attempt) => attempt.clone(),
                ConnectionState::Uninitialized => {
                    let attempt =
                        open_store(self.config.clone(), Arc::clone(&self.registry))
                            .boxed()
                            .shared();
                    *state = ConnectionState::Opening(attempt.clone());
                    attempt
                }
            }
        };

        let outcome = attempt.clone().await;

        let mut state = self.lock()?;
        // Only the attempt that is still current may settle the gate; a
        // `close()` in the meantime wins.
        if let ConnectionState::Opening(current) = &*state {
            if current.ptr_eq(&attempt) {
                *state = match &outcome {
                    Ok(handle) => ConnectionState::Ready(handle.clone()),
                    Err(_) => ConnectionState::Uninitialized,
                };
            }
        }
        outcome.map_err(Error::from)
    }

    /// The open store; every store operation starts here.
    pub async fn ensure_ready(&self) -> Result<StoreHandle> {
        self.open().await
    }

    /// Drops the open store. The writer stops once in-flight handles are gone,
    /// and the next call reopens.
    pub fn close(&self) -> Result<()> {
        let mut state = self.lock()?;
        if matches!(&*state, ConnectionState::Ready(_)) {
            info!("Closing store at {}", self.config.db_path);
        }
        *state = ConnectionState::Uninitialized;
        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, ConnectionState>> {
        self.state.lock().map_err(|_| {
            DatabaseError::Internal("store state lock was poisoned".to_string()).into()
        })
    }
}

async fn open_store(config: StoreConfig, registry: Arc<SchemaRegistry>) -> OpenResult {
    info!("Opening store at {}", config.db_path);

    let prepared = tokio::task::spawn_blocking(move || -> Result<(Arc<DbPool>, MigrationReport)> {
        init(&config.db_path)?;
        let pool = create_pool(&config)?;
        run_migrations(&pool)?;
        let report = run_schema_migrations(&pool, &registry)?;
        Ok((pool, report))
    })
    .await
    .map_err(|e| DatabaseError::ConnectionFailed(format!("open task did not finish: {}", e)))?;

    let (pool, report) = prepared.map_err(open_failure)?;
    let writer = spawn_writer((*pool).clone()).map_err(open_failure)?;

    info!(
        "Store ready at schema version {} ({} collection(s) seeded)",
        report.to_version,
        report.seeded.len()
    );
    Ok(StoreHandle {
        pool,
        writer,
        report,
    })
}

fn open_failure(err: Error) -> DatabaseError {
    error!("Failed to open store: {}", err);
    match err {
        Error::Database(DatabaseError::ConnectionFailed(msg)) => DatabaseError::ConnectionFailed(msg),
        other => DatabaseError::ConnectionFailed(other.to_string()),
    }
}
