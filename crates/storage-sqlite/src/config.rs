//! Store configuration.

use std::time::Duration;

/// What a read does when the store cannot be opened or a query fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReadFaultPolicy {
    /// Log the fault and return an empty result, so the caller always has
    /// something to render.
    #[default]
    Degrade,
    /// Return the fault to the caller.
    Propagate,
}

impl std::str::FromStr for ReadFaultPolicy {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "degrade" => Ok(ReadFaultPolicy::Degrade),
            "propagate" => Ok(ReadFaultPolicy::Propagate),
            other => Err(format!(
                "unknown read fault policy '{}', expected 'degrade' or 'propagate'",
                other
            )),
        }
    }
}

#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Path of the SQLite database file.
    pub db_path: String,
    /// Connections available to reads. The writer has its own on top.
    pub pool_size: u32,
    pub busy_timeout: Duration,
    pub read_fault_policy: ReadFaultPolicy,
}

impl StoreConfig {
    pub fn new(db_path: impl Into<String>) -> Self {
        StoreConfig {
            db_path: db_path.into(),
            ..Default::default()
        }
    }

    pub fn with_pool_size(mut self, pool_size: u32) -> Self {
        self.pool_size = pool_size;
        self
    }

    pub fn with_busy_timeout(mut self, busy_timeout: Duration) -> Self {
        self.busy_timeout = busy_timeout;
        self
    }

    pub fn with_read_fault_policy(mut self, policy: ReadFaultPolicy) -> Self {
        self.read_fault_policy = policy;
        self
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig {
            db_path: "dompet.db".to_string(),
            pool_size: 8,
            busy_timeout: Duration::from_secs(30),
            read_fault_policy: ReadFaultPolicy::Degrade,
        }
    }
}
