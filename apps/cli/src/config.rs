use std::path::{Path, PathBuf};

use dompet_storage_sqlite::ReadFaultPolicy;

const DEFAULT_DATA_DIR: &str = "./data";

#[derive(Debug, Clone)]
pub struct Config {
    pub data_dir: PathBuf,
    pub db_path: String,
    pub backup_dir: PathBuf,
    pub read_fault_policy: ReadFaultPolicy,
}

impl Config {
    /// Reads `DOMPET_*` variables, falling back to paths under the data dir.
    pub fn from_env() -> Self {
        let data_dir = std::env::var("DOMPET_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_DATA_DIR));
        let db_path = std::env::var("DOMPET_DB_PATH")
            .unwrap_or_else(|_| default_db_path(&data_dir));
        let backup_dir = std::env::var("DOMPET_BACKUP_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| data_dir.join("backups"));
        let read_fault_policy = match std::env::var("DOMPET_READ_FAULTS") {
            Ok(raw) => raw.parse().unwrap_or_else(|e| {
                tracing::warn!("{}; using the default", e);
                ReadFaultPolicy::default()
            }),
            Err(_) => ReadFaultPolicy::default(),
        };

        Config {
            data_dir,
            db_path,
            backup_dir,
            read_fault_policy,
        }
    }
}

fn default_db_path(data_dir: &Path) -> String {
    dompet_storage_sqlite::get_db_path(&data_dir.to_string_lossy())
}
