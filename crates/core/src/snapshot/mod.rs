//! Snapshot module - whole-store export, backup, restore and reset.

mod snapshot_model;
mod snapshot_service;

pub use snapshot_model::{Snapshot, REQUIRED_COLLECTIONS, SNAPSHOT_FORMAT_VERSION};
pub use snapshot_service::{backup_file_name, SnapshotService, SnapshotServiceTrait};
