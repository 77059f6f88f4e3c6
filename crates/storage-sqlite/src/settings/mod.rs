//! SQLite storage implementation for settings.

mod model;
mod repository;

pub use model::KvSettingDB;
pub use repository::SettingsRepository;

// Re-export trait from core for convenience
pub use dompet_core::settings::SettingsRepositoryTrait;
