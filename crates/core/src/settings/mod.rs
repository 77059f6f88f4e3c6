//! Settings module - the flat key-value area beside the collections.

mod settings_model;
mod settings_service;
mod settings_traits;

pub use settings_model::{PERSONALIZATION_SETTINGS_KEY, QUICK_NOTE_KEY, SAVED_THEMES_KEY};
pub use settings_service::{SettingsService, SettingsServiceTrait};
pub use settings_traits::SettingsRepositoryTrait;
