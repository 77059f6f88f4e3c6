//! Repository traits for settings.

use async_trait::async_trait;

use crate::errors::Result;

/// Repository trait for the flat key-value area.
///
/// Values are opaque strings. The area sits outside the collection model and
/// carries no consistency guarantees beyond single-key writes.
#[async_trait]
pub trait SettingsRepositoryTrait: Send + Sync {
    /// Get a single value by key. Returns `None` if the key is not set.
    async fn get_setting(&self, setting_key: &str) -> Result<Option<String>>;

    /// Insert or replace a single value.
    async fn set_setting(&self, setting_key: &str, setting_value: &str) -> Result<()>;

    /// Remove a key. Returns whether it was present.
    async fn remove_setting(&self, setting_key: &str) -> Result<bool>;
}
