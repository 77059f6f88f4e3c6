use super::settings_model::{PERSONALIZATION_SETTINGS_KEY, QUICK_NOTE_KEY, SAVED_THEMES_KEY};
use super::SettingsRepositoryTrait;
use crate::errors::Result;
use async_trait::async_trait;
use log::error;
use serde_json::Value;
use std::sync::Arc;

#[async_trait]
pub trait SettingsServiceTrait: Send + Sync {
    /// The saved personalization object, or `None` when unset or unreadable.
    async fn get_personalization_settings(&self) -> Result<Option<Value>>;

    async fn save_personalization_settings(&self, settings: &Value) -> Result<()>;

    /// Saved themes, empty when unset or unreadable.
    async fn get_saved_themes(&self) -> Result<Vec<Value>>;

    async fn save_saved_themes(&self, themes: &[Value]) -> Result<()>;

    async fn get_quick_note(&self) -> Result<String>;

    async fn save_quick_note(&self, content: &str) -> Result<()>;

    async fn clear_quick_note(&self) -> Result<()>;
}

pub struct SettingsService {
    settings_repository: Arc<dyn SettingsRepositoryTrait>,
}

impl SettingsService {
    pub fn new(settings_repository: Arc<dyn SettingsRepositoryTrait>) -> Self {
        SettingsService {
            settings_repository,
        }
    }

    async fn get_json(&self, key: &str) -> Result<Option<Value>> {
        let Some(raw) = self.settings_repository.get_setting(key).await? else {
            return Ok(None);
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                error!("Ignoring unreadable '{}' setting: {}", key, e);
                Ok(None)
            }
        }
    }
}

#[async_trait]
impl SettingsServiceTrait for SettingsService {
    async fn get_personalization_settings(&self) -> Result<Option<Value>> {
        self.get_json(PERSONALIZATION_SETTINGS_KEY).await
    }

    async fn save_personalization_settings(&self, settings: &Value) -> Result<()> {
        let raw = serde_json::to_string(settings)?;
        self.settings_repository
            .set_setting(PERSONALIZATION_SETTINGS_KEY, &raw)
            .await
    }

    async fn get_saved_themes(&self) -> Result<Vec<Value>> {
        match self.get_json(SAVED_THEMES_KEY).await? {
            Some(Value::Array(themes)) => Ok(themes),
            Some(_) => {
                error!("Ignoring '{}' setting: not a JSON array", SAVED_THEMES_KEY);
                Ok(Vec::new())
            }
            None => Ok(Vec::new()),
        }
    }

    async fn save_saved_themes(&self, themes: &[Value]) -> Result<()> {
        let raw = serde_json::to_string(themes)?;
        self.settings_repository
            .set_setting(SAVED_THEMES_KEY, &raw)
            .await
    }

    async fn get_quick_note(&self) -> Result<String> {
        Ok(self
            .settings_repository
            .get_setting(QUICK_NOTE_KEY)
            .await?
            .unwrap_or_default())
    }

    async fn save_quick_note(&self, content: &str) -> Result<()> {
        self.settings_repository
            .set_setting(QUICK_NOTE_KEY, content)
            .await
    }

    async fn clear_quick_note(&self) -> Result<()> {
        self.settings_repository
            .remove_setting(QUICK_NOTE_KEY)
            .await
            .map(|_| ())
    }
}
