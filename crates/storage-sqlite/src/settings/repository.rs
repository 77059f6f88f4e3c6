use async_trait::async_trait;
use diesel::prelude::*;
use std::sync::Arc;

use super::model::KvSettingDB;
use crate::db::StoreConnection;
use crate::errors::IntoCore;
use crate::schema::kv_settings::dsl::*;
use dompet_core::errors::Result;
use dompet_core::settings::SettingsRepositoryTrait;

pub struct SettingsRepository {
    connection: Arc<StoreConnection>,
}

impl SettingsRepository {
    pub fn new(connection: Arc<StoreConnection>) -> Self {
        SettingsRepository { connection }
    }
}

#[async_trait]
impl SettingsRepositoryTrait for SettingsRepository {
    async fn get_setting(&self, setting_key_param: &str) -> Result<Option<String>> {
        let handle = self.connection.ensure_ready().await?;
        let mut conn = handle.get_connection()?;
        kv_settings
            .find(setting_key_param)
            .select(setting_value)
            .first::<String>(&mut conn)
            .optional()
            .into_core()
    }

    async fn set_setting(&self, setting_key_param: &str, setting_value_param: &str) -> Result<()> {
        let row = KvSettingDB {
            setting_key: setting_key_param.to_string(),
            setting_value: setting_value_param.to_string(),
        };
        let handle = self.connection.ensure_ready().await?;
        handle
            .writer()
            .exec(move |uow| {
                diesel::replace_into(kv_settings)
                    .values(&row)
                    .execute(uow.connection())
                    .into_core()?;
                Ok(())
            })
            .await
    }

    async fn remove_setting(&self, setting_key_param: &str) -> Result<bool> {
        let key = setting_key_param.to_string();
        let handle = self.connection.ensure_ready().await?;
        handle
            .writer()
            .exec(move |uow| {
                let removed = diesel::delete(kv_settings.find(&key))
                    .execute(uow.connection())
                    .into_core()?;
                Ok(removed > 0)
            })
            .await
    }
}
