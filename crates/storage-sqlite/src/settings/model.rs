//! Database model for the key-value settings area.

use diesel::prelude::*;
use serde::{Deserialize, Serialize};

/// One key-value pair. The value is opaque to the store.
#[derive(Queryable, Insertable, Serialize, Deserialize, Debug, Clone)]
#[diesel(table_name = crate::schema::kv_settings)]
#[serde(rename_all = "camelCase")]
pub struct KvSettingDB {
    pub setting_key: String,
    pub setting_value: String,
}
