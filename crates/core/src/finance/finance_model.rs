//! Finance domain models.
//!
//! Every model keeps fields it does not know about in `extra`, so a record
//! written by a newer client survives a read/save cycle unchanged.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::collections::{CURRENT_GOLD_PRICE_ID, USER_PROFILE_ID};

pub const KIND_INCOME: &str = "income";
pub const KIND_EXPENSE: &str = "expense";

pub const SCHEDULE_STATUS_PENDING: &str = "pending";

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Wallet {
    pub id: String,
    #[serde(default, deserialize_with = "lenient_format::text")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient_format::number")]
    pub balance: f64,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient_format::opt_text"
    )]
    pub emoji: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: String,
    #[serde(default, deserialize_with = "lenient_format::text")]
    pub name: String,
    /// `income` or `expense`.
    #[serde(rename = "type", default, deserialize_with = "lenient_format::text")]
    pub kind: String,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient_format::opt_text"
    )]
    pub emoji: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: String,
    #[serde(rename = "type", default, deserialize_with = "lenient_format::text")]
    pub kind: String,
    #[serde(default, deserialize_with = "lenient_format::number")]
    pub amount: f64,
    #[serde(default, deserialize_with = "lenient_format::text")]
    pub wallet_id: String,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient_format::opt_text"
    )]
    pub category_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_format::text")]
    pub date: String,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient_format::opt_text"
    )]
    pub notes: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Budget {
    pub id: String,
    #[serde(default, deserialize_with = "lenient_format::text")]
    pub category_id: String,
    #[serde(default, deserialize_with = "lenient_format::number")]
    pub amount: f64,
    #[serde(default, deserialize_with = "lenient_format::text")]
    pub period: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GoldWallet {
    pub id: String,
    #[serde(default, deserialize_with = "lenient_format::text")]
    pub name: String,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient_format::opt_text"
    )]
    pub emoji: Option<String>,
    /// Grams held.
    #[serde(default, deserialize_with = "lenient_format::number")]
    pub weight: f64,
    #[serde(default, deserialize_with = "lenient_format::number")]
    pub avg_buy_price: f64,
    #[serde(default, deserialize_with = "lenient_format::number")]
    pub total_investment: f64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GoldTransaction {
    pub id: String,
    /// `initial`, `buy` or `sell`.
    #[serde(rename = "type", default, deserialize_with = "lenient_format::text")]
    pub kind: String,
    #[serde(default, deserialize_with = "lenient_format::number")]
    pub weight: f64,
    #[serde(default, deserialize_with = "lenient_format::number")]
    pub price_per_gram: f64,
    #[serde(default, deserialize_with = "lenient_format::number")]
    pub total_amount: f64,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient_format::opt_text"
    )]
    pub wallet_id: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient_format::opt_text"
    )]
    pub gold_wallet_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_format::text")]
    pub date: String,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient_format::opt_text"
    )]
    pub notes: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// The gold price singleton, stored at id `current`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GoldPrice {
    #[serde(default = "current_gold_price_id")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient_format::number")]
    pub buy: f64,
    #[serde(default, deserialize_with = "lenient_format::number")]
    pub sell: f64,
    #[serde(default, deserialize_with = "lenient_format::text")]
    pub source: String,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient_format::opt_text"
    )]
    pub last_update: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl GoldPrice {
    pub fn new(buy: f64, sell: f64, source: impl Into<String>) -> Self {
        GoldPrice {
            id: CURRENT_GOLD_PRICE_ID.to_string(),
            buy,
            sell,
            source: source.into(),
            last_update: None,
            extra: Map::new(),
        }
    }

    /// Returned when no price has been stored.
    pub fn fallback() -> Self {
        GoldPrice::new(1_200_000.0, 1_150_000.0, "Default")
    }

    /// Written by a restore whose document carries no price.
    pub fn restored() -> Self {
        GoldPrice::new(1_000_000.0, 980_000.0, "Restored")
    }

    /// Written by a full reset.
    pub fn reset() -> Self {
        GoldPrice::new(1_000_000.0, 980_000.0, "Reset")
    }
}

fn current_gold_price_id() -> String {
    CURRENT_GOLD_PRICE_ID.to_string()
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SavingsGoal {
    pub id: String,
    #[serde(default, deserialize_with = "lenient_format::text")]
    pub name: String,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient_format::opt_text"
    )]
    pub emoji: Option<String>,
    #[serde(default, deserialize_with = "lenient_format::number")]
    pub target_amount: f64,
    #[serde(default, deserialize_with = "lenient_format::number")]
    pub current_amount: f64,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient_format::opt_text"
    )]
    pub target_date: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient_format::opt_text"
    )]
    pub wallet_id: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SavingsTransaction {
    pub id: String,
    #[serde(default, deserialize_with = "lenient_format::text")]
    pub goal_id: String,
    #[serde(default, deserialize_with = "lenient_format::number")]
    pub amount: f64,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient_format::opt_text"
    )]
    pub wallet_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_format::text")]
    pub date: String,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient_format::opt_text"
    )]
    pub notes: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BillReminder {
    pub id: String,
    #[serde(default, deserialize_with = "lenient_format::text")]
    pub name: String,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient_format::opt_text"
    )]
    pub emoji: Option<String>,
    #[serde(default, deserialize_with = "lenient_format::number")]
    pub amount: f64,
    #[serde(default, deserialize_with = "lenient_format::text")]
    pub due_date: String,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient_format::opt_text"
    )]
    pub category: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient_format::opt_text"
    )]
    pub notes: Option<String>,
    #[serde(default, deserialize_with = "lenient_format::flag")]
    pub paid: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Liability {
    pub id: String,
    #[serde(default, deserialize_with = "lenient_format::text")]
    pub name: String,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient_format::opt_text"
    )]
    pub emoji: Option<String>,
    #[serde(default, deserialize_with = "lenient_format::number")]
    pub amount: f64,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient_format::opt_text"
    )]
    pub due_date: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient_format::opt_text"
    )]
    pub creditor: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient_format::opt_text"
    )]
    pub notes: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LiabilityPayment {
    pub id: String,
    #[serde(default, deserialize_with = "lenient_format::text")]
    pub liability_id: String,
    #[serde(default, deserialize_with = "lenient_format::number")]
    pub amount: f64,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient_format::opt_text"
    )]
    pub wallet_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_format::text")]
    pub date: String,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient_format::opt_text"
    )]
    pub notes: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A calendar entry.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Schedule {
    pub id: String,
    #[serde(default, deserialize_with = "lenient_format::text")]
    pub title: String,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient_format::opt_text"
    )]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "lenient_format::text")]
    pub date: String,
    #[serde(
        rename = "type",
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient_format::opt_text"
    )]
    pub kind: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient_format::opt_text"
    )]
    pub start_time: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient_format::opt_text"
    )]
    pub end_time: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient_format::opt_text"
    )]
    pub category_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_format::flag")]
    pub is_recurring: bool,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient_format::opt_text"
    )]
    pub status: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient_format::opt_text"
    )]
    pub created_at: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Input model for creating a schedule; the store assigns `id` and `createdAt`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewSchedule {
    pub title: String,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient_format::opt_text"
    )]
    pub description: Option<String>,
    pub date: String,
    #[serde(
        rename = "type",
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient_format::opt_text"
    )]
    pub kind: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient_format::opt_text"
    )]
    pub start_time: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient_format::opt_text"
    )]
    pub end_time: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient_format::opt_text"
    )]
    pub category_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_format::flag")]
    pub is_recurring: bool,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient_format::opt_text"
    )]
    pub status: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl NewSchedule {
    pub fn into_schedule(self, id: String, created_at: String) -> Schedule {
        Schedule {
            id,
            title: self.title,
            description: self.description,
            date: self.date,
            kind: self.kind,
            start_time: self.start_time,
            end_time: self.end_time,
            category_id: self.category_id,
            is_recurring: self.is_recurring,
            status: self.status,
            created_at: Some(created_at),
            extra: self.extra,
        }
    }
}

/// The user profile singleton, stored at id `main`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    #[serde(default = "user_profile_id")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient_format::text")]
    pub name: String,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient_format::opt_text"
    )]
    pub created_at: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for UserProfile {
    fn default() -> Self {
        UserProfile {
            id: user_profile_id(),
            name: String::new(),
            created_at: None,
            extra: Map::new(),
        }
    }
}

fn user_profile_id() -> String {
    USER_PROFILE_ID.to_string()
}

// Records reach the store from restores and older clients, so a field may be
// null or carry a number where text is expected. Nulls read as the field's
// empty value and scalars are converted; anything else is an error, never a
// silently dropped record.
mod lenient_format {
    use serde::de::Error;
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    pub fn number<'de, D>(deserializer: D) -> Result<f64, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Value::deserialize(deserializer)? {
            Value::Null => Ok(0.0),
            Value::Number(n) => n
                .as_f64()
                .ok_or_else(|| D::Error::custom(format!("number out of range: {}", n))),
            Value::String(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    return Ok(0.0);
                }
                trimmed
                    .parse::<f64>()
                    .map_err(|_| D::Error::custom(format!("not a number: '{}'", s)))
            }
            other => Err(D::Error::custom(format!("not a number: {}", other))),
        }
    }

    pub fn text<'de, D>(deserializer: D) -> Result<String, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(opt_text(deserializer)?.unwrap_or_default())
    }

    pub fn opt_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Value::deserialize(deserializer)? {
            Value::Null => Ok(None),
            Value::String(s) => Ok(Some(s)),
            Value::Number(n) => Ok(Some(n.to_string())),
            Value::Bool(b) => Ok(Some(b.to_string())),
            other => Err(D::Error::custom(format!("not text: {}", other))),
        }
    }

    pub fn flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Value::deserialize(deserializer)? {
            Value::Null => Ok(false),
            Value::Bool(b) => Ok(b),
            Value::Number(n) => Ok(n.as_f64().map_or(false, |v| v != 0.0)),
            Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "1" => Ok(true),
                "false" | "0" | "" => Ok(false),
                _ => Err(D::Error::custom(format!("not a flag: '{}'", s))),
            },
            other => Err(D::Error::custom(format!("not a flag: {}", other))),
        }
    }
}
