//! Collection and record models.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use crate::errors::{DatabaseError, Error, Result, ValidationError};

/// Fixed key of the gold price singleton.
pub const CURRENT_GOLD_PRICE_ID: &str = "current";

/// Fixed key of the user profile singleton.
pub const USER_PROFILE_ID: &str = "main";

/// Named, independent set of records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Collection {
    Wallets,
    Categories,
    Transactions,
    Budgets,
    GoldWallets,
    GoldTransactions,
    CurrentGoldPrice,
    SavingsGoals,
    SavingsTransactions,
    BillReminders,
    Liabilities,
    LiabilityPayments,
    Schedules,
    UserProfile,
}

impl Collection {
    pub const ALL: [Collection; 14] = [
        Collection::Wallets,
        Collection::Categories,
        Collection::Transactions,
        Collection::Budgets,
        Collection::GoldWallets,
        Collection::GoldTransactions,
        Collection::CurrentGoldPrice,
        Collection::SavingsGoals,
        Collection::SavingsTransactions,
        Collection::BillReminders,
        Collection::Liabilities,
        Collection::LiabilityPayments,
        Collection::Schedules,
        Collection::UserProfile,
    ];

    /// Name used on disk and in snapshot documents.
    pub fn name(self) -> &'static str {
        match self {
            Collection::Wallets => "wallets",
            Collection::Categories => "categories",
            Collection::Transactions => "transactions",
            Collection::Budgets => "budgets",
            Collection::GoldWallets => "goldWallets",
            Collection::GoldTransactions => "goldTransactions",
            Collection::CurrentGoldPrice => "currentGoldPrice",
            Collection::SavingsGoals => "savingsGoals",
            Collection::SavingsTransactions => "savingsTransactions",
            Collection::BillReminders => "billReminders",
            Collection::Liabilities => "liabilities",
            Collection::LiabilityPayments => "liabilityPayments",
            Collection::Schedules => "schedules",
            Collection::UserProfile => "userProfile",
        }
    }

    /// Primary-key field of every record in the collection.
    pub fn key_field(self) -> &'static str {
        "id"
    }

    /// The fixed key for singleton collections.
    pub fn singleton_id(self) -> Option<&'static str> {
        match self {
            Collection::CurrentGoldPrice => Some(CURRENT_GOLD_PRICE_ID),
            Collection::UserProfile => Some(USER_PROFILE_ID),
            _ => None,
        }
    }

    pub fn is_singleton(self) -> bool {
        self.singleton_id().is_some()
    }

    /// Every collection that holds an arbitrary number of records.
    pub fn non_singletons() -> impl Iterator<Item = Collection> {
        Self::ALL.into_iter().filter(|c| !c.is_singleton())
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Collection {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Collection::ALL
            .into_iter()
            .find(|c| c.name() == s)
            .ok_or_else(|| ValidationError::UnknownCollection(s.to_string()).into())
    }
}

/// A stored JSON document.
///
/// Records are plain JSON objects; the store only interprets the primary-key
/// field of the collection they belong to.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(Map<String, Value>);

impl Record {
    pub fn new() -> Self {
        Record(Map::new())
    }

    /// Builds a record from a JSON value, which must be an object.
    pub fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Object(map) => Ok(Record(map)),
            other => Err(DatabaseError::InvalidRecord(format!(
                "expected a JSON object, found {}",
                json_type_name(&other)
            ))
            .into()),
        }
    }

    /// Serializes a typed model into a record.
    pub fn from_model<T: Serialize>(model: &T) -> Result<Self> {
        Self::from_value(serde_json::to_value(model)?)
    }

    /// Deserializes the record into a typed model.
    pub fn into_model<T: DeserializeOwned>(self) -> Result<T> {
        Ok(serde_json::from_value(Value::Object(self.0))?)
    }

    /// The `id` field, when it is a string.
    pub fn id(&self) -> Option<&str> {
        self.key("id")
    }

    pub fn key(&self, field: &str) -> Option<&str> {
        self.0.get(field).and_then(Value::as_str)
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(field.into(), value.into())
    }

    pub fn remove(&mut self, field: &str) -> Option<Value> {
        self.0.remove(field)
    }

    /// Builder-style `insert`.
    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(field, value);
        self
    }

    /// Shallow merge: every field of `patch` overwrites the same field here,
    /// other fields are kept. `key_field` is never overwritten.
    pub fn merge(&mut self, patch: Record, key_field: &str) {
        for (field, value) in patch.0 {
            if field == key_field {
                continue;
            }
            self.0.insert(field, value);
        }
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

impl From<Map<String, Value>> for Record {
    fn from(map: Map<String, Value>) -> Self {
        Record(map)
    }
}

impl TryFrom<Value> for Record {
    type Error = Error;

    fn try_from(value: Value) -> Result<Self> {
        Record::from_value(value)
    }
}

/// Checks that a record may be stored in `collection` and returns its key.
pub fn validate_record<'r>(collection: Collection, record: &'r Record) -> Result<&'r str> {
    let key_field = collection.key_field();
    let id = match record.get(key_field) {
        Some(Value::String(id)) if !id.is_empty() => id.as_str(),
        Some(Value::String(_)) => {
            return Err(DatabaseError::InvalidRecord(format!(
                "{}: '{}' must not be empty",
                collection, key_field
            ))
            .into())
        }
        Some(other) => {
            return Err(DatabaseError::InvalidRecord(format!(
                "{}: '{}' must be a string, found {}",
                collection,
                key_field,
                json_type_name(other)
            ))
            .into())
        }
        None => {
            return Err(DatabaseError::InvalidRecord(format!(
                "{}: missing key field '{}'",
                collection, key_field
            ))
            .into())
        }
    };

    if let Some(fixed) = collection.singleton_id() {
        if id != fixed {
            return Err(DatabaseError::InvalidRecord(format!(
                "{} only accepts the key '{}', got '{}'",
                collection, fixed, id
            ))
            .into());
        }
    }

    Ok(id)
}

/// Validates a whole replacement batch before anything is written.
pub fn validate_batch(collection: Collection, records: &[Record]) -> Result<()> {
    if collection.is_singleton() && records.len() > 1 {
        return Err(DatabaseError::InvalidRecord(format!(
            "{} holds at most one record, got {}",
            collection,
            records.len()
        ))
        .into());
    }

    let mut seen = HashSet::with_capacity(records.len());
    for record in records {
        let id = validate_record(collection, record)?;
        if !seen.insert(id) {
            return Err(DatabaseError::DuplicateKey(format!("{}/{}", collection, id)).into());
        }
    }
    Ok(())
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
