//! Snapshot document: every collection of the store in one JSON object.

use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::collections::{validate_batch, validate_record, Collection, Record};
use crate::errors::{Error, Result};

/// Format tag written into exported documents.
pub const SNAPSHOT_FORMAT_VERSION: &str = "3.1";

const EXPORTED_AT_FIELD: &str = "exportedAt";
const LEGACY_EXPORT_DATE_FIELD: &str = "exportDate";
const VERSION_FIELD: &str = "version";

/// Collections a document must carry to be restorable.
pub const REQUIRED_COLLECTIONS: [Collection; 2] = [Collection::Wallets, Collection::Categories];

/// Full-store export.
///
/// `collections` holds every non-singleton collection; a collection missing
/// from a restored document is present here as an empty list.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub collections: BTreeMap<Collection, Vec<Record>>,
    pub current_gold_price: Option<Record>,
    pub exported_at: Option<String>,
    pub version: Option<String>,
}

impl Snapshot {
    pub fn records(&self, collection: Collection) -> &[Record] {
        self.collections
            .get(&collection)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// The document form:
    /// `{"wallets": [...], ..., "currentGoldPrice": {...}, "exportedAt": "...", "version": "..."}`.
    pub fn to_value(&self) -> Value {
        let mut document = Map::new();
        for collection in Collection::non_singletons() {
            let records = self
                .records(collection)
                .iter()
                .cloned()
                .map(Record::into_value)
                .collect();
            document.insert(collection.name().to_string(), Value::Array(records));
        }
        if let Some(price) = &self.current_gold_price {
            document.insert(
                Collection::CurrentGoldPrice.name().to_string(),
                price.clone().into_value(),
            );
        }
        if let Some(exported_at) = &self.exported_at {
            document.insert(
                EXPORTED_AT_FIELD.to_string(),
                Value::String(exported_at.clone()),
            );
        }
        if let Some(version) = &self.version {
            document.insert(VERSION_FIELD.to_string(), Value::String(version.clone()));
        }
        Value::Object(document)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.to_value())?)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(text)
            .map_err(|e| invalid(format!("not valid JSON: {}", e)))?;
        Self::from_value(value)
    }

    /// Parses and fully validates a document. Nothing is written by this
    /// step, so a document that fails here leaves the store untouched.
    pub fn from_value(value: Value) -> Result<Self> {
        let Value::Object(mut document) = value else {
            return Err(invalid("document must be a JSON object"));
        };

        for required in REQUIRED_COLLECTIONS {
            match document.get(required.name()) {
                Some(Value::Array(_)) => {}
                Some(_) => {
                    return Err(invalid(format!(
                        "'{}' must be an array",
                        required
                    )))
                }
                None => {
                    return Err(invalid(format!(
                        "missing required collection '{}'",
                        required
                    )))
                }
            }
        }

        let mut collections = BTreeMap::new();
        for collection in Collection::non_singletons() {
            let records = match document.remove(collection.name()) {
                None | Some(Value::Null) => Vec::new(),
                Some(Value::Array(items)) => parse_records(collection, items)?,
                Some(_) => {
                    return Err(invalid(format!(
                        "'{}' must be an array",
                        collection
                    )))
                }
            };
            collections.insert(collection, records);
        }

        let current_gold_price = match document.remove(Collection::CurrentGoldPrice.name()) {
            None | Some(Value::Null) => None,
            Some(Value::Object(map)) => Some(Record::from(map)),
            Some(_) => {
                return Err(invalid(format!(
                    "'{}' must be an object",
                    Collection::CurrentGoldPrice
                )))
            }
        };

        let exported_at = document
            .get(EXPORTED_AT_FIELD)
            .or_else(|| document.get(LEGACY_EXPORT_DATE_FIELD))
            .and_then(Value::as_str)
            .map(str::to_string);
        let version = match document.get(VERSION_FIELD) {
            Some(Value::String(v)) => Some(v.clone()),
            Some(Value::Number(n)) => Some(n.to_string()),
            _ => None,
        };

        Ok(Snapshot {
            collections,
            current_gold_price,
            exported_at,
            version,
        })
    }
}

fn invalid(detail: impl std::fmt::Display) -> Error {
    Error::InvalidFormat(format!("invalid backup file format: {}", detail))
}

fn parse_records(collection: Collection, items: Vec<Value>) -> Result<Vec<Record>> {
    let mut records = Vec::with_capacity(items.len());
    for (index, item) in items.into_iter().enumerate() {
        let Value::Object(map) = item else {
            return Err(invalid(format!(
                "'{}' entry {} is not an object",
                collection, index
            )));
        };
        let record = Record::from(map);
        validate_record(collection, &record)
            .map_err(|e| invalid(format!("'{}' entry {}: {}", collection, index, e)))?;
        records.push(record);
    }
    validate_batch(collection, &records)
        .map_err(|e| invalid(format!("'{}': {}", collection, e)))?;
    Ok(records)
}
