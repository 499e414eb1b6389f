//! crates/lifedeal_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs know nothing about the record backend's field names; the
//! translation lives in `schema.rs`.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Category names seeded into an empty store.
pub const DEFAULT_CATEGORY_NAMES: [&str; 8] = [
    "Productivity",
    "Design",
    "Marketing",
    "Development",
    "Business",
    "Analytics",
    "Communication",
    "Other",
];

//=========================================================================================
// Identifiers
//=========================================================================================

/// A store-assigned record identifier.
///
/// Backed by the numeric primary key, but always rendered as its string form
/// when serialized so clients never do arithmetic on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordId(i64);

impl RecordId {
    pub const fn new(value: i64) -> Self {
        Self(value)
    }

    pub const fn value(self) -> i64 {
        self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for RecordId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse::<i64>().map(Self)
    }
}

impl Serialize for RecordId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for RecordId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        // Backends hand out numbers, clients echo back strings.
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(i64),
            Text(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Number(n) => Ok(Self(n)),
            Raw::Text(s) => s.parse().map_err(serde::de::Error::custom),
        }
    }
}

//=========================================================================================
// Entities
//=========================================================================================

/// A purchased lifetime deal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Deal {
    pub id: RecordId,
    pub name: String,
    pub price: f64,
    pub purchase_date: NaiveDate,
    pub category: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub is_used: bool,
    #[serde(default)]
    pub last_accessed: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// A named bucket deals are filed under.
///
/// `deal_count` is a read-time projection over the current deal set and is
/// never written back to the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: RecordId,
    pub name: String,
    #[serde(default)]
    pub deal_count: usize,
}

//=========================================================================================
// Payloads
//=========================================================================================

/// A validated deal ready to be created. Produced by `DealForm::validate`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewDeal {
    pub name: String,
    pub price: f64,
    pub purchase_date: NaiveDate,
    pub category: String,
    pub description: String,
    pub url: Option<String>,
    pub notes: String,
}

/// A partial deal update. Only the fields that are `Some` are sent.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DealPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub purchase_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// `Some(None)` clears the stored URL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_used: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_accessed: Option<DateTime<Utc>>,
}

impl From<NewDeal> for DealPatch {
    fn from(deal: NewDeal) -> Self {
        Self {
            name: Some(deal.name),
            price: Some(deal.price),
            purchase_date: Some(deal.purchase_date),
            category: Some(deal.category),
            description: Some(deal.description),
            url: Some(deal.url),
            notes: Some(deal.notes),
            is_used: None,
            last_accessed: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewCategory {
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CategoryPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

//=========================================================================================
// Notifications
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationLevel {
    Success,
    Error,
}

/// A fire-and-forget toast message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
}

impl Notification {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Error,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_id_serializes_as_string_and_reads_either_form() {
        let id = RecordId::new(42);
        assert_eq!(serde_json::to_value(id).unwrap(), serde_json::json!("42"));

        let from_number: RecordId = serde_json::from_value(serde_json::json!(7)).unwrap();
        let from_text: RecordId = serde_json::from_value(serde_json::json!("7")).unwrap();
        assert_eq!(from_number, from_text);
    }

    #[test]
    fn patch_from_new_deal_clears_missing_url() {
        let patch = DealPatch::from(NewDeal {
            name: "Tool".to_string(),
            price: 10.0,
            purchase_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            category: "Design".to_string(),
            description: String::new(),
            url: None,
            notes: String::new(),
        });

        let json = serde_json::to_value(&patch).unwrap();
        assert_eq!(json.get("url"), Some(&serde_json::Value::Null));
        assert!(json.get("isUsed").is_none());
        assert!(json.get("lastAccessed").is_none());
    }
}
