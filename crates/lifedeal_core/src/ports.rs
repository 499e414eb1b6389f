//! crates/lifedeal_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of specific external implementations like the record
//! backend, persistence, toast presentation or the description LLM.

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::cmp::Ordering;

use crate::domain::Notification;

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for the auxiliary ports (storage, description generation).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Service unavailable: {0}")]
    Unavailable(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Record Backend Types
//=========================================================================================

/// The wire field every backend record carries its primary key under.
pub const ID_FIELD: &str = "Id";

/// A raw backend record, keyed by wire-schema field names.
pub type WireRecord = Map<String, Value>;

/// A response-level failure: the whole request did not go through.
#[derive(Debug, Clone, thiserror::Error)]
pub enum BackendError {
    #[error("Record backend request failed: {0}")]
    Request(String),
    #[error("Unknown table: {0}")]
    UnknownTable(String),
}

pub type BackendResult<T> = Result<T, BackendError>;

/// A per-record failure inside an otherwise successful batch request.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RecordFailure {
    #[error("Record {0} not found")]
    NotFound(i64),
    #[error("{0}")]
    Rejected(String),
}

/// The outcome of creating or updating one record in a batch.
pub type RecordOutcome = Result<WireRecord, RecordFailure>;

/// The outcome of deleting one record in a batch; carries the removed id.
pub type DeleteOutcome = Result<i64, RecordFailure>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    pub field: String,
    pub direction: SortDirection,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Paging {
    /// `None` returns every remaining record.
    pub limit: Option<usize>,
    pub offset: usize,
}

/// The query shape accepted by `RecordBackend::fetch_records`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FetchQuery {
    /// Wire fields to return. Empty means all fields.
    pub fields: Vec<String>,
    pub order_by: Vec<OrderBy>,
    pub paging: Paging,
}

impl FetchQuery {
    /// Applies projection, ordering and paging to an already loaded table.
    ///
    /// Backends that cannot push these down into their storage engine run
    /// their full table through this instead.
    pub fn apply(&self, mut records: Vec<WireRecord>) -> Vec<WireRecord> {
        if !self.order_by.is_empty() {
            records.sort_by(|a, b| {
                self.order_by
                    .iter()
                    .map(|order| {
                        let ordering = compare_values(a.get(&order.field), b.get(&order.field));
                        match order.direction {
                            SortDirection::Ascending => ordering,
                            SortDirection::Descending => ordering.reverse(),
                        }
                    })
                    .find(|ordering| ordering.is_ne())
                    .unwrap_or(Ordering::Equal)
            });
        }

        let page = records.into_iter().skip(self.paging.offset);
        let page: Vec<WireRecord> = match self.paging.limit {
            Some(limit) => page.take(limit).collect(),
            None => page.collect(),
        };

        if self.fields.is_empty() {
            return page;
        }
        page.into_iter()
            .map(|record| {
                record
                    .into_iter()
                    .filter(|(key, _)| key == ID_FIELD || self.fields.iter().any(|f| f == key))
                    .collect()
            })
            .collect()
    }
}

/// Orders JSON scalars: missing/null first, then numbers, then strings.
fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    fn rank(value: Option<&Value>) -> u8 {
        match value {
            None | Some(Value::Null) => 0,
            Some(Value::Bool(_)) => 1,
            Some(Value::Number(_)) => 2,
            Some(Value::String(_)) => 3,
            Some(_) => 4,
        }
    }

    match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            let (x, y) = (x.as_f64().unwrap_or(0.0), y.as_f64().unwrap_or(0.0));
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        _ => rank(a).cmp(&rank(b)),
    }
}

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

/// The remote record-storage collaborator, one logical table per entity type.
///
/// Every response is a tagged result: `Err` is a response-level failure, and
/// the batch operations report each record's own outcome.
#[async_trait]
pub trait RecordBackend: Send + Sync {
    async fn fetch_records(&self, table: &str, query: &FetchQuery)
        -> BackendResult<Vec<WireRecord>>;

    async fn get_record_by_id(
        &self,
        table: &str,
        id: i64,
        fields: &[String],
    ) -> BackendResult<Option<WireRecord>>;

    async fn create_records(
        &self,
        table: &str,
        records: Vec<WireRecord>,
    ) -> BackendResult<Vec<RecordOutcome>>;

    /// Merges each record's fields into the stored record named by its `Id`.
    async fn update_records(
        &self,
        table: &str,
        records: Vec<WireRecord>,
    ) -> BackendResult<Vec<RecordOutcome>>;

    async fn delete_records(&self, table: &str, ids: &[i64]) -> BackendResult<Vec<DeleteOutcome>>;
}

/// String-keyed persistence used by the local-mode backend.
#[async_trait]
pub trait KeyValueStorage: Send + Sync {
    async fn load(&self, key: &str) -> PortResult<Option<String>>;

    /// Must not return before the value is durable.
    async fn save(&self, key: &str, value: String) -> PortResult<()>;
}

/// Toast presentation. Never awaited and never fails.
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);
}

#[async_trait]
pub trait DescriptionGenerationService: Send + Sync {
    /// Writes a short marketing-style description for a deal name.
    async fn generate_description(&self, deal_name: &str) -> PortResult<String>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> WireRecord {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn apply_sorts_pages_and_projects() {
        let records = vec![
            record(json!({"Id": 1, "name_c": "b", "price_c": 3})),
            record(json!({"Id": 2, "name_c": "a", "price_c": 1})),
            record(json!({"Id": 3, "name_c": "c", "price_c": 2})),
        ];
        let query = FetchQuery {
            fields: vec!["name_c".to_string()],
            order_by: vec![OrderBy {
                field: "price_c".to_string(),
                direction: SortDirection::Descending,
            }],
            paging: Paging {
                limit: Some(2),
                offset: 0,
            },
        };

        let page = query.apply(records);

        assert_eq!(page.len(), 2);
        assert_eq!(page[0], record(json!({"Id": 1, "name_c": "b"})));
        assert_eq!(page[1], record(json!({"Id": 3, "name_c": "c"})));
    }

    #[test]
    fn missing_values_sort_first() {
        let records = vec![
            record(json!({"Id": 1, "name_c": "z"})),
            record(json!({"Id": 2})),
        ];
        let query = FetchQuery {
            order_by: vec![OrderBy {
                field: "name_c".to_string(),
                direction: SortDirection::Ascending,
            }],
            ..FetchQuery::default()
        };

        let sorted = query.apply(records);
        assert_eq!(sorted[0]["Id"], json!(2));
    }
}
