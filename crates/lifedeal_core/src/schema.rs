//! crates/lifedeal_core/src/schema.rs
//!
//! The bidirectional mapping between backend wire records and domain entities.
//!
//! Each entity type declares its table once as a list of field pairs. Decoding
//! renames wire fields to domain fields and lets serde validate the shape;
//! encoding goes the other way and drops anything the table does not map,
//! including identifier fields, so payload content can never overwrite an id.

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{Map, Value};

use crate::domain::{Category, CategoryPatch, Deal, DealPatch, NewCategory, NewDeal};
use crate::ports::{FetchQuery, OrderBy, SortDirection, WireRecord, ID_FIELD};

#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error("{table}: record is missing its Id field")]
    MissingId { table: &'static str },
    #[error("{table}: payload did not serialize to an object")]
    NotAnObject { table: &'static str },
    #[error("{table}: {source}")]
    Shape {
        table: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

/// One domain field and the wire field that stores it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldMapping {
    pub domain: &'static str,
    pub wire: &'static str,
}

const fn field(domain: &'static str, wire: &'static str) -> FieldMapping {
    FieldMapping { domain, wire }
}

/// The wire layout of one backend table.
#[derive(Debug)]
pub struct TableSchema {
    pub table: &'static str,
    /// The domain field the wire `Id` is exposed as.
    pub domain_id: &'static str,
    pub fields: &'static [FieldMapping],
}

pub static DEAL_SCHEMA: TableSchema = TableSchema {
    table: "deal_c",
    domain_id: "id",
    fields: &[
        field("name", "name_c"),
        field("price", "price_c"),
        field("purchaseDate", "purchase_date_c"),
        field("category", "category_c"),
        field("description", "description_c"),
        field("url", "url_c"),
        field("notes", "notes_c"),
        field("isUsed", "is_used_c"),
        field("lastAccessed", "last_accessed_c"),
        field("createdAt", "created_at_c"),
    ],
};

pub static CATEGORY_SCHEMA: TableSchema = TableSchema {
    table: "category_c",
    domain_id: "id",
    fields: &[field("name", "name_c")],
};

impl TableSchema {
    /// Wire field names, in declaration order.
    pub fn wire_fields(&self) -> Vec<String> {
        self.fields.iter().map(|f| f.wire.to_string()).collect()
    }

    /// The default query used to list a whole table: every mapped field, by id.
    pub fn list_query(&self) -> FetchQuery {
        FetchQuery {
            fields: self.wire_fields(),
            order_by: vec![OrderBy {
                field: ID_FIELD.to_string(),
                direction: SortDirection::Ascending,
            }],
            ..FetchQuery::default()
        }
    }

    /// Turns a wire record into a domain value.
    pub fn decode<T: DeserializeOwned>(&self, record: &WireRecord) -> Result<T, SchemaError> {
        let id = record
            .get(ID_FIELD)
            .filter(|v| !v.is_null())
            .ok_or(SchemaError::MissingId { table: self.table })?;

        let mut domain = Map::with_capacity(self.fields.len() + 1);
        domain.insert(self.domain_id.to_string(), id.clone());
        for mapping in self.fields {
            if let Some(value) = record.get(mapping.wire) {
                domain.insert(mapping.domain.to_string(), value.clone());
            }
        }

        serde_json::from_value(Value::Object(domain)).map_err(|source| SchemaError::Shape {
            table: self.table,
            source,
        })
    }

    /// Turns a domain payload into wire fields. The id is never carried over.
    pub fn encode<T: Serialize>(&self, payload: &T) -> Result<WireRecord, SchemaError> {
        match serde_json::to_value(payload) {
            Ok(Value::Object(domain)) => Ok(self.encode_map(domain)),
            Ok(_) => Err(SchemaError::NotAnObject { table: self.table }),
            Err(source) => Err(SchemaError::Shape {
                table: self.table,
                source,
            }),
        }
    }

    /// Renames an already serialized domain map to wire names.
    pub fn encode_map(&self, mut domain: Map<String, Value>) -> WireRecord {
        self.fields
            .iter()
            .filter_map(|mapping| {
                domain
                    .remove(mapping.domain)
                    .map(|value| (mapping.wire.to_string(), value))
            })
            .collect()
    }
}

//=========================================================================================
// Entity Trait
//=========================================================================================

/// A record type the generic entity store can manage.
pub trait Entity: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Payload accepted by `create`.
    type Create: Serialize + Send + Sync;
    /// Payload accepted by `update`.
    type Patch: Serialize + Send + Sync;

    /// Human-readable name used in log lines and error messages.
    const LABEL: &'static str;

    fn schema() -> &'static TableSchema;

    /// Domain fields stamped onto every new record, overriding the payload.
    fn creation_defaults(_now: DateTime<Utc>) -> Map<String, Value> {
        Map::new()
    }
}

impl Entity for Deal {
    type Create = NewDeal;
    type Patch = DealPatch;

    const LABEL: &'static str = "Deal";

    fn schema() -> &'static TableSchema {
        &DEAL_SCHEMA
    }

    fn creation_defaults(now: DateTime<Utc>) -> Map<String, Value> {
        let mut defaults = Map::new();
        defaults.insert("isUsed".to_string(), Value::Bool(false));
        defaults.insert("lastAccessed".to_string(), Value::Null);
        defaults.insert("createdAt".to_string(), Value::String(now.to_rfc3339()));
        defaults
    }
}

impl Entity for Category {
    type Create = NewCategory;
    type Patch = CategoryPatch;

    const LABEL: &'static str = "Category";

    fn schema() -> &'static TableSchema {
        &CATEGORY_SCHEMA
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::RecordId;
    use serde_json::json;
    use std::collections::HashSet;

    fn record(value: Value) -> WireRecord {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn mapping_tables_have_no_duplicate_names() {
        for schema in [&DEAL_SCHEMA, &CATEGORY_SCHEMA] {
            let domain: HashSet<_> = schema.fields.iter().map(|f| f.domain).collect();
            let wire: HashSet<_> = schema.fields.iter().map(|f| f.wire).collect();
            assert_eq!(domain.len(), schema.fields.len(), "{}", schema.table);
            assert_eq!(wire.len(), schema.fields.len(), "{}", schema.table);
            assert!(!wire.contains(ID_FIELD));
        }
    }

    #[test]
    fn decodes_a_wire_deal() {
        let wire = record(json!({
            "Id": 3,
            "name_c": "Notion Clone",
            "price_c": 49.99,
            "purchase_date_c": "2024-03-01",
            "category_c": "Design",
            "is_used_c": true,
            "last_accessed_c": null,
            "created_at_c": "2024-03-01T10:00:00Z",
            "Owner": "ignored"
        }));

        let deal: Deal = DEAL_SCHEMA.decode(&wire).unwrap();

        assert_eq!(deal.id, RecordId::new(3));
        assert_eq!(deal.name, "Notion Clone");
        assert!(deal.is_used);
        assert_eq!(deal.description, "");
        assert_eq!(deal.url, None);
    }

    #[test]
    fn decode_rejects_a_record_without_id() {
        let wire = record(json!({"name_c": "Design"}));
        let err = CATEGORY_SCHEMA.decode::<Category>(&wire).unwrap_err();
        assert!(matches!(err, SchemaError::MissingId { .. }));
    }

    #[test]
    fn decode_rejects_a_mistyped_field() {
        let wire = record(json!({"Id": 1, "name_c": 12}));
        let err = CATEGORY_SCHEMA.decode::<Category>(&wire).unwrap_err();
        assert!(matches!(err, SchemaError::Shape { .. }));
    }

    #[test]
    fn encode_drops_identifier_and_derived_fields() {
        let category = Category {
            id: RecordId::new(9),
            name: "Design".to_string(),
            deal_count: 4,
        };

        let wire = CATEGORY_SCHEMA.encode(&category).unwrap();

        assert_eq!(wire, record(json!({"name_c": "Design"})));
    }

    #[test]
    fn partial_patch_encodes_only_supplied_fields() {
        let patch = DealPatch {
            is_used: Some(true),
            ..DealPatch::default()
        };

        let wire = DEAL_SCHEMA.encode(&patch).unwrap();

        assert_eq!(wire, record(json!({"is_used_c": true})));
    }
}
