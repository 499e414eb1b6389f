//! crates/lifedeal_core/src/local.rs
//!
//! The local-mode record backend, used when no remote backend is configured.
//!
//! Each table is kept as a JSON array of wire records under a fixed storage key.
//! Identifiers are assigned as `max(existing) + 1`, starting at 1.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::Mutex as AsyncMutex;
use tracing::{debug, info};

use crate::domain::DEFAULT_CATEGORY_NAMES;
use crate::ports::{
    BackendError, BackendResult, DeleteOutcome, FetchQuery, KeyValueStorage, PortResult,
    RecordBackend, RecordFailure, RecordOutcome, WireRecord, ID_FIELD,
};
use crate::schema::{CATEGORY_SCHEMA, DEAL_SCHEMA};

/// Storage key holding the deal table.
pub const DEALS_STORAGE_KEY: &str = "lifedeal-vault-deals";
/// Storage key holding the category table.
pub const CATEGORIES_STORAGE_KEY: &str = "lifedeal-vault-categories";

/// Wire records for the default category list, ids 1..=8.
pub fn default_category_records() -> Vec<WireRecord> {
    DEFAULT_CATEGORY_NAMES
        .iter()
        .zip(1_i64..)
        .map(|(name, id)| {
            let mut record = WireRecord::new();
            record.insert(ID_FIELD.to_string(), Value::from(id));
            record.insert("name_c".to_string(), Value::from(*name));
            record
        })
        .collect()
}

//=========================================================================================
// The Main Backend Struct
//=========================================================================================

/// A `RecordBackend` over injected key-value persistence.
pub struct LocalRecordBackend {
    storage: Arc<dyn KeyValueStorage>,
    keys: HashMap<&'static str, &'static str>,
    seeds: HashMap<&'static str, Vec<WireRecord>>,
    // Serializes read-modify-write cycles on a table.
    write_lock: AsyncMutex<()>,
}

impl LocalRecordBackend {
    /// Creates a backend serving the deal and category tables, both empty.
    pub fn new(storage: Arc<dyn KeyValueStorage>) -> Self {
        let keys = HashMap::from([
            (DEAL_SCHEMA.table, DEALS_STORAGE_KEY),
            (CATEGORY_SCHEMA.table, CATEGORIES_STORAGE_KEY),
        ]);
        Self {
            storage,
            keys,
            seeds: HashMap::new(),
            write_lock: AsyncMutex::new(()),
        }
    }

    /// Creates a backend whose category table starts with the default list.
    pub fn with_default_seeds(storage: Arc<dyn KeyValueStorage>) -> Self {
        Self::new(storage).with_seed(CATEGORY_SCHEMA.table, default_category_records())
    }

    /// Records written to `table` the first time it is read and found absent.
    pub fn with_seed(mut self, table: &'static str, records: Vec<WireRecord>) -> Self {
        self.seeds.insert(table, records);
        self
    }

    fn storage_key(&self, table: &str) -> BackendResult<&'static str> {
        self.keys
            .get(table)
            .copied()
            .ok_or_else(|| BackendError::UnknownTable(table.to_string()))
    }

    async fn load_table(&self, table: &str) -> BackendResult<Vec<WireRecord>> {
        let key = self.storage_key(table)?;
        let raw = self
            .storage
            .load(key)
            .await
            .map_err(|e| BackendError::Request(e.to_string()))?;

        match raw {
            Some(json) => serde_json::from_str(&json)
                .map_err(|e| BackendError::Request(format!("corrupt data under {key}: {e}"))),
            None => {
                let seed = self.seeds.get(table).cloned().unwrap_or_default();
                if !seed.is_empty() {
                    info!("Seeding {} with {} records", key, seed.len());
                    self.save_table(table, &seed).await?;
                }
                Ok(seed)
            }
        }
    }

    async fn save_table(&self, table: &str, records: &[WireRecord]) -> BackendResult<()> {
        let key = self.storage_key(table)?;
        let json =
            serde_json::to_string(records).map_err(|e| BackendError::Request(e.to_string()))?;
        self.storage
            .save(key, json)
            .await
            .map_err(|e| BackendError::Request(e.to_string()))
    }
}

fn record_id(record: &WireRecord) -> Option<i64> {
    record.get(ID_FIELD).and_then(Value::as_i64)
}

//=========================================================================================
// `RecordBackend` Trait Implementation
//=========================================================================================

#[async_trait]
impl RecordBackend for LocalRecordBackend {
    async fn fetch_records(
        &self,
        table: &str,
        query: &FetchQuery,
    ) -> BackendResult<Vec<WireRecord>> {
        let records = self.load_table(table).await?;
        Ok(query.apply(records))
    }

    async fn get_record_by_id(
        &self,
        table: &str,
        id: i64,
        fields: &[String],
    ) -> BackendResult<Option<WireRecord>> {
        let records = self.load_table(table).await?;
        let query = FetchQuery {
            fields: fields.to_vec(),
            ..FetchQuery::default()
        };
        let found = records.into_iter().find(|r| record_id(r) == Some(id));
        Ok(found.and_then(|r| query.apply(vec![r]).pop()))
    }

    async fn create_records(
        &self,
        table: &str,
        records: Vec<WireRecord>,
    ) -> BackendResult<Vec<RecordOutcome>> {
        let _guard = self.write_lock.lock().await;
        let mut stored = self.load_table(table).await?;
        let mut next_id = stored.iter().filter_map(record_id).max().unwrap_or(0) + 1;

        let mut outcomes = Vec::with_capacity(records.len());
        for mut record in records {
            record.insert(ID_FIELD.to_string(), Value::from(next_id));
            debug!("Creating {} record {}", table, next_id);
            next_id += 1;
            stored.push(record.clone());
            outcomes.push(Ok(record));
        }

        self.save_table(table, &stored).await?;
        Ok(outcomes)
    }

    async fn update_records(
        &self,
        table: &str,
        records: Vec<WireRecord>,
    ) -> BackendResult<Vec<RecordOutcome>> {
        let _guard = self.write_lock.lock().await;
        let mut stored = self.load_table(table).await?;

        let mut outcomes = Vec::with_capacity(records.len());
        for record in records {
            let Some(id) = record_id(&record) else {
                outcomes.push(Err(RecordFailure::Rejected(format!(
                    "update is missing its {ID_FIELD} field"
                ))));
                continue;
            };
            match stored.iter_mut().find(|r| record_id(r) == Some(id)) {
                Some(existing) => {
                    for (key, value) in record {
                        if key != ID_FIELD {
                            existing.insert(key, value);
                        }
                    }
                    outcomes.push(Ok(existing.clone()));
                }
                None => outcomes.push(Err(RecordFailure::NotFound(id))),
            }
        }

        self.save_table(table, &stored).await?;
        Ok(outcomes)
    }

    async fn delete_records(&self, table: &str, ids: &[i64]) -> BackendResult<Vec<DeleteOutcome>> {
        let _guard = self.write_lock.lock().await;
        let mut stored = self.load_table(table).await?;

        let outcomes: Vec<DeleteOutcome> = ids
            .iter()
            .map(|&id| match stored.iter().position(|r| record_id(r) == Some(id)) {
                Some(index) => {
                    stored.remove(index);
                    Ok(id)
                }
                None => Err(RecordFailure::NotFound(id)),
            })
            .collect();

        self.save_table(table, &stored).await?;
        Ok(outcomes)
    }
}

//=========================================================================================
// In-Memory Storage
//=========================================================================================

/// A `KeyValueStorage` that lives only as long as the process.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStorage for MemoryStorage {
    async fn load(&self, key: &str) -> PortResult<Option<String>> {
        let entries = self.entries.lock().unwrap_or_else(|p| p.into_inner());
        Ok(entries.get(key).cloned())
    }

    async fn save(&self, key: &str, value: String) -> PortResult<()> {
        let mut entries = self.entries.lock().unwrap_or_else(|p| p.into_inner());
        entries.insert(key.to_string(), value);
        Ok(())
    }
}
