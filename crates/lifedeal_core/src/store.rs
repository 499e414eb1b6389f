//! crates/lifedeal_core/src/store.rs
//!
//! The per-entity CRUD gateway over a `RecordBackend`.
//!
//! Stores translate wire records through the entity's schema and turn every
//! backend failure into a `StoreError` value. Response-level failures and
//! per-record batch failures are logged and sent to the notifier here, at the
//! boundary; nothing above this layer sees a raw backend error.

use chrono::Utc;
use serde_json::Value;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::{debug, error, warn};

use crate::domain::{Category, Deal, Notification, RecordId};
use crate::ports::{
    BackendError, Notifier, RecordBackend, RecordFailure, RecordOutcome, WireRecord, ID_FIELD,
};
use crate::schema::{Entity, SchemaError};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: RecordId },
    #[error("Failed to reach the record backend: {0}")]
    Fetch(String),
    #[error("Record rejected by the backend: {0}")]
    Rejected(String),
    #[error("{} record(s) in the batch failed", .failures.len())]
    PartialBatch { failures: Vec<String> },
    #[error("Malformed record: {0}")]
    Schema(#[from] SchemaError),
}

pub type StoreResult<T> = Result<T, StoreError>;

impl StoreError {
    /// Whether the store has already logged this failure and raised a toast
    /// for it. `NotFound` is left to the caller.
    pub fn is_reported(&self) -> bool {
        !matches!(self, StoreError::NotFound { .. })
    }
}

/// The CRUD gateway for one entity type.
pub struct EntityStore<E: Entity> {
    backend: Arc<dyn RecordBackend>,
    notifier: Arc<dyn Notifier>,
    _entity: PhantomData<fn() -> E>,
}

pub type DealStore = EntityStore<Deal>;
pub type CategoryStore = EntityStore<Category>;

impl<E: Entity> Clone for EntityStore<E> {
    fn clone(&self) -> Self {
        Self {
            backend: Arc::clone(&self.backend),
            notifier: Arc::clone(&self.notifier),
            _entity: PhantomData,
        }
    }
}

impl<E: Entity> EntityStore<E> {
    pub fn new(backend: Arc<dyn RecordBackend>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            backend,
            notifier,
            _entity: PhantomData,
        }
    }

    fn table(&self) -> &'static str {
        E::schema().table
    }

    /// Logs a failure and raises an error toast for it.
    fn report(&self, action: &str, err: StoreError) -> StoreError {
        error!("{} {} failed: {}", action, E::LABEL, err);
        self.notifier
            .notify(Notification::error(format!("{action} {} failed: {err}", E::LABEL)));
        err
    }

    fn backend_failure(&self, action: &str, err: BackendError) -> StoreError {
        self.report(action, StoreError::Fetch(err.to_string()))
    }

    fn decode(&self, action: &str, record: &WireRecord) -> StoreResult<E> {
        E::schema()
            .decode(record)
            .map_err(|e| self.report(action, StoreError::Schema(e)))
    }

    /// Fetches every record, reporting failures as `StoreError::Fetch`.
    ///
    /// Records that fail to decode are reported one by one and left out.
    pub async fn fetch_all(&self) -> StoreResult<Vec<E>> {
        let query = E::schema().list_query();
        let records = self
            .backend
            .fetch_records(self.table(), &query)
            .await
            .map_err(|e| self.backend_failure("Loading", e))?;

        debug!("Fetched {} {} records", records.len(), E::LABEL);
        let fetched = records.len();
        let decoded: Vec<E> = records
            .iter()
            .filter_map(|r| self.decode("Loading", r).ok())
            .collect();
        if decoded.len() < fetched {
            warn!(
                "Skipped {} malformed {} record(s)",
                fetched - decoded.len(),
                E::LABEL
            );
        }
        Ok(decoded)
    }

    /// Fetches every record; a failure has already been reported and degrades
    /// to an empty list.
    pub async fn list_all(&self) -> Vec<E> {
        self.fetch_all().await.unwrap_or_default()
    }

    pub async fn get_by_id(&self, id: RecordId) -> StoreResult<E> {
        let fields = E::schema().wire_fields();
        let record = self
            .backend
            .get_record_by_id(self.table(), id.value(), &fields)
            .await
            .map_err(|e| self.backend_failure("Loading", e))?;

        match record {
            Some(record) => self.decode("Loading", &record),
            None => Err(StoreError::NotFound {
                entity: E::LABEL,
                id,
            }),
        }
    }

    fn creation_record(&self, payload: &E::Create) -> StoreResult<WireRecord> {
        let mut domain = match serde_json::to_value(payload) {
            Ok(Value::Object(map)) => map,
            _ => {
                let err = StoreError::Schema(SchemaError::NotAnObject {
                    table: self.table(),
                });
                return Err(self.report("Creating", err));
            }
        };
        domain.extend(E::creation_defaults(Utc::now()));
        Ok(E::schema().encode_map(domain))
    }

    /// Splits batch outcomes, reporting each failed record on its own.
    fn settle(&self, action: &str, outcomes: Vec<RecordOutcome>) -> (Vec<E>, Vec<String>) {
        let mut succeeded = Vec::with_capacity(outcomes.len());
        let mut failures = Vec::new();
        for outcome in outcomes {
            match outcome {
                Ok(record) => match self.decode(action, &record) {
                    Ok(entity) => succeeded.push(entity),
                    Err(e) => failures.push(e.to_string()),
                },
                Err(failure) => {
                    warn!("{} {} record failed: {}", action, E::LABEL, failure);
                    self.notifier.notify(Notification::error(failure.to_string()));
                    failures.push(failure.to_string());
                }
            }
        }
        (succeeded, failures)
    }

    /// Creates one record. The backend assigns the id.
    pub async fn create(&self, payload: &E::Create) -> StoreResult<E> {
        let record = self.creation_record(payload)?;
        let outcomes = self
            .backend
            .create_records(self.table(), vec![record])
            .await
            .map_err(|e| self.backend_failure("Creating", e))?;

        let (mut created, failures) = self.settle("Creating", outcomes);
        match (created.pop(), failures.into_iter().next()) {
            (Some(entity), _) => Ok(entity),
            // Already reported by `settle`.
            (None, Some(failure)) => Err(StoreError::Rejected(failure)),
            (None, None) => Err(self.report(
                "Creating",
                StoreError::Rejected("backend returned no result".to_string()),
            )),
        }
    }

    /// Creates several records in one request.
    ///
    /// Failed records are reported one by one while the successful ones are
    /// still returned. Only a batch where nothing succeeded is an error.
    pub async fn create_many(&self, payloads: &[E::Create]) -> StoreResult<Vec<E>> {
        let records = payloads
            .iter()
            .map(|p| self.creation_record(p))
            .collect::<StoreResult<Vec<_>>>()?;
        let outcomes = self
            .backend
            .create_records(self.table(), records)
            .await
            .map_err(|e| self.backend_failure("Creating", e))?;

        let (created, failures) = self.settle("Creating", outcomes);
        if created.is_empty() && !failures.is_empty() {
            return Err(StoreError::PartialBatch { failures });
        }
        Ok(created)
    }

    /// Merges the supplied fields into an existing record.
    pub async fn update(&self, id: RecordId, patch: &E::Patch) -> StoreResult<E> {
        let mut record = E::schema()
            .encode(patch)
            .map_err(|e| self.report("Updating", StoreError::Schema(e)))?;
        record.insert(ID_FIELD.to_string(), Value::from(id.value()));

        let outcomes = self
            .backend
            .update_records(self.table(), vec![record])
            .await
            .map_err(|e| self.backend_failure("Updating", e))?;

        match outcomes.into_iter().next() {
            Some(Ok(record)) => self.decode("Updating", &record),
            Some(Err(RecordFailure::NotFound(_))) => Err(StoreError::NotFound {
                entity: E::LABEL,
                id,
            }),
            Some(Err(RecordFailure::Rejected(message))) => {
                Err(self.report("Updating", StoreError::Rejected(message)))
            }
            None => Err(self.report(
                "Updating",
                StoreError::Rejected("backend returned no result".to_string()),
            )),
        }
    }

    /// Removes a record. `Ok(true)` when it existed.
    pub async fn delete(&self, id: RecordId) -> StoreResult<bool> {
        let outcomes = self
            .backend
            .delete_records(self.table(), &[id.value()])
            .await
            .map_err(|e| self.backend_failure("Deleting", e))?;

        match outcomes.into_iter().next() {
            Some(Ok(_)) => Ok(true),
            Some(Err(RecordFailure::NotFound(_))) => Err(StoreError::NotFound {
                entity: E::LABEL,
                id,
            }),
            Some(Err(RecordFailure::Rejected(message))) => {
                Err(self.report("Deleting", StoreError::Rejected(message)))
            }
            None => Err(self.report(
                "Deleting",
                StoreError::Rejected("backend returned no result".to_string()),
            )),
        }
    }
}
