//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the `RecordBackend` port from the `core` crate. It handles all interactions
//! with the PostgreSQL database using `sqlx`.
//!
//! Every logical table lives in the single `records` table, keyed by
//! `table_name`. The wire record (minus its `Id`) is stored as JSONB.

use async_trait::async_trait;
use lifedeal_core::ports::{
    BackendError, BackendResult, DeleteOutcome, FetchQuery, RecordBackend, RecordFailure,
    RecordOutcome, WireRecord, ID_FIELD,
};
use lifedeal_core::schema::{CATEGORY_SCHEMA, DEAL_SCHEMA};
use serde_json::Value;
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};
use tracing::{debug, info};

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the `RecordBackend` port.
#[derive(Clone)]
pub struct PgRecordBackend {
    pool: PgPool,
}

impl PgRecordBackend {
    /// Creates a new `PgRecordBackend`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await
    }

    /// Inserts `records` into `table` if it holds no rows yet.
    pub async fn seed_if_empty(
        &self,
        table: &str,
        records: Vec<WireRecord>,
    ) -> Result<u64, sqlx::Error> {
        let (existing,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM records WHERE table_name = $1")
                .bind(table)
                .fetch_one(&self.pool)
                .await?;
        if existing > 0 {
            return Ok(0);
        }

        let mut tx = self.pool.begin().await?;
        let mut inserted = 0;
        for record in records {
            sqlx::query("INSERT INTO records (table_name, data) VALUES ($1, $2)")
                .bind(table)
                .bind(Json(without_id(record)))
                .execute(&mut *tx)
                .await?;
            inserted += 1;
        }
        tx.commit().await?;

        info!("Seeded {} records into {}", inserted, table);
        Ok(inserted)
    }

    fn check_table(table: &str) -> BackendResult<()> {
        if table == DEAL_SCHEMA.table || table == CATEGORY_SCHEMA.table {
            Ok(())
        } else {
            Err(BackendError::UnknownTable(table.to_string()))
        }
    }
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct RecordRow {
    id: i64,
    data: Json<WireRecord>,
}

impl RecordRow {
    fn to_wire(self) -> WireRecord {
        let mut record = self.data.0;
        record.insert(ID_FIELD.to_string(), Value::from(self.id));
        record
    }
}

fn without_id(mut record: WireRecord) -> WireRecord {
    record.remove(ID_FIELD);
    record
}

/// Statement-level database errors reject one record; anything else (pool,
/// I/O, protocol) means the whole request failed.
fn classify(err: sqlx::Error) -> BackendResult<RecordFailure> {
    match err {
        sqlx::Error::Database(db_err) => Ok(RecordFailure::Rejected(db_err.to_string())),
        other => Err(request_failed(other)),
    }
}

fn request_failed(err: sqlx::Error) -> BackendError {
    BackendError::Request(err.to_string())
}

//=========================================================================================
// `RecordBackend` Trait Implementation
//=========================================================================================

#[async_trait]
impl RecordBackend for PgRecordBackend {
    async fn fetch_records(
        &self,
        table: &str,
        query: &FetchQuery,
    ) -> BackendResult<Vec<WireRecord>> {
        Self::check_table(table)?;
        let rows = sqlx::query_as::<_, RecordRow>(
            "SELECT id, data FROM records WHERE table_name = $1 ORDER BY id ASC",
        )
        .bind(table)
        .fetch_all(&self.pool)
        .await
        .map_err(request_failed)?;

        debug!("Loaded {} rows from {}", rows.len(), table);
        Ok(query.apply(rows.into_iter().map(RecordRow::to_wire).collect()))
    }

    async fn get_record_by_id(
        &self,
        table: &str,
        id: i64,
        fields: &[String],
    ) -> BackendResult<Option<WireRecord>> {
        Self::check_table(table)?;
        let row = sqlx::query_as::<_, RecordRow>(
            "SELECT id, data FROM records WHERE table_name = $1 AND id = $2",
        )
        .bind(table)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(request_failed)?;

        let projection = FetchQuery {
            fields: fields.to_vec(),
            ..FetchQuery::default()
        };
        Ok(row.and_then(|row| projection.apply(vec![row.to_wire()]).pop()))
    }

    async fn create_records(
        &self,
        table: &str,
        records: Vec<WireRecord>,
    ) -> BackendResult<Vec<RecordOutcome>> {
        Self::check_table(table)?;
        let mut outcomes = Vec::with_capacity(records.len());
        for record in records {
            let inserted = sqlx::query_as::<_, RecordRow>(
                "INSERT INTO records (table_name, data) VALUES ($1, $2) RETURNING id, data",
            )
            .bind(table)
            .bind(Json(without_id(record)))
            .fetch_one(&self.pool)
            .await;

            outcomes.push(match inserted {
                Ok(row) => Ok(row.to_wire()),
                Err(e) => Err(classify(e)?),
            });
        }
        Ok(outcomes)
    }

    async fn update_records(
        &self,
        table: &str,
        records: Vec<WireRecord>,
    ) -> BackendResult<Vec<RecordOutcome>> {
        Self::check_table(table)?;
        let mut outcomes = Vec::with_capacity(records.len());
        for record in records {
            let Some(id) = record.get(ID_FIELD).and_then(Value::as_i64) else {
                outcomes.push(Err(RecordFailure::Rejected(
                    "update record carries no Id".to_string(),
                )));
                continue;
            };

            // `||` merges top-level keys, so only the supplied fields change.
            let updated = sqlx::query_as::<_, RecordRow>(
                "UPDATE records SET data = data || $3 \
                 WHERE table_name = $1 AND id = $2 RETURNING id, data",
            )
            .bind(table)
            .bind(id)
            .bind(Json(without_id(record)))
            .fetch_optional(&self.pool)
            .await;

            outcomes.push(match updated {
                Ok(Some(row)) => Ok(row.to_wire()),
                Ok(None) => Err(RecordFailure::NotFound(id)),
                Err(e) => Err(classify(e)?),
            });
        }
        Ok(outcomes)
    }

    async fn delete_records(&self, table: &str, ids: &[i64]) -> BackendResult<Vec<DeleteOutcome>> {
        Self::check_table(table)?;
        let mut outcomes = Vec::with_capacity(ids.len());
        for &id in ids {
            let deleted: Result<Option<(i64,)>, sqlx::Error> = sqlx::query_as(
                "DELETE FROM records WHERE table_name = $1 AND id = $2 RETURNING id",
            )
            .bind(table)
            .bind(id)
            .fetch_optional(&self.pool)
            .await;

            outcomes.push(match deleted {
                Ok(Some((id,))) => Ok(id),
                Ok(None) => Err(RecordFailure::NotFound(id)),
                Err(e) => Err(classify(e)?),
            });
        }
        Ok(outcomes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn rows_carry_their_key_as_id() {
        let data = json!({"name_c": "Design", "Id": 999}).as_object().cloned().unwrap();
        let row = RecordRow {
            id: 4,
            data: Json(without_id(data)),
        };

        let wire = row.to_wire();

        assert_eq!(wire.get(ID_FIELD), Some(&json!(4)));
        assert_eq!(wire.get("name_c"), Some(&json!("Design")));
    }

    #[test]
    fn only_the_two_tables_are_served() {
        assert!(PgRecordBackend::check_table("deal_c").is_ok());
        assert!(PgRecordBackend::check_table("category_c").is_ok());
        assert!(matches!(
            PgRecordBackend::check_table("users"),
            Err(BackendError::UnknownTable(_))
        ));
    }

    #[test]
    fn connection_errors_fail_the_whole_request() {
        assert!(matches!(
            classify(sqlx::Error::PoolTimedOut),
            Err(BackendError::Request(_))
        ));
    }
}
