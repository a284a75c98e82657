//! Database operations for `import_runs`.
//!
//! Runs are created directly in `running` status; the only legal
//! transitions are `running` → `succeeded` and `running` → `failed`.
//! Skipped runs are inserted already closed.

use async_trait::async_trait;
use bottomline_core::{RunLedger, StoreError, TriggerSource};
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

/// A row from the `import_runs` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ImportRunRow {
    pub id: i64,
    pub public_id: Uuid,
    pub trigger_source: String,
    pub status: String,
    pub pages_fetched: i32,
    pub records_merged: i64,
    pub error_message: Option<String>,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

const RUN_COLUMNS: &str = "id, public_id, trigger_source, status, pages_fetched, \
                           records_merged, error_message, started_at, completed_at, created_at";

/// Creates a new run in `running` status with `started_at = NOW()`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn create_import_run(
    pool: &PgPool,
    trigger_source: &str,
) -> Result<ImportRunRow, DbError> {
    let row = sqlx::query_as::<_, ImportRunRow>(&format!(
        "INSERT INTO import_runs (public_id, trigger_source, status) \
         VALUES ($1, $2, 'running') \
         RETURNING {RUN_COLUMNS}"
    ))
    .bind(Uuid::new_v4())
    .bind(trigger_source)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

fn run_counts(pages_fetched: u32, records_merged: u64) -> Result<(i32, i64), DbError> {
    let pages_fetched = i32::try_from(pages_fetched).map_err(|e| DbError::OutOfRange {
        field: "pages_fetched",
        reason: e.to_string(),
    })?;
    let records_merged = i64::try_from(records_merged).map_err(|e| DbError::OutOfRange {
        field: "records_merged",
        reason: e.to_string(),
    })?;
    Ok((pages_fetched, records_merged))
}

/// Marks a running run as `succeeded` with its counts.
///
/// # Errors
///
/// Returns [`DbError::InvalidRunTransition`] if the run is not `running`,
/// [`DbError::OutOfRange`] if a count does not fit its column, or
/// [`DbError::Sqlx`] if the update fails.
pub async fn complete_import_run(
    pool: &PgPool,
    id: i64,
    pages_fetched: u32,
    records_merged: u64,
) -> Result<(), DbError> {
    let (pages_fetched, records_merged) = run_counts(pages_fetched, records_merged)?;

    let result = sqlx::query(
        "UPDATE import_runs \
         SET status = 'succeeded', completed_at = NOW(), \
             pages_fetched = $1, records_merged = $2 \
         WHERE id = $3 AND status = 'running'",
    )
    .bind(pages_fetched)
    .bind(records_merged)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::InvalidRunTransition {
            id,
            expected_status: "running",
        });
    }

    Ok(())
}

/// Marks a running run as `failed` with `error_message` and the counts
/// reached before the failure.
///
/// # Errors
///
/// Returns [`DbError::InvalidRunTransition`] if the run is not `running`,
/// [`DbError::OutOfRange`] if a count does not fit its column, or
/// [`DbError::Sqlx`] if the update fails.
pub async fn fail_import_run(
    pool: &PgPool,
    id: i64,
    pages_fetched: u32,
    records_merged: u64,
    error_message: &str,
) -> Result<(), DbError> {
    let (pages_fetched, records_merged) = run_counts(pages_fetched, records_merged)?;

    let result = sqlx::query(
        "UPDATE import_runs \
         SET status = 'failed', completed_at = NOW(), error_message = $1, \
             pages_fetched = $2, records_merged = $3 \
         WHERE id = $4 AND status = 'running'",
    )
    .bind(error_message)
    .bind(pages_fetched)
    .bind(records_merged)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::InvalidRunTransition {
            id,
            expected_status: "running",
        });
    }

    Ok(())
}

/// Inserts a closed `skipped` run carrying `reason`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn record_skipped_import_run(
    pool: &PgPool,
    trigger_source: &str,
    reason: &str,
) -> Result<ImportRunRow, DbError> {
    let row = sqlx::query_as::<_, ImportRunRow>(&format!(
        "INSERT INTO import_runs \
             (public_id, trigger_source, status, error_message, completed_at) \
         VALUES ($1, $2, 'skipped', $3, NOW()) \
         RETURNING {RUN_COLUMNS}"
    ))
    .bind(Uuid::new_v4())
    .bind(trigger_source)
    .bind(reason)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Fetches a single run by its internal `id`.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no row exists with the given `id`, or
/// [`DbError::Sqlx`] if the query fails.
pub async fn get_import_run(pool: &PgPool, id: i64) -> Result<ImportRunRow, DbError> {
    sqlx::query_as::<_, ImportRunRow>(&format!(
        "SELECT {RUN_COLUMNS} FROM import_runs WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or(DbError::NotFound)
}

/// Returns the most recent `limit` runs, newest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_import_runs(pool: &PgPool, limit: i64) -> Result<Vec<ImportRunRow>, DbError> {
    let rows = sqlx::query_as::<_, ImportRunRow>(&format!(
        "SELECT {RUN_COLUMNS} FROM import_runs \
         ORDER BY created_at DESC, id DESC \
         LIMIT $1"
    ))
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// [`RunLedger`] backed by the `import_runs` table.
#[derive(Debug, Clone)]
pub struct PgRunLedger {
    pool: PgPool,
}

impl PgRunLedger {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RunLedger for PgRunLedger {
    async fn open_run(&self, source: TriggerSource) -> Result<i64, StoreError> {
        Ok(create_import_run(&self.pool, source.as_str()).await?.id)
    }

    async fn complete_run(
        &self,
        run_id: i64,
        pages_fetched: u32,
        records_merged: u64,
    ) -> Result<(), StoreError> {
        Ok(complete_import_run(&self.pool, run_id, pages_fetched, records_merged).await?)
    }

    async fn fail_run(
        &self,
        run_id: i64,
        pages_fetched: u32,
        records_merged: u64,
        error_message: &str,
    ) -> Result<(), StoreError> {
        Ok(fail_import_run(&self.pool, run_id, pages_fetched, records_merged, error_message).await?)
    }

    async fn record_skipped(&self, source: TriggerSource, reason: &str) -> Result<(), StoreError> {
        record_skipped_import_run(&self.pool, source.as_str(), reason).await?;
        Ok(())
    }
}
