//! Database operations for the `settings` key/value table.

use async_trait::async_trait;
use bottomline_core::{ConfigStore, SettingKey, StoreError};
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::DbError;

/// A row from the `settings` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SettingRow {
    pub key: String,
    pub value: String,
    pub updated_at: DateTime<Utc>,
}

/// Returns the stored value of `key`, or `None` if it was never set.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_setting(pool: &PgPool, key: &str) -> Result<Option<String>, DbError> {
    let value = sqlx::query_scalar::<_, String>("SELECT value FROM settings WHERE key = $1")
        .bind(key)
        .fetch_optional(pool)
        .await?;
    Ok(value)
}

/// Inserts or overwrites `key`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the upsert fails.
pub async fn set_setting(pool: &PgPool, key: &str, value: &str) -> Result<(), DbError> {
    sqlx::query(
        "INSERT INTO settings (key, value) VALUES ($1, $2) \
         ON CONFLICT (key) DO UPDATE SET value = EXCLUDED.value, updated_at = NOW()",
    )
    .bind(key)
    .bind(value)
    .execute(pool)
    .await?;
    Ok(())
}

/// Removes `key`. Returns `true` if a row was deleted.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the delete fails.
pub async fn delete_setting(pool: &PgPool, key: &str) -> Result<bool, DbError> {
    let result = sqlx::query("DELETE FROM settings WHERE key = $1")
        .bind(key)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Returns every stored setting ordered by key.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_settings(pool: &PgPool) -> Result<Vec<SettingRow>, DbError> {
    let rows = sqlx::query_as::<_, SettingRow>(
        "SELECT key, value, updated_at FROM settings ORDER BY key",
    )
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// [`ConfigStore`] backed by the `settings` table.
#[derive(Debug, Clone)]
pub struct PgConfigStore {
    pool: PgPool,
}

impl PgConfigStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ConfigStore for PgConfigStore {
    async fn get(&self, key: SettingKey) -> Result<Option<String>, StoreError> {
        Ok(get_setting(&self.pool, key.as_str()).await?)
    }

    async fn set(&self, key: SettingKey, value: &str) -> Result<(), StoreError> {
        Ok(set_setting(&self.pool, key.as_str(), value).await?)
    }
}
