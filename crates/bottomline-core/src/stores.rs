//! Collaborator seams supplied by the host: settings, product attributes,
//! run history, and job triggering.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::future::BoxFuture;
use thiserror::Error;

use crate::ratings::RatingAttribute;
use crate::schedule::Cadence;
use crate::settings::SettingKey;

/// Failure reported by a host-provided store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store backend error: {0}")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("value out of range for {field}: {reason}")]
    OutOfRange { field: &'static str, reason: String },
}

impl StoreError {
    #[must_use]
    pub fn backend<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        StoreError::Backend(Box::new(err))
    }
}

/// Failure reported by the trigger registry.
#[derive(Debug, Error)]
pub enum TriggerError {
    #[error("trigger registry error: {0}")]
    Backend(String),
}

/// Scalar key/value settings.
#[async_trait]
pub trait ConfigStore: Send + Sync {
    /// # Errors
    ///
    /// Returns [`StoreError`] if the backend cannot be read.
    async fn get(&self, key: SettingKey) -> Result<Option<String>, StoreError>;

    /// # Errors
    ///
    /// Returns [`StoreError`] if the value was not persisted.
    async fn set(&self, key: SettingKey, value: &str) -> Result<(), StoreError>;
}

/// Per-product rating attributes, last write wins.
#[async_trait]
pub trait ProductStore: Send + Sync {
    /// # Errors
    ///
    /// Returns [`StoreError`] if the attribute was not persisted.
    async fn set_attribute(
        &self,
        product_external_id: &str,
        attribute: RatingAttribute,
    ) -> Result<(), StoreError>;
}

/// Where an import run was started from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerSource {
    Schedule,
    Manual,
    Cli,
}

impl TriggerSource {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            TriggerSource::Schedule => "schedule",
            TriggerSource::Manual => "manual",
            TriggerSource::Cli => "cli",
        }
    }
}

/// History of import runs.
#[async_trait]
pub trait RunLedger: Send + Sync {
    /// Opens a run in `running` status and returns its id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the run could not be recorded.
    async fn open_run(&self, source: TriggerSource) -> Result<i64, StoreError>;

    /// # Errors
    ///
    /// Returns [`StoreError`] if the run could not be updated.
    async fn complete_run(
        &self,
        run_id: i64,
        pages_fetched: u32,
        records_merged: u64,
    ) -> Result<(), StoreError>;

    /// Closes a run as failed. The counts cover pages merged before the
    /// failure, which stay in the product store.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the run could not be updated.
    async fn fail_run(
        &self,
        run_id: i64,
        pages_fetched: u32,
        records_merged: u64,
        error_message: &str,
    ) -> Result<(), StoreError>;

    /// Records a run that never started because another was in progress.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the run could not be recorded.
    async fn record_skipped(&self, source: TriggerSource, reason: &str) -> Result<(), StoreError>;
}

/// The callback a trigger fires. Each invocation runs one import.
pub type ImportJob = Arc<dyn Fn() -> BoxFuture<'static, ()> + Send + Sync>;

/// Host job-scheduling primitive.
///
/// At most one recurring job is armed at a time; one-shot jobs are
/// independent of it.
#[async_trait]
pub trait TriggerRegistry: Send + Sync {
    /// Arms `job` to fire now and then every `cadence` period.
    ///
    /// # Errors
    ///
    /// Returns [`TriggerError`] if the job could not be registered.
    async fn schedule_recurring(&self, cadence: Cadence, job: ImportJob)
        -> Result<(), TriggerError>;

    /// Fires `job` once, as soon as possible.
    ///
    /// # Errors
    ///
    /// Returns [`TriggerError`] if the job could not be registered.
    async fn schedule_once(&self, job: ImportJob) -> Result<(), TriggerError>;

    /// Removes the recurring job, if any.
    ///
    /// # Errors
    ///
    /// Returns [`TriggerError`] if the job could not be removed.
    async fn cancel_recurring(&self) -> Result<(), TriggerError>;

    /// # Errors
    ///
    /// Returns [`TriggerError`] if the registry cannot be queried.
    async fn current_cadence(&self) -> Result<Option<Cadence>, TriggerError>;

    /// # Errors
    ///
    /// Returns [`TriggerError`] if the registry cannot be queried.
    async fn next_fire_time(&self) -> Result<Option<DateTime<Utc>>, TriggerError>;
}
