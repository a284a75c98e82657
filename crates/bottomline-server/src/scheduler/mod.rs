//! Background job scheduler.
//!
//! [`CronTriggerRegistry`] implements the import trigger registry on a
//! [`JobScheduler`]. A periodic reconcile job keeps the recurring import in
//! line with stored settings between admin requests.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bottomline_core::{Cadence, ImportJob, TriggerError, TriggerRegistry};
use bottomline_import::ScheduleReconciler;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};
use uuid::Uuid;

#[derive(Debug, Clone, Copy)]
struct Recurring {
    cadence: Cadence,
    job_id: Uuid,
}

/// Trigger registry over a running [`JobScheduler`].
///
/// Holds at most one recurring import job. One-shot jobs are added to the
/// same scheduler but are not tracked.
pub struct CronTriggerRegistry {
    scheduler: JobScheduler,
    recurring: Mutex<Option<Recurring>>,
}

impl CronTriggerRegistry {
    #[must_use]
    pub fn new(scheduler: JobScheduler) -> Self {
        Self {
            scheduler,
            recurring: Mutex::new(None),
        }
    }

    async fn add_one_shot(&self, job: ImportJob, label: &'static str) -> Result<Uuid, TriggerError> {
        let one_shot = Job::new_one_shot_async(Duration::ZERO, move |_uuid, _lock| {
            let job = Arc::clone(&job);
            Box::pin(async move {
                tracing::info!(label, "scheduler: starting import");
                job().await;
                tracing::info!(label, "scheduler: import finished");
            })
        })
        .map_err(backend)?;
        self.scheduler.add(one_shot).await.map_err(backend)
    }
}

fn backend(err: JobSchedulerError) -> TriggerError {
    TriggerError::Backend(err.to_string())
}

#[async_trait]
impl TriggerRegistry for CronTriggerRegistry {
    async fn schedule_recurring(
        &self,
        cadence: Cadence,
        job: ImportJob,
    ) -> Result<(), TriggerError> {
        let mut recurring = self.recurring.lock().await;
        if let Some(previous) = recurring.take() {
            self.scheduler
                .remove(&previous.job_id)
                .await
                .map_err(backend)?;
        }

        let repeated = {
            let job = Arc::clone(&job);
            Job::new_repeated_async(cadence.period(), move |_uuid, _lock| {
                let job = Arc::clone(&job);
                Box::pin(async move {
                    tracing::info!(%cadence, "scheduler: starting recurring import");
                    job().await;
                    tracing::info!(%cadence, "scheduler: recurring import finished");
                })
            })
            .map_err(backend)?
        };
        let job_id = self.scheduler.add(repeated).await.map_err(backend)?;
        *recurring = Some(Recurring { cadence, job_id });
        drop(recurring);

        // Interval jobs first fire one period after registration.
        self.add_one_shot(job, "recurring kickoff").await?;
        tracing::info!(%cadence, %job_id, "scheduler: registered recurring import");
        Ok(())
    }

    async fn schedule_once(&self, job: ImportJob) -> Result<(), TriggerError> {
        let job_id = self.add_one_shot(job, "one-shot").await?;
        tracing::info!(%job_id, "scheduler: registered one-shot import");
        Ok(())
    }

    async fn cancel_recurring(&self) -> Result<(), TriggerError> {
        let mut recurring = self.recurring.lock().await;
        if let Some(previous) = recurring.take() {
            self.scheduler
                .remove(&previous.job_id)
                .await
                .map_err(backend)?;
            tracing::info!(cadence = %previous.cadence, "scheduler: removed recurring import");
        }
        Ok(())
    }

    async fn current_cadence(&self) -> Result<Option<Cadence>, TriggerError> {
        Ok(self.recurring.lock().await.map(|r| r.cadence))
    }

    async fn next_fire_time(&self) -> Result<Option<DateTime<Utc>>, TriggerError> {
        let Some(recurring) = *self.recurring.lock().await else {
            return Ok(None);
        };
        let mut scheduler = self.scheduler.clone();
        scheduler
            .next_tick_for_job(recurring.job_id)
            .await
            .map_err(backend)
    }
}

/// Registers a job that reconciles the schedule every `interval`.
///
/// # Errors
///
/// Returns [`JobSchedulerError`] if the job cannot be created or added.
pub async fn register_reconcile_job(
    scheduler: &JobScheduler,
    reconciler: Arc<ScheduleReconciler>,
    interval: Duration,
) -> Result<(), JobSchedulerError> {
    let job = Job::new_repeated_async(interval, move |_uuid, _lock| {
        let reconciler = Arc::clone(&reconciler);
        Box::pin(async move {
            if let Err(e) = reconciler.reconcile().await {
                tracing::error!(error = %e, "scheduler: periodic reconcile failed");
            }
        })
    })?;

    scheduler.add(job).await?;
    tracing::info!(
        interval_secs = interval.as_secs(),
        "scheduler: registered reconcile job"
    );
    Ok(())
}
