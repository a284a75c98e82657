//! Keeps the recurring import trigger in line with the stored frequency.
//!
//! [`plan`] is the pure decision; [`ScheduleReconciler::reconcile`] reads
//! the inputs, applies the decision, and is safe to call on every admin
//! request.

use std::sync::Arc;

use bottomline_core::settings::{load_credentials, load_frequency, save_frequency};
use bottomline_core::{Cadence, ConfigStore, Frequency, ImportJob, TriggerRegistry};
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use crate::error::ScheduleError;

/// What reconciliation does to the recurring trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerAction {
    /// The armed cadence already matches.
    Keep,
    /// No recurring trigger should exist. `force_frequency_off` is set when
    /// credentials are missing and the stored frequency must be reset.
    Clear { force_frequency_off: bool },
    /// Replace whatever is armed with a trigger at this cadence.
    Arm(Cadence),
}

/// Decides the trigger action from the current inputs.
#[must_use]
pub fn plan(
    credentials_present: bool,
    frequency: Frequency,
    armed: Option<Cadence>,
) -> TriggerAction {
    if !credentials_present {
        return TriggerAction::Clear {
            force_frequency_off: frequency != Frequency::Off,
        };
    }
    match frequency.cadence() {
        None => TriggerAction::Clear {
            force_frequency_off: false,
        },
        Some(desired) if armed == Some(desired) => TriggerAction::Keep,
        Some(desired) => TriggerAction::Arm(desired),
    }
}

/// Snapshot of the schedule for the admin surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleStatus {
    pub credentials_present: bool,
    pub frequency: Frequency,
    pub armed: Option<Cadence>,
    pub next_fire_time: Option<DateTime<Utc>>,
}

pub struct ScheduleReconciler {
    settings: Arc<dyn ConfigStore>,
    registry: Arc<dyn TriggerRegistry>,
    recurring_job: ImportJob,
    one_shot_job: ImportJob,
    // Held across read-decide-apply so concurrent callers never both arm.
    mutation: Mutex<()>,
}

impl ScheduleReconciler {
    /// `recurring_job` is what the cadence trigger fires; `one_shot_job` is
    /// what an on-demand import fires.
    pub fn new(
        settings: Arc<dyn ConfigStore>,
        registry: Arc<dyn TriggerRegistry>,
        recurring_job: ImportJob,
        one_shot_job: ImportJob,
    ) -> Self {
        Self {
            settings,
            registry,
            recurring_job,
            one_shot_job,
            mutation: Mutex::new(()),
        }
    }

    /// Brings the recurring trigger in line with the stored settings.
    ///
    /// Idempotent: a second call with unchanged settings mutates nothing.
    /// Concurrent calls run one after another.
    ///
    /// # Errors
    ///
    /// Returns [`ScheduleError`] if settings cannot be read or written, or
    /// the registry rejects a change.
    pub async fn reconcile(&self) -> Result<TriggerAction, ScheduleError> {
        let _guard = self.mutation.lock().await;
        let credentials_present = load_credentials(self.settings.as_ref()).await?.is_some();
        let frequency = load_frequency(self.settings.as_ref()).await?;
        let armed = self.registry.current_cadence().await?;

        let action = plan(credentials_present, frequency, armed);
        match action {
            TriggerAction::Keep => {}
            TriggerAction::Clear {
                force_frequency_off,
            } => {
                if force_frequency_off {
                    save_frequency(self.settings.as_ref(), Frequency::Off).await?;
                    tracing::info!(
                        previous = %frequency,
                        "credentials missing, import frequency reset to off"
                    );
                }
                if let Some(cadence) = armed {
                    self.registry.cancel_recurring().await?;
                    tracing::info!(%cadence, "recurring import cleared");
                }
            }
            TriggerAction::Arm(cadence) => {
                if armed.is_some() {
                    self.registry.cancel_recurring().await?;
                }
                self.registry
                    .schedule_recurring(cadence, Arc::clone(&self.recurring_job))
                    .await?;
                tracing::info!(
                    %cadence,
                    previous = ?armed.map(Cadence::name),
                    "recurring import armed"
                );
            }
        }
        Ok(action)
    }

    /// Arms one non-recurring import. The recurring trigger is not touched.
    ///
    /// # Errors
    ///
    /// Returns [`ScheduleError::Trigger`] if the registry rejects the job.
    pub async fn trigger_once_now(&self) -> Result<(), ScheduleError> {
        self.registry
            .schedule_once(Arc::clone(&self.one_shot_job))
            .await?;
        tracing::info!("one-shot import scheduled");
        Ok(())
    }

    /// On-demand import: clears the recurring trigger and fires one run now.
    /// The next [`reconcile`](Self::reconcile) re-arms the cadence.
    ///
    /// # Errors
    ///
    /// Returns [`ScheduleError::Trigger`] if the registry rejects a change.
    pub async fn import_now(&self) -> Result<(), ScheduleError> {
        let _guard = self.mutation.lock().await;
        self.registry.cancel_recurring().await?;
        self.trigger_once_now().await
    }

    /// Removes the recurring trigger, as on shutdown.
    ///
    /// # Errors
    ///
    /// Returns [`ScheduleError::Trigger`] if the registry rejects the change.
    pub async fn deactivate(&self) -> Result<(), ScheduleError> {
        let _guard = self.mutation.lock().await;
        self.registry.cancel_recurring().await?;
        tracing::info!("recurring import deactivated");
        Ok(())
    }

    /// # Errors
    ///
    /// Returns [`ScheduleError`] if settings or the registry cannot be read.
    pub async fn status(&self) -> Result<ScheduleStatus, ScheduleError> {
        Ok(ScheduleStatus {
            credentials_present: load_credentials(self.settings.as_ref()).await?.is_some(),
            frequency: load_frequency(self.settings.as_ref()).await?,
            armed: self.registry.current_cadence().await?,
            next_fire_time: self.registry.next_fire_time().await?,
        })
    }
}
