//! Import runs recorded in the run ledger.

use std::sync::Arc;

use bottomline_core::{ImportJob, RunLedger, TriggerSource};
use futures::FutureExt;

use crate::error::ImportError;
use crate::pipeline::{ImportPipeline, RunOutcome, RunProgress};

/// Runs the pipeline and records the run in `ledger`.
///
/// The ledger row goes `running` → `succeeded` or `failed`, with the pages
/// and records reached either way. A run turned away by the lease gets a
/// single `skipped` row instead.
/// Ledger failures while closing the row are logged; the pipeline's own
/// result is returned unchanged.
///
/// # Errors
///
/// Returns whatever [`ImportPipeline::run`] returns, or
/// [`ImportError::Ledger`] if the ledger row cannot be opened.
pub async fn run_tracked(
    pipeline: &ImportPipeline,
    ledger: &dyn RunLedger,
    source: TriggerSource,
    start_page: u32,
) -> Result<RunOutcome, ImportError> {
    let lease = match pipeline.try_lease() {
        Ok(lease) => lease,
        Err(err) => {
            tracing::warn!(source = source.as_str(), "import skipped: run already in progress");
            if let Err(ledger_err) = ledger.record_skipped(source, &err.to_string()).await {
                tracing::error!(error = %ledger_err, "failed to record skipped import run");
            }
            return Err(err);
        }
    };

    let run_id = ledger
        .open_run(source)
        .await
        .map_err(ImportError::Ledger)?;

    let mut progress = RunProgress::default();
    let result = pipeline
        .run_with_lease(lease, start_page, &mut progress)
        .await;

    let closed = match &result {
        Ok(outcome) => {
            ledger
                .complete_run(run_id, outcome.pages_fetched(), outcome.records_merged())
                .await
        }
        Err(err) => {
            ledger
                .fail_run(
                    run_id,
                    progress.pages_fetched,
                    progress.records_merged,
                    &err.to_string(),
                )
                .await
        }
    };
    if let Err(ledger_err) = closed {
        tracing::error!(run_id, error = %ledger_err, "failed to close import run");
    }

    result
}

/// Wraps a tracked run from page 1 as a trigger callback.
///
/// Failures are logged here; the ledger row carries the message.
pub fn import_job(
    pipeline: Arc<ImportPipeline>,
    ledger: Arc<dyn RunLedger>,
    source: TriggerSource,
) -> ImportJob {
    Arc::new(move || {
        let pipeline = Arc::clone(&pipeline);
        let ledger = Arc::clone(&ledger);
        async move {
            match run_tracked(&pipeline, ledger.as_ref(), source, 1).await {
                Ok(outcome) => {
                    tracing::info!(source = source.as_str(), ?outcome, "import job finished");
                }
                Err(e) => {
                    tracing::error!(source = source.as_str(), error = %e, "import job failed");
                }
            }
        }
        .boxed()
    })
}
