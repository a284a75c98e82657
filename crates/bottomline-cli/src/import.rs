//! Foreground import for operators and cron wrappers outside the server.

use std::sync::Arc;

use bottomline_core::{ConfigStore, TriggerSource};
use bottomline_db::{PgConfigStore, PgProductStore, PgRunLedger};
use bottomline_import::{run_tracked, ImportPipeline, RunOutcome, YotpoConnector};

/// Runs one tracked import starting at `start_page` and prints the outcome.
///
/// The run lease is per process, so a server import running at the same
/// time is not detected here.
///
/// # Errors
///
/// Returns an error if credentials are missing, the cursor is invalid, the
/// ledger row cannot be opened, or any page fetch or write fails.
pub(crate) async fn run_import(
    pool: &sqlx::PgPool,
    config: &bottomline_core::AppConfig,
    start_page: u32,
) -> anyhow::Result<()> {
    let settings: Arc<dyn ConfigStore> = Arc::new(PgConfigStore::new(pool.clone()));
    let pipeline = ImportPipeline::new(
        Arc::new(YotpoConnector::new(config.clone())),
        Arc::new(PgProductStore::new(pool.clone())),
        settings,
    );
    let ledger = PgRunLedger::new(pool.clone());

    match run_tracked(&pipeline, &ledger, TriggerSource::Cli, start_page).await? {
        RunOutcome::Completed {
            pages_fetched,
            records_merged,
        } => println!(
            "import completed: {pages_fetched} pages fetched, {records_merged} records merged"
        ),
        RunOutcome::Empty {
            pages_fetched,
            records_merged,
        } => println!(
            "import stopped at an empty page after {pages_fetched} pages \
             ({records_merged} records merged); completion notice not set"
        ),
    }
    Ok(())
}
