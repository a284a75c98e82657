use clap::Subcommand;

/// Sub-commands available under `runs`.
#[derive(Debug, Subcommand)]
pub enum RunsCommands {
    /// List recent import runs, newest first
    List {
        /// Maximum number of runs to show
        #[arg(long, default_value = "20")]
        limit: u32,
    },
}

/// # Errors
///
/// Returns an error if the database query fails.
pub(crate) async fn run_runs_list(pool: &sqlx::PgPool, limit: i64) -> anyhow::Result<()> {
    let runs = bottomline_db::list_import_runs(pool, limit).await?;
    if runs.is_empty() {
        println!("no import runs recorded; run `import` first");
        return Ok(());
    }

    println!(
        "{:<22}{:<10}{:<11}{:>7}{:>10}  ERROR",
        "STARTED", "SOURCE", "STATUS", "PAGES", "RECORDS"
    );
    for run in &runs {
        println!(
            "{:<22}{:<10}{:<11}{:>7}{:>10}  {}",
            run.started_at.format("%Y-%m-%d %H:%M:%S"),
            run.trigger_source,
            run.status,
            run.pages_fetched,
            run.records_merged,
            run.error_message.as_deref().unwrap_or("")
        );
    }
    Ok(())
}
