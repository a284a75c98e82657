mod api;
mod middleware;
mod scheduler;

use std::sync::Arc;
use std::time::Duration;

use bottomline_core::{ConfigStore, RunLedger, TriggerRegistry, TriggerSource};
use bottomline_db::{PgConfigStore, PgProductStore, PgRunLedger};
use bottomline_import::{import_job, ImportPipeline, ScheduleReconciler, YotpoConnector};
use tokio_cron_scheduler::JobScheduler;
use tracing_subscriber::EnvFilter;

use crate::{
    api::{build_app, AppState},
    middleware::AuthState,
    scheduler::{register_reconcile_job, CronTriggerRegistry},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = bottomline_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let pool = bottomline_db::connect_pool_from_config(&config).await?;
    let applied = bottomline_db::run_migrations(&pool).await?;
    tracing::info!(applied, "database migrations up to date");

    let settings: Arc<dyn ConfigStore> = Arc::new(PgConfigStore::new(pool.clone()));
    let ledger: Arc<dyn RunLedger> = Arc::new(PgRunLedger::new(pool.clone()));
    let pipeline = Arc::new(ImportPipeline::new(
        Arc::new(YotpoConnector::new(config.clone())),
        Arc::new(PgProductStore::new(pool.clone())),
        Arc::clone(&settings),
    ));

    let scheduler = JobScheduler::new().await?;
    scheduler.start().await?;
    let registry: Arc<dyn TriggerRegistry> =
        Arc::new(CronTriggerRegistry::new(scheduler.clone()));
    let reconciler = Arc::new(ScheduleReconciler::new(
        Arc::clone(&settings),
        registry,
        import_job(
            Arc::clone(&pipeline),
            Arc::clone(&ledger),
            TriggerSource::Schedule,
        ),
        import_job(Arc::clone(&pipeline), ledger, TriggerSource::Manual),
    ));

    let action = reconciler.reconcile().await?;
    tracing::info!(?action, "initial schedule reconcile");
    register_reconcile_job(
        &scheduler,
        Arc::clone(&reconciler),
        Duration::from_secs(config.reconcile_interval_secs),
    )
    .await?;

    let auth = AuthState::from_env(matches!(
        config.env,
        bottomline_core::Environment::Development
    ))?;
    let app = build_app(
        AppState {
            pool,
            settings,
            pipeline,
            reconciler: Arc::clone(&reconciler),
        },
        auth,
    );

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, "listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Err(e) = reconciler.deactivate().await {
        tracing::warn!(error = %e, "failed to clear recurring import on shutdown");
    }
    let mut scheduler = scheduler;
    scheduler.shutdown().await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, starting graceful shutdown");
}
