use bottomline_core::{CoreError, StoreError, TriggerError};
use bottomline_yotpo::ProviderError;
use thiserror::Error;

/// Reasons an import run stopped before reaching a terminal page.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("provider fetch failed: {0}")]
    Provider(#[from] ProviderError),

    #[error("product store write failed: {0}")]
    ProductStore(#[source] StoreError),

    #[error("settings store failed: {0}")]
    ConfigStore(#[source] StoreError),

    #[error("run ledger failed: {0}")]
    Ledger(#[source] StoreError),

    /// Another run holds the in-process lease.
    #[error("an import run is already in progress")]
    AlreadyRunning,

    #[error("provider credentials are not configured")]
    MissingCredentials,

    #[error(transparent)]
    InvalidCursor(#[from] CoreError),
}

/// Failures while reconciling the recurring trigger.
#[derive(Debug, Error)]
pub enum ScheduleError {
    #[error("settings store failed: {0}")]
    Config(#[from] StoreError),

    #[error(transparent)]
    Trigger(#[from] TriggerError),
}
