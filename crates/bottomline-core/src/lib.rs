//! Shared domain types, configuration, and collaborator seams for the
//! bottomline ratings importer.

pub mod app_config;
pub mod config;
#[cfg(any(test, feature = "test-support"))]
pub mod memory;
pub mod ratings;
pub mod schedule;
pub mod settings;
pub mod stores;

pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env};
pub use ratings::{BottomlineRecord, ImportCursor, RatingAttribute, RatingPage, DEFAULT_PAGE_SIZE};
pub use schedule::{Cadence, Frequency};
pub use settings::{Credentials, SettingKey};
pub use stores::{
    ConfigStore, ImportJob, ProductStore, RunLedger, StoreError, TriggerError, TriggerRegistry,
    TriggerSource,
};

use thiserror::Error;

/// Errors raised while loading [`AppConfig`] from the environment.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}

/// Domain-level validation errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CoreError {
    #[error("invalid import cursor: {0}")]
    InvalidCursor(String),

    #[error("invalid frequency {0:?}; expected 0-3 or off/daily/twicedaily/hourly")]
    InvalidFrequency(String),
}
