use std::net::SocketAddr;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

/// Process-level configuration read from the environment.
///
/// Provider credentials and the import frequency are *not* here: they are
/// operator-editable settings kept in the [`crate::ConfigStore`].
#[derive(Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
    pub yotpo_base_url: String,
    pub yotpo_request_timeout_secs: u64,
    pub yotpo_user_agent: String,
    pub yotpo_max_retries: u32,
    pub yotpo_retry_backoff_base_ms: u64,
    pub reconcile_interval_secs: u64,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("database_url", &"[redacted]")
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .field("yotpo_base_url", &self.yotpo_base_url)
            .field(
                "yotpo_request_timeout_secs",
                &self.yotpo_request_timeout_secs,
            )
            .field("yotpo_user_agent", &self.yotpo_user_agent)
            .field("yotpo_max_retries", &self.yotpo_max_retries)
            .field(
                "yotpo_retry_backoff_base_ms",
                &self.yotpo_retry_backoff_base_ms,
            )
            .field("reconcile_interval_secs", &self.reconcile_interval_secs)
            .finish()
    }
}
