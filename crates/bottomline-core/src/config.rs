use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the real environment so it can be tested with a plain
/// `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;

    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var).map_err(|_| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let parse_addr = |var: &str, default: &str| -> Result<SocketAddr, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u32>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let database_url = require("DATABASE_URL")?;
    let env = parse_environment(&or_default("BOTTOMLINE_ENV", "development"))?;

    let bind_addr = parse_addr("BOTTOMLINE_BIND_ADDR", "0.0.0.0:3000")?;
    let log_level = or_default("BOTTOMLINE_LOG_LEVEL", "info");

    let db_max_connections = parse_u32("BOTTOMLINE_DB_MAX_CONNECTIONS", "10")?;
    let db_min_connections = parse_u32("BOTTOMLINE_DB_MIN_CONNECTIONS", "1")?;
    if db_min_connections > db_max_connections {
        return Err(ConfigError::InvalidEnvVar {
            var: "BOTTOMLINE_DB_MIN_CONNECTIONS".to_string(),
            reason: format!(
                "min connections ({db_min_connections}) exceeds max connections ({db_max_connections})"
            ),
        });
    }
    let db_acquire_timeout_secs = parse_u64("BOTTOMLINE_DB_ACQUIRE_TIMEOUT_SECS", "10")?;

    let yotpo_base_url = or_default("YOTPO_BASE_URL", "https://api.yotpo.com/v1/");
    let yotpo_request_timeout_secs = parse_u64("YOTPO_REQUEST_TIMEOUT_SECS", "10")?;
    if yotpo_request_timeout_secs == 0 {
        return Err(ConfigError::InvalidEnvVar {
            var: "YOTPO_REQUEST_TIMEOUT_SECS".to_string(),
            reason: "timeout must be greater than zero".to_string(),
        });
    }
    let yotpo_user_agent = or_default("YOTPO_USER_AGENT", "bottomline/0.1 (ratings-import)");
    let yotpo_max_retries = parse_u32("YOTPO_MAX_RETRIES", "0")?;
    let yotpo_retry_backoff_base_ms = parse_u64("YOTPO_RETRY_BACKOFF_BASE_MS", "1000")?;

    let reconcile_interval_secs = parse_u64("BOTTOMLINE_RECONCILE_INTERVAL_SECS", "300")?;
    if reconcile_interval_secs == 0 {
        return Err(ConfigError::InvalidEnvVar {
            var: "BOTTOMLINE_RECONCILE_INTERVAL_SECS".to_string(),
            reason: "interval must be greater than zero".to_string(),
        });
    }

    Ok(AppConfig {
        database_url,
        env,
        bind_addr,
        log_level,
        db_max_connections,
        db_min_connections,
        db_acquire_timeout_secs,
        yotpo_base_url,
        yotpo_request_timeout_secs,
        yotpo_user_agent,
        yotpo_max_retries,
        yotpo_retry_backoff_base_ms,
        reconcile_interval_secs,
    })
}

/// Parse a string into an `Environment` variant.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "production" => Ok(Environment::Production),
        "test" => Ok(Environment::Test),
        other => Err(ConfigError::InvalidEnvVar {
            var: "BOTTOMLINE_ENV".to_string(),
            reason: format!("unknown environment {other:?}"),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
