use bottomline_core::settings::{load_credentials, load_frequency, save_frequency};
use bottomline_core::{ConfigStore, Frequency, SettingKey};
use bottomline_db::PgConfigStore;
use clap::Subcommand;

/// Sub-commands available under `settings`.
#[derive(Debug, Subcommand)]
pub enum SettingsCommands {
    /// Print the stored settings (the secret is never shown)
    Show,
    /// Store one or more settings
    Set {
        /// Yotpo app key
        #[arg(long)]
        api_key: Option<String>,
        /// Yotpo secret
        #[arg(long, env = "BOTTOMLINE_YOTPO_SECRET", hide_env_values = true)]
        api_secret: Option<String>,
        /// Import frequency: off, daily, twicedaily, hourly, or 0-3
        #[arg(long)]
        frequency: Option<Frequency>,
    },
}

/// # Errors
///
/// Returns an error if the settings table cannot be read.
pub(crate) async fn run_settings_show(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    let store = PgConfigStore::new(pool.clone());
    let credentials = load_credentials(&store).await?;
    let frequency = load_frequency(&store).await?;

    match credentials {
        Some(creds) => {
            println!("api_key:    {}", creds.app_key);
            println!("api_secret: set");
        }
        None => {
            println!("api_key:    {}", store.get(SettingKey::ApiKey).await?.unwrap_or_default());
            println!("api_secret: not set");
        }
    }
    println!("frequency:  {frequency} ({})", frequency.code());

    let rows = bottomline_db::list_settings(pool).await?;
    if let Some(latest) = rows.iter().map(|r| r.updated_at).max() {
        println!("updated:    {}", latest.format("%Y-%m-%d %H:%M:%S UTC"));
    }
    Ok(())
}

/// Writes the supplied values, trimmed. The server picks up the new schedule
/// on its next reconcile.
///
/// # Errors
///
/// Returns an error if nothing was supplied or a write fails.
pub(crate) async fn run_settings_set(
    pool: &sqlx::PgPool,
    api_key: Option<&str>,
    api_secret: Option<&str>,
    frequency: Option<Frequency>,
) -> anyhow::Result<()> {
    if api_key.is_none() && api_secret.is_none() && frequency.is_none() {
        anyhow::bail!("nothing to set; pass --api-key, --api-secret, or --frequency");
    }

    let store = PgConfigStore::new(pool.clone());
    if let Some(key) = api_key {
        store.set(SettingKey::ApiKey, key.trim()).await?;
        println!("api_key updated");
    }
    if let Some(secret) = api_secret {
        store.set(SettingKey::ApiSecret, secret.trim()).await?;
        println!("api_secret updated");
    }
    if let Some(frequency) = frequency {
        save_frequency(&store, frequency).await?;
        println!("frequency set to {frequency}");
    }

    if load_credentials(&store).await?.is_none() && load_frequency(&store).await?.is_enabled() {
        tracing::warn!("frequency is set but credentials are incomplete; the server will turn it off");
    }
    Ok(())
}
