//! Typed access to the scalar settings kept in a [`ConfigStore`].

use crate::schedule::Frequency;
use crate::stores::{ConfigStore, StoreError};

/// Keys of the settings the importer reads and writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SettingKey {
    ApiKey,
    ApiSecret,
    Frequency,
    FinishedRecentImport,
}

impl SettingKey {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            SettingKey::ApiKey => "api_key",
            SettingKey::ApiSecret => "api_secret",
            SettingKey::Frequency => "frequency",
            SettingKey::FinishedRecentImport => "finished_recent_import",
        }
    }
}

/// Provider credentials: the app key and the secret used as `utoken`.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub app_key: String,
    pub secret: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("app_key", &self.app_key)
            .field("secret", &"[redacted]")
            .finish()
    }
}

/// Loads credentials; `None` unless both the key and the secret are non-blank.
///
/// # Errors
///
/// Returns [`StoreError`] if the store cannot be read.
pub async fn load_credentials(store: &dyn ConfigStore) -> Result<Option<Credentials>, StoreError> {
    let app_key = store.get(SettingKey::ApiKey).await?;
    let secret = store.get(SettingKey::ApiSecret).await?;

    match (non_blank(app_key), non_blank(secret)) {
        (Some(app_key), Some(secret)) => Ok(Some(Credentials { app_key, secret })),
        _ => Ok(None),
    }
}

/// Loads the import frequency. Missing or unreadable values count as off.
///
/// # Errors
///
/// Returns [`StoreError`] if the store cannot be read.
pub async fn load_frequency(store: &dyn ConfigStore) -> Result<Frequency, StoreError> {
    let Some(raw) = store.get(SettingKey::Frequency).await? else {
        return Ok(Frequency::Off);
    };
    if raw.trim().is_empty() {
        return Ok(Frequency::Off);
    }
    match raw.parse::<Frequency>() {
        Ok(freq) => Ok(freq),
        Err(e) => {
            tracing::warn!(value = %raw, error = %e, "stored frequency is invalid; treating as off");
            Ok(Frequency::Off)
        }
    }
}

/// # Errors
///
/// Returns [`StoreError`] if the value was not persisted.
pub async fn save_frequency(store: &dyn ConfigStore, frequency: Frequency) -> Result<(), StoreError> {
    store
        .set(SettingKey::Frequency, &frequency.code().to_string())
        .await
}

/// Sets the completion latch.
///
/// # Errors
///
/// Returns [`StoreError`] if the flag was not persisted.
pub async fn mark_import_finished(store: &dyn ConfigStore) -> Result<(), StoreError> {
    store.set(SettingKey::FinishedRecentImport, "true").await
}

/// Reads the completion latch without clearing it.
///
/// # Errors
///
/// Returns [`StoreError`] if the store cannot be read.
pub async fn import_finished(store: &dyn ConfigStore) -> Result<bool, StoreError> {
    let raw = store.get(SettingKey::FinishedRecentImport).await?;
    Ok(raw.as_deref().is_some_and(parse_flag))
}

/// Reads the completion latch and clears it if it was set.
///
/// Returns `true` exactly once per completed import.
///
/// # Errors
///
/// Returns [`StoreError`] if the store cannot be read or the clear was not
/// persisted.
pub async fn take_import_finished(store: &dyn ConfigStore) -> Result<bool, StoreError> {
    if !import_finished(store).await? {
        return Ok(false);
    }
    store.set(SettingKey::FinishedRecentImport, "false").await?;
    Ok(true)
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_flag(raw: &str) -> bool {
    matches!(raw.trim(), "1" | "true" | "TRUE" | "True")
}
