//! In-memory implementations of the store traits.
//!
//! Used by tests across the workspace and by anything that needs the
//! importer without a database.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::ratings::RatingAttribute;
use crate::settings::SettingKey;
use crate::stores::{ConfigStore, ProductStore, RunLedger, StoreError, TriggerSource};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Settings held in a `HashMap`.
#[derive(Debug, Default)]
pub struct MemoryConfigStore {
    values: Mutex<HashMap<SettingKey, String>>,
    writes: Mutex<usize>,
}

impl MemoryConfigStore {
    /// A store pre-populated with provider credentials.
    #[must_use]
    pub fn with_credentials(app_key: &str, secret: &str) -> Self {
        let store = Self::default();
        {
            let mut values = lock(&store.values);
            values.insert(SettingKey::ApiKey, app_key.to_string());
            values.insert(SettingKey::ApiSecret, secret.to_string());
        }
        store
    }

    /// Current raw value of `key`, bypassing the async trait.
    #[must_use]
    pub fn value(&self, key: SettingKey) -> Option<String> {
        lock(&self.values).get(&key).cloned()
    }

    /// Number of `set` calls observed.
    #[must_use]
    pub fn writes(&self) -> usize {
        *lock(&self.writes)
    }
}

#[async_trait]
impl ConfigStore for MemoryConfigStore {
    async fn get(&self, key: SettingKey) -> Result<Option<String>, StoreError> {
        Ok(self.value(key))
    }

    async fn set(&self, key: SettingKey, value: &str) -> Result<(), StoreError> {
        lock(&self.values).insert(key, value.to_string());
        *lock(&self.writes) += 1;
        Ok(())
    }
}

/// Rating attributes of one product.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoredRating {
    pub product_score: Option<Decimal>,
    pub total_reviews: Option<u32>,
}

/// Product ratings held in a `HashMap` keyed by external id.
#[derive(Debug, Default)]
pub struct MemoryProductStore {
    ratings: Mutex<HashMap<String, StoredRating>>,
    writes: Mutex<usize>,
}

impl MemoryProductStore {
    #[must_use]
    pub fn get(&self, product_external_id: &str) -> Option<StoredRating> {
        lock(&self.ratings).get(product_external_id).copied()
    }

    /// Number of distinct products with at least one attribute.
    #[must_use]
    pub fn len(&self) -> usize {
        lock(&self.ratings).len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of attribute writes observed.
    #[must_use]
    pub fn writes(&self) -> usize {
        *lock(&self.writes)
    }

    /// A copy of every stored rating.
    #[must_use]
    pub fn snapshot(&self) -> HashMap<String, StoredRating> {
        lock(&self.ratings).clone()
    }
}

#[async_trait]
impl ProductStore for MemoryProductStore {
    async fn set_attribute(
        &self,
        product_external_id: &str,
        attribute: RatingAttribute,
    ) -> Result<(), StoreError> {
        {
            let mut ratings = lock(&self.ratings);
            let entry = ratings.entry(product_external_id.to_string()).or_default();
            match attribute {
                RatingAttribute::ProductScore(score) => entry.product_score = Some(score),
                RatingAttribute::TotalReviews(count) => entry.total_reviews = Some(count),
            }
        }
        *lock(&self.writes) += 1;
        Ok(())
    }
}

/// Final state of a run recorded by [`MemoryRunLedger`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerStatus {
    Running,
    Succeeded {
        pages_fetched: u32,
        records_merged: u64,
    },
    Failed {
        pages_fetched: u32,
        records_merged: u64,
        message: String,
    },
    Skipped(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerEntry {
    pub id: i64,
    pub source: TriggerSource,
    pub status: LedgerStatus,
}

/// Run history held in a `Vec`.
#[derive(Debug, Default)]
pub struct MemoryRunLedger {
    entries: Mutex<Vec<LedgerEntry>>,
}

impl MemoryRunLedger {
    #[must_use]
    pub fn entries(&self) -> Vec<LedgerEntry> {
        lock(&self.entries).clone()
    }

    fn update(&self, run_id: i64, status: LedgerStatus) -> Result<(), StoreError> {
        let mut entries = lock(&self.entries);
        let entry = entries
            .iter_mut()
            .find(|e| e.id == run_id && e.status == LedgerStatus::Running)
            .ok_or(StoreError::OutOfRange {
                field: "run_id",
                reason: format!("no running import run with id {run_id}"),
            })?;
        entry.status = status;
        Ok(())
    }

    fn push(&self, source: TriggerSource, status: LedgerStatus) -> i64 {
        let mut entries = lock(&self.entries);
        let id = i64::try_from(entries.len()).unwrap_or(i64::MAX - 1) + 1;
        entries.push(LedgerEntry { id, source, status });
        id
    }
}

#[async_trait]
impl RunLedger for MemoryRunLedger {
    async fn open_run(&self, source: TriggerSource) -> Result<i64, StoreError> {
        Ok(self.push(source, LedgerStatus::Running))
    }

    async fn complete_run(
        &self,
        run_id: i64,
        pages_fetched: u32,
        records_merged: u64,
    ) -> Result<(), StoreError> {
        self.update(
            run_id,
            LedgerStatus::Succeeded {
                pages_fetched,
                records_merged,
            },
        )
    }

    async fn fail_run(
        &self,
        run_id: i64,
        pages_fetched: u32,
        records_merged: u64,
        error_message: &str,
    ) -> Result<(), StoreError> {
        self.update(
            run_id,
            LedgerStatus::Failed {
                pages_fetched,
                records_merged,
                message: error_message.to_string(),
            },
        )
    }

    async fn record_skipped(&self, source: TriggerSource, reason: &str) -> Result<(), StoreError> {
        self.push(source, LedgerStatus::Skipped(reason.to_string()));
        Ok(())
    }
}
