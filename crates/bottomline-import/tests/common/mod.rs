//! Fakes shared by the pipeline and reconciler tests.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bottomline_core::{
    BottomlineRecord, Cadence, Credentials, ImportJob, RatingPage, TriggerError, TriggerRegistry,
};
use bottomline_import::{RatingsConnector, RatingsSource};
use bottomline_yotpo::ProviderError;
use chrono::{DateTime, Utc};
use futures::FutureExt;
use rust_decimal::Decimal;

/// A provider holding `total` bottomlines, served in request order.
pub struct FakeSource {
    total: usize,
    fail_on_page: Option<u32>,
    blank_keys: bool,
    calls: Mutex<Vec<(u32, u32)>>,
    gate: Option<Arc<tokio::sync::Notify>>,
}

impl FakeSource {
    pub fn with_records(total: usize) -> Arc<Self> {
        Arc::new(Self {
            total,
            fail_on_page: None,
            blank_keys: false,
            calls: Mutex::new(Vec::new()),
            gate: None,
        })
    }

    pub fn failing_on(total: usize, page: u32) -> Arc<Self> {
        Arc::new(Self {
            total,
            fail_on_page: Some(page),
            blank_keys: false,
            calls: Mutex::new(Vec::new()),
            gate: None,
        })
    }

    /// Every record on every page has a blank product key.
    pub fn with_blank_keys(total: usize) -> Arc<Self> {
        Arc::new(Self {
            total,
            fail_on_page: None,
            blank_keys: true,
            calls: Mutex::new(Vec::new()),
            gate: None,
        })
    }

    /// Blocks every fetch until `gate` is notified.
    pub fn gated(total: usize, gate: Arc<tokio::sync::Notify>) -> Arc<Self> {
        Arc::new(Self {
            total,
            fail_on_page: None,
            blank_keys: false,
            calls: Mutex::new(Vec::new()),
            gate: Some(gate),
        })
    }

    pub fn calls(&self) -> Vec<(u32, u32)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn record(index: usize) -> BottomlineRecord {
        BottomlineRecord {
            product_external_id: format!("sku-{index}"),
            score: Decimal::new(i64::try_from(index % 50).unwrap(), 1),
            review_count: u32::try_from(index).unwrap(),
        }
    }
}

#[async_trait]
impl RatingsSource for FakeSource {
    async fn fetch_page(
        &self,
        page_number: u32,
        page_size: u32,
    ) -> Result<RatingPage, ProviderError> {
        self.calls.lock().unwrap().push((page_number, page_size));
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        if self.fail_on_page == Some(page_number) {
            return Err(ProviderError::UnexpectedStatus {
                status: 503,
                endpoint: "bottom_lines".to_owned(),
            });
        }

        let size = page_size as usize;
        let start = (page_number as usize - 1) * size;
        let end = (start + size).min(self.total);
        let records = (start.min(end)..end)
            .map(|i| {
                let mut record = Self::record(i);
                if self.blank_keys {
                    record.product_external_id = "  ".to_owned();
                }
                record
            })
            .collect();
        Ok(RatingPage {
            requested_size: page_size,
            records,
        })
    }
}

/// Hands out the same source on every connect and keeps the credentials
/// it was given.
pub struct FakeConnector {
    source: Arc<FakeSource>,
    seen: Mutex<Vec<Credentials>>,
}

impl FakeConnector {
    pub fn new(source: Arc<FakeSource>) -> Arc<Self> {
        Arc::new(Self {
            source,
            seen: Mutex::new(Vec::new()),
        })
    }

    pub fn connections(&self) -> usize {
        self.seen.lock().unwrap().len()
    }

    pub fn last_credentials(&self) -> Option<Credentials> {
        self.seen.lock().unwrap().last().cloned()
    }
}

impl RatingsConnector for FakeConnector {
    fn connect(&self, credentials: Credentials) -> Result<Arc<dyn RatingsSource>, ProviderError> {
        self.seen.lock().unwrap().push(credentials);
        Ok(Arc::clone(&self.source) as Arc<dyn RatingsSource>)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistryCall {
    ScheduleRecurring(Cadence),
    ScheduleOnce,
    Cancel,
}

/// Trigger registry that records calls instead of running jobs.
#[derive(Default)]
pub struct FakeRegistry {
    armed: Mutex<Option<Cadence>>,
    calls: Mutex<Vec<RegistryCall>>,
    one_shots: Mutex<Vec<ImportJob>>,
    yield_on_read: bool,
}

impl FakeRegistry {
    /// Yields to the runtime inside `current_cadence`, so interleaved callers
    /// can observe the same armed state.
    pub fn yielding() -> Arc<Self> {
        Arc::new(Self {
            yield_on_read: true,
            ..Self::default()
        })
    }

    pub fn armed_with(cadence: Cadence) -> Arc<Self> {
        let registry = Self::default();
        *registry.armed.lock().unwrap() = Some(cadence);
        Arc::new(registry)
    }

    pub fn calls(&self) -> Vec<RegistryCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn armed(&self) -> Option<Cadence> {
        *self.armed.lock().unwrap()
    }

    /// Runs every queued one-shot job to completion.
    pub async fn fire_one_shots(&self) {
        let jobs: Vec<ImportJob> = self.one_shots.lock().unwrap().drain(..).collect();
        for job in jobs {
            job().await;
        }
    }
}

#[async_trait]
impl TriggerRegistry for FakeRegistry {
    async fn schedule_recurring(
        &self,
        cadence: Cadence,
        _job: ImportJob,
    ) -> Result<(), TriggerError> {
        *self.armed.lock().unwrap() = Some(cadence);
        self.calls
            .lock()
            .unwrap()
            .push(RegistryCall::ScheduleRecurring(cadence));
        Ok(())
    }

    async fn schedule_once(&self, job: ImportJob) -> Result<(), TriggerError> {
        self.one_shots.lock().unwrap().push(job);
        self.calls.lock().unwrap().push(RegistryCall::ScheduleOnce);
        Ok(())
    }

    async fn cancel_recurring(&self) -> Result<(), TriggerError> {
        *self.armed.lock().unwrap() = None;
        self.calls.lock().unwrap().push(RegistryCall::Cancel);
        Ok(())
    }

    async fn current_cadence(&self) -> Result<Option<Cadence>, TriggerError> {
        let armed = self.armed();
        if self.yield_on_read {
            tokio::task::yield_now().await;
        }
        Ok(armed)
    }

    async fn next_fire_time(&self) -> Result<Option<DateTime<Utc>>, TriggerError> {
        Ok(self.armed().map(|c| {
            Utc::now() + chrono::Duration::from_std(c.period()).unwrap_or_default()
        }))
    }
}

pub fn noop_job() -> ImportJob {
    Arc::new(|| async {}.boxed())
}
