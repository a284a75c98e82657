//! Paginated retrieval and merge of provider bottomlines.
//!
//! A run walks pages from the start page with a fixed page size. Each
//! non-empty page is merged before the next is requested, so a failure
//! part-way through leaves earlier pages in place. The run ends on the first
//! empty page or the first page shorter than requested; only the latter sets
//! the completion latch.

use std::sync::Arc;

use bottomline_core::settings::{load_credentials, mark_import_finished};
use bottomline_core::{ConfigStore, ImportCursor, ProductStore, RatingPage, DEFAULT_PAGE_SIZE};
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::error::ImportError;
use crate::source::{RatingsConnector, RatingsSource};

/// How a run that did not fail came to an end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// A short page was reached; the completion latch is set.
    Completed {
        pages_fetched: u32,
        records_merged: u64,
    },
    /// An empty page was reached; nothing on it was merged and the latch is
    /// untouched. Earlier full pages are counted in `records_merged`.
    Empty {
        pages_fetched: u32,
        records_merged: u64,
    },
}

impl RunOutcome {
    #[must_use]
    pub fn pages_fetched(&self) -> u32 {
        self.progress().pages_fetched
    }

    #[must_use]
    pub fn records_merged(&self) -> u64 {
        self.progress().records_merged
    }

    #[must_use]
    pub fn progress(&self) -> RunProgress {
        match *self {
            RunOutcome::Completed {
                pages_fetched,
                records_merged,
            }
            | RunOutcome::Empty {
                pages_fetched,
                records_merged,
            } => RunProgress {
                pages_fetched,
                records_merged,
            },
        }
    }
}

/// Counts accumulated while a run is in flight. Still meaningful when the
/// run fails, since merged pages are kept.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunProgress {
    pub pages_fetched: u32,
    pub records_merged: u64,
}

/// Exclusive right to run the pipeline, held for the whole run.
#[derive(Debug)]
pub struct RunLease {
    _guard: OwnedMutexGuard<()>,
}

/// Drives one import run at a time against the configured provider.
pub struct ImportPipeline {
    connector: Arc<dyn RatingsConnector>,
    products: Arc<dyn ProductStore>,
    settings: Arc<dyn ConfigStore>,
    lease: Arc<Mutex<()>>,
}

impl ImportPipeline {
    pub fn new(
        connector: Arc<dyn RatingsConnector>,
        products: Arc<dyn ProductStore>,
        settings: Arc<dyn ConfigStore>,
    ) -> Self {
        Self {
            connector,
            products,
            settings,
            lease: Arc::new(Mutex::new(())),
        }
    }

    /// `true` while a run holds the lease.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.lease.try_lock().is_err()
    }

    /// Takes the run lease without waiting.
    ///
    /// # Errors
    ///
    /// Returns [`ImportError::AlreadyRunning`] if another run holds it.
    pub fn try_lease(&self) -> Result<RunLease, ImportError> {
        let guard = Arc::clone(&self.lease)
            .try_lock_owned()
            .map_err(|_| ImportError::AlreadyRunning)?;
        Ok(RunLease { _guard: guard })
    }

    /// Runs one import starting at `start_page` (1-based).
    ///
    /// # Errors
    ///
    /// - [`ImportError::AlreadyRunning`] if another run is in flight; nothing
    ///   is fetched or written.
    /// - [`ImportError::InvalidCursor`] if `start_page` is zero.
    /// - [`ImportError::MissingCredentials`] if no key/secret pair is stored.
    /// - [`ImportError::Provider`] if a page cannot be fetched. Pages merged
    ///   before the failure are kept and the latch is not set.
    /// - [`ImportError::ProductStore`] or [`ImportError::ConfigStore`] if a
    ///   store write fails.
    pub async fn run(&self, start_page: u32) -> Result<RunOutcome, ImportError> {
        let lease = self.try_lease()?;
        let mut progress = RunProgress::default();
        self.run_with_lease(lease, start_page, &mut progress).await
    }

    /// Runs one import under an already-held lease, keeping `progress`
    /// current page by page. The lease is released when this returns, on
    /// success or failure.
    pub(crate) async fn run_with_lease(
        &self,
        _lease: RunLease,
        start_page: u32,
        progress: &mut RunProgress,
    ) -> Result<RunOutcome, ImportError> {
        let mut cursor = ImportCursor::new(start_page, DEFAULT_PAGE_SIZE)?;

        let credentials = load_credentials(self.settings.as_ref())
            .await
            .map_err(ImportError::ConfigStore)?
            .ok_or(ImportError::MissingCredentials)?;
        let source = self.connector.connect(credentials)?;

        tracing::info!(
            start_page = cursor.page_number(),
            page_size = cursor.page_size(),
            "import run started"
        );

        loop {
            let page = fetch(source.as_ref(), &cursor).await?;
            progress.pages_fetched = progress.pages_fetched.saturating_add(1);

            tracing::info!(
                page = cursor.page_number(),
                records = page.returned_size(),
                "fetched bottomlines page"
            );

            if page.is_empty() {
                tracing::info!(
                    pages_fetched = progress.pages_fetched,
                    records_merged = progress.records_merged,
                    "import run ended on empty page"
                );
                return Ok(RunOutcome::Empty {
                    pages_fetched: progress.pages_fetched,
                    records_merged: progress.records_merged,
                });
            }

            self.merge_page(&page, progress).await?;

            if page.is_last() {
                mark_import_finished(self.settings.as_ref())
                    .await
                    .map_err(ImportError::ConfigStore)?;
                tracing::info!(
                    pages_fetched = progress.pages_fetched,
                    records_merged = progress.records_merged,
                    "import run completed"
                );
                return Ok(RunOutcome::Completed {
                    pages_fetched: progress.pages_fetched,
                    records_merged: progress.records_merged,
                });
            }

            cursor.advance()?;
        }
    }

    /// Writes both attributes of every keyed record, counting each record
    /// into `progress` once both are stored.
    async fn merge_page(
        &self,
        page: &RatingPage,
        progress: &mut RunProgress,
    ) -> Result<(), ImportError> {
        for record in &page.records {
            if !record.has_product_key() {
                tracing::warn!(
                    score = %record.score,
                    review_count = record.review_count,
                    "skipping bottomline without a product key"
                );
                continue;
            }
            for attribute in record.attributes() {
                self.products
                    .set_attribute(&record.product_external_id, attribute)
                    .await
                    .map_err(ImportError::ProductStore)?;
            }
            progress.records_merged = progress.records_merged.saturating_add(1);
        }
        Ok(())
    }
}

async fn fetch(source: &dyn RatingsSource, cursor: &ImportCursor) -> Result<RatingPage, ImportError> {
    source
        .fetch_page(cursor.page_number(), cursor.page_size())
        .await
        .map_err(|e| {
            tracing::error!(page = cursor.page_number(), error = %e, "bottomlines fetch failed");
            ImportError::Provider(e)
        })
}
