//! Import pipeline behaviour against in-memory stores and a fake provider.

mod common;

use std::sync::Arc;

use bottomline_core::memory::{LedgerStatus, MemoryConfigStore, MemoryProductStore, MemoryRunLedger};
use bottomline_core::settings::import_finished;
use bottomline_core::{SettingKey, TriggerSource};
use bottomline_import::{run_tracked, ImportError, ImportPipeline, RunOutcome};
use common::{FakeConnector, FakeSource};

struct Harness {
    source: Arc<FakeSource>,
    connector: Arc<FakeConnector>,
    products: Arc<MemoryProductStore>,
    settings: Arc<MemoryConfigStore>,
    pipeline: ImportPipeline,
}

fn harness(source: Arc<FakeSource>) -> Harness {
    harness_with_settings(source, MemoryConfigStore::with_credentials("app-1", "secret-1"))
}

fn harness_with_settings(source: Arc<FakeSource>, settings: MemoryConfigStore) -> Harness {
    let connector = FakeConnector::new(Arc::clone(&source));
    let products = Arc::new(MemoryProductStore::default());
    let settings = Arc::new(settings);
    let pipeline = ImportPipeline::new(
        Arc::clone(&connector) as _,
        Arc::clone(&products) as _,
        Arc::clone(&settings) as _,
    );
    Harness {
        source,
        connector,
        products,
        settings,
        pipeline,
    }
}

#[tokio::test]
async fn pages_until_short_page_and_sets_latch() {
    let h = harness(FakeSource::with_records(250));

    let outcome = h.pipeline.run(1).await.expect("run should succeed");

    assert_eq!(
        outcome,
        RunOutcome::Completed {
            pages_fetched: 3,
            records_merged: 250
        }
    );
    assert_eq!(h.source.calls(), vec![(1, 100), (2, 100), (3, 100)]);
    assert_eq!(h.products.len(), 250);
    assert_eq!(h.products.writes(), 500, "two attributes per record");
    assert!(import_finished(h.settings.as_ref()).await.unwrap());

    let last = h.products.get("sku-249").unwrap();
    assert_eq!(last.total_reviews, Some(249));
    assert_eq!(last.product_score, Some(FakeSource::record(249).score));
}

#[tokio::test]
async fn empty_first_page_merges_nothing() {
    let h = harness(FakeSource::with_records(0));

    let outcome = h.pipeline.run(1).await.unwrap();

    assert_eq!(
        outcome,
        RunOutcome::Empty {
            pages_fetched: 1,
            records_merged: 0
        }
    );
    assert_eq!(h.source.calls().len(), 1);
    assert!(h.products.is_empty());
    assert_eq!(h.settings.value(SettingKey::FinishedRecentImport), None);
}

#[tokio::test]
async fn exact_multiple_ends_on_empty_page_without_latch() {
    let h = harness(FakeSource::with_records(200));

    let outcome = h.pipeline.run(1).await.unwrap();

    assert_eq!(
        outcome,
        RunOutcome::Empty {
            pages_fetched: 3,
            records_merged: 200
        }
    );
    assert_eq!(h.products.len(), 200);
    assert!(!import_finished(h.settings.as_ref()).await.unwrap());
}

#[tokio::test]
async fn rerun_leaves_identical_state() {
    let h = harness(FakeSource::with_records(130));

    h.pipeline.run(1).await.unwrap();
    let first = h.products.snapshot();
    h.pipeline.run(1).await.unwrap();

    assert_eq!(h.products.snapshot(), first);
}

#[tokio::test]
async fn failure_keeps_earlier_pages_and_leaves_latch_unset() {
    let h = harness(FakeSource::failing_on(250, 2));

    let err = h.pipeline.run(1).await.unwrap_err();

    assert!(matches!(err, ImportError::Provider(_)), "got {err:?}");
    assert_eq!(h.products.len(), 100, "page 1 is not rolled back");
    assert!(!import_finished(h.settings.as_ref()).await.unwrap());
    assert!(!h.pipeline.is_running(), "lease released after failure");
}

#[tokio::test]
async fn start_page_skips_earlier_pages() {
    let h = harness(FakeSource::with_records(250));

    let outcome = h.pipeline.run(3).await.unwrap();

    assert_eq!(
        outcome,
        RunOutcome::Completed {
            pages_fetched: 1,
            records_merged: 50
        }
    );
    assert_eq!(h.source.calls(), vec![(3, 100)]);
    assert!(h.products.get("sku-0").is_none());
}

#[tokio::test]
async fn zero_start_page_is_rejected_before_fetching() {
    let h = harness(FakeSource::with_records(10));

    let err = h.pipeline.run(0).await.unwrap_err();

    assert!(matches!(err, ImportError::InvalidCursor(_)));
    assert!(h.source.calls().is_empty());
}

#[tokio::test]
async fn missing_credentials_fail_before_fetching() {
    let h = harness_with_settings(FakeSource::with_records(10), MemoryConfigStore::default());

    let err = h.pipeline.run(1).await.unwrap_err();

    assert!(matches!(err, ImportError::MissingCredentials));
    assert_eq!(h.connector.connections(), 0);
    assert!(h.source.calls().is_empty());
}

#[tokio::test]
async fn connects_with_trimmed_stored_credentials() {
    let h = harness_with_settings(
        FakeSource::with_records(1),
        MemoryConfigStore::with_credentials(" app-9 ", "tok\n"),
    );

    h.pipeline.run(1).await.unwrap();

    let creds = h.connector.last_credentials().unwrap();
    assert_eq!(creds.app_key, "app-9");
    assert_eq!(creds.secret, "tok");
}

#[tokio::test]
async fn blank_keys_are_skipped_but_count_toward_page_size() {
    let h = harness(FakeSource::with_blank_keys(100));

    let outcome = h.pipeline.run(1).await.unwrap();

    // A full page of blank keys still requests the next page.
    assert_eq!(
        outcome,
        RunOutcome::Empty {
            pages_fetched: 2,
            records_merged: 0
        }
    );
    assert!(h.products.is_empty());
}

#[tokio::test]
async fn concurrent_run_is_turned_away() {
    let gate = Arc::new(tokio::sync::Notify::new());
    let h = Arc::new(harness(FakeSource::gated(5, Arc::clone(&gate))));

    let first = {
        let h = Arc::clone(&h);
        tokio::spawn(async move { h.pipeline.run(1).await })
    };
    while h.source.calls().is_empty() {
        tokio::task::yield_now().await;
    }

    let err = h.pipeline.run(1).await.unwrap_err();
    assert!(matches!(err, ImportError::AlreadyRunning));
    assert_eq!(h.source.calls().len(), 1, "second run fetched nothing");

    gate.notify_one();
    let outcome = first.await.unwrap().unwrap();
    assert!(matches!(outcome, RunOutcome::Completed { .. }));
    assert!(!h.pipeline.is_running());
}

#[tokio::test]
async fn tracked_run_records_success() {
    let h = harness(FakeSource::with_records(120));
    let ledger = MemoryRunLedger::default();

    run_tracked(&h.pipeline, &ledger, TriggerSource::Cli, 1)
        .await
        .unwrap();

    let entries = ledger.entries();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].source, TriggerSource::Cli);
    assert_eq!(
        entries[0].status,
        LedgerStatus::Succeeded {
            pages_fetched: 2,
            records_merged: 120
        }
    );
}

#[tokio::test]
async fn tracked_run_counts_full_pages_before_empty_page() {
    let h = harness(FakeSource::with_records(200));
    let ledger = MemoryRunLedger::default();

    run_tracked(&h.pipeline, &ledger, TriggerSource::Schedule, 1)
        .await
        .unwrap();

    assert_eq!(h.products.len(), 200);
    assert_eq!(
        ledger.entries()[0].status,
        LedgerStatus::Succeeded {
            pages_fetched: 3,
            records_merged: 200
        }
    );
}

#[tokio::test]
async fn tracked_run_records_failure_message() {
    let h = harness(FakeSource::failing_on(250, 1));
    let ledger = MemoryRunLedger::default();

    let err = run_tracked(&h.pipeline, &ledger, TriggerSource::Schedule, 1)
        .await
        .unwrap_err();

    let entries = ledger.entries();
    assert_eq!(entries.len(), 1);
    assert_eq!(
        entries[0].status,
        LedgerStatus::Failed {
            pages_fetched: 0,
            records_merged: 0,
            message: err.to_string()
        }
    );
}

#[tokio::test]
async fn tracked_failure_keeps_counts_of_merged_pages() {
    let h = harness(FakeSource::failing_on(250, 2));
    let ledger = MemoryRunLedger::default();

    run_tracked(&h.pipeline, &ledger, TriggerSource::Schedule, 1)
        .await
        .unwrap_err();

    assert_eq!(h.products.len(), 100);
    assert!(matches!(
        ledger.entries()[0].status,
        LedgerStatus::Failed {
            pages_fetched: 1,
            records_merged: 100,
            ..
        }
    ));
}

#[tokio::test]
async fn tracked_run_records_skip_when_busy() {
    let h = harness(FakeSource::with_records(10));
    let ledger = MemoryRunLedger::default();
    let _held = h.pipeline.try_lease().unwrap();

    let err = run_tracked(&h.pipeline, &ledger, TriggerSource::Manual, 1)
        .await
        .unwrap_err();

    assert!(matches!(err, ImportError::AlreadyRunning));
    let entries = ledger.entries();
    assert_eq!(entries.len(), 1);
    assert!(matches!(entries[0].status, LedgerStatus::Skipped(_)));
    assert!(h.source.calls().is_empty());
}
