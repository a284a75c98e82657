//! Import pipeline and schedule reconciliation for Yotpo bottomlines.
//!
//! [`ImportPipeline`] pages through the provider and merges each page into
//! the product store. [`ScheduleReconciler`] keeps the recurring trigger in
//! line with the stored frequency.

pub mod error;
pub mod pipeline;
pub mod reconcile;
pub mod source;
pub mod tracked;

pub use error::{ImportError, ScheduleError};
pub use pipeline::{ImportPipeline, RunLease, RunOutcome, RunProgress};
pub use reconcile::{plan, ScheduleReconciler, ScheduleStatus, TriggerAction};
pub use source::{RatingsConnector, RatingsSource, YotpoConnector};
pub use tracked::{import_job, run_tracked};
