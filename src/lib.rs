//! CallTally Accounting Library
//!
//! This library provides the call-accounting core for clients of rate-limited
//! remote APIs: recording per-key call events, aggregating them over sliding
//! time windows, enforcing configured quotas, and persisting usage across
//! process restarts.

pub mod accounting;
pub mod clock;
pub mod config;

pub use accounting::{
    AccountingError, AccountingTracker, AggregateCount, CallLedger, CallRecord, PersistenceError,
    QuotaKind, QuotaLimit, QuotaRegistry, UsageReport, Window, SNAPSHOT_VERSION,
};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::TrackerConfig;
