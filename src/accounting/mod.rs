//! Call Accounting and Quota Enforcement Module
//!
//! This module provides per-key call accounting with sliding-window
//! aggregation, configurable quotas, and durable usage snapshots.
//!
//! # Features
//!
//! - Append-only call ledger counted over 60-second and 24-hour windows
//! - Per-key quota limits with fixed-priority violation reporting
//! - Atomic check-and-record for strict enforcement
//! - Versioned JSON snapshots so usage survives process restarts
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                   Accounting Tracker                         │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ┌─────────────┐  ┌──────────────┐  ┌─────────────┐        │
//! │  │ Call Ledger │  │ Quota        │  │ Clock       │        │
//! │  │ (windows)   │  │ Registry     │  │ (injected)  │        │
//! │  └─────────────┘  └──────────────┘  └─────────────┘        │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ┌─────────────────────────────────────────────────────┐   │
//! │  │        Snapshot Codec (versioned JSON on disk)       │   │
//! │  └─────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod error;
pub mod ledger;
pub mod quota;
pub mod snapshot;
pub mod summary;
pub mod tracker;

#[cfg(test)]
mod proptests;

pub use error::{AccountingError, PersistenceError};
pub use ledger::{AggregateCount, CallLedger, CallRecord, Window};
pub use quota::{QuotaKind, QuotaLimit, QuotaRegistry};
pub use snapshot::{Snapshot, SNAPSHOT_VERSION};
pub use summary::{KeyUsage, UsageReport};
pub use tracker::AccountingTracker;
