//! Accounting Module Error Types
//!
//! This module defines all error types that can occur during accounting
//! operations.

use std::path::PathBuf;

use super::quota::QuotaKind;

/// Error types for accounting operations
#[derive(Debug, thiserror::Error)]
pub enum AccountingError {
    /// Recording attempted while the tracker is stopped
    #[error("Accounting is inactive; call start() before recording")]
    Inactive,

    /// A configured quota threshold was exceeded
    #[error("Out of quota ({quota_type}): {current}/{limit}")]
    OutOfQuota {
        /// Which threshold was exceeded
        quota_type: QuotaKind,
        /// Observed count at check time
        current: u64,
        /// Configured limit
        limit: u64,
    },

    /// Malformed quota configuration rejected at enable() time
    #[error("Invalid quota limit: {field} must be greater than zero")]
    InvalidLimit {
        /// Offending limit field
        field: &'static str,
    },

    /// Snapshot save/load failure
    #[error("Persistence error: {0}")]
    Persistence(#[from] PersistenceError),
}

/// Error types for snapshot persistence
#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    /// Snapshot file could not be read or written
    #[error("Snapshot I/O failure at {path:?}: {source}")]
    Io {
        /// Snapshot file path
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Snapshot document is not a valid snapshot
    #[error("Snapshot format error: {0}")]
    Format(String),

    /// Snapshot version is outside the supported range
    #[error("Unsupported snapshot version {found} (supported up to {supported})")]
    Version {
        /// Version tag found in the document
        found: u32,
        /// Highest version this build understands
        supported: u32,
    },
}
