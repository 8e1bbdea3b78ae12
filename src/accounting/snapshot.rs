//! Snapshot Persistence
//!
//! Versioned JSON snapshots of the ledger and quota registry. Reads validate
//! the whole document before any in-memory state is touched, so a failed load
//! can never partially apply. File I/O is synchronous by design; callers
//! needing responsiveness run save/load off the critical request path.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::error::PersistenceError;
use super::ledger::{CallLedger, CallRecord};
use super::quota::{QuotaLimit, QuotaRegistry};

/// Highest snapshot format version this build reads and the version it
/// writes.
pub const SNAPSHOT_VERSION: u32 = 1;

/// Durable point-in-time copy of ledger + quota state
///
/// Unknown fields in a newer document are ignored on load; missing required
/// fields are a format error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    /// Format version tag
    pub version: u32,

    /// Instant the snapshot was captured
    pub created_at: DateTime<Utc>,

    /// Full set of call records
    pub records: Vec<CallRecord>,

    /// Full quota registry contents
    pub quotas: HashMap<String, QuotaLimit>,
}

impl Snapshot {
    /// Capture the current ledger and registry contents.
    pub fn capture(ledger: &CallLedger, quotas: &QuotaRegistry, now: DateTime<Utc>) -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            created_at: now,
            records: ledger.records().to_vec(),
            quotas: quotas.limits().clone(),
        }
    }

    /// Collision-free file name embedding the capture instant.
    pub fn default_file_name(now: DateTime<Utc>) -> String {
        format!("calltally-{}.json", now.format("%Y%m%dT%H%M%S%3fZ"))
    }

    /// Write the snapshot to a file, creating parent directories as needed.
    ///
    /// # Errors
    ///
    /// Returns `PersistenceError::Io` on filesystem failure.
    pub fn write_to(&self, path: &Path) -> Result<(), PersistenceError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|source| PersistenceError::Io {
                    path: path.to_path_buf(),
                    source,
                })?;
            }
        }

        let body = serde_json::to_string_pretty(self)
            .map_err(|e| PersistenceError::Format(e.to_string()))?;

        fs::write(path, body).map_err(|source| PersistenceError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Read and validate a snapshot from a file.
    ///
    /// # Errors
    ///
    /// Returns `Io` if the file is missing or unreadable, `Format` if the
    /// document does not parse as a snapshot, and `Version` if the version
    /// tag is zero or newer than `SNAPSHOT_VERSION`.
    pub fn read_from(path: &Path) -> Result<Self, PersistenceError> {
        let content = fs::read_to_string(path).map_err(|source| PersistenceError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let snapshot: Snapshot =
            serde_json::from_str(&content).map_err(|e| PersistenceError::Format(e.to_string()))?;

        if snapshot.version == 0 || snapshot.version > SNAPSHOT_VERSION {
            return Err(PersistenceError::Version {
                found: snapshot.version,
                supported: SNAPSHOT_VERSION,
            });
        }

        Ok(snapshot)
    }
}
