//! Accounting Tracker
//!
//! Central façade for call accounting and quota enforcement. One tracker owns
//! one ledger, one quota registry, and one clock; the ledger + registry pair
//! sits behind a single lock so every operation observes a consistent
//! snapshot.
//!
//! `check_quota` followed by `record_call` is NOT atomic as a pair: two
//! callers racing through that sequence for the same key may exceed quota by
//! one. Callers requiring strict enforcement use `record_if_allowed`, which
//! runs the check and the append under one lock acquisition.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tokio::sync::RwLock;

use crate::clock::{Clock, SystemClock};
use crate::config::TrackerConfig;

use super::error::AccountingError;
use super::ledger::{AggregateCount, CallLedger, CallRecord};
use super::quota::{QuotaKind, QuotaLimit, QuotaRegistry};
use super::snapshot::Snapshot;
use super::summary::{mask_key, KeyUsage, UsageReport};

/// Process-wide accounting state guarded as a unit
#[derive(Debug, Default)]
struct TrackerState {
    /// Whether record_call accepts new entries
    running: bool,

    /// Ledger backing all counting
    ledger: CallLedger,

    /// Configured limits
    quotas: QuotaRegistry,
}

impl TrackerState {
    /// Compare current counts against the configured limits for a key.
    ///
    /// Thresholds are evaluated in fixed priority order: total, then
    /// calls_60s, then calls_24h; the first exceeded threshold is reported.
    /// A threshold is exceeded when current >= limit, so the check admitting
    /// a call past the limit fails. No configured limit always passes.
    fn evaluate_quota(
        &self,
        api_key: &str,
        operation: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<(), AccountingError> {
        let Some(limit) = self.quotas.get(api_key) else {
            return Ok(());
        };
        if limit.is_unlimited() {
            return Ok(());
        }

        let counts = self.ledger.count(api_key, operation, now);

        if let Some(cap) = limit.total_cap {
            if counts.total >= cap {
                return Err(AccountingError::OutOfQuota {
                    quota_type: QuotaKind::Total,
                    current: counts.total,
                    limit: cap,
                });
            }
        }
        if let Some(cap) = limit.calls_60s {
            if counts.last_60s >= cap as u64 {
                return Err(AccountingError::OutOfQuota {
                    quota_type: QuotaKind::Calls60s,
                    current: counts.last_60s,
                    limit: cap as u64,
                });
            }
        }
        if let Some(cap) = limit.calls_24h {
            if counts.last_24h >= cap as u64 {
                return Err(AccountingError::OutOfQuota {
                    quota_type: QuotaKind::Calls24h,
                    current: counts.last_24h,
                    limit: cap as u64,
                });
            }
        }

        Ok(())
    }

    /// Build the usage entry for one key.
    fn key_usage(&self, api_key: &str, now: DateTime<Utc>) -> KeyUsage {
        let totals = self.ledger.count(api_key, None, now);
        let operations = self
            .ledger
            .distinct_operations(api_key)
            .into_iter()
            .map(|operation| {
                let counts = self.ledger.count(api_key, Some(&operation), now);
                (operation, counts)
            })
            .collect();

        KeyUsage {
            api_key: mask_key(api_key),
            totals,
            operations,
        }
    }
}

/// Call accounting and quota enforcement façade
///
/// An owned object constructed by the client session and passed into the
/// request layer; never an ambient singleton. Cloning shares the underlying
/// state, so a fresh tracker per test isolates fully.
#[derive(Debug, Clone)]
pub struct AccountingTracker {
    config: TrackerConfig,
    clock: Arc<dyn Clock>,
    state: Arc<RwLock<TrackerState>>,
}

impl AccountingTracker {
    /// Create a tracker with the system clock. The tracker starts stopped;
    /// call `start()` before recording.
    pub fn new(config: TrackerConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Create a tracker with an injected clock (for deterministic tests).
    pub fn with_clock(config: TrackerConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            config,
            clock,
            state: Arc::new(RwLock::new(TrackerState::default())),
        }
    }

    /// Create a tracker with default configuration.
    pub fn default_config() -> Self {
        Self::new(TrackerConfig::default())
    }

    /// Begin accepting `record_call` entries.
    pub async fn start(&self) {
        self.state.write().await.running = true;
        tracing::debug!("Accounting tracker started");
    }

    /// Freeze further recording. Queryable state stays intact.
    pub async fn stop(&self) {
        self.state.write().await.running = false;
        tracing::debug!("Accounting tracker stopped");
    }

    /// Whether the tracker currently accepts recordings.
    pub async fn is_running(&self) -> bool {
        self.state.read().await.running
    }

    /// Record a completed call at the current time.
    ///
    /// Recording is never blocked by quota; quota checking is a separate,
    /// explicit step so callers choose pre-check or post-check policies.
    ///
    /// # Errors
    ///
    /// Returns `Inactive` if the tracker is stopped; the call is rejected,
    /// not silently dropped.
    pub async fn record_call(
        &self,
        api_key: &str,
        operation: &str,
    ) -> Result<(), AccountingError> {
        let now = self.clock.now();
        let mut state = self.state.write().await;
        if !state.running {
            return Err(AccountingError::Inactive);
        }

        state
            .ledger
            .append(CallRecord::new(now, api_key, operation));

        if self.config.diagnostics {
            tracing::debug!("Recorded {} for key {}", operation, mask_key(api_key));
        }
        Ok(())
    }

    /// Check configured quotas for a key (and optionally one operation)
    /// without recording anything.
    ///
    /// # Errors
    ///
    /// Returns `OutOfQuota` naming the first exceeded threshold in priority
    /// order: total, calls_60s, calls_24h.
    pub async fn check_quota(
        &self,
        api_key: &str,
        operation: Option<&str>,
    ) -> Result<(), AccountingError> {
        let now = self.clock.now();
        let state = self.state.read().await;
        let result = state.evaluate_quota(api_key, operation, now);

        if self.config.diagnostics {
            if let Err(ref err) = result {
                tracing::debug!("Quota check failed for key {}: {}", mask_key(api_key), err);
            }
        }
        result
    }

    /// Atomically check quota and record the call under one lock
    /// acquisition.
    ///
    /// This is the strict-enforcement alternative to the non-atomic
    /// `check_quota` + `record_call` pair.
    ///
    /// # Errors
    ///
    /// Returns `Inactive` if the tracker is stopped, or `OutOfQuota` if a
    /// threshold is exceeded; nothing is recorded on error.
    pub async fn record_if_allowed(
        &self,
        api_key: &str,
        operation: &str,
    ) -> Result<(), AccountingError> {
        let now = self.clock.now();
        let mut state = self.state.write().await;
        if !state.running {
            return Err(AccountingError::Inactive);
        }

        // Quotas are per-key; the check counts every operation for the key.
        state.evaluate_quota(api_key, None, now)?;
        state
            .ledger
            .append(CallRecord::new(now, api_key, operation));

        if self.config.diagnostics {
            tracing::debug!(
                "Recorded {} for key {} (quota ok)",
                operation,
                mask_key(api_key)
            );
        }
        Ok(())
    }

    /// Aggregate counts for a key, optionally scoped to one operation.
    pub async fn count(&self, api_key: &str, operation: Option<&str>) -> AggregateCount {
        let now = self.clock.now();
        self.state.read().await.ledger.count(api_key, operation, now)
    }

    /// Build a usage report for one key or all tracked keys.
    ///
    /// "Tracked" means present in the ledger; entries are ordered by key and
    /// carry masked keys plus a per-operation breakdown.
    pub async fn summary(&self, api_key: Option<&str>) -> UsageReport {
        let now = self.clock.now();
        let state = self.state.read().await;

        let keys: Vec<String> = match api_key {
            Some(key) => vec![key.to_string()],
            None => state.ledger.api_keys(),
        };

        UsageReport {
            generated_at: now,
            keys: keys
                .iter()
                .map(|key| state.key_usage(key, now))
                .collect(),
        }
    }

    /// Clear ledger entries, all or scoped to one key. Configured quotas
    /// survive a reset.
    pub async fn reset(&self, api_key: Option<&str>) {
        self.state.write().await.ledger.reset(api_key);
    }

    /// Evict records older than the longest window (24 hours). Returns how
    /// many were removed. Safe to call at any time.
    pub async fn prune(&self) -> usize {
        let cutoff = self.clock.now() - Duration::hours(24);
        let removed = self.state.write().await.ledger.prune(cutoff);
        if removed > 0 {
            tracing::debug!("Pruned {} expired call records", removed);
        }
        removed
    }

    /// Number of records currently held in the ledger.
    pub async fn ledger_len(&self) -> usize {
        self.state.read().await.ledger.len()
    }

    /// Install or replace limits for a key (full overwrite).
    ///
    /// # Errors
    ///
    /// Returns `InvalidLimit` for malformed limits; nothing is installed.
    pub async fn enable_quota(
        &self,
        api_key: &str,
        limit: QuotaLimit,
    ) -> Result<(), AccountingError> {
        self.state.write().await.quotas.enable(api_key, limit)
    }

    /// Remove limits for a key; subsequent checks always pass.
    pub async fn disable_quota(&self, api_key: &str) -> Option<QuotaLimit> {
        self.state.write().await.quotas.disable(api_key)
    }

    /// Get the configured limit for a key, `None` meaning unlimited.
    pub async fn quota(&self, api_key: &str) -> Option<QuotaLimit> {
        self.state.read().await.quotas.get(api_key).copied()
    }

    /// Serialize ledger + registry to a snapshot file.
    ///
    /// With no path, writes `<snapshot_dir>/calltally-<timestamp>.json`.
    /// Returns the written path. The file write happens outside the lock.
    ///
    /// # Errors
    ///
    /// Returns `Persistence` on I/O or serialization failure.
    pub async fn save(&self, path: Option<&Path>) -> Result<PathBuf, AccountingError> {
        let now = self.clock.now();
        let snapshot = {
            let state = self.state.read().await;
            Snapshot::capture(&state.ledger, &state.quotas, now)
        };

        let path = match path {
            Some(p) => p.to_path_buf(),
            None => self
                .config
                .snapshot_dir
                .join(Snapshot::default_file_name(now)),
        };

        snapshot.write_to(&path)?;
        tracing::info!(
            "Saved usage snapshot to {:?} ({} records)",
            path,
            snapshot.records.len()
        );
        Ok(path)
    }

    /// Load a snapshot, atomically replacing the ledger and quota registry.
    ///
    /// The document is read and validated in full before the write lock is
    /// taken, so a failed load leaves in-memory state untouched and a retried
    /// load cannot double-count.
    ///
    /// # Errors
    ///
    /// Returns `Persistence` if the file is missing, unreadable, malformed,
    /// or carries an unsupported version.
    pub async fn load(&self, path: &Path) -> Result<(), AccountingError> {
        let snapshot = Snapshot::read_from(path)?;

        let mut state = self.state.write().await;
        state.ledger.replace(snapshot.records);
        state.quotas.replace(snapshot.quotas);

        tracing::info!(
            "Loaded usage snapshot from {:?} ({} records, {} quota entries)",
            path,
            state.ledger.len(),
            state.quotas.len()
        );
        Ok(())
    }
}
