//! Call Ledger
//!
//! Append-only record of individual call events, queryable by time window,
//! api key, and operation name. All counting in the tracker is backed by this
//! structure; pruning only evicts records that can no longer influence any
//! window.

use std::collections::BTreeSet;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// A single recorded call event
///
/// Created exactly once per recorded call and never mutated. The api key is
/// stored in full; masking happens only at display time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallRecord {
    /// Instant the call was recorded
    pub timestamp: DateTime<Utc>,

    /// Api key the call was made with
    pub api_key: String,

    /// Canonical operation name, e.g. "Get_Quote"
    pub operation: String,
}

impl CallRecord {
    /// Create a new call record
    pub fn new(
        timestamp: DateTime<Utc>,
        api_key: impl Into<String>,
        operation: impl Into<String>,
    ) -> Self {
        Self {
            timestamp,
            api_key: api_key.into(),
            operation: operation.into(),
        }
    }
}

/// Counting window relative to "now"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Window {
    /// Every record in the ledger
    All,
    /// The last 60 seconds
    Last60s,
    /// The last 24 hours
    Last24h,
}

impl Window {
    /// Earliest timestamp still inside this window, `None` for `All`.
    ///
    /// A record stamped exactly at the cutoff counts as inside the window.
    pub fn cutoff(self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self {
            Window::All => None,
            Window::Last60s => Some(now - Duration::seconds(60)),
            Window::Last24h => Some(now - Duration::hours(24)),
        }
    }
}

/// Aggregated counts for one key (and optionally one operation)
///
/// Derived on demand, never stored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateCount {
    /// All records currently in the ledger
    pub total: u64,

    /// Records within the last 60 seconds
    pub last_60s: u64,

    /// Records within the last 24 hours
    pub last_24h: u64,
}

/// Append-only ledger of call records
///
/// Inserts preserve timestamp order because the clock is monotonic at the
/// point of insertion; no re-sorting happens on write.
#[derive(Debug, Clone, Default)]
pub struct CallLedger {
    records: Vec<CallRecord>,
}

impl CallLedger {
    /// Create an empty ledger
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a record. O(1) amortized.
    pub fn append(&mut self, record: CallRecord) {
        self.records.push(record);
    }

    /// Count records for a key within one window.
    ///
    /// When `operation` is given, only matching records count. A record at
    /// exactly `now - window` is inside the window.
    pub fn count_window(
        &self,
        api_key: &str,
        operation: Option<&str>,
        window: Window,
        now: DateTime<Utc>,
    ) -> u64 {
        let cutoff = window.cutoff(now);
        self.records
            .iter()
            .filter(|r| r.api_key == api_key)
            .filter(|r| operation.map_or(true, |op| r.operation == op))
            .filter(|r| cutoff.map_or(true, |c| r.timestamp >= c))
            .count() as u64
    }

    /// Aggregate counts over all three windows for a key.
    ///
    /// Counting with zero records for a key returns an all-zero aggregate.
    pub fn count(
        &self,
        api_key: &str,
        operation: Option<&str>,
        now: DateTime<Utc>,
    ) -> AggregateCount {
        AggregateCount {
            total: self.count_window(api_key, operation, Window::All, now),
            last_60s: self.count_window(api_key, operation, Window::Last60s, now),
            last_24h: self.count_window(api_key, operation, Window::Last24h, now),
        }
    }

    /// Remove records strictly older than the cutoff. Returns how many were
    /// evicted.
    ///
    /// Callers pass `now - 24h` (the longest window), so a record still inside
    /// any active window is never removed.
    pub fn prune(&mut self, cutoff: DateTime<Utc>) -> usize {
        let before = self.records.len();
        self.records.retain(|r| r.timestamp >= cutoff);
        before - self.records.len()
    }

    /// Distinct api keys present in the ledger, sorted.
    pub fn api_keys(&self) -> Vec<String> {
        self.records
            .iter()
            .map(|r| r.api_key.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Distinct operation names ever recorded for a key, sorted.
    pub fn distinct_operations(&self, api_key: &str) -> Vec<String> {
        self.records
            .iter()
            .filter(|r| r.api_key == api_key)
            .map(|r| r.operation.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Clear ledger entries, all or scoped to one key.
    pub fn reset(&mut self, api_key: Option<&str>) {
        match api_key {
            Some(key) => self.records.retain(|r| r.api_key != key),
            None => self.records.clear(),
        }
    }

    /// All records, in insertion order.
    pub fn records(&self) -> &[CallRecord] {
        &self.records
    }

    /// Replace the entire contents (snapshot load).
    pub fn replace(&mut self, records: Vec<CallRecord>) {
        self.records = records;
    }

    /// Number of records currently held.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the ledger holds no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    fn ledger_with(offsets_secs: &[i64]) -> CallLedger {
        let mut ledger = CallLedger::new();
        for &secs in offsets_secs {
            ledger.append(CallRecord::new(
                t0() - Duration::seconds(secs),
                "KEY-1",
                "Get_Quote",
            ));
        }
        ledger
    }

    #[test]
    fn test_empty_ledger_counts_zero() {
        let ledger = CallLedger::new();
        let agg = ledger.count("KEY-1", None, t0());
        assert_eq!(agg, AggregateCount::default());
    }

    #[test]
    fn test_unknown_key_counts_zero() {
        let ledger = ledger_with(&[1, 2, 3]);
        let agg = ledger.count("KEY-OTHER", None, t0());
        assert_eq!(agg.total, 0);
    }

    #[test]
    fn test_window_counts() {
        // 10s and 30s ago are in all windows; 2h ago only in 24h and all;
        // 30h ago only in all.
        let ledger = ledger_with(&[10, 30, 2 * 3600, 30 * 3600]);
        let agg = ledger.count("KEY-1", None, t0());

        assert_eq!(agg.last_60s, 2);
        assert_eq!(agg.last_24h, 3);
        assert_eq!(agg.total, 4);
    }

    #[test]
    fn test_boundary_record_counts_inside_window() {
        // Exactly 60 seconds old: still inside the 60s window.
        let ledger = ledger_with(&[60]);
        assert_eq!(
            ledger.count_window("KEY-1", None, Window::Last60s, t0()),
            1
        );

        // One second past the boundary: outside.
        let ledger = ledger_with(&[61]);
        assert_eq!(
            ledger.count_window("KEY-1", None, Window::Last60s, t0()),
            0
        );

        // Exactly 24 hours old: still inside the 24h window.
        let ledger = ledger_with(&[24 * 3600]);
        assert_eq!(
            ledger.count_window("KEY-1", None, Window::Last24h, t0()),
            1
        );
    }

    #[test]
    fn test_operation_filter() {
        let mut ledger = ledger_with(&[5, 15]);
        ledger.append(CallRecord::new(
            t0() - Duration::seconds(25),
            "KEY-1",
            "List_Exchange",
        ));

        let quotes = ledger.count("KEY-1", Some("Get_Quote"), t0());
        let exchanges = ledger.count("KEY-1", Some("List_Exchange"), t0());
        let global = ledger.count("KEY-1", None, t0());

        assert_eq!(quotes.total, 2);
        assert_eq!(exchanges.total, 1);
        assert_eq!(global.total, 3);
        // An operation-specific count never exceeds the global count.
        assert!(quotes.last_60s <= global.last_60s);
        assert!(exchanges.last_24h <= global.last_24h);
    }

    #[test]
    fn test_old_record_not_counted_before_prune() {
        // Physically present until prune runs, but outside every window.
        let ledger = ledger_with(&[25 * 3600]);
        let agg = ledger.count("KEY-1", None, t0());

        assert_eq!(ledger.len(), 1);
        assert_eq!(agg.last_60s, 0);
        assert_eq!(agg.last_24h, 0);
        assert_eq!(agg.total, 1);
    }

    #[test]
    fn test_prune_evicts_only_expired() {
        let mut ledger = ledger_with(&[10, 23 * 3600, 25 * 3600, 48 * 3600]);
        let removed = ledger.prune(t0() - Duration::hours(24));

        assert_eq!(removed, 2);
        assert_eq!(ledger.len(), 2);
        assert_eq!(ledger.count("KEY-1", None, t0()).last_24h, 2);
    }

    #[test]
    fn test_prune_keeps_boundary_record() {
        let mut ledger = ledger_with(&[24 * 3600]);
        let removed = ledger.prune(t0() - Duration::hours(24));

        assert_eq!(removed, 0);
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn test_reset_scoped_to_key() {
        let mut ledger = ledger_with(&[1, 2]);
        ledger.append(CallRecord::new(t0(), "KEY-2", "Get_Quote"));

        ledger.reset(Some("KEY-1"));

        assert_eq!(ledger.count("KEY-1", None, t0()).total, 0);
        assert_eq!(ledger.count("KEY-2", None, t0()).total, 1);
    }

    #[test]
    fn test_reset_all() {
        let mut ledger = ledger_with(&[1, 2]);
        ledger.reset(None);
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_distinct_operations_sorted() {
        let mut ledger = CallLedger::new();
        ledger.append(CallRecord::new(t0(), "KEY-1", "List_Exchange"));
        ledger.append(CallRecord::new(t0(), "KEY-1", "Get_Quote"));
        ledger.append(CallRecord::new(t0(), "KEY-1", "Get_Quote"));
        ledger.append(CallRecord::new(t0(), "KEY-2", "Get_Symbol"));

        assert_eq!(
            ledger.distinct_operations("KEY-1"),
            vec!["Get_Quote".to_string(), "List_Exchange".to_string()]
        );
        assert_eq!(ledger.api_keys(), vec!["KEY-1".to_string(), "KEY-2".to_string()]);
    }

    #[test]
    fn test_record_serialization_roundtrip() {
        let record = CallRecord::new(t0(), "KEY-1", "Get_Quote");
        let json = serde_json::to_string(&record).unwrap();
        let parsed: CallRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(record, parsed);
    }
}
