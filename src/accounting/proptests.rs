//! Property-Based Tests for Call Accounting
//!
//! This module contains property-based tests using proptest to verify
//! invariants hold for random inputs across the accounting implementation.
//!
//! # Test Strategies
//!
//! - **Window Monotonicity**: for any record sequence,
//!   last_60s <= last_24h <= total
//! - **Pruning**: eviction never changes any window count
//! - **Masking**: masked keys never leak the middle of the key
//!
//! # Running the Tests
//!
//! ```bash
//! cargo test --lib accounting::proptests
//! ```

use proptest::prelude::*;

use chrono::{DateTime, Duration, TimeZone, Utc};

use super::ledger::{CallLedger, CallRecord};
use super::summary::mask_key;

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
}

// Helper: Generate record age offsets in seconds, spanning well past 24h
fn arb_offsets() -> impl Strategy<Value = Vec<i64>> {
    prop::collection::vec(0i64..200_000, 0..64)
}

fn ledger_from_offsets(offsets: &[i64]) -> CallLedger {
    let mut sorted = offsets.to_vec();
    // Newest offsets are appended last; insertion order mirrors a monotonic
    // clock.
    sorted.sort_unstable_by(|a, b| b.cmp(a));

    let mut ledger = CallLedger::new();
    for secs in sorted {
        ledger.append(CallRecord::new(
            now() - Duration::seconds(secs),
            "KEY-1",
            "Get_Quote",
        ));
    }
    ledger
}

proptest! {
    /// Window counts are monotone: 60s <= 24h <= total.
    #[test]
    fn prop_window_counts_monotone(offsets in arb_offsets()) {
        let ledger = ledger_from_offsets(&offsets);
        let agg = ledger.count("KEY-1", None, now());

        prop_assert!(agg.last_60s <= agg.last_24h);
        prop_assert!(agg.last_24h <= agg.total);
        prop_assert_eq!(agg.total, offsets.len() as u64);
    }

    /// An operation-scoped count never exceeds the global count for the same
    /// key and window.
    #[test]
    fn prop_operation_count_bounded_by_global(offsets in arb_offsets()) {
        let ledger = ledger_from_offsets(&offsets);
        let scoped = ledger.count("KEY-1", Some("Get_Quote"), now());
        let global = ledger.count("KEY-1", None, now());

        prop_assert!(scoped.total <= global.total);
        prop_assert!(scoped.last_60s <= global.last_60s);
        prop_assert!(scoped.last_24h <= global.last_24h);
    }

    /// Pruning at the 24h cutoff never changes the 60s or 24h counts.
    #[test]
    fn prop_prune_preserves_window_counts(offsets in arb_offsets()) {
        let mut ledger = ledger_from_offsets(&offsets);
        let before = ledger.count("KEY-1", None, now());

        ledger.prune(now() - Duration::hours(24));
        let after = ledger.count("KEY-1", None, now());

        prop_assert_eq!(before.last_60s, after.last_60s);
        prop_assert_eq!(before.last_24h, after.last_24h);
        // Everything surviving the prune is inside the 24h window.
        prop_assert_eq!(after.total, after.last_24h);
    }

    /// Masking any key longer than the visible prefix + suffix yields a
    /// fixed-shape string that keeps only the edges.
    #[test]
    fn prop_mask_keeps_only_edges(key in "[A-Za-z0-9]{9,40}") {
        let masked = mask_key(&key);
        let chars: Vec<char> = key.chars().collect();
        let prefix: String = chars[..4].iter().collect();
        let suffix: String = chars[chars.len() - 4..].iter().collect();

        prop_assert_eq!(masked.chars().count(), 11);
        prop_assert_eq!(masked, format!("{}...{}", prefix, suffix));
    }
}
