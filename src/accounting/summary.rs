//! Usage Reporting
//!
//! Structured summaries of recorded usage for one key or all tracked keys.
//! Api keys are masked for display; all internal computation uses the
//! unmasked key.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ledger::AggregateCount;

/// Visible prefix/suffix length when masking an api key
const MASK_VISIBLE: usize = 4;

/// Mask an api key for display.
///
/// Shows the first and last four characters with the middle elided. Keys too
/// short to leave anything worth hiding are fully redacted.
pub fn mask_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= MASK_VISIBLE * 2 {
        "*".repeat(chars.len())
    } else {
        let prefix: String = chars[..MASK_VISIBLE].iter().collect();
        let suffix: String = chars[chars.len() - MASK_VISIBLE..].iter().collect();
        format!("{}...{}", prefix, suffix)
    }
}

/// Usage for a single api key
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyUsage {
    /// Api key, masked for display
    pub api_key: String,

    /// Global counts across all operations
    pub totals: AggregateCount,

    /// Per-operation counts for every operation ever recorded for this key
    pub operations: HashMap<String, AggregateCount>,
}

/// Structured usage report for one key or all tracked keys
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageReport {
    /// Instant the report was generated
    pub generated_at: DateTime<Utc>,

    /// Per-key usage, ordered by (unmasked) key
    pub keys: Vec<KeyUsage>,
}

impl UsageReport {
    /// Format as a human-readable string.
    pub fn format(&self) -> String {
        let mut output = format!(
            "Usage report generated at {}\n",
            self.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
        );

        if self.keys.is_empty() {
            output.push_str("(no recorded calls)\n");
            return output;
        }

        for key in &self.keys {
            output.push_str(&format!(
                "{}: total={} last_60s={} last_24h={}\n",
                key.api_key, key.totals.total, key.totals.last_60s, key.totals.last_24h
            ));

            let mut operations: Vec<_> = key.operations.iter().collect();
            operations.sort_by(|a, b| a.0.cmp(b.0));
            for (operation, counts) in operations {
                output.push_str(&format!(
                    "  {}: total={} last_60s={} last_24h={}\n",
                    operation, counts.total, counts.last_60s, counts.last_24h
                ));
            }
        }

        output
    }
}
