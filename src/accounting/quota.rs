//! Quota Types and Registry
//!
//! Configured call limits per api key. Absent limits mean unlimited; a
//! configured limit of zero is malformed and rejected up front rather than
//! accepted and never triggering.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::error::AccountingError;

/// Which quota threshold was exceeded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QuotaKind {
    /// Absolute total cap
    #[serde(rename = "total")]
    Total,
    /// Calls within the last 60 seconds
    #[serde(rename = "calls_60s")]
    Calls60s,
    /// Calls within the last 24 hours
    #[serde(rename = "calls_24h")]
    Calls24h,
}

impl std::fmt::Display for QuotaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            QuotaKind::Total => "total",
            QuotaKind::Calls60s => "calls_60s",
            QuotaKind::Calls24h => "calls_24h",
        };
        f.write_str(name)
    }
}

/// Configured limits for one api key
///
/// There is no structural ordering requirement between the 60s and 24h
/// limits; each threshold triggers independently.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotaLimit {
    /// Max calls within any 60-second window, unset = unlimited
    pub calls_60s: Option<u32>,

    /// Max calls within any 24-hour window, unset = unlimited
    pub calls_24h: Option<u32>,

    /// Absolute cap on total recorded calls, unset = unlimited
    pub total_cap: Option<u64>,
}

impl QuotaLimit {
    /// Create a limit with every bound unset
    pub fn unlimited() -> Self {
        Self::default()
    }

    /// Whether no bound is configured
    pub fn is_unlimited(&self) -> bool {
        self.calls_60s.is_none() && self.calls_24h.is_none() && self.total_cap.is_none()
    }

    /// Validate the configured bounds
    ///
    /// # Errors
    ///
    /// Returns `InvalidLimit` if any configured bound is zero.
    pub fn validate(&self) -> Result<(), AccountingError> {
        if self.calls_60s == Some(0) {
            return Err(AccountingError::InvalidLimit { field: "calls_60s" });
        }
        if self.calls_24h == Some(0) {
            return Err(AccountingError::InvalidLimit { field: "calls_24h" });
        }
        if self.total_cap == Some(0) {
            return Err(AccountingError::InvalidLimit { field: "total_cap" });
        }
        Ok(())
    }
}

/// Per-key quota configuration store
///
/// Limits are keyed by the literal api key string; no wildcard or default key
/// exists.
#[derive(Debug, Clone, Default)]
pub struct QuotaRegistry {
    limits: HashMap<String, QuotaLimit>,
}

impl QuotaRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Install or replace limits for a key. Replacing is a full overwrite,
    /// not a merge.
    ///
    /// # Errors
    ///
    /// Returns `InvalidLimit` if the limit fails validation; the registry is
    /// left unchanged in that case.
    pub fn enable(&mut self, api_key: &str, limit: QuotaLimit) -> Result<(), AccountingError> {
        limit.validate()?;
        self.limits.insert(api_key.to_string(), limit);
        Ok(())
    }

    /// Remove limits for a key. Subsequent checks for that key always pass.
    pub fn disable(&mut self, api_key: &str) -> Option<QuotaLimit> {
        self.limits.remove(api_key)
    }

    /// Get the configured limit, absent result means unlimited.
    pub fn get(&self, api_key: &str) -> Option<&QuotaLimit> {
        self.limits.get(api_key)
    }

    /// All configured limits (snapshot capture).
    pub fn limits(&self) -> &HashMap<String, QuotaLimit> {
        &self.limits
    }

    /// Replace the entire contents (snapshot load).
    pub fn replace(&mut self, limits: HashMap<String, QuotaLimit>) {
        self.limits = limits;
    }

    /// Number of keys with configured limits.
    pub fn len(&self) -> usize {
        self.limits.len()
    }

    /// Whether no key has configured limits.
    pub fn is_empty(&self) -> bool {
        self.limits.is_empty()
    }
}
