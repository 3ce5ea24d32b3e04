#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::{
    sync::{Arc, Mutex, OnceLock, PoisonError},
    time::Duration,
};

use serde::{Deserialize, Serialize};

/// Default wall-clock budget for one batch.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
/// Default ceiling on package size, compressed or expanded.
pub const DEFAULT_MAX_PACKAGE_BYTES: u64 = 64 * 1024 * 1024;
/// Default tolerance for measurement-like comparisons.
pub const DEFAULT_TOLERANCE: f64 = 0.1;

/// Settings that shape how a batch is scored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringConfig {
    /// Reported for compatibility; rules are still all-or-nothing.
    enable_partial_scoring: bool,
    /// Tolerance for measurement-like comparisons.
    error_tolerance:        f64,
    /// Wall-clock budget for one batch, in seconds.
    timeout_secs:           u64,
    /// Maximum number of rules evaluated per batch, if capped.
    max_rules:              Option<usize>,
    /// Packages larger than this are refused.
    max_package_bytes:      u64,
    /// Log every verdict at INFO instead of DEBUG.
    detailed_logging:       bool,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            enable_partial_scoring: true,
            error_tolerance:        DEFAULT_TOLERANCE,
            timeout_secs:           DEFAULT_TIMEOUT_SECS,
            max_rules:              None,
            max_package_bytes:      DEFAULT_MAX_PACKAGE_BYTES,
            detailed_logging:       false,
        }
    }
}

impl ScoringConfig {
    /// Defaults overlaid with `DOCGRADE_*` environment variables. Values that
    /// fail to parse are ignored.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            enable_partial_scoring: read_env("DOCGRADE_PARTIAL_SCORING")
                .unwrap_or(defaults.enable_partial_scoring),
            error_tolerance:        read_env("DOCGRADE_TOLERANCE")
                .filter(|t: &f64| t.is_finite() && *t >= 0.0)
                .unwrap_or(defaults.error_tolerance),
            timeout_secs:           read_env("DOCGRADE_TIMEOUT_SECS")
                .unwrap_or(defaults.timeout_secs),
            max_rules:              read_env("DOCGRADE_MAX_RULES").or(defaults.max_rules),
            max_package_bytes:      read_env("DOCGRADE_MAX_PACKAGE_BYTES")
                .unwrap_or(defaults.max_package_bytes),
            detailed_logging:       read_env("DOCGRADE_DETAILED_LOGGING")
                .unwrap_or(defaults.detailed_logging),
        }
    }

    /// Returns whether partial scoring is reported as enabled.
    pub fn enable_partial_scoring(&self) -> bool {
        self.enable_partial_scoring
    }

    /// Returns the measurement tolerance.
    pub fn error_tolerance(&self) -> f64 {
        self.error_tolerance
    }

    /// Returns the batch time budget.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Returns the per-batch rule cap, if any.
    pub fn max_rules(&self) -> Option<usize> {
        self.max_rules
    }

    /// Returns the package size ceiling in bytes.
    pub fn max_package_bytes(&self) -> u64 {
        self.max_package_bytes
    }

    /// Returns whether every verdict is logged at INFO.
    pub fn detailed_logging(&self) -> bool {
        self.detailed_logging
    }

    /// Sets the batch time budget.
    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// Caps the number of rules evaluated per batch.
    pub fn with_max_rules(mut self, max_rules: Option<usize>) -> Self {
        self.max_rules = max_rules;
        self
    }

    /// Sets the package size ceiling.
    pub fn with_max_package_bytes(mut self, bytes: u64) -> Self {
        self.max_package_bytes = bytes;
        self
    }

    /// Sets the measurement tolerance.
    pub fn with_error_tolerance(mut self, tolerance: f64) -> Self {
        self.error_tolerance = tolerance;
        self
    }

    /// Toggles per-verdict INFO logging.
    pub fn with_detailed_logging(mut self, enabled: bool) -> Self {
        self.detailed_logging = enabled;
        self
    }
}

/// Global storage for the lazily constructed configuration.
static CONFIG_SLOT: OnceLock<Mutex<Option<Arc<ScoringConfig>>>> = OnceLock::new();

/// Returns the mutex guarding the global configuration slot.
fn slot() -> &'static Mutex<Option<Arc<ScoringConfig>>> {
    CONFIG_SLOT.get_or_init(|| Mutex::new(None))
}

/// Returns the active configuration, reading the environment on first use.
pub fn get() -> Arc<ScoringConfig> {
    let mut guard = slot().lock().unwrap_or_else(PoisonError::into_inner);
    if let Some(cfg) = guard.as_ref() {
        return Arc::clone(cfg);
    }
    let cfg = Arc::new(ScoringConfig::from_env());
    *guard = Some(Arc::clone(&cfg));
    cfg
}

/// Replaces the active configuration, e.g. after applying CLI flags.
pub fn set(cfg: ScoringConfig) {
    *slot().lock().unwrap_or_else(PoisonError::into_inner) = Some(Arc::new(cfg));
}

/// Parses an environment variable, returning `None` when it is missing or
/// does not parse.
fn read_env<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name)
        .ok()
        .and_then(|value| value.trim().parse::<T>().ok())
}
