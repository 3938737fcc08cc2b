//! Engine configuration.
//!
//! Loaded from `$XDG_CONFIG_HOME/redline/config.toml` (falling back to
//! `~/.config/redline/config.toml`). Config errors are soft failures: a
//! missing or malformed file yields the defaults, with a warning — the
//! editor must come up regardless.
//!
//! All durations are integer milliseconds in the file.

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::retry::RetryPolicy;

/// Per-step toggles and thresholds for the recalculation service.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RecalculationConfig {
    /// Shift surviving suggestions by their computed delta.
    pub enable_position_updates: bool,
    /// Drop suggestions whose anchors overlap a changed region.
    pub enable_invalidation: bool,
    /// Ask the analysis service for fresh suggestions on changed text.
    pub enable_new_suggestion_requests: bool,
    /// Changed ranges shorter than this never trigger re-analysis.
    pub min_changed_range_length: usize,
    /// Changed ranges longer than this are left for the next full review.
    pub max_changed_range_length: usize,
    /// How long to wait for a `review_complete` notification.
    pub review_timeout_ms: u64,
    /// Documents at or above this many characters diff line-wise.
    pub line_diff_threshold: usize,
}

impl Default for RecalculationConfig {
    fn default() -> Self {
        Self {
            enable_position_updates: true,
            enable_invalidation: true,
            enable_new_suggestion_requests: true,
            min_changed_range_length: 3,
            max_changed_range_length: 2_000,
            review_timeout_ms: 30_000,
            line_diff_threshold: redline_core::diff::DiffCalculator::DEFAULT_LINE_THRESHOLD,
        }
    }
}

impl RecalculationConfig {
    pub fn review_timeout(&self) -> Duration {
        Duration::from_millis(self.review_timeout_ms)
    }
}

/// Sizing for the delta-computation cache.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub capacity: usize,
    pub ttl_ms: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { capacity: 50, ttl_ms: 180_000 }
    }
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_millis(self.ttl_ms)
    }
}

/// Debounce, cosmetic delays, and outcome caching for mode transitions.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TransitionConfig {
    /// Rapid-toggle window: only the last request inside it executes.
    pub debounce_ms: u64,
    /// Cosmetic delay for the Review→Edit direction (no recalculation).
    pub edit_return_delay_ms: u64,
    pub cache_capacity: usize,
    pub cache_ttl_ms: u64,
}

impl Default for TransitionConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 250,
            edit_return_delay_ms: 150,
            cache_capacity: 10,
            cache_ttl_ms: 300_000,
        }
    }
}

impl TransitionConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn edit_return_delay(&self) -> Duration {
        Duration::from_millis(self.edit_return_delay_ms)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_millis(self.cache_ttl_ms)
    }
}

/// Backoff bounds for retryable remote failures.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub base_ms: u64,
    pub max_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        let policy = RetryPolicy::default();
        Self {
            max_attempts: policy.max_attempts,
            base_ms: policy.base_ms,
            max_ms: policy.max_ms,
        }
    }
}

impl RetryConfig {
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts,
            base_ms: self.base_ms,
            max_ms: self.max_ms,
            ..RetryPolicy::default()
        }
    }
}

/// Active-suggestion cursor timing.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ActiveConfig {
    /// UI feedback window between resolving a suggestion and advancing.
    pub auto_advance_delay_ms: u64,
}

impl Default for ActiveConfig {
    fn default() -> Self {
        Self { auto_advance_delay_ms: 300 }
    }
}

impl ActiveConfig {
    pub fn auto_advance_delay(&self) -> Duration {
        Duration::from_millis(self.auto_advance_delay_ms)
    }
}

/// Aggregated engine configuration; one instance per editor session.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub recalculation: RecalculationConfig,
    pub cache: CacheConfig,
    pub transition: TransitionConfig,
    pub retry: RetryConfig,
    pub active: ActiveConfig,
}

impl EngineConfig {
    /// Parses a config file body; unknown keys are ignored, missing keys
    /// take their defaults.
    pub fn from_toml_str(raw: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(raw)
    }

    /// Loads from the default path, falling back to defaults on any
    /// failure. Never panics — config problems must not block startup.
    pub fn load_or_default() -> Self {
        let path = config_path();
        let raw = match std::fs::read_to_string(&path) {
            Ok(s) => s,
            Err(_) => return Self::default(),
        };
        match Self::from_toml_str(&raw) {
            Ok(cfg) => cfg,
            Err(e) => {
                tracing::warn!(?path, error = %e, "config parse error, using defaults");
                Self::default()
            }
        }
    }
}

/// Returns the path to the redline config file.
///
/// Prefers `$XDG_CONFIG_HOME/redline/config.toml`; falls back to
/// `~/.config/redline/config.toml` when the env var is absent.
pub fn config_path() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .ok()
        .map(PathBuf::from)
        .or_else(|| {
            std::env::var("HOME")
                .ok()
                .map(|h| PathBuf::from(h).join(".config"))
        })
        .unwrap_or_else(|| PathBuf::from(".config"));
    base.join("redline").join("config.toml")
}
