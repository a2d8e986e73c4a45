//! Runtime configuration.
//!
//! Every field has a default, so an empty JSON object is a valid configuration.

use crate::oracle::search::MAX_WINDOW_DAYS;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Upper bound for `cache_ttl_secs`: one hundred 366-day years.
pub const MAX_CACHE_TTL_SECS: u64 = 100 * 366 * 86_400;

/// How many day records a yearly series contains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DayCount {
    /// Always 365 days from January 1st; December 31st of leap years is dropped.
    #[default]
    Fixed365,
    /// 365 or 366 days following the calendar.
    CalendarYear,
}

impl DayCount {
    /// Number of days generated for `year`.
    #[must_use]
    pub const fn days_for(self, year: i32) -> u32 {
        match self {
            Self::Fixed365 => 365,
            Self::CalendarYear => crate::time::days_in_year(year),
        }
    }
}

/// Retry behaviour for transient oracle failures.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Total attempts per search, including the first (1 disables retries).
    pub max_attempts: u32,
    /// Delay before the first retry.
    pub initial_backoff_ms: u64,
    /// Factor applied to the delay after each retry.
    pub backoff_multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 1,
            initial_backoff_ms: 50,
            backoff_multiplier: 2.0,
        }
    }
}

impl RetryPolicy {
    /// Delay before retry number `retry` (0-based).
    #[must_use]
    pub fn backoff(&self, retry: u32) -> Duration {
        let exponent = i32::try_from(retry).unwrap_or(i32::MAX);
        let millis = self.initial_backoff_ms as f64 * self.backoff_multiplier.powi(exponent);
        Duration::from_millis(millis.clamp(0.0, 3_600_000.0).round() as u64)
    }
}

/// Dashboard and series-builder settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Length of each rise/set search window, in days.
    pub search_window_days: f64,
    /// Coarse step of the built-in rise/set search, in minutes.
    pub scan_step_minutes: u32,
    /// Length of the yearly series.
    pub day_count: DayCount,
    /// Drop the reference place from its own proximity table.
    pub exclude_reference: bool,
    /// Population threshold used until one is set explicitly.
    pub default_min_population: u64,
    /// Deadline for one daylight series run, in milliseconds.
    pub run_timeout_ms: u64,
    /// Retry settings for oracle calls.
    pub retry: RetryPolicy,
    /// How long a fetched catalog stays fresh, in seconds.
    pub cache_ttl_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            search_window_days: 1.0,
            scan_step_minutes: 10,
            day_count: DayCount::Fixed365,
            exclude_reference: false,
            default_min_population: 500_000,
            run_timeout_ms: 30_000,
            retry: RetryPolicy::default(),
            cache_ttl_secs: 86_400,
        }
    }
}

impl Config {
    /// Parses and validates a JSON configuration.
    ///
    /// # Errors
    /// Returns `Config` for malformed JSON or invalid values.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|err| Error::config(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a JSON configuration file.
    ///
    /// # Errors
    /// Returns `Config` if the file cannot be read or is invalid.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|err| Error::config(format!("{}: {err}", path.display())))?;
        Self::from_json_str(&json)
    }

    /// Checks value ranges.
    ///
    /// # Errors
    /// Returns `Config` naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        let window = self.search_window_days;
        if !(window.is_finite() && window > 0.0 && window <= MAX_WINDOW_DAYS) {
            return Err(Error::config("search_window_days must be in (0, 366]"));
        }
        if self.scan_step_minutes == 0 || self.scan_step_minutes > 120 {
            return Err(Error::config("scan_step_minutes must be in 1..=120"));
        }
        if self.run_timeout_ms == 0 {
            return Err(Error::config("run_timeout_ms must be positive"));
        }
        if self.retry.max_attempts == 0 {
            return Err(Error::config("retry.max_attempts must be at least 1"));
        }
        if !(self.retry.backoff_multiplier.is_finite() && self.retry.backoff_multiplier >= 1.0) {
            return Err(Error::config("retry.backoff_multiplier must be >= 1"));
        }
        if self.cache_ttl_secs > MAX_CACHE_TTL_SECS {
            return Err(Error::config("cache_ttl_secs must not exceed 100 years"));
        }
        Ok(())
    }

    /// Per-run deadline.
    #[must_use]
    pub const fn run_timeout(&self) -> Duration {
        Duration::from_millis(self.run_timeout_ms)
    }

    /// Catalog freshness window.
    ///
    /// Values beyond the validated maximum are clamped to it.
    #[must_use]
    pub fn cache_ttl(&self) -> chrono::Duration {
        let secs = self.cache_ttl_secs.min(MAX_CACHE_TTL_SECS);
        i64::try_from(secs)
            .ok()
            .and_then(chrono::Duration::try_seconds)
            .unwrap_or(chrono::Duration::MAX)
    }
}
