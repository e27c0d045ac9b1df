//! Acquisition settings with environment overrides.
//!
//! | Variable | Default | Meaning |
//! |----------|---------|---------|
//! | `FERROMACRO_CACHE_TTL_SECS` | `3600` | Seconds a fetched series stays fresh |
//! | `FERROMACRO_FETCH_TIMEOUT_SECS` | `30` | Upper bound for one adapter call |
//! | `FERROMACRO_START_DATE` | `1994-07-01` | First date requested |
//! | `FERROMACRO_END_DATE` | tomorrow | Last date requested |
//! | `FERROMACRO_MAX_RETRIES` | `2` | Retries for transient HTTP failures |

use std::str::FromStr;
use std::time::Duration;

use time::macros::format_description;
use time::Date;

use crate::{RetryConfig, ValidationError, HISTORICAL_EPOCH};

pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(3600);
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, PartialEq)]
pub struct AcquisitionConfig {
    pub cache_ttl: Duration,
    pub fetch_timeout: Duration,
    pub start_date: Date,
    /// `None` resolves to the day after the current date on every fetch.
    pub end_date: Option<Date>,
    pub retry: RetryConfig,
}

impl Default for AcquisitionConfig {
    fn default() -> Self {
        Self {
            cache_ttl: DEFAULT_CACHE_TTL,
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
            start_date: HISTORICAL_EPOCH,
            end_date: None,
            retry: RetryConfig::default(),
        }
    }
}

impl AcquisitionConfig {
    /// Defaults overlaid with any `FERROMACRO_*` variables that are set.
    pub fn from_env() -> Result<Self, ValidationError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) over an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ValidationError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(secs) = parse_var::<u64>(&lookup, "FERROMACRO_CACHE_TTL_SECS")? {
            config.cache_ttl = Duration::from_secs(secs);
        }
        if let Some(secs) = parse_var::<u64>(&lookup, "FERROMACRO_FETCH_TIMEOUT_SECS")? {
            if secs == 0 {
                return Err(ValidationError::InvalidConfig {
                    key: "FERROMACRO_FETCH_TIMEOUT_SECS",
                    value: secs.to_string(),
                });
            }
            config.fetch_timeout = Duration::from_secs(secs);
        }
        if let Some(raw) = lookup("FERROMACRO_START_DATE") {
            config.start_date = parse_date(&raw)?;
        }
        if let Some(raw) = lookup("FERROMACRO_END_DATE") {
            config.end_date = Some(parse_date(&raw)?);
        }
        if let Some(retries) = parse_var::<u32>(&lookup, "FERROMACRO_MAX_RETRIES")? {
            config.retry = RetryConfig::exponential(retries);
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(end) = self.end_date {
            if end < self.start_date {
                return Err(ValidationError::InvertedWindow {
                    start: self.start_date.to_string(),
                    end: end.to_string(),
                });
            }
        }
        Ok(())
    }

    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    pub fn with_window(mut self, start: Date, end: Option<Date>) -> Self {
        self.start_date = start;
        self.end_date = end;
        self
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn fetch_timeout_ms(&self) -> u64 {
        u64::try_from(self.fetch_timeout.as_millis()).unwrap_or(u64::MAX)
    }
}

/// Parses a `YYYY-MM-DD` calendar date.
pub fn parse_date(raw: &str) -> Result<Date, ValidationError> {
    Date::parse(raw.trim(), format_description!("[year]-[month]-[day]")).map_err(|_| {
        ValidationError::InvalidDate {
            value: raw.to_owned(),
        }
    })
}

fn parse_var<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
) -> Result<Option<T>, ValidationError> {
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| ValidationError::InvalidConfig { key, value: raw }),
    }
}
