use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use crate::SourceKind;

/// Runtime circuit state for a source adapter's upstream calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

/// Circuit breaker thresholds and timers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CircuitBreakerConfig {
    pub failure_threshold: u32,
    pub open_timeout: Duration,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            open_timeout: Duration::from_secs(60),
        }
    }
}

#[derive(Debug)]
struct CircuitInner {
    state: CircuitState,
    consecutive_failures: u32,
    opened_at: Option<Instant>,
}

/// Per-adapter breaker; an open circuit makes the adapter answer "no data"
/// without touching the network.
#[derive(Debug)]
pub struct CircuitBreaker {
    source: SourceKind,
    config: CircuitBreakerConfig,
    inner: Mutex<CircuitInner>,
}

impl CircuitBreaker {
    pub fn new(source: SourceKind, config: CircuitBreakerConfig) -> Self {
        Self {
            source,
            config,
            inner: Mutex::new(CircuitInner {
                state: CircuitState::Closed,
                consecutive_failures: 0,
                opened_at: None,
            }),
        }
    }

    pub fn for_source(source: SourceKind) -> Self {
        Self::new(source, CircuitBreakerConfig::default())
    }

    fn lock(&self) -> MutexGuard<'_, CircuitInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn allow_request(&self) -> bool {
        let mut inner = self.lock();
        match inner.state {
            CircuitState::Closed | CircuitState::HalfOpen => true,
            CircuitState::Open => {
                let can_probe = inner
                    .opened_at
                    .is_some_and(|opened_at| opened_at.elapsed() >= self.config.open_timeout);
                if can_probe {
                    inner.state = CircuitState::HalfOpen;
                    inner.opened_at = None;
                    tracing::info!(source = %self.source, "circuit half-open, probing upstream");
                }
                can_probe
            }
        }
    }

    pub fn record_success(&self) {
        let mut inner = self.lock();
        if inner.state != CircuitState::Closed {
            tracing::info!(source = %self.source, "circuit closed");
        }
        inner.state = CircuitState::Closed;
        inner.consecutive_failures = 0;
        inner.opened_at = None;
    }

    pub fn record_failure(&self) {
        let mut inner = self.lock();
        inner.consecutive_failures = inner.consecutive_failures.saturating_add(1);

        let trips = inner.state == CircuitState::HalfOpen
            || inner.consecutive_failures >= self.config.failure_threshold;
        if trips && inner.state != CircuitState::Open {
            tracing::warn!(
                source = %self.source,
                failures = inner.consecutive_failures,
                "circuit opened"
            );
        }
        if trips {
            inner.state = CircuitState::Open;
            inner.opened_at = Some(Instant::now());
        }
    }

    pub fn state(&self) -> CircuitState {
        self.lock().state
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.lock().consecutive_failures
    }
}
