//! Per-provider circuit breaker: closed -> open after N consecutive
//! failures within a window, half-open after a cooldown, a single probe
//! call decides closed vs. open again. While open, calls short-circuit
//! with `SignalError::Unavailable` without touching the network.

use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum CircuitState {
    Closed = 0,
    Open = 1,
    HalfOpen = 2,
}

impl From<u8> for CircuitState {
    fn from(value: u8) -> Self {
        match value {
            0 => Self::Closed,
            1 => Self::Open,
            2 => Self::HalfOpen,
            _ => Self::Closed,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CircuitBreakerConfig {
    pub failure_threshold: u64,
    pub failure_window: Duration,
    pub cooldown: Duration,
    /// Successes required in HalfOpen to close the circuit again. A single
    /// probe call deciding the outcome is the common case, so this
    /// defaults to 1.
    pub success_threshold: u64,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            failure_window: Duration::from_secs(60),
            cooldown: Duration::from_secs(30),
            success_threshold: 1,
        }
    }
}

pub struct CircuitBreaker {
    config: CircuitBreakerConfig,
    state: AtomicU8,
    failure_count: AtomicU64,
    success_count: AtomicU64,
    last_failure_time: parking_lot::Mutex<Option<Instant>>,
    last_state_change: parking_lot::Mutex<Instant>,
}

impl CircuitBreaker {
    pub fn new(config: CircuitBreakerConfig) -> Self {
        Self {
            config,
            state: AtomicU8::new(CircuitState::Closed as u8),
            failure_count: AtomicU64::new(0),
            success_count: AtomicU64::new(0),
            last_failure_time: parking_lot::Mutex::new(None),
            last_state_change: parking_lot::Mutex::new(Instant::now()),
        }
    }

    pub fn state(&self) -> CircuitState {
        self.state.load(Ordering::Acquire).into()
    }

    /// Whether a call is currently permitted. Transitions Open -> HalfOpen
    /// as a side effect once the cooldown has elapsed.
    pub fn is_call_permitted(&self) -> bool {
        match self.state() {
            CircuitState::Closed => true,
            CircuitState::HalfOpen => true,
            CircuitState::Open => {
                let elapsed = self.last_state_change.lock().elapsed();
                if elapsed >= self.config.cooldown {
                    self.transition_to(CircuitState::HalfOpen);
                    true
                } else {
                    false
                }
            }
        }
    }

    pub fn record_success(&self) {
        match self.state() {
            CircuitState::Closed => {
                self.failure_count.store(0, Ordering::Release);
            }
            CircuitState::HalfOpen => {
                let successes = self.success_count.fetch_add(1, Ordering::AcqRel) + 1;
                if successes >= self.config.success_threshold {
                    self.transition_to(CircuitState::Closed);
                }
            }
            CircuitState::Open => {}
        }
    }

    pub fn record_failure(&self) {
        *self.last_failure_time.lock() = Some(Instant::now());

        match self.state() {
            CircuitState::Closed => {
                let failures = self.failure_count.fetch_add(1, Ordering::AcqRel) + 1;
                if failures >= self.config.failure_threshold {
                    let within_window = self
                        .last_failure_time
                        .lock()
                        .map(|t| t.elapsed() <= self.config.failure_window)
                        .unwrap_or(false);
                    if within_window {
                        self.transition_to(CircuitState::Open);
                    }
                }
            }
            CircuitState::HalfOpen => {
                // Any failure during the probe call immediately reopens.
                self.transition_to(CircuitState::Open);
            }
            CircuitState::Open => {}
        }
    }

    fn transition_to(&self, next: CircuitState) {
        self.state.store(next as u8, Ordering::Release);
        self.failure_count.store(0, Ordering::Release);
        self.success_count.store(0, Ordering::Release);
        *self.last_state_change.lock() = Instant::now();
        match next {
            CircuitState::Open => tracing::warn!("circuit breaker tripped OPEN"),
            CircuitState::HalfOpen => tracing::debug!("circuit breaker probing HALF_OPEN"),
            CircuitState::Closed => tracing::info!("circuit breaker CLOSED"),
        }
    }
}

/// A registry of per-provider breakers, the one legitimate piece of
/// process-wide shared mutable state besides the cache.
#[derive(Clone)]
pub struct BreakerRegistry {
    breakers: Arc<dashmap::DashMap<&'static str, Arc<CircuitBreaker>>>,
    config: CircuitBreakerConfig,
}

impl BreakerRegistry {
    pub fn new(config: CircuitBreakerConfig) -> Self {
        Self {
            breakers: Arc::new(dashmap::DashMap::new()),
            config,
        }
    }

    pub fn get(&self, provider_name: &'static str) -> Arc<CircuitBreaker> {
        self.breakers
            .entry(provider_name)
            .or_insert_with(|| Arc::new(CircuitBreaker::new(self.config.clone())))
            .clone()
    }
}

impl Default for BreakerRegistry {
    fn default() -> Self {
        Self::new(CircuitBreakerConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn starts_closed() {
        let cb = CircuitBreaker::new(CircuitBreakerConfig::default());
        assert_eq!(cb.state(), CircuitState::Closed);
        assert!(cb.is_call_permitted());
    }

    #[test]
    fn opens_after_threshold_failures() {
        let config = CircuitBreakerConfig {
            failure_threshold: 3,
            ..Default::default()
        };
        let cb = CircuitBreaker::new(config);
        cb.record_failure();
        cb.record_failure();
        assert_eq!(cb.state(), CircuitState::Closed);
        cb.record_failure();
        assert_eq!(cb.state(), CircuitState::Open);
        assert!(!cb.is_call_permitted());
    }

    #[test]
    fn half_open_probe_recovers() {
        let config = CircuitBreakerConfig {
            failure_threshold: 2,
            cooldown: Duration::from_millis(10),
            success_threshold: 1,
            ..Default::default()
        };
        let cb = CircuitBreaker::new(config);
        cb.record_failure();
        cb.record_failure();
        assert_eq!(cb.state(), CircuitState::Open);

        thread::sleep(Duration::from_millis(15));
        assert!(cb.is_call_permitted());
        assert_eq!(cb.state(), CircuitState::HalfOpen);

        cb.record_success();
        assert_eq!(cb.state(), CircuitState::Closed);
    }

    #[test]
    fn half_open_failure_reopens() {
        let config = CircuitBreakerConfig {
            failure_threshold: 2,
            cooldown: Duration::from_millis(10),
            ..Default::default()
        };
        let cb = CircuitBreaker::new(config);
        cb.record_failure();
        cb.record_failure();
        thread::sleep(Duration::from_millis(15));
        assert!(cb.is_call_permitted());
        cb.record_failure();
        assert_eq!(cb.state(), CircuitState::Open);
    }

    #[test]
    fn registry_reuses_breaker_per_provider() {
        let registry = BreakerRegistry::default();
        let a = registry.get("primary");
        let b = registry.get("primary");
        a.record_failure();
        assert_eq!(b.state(), CircuitState::Closed);
        assert_eq!(
            Arc::strong_count(&a) >= 2,
            true,
            "same provider name should share one breaker instance"
        );
    }
}
