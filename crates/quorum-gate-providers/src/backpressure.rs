// crates/quorum-gate-providers/src/backpressure.rs
// ============================================================================
// Module: Backpressure Primitives
// Description: Token bucket, circuit breaker, and exponential backoff.
// Purpose: Keep one flaky remote judge from degrading the whole decision.
// Dependencies: std (Mutex, Instant), tracing
// ============================================================================

//! ## Overview
//! Three independently reusable primitives bound the pressure one remote
//! judge can exert: a token bucket refuses calls past the configured rate, a
//! three-state circuit breaker stops calling a failing dependency for a
//! cooldown period, and an exponential backoff schedule spaces retries.
//! Each limiter instance is private, mutex-guarded state owned by exactly
//! one provider; instances are never shared across providers.
//!
//! No jitter is applied at this layer; jitter, where present elsewhere, is a
//! caller-side concern.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Mutex;
use std::sync::PoisonError;
use std::time::Duration;
use std::time::Instant;

// ============================================================================
// SECTION: Standard Constants
// ============================================================================

/// Initial retry backoff, in milliseconds.
pub const BACKOFF_INITIAL_MS: u64 = 100;
/// Retry backoff ceiling, in milliseconds.
pub const BACKOFF_MAX_MS: u64 = 30_000;
/// Default burst capacity for the per-provider rate limiter.
pub const RATE_LIMIT_BURST: f64 = 50.0;
/// Default sustained request rate, in tokens per second.
pub const RATE_LIMIT_PER_SECOND: f64 = 100.0;
/// Default consecutive-failure threshold before a circuit opens.
pub const BREAKER_FAILURE_THRESHOLD: u32 = 10;
/// Default time a circuit stays open before admitting trial calls.
pub const BREAKER_OPEN_DURATION: Duration = Duration::from_secs(60);
/// Default number of trial calls admitted while half-open.
pub const BREAKER_HALF_OPEN_TRIALS: u32 = 3;

/// Computes the retry backoff for the given attempt number.
///
/// `backoff_ms(attempt) = min(100 * 2^attempt, 30_000)` with `attempt`
/// starting at 0.
#[must_use]
pub fn backoff_ms(attempt: u32) -> u64 {
    2_u64
        .checked_pow(attempt)
        .and_then(|factor| BACKOFF_INITIAL_MS.checked_mul(factor))
        .map_or(BACKOFF_MAX_MS, |delay| delay.min(BACKOFF_MAX_MS))
}

// ============================================================================
// SECTION: Token Bucket
// ============================================================================

/// Mutable token bucket state guarded by the bucket mutex.
struct BucketState {
    /// Tokens currently available.
    tokens: f64,
    /// Instant of the last lazy refill.
    last_refill: Instant,
}

/// Token-bucket rate limiter.
///
/// # Invariants
/// - `tokens` never exceeds `capacity`.
/// - All state reads and writes happen under one mutex.
pub struct TokenBucket {
    /// Maximum tokens the bucket can hold.
    capacity: f64,
    /// Refill rate in tokens per second.
    refill_rate: f64,
    /// Mutable bucket state.
    state: Mutex<BucketState>,
}

impl TokenBucket {
    /// Builds a full bucket with the given capacity and refill rate.
    #[must_use]
    pub fn new(capacity: f64, refill_rate: f64) -> Self {
        Self {
            capacity,
            refill_rate,
            state: Mutex::new(BucketState {
                tokens: capacity,
                last_refill: Instant::now(),
            }),
        }
    }

    /// Attempts to debit `tokens` from the bucket.
    ///
    /// Elapsed time refills the bucket lazily, capped at capacity, before the
    /// debit is attempted. Returns false when insufficient tokens remain.
    #[must_use]
    pub fn consume(&self, tokens: f64) -> bool {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        self.refill(&mut state);
        if state.tokens >= tokens {
            state.tokens -= tokens;
            return true;
        }
        false
    }

    /// Returns the tokens currently available after a lazy refill.
    #[must_use]
    pub fn available(&self) -> f64 {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        self.refill(&mut state);
        state.tokens
    }

    /// Adds elapsed-time tokens, capped at capacity.
    fn refill(&self, state: &mut BucketState) {
        let now = Instant::now();
        let elapsed = now.duration_since(state.last_refill).as_secs_f64();
        state.tokens = (state.tokens + elapsed * self.refill_rate).min(self.capacity);
        state.last_refill = now;
    }
}

// ============================================================================
// SECTION: Circuit Breaker
// ============================================================================

/// Observable circuit breaker state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    /// Calls flow normally; consecutive failures are counted.
    Closed,
    /// Calls are rejected without invoking the underlying operation.
    Open,
    /// A limited number of trial calls probe the dependency.
    HalfOpen,
}

/// Mutable breaker state guarded by the breaker mutex.
struct BreakerState {
    /// Current circuit state.
    state: CircuitState,
    /// Consecutive failures observed.
    failure_count: u32,
    /// Instant of the last recorded failure.
    last_failure: Option<Instant>,
    /// Consecutive successes observed while half-open.
    half_open_successes: u32,
    /// Trial calls admitted during the current half-open window.
    half_open_admitted: u32,
}

/// Three-state circuit breaker.
///
/// Transitions:
/// - closed to open after the failure threshold of consecutive failures;
/// - open to half-open lazily, the first time state is queried after the
///   open duration has elapsed since the last failure;
/// - half-open to closed after the configured number of consecutive
///   successes;
/// - half-open to open on any failure, with the counter reset to the
///   threshold.
///
/// # Invariants
/// - At most the configured trial count is admitted per half-open window.
/// - All state reads and writes happen under one mutex.
pub struct CircuitBreaker {
    /// Consecutive failures before the circuit opens.
    threshold: u32,
    /// Time the circuit stays open before trial calls are admitted.
    open_duration: Duration,
    /// Trial calls admitted while half-open.
    half_open_trials: u32,
    /// Mutable breaker state.
    state: Mutex<BreakerState>,
}

impl CircuitBreaker {
    /// Builds a closed breaker with the given thresholds.
    #[must_use]
    pub fn new(threshold: u32, open_duration: Duration, half_open_trials: u32) -> Self {
        Self {
            threshold,
            open_duration,
            half_open_trials,
            state: Mutex::new(BreakerState {
                state: CircuitState::Closed,
                failure_count: 0,
                last_failure: None,
                half_open_successes: 0,
                half_open_admitted: 0,
            }),
        }
    }

    /// Requests admission for one call.
    ///
    /// Returns false while the circuit is open, and while half-open once the
    /// trial budget is exhausted. Admitted half-open calls count against the
    /// trial budget immediately.
    #[must_use]
    pub fn try_acquire(&self) -> bool {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        self.transition_if_cooled(&mut state);
        match state.state {
            CircuitState::Closed => true,
            CircuitState::Open => false,
            CircuitState::HalfOpen => {
                if state.half_open_admitted >= self.half_open_trials {
                    return false;
                }
                state.half_open_admitted += 1;
                true
            }
        }
    }

    /// Records a successful call.
    pub fn record_success(&self) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        self.transition_if_cooled(&mut state);
        match state.state {
            CircuitState::HalfOpen => {
                state.half_open_successes += 1;
                if state.half_open_successes >= self.half_open_trials {
                    state.state = CircuitState::Closed;
                    state.failure_count = 0;
                    state.half_open_successes = 0;
                    state.half_open_admitted = 0;
                }
            }
            CircuitState::Closed | CircuitState::Open => {
                state.failure_count = 0;
            }
        }
    }

    /// Records a failed call.
    pub fn record_failure(&self) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        self.transition_if_cooled(&mut state);
        state.last_failure = Some(Instant::now());
        match state.state {
            CircuitState::HalfOpen => {
                state.state = CircuitState::Open;
                state.failure_count = self.threshold;
                state.half_open_successes = 0;
                state.half_open_admitted = 0;
                tracing::warn!("circuit reopened by half-open trial failure");
            }
            CircuitState::Closed | CircuitState::Open => {
                state.failure_count += 1;
                if state.failure_count >= self.threshold && state.state == CircuitState::Closed {
                    state.state = CircuitState::Open;
                    tracing::warn!(
                        failure_count = state.failure_count,
                        "circuit opened after consecutive failures"
                    );
                }
            }
        }
    }

    /// Returns the current state, applying the lazy open-to-half-open move.
    #[must_use]
    pub fn state(&self) -> CircuitState {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        self.transition_if_cooled(&mut state);
        state.state
    }

    /// Returns the consecutive-failure count.
    #[must_use]
    pub fn failure_count(&self) -> u32 {
        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.failure_count
    }

    /// Moves an open circuit to half-open once the cooldown has elapsed.
    fn transition_if_cooled(&self, state: &mut BreakerState) {
        if state.state != CircuitState::Open {
            return;
        }
        let cooled = state
            .last_failure
            .is_none_or(|at| at.elapsed() >= self.open_duration);
        if cooled {
            state.state = CircuitState::HalfOpen;
            state.half_open_successes = 0;
            state.half_open_admitted = 0;
        }
    }
}
