//! Retry budget, backoff, and the payload simplification extension point.

use std::sync::Arc;
use std::time::Duration;

use crate::config::RetryConfig;
use crate::error::{ErrorClass, OpenApiLlmError};
use crate::payload::RequestPayload;

/// Retry policy for one logical request
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    config: RetryConfig,
    attempt: usize,
    next_delay: Duration,
}

impl RetryPolicy {
    /// Create a new retry policy
    pub fn new(config: RetryConfig) -> Self {
        Self {
            next_delay: config.initial_delay,
            config,
            attempt: 0,
        }
    }

    /// Check if another attempt is allowed
    pub fn should_retry(&self) -> bool {
        self.attempt < self.config.max_retries
    }

    /// Number of retries taken so far
    pub fn attempt(&self) -> usize {
        self.attempt
    }

    pub fn max_retries(&self) -> usize {
        self.config.max_retries
    }

    /// Consume one retry and return the delay to wait before it
    pub fn next_delay(&mut self) -> Duration {
        let mut delay = self.next_delay;

        if self.config.jitter && !delay.is_zero() {
            use rand::Rng;
            let mut rng = rand::thread_rng();
            let jitter = rng.gen_range(0.0..0.3);
            let jitter_ms = (delay.as_millis() as f64 * jitter) as u64;
            delay += Duration::from_millis(jitter_ms);
        }

        self.attempt += 1;
        self.next_delay = Duration::from_secs_f32(
            (self.next_delay.as_secs_f32() * self.config.backoff_multiplier)
                .min(self.config.max_delay.as_secs_f32()),
        );

        delay
    }
}

/// Determine if an error is retryable
pub fn is_retryable(error: &OpenApiLlmError) -> bool {
    error.class() == ErrorClass::Transient
}

/// Builds the payload for the next attempt after a failed one.
///
/// `attempt` is the number of the attempt that just failed (0 for the first).
pub trait PayloadSimplifier: Send + Sync {
    fn simplify(
        &self,
        payload: &RequestPayload,
        attempt: usize,
        error: &OpenApiLlmError,
    ) -> RequestPayload;
}

/// Default strategy: retry with an unchanged copy of the payload.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentitySimplifier;

impl PayloadSimplifier for IdentitySimplifier {
    fn simplify(
        &self,
        payload: &RequestPayload,
        _attempt: usize,
        _error: &OpenApiLlmError,
    ) -> RequestPayload {
        payload.clone()
    }
}

impl<F> PayloadSimplifier for F
where
    F: Fn(&RequestPayload, usize, &OpenApiLlmError) -> RequestPayload + Send + Sync,
{
    fn simplify(
        &self,
        payload: &RequestPayload,
        attempt: usize,
        error: &OpenApiLlmError,
    ) -> RequestPayload {
        self(payload, attempt, error)
    }
}

pub type SharedSimplifier = Arc<dyn PayloadSimplifier>;
