use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::{CarenoteError, InferenceClient, InferenceOptions};

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct RetryPolicy {
    pub max_attempts: usize,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
    pub multiplier: f64,
    pub jitter: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(8),
            multiplier: 2.0,
            jitter: true,
        }
    }
}

impl RetryPolicy {
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    pub fn with_max_attempts(mut self, max_attempts: usize) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub fn with_backoff(mut self, initial: Duration, max: Duration) -> Self {
        self.initial_backoff = initial;
        self.max_backoff = max;
        self
    }

    pub fn with_jitter(mut self, jitter: bool) -> Self {
        self.jitter = jitter;
        self
    }

    /// Delay before retry number `retry` (1-based).
    pub fn backoff_for(&self, retry: usize) -> Duration {
        let exponent = retry.saturating_sub(1).min(31) as i32;
        let base = self.initial_backoff.as_secs_f64() * self.multiplier.max(1.0).powi(exponent);
        let capped = base.min(self.max_backoff.as_secs_f64());
        let secs = if self.jitter && capped > 0.0 {
            rand::thread_rng().gen_range(capped / 2.0..=capped)
        } else {
            capped
        };
        Duration::from_secs_f64(secs)
    }
}

/// Retries retryable inference failures with exponential backoff.
///
/// Inference is read-only, so repeating a call has no side effects beyond
/// cost. When attempts run out the last error is returned unchanged.
pub struct RetryingClient<C> {
    inner: C,
    policy: RetryPolicy,
}

impl<C> RetryingClient<C> {
    pub fn new(inner: C, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }
}

#[async_trait::async_trait]
impl<C> InferenceClient for RetryingClient<C>
where
    C: InferenceClient,
{
    async fn infer(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        options: InferenceOptions,
    ) -> Result<String, CarenoteError> {
        if self.policy.max_attempts == 0 {
            return Err(CarenoteError::InvalidConfig(
                "retry policy allows zero attempts".to_string(),
            ));
        }

        let mut attempt = 1;
        loop {
            match self.inner.infer(system_prompt, user_prompt, options).await {
                Ok(output) => return Ok(output),
                Err(error) => {
                    if !error.is_retryable() || attempt >= self.policy.max_attempts {
                        return Err(error);
                    }

                    let delay = self.policy.backoff_for(attempt);
                    tracing::warn!(
                        attempt,
                        max_attempts = self.policy.max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %error,
                        "inference call failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}
