//! Resilient interpreter wrapper with exponential backoff retry.
//!
//! Wraps any `InterpreterPort` implementation with retry logic for
//! transient failures. Structured commands never pass through here;
//! only the free-text slow path pays for retries.

use async_trait::async_trait;
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;

use crate::infrastructure::ports::{
    Interpretation, InterpreterContext, InterpreterError, InterpreterPort,
};

/// Configuration for retry behavior.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of retry attempts (0 = no retries).
    pub max_retries: u32,
    /// Base delay in milliseconds before first retry.
    pub base_delay_ms: u64,
    /// Maximum delay in milliseconds (caps exponential growth).
    pub max_delay_ms: u64,
    /// Jitter factor (0.0-1.0) for randomizing delays.
    pub jitter_factor: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 2,
            base_delay_ms: 500,
            max_delay_ms: 10_000,
            jitter_factor: 0.2,
        }
    }
}

pub struct ResilientInterpreterClient {
    inner: Arc<dyn InterpreterPort>,
    config: RetryConfig,
}

impl ResilientInterpreterClient {
    pub fn new(inner: Arc<dyn InterpreterPort>, config: RetryConfig) -> Self {
        Self { inner, config }
    }

    fn calculate_delay(&self, attempt: u32) -> u64 {
        let base = self.config.base_delay_ms;
        let exponential = base.saturating_mul(2u64.saturating_pow(attempt.saturating_sub(1)));
        let capped = exponential.min(self.config.max_delay_ms);

        let jitter_range = (capped as f64 * self.config.jitter_factor) as i64;
        if jitter_range > 0 {
            let jitter = rand::thread_rng().gen_range(-jitter_range..=jitter_range);
            (capped as i64 + jitter).max(0) as u64
        } else {
            capped
        }
    }

    fn is_retryable(error: &InterpreterError) -> bool {
        match error {
            // Auth errors and bad requests will not heal on retry.
            InterpreterError::RequestFailed(msg) => {
                !msg.contains("400") && !msg.contains("401") && !msg.contains("403")
            }
            InterpreterError::InvalidResponse(_) => true,
        }
    }
}

#[async_trait]
impl InterpreterPort for ResilientInterpreterClient {
    async fn interpret(
        &self,
        text: &str,
        context: InterpreterContext,
    ) -> Result<Interpretation, InterpreterError> {
        let mut last_error = None;

        for attempt in 0..=self.config.max_retries {
            match self.inner.interpret(text, context.clone()).await {
                Ok(result) => {
                    if attempt > 0 {
                        tracing::info!(attempt = attempt + 1, "Interpretation succeeded after retry");
                    }
                    return Ok(result);
                }
                Err(e) => {
                    let retryable = Self::is_retryable(&e);
                    if attempt < self.config.max_retries && retryable {
                        let delay = self.calculate_delay(attempt + 1);
                        tracing::warn!(
                            attempt = attempt + 1,
                            max_retries = self.config.max_retries,
                            delay_ms = delay,
                            error = %e,
                            "Interpretation failed, retrying"
                        );
                        tokio::time::sleep(Duration::from_millis(delay)).await;
                        last_error = Some(e);
                    } else {
                        return Err(e);
                    }
                }
            }
        }

        Err(last_error
            .unwrap_or_else(|| InterpreterError::RequestFailed("retries exhausted".to_string())))
    }
}
