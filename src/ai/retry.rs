//! Retry Policy
//!
//! Retries transient failures with exponential backoff and random jitter.
//!
//! ## Classification
//!
//! - **Transient**: rate limiting / quota, unusable JSON responses, timeouts
//! - **Fatal**: everything else, returned after the first failed attempt
//!
//! The delay before retry `n` (0-based) is `base * 2^n + jitter`, with jitter
//! drawn uniformly from `[0, max_jitter)`. No delay follows the last attempt.

use std::future::Future;
use std::time::Duration;

use rand::Rng;
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::config::RetryConfig;
use crate::types::{Result, SeoError};

/// Whether an error may succeed if the same call is made again
pub fn is_transient(error: &SeoError) -> bool {
    match error {
        SeoError::JsonParsing { .. } => true,
        SeoError::Timeout { .. } => true,
        SeoError::Llm(e) => e.is_transient() || error.is_rate_limit(),
        SeoError::Aggregate(agg) => {
            error.is_rate_limit()
                || (!agg.failures.is_empty() && agg.failures.iter().all(|f| is_transient(&f.error)))
        }
        SeoError::Config(_) | SeoError::Pipeline { .. } => false,
        other => other.is_rate_limit(),
    }
}

/// Retry policy built from a [`RetryConfig`]
#[derive(Debug, Clone, Default)]
pub struct RetryPolicy {
    config: RetryConfig,
}

impl RetryPolicy {
    pub fn new(config: RetryConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RetryConfig {
        &self.config
    }

    /// Backoff before the retry that follows failed attempt `attempt` (0-based)
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2u64.saturating_pow(attempt);
        let base = self.config.base_delay_ms.saturating_mul(factor);
        Duration::from_millis(base.saturating_add(random_jitter(self.config.max_jitter_ms)))
    }

    /// Run `op` until it succeeds, fails fatally, or the attempt budget is spent
    pub async fn execute<T, F, Fut>(&self, op: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        self.execute_with_notify(op, |_, _, _| {}).await
    }

    /// Like [`execute`](Self::execute), calling `notify(error, attempt, delay)`
    /// before each backoff sleep
    pub async fn execute_with_notify<T, F, Fut, N>(&self, mut op: F, mut notify: N) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
        N: FnMut(&SeoError, u32, Duration),
    {
        let max_attempts = self.config.max_attempts.max(1);
        let mut attempt = 0;

        loop {
            let err = match op().await {
                Ok(value) => {
                    if attempt > 0 {
                        debug!(attempt = attempt + 1, "Retry succeeded");
                    }
                    return Ok(value);
                }
                Err(err) => err,
            };

            if !is_transient(&err) {
                debug!(error = %err, "Fatal error, not retrying");
                return Err(err);
            }

            if attempt + 1 >= max_attempts {
                warn!(attempts = max_attempts, error = %err, "Retry budget exhausted");
                return Err(err);
            }

            let delay = self.delay_for(attempt);
            warn!(
                attempt = attempt + 1,
                max_attempts,
                delay_ms = delay.as_millis() as u64,
                error = %err,
                "Transient error, retrying"
            );
            notify(&err, attempt + 1, delay);
            sleep(delay).await;
            attempt += 1;
        }
    }
}

fn random_jitter(max_jitter_ms: u64) -> u64 {
    if max_jitter_ms == 0 {
        return 0;
    }
    rand::rng().random_range(0..max_jitter_ms)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AggregateError, CandidateFailure, ErrorCategory, JsonParseKind, LlmError};
    use std::cell::Cell;

    fn rate_limited() -> SeoError {
        SeoError::Llm(LlmError::with_provider(ErrorCategory::Unknown, "slow down", "openai").status(429))
    }

    fn fatal() -> SeoError {
        SeoError::Llm(LlmError::with_provider(ErrorCategory::Auth, "bad key", "openai").status(401))
    }

    #[test]
    fn test_transient_classification() {
        assert!(is_transient(&rate_limited()));
        assert!(is_transient(&SeoError::LlmApi("RESOURCE_EXHAUSTED".to_string())));
        assert!(is_transient(&SeoError::json_parsing(
            "ctx",
            JsonParseKind::NotFound,
            "no json"
        )));
        assert!(is_transient(&SeoError::timeout("call", Duration::from_secs(1))));

        assert!(!is_transient(&fatal()));
        assert!(!is_transient(&SeoError::Config("Unsupported AI provider".to_string())));
        assert!(!is_transient(&SeoError::LlmApi("Internal server error".to_string())));
    }

    #[test]
    fn test_aggregate_with_a_rate_limited_candidate_is_transient() {
        let mixed = SeoError::from(AggregateError::new(
            "All concurrent models failed",
            vec![
                CandidateFailure {
                    candidate: "a".to_string(),
                    error: rate_limited(),
                },
                CandidateFailure {
                    candidate: "b".to_string(),
                    error: fatal(),
                },
            ],
        ));
        assert!(is_transient(&mixed));

        let all_fatal = SeoError::from(AggregateError::new(
            "All concurrent models failed",
            vec![
                CandidateFailure {
                    candidate: "a".to_string(),
                    error: fatal(),
                },
                CandidateFailure {
                    candidate: "b".to_string(),
                    error: SeoError::LlmApi("model_not_found".to_string()),
                },
            ],
        ));
        assert!(!is_transient(&all_fatal));

        let all_unparsable = SeoError::from(AggregateError::new(
            "All concurrent models failed",
            vec![CandidateFailure {
                candidate: "a".to_string(),
                error: SeoError::json_parsing("ctx", JsonParseKind::NotFound, "no json"),
            }],
        ));
        assert!(is_transient(&all_unparsable));

        let empty = SeoError::from(AggregateError::new("No candidates", vec![]));
        assert!(!is_transient(&empty));
    }

    #[test]
    fn test_delay_grows_exponentially_within_jitter() {
        let policy = RetryPolicy::default();
        for attempt in 0..4 {
            let delay = policy.delay_for(attempt).as_millis() as u64;
            let base = 2000 * 2u64.pow(attempt);
            assert!(delay >= base && delay < base + 1000, "attempt {}: {}", attempt, delay);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_failures_then_success() {
        for k in 0..5u32 {
            let policy = RetryPolicy::default();
            let calls = Cell::new(0u32);
            let mut delays = Vec::new();

            let result = policy
                .execute_with_notify(
                    || {
                        let n = calls.get();
                        calls.set(n + 1);
                        async move { if n < k { Err(rate_limited()) } else { Ok(n) } }
                    },
                    |_, _, delay| delays.push(delay),
                )
                .await;

            assert_eq!(result.unwrap(), k);
            assert_eq!(calls.get(), k + 1);
            assert_eq!(delays.len(), k as usize);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_fatal_error_is_not_retried() {
        let policy = RetryPolicy::default();
        let calls = Cell::new(0u32);
        let mut delays = 0;
        let start = tokio::time::Instant::now();

        let result: Result<()> = policy
            .execute_with_notify(
                || {
                    calls.set(calls.get() + 1);
                    async { Err(fatal()) }
                },
                |_, _, _| delays += 1,
            )
            .await;

        assert!(matches!(result, Err(SeoError::Llm(ref e)) if e.status == Some(401)));
        assert_eq!(calls.get(), 1);
        assert_eq!(delays, 0);
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhaustion_returns_last_error_unchanged() {
        let policy = RetryPolicy::default();
        let calls = Cell::new(0u32);

        let result: Result<()> = policy
            .execute(|| {
                let n = calls.get();
                calls.set(n + 1);
                async move {
                    Err(SeoError::json_parsing(
                        "skeleton",
                        JsonParseKind::NotFound,
                        format!("attempt {}", n),
                    ))
                }
            })
            .await;

        assert_eq!(calls.get(), 5);
        match result {
            Err(SeoError::JsonParsing { context, message, .. }) => {
                assert_eq!(context, "skeleton");
                assert_eq!(message, "attempt 4");
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_custom_budget() {
        let policy = RetryPolicy::new(RetryConfig {
            max_attempts: 2,
            base_delay_ms: 10,
            max_jitter_ms: 0,
        });
        let calls = Cell::new(0u32);
        let mut delays = Vec::new();

        let result: Result<()> = policy
            .execute_with_notify(
                || {
                    calls.set(calls.get() + 1);
                    async { Err(SeoError::timeout("call", Duration::from_secs(1))) }
                },
                |_, attempt, delay| delays.push((attempt, delay)),
            )
            .await;

        assert!(result.unwrap_err().is_timeout());
        assert_eq!(calls.get(), 2);
        assert_eq!(delays, vec![(1, Duration::from_millis(10))]);
    }
}
