//! Timeout Handling
//!
//! Wraps provider calls in a deadline. An expired deadline becomes
//! `SeoError::Timeout`, which the retry policy treats as transient.
//!
//! ## Usage
//!
//! ```ignore
//! use crate::ai::timeout::{TimeoutConfig, with_timeout};
//!
//! let config = TimeoutConfig::default();
//! let completion = with_timeout(
//!     config.request,
//!     provider.complete(&request),
//!     "gemini completion"
//! ).await?;
//! ```

use std::future::Future;
use std::time::Duration;

use crate::constants::network as net_constants;
use crate::types::{Result, SeoError};

/// Deadlines for outbound AI calls
#[derive(Debug, Clone, Copy)]
pub struct TimeoutConfig {
    /// One provider completion (default: 5 minutes)
    pub request: Duration,
    /// One credential check attempt (default: 15 seconds)
    pub key_check: Duration,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            request: Duration::from_secs(net_constants::DEFAULT_TIMEOUT_SECS),
            key_check: Duration::from_secs(net_constants::KEY_CHECK_TIMEOUT_SECS),
        }
    }
}

impl TimeoutConfig {
    pub fn with_request_secs(secs: u64) -> Self {
        Self {
            request: Duration::from_secs(secs),
            ..Self::default()
        }
    }
}

/// Execute an async operation with a timeout
///
/// Returns a timeout error if the operation doesn't complete within the specified duration.
pub async fn with_timeout<T, F>(timeout: Duration, future: F, operation_name: &str) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(timeout, future).await {
        Ok(result) => result,
        Err(_) => Err(SeoError::timeout(operation_name, timeout)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_config_defaults() {
        let config = TimeoutConfig::default();
        assert_eq!(config.request.as_secs(), 300);
        assert_eq!(config.key_check.as_secs(), 15);
        assert_eq!(TimeoutConfig::with_request_secs(30).request.as_secs(), 30);
    }

    #[tokio::test]
    async fn test_with_timeout_success() {
        let result = with_timeout(
            Duration::from_secs(1),
            async { Ok::<_, SeoError>(42) },
            "test operation",
        )
        .await;
        assert_eq!(result.unwrap(), 42);
    }

    #[tokio::test(start_paused = true)]
    async fn test_with_timeout_expires() {
        let result = with_timeout(
            Duration::from_millis(10),
            async {
                tokio::time::sleep(Duration::from_secs(1)).await;
                Ok::<_, SeoError>(42)
            },
            "slow operation",
        )
        .await;
        let err = result.unwrap_err();
        assert!(matches!(err, SeoError::Timeout { .. }));
        assert!(err.to_string().contains("slow operation"));
    }
}
