//! Configuration Types
//!
//! All configuration structures with sensible defaults.
//! Supports global (~/.config/seoplan/) and project (.seoplan/) level configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::ai::provider::Backend;
use crate::constants::{network, pipeline, retry, storage};
use crate::types::{Result, SeoError};

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Configuration version
    pub version: String,

    /// AI backend settings
    pub ai: AiConfig,

    /// Retry budget for AI calls
    pub retry: RetryConfig,

    /// Fan-out and batching limits
    pub pipeline: PipelineConfig,

    /// Report output settings
    pub output: OutputConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            ai: AiConfig::default(),
            retry: RetryConfig::default(),
            pipeline: PipelineConfig::default(),
            output: OutputConfig::default(),
        }
    }
}

impl Config {
    /// Validate configuration values are within acceptable ranges.
    /// Returns `SeoError::Config` on validation failure.
    pub fn validate(&self) -> Result<()> {
        if self.retry.max_attempts == 0 {
            return Err(SeoError::Config(
                "retry.max_attempts must be at least 1".to_string(),
            ));
        }

        if self.pipeline.detail_concurrency == 0 || self.pipeline.batch_concurrency == 0 {
            return Err(SeoError::Config(format!(
                "pipeline concurrency must be at least 1, got detail={} batch={}",
                self.pipeline.detail_concurrency, self.pipeline.batch_concurrency
            )));
        }

        if self.pipeline.batch_size == 0 {
            return Err(SeoError::Config(
                "pipeline.batch_size must be at least 1".to_string(),
            ));
        }

        if self.pipeline.max_urls == 0 {
            return Err(SeoError::Config(
                "pipeline.max_urls must be at least 1".to_string(),
            ));
        }

        if self.ai.timeout_secs == 0 {
            return Err(SeoError::Config(
                "ai.timeout_secs must be greater than 0".to_string(),
            ));
        }

        if self.ai.detail_max_tokens == 0 {
            return Err(SeoError::Config(
                "ai.detail_max_tokens must be greater than 0".to_string(),
            ));
        }

        if self.output.keep_reports == 0 {
            return Err(SeoError::Config(
                "output.keep_reports must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}

// =============================================================================
// AI
// =============================================================================

/// AI backend configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AiConfig {
    /// Backend: gemini, openai, openrouter, anthropic
    pub backend: Backend,

    /// Single model override (empty = backend default)
    pub model: String,

    /// Candidate models raced per call; takes precedence over `model`
    pub models: Vec<String>,

    /// API key. Never written back out.
    #[serde(skip_serializing)]
    pub api_key: Option<String>,

    /// Per-request timeout in seconds
    pub timeout_secs: u64,

    /// Output token limit for each action detail call
    pub detail_max_tokens: u32,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            backend: Backend::Gemini,
            model: String::new(),
            models: Vec::new(),
            api_key: None,
            timeout_secs: network::DEFAULT_TIMEOUT_SECS,
            detail_max_tokens: pipeline::DETAIL_MAX_TOKENS,
        }
    }
}

impl AiConfig {
    /// Models to race, falling back to the single `model` entry
    pub fn candidate_models(&self) -> Vec<String> {
        if !self.models.is_empty() {
            return self.models.clone();
        }
        if self.model.trim().is_empty() {
            Vec::new()
        } else {
            vec![self.model.clone()]
        }
    }
}

// =============================================================================
// Retry
// =============================================================================

/// Retry budget and backoff for transient AI failures
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Total attempts including the first
    pub max_attempts: u32,

    /// Delay before the first retry; doubles each retry
    pub base_delay_ms: u64,

    /// Upper bound (exclusive) of the random jitter added to each delay
    pub max_jitter_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: retry::MAX_ATTEMPTS,
            base_delay_ms: retry::BASE_DELAY_MS,
            max_jitter_ms: retry::MAX_JITTER_MS,
        }
    }
}

// =============================================================================
// Pipeline
// =============================================================================

/// Concurrency and batching limits
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Concurrent action detail calls
    pub detail_concurrency: usize,

    /// Concurrent page-analysis batches
    pub batch_concurrency: usize,

    /// URLs per page-analysis batch
    pub batch_size: usize,

    /// URLs beyond this are dropped before analysis
    pub max_urls: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            detail_concurrency: pipeline::DETAIL_CONCURRENCY,
            batch_concurrency: pipeline::BATCH_CONCURRENCY,
            batch_size: pipeline::BATCH_SIZE,
            max_urls: pipeline::MAX_URLS,
        }
    }
}

// =============================================================================
// Output
// =============================================================================

/// Report output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory for report snapshots
    pub directory: PathBuf,

    /// Pretty-print JSON output
    pub pretty: bool,

    /// Report snapshots kept in `directory`; older ones are pruned on save
    pub keep_reports: usize,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from(storage::REPORTS_DIR),
            pretty: true,
            keep_reports: storage::HISTORY_LIMIT,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.retry.max_attempts, 5);
        assert_eq!(config.retry.base_delay_ms, 2000);
        assert_eq!(config.pipeline.detail_concurrency, 5);
        assert_eq!(config.pipeline.batch_size, 15);
        assert_eq!(config.ai.detail_max_tokens, 8192);
    }

    #[test]
    fn test_validate_rejects_zero_values() {
        let mut config = Config::default();
        config.pipeline.detail_concurrency = 0;
        assert!(matches!(config.validate(), Err(SeoError::Config(_))));

        let mut config = Config::default();
        config.retry.max_attempts = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.pipeline.batch_size = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_api_key_is_never_serialized() {
        let mut config = Config::default();
        config.ai.api_key = Some("secret-key".to_string());
        let toml = toml::to_string(&config).unwrap();
        assert!(!toml.contains("secret-key"));
        assert!(!toml.contains("api_key"));
    }

    #[test]
    fn test_candidate_models() {
        let mut ai = AiConfig::default();
        assert!(ai.candidate_models().is_empty());
        ai.model = "gpt-4o-mini".to_string();
        assert_eq!(ai.candidate_models(), vec!["gpt-4o-mini"]);
        ai.models = vec!["a".to_string(), "b".to_string()];
        assert_eq!(ai.candidate_models(), vec!["a", "b"]);
    }
}
