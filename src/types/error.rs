//! Unified Error Type System
//!
//! Centralized error types for the entire application.
//! Provides error classification for retry and reporting decisions.
//!
//! ## Error Categories
//!
//! - **RateLimit**: API rate limiting or quota exhaustion (retry with backoff)
//! - **ParseError**: Unusable JSON in an AI response (retry)
//! - **Timeout**: Request exceeded its deadline (retry)
//! - **Auth**: Authentication or permission failures (fail fast)
//! - **BadRequest**: Invalid request or configuration (fail fast)
//! - **Unavailable**: Provider or model unavailable (fail fast)
//!
//! ## Design Principles
//!
//! - Single unified error type (SeoError) for the entire library
//! - Callers distinguish failures by variant, not by string matching
//! - No panic/unwrap - all errors are propagated

use std::time::Duration;
use thiserror::Error;

// =============================================================================
// Error Categories
// =============================================================================

/// Error categories used for retry decisions and user-facing messages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Rate limited or out of quota
    RateLimit,
    /// Authentication failed
    Auth,
    /// Permission denied for the requested resource
    Permission,
    /// Network/connectivity issues
    Network,
    /// Request timed out or was aborted
    Timeout,
    /// Provider or model unavailable
    Unavailable,
    /// Invalid request
    BadRequest,
    /// Parsing the LLM response failed
    ParseError,
    /// Unknown error
    Unknown,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RateLimit => write!(f, "RATE_LIMIT"),
            Self::Auth => write!(f, "AUTH"),
            Self::Permission => write!(f, "PERMISSION"),
            Self::Network => write!(f, "NETWORK"),
            Self::Timeout => write!(f, "TIMEOUT"),
            Self::Unavailable => write!(f, "UNAVAILABLE"),
            Self::BadRequest => write!(f, "BAD_REQUEST"),
            Self::ParseError => write!(f, "PARSE_ERROR"),
            Self::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

impl ErrorCategory {
    /// Whether a failure of this category may succeed when retried
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::RateLimit | Self::ParseError | Self::Timeout)
    }
}

// =============================================================================
// LLM Error
// =============================================================================

/// Structured provider error with category, HTTP status and provider context
#[derive(Debug, Clone)]
pub struct LlmError {
    /// Error category for routing decisions
    pub category: ErrorCategory,
    /// Detailed error message
    pub message: String,
    /// Provider that produced the error
    pub provider: Option<String>,
    /// HTTP status reported by the backend, if any
    pub status: Option<u16>,
}

impl std::fmt::Display for LlmError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(provider) = &self.provider {
            write!(f, "[{}:{}] {}", provider, self.category, self.message)
        } else {
            write!(f, "[{}] {}", self.category, self.message)
        }
    }
}

impl std::error::Error for LlmError {}

impl LlmError {
    pub fn new(category: ErrorCategory, message: impl Into<String>) -> Self {
        Self {
            category,
            message: message.into(),
            provider: None,
            status: None,
        }
    }

    pub fn with_provider(
        category: ErrorCategory,
        message: impl Into<String>,
        provider: impl Into<String>,
    ) -> Self {
        Self {
            category,
            message: message.into(),
            provider: Some(provider.into()),
            status: None,
        }
    }

    /// Attach the HTTP status the backend answered with
    pub fn status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    pub fn is_transient(&self) -> bool {
        self.status == Some(429) || self.category.is_transient()
    }
}

// =============================================================================
// Error Classifier
// =============================================================================

/// Classifies raw provider failures into structured `LlmError`s
pub struct ErrorClassifier;

impl ErrorClassifier {
    /// Classify an error message from any provider
    pub fn classify(message: &str, provider: &str) -> LlmError {
        let lower = message.to_lowercase();

        if signals_rate_limit(&lower) || lower.contains("too many requests") {
            return LlmError::with_provider(ErrorCategory::RateLimit, message, provider);
        }

        if lower.contains("api key not valid")
            || lower.contains("invalid api key")
            || lower.contains("invalid x-api-key")
            || lower.contains("unauthorized")
        {
            return LlmError::with_provider(ErrorCategory::Auth, message, provider);
        }

        if lower.contains("permission denied") || lower.contains("forbidden") {
            return LlmError::with_provider(ErrorCategory::Permission, message, provider);
        }

        if lower.contains("timed out") || lower.contains("timeout") || lower.contains("aborted") {
            return LlmError::with_provider(ErrorCategory::Timeout, message, provider);
        }

        if lower.contains("model_not_found")
            || lower.contains("service unavailable")
            || lower.contains("overloaded")
        {
            return LlmError::with_provider(ErrorCategory::Unavailable, message, provider);
        }

        if lower.contains("connection") || lower.contains("dns") || lower.contains("network") {
            return LlmError::with_provider(ErrorCategory::Network, message, provider);
        }

        if lower.contains("bad request") || lower.contains("invalid_request") {
            return LlmError::with_provider(ErrorCategory::BadRequest, message, provider);
        }

        LlmError::with_provider(ErrorCategory::Unknown, message, provider)
    }

    /// Classify an HTTP status code directly (more accurate than string matching)
    pub fn classify_http_status(status: u16, message: &str, provider: &str) -> LlmError {
        let category = match status {
            429 => ErrorCategory::RateLimit,
            401 => ErrorCategory::Auth,
            403 => ErrorCategory::Permission,
            400 | 422 => ErrorCategory::BadRequest,
            404 => ErrorCategory::Unavailable,
            408 => ErrorCategory::Timeout,
            500..=599 => ErrorCategory::Unavailable,
            _ => Self::classify(message, provider).category,
        };
        LlmError::with_provider(category, message, provider).status(status)
    }
}

/// Message substrings that signal rate limiting or quota exhaustion.
///
/// Expects an already lowercased message.
pub(crate) fn signals_rate_limit(lower: &str) -> bool {
    lower.contains("rate limit")
        || lower.contains("resource_exhausted")
        || lower.contains("quota")
}

// =============================================================================
// JSON Parsing Error
// =============================================================================

/// Which failure path of the tolerant JSON extractor was hit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JsonParseKind {
    /// The response was empty or whitespace
    Empty,
    /// No JSON found, and the text looks like a refusal or provider error
    Blocked,
    /// No JSON found in the response
    NotFound,
    /// JSON found but it did not match the expected shape
    Structure,
    /// JSON matched the shape but could not be decoded into the target type
    Decode,
}

// =============================================================================
// Aggregate Error
// =============================================================================

/// One failed candidate in a race
#[derive(Debug)]
pub struct CandidateFailure {
    /// Candidate label (model name, or position when unlabeled)
    pub candidate: String,
    pub error: SeoError,
}

/// Every candidate of a race failed
#[derive(Debug)]
pub struct AggregateError {
    pub message: String,
    /// Failures in the original candidate order
    pub failures: Vec<CandidateFailure>,
}

impl AggregateError {
    pub fn new(message: impl Into<String>, failures: Vec<CandidateFailure>) -> Self {
        Self {
            message: message.into(),
            failures,
        }
    }

    /// Per-candidate breakdown, e.g. `model-a: quota exceeded; model-b: bad key`
    pub fn breakdown(&self) -> String {
        self.failures
            .iter()
            .map(|f| format!("{}: {}", f.candidate, f.error))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

impl std::fmt::Display for AggregateError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.failures.is_empty() {
            write!(f, "{}", self.message)
        } else {
            write!(f, "{}. Errors: {}", self.message, self.breakdown())
        }
    }
}

impl std::error::Error for AggregateError {}

// =============================================================================
// Application Error
// =============================================================================

#[derive(Debug, Error)]
pub enum SeoError {
    // -------------------------------------------------------------------------
    // System Errors (auto From impl)
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    // -------------------------------------------------------------------------
    // LLM Errors
    // -------------------------------------------------------------------------
    /// Structured provider error with category and status
    #[error("LLM error: {0}")]
    Llm(LlmError),

    /// Simple provider error (use Llm variant for structured errors)
    #[error("LLM API error: {0}")]
    LlmApi(String),

    /// An AI response could not be turned into a validated payload
    #[error("{message}")]
    JsonParsing {
        context: String,
        kind: JsonParseKind,
        message: String,
    },

    /// Every raced candidate failed
    #[error("{0}")]
    Aggregate(AggregateError),

    /// Operation timeout with context
    #[error("Timeout after {duration:?}: {operation}")]
    Timeout {
        operation: String,
        duration: Duration,
    },

    // -------------------------------------------------------------------------
    // Domain Errors
    // -------------------------------------------------------------------------
    #[error("Pipeline error in {stage}: {message}")]
    Pipeline { stage: String, message: String },

    #[error("Config error: {0}")]
    Config(String),
}

impl From<LlmError> for SeoError {
    fn from(err: LlmError) -> Self {
        SeoError::Llm(err)
    }
}

impl From<AggregateError> for SeoError {
    fn from(err: AggregateError) -> Self {
        SeoError::Aggregate(err)
    }
}

pub type Result<T> = std::result::Result<T, SeoError>;

// =============================================================================
// Helper Functions
// =============================================================================

impl SeoError {
    pub fn timeout(operation: impl Into<String>, duration: Duration) -> Self {
        Self::Timeout {
            operation: operation.into(),
            duration,
        }
    }

    pub fn json_parsing(
        context: impl Into<String>,
        kind: JsonParseKind,
        message: impl Into<String>,
    ) -> Self {
        Self::JsonParsing {
            context: context.into(),
            kind,
            message: message.into(),
        }
    }

    pub fn pipeline(stage: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Pipeline {
            stage: stage.into(),
            message: message.into(),
        }
    }

    /// HTTP status carried by the error, if the backend reported one
    pub fn http_status(&self) -> Option<u16> {
        match self {
            Self::Llm(e) => e.status,
            _ => None,
        }
    }

    /// Rate limiting or quota exhaustion (status 429 or a matching message)
    pub fn is_rate_limit(&self) -> bool {
        match self {
            Self::Llm(e) => {
                e.status == Some(429)
                    || e.category == ErrorCategory::RateLimit
                    || signals_rate_limit(&e.message.to_lowercase())
            }
            Self::Aggregate(agg) => agg.failures.iter().any(|f| f.error.is_rate_limit()),
            other => signals_rate_limit(&other.to_string().to_lowercase()),
        }
    }

    /// Timeout or abort of an in-flight request
    pub fn is_timeout(&self) -> bool {
        match self {
            Self::Timeout { .. } => true,
            Self::Llm(e) => e.category == ErrorCategory::Timeout,
            _ => false,
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_category_display() {
        assert_eq!(ErrorCategory::RateLimit.to_string(), "RATE_LIMIT");
        assert_eq!(ErrorCategory::Auth.to_string(), "AUTH");
        assert_eq!(ErrorCategory::ParseError.to_string(), "PARSE_ERROR");
    }

    #[test]
    fn test_error_category_transient() {
        assert!(ErrorCategory::RateLimit.is_transient());
        assert!(ErrorCategory::ParseError.is_transient());
        assert!(ErrorCategory::Timeout.is_transient());
        assert!(!ErrorCategory::Auth.is_transient());
        assert!(!ErrorCategory::Network.is_transient());
        assert!(!ErrorCategory::Unavailable.is_transient());
    }

    #[test]
    fn test_classify_rate_limit() {
        let err = ErrorClassifier::classify("RESOURCE_EXHAUSTED: quota exceeded", "gemini");
        assert_eq!(err.category, ErrorCategory::RateLimit);
        assert!(err.is_transient());
    }

    #[test]
    fn test_classify_auth() {
        let err = ErrorClassifier::classify("API key not valid. Please pass a valid key.", "gemini");
        assert_eq!(err.category, ErrorCategory::Auth);
        assert!(!err.is_transient());
    }

    #[test]
    fn test_classify_unknown() {
        let err = ErrorClassifier::classify("Something weird happened", "test");
        assert_eq!(err.category, ErrorCategory::Unknown);
    }

    #[test]
    fn test_classify_http_status() {
        let rate_limit = ErrorClassifier::classify_http_status(429, "slow down", "openai");
        assert_eq!(rate_limit.category, ErrorCategory::RateLimit);
        assert_eq!(rate_limit.status, Some(429));

        let auth = ErrorClassifier::classify_http_status(401, "Unauthorized", "openai");
        assert_eq!(auth.category, ErrorCategory::Auth);

        let server = ErrorClassifier::classify_http_status(503, "Service unavailable", "openai");
        assert_eq!(server.category, ErrorCategory::Unavailable);
        assert!(!server.is_transient());
    }

    #[test]
    fn test_is_rate_limit_by_status_and_message() {
        let by_status = SeoError::Llm(
            LlmError::with_provider(ErrorCategory::Unknown, "nope", "openai").status(429),
        );
        assert!(by_status.is_rate_limit());

        let by_message = SeoError::LlmApi("You exceeded your current quota".to_string());
        assert!(by_message.is_rate_limit());

        let config = SeoError::Config("Unknown backend".to_string());
        assert!(!config.is_rate_limit());
    }

    #[test]
    fn test_aggregate_rate_limit_from_any_candidate() {
        let failures = |second: SeoError| {
            SeoError::from(AggregateError::new(
                "All concurrent models failed",
                vec![
                    CandidateFailure {
                        candidate: "model-a".to_string(),
                        error: SeoError::Config("model_not_found".to_string()),
                    },
                    CandidateFailure {
                        candidate: "model-b".to_string(),
                        error: second,
                    },
                ],
            ))
        };
        assert!(failures(SeoError::LlmApi("RESOURCE_EXHAUSTED".to_string())).is_rate_limit());
        assert!(!failures(SeoError::LlmApi("Internal server error".to_string())).is_rate_limit());
    }

    #[test]
    fn test_aggregate_display_lists_candidates_in_order() {
        let err = AggregateError::new(
            "All concurrent models failed",
            vec![
                CandidateFailure {
                    candidate: "model-a".to_string(),
                    error: SeoError::LlmApi("quota exceeded".to_string()),
                },
                CandidateFailure {
                    candidate: "model-b".to_string(),
                    error: SeoError::Config("bad credentials".to_string()),
                },
            ],
        );
        let text = err.to_string();
        let a = text.find("model-a").unwrap();
        let b = text.find("model-b").unwrap();
        assert!(a < b);
        assert!(text.starts_with("All concurrent models failed"));
    }

    #[test]
    fn test_llm_error_display() {
        let err = LlmError::with_provider(ErrorCategory::RateLimit, "Too many requests", "openai");
        assert_eq!(err.to_string(), "[openai:RATE_LIMIT] Too many requests");

        let err_no_provider = LlmError::new(ErrorCategory::Network, "Connection failed");
        assert_eq!(err_no_provider.to_string(), "[NETWORK] Connection failed");
    }
}
