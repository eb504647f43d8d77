//! Global Constants
//!
//! Centralized defaults for configuration and tuning.
//! Config structs default to these values; nothing reads them as hidden state.

/// Retry policy constants
pub mod retry {
    /// Total attempts, including the first call
    pub const MAX_ATTEMPTS: u32 = 5;

    /// Base delay for exponential backoff (milliseconds)
    pub const BASE_DELAY_MS: u64 = 2000;

    /// Upper bound (exclusive) of the random jitter added to each delay (milliseconds)
    pub const MAX_JITTER_MS: u64 = 1000;
}

/// Pipeline constants
pub mod pipeline {
    /// Concurrent detail calls in the action plan detail stage
    pub const DETAIL_CONCURRENCY: usize = 5;

    /// Output token limit for a single action's detail call
    pub const DETAIL_MAX_TOKENS: u32 = 8192;

    /// Concurrent page-analysis batches
    pub const BATCH_CONCURRENCY: usize = 5;

    /// URLs per page-analysis batch
    pub const BATCH_SIZE: usize = 15;

    /// URLs analysed per run, after upstream ranking
    pub const MAX_URLS: usize = 200;
}

/// Provider constants
pub mod provider {
    pub const GEMINI_DEFAULT_MODEL: &str = "gemini-2.5-flash";
    pub const OPENAI_DEFAULT_MODEL: &str = "gpt-4o";
    pub const OPENROUTER_DEFAULT_MODEL: &str = "openai/gpt-4o";
    pub const ANTHROPIC_DEFAULT_MODEL: &str = "claude-3-5-sonnet-20240620";

    /// Model used for credential checks on OpenRouter when none is configured
    pub const OPENROUTER_CHECK_MODEL: &str = "mistralai/mistral-7b-instruct";
    /// Model used for credential checks on Anthropic
    pub const ANTHROPIC_CHECK_MODEL: &str = "claude-3-haiku-20240307";

    /// Anthropic requires max_tokens on every request
    pub const ANTHROPIC_DEFAULT_MAX_TOKENS: u32 = 4096;

    pub const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
    pub const OPENAI_API_BASE: &str = "https://api.openai.com/v1";
    pub const OPENROUTER_API_BASE: &str = "https://openrouter.ai/api/v1";
    pub const ANTHROPIC_API_BASE: &str = "https://api.anthropic.com/v1";
    pub const ANTHROPIC_VERSION: &str = "2023-06-01";
}

/// HTTP/Network constants
pub mod network {
    /// Default request timeout (seconds)
    pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

    /// Timeout for a credential check attempt (seconds)
    pub const KEY_CHECK_TIMEOUT_SECS: u64 = 15;
}

/// Report storage constants
pub mod storage {
    /// Default report directory, relative to the working directory
    pub const REPORTS_DIR: &str = ".seoplan/reports";

    /// Report snapshots kept before the oldest are pruned
    pub const HISTORY_LIMIT: usize = 10;
}

/// Extractor constants
pub mod extract {
    /// Characters of raw text included in "no JSON found" diagnostics
    pub const PREVIEW_CHARS: usize = 100;

    /// Lowercased phrases that mark a refusal or provider error instead of a payload
    pub const BLOCKING_PHRASES: &[&str] = &["i apologize", "cannot", "api key not valid", "rate limit"];
}
