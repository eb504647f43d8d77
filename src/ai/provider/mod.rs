//! LLM Provider Abstraction
//!
//! Defines the `LlmProvider` trait every backend implements. A request carries
//! a system instruction, a user prompt and call options; a response carries the
//! raw text plus any search-grounding citations.
//!
//! ## Backends
//!
//! - `gemini`: native search grounding and JSON response mode
//! - `openai`: chat completions with `json_object` response format
//! - `openrouter`: OpenAI-compatible endpoint, accepts a model list
//! - `anthropic`: messages API

mod anthropic;
mod gemini;
mod openai;

pub use anthropic::AnthropicProvider;
pub use gemini::GeminiProvider;
pub use openai::OpenAiProvider;

use async_trait::async_trait;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;

use crate::constants::provider as provider_constants;
use crate::types::{ErrorCategory, ErrorClassifier, LlmError, Result, SeoError};

// =============================================================================
// Backend
// =============================================================================

/// Supported AI backends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    Gemini,
    #[serde(rename = "openai")]
    OpenAi,
    #[serde(rename = "openrouter")]
    OpenRouter,
    Anthropic,
}

impl Backend {
    pub const ALL: [Backend; 4] = [
        Backend::Gemini,
        Backend::OpenAi,
        Backend::OpenRouter,
        Backend::Anthropic,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Backend::Gemini => "gemini",
            Backend::OpenAi => "openai",
            Backend::OpenRouter => "openrouter",
            Backend::Anthropic => "anthropic",
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            Backend::Gemini => provider_constants::GEMINI_DEFAULT_MODEL,
            Backend::OpenAi => provider_constants::OPENAI_DEFAULT_MODEL,
            Backend::OpenRouter => provider_constants::OPENROUTER_DEFAULT_MODEL,
            Backend::Anthropic => provider_constants::ANTHROPIC_DEFAULT_MODEL,
        }
    }

    /// Environment variable consulted when no key is configured
    pub fn api_key_env(&self) -> &'static str {
        match self {
            Backend::Gemini => "GEMINI_API_KEY",
            Backend::OpenAi => "OPENAI_API_KEY",
            Backend::OpenRouter => "OPENROUTER_API_KEY",
            Backend::Anthropic => "ANTHROPIC_API_KEY",
        }
    }

    /// Whether the backend can ground answers with live web search
    pub fn supports_search_grounding(&self) -> bool {
        matches!(self, Backend::Gemini)
    }
}

impl std::fmt::Display for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Backend {
    type Err = SeoError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "gemini" => Ok(Backend::Gemini),
            "openai" => Ok(Backend::OpenAi),
            "openrouter" => Ok(Backend::OpenRouter),
            "anthropic" => Ok(Backend::Anthropic),
            other => Err(SeoError::Config(format!(
                "Unsupported AI provider: {}. Supported: gemini, openai, openrouter, anthropic",
                other
            ))),
        }
    }
}

// =============================================================================
// Request / Response
// =============================================================================

/// Per-call options shared by every backend
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallOptions {
    /// Ground the answer with web search (gemini only)
    pub search_grounding: bool,
    /// Ask the backend to constrain output to a JSON object where supported
    pub json_mode: bool,
    /// Output token limit
    pub max_tokens: Option<u32>,
}

impl CallOptions {
    pub fn json() -> Self {
        Self {
            json_mode: true,
            ..Self::default()
        }
    }

    pub fn grounded_json() -> Self {
        Self {
            search_grounding: true,
            json_mode: true,
            max_tokens: None,
        }
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }
}

/// One model call
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub model: String,
    pub system_instruction: String,
    pub user_prompt: String,
    pub options: CallOptions,
}

/// Citation returned by a search-grounded call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroundingSource {
    pub uri: String,
    #[serde(default)]
    pub title: String,
}

/// Token usage reported by the backend
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

impl TokenUsage {
    pub fn new(input_tokens: u32, output_tokens: u32) -> Self {
        Self {
            input_tokens,
            output_tokens,
        }
    }

    pub fn total(&self) -> u32 {
        self.input_tokens.saturating_add(self.output_tokens)
    }
}

/// Response metadata
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResponseMetadata {
    /// Model that produced the answer
    pub model: String,
    /// Provider name
    pub provider: String,
}

/// Raw text answer plus citations and usage
#[derive(Debug, Clone, Default)]
pub struct Completion {
    pub text: String,
    pub sources: Vec<GroundingSource>,
    pub usage: TokenUsage,
    pub metadata: ResponseMetadata,
}

impl Completion {
    /// Text-only completion (usage unknown)
    pub fn text_only(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }
}

/// Drop citations whose URI was already seen; first occurrence wins
pub fn dedupe_sources(sources: impl IntoIterator<Item = GroundingSource>) -> Vec<GroundingSource> {
    let mut seen = HashSet::new();
    sources
        .into_iter()
        .filter(|s| !s.uri.is_empty() && seen.insert(s.uri.clone()))
        .collect()
}

// =============================================================================
// LLM Provider Trait
// =============================================================================

/// A generative-AI backend bound to one credential
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Run one completion and return the raw answer text
    async fn complete(&self, request: &CompletionRequest) -> Result<Completion>;

    /// Provider name for logging
    fn name(&self) -> &str;
}

/// Shared LLM provider type for concurrent access across racing candidates
pub type SharedProvider = Arc<dyn LlmProvider>;

// =============================================================================
// Provider Factory
// =============================================================================

/// Builds a provider for one call from the backend and the caller's credential
pub trait ProviderFactory: Send + Sync {
    fn create(&self, backend: Backend, credential: &SecretString) -> Result<SharedProvider>;
}

/// Factory for the real HTTP backends. The HTTP client (connection pool) is
/// shared; credentials live only as long as the provider built for a call.
#[derive(Debug, Clone)]
pub struct HttpProviderFactory {
    client: reqwest::Client,
}

impl HttpProviderFactory {
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("seoplan/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| SeoError::LlmApi(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self { client })
    }
}

impl ProviderFactory for HttpProviderFactory {
    fn create(&self, backend: Backend, credential: &SecretString) -> Result<SharedProvider> {
        let client = self.client.clone();
        let key = credential.clone();
        Ok(match backend {
            Backend::Gemini => Arc::new(GeminiProvider::new(client, key)),
            Backend::OpenAi => Arc::new(OpenAiProvider::openai(client, key)),
            Backend::OpenRouter => Arc::new(OpenAiProvider::openrouter(client, key)),
            Backend::Anthropic => Arc::new(AnthropicProvider::new(client, key)),
        })
    }
}

// =============================================================================
// HTTP helpers shared by backends
// =============================================================================

/// Turn a non-success HTTP response into a classified `LlmError`
pub(crate) async fn ensure_success(
    response: reqwest::Response,
    provider: &str,
) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = api_error_message(&body).unwrap_or(body);
    Err(ErrorClassifier::classify_http_status(
        status.as_u16(),
        &format!("{} API error ({}): {}", provider, status, message),
        provider,
    )
    .into())
}

/// Transport failure (connect, timeout, body read)
pub(crate) fn transport_error(err: reqwest::Error, provider: &str) -> SeoError {
    let message = format!("{} request failed: {}", provider, err);
    if err.is_timeout() {
        return LlmError::with_provider(ErrorCategory::Timeout, message, provider).into();
    }
    ErrorClassifier::classify(&message, provider).into()
}

/// Pull `error.message` out of the common JSON error envelope
fn api_error_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    value
        .get("error")
        .and_then(|e| e.get("message").or(Some(e)))
        .and_then(|m| m.as_str())
        .map(String::from)
}
