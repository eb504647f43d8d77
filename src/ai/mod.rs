//! AI Orchestration Layer
//!
//! Everything between a caller and a generative-AI backend: bounded fan-out,
//! retry with backoff, multi-model racing, tolerant JSON extraction, and the
//! provider backends themselves.

pub mod client;
pub mod executor;
pub mod gateway;
#[cfg(test)]
pub(crate) mod mock;
pub mod preflight;
pub mod provider;
pub mod race;
pub mod retry;
pub mod timeout;
pub mod validation;

pub use client::{AiClient, Structured};
pub use executor::{Progress, ProgressFn, TaskOutcome, execute_concurrent};
pub use gateway::{AiGateway, AiTarget, ProviderCallSpec};
pub use preflight::{KeyCheck, validate_credentials};
pub use provider::{
    Backend, CallOptions, Completion, CompletionRequest, GroundingSource, HttpProviderFactory,
    LlmProvider, ProviderFactory, ResponseMetadata, SharedProvider, TokenUsage,
};
pub use race::{first_success, first_success_labeled};
pub use retry::{RetryPolicy, is_transient};
pub use timeout::{TimeoutConfig, with_timeout};
pub use validation::{Validator, extract_json_candidate, robust_parse, robust_parse_as};
