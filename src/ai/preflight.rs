//! Credential Pre-flight Check
//!
//! Validates an API key before an expensive run by sending the smallest
//! possible completion to each candidate model. Several models are raced;
//! one success is enough.
//!
//! Failures are reported as a user-facing message rather than an error, so
//! the CLI can print them as-is.

use tracing::{debug, info, warn};

use super::gateway::{AiGateway, AiTarget, ProviderCallSpec};
use super::provider::{Backend, CallOptions};
use super::timeout::TimeoutConfig;
use crate::constants::provider as provider_constants;
use crate::types::SeoError;
use secrecy::ExposeSecret;

/// Outcome of a credential check
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyCheck {
    pub valid: bool,
    /// Why the check failed; `None` on success
    pub message: Option<String>,
}

impl KeyCheck {
    fn passed() -> Self {
        Self {
            valid: true,
            message: None,
        }
    }

    fn failed(message: impl Into<String>) -> Self {
        Self {
            valid: false,
            message: Some(message.into()),
        }
    }
}

/// Check that `target`'s credential is accepted by its backend.
///
/// Each attempt is bounded by the key-check timeout; there is no retry.
pub async fn validate_credentials(gateway: &AiGateway, target: &AiTarget) -> KeyCheck {
    if target.credential.expose_secret().trim().is_empty() {
        return KeyCheck::failed("API Key cannot be empty.");
    }

    let check_target = target.clone().with_models(check_models(target));
    let options = check_options(target.backend);
    let spec = ProviderCallSpec::new(&check_target, "", "test", options);
    let gateway = gateway.with_timeout(TimeoutConfig::default().key_check);

    info!(
        backend = %target.backend,
        models = ?check_target.models,
        "Validating API key"
    );

    match gateway.call(&spec).await {
        Ok(completion) => {
            debug!(model = %completion.metadata.model, "API key accepted");
            KeyCheck::passed()
        }
        Err(err) => {
            warn!(error = %err, "API key validation failed");
            KeyCheck::failed(friendly_message(&err))
        }
    }
}

/// Configured models, or a cheap per-backend model when none are set
fn check_models(target: &AiTarget) -> Vec<String> {
    let configured: Vec<String> = target
        .models
        .iter()
        .filter(|m| !m.trim().is_empty())
        .cloned()
        .collect();
    if !configured.is_empty() {
        return configured;
    }

    let fallback = match target.backend {
        Backend::OpenRouter => provider_constants::OPENROUTER_CHECK_MODEL,
        Backend::Anthropic => provider_constants::ANTHROPIC_CHECK_MODEL,
        other => other.default_model(),
    };
    vec![fallback.to_string()]
}

fn check_options(backend: Backend) -> CallOptions {
    match backend {
        // A 1-token cap can leave gemini with no candidate at all
        Backend::Gemini => CallOptions::default(),
        _ => CallOptions::default().with_max_tokens(1),
    }
}

/// Map a validation failure to a message the user can act on
pub fn friendly_message(err: &SeoError) -> String {
    if matches!(err, SeoError::Aggregate(_)) {
        return "All configured models failed validation. Please check each model name and your API key."
            .to_string();
    }

    let raw = match err {
        SeoError::Llm(e) => e.message.clone(),
        other => other.to_string(),
    };
    let lower = raw.to_lowercase();

    match err.http_status() {
        Some(401) => return auth_message(),
        Some(403) => {
            return "Permission denied. Please check your project/organization permissions."
                .to_string();
        }
        Some(429) => return "Rate limit exceeded. Please wait a moment or check your plan.".to_string(),
        _ => {}
    }

    if lower.contains("invalid api key") {
        return auth_message();
    }
    if lower.contains("quota") {
        return "Your account has insufficient quota. Please check your billing.".to_string();
    }
    if lower.contains("model_not_found") {
        return "The specified model was not found. Please check the model name.".to_string();
    }
    if lower.contains("api key not valid") {
        return "The provided API Key is not valid. Please check and try again.".to_string();
    }
    if err.is_timeout() {
        return "Request timed out. Please check your network connection.".to_string();
    }

    raw.lines()
        .next()
        .filter(|line| !line.trim().is_empty())
        .map(String::from)
        .unwrap_or_else(|| "An unknown validation error occurred.".to_string())
}

fn auth_message() -> String {
    "Authentication failed. The API key is incorrect, expired, or not authorized for the requested model."
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::mock::MockFactory;
    use crate::ai::provider::Completion;
    use crate::types::{AggregateError, ErrorCategory, ErrorClassifier, LlmError};
    use secrecy::SecretString;
    use std::sync::Arc;
    use std::time::Duration;

    fn gateway(factory: MockFactory) -> AiGateway {
        AiGateway::new(Arc::new(factory), Duration::from_secs(300))
    }

    fn target(backend: Backend, key: &str) -> AiTarget {
        AiTarget::new(backend, SecretString::from(key.to_string()))
    }

    #[tokio::test]
    async fn test_empty_key_fails_without_calling() {
        let factory = MockFactory::text("ok");
        let check = validate_credentials(&gateway(factory.clone()), &target(Backend::Gemini, "  ")).await;
        assert!(!check.valid);
        assert_eq!(check.message.as_deref(), Some("API Key cannot be empty."));
        assert_eq!(factory.calls(), 0);
    }

    #[tokio::test]
    async fn test_accepted_key() {
        let factory = MockFactory::new(|req| {
            assert_eq!(req.model, "claude-3-haiku-20240307");
            assert_eq!(req.options.max_tokens, Some(1));
            Ok(Completion::text_only("h"))
        });
        let check = validate_credentials(&gateway(factory), &target(Backend::Anthropic, "sk-ant")).await;
        assert_eq!(check, KeyCheck::passed());
    }

    #[tokio::test]
    async fn test_one_working_model_is_enough() {
        let factory = MockFactory::new(|req| {
            if req.model == "good/model" {
                Ok(Completion::text_only("ok"))
            } else {
                Err(ErrorClassifier::classify_http_status(404, "model_not_found", "openrouter").into())
            }
        });
        let t = target(Backend::OpenRouter, "sk-or")
            .with_models(vec!["bad/model".to_string(), "good/model".to_string()]);
        assert!(validate_credentials(&gateway(factory), &t).await.valid);
    }

    #[tokio::test(start_paused = true)]
    async fn test_check_is_bounded_by_key_check_timeout() {
        let factory = MockFactory::text("late").with_delay("gemini-2.5-flash", Duration::from_secs(60));
        let check = validate_credentials(&gateway(factory), &target(Backend::Gemini, "AIza")).await;
        assert!(!check.valid);
        assert_eq!(
            check.message.as_deref(),
            Some("Request timed out. Please check your network connection.")
        );
    }

    #[test]
    fn test_check_models_fallbacks() {
        assert_eq!(
            check_models(&target(Backend::OpenRouter, "k")),
            vec!["mistralai/mistral-7b-instruct"]
        );
        assert_eq!(check_models(&target(Backend::OpenAi, "k")), vec!["gpt-4o"]);
        assert_eq!(
            check_models(&target(Backend::Gemini, "k").with_model("gemini-2.5-pro")),
            vec!["gemini-2.5-pro"]
        );
    }

    #[test]
    fn test_friendly_messages() {
        let status = |code: u16, msg: &str| -> SeoError {
            ErrorClassifier::classify_http_status(code, msg, "openai").into()
        };

        assert!(friendly_message(&status(401, "nope")).starts_with("Authentication failed"));
        assert!(friendly_message(&status(403, "nope")).starts_with("Permission denied"));
        assert!(friendly_message(&status(429, "slow")).starts_with("Rate limit exceeded"));
        assert!(
            friendly_message(&status(400, "insufficient_quota")).contains("insufficient quota")
        );
        assert!(friendly_message(&status(404, "model_not_found")).contains("model was not found"));
        assert!(
            friendly_message(&status(400, "API key not valid. Please pass a valid API key."))
                .starts_with("The provided API Key is not valid")
        );
        assert!(
            friendly_message(&SeoError::from(AggregateError::new("All concurrent models failed", vec![])))
                .starts_with("All configured models failed validation")
        );

        let other = SeoError::Llm(LlmError::new(
            ErrorCategory::Unknown,
            "Something odd\nwith a stack trace",
        ));
        assert_eq!(friendly_message(&other), "Something odd");
    }
}
