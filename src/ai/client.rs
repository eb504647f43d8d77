//! Structured AI Client
//!
//! The call path every analysis service uses:
//! retry policy → gateway → tolerant JSON extraction → typed payload.
//! Each attempt rebuilds the call spec and re-validates the answer, so a
//! malformed response is retried like any other transient failure.

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use super::gateway::{AiGateway, AiTarget, ProviderCallSpec};
use super::provider::{CallOptions, GroundingSource};
use super::retry::RetryPolicy;
use super::validation::{Validator, robust_parse_as};
use crate::types::{Result, SeoError};

/// Validated payload plus the citations the call returned
#[derive(Debug, Clone)]
pub struct Structured<T> {
    pub value: T,
    pub sources: Vec<GroundingSource>,
}

/// Gateway, retry policy and target bundled for repeated calls
#[derive(Clone, Debug)]
pub struct AiClient {
    gateway: AiGateway,
    retry: RetryPolicy,
    target: AiTarget,
}

impl AiClient {
    pub fn new(gateway: AiGateway, retry: RetryPolicy, target: AiTarget) -> Self {
        Self {
            gateway,
            retry,
            target,
        }
    }

    pub fn target(&self) -> &AiTarget {
        &self.target
    }

    pub fn gateway(&self) -> &AiGateway {
        &self.gateway
    }

    /// One retried call whose answer must satisfy `validator` and decode into `T`
    pub async fn generate_structured<T>(
        &self,
        system_instruction: &str,
        user_prompt: &str,
        options: CallOptions,
        validator: Validator,
        context: &str,
    ) -> Result<Structured<T>>
    where
        T: DeserializeOwned,
    {
        self.retry
            .execute(|| async {
                let spec =
                    ProviderCallSpec::new(&self.target, system_instruction, user_prompt, options);
                let completion = self.gateway.call(&spec).await?;
                debug!(context, "Validating response");
                let value = robust_parse_as(&completion.text, validator, context)?;
                Ok(Structured {
                    value,
                    sources: completion.sources,
                })
            })
            .await
    }

    /// Like [`generate_structured`](Self::generate_structured), dropping citations
    pub async fn generate_json<T>(
        &self,
        system_instruction: &str,
        user_prompt: &str,
        options: CallOptions,
        validator: Validator,
        context: &str,
    ) -> Result<T>
    where
        T: DeserializeOwned,
    {
        self.generate_structured(system_instruction, user_prompt, options, validator, context)
            .await
            .map(|structured| structured.value)
    }

    /// Untyped variant returning the validated JSON value
    pub async fn generate_value(
        &self,
        system_instruction: &str,
        user_prompt: &str,
        options: CallOptions,
        validator: Validator,
        context: &str,
    ) -> Result<Value> {
        self.generate_json(system_instruction, user_prompt, options, validator, context)
            .await
    }

    /// One retried plain-text call; `require_text` rejects blank answers
    pub async fn generate_text(
        &self,
        system_instruction: &str,
        user_prompt: &str,
        options: CallOptions,
        context: &str,
        require_text: bool,
    ) -> Result<String> {
        self.retry
            .execute(|| async {
                let spec =
                    ProviderCallSpec::new(&self.target, system_instruction, user_prompt, options);
                let completion = self.gateway.call(&spec).await?;
                if require_text && completion.text.trim().is_empty() {
                    return Err(SeoError::LlmApi(format!(
                        "{} AI returned an empty response.",
                        context
                    )));
                }
                Ok(completion.text)
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::mock::MockFactory;
    use crate::ai::provider::{Backend, Completion};
    use crate::ai::validation::shape::has_number;
    use crate::config::RetryConfig;
    use secrecy::SecretString;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn client(factory: MockFactory) -> AiClient {
        AiClient::new(
            AiGateway::new(Arc::new(factory), Duration::from_secs(5)),
            RetryPolicy::new(RetryConfig {
                max_attempts: 3,
                base_delay_ms: 10,
                max_jitter_ms: 0,
            }),
            AiTarget::new(Backend::Gemini, SecretString::from("k".to_string())),
        )
    }

    fn has_score(v: &Value) -> bool {
        has_number(v, "score")
    }

    #[tokio::test(start_paused = true)]
    async fn test_malformed_answer_is_retried() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&attempts);
        let factory = MockFactory::new(move |_| {
            let n = counter.fetch_add(1, Ordering::SeqCst);
            let text = if n == 0 {
                "Sorry, here it is: {\"score\": \"high\"}"
            } else {
                "```json\n{\"score\": 9}\n```"
            };
            Ok(Completion::text_only(text))
        });

        let value = client(factory)
            .generate_value("sys", "user", CallOptions::json(), has_score, "score")
            .await
            .unwrap();
        assert_eq!(value["score"], 9);
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausted_retries_surface_parse_error() {
        let factory = MockFactory::text("I apologize, I cannot do that.");
        let calls = factory.clone();
        let err = client(factory)
            .generate_value("sys", "user", CallOptions::json(), has_score, "score check")
            .await
            .unwrap_err();
        assert!(matches!(err, SeoError::JsonParsing { .. }));
        assert!(err.to_string().contains("score check"));
        assert_eq!(calls.calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_text_is_rejected_when_required() {
        let factory = MockFactory::text("   ");
        let client = client(factory);
        let err = client
            .generate_text("sys", "user", CallOptions::default(), "SERP comparison", true)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("empty response"));

        let text = client
            .generate_text("sys", "user", CallOptions::default(), "draft", false)
            .await
            .unwrap();
        assert_eq!(text, "   ");
    }
}
