//! AI Call Gateway
//!
//! One request/response contract over every backend. A call names the
//! backend, the caller's credential and one or more models; several models
//! are raced and the first answer wins.

use std::sync::Arc;
use std::time::Duration;

use secrecy::SecretString;
use tracing::{debug, instrument};

use super::provider::{
    Backend, CallOptions, Completion, CompletionRequest, HttpProviderFactory, LlmProvider,
    ProviderFactory, dedupe_sources,
};
use super::race::first_success_labeled;
use super::timeout::with_timeout;
use crate::types::{AggregateError, Result, SeoError};

/// Backend, credential and candidate models reused across calls
#[derive(Clone)]
pub struct AiTarget {
    pub backend: Backend,
    pub credential: SecretString,
    /// Candidate models; empty means the backend default
    pub models: Vec<String>,
}

impl std::fmt::Debug for AiTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AiTarget")
            .field("backend", &self.backend)
            .field("credential", &"[REDACTED]")
            .field("models", &self.models)
            .finish()
    }
}

impl AiTarget {
    pub fn new(backend: Backend, credential: SecretString) -> Self {
        Self {
            backend,
            credential,
            models: Vec::new(),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.models = vec![model.into()];
        self
    }

    pub fn with_models(mut self, models: Vec<String>) -> Self {
        self.models = models;
        self
    }

    /// Models to call: the configured ones, or the backend default
    pub fn resolved_models(&self) -> Vec<String> {
        let models: Vec<String> = self
            .models
            .iter()
            .map(|m| m.trim())
            .filter(|m| !m.is_empty())
            .map(String::from)
            .collect();
        if models.is_empty() {
            vec![self.backend.default_model().to_string()]
        } else {
            models
        }
    }
}

/// Everything one logical AI call needs. Built per call and dropped after it.
#[derive(Debug, Clone)]
pub struct ProviderCallSpec {
    pub target: AiTarget,
    pub system_instruction: String,
    pub user_prompt: String,
    pub options: CallOptions,
}

impl ProviderCallSpec {
    pub fn new(
        target: &AiTarget,
        system_instruction: impl Into<String>,
        user_prompt: impl Into<String>,
        options: CallOptions,
    ) -> Self {
        Self {
            target: target.clone(),
            system_instruction: system_instruction.into(),
            user_prompt: user_prompt.into(),
            options,
        }
    }
}

/// Dispatches call specs to providers built by a [`ProviderFactory`]
#[derive(Clone)]
pub struct AiGateway {
    factory: Arc<dyn ProviderFactory>,
    timeout: Duration,
}

impl std::fmt::Debug for AiGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AiGateway")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl AiGateway {
    pub fn new(factory: Arc<dyn ProviderFactory>, timeout: Duration) -> Self {
        Self { factory, timeout }
    }

    /// Gateway over the real HTTP backends
    pub fn http(timeout: Duration) -> Result<Self> {
        Ok(Self::new(Arc::new(HttpProviderFactory::new()?), timeout))
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Same gateway with a different per-request deadline
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        Self {
            factory: Arc::clone(&self.factory),
            timeout,
        }
    }

    #[instrument(skip_all, fields(backend = %spec.target.backend))]
    pub async fn call(&self, spec: &ProviderCallSpec) -> Result<Completion> {
        let provider = self
            .factory
            .create(spec.target.backend, &spec.target.credential)?;
        let models = spec.target.resolved_models();

        if let [model] = models.as_slice() {
            return self.call_model(provider.as_ref(), spec, model).await;
        }

        debug!(candidates = models.len(), "Racing models");
        let candidates = models
            .iter()
            .map(|model| (model.clone(), self.call_model(provider.as_ref(), spec, model)))
            .collect();

        first_success_labeled(candidates).await.map_err(|err| match err {
            SeoError::Aggregate(agg) => {
                AggregateError::new("All concurrent models failed", agg.failures).into()
            }
            other => other,
        })
    }

    async fn call_model(
        &self,
        provider: &dyn LlmProvider,
        spec: &ProviderCallSpec,
        model: &str,
    ) -> Result<Completion> {
        let request = CompletionRequest {
            model: model.to_string(),
            system_instruction: spec.system_instruction.clone(),
            user_prompt: spec.user_prompt.clone(),
            options: spec.options,
        };

        let operation = format!("{} completion ({})", provider.name(), model);
        let completion = with_timeout(self.timeout, provider.complete(&request), &operation).await?;

        debug!(
            model,
            chars = completion.text.len(),
            tokens = completion.usage.total(),
            sources = completion.sources.len(),
            "Completion received"
        );

        Ok(Completion {
            sources: dedupe_sources(completion.sources),
            ..completion
        })
    }
}
