//! Scripted provider for tests

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use secrecy::SecretString;

use super::provider::{
    Backend, Completion, CompletionRequest, LlmProvider, ProviderFactory, ResponseMetadata,
    SharedProvider,
};
use crate::types::Result;

type Responder = dyn Fn(&CompletionRequest) -> Result<Completion> + Send + Sync;

/// Factory whose providers answer through one closure
#[derive(Clone)]
pub(crate) struct MockFactory {
    responder: Arc<Responder>,
    delays: Arc<HashMap<String, Duration>>,
    calls: Arc<AtomicUsize>,
}

impl MockFactory {
    pub fn new(responder: impl Fn(&CompletionRequest) -> Result<Completion> + Send + Sync + 'static) -> Self {
        Self {
            responder: Arc::new(responder),
            delays: Arc::new(HashMap::new()),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Answer every call with the same text
    pub fn text(text: &str) -> Self {
        let text = text.to_string();
        Self::new(move |_| Ok(Completion::text_only(text.clone())))
    }

    pub fn with_delay(mut self, model: &str, delay: Duration) -> Self {
        let mut delays = (*self.delays).clone();
        delays.insert(model.to_string(), delay);
        self.delays = Arc::new(delays);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ProviderFactory for MockFactory {
    fn create(&self, backend: Backend, _credential: &SecretString) -> Result<SharedProvider> {
        Ok(Arc::new(MockProvider {
            backend,
            factory: self.clone(),
        }))
    }
}

struct MockProvider {
    backend: Backend,
    factory: MockFactory,
}

#[async_trait]
impl LlmProvider for MockProvider {
    async fn complete(&self, request: &CompletionRequest) -> Result<Completion> {
        self.factory.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.factory.delays.get(&request.model) {
            tokio::time::sleep(*delay).await;
        }
        let mut completion = (self.factory.responder)(request)?;
        completion.metadata = ResponseMetadata {
            model: request.model.clone(),
            provider: self.backend.to_string(),
        };
        Ok(completion)
    }

    fn name(&self) -> &str {
        self.backend.as_str()
    }
}
