//! Anthropic Messages API Provider

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{
    Completion, CompletionRequest, LlmProvider, ResponseMetadata, TokenUsage, ensure_success,
    transport_error,
};
use crate::constants::provider as provider_constants;
use crate::types::Result;

const NAME: &str = "anthropic";

pub struct AnthropicProvider {
    api_key: SecretString,
    api_base: String,
    client: reqwest::Client,
}

impl std::fmt::Debug for AnthropicProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnthropicProvider")
            .field("api_key", &"[REDACTED]")
            .field("api_base", &self.api_base)
            .finish()
    }
}

impl AnthropicProvider {
    pub fn new(client: reqwest::Client, api_key: SecretString) -> Self {
        Self {
            api_key,
            api_base: provider_constants::ANTHROPIC_API_BASE.to_string(),
            client,
        }
    }

    fn build_request(request: &CompletionRequest) -> MessagesRequest {
        MessagesRequest {
            model: request.model.clone(),
            system: request.system_instruction.clone(),
            messages: vec![Message {
                role: "user".to_string(),
                content: request.user_prompt.clone(),
            }],
            // Required by the API
            max_tokens: request
                .options
                .max_tokens
                .unwrap_or(provider_constants::ANTHROPIC_DEFAULT_MAX_TOKENS),
        }
    }

    fn into_completion(model: &str, body: MessagesResponse) -> Completion {
        let text = body
            .content
            .into_iter()
            .filter_map(|block| block.text)
            .collect::<String>();

        Completion {
            text,
            sources: Vec::new(),
            usage: body
                .usage
                .map(|u| TokenUsage::new(u.input_tokens, u.output_tokens))
                .unwrap_or_default(),
            metadata: ResponseMetadata {
                model: body.model.unwrap_or_else(|| model.to_string()),
                provider: NAME.to_string(),
            },
        }
    }
}

#[async_trait]
impl LlmProvider for AnthropicProvider {
    async fn complete(&self, request: &CompletionRequest) -> Result<Completion> {
        debug!(model = %request.model, "Sending Anthropic messages request");

        let url = format!("{}/messages", self.api_base);
        let response = self
            .client
            .post(&url)
            .header("x-api-key", self.api_key.expose_secret())
            .header("anthropic-version", provider_constants::ANTHROPIC_VERSION)
            .json(&Self::build_request(request))
            .send()
            .await
            .map_err(|e| transport_error(e, NAME))?;
        let response = ensure_success(response, NAME).await?;

        let body: MessagesResponse = response
            .json()
            .await
            .map_err(|e| transport_error(e, NAME))?;

        Ok(Self::into_completion(&request.model, body))
    }

    fn name(&self) -> &str {
        NAME
    }
}

// Request/Response types

#[derive(Debug, Serialize)]
struct MessagesRequest {
    model: String,
    system: String,
    messages: Vec<Message>,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    model: Option<String>,
    #[serde(default)]
    content: Vec<ContentBlock>,
    usage: Option<Usage>,
}

/// Only text blocks carry `text`; other block types are skipped
#[derive(Debug, Deserialize)]
struct ContentBlock {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    input_tokens: u32,
    output_tokens: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::provider::CallOptions;
    use serde_json::json;

    #[test]
    fn test_default_max_tokens() {
        let request = CompletionRequest {
            model: "claude-3-5-sonnet-20240620".to_string(),
            system_instruction: "sys".to_string(),
            user_prompt: "hi".to_string(),
            options: CallOptions::json(),
        };
        let body = serde_json::to_value(AnthropicProvider::build_request(&request)).unwrap();
        assert_eq!(body["max_tokens"], 4096);
        assert_eq!(body["system"], "sys");
        assert_eq!(body["messages"][0]["content"], "hi");

        let limited = CompletionRequest {
            options: CallOptions::json().with_max_tokens(8192),
            ..request
        };
        let body = serde_json::to_value(AnthropicProvider::build_request(&limited)).unwrap();
        assert_eq!(body["max_tokens"], 8192);
    }

    #[test]
    fn test_text_blocks_are_concatenated() {
        let body: MessagesResponse = serde_json::from_value(json!({
            "model": "claude-3-5-sonnet-20240620",
            "content": [
                {"type": "text", "text": "{\"a\""},
                {"type": "tool_use", "id": "t1", "name": "x", "input": {}},
                {"type": "text", "text": ": 1}"}
            ],
            "usage": {"input_tokens": 3, "output_tokens": 2}
        }))
        .unwrap();
        let completion = AnthropicProvider::into_completion("m", body);
        assert_eq!(completion.text, "{\"a\": 1}");
        assert_eq!(completion.usage.total(), 5);
        assert_eq!(completion.metadata.model, "claude-3-5-sonnet-20240620");
    }
}
