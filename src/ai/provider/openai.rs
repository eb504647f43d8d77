//! OpenAI-compatible Chat Completions Provider
//!
//! Serves both OpenAI and OpenRouter; they differ only in base URL and the
//! attribution headers OpenRouter asks for.

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

const OPENROUTER_HEADERS: &[(&str, &str)] = &[
    ("HTTP-Referer", "https://github.com/seoplan/seoplan"),
    ("X-Title", "seoplan"),
];

/// Chat completions provider with secure API key handling
pub struct OpenAiProvider {
    name: &'static str,
    /// API key stored securely - never exposed in logs or debug output
    api_key: SecretString,
    api_base: String,
    extra_headers: &'static [(&'static str, &'static str)],
    client: reqwest::Client,
}

impl std::fmt::Debug for OpenAiProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiProvider")
            .field("name", &self.name)
            .field("api_key", &"[REDACTED]")
            .field("api_base", &self.api_base)
            .finish()
    }
}

impl OpenAiProvider {
    pub fn openai(client: reqwest::Client, api_key: SecretString) -> Self {
        Self {
            name: "openai",
            api_key,
            api_base: provider_constants::OPENAI_API_BASE.to_string(),
            extra_headers: &[],
            client,
        }
    }

    pub fn openrouter(client: reqwest::Client, api_key: SecretString) -> Self {
        Self {
            name: "openrouter",
            api_key,
            api_base: provider_constants::OPENROUTER_API_BASE.to_string(),
            extra_headers: OPENROUTER_HEADERS,
            client,
        }
    }

    fn build_request(request: &CompletionRequest) -> ChatCompletionRequest {
        ChatCompletionRequest {
            model: request.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: request.system_instruction.clone(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: request.user_prompt.clone(),
                },
            ],
            max_tokens: request.options.max_tokens,
            response_format: request.options.json_mode.then(|| ResponseFormat {
                format_type: "json_object".to_string(),
            }),
        }
    }

    fn into_completion(&self, model: &str, body: ChatCompletionResponse) -> Completion {
        let usage = body
            .usage
            .map(|u| TokenUsage::new(u.prompt_tokens, u.completion_tokens))
            .unwrap_or_default();

        let text = body
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default();

        Completion {
            text,
            sources: Vec::new(),
            usage,
            metadata: ResponseMetadata {
                model: body.model.unwrap_or_else(|| model.to_string()),
                provider: self.name.to_string(),
            },
        }
    }
}

#[async_trait]
impl LlmProvider for OpenAiProvider {
    async fn complete(&self, request: &CompletionRequest) -> Result<Completion> {
        debug!(provider = self.name, model = %request.model, "Sending chat completion");

        let url = format!("{}/chat/completions", self.api_base);
        let mut builder = self
            .client
            .post(&url)
            .bearer_auth(self.api_key.expose_secret())
            .json(&Self::build_request(request));
        for (name, value) in self.extra_headers {
            builder = builder.header(*name, *value);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| transport_error(e, self.name))?;
        let response = ensure_success(response, self.name).await?;

        let body: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| transport_error(e, self.name))?;

        Ok(self.into_completion(&request.model, body))
    }

    fn name(&self) -> &str {
        self.name
    }
}

// Request/Response types

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    choices: Vec<Choice>,
    usage: Option<UsageInfo>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UsageInfo {
    prompt_tokens: u32,
    completion_tokens: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::provider::CallOptions;
    use serde_json::json;

    fn request(options: CallOptions) -> CompletionRequest {
        CompletionRequest {
            model: "gpt-4o".to_string(),
            system_instruction: "You are an SEO analyst.".to_string(),
            user_prompt: "Audit https://example.com".to_string(),
            options,
        }
    }

    #[test]
    fn test_json_mode_sets_response_format() {
        let body = serde_json::to_value(OpenAiProvider::build_request(&request(
            CallOptions::json().with_max_tokens(8192),
        )))
        .unwrap();
        assert_eq!(body["response_format"]["type"], "json_object");
        assert_eq!(body["max_tokens"], 8192);
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["content"], "Audit https://example.com");
    }

    #[test]
    fn test_plain_mode_omits_optional_fields() {
        let body =
            serde_json::to_value(OpenAiProvider::build_request(&request(CallOptions::default())))
                .unwrap();
        assert!(body.get("response_format").is_none());
        assert!(body.get("max_tokens").is_none());
    }

    #[test]
    fn test_response_parsing() {
        let provider = OpenAiProvider::openrouter(
            reqwest::Client::new(),
            SecretString::from("sk-test".to_string()),
        );
        let body: ChatCompletionResponse = serde_json::from_value(json!({
            "model": "openai/gpt-4o",
            "choices": [{"message": {"role": "assistant", "content": "{\"ok\": true}"}}],
            "usage": {"prompt_tokens": 12, "completion_tokens": 5}
        }))
        .unwrap();

        let completion = provider.into_completion("openai/gpt-4o", body);
        assert_eq!(completion.text, "{\"ok\": true}");
        assert_eq!(completion.usage.total(), 17);
        assert_eq!(completion.metadata.provider, "openrouter");
    }

    #[test]
    fn test_missing_content_is_empty_text() {
        let provider =
            OpenAiProvider::openai(reqwest::Client::new(), SecretString::from("k".to_string()));
        let body: ChatCompletionResponse =
            serde_json::from_value(json!({"choices": [{"message": {"content": null}}]})).unwrap();
        let completion = provider.into_completion("gpt-4o", body);
        assert!(completion.text.is_empty());
        assert_eq!(completion.metadata.model, "gpt-4o");
    }

    #[test]
    fn test_debug_redacts_key() {
        let provider = OpenAiProvider::openai(
            reqwest::Client::new(),
            SecretString::from("sk-secret-value".to_string()),
        );
        let debug = format!("{:?}", provider);
        assert!(!debug.contains("sk-secret-value"));
        assert!(debug.contains("[REDACTED]"));
    }
}
