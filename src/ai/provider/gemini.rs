//! Gemini Provider
//!
//! Uses the `generateContent` REST endpoint. The only backend with native
//! web-search grounding; citations come back in the candidate's grounding
//! metadata and are deduplicated by URI.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{
    Completion, CompletionRequest, GroundingSource, LlmProvider, ResponseMetadata, TokenUsage,
    dedupe_sources, ensure_success, transport_error,
};
use crate::constants::provider as provider_constants;
use crate::types::{ErrorCategory, LlmError, Result};

const NAME: &str = "gemini";

/// Model that splits its output budget between thinking and answer
const THINKING_MODEL: &str = "gemini-2.5-flash";

pub struct GeminiProvider {
    api_key: SecretString,
    api_base: String,
    client: reqwest::Client,
}

impl std::fmt::Debug for GeminiProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiProvider")
            .field("api_key", &"[REDACTED]")
            .field("api_base", &self.api_base)
            .finish()
    }
}

impl GeminiProvider {
    pub fn new(client: reqwest::Client, api_key: SecretString) -> Self {
        Self {
            api_key,
            api_base: provider_constants::GEMINI_API_BASE.to_string(),
            client,
        }
    }

    fn build_request(request: &CompletionRequest) -> GenerateContentRequest {
        let options = request.options;

        // Grounding and JSON mime type cannot be combined
        let response_mime_type = (options.json_mode && !options.search_grounding)
            .then(|| "application/json".to_string());

        let thinking_config = options
            .max_tokens
            .filter(|_| request.model == THINKING_MODEL)
            .map(|max| ThinkingConfig {
                thinking_budget: max / 2,
            });

        GenerateContentRequest {
            system_instruction: Content {
                role: None,
                parts: vec![Part::text(&request.system_instruction)],
            },
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![Part::text(&request.user_prompt)],
            }],
            tools: options
                .search_grounding
                .then(|| vec![Tool {
                    google_search: serde_json::Map::new(),
                }]),
            generation_config: GenerationConfig {
                response_mime_type,
                max_output_tokens: options.max_tokens,
                thinking_config,
            },
        }
    }

    fn into_completion(model: &str, body: GenerateContentResponse) -> Result<Completion> {
        let usage = body
            .usage_metadata
            .map(|u| TokenUsage::new(u.prompt_token_count, u.candidates_token_count))
            .unwrap_or_default();

        let Some(candidate) = body.candidates.into_iter().next() else {
            let reason = body
                .prompt_feedback
                .and_then(|f| f.block_reason)
                .unwrap_or_else(|| "no candidates returned".to_string());
            return Err(LlmError::with_provider(
                ErrorCategory::BadRequest,
                format!("Gemini returned no answer: {}", reason),
                NAME,
            )
            .into());
        };

        let text = candidate
            .content
            .map(|c| {
                c.parts
                    .into_iter()
                    .filter(|p| !p.thought)
                    .filter_map(|p| p.text)
                    .collect::<String>()
            })
            .unwrap_or_default();

        let sources = candidate
            .grounding_metadata
            .map(|m| {
                dedupe_sources(m.grounding_chunks.into_iter().filter_map(|chunk| {
                    chunk.web.map(|web| GroundingSource {
                        uri: web.uri.unwrap_or_default(),
                        title: web.title.unwrap_or_default(),
                    })
                }))
            })
            .unwrap_or_default();

        Ok(Completion {
            text,
            sources,
            usage,
            metadata: ResponseMetadata {
                model: model.to_string(),
                provider: NAME.to_string(),
            },
        })
    }
}

#[async_trait]
impl LlmProvider for GeminiProvider {
    async fn complete(&self, request: &CompletionRequest) -> Result<Completion> {
        debug!(
            model = %request.model,
            grounding = request.options.search_grounding,
            "Sending Gemini generateContent"
        );

        let url = format!("{}/models/{}:generateContent", self.api_base, request.model);
        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", self.api_key.expose_secret())
            .json(&Self::build_request(request))
            .send()
            .await
            .map_err(|e| transport_error(e, NAME))?;
        let response = ensure_success(response, NAME).await?;

        let body: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| transport_error(e, NAME))?;

        Self::into_completion(&request.model, body)
    }

    fn name(&self) -> &str {
        NAME
    }
}

// Request/Response types

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    system_instruction: Content,
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<Tool>>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(default, skip_serializing)]
    thought: bool,
}

impl Part {
    fn text(text: &str) -> Self {
        Self {
            text: Some(text.to_string()),
            thought: false,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Tool {
    google_search: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    thinking_config: Option<ThinkingConfig>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ThinkingConfig {
    thinking_budget: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<Content>,
    grounding_metadata: Option<GroundingMetadata>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GroundingMetadata {
    #[serde(default)]
    grounding_chunks: Vec<GroundingChunk>,
}

#[derive(Debug, Deserialize)]
struct GroundingChunk {
    web: Option<WebChunk>,
}

#[derive(Debug, Deserialize)]
struct WebChunk {
    uri: Option<String>,
    title: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    prompt_token_count: u32,
    #[serde(default)]
    candidates_token_count: u32,
}
