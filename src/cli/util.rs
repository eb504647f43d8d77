//! CLI Common Utilities
//!
//! Shared setup for commands that talk to an AI backend: config loading,
//! credential resolution and client construction.

use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

use secrecy::SecretString;
use tracing::{debug, warn};
use url::Url;

use crate::ai::provider::Backend;
use crate::ai::{AiClient, AiGateway, AiTarget, RetryPolicy};
use crate::config::{AiConfig, Config, ConfigLoader};
use crate::types::{Result, SeoError};

/// Per-invocation overrides from command-line flags
#[derive(Debug, Clone, Default)]
pub struct AiOverrides {
    pub backend: Option<Backend>,
    /// Replaces the configured model list; several entries are raced
    pub models: Vec<String>,
    pub api_key: Option<String>,
}

impl AiOverrides {
    /// Fold the overrides into the `[ai]` section
    pub fn apply(&self, ai: &mut AiConfig) {
        if let Some(backend) = self.backend
            && backend != ai.backend
        {
            ai.backend = backend;
            // Models configured for another backend do not carry over
            ai.model.clear();
            ai.models.clear();
        }
        if !self.models.is_empty() {
            ai.model.clear();
            ai.models = self.models.clone();
        }
        if let Some(key) = &self.api_key {
            ai.api_key = Some(key.clone());
        }
    }
}

/// Command execution context
///
/// Loaded config plus a ready AI client built from it.
#[derive(Debug, Clone)]
pub struct CommandContext {
    pub config: Config,
    pub client: AiClient,
}

impl CommandContext {
    /// Load config, apply overrides and build the client
    pub fn load(overrides: &AiOverrides) -> Result<Self> {
        let mut config = ConfigLoader::load()?;
        overrides.apply(&mut config.ai);
        let target = build_target(&config.ai, |name| std::env::var(name).ok())?;
        let client = build_client(&config, target)?;
        Ok(Self { config, client })
    }
}

/// Resolve the API key: flag or config first, then the backend's env variable
pub fn resolve_api_key(
    ai: &AiConfig,
    env: impl Fn(&str) -> Option<String>,
) -> Option<String> {
    ai.api_key
        .clone()
        .filter(|k| !k.trim().is_empty())
        .or_else(|| env(ai.backend.api_key_env()))
        .filter(|k| !k.trim().is_empty())
}

/// Build the call target from the `[ai]` section
pub fn build_target(ai: &AiConfig, env: impl Fn(&str) -> Option<String>) -> Result<AiTarget> {
    let key = resolve_api_key(ai, env).ok_or_else(|| {
        SeoError::Config(format!(
            "No API key for {}. Pass --api-key, set ai.api_key, or export {}.",
            ai.backend,
            ai.backend.api_key_env()
        ))
    })?;

    let target = AiTarget::new(ai.backend, SecretString::from(key))
        .with_models(ai.candidate_models());
    debug!(?target, "Resolved AI target");
    Ok(target)
}

/// HTTP-backed client with the configured timeout and retry budget
pub fn build_client(config: &Config, target: AiTarget) -> Result<AiClient> {
    let gateway = AiGateway::http(Duration::from_secs(config.ai.timeout_secs))?;
    Ok(AiClient::new(
        gateway,
        RetryPolicy::new(config.retry.clone()),
        target,
    ))
}

/// Parse a URL list: one absolute http(s) URL per line.
///
/// Blank lines and `#` comments are ignored, invalid entries are skipped with
/// a warning, and duplicates keep their first position.
pub fn parse_url_list(content: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut urls = Vec::new();

    for (line_no, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        match Url::parse(line) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => {
                let url = url.to_string();
                if seen.insert(url.clone()) {
                    urls.push(url);
                }
            }
            Ok(_) | Err(_) => warn!("Skipping invalid URL on line {}: {}", line_no + 1, line),
        }
    }
    urls
}

/// Read and parse a URL list file; an empty result is an error
pub fn read_url_list(path: &Path) -> Result<Vec<String>> {
    let content = std::fs::read_to_string(path)?;
    let urls = parse_url_list(&content);
    if urls.is_empty() {
        return Err(SeoError::Config(format!(
            "No valid URLs found in {}",
            path.display()
        )));
    }
    Ok(urls)
}
