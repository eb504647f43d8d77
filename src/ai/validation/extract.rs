//! Tolerant JSON Extraction
//!
//! AI responses wrap their JSON in markdown fences, prose, or an extra
//! envelope key. This module finds the payload and checks it against a
//! structural validator.
//!
//! ## Steps
//!
//! 1. Fenced code block (```` ```json ````), used only if its content parses
//! 2. Balanced scan from the first `{` or `[`, skipping candidates that fail to parse
//! 3. Validate; if a top-level object fails, try each of its properties once
//!
//! Every failure is `SeoError::JsonParsing` tagged with the caller's context.

use std::sync::LazyLock;

use regex::Regex;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use crate::constants::extract::{BLOCKING_PHRASES, PREVIEW_CHARS};
use crate::types::{JsonParseKind, Result, SeoError, preview};

/// Structural predicate a parsed payload must satisfy
pub type Validator = fn(&Value) -> bool;

static FENCE_RE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"```(?:json)?\s*([\s\S]*?)\s*```").ok());

// =============================================================================
// Extraction
// =============================================================================

/// Find the substring of `text` that holds the JSON payload.
///
/// A returned slice always parses as JSON.
pub fn extract_json_candidate(text: &str) -> Option<&str> {
    if let Some(fenced) = fenced_block(text) {
        return Some(fenced);
    }
    scan_balanced(text)
}

fn fenced_block(text: &str) -> Option<&str> {
    let captures = FENCE_RE.as_ref()?.captures(text)?;
    let inner = captures.get(1)?.as_str().trim();
    if inner.is_empty() {
        return None;
    }
    parses(inner).then_some(inner)
}

/// Scan for the first balanced `{..}` (or `[..]`, whichever opener comes
/// first) that parses. Quotes not preceded by `\` toggle string state so
/// delimiters inside string values are ignored.
fn scan_balanced(text: &str) -> Option<&str> {
    let (start, open, close) = match (text.find('{'), text.find('[')) {
        (Some(brace), Some(bracket)) if bracket < brace => (bracket, b'[', b']'),
        (Some(brace), _) => (brace, b'{', b'}'),
        (None, Some(bracket)) => (bracket, b'[', b']'),
        (None, None) => return None,
    };

    let bytes = text.as_bytes();
    let mut depth = 0usize;
    let mut candidate_start: Option<usize> = None;
    let mut in_string = false;

    for i in start..bytes.len() {
        let byte = bytes[i];
        if byte == b'"' && (i == 0 || bytes[i - 1] != b'\\') {
            in_string = !in_string;
        }
        if in_string {
            continue;
        }

        if byte == open {
            if depth == 0 {
                candidate_start = Some(i);
            }
            depth += 1;
        } else if byte == close {
            let Some(begin) = candidate_start else {
                continue;
            };
            depth -= 1;
            if depth == 0 {
                let candidate = &text[begin..=i];
                if parses(candidate) {
                    return Some(candidate);
                }
                debug!("Discarding unparsable candidate at byte {}", begin);
                candidate_start = None;
            }
        }
    }

    None
}

fn parses(candidate: &str) -> bool {
    serde_json::from_str::<serde::de::IgnoredAny>(candidate).is_ok()
}

// =============================================================================
// Parse + Validate
// =============================================================================

/// Extract, parse and validate the JSON payload of an AI response.
///
/// When the top-level value is an object that fails `validator`, the first
/// property (document order) that passes is returned instead.
pub fn robust_parse<V>(text: &str, validator: V, context: &str) -> Result<Value>
where
    V: Fn(&Value) -> bool,
{
    if text.trim().is_empty() {
        return Err(SeoError::json_parsing(
            context,
            JsonParseKind::Empty,
            format!("The AI returned an empty or invalid response for {}.", context),
        ));
    }

    let Some(candidate) = extract_json_candidate(text) else {
        return Err(no_json_error(text, context));
    };

    let value: Value = serde_json::from_str(candidate).map_err(|e| {
        SeoError::json_parsing(
            context,
            JsonParseKind::Decode,
            format!(
                "The AI returned a malformed JSON object that could not be parsed for {}. Error: {}",
                context, e
            ),
        )
    })?;

    if validator(&value) {
        return Ok(value);
    }

    if let Value::Object(map) = value {
        if let Some((key, nested)) = map.into_iter().find(|(_, nested)| validator(nested)) {
            warn!(
                "Resilient parsing: found valid data under key \"{}\" for {}",
                key, context
            );
            return Ok(nested);
        }
    }

    Err(SeoError::json_parsing(
        context,
        JsonParseKind::Structure,
        format!(
            "The AI returned a JSON object with a missing or incorrect structure for {}.",
            context
        ),
    ))
}

/// [`robust_parse`] followed by deserialization into `T`
pub fn robust_parse_as<T, V>(text: &str, validator: V, context: &str) -> Result<T>
where
    T: DeserializeOwned,
    V: Fn(&Value) -> bool,
{
    let value = robust_parse(text, validator, context)?;
    serde_json::from_value(value).map_err(|e| {
        SeoError::json_parsing(
            context,
            JsonParseKind::Decode,
            format!(
                "The AI returned a JSON object that could not be decoded for {}. Error: {}",
                context, e
            ),
        )
    })
}

fn no_json_error(text: &str, context: &str) -> SeoError {
    let lower = text.to_lowercase();
    let head = preview(text, PREVIEW_CHARS);

    if BLOCKING_PHRASES.iter().any(|phrase| lower.contains(phrase)) {
        return SeoError::json_parsing(
            context,
            JsonParseKind::Blocked,
            format!("The AI returned a blocking error for {}: \"{}...\"", context, head),
        );
    }

    SeoError::json_parsing(
        context,
        JsonParseKind::NotFound,
        format!(
            "Could not find a valid JSON object in the AI's response for {}. The response started with: \"{}...\"",
            context, head
        ),
    )
}
