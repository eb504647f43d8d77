//! Shared utility functions for common string and JSON operations.

// =============================================================================
// JSON Value Extraction Helpers
// =============================================================================

/// Extract string array from JSON value by key.
#[inline]
pub fn json_string_array(value: &serde_json::Value, key: &str) -> Vec<String> {
    value
        .get(key)
        .and_then(|v| v.as_array())
        .map(|arr| {
            arr.iter()
                .filter_map(|s| s.as_str().map(String::from))
                .collect()
        })
        .unwrap_or_default()
}

// =============================================================================
// String Utilities
// =============================================================================

/// Convert a title into a URL-safe id: lowercase, words joined by `-`,
/// anything outside `[a-z0-9_-]` dropped, no leading/trailing/double dashes.
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut pending_dash = false;

    for ch in text.to_lowercase().chars() {
        if ch.is_whitespace() || ch == '-' {
            pending_dash = !slug.is_empty();
        } else if ch.is_ascii_alphanumeric() || ch == '_' {
            if pending_dash {
                slug.push('-');
                pending_dash = false;
            }
            slug.push(ch);
        }
    }

    slug
}

/// First `max_chars` characters of `text` (char-boundary safe).
#[inline]
pub fn preview(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}
