//! Response extraction: turns raw model text into typed JSON.
//!
//! Tolerates formatting noise: surrounding whitespace, a code fence spanning the whole
//! reply (with or without a language tag), and stray prose around an array. Failure is
//! `None`, never a panic; schema trust is left to the caller's target type.

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

const FENCE: &str = "```";

/// Unwraps a code fence that spans the entire (trimmed) text.
/// Returns the trimmed input unchanged when it is not fenced.
pub fn unwrap_fence(text: &str) -> &str {
    let text = text.trim();
    if text.len() < FENCE.len() * 2 || !text.starts_with(FENCE) || !text.ends_with(FENCE) {
        return text;
    }

    let inner = &text[FENCE.len()..text.len() - FENCE.len()];

    // Optional language hint directly after the opening fence, e.g. ```json
    let tag_len: usize = inner
        .chars()
        .take_while(|c| c.is_alphanumeric() || *c == '_')
        .map(char::len_utf8)
        .sum();
    let body = inner[tag_len..].trim();

    if body.is_empty() {
        // ```123``` has no tag, the "tag" is the body.
        inner.trim()
    } else {
        body
    }
}

/// Parses model output as untyped JSON.
///
/// Strict parse of the unwrapped text first; on failure, retries on the span from the
/// first `[` to the last `]` so an otherwise valid array survives surrounding prose.
pub fn extract_json_value(text: &str) -> Option<Value> {
    let body = unwrap_fence(text);

    match serde_json::from_str::<Value>(body) {
        Ok(value) => Some(value),
        Err(e) => {
            debug!("Strict JSON parse failed: {e}");
            let start = body.find('[')?;
            let end = body.rfind(']')?;
            if end <= start {
                return None;
            }
            serde_json::from_str::<Value>(&body[start..=end])
                .map_err(|e| debug!("Array fallback parse failed: {e}"))
                .ok()
        }
    }
}

/// Parses model output into `T`. Output that is not JSON, or JSON that does not
/// fit `T`, yields `None`.
pub fn extract_json<T: DeserializeOwned>(text: &str) -> Option<T> {
    let value = extract_json_value(text)?;
    serde_json::from_value(value)
        .map_err(|e| debug!("Extracted JSON did not match expected shape: {e}"))
        .ok()
}
