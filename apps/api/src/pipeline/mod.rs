// Career pathing pipeline: profile analysis → path recommendation → development plan.
// Each stage is a plain async function over the ModelGateway; the orchestrator sequences
// them and owns per-stage loading/error/result state. All LLM calls go through llm_client.

use std::time::Duration;

use thiserror::Error;

use crate::llm_client::LlmError;

pub mod analyzer;
pub mod handlers;
pub mod ids;
pub mod orchestrator;
pub mod planner;
pub mod prompts;
pub mod recommender;

/// Why a stage produced no result. Never surfaced raw to users; the orchestrator maps
/// it to the stage's error message.
#[derive(Debug, Error)]
pub enum StageError {
    #[error("backend call failed: {0}")]
    Backend(#[from] LlmError),

    #[error("backend output could not be read as {0}")]
    Extraction(&'static str),

    #[error("timed out after {0:?}")]
    TimedOut(Duration),

    #[error("superseded by a newer request")]
    Cancelled,
}

/// Fills `{key}` placeholders in one pass, so user text that happens to contain a
/// placeholder name is inserted literally rather than expanded again.
pub(crate) fn fill_template(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        let replacement = after.find('}').and_then(|end| {
            let key = &after[..end];
            values
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, value)| (end, *value))
        });

        match replacement {
            Some((end, value)) => {
                out.push_str(value);
                rest = &after[end + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }

    out.push_str(rest);
    out
}

/// Joins a list for prompt display, with a placeholder for the empty case.
pub(crate) fn join_or(items: &[String], empty: &str) -> String {
    if items.is_empty() {
        empty.to_string()
    } else {
        items.join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fill_template_replaces_known_keys() {
        let out = fill_template("Hi {name}, welcome to {org}.", &[("name", "Ana"), ("org", "HNAI")]);
        assert_eq!(out, "Hi Ana, welcome to HNAI.");
    }

    #[test]
    fn test_fill_template_keeps_unknown_braces() {
        let out = fill_template(r#"Example: {"a": 1} for {name}"#, &[("name", "Ana")]);
        assert_eq!(out, r#"Example: {"a": 1} for Ana"#);
    }

    #[test]
    fn test_fill_template_does_not_expand_inserted_text() {
        let out = fill_template("{skills} / {name}", &[("skills", "{name}"), ("name", "Ana")]);
        assert_eq!(out, "{name} / Ana");
    }

    #[test]
    fn test_fill_template_unterminated_brace() {
        assert_eq!(fill_template("a { b", &[("b", "x")]), "a { b");
    }

    #[test]
    fn test_join_or() {
        assert_eq!(join_or(&[], "None"), "None");
        assert_eq!(join_or(&["a".into(), "b".into()], "None"), "a, b");
    }
}
