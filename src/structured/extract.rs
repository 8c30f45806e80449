use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::{Error, ErrorContext, Result};

static FENCED: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"```(?:json|JSON)?[ \t]*\r?\n?([\s\S]*?)```").ok());

/// Pull a JSON object out of a model reply.
///
/// Tries, in order: the whole reply, each fenced code block, and the span from
/// the first `{` to the last `}`.
pub fn extract_json(text: &str) -> Result<Value> {
    let trimmed = text.trim();
    if let Ok(v) = serde_json::from_str::<Value>(trimmed) {
        return Ok(v);
    }

    if let Some(re) = FENCED.as_ref() {
        for caps in re.captures_iter(trimmed) {
            if let Some(body) = caps.get(1) {
                if let Ok(v) = serde_json::from_str::<Value>(body.as_str().trim()) {
                    return Ok(v);
                }
            }
        }
    }

    if let (Some(start), Some(end)) = (trimmed.find('{'), trimmed.rfind('}')) {
        if start < end {
            if let Ok(v) = serde_json::from_str::<Value>(&trimmed[start..=end]) {
                return Ok(v);
            }
        }
    }

    Err(Error::validation_with_context(
        "model reply does not contain a JSON object",
        ErrorContext::new()
            .with_details(preview(trimmed))
            .with_source("plan_parser"),
    ))
}

fn preview(text: &str) -> String {
    let mut out: String = text.chars().take(80).collect();
    if text.chars().count() > 80 {
        out.push_str("...");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_bare_object() {
        assert_eq!(extract_json(" {\"a\": 1} ").unwrap(), json!({"a": 1}));
    }

    #[test]
    fn test_fenced_block_with_language() {
        let text = "Sure!\n```json\n{\"a\": 2}\n```\nLet me know.";
        assert_eq!(extract_json(text).unwrap(), json!({"a": 2}));
    }

    #[test]
    fn test_fenced_block_without_language() {
        let text = "```\n{\"a\": [1, 2]}\n```";
        assert_eq!(extract_json(text).unwrap(), json!({"a": [1, 2]}));
    }

    #[test]
    fn test_object_inside_prose() {
        let text = "The plan is {\"a\": {\"b\": true}} as requested.";
        assert_eq!(extract_json(text).unwrap(), json!({"a": {"b": true}}));
    }

    #[test]
    fn test_no_json() {
        let err = extract_json("I cannot help with that.").unwrap_err();
        assert!(matches!(err, Error::Validation { .. }));
    }
}
