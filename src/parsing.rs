//! Parsing utilities for LLM responses.
//!
//! Extraction prompts ask for a bare JSON object, but models still wrap
//! answers in markdown fences or add a sentence of preamble. [`strip_fence`]
//! removes one layer of fencing; [`parse_json`] strips, parses, and falls
//! back to locating an embedded object before giving up.

use crate::error::Result;
use crate::PipelineError;
use serde::de::DeserializeOwned;
use serde_json::Value;

const FENCE: &str = "```";

/// Remove a leading/trailing markdown code fence from an LLM response.
///
/// Handles `` ```json ``, `` ```JSON `` and bare `` ``` `` openers. The opening
/// line is dropped whole, so any language tag goes with it. Text without a
/// leading fence is returned trimmed. Idempotent for 0 or 1 layers of fencing.
///
/// ```
/// use battle_card::parsing::strip_fence;
///
/// assert_eq!(strip_fence("```json\n{\"a\": 1}\n```"), "{\"a\": 1}");
/// assert_eq!(strip_fence("{\"a\": 1}"), "{\"a\": 1}");
/// ```
pub fn strip_fence(text: &str) -> String {
    let trimmed = text.trim();
    let Some(after_open) = trimmed.strip_prefix(FENCE) else {
        return trimmed.to_string();
    };

    let body = match after_open.find('\n') {
        Some(newline) => &after_open[newline + 1..],
        // Single-line fence: ```{"a":1}``` or ```json {"a":1}```
        None => after_open.trim_start_matches(|c: char| c.is_ascii_alphabetic()),
    };
    let body = body.trim_end();
    let body = body.strip_suffix(FENCE).unwrap_or(body);
    body.trim().to_string()
}

/// Try to locate a JSON object or array embedded in surrounding prose.
///
/// Takes the span from the first `{` (or `[`) to the last matching closer.
pub fn extract_json_candidate(text: &str) -> Option<String> {
    let trimmed = text.trim();
    let idx = trimmed.find('{').or_else(|| trimmed.find('['))?;
    let candidate = &trimmed[idx..];
    if serde_json::from_str::<Value>(candidate).is_ok() {
        return Some(candidate.to_string());
    }
    let close = if candidate.starts_with('{') { '}' } else { ']' };
    let end = candidate.rfind(close)?;
    let substr = &candidate[..=end];
    serde_json::from_str::<Value>(substr)
        .ok()
        .map(|_| substr.to_string())
}

/// Parse an LLM response into a typed `T`.
///
/// Strips markdown fencing, then tries a direct parse, then an embedded
/// JSON object. Returns an error carrying a truncated copy of the raw text.
pub fn parse_json<T: DeserializeOwned>(text: &str) -> Result<T> {
    let stripped = strip_fence(text);

    let direct_err = match serde_json::from_str::<T>(&stripped) {
        Ok(val) => return Ok(val),
        Err(e) => e,
    };

    if let Some(candidate) = extract_json_candidate(&stripped) {
        if let Ok(val) = serde_json::from_str::<T>(&candidate) {
            return Ok(val);
        }
    }

    Err(PipelineError::Other(format!(
        "Failed to parse LLM output as JSON ({}). Raw text (truncated): {}",
        direct_err,
        truncate_chars(&stripped, 200)
    )))
}

fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Site {
        website_url: String,
    }

    #[test]
    fn test_strip_fence_variants() {
        assert_eq!(strip_fence("```json\n{\"x\":1}\n```"), "{\"x\":1}");
        assert_eq!(strip_fence("```JSON\n{\"x\":1}\n```"), "{\"x\":1}");
        assert_eq!(strip_fence("```\n{\"x\":1}\n```"), "{\"x\":1}");
        assert_eq!(strip_fence("  {\"x\":1}  "), "{\"x\":1}");
        assert_eq!(strip_fence("```{\"x\":1}```"), "{\"x\":1}");
    }

    #[test]
    fn test_strip_fence_without_closing_fence() {
        assert_eq!(strip_fence("```json\n{\"x\":1}"), "{\"x\":1}");
    }

    #[test]
    fn test_strip_fence_idempotent() {
        let inputs = [
            "```json\n{\"a\": [1, 2]}\n```",
            "```\nplain text\n```",
            "{\"a\": 1}",
            "",
            "   no fence at all   ",
            "```json {\"inline\": true}```",
        ];
        for input in inputs {
            let once = strip_fence(input);
            assert_eq!(strip_fence(&once), once, "not idempotent for {input:?}");
        }
    }

    #[test]
    fn test_parse_json_fenced() {
        let site: Site = parse_json("```json\n{\"website_url\": \"https://acme.test\"}\n```").unwrap();
        assert_eq!(site.website_url, "https://acme.test");
    }

    #[test]
    fn test_parse_json_with_preamble() {
        let site: Site =
            parse_json("Here is the JSON: {\"website_url\": \"https://acme.test\"} Hope it helps!")
                .unwrap();
        assert_eq!(site.website_url, "https://acme.test");
    }

    #[test]
    fn test_parse_json_failure() {
        let err = parse_json::<Site>("I could not find the website.").unwrap_err();
        assert!(err.to_string().contains("Failed to parse LLM output"));
    }

    #[test]
    fn test_extract_json_candidate_none() {
        assert!(extract_json_candidate("no braces here").is_none());
    }
}
