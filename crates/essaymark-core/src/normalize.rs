//! Response normalizer.
//!
//! The agent wraps its JSON in a markdown fence most of the time, but not
//! always. Unwrap it if present, then parse into a typed record.

use serde::de::DeserializeOwned;

use crate::error::EvaluationError;
use crate::model::EvaluationResult;

const FENCE: &str = "```";

/// Remove a surrounding ```` ```lang ```` fence and trim whitespace.
///
/// The opening marker must end its line and may carry a language tag. A
/// closing marker is only removed when it sits on its own line at the end.
/// Content without fences comes back trimmed, so the function is idempotent
/// on already-unwrapped payloads.
pub fn strip_code_fence(raw: &str) -> &str {
    let mut body = raw.trim();

    if let Some(rest) = body.strip_prefix(FENCE) {
        if let Some((tag, after)) = rest.split_once('\n') {
            if is_language_tag(tag) {
                body = after;
            }
        }
    }

    if let Some(before) = body.strip_suffix(FENCE) {
        if before.is_empty() || before.ends_with('\n') {
            body = before;
        }
    }

    body.trim()
}

fn is_language_tag(tag: &str) -> bool {
    tag.trim()
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '+' | '.'))
}

/// Unwrap and parse an arbitrary structured payload.
pub fn parse_payload<T: DeserializeOwned>(raw: &str) -> Result<T, EvaluationError> {
    let cleaned = strip_code_fence(raw);
    serde_json::from_str(cleaned).map_err(|e| EvaluationError::MalformedResponse(e.to_string()))
}

/// Unwrap and parse the agent's evaluation document.
pub fn parse_evaluation(raw: &str) -> Result<EvaluationResult, EvaluationError> {
    parse_payload(raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::fixtures::SAMPLE_RESULT;

    #[test]
    fn strips_json_fence() {
        let input = "```json\n{\"a\":1}\n```";
        assert_eq!(strip_code_fence(input), "{\"a\":1}");

        let value: serde_json::Value = parse_payload(input).unwrap();
        assert_eq!(value["a"], 1);
    }

    #[test]
    fn strips_untagged_fence() {
        assert_eq!(strip_code_fence("```\n[1, 2]\n```\n"), "[1, 2]");
    }

    #[test]
    fn unfenced_passes_through() {
        let input = "{\"a\":1}";
        assert_eq!(strip_code_fence(input), input);
        assert_eq!(strip_code_fence("  {\"a\":1}\n"), input);
    }

    #[test]
    fn idempotent_on_unwrapped_content() {
        let once = strip_code_fence("```json\n{\"a\": \"```\"}\n```");
        let twice = strip_code_fence(once);
        assert_eq!(once, "{\"a\": \"```\"}");
        assert_eq!(once, twice);
    }

    #[test]
    fn crlf_fence() {
        assert_eq!(strip_code_fence("```json\r\n{}\r\n```"), "{}");
    }

    #[test]
    fn inline_backticks_are_not_a_fence() {
        let input = "```not a tag\n{}\n```";
        // A tag with spaces is not a language tag, so the opening line stays.
        assert!(strip_code_fence(input).starts_with("```not a tag"));
    }

    #[test]
    fn malformed_payload_after_unwrap() {
        let input = "```json\n{not valid\n```";
        assert_eq!(strip_code_fence(input), "{not valid");

        let err = parse_payload::<serde_json::Value>(input).unwrap_err();
        assert!(matches!(err, EvaluationError::MalformedResponse(_)));
    }

    #[test]
    fn fenced_evaluation_parses() {
        let input = format!("```json\n{SAMPLE_RESULT}\n```");
        let result = parse_evaluation(&input).unwrap();
        assert_eq!(result.overall_score, 82.0);
    }

    #[test]
    fn evaluation_with_wrong_shape_is_malformed() {
        let err = parse_evaluation("```json\n{\"a\":1}\n```").unwrap_err();
        assert!(matches!(err, EvaluationError::MalformedResponse(_)));
    }
}
