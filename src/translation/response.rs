/*!
 * Extraction and validation of translation payloads.
 *
 * A model answer is free text that should embed a JSON object shaped
 * `{language → [string; n]}`. Candidates are pulled out of fenced code
 * blocks, the bare answer, and the outermost braces; the first candidate
 * passing the schema check wins.
 */

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::errors::TranslationError;

/// Validated per-language translations of one chunk
pub type BatchPayload = BTreeMap<String, Vec<String>>;

static FENCED_BLOCK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)```[A-Za-z]*[ \t]*\r?\n(.*?)\r?\n?```").unwrap_or_else(|e| {
        panic!("invalid fenced block pattern: {}", e)
    })
});

/// Outcome of checking one candidate against the expected shape
#[derive(Debug, Clone, PartialEq)]
pub enum PayloadCheck {
    /// Candidate has every language with exactly the expected strings
    Valid(BatchPayload),
    /// Candidate rejected, with the reason
    Invalid(String),
}

/// Pull every JSON value that may hold the payload out of a raw answer
pub fn extract_candidates(raw: &str) -> Vec<Value> {
    let mut candidates = Vec::new();

    for captures in FENCED_BLOCK.captures_iter(raw) {
        if let Some(body) = captures.get(1) {
            if let Ok(value) = serde_json::from_str::<Value>(body.as_str().trim()) {
                candidates.push(value);
            }
        }
    }

    let trimmed = raw.trim();
    if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
        candidates.push(value);
    } else if let (Some(start), Some(end)) = (trimmed.find('{'), trimmed.rfind('}')) {
        if end > start {
            if let Ok(value) = serde_json::from_str::<Value>(&trimmed[start..=end]) {
                candidates.push(value);
            }
        }
    }

    candidates
}

/// Check one candidate: an object with, for every requested language, an
/// array of exactly `count` strings. Extra languages are dropped.
pub fn check_payload(value: &Value, languages: &[String], count: usize) -> PayloadCheck {
    let Some(object) = value.as_object() else {
        return PayloadCheck::Invalid("payload is not a JSON object".to_string());
    };

    let mut payload = BatchPayload::new();
    for language in languages {
        let Some(items) = object.get(language).and_then(Value::as_array) else {
            return PayloadCheck::Invalid(format!("missing array for language '{}'", language));
        };
        if items.len() != count {
            return PayloadCheck::Invalid(format!(
                "language '{}' has {} item(s), expected {}",
                language,
                items.len(),
                count
            ));
        }

        let mut texts = Vec::with_capacity(count);
        for item in items {
            match item.as_str() {
                Some(text) => texts.push(text.to_string()),
                None => {
                    return PayloadCheck::Invalid(format!(
                        "language '{}' contains a non-string item",
                        language
                    ));
                }
            }
        }
        payload.insert(language.clone(), texts);
    }

    PayloadCheck::Valid(payload)
}

/// Find the first valid payload in a raw answer
pub fn parse_payload(raw: &str, languages: &[String], count: usize) -> Result<BatchPayload, TranslationError> {
    let candidates = extract_candidates(raw);
    if candidates.is_empty() {
        return Err(TranslationError::Validation(
            "no JSON payload found in response".to_string(),
        ));
    }

    let mut last_reason = String::new();
    for candidate in &candidates {
        match check_payload(candidate, languages, count) {
            PayloadCheck::Valid(payload) => return Ok(payload),
            PayloadCheck::Invalid(reason) => last_reason = reason,
        }
    }

    Err(TranslationError::Validation(last_reason))
}
