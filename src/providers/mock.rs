/*!
 * Mock provider implementations for testing.
 *
 * This module provides mock providers that simulate different behaviors:
 * - `MockProvider::working()` - Always answers with a valid translation payload
 * - `MockProvider::intermittent(n)` - Fails every n-th request
 * - `MockProvider::failing()` - Always fails with an error
 * - `MockProvider::malformed()` - Answers without any JSON payload
 */

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::errors::ProviderError;
use crate::providers::{Completion, CompletionRequest, Provider};
use crate::translation::prompts::TranslationPrompt;

/// Behavior mode for the mock provider
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MockBehavior {
    /// Always succeeds with a proper payload
    Working,
    /// Answers with prose and no JSON
    Malformed,
    /// Answers with one item missing per language
    ShortPayload,
    /// Fails intermittently (every Nth request)
    Intermittent { fail_every: usize },
    /// Always fails with a server error
    Failing,
    /// Always fails with an authentication error
    Unauthorized,
}

/// Mock provider for testing translation behavior
#[derive(Debug)]
pub struct MockProvider {
    /// Behavior mode
    behavior: MockBehavior,
    /// Request counter, shared between clones
    request_count: Arc<AtomicUsize>,
    /// Custom response generator (optional)
    custom_response: Option<fn(&TranslationPrompt) -> String>,
}

impl MockProvider {
    /// Create a new mock provider with the specified behavior
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            request_count: Arc::new(AtomicUsize::new(0)),
            custom_response: None,
        }
    }

    /// Create a working mock provider that always succeeds
    pub fn working() -> Self {
        Self::new(MockBehavior::Working)
    }

    /// Create a mock that answers without JSON
    pub fn malformed() -> Self {
        Self::new(MockBehavior::Malformed)
    }

    /// Create an intermittently failing mock provider
    pub fn intermittent(fail_every: usize) -> Self {
        Self::new(MockBehavior::Intermittent { fail_every })
    }

    /// Create a failing mock provider that always errors
    pub fn failing() -> Self {
        Self::new(MockBehavior::Failing)
    }

    /// Set a custom response generator
    pub fn with_custom_response(mut self, generator: fn(&TranslationPrompt) -> String) -> Self {
        self.custom_response = Some(generator);
        self
    }

    /// Number of requests received so far
    pub fn request_count(&self) -> usize {
        self.request_count.load(Ordering::SeqCst)
    }

    /// Deterministic translation used by the mock: `[lang] text`
    pub fn fake_translation(language: &str, text: &str) -> String {
        format!("[{}] {}", language, text)
    }

    /// Build a fenced JSON payload for a prompt, dropping `missing` items per language
    pub fn generate_payload(prompt: &TranslationPrompt, missing: usize) -> String {
        let keep = prompt.texts.len().saturating_sub(missing);
        let mut object = Map::new();
        for language in &prompt.languages {
            let items = prompt.texts[..keep]
                .iter()
                .map(|text| Value::String(Self::fake_translation(language, text)))
                .collect();
            object.insert(language.clone(), Value::Array(items));
        }
        format!("```json\n{}\n```", Value::Object(object))
    }

    fn parse_prompt(request: &CompletionRequest) -> Result<TranslationPrompt, ProviderError> {
        TranslationPrompt::parse(&request.prompt)
            .ok_or_else(|| ProviderError::RequestFailed("mock could not read the prompt".to_string()))
    }

    fn answer(text: String) -> Completion {
        Completion {
            prompt_tokens: Some(10),
            completion_tokens: Some((text.len() / 4) as u64),
            text,
        }
    }
}

impl Clone for MockProvider {
    fn clone(&self) -> Self {
        Self {
            behavior: self.behavior,
            request_count: Arc::clone(&self.request_count),
            custom_response: self.custom_response,
        }
    }
}

#[async_trait]
impl Provider for MockProvider {
    async fn complete(&self, request: CompletionRequest) -> Result<Completion, ProviderError> {
        let count = self.request_count.fetch_add(1, Ordering::SeqCst);

        match self.behavior {
            MockBehavior::Working => {
                let prompt = Self::parse_prompt(&request)?;
                let text = match self.custom_response {
                    Some(generator) => generator(&prompt),
                    None => Self::generate_payload(&prompt, 0),
                };
                Ok(Self::answer(text))
            }

            MockBehavior::Malformed => Ok(Self::answer(
                "Sorry, here is a summary of the list instead.".to_string(),
            )),

            MockBehavior::ShortPayload => {
                let prompt = Self::parse_prompt(&request)?;
                Ok(Self::answer(Self::generate_payload(&prompt, 1)))
            }

            MockBehavior::Intermittent { fail_every } => {
                if fail_every > 0 && count % fail_every == fail_every - 1 {
                    Err(ProviderError::ApiError {
                        message: format!("Simulated intermittent failure (request #{})", count + 1),
                        status_code: 503,
                    })
                } else {
                    let prompt = Self::parse_prompt(&request)?;
                    Ok(Self::answer(Self::generate_payload(&prompt, 0)))
                }
            }

            MockBehavior::Failing => Err(ProviderError::ApiError {
                message: "Simulated provider failure".to_string(),
                status_code: 500,
            }),

            MockBehavior::Unauthorized => Err(ProviderError::AuthenticationError(
                "Simulated invalid API key".to_string(),
            )),
        }
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}
