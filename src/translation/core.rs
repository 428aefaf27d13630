/*!
 * Core translation service implementation.
 *
 * This module contains the `TranslationCapability` seam used by the batch
 * translator and `TranslationService`, which implements it on top of an
 * LLM provider.
 */

use async_trait::async_trait;
use log::debug;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::app_config::{Config, TranslationProvider as ConfigTranslationProvider};
use crate::errors::ProviderError;
use crate::providers::anthropic::Anthropic;
use crate::providers::openai::OpenAI;
use crate::providers::{CompletionRequest, Provider};
use super::prompts::{TranslationPrompt, SYSTEM_PROMPT};

/// Something that turns texts into a raw answer embedding per-language translations
#[async_trait]
pub trait TranslationCapability: Send + Sync {
    /// Translate `texts` into every language of `languages`; the answer is
    /// validated by the caller
    async fn translate(&self, texts: &[String], languages: &[String]) -> Result<String, ProviderError>;
}

/// Token usage statistics for tracking API consumption
#[derive(Clone, Debug)]
pub struct TokenUsageStats {
    /// Number of prompt tokens
    pub prompt_tokens: u64,

    /// Number of completion tokens
    pub completion_tokens: u64,

    /// Total number of tokens
    pub total_tokens: u64,

    /// Number of requests sent
    pub requests: u64,

    /// Start time of token tracking
    pub start_time: Instant,

    /// Total time spent on API requests
    pub api_duration: Duration,

    /// Provider name
    pub provider: String,

    /// Model name
    pub model: String,
}

impl Default for TokenUsageStats {
    fn default() -> Self {
        Self::with_provider_info(String::new(), String::new())
    }
}

impl TokenUsageStats {
    /// Create new token usage stats with provider info
    pub fn with_provider_info(provider: String, model: String) -> Self {
        Self {
            prompt_tokens: 0,
            completion_tokens: 0,
            total_tokens: 0,
            requests: 0,
            start_time: Instant::now(),
            api_duration: Duration::from_secs(0),
            provider,
            model,
        }
    }

    /// Record one request
    pub fn add_request(&mut self, prompt_tokens: Option<u64>, completion_tokens: Option<u64>, duration: Duration) {
        self.requests += 1;
        self.api_duration += duration;

        if let Some(pt) = prompt_tokens {
            self.prompt_tokens += pt;
            self.total_tokens += pt;
        }

        if let Some(ct) = completion_tokens {
            self.completion_tokens += ct;
            self.total_tokens += ct;
        }
    }

    /// Calculate tokens per minute rate
    pub fn tokens_per_minute(&self) -> f64 {
        // Use the API duration for rate calculation, with fallback to elapsed time
        let duration_minutes = if self.api_duration.as_secs_f64() > 0.0 {
            self.api_duration.as_secs_f64() / 60.0
        } else {
            self.start_time.elapsed().as_secs_f64() / 60.0
        };

        if duration_minutes > 0.0 {
            self.total_tokens as f64 / duration_minutes
        } else {
            0.0
        }
    }

    /// Generate a summary of token usage
    pub fn summary(&self) -> String {
        format!(
            "Token Usage Summary:\n\
             Provider: {}\n\
             Model: {}\n\
             Requests: {}\n\
             Prompt tokens: {}\n\
             Completion tokens: {}\n\
             Total tokens: {}\n\
             Elapsed time: {:.2} minutes\n\
             API request time: {:.2} minutes\n\
             Tokens per minute: {:.2}",
            self.provider,
            self.model,
            self.requests,
            self.prompt_tokens,
            self.completion_tokens,
            self.total_tokens,
            self.start_time.elapsed().as_secs_f64() / 60.0,
            self.api_duration.as_secs_f64() / 60.0,
            self.tokens_per_minute()
        )
    }
}

/// Translation service backed by an LLM provider
#[derive(Debug, Clone)]
pub struct TranslationService {
    /// Provider implementation
    provider: Arc<dyn Provider>,

    /// Model name sent with each request
    model: String,

    /// Sampling temperature
    temperature: f32,

    /// Token usage across every request
    usage: Arc<Mutex<TokenUsageStats>>,
}

impl TranslationService {
    /// Create a translation service from the configuration
    pub fn new(config: &Config) -> Self {
        let provider: Arc<dyn Provider> = match config.ai_provider {
            ConfigTranslationProvider::OpenAI => {
                Arc::new(OpenAI::new(config.ai_api_key.clone(), config.ai_host.clone(), config.timeout()))
            }
            ConfigTranslationProvider::Anthropic => {
                Arc::new(Anthropic::new(config.ai_api_key.clone(), config.ai_host.clone(), config.timeout()))
            }
        };

        Self::with_provider(provider, config.ai_model.clone(), config.temperature)
    }

    /// Create a translation service around an existing provider
    pub fn with_provider(provider: Arc<dyn Provider>, model: impl Into<String>, temperature: f32) -> Self {
        let model = model.into();
        let usage = TokenUsageStats::with_provider_info(provider.name().to_string(), model.clone());
        Self {
            provider,
            model,
            temperature,
            usage: Arc::new(Mutex::new(usage)),
        }
    }

    /// Snapshot of token usage so far
    pub fn token_usage(&self) -> TokenUsageStats {
        self.usage.lock().clone()
    }

    /// Token limit for a request over `texts` into `language_count` languages
    fn max_tokens_for(texts: &[String], language_count: usize) -> u32 {
        // CJK source text is roughly one token per char; translations run longer
        let chars: usize = texts.iter().map(|t| t.chars().count() + 8).sum();
        let estimate = chars.saturating_mul(language_count.max(1)).saturating_mul(3) + 256;
        estimate.clamp(1024, 16384) as u32
    }
}

#[async_trait]
impl TranslationCapability for TranslationService {
    async fn translate(&self, texts: &[String], languages: &[String]) -> Result<String, ProviderError> {
        let prompt = TranslationPrompt::new(texts, languages).render();
        let request = CompletionRequest::new(&self.model, prompt)
            .system(SYSTEM_PROMPT)
            .temperature(self.temperature)
            .max_tokens(Self::max_tokens_for(texts, languages.len()));

        let start_time = Instant::now();
        let completion = self.provider.complete(request).await?;
        let duration = start_time.elapsed();

        debug!(
            "{} answered {} text(s) x {} language(s) in {:?}",
            self.provider.name(),
            texts.len(),
            languages.len(),
            duration
        );
        self.usage
            .lock()
            .add_request(completion.prompt_tokens, completion.completion_tokens, duration);

        Ok(completion.text)
    }
}
