use anyhow::{anyhow, Context, Result};
use log::warn;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::default::Default;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

use crate::errors::AppError;
use crate::language_utils;
use crate::translation::batch::BatchOptions;
use crate::translation::pipeline::PipelineOptions;

/// Application configuration module
/// This module handles the application configuration including loading,
/// validating and saving configuration settings. Keys are camelCase so
/// existing `translate.config.json` files keep working.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Lookup function called by rewritten literals
    #[serde(default = "default_translate_function_name")]
    pub translate_function_name: String,

    /// Language the extracted texts are written in
    #[serde(default = "default_source_language")]
    pub source_language: String,

    /// Languages to produce assets for
    #[serde(default)]
    pub target_language_list: Vec<String>,

    /// Prefix of generated asset file names
    #[serde(default = "default_lang_file_prefix")]
    pub lang_file_prefix: String,

    /// Directory for assets, relative to the bundle output directory
    #[serde(default = "default_assets_dir")]
    pub assets_dir: String,

    /// Directory holding `lang.json` and `process.json`
    #[serde(default = "default_cache_dir")]
    pub cache_dir: String,

    /// Item budget per call, shared by every language of the call
    #[serde(rename = "numberOfItem", default = "default_item_budget")]
    pub item_budget: usize,

    /// Maximum number of calls in flight
    #[serde(rename = "batchRequestCount", default = "default_concurrency")]
    pub concurrency: usize,

    /// Attempts per batch before the run fails
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Fixed delay between attempts
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,

    /// Text-generation provider
    #[serde(default)]
    pub ai_provider: TranslationProvider,

    /// Provider base URL; empty means the provider's public endpoint
    #[serde(default)]
    pub ai_host: String,

    /// Provider API key
    #[serde(default)]
    pub ai_api_key: String,

    /// Model name
    #[serde(default = "default_ai_model")]
    pub ai_model: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Translation provider type
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum TranslationProvider {
    // @provider: OpenAI-compatible chat completions
    #[default]
    OpenAI,
    // @provider: Anthropic
    Anthropic,
}

impl TranslationProvider {
    // @returns: Capitalized provider name
    pub fn display_name(&self) -> &str {
        match self {
            Self::OpenAI => "OpenAI",
            Self::Anthropic => "Anthropic",
        }
    }

    // @returns: Lowercase provider identifier
    pub fn to_lowercase_string(&self) -> String {
        match self {
            Self::OpenAI => "openai".to_string(),
            Self::Anthropic => "anthropic".to_string(),
        }
    }
}

// Implement Display trait for TranslationProvider
impl std::fmt::Display for TranslationProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_lowercase_string())
    }
}

// Implement FromStr trait for TranslationProvider
impl std::str::FromStr for TranslationProvider {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "openai" => Ok(Self::OpenAI),
            "anthropic" => Ok(Self::Anthropic),
            _ => Err(anyhow!("Invalid provider type: {}", s)),
        }
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    /// Matching `log` filter
    pub fn to_level_filter(self) -> log::LevelFilter {
        match self {
            Self::Error => log::LevelFilter::Error,
            Self::Warn => log::LevelFilter::Warn,
            Self::Info => log::LevelFilter::Info,
            Self::Debug => log::LevelFilter::Debug,
            Self::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Identifier or dotted member path, e.g. `$t` or `i18n.t`
static FUNCTION_NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z_$][A-Za-z0-9_$]*(\.[A-Za-z_$][A-Za-z0-9_$]*)*$")
        .unwrap_or_else(|e| panic!("invalid function name pattern: {}", e))
});

fn default_translate_function_name() -> String {
    "$t".to_string()
}

fn default_source_language() -> String {
    "zh".to_string()
}

fn default_lang_file_prefix() -> String {
    "local".to_string()
}

fn default_assets_dir() -> String {
    "assets".to_string()
}

fn default_cache_dir() -> String {
    ".cache/translate".to_string()
}

fn default_item_budget() -> usize {
    200
}

fn default_concurrency() -> usize {
    100
}

fn default_max_attempts() -> u32 {
    5
}

fn default_retry_delay_ms() -> u64 {
    1000
}

fn default_ai_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_timeout_secs() -> u64 {
    120
}

fn default_temperature() -> f32 {
    0.3
}

impl Config {
    /// Default configuration file name
    pub const DEFAULT_FILE_NAME: &'static str = "translate.config.json";

    /// Load a configuration file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .context(format!("Failed to open config file: {}", path.display()))?;
        serde_json::from_str(&content)
            .context(format!("Failed to parse config file: {}", path.display()))
    }

    /// Write the configuration as pretty JSON
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self)
            .context("Failed to serialize config to JSON")?;
        std::fs::write(path, json)
            .context(format!("Failed to write config to file: {}", path.display()))
    }

    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<(), AppError> {
        if !FUNCTION_NAME.is_match(&self.translate_function_name) {
            return Err(AppError::Configuration(format!(
                "translateFunctionName '{}' is not a valid identifier",
                self.translate_function_name
            )));
        }

        if !self.ai_host.is_empty() {
            let url = Url::parse(&self.ai_host).map_err(|e| {
                AppError::Configuration(format!("aiHost '{}' is not a valid URL: {}", self.ai_host, e))
            })?;
            if url.scheme() != "http" && url.scheme() != "https" {
                return Err(AppError::Configuration(format!(
                    "aiHost '{}' must use http or https",
                    self.ai_host
                )));
            }
        }

        if self.ai_api_key.trim().is_empty() {
            return Err(AppError::Configuration(format!(
                "aiApiKey is required for the {} provider",
                self.ai_provider.display_name()
            )));
        }
        if self.ai_model.trim().is_empty() {
            return Err(AppError::Configuration("aiModel must not be empty".to_string()));
        }

        if self.target_language_list.is_empty() {
            return Err(AppError::Configuration(
                "targetLanguageList must name at least one language".to_string(),
            ));
        }
        for code in std::iter::once(&self.source_language).chain(&self.target_language_list) {
            language_utils::validate_language_code(code)
                .map_err(|e| AppError::Configuration(e.to_string()))?;
        }
        for code in &self.target_language_list {
            if code != &self.source_language
                && language_utils::language_codes_match(code, &self.source_language)
            {
                warn!(
                    "Target language '{}' is a variant of the source language '{}'; it will be translated",
                    code, self.source_language
                );
            }
        }

        if self.lang_file_prefix.is_empty() {
            return Err(AppError::Configuration("langFilePrefix must not be empty".to_string()));
        }
        if self.item_budget == 0 {
            return Err(AppError::Configuration("numberOfItem must be positive".to_string()));
        }
        if self.concurrency == 0 {
            return Err(AppError::Configuration("batchRequestCount must be positive".to_string()));
        }
        if self.max_attempts == 0 {
            return Err(AppError::Configuration("maxAttempts must be positive".to_string()));
        }

        Ok(())
    }

    /// Batch settings
    pub fn batch_options(&self) -> BatchOptions {
        BatchOptions {
            item_budget: self.item_budget,
            concurrency: self.concurrency,
            max_attempts: self.max_attempts,
            retry_delay: Duration::from_millis(self.retry_delay_ms),
        }
    }

    /// Immutable pipeline options; call after [`Config::validate`]
    pub fn pipeline_options(&self, base_dir: impl AsRef<Path>) -> PipelineOptions {
        let cache_dir = PathBuf::from(&self.cache_dir);
        let cache_dir = if cache_dir.is_absolute() {
            cache_dir
        } else {
            base_dir.as_ref().join(cache_dir)
        };

        PipelineOptions {
            function_name: self.translate_function_name.clone(),
            source_language: self.source_language.clone(),
            target_languages: self.target_language_list.clone(),
            lang_file_prefix: self.lang_file_prefix.clone(),
            cache_dir,
            batch: self.batch_options(),
        }
    }

    /// Request timeout
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Default implementation for Config
impl Default for Config {
    fn default() -> Self {
        Config {
            translate_function_name: default_translate_function_name(),
            source_language: default_source_language(),
            target_language_list: vec!["en".to_string()],
            lang_file_prefix: default_lang_file_prefix(),
            assets_dir: default_assets_dir(),
            cache_dir: default_cache_dir(),
            item_budget: default_item_budget(),
            concurrency: default_concurrency(),
            max_attempts: default_max_attempts(),
            retry_delay_ms: default_retry_delay_ms(),
            ai_provider: TranslationProvider::default(),
            ai_host: String::new(),
            ai_api_key: String::new(),
            ai_model: default_ai_model(),
            timeout_secs: default_timeout_secs(),
            temperature: default_temperature(),
            log_level: LogLevel::default(),
        }
    }
}
