/*!
 * Tests for configuration loading and saving
 */

use lingosplice::app_config::{Config, LogLevel, TranslationProvider};
use std::str::FromStr;

use crate::common;

/// Test that a saved configuration loads back unchanged
#[test]
fn test_save_thenFromFile_shouldKeepEveryField() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(Config::DEFAULT_FILE_NAME);

    let config = Config {
        target_language_list: common::strings(&["en", "ja"]),
        ai_provider: TranslationProvider::Anthropic,
        ai_api_key: "key".to_string(),
        log_level: LogLevel::Debug,
        ..Config::default()
    };
    config.save(&path).unwrap();

    assert_eq!(Config::from_file(&path).unwrap(), config);
}

/// Test that files use the camelCase keys of existing projects
#[test]
fn test_save_shouldWriteCamelCaseKeys() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("translate.config.json");
    Config::default().save(&path).unwrap();

    let content = std::fs::read_to_string(&path).unwrap();
    for key in ["translateFunctionName", "targetLanguageList", "numberOfItem", "batchRequestCount", "aiApiKey", "langFilePrefix"] {
        assert!(content.contains(key), "missing key {}", key);
    }
}

/// Test that a malformed file is reported instead of silently defaulted
#[test]
fn test_fromFile_withMalformedJson_shouldFail() {
    let dir = tempfile::tempdir().unwrap();
    let path = common::create_test_file(dir.path(), "translate.config.json", "{ not json").unwrap();

    let error = Config::from_file(&path).unwrap_err();
    assert!(error.to_string().contains("Failed to parse config file"));
}

/// Test that provider names parse case-insensitively
#[test]
fn test_translationProvider_fromStr_shouldIgnoreCase() {
    assert_eq!(TranslationProvider::from_str("OpenAI").unwrap(), TranslationProvider::OpenAI);
    assert_eq!(TranslationProvider::from_str("anthropic").unwrap(), TranslationProvider::Anthropic);
    assert!(TranslationProvider::from_str("ollama").is_err());
}
