/*!
 * Tests for the persisted translation cache
 */

use lingosplice::errors::CacheError;
use lingosplice::translation::cache::CACHE_FILE_NAME;
use lingosplice::translation::{LanguageResults, TranslationCache};

use crate::common::{self, strings, texts_in_key_order};

fn seeded_results() -> LanguageResults {
    let mut results = LanguageResults::new();
    results.insert("zh".to_string(), strings(&["世界", "你好"]));
    results.insert("en".to_string(), strings(&["world", "hello"]));
    results.insert("fr".to_string(), strings(&["monde", "bonjour"]));
    results
}

async fn seeded_cache(dir: &std::path::Path) -> TranslationCache {
    TranslationCache::empty(dir, "zh").save(&seeded_results()).await.unwrap();
    TranslationCache::load(dir, "zh").await.unwrap()
}

/// Test that a new language is full work while cached ones only need new texts
#[tokio::test]
async fn test_diff_withCachedEnFrAndNewDe_shouldSplitWork() {
    let dir = tempfile::tempdir().unwrap();
    let cache = seeded_cache(dir.path()).await;

    let required = strings(&["世界", "你好", "再见"]);
    let diff = cache.diff(&required, &strings(&["en", "fr", "de"]));

    assert_eq!(diff.full_languages, vec!["de"]);
    assert_eq!(diff.partial_languages, vec!["en", "fr"]);
    assert_eq!(diff.missing_texts, vec!["再见"]);
    assert!(!diff.is_satisfied());
}

/// Test that the source language is never scheduled for translation
#[tokio::test]
async fn test_diff_withSourceLanguageRequested_shouldSkipIt() {
    let dir = tempfile::tempdir().unwrap();
    let cache = seeded_cache(dir.path()).await;

    let diff = cache.diff(&strings(&["你好"]), &strings(&["zh", "en"]));

    assert!(diff.full_languages.is_empty());
    assert_eq!(diff.partial_languages, vec!["en"]);
    assert!(diff.missing_texts.is_empty());
    assert!(diff.is_satisfied());
}

/// Test that merging looks cached values up by text, not by old index
#[tokio::test]
async fn test_mergePartial_withShiftedIndices_shouldFollowText() {
    let dir = tempfile::tempdir().unwrap();
    let cache = seeded_cache(dir.path()).await;

    // "一" sorts first, shifting every cached text by one index
    let texts = strings(&["一", "世界", "你好"]);
    let merged = cache
        .merge_partial("en", &texts, &strings(&["一"]), &strings(&["one"]))
        .unwrap();

    assert_eq!(merged, vec!["one", "world", "hello"]);
}

/// Test that the file is written as placeholder maps keyed by index
#[tokio::test]
async fn test_save_shouldWritePlaceholderMaps() {
    let dir = tempfile::tempdir().unwrap();
    seeded_cache(dir.path()).await;

    let content = std::fs::read_to_string(dir.path().join(CACHE_FILE_NAME)).unwrap();
    let maps: std::collections::BTreeMap<String, std::collections::BTreeMap<String, String>> =
        serde_json::from_str(&content).unwrap();

    assert_eq!(maps["zh"]["t_0"], "世界");
    assert_eq!(texts_in_key_order(&maps["en"]), vec!["world", "hello"]);
}

/// Test that a missing file is an empty cache and a corrupt one is an error
#[tokio::test]
async fn test_load_withMissingOrCorruptFile_shouldBehaveDifferently() {
    let dir = tempfile::tempdir().unwrap();
    let cache = TranslationCache::load(dir.path(), "zh").await.unwrap();
    assert!(!cache.has_language("en"));

    common::create_test_file(dir.path(), CACHE_FILE_NAME, "{\"en\": [1, 2]").unwrap();
    let result = TranslationCache::load(dir.path(), "zh").await;
    assert!(matches!(result, Err(CacheError::Corrupt { .. })));
}
