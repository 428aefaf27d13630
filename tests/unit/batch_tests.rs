/*!
 * Tests for batching, retries and checkpoint resume
 */

use std::sync::Arc;

use lingosplice::errors::TranslationError;
use lingosplice::translation::checkpoint::range_key;
use lingosplice::translation::response::BatchPayload;
use lingosplice::translation::{BatchOptions, BatchTranslator, CheckpointStore};

use crate::common::{self, fake_translation, strings, ScriptedCapability};

fn options(max_attempts: u32) -> BatchOptions {
    BatchOptions {
        max_attempts,
        ..common::fast_batch_options()
    }
}

/// Test that a chunk failing twice succeeds on the third call
#[tokio::test]
async fn test_translateAll_withTwoFailures_shouldSucceedOnThirdCall() {
    let dir = tempfile::tempdir().unwrap();
    let capability = Arc::new(ScriptedCapability::failing_first(2));
    let translator = BatchTranslator::new(capability.clone(), options(5), dir.path());

    let results = translator
        .translate_all(&strings(&["你好", "世界"]), &strings(&["en"]))
        .await
        .unwrap();

    assert_eq!(capability.call_count(), 3);
    assert_eq!(results["en"], vec![fake_translation("en", "你好"), fake_translation("en", "世界")]);
    assert_eq!(translator.stats().retries, 2);
}

/// Test that exhausting the attempts fails the phase
#[tokio::test]
async fn test_translateAll_withPersistentFailure_shouldStopAtMaxAttempts() {
    let dir = tempfile::tempdir().unwrap();
    let capability = Arc::new(ScriptedCapability::always_failing(503));
    let translator = BatchTranslator::new(capability.clone(), options(4), dir.path());

    let result = translator.translate_all(&strings(&["你好"]), &strings(&["en"])).await;

    assert!(matches!(result, Err(TranslationError::Failure { attempts: 4, retryable: true, .. })));
    assert_eq!(capability.call_count(), 4);
}

/// Test that rate limiting is retried but other client errors are not
#[tokio::test]
async fn test_translateAll_withClientErrors_shouldOnlyRetryRateLimits() {
    let dir = tempfile::tempdir().unwrap();

    let rejected = Arc::new(ScriptedCapability::always_failing(400));
    let translator = BatchTranslator::new(rejected.clone(), options(3), dir.path());
    let error = translator.translate_all(&strings(&["你好"]), &strings(&["en"])).await.unwrap_err();
    assert!(matches!(error, TranslationError::Failure { attempts: 1, retryable: false, .. }));
    assert!(error.to_string().contains("after 1 attempt(s) (error is not retryable)"));
    assert_eq!(rejected.call_count(), 1);

    let limited = Arc::new(ScriptedCapability::always_failing(429));
    let translator = BatchTranslator::new(limited.clone(), options(3), dir.path());
    assert!(translator.translate_all(&strings(&["你好"]), &strings(&["en"])).await.is_err());
    assert_eq!(limited.call_count(), 3);
}

/// Test that a checkpointed chunk is reused without any call
#[tokio::test]
async fn test_translateAll_withSeededCheckpoint_shouldNotCall() {
    let dir = tempfile::tempdir().unwrap();
    let texts = strings(&["你好", "世界"]);
    let languages = strings(&["en"]);

    let mut payload = BatchPayload::new();
    payload.insert("en".to_string(), strings(&["hello", "world"]));
    let store = CheckpointStore::open(dir.path()).await.unwrap();
    store.record(&range_key(0, 2), &texts, &languages, &payload).await.unwrap();

    let capability = Arc::new(ScriptedCapability::working());
    let translator = BatchTranslator::new(capability.clone(), options(5), dir.path());
    let results = translator.translate_all(&texts, &languages).await.unwrap();

    assert_eq!(capability.call_count(), 0);
    assert_eq!(results["en"], vec!["hello", "world"]);
    assert_eq!(translator.stats().checkpoint_hits, 1);
    assert!(!dir.path().join("process.json").exists());
}

/// Test that a checkpoint recorded for other texts is not reused
#[tokio::test]
async fn test_translateAll_withStaleCheckpoint_shouldCallAgain() {
    let dir = tempfile::tempdir().unwrap();
    let languages = strings(&["en"]);

    let mut payload = BatchPayload::new();
    payload.insert("en".to_string(), strings(&["old", "older"]));
    let store = CheckpointStore::open(dir.path()).await.unwrap();
    store
        .record(&range_key(0, 2), &strings(&["旧", "更旧"]), &languages, &payload)
        .await
        .unwrap();

    let capability = Arc::new(ScriptedCapability::working());
    let translator = BatchTranslator::new(capability.clone(), options(5), dir.path());
    let texts = strings(&["你好", "世界"]);
    let results = translator.translate_all(&texts, &languages).await.unwrap();

    assert_eq!(capability.call_count(), 1);
    assert_eq!(results["en"][0], fake_translation("en", "你好"));
}

/// Test that chunks of a long list come back in order under concurrency
#[tokio::test]
async fn test_translateAll_withManyChunks_shouldReassembleInOrder() {
    let dir = tempfile::tempdir().unwrap();
    let capability = Arc::new(ScriptedCapability::working());
    let batch = BatchOptions {
        item_budget: 6,
        concurrency: 8,
        ..common::fast_batch_options()
    };
    let translator = BatchTranslator::new(capability.clone(), batch, dir.path());

    let texts: Vec<String> = (0..25).map(|i| format!("第{}条", i)).collect();
    let languages = strings(&["en", "ja"]);
    let results = translator.translate_all(&texts, &languages).await.unwrap();

    // 6 items over 2 languages: 3 texts per call
    assert_eq!(capability.call_count(), 9);
    assert!(capability.recorded().iter().all(|call| call.texts.len() <= 3 && call.languages == languages));
    let expected: Vec<String> = texts.iter().map(|text| fake_translation("ja", text)).collect();
    assert_eq!(results["ja"], expected);
}
