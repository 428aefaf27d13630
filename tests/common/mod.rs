/*!
 * Common test utilities for the lingosplice test suite
 */

use anyhow::Result;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use lingosplice::errors::ProviderError;
use lingosplice::translation::{BatchOptions, PipelineOptions, TranslationCapability};

/// Creates a test file with the given content in the specified directory
pub fn create_test_file(dir: &Path, filename: &str, content: &str) -> Result<PathBuf> {
    let file_path = dir.join(filename);
    if let Some(parent) = file_path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&file_path, content)?;
    Ok(file_path)
}

/// Owned strings from literals
pub fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Fake translation used by [`ScriptedCapability`]
pub fn fake_translation(language: &str, text: &str) -> String {
    format!("{}:{}", language, text)
}

/// Values of a `t_N` keyed map, in numeric index order
pub fn texts_in_key_order(entries: &BTreeMap<String, String>) -> Vec<String> {
    let mut indexed: Vec<(usize, &String)> = entries
        .iter()
        .filter_map(|(key, text)| {
            let index = key.strip_prefix("t_")?.parse().ok()?;
            Some((index, text))
        })
        .collect();
    indexed.sort_by_key(|(index, _)| *index);
    indexed.into_iter().map(|(_, text)| text.clone()).collect()
}

/// Batch options without retry delays
pub fn fast_batch_options() -> BatchOptions {
    BatchOptions {
        retry_delay: Duration::ZERO,
        ..BatchOptions::default()
    }
}

/// Pipeline options for `zh` sources with the given targets
pub fn pipeline_options(cache_dir: &Path, targets: &[&str]) -> PipelineOptions {
    PipelineOptions {
        function_name: "$t".to_string(),
        source_language: "zh".to_string(),
        target_languages: strings(targets),
        lang_file_prefix: "local".to_string(),
        cache_dir: cache_dir.to_path_buf(),
        batch: fast_batch_options(),
    }
}

/// One recorded call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    pub texts: Vec<String>,
    pub languages: Vec<String>,
}

/// Translation capability that answers with well-formed payloads after
/// failing a configurable number of times, recording every call
#[derive(Debug, Default)]
pub struct ScriptedCapability {
    failures_before_success: usize,
    failure_status: u16,
    calls: AtomicUsize,
    recorded: Mutex<Vec<RecordedCall>>,
}

impl ScriptedCapability {
    /// Always answers correctly
    pub fn working() -> Self {
        Self::default()
    }

    /// Fails the first `failures` calls with a server error
    pub fn failing_first(failures: usize) -> Self {
        Self {
            failures_before_success: failures,
            failure_status: 500,
            ..Self::default()
        }
    }

    /// Fails every call with `status`
    pub fn always_failing(status: u16) -> Self {
        Self {
            failures_before_success: usize::MAX,
            failure_status: status,
            ..Self::default()
        }
    }

    /// Number of calls made so far
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Every call made so far
    pub fn recorded(&self) -> Vec<RecordedCall> {
        self.recorded.lock().clone()
    }

    /// Every text sent in any call
    pub fn texts_sent(&self) -> Vec<String> {
        self.recorded
            .lock()
            .iter()
            .flat_map(|call| call.texts.clone())
            .collect()
    }
}

#[async_trait]
impl TranslationCapability for ScriptedCapability {
    async fn translate(&self, texts: &[String], languages: &[String]) -> Result<String, ProviderError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        self.recorded.lock().push(RecordedCall {
            texts: texts.to_vec(),
            languages: languages.to_vec(),
        });

        if call < self.failures_before_success {
            return Err(ProviderError::ApiError {
                status_code: self.failure_status,
                message: "scripted failure".to_string(),
            });
        }

        let payload: BTreeMap<&String, Vec<String>> = languages
            .iter()
            .map(|language| {
                let items = texts.iter().map(|text| fake_translation(language, text)).collect();
                (language, items)
            })
            .collect();
        let body = serde_json::to_string(&payload)
            .map_err(|e| ProviderError::ParseError(e.to_string()))?;

        Ok(format!("Here you go:\n```json\n{}\n```", body))
    }
}
