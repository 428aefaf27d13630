/*!
 * Batch translation processing.
 *
 * This module splits text lists into chunks sized by the per-call item
 * budget, runs them through the translation capability with bounded
 * concurrency, checkpoints every validated chunk, and reassembles the
 * per-language results in chunk order.
 */

use futures::stream::{self, StreamExt};
use log::{debug, error, info, warn};
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::errors::TranslationError;

use super::cache::LanguageResults;
use super::checkpoint::{range_key, CheckpointStore};
use super::core::TranslationCapability;
use super::response::{parse_payload, BatchPayload};

/// Progress callback receiving `(done_chunks, total_chunks)` for the current phase
pub type ProgressCallback = Arc<dyn Fn(usize, usize) + Send + Sync>;

/// Batching and retry settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchOptions {
    /// Items per call, shared by every language of the call
    pub item_budget: usize,
    /// Maximum number of calls in flight
    pub concurrency: usize,
    /// Attempts per chunk
    pub max_attempts: u32,
    /// Fixed delay between attempts
    pub retry_delay: Duration,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            item_budget: 200,
            concurrency: 100,
            max_attempts: 5,
            retry_delay: Duration::from_millis(1000),
        }
    }
}

impl BatchOptions {
    /// Texts per chunk when translating into `language_count` languages at once
    pub fn batch_size(&self, language_count: usize) -> usize {
        (self.item_budget / language_count.max(1)).max(1)
    }
}

/// Texts to translate into a set of languages
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchWork {
    /// Texts, in the order results must come back in
    pub texts: Vec<String>,
    /// Target languages
    pub languages: Vec<String>,
}

impl BatchWork {
    /// Create a unit of work
    pub fn new(texts: Vec<String>, languages: Vec<String>) -> Self {
        Self { texts, languages }
    }

    /// Whether no call is needed
    pub fn is_empty(&self) -> bool {
        self.texts.is_empty() || self.languages.is_empty()
    }
}

/// Counters across every phase run by a translator
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchStats {
    /// Chunks processed
    pub chunks: usize,
    /// Calls made to the translation capability
    pub calls: usize,
    /// Chunks answered from the checkpoint store
    pub checkpoint_hits: usize,
    /// Attempts that were retried
    pub retries: usize,
}

/// Batch translator for text lists
pub struct BatchTranslator {
    /// The translation capability to use
    capability: Arc<dyn TranslationCapability>,

    /// Batching and retry settings
    options: BatchOptions,

    /// Directory of the checkpoint store
    cache_dir: PathBuf,

    /// Counters, updated from concurrent chunks
    stats: Mutex<BatchStats>,

    /// Optional progress reporting
    progress: Option<ProgressCallback>,
}

impl BatchTranslator {
    /// Create a new batch translator
    pub fn new(capability: Arc<dyn TranslationCapability>, options: BatchOptions, cache_dir: impl AsRef<Path>) -> Self {
        Self {
            capability,
            options,
            cache_dir: cache_dir.as_ref().to_path_buf(),
            stats: Mutex::new(BatchStats::default()),
            progress: None,
        }
    }

    /// Report chunk progress through `callback`
    pub fn with_progress(mut self, callback: ProgressCallback) -> Self {
        self.progress = Some(callback);
        self
    }

    /// Snapshot of the counters
    pub fn stats(&self) -> BatchStats {
        self.stats.lock().clone()
    }

    /// Translate the full-language work and the partial-language work, in that
    /// order. Each result list is aligned to its work's text list.
    pub async fn translate_missing(
        &self,
        full_work: &BatchWork,
        partial_work: &BatchWork,
    ) -> Result<(LanguageResults, LanguageResults), TranslationError> {
        if !full_work.is_empty() {
            info!(
                "Translating {} text(s) into new language(s): {}",
                full_work.texts.len(),
                full_work.languages.join(", ")
            );
        }
        let full = self.translate_all(&full_work.texts, &full_work.languages).await?;

        if !partial_work.is_empty() {
            info!(
                "Translating {} new text(s) into cached language(s): {}",
                partial_work.texts.len(),
                partial_work.languages.join(", ")
            );
        }
        let partial = self.translate_all(&partial_work.texts, &partial_work.languages).await?;

        Ok((full, partial))
    }

    /// Translate every text into every language as one checkpointed phase
    pub async fn translate_all(
        &self,
        texts: &[String],
        languages: &[String],
    ) -> Result<LanguageResults, TranslationError> {
        let mut results: LanguageResults = languages
            .iter()
            .map(|language| (language.clone(), Vec::with_capacity(texts.len())))
            .collect();
        if texts.is_empty() || languages.is_empty() {
            return Ok(results);
        }

        let batch_size = self.options.batch_size(languages.len());
        let chunks: Vec<(usize, usize)> = (0..texts.len())
            .step_by(batch_size)
            .map(|start| (start, (start + batch_size).min(texts.len())))
            .collect();
        let total = chunks.len();
        debug!(
            "Phase: {} text(s), {} language(s), {} chunk(s) of up to {}",
            texts.len(),
            languages.len(),
            total,
            batch_size
        );

        let store = CheckpointStore::open(&self.cache_dir).await?;
        let started = Instant::now();

        let mut completed: Vec<(usize, BatchPayload)> = Vec::with_capacity(total);
        {
            let done = AtomicUsize::new(0);
            let store = &store;
            let done = &done;

            let mut pending = stream::iter(chunks)
                .map(|(start, end)| async move {
                    let result = self
                        .translate_chunk(store, &texts[start..end], languages, start, end)
                        .await;
                    if result.is_ok() {
                        let current = done.fetch_add(1, Ordering::SeqCst) + 1;
                        if let Some(progress) = &self.progress {
                            progress(current, total);
                        }
                    }
                    (start, result)
                })
                .buffer_unordered(self.options.concurrency.max(1));

            while let Some((start, result)) = pending.next().await {
                match result {
                    Ok(payload) => completed.push((start, payload)),
                    Err(e) => {
                        // dropping the stream cancels chunks still in flight
                        error!("{}", e);
                        return Err(e);
                    }
                }
            }
        }

        completed.sort_by_key(|(start, _)| *start);
        for (start, mut payload) in completed {
            for language in languages {
                let items = payload.remove(language).ok_or_else(|| {
                    TranslationError::Validation(format!(
                        "batch starting at {} has no result for '{}'",
                        start, language
                    ))
                })?;
                if let Some(list) = results.get_mut(language) {
                    list.extend(items);
                }
            }
        }

        store.clear().await?;
        self.stats.lock().chunks += total;
        debug!("Phase finished in {:?}", started.elapsed());

        Ok(results)
    }

    /// Translate one chunk: checkpoint lookup, then attempts with a fixed delay
    async fn translate_chunk(
        &self,
        store: &CheckpointStore,
        texts: &[String],
        languages: &[String],
        start: usize,
        end: usize,
    ) -> Result<BatchPayload, TranslationError> {
        let key = range_key(start, end);

        if let Some(payload) = store.get(&key, texts, languages).await {
            debug!("Using checkpoint for batch {}", key);
            self.stats.lock().checkpoint_hits += 1;
            return Ok(payload);
        }

        let max_attempts = self.options.max_attempts.max(1);
        let mut attempts = 0;
        let mut last_error = String::new();
        let mut retryable = true;

        while attempts < max_attempts {
            attempts += 1;
            self.stats.lock().calls += 1;

            let outcome = match self.capability.translate(texts, languages).await {
                Ok(raw) => parse_payload(&raw, languages, texts.len()),
                Err(e) => Err(TranslationError::from(e)),
            };

            match outcome {
                Ok(payload) => {
                    store.record(&key, texts, languages, &payload).await?;
                    debug!("Batch {} translated", key);
                    return Ok(payload);
                }
                Err(e) => {
                    warn!("Batch {} attempt {}/{} failed: {}", key, attempts, max_attempts, e);
                    last_error = e.to_string();
                    retryable = e.is_retryable();
                    if !retryable {
                        break;
                    }
                    if attempts < max_attempts {
                        self.stats.lock().retries += 1;
                        tokio::time::sleep(self.options.retry_delay).await;
                    }
                }
            }
        }

        Err(TranslationError::Failure {
            key,
            attempts,
            retryable,
            message: last_error,
        })
    }
}
