/*!
 * End-to-end translation pipeline.
 *
 * One run: extract marks from every source unit, build and canonicalize
 * the global text pool, diff it against the persisted cache, translate only
 * what is missing, rewrite the units, emit per-language assets, and finally
 * persist the cache. The cache is written only once everything else has
 * succeeded.
 */

use log::{debug, info};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use crate::errors::AppError;
use crate::extraction::{JsLiteralScanner, LiteralParser, ReplacementMark, TargetScript, TextExtractor};

use super::batch::{BatchOptions, BatchStats, BatchTranslator, BatchWork, ProgressCallback};
use super::cache::{LanguageResults, TranslationCache};
use super::core::TranslationCapability;
use super::pool::TextPool;
use super::rewriter::{build_assets, rewrite_source, AssetFile};

/// Settings for one pipeline, fixed for its lifetime
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineOptions {
    /// Lookup function called by rewritten literals
    pub function_name: String,
    /// Language of the extracted texts
    pub source_language: String,
    /// Requested output languages besides the source
    pub target_languages: Vec<String>,
    /// Prefix of asset file names
    pub lang_file_prefix: String,
    /// Directory of `lang.json` and `process.json`
    pub cache_dir: PathBuf,
    /// Batching and retry settings
    pub batch: BatchOptions,
}

impl PipelineOptions {
    /// Source language followed by each target language, without duplicates
    pub fn output_languages(&self) -> Vec<String> {
        let mut languages = vec![self.source_language.clone()];
        for language in &self.target_languages {
            if !languages.contains(language) {
                languages.push(language.clone());
            }
        }
        languages
    }
}

/// Counters describing one run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PipelineStats {
    /// Source units processed
    pub units: usize,
    /// Replacement marks applied
    pub marks: usize,
    /// Unique texts in the pool
    pub texts: usize,
    /// Texts absent from the cache
    pub missing_texts: usize,
    /// Languages translated from scratch
    pub full_languages: Vec<String>,
    /// Languages completed from the cache
    pub partial_languages: Vec<String>,
    /// Batch counters
    pub batch: BatchStats,
}

/// Result of a successful run
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    /// Every unit's text after rewriting, keyed by path
    pub updated_sources: BTreeMap<String, String>,
    /// One asset per output language
    pub asset_files: Vec<AssetFile>,
    /// Content fingerprint of the canonical pool
    pub fingerprint: String,
    /// Run counters
    pub stats: PipelineStats,
}

/// Incremental translation pipeline
pub struct TranslationPipeline {
    options: PipelineOptions,
    capability: Arc<dyn TranslationCapability>,
    parser: Arc<dyn LiteralParser>,
    progress: Option<ProgressCallback>,
}

impl TranslationPipeline {
    /// Create a pipeline that scans JavaScript units
    pub fn new(options: PipelineOptions, capability: Arc<dyn TranslationCapability>) -> Self {
        Self {
            options,
            capability,
            parser: Arc::new(JsLiteralScanner::new()),
            progress: None,
        }
    }

    /// Use another literal parser
    pub fn with_parser(mut self, parser: Arc<dyn LiteralParser>) -> Self {
        self.parser = parser;
        self
    }

    /// Report batch progress through `callback`
    pub fn with_progress(mut self, callback: ProgressCallback) -> Self {
        self.progress = Some(callback);
        self
    }

    /// Options of this pipeline
    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    /// Extract the marks of every unit
    pub fn extract_all(
        &self,
        sources: &BTreeMap<String, String>,
    ) -> Result<BTreeMap<String, Vec<ReplacementMark>>, AppError> {
        let extractor = TextExtractor::new(
            TargetScript::for_language(&self.options.source_language),
            self.options.function_name.clone(),
        );

        sources
            .iter()
            .map(|(path, text)| {
                let marks = extractor.extract_source(self.parser.as_ref(), path, text)?;
                Ok::<_, AppError>((path.clone(), marks))
            })
            .collect()
    }

    /// Run the pipeline over `{path → text}`
    pub async fn run(&self, sources: BTreeMap<String, String>) -> Result<PipelineOutput, AppError> {
        let marks_by_unit = self.extract_all(&sources)?;

        let mut pool = TextPool::new();
        for marks in marks_by_unit.values() {
            pool.add_marks(marks);
        }
        let pool = pool.canonicalize();
        let fingerprint = pool.fingerprint();
        let texts = pool.canonical_order();
        let output_languages = self.options.output_languages();

        let mut stats = PipelineStats {
            units: sources.len(),
            marks: marks_by_unit.values().map(Vec::len).sum(),
            texts: texts.len(),
            ..PipelineStats::default()
        };
        info!(
            "Found {} text(s) in {} mark(s) across {} unit(s); fingerprint {}",
            stats.texts, stats.marks, stats.units, fingerprint
        );

        if pool.is_empty() {
            info!("Nothing to translate; cache left untouched");
            let results: LanguageResults = output_languages
                .into_iter()
                .map(|language| (language, Vec::new()))
                .collect();
            return Ok(PipelineOutput {
                updated_sources: sources,
                asset_files: build_assets(&results, &self.options.lang_file_prefix, &fingerprint)?,
                fingerprint,
                stats,
            });
        }

        let cache = TranslationCache::load(&self.options.cache_dir, &self.options.source_language).await?;
        let diff = cache.diff(texts, &self.options.target_languages);
        stats.missing_texts = diff.missing_texts.len();
        stats.full_languages = diff.full_languages.clone();
        stats.partial_languages = diff.partial_languages.clone();

        let mut translator = BatchTranslator::new(
            Arc::clone(&self.capability),
            self.options.batch.clone(),
            &self.options.cache_dir,
        );
        if let Some(progress) = &self.progress {
            translator = translator.with_progress(Arc::clone(progress));
        }

        let full_work = BatchWork::new(texts.to_vec(), diff.full_languages.clone());
        let partial_work = BatchWork::new(diff.missing_texts.clone(), diff.partial_languages.clone());
        if diff.is_satisfied() {
            info!("All texts found in cache");
        }
        let (mut full, partial) = translator.translate_missing(&full_work, &partial_work).await?;
        stats.batch = translator.stats();

        let mut results = LanguageResults::new();
        results.insert(self.options.source_language.clone(), texts.to_vec());
        for language in &diff.full_languages {
            let list = full.remove(language).unwrap_or_default();
            results.insert(language.clone(), list);
        }
        for language in &diff.partial_languages {
            let fresh = partial.get(language).map(Vec::as_slice).unwrap_or_default();
            let merged = cache.merge_partial(language, texts, &diff.missing_texts, fresh)?;
            results.insert(language.clone(), merged);
        }
        debug!("Assembled results for {} language(s)", results.len());

        let mut updated_sources = BTreeMap::new();
        for (path, text) in &sources {
            let marks = marks_by_unit.get(path).map(Vec::as_slice).unwrap_or_default();
            let rewritten = if marks.is_empty() {
                text.clone()
            } else {
                rewrite_source(path, text, marks, &pool)?
            };
            updated_sources.insert(path.clone(), rewritten);
        }

        let asset_files = build_assets(&results, &self.options.lang_file_prefix, &fingerprint)?;

        cache.save(&results).await?;
        info!(
            "Translation finished: {} call(s), {} checkpoint hit(s), {} retry(ies)",
            stats.batch.calls, stats.batch.checkpoint_hits, stats.batch.retries
        );

        Ok(PipelineOutput {
            updated_sources,
            asset_files,
            fingerprint,
            stats,
        })
    }
}
