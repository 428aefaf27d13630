use anyhow::{Context, Result};
use async_trait::async_trait;
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, info, warn};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::app_config::Config;
use crate::errors::ProviderError;
use crate::file_utils::FileManager;
use crate::language_utils;
use crate::translation::{
    PipelineOutput, ProgressCallback, TextPool, TranslationCapability, TranslationPipeline, TranslationService,
};

// @module: Application controller for bundle translation

/// What one run wrote to disk
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    /// Script files found under the input directory
    pub scanned_files: usize,
    /// Script files whose content changed
    pub rewritten_files: Vec<PathBuf>,
    /// Asset files written
    pub asset_files: Vec<PathBuf>,
    /// Fingerprint shared by the asset names
    pub fingerprint: String,
}

/// Main application controller
pub struct Controller {
    // @field: App configuration
    config: Config,
    // @field: Directory relative cache paths are resolved against
    base_dir: PathBuf,
}

impl Controller {
    // @method: Create a new controller with the given configuration
    pub fn with_config(config: Config) -> Result<Self> {
        Ok(Self {
            config,
            base_dir: PathBuf::from("."),
        })
    }

    /// Resolve a relative cache directory against `base_dir`
    pub fn with_base_dir(mut self, base_dir: impl Into<PathBuf>) -> Self {
        self.base_dir = base_dir.into();
        self
    }

    /// Configuration in use
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Translate every script under `input_dir` with the configured provider
    pub async fn run(&self, input_dir: PathBuf) -> Result<RunSummary> {
        self.config.validate().context("Invalid configuration")?;
        let service = Arc::new(TranslationService::new(&self.config));
        let start_time = Instant::now();

        let summary = self.run_with_capability(input_dir, service.clone()).await?;

        let token_usage = service.token_usage();
        if token_usage.requests > 0 {
            info!("🔢 {}", token_usage.summary());
        }
        info!("Completed in {}.", Self::format_duration(start_time.elapsed()));

        Ok(summary)
    }

    /// Translate every script under `input_dir` through `capability`
    pub async fn run_with_capability(
        &self,
        input_dir: PathBuf,
        capability: Arc<dyn TranslationCapability>,
    ) -> Result<RunSummary> {
        if !FileManager::dir_exists(&input_dir) {
            return Err(anyhow::anyhow!("Input directory does not exist: {:?}", input_dir));
        }

        let assets_dir = input_dir.join(&self.config.assets_dir);
        let files = FileManager::find_script_files(&input_dir, &[assets_dir.clone()])?;
        if files.is_empty() {
            warn!("No script files found in {:?}", input_dir);
        }
        let sources = Self::read_sources(&input_dir, &files)?;

        info!(
            "🚀 lingosplice: {} file(s), {} → {}",
            files.len(),
            language_utils::describe_language(&self.config.source_language),
            self.config
                .target_language_list
                .iter()
                .map(|code| language_utils::describe_language(code))
                .collect::<Vec<_>>()
                .join(", ")
        );

        let progress_bar = Self::chunk_progress_bar();
        let pipeline = TranslationPipeline::new(self.config.pipeline_options(&self.base_dir), capability)
            .with_progress(Self::progress_callback(progress_bar.clone()));

        let result = pipeline.run(sources.clone()).await;
        progress_bar.finish_and_clear();
        let output = result.context("Translation pipeline failed")?;

        let summary = self.write_output(&input_dir, &assets_dir, &sources, output, files.len())?;
        info!(
            "Rewrote {} of {} file(s), wrote {} asset(s) with fingerprint {}",
            summary.rewritten_files.len(),
            summary.scanned_files,
            summary.asset_files.len(),
            summary.fingerprint
        );
        Ok(summary)
    }

    /// List the unique texts a file would contribute, without translating anything
    pub fn scan(&self, file: &Path) -> Result<Vec<String>> {
        let content = FileManager::read_to_string(file)?;
        let key = file.to_string_lossy().to_string();

        let mut sources = BTreeMap::new();
        sources.insert(key, content);

        let pipeline = TranslationPipeline::new(self.config.pipeline_options(&self.base_dir), Arc::new(NoCapability));
        let marks = pipeline
            .extract_all(&sources)
            .with_context(|| format!("Failed to scan {:?}", file))?;

        let mut pool = TextPool::new();
        for unit_marks in marks.values() {
            pool.add_marks(unit_marks);
        }
        Ok(pool.canonicalize().canonical_order().to_vec())
    }

    /// Read every file into `{relative path → content}`
    fn read_sources(input_dir: &Path, files: &[PathBuf]) -> Result<BTreeMap<String, String>> {
        let mut sources = BTreeMap::new();
        for file in files {
            let key = file
                .strip_prefix(input_dir)
                .unwrap_or(file)
                .to_string_lossy()
                .replace('\\', "/");
            let content = FileManager::read_to_string(file)?;
            sources.insert(key, content);
        }
        debug!("Read {} source file(s)", sources.len());
        Ok(sources)
    }

    fn write_output(
        &self,
        input_dir: &Path,
        assets_dir: &Path,
        originals: &BTreeMap<String, String>,
        output: PipelineOutput,
        scanned_files: usize,
    ) -> Result<RunSummary> {
        let mut summary = RunSummary {
            scanned_files,
            fingerprint: output.fingerprint,
            ..RunSummary::default()
        };

        for (key, content) in &output.updated_sources {
            if originals.get(key) == Some(content) {
                continue;
            }
            let path = input_dir.join(key);
            FileManager::write_atomic(&path, content)?;
            debug!("Rewrote {:?}", path);
            summary.rewritten_files.push(path);
        }

        FileManager::ensure_dir(assets_dir)?;
        for asset in &output.asset_files {
            let path = assets_dir.join(&asset.file_name);
            FileManager::write_atomic(&path, &asset.content)?;
            info!("Success: {}", path.display());
            summary.asset_files.push(path);
        }

        Ok(summary)
    }

    fn chunk_progress_bar() -> ProgressBar {
        let progress_bar = ProgressBar::new(0);
        let style = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} chunks ({percent}%) {msg} {eta}")
            .or_else(|_| ProgressStyle::default_bar().template("{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len} ({percent}%) {msg}"))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        progress_bar.set_style(style.progress_chars("█▓▒░"));
        progress_bar
    }

    fn progress_callback(progress_bar: ProgressBar) -> ProgressCallback {
        Arc::new(move |done, total| {
            progress_bar.set_length(total as u64);
            progress_bar.set_position(done as u64);
        })
    }

    /// Format a duration as `1h 2m 3s`, `2m 3s` or `3s`
    fn format_duration(duration: Duration) -> String {
        let total_secs = duration.as_secs();
        let hours = total_secs / 3600;
        let minutes = (total_secs % 3600) / 60;
        let seconds = total_secs % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}s", seconds)
        }
    }
}

/// Capability for extraction-only pipelines; never reached
struct NoCapability;

#[async_trait]
impl TranslationCapability for NoCapability {
    async fn translate(&self, _texts: &[String], _languages: &[String]) -> Result<String, ProviderError> {
        Err(ProviderError::RequestFailed(
            "translation is not available while scanning".to_string(),
        ))
    }
}
