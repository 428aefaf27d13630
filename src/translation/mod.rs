/*!
 * Incremental translation of extracted texts.
 *
 * This module turns the marks found by `extraction` into translated
 * per-language assets. It is split into several submodules:
 *
 * - `pool`: Global text pool and canonical placeholder ids
 * - `cache`: Persisted `lang.json` and the cache diff
 * - `checkpoint`: Per-chunk `process.json` checkpoints
 * - `prompts`: Prompt rendering for a chunk
 * - `response`: Validation of model answers
 * - `core`: Translation capability and the provider-backed service
 * - `batch`: Chunking, concurrency and retries
 * - `rewriter`: Source rewriting and asset generation
 * - `pipeline`: One end-to-end run
 */

// Re-export main types for easier usage
pub use self::batch::{BatchOptions, BatchStats, BatchTranslator, BatchWork, ProgressCallback};
pub use self::cache::{CacheDiff, LanguageResults, TranslationCache};
pub use self::checkpoint::CheckpointStore;
pub use self::core::{TokenUsageStats, TranslationCapability, TranslationService};
pub use self::pipeline::{PipelineOptions, PipelineOutput, PipelineStats, TranslationPipeline};
pub use self::pool::{CanonicalPool, TextPool};
pub use self::rewriter::AssetFile;

// Submodules
pub mod batch;
pub mod cache;
pub mod checkpoint;
pub mod core;
pub mod pipeline;
pub mod pool;
pub mod prompts;
pub mod response;
pub mod rewriter;
