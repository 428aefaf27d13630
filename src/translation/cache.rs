/*!
 * Persisted translation cache.
 *
 * `lang.json` holds `{language → {placeholder key → text}}` from the last
 * successful run. The source language's own entries are the authoritative
 * list of previously translated texts; every other language is joined to
 * it by placeholder key so cached values can be found by source text.
 */

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::{Path, PathBuf};

use log::{debug, info};

use crate::errors::{AppError, CacheError};
use crate::file_utils::FileManager;

use super::pool::placeholder_key;

/// File name of the persisted cache inside the cache directory
pub const CACHE_FILE_NAME: &str = "lang.json";

/// On-disk shape of `lang.json`
pub type LanguageMaps = BTreeMap<String, BTreeMap<String, String>>;

/// Per-language result lists aligned to a text list
pub type LanguageResults = BTreeMap<String, Vec<String>>;

/// Work classification produced by [`TranslationCache::diff`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheDiff {
    /// Languages with no cached entries; the whole text list is needed
    pub full_languages: Vec<String>,
    /// Languages with cached entries; only `missing_texts` are needed
    pub partial_languages: Vec<String>,
    /// Required texts absent from the cached source-text list
    pub missing_texts: Vec<String>,
}

impl CacheDiff {
    /// Whether no translation call is needed
    pub fn is_satisfied(&self) -> bool {
        self.full_languages.is_empty()
            && (self.partial_languages.is_empty() || self.missing_texts.is_empty())
    }
}

/// Translation cache loaded from the cache directory
#[derive(Debug, Clone)]
pub struct TranslationCache {
    path: PathBuf,
    source_language: String,
    /// Previously translated source texts
    source_texts: HashSet<String>,
    /// language → source text → translation
    by_text: HashMap<String, HashMap<String, String>>,
}

impl TranslationCache {
    /// Create an empty cache bound to a directory
    pub fn empty(cache_dir: impl AsRef<Path>, source_language: &str) -> Self {
        Self {
            path: cache_dir.as_ref().join(CACHE_FILE_NAME),
            source_language: source_language.to_string(),
            source_texts: HashSet::new(),
            by_text: HashMap::new(),
        }
    }

    /// Load the cache; a missing file yields an empty cache, an unparsable one is fatal
    pub async fn load(cache_dir: impl AsRef<Path>, source_language: &str) -> Result<Self, CacheError> {
        let mut cache = Self::empty(cache_dir, source_language);

        let content = match tokio::fs::read_to_string(&cache.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No translation cache at {:?}", cache.path);
                return Ok(cache);
            }
            Err(e) => {
                return Err(CacheError::Io {
                    path: cache.path.clone(),
                    message: e.to_string(),
                });
            }
        };

        let maps: LanguageMaps = serde_json::from_str(&content).map_err(|e| CacheError::Corrupt {
            path: cache.path.clone(),
            message: e.to_string(),
        })?;
        cache.absorb(maps);

        info!(
            "Loaded translation cache: {} text(s), {} language(s)",
            cache.source_texts.len(),
            cache.by_text.len()
        );
        Ok(cache)
    }

    /// Build a cache from already-parsed maps
    pub fn from_maps(cache_dir: impl AsRef<Path>, source_language: &str, maps: LanguageMaps) -> Self {
        let mut cache = Self::empty(cache_dir, source_language);
        cache.absorb(maps);
        cache
    }

    fn absorb(&mut self, mut maps: LanguageMaps) {
        let source = maps.remove(&self.source_language).unwrap_or_default();
        self.source_texts = source.values().cloned().collect();

        for (language, entries) in maps {
            let joined = entries
                .into_iter()
                .filter_map(|(key, translated)| {
                    source.get(&key).map(|text| (text.clone(), translated))
                })
                .collect();
            self.by_text.insert(language, joined);
        }
    }

    /// Path of the persisted file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether a language has cached entries
    pub fn has_language(&self, language: &str) -> bool {
        self.by_text.contains_key(language)
    }

    /// Cached translation of a source text
    pub fn lookup(&self, language: &str, text: &str) -> Option<&str> {
        self.by_text.get(language)?.get(text).map(String::as_str)
    }

    /// Classify the work needed for `required_texts` in `required_languages`
    pub fn diff(&self, required_texts: &[String], required_languages: &[String]) -> CacheDiff {
        let mut diff = CacheDiff::default();

        for language in required_languages {
            if *language == self.source_language
                || diff.full_languages.contains(language)
                || diff.partial_languages.contains(language)
            {
                continue;
            }
            if self.has_language(language) {
                diff.partial_languages.push(language.clone());
            } else {
                diff.full_languages.push(language.clone());
            }
        }

        diff.missing_texts = required_texts
            .iter()
            .filter(|text| !self.source_texts.contains(*text))
            .cloned()
            .collect();

        debug!(
            "Cache diff: full={:?} partial={:?} missing={}",
            diff.full_languages,
            diff.partial_languages,
            diff.missing_texts.len()
        );
        diff
    }

    /// Assemble a language's result list for `texts`, taking fresh translations
    /// for `missing_texts` and cached values, looked up by source text, for the rest
    pub fn merge_partial(
        &self,
        language: &str,
        texts: &[String],
        missing_texts: &[String],
        fresh: &[String],
    ) -> Result<Vec<String>, AppError> {
        let fresh_by_text: HashMap<&str, &str> = missing_texts
            .iter()
            .map(String::as_str)
            .zip(fresh.iter().map(String::as_str))
            .collect();

        texts
            .iter()
            .map(|text| {
                fresh_by_text
                    .get(text.as_str())
                    .copied()
                    .or_else(|| self.lookup(language, text))
                    .map(str::to_string)
                    .ok_or_else(|| {
                        AppError::Cache(CacheError::Corrupt {
                            path: self.path.clone(),
                            message: format!("language '{}' has no entry for {:?}", language, text),
                        })
                    })
            })
            .collect()
    }

    /// Overwrite the persisted cache with this run's results in one atomic write.
    /// `results` must contain the source language aligned to the canonical pool.
    pub async fn save(&self, results: &LanguageResults) -> Result<(), CacheError> {
        let maps = to_placeholder_maps(results);
        let content = serde_json::to_string(&maps).map_err(|e| CacheError::Io {
            path: self.path.clone(),
            message: e.to_string(),
        })?;

        FileManager::write_atomic(&self.path, &content).map_err(|e| CacheError::Io {
            path: self.path.clone(),
            message: e.to_string(),
        })?;

        info!("Saved translation cache for {} language(s)", maps.len());
        Ok(())
    }
}

/// Convert aligned result lists into `{language → {placeholder key → text}}`
pub fn to_placeholder_maps(results: &LanguageResults) -> LanguageMaps {
    results
        .iter()
        .map(|(language, texts)| {
            let entries = texts
                .iter()
                .enumerate()
                .map(|(i, text)| (placeholder_key(i), text.clone()))
                .collect();
            (language.clone(), entries)
        })
        .collect()
}
