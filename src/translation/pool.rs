/*!
 * Global text pool.
 *
 * Texts are collected in first-seen order across every source unit, then
 * canonicalized once into code-point order. Placeholder ids come only from
 * the canonical pool, which cannot be reordered or extended.
 */

use std::collections::{HashMap, HashSet};

use sha2::{Digest, Sha256};

use crate::errors::AppError;
use crate::extraction::ReplacementMark;

/// Prefix of every placeholder id
pub const PLACEHOLDER_PREFIX: &str = "t_";

/// Format the placeholder id for a canonical index
pub fn placeholder_key(index: usize) -> String {
    format!("{}{}", PLACEHOLDER_PREFIX, index)
}

/// Deduplicating collector of extracted texts
#[derive(Debug, Default, Clone)]
pub struct TextPool {
    texts: Vec<String>,
    seen: HashSet<String>,
}

impl TextPool {
    /// Create an empty pool
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a text; duplicates are ignored
    pub fn add(&mut self, text: &str) {
        if self.seen.insert(text.to_string()) {
            self.texts.push(text.to_string());
        }
    }

    /// Add every segment of every mark
    pub fn add_marks<'a>(&mut self, marks: impl IntoIterator<Item = &'a ReplacementMark>) {
        for mark in marks {
            for segment in &mark.segments {
                self.add(segment);
            }
        }
    }

    /// Texts in first-seen order
    pub fn first_seen(&self) -> &[String] {
        &self.texts
    }

    /// Number of unique texts
    pub fn len(&self) -> usize {
        self.texts.len()
    }

    /// Whether no text was added
    pub fn is_empty(&self) -> bool {
        self.texts.is_empty()
    }

    /// Sort into canonical order and freeze the pool
    pub fn canonicalize(self) -> CanonicalPool {
        let mut texts = self.texts;
        // str ordering is byte-wise over UTF-8, which is code-point order
        texts.sort_unstable();

        let index = texts
            .iter()
            .enumerate()
            .map(|(i, text)| (text.clone(), i))
            .collect();

        CanonicalPool { texts, index }
    }
}

/// The pool in canonical order; the only source of placeholder ids
#[derive(Debug, Clone)]
pub struct CanonicalPool {
    texts: Vec<String>,
    index: HashMap<String, usize>,
}

impl CanonicalPool {
    /// All unique texts in canonical order
    pub fn canonical_order(&self) -> &[String] {
        &self.texts
    }

    /// Number of texts
    pub fn len(&self) -> usize {
        self.texts.len()
    }

    /// Whether the pool is empty
    pub fn is_empty(&self) -> bool {
        self.texts.is_empty()
    }

    /// Canonical index of a text
    pub fn index_of(&self, text: &str) -> Result<usize, AppError> {
        self.index
            .get(text)
            .copied()
            .ok_or_else(|| AppError::Lookup(text.to_string()))
    }

    /// Placeholder id of a text
    pub fn placeholder_id(&self, text: &str) -> Result<String, AppError> {
        self.index_of(text).map(placeholder_key)
    }

    /// Short hash over the serialized canonical pool
    pub fn fingerprint(&self) -> String {
        let serialized = serde_json::to_string(&self.texts).unwrap_or_default();
        let mut hasher = Sha256::new();
        hasher.update(serialized.as_bytes());
        let digest = format!("{:x}", hasher.finalize());
        digest[..8].to_string()
    }
}
