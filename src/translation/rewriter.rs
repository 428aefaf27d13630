/*!
 * Source rewriting and asset generation.
 *
 * Marks are applied from the highest start offset down, so every edit
 * happens at offsets not yet shifted by earlier edits and the original
 * offsets stay valid throughout.
 */

use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::errors::AppError;
use crate::extraction::ReplacementMark;

use super::cache::LanguageResults;
use super::pool::{placeholder_key, CanonicalPool};

/// One generated per-language asset
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetFile {
    /// Output language
    pub language: String,
    /// `{prefix}_{language}_{fingerprint}.json`
    pub file_name: String,
    /// JSON object `{placeholder key → text}`
    pub content: String,
}

/// File name of a language asset
pub fn asset_file_name(prefix: &str, language: &str, fingerprint: &str) -> String {
    format!("{}_{}_{}.json", prefix, language, fingerprint)
}

/// Serializes an aligned list as `{"t_0": …, "t_1": …}` in index order
struct PlaceholderMap<'a>(&'a [String]);

impl Serialize for PlaceholderMap<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (i, text) in self.0.iter().enumerate() {
            map.serialize_entry(&placeholder_key(i), text)?;
        }
        map.end()
    }
}

/// Build one asset per language of `results`
pub fn build_assets(results: &LanguageResults, prefix: &str, fingerprint: &str) -> Result<Vec<AssetFile>, AppError> {
    results
        .iter()
        .map(|(language, texts)| {
            let content = serde_json::to_string(&PlaceholderMap(texts))
                .map_err(|e| AppError::Unknown(format!("failed to serialize asset for '{}': {}", language, e)))?;
            Ok::<_, AppError>(AssetFile {
                language: language.clone(),
                file_name: asset_file_name(prefix, language, fingerprint),
                content,
            })
        })
        .collect()
}

/// Check that marks fit `source`: in bounds, on char boundaries, non-empty,
/// non-overlapping, and with one template slot per segment
pub fn validate_marks(path: &str, source: &str, marks: &[ReplacementMark]) -> Result<(), AppError> {
    let invalid = |message: String| AppError::InvalidMark {
        path: path.to_string(),
        message,
    };

    let mut ordered: Vec<&ReplacementMark> = marks.iter().collect();
    ordered.sort_by_key(|mark| mark.start);

    let mut previous_end = 0;
    for mark in ordered {
        if mark.start >= mark.end {
            return Err(invalid(format!("empty range {}..{}", mark.start, mark.end)));
        }
        if mark.end > source.len() {
            return Err(invalid(format!(
                "range {}..{} exceeds source length {}",
                mark.start,
                mark.end,
                source.len()
            )));
        }
        if !source.is_char_boundary(mark.start) || !source.is_char_boundary(mark.end) {
            return Err(invalid(format!("range {}..{} splits a character", mark.start, mark.end)));
        }
        if mark.start < previous_end {
            return Err(invalid(format!(
                "range {}..{} overlaps a previous mark ending at {}",
                mark.start, mark.end, previous_end
            )));
        }
        if mark.template.slot_count() != mark.segments.len() {
            return Err(invalid(format!(
                "template expects {} id(s) but mark has {} segment(s)",
                mark.template.slot_count(),
                mark.segments.len()
            )));
        }
        previous_end = mark.end;
    }

    Ok(())
}

/// Apply every mark of a unit, resolving ids from the canonical pool
pub fn rewrite_source(
    path: &str,
    source: &str,
    marks: &[ReplacementMark],
    pool: &CanonicalPool,
) -> Result<String, AppError> {
    validate_marks(path, source, marks)?;

    let mut ordered: Vec<&ReplacementMark> = marks.iter().collect();
    ordered.sort_by(|a, b| b.start.cmp(&a.start));

    let mut text = source.to_string();
    for mark in ordered {
        let ids = mark
            .segments
            .iter()
            .map(|segment| pool.placeholder_id(segment))
            .collect::<Result<Vec<_>, _>>()?;
        text.replace_range(mark.start..mark.end, &mark.replacement(&ids));
    }

    Ok(text)
}
