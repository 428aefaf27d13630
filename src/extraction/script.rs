/*!
 * Target-script character classes and run detection.
 *
 * A run is a maximal contiguous substring made only of characters of the
 * script being extracted. Detection is a single left-to-right pass over the
 * code points of the input; offsets are cumulative byte offsets into it.
 */

use std::ops::RangeInclusive;

/// Set of code-point ranges that make up the script being translated
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetScript {
    ranges: Vec<RangeInclusive<char>>,
}

/// One detected run inside a literal's raw value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptRun {
    /// The run text
    pub text: String,
    /// Byte offset of the first character of the run
    pub start: usize,
    /// Byte offset just past the last character of the run
    pub end: usize,
}

impl TargetScript {
    /// CJK unified ideographs, basic block
    pub fn han() -> Self {
        Self::from_ranges(vec!['\u{4e00}'..='\u{9fa5}'])
    }

    /// Han plus the two kana syllabaries
    pub fn japanese() -> Self {
        Self::from_ranges(vec![
            '\u{3040}'..='\u{309f}',
            '\u{30a0}'..='\u{30ff}',
            '\u{4e00}'..='\u{9fa5}',
        ])
    }

    /// Hangul syllables
    pub fn hangul() -> Self {
        Self::from_ranges(vec!['\u{ac00}'..='\u{d7a3}'])
    }

    /// Cyrillic letters
    pub fn cyrillic() -> Self {
        Self::from_ranges(vec!['\u{0400}'..='\u{04ff}'])
    }

    /// Build a script from explicit ranges
    pub fn from_ranges(ranges: Vec<RangeInclusive<char>>) -> Self {
        Self { ranges }
    }

    /// Pick the script for a source language code, falling back to Han
    pub fn for_language(code: &str) -> Self {
        let code = code.trim().to_lowercase();
        match code.split(['-', '_']).next().unwrap_or_default() {
            "ja" | "jpn" => Self::japanese(),
            "ko" | "kor" => Self::hangul(),
            "ru" | "rus" | "uk" | "ukr" | "be" | "bel" | "bg" | "bul" => Self::cyrillic(),
            _ => Self::han(),
        }
    }

    /// Whether a character belongs to this script
    pub fn contains(&self, c: char) -> bool {
        self.ranges.iter().any(|range| range.contains(&c))
    }

    /// Find every maximal run of script characters in `text`
    pub fn find_runs(&self, text: &str) -> Vec<ScriptRun> {
        let mut runs = Vec::new();
        let mut current: Option<usize> = None;

        for (offset, c) in text.char_indices() {
            match (self.contains(c), current) {
                (true, None) => current = Some(offset),
                (false, Some(start)) => {
                    runs.push(ScriptRun {
                        text: text[start..offset].to_string(),
                        start,
                        end: offset,
                    });
                    current = None;
                }
                _ => {}
            }
        }

        if let Some(start) = current {
            runs.push(ScriptRun {
                text: text[start..].to_string(),
                start,
                end: text.len(),
            });
        }

        runs
    }
}

impl Default for TargetScript {
    fn default() -> Self {
        Self::han()
    }
}
