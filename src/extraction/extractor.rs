/*!
 * Text extractor.
 *
 * Turns literal nodes into replacement marks: one mark per literal that
 * contains at least one target-script run, carrying the run texts, the
 * literal's range in the original source and a template that renders the
 * replacement once placeholder ids are known.
 */

use log::trace;

use super::script::{ScriptRun, TargetScript};
use super::{LiteralKind, LiteralNode, LiteralParser};
use crate::errors::AppError;

/// Renders the replacement text of a literal given one placeholder id per run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplacementTemplate {
    /// Lookup function called from each interpolation
    function_name: String,
    /// Wrap the output in backticks
    wrap: bool,
    /// Surrounding text: before the first run, between runs, after the last run.
    /// Always one more entry than there are runs.
    gaps: Vec<String>,
}

impl ReplacementTemplate {
    /// Number of placeholder ids the template expects
    pub fn slot_count(&self) -> usize {
        self.gaps.len().saturating_sub(1)
    }

    /// Render the replacement text; ids are consumed in run order
    pub fn render(&self, ids: &[String]) -> String {
        let mut output = String::new();
        if self.wrap {
            output.push('`');
        }

        if let Some(first) = self.gaps.first() {
            output.push_str(first);
        }
        for (id, gap) in ids.iter().zip(self.gaps.iter().skip(1)) {
            output.push_str("${");
            output.push_str(&self.function_name);
            output.push_str("(\"");
            output.push_str(id);
            output.push_str("\")}");
            output.push_str(gap);
        }

        if self.wrap {
            output.push('`');
        }
        output
    }
}

/// A pending edit of one literal in one source unit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplacementMark {
    /// Extracted run texts, left to right
    pub segments: Vec<String>,
    /// Start of the replaced range in the original text
    pub start: usize,
    /// End of the replaced range in the original text (exclusive)
    pub end: usize,
    /// Replacement renderer
    pub template: ReplacementTemplate,
}

impl ReplacementMark {
    /// Replacement text for the mark's range
    pub fn replacement(&self, ids: &[String]) -> String {
        self.template.render(ids)
    }
}

/// Extracts target-script runs from literal nodes
#[derive(Debug, Clone)]
pub struct TextExtractor {
    script: TargetScript,
    function_name: String,
}

impl TextExtractor {
    /// Create an extractor for a script and lookup function name
    pub fn new(script: TargetScript, function_name: impl Into<String>) -> Self {
        Self {
            script,
            function_name: function_name.into(),
        }
    }

    /// Parse a source unit and extract its marks
    pub fn extract_source(
        &self,
        parser: &dyn LiteralParser,
        path: &str,
        source: &str,
    ) -> Result<Vec<ReplacementMark>, AppError> {
        let nodes = parser.parse(path, source)?;
        let marks = self.extract(&nodes);
        trace!("{}: {} literal(s), {} mark(s)", path, nodes.len(), marks.len());
        Ok(marks)
    }

    /// Produce a mark for every node containing at least one run
    pub fn extract(&self, nodes: &[LiteralNode]) -> Vec<ReplacementMark> {
        nodes
            .iter()
            .filter(|node| node.start < node.end)
            .filter_map(|node| self.extract_node(node))
            .collect()
    }

    /// Produce the mark for a single node, if it has runs
    pub fn extract_node(&self, node: &LiteralNode) -> Option<ReplacementMark> {
        let runs = self.script.find_runs(&node.raw_value);
        if runs.is_empty() {
            return None;
        }

        Some(ReplacementMark {
            segments: runs.iter().map(|run| run.text.clone()).collect(),
            start: node.start,
            end: node.end,
            template: self.build_template(&node.raw_value, &runs, node.kind),
        })
    }

    fn build_template(&self, raw: &str, runs: &[ScriptRun], kind: LiteralKind) -> ReplacementTemplate {
        let escape = !kind.supports_interpolation();
        let mut gaps = Vec::with_capacity(runs.len() + 1);

        let mut cursor = 0;
        for (i, run) in runs.iter().enumerate() {
            let mut gap = text_between(raw, cursor, run.start, escape);
            if i > 0 && starts_with_ascii_letter(&gap) {
                gap.insert(0, ' ');
            }
            if ends_with_ascii_letter(&gap) {
                gap.push(' ');
            }
            gaps.push(gap);
            cursor = run.end;
        }

        let mut tail = text_between(raw, cursor, raw.len(), escape);
        if starts_with_ascii_letter(&tail) {
            tail.insert(0, ' ');
        }
        gaps.push(tail);

        ReplacementTemplate {
            function_name: self.function_name.clone(),
            wrap: !kind.supports_interpolation(),
            gaps,
        }
    }
}

/// Slice `raw[from..to]` for use inside a template literal.
///
/// A trailing lone backslash escapes the run character that follows it and
/// would otherwise escape the interpolation's `$`, so it is dropped.
fn text_between(raw: &str, from: usize, to: usize, escape: bool) -> String {
    let mut slice = &raw[from..to];
    if to < raw.len() && trailing_backslashes(slice) % 2 == 1 {
        slice = &slice[..slice.len() - 1];
    }

    if escape {
        escape_for_template(slice)
    } else {
        slice.to_string()
    }
}

fn trailing_backslashes(text: &str) -> usize {
    text.bytes().rev().take_while(|b| *b == b'\\').count()
}

/// Escape quoted-string source text so it is valid template-literal text.
/// Existing escape sequences are copied verbatim.
fn escape_for_template(text: &str) -> String {
    let mut output = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    let mut escaped = false;

    while let Some(c) = chars.next() {
        if escaped {
            output.push(c);
            escaped = false;
            continue;
        }
        match c {
            '\\' => {
                output.push(c);
                escaped = true;
            }
            '`' => output.push_str("\\`"),
            '$' if chars.peek() == Some(&'{') => output.push_str("\\$"),
            _ => output.push(c),
        }
    }

    output
}

fn starts_with_ascii_letter(text: &str) -> bool {
    text.chars().next().is_some_and(|c| c.is_ascii_alphabetic())
}

/// A letter that closes an escape sequence (`\n`, `\t`, ...) is not a letter
/// of the literal's value
fn ends_with_ascii_letter(text: &str) -> bool {
    let mut chars = text.chars();
    match chars.next_back() {
        Some(c) if c.is_ascii_alphabetic() => trailing_backslashes(chars.as_str()) % 2 == 0,
        _ => false,
    }
}
