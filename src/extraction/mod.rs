/*!
 * Extraction of translatable text from generated source.
 *
 * - `script`: target-script character classes and run detection
 * - `scanner`: a literal scanner for bundled JavaScript
 * - `extractor`: turns literal nodes into replacement marks
 */

pub use self::extractor::{ReplacementMark, ReplacementTemplate, TextExtractor};
pub use self::scanner::JsLiteralScanner;
pub use self::script::{ScriptRun, TargetScript};

pub mod extractor;
pub mod scanner;
pub mod script;

use crate::errors::AppError;

/// Syntactic kind of a literal node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LiteralKind {
    /// A single- or double-quoted string; the node range includes the quotes
    Quoted {
        /// The quote character
        quote: char,
    },
    /// A chunk of a template literal between the backtick and/or
    /// interpolations; the node range covers the chunk text only
    TemplateChunk,
}

impl LiteralKind {
    /// Whether the literal syntax supports `${}` interpolation natively
    pub fn supports_interpolation(&self) -> bool {
        matches!(self, Self::TemplateChunk)
    }
}

/// A literal found by a parser
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiteralNode {
    /// Source text of the literal body, escapes intact, without delimiters
    pub raw_value: String,
    /// Byte offset where the replaced range starts
    pub start: usize,
    /// Byte offset where the replaced range ends (exclusive)
    pub end: usize,
    /// Literal kind
    pub kind: LiteralKind,
}

/// Supplies the literal nodes of a source unit
pub trait LiteralParser: Send + Sync {
    /// Scan `source` and return its literal nodes in source order
    fn parse(&self, path: &str, source: &str) -> Result<Vec<LiteralNode>, AppError>;
}
