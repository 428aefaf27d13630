/*!
 * Literal scanner for bundled JavaScript.
 *
 * This is not a parser: it tokenizes just enough of the source to find
 * string literals and template-literal chunks with their byte ranges. It
 * skips comments and regular-expression literals, follows nested `${}`
 * interpolations, and leaves out literals that cannot be turned into a
 * template literal (object-literal keys and module specifiers).
 *
 * All delimiters are ASCII, so scanning bytes of UTF-8 text is safe: every
 * reported offset falls on a char boundary.
 */

use super::{LiteralKind, LiteralNode, LiteralParser};
use crate::errors::AppError;

/// Keywords after which a `/` starts a regular expression
const REGEX_PREFIX_KEYWORDS: &[&str] = &[
    "return", "typeof", "instanceof", "in", "of", "new", "delete", "void", "throw", "case", "do",
    "else", "yield", "await",
];

/// Keywords whose parenthesized head is followed by a statement, not an operator
const CONDITION_KEYWORDS: &[&str] = &["if", "while", "for", "with"];

/// Scans JavaScript source for string and template literals
#[derive(Debug, Clone, Copy, Default)]
pub struct JsLiteralScanner;

impl JsLiteralScanner {
    /// Create a scanner
    pub fn new() -> Self {
        Self
    }
}

impl LiteralParser for JsLiteralScanner {
    fn parse(&self, path: &str, source: &str) -> Result<Vec<LiteralNode>, AppError> {
        Scan::new(source).run().map_err(|message| AppError::Parse {
            path: path.to_string(),
            message,
        })
    }
}

/// Previous significant token, used to disambiguate `/`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Token<'a> {
    Start,
    Punct(u8),
    Word(&'a str),
    Literal,
    /// `)` closing the head of `if`, `while`, `for` or `with`
    ConditionEnd,
}

struct Scan<'a> {
    src: &'a str,
    bytes: &'a [u8],
    pos: usize,
    last: Token<'a>,
    /// Brace depth inside each open template interpolation
    interpolations: Vec<usize>,
    /// One entry per open `(`: whether it opened a statement head
    parens: Vec<bool>,
    nodes: Vec<LiteralNode>,
}

impl<'a> Scan<'a> {
    fn new(src: &'a str) -> Self {
        Self {
            src,
            bytes: src.as_bytes(),
            pos: 0,
            last: Token::Start,
            interpolations: Vec::new(),
            parens: Vec::new(),
            nodes: Vec::new(),
        }
    }

    fn peek(&self, offset: usize) -> Option<u8> {
        self.bytes.get(self.pos + offset).copied()
    }

    fn run(mut self) -> Result<Vec<LiteralNode>, String> {
        while let Some(b) = self.peek(0) {
            match b {
                b' ' | b'\t' | b'\n' | b'\r' => self.pos += 1,
                b'/' if self.peek(1) == Some(b'/') => self.skip_line_comment(),
                b'/' if self.peek(1) == Some(b'*') => self.skip_block_comment()?,
                b'/' => {
                    if self.regex_allowed() && self.skip_regex() {
                        self.last = Token::Literal;
                    } else {
                        self.pos += 1;
                        self.last = Token::Punct(b'/');
                    }
                }
                b'\'' | b'"' => self.scan_string(b)?,
                b'`' => {
                    self.pos += 1;
                    self.scan_template()?;
                }
                b'{' => {
                    if let Some(depth) = self.interpolations.last_mut() {
                        *depth += 1;
                    }
                    self.pos += 1;
                    self.last = Token::Punct(b'{');
                }
                b'}' => {
                    self.pos += 1;
                    match self.interpolations.last().copied() {
                        Some(0) => {
                            self.interpolations.pop();
                            self.scan_template()?;
                        }
                        Some(_) => {
                            if let Some(depth) = self.interpolations.last_mut() {
                                *depth -= 1;
                            }
                            self.last = Token::Punct(b'}');
                        }
                        None => self.last = Token::Punct(b'}'),
                    }
                }
                b'(' => {
                    let head = matches!(self.last, Token::Word(word) if CONDITION_KEYWORDS.contains(&word));
                    self.parens.push(head);
                    self.pos += 1;
                    self.last = Token::Punct(b'(');
                }
                b')' => {
                    self.pos += 1;
                    self.last = match self.parens.pop() {
                        Some(true) => Token::ConditionEnd,
                        _ => Token::Punct(b')'),
                    };
                }
                _ if is_word_byte(b) => {
                    let src = self.src;
                    let start = self.pos;
                    while self.peek(0).is_some_and(is_word_byte) {
                        self.pos += 1;
                    }
                    self.last = Token::Word(&src[start..self.pos]);
                }
                _ => {
                    self.pos += 1;
                    self.last = Token::Punct(b);
                }
            }
        }

        if !self.interpolations.is_empty() {
            return Err("unterminated template literal".to_string());
        }
        Ok(self.nodes)
    }

    fn regex_allowed(&self) -> bool {
        match self.last {
            Token::Start | Token::ConditionEnd => true,
            Token::Punct(b')') | Token::Punct(b']') => false,
            Token::Punct(_) => true,
            Token::Word(word) => REGEX_PREFIX_KEYWORDS.contains(&word),
            Token::Literal => false,
        }
    }

    fn skip_line_comment(&mut self) {
        while let Some(b) = self.peek(0) {
            if b == b'\n' {
                break;
            }
            self.pos += 1;
        }
    }

    fn skip_block_comment(&mut self) -> Result<(), String> {
        let start = self.pos;
        match self.src[self.pos + 2..].find("*/") {
            Some(end) => {
                self.pos += 2 + end + 2;
                Ok(())
            }
            None => Err(format!("unterminated block comment at byte {}", start)),
        }
    }

    /// Skip a regex literal; on failure the position is left unchanged
    fn skip_regex(&mut self) -> bool {
        let start = self.pos;
        let mut in_class = false;
        self.pos += 1;

        while let Some(b) = self.peek(0) {
            match b {
                b'\\' => self.pos += 2,
                b'\n' | b'\r' => break,
                b'[' => {
                    in_class = true;
                    self.pos += 1;
                }
                b']' => {
                    in_class = false;
                    self.pos += 1;
                }
                b'/' if !in_class => {
                    self.pos += 1;
                    while self.peek(0).is_some_and(|b| b.is_ascii_alphabetic()) {
                        self.pos += 1;
                    }
                    return true;
                }
                _ => self.pos += 1,
            }
        }

        self.pos = start;
        false
    }

    fn scan_string(&mut self, quote: u8) -> Result<(), String> {
        let start = self.pos;
        let before = self.last;
        self.pos += 1;

        loop {
            match self.peek(0) {
                Some(b'\\') => {
                    // line continuation may be CRLF
                    if self.peek(1) == Some(b'\r') && self.peek(2) == Some(b'\n') {
                        self.pos += 1;
                    }
                    self.pos += 2;
                }
                Some(b) if b == quote => break,
                Some(b'\n') | None => {
                    return Err(format!("unterminated string literal at byte {}", start));
                }
                Some(_) => self.pos += 1,
            }
        }

        let src = self.src;
        let raw_value = &src[start + 1..self.pos];
        self.pos += 1;
        self.last = Token::Literal;

        if !self.is_property_key(before) && !is_module_specifier(before) {
            self.nodes.push(LiteralNode {
                raw_value: raw_value.to_string(),
                start,
                end: self.pos,
                kind: LiteralKind::Quoted {
                    quote: quote as char,
                },
            });
        }
        Ok(())
    }

    /// Scan one template chunk, starting right after "`" or the closing "}"
    /// of an interpolation
    fn scan_template(&mut self) -> Result<(), String> {
        let start = self.pos;

        loop {
            match self.peek(0) {
                Some(b'\\') => self.pos += 2,
                Some(b'`') => {
                    self.push_chunk(start);
                    self.pos += 1;
                    self.last = Token::Literal;
                    return Ok(());
                }
                Some(b'$') if self.peek(1) == Some(b'{') => {
                    self.push_chunk(start);
                    self.pos += 2;
                    self.interpolations.push(0);
                    self.last = Token::Punct(b'{');
                    return Ok(());
                }
                Some(_) => self.pos += 1,
                None => return Err(format!("unterminated template literal at byte {}", start)),
            }
        }
    }

    fn push_chunk(&mut self, start: usize) {
        if self.pos > start {
            self.nodes.push(LiteralNode {
                raw_value: self.src[start..self.pos].to_string(),
                start,
                end: self.pos,
                kind: LiteralKind::TemplateChunk,
            });
        }
    }

    /// `{"key": …}` or `, "key": …`: the string just scanned is an object key
    fn is_property_key(&self, before: Token<'a>) -> bool {
        if !matches!(before, Token::Punct(b'{') | Token::Punct(b',')) {
            return false;
        }
        self.bytes[self.pos..]
            .iter()
            .find(|b| !b.is_ascii_whitespace())
            .is_some_and(|b| *b == b':')
    }
}

fn is_module_specifier(before: Token<'_>) -> bool {
    matches!(before, Token::Word("from") | Token::Word("import"))
}

fn is_word_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'$' || b >= 0x80
}
