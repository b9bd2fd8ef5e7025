//! Lexical tokens produced by the parser.
//!
//! Every token keeps its byte range and its line/column location. Comments
//! are tokens too, so consumers can decide whether to look at them.

use yindent_abi::Span;

/// A point in the source. `line` is 1-based, `column` is 0-based and counted
/// in characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Position {
    pub line: u32,
    pub column: u32,
}

impl Position {
    #[must_use]
    pub const fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SourceLocation {
    pub start: Position,
    pub end: Position,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// `---` or `...`
    Marker,
    /// `%YAML 1.2`, `%TAG ! tag:example.com,2000:`
    Directive,
    /// `-`, `?`, `:`, `,`, brackets and block scalar headers (`|`, `>2-`)
    Punctuator,
    Anchor,
    Tag,
    Alias,
    /// Plain, quoted, or block scalar body. May span several lines.
    Scalar,
    Comment,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub value: String,
    pub range: Span,
    pub loc: SourceLocation,
}

impl Token {
    #[must_use]
    pub fn is_comment(&self) -> bool {
        self.kind == TokenKind::Comment
    }

    /// True when this token is the punctuator `text`.
    #[must_use]
    pub fn is_punctuator(&self, text: &str) -> bool {
        self.kind == TokenKind::Punctuator && self.value == text
    }

    /// Block scalar headers are punctuators starting with `|` or `>`.
    #[must_use]
    pub fn is_block_scalar_header(&self) -> bool {
        self.kind == TokenKind::Punctuator && matches!(self.value.as_bytes().first(), Some(b'|' | b'>'))
    }

    #[must_use]
    pub const fn start_line(&self) -> u32 {
        self.loc.start.line
    }

    #[must_use]
    pub const fn end_line(&self) -> u32 {
        self.loc.end.line
    }

    #[must_use]
    pub const fn is_multiline(&self) -> bool {
        self.loc.end.line > self.loc.start.line
    }
}
