#![warn(rust_2024_compatibility, clippy::all)]

//! Token-preserving YAML front-end.
//!
//! `parse` turns source text into a sorted token vector (comments included)
//! and an arena AST whose nodes refer to tokens by index. Values are not
//! interpreted; the output exists for structural linting.

pub mod ast;
mod error;
mod line_index;
mod parser;
pub mod store;
pub mod token;

pub use ast::{
    Ast, BlockScalarInfo, Chomping, CollectionStyle, Node, NodeId, NodeKind, ScalarStyle,
    SeqEntry, TokenId,
};
pub use error::{ParseError, ParseResult};
pub use line_index::LineIndex;
pub use store::{Ranged, TokenQuery, TokenStore};
pub use token::{Position, SourceLocation, Token, TokenKind};

/// A parsed source file.
#[derive(Debug, Clone)]
pub struct SourceCode {
    pub text: String,
    pub tokens: Vec<Token>,
    pub ast: Ast,
    pub lines: LineIndex,
}

impl SourceCode {
    #[must_use]
    pub fn store(&self) -> TokenStore<'_> {
        TokenStore::new(&self.tokens)
    }
}

/// Parse `text` into tokens and an AST.
///
/// # Errors
///
/// Returns `ParseError` on malformed input: unterminated quotes or flow
/// collections, stray content after a node, missing `:` after a key.
pub fn parse(text: &str) -> ParseResult<SourceCode> {
    let lines = LineIndex::new(text);
    let (tokens, ast) = parser::Parser::new(text, &lines).parse_stream()?;
    Ok(SourceCode {
        text: text.to_string(),
        tokens,
        ast,
        lines,
    })
}
