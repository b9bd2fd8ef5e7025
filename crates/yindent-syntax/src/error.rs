use thiserror::Error;

/// A syntax error. `line` is 1-based and `column` 0-based, like token positions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} at line {line}, column {column}")]
pub struct ParseError {
    pub message: String,
    pub offset: usize,
    pub line: u32,
    pub column: u32,
}

pub type ParseResult<T> = Result<T, ParseError>;
