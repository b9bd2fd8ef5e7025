//! Output formatting and diagnostic display

use serde::Serialize;
use yindent_abi::{Diagnostic, Span};

#[derive(Serialize)]
pub struct SerializableDiagnostic {
    pub path: String,
    pub line: usize,
    pub col: usize,
    pub rule: String,
    pub message: String,
    pub enforced: bool,
    pub span: Span,
}

impl SerializableDiagnostic {
    pub fn new(path: &str, source: &str, diag: &Diagnostic) -> Self {
        let (line, col) = byte_to_line_col(source, diag.span.start);
        Self {
            path: path.to_string(),
            line,
            col,
            rule: diag.rule.clone(),
            message: diag.message.clone(),
            enforced: diag.enforced,
            span: diag.span,
        }
    }
}

pub fn format_diagnostic(path: &str, source: &str, diag: &Diagnostic) -> String {
    let (line, col) = byte_to_line_col(source, diag.span.start);
    let status = if diag.enforced { "🔧" } else { "❌" };
    format!(
        "{path}:{line}:{col}: {status} {rule}: {msg}",
        rule = diag.rule,
        msg = diag.message
    )
}

pub fn print_diagnostic(path: &str, source: &str, diag: &Diagnostic) {
    println!("{}", format_diagnostic(path, source, diag));
}

/// 1-based line and column of `byte_idx`.
pub fn byte_to_line_col(src: &str, byte_idx: usize) -> (usize, usize) {
    let mut line = 1;
    let mut col = 1;
    for (i, ch) in src.char_indices() {
        if i == byte_idx {
            return (line, col);
        }
        if ch == '\n' {
            line += 1;
            col = 1;
        } else {
            col += 1;
        }
    }
    (line, col)
}
