//! Byte offset to line/column mapping.

use memchr::memchr_iter;

use crate::token::Position;

/// Line table for one source text. Lines are 1-based.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineIndex {
    starts: Vec<usize>,
    len: usize,
}

impl LineIndex {
    #[must_use]
    pub fn new(text: &str) -> Self {
        let mut starts = vec![0];
        starts.extend(memchr_iter(b'\n', text.as_bytes()).map(|nl| nl + 1));
        // A trailing newline does not open a new line.
        if starts.len() > 1 && starts.last() == Some(&text.len()) {
            starts.pop();
        }
        Self {
            starts,
            len: text.len(),
        }
    }

    #[must_use]
    pub fn line_count(&self) -> u32 {
        u32::try_from(self.starts.len()).unwrap_or(u32::MAX)
    }

    /// Byte offset where `line` begins.
    #[must_use]
    pub fn line_start(&self, line: u32) -> usize {
        let idx = (line as usize).saturating_sub(1);
        self.starts.get(idx).copied().unwrap_or(self.len)
    }

    /// Byte offset just past the last content byte of `line` (before `\r\n`/`\n`).
    #[must_use]
    pub fn line_end(&self, text: &str, line: u32) -> usize {
        let next = self
            .starts
            .get(line as usize)
            .copied()
            .unwrap_or(self.len);
        let bytes = text.as_bytes();
        let mut end = next;
        if end > 0 && end <= bytes.len() && end > self.line_start(line) && bytes[end - 1] == b'\n' {
            end -= 1;
        }
        if end > self.line_start(line) && bytes.get(end - 1) == Some(&b'\r') {
            end -= 1;
        }
        end
    }

    #[must_use]
    pub fn line_text<'t>(&self, text: &'t str, line: u32) -> &'t str {
        &text[self.line_start(line)..self.line_end(text, line)]
    }

    /// 1-based line containing `offset`.
    #[must_use]
    pub fn line_of(&self, offset: usize) -> u32 {
        let idx = self.starts.partition_point(|&s| s <= offset).max(1);
        u32::try_from(idx).unwrap_or(u32::MAX)
    }

    #[must_use]
    pub fn position(&self, text: &str, offset: usize) -> Position {
        let line = self.line_of(offset);
        let start = self.line_start(line);
        let offset = offset.min(text.len());
        let column = text.get(start..offset).map_or(0, |s| s.chars().count());
        Position::new(line, u32::try_from(column).unwrap_or(u32::MAX))
    }

    /// Number of leading space characters on `line`.
    #[must_use]
    pub fn leading_spaces(&self, text: &str, line: u32) -> usize {
        self.line_text(text, line)
            .bytes()
            .take_while(|&b| b == b' ')
            .count()
    }

    /// True when `line` holds nothing but spaces and tabs.
    #[must_use]
    pub fn is_blank(&self, text: &str, line: u32) -> bool {
        self.line_text(text, line)
            .bytes()
            .all(|b| b == b' ' || b == b'\t')
    }
}
