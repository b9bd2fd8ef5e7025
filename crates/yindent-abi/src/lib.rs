#![warn(rust_2024_compatibility, clippy::all)]

use serde::{Deserialize, Serialize};

/// Capability flags for decrees
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Capability {
    /// Basic linting (always required)
    Lint,
    /// Can rewrite sources to fix reported issues
    AutoFix,
    /// Accepts config at construction time
    RuntimeConfig,
}

/// Metadata describing a decree and the files it handles
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecreeMetadata {
    pub decree_version: String,
    pub description: String,
    /// File extensions this decree handles (e.g., `["yml", "yaml"]`)
    pub supported_extensions: Vec<String>,
    pub capabilities: Vec<Capability>,
}

impl DecreeMetadata {
    /// Check if this decree has a specific capability.
    #[must_use]
    pub fn has_capability(&self, cap: Capability) -> bool {
        self.capabilities.contains(&cap)
    }
}

/// Byte offsets into the source file (half-open range).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    /// Create a new span with the given start and end offsets.
    #[must_use]
    pub const fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Check if this span is empty (start >= end).
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    /// Two spans overlap when they share a byte, or when both are the same
    /// empty insertion point.
    #[must_use]
    pub const fn overlaps(&self, other: &Self) -> bool {
        if self.is_empty() && other.is_empty() {
            return self.start == other.start;
        }
        self.start < other.end && other.start < self.end
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Rule identifier, e.g. "yaml/indent".
    pub rule: String,
    pub message: String,
    pub span: Span,
    /// true = a fix is available and `fix` will apply it
    pub enforced: bool,
}

pub type Diagnostics = Vec<Diagnostic>;

/// Replace the bytes in `range` with `text`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextEdit {
    pub range: Span,
    pub text: String,
}

impl TextEdit {
    #[must_use]
    pub fn new(range: Span, text: impl Into<String>) -> Self {
        Self {
            range,
            text: text.into(),
        }
    }
}

/// Trait all yindent decrees implement.
pub trait Decree: Send + Sync {
    /// Human-friendly decree name, e.g. "yaml".
    #[must_use]
    fn name(&self) -> &str;

    /// Lint a single file, returning diagnostics. `path` is UTF-8.
    fn lint(&self, path: &str, source: &str) -> Diagnostics;

    /// Metadata for versioning and capabilities.
    #[must_use]
    fn metadata(&self) -> DecreeMetadata;

    /// Return the fixed source, or `None` when nothing could be fixed.
    /// Only called on decrees advertising [`Capability::AutoFix`].
    fn fix(&self, _path: &str, _source: &str) -> Option<String> {
        None
    }

    /// Create rule identifier: `{decree}/{rule}` - DRY helper.
    #[must_use]
    fn rule(&self, rule_name: &str) -> String {
        format!("{}/{}", self.name(), rule_name)
    }
}

/// Boxed decree for dynamic dispatch.
pub type BoxDecree = Box<dyn Decree>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overlapping_spans_share_bytes() {
        assert!(Span::new(0, 4).overlaps(&Span::new(3, 6)));
        assert!(!Span::new(0, 3).overlaps(&Span::new(3, 6)));
        assert!(!Span::new(5, 5).overlaps(&Span::new(0, 5)));
    }

    #[test]
    fn empty_spans_collide_at_same_offset() {
        assert!(Span::new(2, 2).overlaps(&Span::new(2, 2)));
        assert!(!Span::new(2, 2).overlaps(&Span::new(3, 3)));
    }

    #[test]
    fn empty_span_inside_range_overlaps() {
        assert!(Span::new(2, 2).overlaps(&Span::new(0, 4)));
    }
}
