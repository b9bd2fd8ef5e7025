//! Violations and the edits that repair them.

use yindent_abi::{Span, TextEdit};
use yindent_syntax::{SourceCode, TokenId};

use crate::descriptor::DescriptorGraph;
use crate::lines::{IndicatorOffset, LineKind, LineRecord};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViolationKind {
    LineIndent,
    IndicatorOffset,
}

impl ViolationKind {
    #[must_use]
    pub const fn rule(self) -> &'static str {
        match self {
            Self::LineIndent => "indent",
            Self::IndicatorOffset => "indicator-offset",
        }
    }
}

/// A set of replacements that must be applied together.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Fix {
    pub replacements: Vec<TextEdit>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// 1-based.
    pub line: u32,
    /// 0-based.
    pub column: u32,
    pub expected: u32,
    pub actual: u32,
    pub kind: ViolationKind,
    pub span: Span,
    pub fix: Option<Fix>,
}

impl Violation {
    #[must_use]
    pub fn message(&self) -> String {
        match self.kind {
            ViolationKind::LineIndent => format!(
                "expected indentation of {} spaces but found {}",
                self.expected, self.actual
            ),
            ViolationKind::IndicatorOffset => format!(
                "expected {} space(s) after indicator but found {}",
                self.expected, self.actual
            ),
        }
    }
}

/// Report every mismatch in `records`, each with a fix when one is safe.
#[must_use]
pub fn validate(code: &SourceCode, records: &[LineRecord], graph: &DescriptorGraph) -> Vec<Violation> {
    let fixer = Fixer {
        code,
        records,
        graph,
        documents: document_lines(code),
    };
    let mut violations = Vec::new();

    for (idx, record) in records.iter().enumerate() {
        let Some(expected) = record.expected.filter(|&e| e >= 0) else {
            continue;
        };
        if expected != record.actual {
            let start = code.lines.line_start(record.line);
            violations.push(Violation {
                line: record.line,
                column: 0,
                expected: to_u32(expected),
                actual: to_u32(record.actual),
                kind: ViolationKind::LineIndent,
                span: Span::new(start, start + record.leading),
                fix: fixer.line_fix(idx, expected),
            });
            continue;
        }
        for offset in record.indicators.iter().filter(|o| o.is_mismatch()) {
            let Some(edit) = fixer.gap_edit(offset) else {
                continue;
            };
            let indicator = &code.tokens[offset.indicator];
            violations.push(Violation {
                line: record.line,
                column: indicator.loc.end.column,
                expected: to_u32(offset.expected),
                actual: to_u32(offset.actual),
                kind: ViolationKind::IndicatorOffset,
                span: edit.range,
                fix: fixer
                    .gap_is_isolated(idx, offset)
                    .then(|| Fix {
                        replacements: vec![edit],
                    }),
            });
        }
    }
    violations
}

fn to_u32(n: i32) -> u32 {
    u32::try_from(n).unwrap_or(0)
}

/// First and last line of every document.
fn document_lines(code: &SourceCode) -> Vec<(u32, u32)> {
    code.ast
        .documents
        .iter()
        .map(|&d| {
            let span = code.ast.node(d).span;
            let first = code.lines.line_of(span.start);
            let last = code.lines.line_of(span.end.saturating_sub(1).max(span.start));
            (first, last)
        })
        .collect()
}

struct Fixer<'a> {
    code: &'a SourceCode,
    records: &'a [LineRecord],
    graph: &'a DescriptorGraph,
    documents: Vec<(u32, u32)>,
}

impl Fixer<'_> {
    fn gap_edit(&self, offset: &IndicatorOffset) -> Option<TextEdit> {
        let tokens = &self.code.tokens;
        let from = tokens[offset.indicator].range.end;
        let to = tokens[offset.next].range.start;
        let spaces = usize::try_from(offset.expected).ok()?;
        (from <= to).then(|| TextEdit::new(Span::new(from, to), " ".repeat(spaces)))
    }

    /// True when no later line hangs off the columns right of the indicator,
    /// so changing the gap moves nothing but the rest of this line.
    fn gap_is_isolated(&self, idx: usize, offset: &IndicatorOffset) -> bool {
        let column = usize::try_from(self.code.tokens[offset.indicator].loc.start.column)
            .unwrap_or(usize::MAX);
        let (_, doc_hi) = self.document_range(self.records[idx].line);
        let next = self.records[idx + 1..doc_hi]
            .iter()
            .find(|r| !matches!(r.kind, LineKind::Comment));
        let isolated = next.is_none_or(|r| r.leading <= column);
        if !isolated {
            tracing::debug!(line = self.records[idx].line, "gap fix would detach nested lines");
        }
        isolated
    }

    /// Index range of the records in the document holding `line`.
    fn document_range(&self, line: u32) -> (usize, usize) {
        let (first, last) = self
            .documents
            .iter()
            .copied()
            .find(|&(a, b)| a <= line && line <= b)
            .unwrap_or((0, u32::MAX));
        let lo = self.records.partition_point(|r| r.line < first);
        let hi = self.records.partition_point(|r| r.line <= last);
        (lo, hi)
    }

    /// Re-indent the block of lines around `idx` that shares its scope.
    fn line_fix(&self, idx: usize, expected: i32) -> Option<Fix> {
        let records = self.records;
        let (doc_lo, doc_hi) = self.document_range(records[idx].line);

        let mut start = doc_lo;
        for i in (doc_lo..idx).rev() {
            let r = &records[i];
            if r.expected.is_some_and(|e| e < expected) {
                if r.actual >= expected || r.has_indicator_mismatch() {
                    tracing::debug!(line = records[idx].line, boundary = r.line, "unsafe fix window");
                    return None;
                }
                start = i + 1;
                break;
            }
        }
        let end = (idx + 1..doc_hi)
            .find(|&i| records[i].expected.is_some_and(|e| e < expected))
            .unwrap_or(doc_hi);

        let window = &records[start..end];
        let deltas = shift_deltas(window)?;

        let mut edits = Vec::new();
        for (record, &delta) in window.iter().zip(&deltas) {
            if delta != 0 {
                let begin = self.code.lines.line_start(record.line);
                let width = usize::try_from(to_i64(record.leading) + i64::from(delta)).ok()?;
                edits.push(TextEdit::new(
                    Span::new(begin, begin + record.leading),
                    " ".repeat(width),
                ));
            }
            for offset in record.indicators.iter().filter(|o| o.is_mismatch()) {
                edits.extend(self.gap_edit(offset));
            }
        }
        edits.extend(self.digit_edits(window, &deltas)?);

        if overlapping(&mut edits) {
            tracing::debug!(line = records[idx].line, "overlapping edits in fix");
            return None;
        }
        Some(Fix { replacements: edits })
    }

    /// Rewrite explicit indentation digits so each block body keeps its
    /// position relative to the moved opening line.
    fn digit_edits(&self, window: &[LineRecord], deltas: &[i32]) -> Option<Vec<TextEdit>> {
        let tokens = &self.code.tokens;
        let delta_of = |line: u32| {
            window
                .iter()
                .position(|r| r.line == line)
                .map_or(0, |i| deltas[i])
        };
        let mut edits = Vec::new();
        for block in &self.graph.block_scalars {
            let (Some(digit), Some(body)) = (block.digit, block.body) else {
                continue;
            };
            let open = delta_of(tokens[block.header].start_line());
            let shifted = delta_of(tokens[body].start_line());
            if open == shifted {
                continue;
            }
            let new_digit = i32::from(digit) + shifted - open;
            if !(1..=9).contains(&new_digit) {
                tracing::debug!(header = block.header, new_digit, "indentation digit out of range");
                return None;
            }
            edits.push(self.digit_edit(block.header, new_digit)?);
        }
        Some(edits)
    }

    fn digit_edit(&self, header: TokenId, digit: i32) -> Option<TextEdit> {
        let token = &self.code.tokens[header];
        let at = token.value.bytes().position(|b| b.is_ascii_digit())?;
        let start = token.range.start + at;
        Some(TextEdit::new(Span::new(start, start + 1), digit.to_string()))
    }
}

fn to_i64(n: usize) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}

/// Column shift for each line of a fix window, or `None` if a line would
/// land left of column 0.
fn shift_deltas(window: &[LineRecord]) -> Option<Vec<i32>> {
    // (original leading, delta) of known lines, leading strictly increasing.
    let mut scopes: Vec<(usize, i32)> = Vec::new();
    let mut deltas = Vec::with_capacity(window.len());
    for record in window {
        let delta = match record.expected {
            Some(e) if !record.frozen => {
                let delta = e - record.actual;
                while scopes.last().is_some_and(|&(lead, _)| lead >= record.leading) {
                    scopes.pop();
                }
                scopes.push((record.leading, delta));
                delta
            }
            _ if record.frozen => 0,
            _ => scopes
                .iter()
                .rev()
                .find(|&&(lead, _)| lead <= record.leading)
                .map_or(0, |&(_, d)| d),
        };
        if to_i64(record.leading) + i64::from(delta) < 0 {
            return None;
        }
        deltas.push(delta);
    }
    Some(deltas)
}

/// Sorts `edits` and reports whether any two touch the same bytes.
fn overlapping(edits: &mut [TextEdit]) -> bool {
    edits.sort_by_key(|e| (e.range.start, e.range.end));
    edits.windows(2).any(|w| w[0].range.overlaps(&w[1].range))
}

/// Apply `fixes` in order, skipping any fix that overlaps one already taken.
#[must_use]
pub fn apply_fixes(text: &str, fixes: &[Fix]) -> String {
    let mut accepted: Vec<&TextEdit> = Vec::new();
    for fix in fixes {
        let clashes = fix
            .replacements
            .iter()
            .any(|e| accepted.iter().any(|a| a.range.overlaps(&e.range)));
        if clashes {
            continue;
        }
        accepted.extend(&fix.replacements);
    }
    accepted.sort_by_key(|e| std::cmp::Reverse((e.range.start, e.range.end)));

    let mut out = text.to_string();
    for edit in accepted {
        if edit.range.end <= out.len() && out.is_char_boundary(edit.range.start) {
            out.replace_range(edit.range.start..edit.range.end, &edit.text);
        }
    }
    out
}
