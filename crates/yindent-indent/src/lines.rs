//! Per-line expected/actual indentation.

use std::collections::BTreeMap;

use yindent_syntax::{SourceCode, TokenId, TokenKind};

use crate::resolver::Resolver;

/// Gap between an indicator mark and the token after it on the same line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndicatorOffset {
    pub indicator: TokenId,
    pub next: TokenId,
    /// Spaces wanted between the mark and `next`.
    pub expected: i32,
    /// Spaces found.
    pub actual: i32,
}

impl IndicatorOffset {
    #[must_use]
    pub const fn is_mismatch(&self) -> bool {
        self.expected != self.actual
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    /// Starts with a token that belongs to the structure.
    Structural,
    /// Holds nothing but a comment.
    Comment,
    /// Inside the body of a `|` / `>` scalar.
    BlockBody { header: TokenId, body: TokenId },
    /// Second or later line of a plain or quoted scalar.
    ScalarContinuation { token: TokenId },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineRecord {
    /// 1-based.
    pub line: u32,
    pub kind: LineKind,
    pub expected: Option<i32>,
    /// Indentation compared against `expected`.
    pub actual: i32,
    /// Leading spaces as written.
    pub leading: usize,
    pub indicators: Vec<IndicatorOffset>,
    /// Body of a block scalar whose explicit digit is authoritative.
    pub frozen: bool,
}

impl LineRecord {
    fn new(line: u32, kind: LineKind, leading: usize) -> Self {
        Self {
            line,
            kind,
            expected: None,
            actual: i32::try_from(leading).unwrap_or(i32::MAX),
            leading,
            indicators: Vec::new(),
            frozen: false,
        }
    }

    #[must_use]
    pub fn has_indicator_mismatch(&self) -> bool {
        self.indicators.iter().any(IndicatorOffset::is_mismatch)
    }
}

/// Build one record per non-blank line, in line order.
///
/// Structural lines get their expected indentation here; comment lines and
/// scalar interiors are left for [`crate::missing::fill`].
pub fn classify(code: &SourceCode, resolver: &mut Resolver<'_>) -> Vec<LineRecord> {
    let tokens = &code.tokens;
    let mut records: BTreeMap<u32, LineRecord> = BTreeMap::new();

    for (id, token) in tokens.iter().enumerate() {
        if token.kind != TokenKind::Scalar || !token.is_multiline() {
            continue;
        }
        let graph = resolver.graph();
        let (kind, from) = match graph.block_scalar_for_body(id) {
            Some(block) => (
                LineKind::BlockBody {
                    header: block.header,
                    body: id,
                },
                token.start_line(),
            ),
            None => (LineKind::ScalarContinuation { token: id }, token.start_line() + 1),
        };
        for line in from..=token.end_line() {
            if !code.lines.is_blank(&code.text, line) {
                let leading = code.lines.leading_spaces(&code.text, line);
                records.insert(line, LineRecord::new(line, kind, leading));
            }
        }
    }
    // Single-line block bodies are not multi-line tokens.
    for block in &resolver.graph().block_scalars {
        let Some(body) = block.body else { continue };
        let line = tokens[body].start_line();
        records.entry(line).or_insert_with(|| {
            let leading = code.lines.leading_spaces(&code.text, line);
            LineRecord::new(
                line,
                LineKind::BlockBody {
                    header: block.header,
                    body,
                },
                leading,
            )
        });
    }

    let mut start = 0;
    while start < tokens.len() {
        let line = tokens[start].start_line();
        let end = tokens[start..]
            .iter()
            .position(|t| t.start_line() != line)
            .map_or(tokens.len(), |n| start + n);
        if !records.contains_key(&line) {
            let record = classify_group(code, resolver, start, end);
            records.insert(line, record);
        }
        start = end;
    }

    records.into_values().collect()
}

fn classify_group(
    code: &SourceCode,
    resolver: &mut Resolver<'_>,
    start: TokenId,
    end: TokenId,
) -> LineRecord {
    let tokens = &code.tokens;
    let line = tokens[start].start_line();
    let leading = code.lines.leading_spaces(&code.text, line);
    let content: Vec<TokenId> = (start..end).filter(|&t| !tokens[t].is_comment()).collect();

    let Some(&first) = content.first() else {
        return LineRecord::new(line, LineKind::Comment, leading);
    };
    let mut record = LineRecord::new(line, LineKind::Structural, leading);
    record.actual = i32::try_from(tokens[first].loc.start.column).unwrap_or(i32::MAX);

    for pair in content.windows(2) {
        let (cur, next) = (pair[0], pair[1]);
        if !resolver.graph().is_indicator(cur) {
            break;
        }
        let (Some(ci), Some(ni)) = (resolver.resolve(cur), resolver.resolve(next)) else {
            break;
        };
        if ni <= ci {
            break;
        }
        let gap = i64::from(tokens[next].loc.start.column) - i64::from(tokens[cur].loc.end.column);
        record.indicators.push(IndicatorOffset {
            indicator: cur,
            next,
            expected: ni - ci - 1,
            actual: i32::try_from(gap).unwrap_or(i32::MAX),
        });
    }

    record.expected = content.iter().find_map(|&t| resolver.resolve(t));
    record
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{IndentConfig, descriptor};
    use yindent_syntax::parse;

    fn records(src: &str) -> Vec<LineRecord> {
        let code = parse(src).unwrap();
        let graph = descriptor::build(&code, &IndentConfig::default());
        let mut resolver = Resolver::new(&code.tokens, &graph);
        classify(&code, &mut resolver)
    }

    #[test]
    fn structural_lines_carry_expected_and_actual() {
        let recs = records("a:\n  b: 1\n     c: 2\n");
        let got: Vec<_> = recs.iter().map(|r| (r.line, r.expected, r.actual)).collect();
        assert_eq!(got, [(1, Some(0), 0), (2, Some(2), 2), (3, Some(2), 5)]);
    }

    #[test]
    fn blank_lines_have_no_record() {
        let recs = records("a: 1\n\nb: 2\n");
        assert_eq!(recs.iter().map(|r| r.line).collect::<Vec<_>>(), [1, 3]);
    }

    #[test]
    fn comment_lines_are_left_unresolved() {
        let recs = records("a:\n  # note\n  b: 1\n");
        assert_eq!(recs[1].kind, LineKind::Comment);
        assert_eq!(recs[1].expected, None);
    }

    #[test]
    fn measures_gap_after_sequence_dash() {
        let recs = records("-   a\n");
        assert_eq!(recs[0].indicators.len(), 1);
        assert_eq!(recs[0].indicators[0].expected, 1);
        assert_eq!(recs[0].indicators[0].actual, 3);
        assert!(recs[0].has_indicator_mismatch());
    }

    #[test]
    fn well_spaced_compact_entries_match() {
        let recs = records("- a: 1\n  b: 2\n");
        assert!(!recs[0].has_indicator_mismatch());
    }

    #[test]
    fn scalar_interiors_get_their_own_kind() {
        let recs = records("a: |\n  one\n  two\nb: plain\n  more\n");
        assert!(matches!(recs[1].kind, LineKind::BlockBody { .. }));
        assert!(matches!(recs[2].kind, LineKind::BlockBody { .. }));
        assert_eq!(recs[3].kind, LineKind::Structural);
        assert!(matches!(recs[4].kind, LineKind::ScalarContinuation { .. }));
    }
}
