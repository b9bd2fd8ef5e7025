//! Expected indentation for lines the classifier could not place on its own:
//! scalar interiors and comment-only lines.

use std::ops::Range;

use yindent_syntax::{SourceCode, TokenId};

use crate::IndentConfig;
use crate::lines::{LineKind, LineRecord};
use crate::resolver::Resolver;

/// Fill `expected` (and `actual` where it differs from the raw indentation)
/// for scalar interiors first, then for comment runs, which depend on them.
pub fn fill(
    records: &mut [LineRecord],
    code: &SourceCode,
    resolver: &mut Resolver<'_>,
    config: &IndentConfig,
) {
    let mut i = 0;
    while i < records.len() {
        let kind = records[i].kind;
        match kind {
            LineKind::ScalarContinuation { token } => {
                records[i].expected =
                    if config.align_multiline_flow_scalars && !resolver.is_first_on_line(token) {
                        i32::try_from(code.tokens[token].loc.start.column).ok()
                    } else {
                        resolver.resolve(token)
                    };
                i += 1;
            }
            LineKind::BlockBody { header, body } => {
                let end = records[i..]
                    .iter()
                    .position(|r| r.kind != kind)
                    .map_or(records.len(), |n| i + n);
                fill_block_body(records, i..end, header, body, resolver);
                i = end;
            }
            LineKind::Structural | LineKind::Comment => i += 1,
        }
    }

    let unit = i32::try_from(config.indent_unit).unwrap_or(2);
    let mut i = 0;
    while i < records.len() {
        if records[i].kind != LineKind::Comment {
            i += 1;
            continue;
        }
        let run_end = records[i..]
            .iter()
            .position(|r| r.kind != LineKind::Comment)
            .map_or(records.len(), |n| i + n);

        let before = records[..i]
            .iter()
            .rev()
            .find(|r| r.expected.is_some() || matches!(r.kind, LineKind::BlockBody { .. }))
            .filter(|r| !matches!(r.kind, LineKind::BlockBody { .. }))
            .and_then(|r| r.expected);
        let after = records[run_end..].iter().find_map(|r| r.expected);

        let steps = candidates(before, after, unit);
        if !steps.is_empty() {
            for record in &mut records[i..run_end] {
                record.expected = snap(&steps, record.actual);
            }
        }
        i = run_end;
    }
}

/// `lines` holds every record of one block scalar body.
fn fill_block_body(
    records: &mut [LineRecord],
    lines: Range<usize>,
    header: TokenId,
    body: TokenId,
    resolver: &mut Resolver<'_>,
) {
    let tokens = resolver.tokens();
    let header_line = tokens[header].start_line();
    let body_line = tokens[body].start_line();
    let digit = resolver
        .graph()
        .block_scalar_for_header(header)
        .and_then(|b| b.digit);

    let before = &records[..lines.start];
    let opening = before
        .get(before.partition_point(|r| r.line < header_line))
        .filter(|r| r.line == header_line);
    let frozen = digit.is_some()
        && opening.is_some_and(|r| r.expected.is_some_and(|e| e < r.actual));
    if frozen {
        for record in &mut records[lines] {
            record.frozen = true;
            record.expected = None;
        }
        return;
    }

    let first_body = records[lines.clone()]
        .iter()
        .find(|r| r.line == body_line)
        .map(|r| to_i32(r.leading));
    let expected = resolver.resolve(body);
    for record in &mut records[lines] {
        let own = to_i32(record.leading);
        record.actual = first_body.map_or(own, |first| first.min(own));
        record.expected = expected;
    }
}

fn to_i32(n: usize) -> i32 {
    i32::try_from(n).unwrap_or(i32::MAX)
}

/// Indentation steps a comment between `before` and `after` may take.
fn candidates(before: Option<i32>, after: Option<i32>, unit: i32) -> Vec<i32> {
    let step = unit.max(1);
    match (before, after) {
        (Some(b), Some(a)) if b > a => {
            let mut steps: Vec<i32> = std::iter::successors(Some(b), |&s| Some(s - step))
                .take_while(|&s| s > a)
                .collect();
            steps.push(a);
            steps
        }
        (Some(_), Some(a)) => vec![a],
        (Some(n), None) | (None, Some(n)) => std::iter::successors(Some(n), |&s| Some(s - step))
            .take_while(|&s| s >= 0)
            .collect(),
        (None, None) => Vec::new(),
    }
}

/// Nearest step to `actual`; on a tie the larger step wins.
fn snap(steps: &[i32], actual: i32) -> Option<i32> {
    steps
        .iter()
        .copied()
        .min_by_key(|&s| ((s - actual).abs(), std::cmp::Reverse(s)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{descriptor, lines};
    use yindent_syntax::parse;

    fn filled(src: &str, config: &IndentConfig) -> Vec<LineRecord> {
        let code = parse(src).unwrap();
        let graph = descriptor::build(&code, config);
        let mut resolver = Resolver::new(&code.tokens, &graph);
        let mut records = lines::classify(&code, &mut resolver);
        fill(&mut records, &code, &mut resolver, config);
        records
    }

    fn expected_at(records: &[LineRecord], line: u32) -> Option<i32> {
        records.iter().find(|r| r.line == line).and_then(|r| r.expected)
    }

    #[test]
    fn snaps_to_nearest_step_preferring_larger() {
        assert_eq!(snap(&[4, 2], 4), Some(4));
        assert_eq!(snap(&[4, 2], 2), Some(2));
        assert_eq!(snap(&[4, 2], 3), Some(4));
        assert_eq!(snap(&[6, 4, 2], 5), Some(6));
        assert_eq!(snap(&[6, 4, 2], 3), Some(4));
        assert_eq!(snap(&[6, 4, 2], 1), Some(2));
    }

    #[test]
    fn builds_descending_candidates() {
        assert_eq!(candidates(Some(6), Some(2), 2), [6, 4, 2]);
        assert_eq!(candidates(Some(2), Some(4), 2), [4]);
        assert_eq!(candidates(Some(4), None, 2), [4, 2, 0]);
        assert!(candidates(None, None, 2).is_empty());
    }

    #[test]
    fn comments_between_indents_follow_nearest_scope() {
        let src = "a:\n  b:\n    c: 1\n    # four\n  # two\n   # three\n  d: 2\n";
        let records = filled(src, &IndentConfig::default());
        assert_eq!(expected_at(&records, 4), Some(4));
        assert_eq!(expected_at(&records, 5), Some(2));
        assert_eq!(expected_at(&records, 6), Some(4));
    }

    #[test]
    fn comment_after_block_body_uses_following_line_only() {
        let src = "a: |\n  text\n# note\nb: 1\n";
        let records = filled(src, &IndentConfig::default());
        assert_eq!(expected_at(&records, 3), Some(0));
    }

    #[test]
    fn block_body_compares_against_first_body_line() {
        let src = "a:\n  b: |\n    one\n      two\n";
        let records = filled(src, &IndentConfig::default());
        let two = records.iter().find(|r| r.line == 4).unwrap();
        assert_eq!(two.expected, Some(4));
        assert_eq!(two.actual, 4);
    }

    #[test]
    fn every_line_of_a_long_body_shares_the_first_line_floor() {
        let mut src = String::from("a:\n  b: |\n    first\n");
        for n in 0..2000 {
            src.push_str(if n % 2 == 0 { "      deeper\n" } else { "    level\n" });
        }
        src.push_str("  c: |\n      other\n");
        let records = filled(&src, &IndentConfig::default());
        let bodies: Vec<_> = records
            .iter()
            .filter(|r| matches!(r.kind, LineKind::BlockBody { .. }))
            .collect();
        assert_eq!(bodies.len(), 2002);
        assert!(bodies[..2001].iter().all(|r| r.actual == 4 && r.expected == Some(4)));
        assert_eq!(bodies[2001].actual, 6);
        assert_eq!(bodies[2001].expected, Some(4));
    }

    #[test]
    fn explicit_digit_freezes_body_when_opening_line_is_too_deep() {
        let src = "a:\n    b: |2\n      text\n";
        let records = filled(src, &IndentConfig::default());
        let body = records.iter().find(|r| r.line == 3).unwrap();
        assert!(body.frozen);
        assert_eq!(body.expected, None);
    }

    #[test]
    fn continuation_lines_follow_value_or_align() {
        let src = "key: first\n  second\n";
        let records = filled(src, &IndentConfig::default());
        assert_eq!(expected_at(&records, 2), Some(2));

        let aligned = IndentConfig {
            align_multiline_flow_scalars: true,
            ..IndentConfig::default()
        };
        let records = filled(src, &aligned);
        assert_eq!(expected_at(&records, 2), Some(5));
    }
}
