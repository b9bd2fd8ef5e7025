//! Expected-column resolution over the descriptor graph.

use yindent_syntax::{Token, TokenId};

use crate::descriptor::DescriptorGraph;

/// Memoizing resolver. Chains always point to earlier tokens, so the
/// recursion terminates.
pub struct Resolver<'a> {
    tokens: &'a [Token],
    graph: &'a DescriptorGraph,
    memo: Vec<Option<Option<i32>>>,
}

impl<'a> Resolver<'a> {
    #[must_use]
    pub fn new(tokens: &'a [Token], graph: &'a DescriptorGraph) -> Self {
        Self {
            tokens,
            graph,
            memo: vec![None; tokens.len()],
        }
    }

    #[must_use]
    pub const fn graph(&self) -> &'a DescriptorGraph {
        self.graph
    }

    #[must_use]
    pub const fn tokens(&self) -> &'a [Token] {
        self.tokens
    }

    /// True when nothing but whitespace precedes `token` on its line.
    #[must_use]
    pub fn is_first_on_line(&self, token: TokenId) -> bool {
        token == 0 || self.tokens[token - 1].end_line() < self.tokens[token].start_line()
    }

    /// Expected column of `token`, or `None` when its chain is broken.
    pub fn resolve(&mut self, token: TokenId) -> Option<i32> {
        if let Some(known) = self.memo.get(token).copied().flatten() {
            return known;
        }
        let resolved = self.compute(token);
        if let Some(slot) = self.memo.get_mut(token) {
            *slot = Some(resolved);
        }
        resolved
    }

    fn compute(&mut self, token: TokenId) -> Option<i32> {
        let descriptor = self.graph.descriptor(token)?;
        let Some(base) = descriptor.base else {
            return Some(descriptor.indent);
        };
        let base_indent = self.resolve(base)?;
        let offset = match descriptor.indent_when_base_not_first {
            Some(alt) if !self.is_first_on_line(base) => alt,
            _ => descriptor.indent,
        };
        Some(base_indent + offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{IndentConfig, descriptor};
    use yindent_syntax::{SourceCode, parse};

    fn expected(src: &str, value: &str) -> Option<i32> {
        let code: SourceCode = parse(src).unwrap();
        let graph = descriptor::build(&code, &IndentConfig::default());
        let mut resolver = Resolver::new(&code.tokens, &graph);
        let t = code.tokens.iter().position(|t| t.value == value).unwrap();
        resolver.resolve(t)
    }

    #[test]
    fn nested_mapping_value_is_one_unit_deeper() {
        assert_eq!(expected("a:\n  b: 1\n", "b"), Some(2));
    }

    #[test]
    fn misplaced_sibling_resolves_to_mapping_column() {
        assert_eq!(expected("a:\n  b: 1\n     c: 2\n", "c"), Some(2));
    }

    #[test]
    fn value_after_inline_base_uses_alternate_offset() {
        assert_eq!(expected("- |\n  text\n", "text"), Some(2));
        assert_eq!(expected("- &x\n  a: 1\n", "a"), Some(2));
    }

    #[test]
    fn flow_close_aligns_with_line_head() {
        assert_eq!(expected("[1,\n  2,\n3]\n", "2"), Some(2));
        assert_eq!(expected("key: {\n  a: 1\n}\n", "}"), Some(0));
    }

    #[test]
    fn every_document_root_resolves_to_zero() {
        assert_eq!(expected("a: 1\n---\n  b: 2\n", "b"), Some(0));
    }

    #[test]
    fn colon_is_one_unit_past_its_key() {
        assert_eq!(expected("a: 1\n", ":"), Some(2));
    }

    #[test]
    fn chain_through_unresolved_base_stays_unknown() {
        let code = parse("a: 1\n").unwrap();
        let graph = descriptor::DescriptorGraph::default();
        let mut resolver = Resolver::new(&code.tokens, &graph);
        assert_eq!(resolver.resolve(0), None);
        assert_eq!(resolver.resolve(1), None);
    }
}
