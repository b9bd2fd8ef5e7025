//! Indent descriptor graph.
//!
//! One pre-order walk over the AST attaches a descriptor to every token whose
//! column is structurally meaningful. A descriptor is either absolute (the
//! first token of a document) or an offset from an earlier token, so the base
//! relation is a forest by construction.

use yindent_syntax::{
    Ast, CollectionStyle, NodeId, NodeKind, SeqEntry, SourceCode, Token, TokenId, TokenQuery,
    TokenStore,
};

use crate::IndentConfig;

/// Where a token's expected column comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndentDescriptor {
    /// `None` only for a document's first token; `indent` is then absolute.
    pub base: Option<TokenId>,
    pub indent: i32,
    /// Offset used instead of `indent` when `base` is not first on its line.
    pub indent_when_base_not_first: Option<i32>,
}

/// A `|`/`>` scalar as seen by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockScalar {
    pub header: TokenId,
    pub body: Option<TokenId>,
    pub digit: Option<u8>,
}

#[derive(Debug, Clone, Default)]
pub struct DescriptorGraph {
    descriptors: Vec<Option<IndentDescriptor>>,
    indicators: Vec<bool>,
    block_marks: Vec<bool>,
    pub block_scalars: Vec<BlockScalar>,
}

impl DescriptorGraph {
    #[must_use]
    pub fn descriptor(&self, token: TokenId) -> Option<IndentDescriptor> {
        self.descriptors.get(token).copied().flatten()
    }

    /// `-`, `?` or block `:` marks.
    #[must_use]
    pub fn is_indicator(&self, token: TokenId) -> bool {
        self.indicators.get(token).copied().unwrap_or(false)
    }

    /// `|` / `>` headers.
    #[must_use]
    pub fn is_block_mark(&self, token: TokenId) -> bool {
        self.block_marks.get(token).copied().unwrap_or(false)
    }

    #[must_use]
    pub fn block_scalar_for_body(&self, body: TokenId) -> Option<&BlockScalar> {
        self.block_scalars.iter().find(|b| b.body == Some(body))
    }

    #[must_use]
    pub fn block_scalar_for_header(&self, header: TokenId) -> Option<&BlockScalar> {
        self.block_scalars.iter().find(|b| b.header == header)
    }
}

/// Walk every document of `code` and build its descriptor graph.
#[must_use]
pub fn build(code: &SourceCode, config: &IndentConfig) -> DescriptorGraph {
    let n = code.tokens.len();
    let mut builder = Builder {
        ast: &code.ast,
        tokens: &code.tokens,
        store: code.store(),
        unit: i32::try_from(config.indent_unit).unwrap_or(2),
        value_indent: i32::try_from(config.indicator_value_indent()).unwrap_or(2),
        indent_block_sequences: config.indent_block_sequences,
        flow_depth: 0,
        graph: DescriptorGraph {
            descriptors: vec![None; n],
            indicators: vec![false; n],
            block_marks: vec![false; n],
            block_scalars: Vec::new(),
        },
    };
    for &doc in &code.ast.documents {
        builder.visit(doc);
    }
    builder.graph
}

struct Builder<'a> {
    ast: &'a Ast,
    tokens: &'a [Token],
    store: TokenStore<'a>,
    unit: i32,
    value_indent: i32,
    indent_block_sequences: bool,
    /// Number of enclosing `{}` / `[]`.
    flow_depth: usize,
    graph: DescriptorGraph,
}

impl Builder<'_> {
    fn first(&self, node: NodeId) -> Option<TokenId> {
        self.store
            .first_token(self.ast.node(node), TokenQuery::default())
    }

    fn set_absolute(&mut self, token: TokenId, indent: i32) {
        self.graph.descriptors[token] = Some(IndentDescriptor {
            base: None,
            indent,
            indent_when_base_not_first: None,
        });
    }

    fn set_offset(&mut self, token: Option<TokenId>, base: Option<TokenId>, indent: i32) {
        self.set_offset_alt(token, base, indent, None);
    }

    /// Descriptors only ever point backwards; anything else is ignored.
    fn set_offset_alt(
        &mut self,
        token: Option<TokenId>,
        base: Option<TokenId>,
        indent: i32,
        alt: Option<i32>,
    ) {
        let (Some(token), Some(base)) = (token, base) else {
            return;
        };
        if base >= token {
            return;
        }
        self.graph.descriptors[token] = Some(IndentDescriptor {
            base: Some(base),
            indent,
            indent_when_base_not_first: alt,
        });
    }

    fn mark_indicator(&mut self, token: Option<TokenId>) {
        if let Some(t) = token {
            self.graph.indicators[t] = true;
        }
    }

    fn first_on_line(&self, token: TokenId) -> bool {
        token == 0 || self.tokens[token - 1].end_line() < self.tokens[token].start_line()
    }

    /// Columns from `from` to `to` when both share a line; the configured
    /// value indent otherwise.
    fn column_gap(&self, from: TokenId, to: TokenId) -> i32 {
        let (a, b) = (&self.tokens[from].loc.start, &self.tokens[to].loc.start);
        if a.line == b.line {
            i32::try_from(b.column).unwrap_or(i32::MAX) - i32::try_from(a.column).unwrap_or(0)
        } else {
            self.value_indent
        }
    }

    /// First token on `token`'s line that is not a `-`/`?`/`:` mark.
    fn line_head(&self, token: TokenId) -> TokenId {
        let line = self.tokens[token].start_line();
        let mut head = token;
        let mut i = token;
        while i > 0 {
            i -= 1;
            let t = &self.tokens[i];
            if t.start_line() != line {
                break;
            }
            let is_mark = t.is_punctuator("-") || t.is_punctuator("?") || t.is_punctuator(":");
            if !is_mark && !t.is_comment() {
                head = i;
            }
        }
        head
    }

    fn visit(&mut self, id: NodeId) {
        let node = self.ast.node(id);
        match &node.kind {
            NodeKind::Document {
                directives,
                start_marker,
                end_marker,
                content,
            } => {
                let Some(first) = self.first(id) else {
                    return;
                };
                self.set_absolute(first, 0);
                for &d in directives {
                    self.set_offset(Some(d), Some(first), 0);
                }
                self.set_offset(*start_marker, Some(first), 0);
                self.set_offset(*end_marker, Some(first), 0);
                if let Some(content) = *content {
                    let content_first = self.first(content);
                    self.set_offset(content_first, Some(first), 0);
                    self.visit(content);
                }
            }
            NodeKind::Mapping {
                style: CollectionStyle::Block,
                pairs,
                ..
            } => {
                let first = self.first(id);
                for &pair in pairs {
                    let pair_first = self.first(pair);
                    self.set_offset(pair_first, first, 0);
                    self.visit(pair);
                }
            }
            NodeKind::Sequence {
                style: CollectionStyle::Block,
                entries,
                ..
            } => self.visit_block_sequence(entries),
            NodeKind::Mapping {
                style: CollectionStyle::Flow,
                open,
                close,
                pairs,
            } => {
                self.visit_flow_collection(*open, *close, pairs);
            }
            NodeKind::Sequence {
                style: CollectionStyle::Flow,
                open,
                close,
                entries,
            } => {
                let items: Vec<NodeId> = entries.iter().filter_map(|e| e.value).collect();
                self.visit_flow_collection(*open, *close, &items);
            }
            NodeKind::Pair {
                question,
                key,
                colon,
                value,
            } => self.visit_pair(*question, *key, *colon, *value),
            NodeKind::Scalar { block, .. } => {
                if let Some(info) = block {
                    self.graph.block_marks[info.header] = true;
                    self.graph.block_scalars.push(BlockScalar {
                        header: info.header,
                        body: info.body,
                        digit: info.indentation,
                    });
                    self.set_offset_alt(info.body, Some(info.header), self.unit, Some(0));
                }
            }
            NodeKind::Alias { .. } => {}
            NodeKind::Decorated { anchor, tag, node } => {
                let (outer, inner) = match (*anchor, *tag) {
                    (Some(a), Some(t)) if t < a => (t, Some(a)),
                    (Some(a), t) => (a, t),
                    (None, Some(t)) => (t, None),
                    (None, None) => return,
                };
                self.set_offset(inner, Some(outer), 0);
                if let Some(inner_node) = *node {
                    let node_first = self.first(inner_node);
                    self.set_offset_alt(node_first, Some(outer), self.unit, Some(0));
                    self.visit(inner_node);
                }
            }
        }
    }

    fn visit_block_sequence(&mut self, entries: &[SeqEntry]) {
        let first_dash = entries.first().and_then(|e| e.indicator);
        for entry in entries {
            self.set_offset(entry.indicator, first_dash, 0);
            self.mark_indicator(entry.indicator);
            if let Some(value) = entry.value {
                let value_first = self.first(value);
                let indent = match (entry.indicator, value_first) {
                    (Some(dash), Some(v)) if !self.first_on_line(dash) => self.column_gap(dash, v),
                    _ => self.value_indent,
                };
                self.set_offset(value_first, entry.indicator, indent);
                self.visit(value);
            }
        }
    }

    fn visit_pair(
        &mut self,
        question: Option<TokenId>,
        key: Option<NodeId>,
        colon: Option<TokenId>,
        value: Option<NodeId>,
    ) {
        let key_first = key.and_then(|k| self.first(k));
        let block = self.flow_depth == 0;
        if block {
            self.mark_indicator(question);
            self.mark_indicator(colon);
        }

        if question.is_some() {
            self.set_offset(key_first, question, self.unit);
            self.set_offset(colon, question, 0);
        } else {
            self.set_offset(colon, key_first, self.unit);
        }

        if let Some(value) = value {
            let value_first = self.first(value);
            if block && !self.indent_block_sequences && self.ast.is_block_sequence(value) {
                let anchor = question.or(key_first).or(colon);
                self.set_offset(value_first, anchor, 0);
            } else {
                self.set_offset_alt(value_first, colon, self.unit, Some(0));
            }
        }

        if let Some(key) = key {
            self.visit(key);
        }
        if let Some(value) = value {
            self.visit(value);
        }
    }

    fn visit_flow_collection(
        &mut self,
        open: Option<TokenId>,
        close: Option<TokenId>,
        items: &[NodeId],
    ) {
        let Some(open) = open else {
            return;
        };
        let base = self.line_head(open);
        let is_comma = |t: &Token| t.is_punctuator(",");
        let query = TokenQuery::default().filter(&is_comma);

        let mut commas = Vec::new();
        for (i, &item) in items.iter().enumerate() {
            let item_node = self.ast.node(item);
            let next = items.get(i + 1).map(|&n| self.ast.node(n).span);
            let right = next
                .or_else(|| close.map(|c| self.tokens[c].range))
                .unwrap_or(item_node.span);
            commas.extend(self.store.tokens_between(item_node, right, query));
        }

        for &item in items {
            let item_first = self.first(item);
            self.set_offset(item_first, Some(base), self.unit);
        }
        for comma in commas {
            self.set_offset(Some(comma), Some(base), self.unit);
        }
        self.set_offset(close, Some(base), 0);

        self.flow_depth += 1;
        for &item in items {
            self.visit(item);
        }
        self.flow_depth -= 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use yindent_syntax::parse;

    fn token(code: &SourceCode, value: &str) -> TokenId {
        code.tokens
            .iter()
            .position(|t| t.value == value)
            .unwrap_or_else(|| panic!("no token {value}"))
    }

    #[test]
    fn document_first_token_is_absolute() {
        let code = parse("a: 1\n").unwrap();
        let graph = build(&code, &IndentConfig::default());
        let d = graph.descriptor(token(&code, "a")).unwrap();
        assert_eq!(d.base, None);
        assert_eq!(d.indent, 0);
    }

    #[test]
    fn bases_always_precede_their_token() {
        let src = "a:\n  - b: [1,\n      2]\n  - &x !t\n    c: |\n      text\n? k\n: v\n";
        let code = parse(src).unwrap();
        let graph = build(&code, &IndentConfig::default());
        for t in 0..code.tokens.len() {
            if let Some(IndentDescriptor { base: Some(b), .. }) = graph.descriptor(t) {
                assert!(b < t, "token {t} based on later token {b}");
            }
        }
    }

    #[test]
    fn marks_block_indicators() {
        let code = parse("- a: 1\n").unwrap();
        let graph = build(&code, &IndentConfig::default());
        assert!(graph.is_indicator(token(&code, "-")));
        assert!(graph.is_indicator(token(&code, ":")));
    }

    #[test]
    fn flow_colons_are_not_indicators() {
        let code = parse("{a: 1}\n").unwrap();
        let graph = build(&code, &IndentConfig::default());
        assert!(!graph.is_indicator(token(&code, ":")));
    }

    #[test]
    fn sequence_value_offsets_from_dash() {
        let code = parse("- a\n").unwrap();
        let config = IndentConfig {
            indicator_value_indent: Some(4),
            ..IndentConfig::default()
        };
        let graph = build(&code, &config);
        let d = graph.descriptor(token(&code, "a")).unwrap();
        assert_eq!(d.base, Some(token(&code, "-")));
        assert_eq!(d.indent, 4);
    }

    #[test]
    fn compact_sequence_value_follows_actual_gap() {
        let code = parse("- -   a\n").unwrap();
        let config = IndentConfig::default();
        let graph = build(&code, &config);
        let a = graph.descriptor(token(&code, "a")).unwrap();
        assert_eq!(a.base, Some(1));
        assert_eq!(a.indent, 4);
    }

    #[test]
    fn unindented_sequences_anchor_on_key() {
        let code = parse("key:\n- a\n").unwrap();
        let config = IndentConfig {
            indent_block_sequences: false,
            ..IndentConfig::default()
        };
        let graph = build(&code, &config);
        let d = graph.descriptor(token(&code, "-")).unwrap();
        assert_eq!(d.base, Some(token(&code, "key")));
        assert_eq!(d.indent, 0);
    }

    #[test]
    fn records_block_scalars() {
        let code = parse("a: |2\n   text\n").unwrap();
        let graph = build(&code, &IndentConfig::default());
        let header = token(&code, "|2");
        assert!(graph.is_block_mark(header));
        let scalar = graph.block_scalar_for_header(header).unwrap();
        assert_eq!(scalar.digit, Some(2));
        assert!(scalar.body.is_some());
    }

    #[test]
    fn flow_elements_base_on_line_head() {
        let code = parse("key: [\n  a,\n]\n").unwrap();
        let graph = build(&code, &IndentConfig::default());
        let a = graph.descriptor(token(&code, "a")).unwrap();
        assert_eq!(a.base, Some(token(&code, "key")));
        let close = graph.descriptor(token(&code, "]")).unwrap();
        assert_eq!(close.base, Some(token(&code, "key")));
        assert_eq!(close.indent, 0);
    }
}
