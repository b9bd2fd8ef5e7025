//! Hand-written scanner/parser producing tokens and an arena AST in one pass.
//!
//! Tokens are pushed strictly in source order, so token ids are also sorted by
//! offset. The parser is deliberately lenient about indentation: a line that
//! is clearly a sibling entry but sits at the wrong column still joins the
//! enclosing collection, leaving the verdict to the indentation engine.

use yindent_abi::Span;

use crate::ast::{
    Ast, BlockScalarInfo, Chomping, CollectionStyle, Node, NodeId, NodeKind, ScalarStyle,
    SeqEntry, TokenId,
};
use crate::error::{ParseError, ParseResult};
use crate::line_index::LineIndex;
use crate::token::{SourceLocation, Token, TokenKind};

const FLOW_INDICATORS: &[u8] = b",[]{}";

/// Anchor and tag seen in front of a node.
#[derive(Debug, Default, Clone, Copy)]
struct Props {
    anchor: Option<TokenId>,
    tag: Option<TokenId>,
    first: Option<TokenId>,
    line: u32,
}

impl Props {
    const fn is_empty(&self) -> bool {
        self.anchor.is_none() && self.tag.is_none()
    }
}

pub struct Parser<'s> {
    text: &'s str,
    bytes: &'s [u8],
    lines: &'s LineIndex,
    pos: usize,
    tokens: Vec<Token>,
    nodes: Vec<Node>,
}

impl<'s> Parser<'s> {
    pub fn new(text: &'s str, lines: &'s LineIndex) -> Self {
        Self {
            text,
            bytes: text.as_bytes(),
            lines,
            pos: 0,
            tokens: Vec::new(),
            nodes: Vec::new(),
        }
    }

    pub fn parse_stream(mut self) -> ParseResult<(Vec<Token>, Ast)> {
        let mut documents = Vec::new();
        loop {
            let first_tok = self.tokens.len();
            let has_content = if self.at_line_content_start() {
                true
            } else {
                self.skip_blank_lines_from_here()?
            };
            if !has_content {
                // Trailing comments after the last document stay with it.
                if first_tok < self.tokens.len() {
                    if let Some(&last) = documents.last() {
                        self.extend_document(last);
                    } else {
                        let span = self.span_with_comments(first_tok);
                        documents.push(self.push_node(
                            NodeKind::Document {
                                directives: Vec::new(),
                                start_marker: None,
                                end_marker: None,
                                content: None,
                            },
                            span,
                        ));
                    }
                }
                break;
            }
            documents.push(self.parse_document(first_tok)?);
        }
        tracing::trace!(
            tokens = self.tokens.len(),
            documents = documents.len(),
            "parsed stream"
        );
        Ok((
            self.tokens,
            Ast {
                nodes: self.nodes,
                documents,
            },
        ))
    }

    // ------------------------------------------------------------------
    // Documents
    // ------------------------------------------------------------------

    fn parse_document(&mut self, first_tok: TokenId) -> ParseResult<NodeId> {
        let mut directives = Vec::new();
        while self.col() == 0 && self.peek() == Some(b'%') {
            let start = self.pos;
            let end = self.scan_until_comment_or_eol();
            directives.push(self.emit(TokenKind::Directive, start, end));
            if !self.advance_to_content()? {
                return Err(self.error("directive without a document"));
            }
        }

        let mut start_marker = None;
        let mut content = None;
        if self.at_marker(b"---") {
            start_marker = Some(self.emit(TokenKind::Marker, self.pos, self.pos + 3));
            self.skip_inline_ws();
            if !self.at_eol() && self.peek() != Some(b'#') {
                content = self.parse_block_node(-1, false)?;
            }
        } else if !directives.is_empty() {
            return Err(self.error("expected '---' after directives"));
        }

        if content.is_none() && self.advance_to_content()? && !self.at_document_boundary() {
            content = self.parse_block_node(-1, false)?;
        }

        let mut end_marker = None;
        if self.advance_to_content()? {
            if self.at_marker(b"...") {
                end_marker = Some(self.emit(TokenKind::Marker, self.pos, self.pos + 3));
                self.skip_inline_ws();
                if self.peek() == Some(b'#') {
                    self.scan_comment();
                }
                if !self.at_eol() {
                    return Err(self.error("unexpected content after document end marker"));
                }
            } else if !self.at_marker(b"---") {
                return Err(self.error("unexpected content"));
            }
        }

        let span = self.span_with_comments(first_tok);
        Ok(self.push_node(
            NodeKind::Document {
                directives,
                start_marker,
                end_marker,
                content,
            },
            span,
        ))
    }

    fn extend_document(&mut self, doc: NodeId) {
        if let Some(last) = self.tokens.last() {
            let end = last.range.end;
            let span = &mut self.nodes[doc].span;
            span.end = span.end.max(end);
        }
    }

    // ------------------------------------------------------------------
    // Block context
    // ------------------------------------------------------------------

    /// Parse the node following an indicator or key. Content on later lines
    /// must sit deeper than `parent`, except a `-` sequence at `parent`
    /// itself when `seq_at_parent` is set.
    fn parse_block_node(&mut self, parent: i32, seq_at_parent: bool) -> ParseResult<Option<NodeId>> {
        let first_tok = self.tokens.len();
        let mut props = Props::default();
        self.skip_inline_ws();
        loop {
            if self.at_eol() || self.peek() == Some(b'#') {
                if !self.advance_to_content()? || self.at_document_boundary() {
                    return Ok(self.finish_props(props, None, first_tok));
                }
                let col = self.col_i32();
                let fits = col > parent || (seq_at_parent && col == parent && self.at_indicator(b'-'));
                if !fits {
                    return Ok(self.finish_props(props, None, first_tok));
                }
            }
            if !matches!(self.peek(), Some(b'&' | b'!')) {
                break;
            }
            self.collect_inline_props(&mut props, false)?;
        }

        let node = if self.at_indicator(b'-') {
            Some(self.parse_block_sequence(parent)?)
        } else if self.at_indicator(b'?') || self.at_indicator(b':') {
            Some(self.parse_block_mapping(parent, Props::default())?)
        } else if matches!(self.peek(), Some(b'|' | b'>')) {
            Some(self.parse_block_scalar(parent)?)
        } else if self.line_looks_like_key(self.pos) && self.may_start_compact_mapping() {
            let line = self.lines.line_of(self.pos);
            if !props.is_empty() && props.line == line {
                // `&a key: value` decorates the key, not the mapping.
                let key_props = std::mem::take(&mut props);
                Some(self.parse_block_mapping(parent, key_props)?)
            } else {
                Some(self.parse_block_mapping(parent, Props::default())?)
            }
        } else {
            Some(self.parse_inline_node(parent)?)
        };
        Ok(self.finish_props(props, node, first_tok))
    }

    fn finish_props(&mut self, props: Props, node: Option<NodeId>, first_tok: TokenId) -> Option<NodeId> {
        if props.is_empty() {
            return node;
        }
        let span = self.span_since(first_tok);
        Some(self.push_node(
            NodeKind::Decorated {
                anchor: props.anchor,
                tag: props.tag,
                node,
            },
            span,
        ))
    }

    /// A mapping may open mid-line only right after `-`, `?`, an explicit `:`,
    /// or a document start marker. Properties on the same line are ignored.
    fn may_start_compact_mapping(&self) -> bool {
        if self.at_line_content_start() {
            return true;
        }
        let line = self.lines.line_of(self.pos);
        let Some(prev) = self.tokens.iter().rev().find(|t| {
            !t.is_comment()
                && !(matches!(t.kind, TokenKind::Anchor | TokenKind::Tag) && t.start_line() == line)
        }) else {
            return true;
        };
        if prev.end_line() < line {
            return true;
        }
        if prev.is_punctuator("-") || prev.is_punctuator("?") {
            return true;
        }
        if prev.is_punctuator(":") {
            let line_start = self.lines.line_start(prev.start_line());
            return self.bytes[line_start..prev.range.start]
                .iter()
                .all(|&b| b == b' ' || b == b'\t');
        }
        prev.kind == TokenKind::Marker
    }

    fn parse_block_sequence(&mut self, parent: i32) -> ParseResult<NodeId> {
        let first_tok = self.tokens.len();
        let seq_col = self.col_i32();
        let floor = parent.min(seq_col - 1);
        let mut entries = Vec::new();
        loop {
            let dash_col = self.col_i32();
            let dash = self.emit(TokenKind::Punctuator, self.pos, self.pos + 1);
            let value = self.parse_block_node(dash_col, false)?;
            entries.push(SeqEntry {
                indicator: Some(dash),
                value,
            });
            if !self.advance_to_content()? || self.at_document_boundary() {
                break;
            }
            if !(self.at_indicator(b'-') && self.col_i32() > floor) {
                break;
            }
        }
        let span = self.span_since(first_tok);
        Ok(self.push_node(
            NodeKind::Sequence {
                style: CollectionStyle::Block,
                open: None,
                close: None,
                entries,
            },
            span,
        ))
    }

    fn parse_block_mapping(&mut self, parent: i32, mut key_props: Props) -> ParseResult<NodeId> {
        let first_tok = key_props.first.unwrap_or(self.tokens.len());
        let map_col = key_props.first.map_or_else(
            || self.col_i32(),
            |t| i32::try_from(self.tokens[t].loc.start.column).unwrap_or(i32::MAX),
        );
        let mut pairs = Vec::new();
        loop {
            let pair_tok = key_props.first.unwrap_or(self.tokens.len());
            let pair_col = if key_props.first.is_some() {
                map_col
            } else {
                self.col_i32()
            };
            let (question, key) = if self.at_indicator(b'?') {
                let q = self.emit(TokenKind::Punctuator, self.pos, self.pos + 1);
                let key = self.parse_block_node(pair_col, false)?;
                (Some(q), key)
            } else if self.at_indicator(b':') {
                (None, None)
            } else {
                let key_first = key_props.first.unwrap_or(self.tokens.len());
                let key = self.parse_implicit_key(std::mem::take(&mut key_props), key_first)?;
                self.skip_inline_ws();
                (None, key)
            };

            let mut colon = None;
            let mut value = None;
            let colon_here = if question.is_some() {
                self.advance_to_content()?
                    && !self.at_document_boundary()
                    && self.at_indicator(b':')
                    && self.col_i32() > parent
            } else {
                self.at_indicator(b':') || self.at_adjacent_colon()
            };
            if colon_here {
                colon = Some(self.emit(TokenKind::Punctuator, self.pos, self.pos + 1));
                value = self.parse_block_node(pair_col, true)?;
            } else if question.is_none() {
                return Err(self.error("expected ':' after mapping key"));
            }

            let span = self.span_since(pair_tok);
            pairs.push(self.push_node(
                NodeKind::Pair {
                    question,
                    key,
                    colon,
                    value,
                },
                span,
            ));

            if !self.advance_to_content()? || self.at_document_boundary() {
                break;
            }
            if self.at_indicator(b'-') {
                break;
            }
            let col = self.col_i32();
            let sibling = col == map_col
                || (col > parent && self.line_looks_like_entry(self.pos));
            if !sibling {
                break;
            }
        }
        let span = self.span_since(first_tok);
        Ok(self.push_node(
            NodeKind::Mapping {
                style: CollectionStyle::Block,
                open: None,
                close: None,
                pairs,
            },
            span,
        ))
    }

    /// Single-line key of a block mapping entry.
    fn parse_implicit_key(&mut self, mut props: Props, first_tok: TokenId) -> ParseResult<Option<NodeId>> {
        self.collect_inline_props(&mut props, false)?;
        let node = match self.peek() {
            Some(b':') => None,
            Some(b'*') => Some(self.parse_alias(false)),
            Some(b'"' | b'\'') => Some(self.parse_quoted()?),
            Some(b'[' | b'{') => Some(self.parse_flow_collection()?),
            _ => {
                let start = self.pos;
                let end = self.scan_plain_line(false);
                if end == start {
                    return Err(self.error("expected a mapping key"));
                }
                self.pos = end;
                Some(self.push_scalar(ScalarStyle::Plain, start, end))
            }
        };
        Ok(self.finish_props(props, node, first_tok))
    }

    /// Scalar, alias, or flow collection starting on the current line of a
    /// block context.
    fn parse_inline_node(&mut self, parent: i32) -> ParseResult<NodeId> {
        match self.peek() {
            Some(b'*') => Ok(self.parse_alias(false)),
            Some(b'"' | b'\'') => self.parse_quoted(),
            Some(b'[' | b'{') => self.parse_flow_collection(),
            Some(b'@' | b'`') => Err(self.error("reserved indicator cannot start a plain scalar")),
            _ => {
                let (start, end) = self.scan_plain_multiline(parent, false);
                if end == start {
                    return Err(self.error("unexpected character"));
                }
                Ok(self.push_scalar(ScalarStyle::Plain, start, end))
            }
        }
    }

    fn parse_block_scalar(&mut self, parent: i32) -> ParseResult<NodeId> {
        let first_tok = self.tokens.len();
        let header_start = self.pos;
        let literal = self.peek() == Some(b'|');
        self.pos += 1;
        let mut indentation = None;
        let mut chomping = Chomping::Clip;
        for _ in 0..2 {
            match self.peek() {
                Some(d @ b'1'..=b'9') if indentation.is_none() => {
                    indentation = Some(d - b'0');
                    self.pos += 1;
                }
                Some(b'0') => return Err(self.error("indentation indicator must be 1-9")),
                Some(b'-') if chomping == Chomping::Clip => {
                    chomping = Chomping::Strip;
                    self.pos += 1;
                }
                Some(b'+') if chomping == Chomping::Clip => {
                    chomping = Chomping::Keep;
                    self.pos += 1;
                }
                _ => break,
            }
        }
        let header = self.emit(TokenKind::Punctuator, header_start, self.pos);
        let had_ws = self.skip_inline_ws();
        if self.peek() == Some(b'#') && had_ws {
            self.scan_comment();
        }
        if !self.at_eol() {
            return Err(self.error("unexpected text after block scalar header"));
        }

        let body = self.scan_block_body(parent, indentation)?;
        let span = self.span_since(first_tok);
        let style = if literal {
            ScalarStyle::Literal
        } else {
            ScalarStyle::Folded
        };
        Ok(self.push_node(
            NodeKind::Scalar {
                style,
                token: body,
                block: Some(BlockScalarInfo {
                    header,
                    body,
                    indentation,
                    chomping,
                }),
            },
            span,
        ))
    }

    /// Consume the body lines of a block scalar. Leaves `pos` at the end of
    /// the last content line.
    fn scan_block_body(&mut self, parent: i32, digit: Option<u8>) -> ParseResult<Option<TokenId>> {
        let header_line = self.lines.line_of(self.pos);
        let last_line = self.lines.line_count();
        let body_indent = if let Some(d) = digit {
            Some(usize::try_from(parent.max(0)).unwrap_or(0) + usize::from(d))
        } else {
            ((header_line + 1)..=last_line)
                .find(|&l| !self.lines.is_blank(self.text, l))
                .map(|l| self.lines.leading_spaces(self.text, l))
                .filter(|&n| i32::try_from(n).unwrap_or(i32::MAX) > parent)
        };
        let Some(body_indent) = body_indent else {
            return Ok(None);
        };

        let mut first = None;
        let mut last = None;
        for line in (header_line + 1)..=last_line {
            if self.lines.is_blank(self.text, line) {
                continue;
            }
            let start = self.lines.line_start(line);
            if self.lines.leading_spaces(self.text, line) < body_indent
                || self.is_marker_at(start)
            {
                break;
            }
            first.get_or_insert(line);
            last = Some(line);
        }
        let (Some(first), Some(last)) = (first, last) else {
            return Ok(None);
        };
        let start = self.lines.line_start(first) + body_indent;
        let end = self.lines.line_end(self.text, last);
        self.pos = end;
        Ok(Some(self.emit(TokenKind::Scalar, start, end)))
    }

    // ------------------------------------------------------------------
    // Flow context
    // ------------------------------------------------------------------

    fn parse_flow_collection(&mut self) -> ParseResult<NodeId> {
        let first_tok = self.tokens.len();
        let is_map = self.peek() == Some(b'{');
        let close_byte = if is_map { b'}' } else { b']' };
        let open = self.emit(TokenKind::Punctuator, self.pos, self.pos + 1);
        let mut items = Vec::new();
        let close = loop {
            self.skip_flow_space()?;
            if self.peek() == Some(close_byte) {
                break self.emit(TokenKind::Punctuator, self.pos, self.pos + 1);
            }
            if self.pos >= self.bytes.len() {
                return Err(self.error("unterminated flow collection"));
            }
            if self.peek() == Some(b',') {
                return Err(self.error("unexpected ',' in flow collection"));
            }
            items.push(self.parse_flow_item(is_map)?);
            self.skip_flow_space()?;
            match self.peek() {
                Some(b',') => {
                    self.emit(TokenKind::Punctuator, self.pos, self.pos + 1);
                }
                Some(b) if b == close_byte => {
                    break self.emit(TokenKind::Punctuator, self.pos, self.pos + 1);
                }
                None => return Err(self.error("unterminated flow collection")),
                _ => return Err(self.error("expected ',' or end of flow collection")),
            }
        };
        let span = self.span_since(first_tok);
        let kind = if is_map {
            NodeKind::Mapping {
                style: CollectionStyle::Flow,
                open: Some(open),
                close: Some(close),
                pairs: items,
            }
        } else {
            NodeKind::Sequence {
                style: CollectionStyle::Flow,
                open: Some(open),
                close: Some(close),
                entries: items
                    .into_iter()
                    .map(|value| SeqEntry {
                        indicator: None,
                        value: Some(value),
                    })
                    .collect(),
            }
        };
        Ok(self.push_node(kind, span))
    }

    /// One entry of a flow collection: a node or a `key: value` pair.
    fn parse_flow_item(&mut self, in_map: bool) -> ParseResult<NodeId> {
        let first_tok = self.tokens.len();
        let question = if self.at_flow_indicator(b'?') {
            let q = self.emit(TokenKind::Punctuator, self.pos, self.pos + 1);
            self.skip_flow_space()?;
            Some(q)
        } else {
            None
        };
        let key = if self.at_flow_indicator(b':') {
            None
        } else {
            self.parse_flow_node()?
        };
        self.skip_flow_space()?;
        let colon_here = self.at_flow_indicator(b':') || self.at_adjacent_colon();
        if !colon_here && question.is_none() && !in_map {
            return key.ok_or_else(|| self.error("expected a flow entry"));
        }
        let mut colon = None;
        let mut value = None;
        if colon_here {
            colon = Some(self.emit(TokenKind::Punctuator, self.pos, self.pos + 1));
            self.skip_flow_space()?;
            if !matches!(self.peek(), Some(b',' | b']' | b'}')) {
                value = self.parse_flow_node()?;
            }
        }
        let span = self.span_since(first_tok);
        Ok(self.push_node(
            NodeKind::Pair {
                question,
                key,
                colon,
                value,
            },
            span,
        ))
    }

    fn parse_flow_node(&mut self) -> ParseResult<Option<NodeId>> {
        let first_tok = self.tokens.len();
        let mut props = Props::default();
        self.collect_inline_props(&mut props, true)?;
        if !props.is_empty() {
            self.skip_flow_space()?;
        }
        let node = match self.peek() {
            Some(b',' | b']' | b'}') | None => None,
            Some(b':') if self.at_flow_indicator(b':') => None,
            Some(b'*') => Some(self.parse_alias(true)),
            Some(b'"' | b'\'') => Some(self.parse_quoted()?),
            Some(b'[' | b'{') => Some(self.parse_flow_collection()?),
            _ => {
                let (start, end) = self.scan_plain_multiline(-1, true);
                if end == start {
                    return Err(self.error("unexpected character in flow collection"));
                }
                Some(self.push_scalar(ScalarStyle::Plain, start, end))
            }
        };
        Ok(self.finish_props(props, node, first_tok))
    }

    /// Whitespace, line breaks and comments inside a flow collection.
    fn skip_flow_space(&mut self) -> ParseResult<()> {
        loop {
            let had_ws = self.skip_inline_ws() || self.at_line_start();
            match self.peek() {
                Some(b'#') if had_ws => self.scan_comment(),
                Some(b'\r' | b'\n') => {
                    self.consume_line_break();
                    if self.at_document_boundary() {
                        return Err(self.error("document marker inside flow collection"));
                    }
                }
                _ => return Ok(()),
            }
        }
    }

    // ------------------------------------------------------------------
    // Scalars and properties
    // ------------------------------------------------------------------

    fn collect_inline_props(&mut self, props: &mut Props, flow: bool) -> ParseResult<()> {
        loop {
            let kind = match self.peek() {
                Some(b'&') => TokenKind::Anchor,
                Some(b'!') => TokenKind::Tag,
                _ => return Ok(()),
            };
            let slot = if kind == TokenKind::Anchor {
                &props.anchor
            } else {
                &props.tag
            };
            if slot.is_some() {
                return Err(self.error("duplicate node property"));
            }
            let id = self.scan_property(kind, flow);
            if kind == TokenKind::Anchor {
                props.anchor = Some(id);
            } else {
                props.tag = Some(id);
            }
            props.first.get_or_insert(id);
            props.line = self.tokens[id].start_line();
            self.skip_inline_ws();
        }
    }

    fn scan_property(&mut self, kind: TokenKind, flow: bool) -> TokenId {
        let start = self.pos;
        self.pos += 1;
        if kind == TokenKind::Tag && self.peek() == Some(b'<') {
            while let Some(b) = self.peek() {
                self.pos += 1;
                if b == b'>' || self.at_eol() {
                    break;
                }
            }
        } else {
            while let Some(b) = self.peek() {
                if b == b' ' || b == b'\t' || b == b'\r' || b == b'\n' {
                    break;
                }
                if flow && FLOW_INDICATORS.contains(&b) {
                    break;
                }
                self.pos += 1;
            }
        }
        self.emit(kind, start, self.pos)
    }

    fn parse_alias(&mut self, flow: bool) -> NodeId {
        let start = self.pos;
        self.pos += 1;
        while let Some(b) = self.peek() {
            if b == b' ' || b == b'\t' || b == b'\r' || b == b'\n' {
                break;
            }
            if flow && (FLOW_INDICATORS.contains(&b) || b == b':') {
                break;
            }
            self.pos += 1;
        }
        let token = self.emit(TokenKind::Alias, start, self.pos);
        let span = self.tokens[token].range;
        self.push_node(NodeKind::Alias { token }, span)
    }

    fn parse_quoted(&mut self) -> ParseResult<NodeId> {
        let start = self.pos;
        let Some(end) = self.find_quote_end(start, false) else {
            return Err(self.error("unterminated quoted scalar"));
        };
        if self.quoted_crosses_marker(start, end) {
            return Err(self.error("document marker inside quoted scalar"));
        }
        self.pos = end;
        let style = if self.bytes[start] == b'"' {
            ScalarStyle::DoubleQuoted
        } else {
            ScalarStyle::SingleQuoted
        };
        Ok(self.push_scalar(style, start, end))
    }

    fn quoted_crosses_marker(&self, start: usize, end: usize) -> bool {
        ((self.lines.line_of(start) + 1)..=self.lines.line_of(end))
            .any(|l| self.is_marker_at(self.lines.line_start(l)))
    }

    /// Offset just past the closing quote of the scalar opening at `start`.
    fn find_quote_end(&self, start: usize, same_line: bool) -> Option<usize> {
        let quote = self.bytes[start];
        let mut i = start + 1;
        while i < self.bytes.len() {
            let b = self.bytes[i];
            if same_line && (b == b'\n' || b == b'\r') {
                return None;
            }
            if quote == b'"' && b == b'\\' {
                i += 2;
                continue;
            }
            if b == quote {
                if quote == b'\'' && self.bytes.get(i + 1) == Some(&b'\'') {
                    i += 2;
                    continue;
                }
                return Some(i + 1);
            }
            i += 1;
        }
        None
    }

    /// Scan one line of a plain scalar starting at `pos`. Returns the offset
    /// just past its last non-space character; `pos` is left untouched.
    fn scan_plain_line(&self, flow: bool) -> usize {
        self.plain_line_end(self.pos, flow)
    }

    fn plain_line_end(&self, from: usize, flow: bool) -> usize {
        let mut i = from;
        let mut end = from;
        while i < self.bytes.len() {
            let b = self.bytes[i];
            if b == b'\n' || b == b'\r' {
                break;
            }
            if b == b'#' && i > from && matches!(self.bytes[i - 1], b' ' | b'\t') {
                break;
            }
            if b == b':' && self.is_value_colon(i, flow) {
                break;
            }
            if flow && FLOW_INDICATORS.contains(&b) {
                break;
            }
            i += 1;
            if b != b' ' && b != b'\t' {
                end = i;
            }
        }
        end
    }

    /// Plain scalar possibly continuing on more-indented lines. On return
    /// `pos` is just past the last non-space character.
    fn scan_plain_multiline(&mut self, parent: i32, flow: bool) -> (usize, usize) {
        let start = self.pos;
        let mut end = self.plain_line_end(self.pos, flow);
        self.pos = end;
        loop {
            let save = self.pos;
            self.skip_inline_ws();
            if !self.at_eol() || self.pos >= self.bytes.len() {
                self.pos = save;
                break;
            }
            // Look at following lines without emitting anything.
            let mut probe = self.pos;
            let next = loop {
                probe = self.after_line_break(probe);
                if probe >= self.bytes.len() {
                    break None;
                }
                let content = self.skip_spaces_from(probe);
                match self.bytes.get(content) {
                    None => break None,
                    Some(b'\n' | b'\r') => probe = content,
                    Some(_) => break Some((probe, content)),
                }
            };
            let Some((line_start, content)) = next else {
                self.pos = save;
                break;
            };
            if !self.plain_continues(line_start, content, parent, flow) {
                self.pos = save;
                break;
            }
            let line_end = self.plain_line_end(content, flow);
            if line_end == content {
                self.pos = save;
                break;
            }
            end = line_end;
            self.pos = line_end;
        }
        (start, end)
    }

    fn plain_continues(&self, line_start: usize, content: usize, parent: i32, flow: bool) -> bool {
        if self.is_marker_at(line_start) {
            return false;
        }
        let b = self.bytes[content];
        if b == b'#' {
            return false;
        }
        if flow {
            return !(FLOW_INDICATORS.contains(&b) || self.is_value_colon(content, true));
        }
        let indent = i32::try_from(self.text[line_start..content].chars().count()).unwrap_or(i32::MAX);
        if indent <= parent {
            return false;
        }
        // A key-looking line is a (possibly misplaced) sibling, never text.
        !(self.is_indicator_at(content, b':') || self.line_looks_like_key(content))
    }

    fn push_scalar(&mut self, style: ScalarStyle, start: usize, end: usize) -> NodeId {
        let token = self.emit(TokenKind::Scalar, start, end);
        self.push_node(
            NodeKind::Scalar {
                style,
                token: Some(token),
                block: None,
            },
            Span::new(start, end),
        )
    }

    // ------------------------------------------------------------------
    // Lookahead predicates
    // ------------------------------------------------------------------

    /// Does the line at `at` open a mapping entry (`? `, `: `, or `key:`)?
    fn line_looks_like_entry(&self, at: usize) -> bool {
        self.is_indicator_at(at, b'?') || self.is_indicator_at(at, b':') || self.line_looks_like_key(at)
    }

    /// Does an implicit `key:` start at `at`?
    fn line_looks_like_key(&self, at: usize) -> bool {
        let mut i = at;
        while matches!(self.bytes.get(i), Some(b'&' | b'!')) {
            while i < self.bytes.len() && !matches!(self.bytes[i], b' ' | b'\t' | b'\n' | b'\r') {
                i += 1;
            }
            i = self.skip_spaces_from(i);
        }
        let after_key = match self.bytes.get(i) {
            None | Some(b'#' | b'\n' | b'\r') => return false,
            Some(b'-' | b'?') if self.is_indicator_at(i, self.bytes[i]) => return false,
            Some(b':') if self.is_indicator_at(i, b':') => return false,
            Some(b'"' | b'\'') => match self.find_quote_end(i, true) {
                Some(end) => end,
                None => return false,
            },
            Some(b'[' | b'{') => match self.balanced_end_same_line(i) {
                Some(end) => end,
                None => return false,
            },
            Some(b'*') => {
                let mut j = i;
                while j < self.bytes.len() && !matches!(self.bytes[j], b' ' | b'\t' | b'\n' | b'\r') {
                    j += 1;
                }
                j
            }
            Some(_) => {
                let end = self.plain_line_end(i, false);
                let j = self.skip_spaces_from(end);
                return self.bytes.get(j) == Some(&b':') && self.is_value_colon(j, false);
            }
        };
        let j = self.skip_spaces_from(after_key);
        self.bytes.get(j) == Some(&b':')
            && (self.is_value_colon(j, false) || j == after_key)
    }

    fn balanced_end_same_line(&self, at: usize) -> Option<usize> {
        let mut depth = 0usize;
        let mut i = at;
        while i < self.bytes.len() {
            match self.bytes[i] {
                b'\n' | b'\r' => return None,
                b'"' | b'\'' => {
                    i = self.find_quote_end(i, true)?;
                    continue;
                }
                b'[' | b'{' => depth += 1,
                b']' | b'}' => {
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        return Some(i + 1);
                    }
                }
                _ => {}
            }
            i += 1;
        }
        None
    }

    /// `:` followed by whitespace, end of line, or (in flow) a flow indicator.
    fn is_value_colon(&self, at: usize, flow: bool) -> bool {
        match self.bytes.get(at + 1) {
            None | Some(b' ' | b'\t' | b'\n' | b'\r') => true,
            Some(b) => flow && FLOW_INDICATORS.contains(b),
        }
    }

    fn is_indicator_at(&self, at: usize, ch: u8) -> bool {
        self.bytes.get(at) == Some(&ch)
            && matches!(self.bytes.get(at + 1), None | Some(b' ' | b'\t' | b'\n' | b'\r'))
    }

    fn at_indicator(&self, ch: u8) -> bool {
        self.is_indicator_at(self.pos, ch)
    }

    fn at_flow_indicator(&self, ch: u8) -> bool {
        self.peek() == Some(ch)
            && matches!(
                self.bytes.get(self.pos + 1),
                None | Some(b' ' | b'\t' | b'\n' | b'\r' | b',' | b'[' | b']' | b'{' | b'}')
            )
    }

    /// `"key":value` style colon directly after a quoted or flow key.
    fn at_adjacent_colon(&self) -> bool {
        self.peek() == Some(b':')
            && self
                .tokens
                .last()
                .is_some_and(|t| t.range.end == self.pos && matches!(self.bytes[t.range.end - 1], b'"' | b'\'' | b']' | b'}'))
    }

    fn is_marker_at(&self, line_start: usize) -> bool {
        let rest = &self.bytes[line_start.min(self.bytes.len())..];
        (rest.starts_with(b"---") || rest.starts_with(b"..."))
            && matches!(rest.get(3), None | Some(b' ' | b'\t' | b'\n' | b'\r'))
    }

    fn at_marker(&self, marker: &[u8]) -> bool {
        self.at_line_start() && self.bytes[self.pos..].starts_with(marker) && self.is_marker_at(self.pos)
    }

    fn at_document_boundary(&self) -> bool {
        self.at_line_start() && self.is_marker_at(self.pos)
    }

    // ------------------------------------------------------------------
    // Cursor helpers
    // ------------------------------------------------------------------

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn at_eol(&self) -> bool {
        matches!(self.peek(), None | Some(b'\n' | b'\r'))
    }

    fn at_line_start(&self) -> bool {
        self.pos == 0 || matches!(self.bytes.get(self.pos - 1), Some(b'\n'))
    }

    /// `pos` is on the first non-blank, non-comment character of its line.
    fn at_line_content_start(&self) -> bool {
        if self.at_eol() || matches!(self.peek(), Some(b' ' | b'\t' | b'#')) {
            return false;
        }
        let line_start = self.lines.line_start(self.lines.line_of(self.pos));
        self.bytes[line_start..self.pos]
            .iter()
            .all(|&b| b == b' ' || b == b'\t')
    }

    fn skip_inline_ws(&mut self) -> bool {
        let start = self.pos;
        self.pos = self.skip_spaces_from(self.pos);
        self.pos > start
    }

    fn skip_spaces_from(&self, mut i: usize) -> usize {
        while matches!(self.bytes.get(i), Some(b' ' | b'\t')) {
            i += 1;
        }
        i
    }

    fn after_line_break(&self, mut i: usize) -> usize {
        if self.bytes.get(i) == Some(&b'\r') {
            i += 1;
        }
        if self.bytes.get(i) == Some(&b'\n') {
            i += 1;
        }
        i
    }

    fn consume_line_break(&mut self) {
        self.pos = self.after_line_break(self.pos);
    }

    fn scan_until_comment_or_eol(&mut self) -> usize {
        let mut end = self.pos;
        while let Some(b) = self.peek() {
            if b == b'\n' || b == b'\r' {
                break;
            }
            if b == b'#' && matches!(self.bytes.get(self.pos.wrapping_sub(1)), Some(b' ' | b'\t')) {
                break;
            }
            self.pos += 1;
            if b != b' ' && b != b'\t' {
                end = self.pos;
            }
        }
        self.pos = end;
        end
    }

    fn scan_comment(&mut self) {
        let start = self.pos;
        while !self.at_eol() {
            self.pos += 1;
        }
        let mut end = self.pos;
        while end > start && matches!(self.bytes[end - 1], b' ' | b'\t') {
            end -= 1;
        }
        self.emit(TokenKind::Comment, start, end);
    }

    /// Move to the first content character of the next meaningful line,
    /// emitting comments on the way. Trailing text on the current line is an
    /// error. Returns `false` at end of input.
    fn advance_to_content(&mut self) -> ParseResult<bool> {
        if self.at_line_content_start() {
            return Ok(true);
        }
        self.skip_inline_ws();
        if self.peek() == Some(b'#') {
            // Callers may already have consumed the blanks before the `#`.
            let separated = self.at_line_start() || matches!(self.bytes[self.pos - 1], b' ' | b'\t');
            if !separated {
                return Err(self.error("comment must be separated from content by whitespace"));
            }
            self.scan_comment();
        }
        if !self.at_eol() {
            return Err(self.error("unexpected content"));
        }
        self.skip_blank_lines_from_here()
    }

    fn skip_blank_lines_from_here(&mut self) -> ParseResult<bool> {
        loop {
            self.skip_inline_ws();
            if self.peek() == Some(b'#') {
                self.scan_comment();
            }
            if self.pos >= self.bytes.len() {
                return Ok(false);
            }
            if !self.at_eol() {
                return Ok(true);
            }
            self.consume_line_break();
        }
    }

    fn col(&self) -> u32 {
        self.lines.position(self.text, self.pos).column
    }

    fn col_i32(&self) -> i32 {
        i32::try_from(self.col()).unwrap_or(i32::MAX)
    }

    // ------------------------------------------------------------------
    // Arena
    // ------------------------------------------------------------------

    fn emit(&mut self, kind: TokenKind, start: usize, end: usize) -> TokenId {
        debug_assert!(self.tokens.last().is_none_or(|t| t.range.end <= start));
        let loc = SourceLocation {
            start: self.lines.position(self.text, start),
            end: self.lines.position(self.text, end),
        };
        self.tokens.push(Token {
            kind,
            value: self.text[start..end].to_string(),
            range: Span::new(start, end),
            loc,
        });
        if self.pos < end {
            self.pos = end;
        }
        self.tokens.len() - 1
    }

    fn push_node(&mut self, kind: NodeKind, span: Span) -> NodeId {
        self.nodes.push(Node { kind, span });
        self.nodes.len() - 1
    }

    /// Span of the non-comment tokens emitted since `first_tok`.
    fn span_since(&self, first_tok: TokenId) -> Span {
        let mut it = self.tokens[first_tok.min(self.tokens.len())..]
            .iter()
            .filter(|t| !t.is_comment());
        let Some(first) = it.next() else {
            return Span::new(self.pos, self.pos);
        };
        let end = it.last().map_or(first.range.end, |t| t.range.end);
        Span::new(first.range.start, end)
    }

    fn span_with_comments(&self, first_tok: TokenId) -> Span {
        match (self.tokens.get(first_tok), self.tokens.last()) {
            (Some(first), Some(last)) => Span::new(first.range.start, last.range.end),
            _ => Span::new(self.pos, self.pos),
        }
    }

    fn error(&self, message: &str) -> ParseError {
        let at = self.lines.position(self.text, self.pos);
        ParseError {
            message: message.to_string(),
            offset: self.pos,
            line: at.line,
            column: at.column,
        }
    }
}
