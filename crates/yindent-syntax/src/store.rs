//! Token lookups relative to nodes and tokens.
//!
//! All queries binary-search the token vector, which is sorted by start offset.

use yindent_abi::Span;

use crate::ast::{Node, TokenId};
use crate::token::Token;

/// Anything with a byte range: nodes, tokens, raw spans.
pub trait Ranged {
    fn span(&self) -> Span;
}

impl Ranged for Span {
    fn span(&self) -> Span {
        *self
    }
}

impl Ranged for Token {
    fn span(&self) -> Span {
        self.range
    }
}

impl Ranged for Node {
    fn span(&self) -> Span {
        self.span
    }
}

impl<T: Ranged + ?Sized> Ranged for &T {
    fn span(&self) -> Span {
        (**self).span()
    }
}

/// Options shared by every lookup. Comments are skipped unless asked for.
#[derive(Clone, Copy, Default)]
pub struct TokenQuery<'q> {
    pub skip: usize,
    pub include_comments: bool,
    pub filter: Option<&'q dyn Fn(&Token) -> bool>,
}

impl<'q> TokenQuery<'q> {
    #[must_use]
    pub fn with_comments(mut self) -> Self {
        self.include_comments = true;
        self
    }

    #[must_use]
    pub const fn skip(mut self, n: usize) -> Self {
        self.skip = n;
        self
    }

    #[must_use]
    pub fn filter(mut self, f: &'q dyn Fn(&Token) -> bool) -> Self {
        self.filter = Some(f);
        self
    }

    fn accepts(&self, token: &Token) -> bool {
        (self.include_comments || !token.is_comment()) && self.filter.is_none_or(|f| f(token))
    }
}

#[derive(Clone, Copy)]
pub struct TokenStore<'a> {
    tokens: &'a [Token],
}

impl<'a> TokenStore<'a> {
    #[must_use]
    pub const fn new(tokens: &'a [Token]) -> Self {
        Self { tokens }
    }

    #[must_use]
    pub fn get(&self, id: TokenId) -> &'a Token {
        &self.tokens[id]
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.tokens.len()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Index of the first token starting at or after `offset`.
    fn lower_bound(&self, offset: usize) -> usize {
        self.tokens.partition_point(|t| t.range.start < offset)
    }

    fn pick(&self, ids: impl Iterator<Item = TokenId>, query: &TokenQuery<'_>) -> Option<TokenId> {
        ids.filter(|&i| query.accepts(&self.tokens[i]))
            .nth(query.skip)
    }

    /// First token inside `node`.
    #[must_use]
    pub fn first_token(&self, node: impl Ranged, query: TokenQuery<'_>) -> Option<TokenId> {
        let span = node.span();
        let from = self.lower_bound(span.start);
        let to = self.lower_bound(span.end.max(span.start + 1));
        self.pick(from..to, &query)
    }

    /// Last token inside `node`.
    #[must_use]
    pub fn last_token(&self, node: impl Ranged, query: TokenQuery<'_>) -> Option<TokenId> {
        let span = node.span();
        let from = self.lower_bound(span.start);
        let to = self.lower_bound(span.end.max(span.start + 1));
        self.pick((from..to).rev(), &query)
    }

    /// Nearest token starting before `node`.
    #[must_use]
    pub fn token_before(&self, node: impl Ranged, query: TokenQuery<'_>) -> Option<TokenId> {
        let to = self.lower_bound(node.span().start);
        self.pick((0..to).rev(), &query)
    }

    /// Nearest token starting at or after the end of `node`.
    #[must_use]
    pub fn token_after(&self, node: impl Ranged, query: TokenQuery<'_>) -> Option<TokenId> {
        let span = node.span();
        let from = self.lower_bound(span.end.max(span.start + 1));
        self.pick(from..self.tokens.len(), &query)
    }

    /// Tokens strictly between the end of `left` and the start of `right`.
    /// `skip` drops that many leading matches.
    #[must_use]
    pub fn tokens_between(
        &self,
        left: impl Ranged,
        right: impl Ranged,
        query: TokenQuery<'_>,
    ) -> Vec<TokenId> {
        let from = self.lower_bound(left.span().end);
        let to = self.lower_bound(right.span().start);
        (from..to.max(from))
            .filter(|&i| query.accepts(&self.tokens[i]))
            .skip(query.skip)
            .collect()
    }
}
