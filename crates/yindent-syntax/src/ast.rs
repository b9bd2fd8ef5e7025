//! Arena AST. Nodes and tokens are addressed by index.

use yindent_abi::Span;

pub type NodeId = usize;
pub type TokenId = usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionStyle {
    Block,
    Flow,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarStyle {
    Plain,
    SingleQuoted,
    DoubleQuoted,
    Literal,
    Folded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Chomping {
    Clip,
    Strip,
    Keep,
}

/// Header and body of a `|` / `>` scalar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockScalarInfo {
    pub header: TokenId,
    /// `None` when the scalar has no content lines.
    pub body: Option<TokenId>,
    /// Explicit indentation indicator digit, if written.
    pub indentation: Option<u8>,
    pub chomping: Chomping,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeqEntry {
    /// The `-` mark; flow sequences have none.
    pub indicator: Option<TokenId>,
    pub value: Option<NodeId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Document {
        directives: Vec<TokenId>,
        start_marker: Option<TokenId>,
        end_marker: Option<TokenId>,
        content: Option<NodeId>,
    },
    Mapping {
        style: CollectionStyle,
        open: Option<TokenId>,
        close: Option<TokenId>,
        pairs: Vec<NodeId>,
    },
    Sequence {
        style: CollectionStyle,
        open: Option<TokenId>,
        close: Option<TokenId>,
        entries: Vec<SeqEntry>,
    },
    Pair {
        question: Option<TokenId>,
        key: Option<NodeId>,
        colon: Option<TokenId>,
        value: Option<NodeId>,
    },
    Scalar {
        style: ScalarStyle,
        token: Option<TokenId>,
        block: Option<BlockScalarInfo>,
    },
    Alias {
        token: TokenId,
    },
    /// A node carrying an anchor and/or tag. `node` is `None` for an empty value.
    Decorated {
        anchor: Option<TokenId>,
        tag: Option<TokenId>,
        node: Option<NodeId>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub kind: NodeKind,
    /// Byte range from the node's first to last non-comment token. Document
    /// spans also cover their comments.
    pub span: Span,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ast {
    pub nodes: Vec<Node>,
    pub documents: Vec<NodeId>,
}

impl Ast {
    #[must_use]
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id]
    }

    #[must_use]
    pub fn is_block_sequence(&self, id: NodeId) -> bool {
        matches!(
            self.nodes[id].kind,
            NodeKind::Sequence {
                style: CollectionStyle::Block,
                ..
            }
        )
    }
}
