//! Concrete syntax tree handed to the lowering pass.
//!
//! The tree mirrors what a tree-sitter grammar for Cognate produces: every node has a
//! kind, the exact source text it covers, a span and a start position. Syntax errors
//! are represented in-tree (`Error` nodes and *missing* nodes) instead of aborting.

use crate::language::span::{Position, Span};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeKind {
    SourceFile,
    Statement,
    Block,
    Identifier,
    Number,
    String,
    Boolean,
    Symbol,
    Comment,
    Error,
}

impl NodeKind {
    pub fn name(self) -> &'static str {
        match self {
            NodeKind::SourceFile => "source_file",
            NodeKind::Statement => "statement",
            NodeKind::Block => "block",
            NodeKind::Identifier => "identifier",
            NodeKind::Number => "number",
            NodeKind::String => "string",
            NodeKind::Boolean => "boolean",
            NodeKind::Symbol => "symbol",
            NodeKind::Comment => "comment",
            NodeKind::Error => "ERROR",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Node {
    pub kind: NodeKind,
    pub text: String,
    pub span: Span,
    pub position: Position,
    /// Set on zero-width nodes the parser inserted to recover, e.g. an unclosed `(`.
    /// `text` then names what was expected.
    pub missing: bool,
    pub children: Vec<Node>,
}

impl Node {
    pub fn leaf(kind: NodeKind, text: impl Into<String>, span: Span, position: Position) -> Self {
        Self {
            kind,
            text: text.into(),
            span,
            position,
            missing: false,
            children: Vec::new(),
        }
    }

    pub fn branch(kind: NodeKind, span: Span, position: Position, children: Vec<Node>) -> Self {
        Self {
            kind,
            text: String::new(),
            span,
            position,
            missing: false,
            children,
        }
    }

    pub fn missing(expected: impl Into<String>, offset: usize, position: Position) -> Self {
        Self {
            kind: NodeKind::Error,
            text: expected.into(),
            span: Span::new(offset, offset),
            position,
            missing: true,
            children: Vec::new(),
        }
    }

    /// Depth-first walk, parents before children.
    pub fn walk(&self) -> impl Iterator<Item = &Node> {
        let mut pending = vec![self];
        std::iter::from_fn(move || {
            let node = pending.pop()?;
            pending.extend(node.children.iter().rev());
            Some(node)
        })
    }

    pub fn has_errors(&self) -> bool {
        self.walk().any(|node| node.kind == NodeKind::Error)
    }
}
