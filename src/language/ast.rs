//! Lowered executable form.
//!
//! A [`BlockSpec`] is an immutable description of a block: its flattened body and
//! the names it predeclares. It is never mutated after lowering; the engine
//! materializes a fresh environment frame from it on every invocation.

use crate::language::span::{Position, Span};
use crate::runtime::value::Value;
use std::collections::HashMap;
use std::fmt;
use std::rc::{Rc, Weak};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DeclKind {
    Def,
    Let,
}

impl DeclKind {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "Def" => Some(DeclKind::Def),
            "Let" => Some(DeclKind::Let),
            _ => None,
        }
    }
}

impl fmt::Display for DeclKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeclKind::Def => write!(f, "Def"),
            DeclKind::Let => write!(f, "Let"),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Ident {
    pub name: Rc<str>,
    pub span: Span,
    pub position: Position,
}

#[derive(Clone, Debug)]
pub enum Item {
    Literal(Value),
    Identifier(Ident),
    Block(Rc<BlockSpec>),
}

#[derive(Debug, Default)]
pub struct BlockSpec {
    pub body: Vec<Item>,
    pub predeclared: HashMap<Rc<str>, DeclKind>,
    /// Enclosing block, used only to resolve names statically.
    pub parent: Weak<BlockSpec>,
    /// False for prelude code; runtime diagnostics only point into user source.
    pub user_code: bool,
}

impl BlockSpec {
    /// Finds the innermost predeclaration of `name`, starting at this block and
    /// walking out through enclosing blocks.
    pub fn find_declaration(&self, name: &str) -> Option<DeclKind> {
        if let Some(kind) = self.predeclared.get(name) {
            return Some(*kind);
        }
        let mut parent = self.parent.upgrade();
        while let Some(block) = parent {
            if let Some(kind) = block.predeclared.get(name) {
                return Some(*kind);
            }
            parent = block.parent.upgrade();
        }
        None
    }

    pub fn nested_blocks(&self) -> impl Iterator<Item = &Rc<BlockSpec>> {
        self.body.iter().filter_map(|item| match item {
            Item::Block(block) => Some(block),
            _ => None,
        })
    }
}
