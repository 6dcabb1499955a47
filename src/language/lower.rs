//! Lowering: concrete syntax tree to nested [`BlockSpec`]s.
//!
//! Each statement's items are reversed so that operands are pushed before the
//! word that consumes them, turning prefix source into a single left-to-right
//! pass over the stack. Parenthesized blocks stay nested and are only run when
//! invoked. `Def`/`Let` names are recorded per block so the engine can detect
//! use before declaration and the lowering pass can reject shadowing within a
//! block.

use crate::frontend::Frontend;
use crate::language::{
    ast::{BlockSpec, DeclKind, Ident, Item},
    cst::{Node, NodeKind},
    errors::{StaticError, StaticErrorKind},
};
use crate::runtime::value::{unescape_char, Text, Value};
use crate::stack::ensure_sufficient_stack;
use std::collections::HashMap;
use std::rc::{Rc, Weak};

pub struct Lowered {
    pub root: Rc<BlockSpec>,
    /// Set when any syntax error was found; the program must not run.
    pub bail: bool,
}

/// Lowers `root` (a `source_file` node). `parent` is the block whose
/// declarations are visible to this one, i.e. the prelude for user programs.
pub fn lower(
    root: &Node,
    parent: Option<&Rc<BlockSpec>>,
    user_code: bool,
    frontend: &mut Frontend,
) -> Lowered {
    let mut lowerer = Lowerer {
        frontend,
        user_code,
        bail: false,
    };
    let parent = parent.map(Rc::downgrade).unwrap_or_default();
    let root = lowerer.block(&root.children, parent);
    Lowered {
        root,
        bail: lowerer.bail,
    }
}

/// `PRINT` and `print` name the same thing: first letter upper, rest lower.
pub fn normalize_identifier(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

/// Strips the quotes and resolves escapes. Unknown escapes are kept as written.
pub fn unescape_string(literal: &str) -> String {
    let inner = literal
        .strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
        .unwrap_or(literal);
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some(letter) => match unescape_char(letter) {
                Some(resolved) => out.push(resolved),
                None => {
                    out.push('\\');
                    out.push(letter);
                }
            },
            None => out.push('\\'),
        }
    }
    out
}

struct Lowerer<'f> {
    frontend: &'f mut Frontend,
    user_code: bool,
    bail: bool,
}

impl Lowerer<'_> {
    fn fail(&mut self, kind: StaticErrorKind, node: &Node) {
        StaticError::new(kind, node.span, node.position).report(self.frontend);
        self.bail = true;
    }

    fn block(&mut self, statements: &[Node], parent: Weak<BlockSpec>) -> Rc<BlockSpec> {
        Rc::new_cyclic(|this| {
            let mut body = Vec::new();
            let mut predeclared = HashMap::new();
            for node in statements {
                match node.kind {
                    NodeKind::Statement => {
                        self.statement(node, this, &mut body, &mut predeclared)
                    }
                    _ => self.item(node, this, &mut body),
                }
            }
            BlockSpec {
                body,
                predeclared,
                parent,
                user_code: self.user_code,
            }
        })
    }

    fn statement(
        &mut self,
        node: &Node,
        this: &Weak<BlockSpec>,
        body: &mut Vec<Item>,
        predeclared: &mut HashMap<Rc<str>, DeclKind>,
    ) {
        let mut items = Vec::with_capacity(node.children.len());
        for child in &node.children {
            self.item(child, this, &mut items);
        }

        // In source order a declared name directly follows its `Def`/`Let`.
        for idx in (0..items.len()).rev() {
            let Item::Identifier(keyword) = &items[idx] else {
                continue;
            };
            let Some(kind) = DeclKind::from_name(&keyword.name) else {
                continue;
            };
            match items.get(idx + 1) {
                Some(Item::Identifier(name)) => {
                    if predeclared.contains_key(&name.name) {
                        let shadowed = StaticErrorKind::Shadowed {
                            kind,
                            name: name.name.to_string(),
                        };
                        StaticError::new(shadowed, name.span, name.position)
                            .report(self.frontend);
                        self.bail = true;
                    } else {
                        predeclared.insert(name.name.clone(), kind);
                    }
                }
                _ => {
                    let expected = StaticErrorKind::IdentifierExpected { after: kind };
                    StaticError::new(expected, keyword.span, keyword.position)
                        .report(self.frontend);
                    self.bail = true;
                    return;
                }
            }
        }

        items.reverse();
        body.extend(items);
    }

    fn item(&mut self, node: &Node, this: &Weak<BlockSpec>, out: &mut Vec<Item>) {
        if node.missing {
            self.fail(
                StaticErrorKind::Missing {
                    expected: node.text.clone(),
                },
                node,
            );
            return;
        }
        let literal = match node.kind {
            NodeKind::Comment => return,
            NodeKind::Identifier => {
                out.push(Item::Identifier(Ident {
                    name: Rc::from(normalize_identifier(&node.text)),
                    span: node.span,
                    position: node.position,
                }));
                return;
            }
            NodeKind::Block => {
                let block =
                    ensure_sufficient_stack(|| self.block(&node.children, this.clone()));
                out.push(Item::Block(block));
                return;
            }
            NodeKind::Number => match node.text.parse::<f64>() {
                Ok(number) => Value::Number(number),
                Err(_) => {
                    self.fail(StaticErrorKind::Malformed, node);
                    return;
                }
            },
            NodeKind::String => Value::String(Text::new(&unescape_string(&node.text))),
            NodeKind::Boolean => Value::Boolean(node.text.eq_ignore_ascii_case("true")),
            NodeKind::Symbol => {
                let name = node.text.strip_prefix('\\').unwrap_or(&node.text);
                Value::symbol(&name.to_lowercase())
            }
            NodeKind::Error if !node.text.is_empty() => {
                self.fail(
                    StaticErrorKind::UnexpectedToken {
                        text: node.text.clone(),
                    },
                    node,
                );
                return;
            }
            NodeKind::Error | NodeKind::Statement | NodeKind::SourceFile => {
                self.fail(StaticErrorKind::Malformed, node);
                return;
            }
        };
        out.push(Item::Literal(literal));
    }
}
