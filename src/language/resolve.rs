//! Static resolution: every free name must be a builtin, an engine keyword, or
//! declared by `Def`/`Let` in an enclosing block. Collects every problem in one
//! pass instead of stopping at the first.

use crate::frontend::Frontend;
use crate::language::{
    ast::{BlockSpec, DeclKind, Ident, Item},
    errors::{StaticError, StaticErrorKind},
};
use crate::runtime::{builtins, keyword::Keyword};
use crate::stack::ensure_sufficient_stack;

#[derive(Debug, Default)]
pub struct Resolution {
    pub undefined: Vec<Ident>,
    /// References that resolve to a `Def`, i.e. function calls.
    pub call_sites: Vec<Ident>,
}

impl Resolution {
    pub fn is_clean(&self) -> bool {
        self.undefined.is_empty()
    }
}

pub fn is_recognized(name: &str) -> bool {
    Keyword::from_name(name).is_some() || builtins::lookup(name).is_some()
}

pub fn resolve(root: &BlockSpec, frontend: &mut Frontend) -> Resolution {
    let mut resolution = Resolution::default();
    visit(root, frontend, &mut resolution);
    resolution
}

/// The name operand of a `Def`/`Let`, which sits right before the keyword.
fn is_declared_name(block: &BlockSpec, idx: usize) -> bool {
    matches!(
        block.body.get(idx + 1),
        Some(Item::Identifier(next)) if DeclKind::from_name(&next.name).is_some()
    )
}

fn visit(block: &BlockSpec, frontend: &mut Frontend, resolution: &mut Resolution) {
    for (idx, item) in block.body.iter().enumerate() {
        match item {
            Item::Identifier(_) if is_declared_name(block, idx) => {}
            Item::Identifier(ident) if !is_recognized(&ident.name) => {
                match block.find_declaration(&ident.name) {
                    Some(DeclKind::Def) => resolution.call_sites.push(ident.clone()),
                    Some(DeclKind::Let) => {}
                    None => {
                        let kind = StaticErrorKind::UndefinedSymbol {
                            name: ident.name.to_string(),
                        };
                        StaticError::new(kind, ident.span, ident.position).report(frontend);
                        resolution.undefined.push(ident.clone());
                    }
                }
            }
            Item::Block(nested) => {
                ensure_sufficient_stack(|| visit(nested, frontend, resolution))
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::Capture;
    use crate::language::{lower::lower, parser::parse_source};
    use pretty_assertions::assert_eq;

    fn resolve_text(source: &str) -> (Resolution, Capture) {
        let capture = Capture::new();
        let mut frontend = capture.frontend();
        let lowered = lower(&parse_source(source), None, true, &mut frontend);
        let resolution = resolve(&lowered.root, &mut frontend);
        (resolution, capture)
    }

    #[test]
    fn every_undefined_symbol_is_reported() {
        let (resolution, capture) = resolve_text("Print Foo; Let X (Bar Baz);");
        let names: Vec<_> = resolution
            .undefined
            .iter()
            .map(|ident| ident.name.to_string())
            .collect();
        assert_eq!(names, vec!["Foo", "Baz", "Bar"]);
        assert_eq!(capture.errors()[0], "undefined symbol Foo");
    }

    #[test]
    fn forward_references_resolve() {
        let (resolution, _) = resolve_text("Def A (B); Def B (Print 1); A;");
        assert!(resolution.is_clean());
        assert_eq!(resolution.call_sites.len(), 2);
    }

    #[test]
    fn builtins_and_keywords_need_no_declaration() {
        let (resolution, _) = resolve_text("Print + 1 2; Let X Box 1; Set X 3; Stop");
        assert!(resolution.is_clean());
    }
}
