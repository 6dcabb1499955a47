use crate::frontend::{Diagnostic, Frontend, Severity};
use crate::language::ast::DeclKind;
use crate::language::span::{Position, Span};

/// Problems found before anything runs. Any of these keeps the program from
/// being evaluated.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StaticErrorKind {
    /// The parser inserted a zero-width node standing in for `expected`.
    Missing { expected: String },
    UnexpectedToken { text: String },
    Malformed,
    IdentifierExpected { after: DeclKind },
    Shadowed { kind: DeclKind, name: String },
    UndefinedSymbol { name: String },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StaticError {
    pub kind: StaticErrorKind,
    pub span: Span,
    pub position: Position,
}

impl StaticError {
    pub fn new(kind: StaticErrorKind, span: Span, position: Position) -> Self {
        Self {
            kind,
            span,
            position,
        }
    }

    /// Short label attached to the source region.
    pub fn label(&self) -> String {
        match &self.kind {
            StaticErrorKind::Missing { expected } => format!("missing `{expected}`"),
            StaticErrorKind::UnexpectedToken { .. } => "unexpected token".into(),
            StaticErrorKind::Malformed => "syntax error".into(),
            StaticErrorKind::IdentifierExpected { after } => {
                format!("syntax error: identifier expected after {after}")
            }
            StaticErrorKind::Shadowed { .. } => "cannot shadow in the same block".into(),
            StaticErrorKind::UndefinedSymbol { .. } => "undefined symbol".into(),
        }
    }

    /// Full message for the error list, emphasised through the frontend's style.
    pub fn message(&self, frontend: &Frontend) -> String {
        let at = frontend.light(&self.position.to_string());
        match &self.kind {
            StaticErrorKind::Missing { expected } => {
                format!("missing: {} {at}", frontend.marked(expected))
            }
            StaticErrorKind::UnexpectedToken { text } => {
                format!("unexpected token: '{}' {at}", frontend.marked(text))
            }
            StaticErrorKind::Malformed => format!("syntax error {at}"),
            StaticErrorKind::IdentifierExpected { after } => {
                format!("syntax error: identifier expected after {after}")
            }
            StaticErrorKind::Shadowed { kind, name } => format!(
                "{kind} {}: cannot shadow in the same block",
                frontend.marked(name)
            ),
            StaticErrorKind::UndefinedSymbol { name } => {
                format!("undefined symbol {}", frontend.marked(name))
            }
        }
    }

    pub fn report(&self, frontend: &mut Frontend) {
        let message = self.message(frontend);
        let diagnostic = Diagnostic {
            span: self.span,
            position: self.position,
            severity: Severity::Error,
            message: self.label(),
        };
        frontend.report(message, diagnostic);
    }
}
