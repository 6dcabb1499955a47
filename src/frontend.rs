//! Collaborators the interpreter reports through.
//!
//! The core never prints. Output, diagnostics and the error list go to sinks
//! supplied by the host, and any emphasis in messages is produced by a
//! [`TextStyle`], so the same engine can drive a terminal, a test harness or an
//! editor integration.

use crate::language::span::{Position, Span};
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Style {
    Marked,
    Light,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StyledText {
    pub text: String,
    pub style: Option<Style>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Severity {
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
        }
    }
}

/// A message attached to a region of the source.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Diagnostic {
    pub span: Span,
    pub position: Position,
    pub severity: Severity,
    pub message: String,
}

pub trait OutputSink {
    fn add(&mut self, text: StyledText);
    fn newline(&mut self);
    fn clear(&mut self);
}

pub trait DiagnosticSink {
    fn add(&mut self, diagnostic: Diagnostic);
    fn clear(&mut self);
}

pub trait ErrorSink {
    fn add(&mut self, message: String);
    fn clear(&mut self);
    fn has_any(&self) -> bool;
}

pub trait TextStyle {
    fn marked(&self, text: &str) -> String;
    fn light(&self, text: &str) -> String;
}

pub struct Frontend {
    pub output: Box<dyn OutputSink>,
    pub diagnostics: Box<dyn DiagnosticSink>,
    pub errors: Box<dyn ErrorSink>,
    pub style: Box<dyn TextStyle>,
}

impl Frontend {
    /// A frontend that discards everything and styles nothing.
    pub fn silent() -> Self {
        Self {
            output: Box::new(Discard),
            diagnostics: Box::new(Discard),
            errors: Box::new(Discard),
            style: Box::new(PlainStyle),
        }
    }

    pub fn marked(&self, text: &str) -> String {
        self.style.marked(text)
    }

    pub fn light(&self, text: &str) -> String {
        self.style.light(text)
    }

    /// Reports a failure to both the error list and the diagnostics sink.
    pub fn report(&mut self, message: String, diagnostic: Diagnostic) {
        self.errors.add(message);
        self.diagnostics.add(diagnostic);
    }

    pub fn clear(&mut self) {
        self.output.clear();
        self.diagnostics.clear();
        self.errors.clear();
    }
}

impl Default for Frontend {
    fn default() -> Self {
        Self::silent()
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct Discard;

impl OutputSink for Discard {
    fn add(&mut self, _text: StyledText) {}
    fn newline(&mut self) {}
    fn clear(&mut self) {}
}

impl DiagnosticSink for Discard {
    fn add(&mut self, _diagnostic: Diagnostic) {}
    fn clear(&mut self) {}
}

impl ErrorSink for Discard {
    fn add(&mut self, _message: String) {}
    fn clear(&mut self) {}
    fn has_any(&self) -> bool {
        false
    }
}

/// Leaves text untouched.
#[derive(Clone, Copy, Debug, Default)]
pub struct PlainStyle;

impl TextStyle for PlainStyle {
    fn marked(&self, text: &str) -> String {
        text.to_string()
    }

    fn light(&self, text: &str) -> String {
        text.to_string()
    }
}

#[derive(Debug, Default)]
struct Captured {
    output: String,
    pieces: Vec<StyledText>,
    diagnostics: Vec<Diagnostic>,
    errors: Vec<String>,
}

/// Records everything reported to it. Cloning shares the underlying buffers, so
/// a test can keep one handle while the runner owns the frontend built from another.
#[derive(Clone, Debug, Default)]
pub struct Capture {
    state: Rc<RefCell<Captured>>,
}

impl Capture {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frontend(&self) -> Frontend {
        Frontend {
            output: Box::new(self.clone()),
            diagnostics: Box::new(self.clone()),
            errors: Box::new(self.clone()),
            style: Box::new(PlainStyle),
        }
    }

    /// Everything written to the output sink, newlines included.
    pub fn output(&self) -> String {
        self.state.borrow().output.clone()
    }

    pub fn pieces(&self) -> Vec<StyledText> {
        self.state.borrow().pieces.clone()
    }

    pub fn errors(&self) -> Vec<String> {
        self.state.borrow().errors.clone()
    }

    /// The error list joined into one string, the way a single error pane shows it.
    pub fn error_text(&self) -> String {
        self.state.borrow().errors.join("\n")
    }

    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.state.borrow().diagnostics.clone()
    }
}

impl OutputSink for Capture {
    fn add(&mut self, text: StyledText) {
        let mut state = self.state.borrow_mut();
        state.output.push_str(&text.text);
        state.pieces.push(text);
    }

    fn newline(&mut self) {
        self.state.borrow_mut().output.push('\n');
    }

    fn clear(&mut self) {
        let mut state = self.state.borrow_mut();
        state.output.clear();
        state.pieces.clear();
    }
}

impl DiagnosticSink for Capture {
    fn add(&mut self, diagnostic: Diagnostic) {
        self.state.borrow_mut().diagnostics.push(diagnostic);
    }

    fn clear(&mut self) {
        self.state.borrow_mut().diagnostics.clear();
    }
}

impl ErrorSink for Capture {
    fn add(&mut self, message: String) {
        self.state.borrow_mut().errors.push(message);
    }

    fn clear(&mut self) {
        self.state.borrow_mut().errors.clear();
    }

    fn has_any(&self) -> bool {
        !self.state.borrow().errors.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capture_handles_share_buffers() {
        let capture = Capture::new();
        let mut frontend = capture.frontend();
        frontend.output.add(StyledText {
            text: "hello".into(),
            style: None,
        });
        frontend.output.newline();
        frontend.errors.add("boom".into());
        assert_eq!(capture.output(), "hello\n");
        assert!(frontend.errors.has_any());
        frontend.clear();
        assert_eq!(capture.output(), "");
        assert!(capture.errors().is_empty());
    }
}
