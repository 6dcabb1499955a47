use crate::frontend::Diagnostic as SourceNote;
use miette::{Diagnostic, NamedSource, Report, SourceSpan};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
#[error("{message}")]
pub struct SourceDiagnostic {
    #[source_code]
    src: NamedSource,
    #[label("{label}")]
    span: SourceSpan,
    #[help]
    help: Option<String>,
    message: String,
    label: String,
}

impl SourceDiagnostic {
    /// `message` is the full error-list text; the note's own message becomes the
    /// label under the source excerpt.
    pub fn from_note(src: NamedSource, note: &SourceNote, message: String) -> Self {
        Self {
            src,
            span: note.span.to_source_span(),
            help: help_for(&note.message),
            message,
            label: note.message.clone(),
        }
    }
}

fn help_for(label: &str) -> Option<String> {
    if label.starts_with("undefined symbol") {
        Some("declare it with `Def` or `Let` in this block or an enclosing one".into())
    } else if label.contains("cannot shadow") {
        Some("use a different name, or declare it in a nested block".into())
    } else if label.contains("before declaration") {
        Some("move the use after the statement that declares it".into())
    } else {
        None
    }
}

/// Renders each note with a source excerpt. `messages` pairs up with `notes`
/// where available; notes without a matching message fall back to their label.
pub fn emit_diagnostics(path: &Path, source: &str, notes: &[SourceNote], messages: &[String]) {
    let name = path.display().to_string();
    for (idx, note) in notes.iter().enumerate() {
        let src = NamedSource::new(&name, source.to_string());
        let message = messages
            .get(idx)
            .cloned()
            .unwrap_or_else(|| format!("{}: {}", note.severity, note.message));
        let diagnostic = SourceDiagnostic::from_note(src, note, message);
        eprintln!("{:?}", Report::new(diagnostic));
    }
}

pub fn report_runtime_error(path: &Path, error: &str) {
    eprintln!("Runtime error in {}: {}", path.display(), error);
}

pub fn report_io_error(path: &Path, error: &std::io::Error) {
    eprintln!("Failed to access {}: {}", path.display(), error);
}
