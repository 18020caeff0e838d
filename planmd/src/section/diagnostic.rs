use std::ops::Range;

use codespan_reporting::diagnostic::{Diagnostic, Label, Severity};

/// A section-level problem with source location information.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionWarning {
    pub message: String,
    pub span: Range<usize>,
    pub file_id: usize,
    pub notes: Vec<String>,
}

impl SectionWarning {
    pub fn new(message: impl Into<String>, span: Range<usize>, file_id: usize) -> Self {
        SectionWarning {
            message: message.into(),
            span,
            file_id,
            notes: Vec::new(),
        }
    }

    pub fn duplicate(title: &str, span: Range<usize>, first_line: usize, file_id: usize) -> Self {
        SectionWarning::new(format!("duplicate section title '{}'", title), span, file_id)
            .with_note(format!("first defined on line {}", first_line))
            .with_note("sections sharing a title share lock state and edit time")
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    /// Convert to a codespan-reporting Diagnostic for display.
    pub fn to_diagnostic(&self) -> Diagnostic<usize> {
        Diagnostic::new(Severity::Warning)
            .with_message(&self.message)
            .with_labels(vec![Label::primary(self.file_id, self.span.clone())])
            .with_notes(self.notes.clone())
    }
}
