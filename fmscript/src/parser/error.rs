use std::fmt;
use std::ops::Range;

use codespan_reporting::diagnostic::{Diagnostic, Label, Severity};

use crate::parser::lines::LogicalLine;

/// A logical line that could not be turned into a step.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    pub message: String,
    /// 1-based line on which the logical line began.
    pub line: usize,
    /// The offending logical line.
    pub text: String,
    pub span: Range<usize>,
    pub file_id: usize,
    pub severity: Severity,
    pub notes: Vec<String>,
}

impl ParseError {
    /// An error covering the whole logical line.
    pub fn on_line(source: &LogicalLine, message: impl Into<String>, file_id: usize) -> Self {
        ParseError {
            message: message.into(),
            line: source.line,
            text: source.text.clone(),
            span: source.span.clone(),
            file_id,
            severity: Severity::Error,
            notes: Vec::new(),
        }
    }

    pub fn unrecognized(source: &LogicalLine, file_id: usize) -> Self {
        ParseError::on_line(source, format!("Unrecognized step: {}", source.text), file_id)
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    pub fn to_diagnostic(&self) -> Diagnostic<usize> {
        let label = Label::primary(self.file_id, self.span.clone()).with_message(format!("line {}", self.line));
        Diagnostic::new(self.severity)
            .with_message(&self.message)
            .with_labels(vec![label])
            .with_notes(self.notes.clone())
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Line {}: {}", self.line, self.message)
    }
}

impl std::error::Error for ParseError {}
