mod coalesce;
pub mod delimiters;
pub mod error;
mod grammar;
pub mod lines;

pub use coalesce::coalesce_comments;
pub use error::ParseError;
pub use grammar::{GrammarError, match_instruction};
pub use lines::{LineAccumulator, LogicalLine};

use log::debug;

use crate::Script;
use crate::step::Step;

/// Parser entry point.
pub struct Parser {
    source: String,
    file_id: usize,
}

impl Parser {
    pub fn new(source: String, file_id: usize) -> Self {
        Parser { source, file_id }
    }

    /// Parse the source text into a Script. Any unrecognized line fails the whole parse.
    pub fn parse(&self) -> Result<Script, Vec<ParseError>> {
        let (steps, errors) = parse_source(&self.source, self.file_id);
        if !errors.is_empty() {
            return Err(errors);
        }
        Ok(Script {
            steps,
            source_id: self.file_id,
        })
    }
}

/// Parse script text into steps, collecting every recognition error.
///
/// Never fails outright: each logical line yields a step, nothing (blank or a bare
/// `//`), or one error. Adjacent comments are merged afterwards.
pub fn parse(text: &str) -> (Vec<Step>, Vec<ParseError>) {
    parse_source(text, 0)
}

/// Same as [`parse`], with diagnostics labelled against `file_id`.
pub fn parse_source(text: &str, file_id: usize) -> (Vec<Step>, Vec<ParseError>) {
    let mut steps = Vec::new();
    let mut errors = Vec::new();

    for line in LineAccumulator::new(text) {
        match recognize(&line, file_id) {
            Ok(Some(step)) => steps.push(step),
            Ok(None) => {}
            Err(err) => errors.push(err),
        }
    }

    let steps = coalesce_comments(steps);
    debug!("parsed {} steps, {} errors", steps.len(), errors.len());
    (steps, errors)
}

/// Recognize one logical line.
///
/// Leading `// ` markers disable the step; any number of them are stripped
/// before the remainder is recognized once.
pub fn recognize(line: &LogicalLine, file_id: usize) -> Result<Option<Step>, ParseError> {
    let mut text = line.text.trim();
    let mut enabled = true;
    while let Some(rest) = strip_disable_marker(text) {
        enabled = false;
        text = rest.trim_start();
    }
    if text.is_empty() {
        return Ok(None);
    }

    match match_instruction(text) {
        Ok(instruction) => {
            let mut step = Step::new(instruction, line.line, line.span.clone(), line.text.clone());
            step.enabled = enabled;
            Ok(Some(step))
        }
        Err(GrammarError::Unrecognized) => Err(ParseError::unrecognized(line, file_id)),
        Err(GrammarError::Malformed { kind, reason }) => Err(ParseError::on_line(
            line,
            format!("Malformed {} step: {}", kind, reason),
            file_id,
        )
        .with_note(format!("in `{}`", line.text))),
    }
}

/// `//` alone or followed by whitespace. `//x` is not a marker.
fn strip_disable_marker(text: &str) -> Option<&str> {
    let rest = text.strip_prefix("//")?;
    if rest.is_empty() || rest.starts_with(char::is_whitespace) {
        Some(rest)
    } else {
        None
    }
}
