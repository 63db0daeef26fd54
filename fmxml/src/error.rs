//! Error types for the XML side.
use fmscript::{ParseError, ValidationResult};
use thiserror::Error;

/// Reading a clipboard snippet failed.
#[derive(Error, Debug)]
pub enum SnippetError {
    #[error("XML parse error: {0}")]
    Xml(#[from] roxmltree::Error),

    #[error("root element is <{0}>, expected <fmxmlsnippet>")]
    NotASnippet(String),
}

/// Composing script text into a snippet failed.
///
/// Recognition errors stop the pipeline before validation, so the two never mix.
#[derive(Error, Debug)]
pub enum ComposeError {
    #[error("{} unrecognized step(s)", .0.len())]
    Recognition(Vec<ParseError>),

    #[error("{} structural error(s)", .0.errors.len())]
    Structure(ValidationResult),
}
