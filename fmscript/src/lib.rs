pub mod parser;
pub mod step;
pub mod validate;

pub use parser::{ParseError, Parser, parse, parse_source};
pub use step::{FieldRef, Instruction, LayoutTarget, LlmRequest, RecordDirection, Step, StepKind, Toggle};
pub use validate::{BlockFrame, StructuralError, ValidationResult, Warning, validate};

/// A parsed script: the ordered steps of one source text.
#[derive(Debug, Clone)]
pub struct Script {
    /// Steps in source order, comments already coalesced.
    pub steps: Vec<Step>,
    /// The source file ID (for error reporting with codespan-reporting).
    pub source_id: usize,
}
