//! Structural validation of block nesting.
//!
//! A single pass over the steps with a stack of open `If`/`Loop` frames. Every
//! violation is collected; validation never stops at the first one.

use std::ops::Range;

use codespan_reporting::diagnostic::{Diagnostic, Label};
use log::debug;

use crate::step::{Step, StepKind};

/// An open `If` or `Loop` block.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockFrame {
    pub kind: StepKind,
    pub line: usize,
    pub span: Range<usize>,
    pub has_else: bool,
}

impl BlockFrame {
    fn open(step: &Step) -> Self {
        BlockFrame {
            kind: step.kind(),
            line: step.line,
            span: step.span.clone(),
            has_else: false,
        }
    }

    /// "If" or "Loop".
    fn label(&self) -> &'static str {
        match self.kind {
            StepKind::Loop => "Loop",
            _ => "If",
        }
    }
}

/// A nesting violation.
#[derive(Debug, Clone, PartialEq)]
pub struct StructuralError {
    pub message: String,
    pub line: usize,
    pub span: Range<usize>,
    /// Opening line and span of the block this error conflicts with.
    pub opened: Option<(usize, Range<usize>)>,
}

impl StructuralError {
    fn at(step: &Step, message: impl Into<String>) -> Self {
        StructuralError {
            message: message.into(),
            line: step.line,
            span: step.span.clone(),
            opened: None,
        }
    }

    pub fn to_diagnostic(&self, file_id: usize) -> Diagnostic<usize> {
        let mut labels = vec![Label::primary(file_id, self.span.clone())];
        if let Some((line, span)) = &self.opened
            && *span != self.span
        {
            labels.push(Label::secondary(file_id, span.clone()).with_message(format!("block opened on line {}", line)));
        }
        Diagnostic::error().with_message(&self.message).with_labels(labels)
    }
}

impl std::fmt::Display for StructuralError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Line {}: {}", self.line, self.message)
    }
}

impl std::error::Error for StructuralError {}

/// Advisory finding that never blocks composition.
#[derive(Debug, Clone, PartialEq)]
pub struct Warning {
    /// 0 when the warning is not tied to a line.
    pub line: usize,
    pub message: String,
}

impl Warning {
    pub fn to_diagnostic(&self) -> Diagnostic<usize> {
        Diagnostic::warning().with_message(&self.message)
    }
}

impl std::fmt::Display for Warning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.line == 0 {
            f.write_str(&self.message)
        } else {
            write!(f, "Line {}: {}", self.line, self.message)
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationResult {
    pub errors: Vec<StructuralError>,
    pub warnings: Vec<Warning>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Check `If`/`Else If`/`Else`/`End If` and `Loop`/`Exit Loop If`/`End Loop` nesting.
///
/// A closer that meets the wrong kind of open block reports the mismatch and
/// leaves that block open.
pub fn validate(steps: &[Step]) -> ValidationResult {
    let mut result = ValidationResult::default();
    let mut stack: Vec<BlockFrame> = Vec::new();

    for step in steps {
        match step.kind() {
            StepKind::If | StepKind::Loop => stack.push(BlockFrame::open(step)),
            StepKind::ElseIf => match stack.last() {
                Some(top) if top.kind == StepKind::If => {
                    if top.has_else {
                        result.errors.push(
                            StructuralError::at(step, "Else If after Else (must come before Else)")
                                .opened_by(top),
                        );
                    }
                }
                _ => result.errors.push(StructuralError::at(step, "Else If without matching If")),
            },
            StepKind::Else => match stack.last_mut() {
                Some(top) if top.kind == StepKind::If => {
                    if top.has_else {
                        result.errors.push(
                            StructuralError::at(step, "Duplicate Else (only one Else per If block)").opened_by(top),
                        );
                    } else {
                        top.has_else = true;
                    }
                }
                _ => result.errors.push(StructuralError::at(step, "Else without matching If")),
            },
            StepKind::EndIf => close(&mut stack, step, StepKind::If, &mut result),
            StepKind::EndLoop => close(&mut stack, step, StepKind::Loop, &mut result),
            StepKind::ExitLoopIf => {
                if !stack.iter().any(|frame| frame.kind == StepKind::Loop) {
                    result.errors.push(StructuralError::at(step, "Exit Loop If outside of any Loop"));
                }
            }
            _ => {}
        }
    }

    for frame in stack {
        let label = frame.label();
        result.errors.push(StructuralError {
            message: format!("Unclosed {} (missing End {})", label, label),
            line: frame.line,
            span: frame.span.clone(),
            opened: Some((frame.line, frame.span)),
        });
    }

    if steps.is_empty() {
        result.warnings.push(Warning {
            line: 0,
            message: "No steps found (is the input empty?)".to_string(),
        });
    }

    debug!(
        "validated {} steps: {} errors, {} warnings",
        steps.len(),
        result.errors.len(),
        result.warnings.len()
    );
    result
}

fn close(stack: &mut Vec<BlockFrame>, step: &Step, expected: StepKind, result: &mut ValidationResult) {
    let Some(frame) = stack.last() else {
        let (closer_name, opener_name) = match expected {
            StepKind::Loop => ("End Loop", "Loop"),
            _ => ("End If", "If"),
        };
        result.errors.push(StructuralError::at(
            step,
            format!("Orphan {} (no matching {})", closer_name, opener_name),
        ));
        return;
    };

    if frame.kind == expected {
        stack.pop();
        return;
    }

    result.errors.push(
        StructuralError::at(
            step,
            format!(
                "{} found but current open block is {} (opened line {})",
                step.kind().keyword(),
                frame.label(),
                frame.line
            ),
        )
        .opened_by(frame),
    );
}

impl StructuralError {
    fn opened_by(mut self, frame: &BlockFrame) -> Self {
        self.opened = Some((frame.line, frame.span.clone()));
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    fn check(text: &str) -> ValidationResult {
        let (steps, errors) = parse(text);
        assert!(errors.is_empty(), "parse errors: {errors:?}");
        validate(&steps)
    }

    fn messages(result: &ValidationResult) -> Vec<String> {
        result.errors.iter().map(|e| e.to_string()).collect()
    }

    #[test]
    fn well_nested_blocks_are_valid() {
        let result = check(
            "If [ a ]\n  Loop\n    Exit Loop If [ b ]\n  End Loop\nElse If [ c ]\nElse\nEnd If",
        );
        assert!(result.is_valid(), "{:?}", result.errors);
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn mismatched_closer_leaves_block_open() {
        let result = check("If [ x = 1 ]\nEnd Loop");
        assert_eq!(
            messages(&result),
            vec![
                "Line 2: End Loop found but current open block is If (opened line 1)",
                "Line 1: Unclosed If (missing End If)",
            ]
        );
        assert_eq!(result.errors[0].opened.as_ref().map(|(line, _)| *line), Some(1));
    }

    #[test]
    fn end_if_inside_loop() {
        let result = check("If [ a ]\nLoop\nEnd If\nEnd Loop");
        assert_eq!(
            messages(&result),
            vec![
                "Line 3: End If found but current open block is Loop (opened line 2)",
                "Line 1: Unclosed If (missing End If)",
            ]
        );
    }

    #[test]
    fn block_skipped_by_wrong_closer_is_still_unclosed() {
        let result = check("Loop\nIf [ a ]\nEnd Loop\nHalt Script");
        assert_eq!(
            messages(&result),
            vec![
                "Line 3: End Loop found but current open block is If (opened line 2)",
                "Line 1: Unclosed Loop (missing End Loop)",
                "Line 2: Unclosed If (missing End If)",
            ]
        );
    }

    #[test]
    fn one_unclosed_error_per_open_frame() {
        let result = check("If [ a ]\nLoop\nIf [ b ]");
        assert_eq!(
            messages(&result),
            vec![
                "Line 1: Unclosed If (missing End If)",
                "Line 2: Unclosed Loop (missing End Loop)",
                "Line 3: Unclosed If (missing End If)",
            ]
        );
    }

    #[test]
    fn else_branches_after_else() {
        let result = check("If [ a ]\nElse\nElse If [ b ]\nElse\nEnd If");
        assert_eq!(
            messages(&result),
            vec![
                "Line 3: Else If after Else (must come before Else)",
                "Line 4: Duplicate Else (only one Else per If block)",
            ]
        );
    }

    #[test]
    fn orphans() {
        let result = check("Else If [ a ]\nElse\nEnd If\nEnd Loop\nExit Loop If [ 1 ]");
        assert_eq!(
            messages(&result),
            vec![
                "Line 1: Else If without matching If",
                "Line 2: Else without matching If",
                "Line 3: Orphan End If (no matching If)",
                "Line 4: Orphan End Loop (no matching Loop)",
                "Line 5: Exit Loop If outside of any Loop",
            ]
        );
    }

    #[test]
    fn else_inside_loop_inside_if_is_orphaned() {
        let result = check("If [ a ]\nLoop\nElse\nEnd Loop\nEnd If");
        assert_eq!(messages(&result), vec!["Line 3: Else without matching If"]);
    }

    #[test]
    fn exit_loop_if_may_sit_in_a_nested_if() {
        let result = check("Loop\nIf [ a ]\nExit Loop If [ 1 ]\nEnd If\nEnd Loop");
        assert!(result.is_valid());
    }

    #[test]
    fn disabled_steps_still_count() {
        let result = check("// If [ a ]");
        assert_eq!(messages(&result), vec!["Line 1: Unclosed If (missing End If)"]);
    }

    #[test]
    fn empty_input_only_warns() {
        let result = validate(&[]);
        assert!(result.is_valid());
        assert_eq!(result.warnings.len(), 1);
        assert_eq!(result.warnings[0].to_string(), "No steps found (is the input empty?)");
    }

    #[test]
    fn mismatch_diagnostic_points_at_opener() {
        let result = check("If [ x = 1 ]\nEnd Loop");
        let diagnostic = result.errors[0].to_diagnostic(0);
        assert_eq!(diagnostic.labels.len(), 2);
        assert_eq!(diagnostic.labels[1].range, 0..12);
    }
}
