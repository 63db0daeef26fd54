use crate::step::{Instruction, Step};

/// Merge runs of adjacent comment steps into one multi-line comment.
///
/// Only comments with the same enabled state merge. The merged step keeps the first
/// comment's line and its span grows to cover the last one.
pub fn coalesce_comments(steps: Vec<Step>) -> Vec<Step> {
    let mut merged: Vec<Step> = Vec::with_capacity(steps.len());

    for step in steps {
        if let Some(prev) = merged.last_mut()
            && prev.enabled == step.enabled
            && let (Instruction::Comment { text: prev_text }, Instruction::Comment { text }) =
                (&mut prev.instruction, &step.instruction)
        {
            prev_text.push('\n');
            prev_text.push_str(text);
            prev.raw.push('\n');
            prev.raw.push_str(&step.raw);
            prev.span.end = step.span.end;
            continue;
        }
        merged.push(step);
    }

    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    fn comment_text(step: &Step) -> &str {
        match &step.instruction {
            Instruction::Comment { text } => text,
            other => panic!("expected comment, got {other:?}"),
        }
    }

    #[test]
    fn adjacent_comments_merge() {
        let (steps, _) = parse("# one\n# two\n#\n# four\nLoop");
        assert_eq!(steps.len(), 2);
        assert_eq!(comment_text(&steps[0]), "one\ntwo\n\nfour");
        assert_eq!(steps[0].line, 1);
        assert_eq!(steps[0].span, 0..20);
    }

    #[test]
    fn blank_lines_do_not_separate_comments() {
        let (steps, _) = parse("# a\n\n# b");
        assert_eq!(steps.len(), 1);
    }

    #[test]
    fn a_step_between_comments_separates_them() {
        let (steps, _) = parse("# a\nLoop\n# b");
        assert_eq!(steps.len(), 3);
    }

    #[test]
    fn disabled_comments_do_not_merge_with_enabled_ones() {
        let (steps, _) = parse("# a\n// # b\n// # c");
        assert_eq!(steps.len(), 2);
        assert!(!steps[1].enabled);
        assert_eq!(comment_text(&steps[1]), "b\nc");
    }
}
