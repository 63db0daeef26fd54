use std::ops::Range;

use crate::parser::delimiters::count_delimiters;

/// One statement after continuation lines have been folded together.
#[derive(Debug, Clone, PartialEq)]
pub struct LogicalLine {
    /// Trimmed physical lines joined with single spaces.
    pub text: String,
    /// 1-based line number of the first physical line.
    pub line: usize,
    /// Byte span from the first to the last non-blank character.
    pub span: Range<usize>,
}

/// Folds raw source lines into logical lines.
///
/// A statement whose `(` or `[` stay open continues onto following lines, blank or
/// not, until both depths drop to zero. Input ending inside an open statement flushes
/// whatever was collected.
pub struct LineAccumulator<'a> {
    lines: std::iter::Enumerate<std::str::Split<'a, char>>,
    offset: usize,
}

impl<'a> LineAccumulator<'a> {
    pub fn new(source: &'a str) -> Self {
        LineAccumulator {
            lines: source.split('\n').enumerate(),
            offset: 0,
        }
    }

    /// Next physical line with its 1-based number and trimmed byte span.
    fn next_raw(&mut self) -> Option<(usize, &'a str, Range<usize>)> {
        let (index, raw) = self.lines.next()?;
        let start = self.offset;
        self.offset += raw.len() + 1;

        let trimmed = raw.trim();
        let lead = raw.len() - raw.trim_start().len();
        let span = start + lead..start + lead + trimmed.len();
        Some((index + 1, trimmed, span))
    }
}

impl Iterator for LineAccumulator<'_> {
    type Item = LogicalLine;

    fn next(&mut self) -> Option<LogicalLine> {
        // Skip blank lines between statements
        let (line, first, first_span) = loop {
            let (line, text, span) = self.next_raw()?;
            if !text.is_empty() {
                break (line, text, span);
            }
        };

        let mut parts = vec![first];
        let mut span = first_span;
        let mut depth = count_delimiters(first);

        while !depth.is_balanced() {
            let Some((_, text, line_span)) = self.next_raw() else {
                break;
            };
            depth.add(count_delimiters(text));
            if !text.is_empty() {
                parts.push(text);
                span.end = line_span.end;
            }
        }

        Some(LogicalLine {
            text: parts.join(" "),
            line,
            span,
        })
    }
}
