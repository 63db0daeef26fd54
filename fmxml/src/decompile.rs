//! Snippet XML back to indented script text.

use log::warn;

use crate::codec::DecodedStep;
use crate::error::SnippetError;
use crate::serialize::read_snippet;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecompileOptions {
    /// Spaces per nesting level.
    pub indent: usize,
}

impl Default for DecompileOptions {
    fn default() -> Self {
        DecompileOptions { indent: 4 }
    }
}

/// Decompile with four-space indentation.
pub fn decompile(xml: &str) -> Result<String, SnippetError> {
    decompile_with(xml, &DecompileOptions::default())
}

pub fn decompile_with(xml: &str, options: &DecompileOptions) -> Result<String, SnippetError> {
    let steps = read_snippet(xml)?;
    Ok(render(&steps, options))
}

/// Render decoded steps one line each (comments one line per text line).
///
/// `Else`, `Else If` and the closers step out one level before rendering; the
/// openers indent what follows. Unrecognized steps never change the level.
pub fn render(steps: &[DecodedStep], options: &DecompileOptions) -> String {
    let mut lines = Vec::new();
    let mut level = 0usize;

    for decoded in steps {
        let enabled = decoded.enabled();
        match decoded {
            DecodedStep::Known(step) => {
                let kind = step.kind();
                if kind.closes_block() {
                    level = level.saturating_sub(1);
                }
                let prefix = line_prefix(level, options, enabled);
                for text in step.instruction.to_string().split('\n') {
                    lines.push(format!("{}{}", prefix, text));
                }
                if kind.opens_block() {
                    level += 1;
                }
            }
            DecodedStep::Unrecognized { id, name, .. } => {
                warn!("unrecognized step {:?} (id {}), kept as a placeholder", name, id);
                lines.push(format!("{}{} [id={}]", line_prefix(level, options, enabled), name, id));
            }
        }
    }

    lines.join("\n")
}

fn line_prefix(level: usize, options: &DecompileOptions, enabled: bool) -> String {
    let mut prefix = " ".repeat(level * options.indent);
    if !enabled {
        prefix.push_str("// ");
    }
    prefix
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snippet(body: &str) -> String {
        format!(r#"<fmxmlsnippet type="FMObjectList">{}</fmxmlsnippet>"#, body)
    }

    #[test]
    fn nested_blocks_indent() {
        let xml = snippet(
            r#"<Step enable="True" id="68" name="If"><Calculation><![CDATA[$a]]></Calculation></Step>
<Step enable="True" id="71" name="Loop"></Step>
<Step enable="True" id="72" name="Exit Loop If"><Calculation><![CDATA[$i > 3]]></Calculation></Step>
<Step enable="True" id="73" name="End Loop"></Step>
<Step enable="True" id="125" name="Else If"><Calculation><![CDATA[$b]]></Calculation></Step>
<Step enable="True" id="90" name="Halt Script"></Step>
<Step enable="True" id="69" name="Else"></Step>
<Step enable="True" id="70" name="End If"></Step>"#,
        );
        assert_eq!(
            decompile(&xml).unwrap(),
            "If [ $a ]\n    Loop\n        Exit Loop If [ $i > 3 ]\n    End Loop\nElse If [ $b ]\n    Halt Script\nElse\nEnd If"
        );
    }

    #[test]
    fn disabled_marker_follows_indent() {
        let xml = snippet(
            r#"<Step enable="True" id="71" name="Loop"></Step><Step enable="False" id="90" name="Halt Script"></Step><Step enable="True" id="73" name="End Loop"></Step>"#,
        );
        assert_eq!(decompile(&xml).unwrap(), "Loop\n    // Halt Script\nEnd Loop");
    }

    #[test]
    fn multi_line_comment_expands() {
        let xml = snippet(r##"<Step enable="True" id="89" name="# (comment)"><Text>a&#10;b&#10;c</Text></Step>"##);
        assert_eq!(decompile(&xml).unwrap(), "# a\n# b\n# c");
    }

    #[test]
    fn unrecognized_steps_render_placeholder_without_indent_change() {
        let xml = snippet(
            r#"<Step enable="True" id="71" name="Loop"></Step><Step enable="True" id="93" name="Beep"></Step><Step enable="True" id="73" name="End Loop"></Step>"#,
        );
        assert_eq!(decompile(&xml).unwrap(), "Loop\n    Beep [id=93]\nEnd Loop");
    }

    #[test]
    fn record_location_without_keyword_is_not_rewritten() {
        let xml = snippet(
            r#"<Step enable="True" id="16" name="Go to Record/Request/Page"><RowPageLocation value="ByCalculation"></RowPageLocation></Step>"#,
        );
        assert_eq!(decompile(&xml).unwrap(), "Go to Record/Request/Page [ ByCalculation ]");
    }

    #[test]
    fn stray_closers_floor_at_zero() {
        let xml = snippet(r#"<Step enable="True" id="70" name="End If"></Step><Step enable="True" id="90" name="Halt Script"></Step>"#);
        assert_eq!(decompile(&xml).unwrap(), "End If\nHalt Script");
    }

    #[test]
    fn custom_indent() {
        let xml = snippet(
            r#"<Step enable="True" id="71" name="Loop"></Step><Step enable="True" id="80" name="Refresh Window"></Step><Step enable="True" id="73" name="End Loop"></Step>"#,
        );
        let text = decompile_with(&xml, &DecompileOptions { indent: 2 }).unwrap();
        assert_eq!(text, "Loop\n  Refresh Window\nEnd Loop");
    }

    #[test]
    fn empty_snippet() {
        assert_eq!(decompile(&snippet("")).unwrap(), "");
    }

    #[test]
    fn not_xml() {
        assert!(decompile("If [ 1 ]").is_err());
    }
}
