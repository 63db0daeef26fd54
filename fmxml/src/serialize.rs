//! The `<fmxmlsnippet>` envelope.

use fmscript::Step;
use log::debug;

use crate::codec::{self, DecodedStep};
use crate::element::Element;
use crate::error::SnippetError;

pub const SNIPPET_ROOT: &str = "fmxmlsnippet";

/// Wrap the encoded steps in `<fmxmlsnippet type="FMObjectList">`.
pub fn to_snippet(steps: &[Step]) -> String {
    let mut root = Element::new(SNIPPET_ROOT).attr("type", "FMObjectList");
    for step in steps {
        root.push(codec::encode(step));
    }
    root.to_string()
}

/// Parse a snippet and decode every `<Step>` element in document order.
pub fn read_snippet(xml: &str) -> Result<Vec<DecodedStep>, SnippetError> {
    let doc = roxmltree::Document::parse(xml)?;
    let root = doc.root_element();
    if !root.has_tag_name(SNIPPET_ROOT) {
        return Err(SnippetError::NotASnippet(root.tag_name().name().to_string()));
    }

    let steps: Vec<DecodedStep> = root
        .descendants()
        .filter(|node| node.is_element() && node.has_tag_name("Step"))
        .map(codec::decode)
        .collect();
    debug!("read {} steps from snippet", steps.len());
    Ok(steps)
}

/// True when `text` looks like clipboard XML rather than script text.
pub fn is_snippet(text: &str) -> bool {
    let text = text.trim_start();
    text.starts_with("<fmxmlsnippet") || text.starts_with("<?xml")
}

#[cfg(test)]
mod tests {
    use super::*;
    use fmscript::Instruction;

    #[test]
    fn envelope() {
        let steps = vec![Step::from(Instruction::Loop), Step::from(Instruction::EndLoop)];
        assert_eq!(
            to_snippet(&steps),
            "<fmxmlsnippet type=\"FMObjectList\">\
             <Step enable=\"True\" id=\"71\" name=\"Loop\"><FlushType value=\"Always\"></FlushType></Step>\
             <Step enable=\"True\" id=\"73\" name=\"End Loop\"></Step>\
             </fmxmlsnippet>"
        );
    }

    #[test]
    fn empty_envelope() {
        assert_eq!(to_snippet(&[]), r#"<fmxmlsnippet type="FMObjectList"></fmxmlsnippet>"#);
    }

    #[test]
    fn wrong_root_is_rejected() {
        let err = read_snippet("<FMObjectList></FMObjectList>").unwrap_err();
        assert!(matches!(err, SnippetError::NotASnippet(ref name) if name == "FMObjectList"));
    }

    #[test]
    fn malformed_xml_is_rejected() {
        assert!(matches!(read_snippet("<fmxmlsnippet>"), Err(SnippetError::Xml(_))));
    }

    #[test]
    fn reads_steps_in_order_and_keeps_lines() {
        let xml = "<?xml version=\"1.0\"?>\n<fmxmlsnippet type=\"FMObjectList\">\n\
                   <Step enable=\"True\" id=\"71\" name=\"Loop\"></Step>\n\
                   <Step enable=\"True\" id=\"73\" name=\"End Loop\"></Step>\n\
                   </fmxmlsnippet>";
        let steps = read_snippet(xml).unwrap();
        assert_eq!(steps.len(), 2);
        let DecodedStep::Known(end) = &steps[1] else {
            panic!("End Loop not decoded");
        };
        assert_eq!(end.instruction, Instruction::EndLoop);
        assert_eq!(end.line, 4);
    }

    #[test]
    fn detection() {
        assert!(is_snippet("  <fmxmlsnippet type=\"FMObjectList\">"));
        assert!(is_snippet("<?xml version=\"1.0\"?><fmxmlsnippet/>"));
        assert!(!is_snippet("# <fmxmlsnippet>"));
    }
}
