use fmscript::Instruction;
use roxmltree::Node;

use super::{attr_of, calc_in, non_empty};
use crate::element::Element;

pub(crate) fn new_window(name: Option<&str>, layout: Option<&str>, style: Option<&str>) -> Vec<Element> {
    let mut out = Vec::new();
    if let Some(name) = name {
        out.push(Element::wrapped_calculation("Name", name));
    }
    if let Some(layout) = layout {
        out.push(Element::new("Layout").attr("id", "0").attr("name", layout));
    }
    if let Some(style) = style {
        out.push(Element::new("NewWndStyles").attr("Style", style));
    }
    out
}

pub(crate) fn decode_new_window(node: Node<'_, '_>) -> Instruction {
    Instruction::NewWindow {
        name: non_empty(calc_in(node, "Name")),
        layout: non_empty(attr_of(node, "Layout", "name")),
        style: non_empty(attr_of(node, "NewWndStyles", "Style")),
    }
}

pub(crate) fn decode_adjust_window(node: Node<'_, '_>) -> Instruction {
    Instruction::AdjustWindow {
        state: non_empty(attr_of(node, "WindowState", "value")).unwrap_or_else(|| "?".to_string()),
    }
}

pub(crate) fn decode_refresh_window(_: Node<'_, '_>) -> Instruction {
    Instruction::RefreshWindow
}

#[cfg(test)]
mod tests {
    use super::super::test_support::round_trip;
    use super::*;

    #[test]
    fn new_window_round_trips() {
        let ins = Instruction::NewWindow {
            name: Some("\"Detail \" & $id".into()),
            layout: Some("Customer Detail".into()),
            style: Some("Card".into()),
        };
        assert_eq!(round_trip(ins.clone()), ins);
    }

    #[test]
    fn bare_new_window() {
        let ins = Instruction::NewWindow { name: None, layout: None, style: None };
        assert_eq!(round_trip(ins.clone()), ins);
    }

    #[test]
    fn adjust_window_state() {
        let ins = Instruction::AdjustWindow { state: "Maximize".into() };
        assert_eq!(round_trip(ins.clone()), ins);
    }
}
