//! Comments, conditionals, loops, dialogs and script control.

use fmscript::{Instruction, Toggle};
use roxmltree::Node;

use super::{calc_direct, calc_in, child, non_empty, own_text, state_of, text_of};
use crate::element::Element;

/// Dialogs always carry exactly this many button slots.
const BUTTON_SLOTS: usize = 3;

pub(crate) fn comment(text: &str) -> Vec<Element> {
    vec![Element::new("Text").text(text)]
}

pub(crate) fn show_custom_dialog(title: &str, message: &str, buttons: &[String]) -> Vec<Element> {
    let mut slots = Element::new("Buttons");
    for i in 0..BUTTON_SLOTS {
        match buttons.get(i).filter(|b| !b.is_empty()) {
            Some(button) => slots.push(Element::wrapped_calculation("Button", button)),
            None => slots.push(Element::new("Button")),
        }
    }
    vec![
        Element::wrapped_calculation("Title", title),
        Element::wrapped_calculation("Message", message),
        slots,
    ]
}

pub(crate) fn perform_script(script: &str, parameter: Option<&str>) -> Vec<Element> {
    let mut out = Vec::new();
    if let Some(param) = parameter {
        out.push(Element::calculation(param));
    }
    out.push(Element::new("Text").text(script));
    out
}

pub(crate) fn decode_comment(node: Node<'_, '_>) -> Instruction {
    Instruction::Comment {
        text: text_of(node, "Text").unwrap_or_default(),
    }
}

pub(crate) fn decode_set_error_capture(node: Node<'_, '_>) -> Instruction {
    Instruction::SetErrorCapture {
        state: Toggle::from(state_of(node, "Set")),
    }
}

pub(crate) fn decode_allow_user_abort(node: Node<'_, '_>) -> Instruction {
    Instruction::AllowUserAbort {
        state: Toggle::from(state_of(node, "Set")),
    }
}

fn condition(node: Node<'_, '_>) -> String {
    non_empty(calc_direct(node)).unwrap_or_else(|| "?".to_string())
}

pub(crate) fn decode_if(node: Node<'_, '_>) -> Instruction {
    Instruction::If { calc: condition(node) }
}

pub(crate) fn decode_else_if(node: Node<'_, '_>) -> Instruction {
    Instruction::ElseIf { calc: condition(node) }
}

pub(crate) fn decode_exit_loop_if(node: Node<'_, '_>) -> Instruction {
    Instruction::ExitLoopIf { calc: condition(node) }
}

pub(crate) fn decode_else(_: Node<'_, '_>) -> Instruction {
    Instruction::Else
}

pub(crate) fn decode_end_if(_: Node<'_, '_>) -> Instruction {
    Instruction::EndIf
}

pub(crate) fn decode_loop(_: Node<'_, '_>) -> Instruction {
    Instruction::Loop
}

pub(crate) fn decode_end_loop(_: Node<'_, '_>) -> Instruction {
    Instruction::EndLoop
}

pub(crate) fn decode_halt_script(_: Node<'_, '_>) -> Instruction {
    Instruction::HaltScript
}

/// Only button slots with calculation text are read back.
pub(crate) fn decode_show_custom_dialog(node: Node<'_, '_>) -> Instruction {
    let buttons = child(node, "Buttons")
        .map(|slots| {
            slots
                .children()
                .filter(|b| b.has_tag_name("Button"))
                .filter_map(|b| non_empty(calc_direct(b)))
                .collect()
        })
        .unwrap_or_default();

    Instruction::ShowCustomDialog {
        title: non_empty(calc_in(node, "Title")).unwrap_or_else(|| "\"\"".to_string()),
        message: non_empty(calc_in(node, "Message")).unwrap_or_else(|| "\"\"".to_string()),
        buttons,
    }
}

pub(crate) fn decode_exit_script(node: Node<'_, '_>) -> Instruction {
    Instruction::ExitScript {
        result: non_empty(calc_direct(node)),
    }
}

/// The script name comes from `<Script name>` when present, else from `<Text>`.
pub(crate) fn decode_perform_script(node: Node<'_, '_>) -> Instruction {
    let script = child(node, "Script")
        .and_then(|s| s.attribute("name"))
        .map(str::to_string)
        .filter(|s| !s.is_empty())
        .or_else(|| non_empty(child(node, "Text").map(own_text)))
        .unwrap_or_else(|| "?".to_string());

    Instruction::PerformScript {
        script,
        parameter: non_empty(calc_direct(node)),
    }
}
