//! Record, found set and layout navigation steps.

use fmscript::{Instruction, LayoutTarget, RecordDirection};
use log::warn;
use roxmltree::Node;

use super::{attr_of, non_empty, state_of};
use crate::element::Element;

pub(crate) fn commit_records(no_dialog: bool) -> Vec<Element> {
    if no_dialog {
        vec![Element::state("NoInteract", true)]
    } else {
        Vec::new()
    }
}

pub(crate) fn go_to_layout(layout: &LayoutTarget) -> Vec<Element> {
    let (destination, name) = match layout {
        LayoutTarget::Original => ("OriginalLayout", ""),
        LayoutTarget::Current => ("CurrentLayout", ""),
        LayoutTarget::Named(name) => ("ByName", name.as_str()),
    };
    vec![
        Element::valued("LayoutDestination", destination),
        Element::new("Layout").attr("id", "0").attr("name", name),
    ]
}

pub(crate) fn go_to_record(direction: &RecordDirection) -> Vec<Element> {
    vec![
        Element::valued("RowPageLocation", direction.as_str()),
        Element::state("NoInteract", false),
    ]
}

pub(crate) fn enter_find_mode(pause: bool) -> Vec<Element> {
    vec![Element::state("Pause", pause), Element::state("Restore", false)]
}

pub(crate) fn sort_records(no_dialog: bool) -> Vec<Element> {
    vec![Element::state("NoInteract", no_dialog), Element::state("Restore", false)]
}

pub(crate) fn decode_commit_records(node: Node<'_, '_>) -> Instruction {
    Instruction::CommitRecords {
        no_dialog: state_of(node, "NoInteract"),
    }
}

pub(crate) fn decode_go_to_layout(node: Node<'_, '_>) -> Instruction {
    let destination = attr_of(node, "LayoutDestination", "value");
    let layout = match non_empty(attr_of(node, "Layout", "name")) {
        _ if destination.as_deref() == Some("OriginalLayout") => LayoutTarget::Original,
        Some(name) => LayoutTarget::Named(name),
        None => LayoutTarget::Current,
    };
    Instruction::GoToLayout { layout }
}

pub(crate) fn decode_go_to_record(node: Node<'_, '_>) -> Instruction {
    let value = attr_of(node, "RowPageLocation", "value").unwrap_or_default();
    let direction = RecordDirection::parse(&value).unwrap_or_else(|| {
        // By Calculation and similar options have no script keyword
        warn!("record location {:?} has no script form, keeping it as is", value);
        RecordDirection::Other(value)
    });
    Instruction::GoToRecord { direction }
}

pub(crate) fn decode_new_record(_: Node<'_, '_>) -> Instruction {
    Instruction::NewRecord
}

pub(crate) fn decode_enter_find_mode(node: Node<'_, '_>) -> Instruction {
    Instruction::EnterFindMode {
        pause: state_of(node, "Pause"),
    }
}

pub(crate) fn decode_perform_find(_: Node<'_, '_>) -> Instruction {
    Instruction::PerformFind
}

pub(crate) fn decode_sort_records(node: Node<'_, '_>) -> Instruction {
    Instruction::SortRecords {
        no_dialog: state_of(node, "NoInteract"),
    }
}
