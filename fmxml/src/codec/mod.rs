//! Per-kind mapping between [`Instruction`]s and `<Step>` elements.
//!
//! Encoding is an exhaustive match over the instruction; the registry row for
//! the instruction's kind supplies the `id` and `name` attributes. Decoding looks
//! the element's `(id, name)` up in the registry and hands the node to that
//! row's decode function.

pub(crate) mod control;
pub(crate) mod data;
pub(crate) mod llm;
pub(crate) mod records;
pub(crate) mod window;

use fmscript::{Instruction, Step};
use log::debug;
use roxmltree::Node;

use crate::element::{Element, flag};
use crate::registry;

/// A `<Step>` element read from a snippet.
#[derive(Debug, Clone, PartialEq)]
pub enum DecodedStep {
    Known(Step),
    /// An element whose `(id, name)` has no registry row. Rendered as `Name [id=N]`.
    Unrecognized { id: String, name: String, enabled: bool },
}

impl DecodedStep {
    pub fn enabled(&self) -> bool {
        match self {
            DecodedStep::Known(step) => step.enabled,
            DecodedStep::Unrecognized { enabled, .. } => *enabled,
        }
    }
}

/// Encode one step as a `<Step enable id name>` element.
pub fn encode(step: &Step) -> Element {
    let def = registry::def_for(step.kind());
    let mut element = Element::new("Step")
        .attr("enable", flag(step.enabled))
        .attr("id", def.id.to_string())
        .attr("name", def.name);
    for child in encode_body(&step.instruction) {
        element.push(child);
    }
    element
}

fn encode_body(instruction: &Instruction) -> Vec<Element> {
    match instruction {
        Instruction::Comment { text } => control::comment(text),
        Instruction::SetErrorCapture { state } | Instruction::AllowUserAbort { state } => {
            vec![Element::state("Set", state.is_on())]
        }
        Instruction::SetVariable { name, value, repetition } => {
            data::set_variable(name, value, repetition.as_deref())
        }
        Instruction::SetFieldByName { target, value } => data::set_field_by_name(target, value),
        Instruction::SetField { field, value } => data::set_field(field, value.as_deref()),
        Instruction::If { calc } | Instruction::ElseIf { calc } | Instruction::ExitLoopIf { calc } => {
            vec![Element::calculation(calc)]
        }
        Instruction::Else | Instruction::EndIf | Instruction::EndLoop => Vec::new(),
        Instruction::Loop => vec![Element::valued("FlushType", "Always")],
        Instruction::ShowCustomDialog { title, message, buttons } => {
            control::show_custom_dialog(title, message, buttons)
        }
        Instruction::ExitScript { result } => result.iter().map(|r| Element::calculation(r)).collect(),
        Instruction::CommitRecords { no_dialog } => records::commit_records(*no_dialog),
        Instruction::InsertFromUrl {
            target,
            url,
            curl,
            select_all,
            no_dialog,
            verify_ssl,
            dont_encode_url,
        } => data::insert_from_url(data::UrlRequest {
            target: target.as_deref(),
            url: url.as_deref(),
            curl: curl.as_deref(),
            select_all: *select_all,
            no_dialog: *no_dialog,
            verify_ssl: *verify_ssl,
            dont_encode_url: *dont_encode_url,
        }),
        Instruction::PerformScript { script, parameter } => {
            control::perform_script(script, parameter.as_deref())
        }
        Instruction::GoToLayout { layout } => records::go_to_layout(layout),
        Instruction::GoToRecord { direction } => records::go_to_record(direction),
        Instruction::NewRecord | Instruction::RefreshWindow | Instruction::HaltScript => Vec::new(),
        Instruction::EnterFindMode { pause } => records::enter_find_mode(*pause),
        Instruction::PerformFind => vec![Element::state("Restore", false)],
        Instruction::SortRecords { no_dialog } => records::sort_records(*no_dialog),
        Instruction::InsertText { select_all, target, text } => {
            data::insert_text(*select_all, target.as_deref(), text)
        }
        Instruction::NewWindow { name, layout, style } => {
            window::new_window(name.as_deref(), layout.as_deref(), style.as_deref())
        }
        Instruction::AdjustWindow { state } => vec![Element::valued("WindowState", state)],
        Instruction::ConfigureLlmTemplate { template, provider } => {
            llm::configure_llm_template(template.as_deref(), provider.as_deref())
        }
        Instruction::LlmRequest(request) => llm::llm_request(request),
    }
}

/// Decode one `<Step>` element.
pub fn decode(node: Node<'_, '_>) -> DecodedStep {
    let id = node.attribute("id").unwrap_or("");
    let name = node.attribute("name").unwrap_or("");
    let enabled = node.attribute("enable").unwrap_or("True") == "True";

    let Some(def) = id.parse::<u32>().ok().and_then(|id| registry::lookup(id, name)) else {
        debug!("no registry row for step id={} name={:?}", id, name);
        return DecodedStep::Unrecognized {
            id: id.to_string(),
            name: name.to_string(),
            enabled,
        };
    };

    let line = node.document().text_pos_at(node.range().start).row as usize;
    let mut step = Step::new((def.decode)(node), line, node.range(), name);
    step.enabled = enabled;
    DecodedStep::Known(step)
}

// ---------------------------------------------------------------------------
// Node helpers shared by the decoders
// ---------------------------------------------------------------------------

/// First direct child element named `tag`.
pub(crate) fn child<'a, 'input>(node: Node<'a, 'input>, tag: &str) -> Option<Node<'a, 'input>> {
    node.children().find(|c| c.is_element() && c.has_tag_name(tag))
}

/// All character data directly under `node` (CDATA included), trimmed.
pub(crate) fn own_text(node: Node<'_, '_>) -> String {
    node.children()
        .filter(|c| c.is_text())
        .filter_map(|c| c.text())
        .collect::<String>()
        .trim()
        .to_string()
}

/// Text of the child element `tag`, if that child exists.
pub(crate) fn text_of(node: Node<'_, '_>, tag: &str) -> Option<String> {
    child(node, tag).map(own_text)
}

/// `<Calculation>` directly under `node`.
pub(crate) fn calc_direct(node: Node<'_, '_>) -> Option<String> {
    text_of(node, "Calculation")
}

/// `<tag><Calculation>` under `node`.
pub(crate) fn calc_in(node: Node<'_, '_>, tag: &str) -> Option<String> {
    child(node, tag).and_then(calc_direct)
}

/// `state="True"` on the child element `tag`. Missing means false.
pub(crate) fn state_of(node: Node<'_, '_>, tag: &str) -> bool {
    attr_of(node, tag, "state").as_deref() == Some("True")
}

pub(crate) fn attr_of(node: Node<'_, '_>, tag: &str, attr: &str) -> Option<String> {
    child(node, tag)
        .and_then(|c| c.attribute(attr))
        .map(str::to_string)
}

pub(crate) fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}
