//! The instruction registry: kind ↔ FileMaker step id, display name and decoder.

use fmscript::{Instruction, StepKind};
use roxmltree::Node;

use crate::codec::{control, data, llm, records, window};

pub type DecodeFn = fn(Node<'_, '_>) -> Instruction;

/// One registry row.
#[derive(Debug, Clone, Copy)]
pub struct StepDef {
    pub kind: StepKind,
    pub id: u32,
    /// The `name` attribute FileMaker writes for this step.
    pub name: &'static str,
    /// When set, an element only decodes as this kind if its `name` matches exactly.
    pub match_name: bool,
    pub decode: DecodeFn,
}

const fn def(kind: StepKind, id: u32, name: &'static str, match_name: bool, decode: DecodeFn) -> StepDef {
    StepDef {
        kind,
        id,
        name,
        match_name,
        decode,
    }
}

/// Rows in [`StepKind::ALL`] order, so a kind's discriminant indexes its row.
pub static REGISTRY: [StepDef; 31] = [
    def(StepKind::Comment, 89, "# (comment)", false, control::decode_comment),
    def(StepKind::SetErrorCapture, 86, "Set Error Capture", false, control::decode_set_error_capture),
    def(StepKind::AllowUserAbort, 85, "Allow User Abort", false, control::decode_allow_user_abort),
    def(StepKind::SetVariable, 141, "Set Variable", false, data::decode_set_variable),
    def(StepKind::SetFieldByName, 147, "Set Field By Name", false, data::decode_set_field_by_name),
    def(StepKind::SetField, 76, "Set Field", false, data::decode_set_field),
    def(StepKind::If, 68, "If", false, control::decode_if),
    def(StepKind::ElseIf, 125, "Else If", true, control::decode_else_if),
    def(StepKind::Else, 69, "Else", false, control::decode_else),
    def(StepKind::EndIf, 70, "End If", true, control::decode_end_if),
    def(StepKind::Loop, 71, "Loop", true, control::decode_loop),
    def(StepKind::ExitLoopIf, 72, "Exit Loop If", false, control::decode_exit_loop_if),
    def(StepKind::EndLoop, 73, "End Loop", false, control::decode_end_loop),
    def(StepKind::ShowCustomDialog, 87, "Show Custom Dialog", false, control::decode_show_custom_dialog),
    def(StepKind::ExitScript, 103, "Exit Script", false, control::decode_exit_script),
    def(StepKind::CommitRecords, 75, "Commit Records/Requests", false, records::decode_commit_records),
    def(StepKind::InsertFromUrl, 160, "Insert from URL", false, data::decode_insert_from_url),
    def(StepKind::PerformScript, 1, "Perform Script", false, control::decode_perform_script),
    def(StepKind::GoToLayout, 6, "Go to Layout", false, records::decode_go_to_layout),
    def(StepKind::GoToRecord, 16, "Go to Record/Request/Page", false, records::decode_go_to_record),
    def(StepKind::NewRecord, 7, "New Record/Request", true, records::decode_new_record),
    def(StepKind::EnterFindMode, 22, "Enter Find Mode", false, records::decode_enter_find_mode),
    def(StepKind::PerformFind, 28, "Perform Find", false, records::decode_perform_find),
    def(StepKind::SortRecords, 39, "Sort Records", false, records::decode_sort_records),
    def(StepKind::InsertText, 61, "Insert Text", false, data::decode_insert_text),
    def(StepKind::NewWindow, 122, "New Window", false, window::decode_new_window),
    def(StepKind::AdjustWindow, 31, "Adjust Window", false, window::decode_adjust_window),
    def(StepKind::RefreshWindow, 80, "Refresh Window", false, window::decode_refresh_window),
    def(StepKind::HaltScript, 90, "Halt Script", false, control::decode_halt_script),
    def(
        StepKind::ConfigureLlmTemplate,
        226,
        "Configure LLM Template",
        false,
        llm::decode_configure_llm_template,
    ),
    def(StepKind::LlmRequest, 214, "LLM Request", false, llm::decode_llm_request),
];

/// The registry row for `kind`.
pub fn def_for(kind: StepKind) -> &'static StepDef {
    &REGISTRY[kind as usize]
}

/// Find the row an element with this `id` and `name` decodes as.
pub fn lookup(id: u32, name: &str) -> Option<&'static StepDef> {
    REGISTRY
        .iter()
        .find(|def| def.id == id && (!def.match_name || def.name == name))
}
