//! Step grammar.
//!
//! Each rule pairs a case-insensitive, anchored regex over a whole logical line
//! with a builder that turns the captures into an [`Instruction`]. Rules are tried
//! in declaration order; the first matching pattern owns the line, so a builder
//! rejecting its parameters is reported as a malformed step rather than falling
//! through to later rules.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use crate::parser::delimiters::split_params;
use crate::step::{FieldRef, Instruction, LayoutTarget, LlmRequest, RecordDirection, StepKind, Toggle};

type Build = fn(&Captures<'_>) -> Result<Instruction, String>;

/// Why a logical line produced no instruction.
#[derive(Debug, Clone, PartialEq)]
pub enum GrammarError {
    /// No rule matched.
    Unrecognized,
    /// A rule matched but its parameters are unusable.
    Malformed { kind: StepKind, reason: String },
}

/// Grammar rules as (kind, pattern, builder), in match order.
///
/// `Set Field By Name` precedes `Set Field`, `Else If` precedes `Else`, and every
/// bracket group is matched lazily up to the final `]` so nested brackets inside
/// calculations survive.
const GRAMMAR_PATTERNS: &[(StepKind, &str, Build)] = &[
    (StepKind::SetErrorCapture, r"^Set Error Capture\s*\[\s*(On|Off)\s*\]$", set_error_capture),
    (StepKind::AllowUserAbort, r"^Allow User Abort\s*\[\s*(On|Off)\s*\]$", allow_user_abort),
    (
        StepKind::SetVariable,
        r"^Set Variable\s*\[\s*(\${1,2}[\w.]+)(?:\s*\[\s*(.+?)\s*\])?\s*;\s*Value:\s*(.+?)\s*\]$",
        set_variable,
    ),
    (StepKind::SetFieldByName, r"^Set Field By Name\s*\[\s*(.+?)\s*\]$", set_field_by_name),
    (StepKind::SetField, r"^Set Field\s*\[\s*(.+?)\s*\]$", set_field),
    (StepKind::If, r"^If\s*\[\s*(.+?)\s*\]$", if_step),
    (StepKind::ElseIf, r"^Else If\s*\[\s*(.+?)\s*\]$", else_if),
    (StepKind::Else, r"^Else$", else_step),
    (StepKind::EndIf, r"^End If$", end_if),
    (StepKind::Loop, r"^Loop$", loop_step),
    (StepKind::ExitLoopIf, r"^Exit Loop If\s*\[\s*(.+?)\s*\]$", exit_loop_if),
    (StepKind::EndLoop, r"^End Loop$", end_loop),
    (StepKind::ShowCustomDialog, r"^Show Custom Dialog\s*\[\s*(.+?)\s*\]$", show_custom_dialog),
    (StepKind::ExitScript, r"^Exit Script\s*(?:\[\s*(.*?)\s*\])?$", exit_script),
    (StepKind::CommitRecords, r"^Commit Records(?:/Requests)?\s*(?:\[\s*(.*?)\s*\])?$", commit_records),
    (StepKind::PerformScript, r"^Perform Script\s*\[\s*(.+?)\s*\]$", perform_script),
    (StepKind::GoToLayout, r"^Go to Layout\s*(?:\[\s*(.*?)\s*\])?$", go_to_layout),
    (StepKind::InsertFromUrl, r"^Insert from URL\s*(?:\[\s*(.*?)\s*\])?$", insert_from_url),
    (
        StepKind::GoToRecord,
        r"^Go to Record(?:/Request/Page)?\s*\[\s*(First|Last|Next|Previous)\s*\]$",
        go_to_record,
    ),
    (StepKind::NewRecord, r"^New Record(?:/Request)?$", new_record),
    (StepKind::EnterFindMode, r"^Enter Find Mode\s*(?:\[\s*(.*?)\s*\])?$", enter_find_mode),
    (StepKind::PerformFind, r"^Perform Find(?:\s*\[\s*\])?$", perform_find),
    (StepKind::SortRecords, r"^Sort Records\s*(?:\[\s*(.*?)\s*\])?$", sort_records),
    (StepKind::InsertText, r"^Insert Text\s*\[\s*(.*?)\s*\]$", insert_text),
    (StepKind::NewWindow, r"^New Window\s*(?:\[\s*(.*?)\s*\])?$", new_window),
    (StepKind::AdjustWindow, r"^Adjust Window\s*\[\s*(.+?)\s*\]$", adjust_window),
    (StepKind::RefreshWindow, r"^Refresh Window(?:\s*\[.*\])?$", refresh_window),
    (StepKind::HaltScript, r"^Halt Script$", halt_script),
    (
        StepKind::ConfigureLlmTemplate,
        r"^Configure LLM Template\s*(?:\[\s*(.*?)\s*\])?$",
        configure_llm_template,
    ),
    (StepKind::LlmRequest, r"^LLM Request\s*(?:\[\s*(.*?)\s*\])?$", llm_request),
];

static RULES: Lazy<Vec<(StepKind, Regex, Build)>> = Lazy::new(|| {
    GRAMMAR_PATTERNS
        .iter()
        .map(|(kind, pattern, build)| {
            let regex = Regex::new(&format!("(?i){}", pattern)).unwrap();
            (*kind, regex, *build)
        })
        .collect()
});

/// Recognize one trimmed, non-empty logical line (disable marker already removed).
pub fn match_instruction(text: &str) -> Result<Instruction, GrammarError> {
    if let Some(comment) = text.strip_prefix('#') {
        return Ok(Instruction::Comment {
            text: comment.trim().to_string(),
        });
    }

    for (kind, regex, build) in RULES.iter() {
        if let Some(caps) = regex.captures(text) {
            return build(&caps).map_err(|reason| GrammarError::Malformed { kind: *kind, reason });
        }
    }

    Err(GrammarError::Unrecognized)
}

// ---------------------------------------------------------------------------
// Builders
// ---------------------------------------------------------------------------

fn else_step(_: &Captures<'_>) -> Result<Instruction, String> {
    Ok(Instruction::Else)
}

fn end_if(_: &Captures<'_>) -> Result<Instruction, String> {
    Ok(Instruction::EndIf)
}

fn loop_step(_: &Captures<'_>) -> Result<Instruction, String> {
    Ok(Instruction::Loop)
}

fn end_loop(_: &Captures<'_>) -> Result<Instruction, String> {
    Ok(Instruction::EndLoop)
}

fn new_record(_: &Captures<'_>) -> Result<Instruction, String> {
    Ok(Instruction::NewRecord)
}

fn perform_find(_: &Captures<'_>) -> Result<Instruction, String> {
    Ok(Instruction::PerformFind)
}

fn refresh_window(_: &Captures<'_>) -> Result<Instruction, String> {
    Ok(Instruction::RefreshWindow)
}

fn halt_script(_: &Captures<'_>) -> Result<Instruction, String> {
    Ok(Instruction::HaltScript)
}

fn set_error_capture(caps: &Captures<'_>) -> Result<Instruction, String> {
    Ok(Instruction::SetErrorCapture { state: toggle(caps) })
}

fn allow_user_abort(caps: &Captures<'_>) -> Result<Instruction, String> {
    Ok(Instruction::AllowUserAbort { state: toggle(caps) })
}

fn set_variable(caps: &Captures<'_>) -> Result<Instruction, String> {
    let repetition = group(caps, 2).filter(|rep| rep != "1");
    Ok(Instruction::SetVariable {
        name: required(caps, 1)?,
        value: required(caps, 3)?,
        repetition,
    })
}

fn set_field_by_name(caps: &Captures<'_>) -> Result<Instruction, String> {
    let (target, value) = head_and_rest(&required(caps, 1)?);
    let value = value.ok_or("missing calculation after target")?;
    Ok(Instruction::SetFieldByName { target, value })
}

fn set_field(caps: &Captures<'_>) -> Result<Instruction, String> {
    let (field, value) = head_and_rest(&required(caps, 1)?);
    if field.is_empty() {
        return Err("missing field reference".into());
    }
    Ok(Instruction::SetField {
        field: FieldRef::parse(&field),
        value,
    })
}

fn if_step(caps: &Captures<'_>) -> Result<Instruction, String> {
    Ok(Instruction::If { calc: required(caps, 1)? })
}

fn else_if(caps: &Captures<'_>) -> Result<Instruction, String> {
    Ok(Instruction::ElseIf { calc: required(caps, 1)? })
}

fn exit_loop_if(caps: &Captures<'_>) -> Result<Instruction, String> {
    Ok(Instruction::ExitLoopIf { calc: required(caps, 1)? })
}

fn show_custom_dialog(caps: &Captures<'_>) -> Result<Instruction, String> {
    let parts = params(&required(caps, 1)?);
    let title = parts.first().cloned().unwrap_or_else(|| "\"\"".to_string());
    let message = parts.get(1).cloned().unwrap_or_else(|| "\"\"".to_string());
    let buttons = if parts.len() > 2 {
        parts[2..].to_vec()
    } else {
        vec!["\"OK\"".to_string()]
    };
    Ok(Instruction::ShowCustomDialog { title, message, buttons })
}

fn exit_script(caps: &Captures<'_>) -> Result<Instruction, String> {
    Ok(Instruction::ExitScript { result: group(caps, 1) })
}

fn commit_records(caps: &Captures<'_>) -> Result<Instruction, String> {
    let opts = group(caps, 1).unwrap_or_default().to_lowercase();
    Ok(Instruction::CommitRecords {
        no_dialog: opts.contains("no dialog") || opts.contains("with dialog: off"),
    })
}

fn perform_script(caps: &Captures<'_>) -> Result<Instruction, String> {
    let parts = params(&required(caps, 1)?);
    let script = parts.first().map(|s| strip_outer_quotes(s)).unwrap_or_default();
    if script.is_empty() {
        return Err("missing script name".into());
    }
    let parameter = match parts.get(1) {
        Some(param) => Some(labeled(param, &["parameter"]).map(|(_, v)| v).unwrap_or(param.as_str()).to_string()),
        None => None,
    };
    if parts.len() > 2 {
        return Err(format!("unexpected parameter `{}`", parts[2]));
    }
    Ok(Instruction::PerformScript {
        script,
        parameter: parameter.filter(|p| !p.is_empty()),
    })
}

fn go_to_layout(caps: &Captures<'_>) -> Result<Instruction, String> {
    let layout = match group(caps, 1) {
        None => LayoutTarget::Current,
        Some(target) => match target.to_lowercase().as_str() {
            "original layout" => LayoutTarget::Original,
            "current layout" => LayoutTarget::Current,
            _ => LayoutTarget::Named(strip_outer_quotes(&target)),
        },
    };
    Ok(Instruction::GoToLayout { layout })
}

fn insert_from_url(caps: &Captures<'_>) -> Result<Instruction, String> {
    let mut target = None;
    let mut url = None;
    let mut curl = None;
    let mut select_all = false;
    let mut no_dialog = false;
    let mut verify_ssl = false;
    let mut dont_encode_url = false;

    for part in params(&group(caps, 1).unwrap_or_default()) {
        match part.to_lowercase().as_str() {
            "select" | "select all" => select_all = true,
            "no dialog" | "with dialog: off" => no_dialog = true,
            "with dialog: on" => no_dialog = false,
            "verify ssl certificates" => verify_ssl = true,
            "don't encode url" | "do not encode url" => dont_encode_url = true,
            _ => match labeled(&part, &["target", "url", "curl", "curl options"]).map(|(l, v)| (l, v.to_string())) {
                Some(("target", value)) => target = Some(value),
                Some(("url", value)) => url = Some(value),
                Some((_, value)) => curl = Some(value),
                None if target.is_none() => target = Some(part),
                None if url.is_none() => url = Some(part),
                None => return Err(format!("unexpected parameter `{}`", part)),
            },
        }
    }

    Ok(Instruction::InsertFromUrl {
        target,
        url,
        curl,
        select_all,
        no_dialog,
        verify_ssl,
        dont_encode_url,
    })
}

fn go_to_record(caps: &Captures<'_>) -> Result<Instruction, String> {
    let word = required(caps, 1)?;
    let direction = RecordDirection::parse(&word).ok_or_else(|| format!("unknown direction `{}`", word))?;
    Ok(Instruction::GoToRecord { direction })
}

fn enter_find_mode(caps: &Captures<'_>) -> Result<Instruction, String> {
    let opts = group(caps, 1).unwrap_or_default().to_lowercase();
    Ok(Instruction::EnterFindMode {
        pause: opts.contains("pause") && !opts.contains("off"),
    })
}

fn sort_records(caps: &Captures<'_>) -> Result<Instruction, String> {
    let opts = group(caps, 1).unwrap_or_default().to_lowercase();
    Ok(Instruction::SortRecords {
        no_dialog: opts.contains("no dialog") || opts.contains("with dialog: off"),
    })
}

fn insert_text(caps: &Captures<'_>) -> Result<Instruction, String> {
    let mut select_all = false;
    let mut target = None;
    let mut text = None;

    for part in params(&group(caps, 1).unwrap_or_default()) {
        if matches!(part.to_lowercase().as_str(), "select" | "select all") {
            select_all = true;
        } else if let Some((_, value)) = labeled(&part, &["target"]) {
            target = Some(value.to_string());
        } else if part.starts_with('"') && text.is_none() {
            text = Some(unescape_literal(&strip_outer_quotes(&part)));
        } else if target.is_none() {
            target = Some(part);
        } else {
            return Err(format!("unexpected parameter `{}`", part));
        }
    }

    Ok(Instruction::InsertText {
        select_all,
        target,
        text: text.unwrap_or_default(),
    })
}

fn new_window(caps: &Captures<'_>) -> Result<Instruction, String> {
    let mut name = None;
    let mut layout = None;
    let mut style = None;

    for part in params(&group(caps, 1).unwrap_or_default()) {
        match labeled(&part, &["name", "layout", "style"]) {
            Some(("name", value)) => name = Some(value.to_string()),
            Some(("layout", value)) => layout = Some(strip_outer_quotes(value)),
            Some((_, value)) => style = Some(value.to_string()),
            None => return Err(format!("expected `Name:`, `Layout:` or `Style:`, found `{}`", part)),
        }
    }

    Ok(Instruction::NewWindow { name, layout, style })
}

fn adjust_window(caps: &Captures<'_>) -> Result<Instruction, String> {
    Ok(Instruction::AdjustWindow { state: required(caps, 1)? })
}

fn configure_llm_template(caps: &Captures<'_>) -> Result<Instruction, String> {
    let mut template = None;
    let mut provider = None;

    for part in params(&group(caps, 1).unwrap_or_default()) {
        match labeled(&part, &["template", "provider"]) {
            Some(("template", value)) => template = Some(value.to_string()),
            Some((_, value)) => provider = Some(value.to_string()),
            None => return Err(format!("expected `Template:` or `Provider:`, found `{}`", part)),
        }
    }

    Ok(Instruction::ConfigureLlmTemplate { template, provider })
}

fn llm_request(caps: &Captures<'_>) -> Result<Instruction, String> {
    const LABELS: &[&str] = &["action", "model", "account", "prompt", "target", "stream", "scope", "tables"];
    let mut request = LlmRequest::default();

    for part in params(&group(caps, 1).unwrap_or_default()) {
        let Some((label, value)) = labeled(&part, LABELS) else {
            return Err(format!("unlabeled parameter `{}`", part));
        };
        let owned = Some(value.to_string());
        match label {
            "action" => request.action = owned,
            "model" => request.model = owned,
            "account" => request.account = owned,
            "prompt" => request.prompt = owned,
            "target" => request.target = Some(FieldRef::parse(value)),
            "stream" => {
                request.stream = match value.to_lowercase().as_str() {
                    "on" | "true" => true,
                    "off" | "false" => false,
                    other => return Err(format!("`Stream:` expects On or Off, found `{}`", other)),
                }
            }
            "scope" => request.scope = owned,
            _ => {
                request.tables = value
                    .split(',')
                    .map(str::trim)
                    .filter(|t| !t.is_empty())
                    .map(str::to_string)
                    .collect()
            }
        }
    }

    Ok(Instruction::LlmRequest(request))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// A capture group, trimmed, with empty groups treated as absent.
fn group(caps: &Captures<'_>, i: usize) -> Option<String> {
    caps.get(i)
        .map(|m| m.as_str().trim().to_string())
        .filter(|s| !s.is_empty())
}

fn required(caps: &Captures<'_>, i: usize) -> Result<String, String> {
    group(caps, i).ok_or_else(|| "missing parameter".to_string())
}

fn toggle(caps: &Captures<'_>) -> Toggle {
    Toggle::from(caps.get(1).is_some_and(|m| m.as_str().eq_ignore_ascii_case("on")))
}

/// Split a bracket body into trimmed, non-empty parameters.
fn params(inner: &str) -> Vec<String> {
    split_params(inner)
        .into_iter()
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
        .collect()
}

/// First parameter and everything after the first top-level `;`.
fn head_and_rest(inner: &str) -> (String, Option<String>) {
    let parts = split_params(inner);
    let head = parts.first().map(|s| s.trim().to_string()).unwrap_or_default();
    let rest = if parts.len() > 1 {
        Some(parts[1..].join(";").trim().to_string()).filter(|r| !r.is_empty())
    } else {
        None
    };
    (head, rest)
}

/// Match `Label: value` against a case-insensitive label set.
/// Returns the canonical (lowercase) label from `labels` and the trimmed value.
fn labeled<'a>(part: &'a str, labels: &[&'static str]) -> Option<(&'static str, &'a str)> {
    let (key, value) = part.split_once(':')?;
    let key = key.trim().to_lowercase();
    labels
        .iter()
        .find(|label| **label == key)
        .map(|label| (*label, value.trim()))
}

fn strip_outer_quotes(s: &str) -> String {
    let s = s.trim();
    if s.len() >= 2 && s.starts_with('"') && s.ends_with('"') {
        s[1..s.len() - 1].to_string()
    } else {
        s.to_string()
    }
}

/// Inverse of the display escaping: `\x` becomes `x`.
fn unescape_literal(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(next) = chars.next() {
                out.push(next);
                continue;
            }
        }
        out.push(c);
    }
    out
}
