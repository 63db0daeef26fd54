use std::fmt;

use super::{Instruction, LayoutTarget, LlmRequest};

/// Renders the canonical text form of an instruction, the inverse of the recognizer.
///
/// Multi-line comments render one `# ` line per embedded line break.
impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instruction::Comment { text } => {
                for (i, line) in text.split('\n').enumerate() {
                    if i > 0 {
                        f.write_str("\n")?;
                    }
                    if line.is_empty() {
                        f.write_str("#")?;
                    } else {
                        write!(f, "# {}", line)?;
                    }
                }
                Ok(())
            }
            Instruction::SetErrorCapture { state } => {
                write!(f, "Set Error Capture [ {} ]", on_off(state.is_on()))
            }
            Instruction::AllowUserAbort { state } => {
                write!(f, "Allow User Abort [ {} ]", on_off(state.is_on()))
            }
            Instruction::SetVariable { name, value, repetition } => match repetition {
                Some(rep) => write!(f, "Set Variable [ {}[{}] ; Value: {} ]", name, rep, value),
                None => write!(f, "Set Variable [ {} ; Value: {} ]", name, value),
            },
            Instruction::SetFieldByName { target, value } => {
                write!(f, "Set Field By Name [ {} ; {} ]", target, value)
            }
            Instruction::SetField { field, value } => match value {
                Some(value) => write!(f, "Set Field [ {} ; {} ]", field, value),
                None => write!(f, "Set Field [ {} ]", field),
            },
            Instruction::If { calc } => write!(f, "If [ {} ]", calc),
            Instruction::ElseIf { calc } => write!(f, "Else If [ {} ]", calc),
            Instruction::Else => f.write_str("Else"),
            Instruction::EndIf => f.write_str("End If"),
            Instruction::Loop => f.write_str("Loop"),
            Instruction::ExitLoopIf { calc } => write!(f, "Exit Loop If [ {} ]", calc),
            Instruction::EndLoop => f.write_str("End Loop"),
            Instruction::ShowCustomDialog { title, message, buttons } => {
                let mut parts = vec![title.as_str(), message.as_str()];
                parts.extend(buttons.iter().map(String::as_str));
                write!(f, "Show Custom Dialog [ {} ]", parts.join(" ; "))
            }
            Instruction::ExitScript { result } => match result {
                Some(result) => write!(f, "Exit Script [ {} ]", result),
                None => f.write_str("Exit Script"),
            },
            Instruction::CommitRecords { no_dialog } => {
                if *no_dialog {
                    f.write_str("Commit Records [ No dialog ]")
                } else {
                    f.write_str("Commit Records")
                }
            }
            Instruction::InsertFromUrl {
                target,
                url,
                curl,
                select_all,
                no_dialog,
                verify_ssl,
                dont_encode_url,
            } => {
                let mut parts = Vec::new();
                if *select_all {
                    parts.push("Select".to_string());
                }
                if *no_dialog {
                    parts.push("With dialog: Off".to_string());
                }
                if let Some(target) = target {
                    parts.push(format!("Target: {}", target));
                }
                if let Some(url) = url {
                    parts.push(format!("URL: {}", url));
                }
                if *verify_ssl {
                    parts.push("Verify SSL Certificates".to_string());
                }
                if *dont_encode_url {
                    parts.push("Don't encode URL".to_string());
                }
                if let Some(curl) = curl {
                    parts.push(format!("cURL: {}", curl));
                }
                bracketed(f, "Insert from URL", &parts)
            }
            Instruction::PerformScript { script, parameter } => match parameter {
                Some(param) => write!(f, "Perform Script [ \"{}\" ; {} ]", script, param),
                None => write!(f, "Perform Script [ \"{}\" ]", script),
            },
            Instruction::GoToLayout { layout } => match layout {
                LayoutTarget::Original => f.write_str("Go to Layout [ original layout ]"),
                LayoutTarget::Current => f.write_str("Go to Layout [ current layout ]"),
                LayoutTarget::Named(name) => write!(f, "Go to Layout [ \"{}\" ]", name),
            },
            Instruction::GoToRecord { direction } => {
                write!(f, "Go to Record/Request/Page [ {} ]", direction.as_str())
            }
            Instruction::NewRecord => f.write_str("New Record/Request"),
            Instruction::EnterFindMode { pause } => {
                if *pause {
                    f.write_str("Enter Find Mode [ Pause ]")
                } else {
                    f.write_str("Enter Find Mode")
                }
            }
            Instruction::PerformFind => f.write_str("Perform Find"),
            Instruction::SortRecords { no_dialog } => {
                if *no_dialog {
                    f.write_str("Sort Records [ No dialog ]")
                } else {
                    f.write_str("Sort Records")
                }
            }
            Instruction::InsertText { select_all, target, text } => {
                let mut parts = Vec::new();
                if *select_all {
                    parts.push("Select All".to_string());
                }
                if let Some(target) = target {
                    parts.push(format!("Target: {}", target));
                }
                // Text must stay on one physical line.
                let flat = text.replace(['\r', '\n'], " ");
                parts.push(format!("\"{}\"", escape_literal(&flat)));
                bracketed(f, "Insert Text", &parts)
            }
            Instruction::NewWindow { name, layout, style } => {
                let mut parts = Vec::new();
                if let Some(name) = name {
                    parts.push(format!("Name: {}", name));
                }
                if let Some(layout) = layout {
                    parts.push(format!("Layout: \"{}\"", layout));
                }
                if let Some(style) = style {
                    parts.push(format!("Style: {}", style));
                }
                bracketed(f, "New Window", &parts)
            }
            Instruction::AdjustWindow { state } => write!(f, "Adjust Window [ {} ]", state),
            Instruction::RefreshWindow => f.write_str("Refresh Window"),
            Instruction::HaltScript => f.write_str("Halt Script"),
            Instruction::ConfigureLlmTemplate { template, provider } => {
                let mut parts = Vec::new();
                if let Some(template) = template {
                    parts.push(format!("Template: {}", template));
                }
                if let Some(provider) = provider {
                    parts.push(format!("Provider: {}", provider));
                }
                bracketed(f, "Configure LLM Template", &parts)
            }
            Instruction::LlmRequest(request) => bracketed(f, "LLM Request", &llm_parts(request)),
        }
    }
}

fn llm_parts(request: &LlmRequest) -> Vec<String> {
    let mut parts = Vec::new();
    if let Some(action) = &request.action {
        parts.push(format!("Action: {}", action));
    }
    if let Some(model) = &request.model {
        parts.push(format!("Model: {}", model));
    }
    if let Some(account) = &request.account {
        parts.push(format!("Account: {}", account));
    }
    if let Some(prompt) = &request.prompt {
        parts.push(format!("Prompt: {}", prompt));
    }
    if let Some(target) = &request.target {
        parts.push(format!("Target: {}", target));
    }
    if request.stream {
        parts.push("Stream: On".to_string());
    }
    if let Some(scope) = &request.scope {
        parts.push(format!("Scope: {}", scope));
    }
    if !request.tables.is_empty() {
        parts.push(format!("Tables: {}", request.tables.join(", ")));
    }
    parts
}

/// `Keyword [ a ; b ]`, or the bare keyword when there are no parameters.
fn bracketed(f: &mut fmt::Formatter<'_>, keyword: &str, parts: &[String]) -> fmt::Result {
    if parts.is_empty() {
        f.write_str(keyword)
    } else {
        write!(f, "{} [ {} ]", keyword, parts.join(" ; "))
    }
}

/// Backslash-escape `\` and `"` so a literal survives the quote-aware splitter.
fn escape_literal(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '\\' | '"') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

fn on_off(on: bool) -> &'static str {
    if on { "On" } else { "Off" }
}
