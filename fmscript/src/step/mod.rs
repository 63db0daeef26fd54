mod display;

use std::fmt;
use std::ops::Range;

/// A single script step recognized from one logical line.
#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    pub instruction: Instruction,
    /// 1-based line on which the logical line began.
    pub line: usize,
    /// Byte span of the logical line in the source.
    pub span: Range<usize>,
    /// The logical line as written (whitespace-normalized).
    pub raw: String,
    /// Disabled steps are kept in the script but never run.
    pub enabled: bool,
}

impl Step {
    pub fn new(instruction: Instruction, line: usize, span: Range<usize>, raw: impl Into<String>) -> Self {
        Step {
            instruction,
            line,
            span,
            raw: raw.into(),
            enabled: true,
        }
    }

    pub fn kind(&self) -> StepKind {
        self.instruction.kind()
    }
}

impl From<Instruction> for Step {
    fn from(instruction: Instruction) -> Self {
        let raw = instruction.to_string();
        Step::new(instruction, 0, 0..0, raw)
    }
}

/// On/Off switch used by the error capture and user abort steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Toggle {
    On,
    Off,
}

impl Toggle {
    pub fn is_on(self) -> bool {
        self == Toggle::On
    }
}

impl From<bool> for Toggle {
    fn from(on: bool) -> Self {
        if on { Toggle::On } else { Toggle::Off }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordDirection {
    First,
    Last,
    Next,
    Previous,
    /// A `RowPageLocation` value with no script keyword (e.g. `ByCalculation`),
    /// kept verbatim so it is written back unchanged.
    Other(String),
}

impl RecordDirection {
    pub fn as_str(&self) -> &str {
        match self {
            RecordDirection::First => "First",
            RecordDirection::Last => "Last",
            RecordDirection::Next => "Next",
            RecordDirection::Previous => "Previous",
            RecordDirection::Other(value) => value.as_str(),
        }
    }

    /// Case-insensitive lookup of a direction keyword.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "first" => Some(RecordDirection::First),
            "last" => Some(RecordDirection::Last),
            "next" => Some(RecordDirection::Next),
            "previous" => Some(RecordDirection::Previous),
            _ => None,
        }
    }
}

/// Destination of a Go to Layout step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LayoutTarget {
    Current,
    Original,
    Named(String),
}

/// A `Table::Field` reference. Fields written without a table occurrence have no `table`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldRef {
    pub table: Option<String>,
    pub name: String,
}

impl FieldRef {
    pub fn parse(s: &str) -> Self {
        let s = s.trim();
        match s.split_once("::") {
            Some((table, name)) if !table.trim().is_empty() => FieldRef {
                table: Some(table.trim().to_string()),
                name: name.trim().to_string(),
            },
            Some((_, name)) => FieldRef {
                table: None,
                name: name.trim().to_string(),
            },
            None => FieldRef {
                table: None,
                name: s.to_string(),
            },
        }
    }
}

impl fmt::Display for FieldRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.table {
            Some(table) => write!(f, "{}::{}", table, self.name),
            None => f.write_str(&self.name),
        }
    }
}

/// Parameters of an LLM Request step. Every part is optional.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LlmRequest {
    pub action: Option<String>,
    pub model: Option<String>,
    pub account: Option<String>,
    pub prompt: Option<String>,
    pub target: Option<FieldRef>,
    pub stream: bool,
    pub scope: Option<String>,
    pub tables: Vec<String>,
}

/// A script instruction: one variant per supported step, carrying only its own parameters.
///
/// Calculation-valued parameters are stored exactly as written (trimmed).
/// Quoted names (script, layout, window layout, inserted text) are stored without their quotes.
#[derive(Debug, Clone, PartialEq)]
pub enum Instruction {
    /// `# text`; merged comments carry embedded newlines.
    Comment { text: String },
    SetErrorCapture { state: Toggle },
    AllowUserAbort { state: Toggle },
    SetVariable {
        name: String,
        value: String,
        /// Repetition calculation, `None` meaning the default repetition 1.
        repetition: Option<String>,
    },
    SetFieldByName { target: String, value: String },
    SetField { field: FieldRef, value: Option<String> },
    If { calc: String },
    ElseIf { calc: String },
    Else,
    EndIf,
    Loop,
    ExitLoopIf { calc: String },
    EndLoop,
    ShowCustomDialog {
        title: String,
        message: String,
        buttons: Vec<String>,
    },
    ExitScript { result: Option<String> },
    CommitRecords { no_dialog: bool },
    InsertFromUrl {
        target: Option<String>,
        url: Option<String>,
        curl: Option<String>,
        select_all: bool,
        no_dialog: bool,
        verify_ssl: bool,
        dont_encode_url: bool,
    },
    PerformScript { script: String, parameter: Option<String> },
    GoToLayout { layout: LayoutTarget },
    GoToRecord { direction: RecordDirection },
    NewRecord,
    EnterFindMode { pause: bool },
    PerformFind,
    SortRecords { no_dialog: bool },
    InsertText {
        select_all: bool,
        target: Option<String>,
        text: String,
    },
    NewWindow {
        name: Option<String>,
        layout: Option<String>,
        style: Option<String>,
    },
    AdjustWindow { state: String },
    RefreshWindow,
    HaltScript,
    ConfigureLlmTemplate {
        template: Option<String>,
        provider: Option<String>,
    },
    LlmRequest(LlmRequest),
}

impl Instruction {
    pub fn kind(&self) -> StepKind {
        match self {
            Instruction::Comment { .. } => StepKind::Comment,
            Instruction::SetErrorCapture { .. } => StepKind::SetErrorCapture,
            Instruction::AllowUserAbort { .. } => StepKind::AllowUserAbort,
            Instruction::SetVariable { .. } => StepKind::SetVariable,
            Instruction::SetFieldByName { .. } => StepKind::SetFieldByName,
            Instruction::SetField { .. } => StepKind::SetField,
            Instruction::If { .. } => StepKind::If,
            Instruction::ElseIf { .. } => StepKind::ElseIf,
            Instruction::Else => StepKind::Else,
            Instruction::EndIf => StepKind::EndIf,
            Instruction::Loop => StepKind::Loop,
            Instruction::ExitLoopIf { .. } => StepKind::ExitLoopIf,
            Instruction::EndLoop => StepKind::EndLoop,
            Instruction::ShowCustomDialog { .. } => StepKind::ShowCustomDialog,
            Instruction::ExitScript { .. } => StepKind::ExitScript,
            Instruction::CommitRecords { .. } => StepKind::CommitRecords,
            Instruction::InsertFromUrl { .. } => StepKind::InsertFromUrl,
            Instruction::PerformScript { .. } => StepKind::PerformScript,
            Instruction::GoToLayout { .. } => StepKind::GoToLayout,
            Instruction::GoToRecord { .. } => StepKind::GoToRecord,
            Instruction::NewRecord => StepKind::NewRecord,
            Instruction::EnterFindMode { .. } => StepKind::EnterFindMode,
            Instruction::PerformFind => StepKind::PerformFind,
            Instruction::SortRecords { .. } => StepKind::SortRecords,
            Instruction::InsertText { .. } => StepKind::InsertText,
            Instruction::NewWindow { .. } => StepKind::NewWindow,
            Instruction::AdjustWindow { .. } => StepKind::AdjustWindow,
            Instruction::RefreshWindow => StepKind::RefreshWindow,
            Instruction::HaltScript => StepKind::HaltScript,
            Instruction::ConfigureLlmTemplate { .. } => StepKind::ConfigureLlmTemplate,
            Instruction::LlmRequest(_) => StepKind::LlmRequest,
        }
    }
}

/// The closed set of step kinds, used as the registry key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StepKind {
    Comment,
    SetErrorCapture,
    AllowUserAbort,
    SetVariable,
    SetFieldByName,
    SetField,
    If,
    ElseIf,
    Else,
    EndIf,
    Loop,
    ExitLoopIf,
    EndLoop,
    ShowCustomDialog,
    ExitScript,
    CommitRecords,
    InsertFromUrl,
    PerformScript,
    GoToLayout,
    GoToRecord,
    NewRecord,
    EnterFindMode,
    PerformFind,
    SortRecords,
    InsertText,
    NewWindow,
    AdjustWindow,
    RefreshWindow,
    HaltScript,
    ConfigureLlmTemplate,
    LlmRequest,
}

impl StepKind {
    pub const ALL: [StepKind; 31] = [
        StepKind::Comment,
        StepKind::SetErrorCapture,
        StepKind::AllowUserAbort,
        StepKind::SetVariable,
        StepKind::SetFieldByName,
        StepKind::SetField,
        StepKind::If,
        StepKind::ElseIf,
        StepKind::Else,
        StepKind::EndIf,
        StepKind::Loop,
        StepKind::ExitLoopIf,
        StepKind::EndLoop,
        StepKind::ShowCustomDialog,
        StepKind::ExitScript,
        StepKind::CommitRecords,
        StepKind::InsertFromUrl,
        StepKind::PerformScript,
        StepKind::GoToLayout,
        StepKind::GoToRecord,
        StepKind::NewRecord,
        StepKind::EnterFindMode,
        StepKind::PerformFind,
        StepKind::SortRecords,
        StepKind::InsertText,
        StepKind::NewWindow,
        StepKind::AdjustWindow,
        StepKind::RefreshWindow,
        StepKind::HaltScript,
        StepKind::ConfigureLlmTemplate,
        StepKind::LlmRequest,
    ];

    /// The keyword as written in script text, used in diagnostics.
    pub fn keyword(self) -> &'static str {
        match self {
            StepKind::Comment => "#",
            StepKind::SetErrorCapture => "Set Error Capture",
            StepKind::AllowUserAbort => "Allow User Abort",
            StepKind::SetVariable => "Set Variable",
            StepKind::SetFieldByName => "Set Field By Name",
            StepKind::SetField => "Set Field",
            StepKind::If => "If",
            StepKind::ElseIf => "Else If",
            StepKind::Else => "Else",
            StepKind::EndIf => "End If",
            StepKind::Loop => "Loop",
            StepKind::ExitLoopIf => "Exit Loop If",
            StepKind::EndLoop => "End Loop",
            StepKind::ShowCustomDialog => "Show Custom Dialog",
            StepKind::ExitScript => "Exit Script",
            StepKind::CommitRecords => "Commit Records",
            StepKind::InsertFromUrl => "Insert from URL",
            StepKind::PerformScript => "Perform Script",
            StepKind::GoToLayout => "Go to Layout",
            StepKind::GoToRecord => "Go to Record/Request/Page",
            StepKind::NewRecord => "New Record/Request",
            StepKind::EnterFindMode => "Enter Find Mode",
            StepKind::PerformFind => "Perform Find",
            StepKind::SortRecords => "Sort Records",
            StepKind::InsertText => "Insert Text",
            StepKind::NewWindow => "New Window",
            StepKind::AdjustWindow => "Adjust Window",
            StepKind::RefreshWindow => "Refresh Window",
            StepKind::HaltScript => "Halt Script",
            StepKind::ConfigureLlmTemplate => "Configure LLM Template",
            StepKind::LlmRequest => "LLM Request",
        }
    }

    /// Kinds that open an indented body.
    pub fn opens_block(self) -> bool {
        matches!(self, StepKind::If | StepKind::ElseIf | StepKind::Else | StepKind::Loop)
    }

    /// Kinds rendered one level out from the body they follow.
    pub fn closes_block(self) -> bool {
        matches!(self, StepKind::ElseIf | StepKind::Else | StepKind::EndIf | StepKind::EndLoop)
    }
}

impl fmt::Display for StepKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}
