//! Command dispatch for the modal editing engine.
//!
//! Commands are plain data: a [`NormalCommand`], [`VisualCommand`], or
//! [`InsertCommand`] plus the [`CommandData`] (count and register) the user
//! prefixed it with. The [`executor::CommandExecutor`] interprets them
//! against a `VimState`, motions resolve through the [`MotionEngine`] trait,
//! and side effects the engine cannot perform itself (bells, status lines,
//! folds) go through [`VimHost`] and [`FoldManager`].
//!
//! Executed commands that edit the buffer are remembered as a
//! [`StoredCommand`] so `.` can replay them, and macro recording captures the
//! keystrokes that produced them.

pub mod executor;
pub mod macros;
pub mod motion_engine;
pub mod number;
pub mod repeat;

use bitflags::bitflags;
use core_state::{LinkedUndoTransaction, ModeKind, RegisterName, StoredVisualSpan};
use core_text::{LineRange, Position, Span};

pub use executor::CommandExecutor;
pub use macros::{KeyInputRunner, KeyRunResult, MacroRecording};
pub use motion_engine::DefaultMotionEngine;

/// A motion request as typed, before resolution against a buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MotionRequest {
    WordForward,
    WordBackward,
    WordEnd,
    CharLeft,
    CharRight,
    Down,
    Up,
    StartOfLine,
    FirstNonBlank,
    EndOfLine,
    /// Literal forward search, exclusive of the match.
    Search { pattern: String },
}

/// A motion with its own count (`d2w` carries count 2 on the motion).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Motion {
    pub request: MotionRequest,
    pub count: Option<usize>,
}

impl Motion {
    pub fn new(request: MotionRequest) -> Self {
        Self {
            request,
            count: None,
        }
    }

    pub fn with_count(request: MotionRequest, count: usize) -> Self {
        Self {
            request,
            count: Some(count),
        }
    }
}

/// How a resolved motion pairs with an operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotionKind {
    CharacterWiseExclusive,
    CharacterWiseInclusive,
    LineWise,
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct MotionFlags: u8 {
        /// Deleting with this motion shifts the numbered-register history.
        const BIG_DELETE = 1 << 0;
        /// `w` motion; `cw` trims the trailing whitespace it would eat.
        const WORD_FORWARD = 1 << 1;
    }
}

/// A motion resolved against a buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MotionResult {
    /// Bytes covered, caret to target, normalized start <= end.
    pub span: Span,
    /// Lines covered; authoritative for line-wise motions.
    pub line_range: LineRange,
    pub motion_kind: MotionKind,
    pub flags: MotionFlags,
}

/// Resolves motions against buffer content. The default implementation lives
/// in [`motion_engine`]; tests substitute fixed-span engines.
pub trait MotionEngine {
    fn get_motion(
        &self,
        buffer: &core_text::Buffer,
        caret: Position,
        motion: &Motion,
        count: usize,
    ) -> Option<MotionResult>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NormalCommand {
    DeleteMotion(Motion),
    ChangeMotion(Motion),
    YankMotion(Motion),
    /// `dd`
    DeleteLines,
    /// `cc`
    ChangeLines,
    /// `yy`
    YankLines,
    /// `x`
    DeleteCharacterAtCaret,
    /// `X`
    DeleteCharacterBeforeCaret,
    /// `p` / `]p`
    PutAfterCaret { with_indent: bool },
    /// `P` / `[p`
    PutBeforeCaret { with_indent: bool },
    JoinLines,
    ReplaceChar(char),
    /// Ctrl-A
    AddToWord,
    /// Ctrl-X
    SubtractFromWord,
    InsertAtCaret,
    InsertAfterCaret,
    InsertAtFirstNonBlank,
    InsertAtEndOfLine,
    InsertLineAbove,
    InsertLineBelow,
    Undo,
    Redo,
    /// `.`
    RepeatLastCommand,
    RecordMacroStart(char),
    RecordMacroStop,
    RunMacro(char),
    /// `@@`
    RunLastMacro,
    CreateFold,
    OpenFold,
    CloseFold,
    ToggleFold,
    DeleteFold,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisualCommand {
    DeleteSelection,
    ChangeSelection,
    YankSelection,
    PutOverSelection,
    JoinSelection,
    FoldSelection,
}

/// Commands replayed inside insert mode for `.` and macros.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertCommand {
    InsertText(String),
    InsertNewLine,
    /// Backspace.
    Back,
    /// Forward delete.
    Delete,
    MoveCaretLeft,
    /// Two commands replayed in sequence; repeat count applies to the first.
    Combined(Box<InsertCommand>, Box<InsertCommand>),
}

/// Count and register prefix attached to a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CommandData {
    pub count: Option<usize>,
    pub register_name: Option<RegisterName>,
}

impl CommandData {
    pub fn with_count(count: usize) -> Self {
        Self {
            count: Some(count),
            ..Self::default()
        }
    }

    pub fn with_register(register_name: RegisterName) -> Self {
        Self {
            register_name: Some(register_name),
            ..Self::default()
        }
    }

    pub fn count_or_default(&self) -> usize {
        self.count.unwrap_or(1).max(1)
    }
}

/// Extra payload carried on a mode switch.
#[derive(Debug, Default)]
pub enum ModeArgument {
    #[default]
    None,
    /// Insert entered with a count; the typed text repeats on leave (`3i`).
    InsertWithCount(usize),
    /// Insert entered under an open undo transaction the host must close
    /// when insert mode ends.
    InsertWithTransaction(LinkedUndoTransaction),
}

#[derive(Debug, Default)]
pub enum ModeSwitch {
    #[default]
    NoSwitch,
    SwitchMode(ModeKind),
    SwitchModeWithArgument(ModeKind, ModeArgument),
    /// Return to the mode active before the current one.
    SwitchPreviousMode,
}

#[derive(Debug)]
pub enum CommandResult {
    Completed(ModeSwitch),
    Error,
}

impl CommandResult {
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error)
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct CommandFlags: u8 {
        /// Successful execution becomes the `.` command.
        const REPEATABLE = 1 << 0;
        /// Edits the buffer inside its own undo transaction.
        const WRITABLE = 1 << 1;
    }
}

impl NormalCommand {
    pub fn flags(&self) -> CommandFlags {
        use NormalCommand::*;
        match self {
            DeleteMotion(_) | ChangeMotion(_) | DeleteLines | ChangeLines
            | DeleteCharacterAtCaret | DeleteCharacterBeforeCaret
            | PutAfterCaret { .. } | PutBeforeCaret { .. } | JoinLines | ReplaceChar(_)
            | AddToWord | SubtractFromWord => CommandFlags::REPEATABLE | CommandFlags::WRITABLE,
            // Insert entries are remembered so the insert that follows can
            // link onto them; `o` plus typed text repeats as one change.
            InsertAtCaret | InsertAfterCaret | InsertAtFirstNonBlank | InsertAtEndOfLine
            | InsertLineAbove | InsertLineBelow => {
                CommandFlags::REPEATABLE | CommandFlags::WRITABLE
            }
            YankMotion(_) | YankLines | Undo | Redo | RepeatLastCommand
            | RecordMacroStart(_) | RecordMacroStop | RunMacro(_) | RunLastMacro
            | CreateFold | OpenFold | CloseFold | ToggleFold | DeleteFold => {
                CommandFlags::empty()
            }
        }
    }
}

impl VisualCommand {
    pub fn flags(&self) -> CommandFlags {
        match self {
            Self::YankSelection | Self::FoldSelection => CommandFlags::empty(),
            _ => CommandFlags::REPEATABLE | CommandFlags::WRITABLE,
        }
    }
}

/// An executed command remembered for `.`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoredCommand {
    Normal {
        command: NormalCommand,
        data: CommandData,
    },
    Visual {
        command: VisualCommand,
        data: CommandData,
        shape: StoredVisualSpan,
    },
    Insert {
        command: InsertCommand,
        data: CommandData,
    },
    /// An operator that entered insert mode, paired with the insert that
    /// followed it (`cw` + typed text).
    Linked(Box<StoredCommand>, Box<StoredCommand>),
}

/// Cross-command session state: the repeat slot, the macro recorder, and the
/// last-run macro register.
#[derive(Debug, Default)]
pub struct VimSession {
    pub last_command: Option<StoredCommand>,
    pub last_macro_run: Option<RegisterName>,
    /// Guards against `.` replaying a `.`.
    pub in_repeat: bool,
    pub recording: Option<MacroRecording>,
    /// Text typed in the current insert session.
    pub insert_keys: String,
    /// Count the insert session was entered with (`3i`).
    pub insert_repeat: Option<usize>,
    /// The pending repeat command is an operator waiting to be linked with
    /// the insert that follows it (`cw` + typed text).
    pub link_pending: bool,
}

impl VimSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_recording(&self) -> bool {
        self.recording.is_some()
    }
}

/// Host-side effects the engine delegates.
pub trait VimHost {
    fn beep(&mut self);
    fn on_status(&mut self, _message: &str) {}
    fn on_error(&mut self, _message: &str) {}
    /// Buffer the host wants focused, if it changed focus out from under the
    /// engine (window commands during macro playback).
    fn focused_buffer(&self) -> Option<usize> {
        None
    }
}

/// Fold bookkeeping lives host-side; the engine only issues requests.
pub trait FoldManager {
    fn create_fold(&mut self, range: LineRange);
    fn open_fold(&mut self, line: usize);
    fn close_fold(&mut self, line: usize);
    fn toggle_fold(&mut self, line: usize);
    fn delete_fold(&mut self, line: usize);
}

/// Recording host double; tests assert on what the engine asked for.
#[derive(Debug, Default)]
pub struct NopHost {
    pub beeps: usize,
    pub statuses: Vec<String>,
    pub errors: Vec<String>,
    pub focus: Option<usize>,
}

impl VimHost for NopHost {
    fn beep(&mut self) {
        self.beeps += 1;
    }

    fn on_status(&mut self, message: &str) {
        self.statuses.push(message.to_string());
    }

    fn on_error(&mut self, message: &str) {
        self.errors.push(message.to_string());
    }

    fn focused_buffer(&self) -> Option<usize> {
        self.focus
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FoldRequest {
    Create(LineRange),
    Open(usize),
    Close(usize),
    Toggle(usize),
    Delete(usize),
}

/// Fold double that records requests.
#[derive(Debug, Default)]
pub struct NopFoldManager {
    pub requests: Vec<FoldRequest>,
}

impl FoldManager for NopFoldManager {
    fn create_fold(&mut self, range: LineRange) {
        self.requests.push(FoldRequest::Create(range));
    }

    fn open_fold(&mut self, line: usize) {
        self.requests.push(FoldRequest::Open(line));
    }

    fn close_fold(&mut self, line: usize) {
        self.requests.push(FoldRequest::Close(line));
    }

    fn toggle_fold(&mut self, line: usize) {
        self.requests.push(FoldRequest::Toggle(line));
    }

    fn delete_fold(&mut self, line: usize) {
        self.requests.push(FoldRequest::Delete(line));
    }
}
