//! Command execution against a `VimState`.
//!
//! Execution phases:
//!   1. resolve inputs (motion, register, selection) without touching the
//!      buffer; failures surface as [`CommandResult::Error`] before any edit,
//!   2. move the caret to the edit site, open the undo transaction, apply the
//!      edit, capture registers,
//!   3. record the command in the repeat slot when it is repeatable and we
//!      are not already replaying.
//!
//! Mode switches are applied to the state here and also returned to the
//! caller; a switch into insert mode hands back the open transaction the
//! host must return through [`CommandExecutor::leave_insert`].

pub mod insert;
pub mod normal;
pub mod operator;
pub mod put;
pub mod visual;

use core_state::{
    LinkedUndoTransaction, ModeKind, RegisterOperation, RegisterValue, VimState, VisualSpan,
};
use tracing::{debug, trace};

use crate::{
    macros, repeat, CommandData, CommandFlags, CommandResult, FoldManager, InsertCommand,
    KeyInputRunner, ModeArgument, ModeSwitch, MotionEngine, NormalCommand, StoredCommand,
    VimHost, VimSession, VisualCommand,
};

pub struct CommandExecutor<'a> {
    pub state: &'a mut VimState,
    pub session: &'a mut VimSession,
    pub motions: &'a dyn MotionEngine,
    pub host: &'a mut dyn VimHost,
    pub folds: &'a mut dyn FoldManager,
    /// Key replayer for `@` commands; playback is a no-op without one.
    pub runner: Option<&'a mut dyn KeyInputRunner>,
}

impl<'a> CommandExecutor<'a> {
    pub fn new(
        state: &'a mut VimState,
        session: &'a mut VimSession,
        motions: &'a dyn MotionEngine,
        host: &'a mut dyn VimHost,
        folds: &'a mut dyn FoldManager,
    ) -> Self {
        Self {
            state,
            session,
            motions,
            host,
            folds,
            runner: None,
        }
    }

    pub fn with_runner(mut self, runner: &'a mut dyn KeyInputRunner) -> Self {
        self.runner = Some(runner);
        self
    }

    pub fn run_normal_command(
        &mut self,
        command: &NormalCommand,
        data: CommandData,
    ) -> CommandResult {
        trace!(target: "actions.dispatch", ?command, ?data, "normal command");
        let flags = command.flags();
        let result = match command {
            NormalCommand::DeleteMotion(motion) => {
                operator::apply_operator(self, motion, data, operator::Operator::Delete)
            }
            NormalCommand::ChangeMotion(motion) => {
                operator::apply_operator(self, motion, data, operator::Operator::Change)
            }
            NormalCommand::YankMotion(motion) => {
                operator::apply_operator(self, motion, data, operator::Operator::Yank)
            }
            NormalCommand::DeleteLines => {
                operator::apply_lines(self, data, operator::Operator::Delete)
            }
            NormalCommand::ChangeLines => {
                operator::apply_lines(self, data, operator::Operator::Change)
            }
            NormalCommand::YankLines => {
                operator::apply_lines(self, data, operator::Operator::Yank)
            }
            NormalCommand::DeleteCharacterAtCaret => normal::delete_character(self, data, false),
            NormalCommand::DeleteCharacterBeforeCaret => {
                normal::delete_character(self, data, true)
            }
            NormalCommand::PutAfterCaret { with_indent } => {
                put::put_in_normal_mode(self, data, true, *with_indent)
            }
            NormalCommand::PutBeforeCaret { with_indent } => {
                put::put_in_normal_mode(self, data, false, *with_indent)
            }
            NormalCommand::JoinLines => normal::join_lines(self, data),
            NormalCommand::ReplaceChar(c) => normal::replace_char(self, data, *c),
            NormalCommand::AddToWord => crate::number::add_to_word(self, data, 1),
            NormalCommand::SubtractFromWord => crate::number::add_to_word(self, data, -1),
            NormalCommand::InsertAtCaret
            | NormalCommand::InsertAfterCaret
            | NormalCommand::InsertAtFirstNonBlank
            | NormalCommand::InsertAtEndOfLine
            | NormalCommand::InsertLineAbove
            | NormalCommand::InsertLineBelow => normal::enter_insert(self, command, data),
            NormalCommand::Undo => normal::undo(self, data),
            NormalCommand::Redo => normal::redo(self, data),
            NormalCommand::RepeatLastCommand => repeat::repeat_last(self, data),
            NormalCommand::RecordMacroStart(register) => {
                macros::start_recording(self, *register)
            }
            NormalCommand::RecordMacroStop => macros::stop_recording(self),
            NormalCommand::RunMacro(register) => self.run_macro_by_char(*register, data),
            NormalCommand::RunLastMacro => {
                let Some(register) = self.session.last_macro_run else {
                    self.host.beep();
                    return CommandResult::Error;
                };
                self.run_stored_macro(register, data)
            }
            NormalCommand::CreateFold => {
                let line = self.state.caret().line;
                self.folds.create_fold(self.state.buffer().clamped_line_range(line, 1));
                CommandResult::Completed(ModeSwitch::NoSwitch)
            }
            NormalCommand::OpenFold => {
                self.folds.open_fold(self.state.caret().line);
                CommandResult::Completed(ModeSwitch::NoSwitch)
            }
            NormalCommand::CloseFold => {
                self.folds.close_fold(self.state.caret().line);
                CommandResult::Completed(ModeSwitch::NoSwitch)
            }
            NormalCommand::ToggleFold => {
                self.folds.toggle_fold(self.state.caret().line);
                CommandResult::Completed(ModeSwitch::NoSwitch)
            }
            NormalCommand::DeleteFold => {
                self.folds.delete_fold(self.state.caret().line);
                CommandResult::Completed(ModeSwitch::NoSwitch)
            }
        };
        if flags.contains(CommandFlags::REPEATABLE) && !result.is_error() {
            self.remember(StoredCommand::Normal {
                command: command.clone(),
                data,
            });
        }
        self.apply_mode_switch(&result);
        result
    }

    pub fn run_visual_command(
        &mut self,
        command: VisualCommand,
        data: CommandData,
        span: &VisualSpan,
    ) -> CommandResult {
        trace!(target: "actions.dispatch", ?command, ?data, "visual command");
        self.state.last_visual = Some(span.clone());
        let result = visual::run(self, command, data, span);
        if command.flags().contains(CommandFlags::REPEATABLE) && !result.is_error() {
            self.remember(StoredCommand::Visual {
                command,
                data,
                shape: core_state::StoredVisualSpan::of(span),
            });
        }
        self.apply_mode_switch(&result);
        result
    }

    pub fn run_insert_command(
        &mut self,
        command: &InsertCommand,
        data: CommandData,
    ) -> CommandResult {
        insert::run(self, command, data)
    }

    /// Close an insert session: repeat for a counted entry, complete the
    /// transaction, record the typed text for `".` and for `.`.
    pub fn leave_insert(&mut self, txn: Option<LinkedUndoTransaction>) -> CommandResult {
        let typed = std::mem::take(&mut self.session.insert_keys);
        let repeat = self.session.insert_repeat.take().unwrap_or(1).max(1);
        for _ in 1..repeat {
            let abs = self.state.buffer().abs_of(self.state.caret());
            self.state.buffer_mut().insert(abs, &typed);
            let caret = self.state.buffer().position_of(abs + typed.len());
            self.state.set_caret(caret);
        }
        if let Some(txn) = txn {
            if let Err(e) = self.state.complete_transaction(txn) {
                debug!(target: "actions.dispatch", error = %e, "insert transaction");
            }
        }
        // Esc leaves the caret on the last inserted grapheme.
        let caret = self.state.caret();
        if caret.byte > 0 {
            let line = self.state.buffer().line_content(caret.line).unwrap_or_default();
            let byte = core_text::grapheme::prev_boundary(&line, caret.byte);
            self.state
                .set_caret(core_text::Position::new(caret.line, byte));
        }
        self.state.registers.set_last_inserted(typed.clone());
        let stored = StoredCommand::Insert {
            command: InsertCommand::InsertText(typed),
            data: CommandData::with_count(repeat),
        };
        if self.session.link_pending {
            self.session.link_pending = false;
            if !self.session.in_repeat {
                if let Some(prev) = self.session.last_command.take() {
                    self.session.last_command =
                        Some(StoredCommand::Linked(Box::new(prev), Box::new(stored)));
                }
            }
        } else {
            self.remember(stored);
        }
        self.state.set_mode(ModeKind::Normal);
        CommandResult::Completed(ModeSwitch::SwitchMode(ModeKind::Normal))
    }

    fn run_macro_by_char(&mut self, register: char, data: CommandData) -> CommandResult {
        let Some(name) = macros::playback_register(register) else {
            self.host.beep();
            return CommandResult::Error;
        };
        self.run_stored_macro(name, data)
    }

    fn run_stored_macro(
        &mut self,
        register: core_state::RegisterName,
        data: CommandData,
    ) -> CommandResult {
        let Some(runner) = self.runner.take() else {
            self.host.beep();
            return CommandResult::Error;
        };
        let result = macros::run_macro(
            self.state,
            self.session,
            self.host,
            runner,
            register,
            data.count_or_default(),
        );
        self.runner = Some(runner);
        result
    }

    /// Store the repeat command unless a repeat is already replaying it.
    fn remember(&mut self, stored: StoredCommand) {
        if !self.session.in_repeat {
            self.session.last_command = Some(stored);
        }
    }

    fn apply_mode_switch(&mut self, result: &CommandResult) {
        if let CommandResult::Completed(switch) = result {
            match switch {
                ModeSwitch::NoSwitch => {}
                ModeSwitch::SwitchMode(mode) => self.state.set_mode(*mode),
                ModeSwitch::SwitchModeWithArgument(mode, _) => self.state.set_mode(*mode),
                ModeSwitch::SwitchPreviousMode => self.state.switch_previous_mode(),
            }
        }
    }

    /// Route captured text into the registers.
    pub(crate) fn capture(
        &mut self,
        data: CommandData,
        value: RegisterValue,
        op: RegisterOperation,
    ) {
        self.state.registers.set(data.register_name, value, op);
    }
}

/// Pull the transaction out of a completed mode switch, if it carries one.
pub fn take_insert_transaction(result: CommandResult) -> Option<LinkedUndoTransaction> {
    match result {
        CommandResult::Completed(ModeSwitch::SwitchModeWithArgument(
            _,
            ModeArgument::InsertWithTransaction(txn),
        )) => Some(txn),
        _ => None,
    }
}
