//! Operator application: `d`/`c`/`y` paired with a motion or doubled for
//! whole lines.
//!
//! The caret moves to the edit site before the undo transaction opens, so an
//! undo restores it there. A character-wise delete whose exclusive motion
//! spans lines, starts at or before the first non-blank, and leaves only
//! whitespace after its end is promoted to a line-wise delete.

use core_state::{LinkedUndoFlags, RegisterOperation, RegisterValue, StringData};
use core_text::{Buffer, LineRange, Position};
use tracing::trace;

use crate::{
    CommandData, CommandResult, ModeArgument, ModeSwitch, Motion, MotionFlags, MotionKind,
    MotionResult,
};

use super::CommandExecutor;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Operator {
    Delete,
    Change,
    Yank,
}

/// The `d` promotion rule for exclusive character-wise motions.
fn promotes_to_line_wise(buffer: &Buffer, result: &MotionResult) -> bool {
    if result.motion_kind != MotionKind::CharacterWiseExclusive {
        return false;
    }
    let start = buffer.position_of(result.span.start);
    let end = buffer.position_of(result.span.end);
    if end.line <= start.line {
        return false;
    }
    if start.byte > buffer.first_non_blank(start.line) {
        return false;
    }
    let Some(line) = buffer.line_content(end.line) else {
        return false;
    };
    line.get(end.byte..)
        .is_some_and(|tail| tail.chars().all(char::is_whitespace))
}

/// `cw` behaves like `ce`: the trailing whitespace the motion covers stays.
fn trim_change_span(buffer: &Buffer, result: &mut MotionResult) {
    let text = buffer.slice(result.span);
    let trimmed = text.trim_end();
    if !trimmed.is_empty() {
        result.span.end = result.span.start + trimmed.len();
    }
}

fn delete_register_op(line_wise: bool, result: &MotionResult, buffer: &Buffer) -> RegisterOperation {
    let start = buffer.position_of(result.span.start);
    let end = buffer.position_of(result.span.end);
    if line_wise || end.line > start.line || result.flags.contains(MotionFlags::BIG_DELETE) {
        RegisterOperation::BigDelete
    } else {
        RegisterOperation::Delete
    }
}

pub(crate) fn apply_operator(
    exec: &mut CommandExecutor,
    motion: &Motion,
    data: CommandData,
    op: Operator,
) -> CommandResult {
    let caret = exec.state.caret();
    let Some(mut result) =
        exec.motions
            .get_motion(exec.state.buffer(), caret, motion, data.count_or_default())
    else {
        trace!(target: "actions.operator", ?motion, "motion failed");
        exec.host.beep();
        return CommandResult::Error;
    };
    if op == Operator::Change && result.flags.contains(MotionFlags::WORD_FORWARD) {
        trim_change_span(exec.state.buffer(), &mut result);
    }
    let promoted = op != Operator::Yank && promotes_to_line_wise(exec.state.buffer(), &result);
    let line_wise = result.motion_kind == MotionKind::LineWise || promoted;
    if line_wise {
        let range = if result.motion_kind == MotionKind::LineWise {
            result.line_range
        } else {
            let start = exec.state.buffer().position_of(result.span.start);
            let end = exec.state.buffer().position_of(result.span.end);
            exec.state
                .buffer()
                .clamped_line_range(start.line, end.line - start.line + 1)
        };
        run_line_wise(exec, data, range, op)
    } else {
        let reg_op = delete_register_op(false, &result, exec.state.buffer());
        run_char_wise(exec, data, result, op, reg_op)
    }
}

pub(crate) fn apply_lines(
    exec: &mut CommandExecutor,
    data: CommandData,
    op: Operator,
) -> CommandResult {
    let caret = exec.state.caret();
    let range = exec
        .state
        .buffer()
        .clamped_line_range(caret.line, data.count_or_default());
    run_line_wise(exec, data, range, op)
}

fn run_char_wise(
    exec: &mut CommandExecutor,
    data: CommandData,
    result: MotionResult,
    op: Operator,
    reg_op: RegisterOperation,
) -> CommandResult {
    let span = result.span;
    let start = exec.state.buffer().position_of(span.start);
    match op {
        Operator::Yank => {
            let text = exec.state.buffer().slice(span);
            exec.capture(
                data,
                RegisterValue::character_wise(StringData::simple(text)),
                RegisterOperation::Yank,
            );
            exec.state.set_caret(start);
            CommandResult::Completed(ModeSwitch::NoSwitch)
        }
        Operator::Delete => {
            exec.state.set_caret(start);
            let txn = exec.state.begin_transaction("delete", LinkedUndoFlags::empty());
            let deleted = exec.state.buffer_mut().delete(span);
            if exec.state.complete_transaction(txn).is_err() {
                return CommandResult::Error;
            }
            exec.capture(
                data,
                RegisterValue::character_wise(StringData::simple(deleted)),
                reg_op,
            );
            exec.state.set_caret(clamp_to_line(exec.state.buffer(), start));
            CommandResult::Completed(ModeSwitch::NoSwitch)
        }
        Operator::Change => {
            exec.state.set_caret(start);
            let txn = exec.state.begin_transaction("change", LinkedUndoFlags::empty());
            let deleted = exec.state.buffer_mut().delete(span);
            exec.capture(
                data,
                RegisterValue::character_wise(StringData::simple(deleted)),
                reg_op,
            );
            exec.session.link_pending = true;
            CommandResult::Completed(ModeSwitch::SwitchModeWithArgument(
                core_state::ModeKind::Insert,
                ModeArgument::InsertWithTransaction(txn),
            ))
        }
    }
}

fn run_line_wise(
    exec: &mut CommandExecutor,
    data: CommandData,
    range: LineRange,
    op: Operator,
) -> CommandResult {
    let span = exec.state.buffer().line_span(range.start_line, range.count);
    let text = exec.state.buffer().slice(span);
    let value = RegisterValue::line_wise(StringData::simple(text));
    match op {
        Operator::Yank => {
            exec.capture(data, value, RegisterOperation::Yank);
            CommandResult::Completed(ModeSwitch::NoSwitch)
        }
        Operator::Delete => {
            exec.state.set_caret(Position::new(range.start_line, 0));
            let txn = exec.state.begin_transaction("delete lines", LinkedUndoFlags::empty());
            exec.state.buffer_mut().delete(span);
            if exec.state.complete_transaction(txn).is_err() {
                return CommandResult::Error;
            }
            exec.capture(data, value, RegisterOperation::BigDelete);
            let line = range
                .start_line
                .min(exec.state.buffer().content_line_count().saturating_sub(1));
            let byte = exec.state.buffer().first_non_blank(line);
            exec.state.set_caret(Position::new(line, byte));
            CommandResult::Completed(ModeSwitch::NoSwitch)
        }
        Operator::Change => {
            exec.state.set_caret(Position::new(range.start_line, 0));
            let txn = exec.state.begin_transaction("change lines", LinkedUndoFlags::empty());
            exec.state.buffer_mut().replace(span, "\n");
            exec.capture(data, value, RegisterOperation::BigDelete);
            exec.state.set_caret(Position::new(range.start_line, 0));
            exec.session.link_pending = true;
            CommandResult::Completed(ModeSwitch::SwitchModeWithArgument(
                core_state::ModeKind::Insert,
                ModeArgument::InsertWithTransaction(txn),
            ))
        }
    }
}

/// Clamp a caret onto existing content after a delete.
pub(crate) fn clamp_to_line(buffer: &Buffer, caret: Position) -> Position {
    let line = caret.line.min(buffer.content_line_count().saturating_sub(1));
    let len = buffer.line_byte_len(line);
    Position::new(line, caret.byte.min(len.saturating_sub(1)))
}
