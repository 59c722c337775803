//! `.` repeat.
//!
//! The last change replays from its stored form. A count given to `.`
//! replaces both the stored command count and any count baked into its
//! motion, and the new count persists for the next `.`. Repeating a put from
//! a numbered delete register first advances the register, so `"1p` followed
//! by `.` walks the delete history. The whole replay runs under one
//! `CAN_BE_EMPTY` transaction and rolls back if it fails partway.

use core_state::{LinkedUndoFlags, ModeKind, RegisterName};
use core_text::grapheme;
use tracing::trace;

use crate::executor::CommandExecutor;
use crate::{
    CommandData, CommandResult, InsertCommand, ModeArgument, ModeSwitch, NormalCommand,
    StoredCommand,
};

pub(crate) fn repeat_last(exec: &mut CommandExecutor, data: CommandData) -> CommandResult {
    if exec.session.in_repeat {
        // A replayed `.` must not recurse into itself.
        exec.host.beep();
        return CommandResult::Error;
    }
    let Some(stored) = exec.session.last_command.clone() else {
        exec.host.beep();
        return CommandResult::Error;
    };
    let stored = advance_redo_register(stored);
    let effective = apply_count_override(&stored, data.count);
    trace!(target: "actions.repeat", command = ?effective, "repeat");
    exec.session.in_repeat = true;
    let txn = exec.state.begin_transaction("repeat", LinkedUndoFlags::CAN_BE_EMPTY);
    let result = run_stored(exec, &effective);
    exec.session.in_repeat = false;
    if result.is_error() {
        exec.state.dispose_transaction(txn);
        return result;
    }
    if exec.state.complete_transaction(txn).is_err() {
        return CommandResult::Error;
    }
    exec.session.last_command = Some(effective);
    CommandResult::Completed(ModeSwitch::NoSwitch)
}

/// `"1p` then `.` pastes register 2, then 3, capped at 9.
fn advance_redo_register(mut stored: StoredCommand) -> StoredCommand {
    if let StoredCommand::Normal { command, data } = &mut stored {
        let is_put = matches!(
            command,
            NormalCommand::PutAfterCaret { .. } | NormalCommand::PutBeforeCaret { .. }
        );
        if is_put {
            if let Some(RegisterName::Numbered(n)) = data.register_name {
                if n >= 1 {
                    data.register_name = Some(RegisterName::Numbered((n + 1).min(9)));
                }
            }
        }
    }
    stored
}

/// A count on `.` overrides every stored count, including the motion's own.
fn apply_count_override(stored: &StoredCommand, count: Option<usize>) -> StoredCommand {
    let Some(count) = count else {
        return stored.clone();
    };
    let mut stored = stored.clone();
    match &mut stored {
        StoredCommand::Normal { command, data } => {
            data.count = Some(count);
            if let NormalCommand::DeleteMotion(m)
            | NormalCommand::ChangeMotion(m)
            | NormalCommand::YankMotion(m) = command
            {
                m.count = None;
            }
        }
        StoredCommand::Visual { data, .. } | StoredCommand::Insert { data, .. } => {
            data.count = Some(count);
        }
        StoredCommand::Linked(first, _) => {
            **first = apply_count_override(first, Some(count));
        }
    }
    stored
}

fn run_stored(exec: &mut CommandExecutor, stored: &StoredCommand) -> CommandResult {
    let result = run_stored_raw(exec, stored);
    settle(exec, result)
}

fn run_stored_raw(exec: &mut CommandExecutor, stored: &StoredCommand) -> CommandResult {
    match stored {
        StoredCommand::Normal { command, data } => exec.run_normal_command(command, *data),
        StoredCommand::Visual {
            command,
            data,
            shape,
        } => {
            let span = shape.rehydrate(
                exec.state.buffer(),
                exec.state.caret(),
                exec.state.config.tabstop,
            );
            exec.run_visual_command(*command, *data, &span)
        }
        StoredCommand::Insert { command, data } => replay_insert(exec, command, *data),
        StoredCommand::Linked(first, second) => match run_stored_raw(exec, first) {
            CommandResult::Error => CommandResult::Error,
            CommandResult::Completed(ModeSwitch::SwitchModeWithArgument(
                _,
                ModeArgument::InsertWithTransaction(txn),
            )) => {
                // The change half left insert mode open; the insert half
                // replays into it, then the shared transaction closes.
                let result = run_stored(exec, second);
                if exec.state.complete_transaction(txn).is_err() {
                    return CommandResult::Error;
                }
                exec.session.link_pending = false;
                exec.state.set_mode(ModeKind::Normal);
                result
            }
            _ => run_stored(exec, second),
        },
    }
}

/// A replayed half that entered insert mode without a linked insert to fill
/// it must not leave its transaction dangling.
fn settle(exec: &mut CommandExecutor, result: CommandResult) -> CommandResult {
    if let CommandResult::Completed(ModeSwitch::SwitchModeWithArgument(
        _,
        ModeArgument::InsertWithTransaction(txn),
    )) = result
    {
        if exec.state.complete_transaction(txn).is_err() {
            return CommandResult::Error;
        }
        exec.session.link_pending = false;
        exec.state.set_mode(ModeKind::Normal);
        return CommandResult::Completed(ModeSwitch::NoSwitch);
    }
    result
}

/// Replay a recorded insert as if typed and closed with Esc.
fn replay_insert(
    exec: &mut CommandExecutor,
    command: &InsertCommand,
    data: CommandData,
) -> CommandResult {
    // Replay must not look like a live insert session.
    let saved = std::mem::take(&mut exec.session.insert_keys);
    let result = match command {
        InsertCommand::Combined(first, second) => {
            let r = exec.run_insert_command(first, data);
            if r.is_error() {
                r
            } else {
                exec.run_insert_command(second, CommandData::default())
            }
        }
        other => exec.run_insert_command(other, data),
    };
    exec.session.insert_keys = saved;
    if result.is_error() {
        return result;
    }
    let caret = exec.state.caret();
    if caret.byte > 0 {
        let line = exec.state.buffer().line_content(caret.line).unwrap_or_default();
        exec.state.set_caret(core_text::Position::new(
            caret.line,
            grapheme::prev_boundary(&line, caret.byte),
        ));
    }
    CommandResult::Completed(ModeSwitch::NoSwitch)
}
