//! Single-key normal-mode edits and insert-mode entry.

use core_state::{
    LinkedUndoFlags, ModeKind, RegisterOperation, RegisterValue, StringData,
};
use core_text::{grapheme, Position};

use crate::{CommandData, CommandResult, ModeArgument, ModeSwitch, NormalCommand};

use super::CommandExecutor;

/// `x` / `X`: delete count graphemes at or before the caret, staying on the
/// caret line.
pub(crate) fn delete_character(
    exec: &mut CommandExecutor,
    data: CommandData,
    before: bool,
) -> CommandResult {
    let caret = exec.state.caret();
    let line_len = exec.state.buffer().line_byte_len(caret.line);
    if line_len == 0 || (before && caret.byte == 0) {
        exec.host.beep();
        return CommandResult::Error;
    }
    let count = data.count_or_default();
    let txn = exec.state.begin_transaction("delete character", LinkedUndoFlags::empty());
    let mut deleted = String::new();
    if before {
        let mut pos = caret;
        for _ in 0..count {
            if pos.byte == 0 {
                break;
            }
            let removed = exec.state.buffer_mut().delete_grapheme_before(&mut pos);
            deleted.insert_str(0, &removed);
        }
        exec.state.set_caret(pos);
    } else {
        for _ in 0..count {
            if exec.state.caret().byte >= exec.state.buffer().line_byte_len(caret.line) {
                break;
            }
            let pos = exec.state.caret();
            deleted.push_str(&exec.state.buffer_mut().delete_grapheme_at(&pos));
        }
        let pos = exec.state.caret();
        exec.state
            .set_caret(super::operator::clamp_to_line(exec.state.buffer(), pos));
    }
    if exec.state.complete_transaction(txn).is_err() {
        return CommandResult::Error;
    }
    exec.capture(
        data,
        RegisterValue::character_wise(StringData::simple(deleted)),
        RegisterOperation::Delete,
    );
    CommandResult::Completed(ModeSwitch::NoSwitch)
}

/// `J`: join count lines (minimum two), collapsing the next line's leading
/// whitespace into a single space.
pub(crate) fn join_lines(exec: &mut CommandExecutor, data: CommandData) -> CommandResult {
    let caret = exec.state.caret();
    let joins = data.count_or_default().max(2) - 1;
    let last_line = exec.state.buffer().content_line_count().saturating_sub(1);
    if caret.line >= last_line {
        // Nothing below to join with; recoverable, a chain keeps going.
        exec.host.beep();
        return CommandResult::Completed(ModeSwitch::NoSwitch);
    }
    let txn = exec.state.begin_transaction("join lines", LinkedUndoFlags::empty());
    let mut join_byte = caret.byte;
    for _ in 0..joins {
        let line = caret.line;
        if line >= exec.state.buffer().content_line_count().saturating_sub(1) {
            break;
        }
        let head_len = exec.state.buffer().line_byte_len(line);
        let next_indent = exec.state.buffer().first_non_blank(line + 1);
        let head_end = exec.state.buffer().line_start_abs(line) + head_len;
        let next_start = exec.state.buffer().line_start_abs(line + 1);
        // Replace the newline and the indent with one space; an empty tail
        // line joins without the space.
        let next_len = exec.state.buffer().line_byte_len(line + 1);
        let sep = if next_len == next_indent { "" } else { " " };
        exec.state
            .buffer_mut()
            .replace(core_text::Span::new(head_end, next_start + next_indent), sep);
        join_byte = head_len;
    }
    if exec.state.complete_transaction(txn).is_err() {
        return CommandResult::Error;
    }
    exec.state.set_caret(Position::new(caret.line, join_byte));
    CommandResult::Completed(ModeSwitch::NoSwitch)
}

/// `r`: replace count graphemes with the typed character. Fails without
/// editing when the line is shorter than the count.
pub(crate) fn replace_char(
    exec: &mut CommandExecutor,
    data: CommandData,
    c: char,
) -> CommandResult {
    let caret = exec.state.caret();
    let count = data.count_or_default();
    let line = exec.state.buffer().line_content(caret.line).unwrap_or_default();
    let graphemes_after = grapheme::iter(&line[caret.byte.min(line.len())..]).count();
    if count > graphemes_after {
        exec.host.beep();
        return CommandResult::Error;
    }
    let mut end = caret.byte;
    for _ in 0..count {
        end = grapheme::next_boundary(&line, end);
    }
    let replacement: String = if c == '\n' {
        "\n".to_string()
    } else {
        std::iter::repeat(c).take(count).collect()
    };
    let line_start = exec.state.buffer().line_start_abs(caret.line);
    let txn = exec.state.begin_transaction("replace character", LinkedUndoFlags::empty());
    exec.state.buffer_mut().replace(
        core_text::Span::new(line_start + caret.byte, line_start + end),
        &replacement,
    );
    if exec.state.complete_transaction(txn).is_err() {
        return CommandResult::Error;
    }
    // Caret lands on the last replaced character.
    let last = caret.byte + replacement.len().saturating_sub(c.len_utf8());
    exec.state.set_caret(Position::new(caret.line, last));
    CommandResult::Completed(ModeSwitch::NoSwitch)
}

/// The six ways into insert mode. Each opens the transaction that the host
/// hands back through `leave_insert`, so the entry, the typed text, and any
/// line opened become one undo step.
pub(crate) fn enter_insert(
    exec: &mut CommandExecutor,
    command: &NormalCommand,
    data: CommandData,
) -> CommandResult {
    let caret = exec.state.caret();
    let txn = exec.state.begin_transaction("insert", LinkedUndoFlags::CAN_BE_EMPTY);
    let target = match command {
        NormalCommand::InsertAtCaret => caret,
        NormalCommand::InsertAfterCaret => {
            let line = exec.state.buffer().line_content(caret.line).unwrap_or_default();
            Position::new(caret.line, grapheme::next_boundary(&line, caret.byte))
        }
        NormalCommand::InsertAtFirstNonBlank => {
            Position::new(caret.line, exec.state.buffer().first_non_blank(caret.line))
        }
        NormalCommand::InsertAtEndOfLine => {
            Position::new(caret.line, exec.state.buffer().line_byte_len(caret.line))
        }
        NormalCommand::InsertLineAbove => {
            let at = exec.state.buffer().line_start_abs(caret.line);
            exec.state.buffer_mut().insert(at, "\n");
            Position::new(caret.line, 0)
        }
        NormalCommand::InsertLineBelow => {
            let at = exec.state.buffer().line_start_abs(caret.line)
                + exec.state.buffer().line_byte_len(caret.line);
            exec.state.buffer_mut().insert(at, "\n");
            Position::new(caret.line + 1, 0)
        }
        _ => unreachable!("not an insert entry command"),
    };
    exec.state.set_caret(target);
    exec.session.insert_keys.clear();
    exec.session.insert_repeat = data.count;
    exec.session.link_pending = true;
    CommandResult::Completed(ModeSwitch::SwitchModeWithArgument(
        ModeKind::Insert,
        ModeArgument::InsertWithTransaction(txn),
    ))
}

pub(crate) fn undo(exec: &mut CommandExecutor, data: CommandData) -> CommandResult {
    for _ in 0..data.count_or_default() {
        if !exec.state.undo() {
            exec.host.on_status("Already at oldest change");
            break;
        }
    }
    CommandResult::Completed(ModeSwitch::NoSwitch)
}

pub(crate) fn redo(exec: &mut CommandExecutor, data: CommandData) -> CommandResult {
    for _ in 0..data.count_or_default() {
        if !exec.state.redo() {
            exec.host.on_status("Already at newest change");
            break;
        }
    }
    CommandResult::Completed(ModeSwitch::NoSwitch)
}
