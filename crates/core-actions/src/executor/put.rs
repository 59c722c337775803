//! Put commands.
//!
//! Placement depends on the register's operation kind: character-wise text
//! lands at or after the caret, line-wise text lands on a line boundary, and
//! block text explodes row by row down the buffer at the caret's display
//! column, padding short lines and creating lines past the end.

use core_state::{OperationKind, RegisterValue, StringData};
use core_state::LinkedUndoFlags;
use core_text::{grapheme, Position};

use crate::{CommandData, CommandResult, ModeSwitch};

use super::CommandExecutor;

pub(crate) fn put_in_normal_mode(
    exec: &mut CommandExecutor,
    data: CommandData,
    after: bool,
    with_indent: bool,
) -> CommandResult {
    let value = exec.state.registers.get(data.register_name);
    if value.is_empty() {
        exec.host.beep();
        return CommandResult::Error;
    }
    let txn = exec.state.begin_transaction("put", LinkedUndoFlags::empty());
    put_value_at_caret(exec, &value, data.count_or_default(), after, with_indent);
    if exec.state.complete_transaction(txn).is_err() {
        return CommandResult::Error;
    }
    CommandResult::Completed(ModeSwitch::NoSwitch)
}

/// Insert a register value relative to the caret. The caller owns the undo
/// transaction.
pub(crate) fn put_value_at_caret(
    exec: &mut CommandExecutor,
    value: &RegisterValue,
    count: usize,
    after: bool,
    with_indent: bool,
) {
    let data = value.data().apply_count(count);
    match (value.kind(), &data) {
        (OperationKind::LineWise, _) => put_line_wise(exec, &data, after, with_indent),
        (OperationKind::CharacterWise, StringData::Block(rows)) => {
            put_block(exec, rows, after)
        }
        (OperationKind::CharacterWise, StringData::Simple(text)) => {
            put_character_wise(exec, text, after)
        }
    }
}

fn put_character_wise(exec: &mut CommandExecutor, text: &str, after: bool) {
    let caret = exec.state.caret();
    let line = exec.state.buffer().line_content(caret.line).unwrap_or_default();
    let byte = if after && !line.is_empty() {
        grapheme::next_boundary(&line, caret.byte)
    } else {
        caret.byte
    };
    let at = exec.state.buffer().line_start_abs(caret.line) + byte;
    exec.state.buffer_mut().insert(at, text);
    // Caret lands on the last pasted grapheme.
    let end = exec.state.buffer().position_of(at + text.len());
    let end_line = exec.state.buffer().line_content(end.line).unwrap_or_default();
    let last = grapheme::prev_boundary(&end_line, end.byte);
    exec.state.set_caret(Position::new(end.line, last));
}

fn put_line_wise(exec: &mut CommandExecutor, data: &StringData, after: bool, with_indent: bool) {
    let caret = exec.state.caret();
    let mut text = data.to_text();
    if !text.ends_with('\n') {
        text.push('\n');
    }
    if with_indent {
        text = reindent(&text, &leading_whitespace(exec, caret.line));
    }
    let buffer = exec.state.buffer();
    let at = if buffer.is_empty() {
        // An empty buffer has no line to put "below"; the text becomes the
        // whole content.
        0
    } else if after {
        buffer.line_span(caret.line, 1).end
    } else {
        buffer.line_start_abs(caret.line)
    };
    exec.state.buffer_mut().insert(at, &text);
    let line = exec.state.buffer().position_of(at).line;
    let byte = exec.state.buffer().first_non_blank(line);
    exec.state.set_caret(Position::new(line, byte));
}

fn put_block(exec: &mut CommandExecutor, rows: &[String], after: bool) {
    let caret = exec.state.caret();
    let tabstop = exec.state.config.tabstop;
    let line = exec.state.buffer().line_content(caret.line).unwrap_or_default();
    let anchor_byte = if after && !line.is_empty() {
        grapheme::next_boundary(&line, caret.byte)
    } else {
        caret.byte
    };
    let col = grapheme::display_col(&line, anchor_byte, tabstop);
    let mut first = None;
    for (i, row) in rows.iter().enumerate() {
        let target = caret.line + i;
        if target >= exec.state.buffer().content_line_count() {
            let end = exec.state.buffer().len_bytes();
            exec.state.buffer_mut().insert(end, "\n");
        }
        let content = exec.state.buffer().line_content(target).unwrap_or_default();
        let byte = grapheme::byte_for_col(&content, col, tabstop);
        let have = grapheme::display_col(&content, byte, tabstop);
        // Short line: pad out to the block column with spaces.
        let padding = " ".repeat(col.saturating_sub(have));
        let at = exec.state.buffer().line_start_abs(target) + byte;
        exec.state.buffer_mut().insert(at, &format!("{padding}{row}"));
        if first.is_none() {
            first = Some(Position::new(target, byte + padding.len()));
        }
    }
    if let Some(pos) = first {
        exec.state.set_caret(pos);
    }
}

fn leading_whitespace(exec: &CommandExecutor, line: usize) -> String {
    let content = exec.state.buffer().line_content(line).unwrap_or_default();
    let end = exec.state.buffer().first_non_blank(line);
    content[..end.min(content.len())].to_string()
}

/// Replace each line's indent with `indent`, keeping blank lines blank.
fn reindent(text: &str, indent: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for line in text.split_inclusive('\n') {
        let body = line.trim_start_matches([' ', '\t']);
        if body == "\n" || body.is_empty() {
            out.push_str(body);
        } else {
            out.push_str(indent);
            out.push_str(body);
        }
    }
    out
}
