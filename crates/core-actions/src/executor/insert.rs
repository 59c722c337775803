//! Insert-mode commands.
//!
//! These run under the transaction opened at insert entry; no transaction
//! management happens here. Typed text also accumulates on the session so
//! leaving insert mode can record it for `".` and `.`.

use core_text::{grapheme, Position, Span};

use crate::{CommandData, CommandResult, InsertCommand, ModeSwitch};

use super::CommandExecutor;

pub(crate) fn run(
    exec: &mut CommandExecutor,
    command: &InsertCommand,
    data: CommandData,
) -> CommandResult {
    match command {
        InsertCommand::InsertText(text) => {
            let text = text.repeat(data.count_or_default());
            let abs = exec.state.buffer().abs_of(exec.state.caret());
            exec.state.buffer_mut().insert(abs, &text);
            let caret = exec.state.buffer().position_of(abs + text.len());
            exec.state.set_caret(caret);
            exec.session.insert_keys.push_str(&text);
        }
        InsertCommand::InsertNewLine => {
            let mut caret = exec.state.caret();
            exec.state.buffer_mut().insert_newline(&mut caret);
            exec.state.set_caret(caret);
            exec.session.insert_keys.push('\n');
        }
        InsertCommand::Back => {
            let caret = exec.state.caret();
            if caret.byte > 0 {
                let mut pos = caret;
                exec.state.buffer_mut().delete_grapheme_before(&mut pos);
                exec.state.set_caret(pos);
            } else if caret.line > 0 {
                // Backspace at line start joins with the previous line.
                let prev_len = exec.state.buffer().line_byte_len(caret.line - 1);
                let start = exec.state.buffer().line_start_abs(caret.line);
                exec.state.buffer_mut().delete(Span::new(start - 1, start));
                exec.state.set_caret(Position::new(caret.line - 1, prev_len));
            } else {
                exec.host.beep();
                return CommandResult::Error;
            }
            exec.session.insert_keys.pop();
        }
        InsertCommand::Delete => {
            let caret = exec.state.caret();
            let line_len = exec.state.buffer().line_byte_len(caret.line);
            if caret.byte < line_len {
                exec.state.buffer_mut().delete_grapheme_at(&caret);
            } else if caret.line + 1 < exec.state.buffer().content_line_count() {
                let at = exec.state.buffer().abs_of(caret);
                exec.state.buffer_mut().delete(Span::new(at, at + 1));
            } else {
                exec.host.beep();
                return CommandResult::Error;
            }
        }
        InsertCommand::MoveCaretLeft => {
            let caret = exec.state.caret();
            let line = exec.state.buffer().line_content(caret.line).unwrap_or_default();
            exec.state.set_caret(Position::new(
                caret.line,
                grapheme::prev_boundary(&line, caret.byte),
            ));
        }
        InsertCommand::Combined(first, second) => {
            let result = run(exec, first, data);
            if result.is_error() {
                return result;
            }
            return run(exec, second, CommandData::default());
        }
    }
    CommandResult::Completed(ModeSwitch::NoSwitch)
}
