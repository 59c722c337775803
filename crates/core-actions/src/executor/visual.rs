//! Visual-mode commands.
//!
//! The selection arrives as a resolved [`VisualSpan`]; the executor never
//! tracks anchors itself. Block selections extract and delete one span per
//! row, captured as block register data so a later put re-explodes them.

use core_state::{
    LinkedUndoFlags, ModeKind, OperationKind, RegisterOperation, RegisterValue, StringData,
    VisualSpan,
};
use core_text::{EditBatch, Position};

use crate::{CommandData, CommandResult, ModeArgument, ModeSwitch, VisualCommand};

use super::{put, CommandExecutor};

pub(crate) fn run(
    exec: &mut CommandExecutor,
    command: VisualCommand,
    data: CommandData,
    span: &VisualSpan,
) -> CommandResult {
    match command {
        VisualCommand::YankSelection => yank(exec, data, span),
        VisualCommand::DeleteSelection => delete(exec, data, span, false),
        VisualCommand::ChangeSelection => delete(exec, data, span, true),
        VisualCommand::PutOverSelection => put_over(exec, data, span),
        VisualCommand::JoinSelection => join(exec, span),
        VisualCommand::FoldSelection => {
            let range = span.line_range(exec.state.buffer());
            exec.folds.create_fold(range);
            CommandResult::Completed(ModeSwitch::SwitchMode(ModeKind::Normal))
        }
    }
}

/// Selection content in register form.
fn extract(exec: &CommandExecutor, span: &VisualSpan) -> RegisterValue {
    let buffer = exec.state.buffer();
    match span {
        VisualSpan::Block { .. } => {
            let rows = span
                .edit_spans(buffer)
                .into_iter()
                .map(|s| buffer.slice(s))
                .collect();
            RegisterValue::character_wise(StringData::block(rows))
        }
        _ => {
            let text = span
                .edit_spans(buffer)
                .into_iter()
                .map(|s| buffer.slice(s))
                .collect::<String>();
            RegisterValue::new(StringData::simple(text), span.operation_kind())
        }
    }
}

fn register_op(span: &VisualSpan) -> RegisterOperation {
    match span.operation_kind() {
        OperationKind::LineWise => RegisterOperation::BigDelete,
        OperationKind::CharacterWise => RegisterOperation::Delete,
    }
}

fn yank(exec: &mut CommandExecutor, data: CommandData, span: &VisualSpan) -> CommandResult {
    let value = extract(exec, span);
    exec.capture(data, value, RegisterOperation::Yank);
    exec.state.set_caret(span.start());
    CommandResult::Completed(ModeSwitch::SwitchMode(ModeKind::Normal))
}

fn delete_spans(exec: &mut CommandExecutor, span: &VisualSpan) {
    let spans = span.edit_spans(exec.state.buffer());
    let mut batch = EditBatch::new();
    for s in spans {
        batch.delete(s);
    }
    batch.apply(exec.state.buffer_mut());
}

fn delete(
    exec: &mut CommandExecutor,
    data: CommandData,
    span: &VisualSpan,
    change: bool,
) -> CommandResult {
    let value = extract(exec, span);
    let start = span.start();
    let line_wise = span.operation_kind() == OperationKind::LineWise;
    exec.state.set_caret(start);
    let txn = exec.state.begin_transaction(
        if change { "change selection" } else { "delete selection" },
        LinkedUndoFlags::empty(),
    );
    let op = register_op(span);
    if line_wise && change {
        // cc-style: the selected lines collapse to one empty line.
        let s = span.edit_spans(exec.state.buffer())[0];
        exec.state.buffer_mut().replace(s, "\n");
        exec.state.set_caret(Position::new(start.line, 0));
    } else {
        delete_spans(exec, span);
    }
    exec.capture(data, value, op);
    if change {
        exec.session.link_pending = true;
        return CommandResult::Completed(ModeSwitch::SwitchModeWithArgument(
            ModeKind::Insert,
            ModeArgument::InsertWithTransaction(txn),
        ));
    }
    if exec.state.complete_transaction(txn).is_err() {
        return CommandResult::Error;
    }
    let caret = if line_wise {
        let line = start
            .line
            .min(exec.state.buffer().content_line_count().saturating_sub(1));
        Position::new(line, exec.state.buffer().first_non_blank(line))
    } else {
        super::operator::clamp_to_line(exec.state.buffer(), start)
    };
    exec.state.set_caret(caret);
    CommandResult::Completed(ModeSwitch::SwitchMode(ModeKind::Normal))
}

/// Replace the selection with a register's content. The register is read
/// before the deleted text overwrites the unnamed register.
fn put_over(exec: &mut CommandExecutor, data: CommandData, span: &VisualSpan) -> CommandResult {
    let value = exec.state.registers.get(data.register_name);
    if value.is_empty() {
        exec.host.beep();
        return CommandResult::Error;
    }
    let deleted = extract(exec, span);
    let start = span.start();
    exec.state.set_caret(start);
    let txn = exec.state.begin_transaction("put over selection", LinkedUndoFlags::empty());
    let line_wise_selection = span.operation_kind() == OperationKind::LineWise;
    if line_wise_selection {
        let s = span.edit_spans(exec.state.buffer())[0];
        exec.state.buffer_mut().delete(s);
        let line = start
            .line
            .min(exec.state.buffer().content_line_count().saturating_sub(1));
        exec.state.set_caret(Position::new(line, 0));
        match value.kind() {
            // Pasting line-wise over lines lands where they were.
            OperationKind::LineWise => {
                put::put_value_at_caret(exec, &value, data.count_or_default(), false, false);
            }
            OperationKind::CharacterWise => {
                let at = exec.state.buffer().line_start_abs(exec.state.caret().line);
                let mut text = value.data().apply_count(data.count_or_default()).to_text();
                text.push('\n');
                exec.state.buffer_mut().insert(at, &text);
                let caret = exec.state.buffer().position_of(at);
                exec.state.set_caret(caret);
            }
        }
    } else {
        delete_spans(exec, span);
        exec.state
            .set_caret(super::operator::clamp_to_line(exec.state.buffer(), start));
        // The deleted text is gone, so the caret now sits where the new text
        // goes; a character-wise put lands before it.
        let after = value.kind() == OperationKind::LineWise;
        put::put_value_at_caret(exec, &value, data.count_or_default(), after, false);
    }
    exec.capture(data, deleted, register_op(span));
    if exec.state.complete_transaction(txn).is_err() {
        return CommandResult::Error;
    }
    CommandResult::Completed(ModeSwitch::SwitchMode(ModeKind::Normal))
}

fn join(exec: &mut CommandExecutor, span: &VisualSpan) -> CommandResult {
    let range = span.line_range(exec.state.buffer());
    exec.state.set_caret(Position::new(range.start_line, 0));
    // A one-line selection still joins with the line below, like J.
    match super::normal::join_lines(exec, CommandData::with_count(range.count)) {
        CommandResult::Completed(_) => {
            CommandResult::Completed(ModeSwitch::SwitchMode(ModeKind::Normal))
        }
        err => err,
    }
}
