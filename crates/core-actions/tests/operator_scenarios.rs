//! Operator and put scenarios exercised end to end through the executor.

use core_actions::executor::take_insert_transaction;
use core_actions::{
    CommandData, CommandExecutor, CommandResult, DefaultMotionEngine, InsertCommand, Motion,
    MotionRequest, NopFoldManager, NopHost, NormalCommand, VisualCommand,
};
use core_state::{
    LineRange, ModeKind, OperationKind, RegisterName, RegisterValue, StringData, VimState,
    VisualSpan,
};
use core_text::Position;
use pretty_assertions::assert_eq;

struct Fixture {
    state: VimState,
    session: core_actions::VimSession,
    motions: DefaultMotionEngine,
    host: NopHost,
    folds: NopFoldManager,
}

impl Fixture {
    fn new(text: &str) -> Self {
        Self {
            state: VimState::from_text(text).unwrap(),
            session: core_actions::VimSession::new(),
            motions: DefaultMotionEngine::new(),
            host: NopHost::default(),
            folds: NopFoldManager::default(),
        }
    }

    fn exec(&mut self) -> CommandExecutor<'_> {
        CommandExecutor::new(
            &mut self.state,
            &mut self.session,
            &self.motions,
            &mut self.host,
            &mut self.folds,
        )
    }

    fn normal(&mut self, command: NormalCommand, data: CommandData) -> CommandResult {
        self.exec().run_normal_command(&command, data)
    }

    fn visual(
        &mut self,
        command: VisualCommand,
        data: CommandData,
        span: &VisualSpan,
    ) -> CommandResult {
        self.exec().run_visual_command(command, data, span)
    }

    fn text(&self) -> String {
        self.state.buffer().text()
    }

    fn unnamed(&self) -> String {
        self.state.registers.get(None).data().to_text()
    }

    fn register(&self, name: RegisterName) -> RegisterValue {
        self.state.registers.get(Some(name))
    }
}

fn delete_word() -> NormalCommand {
    NormalCommand::DeleteMotion(Motion::new(MotionRequest::WordForward))
}

#[test]
fn delete_word_captures_register_and_moves_caret() {
    let mut f = Fixture::new("one two three\n");
    let result = f.normal(delete_word(), CommandData::default());
    assert!(!result.is_error());
    assert_eq!(f.text(), "two three\n");
    assert_eq!(f.unnamed(), "one ");
    assert_eq!(f.state.caret(), Position::origin());
    // Within-line word delete is small: history register 1 stays empty.
    assert!(f.register(RegisterName::Numbered(1)).is_empty());
}

#[test]
fn delete_word_with_count() {
    let mut f = Fixture::new("a b c d\n");
    f.normal(delete_word(), CommandData::with_count(2));
    assert_eq!(f.text(), "c d\n");
    assert_eq!(f.unnamed(), "a b ");
}

#[test]
fn failed_motion_leaves_no_trace() {
    let mut f = Fixture::new("one\ntwo\n");
    let result = f.normal(
        NormalCommand::DeleteMotion(Motion::new(MotionRequest::Up)),
        CommandData::default(),
    );
    assert!(result.is_error());
    assert_eq!(f.host.beeps, 1);
    assert_eq!(f.text(), "one\ntwo\n");
    assert!(!f.state.undo(), "no undo entry for a failed motion");
}

#[test]
fn change_word_keeps_trailing_whitespace() {
    let mut f = Fixture::new("one two\n");
    let result = f.normal(
        NormalCommand::ChangeMotion(Motion::new(MotionRequest::WordForward)),
        CommandData::default(),
    );
    assert_eq!(f.state.mode(), ModeKind::Insert);
    assert_eq!(f.text(), " two\n", "cw eats the word, not the space");
    let txn = take_insert_transaction(result).expect("change opens a transaction");
    f.exec()
        .run_insert_command(&InsertCommand::InsertText("1".into()), CommandData::default());
    f.exec().leave_insert(Some(txn));
    assert_eq!(f.text(), "1 two\n");
    assert!(f.state.undo());
    assert_eq!(f.text(), "one two\n", "change and typed text undo together");
}

#[test]
fn delete_lines_shift_numbered_history() {
    let mut f = Fixture::new("first\nsecond\nthird\n");
    f.normal(NormalCommand::DeleteLines, CommandData::default());
    assert_eq!(f.text(), "second\nthird\n");
    f.normal(NormalCommand::DeleteLines, CommandData::default());
    assert_eq!(f.text(), "third\n");
    assert_eq!(
        f.register(RegisterName::Numbered(1)).data().to_text(),
        "second\n"
    );
    assert_eq!(
        f.register(RegisterName::Numbered(2)).data().to_text(),
        "first\n"
    );
    assert_eq!(
        f.register(RegisterName::Numbered(1)).kind(),
        OperationKind::LineWise
    );
}

#[test]
fn yank_lines_then_put_below() {
    let mut f = Fixture::new("  alpha\nbeta\n");
    f.normal(NormalCommand::YankLines, CommandData::default());
    assert_eq!(f.register(RegisterName::Numbered(0)).data().to_text(), "  alpha\n");
    f.normal(
        NormalCommand::PutAfterCaret { with_indent: false },
        CommandData::default(),
    );
    assert_eq!(f.text(), "  alpha\n  alpha\nbeta\n");
    // Caret lands on the first non-blank of the pasted line.
    assert_eq!(f.state.caret(), Position::new(1, 2));
}

#[test]
fn charwise_put_after_caret() {
    let mut f = Fixture::new("ab\n");
    f.state.registers.set(
        None,
        RegisterValue::character_wise(StringData::simple("XY")),
        core_state::RegisterOperation::Yank,
    );
    f.normal(
        NormalCommand::PutAfterCaret { with_indent: false },
        CommandData::default(),
    );
    assert_eq!(f.text(), "aXYb\n");
    assert_eq!(f.state.caret(), Position::new(0, 2), "caret on last pasted char");
}

#[test]
fn put_with_count_repeats_text() {
    let mut f = Fixture::new("x\n");
    f.state.registers.set(
        None,
        RegisterValue::character_wise(StringData::simple("ab")),
        core_state::RegisterOperation::Yank,
    );
    f.normal(
        NormalCommand::PutBeforeCaret { with_indent: false },
        CommandData::with_count(3),
    );
    assert_eq!(f.text(), "abababx\n");
}

#[test]
fn linewise_put_into_empty_buffer() {
    let mut f = Fixture::new("");
    f.state.registers.set(
        None,
        RegisterValue::line_wise(StringData::simple("hello\n")),
        core_state::RegisterOperation::Yank,
    );
    f.normal(
        NormalCommand::PutAfterCaret { with_indent: false },
        CommandData::default(),
    );
    assert_eq!(f.text(), "hello\n", "no blank line above the put");
}

#[test]
fn put_from_empty_register_fails() {
    let mut f = Fixture::new("text\n");
    let result = f.normal(
        NormalCommand::PutAfterCaret { with_indent: false },
        CommandData::with_register(RegisterName::Named('z')),
    );
    assert!(result.is_error());
    assert_eq!(f.host.beeps, 1);
    assert_eq!(f.text(), "text\n");
}

#[test]
fn block_put_explodes_per_line() {
    let mut f = Fixture::new("xyz\nuvw\n");
    f.state.registers.set(
        None,
        RegisterValue::character_wise(StringData::block(vec!["ab".into(), "cd".into()])),
        core_state::RegisterOperation::Yank,
    );
    f.normal(
        NormalCommand::PutAfterCaret { with_indent: false },
        CommandData::default(),
    );
    assert_eq!(f.text(), "xabyz\nucdvw\n");
    assert_eq!(f.state.caret(), Position::new(0, 1));
}

#[test]
fn block_put_pads_short_lines() {
    let mut f = Fixture::new("long line\nab\n");
    f.state.set_caret(Position::new(0, 4));
    f.state.registers.set(
        None,
        RegisterValue::character_wise(StringData::block(vec!["##".into(), "##".into()])),
        core_state::RegisterOperation::Yank,
    );
    f.normal(
        NormalCommand::PutAfterCaret { with_indent: false },
        CommandData::default(),
    );
    assert_eq!(f.text(), "long ##line\nab   ##\n");
}

#[test]
fn delete_promotes_to_linewise_when_only_whitespace_remains() {
    let mut f = Fixture::new("cat \ndog  \nfish\n");
    let result = f.normal(
        NormalCommand::DeleteMotion(Motion::new(MotionRequest::Search {
            pattern: "  ".into(),
        })),
        CommandData::default(),
    );
    assert!(!result.is_error());
    assert_eq!(f.text(), "fish\n", "whole lines deleted, not just the span");
    let captured = f.register(RegisterName::Numbered(1));
    assert_eq!(captured.kind(), OperationKind::LineWise);
    assert_eq!(captured.data().to_text(), "cat \ndog  \n");
}

#[test]
fn delete_character_at_caret() {
    let mut f = Fixture::new("abc\n");
    f.normal(NormalCommand::DeleteCharacterAtCaret, CommandData::with_count(2));
    assert_eq!(f.text(), "c\n");
    assert_eq!(f.unnamed(), "ab");
}

#[test]
fn delete_character_before_caret() {
    let mut f = Fixture::new("abc\n");
    f.state.set_caret(Position::new(0, 2));
    f.normal(NormalCommand::DeleteCharacterBeforeCaret, CommandData::default());
    assert_eq!(f.text(), "ac\n");
    assert_eq!(f.state.caret(), Position::new(0, 1));
}

#[test]
fn join_lines_collapses_indent() {
    let mut f = Fixture::new("one\n   two\nthree\n");
    f.normal(NormalCommand::JoinLines, CommandData::default());
    assert_eq!(f.text(), "one two\nthree\n");
    assert_eq!(f.state.caret(), Position::new(0, 3), "caret at the join point");
}

#[test]
fn join_on_last_line_beeps_without_aborting() {
    let mut f = Fixture::new("only\n");
    let result = f.normal(NormalCommand::JoinLines, CommandData::default());
    assert!(!result.is_error(), "recoverable failure stays in-band");
    assert_eq!(f.host.beeps, 1);
    assert_eq!(f.text(), "only\n");
}

#[test]
fn replace_char_with_count() {
    let mut f = Fixture::new("abcdef\n");
    f.normal(NormalCommand::ReplaceChar('x'), CommandData::with_count(3));
    assert_eq!(f.text(), "xxxdef\n");
    assert_eq!(f.state.caret(), Position::new(0, 2));
}

#[test]
fn replace_char_past_line_end_fails_without_editing() {
    let mut f = Fixture::new("ab\n");
    let result = f.normal(NormalCommand::ReplaceChar('x'), CommandData::with_count(5));
    assert!(result.is_error());
    assert_eq!(f.text(), "ab\n");
}

#[test]
fn add_to_word_lands_on_last_digit() {
    let mut f = Fixture::new("count = 41;\n");
    f.normal(NormalCommand::AddToWord, CommandData::default());
    assert_eq!(f.text(), "count = 42;\n");
    assert_eq!(f.state.caret(), Position::new(0, 9), "caret on the 2");
}

#[test]
fn subtract_from_word_with_count() {
    let mut f = Fixture::new("n = 10\n");
    f.normal(NormalCommand::SubtractFromWord, CommandData::with_count(4));
    assert_eq!(f.text(), "n = 6\n");
}

#[test]
fn visual_character_delete() {
    let mut f = Fixture::new("hello world\n");
    let span = VisualSpan::Character {
        start: Position::origin(),
        line_count: 1,
        last_line_len: 6,
    };
    f.visual(VisualCommand::DeleteSelection, CommandData::default(), &span);
    assert_eq!(f.text(), "world\n");
    assert_eq!(f.unnamed(), "hello ");
    assert_eq!(f.state.mode(), ModeKind::Normal);
}

#[test]
fn visual_line_yank_is_linewise() {
    let mut f = Fixture::new("one\ntwo\nthree\n");
    let span = VisualSpan::Line(LineRange::new(1, 2));
    f.visual(VisualCommand::YankSelection, CommandData::default(), &span);
    let v = f.register(RegisterName::Numbered(0));
    assert_eq!(v.kind(), OperationKind::LineWise);
    assert_eq!(v.data().to_text(), "two\nthree\n");
    assert_eq!(f.text(), "one\ntwo\nthree\n");
}

#[test]
fn visual_block_yank_captures_rows() {
    let mut f = Fixture::new("abcdef\nghijkl\n");
    let span = VisualSpan::Block {
        anchor: Position::new(0, 1),
        tabstop: 8,
        width: 2,
        height: 2,
    };
    f.visual(VisualCommand::YankSelection, CommandData::default(), &span);
    let v = f.register(RegisterName::Numbered(0));
    assert_eq!(
        v.data(),
        &StringData::block(vec!["bc".into(), "hi".into()]),
        "block shape travels in the payload"
    );
    assert_eq!(v.kind(), OperationKind::CharacterWise);
}

#[test]
fn visual_block_delete_removes_rectangle() {
    let mut f = Fixture::new("abcdef\nghijkl\nmnopqr\n");
    let span = VisualSpan::Block {
        anchor: Position::new(0, 1),
        tabstop: 8,
        width: 2,
        height: 3,
    };
    f.visual(VisualCommand::DeleteSelection, CommandData::default(), &span);
    assert_eq!(f.text(), "adef\ngjkl\nmpqr\n");
}

#[test]
fn put_over_selection_reads_register_before_overwrite() {
    let mut f = Fixture::new("old old\n");
    f.state.registers.set(
        None,
        RegisterValue::character_wise(StringData::simple("new")),
        core_state::RegisterOperation::Yank,
    );
    let span = VisualSpan::Character {
        start: Position::origin(),
        line_count: 1,
        last_line_len: 3,
    };
    f.visual(VisualCommand::PutOverSelection, CommandData::default(), &span);
    assert_eq!(f.text(), "new old\n");
    assert_eq!(f.unnamed(), "old", "deleted selection lands in the unnamed register");
}

#[test]
fn named_register_and_uppercase_append() {
    let mut f = Fixture::new("one two\n");
    f.normal(
        NormalCommand::YankMotion(Motion::new(MotionRequest::WordForward)),
        CommandData::with_register(RegisterName::Named('a')),
    );
    f.state.set_caret(Position::new(0, 4));
    f.normal(
        NormalCommand::YankMotion(Motion::new(MotionRequest::EndOfLine)),
        CommandData::with_register(RegisterName::Named('A')),
    );
    assert_eq!(
        f.register(RegisterName::Named('a')).data().to_text(),
        "one two"
    );
}

#[test]
fn undo_redo_round_trip() {
    let mut f = Fixture::new("keep\n");
    f.normal(NormalCommand::DeleteLines, CommandData::default());
    assert_eq!(f.text(), "");
    f.normal(NormalCommand::Undo, CommandData::default());
    assert_eq!(f.text(), "keep\n");
    f.normal(NormalCommand::Redo, CommandData::default());
    assert_eq!(f.text(), "");
}

#[test]
fn fold_selection_requests_range() {
    let mut f = Fixture::new("a\nb\nc\n");
    let span = VisualSpan::Line(LineRange::new(0, 2));
    f.visual(VisualCommand::FoldSelection, CommandData::default(), &span);
    assert_eq!(
        f.folds.requests,
        vec![core_actions::FoldRequest::Create(LineRange::new(0, 2))]
    );
}
