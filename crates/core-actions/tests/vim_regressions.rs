//! Edge cases: caret placement after edits, put placement, counted inserts,
//! number-format configuration, and register-representable key recording.

use core_actions::{
    macros, CommandData, CommandExecutor, CommandResult, DefaultMotionEngine, InsertCommand,
    Motion, MotionRequest, NopFoldManager, NopHost, NormalCommand, VimSession, VisualCommand,
};
use core_actions::executor::take_insert_transaction;
use core_events::{KeyCode, KeyInput, KeyModifiers};
use core_state::{
    ModeKind, OperationKind, Position, RegisterName, RegisterOperation, RegisterValue,
    StringData, VimState, VisualSpan,
};
use core_text::LineRange;
use pretty_assertions::assert_eq;

struct Fixture {
    state: VimState,
    session: VimSession,
    motions: DefaultMotionEngine,
    host: NopHost,
    folds: NopFoldManager,
}

impl Fixture {
    fn new(text: &str) -> Self {
        Self {
            state: VimState::from_text(text).unwrap(),
            session: VimSession::new(),
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

    fn text(&self) -> String {
        self.state.buffer().text()
    }

    fn unnamed(&self) -> String {
        self.state.registers.text_of(None)
    }

    fn fill_unnamed(&mut self, value: RegisterValue) {
        self.state
            .registers
            .set(None, value, RegisterOperation::Yank);
    }
}

#[test]
fn undo_restores_caret_with_text() {
    let mut f = Fixture::new("abc\n");
    f.state.set_caret(Position::new(0, 2));
    f.normal(NormalCommand::DeleteCharacterAtCaret, CommandData::default());
    assert_eq!(f.text(), "ab\n");
    assert!(f.state.undo());
    assert_eq!(f.text(), "abc\n");
    assert_eq!(f.state.caret(), Position::new(0, 2));
}

#[test]
fn delete_before_caret_stops_at_line_start() {
    let mut f = Fixture::new("abc\n");
    f.state.set_caret(Position::new(0, 2));
    f.normal(
        NormalCommand::DeleteCharacterBeforeCaret,
        CommandData::with_count(3),
    );
    assert_eq!(f.text(), "c\n");
    assert_eq!(f.state.caret(), Position::origin());
    assert_eq!(f.unnamed(), "ab");
}

#[test]
fn change_keeps_whitespace_only_coverage() {
    let mut f = Fixture::new("a   b\n");
    f.state.set_caret(Position::new(0, 1));
    let result = f.exec().run_normal_command(
        &NormalCommand::ChangeMotion(Motion::new(MotionRequest::WordForward)),
        CommandData::default(),
    );
    // All-whitespace coverage is not trimmed; the spaces go.
    assert_eq!(f.text(), "ab\n");
    let txn = take_insert_transaction(result).unwrap();
    f.exec().leave_insert(Some(txn));
    assert_eq!(f.text(), "ab\n");
}

#[test]
fn yank_backward_moves_caret_to_span_start() {
    let mut f = Fixture::new("foo bar\n");
    f.state.set_caret(Position::new(0, 4));
    f.normal(
        NormalCommand::YankMotion(Motion::new(MotionRequest::WordBackward)),
        CommandData::default(),
    );
    assert_eq!(f.text(), "foo bar\n");
    assert_eq!(f.state.caret(), Position::origin());
    assert_eq!(
        f.state
            .registers
            .text_of(Some(RegisterName::Numbered(0))),
        "foo "
    );
}

#[test]
fn put_after_at_end_of_line_appends() {
    let mut f = Fixture::new("ab\n");
    f.state.set_caret(Position::new(0, 1));
    f.fill_unnamed(RegisterValue::character_wise(StringData::simple("XY")));
    f.normal(
        NormalCommand::PutAfterCaret { with_indent: false },
        CommandData::default(),
    );
    assert_eq!(f.text(), "abXY\n");
    assert_eq!(f.state.caret(), Position::new(0, 3), "caret on last pasted grapheme");
}

#[test]
fn put_on_empty_line_ignores_after() {
    let mut f = Fixture::new("x\n\ny\n");
    f.state.set_caret(Position::new(1, 0));
    f.fill_unnamed(RegisterValue::character_wise(StringData::simple("Z")));
    f.normal(
        NormalCommand::PutAfterCaret { with_indent: false },
        CommandData::default(),
    );
    assert_eq!(f.text(), "x\nZ\ny\n");
    assert_eq!(f.state.caret(), Position::new(1, 0));
}

#[test]
fn put_line_wise_before_caret_line() {
    let mut f = Fixture::new("x\ny\n");
    f.state.set_caret(Position::new(1, 0));
    f.fill_unnamed(RegisterValue::line_wise(StringData::simple("new\n")));
    f.normal(
        NormalCommand::PutBeforeCaret { with_indent: false },
        CommandData::default(),
    );
    assert_eq!(f.text(), "x\nnew\ny\n");
    assert_eq!(f.state.caret(), Position::new(1, 0));
}

#[test]
fn indented_put_reindents_to_caret_line() {
    let mut f = Fixture::new("    body\n");
    f.fill_unnamed(RegisterValue::line_wise(StringData::simple("\tone\n  two\n")));
    f.normal(
        NormalCommand::PutAfterCaret { with_indent: true },
        CommandData::default(),
    );
    assert_eq!(f.text(), "    body\n    one\n    two\n");
    assert_eq!(f.state.caret(), Position::new(1, 4));
}

#[test]
fn block_put_extends_past_buffer_end() {
    let mut f = Fixture::new("ab\n");
    f.fill_unnamed(RegisterValue::character_wise(StringData::block(vec![
        "X".into(),
        "Y".into(),
        "Z".into(),
    ])));
    f.normal(
        NormalCommand::PutBeforeCaret { with_indent: false },
        CommandData::default(),
    );
    assert_eq!(f.text(), "Xab\nY\nZ\n", "missing lines are created");
    assert_eq!(f.state.caret(), Position::origin());
}

#[test]
fn join_count_joins_count_minus_one_times() {
    let mut f = Fixture::new("a\nb\nc\nd\n");
    f.normal(NormalCommand::JoinLines, CommandData::with_count(3));
    assert_eq!(f.text(), "a b c\nd\n");
    assert_eq!(f.state.caret(), Position::new(0, 3), "caret at the last join point");
}

#[test]
fn join_with_blank_next_line_omits_space() {
    let mut f = Fixture::new("a\n\nb\n");
    f.normal(NormalCommand::JoinLines, CommandData::default());
    assert_eq!(f.text(), "a\nb\n");
}

#[test]
fn replace_with_newline_splits_line() {
    let mut f = Fixture::new("abcd\n");
    f.state.set_caret(Position::new(0, 1));
    f.normal(NormalCommand::ReplaceChar('\n'), CommandData::default());
    assert_eq!(f.text(), "a\ncd\n");
}

#[test]
fn delete_last_line_leaves_empty_buffer() {
    let mut f = Fixture::new("only\n");
    f.normal(NormalCommand::DeleteLines, CommandData::default());
    assert_eq!(f.text(), "");
    assert_eq!(f.state.caret(), Position::origin());
    assert_eq!(
        f.state
            .registers
            .text_of(Some(RegisterName::Numbered(1))),
        "only\n"
    );
}

#[test]
fn counted_insert_repeats_typed_text() {
    let mut f = Fixture::new("y\n");
    let result = f.normal(NormalCommand::InsertAtCaret, CommandData::with_count(3));
    let txn = take_insert_transaction(result).unwrap();
    f.exec()
        .run_insert_command(&InsertCommand::InsertText("X".into()), CommandData::default());
    f.exec().leave_insert(Some(txn));
    assert_eq!(f.text(), "XXXy\n");
    assert_eq!(f.state.caret(), Position::new(0, 2));
}

#[test]
fn append_enters_after_caret_grapheme() {
    let mut f = Fixture::new("ab\n");
    f.state.set_caret(Position::new(0, 1));
    let result = f.normal(NormalCommand::InsertAfterCaret, CommandData::default());
    let txn = take_insert_transaction(result).unwrap();
    f.exec()
        .run_insert_command(&InsertCommand::InsertText("c".into()), CommandData::default());
    f.exec().leave_insert(Some(txn));
    assert_eq!(f.text(), "abc\n");
    assert_eq!(f.state.caret(), Position::new(0, 2));
}

#[test]
fn backspace_in_insert_joins_to_previous_line() {
    let mut f = Fixture::new("ab\ncd\n");
    f.state.set_caret(Position::new(1, 0));
    let result = f.normal(NormalCommand::InsertAtCaret, CommandData::default());
    let txn = take_insert_transaction(result).unwrap();
    f.exec()
        .run_insert_command(&InsertCommand::Back, CommandData::default());
    assert_eq!(f.text(), "abcd\n");
    assert_eq!(f.state.caret(), Position::new(0, 2));
    f.exec().leave_insert(Some(txn));
}

#[test]
fn increment_honors_octal_opt_in() {
    let mut f = Fixture::new("017\n");
    f.normal(NormalCommand::AddToWord, CommandData::default());
    assert_eq!(f.text(), "018\n", "decimal by default, zero padding kept");

    let mut f = Fixture::new("017\n");
    f.state.config.number_formats.octal = true;
    f.normal(NormalCommand::AddToWord, CommandData::default());
    assert_eq!(f.text(), "020\n");
}

#[test]
fn increment_honors_alpha_opt_in() {
    let mut f = Fixture::new("z\n");
    let result = f.normal(NormalCommand::AddToWord, CommandData::default());
    assert!(!result.is_error(), "no number is a beep, not an abort");
    assert_eq!(f.host.beeps, 1);
    assert_eq!(f.text(), "z\n", "single letters are not numbers by default");

    let mut f = Fixture::new("z\n");
    f.state.config.number_formats.alpha = true;
    f.normal(NormalCommand::AddToWord, CommandData::default());
    assert_eq!(f.text(), "a\n");
}

#[test]
fn recording_skips_unrepresentable_keys() {
    let mut f = Fixture::new("x\n");
    f.normal(NormalCommand::RecordMacroStart('r'), CommandData::default());
    macros::record_key(
        &mut f.session,
        KeyInput {
            code: KeyCode::Char('r'),
            mods: KeyModifiers::CTRL,
        },
    );
    macros::record_key(&mut f.session, KeyInput::from_char('\x1b'));
    f.normal(NormalCommand::RecordMacroStop, CommandData::default());
    assert_eq!(
        f.state.registers.text_of(Some(RegisterName::Named('r'))),
        "\x1b",
        "ctrl-modified keys are dropped, escape round-trips"
    );
}

#[test]
fn visual_join_returns_to_normal_mode() {
    let mut f = Fixture::new("a\nb\nc\n");
    f.state.set_mode(ModeKind::VisualLine);
    let span = VisualSpan::Line(LineRange::new(0, 2));
    let result = f.exec().run_visual_command(
        VisualCommand::JoinSelection,
        CommandData::default(),
        &span,
    );
    assert!(!result.is_error());
    assert_eq!(f.text(), "a b\nc\n");
    assert_eq!(f.state.mode(), ModeKind::Normal);
}

#[test]
fn line_repeat_clamps_to_remaining_lines() {
    let mut f = Fixture::new("a\nb\nc\n");
    let span = VisualSpan::Line(LineRange::new(0, 2));
    f.exec().run_visual_command(
        VisualCommand::DeleteSelection,
        CommandData::default(),
        &span,
    );
    assert_eq!(f.text(), "c\n");
    f.normal(NormalCommand::RepeatLastCommand, CommandData::default());
    assert_eq!(f.text(), "", "two-line shape clamps to the one line left");
    assert_eq!(
        f.state
            .registers
            .text_of(Some(RegisterName::Numbered(1))),
        "c\n"
    );
}

#[test]
fn put_count_repeats_line_wise_value() {
    let mut f = Fixture::new("top\n");
    f.fill_unnamed(RegisterValue::new(
        StringData::simple("x\n"),
        OperationKind::LineWise,
    ));
    f.normal(
        NormalCommand::PutAfterCaret { with_indent: false },
        CommandData::with_count(2),
    );
    assert_eq!(f.text(), "top\nx\nx\n");
    assert_eq!(f.state.caret(), Position::new(1, 0));
}

#[test]
fn small_delete_leaves_numbered_history_alone() {
    let mut f = Fixture::new("word here\n");
    f.state.registers.set(
        None,
        RegisterValue::line_wise(StringData::simple("old\n")),
        RegisterOperation::BigDelete,
    );
    let before = f
        .state
        .registers
        .text_of(Some(RegisterName::Numbered(1)));
    f.normal(NormalCommand::DeleteCharacterAtCaret, CommandData::default());
    assert_eq!(f.unnamed(), "w");
    assert_eq!(
        f.state
            .registers
            .text_of(Some(RegisterName::Numbered(1))),
        before,
        "x does not shift registers 1-9"
    );
}
