//! Register store.
//!
//! Registers hold yanked and deleted text together with the shape it had when
//! captured. The shape travels in two pieces: [`OperationKind`] says whether a
//! value re-enters the buffer character-wise or line-wise, and [`StringData`]
//! says whether the payload is a flat string or a rectangle of per-row
//! fragments. Block extractions are `Block` data with `CharacterWise` kind;
//! there is no block operation kind.
//!
//! Writes fan out: every capture mirrors into the unnamed register, yanks
//! land in register 0, line-wise and "big" deletes shift the 1..=9 history
//! down before landing in register 1, and small character-wise deletes touch
//! only the unnamed register. An uppercase named register appends to its
//! lowercase slot instead of replacing it.

use tracing::{trace, warn};

/// Read-only registers: readable as put sources, never written by captures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReadOnlyRegister {
    /// `"."` last inserted text.
    LastInserted,
    /// `"%"` current file name.
    FileName,
    /// `":"` last command line.
    LastCommandLine,
    /// `"<"` start of last visual selection.
    SelectionStart,
    /// `">"` end of last visual selection.
    SelectionEnd,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RegisterName {
    Unnamed,
    /// `a`..=`z` select a slot; `A`..=`Z` select the same slot in append mode.
    Named(char),
    /// 0 holds the last yank, 1..=9 the delete history.
    Numbered(u8),
    /// `"*"` system selection / drop register.
    SelectionAndDrop,
    ReadOnly(ReadOnlyRegister),
}

impl RegisterName {
    /// Parse the character typed after `"`.
    pub fn parse(c: char) -> Option<Self> {
        match c {
            '"' => Some(Self::Unnamed),
            'a'..='z' | 'A'..='Z' => Some(Self::Named(c)),
            '0'..='9' => Some(Self::Numbered(c as u8 - b'0')),
            '*' => Some(Self::SelectionAndDrop),
            '.' => Some(Self::ReadOnly(ReadOnlyRegister::LastInserted)),
            '%' => Some(Self::ReadOnly(ReadOnlyRegister::FileName)),
            ':' => Some(Self::ReadOnly(ReadOnlyRegister::LastCommandLine)),
            '<' => Some(Self::ReadOnly(ReadOnlyRegister::SelectionStart)),
            '>' => Some(Self::ReadOnly(ReadOnlyRegister::SelectionEnd)),
            _ => None,
        }
    }

    pub fn is_append(&self) -> bool {
        matches!(self, Self::Named(c) if c.is_ascii_uppercase())
    }
}

/// How a register value re-enters a buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OperationKind {
    #[default]
    CharacterWise,
    LineWise,
}

/// Register payload. `Block` carries one fragment per selected row and is
/// never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StringData {
    Simple(String),
    Block(Vec<String>),
}

impl StringData {
    pub fn simple(s: impl Into<String>) -> Self {
        Self::Simple(s.into())
    }

    pub fn block(rows: Vec<String>) -> Self {
        debug_assert!(!rows.is_empty(), "block data must have at least one row");
        Self::Block(rows)
    }

    /// Repeat the payload `count` times. Simple text concatenates; block rows
    /// repeat within each row so the rectangle keeps its height.
    pub fn apply_count(&self, count: usize) -> Self {
        let count = count.max(1);
        match self {
            Self::Simple(s) => Self::Simple(s.repeat(count)),
            Self::Block(rows) => Self::Block(rows.iter().map(|r| r.repeat(count)).collect()),
        }
    }

    /// Flatten to plain text; block rows join with newlines.
    pub fn to_text(&self) -> String {
        match self {
            Self::Simple(s) => s.clone(),
            Self::Block(rows) => rows.join("\n"),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Self::Simple(s) => s.is_empty(),
            Self::Block(rows) => rows.iter().all(|r| r.is_empty()),
        }
    }
}

impl Default for StringData {
    fn default() -> Self {
        Self::Simple(String::new())
    }
}

/// An immutable register snapshot: payload plus re-entry shape.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RegisterValue {
    data: StringData,
    kind: OperationKind,
}

impl RegisterValue {
    pub fn new(data: StringData, kind: OperationKind) -> Self {
        Self { data, kind }
    }

    pub fn character_wise(data: StringData) -> Self {
        Self::new(data, OperationKind::CharacterWise)
    }

    pub fn line_wise(data: StringData) -> Self {
        Self::new(data, OperationKind::LineWise)
    }

    pub fn data(&self) -> &StringData {
        &self.data
    }

    pub fn kind(&self) -> OperationKind {
        self.kind
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Append `other`'s payload, taking `other`'s kind if it is line-wise.
    fn append(&mut self, other: &RegisterValue) {
        let mut text = self.data.to_text();
        if self.kind == OperationKind::LineWise && !text.ends_with('\n') {
            text.push('\n');
        }
        text.push_str(&other.data.to_text());
        self.data = StringData::Simple(text);
        if other.kind == OperationKind::LineWise {
            self.kind = OperationKind::LineWise;
        }
    }
}

/// What produced a capture; decides which numbered slots it reaches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisterOperation {
    Yank,
    /// Small delete: a character-wise delete within a line.
    Delete,
    /// Line-wise or multi-line delete; shifts the 1..=9 history.
    BigDelete,
}

/// All register slots for one editing session.
#[derive(Debug, Default)]
pub struct RegisterStore {
    unnamed: RegisterValue,
    named: [RegisterValue; 26],
    numbered: [RegisterValue; 10],
    selection: RegisterValue,
    last_inserted: RegisterValue,
    file_name: String,
    last_command_line: String,
}

impl RegisterStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a capture. `explicit` is the register the user named, if any.
    pub fn set(
        &mut self,
        explicit: Option<RegisterName>,
        value: RegisterValue,
        op: RegisterOperation,
    ) {
        trace!(target: "state.registers", ?explicit, ?op, "register capture");
        if let Some(name) = explicit {
            match name {
                RegisterName::ReadOnly(_) => {
                    warn!(target: "state.registers", ?name, "write to read-only register ignored");
                    return;
                }
                RegisterName::Unnamed => {
                    self.unnamed = value;
                    return;
                }
                RegisterName::Named(c) => {
                    let slot = &mut self.named[(c.to_ascii_lowercase() as u8 - b'a') as usize];
                    if c.is_ascii_uppercase() {
                        slot.append(&value);
                    } else {
                        *slot = value.clone();
                    }
                    self.unnamed = value;
                    return;
                }
                RegisterName::Numbered(n) => {
                    self.numbered[n as usize] = value.clone();
                    self.unnamed = value;
                    return;
                }
                RegisterName::SelectionAndDrop => {
                    self.selection = value.clone();
                    self.unnamed = value;
                    return;
                }
            }
        }
        // No explicit register: route by operation.
        match op {
            RegisterOperation::Yank => {
                self.numbered[0] = value.clone();
            }
            RegisterOperation::BigDelete => {
                for i in (2..=9).rev() {
                    self.numbered[i] = self.numbered[i - 1].clone();
                }
                self.numbered[1] = value.clone();
            }
            RegisterOperation::Delete => {}
        }
        self.unnamed = value;
    }

    /// Read a register; `None` names the unnamed register.
    pub fn get(&self, name: Option<RegisterName>) -> RegisterValue {
        match name.unwrap_or(RegisterName::Unnamed) {
            RegisterName::Unnamed => self.unnamed.clone(),
            RegisterName::Named(c) => {
                self.named[(c.to_ascii_lowercase() as u8 - b'a') as usize].clone()
            }
            RegisterName::Numbered(n) => self.numbered[n as usize].clone(),
            RegisterName::SelectionAndDrop => self.selection.clone(),
            RegisterName::ReadOnly(r) => match r {
                ReadOnlyRegister::LastInserted => self.last_inserted.clone(),
                ReadOnlyRegister::FileName => {
                    RegisterValue::character_wise(StringData::simple(self.file_name.clone()))
                }
                ReadOnlyRegister::LastCommandLine => RegisterValue::character_wise(
                    StringData::simple(self.last_command_line.clone()),
                ),
                // Selection marks resolve through buffer state, not here.
                ReadOnlyRegister::SelectionStart | ReadOnlyRegister::SelectionEnd => {
                    RegisterValue::default()
                }
            },
        }
    }

    /// Plain text of a register, for macro playback.
    pub fn text_of(&self, name: Option<RegisterName>) -> String {
        self.get(name).data().to_text()
    }

    pub fn set_last_inserted(&mut self, text: String) {
        self.last_inserted = RegisterValue::character_wise(StringData::Simple(text));
    }

    pub fn set_file_name(&mut self, name: impl Into<String>) {
        self.file_name = name.into();
    }

    pub fn set_last_command_line(&mut self, line: impl Into<String>) {
        self.last_command_line = line.into();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cw(s: &str) -> RegisterValue {
        RegisterValue::character_wise(StringData::simple(s))
    }

    fn lw(s: &str) -> RegisterValue {
        RegisterValue::line_wise(StringData::simple(s))
    }

    #[test]
    fn yank_lands_in_zero_and_unnamed() {
        let mut r = RegisterStore::new();
        r.set(None, cw("word"), RegisterOperation::Yank);
        assert_eq!(r.get(None).data().to_text(), "word", "unnamed mirrors yank");
        assert_eq!(
            r.get(Some(RegisterName::Numbered(0))).data().to_text(),
            "word",
            "register 0 holds last yank"
        );
        assert!(r.get(Some(RegisterName::Numbered(1))).is_empty());
    }

    #[test]
    fn big_delete_shifts_history() {
        let mut r = RegisterStore::new();
        r.set(None, lw("first\n"), RegisterOperation::BigDelete);
        r.set(None, lw("second\n"), RegisterOperation::BigDelete);
        assert_eq!(
            r.get(Some(RegisterName::Numbered(1))).data().to_text(),
            "second\n"
        );
        assert_eq!(
            r.get(Some(RegisterName::Numbered(2))).data().to_text(),
            "first\n"
        );
    }

    #[test]
    fn small_delete_only_touches_unnamed() {
        let mut r = RegisterStore::new();
        r.set(None, lw("kept\n"), RegisterOperation::BigDelete);
        r.set(None, cw("x"), RegisterOperation::Delete);
        assert_eq!(r.get(None).data().to_text(), "x");
        assert_eq!(
            r.get(Some(RegisterName::Numbered(1))).data().to_text(),
            "kept\n",
            "small delete must not shift history"
        );
    }

    #[test]
    fn uppercase_named_appends() {
        let mut r = RegisterStore::new();
        r.set(Some(RegisterName::Named('a')), cw("one"), RegisterOperation::Yank);
        r.set(Some(RegisterName::Named('A')), cw("two"), RegisterOperation::Yank);
        assert_eq!(r.get(Some(RegisterName::Named('a'))).data().to_text(), "onetwo");
    }

    #[test]
    fn append_to_line_wise_inserts_newline() {
        let mut r = RegisterStore::new();
        r.set(Some(RegisterName::Named('b')), lw("line"), RegisterOperation::Yank);
        r.set(Some(RegisterName::Named('B')), cw("tail"), RegisterOperation::Yank);
        assert_eq!(r.get(Some(RegisterName::Named('b'))).data().to_text(), "line\ntail");
    }

    #[test]
    fn read_only_write_rejected() {
        let mut r = RegisterStore::new();
        r.set_last_inserted("typed".to_string());
        r.set(
            Some(RegisterName::ReadOnly(ReadOnlyRegister::LastInserted)),
            cw("clobber"),
            RegisterOperation::Yank,
        );
        assert_eq!(
            r.get(Some(RegisterName::ReadOnly(ReadOnlyRegister::LastInserted)))
                .data()
                .to_text(),
            "typed"
        );
    }

    #[test]
    fn block_count_repeats_rows() {
        let d = StringData::block(vec!["ab".into(), "cd".into()]);
        let doubled = d.apply_count(2);
        assert_eq!(doubled, StringData::block(vec!["abab".into(), "cdcd".into()]));
        assert_eq!(doubled.to_text(), "abab\ncdcd");
    }

    #[test]
    fn parse_register_characters() {
        assert_eq!(RegisterName::parse('a'), Some(RegisterName::Named('a')));
        assert_eq!(RegisterName::parse('5'), Some(RegisterName::Numbered(5)));
        assert_eq!(RegisterName::parse('*'), Some(RegisterName::SelectionAndDrop));
        assert_eq!(
            RegisterName::parse('.'),
            Some(RegisterName::ReadOnly(ReadOnlyRegister::LastInserted))
        );
        assert_eq!(RegisterName::parse('!'), None);
        assert!(RegisterName::Named('Q').is_append());
        assert!(!RegisterName::Named('q').is_append());
    }
}
