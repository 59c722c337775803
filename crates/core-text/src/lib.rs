//! Rope-based text buffer primitives for the command-execution engine.
//!
//! This crate is the engine's only view of text: a `Buffer` backed by a
//! `ropey::Rope`, addressed either by `Position` (line index + byte offset
//! within that line) or by absolute byte offset via `Span`. Everything above
//! this layer (operators, registers, undo) works in terms of spans and never
//! touches the rope directly.
//!
//! Invariants:
//! * All byte offsets handed to `Buffer` methods lie on UTF-8 char boundaries;
//!   grapheme safety is enforced by the callers through the `grapheme` module.
//! * `Span` is half-open `[start, end)` in absolute bytes and is always
//!   clamped against the current buffer length before use.
//! * Multi-span mutations go through `EditBatch`, which applies replacements
//!   in descending offset order so earlier spans stay valid.

use anyhow::Result;
use ropey::Rope;

pub mod motion;

/// A text buffer backed by a `ropey::Rope`.
#[derive(Debug, Clone)]
pub struct Buffer {
    rope: Rope,
    pub name: String,
}

/// A position inside a buffer expressed as (line index, byte offset within that line).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub line: usize,
    pub byte: usize,
}

impl Position {
    pub fn new(line: usize, byte: usize) -> Self {
        Self { line, byte }
    }
    pub fn origin() -> Self {
        Self { line: 0, byte: 0 }
    }
}

/// Half-open absolute byte range `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        debug_assert!(start <= end);
        Self { start, end }
    }
    pub fn empty(at: usize) -> Self {
        Self { start: at, end: at }
    }
    pub fn len(&self) -> usize {
        self.end - self.start
    }
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// A contiguous run of whole lines: `count >= 1` lines starting at `start_line`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineRange {
    pub start_line: usize,
    pub count: usize,
}

impl LineRange {
    pub fn new(start_line: usize, count: usize) -> Self {
        Self {
            start_line,
            count: count.max(1),
        }
    }
    pub fn last_line(&self) -> usize {
        self.start_line + self.count - 1
    }
    pub fn contains(&self, line: usize) -> bool {
        line >= self.start_line && line <= self.last_line()
    }
}

impl Buffer {
    /// Construct a buffer from an in-memory string slice.
    pub fn from_str(name: impl Into<String>, content: &str) -> Result<Self> {
        Ok(Self {
            rope: Rope::from_str(content),
            name: name.into(),
        })
    }

    /// Total number of rope lines. A trailing newline yields a final empty line.
    pub fn line_count(&self) -> usize {
        self.rope.len_lines()
    }

    /// Number of lines carrying content: excludes the phantom empty line a
    /// trailing newline produces. Line-wise operations clamp against this.
    pub fn content_line_count(&self) -> usize {
        let n = self.rope.len_lines();
        if n > 1 && self.line_byte_len(n - 1) == 0 && self.text_ends_with_newline() {
            n - 1
        } else {
            n
        }
    }

    fn text_ends_with_newline(&self) -> bool {
        let len = self.rope.len_chars();
        len > 0 && self.rope.char(len - 1) == '\n'
    }

    /// Return the requested line as an owned `String` (including trailing newline if present).
    pub fn line(&self, idx: usize) -> Option<String> {
        if idx < self.rope.len_lines() {
            Some(self.rope.line(idx).to_string())
        } else {
            None
        }
    }

    /// Line content without its trailing newline.
    pub fn line_content(&self, idx: usize) -> Option<String> {
        self.line(idx).map(|mut s| {
            if s.ends_with('\n') {
                s.pop();
            }
            s
        })
    }

    /// Byte length of a line (excluding any newline).
    pub fn line_byte_len(&self, idx: usize) -> usize {
        if idx >= self.rope.len_lines() {
            return 0;
        }
        let line = self.rope.line(idx);
        let len = line.len_bytes();
        if len > 0 && line.char(line.len_chars() - 1) == '\n' {
            len - 1
        } else {
            len
        }
    }

    /// Total buffer length in bytes.
    pub fn len_bytes(&self) -> usize {
        self.rope.len_bytes()
    }

    /// True when the buffer holds no text at all.
    pub fn is_empty(&self) -> bool {
        self.rope.len_bytes() == 0
    }

    /// Full buffer content as an owned string.
    pub fn text(&self) -> String {
        self.rope.to_string()
    }

    /// Absolute byte offset of the start of `line`.
    pub fn line_start_abs(&self, line: usize) -> usize {
        let line = line.min(self.rope.len_lines().saturating_sub(1));
        let c = self.rope.line_to_char(line);
        self.rope.char_to_byte(c)
    }

    /// Absolute byte offset of a position (clamped to buffer end).
    pub fn abs_of(&self, pos: Position) -> usize {
        let line = pos.line.min(self.rope.len_lines().saturating_sub(1));
        let start = self.line_start_abs(line);
        (start + pos.byte).min(self.rope.len_bytes())
    }

    /// Map an absolute byte offset back to a position (clamped).
    pub fn position_of(&self, abs: usize) -> Position {
        let abs = abs.min(self.rope.len_bytes());
        let line = self.rope.byte_to_line(abs);
        let start = self.line_start_abs(line);
        Position {
            line,
            byte: abs - start,
        }
    }

    /// Span covering `count` whole lines (newlines included) starting at
    /// `start_line`, clamped to the end of the buffer.
    pub fn line_span(&self, start_line: usize, count: usize) -> Span {
        let content_lines = self.content_line_count();
        if content_lines == 0 || start_line >= content_lines {
            let end = self.rope.len_bytes();
            return Span::empty(end);
        }
        let count = count.max(1);
        let last = (start_line + count - 1).min(content_lines.saturating_sub(1));
        let start = self.line_start_abs(start_line);
        let end = if last + 1 < self.rope.len_lines() {
            self.line_start_abs(last + 1)
        } else {
            self.rope.len_bytes()
        };
        Span::new(start, end)
    }

    /// Clamped `LineRange` for `count` lines starting at `start_line`.
    pub fn clamped_line_range(&self, start_line: usize, count: usize) -> LineRange {
        let content_lines = self.content_line_count().max(1);
        let start = start_line.min(content_lines - 1);
        let count = count.max(1).min(content_lines - start);
        LineRange::new(start, count)
    }

    /// Byte offset of the first non-blank character of `line` (line length if all blank).
    pub fn first_non_blank(&self, line: usize) -> usize {
        match self.line_content(line) {
            Some(s) => s
                .char_indices()
                .find(|(_, c)| !c.is_whitespace())
                .map(|(i, _)| i)
                .unwrap_or(s.len()),
            None => 0,
        }
    }

    /// Return the UTF-8 slice covered by `span` (clamped).
    pub fn slice(&self, span: Span) -> String {
        let total = self.rope.len_bytes();
        let s = span.start.min(total);
        let e = span.end.min(total);
        if s >= e {
            return String::new();
        }
        let sc = self.rope.byte_to_char(s);
        let ec = self.rope.byte_to_char(e);
        self.rope.slice(sc..ec).to_string()
    }

    /// Delete `span` and return the removed text.
    pub fn delete(&mut self, span: Span) -> String {
        let total = self.rope.len_bytes();
        let s = span.start.min(total);
        let e = span.end.min(total);
        if s >= e {
            return String::new();
        }
        let sc = self.rope.byte_to_char(s);
        let ec = self.rope.byte_to_char(e);
        let removed = self.rope.slice(sc..ec).to_string();
        self.rope.remove(sc..ec);
        removed
    }

    /// Replace `span` with `text`, returning the removed text.
    pub fn replace(&mut self, span: Span, text: &str) -> String {
        let removed = self.delete(span);
        self.insert(span.start.min(self.rope.len_bytes()), text);
        removed
    }

    /// Insert `text` at an absolute byte offset (clamped).
    pub fn insert(&mut self, abs: usize, text: &str) {
        if text.is_empty() {
            return;
        }
        let abs = abs.min(self.rope.len_bytes());
        let c = self.rope.byte_to_char(abs);
        self.rope.insert(c, text);
    }

    /// Insert a grapheme cluster string at the given position; advances the
    /// position by its byte length.
    pub fn insert_grapheme(&mut self, pos: &mut Position, g: &str) {
        let abs = self.abs_of(*pos);
        self.insert(abs, g);
        pos.byte += g.len();
    }

    /// Insert a newline at the given position; the position moves to the start
    /// of the new line.
    pub fn insert_newline(&mut self, pos: &mut Position) {
        let abs = self.abs_of(*pos);
        self.insert(abs, "\n");
        pos.line += 1;
        pos.byte = 0;
    }

    /// Delete the grapheme cluster before the position (like backspace),
    /// joining with the previous line at column zero. Returns removed text.
    pub fn delete_grapheme_before(&mut self, pos: &mut Position) -> String {
        if pos.line == 0 && pos.byte == 0 {
            return String::new();
        }
        if pos.byte == 0 {
            let prev_line = pos.line - 1;
            let prev_len = self.line_byte_len(prev_line);
            let nl = self.line_start_abs(prev_line) + prev_len;
            let removed = self.delete(Span::new(nl, nl + 1));
            pos.line = prev_line;
            pos.byte = prev_len;
            return removed;
        }
        let content = self.line_content(pos.line).unwrap_or_default();
        let prev = grapheme::prev_boundary(&content, pos.byte);
        if prev == pos.byte {
            return String::new();
        }
        let start = self.abs_of(Position::new(pos.line, prev));
        let end = self.abs_of(*pos);
        let removed = self.delete(Span::new(start, end));
        pos.byte = prev;
        removed
    }

    /// Delete the grapheme cluster at the position (Normal-mode `x` primitive).
    /// No-op at end of line. Returns removed text.
    pub fn delete_grapheme_at(&mut self, pos: &Position) -> String {
        let line_len = self.line_byte_len(pos.line);
        if pos.byte >= line_len {
            return String::new();
        }
        let content = self.line_content(pos.line).unwrap_or_default();
        let next = grapheme::next_boundary(&content, pos.byte);
        if next == pos.byte {
            return String::new();
        }
        let start = self.abs_of(*pos);
        let end = self.abs_of(Position::new(pos.line, next));
        self.delete(Span::new(start, end))
    }
}

/// Ordered multi-span edit applied as one pass over the buffer.
///
/// Replacements are collected at stable offsets against the pre-edit snapshot
/// and applied in descending start order so earlier offsets remain valid.
/// Spans must not overlap; that is a caller bug.
#[derive(Debug, Default)]
pub struct EditBatch {
    ops: Vec<(Span, String)>,
}

impl EditBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn replace(&mut self, span: Span, text: impl Into<String>) {
        self.ops.push((span, text.into()));
    }

    pub fn delete(&mut self, span: Span) {
        self.ops.push((span, String::new()));
    }

    pub fn insert(&mut self, at: usize, text: impl Into<String>) {
        self.ops.push((Span::empty(at), text.into()));
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Apply all collected operations to the buffer.
    pub fn apply(mut self, buffer: &mut Buffer) {
        self.ops.sort_by(|a, b| b.0.start.cmp(&a.0.start));
        for win in self.ops.windows(2) {
            debug_assert!(win[1].0.end <= win[0].0.start, "overlapping edit spans");
        }
        for (span, text) in self.ops {
            buffer.replace(span, &text);
        }
    }
}

/// Grapheme and display-column utilities operating on a single line.
pub mod grapheme {
    use unicode_segmentation::UnicodeSegmentation;
    use unicode_width::UnicodeWidthStr;

    /// Iterate grapheme clusters in a line.
    pub fn iter(line: &str) -> impl Iterator<Item = &str> {
        line.graphemes(true)
    }

    /// Previous grapheme boundary (returns 0 if already at or below the first boundary).
    pub fn prev_boundary(line: &str, byte: usize) -> usize {
        if byte == 0 || byte > line.len() {
            return 0;
        }
        let mut last = 0;
        for (idx, _) in line.grapheme_indices(true) {
            if idx >= byte {
                break;
            }
            last = idx;
        }
        last
    }

    /// Next grapheme boundary (returns line.len() if at or beyond end).
    pub fn next_boundary(line: &str, byte: usize) -> usize {
        if byte >= line.len() {
            return line.len();
        }
        for (idx, _) in line.grapheme_indices(true) {
            if idx > byte {
                return idx;
            }
        }
        line.len()
    }

    fn cluster_cells(g: &str, col: usize, tabstop: usize) -> usize {
        if g == "\t" {
            let ts = tabstop.max(1);
            ts - (col % ts)
        } else {
            UnicodeWidthStr::width(g).max(1)
        }
    }

    /// Display column (terminal cells) of the byte offset, tab-stop aware.
    pub fn display_col(line: &str, byte: usize, tabstop: usize) -> usize {
        let mut col = 0;
        for (idx, g) in line.grapheme_indices(true) {
            if idx >= byte {
                break;
            }
            col += cluster_cells(g, col, tabstop);
        }
        col
    }

    /// Byte offset of the grapheme covering display column `col` (line length
    /// if the line is shorter than `col`), tab-stop aware.
    pub fn byte_for_col(line: &str, col: usize, tabstop: usize) -> usize {
        let mut current = 0;
        for (idx, g) in line.grapheme_indices(true) {
            if current >= col {
                return idx;
            }
            current += cluster_cells(g, current, tabstop);
        }
        line.len()
    }

    /// Word classification used by the motion helpers: alphanumeric or underscore.
    pub fn is_word_char(c: char) -> bool {
        c == '_' || c.is_alphanumeric()
    }
}
