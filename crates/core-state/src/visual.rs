//! Visual selections and their stored, replayable shapes.
//!
//! A [`VisualSpan`] is anchored at absolute buffer positions and can be turned
//! into concrete edit spans. A [`StoredVisualSpan`] keeps only the shape
//! (extent relative to the caret) so a repeated visual command re-applies the
//! same-sized selection at the new caret position.

use core_text::{grapheme, Buffer, LineRange, Position, Span};

use crate::registers::OperationKind;

/// An active visual selection, normalized so the anchor precedes the caret.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VisualSpan {
    /// Character-wise: starts at `start`, covers `line_count` lines, ending
    /// `last_line_len` bytes into the last line (exclusive).
    Character {
        start: Position,
        line_count: usize,
        last_line_len: usize,
    },
    /// Line-wise: whole lines.
    Line(LineRange),
    /// Block-wise: a rectangle of display columns anchored at `anchor`.
    Block {
        anchor: Position,
        tabstop: usize,
        width: usize,
        height: usize,
    },
}

impl VisualSpan {
    /// Leftmost, topmost position of the selection.
    pub fn start(&self) -> Position {
        match self {
            Self::Character { start, .. } => *start,
            Self::Line(range) => Position::new(range.start_line, 0),
            Self::Block { anchor, .. } => *anchor,
        }
    }

    /// Shape of text this selection extracts.
    pub fn operation_kind(&self) -> OperationKind {
        match self {
            Self::Line(_) => OperationKind::LineWise,
            _ => OperationKind::CharacterWise,
        }
    }

    /// Lines the selection touches.
    pub fn line_range(&self, buffer: &Buffer) -> LineRange {
        match self {
            Self::Character {
                start, line_count, ..
            } => buffer.clamped_line_range(start.line, *line_count),
            Self::Line(range) => buffer.clamped_line_range(range.start_line, range.count),
            Self::Block { anchor, height, .. } => {
                buffer.clamped_line_range(anchor.line, *height)
            }
        }
    }

    /// Concrete byte spans to edit. Character and line selections produce one
    /// span; a block produces one span per row, top to bottom.
    pub fn edit_spans(&self, buffer: &Buffer) -> Vec<Span> {
        match self {
            Self::Character {
                start,
                line_count,
                last_line_len,
            } => {
                let from = buffer.abs_of(*start);
                let last_line = (start.line + (*line_count).max(1) - 1)
                    .min(buffer.content_line_count().saturating_sub(1));
                let end_in_line = (*last_line_len).min(buffer.line_byte_len(last_line));
                let to = (buffer.line_start_abs(last_line) + end_in_line).min(buffer.len_bytes());
                vec![Span::new(from, to.max(from))]
            }
            Self::Line(range) => {
                vec![buffer.line_span(range.start_line, range.count)]
            }
            Self::Block {
                anchor,
                tabstop,
                width,
                height,
            } => {
                let start_col = grapheme::display_col(
                    &buffer.line_content(anchor.line).unwrap_or_default(),
                    anchor.byte,
                    *tabstop,
                );
                let range = buffer.clamped_line_range(anchor.line, *height);
                let mut spans = Vec::with_capacity(range.count);
                for line in range.start_line..=range.last_line() {
                    let content = buffer.line_content(line).unwrap_or_default();
                    let line_start = buffer.line_start_abs(line);
                    let from = grapheme::byte_for_col(&content, start_col, *tabstop);
                    let to = grapheme::byte_for_col(&content, start_col + width, *tabstop);
                    spans.push(Span::new(line_start + from, line_start + to.max(from)));
                }
                spans
            }
        }
    }
}

/// The caret-relative shape of a visual selection, kept for repeat.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoredVisualSpan {
    Line { count: usize },
    Character { line_count: usize, last_line_len: usize },
    Block { width: usize, height: usize },
}

impl StoredVisualSpan {
    pub fn of(span: &VisualSpan) -> Self {
        match span {
            VisualSpan::Character {
                line_count,
                last_line_len,
                ..
            } => Self::Character {
                line_count: *line_count,
                last_line_len: *last_line_len,
            },
            VisualSpan::Line(range) => Self::Line { count: range.count },
            VisualSpan::Block { width, height, .. } => Self::Block {
                width: *width,
                height: *height,
            },
        }
    }

    /// Rebuild a concrete selection of this shape at `caret`, clamped to the
    /// buffer. Pure: does not consult any selection state.
    pub fn rehydrate(&self, buffer: &Buffer, caret: Position, tabstop: usize) -> VisualSpan {
        match *self {
            Self::Line { count } => {
                VisualSpan::Line(buffer.clamped_line_range(caret.line, count))
            }
            Self::Character {
                line_count,
                last_line_len,
            } => {
                let range = buffer.clamped_line_range(caret.line, line_count);
                let last_line = range.last_line();
                let end = if range.count == 1 {
                    // Shape was measured from the old start; re-base on caret.
                    (caret.byte + last_line_len).min(buffer.line_byte_len(last_line))
                } else {
                    last_line_len.min(buffer.line_byte_len(last_line))
                };
                VisualSpan::Character {
                    start: caret,
                    line_count: range.count,
                    last_line_len: end,
                }
            }
            Self::Block { width, height } => VisualSpan::Block {
                anchor: caret,
                tabstop,
                width,
                height,
            },
        }
    }
}
