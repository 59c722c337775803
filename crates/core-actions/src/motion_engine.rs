//! Default motion resolution.
//!
//! Resolves a [`Motion`](crate::Motion) to the concrete span and line range
//! it covers, iterating the primitive word/search routines from `core-text`
//! for counts. A motion that moves nowhere resolves to `None`; operators
//! treat that as failure.

use core_text::{grapheme, motion, Buffer, Position, Span};

use crate::{Motion, MotionEngine, MotionFlags, MotionKind, MotionRequest, MotionResult};

#[derive(Debug, Default)]
pub struct DefaultMotionEngine;

impl DefaultMotionEngine {
    pub fn new() -> Self {
        Self
    }
}

fn char_wise(
    buffer: &Buffer,
    from: usize,
    to: usize,
    motion_kind: MotionKind,
    flags: MotionFlags,
) -> Option<MotionResult> {
    if from == to {
        return None;
    }
    let span = Span::new(from.min(to), from.max(to));
    let start = buffer.position_of(span.start);
    let end = buffer.position_of(span.end);
    let line_range = buffer.clamped_line_range(start.line, end.line - start.line + 1);
    Some(MotionResult {
        span,
        line_range,
        motion_kind,
        flags,
    })
}

/// Absolute offset one grapheme (or the newline) past `abs`.
fn advance_one(buffer: &Buffer, abs: usize) -> usize {
    let pos = buffer.position_of(abs);
    let line = buffer.line_content(pos.line).unwrap_or_default();
    let next = grapheme::next_boundary(&line, pos.byte);
    if next > pos.byte {
        buffer.line_start_abs(pos.line) + next
    } else {
        // End of line content: step over the newline.
        (abs + 1).min(buffer.len_bytes())
    }
}

fn line_wise(buffer: &Buffer, start_line: usize, count: usize) -> Option<MotionResult> {
    let line_range = buffer.clamped_line_range(start_line, count);
    Some(MotionResult {
        span: buffer.line_span(line_range.start_line, line_range.count),
        line_range,
        motion_kind: MotionKind::LineWise,
        flags: MotionFlags::BIG_DELETE,
    })
}

impl MotionEngine for DefaultMotionEngine {
    fn get_motion(
        &self,
        buffer: &Buffer,
        caret: Position,
        motion: &Motion,
        count: usize,
    ) -> Option<MotionResult> {
        let count = motion.count.unwrap_or(1).saturating_mul(count).max(1);
        let caret_abs = buffer.abs_of(caret);
        match &motion.request {
            MotionRequest::WordForward => {
                let mut target = caret_abs;
                for _ in 0..count {
                    target = motion::next_word_start(buffer, target);
                }
                char_wise(
                    buffer,
                    caret_abs,
                    target,
                    MotionKind::CharacterWiseExclusive,
                    MotionFlags::WORD_FORWARD,
                )
            }
            MotionRequest::WordBackward => {
                let mut target = caret_abs;
                for _ in 0..count {
                    target = motion::prev_word_start(buffer, target);
                }
                char_wise(
                    buffer,
                    caret_abs,
                    target,
                    MotionKind::CharacterWiseExclusive,
                    MotionFlags::empty(),
                )
            }
            MotionRequest::WordEnd => {
                let mut target = caret_abs;
                for _ in 0..count {
                    target = motion::word_end(buffer, target);
                }
                // word_end already reports the byte past the final grapheme.
                char_wise(
                    buffer,
                    caret_abs,
                    target,
                    MotionKind::CharacterWiseInclusive,
                    MotionFlags::empty(),
                )
            }
            MotionRequest::CharLeft => {
                let line = buffer.line_content(caret.line).unwrap_or_default();
                let mut byte = caret.byte;
                for _ in 0..count {
                    byte = grapheme::prev_boundary(&line, byte);
                }
                char_wise(
                    buffer,
                    caret_abs,
                    buffer.line_start_abs(caret.line) + byte,
                    MotionKind::CharacterWiseExclusive,
                    MotionFlags::empty(),
                )
            }
            MotionRequest::CharRight => {
                let line = buffer.line_content(caret.line).unwrap_or_default();
                let mut byte = caret.byte;
                for _ in 0..count {
                    byte = grapheme::next_boundary(&line, byte);
                }
                char_wise(
                    buffer,
                    caret_abs,
                    buffer.line_start_abs(caret.line) + byte.min(line.len()),
                    MotionKind::CharacterWiseExclusive,
                    MotionFlags::empty(),
                )
            }
            MotionRequest::Down => line_wise(buffer, caret.line, count + 1),
            MotionRequest::Up => {
                if caret.line == 0 {
                    return None;
                }
                let start = caret.line.saturating_sub(count);
                line_wise(buffer, start, caret.line - start + 1)
            }
            MotionRequest::StartOfLine => char_wise(
                buffer,
                caret_abs,
                buffer.line_start_abs(caret.line),
                MotionKind::CharacterWiseExclusive,
                MotionFlags::empty(),
            ),
            MotionRequest::FirstNonBlank => char_wise(
                buffer,
                caret_abs,
                buffer.line_start_abs(caret.line) + buffer.first_non_blank(caret.line),
                MotionKind::CharacterWiseExclusive,
                MotionFlags::empty(),
            ),
            MotionRequest::EndOfLine => {
                let last = (caret.line + count - 1)
                    .min(buffer.content_line_count().saturating_sub(1));
                char_wise(
                    buffer,
                    caret_abs,
                    buffer.line_start_abs(last) + buffer.line_byte_len(last),
                    MotionKind::CharacterWiseInclusive,
                    MotionFlags::empty(),
                )
            }
            MotionRequest::Search { pattern } => {
                if pattern.is_empty() {
                    return None;
                }
                let mut from = caret_abs;
                let mut target = None;
                for _ in 0..count {
                    match motion::find_forward(buffer, advance_one(buffer, from), pattern) {
                        Some(hit) => {
                            target = Some(hit);
                            from = hit;
                        }
                        None => return None,
                    }
                }
                char_wise(
                    buffer,
                    caret_abs,
                    target?,
                    MotionKind::CharacterWiseExclusive,
                    MotionFlags::BIG_DELETE,
                )
            }
        }
    }
}
