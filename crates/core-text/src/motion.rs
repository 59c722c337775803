//! Low-level motion scanning primitives.
//!
//! These operate on a `Buffer` plus an absolute byte offset and are free of
//! any editor state. The motion engine layers Vim motion semantics (counts,
//! inclusive/exclusive classification, flags) on top of these scans; this
//! module only answers "where does the next word start" style questions.

use crate::{Buffer, grapheme};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CharClass {
    Whitespace,
    Word,
    Punct,
}

fn classify(c: char) -> CharClass {
    if c.is_whitespace() {
        CharClass::Whitespace
    } else if grapheme::is_word_char(c) {
        CharClass::Word
    } else {
        CharClass::Punct
    }
}

/// Absolute offset of the start of the next word after `abs`.
///
/// Vim `w` semantics over the whole buffer: skip the remainder of the current
/// word (or punctuation run), then any whitespace including newlines, landing
/// on the first character of the following word. Returns buffer end when no
/// further word exists.
pub fn next_word_start(buffer: &Buffer, abs: usize) -> usize {
    let text = buffer.text();
    let mut it = text[abs..].char_indices().peekable();
    let Some(&(_, first)) = it.peek() else {
        return text.len();
    };
    let start_class = classify(first);
    let mut idx = abs;
    if start_class != CharClass::Whitespace {
        for (i, c) in text[abs..].char_indices() {
            idx = abs + i;
            if classify(c) != start_class {
                break;
            }
            idx = abs + i + c.len_utf8();
        }
    }
    for (i, c) in text[idx..].char_indices() {
        if classify(c) != CharClass::Whitespace {
            return idx + i;
        }
    }
    text.len()
}

/// Absolute offset of the start of the previous word before `abs` (Vim `b`).
pub fn prev_word_start(buffer: &Buffer, abs: usize) -> usize {
    let text = buffer.text();
    let mut chars: Vec<(usize, char)> = text[..abs].char_indices().collect();
    // Skip whitespace backwards.
    while let Some(&(_, c)) = chars.last() {
        if classify(c) == CharClass::Whitespace {
            chars.pop();
        } else {
            break;
        }
    }
    let Some(&(_, anchor)) = chars.last() else {
        return 0;
    };
    let class = classify(anchor);
    let mut start = 0;
    for &(i, c) in chars.iter().rev() {
        if classify(c) != class {
            break;
        }
        start = i;
    }
    start
}

/// Absolute offset just past the end of the word containing-or-after `abs` (Vim `e`, exclusive end).
pub fn word_end(buffer: &Buffer, abs: usize) -> usize {
    let text = buffer.text();
    // Step onto the next non-whitespace character at-or-after abs+1.
    let mut idx = abs;
    if let Some(c) = text[abs..].chars().next() {
        idx = abs + c.len_utf8();
    }
    let mut begin = None;
    for (i, c) in text[idx..].char_indices() {
        if classify(c) != CharClass::Whitespace {
            begin = Some((idx + i, classify(c)));
            break;
        }
    }
    let Some((begin, class)) = begin else {
        return text.len();
    };
    let mut end = begin;
    for (i, c) in text[begin..].char_indices() {
        if classify(c) != class {
            break;
        }
        end = begin + i + c.len_utf8();
    }
    end
}

/// First occurrence of `pattern` at-or-after `abs` (literal search, no regex).
pub fn find_forward(buffer: &Buffer, abs: usize, pattern: &str) -> Option<usize> {
    if pattern.is_empty() {
        return None;
    }
    let text = buffer.text();
    if abs > text.len() {
        return None;
    }
    text[abs..].find(pattern).map(|i| abs + i)
}
