//! Ctrl-A / Ctrl-X: increment or decrement the number at or after the caret.
//!
//! The line is scanned left to right; the first token ending after the caret
//! wins, which makes a caret inside a number extend left to its start. The
//! choice between tokens is purely positional, so with alpha enabled a
//! letter before a number wins, as Vim does with `nrformats+=alpha`. Hex
//! beats octal beats decimal beats alpha at any given position, gated by the
//! configured formats. Rendering preserves the original notation: prefix
//! case, digit case, and zero padding.

use std::ops::Range;

use core_config::NumberFormats;
use core_state::LinkedUndoFlags;
use core_text::{grapheme, Position, Span};
use tracing::trace;

use crate::executor::CommandExecutor;
use crate::{CommandData, CommandResult, ModeSwitch};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NumberValue {
    Decimal(i64),
    Octal(u64),
    Hex(u64),
    Alpha(char),
}

/// Find the number token at or after `caret_byte`.
pub fn scan_number(
    line: &str,
    caret_byte: usize,
    formats: &NumberFormats,
) -> Option<(Range<usize>, NumberValue)> {
    let bytes = line.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if let Some((range, value)) = token_at(line, i, formats) {
            if range.end > caret_byte {
                return Some((range, value));
            }
            i = range.end;
        } else {
            i += 1;
        }
    }
    None
}

fn token_at(line: &str, i: usize, formats: &NumberFormats) -> Option<(Range<usize>, NumberValue)> {
    let bytes = line.as_bytes();
    let c = bytes[i];
    if formats.hex
        && c == b'0'
        && i + 2 < bytes.len()
        && (bytes[i + 1] == b'x' || bytes[i + 1] == b'X')
        && bytes[i + 2].is_ascii_hexdigit()
    {
        let mut end = i + 2;
        while end < bytes.len() && bytes[end].is_ascii_hexdigit() {
            end += 1;
        }
        let value = u64::from_str_radix(&line[i + 2..end], 16).ok()?;
        return Some((i..end, NumberValue::Hex(value)));
    }
    if c.is_ascii_digit() {
        let mut end = i;
        while end < bytes.len() && bytes[end].is_ascii_digit() {
            end += 1;
        }
        let digits = &line[i..end];
        if formats.octal
            && digits.len() > 1
            && digits.starts_with('0')
            && digits.bytes().all(|b| (b'0'..=b'7').contains(&b))
        {
            let value = u64::from_str_radix(digits, 8).ok()?;
            return Some((i..end, NumberValue::Octal(value)));
        }
        let negative = i > 0 && bytes[i - 1] == b'-';
        let start = if negative { i - 1 } else { i };
        let value: i64 = line[start..end].parse().ok()?;
        return Some((start..end, NumberValue::Decimal(value)));
    }
    if formats.alpha && (c as char).is_ascii_alphabetic() {
        return Some((i..i + 1, NumberValue::Alpha(c as char)));
    }
    None
}

/// Render `value + delta` in the notation of `original`.
pub fn render(value: &NumberValue, delta: i64, original: &str) -> String {
    match value {
        NumberValue::Decimal(v) => {
            let result = v.wrapping_add(delta);
            let body = original.strip_prefix('-').unwrap_or(original);
            let zero_padded = body.len() > 1 && body.starts_with('0');
            if zero_padded {
                let width = body.len();
                if result < 0 {
                    format!("-{:0width$}", -result)
                } else {
                    format!("{result:0width$}")
                }
            } else {
                result.to_string()
            }
        }
        NumberValue::Hex(v) => {
            let result = v.wrapping_add_signed(delta);
            let prefix = &original[..2];
            let digits = &original[2..];
            let width = digits.len();
            let upper = digits.bytes().any(|b| b.is_ascii_uppercase());
            if upper {
                format!("{prefix}{result:0width$X}")
            } else {
                format!("{prefix}{result:0width$x}")
            }
        }
        NumberValue::Octal(v) => {
            let result = v.wrapping_add_signed(delta);
            let width = original.len();
            format!("{result:0width$o}")
        }
        NumberValue::Alpha(c) => {
            let base = if c.is_ascii_uppercase() { b'A' } else { b'a' };
            let offset = (*c as u8 - base) as i64;
            let wrapped = (offset + delta).rem_euclid(26) as u8;
            char::from(base + wrapped).to_string()
        }
    }
}

pub(crate) fn add_to_word(
    exec: &mut CommandExecutor,
    data: CommandData,
    sign: i64,
) -> CommandResult {
    let caret = exec.state.caret();
    let line = exec.state.buffer().line_content(caret.line).unwrap_or_default();
    let formats = exec.state.config.number_formats;
    let Some((range, value)) = scan_number(&line, caret.byte, &formats) else {
        exec.host.beep();
        return CommandResult::Completed(ModeSwitch::NoSwitch);
    };
    let delta = sign * data.count_or_default() as i64;
    let original = &line[range.clone()];
    let replacement = render(&value, delta, original);
    trace!(target: "actions.number", original, replacement = %replacement, "add to word");
    let line_start = exec.state.buffer().line_start_abs(caret.line);
    let txn = exec.state.begin_transaction("add to word", LinkedUndoFlags::empty());
    exec.state.buffer_mut().replace(
        Span::new(line_start + range.start, line_start + range.end),
        &replacement,
    );
    if exec.state.complete_transaction(txn).is_err() {
        return CommandResult::Error;
    }
    // Caret lands on the last character of the result.
    let last = range.start + grapheme::prev_boundary(&replacement, replacement.len());
    exec.state.set_caret(Position::new(caret.line, last));
    CommandResult::Completed(ModeSwitch::NoSwitch)
}
