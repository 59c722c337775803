//! Key-input value types shared by the macro recorder and player.
//!
//! Key *parsing* (mapping terminal byte sequences or host key events into
//! these values) lives outside this engine; this crate only defines the value
//! types a recorded macro is made of. Registers persist macros as plain text,
//! so the printable subset round-trips through `char` (`to_char` /
//! `from_char`); non-printable keys carry a dedicated `KeyCode` and are not
//! representable inside a register.

use bitflags::bitflags;
use std::fmt;

/// Symbolic key identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    Char(char),
    Escape,
    Enter,
    Backspace,
    Tab,
}

bitflags! {
    /// Modifier set attached to a key input.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct KeyModifiers: u8 {
        const SHIFT = 0b0001;
        const CTRL  = 0b0010;
        const ALT   = 0b0100;
    }
}

/// One key input as recorded into / replayed from a macro register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyInput {
    pub code: KeyCode,
    pub mods: KeyModifiers,
}

impl KeyInput {
    pub fn char(c: char) -> Self {
        Self {
            code: KeyCode::Char(c),
            mods: KeyModifiers::empty(),
        }
    }

    /// Rebuild a key input from a register character. `\x1b`, `\r`/`\n` and
    /// `\x08` map back to their symbolic codes; everything else is a plain char.
    pub fn from_char(c: char) -> Self {
        let code = match c {
            '\x1b' => KeyCode::Escape,
            '\r' | '\n' => KeyCode::Enter,
            '\x08' => KeyCode::Backspace,
            '\t' => KeyCode::Tab,
            other => KeyCode::Char(other),
        };
        Self {
            code,
            mods: KeyModifiers::empty(),
        }
    }

    /// The register-text representation of this key, if it has one.
    /// Inputs with CTRL/ALT modifiers are not representable and return `None`.
    pub fn to_char(&self) -> Option<char> {
        if self.mods.intersects(KeyModifiers::CTRL | KeyModifiers::ALT) {
            return None;
        }
        match self.code {
            KeyCode::Char(c) => Some(c),
            KeyCode::Escape => Some('\x1b'),
            KeyCode::Enter => Some('\r'),
            KeyCode::Backspace => Some('\x08'),
            KeyCode::Tab => Some('\t'),
        }
    }
}

impl fmt::Display for KeyInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.code {
            KeyCode::Char(c) => write!(f, "{c}"),
            KeyCode::Escape => write!(f, "<Esc>"),
            KeyCode::Enter => write!(f, "<CR>"),
            KeyCode::Backspace => write!(f, "<BS>"),
            KeyCode::Tab => write!(f, "<Tab>"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn printable_round_trip() {
        for c in ['a', 'Z', '0', ' ', '€'] {
            let k = KeyInput::from_char(c);
            assert_eq!(k.to_char(), Some(c));
        }
    }

    #[test]
    fn symbolic_round_trip() {
        let esc = KeyInput::from_char('\x1b');
        assert_eq!(esc.code, KeyCode::Escape);
        assert_eq!(esc.to_char(), Some('\x1b'));
    }

    #[test]
    fn modified_keys_not_register_representable() {
        let k = KeyInput {
            code: KeyCode::Char('r'),
            mods: KeyModifiers::CTRL,
        };
        assert_eq!(k.to_char(), None);
    }
}
