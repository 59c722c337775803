//! Macro recording and playback.
//!
//! Recording captures raw key inputs into a register as plain text; an
//! uppercase register appends to its lowercase slot. Playback resolves the
//! register text back into key inputs and feeds them through a
//! [`KeyInputRunner`] the host supplies. While a macro replays, each buffer
//! it edits gets one open undo transaction, so a whole playback undoes in
//! one step per buffer regardless of how many commands ran.

use std::collections::HashMap;

use core_events::KeyInput;
use core_state::{
    LinkedUndoFlags, LinkedUndoTransaction, OperationKind, RegisterName, RegisterOperation,
    RegisterValue, StringData, VimState,
};
use tracing::{debug, trace, warn};

use crate::executor::CommandExecutor;
use crate::{CommandResult, ModeSwitch, VimHost, VimSession};

/// An in-progress `q` recording.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MacroRecording {
    /// Target register, lowercased.
    pub register: char,
    /// True for an uppercase target: new keys append to the register.
    pub append: bool,
    pub keys: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyRunResult {
    Handled,
    Error,
}

/// Replays one key input through the host's key pipeline.
pub trait KeyInputRunner {
    fn run_key_input(
        &mut self,
        state: &mut VimState,
        session: &mut VimSession,
        input: KeyInput,
    ) -> KeyRunResult;
}

/// Registers a macro may record into or play back from.
pub(crate) fn playback_register(c: char) -> Option<RegisterName> {
    match c {
        'a'..='z' | 'A'..='Z' | '0'..='9' | '"' => RegisterName::parse(c),
        _ => None,
    }
}

pub(crate) fn start_recording(exec: &mut CommandExecutor, register: char) -> CommandResult {
    if exec.session.recording.is_some() {
        warn!(target: "actions.macro", "already recording");
        exec.host.beep();
        return CommandResult::Error;
    }
    if playback_register(register).is_none() {
        exec.host.beep();
        return CommandResult::Completed(ModeSwitch::NoSwitch);
    }
    debug!(target: "actions.macro", register = %register, "recording started");
    exec.session.recording = Some(MacroRecording {
        register: register.to_ascii_lowercase(),
        append: register.is_ascii_uppercase(),
        keys: String::new(),
    });
    exec.host.on_status(&format!("recording @{}", register.to_ascii_lowercase()));
    CommandResult::Completed(ModeSwitch::NoSwitch)
}

pub(crate) fn stop_recording(exec: &mut CommandExecutor) -> CommandResult {
    let Some(recording) = exec.session.recording.take() else {
        exec.host.beep();
        return CommandResult::Error;
    };
    debug!(
        target: "actions.macro",
        register = %recording.register,
        keys = recording.keys.len(),
        "recording stopped"
    );
    let name = if recording.append {
        recording.register.to_ascii_uppercase()
    } else {
        recording.register
    };
    let name = RegisterName::parse(name).unwrap_or(RegisterName::Unnamed);
    exec.state.registers.set(
        Some(name),
        RegisterValue::new(
            StringData::simple(recording.keys),
            OperationKind::CharacterWise,
        ),
        RegisterOperation::Yank,
    );
    exec.host.on_status("recording stopped");
    CommandResult::Completed(ModeSwitch::NoSwitch)
}

/// Append a key to the active recording, if any. The host calls this for
/// every key it handles; the closing `q` must not be fed through.
pub fn record_key(session: &mut VimSession, input: KeyInput) {
    if let Some(recording) = &mut session.recording {
        match input.to_char() {
            Some(c) => recording.keys.push(c),
            None => warn!(target: "actions.macro", %input, "key not register-representable"),
        }
    }
}

/// Play the macro in `register` `count` times.
pub(crate) fn run_macro(
    state: &mut VimState,
    session: &mut VimSession,
    host: &mut dyn VimHost,
    runner: &mut dyn KeyInputRunner,
    register: RegisterName,
    count: usize,
) -> CommandResult {
    let keys = state.registers.text_of(Some(register));
    if keys.is_empty() {
        host.beep();
        return CommandResult::Error;
    }
    session.last_macro_run = Some(register);
    let origin = state.active_index();
    let mut transactions: HashMap<usize, LinkedUndoTransaction> = HashMap::new();
    let mut failed = false;
    'runs: for run in 0..count.max(1) {
        trace!(target: "actions.macro", run, "playback pass");
        for c in keys.chars() {
            let buffer = state.active_index();
            transactions.entry(buffer).or_insert_with(|| {
                state.begin_transaction_for(buffer, "macro playback", LinkedUndoFlags::CAN_BE_EMPTY)
            });
            let result = runner.run_key_input(state, session, KeyInput::from_char(c));
            // The replayed command may have moved host focus to another
            // buffer; follow it so the next key lands there.
            if let Some(focus) = host.focused_buffer() {
                if focus < state.slot_count() && focus != state.active_index() {
                    state.set_active(focus);
                }
            }
            if result == KeyRunResult::Error {
                warn!(target: "actions.macro", run, "playback stopped on error");
                failed = true;
                break 'runs;
            }
        }
    }
    for (buffer, txn) in transactions {
        if let Err(e) = state.complete_transaction(txn) {
            warn!(target: "actions.macro", buffer, error = %e, "transaction");
        }
    }
    if state.active_index() != origin && host.focused_buffer().is_none() {
        state.set_active(origin);
    }
    if failed {
        CommandResult::Error
    } else {
        CommandResult::Completed(ModeSwitch::NoSwitch)
    }
}
