//! Editor-session state for the command engine.
//!
//! A [`VimState`] owns the open buffers, the caret and undo history of each,
//! the current mode, the register store, and the engine configuration.
//! Linked undo transactions are routed here so callers can open a transaction
//! on one buffer, switch buffers, and still close it against the right
//! history (macro playback does exactly that).

pub mod registers;
pub mod undo;
pub mod visual;

use anyhow::Result;
use core_config::EngineConfig;
use tracing::trace;

pub use core_text::{Buffer, LineRange, Position, Span};

pub use registers::{
    OperationKind, ReadOnlyRegister, RegisterName, RegisterOperation, RegisterStore,
    RegisterValue, StringData,
};
pub use undo::{LinkedUndoFlags, LinkedUndoTransaction, UndoEngine, UndoError};
pub use visual::{StoredVisualSpan, VisualSpan};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeKind {
    Normal,
    Insert,
    VisualCharacter,
    VisualLine,
    VisualBlock,
}

impl ModeKind {
    pub fn is_visual(&self) -> bool {
        matches!(
            self,
            Self::VisualCharacter | Self::VisualLine | Self::VisualBlock
        )
    }
}

/// One open buffer with its caret and undo history.
#[derive(Debug)]
pub struct BufferSlot {
    pub buffer: Buffer,
    pub caret: Position,
    pub undo: UndoEngine,
}

impl BufferSlot {
    pub fn new(buffer: Buffer) -> Self {
        Self {
            buffer,
            caret: Position::origin(),
            undo: UndoEngine::new(),
        }
    }
}

#[derive(Debug)]
pub struct VimState {
    slots: Vec<BufferSlot>,
    active: usize,
    mode: ModeKind,
    previous_mode: ModeKind,
    pub registers: RegisterStore,
    pub config: EngineConfig,
    /// Last visual selection, kept for repeat and the selection marks.
    pub last_visual: Option<VisualSpan>,
}

impl VimState {
    pub fn new(buffer: Buffer, config: EngineConfig) -> Self {
        Self {
            slots: vec![BufferSlot::new(buffer)],
            active: 0,
            mode: ModeKind::Normal,
            previous_mode: ModeKind::Normal,
            registers: RegisterStore::new(),
            config,
            last_visual: None,
        }
    }

    pub fn from_text(text: &str) -> Result<Self> {
        Ok(Self::new(
            Buffer::from_str("scratch", text)?,
            EngineConfig::default(),
        ))
    }

    pub fn mode(&self) -> ModeKind {
        self.mode
    }

    pub fn set_mode(&mut self, mode: ModeKind) {
        if mode != self.mode {
            trace!(target: "state.mode", from = ?self.mode, to = ?mode, "mode switch");
            self.previous_mode = self.mode;
            self.mode = mode;
        }
    }

    pub fn switch_previous_mode(&mut self) {
        let prev = self.previous_mode;
        self.set_mode(prev);
    }

    pub fn active_index(&self) -> usize {
        self.active
    }

    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// Add a buffer and return its slot index.
    pub fn add_buffer(&mut self, buffer: Buffer) -> usize {
        self.slots.push(BufferSlot::new(buffer));
        self.slots.len() - 1
    }

    pub fn set_active(&mut self, index: usize) {
        debug_assert!(index < self.slots.len());
        self.active = index.min(self.slots.len().saturating_sub(1));
    }

    pub fn active_slot(&self) -> &BufferSlot {
        &self.slots[self.active]
    }

    pub fn active_slot_mut(&mut self) -> &mut BufferSlot {
        &mut self.slots[self.active]
    }

    pub fn buffer(&self) -> &Buffer {
        &self.active_slot().buffer
    }

    pub fn buffer_mut(&mut self) -> &mut Buffer {
        &mut self.active_slot_mut().buffer
    }

    pub fn caret(&self) -> Position {
        self.active_slot().caret
    }

    pub fn set_caret(&mut self, caret: Position) {
        self.active_slot_mut().caret = caret;
    }

    /// Open a linked undo transaction on the active buffer.
    pub fn begin_transaction(
        &mut self,
        name: &str,
        flags: LinkedUndoFlags,
    ) -> LinkedUndoTransaction {
        self.begin_transaction_for(self.active, name, flags)
    }

    /// Open a linked undo transaction on a specific buffer slot.
    pub fn begin_transaction_for(
        &mut self,
        index: usize,
        name: &str,
        flags: LinkedUndoFlags,
    ) -> LinkedUndoTransaction {
        let slot = &mut self.slots[index];
        slot.undo
            .begin_transaction(name, flags, index, &slot.buffer, slot.caret)
    }

    /// Close a transaction against the buffer it was opened on.
    pub fn complete_transaction(&mut self, txn: LinkedUndoTransaction) -> Result<(), UndoError> {
        let slot = &mut self.slots[txn.buffer];
        slot.undo.complete(txn, &slot.buffer)
    }

    /// Abandon a transaction, rolling its buffer back.
    pub fn dispose_transaction(&mut self, txn: LinkedUndoTransaction) {
        let slot = &mut self.slots[txn.buffer];
        let BufferSlot { buffer, caret, undo } = slot;
        undo.dispose(txn, buffer, caret);
    }

    /// Run `f` inside a transaction on the active buffer: complete on
    /// success, dispose (rolling back) on error.
    pub fn edit_with_undo_transaction<T>(
        &mut self,
        name: &str,
        flags: LinkedUndoFlags,
        f: impl FnOnce(&mut VimState) -> Result<T>,
    ) -> Result<T> {
        let txn = self.begin_transaction(name, flags);
        match f(self) {
            Ok(value) => {
                self.complete_transaction(txn)?;
                Ok(value)
            }
            Err(e) => {
                self.dispose_transaction(txn);
                Err(e)
            }
        }
    }

    pub fn undo(&mut self) -> bool {
        let slot = self.active_slot_mut();
        let BufferSlot { buffer, caret, undo } = slot;
        undo.undo(buffer, caret)
    }

    pub fn redo(&mut self) -> bool {
        let slot = self.active_slot_mut();
        let BufferSlot { buffer, caret, undo } = slot;
        undo.redo(buffer, caret)
    }
}
