//! Snapshot-based undo with linked transactions.
//!
//! The engine keeps full-buffer snapshots on an undo stack and mirrors them
//! onto a redo stack as history is walked. A linked undo transaction brackets
//! a group of edits so one `u` reverses all of them: the outermost open
//! transaction takes the snapshot, nested transactions coalesce into it.
//! Transactions are handles, not guards; the caller must `complete` or
//! `dispose` every one it opens.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use bitflags::bitflags;
use core_text::{Buffer, Position};
use thiserror::Error;
use tracing::{trace, warn};

const UNDO_HISTORY_MAX: usize = 200;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct LinkedUndoFlags: u8 {
        /// Completing with no buffer change is fine; the snapshot is dropped
        /// instead of polluting history.
        const CAN_BE_EMPTY = 1 << 0;
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum UndoError {
    #[error("transaction completed out of order; innermost must close first")]
    NotInnermost,
    #[error("no undo transaction is open")]
    NoneOpen,
}

/// Handle for an open transaction. Deliberately not `Clone`: exactly one
/// `complete` or `dispose` per `begin_transaction`.
#[derive(Debug)]
pub struct LinkedUndoTransaction {
    id: u64,
    /// Index of the buffer slot this transaction belongs to.
    pub buffer: usize,
}

impl LinkedUndoTransaction {
    pub fn id(&self) -> u64 {
        self.id
    }
}

#[derive(Debug, Clone)]
struct EditSnapshot {
    buffer: Buffer,
    caret: Position,
    hash: u64,
}

#[derive(Debug)]
struct OpenTransaction {
    id: u64,
    name: String,
    flags: LinkedUndoFlags,
    /// Whether this (outermost) transaction pushed the snapshot.
    pushed_snapshot: bool,
    hash_at_open: u64,
}

fn content_hash(buffer: &Buffer) -> u64 {
    let mut h = DefaultHasher::new();
    buffer.text().hash(&mut h);
    h.finish()
}

/// Per-buffer undo history.
#[derive(Debug, Default)]
pub struct UndoEngine {
    undo: Vec<EditSnapshot>,
    redo: Vec<EditSnapshot>,
    open: Vec<OpenTransaction>,
    next_id: u64,
}

impl UndoEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open_transaction_count(&self) -> usize {
        self.open.len()
    }

    /// Open a transaction over `buffer`. Only the outermost open transaction
    /// snapshots; nested ones coalesce into it.
    pub fn begin_transaction(
        &mut self,
        name: impl Into<String>,
        flags: LinkedUndoFlags,
        buffer_index: usize,
        buffer: &Buffer,
        caret: Position,
    ) -> LinkedUndoTransaction {
        let name = name.into();
        let hash = content_hash(buffer);
        let mut pushed = false;
        if self.open.is_empty() {
            let duplicate = self.undo.last().is_some_and(|s| s.hash == hash);
            if !duplicate {
                self.undo.push(EditSnapshot {
                    buffer: buffer.clone(),
                    caret,
                    hash,
                });
                if self.undo.len() > UNDO_HISTORY_MAX {
                    self.undo.remove(0);
                }
                pushed = true;
            }
        }
        let id = self.next_id;
        self.next_id += 1;
        trace!(
            target: "state.undo",
            id,
            name = %name,
            depth = self.open.len(),
            pushed,
            "begin transaction"
        );
        self.open.push(OpenTransaction {
            id,
            name,
            flags,
            pushed_snapshot: pushed,
            hash_at_open: hash,
        });
        LinkedUndoTransaction {
            id,
            buffer: buffer_index,
        }
    }

    /// Close a transaction. Must be the innermost open one. An outermost
    /// transaction that made no change and carries `CAN_BE_EMPTY` withdraws
    /// its snapshot.
    pub fn complete(
        &mut self,
        txn: LinkedUndoTransaction,
        buffer: &Buffer,
    ) -> Result<(), UndoError> {
        let top = self.open.last().ok_or(UndoError::NoneOpen)?;
        if top.id != txn.id {
            return Err(UndoError::NotInnermost);
        }
        let entry = self.open.pop().expect("checked above");
        let unchanged = content_hash(buffer) == entry.hash_at_open;
        trace!(
            target: "state.undo",
            id = entry.id,
            name = %entry.name,
            unchanged,
            "complete transaction"
        );
        if self.open.is_empty() {
            if unchanged {
                if entry.pushed_snapshot && entry.flags.contains(LinkedUndoFlags::CAN_BE_EMPTY) {
                    self.undo.pop();
                }
            } else {
                self.redo.clear();
            }
        }
        Ok(())
    }

    /// Abandon a transaction after a failed edit. Rolls the buffer back to
    /// the outermost snapshot when this was the last open transaction.
    pub fn dispose(
        &mut self,
        txn: LinkedUndoTransaction,
        buffer: &mut Buffer,
        caret: &mut Position,
    ) {
        let Some(pos) = self.open.iter().position(|t| t.id == txn.id) else {
            warn!(target: "state.undo", id = txn.id, "dispose of unknown transaction");
            return;
        };
        let pushed = self.open[pos].pushed_snapshot;
        // Inner transactions opened after this one are abandoned with it.
        self.open.truncate(pos);
        warn!(target: "state.undo", id = txn.id, "transaction disposed; rolling back");
        if self.open.is_empty() {
            // Deduped outermost opens reuse the prior snapshot, so it must
            // stay in history after the rollback.
            let snapshot = if pushed {
                self.undo.pop()
            } else {
                self.undo.last().cloned()
            };
            if let Some(snapshot) = snapshot {
                *buffer = snapshot.buffer;
                *caret = snapshot.caret;
            }
        }
    }

    /// Restore the previous snapshot. Returns false when history is empty.
    pub fn undo(&mut self, buffer: &mut Buffer, caret: &mut Position) -> bool {
        debug_assert!(self.open.is_empty(), "undo with a transaction open");
        let Some(snapshot) = self.undo.pop() else {
            return false;
        };
        self.redo.push(EditSnapshot {
            buffer: buffer.clone(),
            caret: *caret,
            hash: content_hash(buffer),
        });
        trace!(target: "state.undo", remaining = self.undo.len(), "undo");
        *buffer = snapshot.buffer;
        *caret = snapshot.caret;
        true
    }

    /// Reapply the last undone snapshot. Returns false when there is none.
    pub fn redo(&mut self, buffer: &mut Buffer, caret: &mut Position) -> bool {
        let Some(snapshot) = self.redo.pop() else {
            return false;
        };
        self.undo.push(EditSnapshot {
            buffer: buffer.clone(),
            caret: *caret,
            hash: content_hash(buffer),
        });
        trace!(target: "state.undo", remaining = self.redo.len(), "redo");
        *buffer = snapshot.buffer;
        *caret = snapshot.caret;
        true
    }
}
