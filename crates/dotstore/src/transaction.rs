//! Nested transactions.
//!
//! Entering a transaction pushes the pre-entry document onto a stack and
//! continues with an independent copy of it. Leaving successfully drops the
//! saved snapshot and keeps the edited document; leaving on failure throws the
//! edited document away and reinstates the snapshot. Only the outermost
//! successful exit persists.

use std::ops::{Deref, DerefMut};

use dotstore_tree::Document;
use tracing::{debug, warn};

use crate::error::{StoreError, StoreResult};
use crate::store::Store;

/// A saved copy of the document taken on transaction entry.
pub type Snapshot = Document;

/// Saved snapshots, innermost last. The length is the nesting depth.
#[derive(Debug, Default)]
pub struct TransactionStack {
    snapshots: Vec<Snapshot>,
}

impl TransactionStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn depth(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Save `live` and replace it with a fresh copy, so that edits made from
    /// here on share nothing with the saved snapshot.
    pub fn enter(&mut self, live: &mut Document) {
        let fresh = live.clone();
        self.snapshots.push(std::mem::replace(live, fresh));
    }

    /// Leave the innermost transaction keeping the current document.
    ///
    /// Returns `true` when that was the outermost transaction.
    pub fn release(&mut self) -> StoreResult<bool> {
        self.snapshots
            .pop()
            .ok_or(StoreError::NoActiveTransaction)?;
        Ok(self.snapshots.is_empty())
    }

    /// Leave the innermost transaction restoring its snapshot into `live`.
    pub fn rollback(&mut self, live: &mut Document) -> StoreResult<()> {
        *live = self
            .snapshots
            .pop()
            .ok_or(StoreError::NoActiveTransaction)?;
        Ok(())
    }
}

/// A transaction scope over a [`Store`].
///
/// Dereferences to the store, so every read and write is available on the
/// guard. [`commit`](Transaction::commit) ends the scope keeping the edits;
/// dropping the guard any other way (early return, `?`, panic) rolls back.
pub struct Transaction<'s> {
    store: &'s mut Store,
    finished: bool,
}

impl<'s> Transaction<'s> {
    pub(crate) fn begin(store: &'s mut Store) -> Self {
        store.begin_transaction();
        Self {
            store,
            finished: false,
        }
    }

    /// Keep the edits. Persists when this is the outermost transaction.
    pub fn commit(mut self) -> StoreResult<()> {
        self.finished = true;
        self.store.finish_transaction()
    }

    /// Discard the edits made inside this scope.
    pub fn rollback(mut self) -> StoreResult<()> {
        self.finished = true;
        self.store.abort_transaction()
    }
}

impl Deref for Transaction<'_> {
    type Target = Store;

    fn deref(&self) -> &Store {
        &*self.store
    }
}

impl DerefMut for Transaction<'_> {
    fn deref_mut(&mut self) -> &mut Store {
        &mut *self.store
    }
}

impl Drop for Transaction<'_> {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        debug!(depth = self.store.depth(), "transaction dropped without commit");
        if let Err(e) = self.store.abort_transaction() {
            warn!(error = %e, "rollback on drop failed");
        }
    }
}
