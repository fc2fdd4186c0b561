//! Single-owner board container with change notification
//!
//! The store is the seam between the presentation layer and the sync layer:
//! the controller's UI mutates through the typed entry points here, and the
//! push pump reacts to the watch channel without being coupled to any render
//! cycle. On a display, the sync layer is the only writer (via [`BoardStore::replace`])
//! and the presentation layer only watches.
//!
//! Every successful mutation publishes a fresh board value; failed mutations
//! publish nothing.

use std::sync::Arc;

use tokio::sync::watch;

use crate::board::{Board, OpponentRole, Side, Slot};
use crate::error::{MirrorError, MirrorResult};

/// Shared handle to a single-owner board
///
/// Cloning the store clones the handle, not the board; all clones observe and
/// mutate the same value.
#[derive(Debug, Clone)]
pub struct BoardStore {
    tx: Arc<watch::Sender<Board>>,
}

impl BoardStore {
    /// Create a store around an existing board
    pub fn new(board: Board) -> Self {
        let (tx, _) = watch::channel(board);
        Self { tx: Arc::new(tx) }
    }

    /// Create a store with a fresh all-neutral board of `len` slots
    pub fn with_slots(len: usize) -> Self {
        Self::new(Board::with_slots(len))
    }

    /// Clone of the current board value
    pub fn snapshot(&self) -> Board {
        self.tx.borrow().clone()
    }

    /// Subscribe to board changes
    ///
    /// The receiver sees every published value; `changed()` fires on each
    /// mutation because mutations always publish a new value.
    pub fn watch(&self) -> watch::Receiver<Board> {
        self.tx.subscribe()
    }

    /// The board's fixed slot count
    pub fn len(&self) -> usize {
        self.tx.borrow().len()
    }

    /// Whether the board has no slots
    pub fn is_empty(&self) -> bool {
        self.tx.borrow().is_empty()
    }

    /// Toggle a side's pick (controller entry point)
    pub fn toggle_pick(&self, side: Side, index: usize) -> MirrorResult<()> {
        self.apply(|board| board.toggle_pick(side, index))
    }

    /// Toggle a ban (controller entry point)
    pub fn toggle_ban(&self, index: usize) -> MirrorResult<()> {
        self.apply(|board| board.toggle_ban(index))
    }

    /// Toggle an opponent role (controller entry point)
    pub fn toggle_opponent(&self, index: usize, role: OpponentRole) -> MirrorResult<()> {
        self.apply(|board| board.toggle_opponent(index, role))
    }

    /// Set or clear a pick ordering label (controller entry point)
    pub fn set_order(&self, index: usize, order: Option<u32>) -> MirrorResult<()> {
        self.apply(|board| board.set_order(index, order))
    }

    /// Replace the whole board from inbound slots (display entry point)
    ///
    /// The minimal shape check: the sequence length must match the mirror's
    /// fixed length. No merge, no normalization; the new value is published
    /// as-is.
    pub fn replace(&self, slots: Vec<Slot>) -> MirrorResult<()> {
        let expected = self.len();
        if slots.len() != expected {
            return Err(MirrorError::MalformedFrame(format!(
                "expected {} slots, got {}",
                expected,
                slots.len()
            )));
        }
        self.tx.send_replace(Board::from_slots(slots));
        Ok(())
    }

    fn apply<F>(&self, mutate: F) -> MirrorResult<()>
    where
        F: FnOnce(&mut Board) -> MirrorResult<()>,
    {
        let mut next = self.tx.borrow().clone();
        mutate(&mut next)?;
        self.tx.send_replace(next);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::SlotState;

    #[test]
    fn test_mutation_notifies_watchers() {
        let store = BoardStore::with_slots(8);
        let mut rx = store.watch();

        assert!(!rx.has_changed().unwrap());
        store.toggle_pick(Side::A, 3).unwrap();
        assert!(rx.has_changed().unwrap());

        let board = rx.borrow_and_update().clone();
        assert_eq!(board.slots()[3].state, SlotState::PickedByA);
    }

    #[test]
    fn test_failed_mutation_publishes_nothing() {
        let store = BoardStore::with_slots(8);
        store.toggle_ban(2).unwrap();

        let mut rx = store.watch();
        assert!(store.toggle_pick(Side::A, 2).is_err());
        assert!(!rx.has_changed().unwrap());
    }

    #[test]
    fn test_replace_is_wholesale() {
        let store = BoardStore::with_slots(4);
        store.toggle_ban(0).unwrap();

        let mut incoming = vec![Slot::default(); 4];
        incoming[2].state = SlotState::PickedByB;
        store.replace(incoming.clone()).unwrap();

        // The prior ban is gone: no merge with the previous mirror
        assert_eq!(store.snapshot().slots(), incoming.as_slice());
    }

    #[test]
    fn test_replace_rejects_length_mismatch() {
        let store = BoardStore::with_slots(4);
        let before = store.snapshot();

        let err = store.replace(vec![Slot::default(); 5]).unwrap_err();
        assert!(matches!(err, MirrorError::MalformedFrame(_)));
        assert_eq!(store.snapshot(), before);
    }

    #[test]
    fn test_clones_share_state() {
        let store = BoardStore::with_slots(8);
        let other = store.clone();

        store.toggle_pick(Side::B, 1).unwrap();
        assert_eq!(other.snapshot().slots()[1].state, SlotState::PickedByB);
    }
}
