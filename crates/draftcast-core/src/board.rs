//! Selection board data model
//!
//! A board is an ordered sequence of slots, fixed in length at construction.
//! The controller owns the only mutable copy; displays hold read-only mirrors
//! that are replaced wholesale by the sync layer.
//!
//! Wire values for the enums are pinned by the mirror protocol and do not
//! follow declaration order: see [`SlotState`] and [`OpponentRole`].

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::{MirrorError, MirrorResult};

/// Default number of selectable slots on a board
pub const DEFAULT_SLOT_COUNT: usize = 16;

/// Which side a pick belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    /// The side labeled by the `A` query parameter
    A,
    /// The side labeled by the `B` query parameter
    B,
}

/// Raised when a wire value does not map to a slot state
#[derive(Debug, Error)]
#[error("invalid slot state value: {0}")]
pub struct InvalidSlotState(pub i8);

/// Selection state of a single slot
///
/// Wire values: Neutral = 0, PickedByA = 1, PickedByB = -1, Banned = -2.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "i8", try_from = "i8")]
pub enum SlotState {
    /// Not picked or banned
    #[default]
    Neutral,
    /// Picked by side A
    PickedByA,
    /// Picked by side B
    PickedByB,
    /// Removed from the draft
    Banned,
}

impl From<SlotState> for i8 {
    fn from(state: SlotState) -> i8 {
        match state {
            SlotState::Neutral => 0,
            SlotState::PickedByA => 1,
            SlotState::PickedByB => -1,
            SlotState::Banned => -2,
        }
    }
}

impl TryFrom<i8> for SlotState {
    type Error = InvalidSlotState;

    fn try_from(value: i8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(SlotState::Neutral),
            1 => Ok(SlotState::PickedByA),
            -1 => Ok(SlotState::PickedByB),
            -2 => Ok(SlotState::Banned),
            other => Err(InvalidSlotState(other)),
        }
    }
}

impl SlotState {
    /// Whether the slot currently belongs to either side
    pub fn is_picked(self) -> bool {
        matches!(self, SlotState::PickedByA | SlotState::PickedByB)
    }
}

/// Raised when a wire value does not map to an opponent role
#[derive(Debug, Error)]
#[error("invalid opponent role value: {0}")]
pub struct InvalidOpponentRole(pub i8);

/// Opposing-role marker carried by a picked slot
///
/// Wire values: None = 0, Attack = 1, Defend = -1. Only meaningful while the
/// slot is picked; the board clears it whenever the slot leaves the picked
/// states.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "i8", try_from = "i8")]
pub enum OpponentRole {
    /// No opposing role assigned
    #[default]
    None,
    /// Facing the attacking role
    Attack,
    /// Facing the defending role
    Defend,
}

impl From<OpponentRole> for i8 {
    fn from(role: OpponentRole) -> i8 {
        match role {
            OpponentRole::None => 0,
            OpponentRole::Attack => 1,
            OpponentRole::Defend => -1,
        }
    }
}

impl TryFrom<i8> for OpponentRole {
    type Error = InvalidOpponentRole;

    fn try_from(value: i8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(OpponentRole::None),
            1 => Ok(OpponentRole::Attack),
            -1 => Ok(OpponentRole::Defend),
            other => Err(InvalidOpponentRole(other)),
        }
    }
}

/// One selectable item on the board
///
/// Index identity is the item identity: slot `i` always refers to the same
/// selectable item for the lifetime of the board.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slot {
    /// Draft pick ordering label; `None` means not yet picked
    pub order: Option<u32>,
    /// Selection state
    pub state: SlotState,
    /// Opposing-role marker; None unless the slot is picked
    pub opponent: OpponentRole,
}

/// The selection state: a fixed-length ordered sequence of slots
///
/// All mutations go through the typed operations below, which enforce the
/// invariant that a neutral or banned slot never carries an opponent marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    slots: Vec<Slot>,
}

impl Board {
    /// Create a board with [`DEFAULT_SLOT_COUNT`] slots
    pub fn new() -> Self {
        Self::with_slots(DEFAULT_SLOT_COUNT)
    }

    /// Create a board with a fixed number of slots
    pub fn with_slots(len: usize) -> Self {
        Self {
            slots: vec![Slot::default(); len],
        }
    }

    /// Rebuild a board from raw slots (the display's replace path)
    ///
    /// No normalization is applied: the mirror shows exactly what the
    /// controller sent.
    pub fn from_slots(slots: Vec<Slot>) -> Self {
        Self { slots }
    }

    /// Number of slots; fixed for the board's lifetime
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether the board has no slots
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Read access to the slot sequence
    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    /// Consume the board into its raw slots
    pub fn into_slots(self) -> Vec<Slot> {
        self.slots
    }

    /// Read one slot, bounds-checked
    pub fn get(&self, index: usize) -> MirrorResult<&Slot> {
        self.slots.get(index).ok_or(MirrorError::SlotOutOfRange {
            index,
            len: self.slots.len(),
        })
    }

    fn slot_mut(&mut self, index: usize) -> MirrorResult<&mut Slot> {
        let len = self.slots.len();
        self.slots
            .get_mut(index)
            .ok_or(MirrorError::SlotOutOfRange { index, len })
    }

    /// Toggle a side's pick on a slot: picked-by-side becomes neutral,
    /// anything else (except banned) becomes picked-by-side.
    ///
    /// Picking over the other side's pick overwrites the state and keeps the
    /// opponent marker. Banned slots reject picks.
    pub fn toggle_pick(&mut self, side: Side, index: usize) -> MirrorResult<()> {
        let slot = self.get(index)?;
        if slot.state == SlotState::Banned {
            return Err(MirrorError::InvalidOperation(format!(
                "slot {} is banned",
                index
            )));
        }
        let picked = match side {
            Side::A => SlotState::PickedByA,
            Side::B => SlotState::PickedByB,
        };
        let next = if slot.state == picked {
            SlotState::Neutral
        } else {
            picked
        };
        self.set_state(index, next)
    }

    /// Toggle a ban on a slot: banned becomes neutral, anything else becomes
    /// banned. Always allowed; clears any opponent marker.
    pub fn toggle_ban(&mut self, index: usize) -> MirrorResult<()> {
        let slot = self.get(index)?;
        let next = if slot.state == SlotState::Banned {
            SlotState::Neutral
        } else {
            SlotState::Banned
        };
        self.set_state(index, next)
    }

    /// Toggle an opponent role on a picked slot: same role clears to None,
    /// anything else becomes the given role. Rejected unless the slot is
    /// currently picked.
    pub fn toggle_opponent(&mut self, index: usize, role: OpponentRole) -> MirrorResult<()> {
        let slot = self.slot_mut(index)?;
        if !slot.state.is_picked() {
            return Err(MirrorError::InvalidOperation(format!(
                "slot {} is not picked",
                index
            )));
        }
        slot.opponent = if slot.opponent == role {
            OpponentRole::None
        } else {
            role
        };
        Ok(())
    }

    /// Set or clear a slot's pick ordering label. Zero normalizes to `None`.
    pub fn set_order(&mut self, index: usize, order: Option<u32>) -> MirrorResult<()> {
        let slot = self.slot_mut(index)?;
        slot.order = order.filter(|&n| n != 0);
        Ok(())
    }

    // A neutral or banned slot must not carry an opponent marker.
    fn set_state(&mut self, index: usize, next: SlotState) -> MirrorResult<()> {
        let slot = self.slot_mut(index)?;
        slot.state = next;
        if !next.is_picked() {
            slot.opponent = OpponentRole::None;
        }
        Ok(())
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}
