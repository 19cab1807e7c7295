// ============================================================================
// cirkit - SwitchBoard
// Signal key -> ordered slot list
// ============================================================================

use std::collections::HashMap;

use super::Slot;
use crate::core::types::SignalKey;

/// Connection table from signal keys to their slots.
///
/// Slots keep subscription order and duplicates are allowed. Connections are
/// additive: there is no way to unwire a slot.
#[derive(Default)]
pub struct SwitchBoard {
    slots: HashMap<SignalKey, Vec<Slot>>,
}

impl SwitchBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a slot to the signal's list.
    pub fn connect(&mut self, signal: SignalKey, slot: Slot) {
        self.slots.entry(signal).or_default().push(slot);
    }

    /// The slot at `position` in the signal's list, if there is one.
    ///
    /// The dispatcher walks a list by position, asking again before every
    /// call, so slots connected mid-dispatch are still reached.
    pub fn slot_at(&self, signal: &str, position: usize) -> Option<Slot> {
        self.slots.get(signal)?.get(position).cloned()
    }

    /// Number of slots wired to a signal.
    pub fn count(&self, signal: &str) -> usize {
        self.slots.get(signal).map_or(0, Vec::len)
    }

    /// Signals that have at least one slot.
    pub fn signals(&self) -> impl Iterator<Item = &SignalKey> {
        self.slots.keys()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}
