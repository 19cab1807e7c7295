// ============================================================================
// cirkit - Signal Bus
// Slots, wiring targets and the breadth-first dispatcher
// ============================================================================

mod dispatch;
mod switchboard;

use std::rc::Rc;

use serde_json::Value;

use crate::core::error::Result;
use crate::core::types::SignalKey;

pub use dispatch::Bus;
pub use switchboard::SwitchBoard;

// =============================================================================
// SLOTS
// =============================================================================

/// A function run when a wired signal is dispatched.
///
/// The payload comes first so a one-argument handler only has to ignore the
/// key. Returning `Err` aborts the rest of the cascade and hands the error to
/// whoever started the drain.
pub type Slot = Rc<dyn Fn(&Value, &SignalKey) -> Result<()>>;

/// Wrap a closure as a [`Slot`].
///
/// # Example
///
/// ```
/// use cirkit::{slot, Bus};
/// use serde_json::json;
/// use std::cell::Cell;
/// use std::rc::Rc;
///
/// let bus = Bus::new();
/// let hits = Rc::new(Cell::new(0));
/// let counter = hits.clone();
/// bus.wire("ping", slot(move |_, _| {
///     counter.set(counter.get() + 1);
///     Ok(())
/// }));
///
/// bus.emit("ping", json!(null)).unwrap();
/// assert_eq!(hits.get(), 1);
/// ```
pub fn slot<F>(f: F) -> Slot
where
    F: Fn(&Value, &SignalKey) -> Result<()> + 'static,
{
    Rc::new(f)
}

// =============================================================================
// WIRE TARGET
// =============================================================================

/// What a signal can be wired to: a slot, or another signal to re-emit.
#[derive(Clone)]
pub enum WireTarget {
    Slot(Slot),
    /// Re-emit this key with the same payload (aliasing).
    Forward(SignalKey),
}

impl From<Slot> for WireTarget {
    fn from(slot: Slot) -> Self {
        Self::Slot(slot)
    }
}

impl From<SignalKey> for WireTarget {
    fn from(key: SignalKey) -> Self {
        Self::Forward(key)
    }
}

impl From<&SignalKey> for WireTarget {
    fn from(key: &SignalKey) -> Self {
        Self::Forward(key.clone())
    }
}

impl From<&str> for WireTarget {
    fn from(key: &str) -> Self {
        Self::Forward(SignalKey::new(key))
    }
}

impl From<String> for WireTarget {
    fn from(key: String) -> Self {
        Self::Forward(SignalKey::from(key))
    }
}
