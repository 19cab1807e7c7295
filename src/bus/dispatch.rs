// ============================================================================
// cirkit - Dispatch
//
// The bus keeps one FIFO queue. `emit` pushes to the tail and, unless a drain
// is already running further up the stack, drains the queue to empty before
// returning. Signals emitted by slots land behind everything already queued,
// so a cascade unfolds level by level instead of recursing.
// ============================================================================

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::{Rc, Weak};

use serde_json::Value;
use tracing::{debug, trace, warn};

use super::switchboard::SwitchBoard;
use super::{Slot, WireTarget};
use crate::core::config::BusConfig;
use crate::core::error::{CircuitError, Result};
use crate::core::types::SignalKey;

// =============================================================================
// QUEUE ENTRY
// =============================================================================

#[derive(Clone)]
struct Entry {
    seq: u64,
    signal: SignalKey,
    payload: Rc<Value>,
}

// =============================================================================
// BUS INNER
// =============================================================================

struct BusInner {
    board: RefCell<SwitchBoard>,
    queue: RefCell<VecDeque<Entry>>,
    /// Set while some stack frame owns the drain loop
    dispatching: Cell<bool>,
    /// Sequence number the next emitted entry gets
    next_seq: Cell<u64>,
    /// Sequence number of the entry whose slots are running
    current: Cell<Option<u64>>,
    config: BusConfig,
}

impl BusInner {
    fn front(&self) -> Option<Entry> {
        self.queue.borrow().front().cloned()
    }

    fn pop_front(&self) {
        self.queue.borrow_mut().pop_front();
    }
}

/// Clears the dispatching flag when a drain ends, however it ends.
///
/// If a slot panics, the entry it was handling is dropped too, so a caller
/// that catches the panic is left with a working bus.
struct DrainGuard<'a> {
    inner: &'a BusInner,
}

impl<'a> DrainGuard<'a> {
    fn enter(inner: &'a BusInner) -> Self {
        inner.dispatching.set(true);
        Self { inner }
    }
}

impl Drop for DrainGuard<'_> {
    fn drop(&mut self) {
        if std::thread::panicking() {
            if let Ok(mut queue) = self.inner.queue.try_borrow_mut() {
                queue.pop_front();
            }
        }
        self.inner.current.set(None);
        self.inner.dispatching.set(false);
    }
}

// =============================================================================
// BUS
// =============================================================================

/// A single-threaded signal bus.
///
/// `Bus` is a cheap handle: clones share the same switchboard and queue.
/// Independent buses never see each other's signals.
///
/// # Example
///
/// ```
/// use cirkit::{slot, Bus};
/// use serde_json::json;
/// use std::cell::RefCell;
/// use std::rc::Rc;
///
/// let bus = Bus::new();
/// let log = Rc::new(RefCell::new(Vec::new()));
///
/// let emitter = bus.clone();
/// bus.wire("a", slot(move |_, _| emitter.emit("b", json!(null))));
/// bus.wire("a", "c");
///
/// for key in ["a", "b", "c"] {
///     let log = log.clone();
///     bus.wire(key, slot(move |_, signal| {
///         log.borrow_mut().push(signal.to_string());
///         Ok(())
///     }));
/// }
///
/// bus.emit("a", json!(null)).unwrap();
/// assert_eq!(*log.borrow(), vec!["a", "b", "c"]);
/// ```
#[derive(Clone)]
pub struct Bus {
    inner: Rc<BusInner>,
}

impl Bus {
    pub fn new() -> Self {
        Self::with_config(BusConfig::default())
    }

    pub fn with_config(config: BusConfig) -> Self {
        Self {
            inner: Rc::new(BusInner {
                board: RefCell::new(SwitchBoard::new()),
                queue: RefCell::new(VecDeque::new()),
                dispatching: Cell::new(false),
                next_seq: Cell::new(0),
                current: Cell::new(None),
                config,
            }),
        }
    }

    pub fn config(&self) -> &BusConfig {
        &self.inner.config
    }

    // =========================================================================
    // WIRING
    // =========================================================================

    /// Append a slot to `signal`'s subscriber list.
    ///
    /// Wiring to another key creates a forwarding slot that re-emits that key
    /// with the same payload. The forwarder holds the bus weakly.
    pub fn wire(&self, signal: impl Into<SignalKey>, target: impl Into<WireTarget>) {
        let signal = signal.into();
        let slot = match target.into() {
            WireTarget::Slot(slot) => {
                debug!(signal = %signal, "wire slot");
                slot
            }
            WireTarget::Forward(alias) => {
                debug!(signal = %signal, target = %alias, "wire forward");
                self.forwarder(alias)
            }
        };
        self.inner.board.borrow_mut().connect(signal, slot);
    }

    /// Shorthand for `wire(signal, slot(f))`.
    pub fn on<F>(&self, signal: impl Into<SignalKey>, f: F)
    where
        F: Fn(&Value, &SignalKey) -> Result<()> + 'static,
    {
        self.wire(signal, super::slot(f));
    }

    fn forwarder(&self, alias: SignalKey) -> Slot {
        let weak: Weak<BusInner> = Rc::downgrade(&self.inner);
        Rc::new(move |payload: &Value, _: &SignalKey| match weak.upgrade() {
            Some(inner) => Bus { inner }.emit(alias.clone(), payload.clone()),
            None => Ok(()),
        })
    }

    /// Number of slots currently wired to `signal`.
    pub fn subscriber_count(&self, signal: &str) -> usize {
        self.inner.board.borrow().count(signal)
    }

    // =========================================================================
    // EMIT / DISPATCH
    // =========================================================================

    /// Queue a signal and, if no drain is running, dispatch until the queue is
    /// empty.
    ///
    /// Called from inside a slot this only queues. The outermost call returns
    /// once the whole cascade has been delivered, or with the first slot
    /// error.
    pub fn emit(&self, signal: impl Into<SignalKey>, payload: Value) -> Result<()> {
        let signal = signal.into();
        let seq = self.inner.next_seq.get();
        self.inner.next_seq.set(seq + 1);
        trace!(signal = %signal, seq, "emit");
        self.inner.queue.borrow_mut().push_back(Entry {
            seq,
            signal,
            payload: Rc::new(payload),
        });

        if self.inner.dispatching.get() {
            return Ok(());
        }
        self.drain()
    }

    /// Dispatch whatever is queued.
    ///
    /// Entries are only left behind when a drain was aborted by a slot error;
    /// the next `emit` picks them up as well, ahead of its own signal.
    pub fn flush(&self) -> Result<()> {
        if self.inner.dispatching.get() {
            return Ok(());
        }
        self.drain()
    }

    /// Number of queued entries, including the one being dispatched.
    pub fn pending(&self) -> usize {
        self.inner.queue.borrow().len()
    }

    pub fn is_dispatching(&self) -> bool {
        self.inner.dispatching.get()
    }

    /// Sequence number the next `emit` will stamp on its entry.
    ///
    /// Numbers grow by one per emit and are never reused, so anything with a
    /// lower number was queued earlier.
    pub fn sequence(&self) -> u64 {
        self.inner.next_seq.get()
    }

    /// Sequence number of the entry being delivered, or `None` outside a
    /// drain.
    pub fn current_sequence(&self) -> Option<u64> {
        self.inner.current.get()
    }

    fn drain(&self) -> Result<()> {
        let _guard = DrainGuard::enter(&self.inner);
        let limit = self.inner.config.max_cascade;
        let mut dispatched = 0usize;

        while let Some(entry) = self.inner.front() {
            if dispatched >= limit {
                let dropped = self.inner.queue.borrow_mut().drain(..).count();
                warn!(limit, dropped, "signal cascade overflow; queue discarded");
                return Err(CircuitError::CascadeOverflow { limit });
            }
            dispatched += 1;

            // The entry stays at the front while its slots run, so anything
            // they emit queues up behind it.
            self.inner.current.set(Some(entry.seq));
            let outcome = self.deliver(&entry);
            self.inner.current.set(None);
            self.inner.pop_front();

            if let Err(err) = outcome {
                warn!(
                    signal = %entry.signal,
                    pending = self.pending(),
                    error = %err,
                    "slot failed; signal cascade aborted"
                );
                return Err(err);
            }
        }

        trace!(dispatched, "drain complete");
        Ok(())
    }

    fn deliver(&self, entry: &Entry) -> Result<()> {
        let mut position = 0;
        loop {
            // Re-read the list on every step; never hold the borrow across a call
            let next = self
                .inner
                .board
                .borrow()
                .slot_at(entry.signal.as_str(), position);
            let Some(slot) = next else {
                break;
            };
            trace!(signal = %entry.signal, position, "dispatch");
            slot(&entry.payload, &entry.signal)?;
            position += 1;
        }
        Ok(())
    }
}

impl Default for Bus {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Bus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bus")
            .field("signals", &self.inner.board.borrow().len())
            .field("pending", &self.pending())
            .field("dispatching", &self.is_dispatching())
            .finish()
    }
}

// =============================================================================
// TESTS
// =============================================================================
