// ============================================================================
// cirkit - Collection
// An ordered, selectable list that reports every change on the bus
// ============================================================================
//
// Each mutation updates the data first, then emits. Borrows are released
// before any emit, so slots can read the collection while it is reporting.
// ============================================================================

use std::cell::{Cell, Ref, RefCell};
use std::rc::{Rc, Weak};

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use super::BoundSource;
use crate::bus::{Bus, Slot};
use crate::core::constants::{ADD_SUFFIX, DEL_SUFFIX, SEL_SUFFIX, SET_SUFFIX};
use crate::core::error::{CircuitError, Result};
use crate::core::types::{decode, decode_index, IndexedItem, Selection, SignalKey};

// =============================================================================
// SIGNAL KEYS
// =============================================================================

/// The four keys a collection named `N` emits on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionKeys {
    /// `N.+` with `{item, index}`
    pub add: SignalKey,
    /// `N.-` with the removed index
    pub del: SignalKey,
    /// `N.*` with `{item, index}`
    pub set: SignalKey,
    /// `N.sel` with `{index, selected}`
    pub sel: SignalKey,
}

impl CollectionKeys {
    pub fn new(name: &SignalKey) -> Self {
        Self {
            add: name.child(ADD_SUFFIX),
            del: name.child(DEL_SUFFIX),
            set: name.child(SET_SUFFIX),
            sel: name.child(SEL_SUFFIX),
        }
    }
}

// =============================================================================
// COLLECTION
// =============================================================================

struct CollectionInner<T> {
    name: SignalKey,
    keys: CollectionKeys,
    bus: Bus,
    items: RefCell<Vec<T>>,
    selected: Cell<Option<usize>>,
}

/// An observable list with single selection.
///
/// Handles are cheap clones of the same list. Selection follows the selected
/// item: inserting or deleting in front of it shifts the selected index, and
/// observers see a deselect before the structural signal and a reselect
/// after it.
///
/// # Example
///
/// ```
/// use cirkit::{Bus, Collection};
/// use serde_json::json;
/// use std::cell::RefCell;
/// use std::rc::Rc;
///
/// let bus = Bus::new();
/// let seen = Rc::new(RefCell::new(Vec::new()));
/// let log = seen.clone();
/// bus.on("todos.+", move |payload, _| {
///     log.borrow_mut().push(payload.clone());
///     Ok(())
/// });
///
/// let todos = Collection::new("todos", &bus);
/// todos.add(json!({"text": "x"}), None).unwrap();
/// todos.add(json!({"text": "y"}), Some(0)).unwrap();
///
/// assert_eq!(seen.borrow()[1], json!({"index": 0, "item": {"text": "y"}}));
/// assert_eq!(todos.items(), vec![json!({"text": "y"}), json!({"text": "x"})]);
/// ```
pub struct Collection<T> {
    inner: Rc<CollectionInner<T>>,
}

impl<T> Clone for Collection<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T> Collection<T> {
    pub fn name(&self) -> &SignalKey {
        &self.inner.name
    }

    pub fn keys(&self) -> &CollectionKeys {
        &self.inner.keys
    }

    pub fn bus(&self) -> &Bus {
        &self.inner.bus
    }

    pub fn len(&self) -> usize {
        self.inner.items.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn selected_index(&self) -> Option<usize> {
        self.inner.selected.get()
    }

    /// Borrow the items in order.
    ///
    /// Do not mutate the collection while the guard is alive.
    pub fn with_items<R>(&self, f: impl FnOnce(&[T]) -> R) -> R {
        let items: Ref<'_, Vec<T>> = self.inner.items.borrow();
        f(&items)
    }
}

impl<T: Clone> Collection<T> {
    pub fn items(&self) -> Vec<T> {
        self.inner.items.borrow().clone()
    }

    pub fn get(&self, index: usize) -> Option<T> {
        self.inner.items.borrow().get(index).cloned()
    }

    pub fn selected_item(&self) -> Option<T> {
        self.get(self.selected_index()?)
    }
}

impl<T: Serialize + 'static> Collection<T> {
    pub fn new(name: impl Into<SignalKey>, bus: &Bus) -> Self {
        let name = name.into();
        Self {
            inner: Rc::new(CollectionInner {
                keys: CollectionKeys::new(&name),
                name,
                bus: bus.clone(),
                items: RefCell::new(Vec::new()),
                selected: Cell::new(None),
            }),
        }
    }

    fn emit_selection(&self, index: usize, selected: bool) -> Result<()> {
        let payload = serde_json::to_value(Selection { index, selected })?;
        self.inner.bus.emit(self.inner.keys.sel.clone(), payload)
    }

    /// Re-mark `expected` after a structural signal, unless a slot on that
    /// signal already moved the selection elsewhere.
    fn reselect(&self, expected: Option<usize>) -> Result<()> {
        let Some(index) = expected else {
            return Ok(());
        };
        if self.inner.selected.get() != Some(index) {
            debug!(
                collection = %self.inner.name,
                index,
                "selection moved during dispatch; reselect skipped"
            );
            return Ok(());
        }
        self.emit_selection(index, true)
    }

    // =========================================================================
    // MUTATION
    // =========================================================================

    /// Insert `item` before `before`, or append when `before` is `None` or
    /// past the end. Returns the index the item landed at.
    pub fn add(&self, item: T, before: Option<usize>) -> Result<usize> {
        let value = serde_json::to_value(&item)?;

        let (index, previous, shifted) = {
            let mut items = self.inner.items.borrow_mut();
            let index = match before {
                Some(i) if i <= items.len() => i,
                _ => items.len(),
            };
            items.insert(index, item);

            let previous = self.inner.selected.get();
            let shifted = previous.map(|s| if index <= s { s + 1 } else { s });
            self.inner.selected.set(shifted);
            (index, previous, shifted)
        };
        debug!(collection = %self.inner.name, index, "add");

        let payload = serde_json::to_value(IndexedItem { index, item: value })?;

        if let Some(old) = previous {
            self.emit_selection(old, false)?;
        }
        self.inner.bus.emit(self.inner.keys.add.clone(), payload)?;
        self.reselect(shifted)?;
        Ok(index)
    }

    /// Append every item in order, one add signal each.
    pub fn add_all(&self, items: impl IntoIterator<Item = T>) -> Result<()> {
        for item in items {
            self.add(item, None)?;
        }
        Ok(())
    }

    /// Overwrite the item at `index`.
    pub fn set(&self, index: usize, item: T) -> Result<()> {
        let payload = serde_json::to_value(IndexedItem { index, item: &item })?;
        {
            let mut items = self.inner.items.borrow_mut();
            let len = items.len();
            let slot = items.get_mut(index).ok_or(CircuitError::index(index, len))?;
            *slot = item;
        }
        debug!(collection = %self.inner.name, index, "set");
        self.inner.bus.emit(self.inner.keys.set.clone(), payload)
    }

    /// Remove and return the item at `index`.
    ///
    /// Deleting the selected item clears the selection (deselect first).
    /// Deleting an item in front of the selection shifts it down by one,
    /// wrapped in deselect/reselect signals like `add`.
    pub fn del(&self, index: usize) -> Result<T> {
        let (removed, previous, next) = {
            let mut items = self.inner.items.borrow_mut();
            if index >= items.len() {
                return Err(CircuitError::index(index, items.len()));
            }
            let removed = items.remove(index);

            let previous = self.inner.selected.get();
            let next = match previous {
                Some(s) if s == index => None,
                Some(s) if s > index => Some(s - 1),
                other => other,
            };
            self.inner.selected.set(next);
            (removed, previous, next)
        };
        debug!(collection = %self.inner.name, index, "del");

        let moved = previous != next;
        if moved {
            if let Some(old) = previous {
                self.emit_selection(old, false)?;
            }
        }
        self.inner
            .bus
            .emit(self.inner.keys.del.clone(), Value::from(index))?;
        if moved {
            self.reselect(next)?;
        }
        Ok(removed)
    }

    /// Delete everything, last item first.
    pub fn clear(&self) -> Result<()> {
        while let Some(last) = self.len().checked_sub(1) {
            self.del(last)?;
        }
        Ok(())
    }

    /// Change the selection. Selecting the current value does nothing.
    pub fn select(&self, index: Option<usize>) -> Result<()> {
        if let Some(i) = index {
            let len = self.len();
            if i >= len {
                return Err(CircuitError::index(i, len));
            }
        }

        let previous = self.inner.selected.replace(index);
        if previous == index {
            return Ok(());
        }
        debug!(collection = %self.inner.name, ?previous, ?index, "select");

        if let Some(old) = previous {
            self.emit_selection(old, false)?;
        }
        if let Some(new) = index {
            self.emit_selection(new, true)?;
        }
        Ok(())
    }

    // =========================================================================
    // SLOTS
    // =========================================================================

    /// A slot that selects the index carried by the payload.
    ///
    /// `null` or a negative number clears the selection. Wire an item-click
    /// signal straight to it.
    pub fn select_slot(&self) -> Slot {
        let weak: Weak<CollectionInner<T>> = Rc::downgrade(&self.inner);
        Rc::new(move |payload: &Value, _: &SignalKey| {
            let Some(inner) = weak.upgrade() else {
                return Ok(());
            };
            Collection { inner }.select(decode_index(payload)?)
        })
    }

    /// A slot that deletes the index carried by the payload.
    pub fn del_slot(&self) -> Slot {
        let weak: Weak<CollectionInner<T>> = Rc::downgrade(&self.inner);
        Rc::new(move |payload: &Value, signal: &SignalKey| {
            let Some(inner) = weak.upgrade() else {
                return Ok(());
            };
            let index = decode_index(payload)?
                .ok_or_else(|| CircuitError::slot(signal, "delete needs an index"))?;
            Collection { inner }.del(index).map(drop)
        })
    }
}

impl<T: Serialize + DeserializeOwned + 'static> Collection<T> {
    /// A slot that adds `{item, index?}`. A missing or negative index appends.
    pub fn add_slot(&self) -> Slot {
        let weak: Weak<CollectionInner<T>> = Rc::downgrade(&self.inner);
        Rc::new(move |payload: &Value, _: &SignalKey| {
            let Some(inner) = weak.upgrade() else {
                return Ok(());
            };
            let item: T = decode(&payload["item"])?;
            let before = payload.get("index").map(decode_index).transpose()?.flatten();
            Collection { inner }.add(item, before).map(drop)
        })
    }

    /// A slot that overwrites with `{item, index}`.
    pub fn set_slot(&self) -> Slot {
        let weak: Weak<CollectionInner<T>> = Rc::downgrade(&self.inner);
        Rc::new(move |payload: &Value, _: &SignalKey| {
            let Some(inner) = weak.upgrade() else {
                return Ok(());
            };
            let request: IndexedItem<T> = decode(payload)?;
            Collection { inner }.set(request.index, request.item)
        })
    }
}

impl<T: Serialize + 'static> BoundSource for Collection<T> {
    fn name(&self) -> &SignalKey {
        &self.inner.name
    }

    fn snapshot(&self) -> Result<Vec<Value>> {
        self.inner
            .items
            .borrow()
            .iter()
            .map(|item| serde_json::to_value(item).map_err(CircuitError::from))
            .collect()
    }

    fn selected_index(&self) -> Option<usize> {
        self.inner.selected.get()
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for Collection<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collection")
            .field("name", &self.inner.name)
            .field("items", &*self.inner.items.borrow())
            .field("selected", &self.inner.selected.get())
            .finish()
    }
}

// =============================================================================
// TESTS
// =============================================================================
