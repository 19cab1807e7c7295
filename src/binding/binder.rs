// ============================================================================
// cirkit - CollectionBinder
// Keeps a container's children in step with a collection's signal stream
// ============================================================================
//
// The binder owns the NodeIndex for one container. Structural signals
// (`+`, `-`) build or detach item nodes and shift the index; `*` and `sel`
// only re-run setters or the selector on an existing entry.
//
// No RefCell borrow of the index is held while the render target or a
// setter runs: both may call back into the bus.
// ============================================================================

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use serde_json::Value;
use tracing::{debug, trace};

use super::node_index::{ItemRefs, NodeIndex};
use super::template::Template;
use crate::bus::Bus;
use crate::collections::{BoundSource, CollectionKeys};
use crate::core::constants::DEL_SUFFIX;
use crate::core::error::{CircuitError, Result};
use crate::core::types::{decode, decode_index, IndexedItem, Selection, SignalKey};
use crate::render::{NodeRef, RenderTarget};

/// Renders a collection into a container node and follows its changes.
///
/// The bus only holds the binder weakly. Keep the returned `Rc` alive (a
/// [`PathRouter`](crate::PathRouter) does this for mounted collections); once
/// it is dropped the wired slots do nothing.
///
/// # Example
///
/// ```
/// use cirkit::{set_text, Bus, Collection, CollectionBinder, MemoryTree, RenderTarget, Template};
/// use serde_json::json;
/// use std::rc::Rc;
///
/// let bus = Bus::new();
/// let tree = MemoryTree::new();
/// let list = tree.create_node("ul").unwrap();
/// let todos: Collection<serde_json::Value> = Collection::new("todos", &bus);
///
/// let template = Rc::new(Template::tag("li").field("text", set_text("")));
/// let _binder =
///     CollectionBinder::bind(&bus, Rc::new(tree.clone()), list, template, &todos).unwrap();
///
/// todos.add(json!({"text": "milk"}), None).unwrap();
/// todos.add(json!({"text": "eggs"}), Some(0)).unwrap();
/// assert_eq!(tree.outer_html(list), "<ul><li>eggs</li><li>milk</li></ul>");
/// ```
pub struct CollectionBinder {
    bus: Bus,
    /// Bus sequence at bind time; entries numbered below it are already in
    /// the rendered snapshot
    bound_at: u64,
    name: SignalKey,
    container: NodeRef,
    template: Rc<Template>,
    target: Rc<dyn RenderTarget>,
    index: RefCell<NodeIndex>,
}

impl CollectionBinder {
    /// Render `source` into `container` and subscribe to its signals.
    ///
    /// Items already in the collection are rendered in order and the current
    /// selection, if any, goes through the selector.
    ///
    /// Binding from inside a slot is fine. The snapshot already holds every
    /// change whose signal is still queued, so those queued signals are
    /// skipped and only later ones are applied.
    pub fn bind(
        bus: &Bus,
        target: Rc<dyn RenderTarget>,
        container: NodeRef,
        template: Rc<Template>,
        source: &dyn BoundSource,
    ) -> Result<Rc<Self>> {
        let binder = Rc::new(Self {
            bus: bus.clone(),
            bound_at: bus.sequence(),
            name: source.name().clone(),
            container,
            template,
            target,
            index: RefCell::new(NodeIndex::new()),
        });

        for (index, item) in source.snapshot()?.iter().enumerate() {
            binder.insert_item(index, item)?;
        }
        if let Some(selected) = source.selected_index() {
            binder.apply_selection(selected, true)?;
        }

        let keys = CollectionKeys::new(source.name());
        binder.subscribe(bus, keys.add, |binder, payload| {
            let added: IndexedItem<Value> = decode(payload)?;
            binder.insert_item(added.index, &added.item)
        });
        binder.subscribe(bus, keys.del, |binder, payload| {
            let index = decode_index(payload)?.ok_or_else(|| {
                CircuitError::slot(binder.name.child(DEL_SUFFIX), "missing index")
            })?;
            binder.remove_item(index)
        });
        binder.subscribe(bus, keys.set, |binder, payload| {
            let changed: IndexedItem<Value> = decode(payload)?;
            binder.overwrite_item(changed.index, &changed.item)
        });
        binder.subscribe(bus, keys.sel, |binder, payload| {
            let selection: Selection = decode(payload)?;
            binder.apply_selection(selection.index, selection.selected)
        });

        debug!(collection = %binder.name, container = %container, items = binder.len(), "bound");
        Ok(binder)
    }

    fn subscribe(
        self: &Rc<Self>,
        bus: &Bus,
        key: SignalKey,
        handler: fn(&Self, &Value) -> Result<()>,
    ) {
        let weak: Weak<Self> = Rc::downgrade(self);
        bus.on(key, move |payload, signal| match weak.upgrade() {
            Some(binder) if binder.in_snapshot() => {
                trace!(collection = %binder.name, signal = %signal, "queued before bind; skipped");
                Ok(())
            }
            Some(binder) => handler(&binder, payload),
            None => Ok(()),
        });
    }

    /// True while delivering an entry that was queued before this binder
    /// took its snapshot.
    fn in_snapshot(&self) -> bool {
        self.bus
            .current_sequence()
            .is_some_and(|seq| seq < self.bound_at)
    }

    // =========================================================================
    // SIGNAL HANDLERS
    // =========================================================================

    fn insert_item(&self, index: usize, item: &Value) -> Result<()> {
        let anchor = self.index.borrow().anchor_for(index)?;
        let refs = self.template.build(&*self.target)?;
        self.target.insert_before(self.container, refs.root(), anchor)?;
        self.index.borrow_mut().insert(index, refs.clone())?;
        debug!(collection = %self.name, index, node = %refs.root(), "item inserted");
        self.apply_fields(&refs, item, index)
    }

    fn remove_item(&self, index: usize) -> Result<()> {
        let refs = self.index.borrow_mut().remove(index)?;
        self.target.remove_child(self.container, refs.root())?;
        debug!(collection = %self.name, index, node = %refs.root(), "item removed");
        Ok(())
    }

    fn overwrite_item(&self, index: usize, item: &Value) -> Result<()> {
        let refs = self.refs(index)?;
        self.apply_fields(&refs, item, index)
    }

    fn apply_fields(&self, refs: &ItemRefs, item: &Value, index: usize) -> Result<()> {
        let Value::Object(fields) = item else {
            trace!(collection = %self.name, index, "item is not an object; no fields to set");
            return Ok(());
        };
        for (field, value) in fields {
            match self.template.setter(field) {
                Some(setter) => setter(&*self.target, refs, value, index)?,
                None => trace!(collection = %self.name, field = %field, "no setter; skipped"),
            }
        }
        Ok(())
    }

    fn apply_selection(&self, index: usize, selected: bool) -> Result<()> {
        let refs = self.refs(index)?;
        match self.template.selector_fn() {
            Some(selector) => selector(&*self.target, &refs, selected),
            None => Ok(()),
        }
    }

    // =========================================================================
    // ACCESSORS
    // =========================================================================

    /// The collection name this binder follows.
    pub fn name(&self) -> &SignalKey {
        &self.name
    }

    pub fn container(&self) -> NodeRef {
        self.container
    }

    pub fn template(&self) -> &Template {
        &self.template
    }

    pub fn len(&self) -> usize {
        self.index.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.borrow().is_empty()
    }

    /// Read the node index. Do not emit from inside `f`.
    pub fn with_index<R>(&self, f: impl FnOnce(&NodeIndex) -> R) -> R {
        f(&self.index.borrow())
    }

    /// The nodes rendering item `index`.
    pub fn refs(&self, index: usize) -> Result<ItemRefs> {
        self.index.borrow().get(index).cloned()
    }

    /// Position of the item whose top-level node is `node`.
    pub fn position_of(&self, node: NodeRef) -> Option<usize> {
        self.index.borrow().position_of_root(node)
    }
}

impl fmt::Debug for CollectionBinder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CollectionBinder")
            .field("name", &self.name)
            .field("container", &self.container)
            .field("len", &self.len())
            .finish()
    }
}

// =============================================================================
// TESTS
// =============================================================================
