// ============================================================================
// cirkit - PathRouter
// Mounted paths, declared signals and item-event delegation
// ============================================================================
//
// Every mounted component is addressed by its dotted path (`app.colors`).
// Declared signals turn render-target events into bus emits under
// `path.name`. Names starting with `item.` are delegated: one listener on
// the collection container resolves which item the event came from.
//
// Nodes mounted with a state key take their text from `update(path, state)`,
// which covers the component at `path` and everything mounted below it.
// ============================================================================

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};

use serde_json::Value;
use tracing::{debug, trace};

use crate::binding::{render_value, CollectionBinder};
use crate::bus::{Bus, Slot};
use crate::core::constants::{ITEM_PREFIX, SEGMENT_SEPARATOR};
use crate::core::error::{CircuitError, Result};
use crate::core::types::SignalKey;
use crate::render::{EventHandler, NodeRef, RenderTarget};

struct Mounted {
    node: NodeRef,
    signals: Vec<String>,
    binder: Option<Rc<CollectionBinder>>,
    state: Option<String>,
}

/// Routes render events to bus signals by component path.
pub struct PathRouter {
    bus: Bus,
    target: Rc<dyn RenderTarget>,
    mounted: RefCell<HashMap<String, Mounted>>,
    /// Container node -> binder, for delegation lookups.
    markers: RefCell<HashMap<NodeRef, Rc<CollectionBinder>>>,
}

impl PathRouter {
    pub fn new(bus: &Bus, target: Rc<dyn RenderTarget>) -> Rc<Self> {
        Rc::new(Self {
            bus: bus.clone(),
            target,
            mounted: RefCell::new(HashMap::new()),
            markers: RefCell::new(HashMap::new()),
        })
    }

    pub fn bus(&self) -> &Bus {
        &self.bus
    }

    pub fn target(&self) -> &Rc<dyn RenderTarget> {
        &self.target
    }

    // =========================================================================
    // REGISTRATION
    // =========================================================================

    /// Record `node` under `path`. Re-registering a path replaces it.
    pub fn register(&self, path: &str, node: NodeRef) {
        debug!(path, node = %node, "register");
        self.mounted.borrow_mut().insert(
            path.to_string(),
            Mounted {
                node,
                signals: Vec::new(),
                binder: None,
                state: None,
            },
        );
    }

    /// Record a bound collection. Its container becomes a delegation marker.
    pub fn register_collection(&self, path: &str, binder: Rc<CollectionBinder>) {
        let container = binder.container();
        debug!(path, container = %container, collection = %binder.name(), "register collection");
        self.markers.borrow_mut().insert(container, binder.clone());
        let mut mounted = self.mounted.borrow_mut();
        mounted
            .entry(path.to_string())
            .or_insert_with(|| Mounted {
                node: container,
                signals: Vec::new(),
                binder: None,
                state: None,
            })
            .binder = Some(binder);
    }

    /// Bind the text of the node at `path` to `key` in later state updates.
    pub fn bind_state(&self, path: &str, key: &str) {
        match self.mounted.borrow_mut().get_mut(path) {
            Some(mounted) => {
                debug!(path, key, "bind state");
                mounted.state = Some(key.to_string());
            }
            None => debug!(path, key, "bind state on unmounted path; ignored"),
        }
    }

    /// Install one listener per declared signal on the node at `path`.
    ///
    /// A plain name `click` emits `path.click` with the origin node id. An
    /// item name `item.click` listens for `click` and emits `path.item.click`
    /// with the index of the item the event came from.
    pub fn attach<S: AsRef<str>>(self: &Rc<Self>, path: &str, signals: &[S]) -> Result<()> {
        let node = self.node(path)?;
        let base = SignalKey::new(path);

        for name in signals {
            let name = name.as_ref();
            let key = base.child(name);
            let (event, handler) = match name.strip_prefix(ITEM_PREFIX) {
                Some(event) => (event, self.item_listener(node, key)),
                None => (name, self.plain_listener(key)),
            };
            self.target.add_event_listener(node, event, handler)?;

            if let Some(mounted) = self.mounted.borrow_mut().get_mut(path) {
                mounted.signals.push(name.to_string());
            }
            debug!(path, signal = name, event, "attach");
        }
        Ok(())
    }

    fn plain_listener(self: &Rc<Self>, key: SignalKey) -> EventHandler {
        let weak: Weak<Self> = Rc::downgrade(self);
        Rc::new(move |origin: NodeRef| {
            let Some(router) = weak.upgrade() else {
                return Ok(());
            };
            router.bus.emit(key.clone(), Value::from(origin.raw()))
        })
    }

    fn item_listener(self: &Rc<Self>, container: NodeRef, key: SignalKey) -> EventHandler {
        let weak: Weak<Self> = Rc::downgrade(self);
        Rc::new(move |origin: NodeRef| {
            let Some(router) = weak.upgrade() else {
                return Ok(());
            };
            if origin == container {
                trace!(signal = %key, "event on the container itself; ignored");
                return Ok(());
            }
            match router.resolve_item_index_within(container, origin) {
                Ok(index) => router.bus.emit(key.clone(), Value::from(index)),
                Err(CircuitError::MissingCollectionMarker { node }) => {
                    debug!(signal = %key, node = %node, "no enclosing collection; ignored");
                    Ok(())
                }
                Err(err) => Err(err),
            }
        })
    }

    // =========================================================================
    // STATE
    // =========================================================================

    /// Rewrite the text of every state-bound node at or below `path` whose
    /// key is present in `state`. Returns how many nodes were written.
    ///
    /// Keys missing from `state` leave their nodes alone. A `state` that is
    /// not an object writes nothing.
    pub fn update(&self, path: &str, state: &Value) -> Result<usize> {
        let bound = self.state_bindings(path)?;
        let Value::Object(state) = state else {
            trace!(path, "state is not an object; nothing to update");
            return Ok(0);
        };

        let mut written = 0;
        for (node, key) in bound {
            if let Some(value) = state.get(&key) {
                self.target.set_text_content(node, &render_value(value))?;
                written += 1;
            }
        }
        trace!(path, written, "state update");
        Ok(written)
    }

    /// A slot that calls [`update`](Self::update) for `path` with the
    /// payload as the state.
    pub fn state_slot(self: &Rc<Self>, path: &str) -> Slot {
        let weak: Weak<Self> = Rc::downgrade(self);
        let path = path.to_string();
        Rc::new(move |payload: &Value, _: &SignalKey| match weak.upgrade() {
            Some(router) => router.update(&path, payload).map(drop),
            None => Ok(()),
        })
    }

    /// State-bound nodes of `path` and its descendants.
    fn state_bindings(&self, path: &str) -> Result<Vec<(NodeRef, String)>> {
        let mounted = self.mounted.borrow();
        if !mounted.contains_key(path) {
            return Err(CircuitError::unresolved(path));
        }
        let prefix = format!("{path}{SEGMENT_SEPARATOR}");
        Ok(mounted
            .iter()
            .filter(|(p, _)| p.as_str() == path || p.starts_with(&prefix))
            .filter_map(|(_, m)| Some((m.node, m.state.clone()?)))
            .collect())
    }

    // =========================================================================
    // LOOKUP
    // =========================================================================

    pub fn node(&self, path: &str) -> Result<NodeRef> {
        self.mounted
            .borrow()
            .get(path)
            .map(|m| m.node)
            .ok_or_else(|| CircuitError::unresolved(path))
    }

    /// The full key of a declared signal.
    pub fn signal(&self, path: &str, name: &str) -> Result<SignalKey> {
        let mounted = self.mounted.borrow();
        let entry = mounted
            .get(path)
            .ok_or_else(|| CircuitError::unresolved(path))?;
        if !entry.signals.iter().any(|s| s == name) {
            return Err(CircuitError::UndeclaredSignal {
                path: path.to_string(),
                signal: name.to_string(),
            });
        }
        Ok(SignalKey::new(path).child(name))
    }

    /// Declared signal names, in declaration order.
    pub fn signals(&self, path: &str) -> Result<Vec<String>> {
        self.mounted
            .borrow()
            .get(path)
            .map(|m| m.signals.clone())
            .ok_or_else(|| CircuitError::unresolved(path))
    }

    pub fn binder(&self, path: &str) -> Result<Rc<CollectionBinder>> {
        self.mounted
            .borrow()
            .get(path)
            .and_then(|m| m.binder.clone())
            .ok_or_else(|| CircuitError::unresolved(path))
    }

    /// Mounted paths, sorted.
    pub fn paths(&self) -> Vec<String> {
        let mut paths: Vec<String> = self.mounted.borrow().keys().cloned().collect();
        paths.sort();
        paths
    }

    /// Index of the collection item enclosing `origin`.
    ///
    /// Walks up from `origin` until a parent is a bound container and the
    /// node below it is one of that binder's item roots.
    pub fn resolve_item_index(&self, origin: NodeRef) -> Result<usize> {
        let mut child = origin;
        while let Some(parent) = self.target.parent_of(child) {
            let binder = self.markers.borrow().get(&parent).cloned();
            if let Some(position) = binder.and_then(|b| b.position_of(child)) {
                return Ok(position);
            }
            child = parent;
        }
        Err(CircuitError::MissingCollectionMarker { node: origin })
    }

    /// Index of the item of `container`'s own collection that encloses
    /// `origin`.
    ///
    /// Collections nested deeper inside `container` are passed over. Fails
    /// with `MissingCollectionMarker` if `container` is not a bound
    /// collection or `origin` is not below one of its items.
    pub fn resolve_item_index_within(&self, container: NodeRef, origin: NodeRef) -> Result<usize> {
        let missing = CircuitError::MissingCollectionMarker { node: origin };
        let Some(binder) = self.markers.borrow().get(&container).cloned() else {
            return Err(missing);
        };
        let mut child = origin;
        while let Some(parent) = self.target.parent_of(child) {
            if parent == container {
                return binder.position_of(child).ok_or(missing);
            }
            child = parent;
        }
        Err(missing)
    }
}

impl std::fmt::Debug for PathRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PathRouter")
            .field("paths", &self.paths())
            .field("collections", &self.markers.borrow().len())
            .finish()
    }
}
