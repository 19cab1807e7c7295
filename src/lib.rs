// ============================================================================
// cirkit - Signal Wiring and Collection Binding for UI Trees
// ============================================================================
//
// A breadth-first signal bus, observable collections, and the binder and
// router that keep a render tree in step with them. Everything is
// single-threaded and driven synchronously from `Bus::emit`.
// ============================================================================

#[macro_use]
mod macros;

pub mod binding;
pub mod bus;
pub mod collections;
pub mod component;
pub mod core;
pub mod render;

// Re-export core items at crate root for ergonomic access
pub use crate::core::constants;
pub use crate::core::constants::{
    ADD_SUFFIX, DEFAULT_MAX_CASCADE, DEFAULT_TAG, DEL_SUFFIX, ITEM_PREFIX, ROOT_TAG,
    SEGMENT_SEPARATOR, SEL_SUFFIX, SET_SUFFIX,
};
pub use crate::core::{
    decode, decode_index, BusConfig, CircuitError, IndexedItem, Result, Selection, SignalKey,
};

pub use binding::{
    render_value, selector, set_attr, set_class, set_style, set_text, setter, toggle_class,
    Blueprint, BlueprintNode, CollectionBinder, ItemRefs, NodeIndex, RefTree, Selector, Setter,
    Template,
};
pub use bus::{slot, Bus, Slot, SwitchBoard, WireTarget};
pub use collections::{BoundSource, Collection, CollectionKeys};
pub use component::{mount, Component, PathRouter, Props};
pub use render::{EventHandler, MemoryTree, NodeRef, RenderError, RenderTarget};

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    // =========================================================================
    // Bus ordering
    // =========================================================================

    #[test]
    fn cascade_is_breadth_first() {
        let bus = Bus::new();
        let order = Rc::new(RefCell::new(Vec::new()));

        for key in ["A", "B", "C"] {
            let order = order.clone();
            bus.on(key, move |_, signal| {
                order.borrow_mut().push(signal.to_string());
                Ok(())
            });
        }
        // Two independent slots on A each emit B; B emits C.
        for _ in 0..2 {
            bus.on("A", cloned!(bus => move |_, _| bus.emit("B", Value::Null)));
        }
        bus.on("B", cloned!(bus => move |_, _| bus.emit("C", Value::Null)));

        bus.emit("A", Value::Null).unwrap();
        assert_eq!(*order.borrow(), vec!["A", "B", "B", "C", "C"]);
    }

    #[test]
    fn reentrant_self_emit_is_bounded() {
        let bus = Bus::new();
        let deliveries = Rc::new(Cell::new(0));
        bus.on(
            "X",
            cloned!(bus, deliveries => move |_, _| {
                deliveries.set(deliveries.get() + 1);
                if deliveries.get() < 3 {
                    bus.emit("X", Value::Null)?;
                }
                Ok(())
            }),
        );

        bus.emit("X", Value::Null).unwrap();
        assert_eq!(deliveries.get(), 3);
        assert!(!bus.is_dispatching());
    }

    // =========================================================================
    // Collection -> binder
    // =========================================================================

    #[test]
    fn todos_scenario() {
        let bus = Bus::new();
        let recorded = Rc::new(RefCell::new(Vec::new()));
        bus.wire(
            "todos.+",
            slot!(recorded => |payload, _| {
                recorded.borrow_mut().push(payload.clone());
                Ok(())
            }),
        );

        let tree = MemoryTree::new();
        let ul = tree.create_node("ul").unwrap();
        let list: Collection<Value> = Collection::new("todos", &bus);
        let binder = CollectionBinder::bind(
            &bus,
            Rc::new(tree.clone()),
            ul,
            Rc::new(Template::tag("li").field("text", set_text(""))),
            &list,
        )
        .unwrap();

        list.add(json!({"text": "x"}), None).unwrap();
        assert_eq!(*recorded.borrow(), vec![json!({"item": {"text": "x"}, "index": 0})]);
        let x = binder.refs(0).unwrap().root();

        list.add(json!({"text": "y"}), Some(0)).unwrap();
        assert_eq!(recorded.borrow()[1], json!({"item": {"text": "y"}, "index": 0}));
        assert_eq!(binder.position_of(x), Some(1));
        assert_eq!(tree.text(x).as_deref(), Some("x"));
    }

    #[test]
    fn reexports_reach_every_layer() {
        assert_eq!(constants::DEFAULT_TAG, "div");
        assert_eq!(BusConfig::default().max_cascade, DEFAULT_MAX_CASCADE);
        let key = SignalKey::new("app").child("colors").child(SEL_SUFFIX);
        assert_eq!(key, "app.colors.sel");
    }
}
