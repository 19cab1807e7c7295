//! Property tests for random add/del/select sequences.
//!
//! 1. The selection is always empty or in range.
//! 2. The selection follows its item across inserts and deletes; deleting
//!    the selected item clears it.
//! 3. A bound NodeIndex has the collection's length after every operation,
//!    and entry `i` renders item `i`.
//! 4. At most one rendered item carries the selected class, and it is the
//!    selected one, including when slots select, add or re-bind while the
//!    collection is still reporting.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use cirkit::{
    Bus, Collection, CollectionBinder, IndexedItem, MemoryTree, RenderTarget, Selection, Template,
    decode, decode_index, set_text, toggle_class,
};
use proptest::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

#[derive(Debug, Clone)]
enum Op {
    /// Insert before `pos % (len + 1)`, or append.
    Add(Option<usize>),
    /// Delete `pos % len`.
    Del(usize),
    /// Select `pos % len`, or clear.
    Select(Option<usize>),
    /// Select `pos % len` from a slot.
    SelectFromSlot(usize),
    /// Add while a slot on `items.+` selects whatever was just added.
    AddSelectingNew(Option<usize>),
    /// Select `pos % len` while a slot on `items.sel` inserts at the front.
    SelectAddingFront(usize),
    /// From a slot: append, then bind a fresh binder in a new container.
    RebindInDrain,
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => proptest::option::of(0usize..64).prop_map(Op::Add),
        2 => (0usize..64).prop_map(Op::Del),
        2 => proptest::option::of(0usize..64).prop_map(Op::Select),
        1 => (0usize..64).prop_map(Op::SelectFromSlot),
        1 => proptest::option::of(0usize..64).prop_map(Op::AddSelectingNew),
        1 => (0usize..64).prop_map(Op::SelectAddingFront),
        1 => Just(Op::RebindInDrain),
    ]
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Entry {
    text: String,
}

const SELECTED: &str = "sel";

fn template() -> Rc<Template> {
    Rc::new(
        Template::tag("li")
            .field("text", set_text(""))
            .selector(toggle_class(SELECTED)),
    )
}

fn bind(
    bus: &Bus,
    tree: &MemoryTree,
    list: &Collection<Entry>,
) -> cirkit::Result<Rc<CollectionBinder>> {
    let ul = tree.create_node("ul")?;
    CollectionBinder::bind(bus, Rc::new(tree.clone()), ul, template(), list)
}

/// Hands out `item-0`, `item-1`, ...
#[derive(Clone, Default)]
struct Ids(Rc<Cell<usize>>);

impl Ids {
    fn fresh(&self) -> Entry {
        let id = self.0.get();
        self.0.set(id + 1);
        Entry {
            text: format!("item-{id}"),
        }
    }
}

struct Harness {
    bus: Bus,
    tree: MemoryTree,
    list: Collection<Entry>,
    binder: Rc<RefCell<Rc<CollectionBinder>>>,
    ids: Ids,
    select_added: Rc<Cell<bool>>,
    add_on_select: Rc<Cell<bool>>,
}

impl Harness {
    fn new() -> Self {
        let bus = Bus::new();
        let tree = MemoryTree::new();
        let list: Collection<Entry> = Collection::new("items", &bus);
        let binder = Rc::new(RefCell::new(bind(&bus, &tree, &list).unwrap()));
        let ids = Ids::default();
        let select_added = Rc::new(Cell::new(false));
        let add_on_select = Rc::new(Cell::new(false));

        let (l, armed) = (list.clone(), select_added.clone());
        bus.on("items.+", move |payload, _| {
            if !armed.replace(false) {
                return Ok(());
            }
            let added: IndexedItem<Value> = decode(payload)?;
            l.select(Some(added.index))
        });

        let (l, armed, i) = (list.clone(), add_on_select.clone(), ids.clone());
        bus.on("items.sel", move |payload, _| {
            let selection: Selection = decode(payload)?;
            if selection.selected && armed.replace(false) {
                l.add(i.fresh(), Some(0))?;
            }
            Ok(())
        });

        let l = list.clone();
        bus.on("pick", move |payload, _| l.select(decode_index(payload)?));

        let (l, b, t, i) = (list.clone(), binder.clone(), tree.clone(), ids.clone());
        let slot_bus = bus.clone();
        bus.on("rebind", move |_, _| {
            l.add(i.fresh(), None)?;
            let fresh = bind(&slot_bus, &t, &l)?;
            *b.borrow_mut() = fresh;
            Ok(())
        });

        Self {
            bus,
            tree,
            list,
            binder,
            ids,
            select_added,
            add_on_select,
        }
    }

    fn binder(&self) -> Rc<CollectionBinder> {
        self.binder.borrow().clone()
    }

    /// Apply `op` and return the item the selection should now point at.
    fn apply(&mut self, op: &Op) -> Option<Entry> {
        let len = self.list.len();
        let selected = self.list.selected_item();
        let expected = match *op {
            Op::Add(pos) => {
                self.list
                    .add(self.ids.fresh(), pos.map(|p| p % (len + 1)))
                    .unwrap();
                selected
            }
            Op::Del(pos) if len > 0 => {
                let removed = self.list.del(pos % len).unwrap();
                selected.filter(|s| *s != removed)
            }
            Op::Del(_) => selected,
            Op::Select(Some(pos)) if len > 0 => {
                self.list.select(Some(pos % len)).unwrap();
                self.list.get(pos % len)
            }
            Op::Select(_) => {
                self.list.select(None).unwrap();
                None
            }
            Op::SelectFromSlot(pos) if len > 0 => {
                let target = self.list.get(pos % len);
                self.bus.emit("pick", json!(pos % len)).unwrap();
                target
            }
            Op::SelectFromSlot(_) => selected,
            Op::AddSelectingNew(pos) => {
                let entry = self.ids.fresh();
                self.select_added.set(true);
                self.list
                    .add(entry.clone(), pos.map(|p| p % (len + 1)))
                    .unwrap();
                Some(entry)
            }
            Op::SelectAddingFront(pos) if len > 0 => {
                let target = self.list.get(pos % len);
                self.add_on_select.set(true);
                self.list.select(Some(pos % len)).unwrap();
                target
            }
            Op::SelectAddingFront(_) => selected,
            Op::RebindInDrain => {
                self.bus.emit("rebind", Value::Null).unwrap();
                selected
            }
        };
        // Selecting the current index emits nothing, so the slot may not
        // have fired.
        self.select_added.set(false);
        self.add_on_select.set(false);
        expected
    }

    fn rendered(&self) -> Vec<String> {
        self.binder().with_index(|index| {
            index
                .iter()
                .map(|refs| self.tree.text(refs.root()).unwrap_or_default())
                .collect()
        })
    }

    /// Positions of rendered items carrying the selected class.
    fn marked(&self) -> Vec<usize> {
        self.binder().with_index(|index| {
            index
                .iter()
                .enumerate()
                .filter(|(_, refs)| self.tree.has_class(refs.root(), SELECTED))
                .map(|(i, _)| i)
                .collect()
        })
    }
}

proptest! {
    #[test]
    fn selection_stays_in_range_and_follows_item(ops in proptest::collection::vec(op_strategy(), 0..40)) {
        let mut h = Harness::new();
        for op in &ops {
            let expected = h.apply(op);
            if let Some(index) = h.list.selected_index() {
                prop_assert!(index < h.list.len());
            }
            prop_assert_eq!(h.list.selected_item(), expected);
        }
    }

    #[test]
    fn node_index_tracks_collection(ops in proptest::collection::vec(op_strategy(), 0..40)) {
        let mut h = Harness::new();
        for op in &ops {
            h.apply(op);
            prop_assert_eq!(h.binder().len(), h.list.len());
            let texts: Vec<String> = h.list.items().into_iter().map(|e| e.text).collect();
            prop_assert_eq!(h.rendered(), texts);
        }
    }

    #[test]
    fn one_rendered_item_is_marked_selected(ops in proptest::collection::vec(op_strategy(), 0..40)) {
        let mut h = Harness::new();
        for op in &ops {
            h.apply(op);
            let marked = h.marked();
            prop_assert!(marked.len() <= 1, "marked {:?} after {:?}", marked, op);
            prop_assert_eq!(marked.first().copied(), h.list.selected_index());
        }
    }
}
