//! A stateful counter: a label plus a value span whose text follows the
//! `val` key of the state sent to `PathRouter::update`.

use std::cell::Cell;
use std::rc::Rc;

use cirkit::{Bus, Component, MemoryTree, PathRouter, Props, mount, slot};
use serde_json::json;

fn counter() -> Component {
    Component::container(
        Props::default().class("HBox"),
        [
            ("title", Component::leaf(Props::new("span").text("Count:"))),
            ("value", Component::leaf(Props::new("span").bind_text("val"))),
        ],
    )
}

#[test]
fn counter_text_follows_state_updates() {
    let bus = Bus::new();
    let tree = MemoryTree::new();
    let router = PathRouter::new(&bus, Rc::new(tree.clone()));
    let app = Component::container(
        Props::default(),
        [
            ("counter", counter()),
            ("bump", Component::leaf(Props::new("button").text("+1").signal("click"))),
        ],
    );
    mount(&router, "app", &app, tree.root()).unwrap();

    let count = Rc::new(Cell::new(0));
    bus.wire("app.counter.update", router.state_slot("app.counter"));
    bus.wire(
        "app.bump.click",
        slot!(bus, count => |_, _| {
            count.set(count.get() + 1);
            bus.emit("app.counter.update", json!({"val": count.get()}))
        }),
    );

    let counter_node = router.node("app.counter").unwrap();
    assert_eq!(
        tree.outer_html(counter_node),
        "<div class=\"HBox\"><span>Count:</span><span></span></div>"
    );

    let button = router.node("app.bump").unwrap();
    tree.dispatch_event(button, "click").unwrap();
    tree.dispatch_event(button, "click").unwrap();

    assert_eq!(
        tree.outer_html(counter_node),
        "<div class=\"HBox\"><span>Count:</span><span>2</span></div>"
    );
}

#[test]
fn two_counters_update_independently() {
    let bus = Bus::new();
    let tree = MemoryTree::new();
    let router = PathRouter::new(&bus, Rc::new(tree.clone()));
    let app = Component::container(Props::default(), [("left", counter()), ("right", counter())]);
    mount(&router, "app", &app, tree.root()).unwrap();

    router.update("app.left", &json!({"val": 1})).unwrap();
    router.update("app.right", &json!({"val": 5, "other": true})).unwrap();
    assert_eq!(router.update("app", &json!({})).unwrap(), 0);

    let text = |path: &str| tree.text(router.node(path).unwrap()).unwrap_or_default();
    assert_eq!(text("app.left.value"), "1");
    assert_eq!(text("app.right.value"), "5");

    // Updating the parent reaches both.
    assert_eq!(router.update("app", &json!({"val": 9})).unwrap(), 2);
    assert_eq!(text("app.left.value"), "9");
    assert_eq!(text("app.right.value"), "9");
}
