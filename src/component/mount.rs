// ============================================================================
// cirkit - Mount
// Depth-first materialization of a component tree
// ============================================================================

use std::rc::Rc;

use tracing::debug;

use super::{Component, PathRouter};
use crate::binding::CollectionBinder;
use crate::core::error::Result;
use crate::render::NodeRef;

/// Build `component` under `parent` and register it as `name`.
///
/// Children are mounted in declaration order at `name.child`. Collections
/// are bound to their source, and every component's declared signals are
/// attached once its subtree exists. Returns the component's root node.
///
/// # Example
///
/// ```
/// use cirkit::{mount, Bus, Component, MemoryTree, PathRouter, Props};
/// use std::rc::Rc;
///
/// let bus = Bus::new();
/// let tree = MemoryTree::new();
/// let router = PathRouter::new(&bus, Rc::new(tree.clone()));
///
/// let app = Component::container(
///     Props::default().class("VBox"),
///     [("title", Component::leaf(Props::new("h1").text("Todos")))],
/// );
/// let root = mount(&router, "app", &app, tree.root()).unwrap();
///
/// assert_eq!(router.node("app").unwrap(), root);
/// assert_eq!(tree.outer_html(root), "<div class=\"VBox\"><h1>Todos</h1></div>");
/// ```
pub fn mount(
    router: &Rc<PathRouter>,
    name: &str,
    component: &Component,
    parent: NodeRef,
) -> Result<NodeRef> {
    let target = router.target().clone();
    let props = component.props();

    let node = target.create_node(&props.tag)?;
    props.apply(&*target, node)?;
    target.append_child(parent, node)?;
    router.register(name, node);
    if let Some(key) = &props.state {
        router.bind_state(name, key);
    }

    match component {
        Component::Leaf(_) => {}
        Component::Container { children, .. } => {
            for (child_name, child) in children {
                mount(router, &format!("{name}.{child_name}"), child, node)?;
            }
        }
        Component::Collection {
            template, source, ..
        } => {
            let binder =
                CollectionBinder::bind(router.bus(), target, node, template.clone(), &**source)?;
            router.register_collection(name, binder);
        }
    }

    router.attach(name, props.signals.as_slice())?;
    debug!(path = name, node = %node, "mounted");
    Ok(node)
}
