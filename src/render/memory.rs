// ============================================================================
// cirkit - MemoryTree
// A headless render target that keeps nodes in an arena
// ============================================================================

use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write as _;
use std::rc::Rc;

use super::{EventHandler, NodeRef, RenderError, RenderTarget};
use crate::core::constants::ROOT_TAG;
use crate::core::error::Result;

type RenderResult = std::result::Result<(), RenderError>;

// =============================================================================
// ARENA
// =============================================================================

struct NodeData {
    tag: String,
    parent: Option<NodeRef>,
    children: Vec<NodeRef>,
    attributes: BTreeMap<String, String>,
    styles: BTreeMap<String, String>,
    classes: BTreeSet<String>,
    text: Option<String>,
    listeners: Vec<(String, EventHandler)>,
}

impl NodeData {
    fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_string(),
            parent: None,
            children: Vec::new(),
            attributes: BTreeMap::new(),
            styles: BTreeMap::new(),
            classes: BTreeSet::new(),
            text: None,
            listeners: Vec::new(),
        }
    }
}

struct Arena {
    nodes: Vec<NodeData>,
    /// Nodes are addressed by `u32`; creation fails once this many exist
    limit: u32,
}

impl Arena {
    fn node(&self, node: NodeRef) -> std::result::Result<&NodeData, RenderError> {
        self.nodes
            .get(node.raw() as usize)
            .ok_or(RenderError::UnknownNode(node))
    }

    fn node_mut(&mut self, node: NodeRef) -> std::result::Result<&mut NodeData, RenderError> {
        self.nodes
            .get_mut(node.raw() as usize)
            .ok_or(RenderError::UnknownNode(node))
    }

    /// True if `ancestor` is `node` or lies on its parent chain.
    fn is_ancestor(&self, ancestor: NodeRef, node: NodeRef) -> bool {
        let mut current = Some(node);
        while let Some(n) = current {
            if n == ancestor {
                return true;
            }
            current = self.nodes.get(n.raw() as usize).and_then(|d| d.parent);
        }
        false
    }

    fn detach(&mut self, child: NodeRef) -> RenderResult {
        if let Some(parent) = self.node(child)?.parent {
            self.node_mut(parent)?.children.retain(|c| *c != child);
            self.node_mut(child)?.parent = None;
        }
        Ok(())
    }

    fn attach(&mut self, parent: NodeRef, child: NodeRef, anchor: Option<NodeRef>) -> RenderResult {
        self.node(parent)?;
        self.node(child)?;
        if self.is_ancestor(child, parent) {
            return Err(RenderError::Cycle { parent, child });
        }
        if let Some(anchor) = anchor {
            if self.node(anchor)?.parent != Some(parent) {
                return Err(RenderError::NotAChild {
                    parent,
                    child: anchor,
                });
            }
        }

        self.detach(child)?;
        let children = &mut self.node_mut(parent)?.children;
        let position = anchor
            .and_then(|a| children.iter().position(|c| *c == a))
            .unwrap_or(children.len());
        children.insert(position, child);
        self.node_mut(child)?.parent = Some(parent);
        Ok(())
    }
}

// =============================================================================
// MEMORY TREE
// =============================================================================

/// An in-memory render target.
///
/// Node 0 is a `body` root created with the tree. Events bubble from the
/// origin node up through its ancestors, the way DOM events do.
///
/// Nodes are never freed. A removed node is only detached and keeps its
/// arena slot (and its `NodeRef`) for the life of the tree, so a long-running
/// tree that churns items grows until it reaches its node limit.
///
/// # Example
///
/// ```
/// use cirkit::{MemoryTree, RenderTarget};
///
/// let tree = MemoryTree::new();
/// let list = tree.create_node("ul").unwrap();
/// let item = tree.create_node("li").unwrap();
/// tree.append_child(tree.root(), list).unwrap();
/// tree.append_child(list, item).unwrap();
/// tree.set_text_content(item, "milk").unwrap();
///
/// assert_eq!(tree.outer_html(list), "<ul><li>milk</li></ul>");
/// ```
#[derive(Clone)]
pub struct MemoryTree {
    arena: Rc<RefCell<Arena>>,
}

impl MemoryTree {
    pub fn new() -> Self {
        Self::with_node_limit(u32::MAX)
    }

    /// A tree that refuses to create more than `limit` nodes, the root
    /// included.
    pub fn with_node_limit(limit: u32) -> Self {
        let arena = Arena {
            nodes: vec![NodeData::new(ROOT_TAG)],
            limit: limit.max(1),
        };
        Self {
            arena: Rc::new(RefCell::new(arena)),
        }
    }

    pub fn root(&self) -> NodeRef {
        NodeRef::from_raw(0)
    }

    /// Number of nodes ever created, detached ones included.
    pub fn node_count(&self) -> usize {
        self.arena.borrow().nodes.len()
    }

    // =========================================================================
    // INSPECTION
    // =========================================================================

    pub fn tag(&self, node: NodeRef) -> Option<String> {
        self.arena.borrow().node(node).ok().map(|n| n.tag.clone())
    }

    pub fn children(&self, node: NodeRef) -> Vec<NodeRef> {
        self.arena
            .borrow()
            .node(node)
            .map(|n| n.children.clone())
            .unwrap_or_default()
    }

    pub fn text(&self, node: NodeRef) -> Option<String> {
        self.arena.borrow().node(node).ok()?.text.clone()
    }

    pub fn attribute(&self, node: NodeRef, name: &str) -> Option<String> {
        self.arena.borrow().node(node).ok()?.attributes.get(name).cloned()
    }

    pub fn style(&self, node: NodeRef, name: &str) -> Option<String> {
        self.arena.borrow().node(node).ok()?.styles.get(name).cloned()
    }

    pub fn has_class(&self, node: NodeRef, class: &str) -> bool {
        self.arena
            .borrow()
            .node(node)
            .map(|n| n.classes.contains(class))
            .unwrap_or(false)
    }

    pub fn listener_count(&self, node: NodeRef) -> usize {
        self.arena
            .borrow()
            .node(node)
            .map(|n| n.listeners.len())
            .unwrap_or(0)
    }

    /// Serialize a subtree as HTML-ish markup, for assertions and debugging.
    pub fn outer_html(&self, node: NodeRef) -> String {
        let arena = self.arena.borrow();
        let mut out = String::new();
        write_html(&arena, node, &mut out);
        out
    }

    // =========================================================================
    // EVENTS
    // =========================================================================

    /// Fire `event` at `origin` and bubble it up to the root.
    ///
    /// Every matching listener on the way up is called with `origin`. The
    /// first listener error stops the bubbling and is returned.
    pub fn dispatch_event(&self, origin: NodeRef, event: &str) -> Result<()> {
        // Collect first: listeners are free to mutate the tree.
        let handlers: Vec<EventHandler> = {
            let arena = self.arena.borrow();
            arena.node(origin)?;
            let mut handlers = Vec::new();
            let mut current = Some(origin);
            while let Some(node) = current {
                let data = arena.node(node)?;
                handlers.extend(
                    data.listeners
                        .iter()
                        .filter(|(name, _)| name == event)
                        .map(|(_, handler)| handler.clone()),
                );
                current = data.parent;
            }
            handlers
        };

        for handler in handlers {
            handler(origin)?;
        }
        Ok(())
    }
}

impl Default for MemoryTree {
    fn default() -> Self {
        Self::new()
    }
}

fn write_html(arena: &Arena, node: NodeRef, out: &mut String) {
    let Ok(data) = arena.node(node) else {
        return;
    };
    let _ = write!(out, "<{}", data.tag);
    if !data.classes.is_empty() {
        let classes: Vec<&str> = data.classes.iter().map(String::as_str).collect();
        let _ = write!(out, " class=\"{}\"", classes.join(" "));
    }
    for (name, value) in &data.attributes {
        let _ = write!(out, " {name}=\"{value}\"");
    }
    if !data.styles.is_empty() {
        let styles: Vec<String> = data.styles.iter().map(|(k, v)| format!("{k}: {v}")).collect();
        let _ = write!(out, " style=\"{}\"", styles.join("; "));
    }
    out.push('>');
    if let Some(text) = &data.text {
        out.push_str(text);
    }
    for child in &data.children {
        write_html(arena, *child, out);
    }
    let _ = write!(out, "</{}>", data.tag);
}

impl RenderTarget for MemoryTree {
    fn create_node(&self, tag: &str) -> std::result::Result<NodeRef, RenderError> {
        let mut arena = self.arena.borrow_mut();
        let limit = arena.limit;
        let raw = u32::try_from(arena.nodes.len())
            .ok()
            .filter(|raw| *raw < limit)
            .ok_or(RenderError::NodeLimit { limit })?;
        arena.nodes.push(NodeData::new(tag));
        Ok(NodeRef::from_raw(raw))
    }

    fn append_child(&self, parent: NodeRef, child: NodeRef) -> RenderResult {
        self.arena.borrow_mut().attach(parent, child, None)
    }

    fn insert_before(&self, parent: NodeRef, child: NodeRef, anchor: Option<NodeRef>) -> RenderResult {
        self.arena.borrow_mut().attach(parent, child, anchor)
    }

    fn remove_child(&self, parent: NodeRef, child: NodeRef) -> RenderResult {
        let mut arena = self.arena.borrow_mut();
        if arena.node(child)?.parent != Some(parent) {
            arena.node(parent)?;
            return Err(RenderError::NotAChild { parent, child });
        }
        arena.detach(child)
    }

    fn parent_of(&self, node: NodeRef) -> Option<NodeRef> {
        self.arena.borrow().node(node).ok()?.parent
    }

    fn set_attribute(&self, node: NodeRef, name: &str, value: &str) -> RenderResult {
        self.arena
            .borrow_mut()
            .node_mut(node)?
            .attributes
            .insert(name.to_string(), value.to_string());
        Ok(())
    }

    fn add_event_listener(&self, node: NodeRef, event: &str, handler: EventHandler) -> RenderResult {
        self.arena
            .borrow_mut()
            .node_mut(node)?
            .listeners
            .push((event.to_string(), handler));
        Ok(())
    }

    fn set_style_property(&self, node: NodeRef, name: &str, value: &str) -> RenderResult {
        self.arena
            .borrow_mut()
            .node_mut(node)?
            .styles
            .insert(name.to_string(), value.to_string());
        Ok(())
    }

    fn set_text_content(&self, node: NodeRef, text: &str) -> RenderResult {
        self.arena.borrow_mut().node_mut(node)?.text = Some(text.to_string());
        Ok(())
    }

    fn set_class_presence(&self, node: NodeRef, class: &str, present: bool) -> RenderResult {
        let mut arena = self.arena.borrow_mut();
        let classes = &mut arena.node_mut(node)?.classes;
        if present {
            classes.insert(class.to_string());
        } else {
            classes.remove(class);
        }
        Ok(())
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    fn list_with(tree: &MemoryTree, n: usize) -> (NodeRef, Vec<NodeRef>) {
        let list = tree.create_node("ul").unwrap();
        tree.append_child(tree.root(), list).unwrap();
        let items = (0..n)
            .map(|_| {
                let li = tree.create_node("li").unwrap();
                tree.append_child(list, li).unwrap();
                li
            })
            .collect();
        (list, items)
    }

    #[test]
    fn fresh_tree_has_root() {
        let tree = MemoryTree::new();
        assert_eq!(tree.tag(tree.root()).as_deref(), Some("body"));
        assert_eq!(tree.node_count(), 1);
        assert_eq!(tree.parent_of(tree.root()), None);
    }

    #[test]
    fn node_limit_is_reported_not_wrapped() {
        let tree = MemoryTree::with_node_limit(3);
        let (list, items) = list_with(&tree, 1);
        assert_eq!(tree.node_count(), 3);

        let err = tree.create_node("li").unwrap_err();
        assert_eq!(err, RenderError::NodeLimit { limit: 3 });
        // Detaching does not give a slot back.
        tree.remove_child(list, items[0]).unwrap();
        assert!(tree.create_node("li").is_err());
        assert_eq!(tree.tag(items[0]).as_deref(), Some("li"));
    }

    #[test]
    fn insert_before_anchor() {
        let tree = MemoryTree::new();
        let (list, items) = list_with(&tree, 2);
        let new = tree.create_node("li").unwrap();
        tree.insert_before(list, new, Some(items[1])).unwrap();
        assert_eq!(tree.children(list), vec![items[0], new, items[1]]);

        let tail = tree.create_node("li").unwrap();
        tree.insert_before(list, tail, None).unwrap();
        assert_eq!(tree.children(list).last(), Some(&tail));
    }

    #[test]
    fn insert_before_foreign_anchor_fails() {
        let tree = MemoryTree::new();
        let (list, _) = list_with(&tree, 1);
        let stray = tree.create_node("li").unwrap();
        let new = tree.create_node("li").unwrap();
        let err = tree.insert_before(list, new, Some(stray)).unwrap_err();
        assert!(matches!(err, RenderError::NotAChild { .. }));
    }

    #[test]
    fn reattaching_moves_node() {
        let tree = MemoryTree::new();
        let (a, items) = list_with(&tree, 1);
        let (b, _) = list_with(&tree, 0);
        tree.append_child(b, items[0]).unwrap();
        assert!(tree.children(a).is_empty());
        assert_eq!(tree.parent_of(items[0]), Some(b));
    }

    #[test]
    fn cycles_are_rejected() {
        let tree = MemoryTree::new();
        let (list, items) = list_with(&tree, 1);
        let err = tree.append_child(items[0], list).unwrap_err();
        assert!(matches!(err, RenderError::Cycle { .. }));
    }

    #[test]
    fn remove_child_checks_parent() {
        let tree = MemoryTree::new();
        let (list, items) = list_with(&tree, 2);
        assert!(tree.remove_child(tree.root(), items[0]).is_err());
        tree.remove_child(list, items[0]).unwrap();
        assert_eq!(tree.children(list), vec![items[1]]);
        assert_eq!(tree.parent_of(items[0]), None);
    }

    #[test]
    fn unknown_nodes_error() {
        let tree = MemoryTree::new();
        let ghost = NodeRef::from_raw(99);
        assert_eq!(
            tree.set_text_content(ghost, "x").unwrap_err(),
            RenderError::UnknownNode(ghost)
        );
    }

    #[test]
    fn properties_and_markup() {
        let tree = MemoryTree::new();
        let (list, items) = list_with(&tree, 1);
        tree.set_class_presence(list, "vscroll", true).unwrap();
        tree.set_attribute(items[0], "title", "first").unwrap();
        tree.set_style_property(items[0], "color", "red").unwrap();
        tree.set_text_content(items[0], "milk").unwrap();

        assert!(tree.has_class(list, "vscroll"));
        assert_eq!(tree.style(items[0], "color").as_deref(), Some("red"));
        assert_eq!(
            tree.outer_html(list),
            "<ul class=\"vscroll\"><li title=\"first\" style=\"color: red\">milk</li></ul>"
        );

        tree.set_class_presence(list, "vscroll", false).unwrap();
        assert!(!tree.has_class(list, "vscroll"));
    }

    #[test]
    fn events_bubble_with_origin() {
        let tree = MemoryTree::new();
        let (list, items) = list_with(&tree, 2);
        let inner = tree.create_node("span").unwrap();
        tree.append_child(items[1], inner).unwrap();

        let seen = Rc::new(RefCell::new(Vec::new()));
        let log = seen.clone();
        tree.add_event_listener(
            list,
            "click",
            Rc::new(move |origin| {
                log.borrow_mut().push(origin);
                Ok(())
            }),
        )
        .unwrap();

        tree.dispatch_event(inner, "click").unwrap();
        tree.dispatch_event(inner, "keypress").unwrap();
        assert_eq!(*seen.borrow(), vec![inner]);
    }

    #[test]
    fn listeners_may_mutate_the_tree() {
        let tree = MemoryTree::new();
        let (list, items) = list_with(&tree, 1);
        let t = tree.clone();
        tree.add_event_listener(
            items[0],
            "click",
            Rc::new(move |origin| {
                t.remove_child(list, origin)?;
                Ok(())
            }),
        )
        .unwrap();

        tree.dispatch_event(items[0], "click").unwrap();
        assert!(tree.children(list).is_empty());
    }
}
