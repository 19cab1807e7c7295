// ============================================================================
// cirkit - Render Target
// The node-tree interface the binder and router drive
// ============================================================================
//
// The toolkit never owns real UI nodes. Everything it creates, moves or
// listens to goes through `RenderTarget`, so a DOM bridge, a terminal
// backend or the in-memory `MemoryTree` can sit underneath.
// ============================================================================

mod memory;

use std::fmt;
use std::rc::Rc;

use thiserror::Error;

use crate::core::error::Result;

pub use memory::MemoryTree;

// =============================================================================
// NODE REF
// =============================================================================

/// Opaque handle to a node owned by a render target.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
pub struct NodeRef(u32);

impl NodeRef {
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl fmt::Display for NodeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Listener installed with [`RenderTarget::add_event_listener`].
///
/// Receives the node the event originated on, which may be a descendant of
/// the node the listener is attached to.
pub type EventHandler = Rc<dyn Fn(NodeRef) -> Result<()>>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    #[error("unknown node {0}")]
    UnknownNode(NodeRef),

    #[error("node {child} is not a child of {parent}")]
    NotAChild { parent: NodeRef, child: NodeRef },

    #[error("attaching {child} under {parent} would create a cycle")]
    Cycle { parent: NodeRef, child: NodeRef },

    #[error("node limit of {limit} reached")]
    NodeLimit { limit: u32 },
}

// =============================================================================
// RENDER TARGET
// =============================================================================

/// A tree of addressable, mutable visual nodes.
///
/// Methods take `&self`; implementations use interior mutability, because
/// listeners fired by the target may call back into it.
pub trait RenderTarget {
    /// Create a detached node. Fails only when the target cannot address
    /// another node.
    fn create_node(&self, tag: &str) -> std::result::Result<NodeRef, RenderError>;

    fn append_child(&self, parent: NodeRef, child: NodeRef) -> std::result::Result<(), RenderError>;

    /// Insert `child` before `anchor`, or append when `anchor` is `None`.
    fn insert_before(
        &self,
        parent: NodeRef,
        child: NodeRef,
        anchor: Option<NodeRef>,
    ) -> std::result::Result<(), RenderError>;

    fn remove_child(&self, parent: NodeRef, child: NodeRef) -> std::result::Result<(), RenderError>;

    /// The node's parent, `None` for detached nodes and the root.
    fn parent_of(&self, node: NodeRef) -> Option<NodeRef>;

    fn set_attribute(
        &self,
        node: NodeRef,
        name: &str,
        value: &str,
    ) -> std::result::Result<(), RenderError>;

    fn add_event_listener(
        &self,
        node: NodeRef,
        event: &str,
        handler: EventHandler,
    ) -> std::result::Result<(), RenderError>;

    fn set_style_property(
        &self,
        node: NodeRef,
        name: &str,
        value: &str,
    ) -> std::result::Result<(), RenderError>;

    fn set_text_content(&self, node: NodeRef, text: &str) -> std::result::Result<(), RenderError>;

    fn set_class_presence(
        &self,
        node: NodeRef,
        class: &str,
        present: bool,
    ) -> std::result::Result<(), RenderError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_ref_round_trips_raw() {
        let node = NodeRef::from_raw(7);
        assert_eq!(node.raw(), 7);
        assert_eq!(node.to_string(), "#7");
    }

    #[test]
    fn render_error_messages() {
        let err = RenderError::NotAChild {
            parent: NodeRef::from_raw(1),
            child: NodeRef::from_raw(2),
        };
        assert_eq!(err.to_string(), "node #2 is not a child of #1");
        assert_eq!(
            RenderError::NodeLimit { limit: 4 }.to_string(),
            "node limit of 4 reached"
        );
    }
}
