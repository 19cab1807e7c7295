// ============================================================================
// cirkit - NodeIndex
// Position -> rendered nodes for one bound collection
// ============================================================================

use crate::core::constants::SEGMENT_SEPARATOR;
use crate::core::error::{CircuitError, Result};
use crate::render::NodeRef;

// =============================================================================
// ITEM REFS
// =============================================================================

/// Named node handles mirroring a nested template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefTree {
    pub name: String,
    pub node: NodeRef,
    pub children: Vec<RefTree>,
}

impl RefTree {
    fn find<'a>(&self, mut segments: impl Iterator<Item = &'a str>) -> Option<NodeRef> {
        match segments.next() {
            None => Some(self.node),
            Some(segment) => self
                .children
                .iter()
                .find(|child| child.name == segment)?
                .find(segments),
        }
    }

    fn collect(&self, out: &mut Vec<NodeRef>) {
        out.push(self.node);
        for child in &self.children {
            child.collect(out);
        }
    }
}

/// The render nodes that show one collection item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemRefs {
    /// A leaf-tag template: one node.
    Single(NodeRef),
    /// A nested template: the planted subtree.
    Tree(RefTree),
}

impl ItemRefs {
    /// The top-level node, the one that sits directly in the container.
    pub fn root(&self) -> NodeRef {
        match self {
            Self::Single(node) => *node,
            Self::Tree(tree) => tree.node,
        }
    }

    /// Look up a node by dotted path.
    ///
    /// The empty path is the root. Tree paths start with the root's own
    /// name: `"box.boxColor"` is the `boxColor` child of root `box`.
    pub fn find(&self, path: &str) -> Option<NodeRef> {
        if path.is_empty() {
            return Some(self.root());
        }
        match self {
            Self::Single(_) => None,
            Self::Tree(tree) => {
                let mut segments = path.split(SEGMENT_SEPARATOR);
                if segments.next()? != tree.name {
                    return None;
                }
                tree.find(segments)
            }
        }
    }

    /// Every node in the item, root first.
    pub fn nodes(&self) -> Vec<NodeRef> {
        match self {
            Self::Single(node) => vec![*node],
            Self::Tree(tree) => {
                let mut out = Vec::new();
                tree.collect(&mut out);
                out
            }
        }
    }
}

// =============================================================================
// NODE INDEX
// =============================================================================

/// Positional list of item refs.
///
/// Position is the identity: entry `i` shows collection item `i`. Inserting
/// or removing shifts every later entry by one slot; the refs themselves are
/// never rewritten.
#[derive(Debug, Default, Clone)]
pub struct NodeIndex {
    entries: Vec<ItemRefs>,
}

impl NodeIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ItemRefs> {
        self.entries.iter()
    }

    pub fn get(&self, index: usize) -> Result<&ItemRefs> {
        self.entries
            .get(index)
            .ok_or(CircuitError::index(index, self.entries.len()))
    }

    /// Insert at `index` (`index == len` appends).
    pub fn insert(&mut self, index: usize, refs: ItemRefs) -> Result<()> {
        if index > self.entries.len() {
            return Err(CircuitError::index(index, self.entries.len()));
        }
        self.entries.insert(index, refs);
        Ok(())
    }

    pub fn remove(&mut self, index: usize) -> Result<ItemRefs> {
        if index >= self.entries.len() {
            return Err(CircuitError::index(index, self.entries.len()));
        }
        Ok(self.entries.remove(index))
    }

    /// The node a new item at `index` must be inserted before.
    ///
    /// `None` means append.
    pub fn anchor_for(&self, index: usize) -> Result<Option<NodeRef>> {
        match index.cmp(&self.entries.len()) {
            std::cmp::Ordering::Less => Ok(Some(self.entries[index].root())),
            std::cmp::Ordering::Equal => Ok(None),
            std::cmp::Ordering::Greater => Err(CircuitError::index(index, self.entries.len())),
        }
    }

    /// Position of the entry whose top-level node is `node`.
    pub fn position_of_root(&self, node: NodeRef) -> Option<usize> {
        self.entries.iter().position(|refs| refs.root() == node)
    }

    pub fn roots(&self) -> Vec<NodeRef> {
        self.entries.iter().map(ItemRefs::root).collect()
    }
}
