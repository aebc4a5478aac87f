//! Read-only access shared by uncompressed and canonical tries

use super::{CanonicalNode, Node, NodeCache, NodeId};

/// A handle to one trie node that traversals can walk.
///
/// Implemented for `&Node` (uncompressed trees) and [`NodeRef`] (canonical
/// DAG nodes), so enumeration, serialization and diffing work on both.
pub trait NodeView<'a, A: 'a>: Copy {
    /// Accept value stored at this node
    fn accept(self) -> Option<&'a A>;

    /// Children in stored order
    fn children(self) -> Vec<(&'a str, Self)>;

    /// Child reached through `label`
    fn child(self, label: &str) -> Option<Self>;

    /// Identity of the node within its graph. Two handles from the same
    /// graph with the same identity denote the same node, not merely equal
    /// content. Not comparable across graphs; use [`NodeView::same_node`].
    fn identity(self) -> usize;

    /// True only if both handles denote one node of one graph
    fn same_node(self, other: Self) -> bool;
}

impl<'a, A: 'a> NodeView<'a, A> for &'a Node<A> {
    fn accept(self) -> Option<&'a A> {
        self.accept.as_ref()
    }

    fn children(self) -> Vec<(&'a str, Self)> {
        self.children
            .iter()
            .map(|(label, child)| (label.as_str(), child))
            .collect()
    }

    fn child(self, label: &str) -> Option<Self> {
        self.children.get(label)
    }

    fn identity(self) -> usize {
        self as *const Node<A> as usize
    }

    fn same_node(self, other: Self) -> bool {
        std::ptr::eq(self, other)
    }
}

/// A canonical node together with the cache that owns it
pub struct NodeRef<'a, A> {
    cache: &'a NodeCache<A>,
    id: NodeId,
}

impl<'a, A> NodeRef<'a, A> {
    pub(crate) fn new(cache: &'a NodeCache<A>, id: NodeId) -> Self {
        NodeRef { cache, id }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn cache(&self) -> &'a NodeCache<A> {
        self.cache
    }

    fn entry(&self) -> &'a CanonicalNode<A> {
        self.cache.entry(self.id)
    }
}

impl<A> Clone for NodeRef<'_, A> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<A> Copy for NodeRef<'_, A> {}

impl<A> std::fmt::Debug for NodeRef<'_, A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "NodeRef({})", self.id)
    }
}

impl<'a, A: 'a> NodeView<'a, A> for NodeRef<'a, A> {
    fn accept(self) -> Option<&'a A> {
        self.entry().accept()
    }

    fn children(self) -> Vec<(&'a str, Self)> {
        self.entry()
            .children()
            .iter()
            .map(|(label, id)| (label.as_str(), NodeRef::new(self.cache, *id)))
            .collect()
    }

    fn child(self, label: &str) -> Option<Self> {
        self.entry()
            .children()
            .iter()
            .find(|(l, _)| l == label)
            .map(|(_, id)| NodeRef::new(self.cache, *id))
    }

    fn identity(self) -> usize {
        self.id.index()
    }

    fn same_node(self, other: Self) -> bool {
        // Ids are only meaningful inside their own cache
        self.id == other.id && std::ptr::eq(self.cache, other.cache)
    }
}
