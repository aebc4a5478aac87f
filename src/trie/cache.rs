//! Hash-consing cache that turns uncompressed tries into a shared DAG

use super::{format_path, Label, Node, NodeRef};
use crate::model::{AcceptInfo, Fingerprint, Payload};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use tracing::debug;

/// Index of a canonical node inside its [`NodeCache`]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(u32);

impl NodeId {
    /// The canonical empty node (no accept, no children)
    pub const EMPTY: NodeId = NodeId(0);

    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// An immutable node of the canonical DAG.
///
/// Also the content key of the cache: children refer to already-canonical
/// ids and keep their label order, so equal keys mean equal subtrees that
/// enumerate identically.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CanonicalNode<A> {
    accept: Option<A>,
    children: Vec<(Label, NodeId)>,
}

impl<A> CanonicalNode<A> {
    pub fn accept(&self) -> Option<&A> {
        self.accept.as_ref()
    }

    pub fn children(&self) -> &[(Label, NodeId)] {
        &self.children
    }
}

/// Statistics about a [`NodeCache`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub node_count: usize,
    pub accept_count: usize,
    pub edge_count: usize,
}

/// Arena of canonical nodes keyed by content.
///
/// Guarantees:
/// 1. Canonicity: identical `(accept, ordered children)` maps to one `NodeId`
/// 2. Topological ids: a child's id is always smaller than its parent's
/// 3. Immutability: nodes are never changed once created
#[derive(Clone)]
pub struct NodeCache<A = AcceptInfo> {
    nodes: Vec<CanonicalNode<A>>,
    index: HashMap<CanonicalNode<A>, NodeId>,
}

impl<A: Payload> NodeCache<A> {
    /// Create a cache holding only the empty node
    pub fn new() -> Self {
        let mut cache = NodeCache {
            nodes: Vec::new(),
            index: HashMap::new(),
        };
        let empty = cache.get_or_create(None, Vec::new());
        debug_assert_eq!(empty, NodeId::EMPTY);
        cache
    }

    /// Get or create the canonical node for `(accept, children)`.
    ///
    /// Every id in `children` must already belong to this cache.
    pub(crate) fn get_or_create(
        &mut self,
        accept: Option<A>,
        children: Vec<(Label, NodeId)>,
    ) -> NodeId {
        let key = CanonicalNode { accept, children };
        if let Some(&existing) = self.index.get(&key) {
            return existing;
        }

        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(key.clone());
        self.index.insert(key, id);
        id
    }

    /// Canonicalize an uncompressed trie, returning its root id.
    ///
    /// Children are interned before their parent; identical subtrees anywhere
    /// in the input (or already in the cache) collapse to one id.
    pub fn merge(&mut self, root: &Node<A>) -> NodeId {
        enum Step<'n, A> {
            Enter(&'n Node<A>),
            Exit(&'n Node<A>),
        }

        let before = self.nodes.len();
        let mut stack = vec![Step::Enter(root)];
        // Ids of finished subtrees; a node's children sit on top when it exits
        let mut done: Vec<NodeId> = Vec::new();

        while let Some(step) = stack.pop() {
            match step {
                Step::Enter(node) => {
                    stack.push(Step::Exit(node));
                    for child in node.children.values().rev() {
                        stack.push(Step::Enter(child));
                    }
                }
                Step::Exit(node) => {
                    let ids = done.split_off(done.len() - node.children.len());
                    let children = node.children.keys().cloned().zip(ids).collect();
                    let id = self.get_or_create(node.accept.clone(), children);
                    done.push(id);
                }
            }
        }

        debug!(
            created = self.nodes.len() - before,
            total = self.nodes.len(),
            "canonicalized trie"
        );
        debug_assert_eq!(done.len(), 1);
        done.pop().unwrap_or(NodeId::EMPTY)
    }

    /// Merge two canonical tries into one holding the paths of both.
    ///
    /// Fails with `Error::ConflictingAccept` if both tries carry different
    /// accept values at the same path.
    pub fn union(&mut self, a: NodeId, b: NodeId) -> Result<NodeId> {
        let mut memo = HashMap::new();
        let mut path = Vec::new();
        self.union_rec(a, b, &mut memo, &mut path)
    }

    fn union_rec(
        &mut self,
        a: NodeId,
        b: NodeId,
        memo: &mut HashMap<(NodeId, NodeId), NodeId>,
        path: &mut Vec<Label>,
    ) -> Result<NodeId> {
        if a == b || b == NodeId::EMPTY {
            return Ok(a);
        }
        if a == NodeId::EMPTY {
            return Ok(b);
        }
        if let Some(&cached) = memo.get(&(a, b)) {
            return Ok(cached);
        }

        let left = self.entry(a).clone();
        let right = self.entry(b).clone();

        let accept = match (left.accept, right.accept) {
            (Some(existing), Some(incoming)) if existing != incoming => {
                return Err(Error::ConflictingAccept {
                    path: format_path(path),
                    existing: format!("{:?}", existing),
                    incoming: format!("{:?}", incoming),
                });
            }
            (existing, incoming) => existing.or(incoming),
        };

        let mut children = Vec::with_capacity(left.children.len() + right.children.len());
        for (label, left_child) in &left.children {
            let merged = match right.children.iter().find(|(l, _)| l == label) {
                Some((_, right_child)) => {
                    path.push(label.clone());
                    let merged = self.union_rec(*left_child, *right_child, memo, path);
                    path.pop();
                    merged?
                }
                None => *left_child,
            };
            children.push((label.clone(), merged));
        }
        for (label, right_child) in &right.children {
            if !left.children.iter().any(|(l, _)| l == label) {
                children.push((label.clone(), *right_child));
            }
        }

        let id = self.get_or_create(accept, children);
        memo.insert((a, b), id);
        Ok(id)
    }
}

impl<A> NodeCache<A> {
    /// The canonical empty node
    pub fn empty_node(&self) -> NodeRef<'_, A> {
        NodeRef::new(self, NodeId::EMPTY)
    }

    /// Handle to a canonical node
    ///
    /// # Panics
    /// Panics if `id` was not produced by this cache
    pub fn node(&self, id: NodeId) -> NodeRef<'_, A> {
        assert!(id.index() < self.nodes.len(), "unknown node {}", id);
        NodeRef::new(self, id)
    }

    /// Handle to a canonical node, if `id` belongs to this cache
    pub fn try_node(&self, id: NodeId) -> Option<NodeRef<'_, A>> {
        (id.index() < self.nodes.len()).then(|| NodeRef::new(self, id))
    }

    /// Get the stored node for `id`
    pub fn get(&self, id: NodeId) -> Option<&CanonicalNode<A>> {
        self.nodes.get(id.index())
    }

    pub(crate) fn entry(&self, id: NodeId) -> &CanonicalNode<A> {
        &self.nodes[id.index()]
    }

    /// Number of canonical nodes, including the empty node
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            node_count: self.nodes.len(),
            accept_count: self.nodes.iter().filter(|n| n.accept.is_some()).count(),
            edge_count: self.nodes.iter().map(|n| n.children.len()).sum(),
        }
    }

    /// Ids reachable from `root`, children before parents
    pub fn reachable(&self, root: NodeId) -> Vec<NodeId> {
        let mut seen = HashSet::new();
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            if seen.insert(id) {
                stack.extend(self.entry(id).children.iter().map(|(_, child)| *child));
            }
        }
        let mut ids: Vec<NodeId> = seen.into_iter().collect();
        ids.sort();
        ids
    }
}

impl<A: Clone> NodeCache<A> {
    /// Rebuild the uncompressed tree for a canonical node
    pub fn expand(&self, id: NodeId) -> Node<A> {
        let entry = self.entry(id);
        let mut node = Node::new();
        node.accept = entry.accept.clone();
        for (label, child) in &entry.children {
            node.children.insert(label.clone(), self.expand(*child));
        }
        node
    }
}

impl<A: Serialize> NodeCache<A> {
    /// Merkle digest of the content below `root`.
    ///
    /// Depends only on accept values and ordered labels, never on ids, so
    /// equal tries have equal fingerprints across caches and processes, and
    /// within one cache equal fingerprints mean equal ids.
    pub fn fingerprint(&self, root: NodeId) -> Result<Fingerprint> {
        let mut digests: HashMap<NodeId, Fingerprint> = HashMap::new();

        // Ascending ids visit children before parents
        for id in self.reachable(root) {
            let entry = self.entry(id);
            let accept = bincode::serialize(&entry.accept)?;

            let mut children = Vec::with_capacity(entry.children.len());
            for (label, child) in &entry.children {
                let digest = digests.get(child).ok_or_else(|| {
                    Error::Corruption(format!("node {} visited before child {}", id, child))
                })?;
                children.push((label.as_str(), digest));
            }

            let fingerprint = Fingerprint::of_node(&accept, children);
            digests.insert(id, fingerprint);
        }

        digests
            .remove(&root)
            .ok_or_else(|| Error::Corruption(format!("node {} not reachable", root)))
    }
}

impl<A: Payload> Default for NodeCache<A> {
    fn default() -> Self {
        NodeCache::new()
    }
}

impl<A> fmt::Debug for NodeCache<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeCache")
            .field("nodes", &self.nodes.len())
            .finish()
    }
}
