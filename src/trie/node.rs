//! Uncompressed trie nodes and path insertion

use super::{format_path, Label};
use crate::model::{AcceptInfo, Payload};
use crate::{Error, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// What to do when a path is inserted again with a different accept value
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConflictPolicy {
    /// Fail with `Error::ConflictingAccept` and leave the trie unchanged
    #[default]
    Reject,
    /// Replace the stored value (last write wins)
    Overwrite,
}

/// A node of an uncompressed trie.
///
/// Every node is owned by exactly one parent edge. Children keep their
/// insertion order, which is the order enumeration and diffing observe.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Node<A = AcceptInfo> {
    pub accept: Option<A>,
    pub children: IndexMap<Label, Node<A>>,
}

impl<A> Node<A> {
    /// Create an empty node
    pub fn new() -> Self {
        Node {
            accept: None,
            children: IndexMap::new(),
        }
    }

    /// Create a childless node carrying `accept`
    pub fn with_accept(accept: A) -> Self {
        Node {
            accept: Some(accept),
            children: IndexMap::new(),
        }
    }

    /// True if the node has neither an accept value nor children
    pub fn is_empty(&self) -> bool {
        self.accept.is_none() && self.children.is_empty()
    }

    /// Follow `path` from this node
    pub fn descend<S: AsRef<str>>(&self, path: &[S]) -> Option<&Node<A>> {
        let mut node = self;
        for label in path {
            node = node.children.get(label.as_ref())?;
        }
        Some(node)
    }

    /// Get the accept value stored exactly at `path`
    pub fn get<S: AsRef<str>>(&self, path: &[S]) -> Option<&A> {
        self.descend(path)?.accept.as_ref()
    }
}

impl<A: Payload> Node<A> {
    /// Insert `path` with the default (`Reject`) conflict policy
    pub fn insert<I, S>(&mut self, path: I, accept: A) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<Label>,
    {
        self.insert_with_policy(path, accept, ConflictPolicy::default())
    }

    /// Insert `path`, resolving a conflicting accept value with `policy`
    pub fn insert_with_policy<I, S>(
        &mut self,
        path: I,
        accept: A,
        policy: ConflictPolicy,
    ) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<Label>,
    {
        let path: Vec<Label> = path.into_iter().map(Into::into).collect();

        // Check before touching the tree so a rejected insert creates no edges
        if policy == ConflictPolicy::Reject {
            if let Some(existing) = self.get(&path) {
                if *existing != accept {
                    return Err(Error::ConflictingAccept {
                        path: format_path(&path),
                        existing: format!("{:?}", existing),
                        incoming: format!("{:?}", accept),
                    });
                }
            }
        }

        let mut node = self;
        for label in path {
            node = node.children.entry(label).or_default();
        }
        node.accept = Some(accept);
        Ok(())
    }
}

impl<A> Default for Node<A> {
    fn default() -> Self {
        Node::new()
    }
}

/// Insert `path` into the tree rooted at `root`, rejecting conflicting values
pub fn insert<A, I, S>(root: &mut Node<A>, path: I, accept: A) -> Result<()>
where
    A: Payload,
    I: IntoIterator<Item = S>,
    S: Into<Label>,
{
    root.insert(path, accept)
}

/// Insert `path` into the tree rooted at `root` using an explicit policy
pub fn insert_with_policy<A, I, S>(
    root: &mut Node<A>,
    path: I,
    accept: A,
    policy: ConflictPolicy,
) -> Result<()>
where
    A: Payload,
    I: IntoIterator<Item = S>,
    S: Into<Label>,
{
    root.insert_with_policy(path, accept, policy)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eax_edx() -> AcceptInfo {
        AcceptInfo::new("%eax", "%edx")
    }

    #[test]
    fn test_insert_creates_path() {
        let mut root = Node::new();
        root.insert(["0", "1", "2"], eax_edx()).unwrap();

        assert_eq!(root.get(&["0", "1", "2"]), Some(&eax_edx()));
        assert_eq!(root.get(&["0", "1"]), None);
        assert_eq!(root.get(&["0", "1", "2", "3"]), None);
        assert!(root.descend(&["0", "1"]).is_some());
    }

    #[test]
    fn test_prefix_and_extension_coexist() {
        let mut root = Node::new();
        root.insert(["0", "1"], eax_edx()).unwrap();
        root.insert(["0", "1", "2"], AcceptInfo::unrestricted()).unwrap();

        let mid = root.descend(&["0", "1"]).unwrap();
        assert_eq!(mid.accept, Some(eax_edx()));
        assert_eq!(mid.children.len(), 1);
    }

    #[test]
    fn test_children_keep_insertion_order() {
        let mut root = Node::new();
        for label in ["5", "3", "9", "0"] {
            root.insert([label], eax_edx()).unwrap();
        }
        let labels: Vec<&str> = root.children.keys().map(String::as_str).collect();
        assert_eq!(labels, vec!["5", "3", "9", "0"]);
    }

    #[test]
    fn test_reinsert_same_value_is_noop() {
        let mut root = Node::new();
        root.insert(["0", "1"], eax_edx()).unwrap();
        let before = root.clone();
        root.insert(["0", "1"], eax_edx()).unwrap();
        assert_eq!(root, before);
    }

    #[test]
    fn test_conflicting_insert_rejected() {
        let mut root = Node::new();
        root.insert(["0", "1"], eax_edx()).unwrap();
        let before = root.clone();

        let err = root
            .insert(["0", "1"], AcceptInfo::new("%eax", "%ecx"))
            .unwrap_err();
        assert!(matches!(err, Error::ConflictingAccept { ref path, .. } if path == "0 1"));
        assert_eq!(root, before);
    }

    #[test]
    fn test_conflicting_insert_overwrite() {
        let mut root = Node::new();
        root.insert(["0", "1"], eax_edx()).unwrap();
        root.insert_with_policy(
            ["0", "1"],
            AcceptInfo::new("%eax", "%ecx"),
            ConflictPolicy::Overwrite,
        )
        .unwrap();

        assert_eq!(root.get(&["0", "1"]), Some(&AcceptInfo::new("%eax", "%ecx")));
    }

    #[test]
    fn test_empty_path_sets_root_accept() {
        let mut root = Node::new();
        insert(&mut root, Vec::<String>::new(), eax_edx()).unwrap();
        assert_eq!(root.accept, Some(eax_edx()));
        assert!(root.children.is_empty());
        assert!(!root.is_empty());
    }
}
