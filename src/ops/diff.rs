//! Structural diff between two tries

use crate::model::Payload;
use crate::trie::{format_path, Label, NodeView, Path};
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;
use std::marker::PhantomData;

/// How a path's accept value changed between the two sides
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    /// Only the right side accepts at this path
    Added,
    /// Only the left side accepts at this path
    Removed,
    /// Both sides accept with different values
    Modified,
}

/// One path whose accept value differs between the two sides
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct DiffEntry<A> {
    pub path: Path,
    pub left: Option<A>,
    pub right: Option<A>,
}

impl<A> DiffEntry<A> {
    pub fn kind(&self) -> ChangeKind {
        match (&self.left, &self.right) {
            (None, _) => ChangeKind::Added,
            (_, None) => ChangeKind::Removed,
            _ => ChangeKind::Modified,
        }
    }
}

impl<A: fmt::Debug> fmt::Display for DiffEntry<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {:?} -> {:?}",
            format_path(&self.path),
            self.left,
            self.right
        )
    }
}

/// Lazy diff iterator, see [`diff`]
pub struct DiffIter<'a, A, V> {
    stack: Vec<(V, V, Path)>,
    empty: V,
    _marker: PhantomData<&'a A>,
}

impl<'a, A, V> Iterator for DiffIter<'a, A, V>
where
    A: Payload + 'a,
    V: NodeView<'a, A>,
{
    type Item = DiffEntry<A>;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some((left, right, path)) = self.stack.pop() {
            // The same node on both sides has no differences below it
            if left.same_node(right) {
                continue;
            }

            let left_children = left.children();
            let right_children = right.children();

            let mut pairs: Vec<(&str, V, V)> = Vec::with_capacity(left_children.len());
            for &(label, left_child) in &left_children {
                let right_child = right.child(label).unwrap_or(self.empty);
                pairs.push((label, left_child, right_child));
            }
            let left_labels: HashSet<&str> = left_children.iter().map(|(l, _)| *l).collect();
            for &(label, right_child) in &right_children {
                if !left_labels.contains(label) {
                    pairs.push((label, self.empty, right_child));
                }
            }

            for (label, left_child, right_child) in pairs.into_iter().rev() {
                let mut child_path = path.clone();
                child_path.push(Label::from(label));
                self.stack.push((left_child, right_child, child_path));
            }

            if left.accept() != right.accept() {
                return Some(DiffEntry {
                    path,
                    left: left.accept().cloned(),
                    right: right.accept().cloned(),
                });
            }
        }
        None
    }
}

/// Compare two tries path by path.
///
/// Yields an entry for every path where the accept values differ, absence
/// included. A side lacking an edge is treated as `empty`. Subtrees that are
/// the same node on both sides are skipped, so for canonical tries from one
/// [`NodeCache`](crate::trie::NodeCache) the cost follows the shared graph,
/// not the expanded tree.
pub fn diff<'a, A, V>(left: V, right: V, empty: V, prefix: &[Label]) -> DiffIter<'a, A, V>
where
    A: Payload + 'a,
    V: NodeView<'a, A>,
{
    DiffIter {
        stack: vec![(left, right, prefix.to_vec())],
        empty,
        _marker: PhantomData,
    }
}

/// A collected diff between two tries
#[derive(Clone, Debug, Serialize)]
pub struct Diff<A> {
    pub entries: Vec<DiffEntry<A>>,
}

impl<A> Diff<A> {
    pub fn new(entries: Vec<DiffEntry<A>>) -> Self {
        Diff { entries }
    }

    /// Run [`diff`] from the roots and collect every entry
    pub fn collect<'a, V>(left: V, right: V, empty: V) -> Self
    where
        A: Payload + 'a,
        V: NodeView<'a, A>,
    {
        Diff::new(diff(left, right, empty, &[]).collect())
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn added_count(&self) -> usize {
        self.count(ChangeKind::Added)
    }

    pub fn removed_count(&self) -> usize {
        self.count(ChangeKind::Removed)
    }

    pub fn modified_count(&self) -> usize {
        self.count(ChangeKind::Modified)
    }

    fn count(&self, kind: ChangeKind) -> usize {
        self.entries.iter().filter(|e| e.kind() == kind).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::AcceptInfo;
    use crate::trie::{path_of, Node, NodeCache};

    fn edx() -> AcceptInfo {
        AcceptInfo::new("%eax", "%edx")
    }

    fn ecx() -> AcceptInfo {
        AcceptInfo::new("%eax", "%ecx")
    }

    fn tries() -> (Node, Node) {
        let mut trie1 = Node::new();
        trie1.insert(["0", "1", "2"], edx()).unwrap();
        trie1.insert(["0", "1", "3"], edx()).unwrap();
        trie1.insert(["0", "1", "4"], edx()).unwrap();
        trie1.insert(["0", "1", "5"], edx()).unwrap();

        let mut trie2 = Node::new();
        trie2.insert(["0", "1", "2"], edx()).unwrap();
        trie2.insert(["0", "1", "3"], edx()).unwrap();
        trie2.insert(["0", "1", "4"], ecx()).unwrap();
        (trie1, trie2)
    }

    fn expected() -> HashSet<DiffEntry<AcceptInfo>> {
        HashSet::from([
            DiffEntry {
                path: path_of(&["0", "1", "4"]),
                left: Some(edx()),
                right: Some(ecx()),
            },
            DiffEntry {
                path: path_of(&["0", "1", "5"]),
                left: Some(edx()),
                right: None,
            },
        ])
    }

    #[test]
    fn test_diff_uncompressed() {
        let (trie1, trie2) = tries();
        let empty = Node::new();
        let diffs: HashSet<_> = diff(&trie1, &trie2, &empty, &[]).collect();
        assert_eq!(diffs, expected());
    }

    #[test]
    fn test_diff_compressed_matches_uncompressed() {
        let (trie1, trie2) = tries();
        let mut cache = NodeCache::new();
        let a = cache.merge(&trie1);
        let b = cache.merge(&trie2);

        let diffs: HashSet<_> =
            diff(cache.node(a), cache.node(b), cache.empty_node(), &[]).collect();
        assert_eq!(diffs, expected());
    }

    #[test]
    fn test_diff_same_trie_is_empty() {
        let (trie1, _) = tries();
        let empty = Node::new();
        assert_eq!(diff(&trie1, &trie1, &empty, &[]).count(), 0);

        let mut cache = NodeCache::new();
        let a = cache.merge(&trie1);
        assert_eq!(
            diff(cache.node(a), cache.node(a), cache.empty_node(), &[]).count(),
            0
        );
    }

    #[test]
    fn test_diff_across_caches_with_equal_ids() {
        let mut trie1 = Node::new();
        trie1.insert(["0"], edx()).unwrap();
        let mut trie2 = Node::new();
        trie2.insert(["0"], ecx()).unwrap();

        let mut cache1 = NodeCache::new();
        let mut cache2 = NodeCache::new();
        let a = cache1.merge(&trie1);
        let b = cache2.merge(&trie2);
        // Both caches number their nodes the same way
        assert_eq!(a, b);

        let entries: Vec<_> =
            diff(cache1.node(a), cache2.node(b), cache1.empty_node(), &[]).collect();
        assert_eq!(
            entries,
            vec![DiffEntry {
                path: path_of(&["0"]),
                left: Some(edx()),
                right: Some(ecx()),
            }]
        );
    }

    #[test]
    fn test_equal_values_distinct_instances() {
        let trie1 = Node::with_accept(AcceptInfo::new("%eax", "%edx"));
        let trie2 = Node::with_accept(AcceptInfo::new("%eax", "%edx"));
        let empty = Node::new();
        assert_eq!(diff(&trie1, &trie2, &empty, &[]).count(), 0);
    }

    #[test]
    fn test_prefix_is_prepended() {
        let trie1 = Node::with_accept(edx());
        let trie2 = Node::new();
        let empty = Node::new();
        let prefix = path_of(&["f0", "0f"]);

        let entries: Vec<_> = diff(&trie1, &trie2, &empty, &prefix).collect();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].path, prefix);
        assert_eq!(entries[0].kind(), ChangeKind::Removed);
    }

    #[test]
    fn test_right_only_labels_reported_as_added() {
        let trie1 = Node::new();
        let mut trie2 = Node::new();
        trie2.insert(["a", "b"], edx()).unwrap();
        trie2.insert(["a"], ecx()).unwrap();
        let empty = Node::new();

        let entries: Vec<_> = diff(&trie1, &trie2, &empty, &[]).collect();
        // Pre-order: the shorter path first
        assert_eq!(entries[0].path, path_of(&["a"]));
        assert_eq!(entries[1].path, path_of(&["a", "b"]));
        assert!(entries.iter().all(|e| e.kind() == ChangeKind::Added));
    }

    #[test]
    fn test_diff_counts() {
        let (trie1, trie2) = tries();
        let empty = Node::new();
        let collected = Diff::collect(&trie1, &trie2, &empty);

        assert!(!collected.is_empty());
        assert_eq!(collected.added_count(), 0);
        assert_eq!(collected.removed_count(), 1);
        assert_eq!(collected.modified_count(), 1);

        let reversed = Diff::collect(&trie2, &trie1, &empty);
        assert_eq!(reversed.added_count(), 1);
    }

    #[test]
    fn test_entry_display() {
        let entry = DiffEntry {
            path: path_of(&["0", "1"]),
            left: None,
            right: Some(1u8),
        };
        assert_eq!(entry.to_string(), "[0 1] None -> Some(1)");
    }
}
