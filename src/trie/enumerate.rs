//! Deterministic traversals over raw and canonical tries

use super::{NodeView, Path};
#[cfg(test)]
use super::Label;
use std::collections::HashSet;
use std::marker::PhantomData;

/// Pre-order iterator over `(accept, path)` pairs.
///
/// A node's own accept value comes before anything below it, and children
/// are visited in stored order. Calling [`accept_sequences`] again starts a
/// fresh walk.
pub struct AcceptSequences<'a, A, V> {
    stack: Vec<(V, Path)>,
    _marker: PhantomData<&'a A>,
}

impl<'a, A: 'a, V: NodeView<'a, A>> Iterator for AcceptSequences<'a, A, V> {
    type Item = (&'a A, Path);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some((node, path)) = self.stack.pop() {
            for (label, child) in node.children().into_iter().rev() {
                let mut child_path = path.clone();
                child_path.push(label.to_string());
                self.stack.push((child, child_path));
            }
            if let Some(accept) = node.accept() {
                return Some((accept, path));
            }
        }
        None
    }
}

/// Walk every accepting node reachable from `root`
pub fn accept_sequences<'a, A: 'a, V: NodeView<'a, A>>(root: V) -> AcceptSequences<'a, A, V> {
    AcceptSequences {
        stack: vec![(root, Vec::new())],
        _marker: PhantomData,
    }
}

/// Identities of all distinct nodes reachable from `root`.
///
/// Shared subtrees count once, so this shrinks after canonicalization.
pub fn unique_nodes<'a, A: 'a, V: NodeView<'a, A>>(root: V) -> HashSet<usize> {
    let mut seen = HashSet::new();
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        if seen.insert(node.identity()) {
            stack.extend(node.children().into_iter().map(|(_, child)| child));
        }
    }
    seen
}

/// Accept value stored exactly at `path` below `root`
pub fn lookup<'a, A, V, S>(root: V, path: &[S]) -> Option<&'a A>
where
    A: 'a,
    V: NodeView<'a, A>,
    S: AsRef<str>,
{
    let mut node = root;
    for label in path {
        node = node.child(label.as_ref())?;
    }
    node.accept()
}

/// Number of labels on the longest path below `root`
pub fn depth<'a, A: 'a, V: NodeView<'a, A>>(root: V) -> usize {
    let mut deepest = 0;
    let mut stack = vec![(root, 0usize)];
    while let Some((node, level)) = stack.pop() {
        deepest = deepest.max(level);
        stack.extend(node.children().into_iter().map(|(_, child)| (child, level + 1)));
    }
    deepest
}

#[cfg(test)]
pub(crate) fn path_of(labels: &[&str]) -> Path {
    labels.iter().map(|l| Label::from(*l)).collect()
}
