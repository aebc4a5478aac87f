//! Canonicalizing trie engine
//!
//! Tries are built uncompressed with [`Node::insert`], then minimized by a
//! [`NodeCache`] which hash-conses identical subtrees into a shared DAG:
//! - Each canonical node is identified by a dense [`NodeId`]
//! - Equal content anywhere in the graph maps to the same id
//! - Traversals accept raw and canonical tries alike through [`NodeView`]

mod cache;
mod enumerate;
mod node;
mod view;

pub use cache::{CacheStats, CanonicalNode, NodeCache, NodeId};
pub use enumerate::{accept_sequences, depth, lookup, unique_nodes, AcceptSequences};
pub use node::{insert, insert_with_policy, ConflictPolicy, Node};
pub use view::{NodeRef, NodeView};

#[cfg(test)]
pub(crate) use enumerate::path_of;

/// An edge label (one token of a path, e.g. an opcode byte)
pub type Label = String;

/// A sequence of edge labels from a root
pub type Path = Vec<Label>;

/// Render a path for messages, labels separated by spaces
pub fn format_path<S: AsRef<str>>(path: &[S]) -> String {
    path.iter()
        .map(|label| label.as_ref())
        .collect::<Vec<_>>()
        .join(" ")
}
