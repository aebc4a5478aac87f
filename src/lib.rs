//! # opcode_trie
//!
//! A canonicalizing trie engine for instruction decoder tables.
//!
//! Tables map token paths (e.g. opcode bytes) to small accept values. They
//! are built as plain tries, minimized into a shared DAG by hash-consing,
//! persisted as a node-table document, and diffed against earlier revisions
//! to spot semantic changes.
//!
//! ## Core Concepts
//!
//! - **Node**: an uncompressed trie node, built with [`trie::insert`]
//! - **NodeCache**: interns nodes by content; identical subtrees share one [`NodeId`]
//! - **TrieDocument**: DAG-preserving encoding, see [`store::to_dict`] / [`store::from_dict`]
//! - **Diff**: path-level comparison that skips shared subtrees, see [`ops::diff`]
//!
//! ## Example
//!
//! ```
//! use opcode_trie::{accept_sequences, AcceptInfo, Node, NodeCache};
//!
//! let mut table = Node::new();
//! table.insert(["0f", "05"], AcceptInfo::new("%eax", "%edx"))?;
//! table.insert(["0f", "0b"], AcceptInfo::new("%eax", "%edx"))?;
//!
//! let mut cache = NodeCache::new();
//! let root = cache.merge(&table);
//! assert_eq!(accept_sequences(cache.node(root)).count(), 2);
//! # Ok::<(), opcode_trie::Error>(())
//! ```

pub mod config;
pub mod model;
pub mod ops;
pub mod store;
pub mod trie;

mod error;

pub use config::Config;
pub use error::{Error, Result};
pub use model::{AcceptInfo, Fingerprint, Payload};
pub use ops::{diff, Diff, DiffEntry};
pub use store::{from_dict, to_dict, TrieDocument};
pub use trie::{
    accept_sequences, insert, unique_nodes, ConflictPolicy, Node, NodeCache, NodeId, NodeRef,
    NodeView,
};

/// Document format version for compatibility
pub const VERSION: u32 = 1;
