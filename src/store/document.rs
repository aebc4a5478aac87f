//! DAG-preserving document encoding of tries
//!
//! Document layout (JSON):
//! ```text
//! {
//!   "version": 1,
//!   "root": 4,                       index of the root entry in "nodes"
//!   "nodes": [                       children always precede their parents
//!     {"accept": {...}, "children": [["0", 1], ["1", {inline node}]]},
//!     ...
//!   ],
//!   "fingerprint": "9f2c..."         optional, verified on load
//! }
//! ```
//! A child reference is either an index into `nodes` (shared) or an inline
//! node. Decoding interns every node through a [`NodeCache`], so identical
//! subtrees are shared again no matter how often they were written out.

use crate::model::{AcceptInfo, Fingerprint, Payload};
use crate::trie::{Label, NodeCache, NodeId, NodeView};
use crate::{Error, Result, VERSION};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// A serialized trie: a node table plus the index of the root
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrieDocument<A = AcceptInfo> {
    pub version: u32,
    pub root: u32,
    pub nodes: Vec<EncodedNode<A>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fingerprint: Option<String>,
}

/// One entry of the node table
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EncodedNode<A = AcceptInfo> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accept: Option<A>,
    pub children: Vec<(Label, ChildRef<A>)>,
}

/// Reference from an edge to its target node
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChildRef<A = AcceptInfo> {
    /// Index into the document's node table
    Shared(u32),
    /// A node written in place
    Inline(Box<EncodedNode<A>>),
}

impl<A> TrieDocument<A> {
    /// Attach the root fingerprint so loaders can verify the content
    pub fn with_fingerprint(mut self, fingerprint: Fingerprint) -> Self {
        self.fingerprint = Some(fingerprint.to_hex());
        self
    }

    /// Number of entries in the node table
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }
}

impl<A: Serialize> TrieDocument<A> {
    pub fn to_json(&self, pretty: bool) -> Result<String> {
        let json = if pretty {
            serde_json::to_string_pretty(self)?
        } else {
            serde_json::to_string(self)?
        };
        Ok(json)
    }
}

impl<A: for<'de> Deserialize<'de>> TrieDocument<A> {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Encode the trie below `root`.
///
/// Each distinct node is written once; edges to it use its table index.
/// Works for uncompressed trees and canonical DAGs alike.
pub fn to_dict<'a, A, V>(root: V) -> TrieDocument<A>
where
    A: Clone + 'a,
    V: NodeView<'a, A>,
{
    let mut index: HashMap<usize, u32> = HashMap::new();
    let mut nodes = Vec::new();
    let mut stack = vec![(root, false)];

    while let Some((node, expanded)) = stack.pop() {
        if index.contains_key(&node.identity()) {
            continue;
        }
        if expanded {
            // Every child was pushed after this entry, so all are indexed by now
            let children = node
                .children()
                .into_iter()
                .map(|(label, child)| {
                    (
                        label.to_string(),
                        ChildRef::Shared(index[&child.identity()]),
                    )
                })
                .collect();
            index.insert(node.identity(), nodes.len() as u32);
            nodes.push(EncodedNode {
                accept: node.accept().cloned(),
                children,
            });
        } else {
            stack.push((node, true));
            for (_, child) in node.children().into_iter().rev() {
                if !index.contains_key(&child.identity()) {
                    stack.push((child, false));
                }
            }
        }
    }

    TrieDocument {
        version: VERSION,
        root: index[&root.identity()],
        nodes,
        fingerprint: None,
    }
}

/// Decode a document into `cache`, returning the canonical root.
///
/// Fails on unknown versions, dangling or cyclic references, duplicate edge
/// labels and fingerprint mismatches. Nothing partial is returned on error,
/// though nodes decoded before the failure stay interned in the cache.
pub fn from_dict<A>(doc: &TrieDocument<A>, cache: &mut NodeCache<A>) -> Result<NodeId>
where
    A: Payload + Serialize,
{
    if doc.version != VERSION {
        return Err(Error::VersionMismatch {
            expected: VERSION,
            found: doc.version,
        });
    }

    let before = cache.node_count();
    let root = decode(doc, cache)?;

    if let Some(expected) = &doc.fingerprint {
        let expected = Fingerprint::from_hex(expected)
            .map_err(|e| Error::InvalidFingerprint(format!("{}: {}", expected, e)))?;
        let actual = cache.fingerprint(root)?;
        if actual != expected {
            return Err(Error::Corruption(format!(
                "Fingerprint mismatch: document says {}, content hashes to {}",
                expected.short(),
                actual.short()
            )));
        }
    }

    debug!(
        entries = doc.nodes.len(),
        created = cache.node_count() - before,
        "decoded trie document"
    );
    Ok(root)
}

#[derive(Clone, Copy)]
enum Slot {
    Pending,
    Visiting,
    Done(NodeId),
}

/// A node whose children are being decoded
struct Frame<'d, A> {
    node: &'d EncodedNode<A>,
    /// Table index, `None` for inline nodes
    index: Option<u32>,
    /// Label of the edge from the parent frame
    label: Option<&'d str>,
    next: usize,
    labels: HashSet<&'d str>,
    children: Vec<(Label, NodeId)>,
}

impl<'d, A> Frame<'d, A> {
    fn new(node: &'d EncodedNode<A>, index: Option<u32>, label: Option<&'d str>) -> Self {
        Frame {
            node,
            index,
            label,
            next: 0,
            labels: HashSet::new(),
            children: Vec::with_capacity(node.children.len()),
        }
    }
}

/// Intern the entry at `doc.root` and everything below it, children first.
///
/// Iterative, so chains as deep as the table is long cannot overflow the
/// stack.
fn decode<'d, A: Payload>(doc: &'d TrieDocument<A>, cache: &mut NodeCache<A>) -> Result<NodeId> {
    let mut slots = vec![Slot::Pending; doc.nodes.len()];
    let dangling = |index: u32| Error::DanglingReference {
        index,
        table_len: doc.nodes.len(),
    };

    let root = doc
        .nodes
        .get(doc.root as usize)
        .ok_or_else(|| dangling(doc.root))?;
    slots[doc.root as usize] = Slot::Visiting;
    let mut stack = vec![Frame::new(root, Some(doc.root), None)];

    while let Some(frame) = stack.last_mut() {
        let node = frame.node;
        if let Some((label, child)) = node.children.get(frame.next) {
            frame.next += 1;
            if !frame.labels.insert(label.as_str()) {
                return Err(Error::DuplicateLabel(label.clone()));
            }
            match child {
                ChildRef::Shared(index) => {
                    let slot = slots
                        .get(*index as usize)
                        .copied()
                        .ok_or_else(|| dangling(*index))?;
                    match slot {
                        Slot::Done(id) => frame.children.push((label.clone(), id)),
                        Slot::Visiting => {
                            return Err(Error::CyclicReference { index: *index });
                        }
                        Slot::Pending => {
                            slots[*index as usize] = Slot::Visiting;
                            let entry = &doc.nodes[*index as usize];
                            stack.push(Frame::new(entry, Some(*index), Some(label.as_str())));
                        }
                    }
                }
                ChildRef::Inline(inline) => {
                    stack.push(Frame::new(inline, None, Some(label.as_str())));
                }
            }
            continue;
        }

        // All children interned; intern this node and hand its id upward
        let Some(frame) = stack.pop() else { break };
        let id = cache.get_or_create(frame.node.accept.clone(), frame.children);
        if let Some(index) = frame.index {
            slots[index as usize] = Slot::Done(id);
        }
        match (stack.last_mut(), frame.label) {
            (Some(parent), Some(label)) => parent.children.push((label.to_string(), id)),
            _ => return Ok(id),
        }
    }

    Err(Error::Corruption("document decoding ended without a root".into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trie::{accept_sequences, unique_nodes, Node};

    fn edx() -> AcceptInfo {
        AcceptInfo::new("%eax", "%edx")
    }

    fn sample() -> Node {
        let mut root = Node::new();
        for path in [
            &["0", "1", "2"][..],
            &["0", "1", "2", "3"],
            &["0", "1", "3"],
            &["0", "1", "4"],
            &["0", "1", "5"],
        ] {
            root.insert(path.iter().copied(), edx()).unwrap();
        }
        root
    }

    #[test]
    fn test_shared_nodes_written_once() {
        let mut cache = NodeCache::new();
        let root = cache.merge(&sample());
        let doc = to_dict(cache.node(root));

        assert_eq!(doc.node_count(), 5);
        assert_eq!(doc.root as usize, doc.node_count() - 1);
    }

    #[test]
    fn test_roundtrip_preserves_sequences_and_sharing() {
        let mut cache = NodeCache::new();
        let root = cache.merge(&sample());
        let doc = to_dict(cache.node(root));

        let mut fresh = NodeCache::new();
        let decoded = from_dict(&doc, &mut fresh).unwrap();

        let original: Vec<_> = accept_sequences(cache.node(root)).collect();
        let restored: Vec<_> = accept_sequences(fresh.node(decoded)).collect();
        assert_eq!(original, restored);
        assert_eq!(unique_nodes(fresh.node(decoded)).len(), 5);
    }

    #[test]
    fn test_decode_into_same_cache_returns_same_root() {
        let mut cache = NodeCache::new();
        let root = cache.merge(&sample());
        let count = cache.node_count();

        let doc = to_dict(cache.node(root));
        assert_eq!(from_dict(&doc, &mut cache).unwrap(), root);
        assert_eq!(cache.node_count(), count);
    }

    #[test]
    fn test_uncompressed_tree_is_remerged_on_decode() {
        let tree = sample();
        let doc = to_dict(&tree);
        assert_eq!(doc.node_count(), 8);

        let mut cache = NodeCache::new();
        let root = from_dict(&doc, &mut cache).unwrap();
        assert_eq!(unique_nodes(cache.node(root)).len(), 5);
    }

    #[test]
    fn test_inline_children_accepted() {
        let json = r#"{
            "version": 1,
            "root": 1,
            "nodes": [
                {"accept": {"input_rr": "%eax", "output_rr": "%edx"}, "children": []},
                {"children": [
                    ["a", 0],
                    ["b", {"accept": {"input_rr": "%eax", "output_rr": "%edx"}, "children": []}]
                ]}
            ]
        }"#;
        let doc: TrieDocument = TrieDocument::from_json(json).unwrap();
        let mut cache = NodeCache::new();
        let root = from_dict(&doc, &mut cache).unwrap();

        let children = cache.get(root).unwrap().children();
        assert_eq!(children.len(), 2);
        assert_eq!(children[0].1, children[1].1);
    }

    #[test]
    fn test_long_shared_chain_decodes() {
        const LEN: u32 = 200_000;
        let mut nodes = vec![EncodedNode {
            accept: Some(7u8),
            children: Vec::new(),
        }];
        for i in 1..LEN {
            nodes.push(EncodedNode {
                accept: None,
                children: vec![("a".to_string(), ChildRef::Shared(i - 1))],
            });
        }
        let doc = TrieDocument {
            version: VERSION,
            root: LEN - 1,
            nodes,
            fingerprint: None,
        };

        let mut cache = NodeCache::new();
        let root = from_dict(&doc, &mut cache).unwrap();
        assert_eq!(crate::trie::depth(cache.node(root)), (LEN - 1) as usize);
        assert_eq!(cache.node_count(), LEN as usize + 1);
        assert_eq!(to_dict(cache.node(root)).node_count(), LEN as usize);
    }

    #[test]
    fn test_generic_payload_json_roundtrip() {
        let mut tree: Node<u8> = Node::new();
        tree.insert(["0f", "05"], 1).unwrap();
        tree.insert(["0f"], 2).unwrap();
        let mut cache = NodeCache::new();
        let root = cache.merge(&tree);

        let json = to_dict(cache.node(root)).to_json(false).unwrap();
        assert!(!json.contains("null"));
        let doc: TrieDocument<u8> = TrieDocument::from_json(&json).unwrap();
        assert_eq!(from_dict(&doc, &mut cache).unwrap(), root);
    }

    #[test]
    fn test_dangling_reference_rejected() {
        let json = r#"{"version": 1, "root": 0, "nodes": [{"children": [["a", 7]]}]}"#;
        let doc: TrieDocument = TrieDocument::from_json(json).unwrap();
        let err = from_dict(&doc, &mut NodeCache::new()).unwrap_err();
        assert!(matches!(
            err,
            Error::DanglingReference {
                index: 7,
                table_len: 1
            }
        ));
    }

    #[test]
    fn test_dangling_root_rejected() {
        let json = r#"{"version": 1, "root": 3, "nodes": []}"#;
        let doc: TrieDocument = TrieDocument::from_json(json).unwrap();
        assert!(matches!(
            from_dict(&doc, &mut NodeCache::new()),
            Err(Error::DanglingReference { index: 3, .. })
        ));
    }

    #[test]
    fn test_cycle_rejected() {
        let json = r#"{"version": 1, "root": 0, "nodes": [
            {"children": [["a", 1]]},
            {"children": [["b", 0]]}
        ]}"#;
        let doc: TrieDocument = TrieDocument::from_json(json).unwrap();
        assert!(matches!(
            from_dict(&doc, &mut NodeCache::new()),
            Err(Error::CyclicReference { index: 0 })
        ));
    }

    #[test]
    fn test_duplicate_label_rejected() {
        let json = r#"{"version": 1, "root": 1, "nodes": [
            {"children": []},
            {"children": [["a", 0], ["a", 0]]}
        ]}"#;
        let doc: TrieDocument = TrieDocument::from_json(json).unwrap();
        assert!(matches!(
            from_dict(&doc, &mut NodeCache::new()),
            Err(Error::DuplicateLabel(label)) if label == "a"
        ));
    }

    #[test]
    fn test_missing_fields_rejected() {
        let missing_nodes = r#"{"version": 1, "root": 0}"#;
        assert!(matches!(
            TrieDocument::<AcceptInfo>::from_json(missing_nodes),
            Err(Error::Json(_))
        ));

        let missing_children = r#"{"version": 1, "root": 0, "nodes": [{}]}"#;
        assert!(TrieDocument::<AcceptInfo>::from_json(missing_children).is_err());
    }

    #[test]
    fn test_version_mismatch_rejected() {
        let mut cache = NodeCache::new();
        let root = cache.merge(&sample());
        let mut doc = to_dict(cache.node(root));
        doc.version = 99;

        assert!(matches!(
            from_dict(&doc, &mut cache),
            Err(Error::VersionMismatch {
                expected: 1,
                found: 99
            })
        ));
    }

    #[test]
    fn test_fingerprint_verified() {
        let mut cache = NodeCache::new();
        let root = cache.merge(&sample());
        let doc = to_dict(cache.node(root)).with_fingerprint(cache.fingerprint(root).unwrap());

        let mut fresh = NodeCache::new();
        assert!(from_dict(&doc, &mut fresh).is_ok());

        let mut tampered = doc.clone();
        tampered.nodes[0].accept = Some(AcceptInfo::new("%eax", "%ecx"));
        assert!(matches!(
            from_dict(&tampered, &mut NodeCache::new()),
            Err(Error::Corruption(_))
        ));

        let mut garbled = doc.clone();
        garbled.fingerprint = Some("not-hex".to_string());
        assert!(matches!(
            from_dict(&garbled, &mut NodeCache::new()),
            Err(Error::InvalidFingerprint(_))
        ));
    }

    #[test]
    fn test_json_roundtrip_of_document() {
        let mut cache = NodeCache::new();
        let root = cache.merge(&sample());
        let doc = to_dict(cache.node(root));

        let parsed: TrieDocument = TrieDocument::from_json(&doc.to_json(false).unwrap()).unwrap();
        assert_eq!(parsed, doc);
    }
}
