//! Persistence of tries
//!
//! Canonical tries are stored as a node table document (see [`TrieDocument`])
//! rendered as JSON, optionally zstd-compressed. Input tables are read from
//! JSON Lines records.

mod document;
mod file_store;
mod records;

pub use document::{from_dict, to_dict, ChildRef, EncodedNode, TrieDocument};
pub use file_store::{is_compressed_path, read_document, write_document, WriteOptions};
pub use records::{build_trie, parse_records, read_records, PathRecord};
