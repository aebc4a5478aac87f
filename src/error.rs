//! Error types for opcode_trie

use thiserror::Error;

/// Result type alias for opcode_trie operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in opcode_trie operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The same path was given two different accept values
    #[error("Conflicting accept at path [{path}]: existing {existing}, incoming {incoming}")]
    ConflictingAccept {
        path: String,
        existing: String,
        incoming: String,
    },

    /// A child reference points outside the document's node table
    #[error("Dangling node reference {index} (table has {table_len} nodes)")]
    DanglingReference { index: u32, table_len: usize },

    /// A node table entry reaches itself through its children
    #[error("Cyclic node reference through entry {index}")]
    CyclicReference { index: u32 },

    #[error("Duplicate edge label: {0}")]
    DuplicateLabel(String),

    #[error("Invalid record on line {line}: {message}")]
    InvalidRecord { line: usize, message: String },

    #[error("Invalid fingerprint: {0}")]
    InvalidFingerprint(String),

    #[error("Corruption detected: {0}")]
    Corruption(String),

    #[error("Version mismatch: expected {expected}, found {found}")]
    VersionMismatch { expected: u32, found: u32 },

    #[error("Config error: {0}")]
    Config(String),
}
