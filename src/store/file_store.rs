//! Reading and writing trie documents on disk
//!
//! Documents are stored as JSON. Paths ending in `.zst` are written
//! zstd-compressed; on read, compression is detected from the frame magic so
//! either form loads regardless of the file name.

use super::TrieDocument;
use crate::Result;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;
use tracing::{debug, info};

/// Magic bytes opening every zstd frame
const ZSTD_MAGIC: [u8; 4] = [0x28, 0xB5, 0x2F, 0xFD];

/// Options for [`write_document`]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WriteOptions {
    /// Indent the JSON
    pub pretty: bool,
    /// zstd level used for `.zst` paths
    pub compression_level: i32,
}

impl Default for WriteOptions {
    fn default() -> Self {
        WriteOptions {
            pretty: false,
            compression_level: 3,
        }
    }
}

/// True if `path` should be written compressed
pub fn is_compressed_path(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "zst")
}

/// Write `doc` to `path`, compressing if the path ends in `.zst`
pub fn write_document<A: Serialize>(
    path: impl AsRef<Path>,
    doc: &TrieDocument<A>,
    options: &WriteOptions,
) -> Result<()> {
    let path = path.as_ref();
    let json = if options.pretty {
        serde_json::to_vec_pretty(doc)?
    } else {
        serde_json::to_vec(doc)?
    };

    let data = if is_compressed_path(path) {
        zstd::encode_all(json.as_slice(), options.compression_level)?
    } else {
        json
    };

    std::fs::write(path, &data)?;
    info!(
        path = %path.display(),
        bytes = data.len(),
        nodes = doc.node_count(),
        "wrote trie document"
    );
    Ok(())
}

/// Read a document written by [`write_document`]
pub fn read_document<A: DeserializeOwned>(path: impl AsRef<Path>) -> Result<TrieDocument<A>> {
    let path = path.as_ref();
    let data = std::fs::read(path)?;

    let json = if data.starts_with(&ZSTD_MAGIC) {
        debug!(path = %path.display(), "decompressing trie document");
        zstd::decode_all(data.as_slice())?
    } else {
        data
    };

    let doc: TrieDocument<A> = serde_json::from_slice(&json)?;
    debug!(path = %path.display(), nodes = doc.node_count(), "read trie document");
    Ok(doc)
}
