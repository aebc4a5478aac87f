//! JSON Lines input of `(path, accept)` records

use crate::model::AcceptInfo;
use crate::trie::{ConflictPolicy, Label, Node};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::io::BufRead;
use std::path::Path;
use tracing::debug;

/// One line of a records file:
/// `{"path": ["0f", "05"], "input_rr": "%eax", "output_rr": "%edx"}`
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathRecord {
    pub path: Vec<Label>,
    #[serde(flatten)]
    pub accept: AcceptInfo,
}

/// Parse records from a reader, skipping blank lines and `#` comments
pub fn parse_records(reader: impl BufRead) -> Result<Vec<PathRecord>> {
    let mut records = Vec::new();
    for (number, line) in reader.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let record = serde_json::from_str(trimmed).map_err(|e| Error::InvalidRecord {
            line: number + 1,
            message: e.to_string(),
        })?;
        records.push(record);
    }
    Ok(records)
}

/// Read a records file
pub fn read_records(path: impl AsRef<Path>) -> Result<Vec<PathRecord>> {
    let file = std::fs::File::open(path.as_ref())?;
    let records = parse_records(std::io::BufReader::new(file))?;
    debug!(path = %path.as_ref().display(), count = records.len(), "read path records");
    Ok(records)
}

/// Insert every record into a fresh uncompressed trie
pub fn build_trie(records: &[PathRecord], policy: ConflictPolicy) -> Result<Node> {
    let mut root = Node::new();
    for record in records {
        root.insert_with_policy(record.path.iter().cloned(), record.accept.clone(), policy)?;
    }
    Ok(root)
}
