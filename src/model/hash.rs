//! Merkle fingerprints of canonical subtrees (BLAKE3)

use serde::{Deserialize, Serialize};
use std::fmt;

/// Digest of a subtree's content: its accept value, edge labels and the
/// fingerprints of its children. Ids never enter the hash.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fingerprint([u8; 32]);

impl Fingerprint {
    /// Fingerprint one node from its encoded accept value and its children.
    ///
    /// `children` come in stored order, which is part of the content. Each
    /// label is length-prefixed so `("ab", x)` and `("a", ..)("b", ..)`
    /// cannot collide.
    pub fn of_node<'a, I>(accept: &[u8], children: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a Fingerprint)>,
    {
        let mut hasher = blake3::Hasher::new();
        hasher.update(&(accept.len() as u64).to_le_bytes());
        hasher.update(accept);
        for (label, child) in children {
            hasher.update(&(label.len() as u64).to_le_bytes());
            hasher.update(label.as_bytes());
            hasher.update(&child.0);
        }
        Fingerprint(*hasher.finalize().as_bytes())
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse the 64-character form written into documents
    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        let mut bytes = [0u8; 32];
        hex::decode_to_slice(s, &mut bytes)?;
        Ok(Fingerprint(bytes))
    }

    /// First 12 hex characters, for log and error messages
    pub fn short(&self) -> String {
        hex::encode(&self.0[..6])
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fingerprint({})", self.short())
    }
}
