//! Core data model types for opcode_trie

mod accept;
mod hash;

pub use accept::{AcceptInfo, Payload};
pub use hash::Fingerprint;
