//! Accept payloads carried by trie nodes

use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::Hash;

/// Anything a trie node can carry as its accept value.
///
/// The engine only compares, hashes, clones and prints payloads, so equality
/// must be structural: two payloads with equal fields are the same value.
pub trait Payload: Clone + Eq + Hash + fmt::Debug {}

impl<T: Clone + Eq + Hash + fmt::Debug> Payload for T {}

/// Register-rewrite rule attached to the end of an instruction byte path.
///
/// `input_rr` names the register the instruction requires to be sandboxed on
/// entry, `output_rr` the register it leaves restricted. Either side may be
/// absent.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AcceptInfo {
    #[serde(default)]
    pub input_rr: Option<String>,
    #[serde(default)]
    pub output_rr: Option<String>,
}

impl AcceptInfo {
    pub fn new(input_rr: impl Into<String>, output_rr: impl Into<String>) -> Self {
        AcceptInfo {
            input_rr: Some(input_rr.into()),
            output_rr: Some(output_rr.into()),
        }
    }

    /// A rule that neither requires nor restricts any register
    pub fn unrestricted() -> Self {
        AcceptInfo {
            input_rr: None,
            output_rr: None,
        }
    }
}

impl fmt::Display for AcceptInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "input_rr={} output_rr={}",
            self.input_rr.as_deref().unwrap_or("-"),
            self.output_rr.as_deref().unwrap_or("-")
        )
    }
}
