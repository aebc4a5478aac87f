//! Operations over whole tries: diffing

mod diff;

pub use diff::{diff, ChangeKind, Diff, DiffEntry, DiffIter};
