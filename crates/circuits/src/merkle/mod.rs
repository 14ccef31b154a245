//! Authentication of a wallet commitment against the global commitment tree.
//!
//! This module provides:
//! - [`MerklePath`] and root recomputation from a leaf and its siblings
//! - [`CommitmentTree`], an in-memory sparse tree that hands out paths

mod path;
mod tree;


pub use path::{compute_root, compute_root_at_depth, verify_root, MerklePath};
pub use tree::CommitmentTree;
