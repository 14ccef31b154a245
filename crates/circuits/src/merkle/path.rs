//! Merkle paths and root recomputation.

use ark_bn254::Fr;
use serde::{Deserialize, Serialize};

use crate::constants::MERKLE_DEPTH;
use crate::error::{Result, WalletError};
use crate::field::{decimal_u64, field_decimal_vec, field_to_decimal};
use crate::hasher::FieldHasher;

/// Position of a leaf and its siblings from the leaf level up to the root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MerklePath {
    #[serde(with = "decimal_u64")]
    pub leaf_index: u64,
    #[serde(with = "field_decimal_vec")]
    pub siblings: Vec<Fr>,
}

impl MerklePath {
    pub fn new(leaf_index: u64, siblings: Vec<Fr>) -> Self {
        Self {
            leaf_index,
            siblings,
        }
    }

    /// Whether bit `level` of the leaf index is set.
    pub fn is_right(&self, level: usize) -> bool {
        (self.leaf_index >> level) & 1 == 1
    }

    /// Check sibling count and index range for a tree of `depth` levels.
    pub fn validate(&self, depth: usize) -> Result<()> {
        if self.siblings.len() != depth {
            return Err(WalletError::MalformedMerklePath(format!(
                "expected {} siblings, got {}",
                depth,
                self.siblings.len()
            )));
        }
        if depth < 64 && self.leaf_index >> depth != 0 {
            return Err(WalletError::MalformedMerklePath(format!(
                "leaf index {} does not fit in a tree of depth {}",
                self.leaf_index, depth
            )));
        }
        Ok(())
    }
}

/// Recompute the root of a [`MERKLE_DEPTH`]-level tree.
///
/// At level `i`, a set bit `i` of the leaf index gives `H([hash, sibling])`,
/// a clear bit gives `H([sibling, hash])`.
pub fn compute_root(hasher: &dyn FieldHasher, leaf: Fr, path: &MerklePath) -> Result<Fr> {
    compute_root_at_depth(hasher, leaf, path, MERKLE_DEPTH)
}

/// [`compute_root`] for a tree of arbitrary depth.
pub fn compute_root_at_depth(
    hasher: &dyn FieldHasher,
    leaf: Fr,
    path: &MerklePath,
    depth: usize,
) -> Result<Fr> {
    path.validate(depth)?;

    let mut current = leaf;
    for (level, sibling) in path.siblings.iter().enumerate() {
        current = if path.is_right(level) {
            hasher.hash(&[current, *sibling])
        } else {
            hasher.hash(&[*sibling, current])
        };
    }
    Ok(current)
}

/// Recompute the root and require it to equal `expected`.
///
/// Returns the authenticated root on success.
pub fn verify_root(
    hasher: &dyn FieldHasher,
    leaf: Fr,
    path: &MerklePath,
    expected: Fr,
) -> Result<Fr> {
    let computed = compute_root(hasher, leaf, path)?;
    if computed != expected {
        return Err(WalletError::MerkleVerificationFailed {
            expected: field_to_decimal(&expected),
            computed: field_to_decimal(&computed),
        });
    }
    Ok(computed)
}
