//! In-memory sparse commitment tree.
//!
//! Only written leaves and their ancestors are stored; every other node
//! takes the default hash of its level. The production tree lives in an
//! external service, this one backs tests and local tooling.

use std::collections::HashMap;

use ark_bn254::Fr;
use ark_ff::Zero;

use super::path::MerklePath;
use crate::constants::MERKLE_DEPTH;
use crate::error::{Result, WalletError};
use crate::hasher::FieldHasher;

/// Sparse Merkle tree of wallet commitments.
///
/// Hashing follows [`compute_root`](super::compute_root): a node with an odd
/// index hashes as `H([node, sibling])`, an even one as `H([sibling, node])`.
#[derive(Clone)]
pub struct CommitmentTree<H: FieldHasher> {
    hasher: H,

    /// Number of levels below the root
    depth: usize,

    /// Sparse node storage: (level, index) -> hash
    /// Level 0 = leaves, level `depth` = root
    nodes: HashMap<(usize, u64), Fr>,

    /// defaults[0] = zero leaf, defaults[i] = hash of two defaults[i-1]
    defaults: Vec<Fr>,

    /// Next free slot for [`CommitmentTree::append`]
    next_index: u64,
}

impl<H: FieldHasher> CommitmentTree<H> {
    /// Empty tree of [`MERKLE_DEPTH`] levels.
    pub fn new(hasher: H) -> Self {
        Self::with_depth(hasher, MERKLE_DEPTH)
    }

    pub fn with_depth(hasher: H, depth: usize) -> Self {
        let mut defaults = Vec::with_capacity(depth + 1);
        let mut current = Fr::zero();
        defaults.push(current);
        for _ in 0..depth {
            current = hasher.hash(&[current, current]);
            defaults.push(current);
        }

        Self {
            hasher,
            depth,
            nodes: HashMap::new(),
            defaults,
            next_index: 0,
        }
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    fn capacity_check(&self, index: u64) -> Result<()> {
        if self.depth < 64 && index >> self.depth != 0 {
            return Err(WalletError::MalformedMerklePath(format!(
                "leaf index {} does not fit in a tree of depth {}",
                index, self.depth
            )));
        }
        Ok(())
    }

    fn node(&self, level: usize, index: u64) -> Fr {
        self.nodes
            .get(&(level, index))
            .copied()
            .unwrap_or(self.defaults[level])
    }

    /// Write a leaf and recompute its ancestors. Returns the new root.
    pub fn insert(&mut self, index: u64, leaf: Fr) -> Result<Fr> {
        self.capacity_check(index)?;
        self.nodes.insert((0, index), leaf);

        let mut current_index = index;
        let mut current = leaf;
        for level in 0..self.depth {
            let sibling = self.node(level, current_index ^ 1);
            current = if current_index & 1 == 1 {
                self.hasher.hash(&[current, sibling])
            } else {
                self.hasher.hash(&[sibling, current])
            };
            current_index >>= 1;
            self.nodes.insert((level + 1, current_index), current);
        }

        if index >= self.next_index {
            self.next_index = index + 1;
        }
        Ok(current)
    }

    /// Write a leaf at the next free index. Returns that index.
    pub fn append(&mut self, leaf: Fr) -> Result<u64> {
        let index = self.next_index;
        self.insert(index, leaf)?;
        Ok(index)
    }

    pub fn leaf(&self, index: u64) -> Fr {
        self.node(0, index)
    }

    pub fn root(&self) -> Fr {
        self.node(self.depth, 0)
    }

    /// Sibling path for the leaf at `index`.
    pub fn path(&self, index: u64) -> Result<MerklePath> {
        self.capacity_check(index)?;
        let siblings = (0..self.depth)
            .map(|level| self.node(level, (index >> level) ^ 1))
            .collect();
        Ok(MerklePath::new(index, siblings))
    }
}
