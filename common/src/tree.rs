//! Binary Merkle tree over distribution entries.
//!
//! Leaf formula: `SHA256(word(index) || account || word(amount))`.
//! Internal nodes: `SHA256(left || right)`, where the node at the even
//! position of each pair is always `left`.
//! When a level has an odd number of nodes, the last node is paired with
//! itself.

use alloc::vec;
use alloc::vec::Vec;
use core::fmt;

use crate::leaf::{Address, hash_leaf, hash_pair};

/// One entitlement record. Its index is its position in the input sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Entry {
    pub account: Address,
    pub amount: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TreeError {
    Empty,
    IndexOutOfRange { index: u64, leaf_count: usize },
}

impl fmt::Display for TreeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TreeError::Empty => write!(f, "cannot build a merkle tree with zero entries"),
            TreeError::IndexOutOfRange { index, leaf_count } => write!(
                f,
                "index {index} is out of range for tree with {leaf_count} leaves"
            ),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for TreeError {}

/// An immutable binary Merkle tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MerkleTree {
    /// All nodes stored level by level, bottom-up. `layers[0]` = leaves.
    layers: Vec<Vec<[u8; 32]>>,
}

impl MerkleTree {
    /// Build a tree from entries, hashing each one with its positional index.
    pub fn build(entries: &[Entry]) -> Result<Self, TreeError> {
        let leaves = entries
            .iter()
            .enumerate()
            .map(|(index, entry)| hash_leaf(index as u64, &entry.account, entry.amount))
            .collect();
        Self::from_leaves(leaves)
    }

    /// Build a tree from pre-hashed leaves.
    pub fn from_leaves(leaves: Vec<[u8; 32]>) -> Result<Self, TreeError> {
        if leaves.is_empty() {
            return Err(TreeError::Empty);
        }

        let mut layers = vec![leaves];
        while let Some(prev) = layers.last().filter(|layer| layer.len() > 1) {
            let next_layer = prev
                .chunks(2)
                .map(|pair| match pair {
                    [left, right] => hash_pair(left, right),
                    [last] => hash_pair(last, last),
                    _ => unreachable!("chunks(2) yields one or two nodes"),
                })
                .collect();
            layers.push(next_layer);
        }

        Ok(Self { layers })
    }

    /// The root digest committing to every entry.
    pub fn root(&self) -> [u8; 32] {
        self.layers[self.layers.len() - 1][0]
    }

    pub fn leaf_count(&self) -> usize {
        self.layers[0].len()
    }

    /// Number of levels above the leaves; also the length of every proof.
    pub fn depth(&self) -> usize {
        self.layers.len() - 1
    }

    pub fn leaf(&self, index: u64) -> Option<[u8; 32]> {
        usize::try_from(index)
            .ok()
            .and_then(|i| self.layers[0].get(i))
            .copied()
    }

    /// Sibling digests from the leaf level up to (not including) the root.
    pub fn proof(&self, index: u64) -> Result<Vec<[u8; 32]>, TreeError> {
        let out_of_range = TreeError::IndexOutOfRange {
            index,
            leaf_count: self.leaf_count(),
        };
        let mut idx = usize::try_from(index).map_err(|_| out_of_range)?;
        if idx >= self.leaf_count() {
            return Err(out_of_range);
        }

        let mut siblings = Vec::with_capacity(self.depth());
        for layer in &self.layers[..self.depth()] {
            let sibling_idx = idx ^ 1;
            // A node without a right neighbour was hashed with itself.
            siblings.push(*layer.get(sibling_idx).unwrap_or(&layer[idx]));
            idx /= 2;
        }

        Ok(siblings)
    }
}
