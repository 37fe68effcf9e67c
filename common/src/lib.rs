//! Shared Merkle distribution primitives.
//!
//! Leaf encoding, tree construction and proof verification live here so the
//! claim service and any off-line tooling compute exactly the same digests.

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

pub mod hex;
pub mod leaf;
pub mod tree;
pub mod verify;

pub use hex::{HexError, hex_to_address, hex_to_bytes32};
pub use leaf::{Address, LEAF_ENCODING_LEN, encode_leaf, hash_bytes, hash_leaf, hash_pair};
pub use tree::{Entry, MerkleTree, TreeError};
pub use verify::{compute_root, verify};
