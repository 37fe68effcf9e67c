use crate::leaf::{Address, hash_leaf, hash_pair};

/// Deepest tree a `u64` index can address.
const MAX_PROOF_LEN: usize = 64;

/// Fold `proof` into `leaf`, taking left/right placement from the bits of
/// `index` (bit `k` set means the node is the right operand at level `k`).
///
/// Returns `None` when the proof is too long, or too short to account for
/// every set bit of `index`.
pub fn compute_root(index: u64, leaf: [u8; 32], proof: &[[u8; 32]]) -> Option<[u8; 32]> {
    if proof.len() > MAX_PROOF_LEN {
        return None;
    }

    let mut current = leaf;
    let mut idx = index;
    for sibling in proof {
        current = if idx & 1 == 0 {
            hash_pair(&current, sibling)
        } else {
            hash_pair(sibling, &current)
        };
        idx >>= 1;
    }

    (idx == 0).then_some(current)
}

/// Check that `(index, account, amount)` is committed to by `root`.
///
/// Never panics and never errors: any malformed input is just `false`.
pub fn verify(
    index: u64,
    account: &Address,
    amount: u64,
    proof: &[[u8; 32]],
    root: &[u8; 32],
) -> bool {
    let leaf = hash_leaf(index, account, amount);
    compute_root(index, leaf, proof).is_some_and(|candidate| candidate == *root)
}
