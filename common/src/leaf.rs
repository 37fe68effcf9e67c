use sha2::{Digest, Sha256};

/// Raw 20-byte account identifier.
pub type Address = [u8; 20];

/// Byte length of an encoded leaf: `word(index) || account || word(amount)`.
pub const LEAF_ENCODING_LEN: usize = 32 + 20 + 32;

/// Left-pad a value into a 32-byte big-endian word.
fn word(value: u64) -> [u8; 32] {
    let mut padded = [0u8; 32];
    let bytes = value.to_be_bytes();
    padded[32 - bytes.len()..].copy_from_slice(&bytes);
    padded
}

/// Serialize one entitlement record into its fixed-width leaf preimage.
///
/// Every field has a fixed width, so distinct triples never share an encoding.
pub fn encode_leaf(index: u64, account: &Address, amount: u64) -> [u8; LEAF_ENCODING_LEN] {
    let mut out = [0u8; LEAF_ENCODING_LEN];
    out[..32].copy_from_slice(&word(index));
    out[32..52].copy_from_slice(account);
    out[52..].copy_from_slice(&word(amount));
    out
}

/// SHA-256 of arbitrary bytes.
pub fn hash_bytes(bytes: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hasher.finalize().into()
}

/// Leaf digest for `(index, account, amount)`.
pub fn hash_leaf(index: u64, account: &Address, amount: u64) -> [u8; 32] {
    hash_bytes(&encode_leaf(index, account, amount))
}

/// Hash two 32-byte values together, `left` first.
pub fn hash_pair(left: &[u8; 32], right: &[u8; 32]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(left);
    hasher.update(right);
    hasher.finalize().into()
}
