use distributor_common::{Entry, hash_bytes, hex_to_address, hex_to_bytes32};
use std::path::Path;

use crate::error::{Error, Result};
use crate::models::Allocation;

/// `0x`-prefixed lowercase hex.
pub fn to_hex(bytes: impl AsRef<[u8]>) -> String {
    format!("0x{}", hex::encode(bytes))
}

/// SHA-256 fingerprint of the raw allocation file, for the startup log.
pub fn compute_allocations_hash(raw: &[u8]) -> String {
    hex::encode(hash_bytes(raw))
}

/// Turn parsed allocations into tree entries, keeping their order.
pub fn parse_allocations(allocations: &[Allocation]) -> Result<Vec<Entry>> {
    allocations
        .iter()
        .enumerate()
        .map(|(index, allocation)| {
            let account = hex_to_address(&allocation.account).map_err(|e| {
                Error::Hex(format!(
                    "allocation {} has invalid account '{}': {}",
                    index, allocation.account, e
                ))
            })?;
            Ok(Entry {
                account,
                amount: allocation.amount,
            })
        })
        .collect()
}

/// Read a JSON allocation file into ordered entries.
pub fn load_allocations(path: &Path) -> Result<Vec<Entry>> {
    let raw = std::fs::read(path)?;
    tracing::info!(
        "Read allocation file {} ({} bytes, sha256 {})",
        path.display(),
        raw.len(),
        compute_allocations_hash(&raw)
    );
    let allocations: Vec<Allocation> = serde_json::from_slice(&raw)?;
    parse_allocations(&allocations)
}

/// Fail unless `configured` (hex) equals the root rebuilt from the allocations.
pub fn check_published_root(configured: &str, actual: &[u8; 32]) -> Result<()> {
    let expected = hex_to_bytes32(configured)
        .map_err(|e| Error::Hex(format!("configured merkle root '{configured}': {e}")))?;
    if expected != *actual {
        return Err(Error::RootMismatch {
            expected: to_hex(expected),
            actual: to_hex(actual),
        });
    }
    Ok(())
}
