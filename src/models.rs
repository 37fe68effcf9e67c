use distributor_common::{Address, hex_to_address, hex_to_bytes32};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// One line of the allocation file. Its position in the file is its index.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Allocation {
    pub account: String,
    pub amount: u64,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ClaimRequest {
    pub index: u64,
    pub account: String,
    pub amount: u64,
    pub proof: Vec<String>,
}

impl ClaimRequest {
    /// Decode the hex fields into the raw account and proof digests.
    pub fn decode(&self) -> Result<(Address, Vec<[u8; 32]>)> {
        let account = hex_to_address(&self.account)
            .map_err(|e| Error::Hex(format!("account '{}': {}", self.account, e)))?;

        let proof = self
            .proof
            .iter()
            .enumerate()
            .map(|(i, sibling)| {
                hex_to_bytes32(sibling)
                    .map_err(|e| Error::Hex(format!("proof[{i}] '{sibling}': {e}")))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok((account, proof))
    }
}

#[derive(Serialize, Deserialize, Debug)]
pub struct ClaimResponse {
    pub claimed: bool,
    pub index: u64,
    pub account: String,
    pub amount: u64,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct ProofResponse {
    pub index: u64,
    pub account: String,
    pub amount: u64,
    pub proof: Vec<String>,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct RootResponse {
    pub merkle_root: String,
    pub leaf_count: usize,
    pub depth: usize,
    pub claimed_count: usize,
    /// Asset claims are paid in.
    pub asset: String,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct ClaimedResponse {
    pub index: u64,
    pub claimed: bool,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct BalanceResponse {
    pub account: String,
    pub balance: u64,
}
