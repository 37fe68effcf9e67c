//! The value-moving capability invoked after a claim is recorded.

use distributor_common::Address;
use std::collections::HashMap;
use std::fmt;
use std::sync::Mutex;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferError(String);

impl TransferError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }
}

impl fmt::Display for TransferError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for TransferError {}

/// Moves `amount` units to `account`.
///
/// The distributor assumes it already holds whatever authorization the
/// underlying asset requires.
pub trait Transfer: Send + Sync {
    fn transfer(&self, account: &Address, amount: u64) -> Result<(), TransferError>;

    /// Identifier of the asset this capability pays out.
    fn asset(&self) -> &str;

    /// Holdings of `account`, when the capability can report them.
    fn balance(&self, _account: &Address) -> Option<u64> {
        None
    }
}

pub const DEFAULT_ASSET: &str = "DROP";

/// In-process mint that records the balance of every account it pays.
#[derive(Debug)]
pub struct MintBook {
    asset: String,
    balances: Mutex<HashMap<Address, u64>>,
}

impl Default for MintBook {
    fn default() -> Self {
        Self::for_asset(DEFAULT_ASSET)
    }
}

impl MintBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn for_asset(asset: impl Into<String>) -> Self {
        Self {
            asset: asset.into(),
            balances: Mutex::new(HashMap::new()),
        }
    }

    pub fn balance_of(&self, account: &Address) -> u64 {
        let balances = self
            .balances
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        balances.get(account).copied().unwrap_or(0)
    }

    pub fn total_minted(&self) -> u128 {
        let balances = self
            .balances
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        balances.values().map(|v| u128::from(*v)).sum()
    }
}

impl Transfer for MintBook {
    fn transfer(&self, account: &Address, amount: u64) -> Result<(), TransferError> {
        let mut balances = self
            .balances
            .lock()
            .map_err(|_| TransferError::new("mint book lock poisoned"))?;
        let balance = balances.entry(*account).or_insert(0);
        *balance = balance
            .checked_add(amount)
            .ok_or_else(|| TransferError::new("balance overflow"))?;
        tracing::debug!(
            "Minted {} to 0x{} (balance {})",
            amount,
            hex::encode(account),
            *balance
        );
        Ok(())
    }

    fn asset(&self) -> &str {
        &self.asset
    }

    fn balance(&self, account: &Address) -> Option<u64> {
        Some(self.balance_of(account))
    }
}
