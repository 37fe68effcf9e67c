use std::env;
use std::path::PathBuf;

use crate::claim::TransferFailurePolicy;
use crate::transfer::DEFAULT_ASSET;

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub allocations_path: PathBuf,
    /// Published root the rebuilt tree must match, if one is configured.
    pub merkle_root: Option<String>,
    pub transfer_failure_policy: TransferFailurePolicy,
    /// Asset the in-process mint pays claims in.
    pub asset: String,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_vars(|key| env::var(key).ok())
    }

    /// Build a config from any variable source, falling back to defaults.
    pub fn from_vars(var: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let port = var("PORT")
            .and_then(|p| p.parse().ok())
            .unwrap_or(defaults.port);

        let allocations_path = var("ALLOCATIONS_PATH")
            .map(PathBuf::from)
            .unwrap_or(defaults.allocations_path);

        let merkle_root = var("MERKLE_ROOT").filter(|root| !root.trim().is_empty());

        let transfer_failure_policy = match var("TRANSFER_FAILURE_POLICY") {
            Some(value) => value.parse().unwrap_or_else(|e| {
                tracing::warn!("{}; using {:?}", e, defaults.transfer_failure_policy);
                defaults.transfer_failure_policy
            }),
            None => defaults.transfer_failure_policy,
        };

        let asset = var("ASSET")
            .map(|asset| asset.trim().to_string())
            .filter(|asset| !asset.is_empty())
            .unwrap_or(defaults.asset);

        Self {
            port,
            allocations_path,
            merkle_root,
            transfer_failure_policy,
            asset,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8080,
            allocations_path: PathBuf::from("allocations.json"),
            merkle_root: None,
            transfer_failure_policy: TransferFailurePolicy::FailClosed,
            asset: DEFAULT_ASSET.to_string(),
        }
    }
}
