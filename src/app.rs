use actix_web::web;
use distributor_common::{Entry, MerkleTree};
use std::sync::Arc;

use crate::claim::{ClaimService, TransferFailurePolicy};
use crate::config::Config;
use crate::error::Result;
use crate::handlers;
use crate::transfer::{MintBook, Transfer};
use crate::utils::{check_published_root, load_allocations, to_hex};

/// Everything the handlers share: the immutable tree and the claim service.
pub struct AppState {
    pub entries: Vec<Entry>,
    pub tree: MerkleTree,
    pub service: ClaimService,
}

impl AppState {
    /// Build the tree over `entries` and start a distribution paying through a fresh `MintBook`.
    pub fn new(entries: Vec<Entry>, policy: TransferFailurePolicy) -> Result<Self> {
        Self::with_transfer(entries, Arc::new(MintBook::new()), policy)
    }

    pub fn with_transfer(
        entries: Vec<Entry>,
        transfer: Arc<dyn Transfer>,
        policy: TransferFailurePolicy,
    ) -> Result<Self> {
        let tree = MerkleTree::build(&entries)?;
        let service = ClaimService::new(tree.root(), tree.leaf_count(), transfer, policy);

        tracing::info!(
            "Built merkle tree: root={}, leaves={}, depth={}, asset={}",
            to_hex(tree.root()),
            tree.leaf_count(),
            tree.depth(),
            service.asset()
        );

        Ok(Self {
            entries,
            tree,
            service,
        })
    }

    /// Load allocations from the configured file and check the configured root.
    pub fn from_config(config: &Config) -> Result<Self> {
        let entries = load_allocations(&config.allocations_path)?;
        let mint = Arc::new(MintBook::for_asset(config.asset.as_str()));
        let state = Self::with_transfer(entries, mint, config.transfer_failure_policy)?;

        if let Some(root) = &config.merkle_root {
            check_published_root(root, &state.tree.root())?;
            tracing::info!("Rebuilt root matches configured MERKLE_ROOT");
        }

        Ok(state)
    }
}

/// Register every route on an actix app.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(handlers::health))
        .route("/root", web::get().to(handlers::root))
        .route("/proof/{index}", web::get().to(handlers::proof))
        .route("/claim", web::post().to(handlers::claim))
        .route("/claimed/{index}", web::get().to(handlers::is_claimed))
        .route("/balance/{account}", web::get().to(handlers::balance));
}
