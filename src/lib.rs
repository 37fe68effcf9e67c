pub mod app;
pub mod claim;
pub mod config;
pub mod error;
pub mod handlers;
pub mod ledger;
pub mod models;
pub mod transfer;
pub mod utils;

pub use app::{AppState, configure};
pub use claim::{ClaimEvent, ClaimService, TransferFailurePolicy};
pub use error::{Error, Result};
pub use ledger::ClaimLedger;
pub use transfer::{MintBook, Transfer, TransferError};
