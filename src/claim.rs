use distributor_common::{Address, verify};
use std::str::FromStr;
use std::sync::Arc;
use tokio::sync::broadcast;

use crate::error::{Error, Result};
use crate::ledger::ClaimLedger;
use crate::transfer::Transfer;

const EVENT_CAPACITY: usize = 1024;

/// What happens to the ledger bit when the transfer after a verified claim fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TransferFailurePolicy {
    /// The bit stays set; the claim can never be retried.
    #[default]
    FailClosed,
    /// The bit is cleared so the claimant may try again.
    Rollback,
}

impl FromStr for TransferFailurePolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fail-closed" | "fail_closed" => Ok(Self::FailClosed),
            "rollback" => Ok(Self::Rollback),
            other => Err(format!(
                "unknown transfer failure policy '{other}', expected 'fail-closed' or 'rollback'"
            )),
        }
    }
}

/// Emitted once per successful claim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaimEvent {
    pub index: u64,
    pub account: Address,
    pub amount: u64,
}

/// Verifies claims against a trusted root and pays each index at most once.
pub struct ClaimService {
    merkle_root: [u8; 32],
    ledger: ClaimLedger,
    transfer: Arc<dyn Transfer>,
    policy: TransferFailurePolicy,
    events: broadcast::Sender<ClaimEvent>,
}

impl ClaimService {
    /// A fresh distribution over `leaf_count` indices, none claimed.
    pub fn new(
        merkle_root: [u8; 32],
        leaf_count: usize,
        transfer: Arc<dyn Transfer>,
        policy: TransferFailurePolicy,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            merkle_root,
            ledger: ClaimLedger::new(leaf_count),
            transfer,
            policy,
            events,
        }
    }

    pub fn merkle_root(&self) -> [u8; 32] {
        self.merkle_root
    }

    /// The asset claims are paid in.
    pub fn asset(&self) -> &str {
        self.transfer.asset()
    }

    /// Holdings of `account` as reported by the transfer capability.
    pub fn balance_of(&self, account: &Address) -> Option<u64> {
        self.transfer.balance(account)
    }

    pub fn leaf_count(&self) -> usize {
        self.ledger.len()
    }

    pub fn is_claimed(&self, index: u64) -> bool {
        self.ledger.is_claimed(index)
    }

    pub fn is_pending(&self, index: u64) -> bool {
        self.ledger.is_pending(index)
    }

    pub fn claimed_count(&self) -> usize {
        self.ledger.claimed_count()
    }

    /// Receive a `ClaimEvent` for every claim that completes after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<ClaimEvent> {
        self.events.subscribe()
    }

    /// Verify `(index, account, amount)` against the root, record the claim
    /// and pay it out.
    pub fn claim(
        &self,
        index: u64,
        account: &Address,
        amount: u64,
        proof: &[[u8; 32]],
    ) -> Result<ClaimEvent> {
        if self.ledger.is_claimed(index) {
            tracing::warn!("Rejected replay for index {}", index);
            return Err(Error::AlreadyClaimed { index });
        }

        if !self.ledger.contains(index)
            || !verify(index, account, amount, proof, &self.merkle_root)
        {
            tracing::warn!(
                "Rejected invalid proof for index {} (account 0x{}, amount {}, proof length {})",
                index,
                hex::encode(account),
                amount,
                proof.len()
            );
            return Err(Error::InvalidProof { index });
        }

        // Only one of several concurrent verified claims gets past this point.
        if !self.ledger.try_claim(index) {
            if self.ledger.is_claimed(index) {
                tracing::warn!("Lost claim race for index {}", index);
                return Err(Error::AlreadyClaimed { index });
            }
            tracing::warn!("Claim for index {} is still being paid out", index);
            return Err(Error::ClaimInProgress { index });
        }

        // Fail-closed records the claim before paying; rollback only once paid.
        if self.policy == TransferFailurePolicy::FailClosed {
            self.ledger.settle(index);
        }

        if let Err(e) = self.transfer.transfer(account, amount) {
            match self.policy {
                TransferFailurePolicy::FailClosed => {
                    tracing::error!(
                        "Transfer failed for index {}: {}. Claim stays recorded",
                        index,
                        e
                    );
                }
                TransferFailurePolicy::Rollback => {
                    self.ledger.release(index);
                    tracing::error!(
                        "Transfer failed for index {}: {}. Claim rolled back",
                        index,
                        e
                    );
                }
            }
            return Err(Error::Transfer(e));
        }

        if self.policy == TransferFailurePolicy::Rollback {
            self.ledger.settle(index);
        }

        let event = ClaimEvent {
            index,
            account: *account,
            amount,
        };
        tracing::info!(
            "Claimed: index={}, account=0x{}, amount={}",
            index,
            hex::encode(account),
            amount
        );
        if self.events.send(event.clone()).is_err() {
            tracing::trace!("No event subscribers for claim {}", index);
        }

        Ok(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transfer::{MintBook, TransferError};
    use distributor_common::{Entry, MerkleTree};
    use std::sync::Barrier;

    const A: Address = [0xaa; 20];
    const B: Address = [0xbb; 20];

    struct FailingTransfer;

    impl Transfer for FailingTransfer {
        fn transfer(&self, _account: &Address, _amount: u64) -> std::result::Result<(), TransferError> {
            Err(TransferError::new("minter role revoked"))
        }

        fn asset(&self) -> &str {
            "REVOKED"
        }
    }

    /// Parks inside `transfer` until the test lets it go, then fails.
    struct StalledTransfer {
        entered: Barrier,
        resume: Barrier,
    }

    impl StalledTransfer {
        fn new() -> Self {
            Self {
                entered: Barrier::new(2),
                resume: Barrier::new(2),
            }
        }
    }

    impl Transfer for StalledTransfer {
        fn transfer(&self, _account: &Address, _amount: u64) -> std::result::Result<(), TransferError> {
            self.entered.wait();
            self.resume.wait();
            Err(TransferError::new("vault offline"))
        }

        fn asset(&self) -> &str {
            "STALLED"
        }
    }

    fn two_account_tree() -> MerkleTree {
        MerkleTree::build(&[
            Entry { account: A, amount: 1 },
            Entry { account: B, amount: 1 },
        ])
        .unwrap()
    }

    fn service(tree: &MerkleTree, transfer: Arc<dyn Transfer>, policy: TransferFailurePolicy) -> ClaimService {
        ClaimService::new(tree.root(), tree.leaf_count(), transfer, policy)
    }

    #[test]
    fn test_successful_claim_pays_once() {
        let tree = two_account_tree();
        let mint = Arc::new(MintBook::new());
        let service = service(&tree, mint.clone(), TransferFailurePolicy::FailClosed);
        let proof0 = tree.proof(0).unwrap();

        assert_eq!(service.leaf_count(), 2);
        assert!(!service.is_claimed(0));
        let event = service.claim(0, &A, 1, &proof0).unwrap();
        assert_eq!(event, ClaimEvent { index: 0, account: A, amount: 1 });
        assert!(service.is_claimed(0));
        assert!(!service.is_claimed(1));
        assert_eq!(mint.balance_of(&A), 1);

        assert!(matches!(
            service.claim(0, &A, 1, &proof0),
            Err(Error::AlreadyClaimed { index: 0 })
        ));
        assert_eq!(mint.balance_of(&A), 1);
    }

    #[test]
    fn test_claims_are_independent_per_index() {
        let tree = two_account_tree();
        let service = service(&tree, Arc::new(MintBook::new()), TransferFailurePolicy::FailClosed);

        service.claim(1, &B, 1, &tree.proof(1).unwrap()).unwrap();
        service.claim(0, &A, 1, &tree.proof(0).unwrap()).unwrap();

        assert!(matches!(
            service.claim(1, &B, 1, &tree.proof(1).unwrap()),
            Err(Error::AlreadyClaimed { index: 1 })
        ));
        assert_eq!(service.claimed_count(), 2);
    }

    #[test]
    fn test_invalid_proofs_are_rejected_without_side_effects() {
        let tree = two_account_tree();
        let mint = Arc::new(MintBook::new());
        let service = service(&tree, mint.clone(), TransferFailurePolicy::FailClosed);
        let proof0 = tree.proof(0).unwrap();

        assert!(matches!(
            service.claim(1, &B, 1, &proof0),
            Err(Error::InvalidProof { index: 1 })
        ));
        assert!(matches!(
            service.claim(0, &A, 1, &[]),
            Err(Error::InvalidProof { index: 0 })
        ));
        assert!(matches!(
            service.claim(0, &A, 10, &proof0),
            Err(Error::InvalidProof { index: 0 })
        ));
        assert!(matches!(
            service.claim(5, &A, 1, &proof0),
            Err(Error::InvalidProof { index: 5 })
        ));

        assert_eq!(service.claimed_count(), 0);
        assert_eq!(mint.total_minted(), 0);
    }

    #[test]
    fn test_zero_root_rejects_everything() {
        let service = ClaimService::new(
            [0u8; 32],
            1,
            Arc::new(MintBook::new()),
            TransferFailurePolicy::FailClosed,
        );
        assert!(matches!(
            service.claim(0, &A, 10, &[]),
            Err(Error::InvalidProof { index: 0 })
        ));
    }

    #[test]
    fn test_transfer_failure_fail_closed_keeps_claim() {
        let tree = two_account_tree();
        let service = service(&tree, Arc::new(FailingTransfer), TransferFailurePolicy::FailClosed);
        let proof0 = tree.proof(0).unwrap();

        assert!(matches!(service.claim(0, &A, 1, &proof0), Err(Error::Transfer(_))));
        assert!(service.is_claimed(0));
        assert!(matches!(
            service.claim(0, &A, 1, &proof0),
            Err(Error::AlreadyClaimed { index: 0 })
        ));
    }

    #[test]
    fn test_transfer_failure_rollback_allows_retry() {
        let tree = two_account_tree();
        let service = service(&tree, Arc::new(FailingTransfer), TransferFailurePolicy::Rollback);
        let proof0 = tree.proof(0).unwrap();

        assert!(matches!(service.claim(0, &A, 1, &proof0), Err(Error::Transfer(_))));
        assert!(!service.is_claimed(0));
        assert!(matches!(service.claim(0, &A, 1, &proof0), Err(Error::Transfer(_))));
    }

    #[test]
    fn test_rollback_reports_claim_in_flight_as_in_progress() {
        let tree = two_account_tree();
        let transfer = Arc::new(StalledTransfer::new());
        let service = service(&tree, transfer.clone(), TransferFailurePolicy::Rollback);
        let proof0 = tree.proof(0).unwrap();

        std::thread::scope(|s| {
            let first = s.spawn(|| service.claim(0, &A, 1, &proof0));
            transfer.entered.wait();

            assert!(service.is_pending(0));
            assert!(!service.is_claimed(0));
            let second = service.claim(0, &A, 1, &proof0);
            assert!(matches!(second, Err(Error::ClaimInProgress { index: 0 })));

            transfer.resume.wait();
            assert!(matches!(first.join().unwrap(), Err(Error::Transfer(_))));
        });

        assert!(!service.is_claimed(0));
        assert!(!service.is_pending(0));
        assert_eq!(service.claimed_count(), 0);
    }

    #[test]
    fn test_fail_closed_reports_claim_in_flight_as_claimed() {
        let tree = two_account_tree();
        let transfer = Arc::new(StalledTransfer::new());
        let service = service(&tree, transfer.clone(), TransferFailurePolicy::FailClosed);
        let proof0 = tree.proof(0).unwrap();

        std::thread::scope(|s| {
            let first = s.spawn(|| service.claim(0, &A, 1, &proof0));
            transfer.entered.wait();

            assert!(service.is_claimed(0));
            assert!(matches!(
                service.claim(0, &A, 1, &proof0),
                Err(Error::AlreadyClaimed { index: 0 })
            ));

            transfer.resume.wait();
            assert!(matches!(first.join().unwrap(), Err(Error::Transfer(_))));
        });

        assert!(service.is_claimed(0));
    }

    #[test]
    fn test_service_reports_asset_and_balances() {
        let tree = two_account_tree();
        let minting = service(&tree, Arc::new(MintBook::for_asset("SUSHI-NFT")), TransferFailurePolicy::FailClosed);

        assert_eq!(minting.asset(), "SUSHI-NFT");
        assert_eq!(minting.merkle_root(), tree.root());
        minting.claim(0, &A, 1, &tree.proof(0).unwrap()).unwrap();
        assert_eq!(minting.balance_of(&A), Some(1));
        assert_eq!(minting.balance_of(&B), Some(0));

        let failing = service(&tree, Arc::new(FailingTransfer), TransferFailurePolicy::FailClosed);
        assert_eq!(failing.balance_of(&A), None);
    }

    #[test]
    fn test_concurrent_claims_pay_exactly_once() {
        let tree = two_account_tree();
        let mint = Arc::new(MintBook::new());
        let service = service(&tree, mint.clone(), TransferFailurePolicy::FailClosed);
        let proof0 = tree.proof(0).unwrap();

        let outcomes: Vec<Result<ClaimEvent>> = std::thread::scope(|s| {
            let handles: Vec<_> = (0..8)
                .map(|_| s.spawn(|| service.claim(0, &A, 1, &proof0)))
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert_eq!(outcomes.iter().filter(|r| r.is_ok()).count(), 1);
        assert!(outcomes.iter().filter_map(|r| r.as_ref().err()).all(|e| matches!(
            e,
            Error::AlreadyClaimed { index: 0 } | Error::ClaimInProgress { index: 0 }
        )));
        assert_eq!(mint.balance_of(&A), 1);
    }

    #[test]
    fn test_subscribers_see_claimed_events() {
        let tree = two_account_tree();
        let service = service(&tree, Arc::new(MintBook::new()), TransferFailurePolicy::FailClosed);
        let mut events = service.subscribe();

        service.claim(1, &B, 1, &tree.proof(1).unwrap()).unwrap();
        let _ = service.claim(1, &B, 1, &tree.proof(1).unwrap());

        assert_eq!(
            events.try_recv().unwrap(),
            ClaimEvent { index: 1, account: B, amount: 1 }
        );
        assert!(events.try_recv().is_err());
    }

    #[test]
    fn test_policy_from_str() {
        assert_eq!("fail-closed".parse::<TransferFailurePolicy>(), Ok(TransferFailurePolicy::FailClosed));
        assert_eq!(" Rollback ".parse::<TransferFailurePolicy>(), Ok(TransferFailurePolicy::Rollback));
        assert!("retry".parse::<TransferFailurePolicy>().is_err());
    }
}
