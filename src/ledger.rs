//! Per-index claim bits.
//!
//! Two bits per leaf, packed into `AtomicU64` words: `reserved` is taken by
//! the one claim allowed to pay an index, `claimed` is set once that claim is
//! recorded for good. Taking a reservation is a single `fetch_or`, so two
//! claims for the same index can never both win, and claims for different
//! indices never wait on each other.

use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug)]
pub struct ClaimLedger {
    reserved: Vec<AtomicU64>,
    claimed: Vec<AtomicU64>,
    len: usize,
}

fn bitset(len: usize) -> Vec<AtomicU64> {
    (0..len.div_ceil(64)).map(|_| AtomicU64::new(0)).collect()
}

impl ClaimLedger {
    /// A ledger for `len` indices, all unclaimed.
    pub fn new(len: usize) -> Self {
        Self {
            reserved: bitset(len),
            claimed: bitset(len),
            len,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn contains(&self, index: u64) -> bool {
        index < self.len as u64
    }

    pub fn is_claimed(&self, index: u64) -> bool {
        self.test(&self.claimed, index)
    }

    /// Reserved by a claim whose outcome is not recorded yet.
    pub fn is_pending(&self, index: u64) -> bool {
        self.test(&self.reserved, index) && !self.is_claimed(index)
    }

    /// Reserve `index` for the calling claim.
    ///
    /// Returns `true` only for the caller that performed the transition; every
    /// later caller sees `false` until the reservation is released.
    pub fn try_claim(&self, index: u64) -> bool {
        match self.slot(&self.reserved, index) {
            Some((word, mask)) => (word.fetch_or(mask, Ordering::AcqRel) & mask) == 0,
            None => false,
        }
    }

    /// Record a reserved index as claimed for good.
    pub(crate) fn settle(&self, index: u64) {
        if let Some((word, mask)) = self.slot(&self.claimed, index) {
            word.fetch_or(mask, Ordering::AcqRel);
        }
    }

    /// Drop the reservation of a claim whose transfer was rolled back.
    pub(crate) fn release(&self, index: u64) {
        if let Some((word, mask)) = self.slot(&self.reserved, index) {
            word.fetch_and(!mask, Ordering::AcqRel);
        }
    }

    pub fn claimed_count(&self) -> usize {
        self.claimed
            .iter()
            .map(|word| word.load(Ordering::Acquire).count_ones() as usize)
            .sum()
    }

    fn test(&self, words: &[AtomicU64], index: u64) -> bool {
        match self.slot(words, index) {
            Some((word, mask)) => (word.load(Ordering::Acquire) & mask) != 0,
            None => false,
        }
    }

    fn slot<'a>(&self, words: &'a [AtomicU64], index: u64) -> Option<(&'a AtomicU64, u64)> {
        if !self.contains(index) {
            return None;
        }
        let word = &words[(index / 64) as usize];
        Some((word, 1u64 << (index % 64)))
    }
}
