//! Sealed-bid commit-reveal arena.
//!
//! ## Protocol
//!
//! ```text
//!         start_phase(slot, dur)
//! Idle ──────────────────────────▶ CommitPhase
//!                                      │ commit(order)      append sealed
//!                                      │ reveal(id, p, n)   open sealed
//!                                      ▼
//!         drain_revealed(slot)     Cleared ──▶ Idle
//! ```
//!
//! A single deadline bounds both commits and reveals: once
//! `now > deadline` the phase is closed to everything. Bidders therefore
//! reveal inside the same window they commit in, and the clearing pass
//! only ever sees hash-validated prices.
//!
//! ## Commitment Scheme
//!
//! The commitment is `hash(decimal_price ‖ nonce)` over UTF-8 bytes,
//! computed by an injected [`HashFn`]. The engine ships a SHA-256 helper
//! but never insists on it; validators supply their own.

use std::collections::HashMap;

use sha2::{Digest, Sha256};

use crate::types::{EngineError, Order, OrderId, Price, SlotId};

/// Injected commitment hash function.
pub type HashFn = Box<dyn Fn(&[u8]) -> [u8; 32] + Send + Sync>;

/// SHA-256 convenience implementation of [`HashFn`]'s contract.
///
/// # Example
///
/// ```
/// use adx_engine::auction::{commitment, sha256};
///
/// let digest = commitment(1_500, "nonce-1", &sha256);
/// assert_eq!(digest, sha256(b"1500nonce-1"));
/// ```
pub fn sha256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Build the commitment for a price and nonce.
///
/// The preimage is the decimal price string immediately followed by the
/// nonce, e.g. `"1500nonce-1"`.
pub fn commitment(price: Price, nonce: &str, hash_fn: &impl Fn(&[u8]) -> [u8; 32]) -> [u8; 32] {
    hash_fn(format!("{}{}", price, nonce).as_bytes())
}

/// A committed order plus its reveal state.
#[derive(Debug, Clone)]
pub struct SealedOrder {
    /// The committed order; `limit_price` is max collateral, not a bid
    pub order: Order,

    /// Set once the bidder has opened the commitment
    pub revealed: bool,

    /// The validated bid price (meaningful only when `revealed`)
    pub revealed_price: Price,
}

/// Per-slot sealed order storage and reveal validation.
#[derive(Default)]
pub struct CommitRevealArena {
    /// Sealed orders per slot, in commit order
    pending: HashMap<SlotId, Vec<SealedOrder>>,

    /// Phase deadline per slot (engine clock, nanoseconds)
    deadlines: HashMap<SlotId, u64>,
}

impl CommitRevealArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a commit phase, discarding any sealed orders from a previous
    /// phase on this slot.
    pub fn start_phase(&mut self, slot_id: SlotId, deadline_ns: u64) {
        self.pending.insert(slot_id, Vec::new());
        self.deadlines.insert(slot_id, deadline_ns);
    }

    /// The open phase's deadline, if one exists
    #[inline]
    pub fn deadline(&self, slot_id: SlotId) -> Option<u64> {
        self.deadlines.get(&slot_id).copied()
    }

    /// Number of sealed orders held for a slot
    pub fn pending_count(&self, slot_id: SlotId) -> usize {
        self.pending.get(&slot_id).map_or(0, Vec::len)
    }

    /// Append a sealed order to the slot's pending list.
    pub fn commit(&mut self, order: Order, now: u64) -> Result<(), EngineError> {
        let slot_id = order.slot_id;
        match self.deadlines.get(&slot_id) {
            Some(&deadline) if now <= deadline => {}
            _ => return Err(EngineError::CommitPhaseClosed(slot_id)),
        }

        self.pending
            .entry(slot_id)
            .or_default()
            .push(SealedOrder {
                order,
                revealed: false,
                revealed_price: 0,
            });
        Ok(())
    }

    /// Open a commitment.
    ///
    /// Recomputes `hash(revealed_price ‖ nonce)` with the injected hash
    /// and compares it to the stored commitment. Succeeds at most once
    /// per order, and only while the phase is open.
    pub fn reveal(
        &mut self,
        slot_id: SlotId,
        order_id: OrderId,
        revealed_price: Price,
        nonce: &str,
        hash_fn: &HashFn,
        now: u64,
    ) -> Result<(), EngineError> {
        match self.deadlines.get(&slot_id) {
            Some(&deadline) if now <= deadline => {}
            _ => return Err(EngineError::CommitPhaseClosed(slot_id)),
        }

        let sealed = self
            .pending
            .get_mut(&slot_id)
            .and_then(|orders| orders.iter_mut().find(|s| s.order.order_id == order_id))
            .ok_or(EngineError::CommitOrderMissing(order_id))?;

        let expected = sealed
            .order
            .commit_hash()
            .ok_or(EngineError::CommitOrderMissing(order_id))?;
        let computed = commitment(revealed_price, nonce, hash_fn);
        if &computed != expected {
            return Err(EngineError::CommitHashMismatch(order_id));
        }

        sealed.revealed = true;
        sealed.revealed_price = revealed_price;
        Ok(())
    }

    /// Close the phase and hand revealed bids to the clearing pass.
    ///
    /// Returns the revealed buy-side orders with `limit_price` replaced
    /// by the validated bid price, sorted highest bid first (FIFO on
    /// ties). Unrevealed and sell-side commits are dropped; the slot
    /// returns to Idle.
    pub fn drain_revealed(&mut self, slot_id: SlotId) -> Vec<Order> {
        self.deadlines.remove(&slot_id);
        let sealed = self.pending.remove(&slot_id).unwrap_or_default();

        let mut bids: Vec<Order> = sealed
            .into_iter()
            .filter(|s| s.revealed && s.order.is_buy())
            .map(|s| {
                let mut order = s.order;
                order.limit_price = s.revealed_price;
                order
            })
            .collect();

        bids.sort_by(|a, b| {
            b.limit_price
                .cmp(&a.limit_price)
                .then(a.created.cmp(&b.created))
        });
        bids
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn hash_fn() -> HashFn {
        Box::new(sha256)
    }

    fn sealed_bid(order_id: OrderId, price: Price, nonce: &str, created: u64) -> Order {
        let commit = commitment(price, nonce, &sha256);
        Order::sealed(order_id, "dsp-1", 42, 5_000, 10, commit, created, u64::MAX, 0xBEEF)
    }

    #[test]
    fn test_commitment_preimage() {
        // hash("1500" ‖ "nonce-1")
        assert_eq!(commitment(1_500, "nonce-1", &sha256), sha256(b"1500nonce-1"));
    }

    #[test]
    fn test_commit_requires_open_phase() {
        let mut arena = CommitRevealArena::new();

        assert_eq!(
            arena.commit(sealed_bid(1, 1_500, "n", 0), 10),
            Err(EngineError::CommitPhaseClosed(42))
        );

        arena.start_phase(42, 1_000);
        arena.commit(sealed_bid(1, 1_500, "n", 0), 10).unwrap();
        assert_eq!(arena.pending_count(42), 1);

        // Past the deadline the phase is closed to commits too
        assert_eq!(
            arena.commit(sealed_bid(2, 1_200, "n", 0), 1_001),
            Err(EngineError::CommitPhaseClosed(42))
        );
    }

    #[test]
    fn test_reveal_validates_commitment() {
        let mut arena = CommitRevealArena::new();
        let hashes = hash_fn();

        arena.start_phase(42, 1_000);
        arena.commit(sealed_bid(1, 1_500, "nonce-1", 0), 10).unwrap();

        // Wrong price
        assert_eq!(
            arena.reveal(42, 1, 1_400, "nonce-1", &hashes, 500),
            Err(EngineError::CommitHashMismatch(1))
        );
        // Wrong nonce
        assert_eq!(
            arena.reveal(42, 1, 1_500, "nonce-2", &hashes, 500),
            Err(EngineError::CommitHashMismatch(1))
        );
        // Correct opening
        arena.reveal(42, 1, 1_500, "nonce-1", &hashes, 500).unwrap();
    }

    #[test]
    fn test_reveal_after_deadline_is_closed() {
        let mut arena = CommitRevealArena::new();
        let hashes = hash_fn();

        arena.start_phase(42, 1_000);
        arena.commit(sealed_bid(1, 1_500, "nonce-1", 0), 10).unwrap();

        // Deadline is inclusive
        arena.reveal(42, 1, 1_500, "nonce-1", &hashes, 1_000).unwrap();

        arena.start_phase(42, 2_000);
        arena.commit(sealed_bid(2, 1_500, "nonce-1", 0), 1_500).unwrap();
        assert_eq!(
            arena.reveal(42, 2, 1_500, "nonce-1", &hashes, 2_001),
            Err(EngineError::CommitPhaseClosed(42))
        );
    }

    #[test]
    fn test_reveal_unknown_order() {
        let mut arena = CommitRevealArena::new();
        let hashes = hash_fn();

        arena.start_phase(42, 1_000);
        assert_eq!(
            arena.reveal(42, 9, 1_500, "n", &hashes, 500),
            Err(EngineError::CommitOrderMissing(9))
        );
    }

    #[test]
    fn test_start_phase_clears_previous() {
        let mut arena = CommitRevealArena::new();

        arena.start_phase(42, 1_000);
        arena.commit(sealed_bid(1, 1_500, "n", 0), 10).unwrap();

        arena.start_phase(42, 5_000);
        assert_eq!(arena.pending_count(42), 0);
        assert_eq!(arena.deadline(42), Some(5_000));
    }

    #[test]
    fn test_drain_drops_sell_side_commits() {
        use crate::types::Side;

        let mut arena = CommitRevealArena::new();
        let hashes = hash_fn();

        arena.start_phase(42, 1_000);

        // A sealed ask is stored like any commit, but demand is the only
        // sealed side of this market: it must never reach clearing.
        let sealed_ask = Order {
            side: Side::Sell,
            ..sealed_bid(1, 1_400, "ask-nonce", 0)
        };
        arena.commit(sealed_ask, 10).unwrap();
        arena.commit(sealed_bid(2, 1_500, "bid-nonce", 1), 10).unwrap();
        assert_eq!(arena.pending_count(42), 2);

        // Both open successfully; reveal does not discriminate by side
        arena.reveal(42, 1, 1_400, "ask-nonce", &hashes, 500).unwrap();
        arena.reveal(42, 2, 1_500, "bid-nonce", &hashes, 500).unwrap();

        let bids = arena.drain_revealed(42);
        assert_eq!(
            bids.iter().map(|o| o.order_id).collect::<Vec<_>>(),
            vec![2]
        );
    }

    #[test]
    fn test_drain_revealed_filters_and_sorts() {
        let mut arena = CommitRevealArena::new();
        let hashes = hash_fn();

        arena.start_phase(42, 1_000);
        arena.commit(sealed_bid(1, 1_200, "a", 0), 10).unwrap();
        arena.commit(sealed_bid(2, 1_500, "b", 1), 10).unwrap();
        arena.commit(sealed_bid(3, 1_300, "c", 2), 10).unwrap();

        arena.reveal(42, 1, 1_200, "a", &hashes, 500).unwrap();
        arena.reveal(42, 2, 1_500, "b", &hashes, 500).unwrap();
        // Order 3 never reveals

        let bids = arena.drain_revealed(42);
        assert_eq!(
            bids.iter().map(|o| o.order_id).collect::<Vec<_>>(),
            vec![2, 1]
        );
        // Revealed price replaces collateral as the matching price
        assert_eq!(bids[0].limit_price, 1_500);

        // The slot is back to Idle
        assert_eq!(arena.pending_count(42), 0);
        assert_eq!(arena.deadline(42), None);
    }
}
