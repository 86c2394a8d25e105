//! Uniform-price batch clearing.
//!
//! ## Algorithm
//!
//! 1. Sort bids by price descending, asks ascending (FIFO on price ties).
//! 2. Find the crossing point: the largest `k` such that the k-th highest
//!    bid still meets the k-th lowest ask.
//! 3. Clear all `k` pairs at one price, the floor midpoint of the last
//!    crossing pair. Fill quantity is the pairwise minimum.
//!
//! Because every order in the batch sees the same price and pairing is
//! decided purely by the sorted sequences, submission order inside a
//! batch has no effect on the outcome. That property is what defeats
//! intra-batch reordering games, and it is asserted by test.
//!
//! The functions here are pure over value sequences: they plan a clearing
//! without touching any book. The engine applies the plan, enforcing slot
//! capacity as it settles each fill.

use serde::{Deserialize, Serialize};

use crate::types::price::midpoint;
use crate::types::{Order, OrderId, Price, Quantity};

/// Outcome of one batch auction run.
///
/// `clearing_prices` and `clearing_quantities` are parallel to `matches`;
/// under uniform pricing every entry of `clearing_prices` is the same.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchAuctionResult {
    /// Matched (bid_id, ask_id) pairs
    pub matches: Vec<(OrderId, OrderId)>,

    /// Clearing price per match (all equal for uniform pricing)
    pub clearing_prices: Vec<Price>,

    /// Executed quantity per match
    pub clearing_quantities: Vec<Quantity>,

    /// Number of matched pairs
    pub total_matches: u64,

    /// Wall time spent clearing, microseconds
    pub processing_time_us: u64,
}

impl BatchAuctionResult {
    /// Whether the batch cleared nothing
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    /// Record one executed fill
    pub fn push_fill(&mut self, bid_id: OrderId, ask_id: OrderId, price: Price, qty: Quantity) {
        self.matches.push((bid_id, ask_id));
        self.clearing_prices.push(price);
        self.clearing_quantities.push(qty);
        self.total_matches += 1;
    }
}

/// A planned (not yet settled) fill from the clearing pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedFill {
    pub bid_id: OrderId,
    pub ask_id: OrderId,
    pub quantity: Quantity,
}

/// A complete clearing plan: one price, `k` pairwise fills.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClearingPlan {
    /// Uniform clearing price
    pub price: Price,

    /// Pairwise fills in priority order
    pub fills: Vec<PlannedFill>,
}

/// Sort orders into bid priority: price descending, then FIFO.
fn sort_bids(orders: &mut [Order]) {
    orders.sort_by(|a, b| {
        b.limit_price
            .cmp(&a.limit_price)
            .then(a.created.cmp(&b.created))
    });
}

/// Sort orders into ask priority: price ascending, then FIFO.
fn sort_asks(orders: &mut [Order]) {
    orders.sort_by(|a, b| {
        a.limit_price
            .cmp(&b.limit_price)
            .then(a.created.cmp(&b.created))
    });
}

/// Largest `k` such that the k-th best bid meets the k-th best ask.
///
/// Inputs must already be in priority order.
fn crossing_index(bids: &[Order], asks: &[Order]) -> usize {
    let mut k = 0;
    while k < bids.len() && k < asks.len() && bids[k].limit_price >= asks[k].limit_price {
        k += 1;
    }
    k
}

/// Plan a uniform-price clearing over resting orders.
///
/// Sorts both sides internally, so any permutation of the same order set
/// produces the identical plan. Returns `None` when no pair crosses;
/// that is the normal no-trade outcome, not an error.
///
/// Pairs whose targeting hashes differ are skipped. The books only admit
/// orders matching their slot's targeting, so this cannot fire there;
/// it guards the sealed-bid path, where bids are matched against asks
/// the arena never vetted.
///
/// # Example
///
/// ```
/// use adx_engine::auction::clear;
/// use adx_engine::types::{Order, Side};
///
/// let bids = vec![Order::limit(1, "d", 42, Side::Buy, 1_500, 10, 0, u64::MAX, 7)];
/// let asks = vec![Order::limit(2, "s", 42, Side::Sell, 1_100, 5, 1, u64::MAX, 7)];
///
/// let plan = clear(&bids, &asks).unwrap();
/// assert_eq!(plan.price, 1_300); // midpoint of the crossing pair
/// assert_eq!(plan.fills[0].quantity, 5);
/// ```
pub fn clear(bids: &[Order], asks: &[Order]) -> Option<ClearingPlan> {
    let mut bids = bids.to_vec();
    let mut asks = asks.to_vec();
    sort_bids(&mut bids);
    sort_asks(&mut asks);

    let k = crossing_index(&bids, &asks);
    if k == 0 {
        return None;
    }

    // All k pairs settle at the midpoint of the last crossing pair
    let price = midpoint(asks[k - 1].limit_price, bids[k - 1].limit_price);

    let fills = bids[..k]
        .iter()
        .zip(&asks[..k])
        .filter(|(bid, ask)| bid.targeting_hash == ask.targeting_hash)
        .map(|(bid, ask)| PlannedFill {
            bid_id: bid.order_id,
            ask_id: ask.order_id,
            quantity: bid.quantity.min(ask.quantity),
        })
        .collect();

    Some(ClearingPlan { price, fills })
}

// ============================================================================
// Unit Tests
// ============================================================================
