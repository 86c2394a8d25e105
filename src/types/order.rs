//! Order types for the exchange matching engine.
//!
//! ## Order Kinds
//!
//! Every order names one of five execution mechanisms via [`OrderType`]:
//!
//! - `Limit` rests in the slot's book until matched or expired
//! - `Market` crosses the book immediately and never rests
//! - `CommitReveal` enters the sealed-bid arena carrying only a commitment
//! - `AmmSwap` trades against the slot's liquidity pool
//! - `FlashCover` requests intra-batch inventory coverage
//!
//! Each variant carries only the data its mechanism needs; `CommitReveal`
//! is the only one with a payload (the 32-byte commitment).
//!
//! ## Fixed-Point Representation
//!
//! `limit_price` is CPM in quote wei (10^18 scale); `quantity` is a whole
//! impression count. Timestamps are nanoseconds on the engine clock.

use serde::{Deserialize, Serialize};

use crate::types::{OrderId, Price, Quantity, SlotId};

// ============================================================================
// Side enum
// ============================================================================

/// Order side: Buy (demand for impressions) or Sell (supply).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Side {
    /// Buy order (bid) - an advertiser bidding for impressions
    #[default]
    Buy,
    /// Sell order (ask) - a publisher offering impressions
    Sell,
}

impl Side {
    /// Returns the opposite side
    pub fn opposite(self) -> Self {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }
}

// ============================================================================
// OrderType enum
// ============================================================================

/// Execution mechanism for an order.
///
/// The engine facade dispatches on this tag; variants carry only the
/// fields their mechanism uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderType {
    /// Resting limit order, matched by price-time priority
    Limit,
    /// Immediate-execution order, never rests in the book
    Market,
    /// Sealed bid: only the commitment is visible until reveal
    CommitReveal {
        /// Hash of the bid price concatenated with a nonce
        commit_hash: [u8; 32],
    },
    /// Swap against the slot's constant-product pool
    AmmSwap,
    /// Flash inventory coverage (settled by an external collaborator)
    FlashCover,
}

// ============================================================================
// Order struct
// ============================================================================

/// A single side of a prospective trade against one ad slot.
///
/// ## Lifecycle
///
/// Created by the caller, validated by the engine facade, then resides in
/// a book or the commit arena until fully filled or expired. `quantity`
/// is decremented in place as fills execute.
///
/// ## Example
///
/// ```
/// use adx_engine::types::{Order, Side};
///
/// // Bid for 10 impressions at 1500 wei CPM, valid for one second
/// let order = Order::limit(1, "dsp-7", 42, Side::Buy, 1_500, 10, 0, 1_000_000_000, 0xBEEF);
/// assert_eq!(order.quantity, 10);
/// assert!(order.is_buy());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    /// Unique order identifier (assigned by the caller)
    pub order_id: OrderId,

    /// Trader account identifier
    pub trader: String,

    /// The ad slot this order targets
    pub slot_id: SlotId,

    /// Buy (bid) or Sell (ask)
    pub side: Side,

    /// Execution mechanism tag
    pub kind: OrderType,

    /// Max price for bids, min price for asks (wei CPM).
    /// For sealed bids this is the max collateral, not a matching price.
    pub limit_price: Price,

    /// Remaining impressions; decremented as the order fills
    pub quantity: Quantity,

    /// Creation timestamp (engine clock, nanoseconds)
    pub created: u64,

    /// Expiry timestamp; the order is dead once `now > expires`
    pub expires: u64,

    /// Targeting predicate hash; must equal the slot's for book orders
    pub targeting_hash: u64,
}

impl Order {
    /// Create a resting limit order
    #[allow(clippy::too_many_arguments)]
    pub fn limit(
        order_id: OrderId,
        trader: &str,
        slot_id: SlotId,
        side: Side,
        limit_price: Price,
        quantity: Quantity,
        created: u64,
        expires: u64,
        targeting_hash: u64,
    ) -> Self {
        Self {
            order_id,
            trader: trader.to_string(),
            slot_id,
            side,
            kind: OrderType::Limit,
            limit_price,
            quantity,
            created,
            expires,
            targeting_hash,
        }
    }

    /// Create a market order (crosses immediately, never rests)
    #[allow(clippy::too_many_arguments)]
    pub fn market(
        order_id: OrderId,
        trader: &str,
        slot_id: SlotId,
        side: Side,
        quantity: Quantity,
        created: u64,
        expires: u64,
        targeting_hash: u64,
    ) -> Self {
        Self {
            kind: OrderType::Market,
            ..Self::limit(
                order_id,
                trader,
                slot_id,
                side,
                0,
                quantity,
                created,
                expires,
                targeting_hash,
            )
        }
    }

    /// Create a sealed commit-reveal bid carrying only its commitment
    #[allow(clippy::too_many_arguments)]
    pub fn sealed(
        order_id: OrderId,
        trader: &str,
        slot_id: SlotId,
        max_collateral: Price,
        quantity: Quantity,
        commit_hash: [u8; 32],
        created: u64,
        expires: u64,
        targeting_hash: u64,
    ) -> Self {
        Self {
            kind: OrderType::CommitReveal { commit_hash },
            ..Self::limit(
                order_id,
                trader,
                slot_id,
                Side::Buy,
                max_collateral,
                quantity,
                created,
                expires,
                targeting_hash,
            )
        }
    }

    /// Create an AMM swap order. `side == Buy` deposits quote and
    /// withdraws impressions; `Sell` does the reverse.
    #[allow(clippy::too_many_arguments)]
    pub fn swap(
        order_id: OrderId,
        trader: &str,
        slot_id: SlotId,
        side: Side,
        quantity: Quantity,
        created: u64,
        expires: u64,
    ) -> Self {
        Self {
            kind: OrderType::AmmSwap,
            ..Self::limit(order_id, trader, slot_id, side, 0, quantity, created, expires, 0)
        }
    }

    /// Whether this is a bid
    #[inline]
    pub fn is_buy(&self) -> bool {
        self.side == Side::Buy
    }

    /// Whether the order has expired at `now`
    #[inline]
    pub fn is_expired(&self, now: u64) -> bool {
        now > self.expires
    }

    /// The commitment, if this is a sealed bid
    #[inline]
    pub fn commit_hash(&self) -> Option<&[u8; 32]> {
        match &self.kind {
            OrderType::CommitReveal { commit_hash } => Some(commit_hash),
            _ => None,
        }
    }

    /// Check if the order is fully filled
    #[inline]
    pub fn is_filled(&self) -> bool {
        self.quantity == 0
    }

    /// Fill a portion of this order, decrementing its quantity.
    ///
    /// # Returns
    ///
    /// The actual quantity filled (capped at what remains)
    pub fn fill(&mut self, fill_qty: Quantity) -> Quantity {
        let actual = fill_qty.min(self.quantity);
        self.quantity -= actual;
        actual
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
