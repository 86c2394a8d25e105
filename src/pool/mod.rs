//! Constant-product liquidity pool per ad slot.
//!
//! ## Model
//!
//! Each pool holds a pair of reserves: quote currency (wei) and slot
//! supply (impressions). Swaps preserve the invariant
//! `k = reserve_quote * reserve_supply`, modulo floor division; only
//! liquidity changes move `k`. All invariant math is done in 128 bits so
//! wei-scale reserves cannot overflow.
//!
//! ## Rounding
//!
//! The post-swap reserve on the withdrawn side is `k / new_deposit_side`,
//! floor-divided. The payout is the reserve delta, so the pool's product
//! after a swap is at most `k`, short by less than one divisor unit. LP
//! share issuance is an external collaborator's concern; the core only
//! tracks reserves.

use serde::{Deserialize, Serialize};

use crate::types::{EngineError, Order, Price, Quantity, SlotId};

/// Constant-product reserves for one slot.
///
/// ## Example
///
/// ```
/// use adx_engine::pool::AmmPool;
///
/// let mut pool = AmmPool::new(42);
/// pool.add_liquidity(1_000_000, 1_000);
///
/// // Deposit 10_000 quote, withdraw impressions
/// let out = pool.quote_swap(10_000, false);
/// assert_eq!(out, 10);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AmmPool {
    /// Slot this pool provides liquidity for
    pub slot_id: SlotId,

    /// Quote-currency reserve (wei)
    pub reserve_quote: Price,

    /// Impression reserve
    pub reserve_supply: Quantity,

    /// Marginal price after the last reserve change (quote / supply)
    pub last_price: Price,
}

impl AmmPool {
    /// Create an empty pool for a slot
    pub fn new(slot_id: SlotId) -> Self {
        Self {
            slot_id,
            reserve_quote: 0,
            reserve_supply: 0,
            last_price: 0,
        }
    }

    /// Whether both reserves are positive
    #[inline]
    pub fn has_liquidity(&self) -> bool {
        self.reserve_quote > 0 && self.reserve_supply > 0
    }

    /// Quote the output of a swap without executing it.
    ///
    /// `buy_quote == true` means the trader deposits `qty_in` impressions
    /// and withdraws quote; `false` means the trader deposits `qty_in`
    /// quote wei and withdraws impressions. Returns `0` when either
    /// reserve is empty.
    pub fn quote_swap(&self, qty_in: Quantity, buy_quote: bool) -> Price {
        if self.reserve_quote <= 0 || self.reserve_supply == 0 {
            return 0;
        }

        let k = (self.reserve_quote as u128) * (self.reserve_supply as u128);

        if buy_quote {
            let new_supply = self.reserve_supply as u128 + qty_in as u128;
            let new_quote = k / new_supply;
            (self.reserve_quote as u128 - new_quote) as Price
        } else {
            let new_quote = self.reserve_quote as u128 + qty_in as u128;
            let new_supply = k / new_quote;
            (self.reserve_supply as u128 - new_supply) as Price
        }
    }

    /// Execute a swap order against the pool.
    ///
    /// A buy order deposits quote and withdraws impressions; a sell order
    /// deposits impressions and withdraws quote. The reserve pair is
    /// mutated atomically: nothing changes on any failure path.
    ///
    /// # Returns
    ///
    /// The amount paid out (impressions for buys, quote wei for sells)
    pub fn swap(&mut self, order: &Order) -> Result<Price, EngineError> {
        let buy_quote = !order.is_buy();
        let out = self.quote_swap(order.quantity, buy_quote);
        if out <= 0 {
            // quote_swap only returns a non-positive amount on empty reserves
            return Err(EngineError::PoolEmpty(self.slot_id));
        }

        let (new_quote, new_supply) = if buy_quote {
            (
                self.reserve_quote - out,
                self.reserve_supply
                    .checked_add(order.quantity)
                    .expect("pool supply reserve overflow"),
            )
        } else {
            (
                self.reserve_quote
                    .checked_add(order.quantity as Price)
                    .expect("pool quote reserve overflow"),
                self.reserve_supply - out as Quantity,
            )
        };

        if new_supply == 0 {
            return Err(EngineError::PoolLiquidityExhausted(self.slot_id));
        }

        self.reserve_quote = new_quote;
        self.reserve_supply = new_supply;
        self.last_price = self.reserve_quote / self.reserve_supply as Price;

        Ok(out)
    }

    /// Deposit liquidity on both sides and refresh the marginal price.
    pub fn add_liquidity(&mut self, quote: Price, supply: Quantity) {
        self.reserve_quote = self
            .reserve_quote
            .checked_add(quote)
            .expect("pool quote reserve overflow");
        self.reserve_supply = self
            .reserve_supply
            .checked_add(supply)
            .expect("pool supply reserve overflow");
        if self.reserve_supply > 0 {
            self.last_price = self.reserve_quote / self.reserve_supply as Price;
        }
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Side;

    fn seeded_pool() -> AmmPool {
        let mut pool = AmmPool::new(42);
        pool.add_liquidity(1_000_000, 1_000);
        pool
    }

    fn swap_order(side: Side, quantity: Quantity) -> Order {
        Order::swap(1, "dsp-1", 42, side, quantity, 0, u64::MAX)
    }

    #[test]
    fn test_empty_pool_quotes_zero() {
        let pool = AmmPool::new(42);
        assert_eq!(pool.quote_swap(10_000, false), 0);
        assert_eq!(pool.quote_swap(10_000, true), 0);
        assert!(!pool.has_liquidity());
    }

    #[test]
    fn test_add_liquidity_sets_price() {
        let pool = seeded_pool();
        assert_eq!(pool.reserve_quote, 1_000_000);
        assert_eq!(pool.reserve_supply, 1_000);
        assert_eq!(pool.last_price, 1_000);
        assert!(pool.has_liquidity());
    }

    #[test]
    fn test_quote_buying_supply() {
        // k = 10^9; deposit 10_000 quote:
        // new_quote = 1_010_000, new_supply = floor(10^9 / 1_010_000) = 990
        // out = 1_000 - 990 = 10
        let pool = seeded_pool();
        assert_eq!(pool.quote_swap(10_000, false), 10);
    }

    #[test]
    fn test_quote_buying_quote() {
        // Deposit 10 impressions: new_supply = 1_010,
        // new_quote = floor(10^9 / 1_010) = 990_099, out = 9_901
        let pool = seeded_pool();
        assert_eq!(pool.quote_swap(10, true), 9_901);
    }

    #[test]
    fn test_swap_buy_executes_atomically() {
        let mut pool = seeded_pool();
        let out = pool.swap(&swap_order(Side::Buy, 10_000)).unwrap();

        assert_eq!(out, 10);
        assert_eq!(pool.reserve_quote, 1_010_000);
        assert_eq!(pool.reserve_supply, 990);
        assert_eq!(pool.last_price, 1_010_000 / 990);
    }

    #[test]
    fn test_swap_sell_executes_atomically() {
        let mut pool = seeded_pool();
        let out = pool.swap(&swap_order(Side::Sell, 10)).unwrap();

        assert_eq!(out, 9_901);
        assert_eq!(pool.reserve_quote, 990_099);
        assert_eq!(pool.reserve_supply, 1_010);
    }

    #[test]
    fn test_k_drift_is_floor_bounded() {
        let mut pool = seeded_pool();
        let k_before = (pool.reserve_quote as u128) * (pool.reserve_supply as u128);

        pool.swap(&swap_order(Side::Buy, 10_000)).unwrap();

        let k_after = (pool.reserve_quote as u128) * (pool.reserve_supply as u128);
        // Floor division shorts the product by less than one divisor unit
        assert!(k_after <= k_before);
        assert!(k_before - k_after < pool.reserve_quote as u128);
    }

    #[test]
    fn test_swap_on_empty_pool_fails() {
        let mut pool = AmmPool::new(42);
        assert_eq!(
            pool.swap(&swap_order(Side::Buy, 10_000)),
            Err(EngineError::PoolEmpty(42))
        );
    }

    #[test]
    fn test_dust_swap_rounds_against_pool() {
        // Floor division on the kept reserve means even 1 wei in pays out
        // a whole impression; the k drift stays under one divisor unit.
        let mut pool = seeded_pool();
        let out = pool.swap(&swap_order(Side::Buy, 1)).unwrap();

        assert_eq!(out, 1);
        assert_eq!(pool.reserve_quote, 1_000_001);
        assert_eq!(pool.reserve_supply, 999);
    }

    #[test]
    fn test_exhausting_swap_fails_without_mutating() {
        let mut pool = AmmPool::new(42);
        pool.add_liquidity(1_000, 2);
        let before = pool.clone();

        // Would drain the supply side to zero
        assert_eq!(
            pool.swap(&swap_order(Side::Buy, 1_000_000)),
            Err(EngineError::PoolLiquidityExhausted(42))
        );
        assert_eq!(pool, before);
    }
}
