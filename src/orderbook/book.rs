//! Per-slot order book.
//!
//! ## Architecture
//!
//! One [`SlotBook`] holds both sides of a single ad slot's book, using the
//! same hybrid structure throughout the engine:
//!
//! - **Slab**: pre-allocatable storage, O(1) node operations
//! - **BTreeMap**: sorted price levels, O(log n) insertion, O(1) best level
//! - **HashMap**: order-id to slab-key index for O(1) lookup by id
//!
//! ## Price Ordering
//!
//! - **Bids**: high-to-low (best bid = highest price), keyed by
//!   `Reverse(price)`
//! - **Asks**: low-to-high (best ask = lowest price)
//!
//! Ties at one price break FIFO to the earliest order, which under the
//! per-slot serialisation guarantee is `created`-ascending.
//!
//! ## Expiry
//!
//! Orders are never eagerly reaped. Expired heads are purged lazily when
//! the best order is peeked, and snapshots skip expired entries.
//!
//! ## Example
//!
//! ```
//! use adx_engine::orderbook::SlotBook;
//! use adx_engine::types::{Order, Side};
//!
//! let mut book = SlotBook::with_capacity(1_000);
//!
//! book.insert(Order::limit(1, "dsp-1", 42, Side::Buy, 1_500, 10, 0, u64::MAX, 0));
//! book.insert(Order::limit(2, "ssp-1", 42, Side::Sell, 1_000, 10, 1, u64::MAX, 0));
//!
//! assert_eq!(book.best_bid(0).map(|o| o.limit_price), Some(1_500));
//! assert_eq!(book.best_ask(0).map(|o| o.limit_price), Some(1_000));
//! ```

use std::cmp::Reverse;
use std::collections::{BTreeMap, HashMap};

use slab::Slab;

use crate::orderbook::{OrderNode, PriceLevel};
use crate::types::{Order, OrderId, Price, Quantity, Side};

/// Both sides of one ad slot's limit order book.
#[derive(Debug, Default)]
pub struct SlotBook {
    /// Order storage shared by both sides
    orders: Slab<OrderNode>,

    /// Bid price levels, best (highest) first
    bids: BTreeMap<Reverse<Price>, PriceLevel>,

    /// Ask price levels, best (lowest) first
    asks: BTreeMap<Price, PriceLevel>,

    /// Order ID to slab key
    order_index: HashMap<OrderId, usize>,

    /// Number of resting bid orders
    bid_count: usize,

    /// Number of resting ask orders
    ask_count: usize,
}

impl SlotBook {
    /// Create a new empty book
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a book with pre-allocated order capacity
    pub fn with_capacity(order_capacity: usize) -> Self {
        Self {
            orders: Slab::with_capacity(order_capacity),
            bids: BTreeMap::new(),
            asks: BTreeMap::new(),
            order_index: HashMap::with_capacity(order_capacity),
            bid_count: 0,
            ask_count: 0,
        }
    }

    // ========================================================================
    // Size
    // ========================================================================

    /// Total resting orders on both sides
    #[inline]
    pub fn order_count(&self) -> usize {
        self.orders.len()
    }

    /// Number of resting bids
    #[inline]
    pub fn bid_count(&self) -> usize {
        self.bid_count
    }

    /// Number of resting asks
    #[inline]
    pub fn ask_count(&self) -> usize {
        self.ask_count
    }

    /// Whether both sides are empty
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    /// Whether an order id currently rests in this book
    #[inline]
    pub fn contains_order(&self, order_id: OrderId) -> bool {
        self.order_index.contains_key(&order_id)
    }

    // ========================================================================
    // Insertion
    // ========================================================================

    /// Insert a resting order at its price level tail.
    ///
    /// # Returns
    ///
    /// The slab key for the inserted order
    pub fn insert(&mut self, order: Order) -> usize {
        let order_id = order.order_id;
        let price = order.limit_price;
        let side = order.side;

        let key = self.orders.insert(OrderNode::new(order));
        self.order_index.insert(order_id, key);

        match side {
            Side::Buy => {
                let level = self
                    .bids
                    .entry(Reverse(price))
                    .or_insert_with(|| PriceLevel::new(price));
                level.push_back(key, &mut self.orders);
                self.bid_count += 1;
            }
            Side::Sell => {
                let level = self
                    .asks
                    .entry(price)
                    .or_insert_with(|| PriceLevel::new(price));
                level.push_back(key, &mut self.orders);
                self.ask_count += 1;
            }
        }

        key
    }

    // ========================================================================
    // Best Bid/Ask (with lazy expiry purge)
    // ========================================================================

    /// Slab key of the best live bid, purging expired heads on the way.
    pub fn best_bid_key(&mut self, now: u64) -> Option<usize> {
        loop {
            let key = self.bids.values().next().and_then(PriceLevel::peek_head)?;
            if self.orders[key].is_expired(now) {
                self.remove_key(key);
            } else {
                return Some(key);
            }
        }
    }

    /// Slab key of the best live ask, purging expired heads on the way.
    pub fn best_ask_key(&mut self, now: u64) -> Option<usize> {
        loop {
            let key = self.asks.values().next().and_then(PriceLevel::peek_head)?;
            if self.orders[key].is_expired(now) {
                self.remove_key(key);
            } else {
                return Some(key);
            }
        }
    }

    /// Best live bid order
    pub fn best_bid(&mut self, now: u64) -> Option<&Order> {
        let key = self.best_bid_key(now)?;
        self.orders.get(key).map(|n| &n.order)
    }

    /// Best live ask order
    pub fn best_ask(&mut self, now: u64) -> Option<&Order> {
        let key = self.best_ask_key(now)?;
        self.orders.get(key).map(|n| &n.order)
    }

    /// Get an order by slab key
    #[inline]
    pub fn order(&self, key: usize) -> Option<&Order> {
        self.orders.get(key).map(|n| &n.order)
    }

    // ========================================================================
    // Fills and Removal
    // ========================================================================

    /// Decrement an order by slab key; pop it once empty.
    ///
    /// The price level total is kept in sync and emptied levels are
    /// removed, so the book stays sorted and minimal after every mutation.
    ///
    /// # Returns
    ///
    /// The actual quantity filled (zero for a stale key)
    pub fn fill_key(&mut self, key: usize, qty: Quantity) -> Quantity {
        let Some(node) = self.orders.get_mut(key) else {
            return 0;
        };
        let actual = node.fill(qty);
        let price = node.price();
        let side = node.order.side;
        let filled = node.is_filled();

        match side {
            Side::Buy => {
                if let Some(level) = self.bids.get_mut(&Reverse(price)) {
                    level.reduce_quantity(actual);
                }
            }
            Side::Sell => {
                if let Some(level) = self.asks.get_mut(&price) {
                    level.reduce_quantity(actual);
                }
            }
        }

        if filled {
            self.remove_key(key);
        }

        actual
    }

    /// Decrement an order by id; pop it once empty.
    pub fn fill_by_id(&mut self, order_id: OrderId, qty: Quantity) -> Quantity {
        match self.order_index.get(&order_id).copied() {
            Some(key) => self.fill_key(key, qty),
            None => 0,
        }
    }

    /// Unlink and remove an order by slab key.
    ///
    /// # Returns
    ///
    /// The removed order, or None for a stale key
    pub fn remove_key(&mut self, key: usize) -> Option<Order> {
        let node = self.orders.get(key)?;
        let order_id = node.order_id();
        let price = node.price();
        let side = node.order.side;

        match side {
            Side::Buy => {
                let emptied = if let Some(level) = self.bids.get_mut(&Reverse(price)) {
                    level.remove(key, &mut self.orders);
                    self.bid_count -= 1;
                    level.is_empty()
                } else {
                    false
                };
                if emptied {
                    self.bids.remove(&Reverse(price));
                }
            }
            Side::Sell => {
                let emptied = if let Some(level) = self.asks.get_mut(&price) {
                    level.remove(key, &mut self.orders);
                    self.ask_count -= 1;
                    level.is_empty()
                } else {
                    false
                };
                if emptied {
                    self.asks.remove(&price);
                }
            }
        }

        self.order_index.remove(&order_id);
        Some(self.orders.remove(key).order)
    }

    // ========================================================================
    // Snapshots (for batch clearing)
    // ========================================================================

    /// Live bids in matching order: price descending, FIFO within price.
    ///
    /// Expired orders are skipped (not removed); the clone decouples the
    /// clearing algorithm from book mutation.
    pub fn snapshot_bids(&self, now: u64) -> Vec<Order> {
        Self::collect_live(self.bids.values(), &self.orders, now)
    }

    /// Live asks in matching order: price ascending, FIFO within price.
    pub fn snapshot_asks(&self, now: u64) -> Vec<Order> {
        Self::collect_live(self.asks.values(), &self.orders, now)
    }

    fn collect_live<'a>(
        levels: impl Iterator<Item = &'a PriceLevel>,
        slab: &Slab<OrderNode>,
        now: u64,
    ) -> Vec<Order> {
        let mut out = Vec::new();
        for level in levels {
            let mut cursor = level.head;
            while let Some(key) = cursor {
                let node = &slab[key];
                if !node.is_expired(now) {
                    out.push(node.order.clone());
                }
                cursor = node.next;
            }
        }
        out
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
