//! Exchange engine facade.
//!
//! ## Responsibilities
//!
//! - Validate every order against the slot registry before routing
//! - Dispatch on [`OrderType`] to the owning mechanism: book, arena, or
//!   pool
//! - Settle fills: charge delivery to the slot and emit [`FillEvent`]s to
//!   the injected sink, fire-and-forget
//! - Keep monotonic throughput counters and a latency moving average
//!
//! ## Concurrency Model
//!
//! The engine is a single-writer core: all mutations for a slot happen on
//! the caller's thread, serialised per slot by construction. Stats
//! counters use relaxed atomics so readers never contend with the
//! matching path, and fill emission never blocks or back-pressures the
//! matcher.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crossbeam::channel::Sender;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::auction::{self, BatchAuctionResult, CommitRevealArena, HashFn};
use crate::clock::{Clock, NANOS_PER_MILLI};
use crate::engine::matcher;
use crate::orderbook::SlotBook;
use crate::pool::AmmPool;
use crate::registry::SlotRegistry;
use crate::types::{
    AdSlot, EngineError, FillEvent, Order, OrderId, OrderType, Price, Quantity, Side, SlotId,
};

/// Tunables for the engine core.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Pre-allocated order capacity for each new slot's book
    pub book_capacity: usize,

    /// Reject asks priced under their slot's floor at ingress
    pub reject_asks_below_floor: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            book_capacity: 1_024,
            reject_asks_below_floor: false,
        }
    }
}

/// Engine throughput and liquidity counters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EngineStats {
    /// Orders accepted across all mechanisms
    pub total_orders: u64,

    /// Fills emitted across all mechanisms
    pub total_matches: u64,

    /// Exponentially weighted moving average of operation latency
    pub avg_latency_us: f64,

    /// Registered slots still flagged active
    pub active_slots: u64,

    /// Pools with liquidity on both sides
    pub active_pools: u64,
}

/// The exchange matching engine.
///
/// One instance owns every slot's book, pool, and sealed-bid arena, plus
/// the slot registry. Construction injects the three external seams: the
/// commitment hash, the clock, and the fill sink.
///
/// ## Example
///
/// ```
/// use std::sync::Arc;
/// use adx_engine::auction::sha256;
/// use adx_engine::clock::ManualClock;
/// use adx_engine::engine::ExchangeEngine;
/// use adx_engine::types::AdSlot;
///
/// let (tx, _rx) = crossbeam::channel::unbounded();
/// let mut engine = ExchangeEngine::new(Box::new(sha256), Arc::new(ManualClock::new(0)), tx);
///
/// engine
///     .register_slot(AdSlot::new(1, "pub", "ctv-preroll", 0, 0, 1_000_000, 100, 1_000, 70))
///     .unwrap();
/// assert_eq!(engine.current_price(1).unwrap(), 1_500);
/// ```
pub struct ExchangeEngine {
    config: EngineConfig,
    registry: SlotRegistry,
    books: HashMap<SlotId, SlotBook>,
    pools: HashMap<SlotId, AmmPool>,
    arena: CommitRevealArena,

    hash_fn: HashFn,
    clock: Arc<dyn Clock>,
    fill_sink: Sender<FillEvent>,

    total_orders: AtomicU64,
    total_matches: AtomicU64,
    /// EWMA of operation latency in nanoseconds, alpha = 1/8
    latency_ewma_ns: AtomicU64,
}

impl ExchangeEngine {
    /// Create an engine with default configuration.
    pub fn new(hash_fn: HashFn, clock: Arc<dyn Clock>, fill_sink: Sender<FillEvent>) -> Self {
        Self::with_config(EngineConfig::default(), hash_fn, clock, fill_sink)
    }

    /// Create an engine with explicit configuration.
    pub fn with_config(
        config: EngineConfig,
        hash_fn: HashFn,
        clock: Arc<dyn Clock>,
        fill_sink: Sender<FillEvent>,
    ) -> Self {
        Self {
            config,
            registry: SlotRegistry::new(),
            books: HashMap::new(),
            pools: HashMap::new(),
            arena: CommitRevealArena::new(),
            hash_fn,
            clock,
            fill_sink,
            total_orders: AtomicU64::new(0),
            total_matches: AtomicU64::new(0),
            latency_ewma_ns: AtomicU64::new(0),
        }
    }

    // ========================================================================
    // Admin Operations
    // ========================================================================

    /// Register perishable inventory and open its book.
    pub fn register_slot(&mut self, slot: AdSlot) -> Result<(), EngineError> {
        let slot_id = slot.slot_id;
        self.registry.register(slot)?;
        self.books
            .insert(slot_id, SlotBook::with_capacity(self.config.book_capacity));
        debug!(slot_id, "slot registered");
        Ok(())
    }

    /// Deactivate a slot: pricing drops to zero and ingress closes.
    pub fn deactivate_slot(&mut self, slot_id: SlotId) -> Result<(), EngineError> {
        self.registry.deactivate(slot_id)?;
        debug!(slot_id, "slot deactivated");
        Ok(())
    }

    /// Deposit liquidity into a slot's pool, creating it on first use.
    pub fn add_liquidity(
        &mut self,
        slot_id: SlotId,
        quote: Price,
        supply: Quantity,
    ) -> Result<(), EngineError> {
        if self.registry.get(slot_id).is_none() {
            return Err(EngineError::SlotUnknown(slot_id));
        }
        self.pools
            .entry(slot_id)
            .or_insert_with(|| AmmPool::new(slot_id))
            .add_liquidity(quote, supply);
        debug!(slot_id, quote, supply, "liquidity added");
        Ok(())
    }

    // ========================================================================
    // Observation
    // ========================================================================

    /// Decay-adjusted price of a slot right now
    pub fn current_price(&self, slot_id: SlotId) -> Result<Price, EngineError> {
        self.registry.current_price(slot_id, self.clock.now_ns())
    }

    /// Impressions still deliverable against a slot
    pub fn remaining_supply(&self, slot_id: SlotId) -> Result<Quantity, EngineError> {
        self.registry.remaining_supply(slot_id)
    }

    /// Throughput counters and liquidity gauges
    pub fn get_stats(&self) -> EngineStats {
        EngineStats {
            total_orders: self.total_orders.load(Ordering::Relaxed),
            total_matches: self.total_matches.load(Ordering::Relaxed),
            avg_latency_us: self.latency_ewma_ns.load(Ordering::Relaxed) as f64 / 1_000.0,
            active_slots: self.registry.active_count() as u64,
            active_pools: self.pools.values().filter(|p| p.has_liquidity()).count() as u64,
        }
    }

    // ========================================================================
    // Order Ingress
    // ========================================================================

    /// Validate an order and route it to its mechanism.
    ///
    /// Every rejection is a typed [`EngineError`]; an accepted order is
    /// counted and may produce zero or more fills on the sink.
    pub fn add_order(&mut self, order: Order) -> Result<(), EngineError> {
        let now = self.clock.now_ns();
        self.validate(&order, now)?;

        trace!(
            order_id = order.order_id,
            slot_id = order.slot_id,
            kind = ?order.kind,
            "order accepted"
        );

        match order.kind {
            OrderType::Limit => self.route_limit(order)?,
            OrderType::Market => self.route_market(order, now),
            OrderType::CommitReveal { .. } => self.arena.commit(order, now)?,
            OrderType::AmmSwap => self.route_swap(&order)?,
            OrderType::FlashCover => {
                // Borrow/repay accounting is an external collaborator;
                // the core accepts the order and counts it.
                debug!(order_id = order.order_id, "flash cover accepted");
            }
        }

        self.total_orders.fetch_add(1, Ordering::Relaxed);
        self.record_latency(self.clock.now_ns().saturating_sub(now));
        Ok(())
    }

    /// Pre-routing validation shared by all order types.
    fn validate(&self, order: &Order, now: u64) -> Result<(), EngineError> {
        let slot = self
            .registry
            .get(order.slot_id)
            .ok_or(EngineError::SlotUnknown(order.slot_id))?;

        if slot.is_expired(now) {
            return Err(EngineError::SlotExpired(order.slot_id));
        }
        if !slot.active {
            return Err(EngineError::SlotInactive(order.slot_id));
        }
        if order.kind != OrderType::AmmSwap && order.targeting_hash != slot.targeting_hash {
            return Err(EngineError::TargetingMismatch {
                order: order.targeting_hash,
                slot: slot.targeting_hash,
            });
        }
        if order.quantity == 0 {
            return Err(EngineError::QuantityZero);
        }
        if order.is_expired(now) {
            return Err(EngineError::OrderExpired);
        }
        Ok(())
    }

    /// Rest a limit order in its slot's book.
    ///
    /// Limit orders never trigger matching on insert; a crossed book
    /// accumulates until a market order or batch auction clears it.
    fn route_limit(&mut self, order: Order) -> Result<(), EngineError> {
        if self.config.reject_asks_below_floor && order.side == Side::Sell {
            let floor = self
                .registry
                .get(order.slot_id)
                .map(|s| s.floor_cpm)
                .unwrap_or(0);
            if order.limit_price < floor {
                return Err(EngineError::AskBelowFloor {
                    price: order.limit_price,
                    floor,
                });
            }
        }

        if let Some(book) = self.books.get_mut(&order.slot_id) {
            book.insert(order);
        }
        Ok(())
    }

    /// A market order uncrosses the book, then takes remaining contra
    /// liquidity at maker prices. It never rests.
    fn route_market(&mut self, mut order: Order, now: u64) {
        let fills = {
            let Some(book) = self.books.get_mut(&order.slot_id) else {
                return;
            };
            let Some(slot) = self.registry.get_mut(order.slot_id) else {
                return;
            };
            let mut fills = matcher::cross_book(book, slot, now);
            fills.extend(matcher::take(book, slot, &mut order, now));
            fills
        };
        self.emit_fills(fills);
    }

    /// Execute a swap against the slot's pool.
    ///
    /// Pool trades move reserves, not slot delivery, and emit no fill:
    /// the pool's inventory was committed when liquidity was added.
    fn route_swap(&mut self, order: &Order) -> Result<(), EngineError> {
        let pool = self
            .pools
            .get_mut(&order.slot_id)
            .ok_or(EngineError::PoolEmpty(order.slot_id))?;
        let out = pool.swap(order)?;
        debug!(
            order_id = order.order_id,
            slot_id = order.slot_id,
            out,
            last_price = pool.last_price,
            "swap executed"
        );
        Ok(())
    }

    // ========================================================================
    // Sealed-Bid Auction
    // ========================================================================

    /// Open a commit phase on a slot. Any prior sealed orders for the
    /// slot are discarded.
    pub fn start_commit_phase(
        &mut self,
        slot_id: SlotId,
        duration_ms: u64,
    ) -> Result<(), EngineError> {
        let now = self.clock.now_ns();
        let slot = self
            .registry
            .get(slot_id)
            .ok_or(EngineError::SlotUnknown(slot_id))?;
        if slot.is_expired(now) {
            return Err(EngineError::SlotExpired(slot_id));
        }

        let deadline = now + duration_ms * NANOS_PER_MILLI;
        self.arena.start_phase(slot_id, deadline);
        debug!(slot_id, deadline, "commit phase opened");
        Ok(())
    }

    /// Open a sealed bid by revealing its price and nonce.
    pub fn reveal_bid(
        &mut self,
        slot_id: SlotId,
        order_id: OrderId,
        revealed_price: Price,
        nonce: &str,
    ) -> Result<(), EngineError> {
        let now = self.clock.now_ns();
        self.arena
            .reveal(slot_id, order_id, revealed_price, nonce, &self.hash_fn, now)
    }

    /// Clear the sealed auction: revealed bids against the resting ask
    /// book, uniform-priced. The arena returns to idle.
    pub fn clear_sealed_auction(
        &mut self,
        slot_id: SlotId,
    ) -> Result<BatchAuctionResult, EngineError> {
        let now = self.clock.now_ns();
        if self.registry.get(slot_id).is_none() {
            return Err(EngineError::SlotUnknown(slot_id));
        }

        let bids = self.arena.drain_revealed(slot_id);
        let asks = self
            .books
            .get(&slot_id)
            .map(|book| book.snapshot_asks(now))
            .unwrap_or_default();

        let (result, fills) = self.apply_clearing(slot_id, &bids, &asks, now, false);
        debug!(slot_id, matches = result.total_matches, "sealed auction cleared");
        self.emit_fills(fills);
        Ok(result)
    }

    // ========================================================================
    // Batch Auction
    // ========================================================================

    /// Run one uniform-price batch auction over a slot's resting orders.
    ///
    /// `_batch_window_ms` is advisory; the caller owns the cadence. An
    /// empty result is the normal no-cross outcome, never an error.
    pub fn run_batch_auction(
        &mut self,
        slot_id: SlotId,
        _batch_window_ms: u64,
    ) -> Result<BatchAuctionResult, EngineError> {
        let now = self.clock.now_ns();
        if self.registry.get(slot_id).is_none() {
            return Err(EngineError::SlotUnknown(slot_id));
        }

        let (bids, asks) = match self.books.get(&slot_id) {
            Some(book) => (book.snapshot_bids(now), book.snapshot_asks(now)),
            None => (Vec::new(), Vec::new()),
        };

        let (result, fills) = self.apply_clearing(slot_id, &bids, &asks, now, true);
        debug!(
            slot_id,
            matches = result.total_matches,
            elapsed_us = result.processing_time_us,
            "batch auction cleared"
        );
        self.record_latency(self.clock.now_ns().saturating_sub(now));
        self.emit_fills(fills);
        Ok(result)
    }

    /// Plan a uniform-price clearing and settle it against the slot.
    ///
    /// `bids_rest` says whether the bid side lives in the book (batch) or
    /// was already drained from the arena (sealed clearing). Fills are
    /// truncated to remaining capacity; settlement stops once the slot is
    /// exhausted.
    fn apply_clearing(
        &mut self,
        slot_id: SlotId,
        bids: &[Order],
        asks: &[Order],
        now: u64,
        bids_rest: bool,
    ) -> (BatchAuctionResult, Vec<FillEvent>) {
        let start = self.clock.now_ns();
        let mut result = BatchAuctionResult::default();
        let mut fills = Vec::new();

        if let Some(plan) = auction::clear(bids, asks) {
            let (Some(book), Some(slot)) = (
                self.books.get_mut(&slot_id),
                self.registry.get_mut(slot_id),
            ) else {
                return (result, fills);
            };

            for fill in &plan.fills {
                let capacity = slot.remaining_supply();
                if capacity == 0 {
                    break;
                }
                let qty = fill.quantity.min(capacity);

                slot.deliver(qty);
                if bids_rest {
                    book.fill_by_id(fill.bid_id, qty);
                }
                book.fill_by_id(fill.ask_id, qty);

                result.push_fill(fill.bid_id, fill.ask_id, plan.price, qty);
                fills.push(FillEvent::new(
                    slot_id, fill.bid_id, fill.ask_id, plan.price, qty, now,
                ));
            }
        }

        result.processing_time_us = self.clock.now_ns().saturating_sub(start) / 1_000;
        (result, fills)
    }

    // ========================================================================
    // Settlement Plumbing
    // ========================================================================

    /// Count fills and push them to the sink without blocking.
    ///
    /// A full or disconnected sink drops events rather than stalling the
    /// matching path.
    fn emit_fills(&self, fills: Vec<FillEvent>) {
        for fill in fills {
            self.total_matches.fetch_add(1, Ordering::Relaxed);
            let _ = self.fill_sink.try_send(fill);
        }
    }

    /// Fold one latency sample into the moving average (alpha = 1/8).
    fn record_latency(&self, elapsed_ns: u64) {
        let prev = self.latency_ewma_ns.load(Ordering::Relaxed);
        let next = if prev == 0 {
            elapsed_ns
        } else {
            prev - prev / 8 + elapsed_ns / 8
        };
        self.latency_ewma_ns.store(next, Ordering::Relaxed);
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
