//! # adx-engine
//!
//! Exchange matching engine for perishable digital-ad inventory.
//!
//! Publishers register time-bounded ad slots; advertisers trade against
//! them through four mechanisms sharing one order model, one slot
//! registry, and one settlement surface:
//!
//! - **Continuous matching**: resting limit books crossed by market
//!   orders at maker prices
//! - **Batch auctions**: periodic uniform-price clearing that neutralises
//!   intra-batch ordering games
//! - **Commit-reveal**: sealed bids validated against hash commitments
//! - **AMM pools**: constant-product liquidity per slot
//!
//! ## Architecture
//!
//! - **Types**: orders, slots, fills, and the error taxonomy
//! - **Registry**: slot records and time-decay pricing
//! - **OrderBook**: slab-backed per-slot books with price-time priority
//! - **Pool**: constant-product reserves
//! - **Auction**: sealed-bid arena and uniform-price clearing
//! - **Engine**: validation, routing, settlement, stats
//!
//! ## Design Principles
//!
//! 1. **Determinism**: identical inputs produce identical outcomes; no
//!    floating point in any matching path
//! 2. **Fixed-point money**: prices are signed 64-bit wei CPM, widened to
//!    128 bits for products
//! 3. **Injected seams**: hashing, time, and the fill sink are supplied
//!    by the embedder; the core never does I/O
//! 4. **Single writer per slot**: no locks in the matching path; stats
//!    are relaxed atomics
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//! use adx_engine::auction::sha256;
//! use adx_engine::clock::ManualClock;
//! use adx_engine::{AdSlot, ExchangeEngine, Order, Side};
//!
//! let (fills_tx, fills_rx) = crossbeam::channel::unbounded();
//! let clock = Arc::new(ManualClock::new(0));
//! let mut engine = ExchangeEngine::new(Box::new(sha256), clock, fills_tx);
//!
//! // One slot: 100 impressions over a 1ms window, floor 1000 wei CPM
//! engine
//!     .register_slot(AdSlot::new(1, "pub-9", "ctv-preroll", 0xBEEF, 0, 1_000_000, 100, 1_000, 70))
//!     .unwrap();
//!
//! // A crossed book clears when a market order arrives
//! engine.add_order(Order::limit(1, "dsp-1", 1, Side::Buy, 1_500, 10, 0, 1_000_000, 0xBEEF)).unwrap();
//! engine.add_order(Order::limit(2, "ssp-1", 1, Side::Sell, 1_000, 10, 0, 1_000_000, 0xBEEF)).unwrap();
//! engine.add_order(Order::market(3, "dsp-2", 1, Side::Buy, 1, 0, 1_000_000, 0xBEEF)).unwrap();
//!
//! let fill = fills_rx.try_recv().unwrap();
//! assert_eq!((fill.price, fill.quantity), (1_000, 10));
//! ```

// ============================================================================
// Module declarations
// ============================================================================

/// Injected time source
pub mod clock;

/// Core data types: Order, AdSlot, FillEvent, EngineError
pub mod types;

/// Slot registry and time-decay pricing
pub mod registry;

/// Slab-backed per-slot order books
pub mod orderbook;

/// Constant-product liquidity pools
pub mod pool;

/// Sealed-bid arena and uniform-price batch clearing
pub mod auction;

/// Order routing, immediate matching, settlement, stats
pub mod engine;

// ============================================================================
// Re-exports for convenience
// ============================================================================

pub use auction::{BatchAuctionResult, CommitRevealArena, HashFn};
pub use clock::{Clock, ManualClock, MonotonicClock};
pub use engine::{EngineConfig, EngineStats, ExchangeEngine};
pub use orderbook::SlotBook;
pub use pool::AmmPool;
pub use registry::{price_at, SlotRegistry};
pub use types::{AdSlot, EngineError, FillEvent, Order, OrderType, Price, Quantity, Side};
