//! Core data types for the exchange.
//!
//! All prices are fixed-point wei CPM (signed 64-bit, 10^18 scale) and all
//! quantities are whole impression counts. Timestamps are nanoseconds on
//! the engine's injected clock.
//!
//! ## Types
//!
//! - [`AdSlot`]: Perishable, capacity-bounded publisher inventory
//! - [`Order`]: One side of a prospective trade
//! - [`Side`] / [`OrderType`]: Order classification
//! - [`FillEvent`]: Executed match, emitted to the settlement sink
//! - [`EngineError`]: Rejection taxonomy

mod error;
mod fill;
mod order;
mod slot;
pub mod price;

/// Ad slot identifier
pub type SlotId = u64;

/// Order identifier
pub type OrderId = u64;

// Re-export all types at module level
pub use error::EngineError;
pub use fill::FillEvent;
pub use order::{Order, OrderType, Side};
pub use price::{Price, Quantity};
pub use slot::AdSlot;
