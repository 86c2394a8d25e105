//! Matching engine module.
//!
//! ## Components
//!
//! - [`matcher`]: immediate price-time crossing over one slot's book
//! - [`ExchangeEngine`]: the facade that validates, routes, settles, and
//!   counts
//!
//! ## Routing
//!
//! | Order type   | Destination                               |
//! |--------------|-------------------------------------------|
//! | Limit        | Slot book (rests; no immediate match)     |
//! | Market       | Immediate matcher (uncross, then take)    |
//! | CommitReveal | Sealed-bid arena                          |
//! | AmmSwap      | Constant-product pool                     |
//! | FlashCover   | Stub handler (external collaborator)      |

pub mod exchange;
pub mod matcher;

pub use exchange::{EngineConfig, EngineStats, ExchangeEngine};
