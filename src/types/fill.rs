//! Fill event emitted to the settlement sink.
//!
//! ## Terminology
//!
//! - **bid_id / ask_id**: The matched pair. For immediate matching the
//!   price is the resting (maker) order's price; for batch clearing it is
//!   the uniform clearing price.
//!
//! Fills are emitted fire-and-forget and never stored by the engine;
//! settlement, custody, and accounting live behind the sink.

use serde::{Deserialize, Serialize};

use crate::types::{OrderId, Price, Quantity, SlotId};

/// A single executed match between a bid and an ask.
///
/// ## Example
///
/// ```
/// use adx_engine::types::FillEvent;
///
/// let fill = FillEvent::new(42, 1, 2, 1_000, 10, 500_000_000);
/// assert_eq!(fill.price, 1_000);
/// assert_eq!(fill.quantity, 10);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FillEvent {
    /// Slot the impressions were delivered against
    pub slot_id: SlotId,

    /// The buy-side order
    pub bid_id: OrderId,

    /// The sell-side order
    pub ask_id: OrderId,

    /// Execution price (wei CPM)
    pub price: Price,

    /// Executed impressions
    pub quantity: Quantity,

    /// Engine-clock timestamp of the fill, nanoseconds
    pub timestamp_ns: u64,
}

impl FillEvent {
    /// Create a new fill event
    pub fn new(
        slot_id: SlotId,
        bid_id: OrderId,
        ask_id: OrderId,
        price: Price,
        quantity: Quantity,
        timestamp_ns: u64,
    ) -> Self {
        Self {
            slot_id,
            bid_id,
            ask_id,
            price,
            quantity,
            timestamp_ns,
        }
    }

    /// Notional value of the fill (price * quantity) in 128 bits.
    ///
    /// Widened because wei prices times impression counts overflow i64.
    pub fn notional_raw(&self) -> i128 {
        (self.price as i128) * (self.quantity as i128)
    }
}
