//! Ad slot: the perishable inventory unit.
//!
//! A slot is a time-bounded, capacity-bounded block of publisher inventory
//! with a targeting constraint. Once registered it is immutable except for
//! `delivered` (incremented by fill settlement) and `active` (admin
//! deactivation). A slot is implicitly dead once `now > end_time`.

use serde::{Deserialize, Serialize};

use crate::types::{Price, Quantity, SlotId};

/// A registered ad slot.
///
/// ## Example
///
/// ```
/// use adx_engine::types::AdSlot;
///
/// let slot = AdSlot::new(1, "pub-9", "ctv-preroll", 0xBEEF, 0, 1_000_000_000, 100, 1_000, 70);
/// assert_eq!(slot.remaining_supply(), 100);
/// assert!(!slot.is_expired(500));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdSlot {
    /// Unique slot identifier
    pub slot_id: SlotId,

    /// Publisher account identifier
    pub publisher: String,

    /// Free-form placement tag, e.g. "ctv-preroll" or "banner-300x250"
    pub placement: String,

    /// Hashed targeting predicate; book orders must carry the same hash
    pub targeting_hash: u64,

    /// Start of the delivery window (engine clock, nanoseconds)
    pub start_time: u64,

    /// End of the delivery window; the slot is worthless afterwards
    pub end_time: u64,

    /// Maximum deliverable impressions
    pub max_impressions: Quantity,

    /// Impressions delivered so far; monotone, never exceeds the maximum
    pub delivered: Quantity,

    /// Publisher floor price (wei CPM)
    pub floor_cpm: Price,

    /// Minimum viewability percentage (0-100)
    pub min_viewability: u16,

    /// Cleared by admin deactivation
    pub active: bool,
}

impl AdSlot {
    /// Create a new active slot with nothing delivered.
    ///
    /// Callers must supply `start_time <= end_time`.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        slot_id: SlotId,
        publisher: &str,
        placement: &str,
        targeting_hash: u64,
        start_time: u64,
        end_time: u64,
        max_impressions: Quantity,
        floor_cpm: Price,
        min_viewability: u16,
    ) -> Self {
        Self {
            slot_id,
            publisher: publisher.to_string(),
            placement: placement.to_string(),
            targeting_hash,
            start_time,
            end_time,
            max_impressions,
            delivered: 0,
            floor_cpm,
            min_viewability,
            active: true,
        }
    }

    /// Impressions still deliverable, saturating at zero
    #[inline]
    pub fn remaining_supply(&self) -> Quantity {
        self.max_impressions.saturating_sub(self.delivered)
    }

    /// Whether the delivery window has closed at `now`
    #[inline]
    pub fn is_expired(&self, now: u64) -> bool {
        now > self.end_time
    }

    /// Record delivered impressions.
    ///
    /// The matcher truncates fills to `remaining_supply` before calling
    /// this, so the cap can only be violated by a caller bug.
    pub fn deliver(&mut self, qty: Quantity) {
        debug_assert!(qty <= self.remaining_supply(), "over-delivery");
        self.delivered = self.delivered.saturating_add(qty).min(self.max_impressions);
    }
}
