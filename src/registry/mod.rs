//! Slot registry and time-decay pricing.
//!
//! ## Decay Model
//!
//! Ad inventory is perishable: an unfilled impression is worthless the
//! moment its delivery window closes. The price of a slot is therefore
//! piecewise linear in time:
//!
//! ```text
//! 1.5 * floor |\
//!             | \
//!             |  \
//!       floor |   \_____ 0
//!             +----+----+---->
//!           start end
//! ```
//!
//! - before `start_time`: exactly `floor_cpm`
//! - during the window: `floor + (floor / 2) * remaining / window`,
//!   dropping from `1.5 * floor` at start to exactly `floor` at end
//! - after `end_time`, or deactivated: `0`
//!
//! The 50% premium is a design constant of the exchange, not a knob.
//!
//! [`price_at`] is a free function over a plain [`AdSlot`] record so the
//! decay curve is testable in isolation from registry state.

use std::collections::HashMap;

use crate::types::price::scale_by_ratio;
use crate::types::{AdSlot, EngineError, Price, Quantity, SlotId};

/// Decay-adjusted price of a slot at `now`.
///
/// # Example
///
/// ```
/// use adx_engine::registry::price_at;
/// use adx_engine::types::AdSlot;
///
/// let slot = AdSlot::new(1, "pub", "ctv-preroll", 0, 0, 1_000, 100, 1_000, 70);
/// assert_eq!(price_at(&slot, 0), 1_500);     // window opens at 1.5x floor
/// assert_eq!(price_at(&slot, 500), 1_250);   // halfway
/// assert_eq!(price_at(&slot, 1_000), 1_000); // exactly floor at the end
/// assert_eq!(price_at(&slot, 1_001), 0);     // worthless after
/// ```
pub fn price_at(slot: &AdSlot, now: u64) -> Price {
    if slot.is_expired(now) || !slot.active {
        return 0;
    }
    if now < slot.start_time {
        return slot.floor_cpm;
    }

    let window = slot.end_time - slot.start_time;
    if window == 0 {
        return slot.floor_cpm;
    }
    let remaining = slot.end_time - now;

    slot.floor_cpm + scale_by_ratio(slot.floor_cpm / 2, remaining, window)
}

/// Registry of all ad slots known to the engine.
///
/// Entries are immutable after registration except for `delivered`
/// (fill settlement) and `active` (admin deactivation).
#[derive(Debug, Default)]
pub struct SlotRegistry {
    slots: HashMap<SlotId, AdSlot>,
}

impl SlotRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new slot. Fails if the id is already taken.
    pub fn register(&mut self, slot: AdSlot) -> Result<(), EngineError> {
        debug_assert!(slot.start_time <= slot.end_time, "inverted slot window");
        if self.slots.contains_key(&slot.slot_id) {
            return Err(EngineError::SlotDuplicate(slot.slot_id));
        }
        self.slots.insert(slot.slot_id, slot);
        Ok(())
    }

    /// Look up a slot
    #[inline]
    pub fn get(&self, slot_id: SlotId) -> Option<&AdSlot> {
        self.slots.get(&slot_id)
    }

    /// Mutable access for fill settlement and admin operations
    #[inline]
    pub(crate) fn get_mut(&mut self, slot_id: SlotId) -> Option<&mut AdSlot> {
        self.slots.get_mut(&slot_id)
    }

    /// Decay-adjusted price of a slot at `now`
    pub fn current_price(&self, slot_id: SlotId, now: u64) -> Result<Price, EngineError> {
        self.slots
            .get(&slot_id)
            .map(|slot| price_at(slot, now))
            .ok_or(EngineError::SlotUnknown(slot_id))
    }

    /// Impressions still deliverable against a slot
    pub fn remaining_supply(&self, slot_id: SlotId) -> Result<Quantity, EngineError> {
        self.slots
            .get(&slot_id)
            .map(AdSlot::remaining_supply)
            .ok_or(EngineError::SlotUnknown(slot_id))
    }

    /// Admin deactivation; the slot stops pricing and accepting orders
    pub fn deactivate(&mut self, slot_id: SlotId) -> Result<(), EngineError> {
        let slot = self
            .slots
            .get_mut(&slot_id)
            .ok_or(EngineError::SlotUnknown(slot_id))?;
        slot.active = false;
        Ok(())
    }

    /// Number of registered slots
    #[inline]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether no slots are registered
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Number of slots still flagged active
    pub fn active_count(&self) -> usize {
        self.slots.values().filter(|s| s.active).count()
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::NANOS_PER_MILLI;

    const MS: u64 = NANOS_PER_MILLI;

    fn slot_1s_window(floor: Price) -> AdSlot {
        // 1000ms window starting at t=0
        AdSlot::new(1, "pub-9", "ctv-preroll", 0xBEEF, 0, 1_000 * MS, 100, floor, 70)
    }

    #[test]
    fn test_decay_curve_endpoints() {
        let slot = slot_1s_window(1_000);

        assert_eq!(price_at(&slot, 0), 1_500); // 1.5x floor at start
        assert_eq!(price_at(&slot, 500 * MS), 1_250); // halfway
        assert_eq!(price_at(&slot, 1_000 * MS), 1_000); // floor at end
        assert_eq!(price_at(&slot, 1_000 * MS + 1), 0); // worthless after
    }

    #[test]
    fn test_decay_is_monotone_non_increasing() {
        let slot = slot_1s_window(1_000);

        let mut last = price_at(&slot, 0);
        for t in (0..=1_000).step_by(7) {
            let price = price_at(&slot, t * MS);
            assert!(price <= last, "decay must not increase at t={}ms", t);
            last = price;
        }
    }

    #[test]
    fn test_price_before_start_is_floor() {
        let mut slot = slot_1s_window(1_000);
        slot.start_time = 500 * MS;

        assert_eq!(price_at(&slot, 0), 1_000);
        assert_eq!(price_at(&slot, 499 * MS), 1_000);
        assert_eq!(price_at(&slot, 500 * MS), 1_500);
    }

    #[test]
    fn test_zero_window_prices_at_floor() {
        let mut slot = slot_1s_window(1_000);
        slot.start_time = 700 * MS;
        slot.end_time = 700 * MS;

        assert_eq!(price_at(&slot, 700 * MS), 1_000);
    }

    #[test]
    fn test_inactive_slot_is_worthless() {
        let mut slot = slot_1s_window(1_000);
        slot.active = false;

        assert_eq!(price_at(&slot, 500 * MS), 0);
    }

    #[test]
    fn test_register_rejects_duplicates() {
        let mut registry = SlotRegistry::new();

        registry.register(slot_1s_window(1_000)).unwrap();
        assert_eq!(
            registry.register(slot_1s_window(2_000)),
            Err(EngineError::SlotDuplicate(1))
        );
        assert_eq!(registry.len(), 1);
        // The original registration is untouched
        assert_eq!(registry.get(1).unwrap().floor_cpm, 1_000);
    }

    #[test]
    fn test_registry_lookups() {
        let mut registry = SlotRegistry::new();
        registry.register(slot_1s_window(1_000)).unwrap();

        assert_eq!(registry.current_price(1, 500 * MS), Ok(1_250));
        assert_eq!(registry.remaining_supply(1), Ok(100));

        assert_eq!(
            registry.current_price(9, 0),
            Err(EngineError::SlotUnknown(9))
        );
        assert_eq!(
            registry.remaining_supply(9),
            Err(EngineError::SlotUnknown(9))
        );
    }

    #[test]
    fn test_deactivate() {
        let mut registry = SlotRegistry::new();
        registry.register(slot_1s_window(1_000)).unwrap();

        assert_eq!(registry.active_count(), 1);
        registry.deactivate(1).unwrap();
        assert_eq!(registry.active_count(), 0);
        assert_eq!(registry.current_price(1, 500 * MS), Ok(0));

        assert_eq!(registry.deactivate(9), Err(EngineError::SlotUnknown(9)));
    }
}
