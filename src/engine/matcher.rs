//! Immediate price-time matching.
//!
//! ## Matching Rules
//!
//! - The resting (maker) order sets the trade price: a taker crossing the
//!   spread pays the maker's limit, never its own
//! - Partial fills decrement the resting order in place
//! - Fills are truncated to the slot's remaining capacity; once the slot
//!   is exhausted, matching stops
//! - Expired orders never trade: the book purges them lazily at peek
//!
//! Limit orders rest without triggering a match, which is what lets a
//! crossed book accumulate between batch auctions. A market order is the
//! trigger: its arrival uncrosses the whole book and then takes whatever
//! contra-side liquidity remains. Market orders never rest; an unfilled
//! remainder is simply dropped.

use crate::orderbook::SlotBook;
use crate::types::{AdSlot, FillEvent, Order, Quantity, Side};

/// Uncross a slot's book: repeatedly match the best bid against the best
/// ask while they cross, at the resting ask's price.
///
/// Returns the fills in execution order; the caller settles them.
pub fn cross_book(book: &mut SlotBook, slot: &mut AdSlot, now: u64) -> Vec<FillEvent> {
    let mut fills = Vec::new();

    loop {
        let capacity = slot.remaining_supply();
        if capacity == 0 {
            break;
        }

        let Some(bid_key) = book.best_bid_key(now) else { break };
        let Some(ask_key) = book.best_ask_key(now) else { break };
        let Some(bid) = book.order(bid_key) else { break };
        let Some(ask) = book.order(ask_key) else { break };

        if bid.limit_price < ask.limit_price {
            break;
        }

        let fill_qty = bid.quantity.min(ask.quantity).min(capacity);
        let fill_price = ask.limit_price;
        let (bid_id, ask_id) = (bid.order_id, ask.order_id);

        slot.deliver(fill_qty);
        book.fill_key(bid_key, fill_qty);
        book.fill_key(ask_key, fill_qty);

        fills.push(FillEvent::new(
            slot.slot_id,
            bid_id,
            ask_id,
            fill_price,
            fill_qty,
            now,
        ));
    }

    fills
}

/// Fill an incoming taker order against the contra side at maker prices.
///
/// The taker's own limit is ignored (market semantics): it walks the book
/// until filled, the book empties, or the slot's capacity runs out. The
/// order's quantity is decremented in place; whatever remains afterwards
/// is the caller's to discard.
pub fn take(book: &mut SlotBook, slot: &mut AdSlot, order: &mut Order, now: u64) -> Vec<FillEvent> {
    let mut fills = Vec::new();

    while order.quantity > 0 {
        let capacity = slot.remaining_supply();
        if capacity == 0 {
            break;
        }

        let maker_key = match order.side {
            Side::Buy => book.best_ask_key(now),
            Side::Sell => book.best_bid_key(now),
        };
        let Some(maker_key) = maker_key else { break };
        let Some(maker) = book.order(maker_key) else { break };

        let fill_qty = order.quantity.min(maker.quantity).min(capacity);
        let fill_price = maker.limit_price;
        let maker_id = maker.order_id;

        slot.deliver(fill_qty);
        order.fill(fill_qty);
        book.fill_key(maker_key, fill_qty);

        let (bid_id, ask_id) = match order.side {
            Side::Buy => (order.order_id, maker_id),
            Side::Sell => (maker_id, order.order_id),
        };
        fills.push(FillEvent::new(
            slot.slot_id,
            bid_id,
            ask_id,
            fill_price,
            fill_qty,
            now,
        ));
    }

    fills
}

/// Sum of fill quantities, for settlement accounting.
pub fn filled_quantity(fills: &[FillEvent]) -> Quantity {
    fills.iter().map(|f| f.quantity).sum()
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{OrderId, Price};

    fn slot_with_capacity(max: Quantity) -> AdSlot {
        AdSlot::new(42, "pub-9", "ctv-preroll", 0xBEEF, 0, u64::MAX, max, 1_000, 70)
    }

    fn bid(id: OrderId, price: Price, qty: Quantity) -> Order {
        Order::limit(id, "dsp-1", 42, Side::Buy, price, qty, id, u64::MAX, 0xBEEF)
    }

    fn ask(id: OrderId, price: Price, qty: Quantity) -> Order {
        Order::limit(id, "ssp-1", 42, Side::Sell, price, qty, id, u64::MAX, 0xBEEF)
    }

    #[test]
    fn test_cross_book_fills_at_maker_ask_price() {
        let mut book = SlotBook::new();
        let mut slot = slot_with_capacity(100);

        book.insert(bid(1, 1_500, 10));
        book.insert(ask(2, 1_000, 10));

        let fills = cross_book(&mut book, &mut slot, 0);

        assert_eq!(fills.len(), 1);
        assert_eq!(fills[0].price, 1_000); // taker pays the resting price
        assert_eq!(fills[0].quantity, 10);
        assert_eq!(fills[0].bid_id, 1);
        assert_eq!(fills[0].ask_id, 2);
        assert!(book.is_empty());
        assert_eq!(slot.delivered, 10);
    }

    #[test]
    fn test_cross_book_stops_at_spread() {
        let mut book = SlotBook::new();
        let mut slot = slot_with_capacity(100);

        book.insert(bid(1, 1_000, 10));
        book.insert(ask(2, 1_100, 10));

        assert!(cross_book(&mut book, &mut slot, 0).is_empty());
        assert_eq!(book.order_count(), 2);
        assert_eq!(slot.delivered, 0);
    }

    #[test]
    fn test_cross_book_walks_multiple_levels() {
        let mut book = SlotBook::new();
        let mut slot = slot_with_capacity(100);

        book.insert(bid(1, 1_500, 10));
        book.insert(bid(2, 1_200, 10));
        book.insert(ask(3, 1_000, 15));
        book.insert(ask(4, 1_150, 10));

        let fills = cross_book(&mut book, &mut slot, 0);

        // B1 x A3 (10 @ 1000), B2 x A3 (5 @ 1000), B2 x A4 (5 @ 1150)
        assert_eq!(fills.len(), 3);
        assert_eq!(fills[0], FillEvent::new(42, 1, 3, 1_000, 10, 0));
        assert_eq!(fills[1], FillEvent::new(42, 2, 3, 1_000, 5, 0));
        assert_eq!(fills[2], FillEvent::new(42, 2, 4, 1_150, 5, 0));
        assert_eq!(slot.delivered, 20);
        // A4 keeps its unfilled 5
        assert_eq!(book.ask_count(), 1);
    }

    #[test]
    fn test_cross_book_truncates_to_capacity() {
        let mut book = SlotBook::new();
        let mut slot = slot_with_capacity(7);

        book.insert(bid(1, 1_500, 10));
        book.insert(ask(2, 1_000, 10));

        let fills = cross_book(&mut book, &mut slot, 0);

        assert_eq!(fills.len(), 1);
        assert_eq!(fills[0].quantity, 7);
        assert_eq!(slot.delivered, 7);
        assert_eq!(slot.remaining_supply(), 0);

        // Once exhausted nothing else trades
        book.insert(bid(3, 1_600, 1));
        assert!(cross_book(&mut book, &mut slot, 0).is_empty());
    }

    #[test]
    fn test_take_walks_book_and_discards_remainder() {
        let mut book = SlotBook::new();
        let mut slot = slot_with_capacity(100);

        book.insert(ask(1, 1_000, 5));
        book.insert(ask(2, 1_200, 5));

        let mut market = Order::market(9, "dsp-1", 42, Side::Buy, 20, 0, u64::MAX, 0xBEEF);
        let fills = take(&mut book, &mut slot, &mut market, 0);

        assert_eq!(fills.len(), 2);
        assert_eq!(fills[0].price, 1_000);
        assert_eq!(fills[1].price, 1_200);
        assert_eq!(filled_quantity(&fills), 10);

        // 10 of 20 remain unfilled and simply die with the order
        assert_eq!(market.quantity, 10);
        assert!(book.is_empty());
    }

    #[test]
    fn test_take_sell_side() {
        let mut book = SlotBook::new();
        let mut slot = slot_with_capacity(100);

        book.insert(bid(1, 1_500, 10));

        let mut market = Order::market(9, "ssp-1", 42, Side::Sell, 4, 0, u64::MAX, 0xBEEF);
        let fills = take(&mut book, &mut slot, &mut market, 0);

        assert_eq!(fills.len(), 1);
        assert_eq!(fills[0].bid_id, 1);
        assert_eq!(fills[0].ask_id, 9);
        assert_eq!(fills[0].price, 1_500);
        assert_eq!(book.best_bid(0).map(|o| o.quantity), Some(6));
    }

    #[test]
    fn test_expired_orders_never_trade() {
        let mut book = SlotBook::new();
        let mut slot = slot_with_capacity(100);

        let mut stale = ask(1, 1_000, 10);
        stale.expires = 50;
        book.insert(stale);
        book.insert(bid(2, 1_500, 10));

        // At t=100 the crossing ask is already dead
        assert!(cross_book(&mut book, &mut slot, 100).is_empty());
        assert_eq!(book.ask_count(), 0);
        assert_eq!(book.bid_count(), 1);
    }
}
