//! Price level management for orders at the same price.
//!
//! ## Design
//!
//! A `PriceLevel` holds all orders resting at a single price. Orders form
//! a doubly-linked FIFO queue over the slab, which gives price-time
//! priority: the head is the oldest order and is always matched first.
//!
//! ```text
//! head (oldest) <-> order2 <-> order3 <-> tail (newest)
//! ```
//!
//! Nodes own their links (see [`OrderNode::take_links`]); the level owns
//! the queue endpoints and the running totals.

use slab::Slab;

use crate::orderbook::OrderNode;
use crate::types::{Price, Quantity};

/// A price level containing orders at a single price.
///
/// The order data lives in the slab; this struct only holds the queue
/// metadata.
#[derive(Debug, Clone)]
pub struct PriceLevel {
    /// Price for this level (wei CPM)
    pub price: Price,

    /// Total remaining quantity at this level
    pub total_quantity: Quantity,

    /// Head of the order queue (oldest order, slab key)
    pub head: Option<usize>,

    /// Tail of the order queue (newest order, slab key)
    pub tail: Option<usize>,

    /// Number of orders at this price level
    pub order_count: usize,
}

impl PriceLevel {
    /// Create a new empty price level
    pub fn new(price: Price) -> Self {
        Self {
            price,
            total_quantity: 0,
            head: None,
            tail: None,
            order_count: 0,
        }
    }

    /// Check if the price level is empty
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.order_count == 0
    }

    /// Append an order at the tail of the queue.
    ///
    /// Appending preserves FIFO: under the engine's per-slot serialisation
    /// guarantee, arrival order equals `created` order, so ties at one
    /// price always break to the earliest order.
    ///
    /// # Panics
    ///
    /// Panics if `key` is not occupied in the slab
    pub fn push_back(&mut self, key: usize, slab: &mut Slab<OrderNode>) {
        let quantity = slab[key].remaining();

        let displaced_tail = self.tail.replace(key);
        {
            let node = &mut slab[key];
            node.prev = displaced_tail;
            node.next = None;
        }
        match displaced_tail {
            Some(old_tail) => slab[old_tail].next = Some(key),
            // First order at this price: the queue starts here
            None => self.head = Some(key),
        }

        self.order_count += 1;
        self.total_quantity = self.total_quantity.saturating_add(quantity);
    }

    /// Unlink an order from the queue by slab key.
    ///
    /// The node detaches itself; the level only stitches the gap its
    /// neighbours leave. A missing neighbour means a queue endpoint
    /// moved.
    ///
    /// # Returns
    ///
    /// The remaining quantity of the removed order
    ///
    /// # Panics
    ///
    /// Panics if `key` is not occupied in the slab
    pub fn remove(&mut self, key: usize, slab: &mut Slab<OrderNode>) -> Quantity {
        let quantity = slab[key].remaining();
        let (left, right) = slab[key].take_links();

        match left {
            Some(left_key) => slab[left_key].next = right,
            None => self.head = right,
        }
        match right {
            Some(right_key) => slab[right_key].prev = left,
            None => self.tail = left,
        }

        self.order_count -= 1;
        self.total_quantity = self.total_quantity.saturating_sub(quantity);

        quantity
    }

    /// Slab key of the head order (oldest, matched first)
    #[inline]
    pub fn peek_head(&self) -> Option<usize> {
        self.head
    }

    /// Reduce the level total after a partial fill at this price
    pub fn reduce_quantity(&mut self, filled_quantity: Quantity) {
        self.total_quantity = self.total_quantity.saturating_sub(filled_quantity);
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Order, Side};

    fn create_test_node(slab: &mut Slab<OrderNode>, id: u64, quantity: Quantity) -> usize {
        let order = Order::limit(id, "dsp-1", 1, Side::Buy, 1_500, quantity, id, u64::MAX, 0);
        slab.insert(OrderNode::new(order))
    }

    #[test]
    fn test_price_level_new() {
        let level = PriceLevel::new(1_500);

        assert_eq!(level.price, 1_500);
        assert_eq!(level.total_quantity, 0);
        assert!(level.head.is_none());
        assert!(level.tail.is_none());
        assert!(level.is_empty());
    }

    #[test]
    fn test_push_preserves_fifo() {
        let mut slab = Slab::with_capacity(10);
        let mut level = PriceLevel::new(1_500);

        let key1 = create_test_node(&mut slab, 1, 10);
        let key2 = create_test_node(&mut slab, 2, 20);
        let key3 = create_test_node(&mut slab, 3, 30);

        level.push_back(key1, &mut slab);
        level.push_back(key2, &mut slab);
        level.push_back(key3, &mut slab);

        assert_eq!(level.order_count, 3);
        assert_eq!(level.total_quantity, 60);
        assert_eq!(level.peek_head(), Some(key1));
        assert_eq!(level.tail, Some(key3));

        // Chain: key1 <-> key2 <-> key3
        assert_eq!(slab.get(key1).unwrap().next, Some(key2));
        assert_eq!(slab.get(key2).unwrap().prev, Some(key1));
        assert_eq!(slab.get(key2).unwrap().next, Some(key3));
        assert_eq!(slab.get(key3).unwrap().prev, Some(key2));
    }

    #[test]
    fn test_remove_middle() {
        let mut slab = Slab::with_capacity(10);
        let mut level = PriceLevel::new(1_500);

        let key1 = create_test_node(&mut slab, 1, 10);
        let key2 = create_test_node(&mut slab, 2, 20);
        let key3 = create_test_node(&mut slab, 3, 30);

        level.push_back(key1, &mut slab);
        level.push_back(key2, &mut slab);
        level.push_back(key3, &mut slab);

        let removed = level.remove(key2, &mut slab);

        assert_eq!(removed, 20);
        assert_eq!(level.order_count, 2);
        assert_eq!(level.total_quantity, 40);

        // Chain: key1 <-> key3
        assert_eq!(slab.get(key1).unwrap().next, Some(key3));
        assert_eq!(slab.get(key3).unwrap().prev, Some(key1));
    }

    #[test]
    fn test_remove_head_and_tail() {
        let mut slab = Slab::with_capacity(10);
        let mut level = PriceLevel::new(1_500);

        let key1 = create_test_node(&mut slab, 1, 10);
        let key2 = create_test_node(&mut slab, 2, 20);

        level.push_back(key1, &mut slab);
        level.push_back(key2, &mut slab);

        level.remove(key1, &mut slab);
        assert_eq!(level.head, Some(key2));
        assert_eq!(level.tail, Some(key2));

        level.remove(key2, &mut slab);
        assert!(level.is_empty());
        assert!(level.head.is_none());
        assert!(level.tail.is_none());
        assert_eq!(level.total_quantity, 0);
    }

    #[test]
    fn test_reduce_quantity_saturates() {
        let mut level = PriceLevel::new(1_500);
        level.total_quantity = 100;

        level.reduce_quantity(30);
        assert_eq!(level.total_quantity, 70);

        level.reduce_quantity(1_000);
        assert_eq!(level.total_quantity, 0);
    }
}
