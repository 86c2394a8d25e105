//! adx-engine - Demo Binary
//!
//! Walks one ad slot through its life: registration, decay pricing, a
//! crossed book cleared by a market trigger, and the engine stats.

use std::sync::Arc;

use adx_engine::auction::sha256;
use adx_engine::clock::{ManualClock, NANOS_PER_MILLI};
use adx_engine::{AdSlot, Clock, ExchangeEngine, Order, Side};

fn main() {
    tracing_subscriber::fmt::init();

    println!("===========================================");
    println!("  adx-engine - ad inventory exchange");
    println!("===========================================");
    println!();

    let clock = Arc::new(ManualClock::new(0));
    let (fills_tx, fills_rx) = crossbeam::channel::unbounded();
    let mut engine = ExchangeEngine::new(Box::new(sha256), clock.clone(), fills_tx);

    // A CTV pre-roll slot: 5 minute window, 10_000 impressions, floor 1000
    let window_ms = 5 * 60 * 1_000;
    let slot = AdSlot::new(
        1,
        "pub-9",
        "ctv-preroll",
        0xBEEF,
        0,
        window_ms * NANOS_PER_MILLI,
        10_000,
        1_000,
        70,
    );

    println!("Registering slot {} ({})...", slot.slot_id, slot.placement);
    engine.register_slot(slot).expect("slot registration");

    println!("  price at open:     {}", engine.current_price(1).unwrap());
    clock.advance_ms(window_ms / 2);
    println!("  price halfway:     {}", engine.current_price(1).unwrap());
    println!();

    // Rest a crossed book, then trigger it
    let now = clock.now_ns();
    let expires = window_ms * NANOS_PER_MILLI;
    println!("Submitting bid 1500 x 100 and ask 1000 x 100...");
    engine
        .add_order(Order::limit(1, "dsp-1", 1, Side::Buy, 1_500, 100, now, expires, 0xBEEF))
        .expect("bid");
    engine
        .add_order(Order::limit(2, "ssp-1", 1, Side::Sell, 1_000, 100, now, expires, 0xBEEF))
        .expect("ask");

    println!("Triggering with a market buy...");
    engine
        .add_order(Order::market(3, "dsp-2", 1, Side::Buy, 1, now, expires, 0xBEEF))
        .expect("market order");

    while let Ok(fill) = fills_rx.try_recv() {
        println!(
            "  fill: bid {} x ask {} -> {} impressions @ {}",
            fill.bid_id, fill.ask_id, fill.quantity, fill.price
        );
    }

    let stats = engine.get_stats();
    println!();
    println!("Engine stats:");
    println!("  orders processed:  {}", stats.total_orders);
    println!("  matches:           {}", stats.total_matches);
    println!("  active slots:      {}", stats.active_slots);
    println!("  remaining supply:  {}", engine.remaining_supply(1).unwrap());
}
