/// Order book, pool, and order index correctness tests.

use itch_feed::book::{BookManager, OrderBook};
use itch_feed::order_index::OrderIndex;
use itch_feed::pool::OrderPool;
use itch_feed::types::{Price, Side};

#[test]
fn test_empty_book() {
    let book = OrderBook::new(1);
    let bbo = book.bbo();
    assert!(!bbo.has_bid());
    assert!(!bbo.has_ask());
    assert_eq!(book.order_count(), 0);
    assert_eq!(book.bid_level_count(), 0);
    assert_eq!(book.ask_level_count(), 0);
    assert!(book.bid_depth(5).is_empty());
    assert!(book.ask_depth(5).is_empty());
}

#[test]
fn test_bbo_formation() {
    let mut pool = OrderPool::new();
    let mut book = OrderBook::new(1);

    book.add_order(&mut pool, 1001, Side::Buy, 1_500_000, 100, 1).unwrap();
    book.add_order(&mut pool, 2001, Side::Sell, 1_501_000, 150, 2).unwrap();

    let bbo = book.bbo();
    assert_eq!((bbo.bid_price, bbo.bid_quantity), (1_500_000, 100));
    assert_eq!((bbo.ask_price, bbo.ask_quantity), (1_501_000, 150));
    assert_eq!(bbo.spread(), 1_000);
    assert_eq!(bbo.midpoint(), 1_500_500);
}

#[test]
fn test_best_bid_is_highest_best_ask_is_lowest() {
    let mut pool = OrderPool::new();
    let mut book = OrderBook::new(1);

    for i in 0..5i64 {
        book.add_order(&mut pool, 10 + i as u64, Side::Buy, 1_000_000 - i * 10_000, 100, 0)
            .unwrap();
        book.add_order(&mut pool, 20 + i as u64, Side::Sell, 1_010_000 + i * 10_000, 100, 0)
            .unwrap();
    }
    assert_eq!(book.bbo().bid_price, 1_000_000);
    assert_eq!(book.bbo().ask_price, 1_010_000);
    assert_eq!(book.bid_level_count(), 5);
    assert_eq!(book.ask_level_count(), 5);
}

#[test]
fn test_aggregation_at_one_level() {
    let mut pool = OrderPool::new();
    let mut book = OrderBook::new(1);

    for id in 1..=5u64 {
        book.add_order(&mut pool, id, Side::Buy, 1_500_000, 100, id).unwrap();
    }
    assert_eq!(book.bid_level_count(), 1);
    assert_eq!(book.order_count(), 5);
    assert_eq!(book.bbo().bid_quantity, 500);
    let depth = book.bid_depth(1);
    assert_eq!(depth[0].order_count, 5);
}

#[test]
fn test_partial_execution_preserves_level() {
    let mut pool = OrderPool::new();
    let mut book = OrderBook::new(1);
    book.add_order(&mut pool, 1001, Side::Buy, 1_500_000, 100, 0).unwrap();

    assert_eq!(book.execute_order(&mut pool, 1001, 40), 40);
    assert_eq!(book.bbo().bid_quantity, 60);
    assert_eq!(book.bid_depth(1)[0].order_count, 1);
    assert_eq!(book.order(&pool, 1001).unwrap().quantity, 60);
    assert_eq!(book.order(&pool, 1001).unwrap().original_qty, 100);
}

#[test]
fn test_full_execution_clears_level_and_slot() {
    let mut pool = OrderPool::new();
    let mut book = OrderBook::new(1);
    book.add_order(&mut pool, 1001, Side::Buy, 1_500_000, 100, 0).unwrap();
    book.execute_order(&mut pool, 1001, 40);

    assert_eq!(book.execute_order(&mut pool, 1001, 60), 60);
    assert!(!book.bbo().has_bid());
    assert_eq!(book.bid_level_count(), 0);
    assert!(book.find(1001).is_none());
    assert_eq!(pool.outstanding(), 0);
}

#[test]
fn test_overfill_is_capped_at_resting_quantity() {
    let mut pool = OrderPool::new();
    let mut book = OrderBook::new(1);
    book.add_order(&mut pool, 1, Side::Sell, 2_000_000, 30, 0).unwrap();
    assert_eq!(book.execute_order(&mut pool, 1, 100), 30);
    assert!(book.find(1).is_none());
}

#[test]
fn test_unknown_ids_return_empty_results() {
    let mut pool = OrderPool::new();
    let mut book = OrderBook::new(1);
    assert_eq!(book.execute_order(&mut pool, 404, 10), 0);
    assert_eq!(book.cancel_order(&mut pool, 404, 10), 0);
    assert!(!book.delete_order(&mut pool, 404));
    assert!(book.replace_order(&mut pool, 404, 405, 10, 1_000_000, 0).is_none());
}

#[test]
fn test_cancel_matches_execute_semantics() {
    let mut pool = OrderPool::new();
    let mut book = OrderBook::new(1);
    book.add_order(&mut pool, 1, Side::Buy, 1_500_000, 100, 0).unwrap();

    assert_eq!(book.cancel_order(&mut pool, 1, 30), 30);
    assert_eq!(book.order(&pool, 1).unwrap().quantity, 70);
    assert_eq!(book.cancel_order(&mut pool, 1, 70), 70);
    assert!(book.find(1).is_none());
    assert_eq!(book.bid_level_count(), 0);
}

#[test]
fn test_fifo_price_time_priority() {
    let mut pool = OrderPool::new();
    let mut book = OrderBook::new(1);
    book.add_order(&mut pool, 1, Side::Buy, 1_500_000, 100, 10).unwrap();
    book.add_order(&mut pool, 2, Side::Buy, 1_500_000, 200, 20).unwrap();
    book.add_order(&mut pool, 3, Side::Buy, 1_500_000, 300, 30).unwrap();

    // Executions against the first arrival leave the others untouched
    // until it is exhausted.
    book.execute_order(&mut pool, 1, 60);
    assert_eq!(book.order(&pool, 1).unwrap().quantity, 40);
    assert_eq!(book.order(&pool, 2).unwrap().quantity, 200);
    assert_eq!(book.order(&pool, 3).unwrap().quantity, 300);

    book.execute_order(&mut pool, 1, 40);
    assert!(book.find(1).is_none());
    assert_eq!(book.order(&pool, 2).unwrap().quantity, 200);
    assert_eq!(book.bid_depth(1)[0].quantity, 500);
}

#[test]
fn test_delete_full_quantity() {
    let mut pool = OrderPool::new();
    let mut book = OrderBook::new(1);
    book.add_order(&mut pool, 1, Side::Buy, 1_500_000, 100, 0).unwrap();
    book.add_order(&mut pool, 2, Side::Buy, 1_500_000, 50, 0).unwrap();

    assert!(book.delete_order(&mut pool, 1));
    assert_eq!(book.bbo().bid_quantity, 50);
    assert_eq!(book.bid_depth(1)[0].order_count, 1);
    assert_eq!(pool.outstanding(), 1);
}

#[test]
fn test_replace_atomicity() {
    let mut pool = OrderPool::new();
    let mut book = OrderBook::new(1);
    book.add_order(&mut pool, 1001, Side::Buy, 1_500_000, 100, 0).unwrap();

    // Success: old id gone, new id present with new attributes.
    assert!(book.replace_order(&mut pool, 1001, 1002, 200, 1_502_000, 9).is_some());
    assert!(book.find(1001).is_none());
    let order = book.order(&pool, 1002).unwrap();
    assert_eq!((order.side, order.price, order.quantity), (Side::Buy, 1_502_000, 200));

    // Failure paths leave the survivor untouched.
    assert!(book.replace_order(&mut pool, 9999, 1003, 10, 1_000_000, 0).is_none());
    book.add_order(&mut pool, 1004, Side::Buy, 1_400_000, 25, 0).unwrap();
    assert!(book.replace_order(&mut pool, 1002, 1004, 10, 1_000_000, 0).is_none());
    assert_eq!(book.order(&pool, 1002).unwrap().quantity, 200);
    assert_eq!(book.order(&pool, 1004).unwrap().quantity, 25);
    assert_eq!(book.order_count(), 2);
}

#[test]
fn test_replace_crossing_the_book_is_kept() {
    // The feed publishes data, it does not match; a bid raised through
    // the ask is a data artifact that both sides must survive.
    let mut pool = OrderPool::new();
    let mut book = OrderBook::new(1);
    book.add_order(&mut pool, 1001, Side::Buy, 1_500_000, 100, 0).unwrap();
    book.add_order(&mut pool, 2001, Side::Sell, 1_501_000, 150, 0).unwrap();

    book.replace_order(&mut pool, 1001, 1002, 200, 1_502_000, 0).unwrap();
    let bbo = book.bbo();
    assert!(bbo.has_bid() && bbo.has_ask());
    assert_eq!(bbo.bid_price, 1_502_000);
    assert_eq!(bbo.ask_price, 1_501_000);
    assert!(bbo.spread() < 0);
}

#[test]
fn test_duplicate_order_id_rejected() {
    let mut pool = OrderPool::new();
    let mut book = OrderBook::new(1);
    assert!(book.add_order(&mut pool, 3001, Side::Buy, 1_500_000, 100, 0).is_some());
    assert!(book.add_order(&mut pool, 3001, Side::Sell, 9_999_999, 1, 0).is_none());

    assert_eq!(book.order_count(), 1);
    assert_eq!(pool.outstanding(), 1);
    let order = book.order(&pool, 3001).unwrap();
    assert_eq!((order.side, order.quantity), (Side::Buy, 100));
}

#[test]
fn test_depth_snapshots() {
    let mut pool = OrderPool::new();
    let mut book = OrderBook::new(1);
    for i in 0..10i64 {
        book.add_order(&mut pool, 100 + i as u64, Side::Buy, 1_500_000 - i * 1_000, 100 + i as u32, 0)
            .unwrap();
        book.add_order(&mut pool, 200 + i as u64, Side::Sell, 1_501_000 + i * 1_000, 100 + i as u32, 0)
            .unwrap();
    }

    let bids = book.bid_depth(5);
    let asks = book.ask_depth(5);
    assert_eq!(bids.len(), 5);
    assert_eq!(asks.len(), 5);
    assert!(bids.windows(2).all(|w| w[0].price > w[1].price));
    assert!(asks.windows(2).all(|w| w[0].price < w[1].price));

    // Requesting more levels than exist returns what is there.
    assert_eq!(book.bid_depth(64).len(), 10);
}

#[test]
fn test_clear_returns_pool_slots() {
    let mut pool = OrderPool::new();
    let mut book = OrderBook::new(1);
    for id in 1..=100u64 {
        let side = if id % 2 == 0 { Side::Buy } else { Side::Sell };
        book.add_order(&mut pool, id, side, 1_000_000 + (id % 7) as i64 * 500, 10, id).unwrap();
    }
    assert_eq!(pool.outstanding(), 100);

    book.clear(&mut pool);
    assert_eq!(pool.outstanding(), 0);
    assert_eq!(book.order_count(), 0);
    assert!(!book.bbo().has_bid());
    assert!(!book.bbo().has_ask());
    assert_eq!(book.bbo().ask_price, Price::MAX);
}

#[test]
fn test_structural_invariants_under_churn() {
    let mut pool = OrderPool::new();
    let mut book = OrderBook::new(1);

    // Deterministic mixed workload over a handful of price points.
    let mut live: Vec<u64> = Vec::new();
    for i in 0..500u64 {
        let id = i + 1;
        let price = 1_000_000 + (i % 11) as i64 * 1_000;
        let side = if i % 3 == 0 { Side::Sell } else { Side::Buy };
        book.add_order(&mut pool, id, side, price, 100, i).unwrap();
        live.push(id);

        match i % 5 {
            1 => {
                let victim = live[(i as usize * 7) % live.len()];
                book.execute_order(&mut pool, victim, 100);
                if book.find(victim).is_none() {
                    live.retain(|&x| x != victim);
                }
            }
            2 => {
                let victim = live[(i as usize * 3) % live.len()];
                book.cancel_order(&mut pool, victim, 40);
                if book.find(victim).is_none() {
                    live.retain(|&x| x != victim);
                }
            }
            3 => {
                let victim = live[(i as usize * 5) % live.len()];
                if book.delete_order(&mut pool, victim) {
                    live.retain(|&x| x != victim);
                }
            }
            _ => {}
        }

        // Invariants hold after every step.
        assert_eq!(book.order_count(), book.indexed_order_count());
        assert_eq!(book.order_count(), live.len());
        assert_eq!(pool.outstanding(), book.order_count());
    }

    // Every live id resolves to an order on the side and price of a
    // level that contains it.
    let bid_prices: Vec<i64> = book.bid_depth(usize::MAX).iter().map(|l| l.price).collect();
    let ask_prices: Vec<i64> = book.ask_depth(usize::MAX).iter().map(|l| l.price).collect();
    for &id in &live {
        let order = book.order(&pool, id).expect("live order must resolve");
        match order.side {
            Side::Buy => assert!(bid_prices.contains(&order.price)),
            Side::Sell => assert!(ask_prices.contains(&order.price)),
        }
    }

    // Level sums equal the orders they hold.
    let level_total: u64 = book
        .bid_depth(usize::MAX)
        .iter()
        .chain(book.ask_depth(usize::MAX).iter())
        .map(|l| l.quantity as u64)
        .sum();
    let order_total: u64 = live
        .iter()
        .map(|&id| book.order(&pool, id).unwrap().quantity as u64)
        .sum();
    assert_eq!(level_total, order_total);
}

#[test]
fn test_order_index_adversarial_backshift() {
    // Ids congruent modulo the table width all contend for one bucket;
    // deleting every other one exercises the back-shift walk across
    // long clusters, including wraparound.
    let mut index = OrderIndex::with_capacity(128);
    let ids: Vec<u64> = (0..48).map(|i| 120 + i * 128).collect();
    for (slot, &id) in ids.iter().enumerate() {
        assert!(index.insert(id, slot as u32));
    }
    for &id in ids.iter().step_by(2) {
        assert!(index.remove(id).is_some());
    }
    let fresh: Vec<u64> = (0..24).map(|i| 121 + i * 128).collect();
    for (slot, &id) in fresh.iter().enumerate() {
        assert!(index.insert(id, 500 + slot as u32));
    }

    for (slot, &id) in ids.iter().enumerate() {
        if slot % 2 == 0 {
            assert_eq!(index.get(id), None);
        } else {
            assert_eq!(index.get(id), Some(slot as u32));
        }
    }
    for (slot, &id) in fresh.iter().enumerate() {
        assert_eq!(index.get(id), Some(500 + slot as u32));
    }
    assert_eq!(index.len(), 24 + 24);
}

#[test]
fn test_locate_beyond_presized_span_is_not_fatal() {
    let mut manager = BookManager::new();

    for locate in [8_192u16, 30_000, u16::MAX] {
        let (book, pool) = manager.book_and_pool(locate);
        book.add_order(pool, locate as u64, Side::Buy, 1_000_000, 10, 0).unwrap();
        assert_eq!(book.stock_locate(), locate);
    }
    assert_eq!(manager.total_order_count(), 3);
    assert_eq!(manager.pool().outstanding(), 3);
}

#[test]
fn test_pool_conservation_across_books() {
    let mut manager = BookManager::new();

    for locate in 1u16..=4 {
        let (book, pool) = manager.book_and_pool(locate);
        for i in 0..25u64 {
            let id = locate as u64 * 1_000 + i;
            book.add_order(pool, id, Side::Buy, 1_000_000, 10, 0).unwrap();
        }
    }
    assert_eq!(manager.pool().outstanding(), 100);
    assert_eq!(manager.total_order_count(), 100);

    {
        let (book, pool) = manager.book_and_pool(2);
        book.clear(pool);
    }
    assert_eq!(manager.pool().outstanding(), 75);

    manager.clear();
    assert_eq!(manager.pool().outstanding(), 0);
    assert_eq!(manager.total_order_count(), 0);
}
