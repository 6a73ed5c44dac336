/// Price-time priority order book.
///
/// One book per symbol: two price-ordered level maps (bids descending,
/// asks ascending when read from the top), an open-addressed order
/// index for O(1) lookup by id, and a cached best bid/offer refreshed
/// after every mutation. Order records come from a pool shared across
/// all books of a session, passed into each operation by the caller.

use std::collections::BTreeMap;

use crate::order_index::OrderIndex;
use crate::pool::{Order, OrderPool};
use crate::price_level::PriceLevel;
use crate::types::{OrderId, Price, Quantity, Side, StockLocate, Timestamp};

/// Best bid and offer. The ask side uses max-price / zero-quantity as
/// its absent sentinel so spread arithmetic is always defined; a side
/// is present iff its quantity is non-zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bbo {
    pub bid_price: Price,
    pub ask_price: Price,
    pub bid_quantity: Quantity,
    pub ask_quantity: Quantity,
}

impl Default for Bbo {
    fn default() -> Self {
        Bbo {
            bid_price: 0,
            ask_price: Price::MAX,
            bid_quantity: 0,
            ask_quantity: 0,
        }
    }
}

impl Bbo {
    #[inline]
    pub fn has_bid(&self) -> bool {
        self.bid_quantity > 0
    }

    #[inline]
    pub fn has_ask(&self) -> bool {
        self.ask_quantity > 0
    }

    #[inline]
    pub fn spread(&self) -> Price {
        if !self.has_bid() || !self.has_ask() {
            return 0;
        }
        self.ask_price - self.bid_price
    }

    #[inline]
    pub fn midpoint(&self) -> Price {
        if !self.has_bid() || !self.has_ask() {
            return 0;
        }
        (self.bid_price + self.ask_price) / 2
    }
}

/// One aggregated level of a depth snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DepthLevel {
    pub price: Price,
    pub quantity: Quantity,
    pub order_count: usize,
}

pub struct OrderBook {
    stock_locate: StockLocate,
    bids: BTreeMap<Price, PriceLevel>,
    asks: BTreeMap<Price, PriceLevel>,
    orders: OrderIndex,
    bbo: Bbo,
    order_count: usize,
}

impl OrderBook {
    pub fn new(stock_locate: StockLocate) -> Self {
        OrderBook {
            stock_locate,
            bids: BTreeMap::new(),
            asks: BTreeMap::new(),
            orders: OrderIndex::new(),
            bbo: Bbo::default(),
            order_count: 0,
        }
    }

    /// Enter a new resting order. Returns the pool slot, or `None`
    /// when the id is already resident (the message is dropped; real
    /// feeds replay adds during recovery).
    pub fn add_order(
        &mut self,
        pool: &mut OrderPool,
        order_id: OrderId,
        side: Side,
        price: Price,
        quantity: Quantity,
        timestamp: Timestamp,
    ) -> Option<u32> {
        if self.orders.contains(order_id) {
            return None;
        }

        let slot = pool.acquire();
        {
            let order = pool.get_mut(slot);
            order.order_id = order_id;
            order.price = price;
            order.quantity = quantity;
            order.original_qty = quantity;
            order.stock_locate = self.stock_locate;
            order.side = side;
            order.timestamp = timestamp;
        }

        if !self.orders.insert(order_id, slot) {
            // Only reachable for id 0, which the index reserves.
            pool.release(slot);
            return None;
        }

        match side {
            Side::Buy => {
                self.bids
                    .entry(price)
                    .or_insert_with(|| PriceLevel::new(price))
                    .push_back(pool, slot);
                self.update_best_bid();
            }
            Side::Sell => {
                self.asks
                    .entry(price)
                    .or_insert_with(|| PriceLevel::new(price))
                    .push_back(pool, slot);
                self.update_best_ask();
            }
        }

        self.order_count += 1;
        Some(slot)
    }

    /// Execute up to `shares` against a resting order; returns the
    /// quantity actually consumed (0 for an unknown id). Removes the
    /// order, its level, and its index entry once fully filled.
    pub fn execute_order(
        &mut self,
        pool: &mut OrderPool,
        order_id: OrderId,
        shares: Quantity,
    ) -> Quantity {
        let Some(slot) = self.orders.get(order_id) else {
            return 0;
        };

        let (side, price, resting) = {
            let order = pool.get(slot);
            (order.side, order.price, order.quantity)
        };
        let executed = shares.min(resting);

        match side {
            Side::Buy => {
                if let Some(level) = self.bids.get_mut(&price) {
                    level.reduce(pool, slot, executed);
                    if level.is_empty() {
                        self.bids.remove(&price);
                    }
                }
                self.update_best_bid();
            }
            Side::Sell => {
                if let Some(level) = self.asks.get_mut(&price) {
                    level.reduce(pool, slot, executed);
                    if level.is_empty() {
                        self.asks.remove(&price);
                    }
                }
                self.update_best_ask();
            }
        }

        if pool.get(slot).quantity == 0 {
            self.orders.remove(order_id);
            pool.release(slot);
            self.order_count -= 1;
        }

        executed
    }

    /// Cancel (reduce) shares. At book level this is an execution; the
    /// caller distinguishes the two by the event it emits.
    #[inline]
    pub fn cancel_order(
        &mut self,
        pool: &mut OrderPool,
        order_id: OrderId,
        shares: Quantity,
    ) -> Quantity {
        self.execute_order(pool, order_id, shares)
    }

    /// Remove an order in full regardless of its remaining quantity.
    pub fn delete_order(&mut self, pool: &mut OrderPool, order_id: OrderId) -> bool {
        let Some(slot) = self.orders.get(order_id) else {
            return false;
        };

        let (side, price) = {
            let order = pool.get(slot);
            (order.side, order.price)
        };

        match side {
            Side::Buy => {
                if let Some(level) = self.bids.get_mut(&price) {
                    level.unlink(pool, slot);
                    if level.is_empty() {
                        self.bids.remove(&price);
                    }
                }
                self.update_best_bid();
            }
            Side::Sell => {
                if let Some(level) = self.asks.get_mut(&price) {
                    level.unlink(pool, slot);
                    if level.is_empty() {
                        self.asks.remove(&price);
                    }
                }
                self.update_best_ask();
            }
        }

        self.orders.remove(order_id);
        pool.release(slot);
        self.order_count -= 1;
        true
    }

    /// Retire `old_order_id` and enter a fresh order on the same side.
    /// Fails without touching the book when the old id is unknown or
    /// the new id is already resident.
    pub fn replace_order(
        &mut self,
        pool: &mut OrderPool,
        old_order_id: OrderId,
        new_order_id: OrderId,
        new_quantity: Quantity,
        new_price: Price,
        timestamp: Timestamp,
    ) -> Option<u32> {
        let slot = self.orders.get(old_order_id)?;
        if self.orders.contains(new_order_id) {
            return None;
        }
        let side = pool.get(slot).side;

        self.delete_order(pool, old_order_id);
        self.add_order(pool, new_order_id, side, new_price, new_quantity, timestamp)
    }

    /// Pool slot of a resident order, if any.
    #[inline]
    pub fn find(&self, order_id: OrderId) -> Option<u32> {
        self.orders.get(order_id)
    }

    /// Resident order record, if any.
    #[inline]
    pub fn order<'p>(&self, pool: &'p OrderPool, order_id: OrderId) -> Option<&'p Order> {
        self.orders.get(order_id).map(|slot| pool.get(slot))
    }

    #[inline]
    pub fn bbo(&self) -> Bbo {
        self.bbo
    }

    pub fn bid_depth(&self, max_levels: usize) -> Vec<DepthLevel> {
        self.bids
            .values()
            .rev()
            .take(max_levels)
            .map(|level| DepthLevel {
                price: level.price(),
                quantity: level.total_quantity(),
                order_count: level.order_count(),
            })
            .collect()
    }

    pub fn ask_depth(&self, max_levels: usize) -> Vec<DepthLevel> {
        self.asks
            .values()
            .take(max_levels)
            .map(|level| DepthLevel {
                price: level.price(),
                quantity: level.total_quantity(),
                order_count: level.order_count(),
            })
            .collect()
    }

    pub fn order_count(&self) -> usize {
        self.order_count
    }

    pub fn indexed_order_count(&self) -> usize {
        self.orders.len()
    }

    pub fn bid_level_count(&self) -> usize {
        self.bids.len()
    }

    pub fn ask_level_count(&self) -> usize {
        self.asks.len()
    }

    pub fn stock_locate(&self) -> StockLocate {
        self.stock_locate
    }

    /// Release every resident order back to the pool and empty the
    /// book. The BBO returns to its absent sentinels.
    pub fn clear(&mut self, pool: &mut OrderPool) {
        for level in self.bids.values().chain(self.asks.values()) {
            let mut cursor = level.front();
            while let Some(slot) = cursor {
                let next = pool.get(slot).next;
                pool.release(slot);
                cursor = (next != crate::pool::NIL).then_some(next);
            }
        }
        self.bids.clear();
        self.asks.clear();
        self.orders.clear();
        self.bbo = Bbo::default();
        self.order_count = 0;
    }

    fn update_best_bid(&mut self) {
        match self.bids.last_key_value() {
            Some((_, level)) => {
                self.bbo.bid_price = level.price();
                self.bbo.bid_quantity = level.total_quantity();
            }
            None => {
                self.bbo.bid_price = 0;
                self.bbo.bid_quantity = 0;
            }
        }
    }

    fn update_best_ask(&mut self) {
        match self.asks.first_key_value() {
            Some((_, level)) => {
                self.bbo.ask_price = level.price();
                self.bbo.ask_quantity = level.total_quantity();
            }
            None => {
                self.bbo.ask_price = Price::MAX;
                self.bbo.ask_quantity = 0;
            }
        }
    }
}

/// All books of a session, keyed densely by stock locate, sharing one
/// order pool so slots freed by one symbol are reusable by any other.
/// The table pre-sizes `MAX_SYMBOLS` slots and, like the symbol
/// directory, grows to the highest locate observed; a locate is valid
/// wire data whatever its value, never a fault.
pub struct BookManager {
    books: Vec<Option<Box<OrderBook>>>,
    pool: OrderPool,
}

impl BookManager {
    /// Book slots allocated up front; locates beyond this extend the
    /// table on first reference.
    pub const MAX_SYMBOLS: usize = 8192;

    pub fn new() -> Self {
        let mut books = Vec::with_capacity(Self::MAX_SYMBOLS);
        books.resize_with(Self::MAX_SYMBOLS, || None);
        BookManager {
            books,
            pool: OrderPool::new(),
        }
    }

    /// The book for a locate plus the shared pool, materializing the
    /// book on first reference. Split borrow so callers can mutate the
    /// book and allocate from the pool in one operation.
    #[inline]
    pub fn book_and_pool(&mut self, locate: StockLocate) -> (&mut OrderBook, &mut OrderPool) {
        let idx = locate as usize;
        if idx >= self.books.len() {
            self.books.resize_with(idx + 1, || None);
        }
        let book = self.books[idx].get_or_insert_with(|| Box::new(OrderBook::new(locate)));
        (book, &mut self.pool)
    }

    #[inline]
    pub fn book(&self, locate: StockLocate) -> Option<&OrderBook> {
        self.books
            .get(locate as usize)
            .and_then(|b| b.as_deref())
    }

    pub fn has_book(&self, locate: StockLocate) -> bool {
        self.book(locate).is_some()
    }

    pub fn pool(&self) -> &OrderPool {
        &self.pool
    }

    pub fn pool_mut(&mut self) -> &mut OrderPool {
        &mut self.pool
    }

    pub fn total_order_count(&self) -> usize {
        self.books
            .iter()
            .filter_map(|b| b.as_deref())
            .map(|b| b.order_count())
            .sum()
    }

    /// Clear every materialized book in place.
    pub fn clear(&mut self) {
        for book in self.books.iter_mut().filter_map(|b| b.as_deref_mut()) {
            book.clear(&mut self.pool);
        }
    }
}

impl Default for BookManager {
    fn default() -> Self {
        Self::new()
    }
}
