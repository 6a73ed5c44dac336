/// ITCH 5.0 feed handler.
///
/// Binds the decoder's per-message entry points to book mutations and
/// derives the outbound events: symbol registrations, trades, and
/// best-bid/offer changes. The event sink is a type parameter with a
/// compile-time `ENABLED` flag, so running without a sink compiles the
/// BBO snapshot and diff out of the hot path entirely.

use std::fs::File;
use std::path::Path;
use std::time::Instant;

use memmap2::Mmap;
use rustc_hash::FxHashSet;
use tracing::debug;

use crate::book::{Bbo, BookManager, OrderBook};
use crate::decoder::{
    DecodeError, MessageHandler, Parser, ParserStats, MOLD_COUNT_OFFSET, MOLD_HEADER_SIZE,
    MOLD_SEQUENCE_OFFSET,
};
use crate::directory::SymbolDirectory;
use crate::gap::SequenceTracker;
use crate::metrics::FeedMetrics;
use crate::pool::OrderPool;
use crate::protocol::{
    AddOrder, AddOrderMpid, BrokenTrade, CrossTrade, IpoQuotingPeriod, LuldAuctionCollar,
    MarketParticipantPosition, MwcbDeclineLevel, MwcbStatus, Noii, OperationalHalt, OrderCancel,
    OrderDelete, OrderExecuted, OrderExecutedWithPrice, OrderReplace, RegShoRestriction, Rpii,
    StockDirectory, StockTradingAction, SystemEvent, Trade,
};
use crate::types::{OrderId, Price, Quantity, Side, StockLocate, Symbol, Timestamp};
use crate::wire;

/// A trade print: an execution against a resting order, or a fill the
/// feed publishes directly ('P'/'Q'). Cross trades carry no buy/sell
/// indicator on the wire, so `side` is absent for them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TradeEvent {
    pub stock_locate: StockLocate,
    pub price: Price,
    pub quantity: Quantity,
    pub order_ref: OrderId,
    pub match_number: u64,
    pub side: Option<Side>,
    pub timestamp: Timestamp,
}

/// Top-of-book change caused by a single message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BboUpdateEvent {
    pub stock_locate: StockLocate,
    pub old_bbo: Bbo,
    pub new_bbo: Bbo,
    pub timestamp: Timestamp,
}

/// Downstream event sink. `ENABLED` lets the dispatcher skip the BBO
/// snapshot when no sink is attached; `NullEvents` sets it to false.
#[allow(unused_variables)]
pub trait FeedEvents {
    const ENABLED: bool = true;

    fn on_trade(&mut self, event: &TradeEvent) {}
    fn on_bbo_update(&mut self, event: &BboUpdateEvent) {}
    fn on_symbol_added(&mut self, locate: StockLocate, symbol: Symbol) {}
}

/// The no-sink configuration.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullEvents;

impl FeedEvents for NullEvents {
    const ENABLED: bool = false;
}

/// Book state, directory, metrics, and the sink; receives decoded
/// messages from the parser.
struct FeedCore<E: FeedEvents> {
    books: BookManager,
    directory: SymbolDirectory,
    metrics: FeedMetrics,
    metrics_enabled: bool,
    filter: FxHashSet<StockLocate>,
    use_filter: bool,
    events: E,
}

impl<E: FeedEvents> FeedCore<E> {
    fn new(events: E) -> Self {
        FeedCore {
            books: BookManager::new(),
            directory: SymbolDirectory::new(),
            metrics: FeedMetrics::new(),
            metrics_enabled: false,
            filter: FxHashSet::default(),
            use_filter: false,
            events,
        }
    }

    #[inline]
    fn admitted(&self, locate: StockLocate) -> bool {
        !self.use_filter || self.filter.contains(&locate)
    }

    #[inline]
    fn sample_start(&self) -> Option<Instant> {
        if self.metrics_enabled {
            Some(Instant::now())
        } else {
            None
        }
    }

    #[inline]
    fn sample_stop(&mut self, started: Option<Instant>) {
        if let Some(t0) = started {
            self.metrics
                .book_update_latency
                .record(t0.elapsed().as_nanos() as u64);
        }
    }

    /// Emit `BBOUpdate` if either side's price moved across the last
    /// mutation. `old_bbo` is `None` when no sink is attached.
    fn emit_bbo_diff(&mut self, locate: StockLocate, old_bbo: Option<Bbo>, ts: Timestamp) {
        let Some(old) = old_bbo else { return };
        let Some(book) = self.books.book(locate) else {
            return;
        };
        let new = book.bbo();
        if old.bid_price != new.bid_price || old.ask_price != new.ask_price {
            self.events.on_bbo_update(&BboUpdateEvent {
                stock_locate: locate,
                old_bbo: old,
                new_bbo: new,
                timestamp: ts,
            });
            if self.metrics_enabled {
                self.metrics.bbo_updates += 1;
            }
        }
    }

    fn apply_add(
        &mut self,
        locate: StockLocate,
        order_id: OrderId,
        side: Side,
        price: Price,
        shares: Quantity,
        ts: Timestamp,
    ) {
        let started = self.sample_start();
        let (book, pool) = self.books.book_and_pool(locate);
        let old_bbo = snapshot::<E>(book);

        book.add_order(pool, order_id, side, price, shares, ts);

        self.sample_stop(started);
        if self.metrics_enabled {
            self.metrics.orders_added += 1;
        }
        self.emit_bbo_diff(locate, old_bbo, ts);
    }

    /// Execution shared by 'E' and 'C'. The trade price differs (the
    /// resting price for 'E', the wire's execution price for 'C'), but
    /// the book is always reduced at the resting order's level.
    fn apply_execution(
        &mut self,
        locate: StockLocate,
        order_id: OrderId,
        shares: Quantity,
        match_number: u64,
        trade_price: Option<Price>,
        ts: Timestamp,
    ) {
        let started = self.sample_start();
        let (book, pool) = self.books.book_and_pool(locate);
        let old_bbo = snapshot::<E>(book);

        if let Some(slot) = book.find(order_id) {
            if E::ENABLED {
                let order = pool.get(slot);
                self.events.on_trade(&TradeEvent {
                    stock_locate: locate,
                    price: trade_price.unwrap_or(order.price),
                    quantity: shares,
                    order_ref: order_id,
                    match_number,
                    side: Some(order.side),
                    timestamp: ts,
                });
            }
            book.execute_order(pool, order_id, shares);
        }

        self.sample_stop(started);
        if self.metrics_enabled {
            self.metrics.orders_executed += 1;
            self.metrics.trades += 1;
        }
        self.emit_bbo_diff(locate, old_bbo, ts);
    }
}

/// BBO snapshot, taken only when a sink will consume the diff.
#[inline]
fn snapshot<E: FeedEvents>(book: &OrderBook) -> Option<Bbo> {
    if E::ENABLED {
        Some(book.bbo())
    } else {
        None
    }
}

impl<E: FeedEvents> MessageHandler for FeedCore<E> {
    fn on_system_event(&mut self, _msg: SystemEvent<'_>, _ts: Timestamp) {
        self.metrics.messages_processed += 1;
    }

    fn on_stock_directory(&mut self, msg: StockDirectory<'_>, _ts: Timestamp) {
        self.metrics.messages_processed += 1;
        let locate = msg.stock_locate();
        let symbol = msg.stock();
        self.directory
            .add(locate, symbol, msg.market_category(), msg.financial_status());
        debug!(locate, symbol = %symbol, "symbol registered");
        self.events.on_symbol_added(locate, symbol);
    }

    fn on_stock_trading_action(&mut self, _msg: StockTradingAction<'_>, _ts: Timestamp) {
        self.metrics.messages_processed += 1;
    }

    fn on_reg_sho_restriction(&mut self, _msg: RegShoRestriction<'_>, _ts: Timestamp) {
        self.metrics.messages_processed += 1;
    }

    fn on_market_participant_position(
        &mut self,
        _msg: MarketParticipantPosition<'_>,
        _ts: Timestamp,
    ) {
        self.metrics.messages_processed += 1;
    }

    fn on_mwcb_decline_level(&mut self, _msg: MwcbDeclineLevel<'_>, _ts: Timestamp) {
        self.metrics.messages_processed += 1;
    }

    fn on_mwcb_status(&mut self, _msg: MwcbStatus<'_>, _ts: Timestamp) {
        self.metrics.messages_processed += 1;
    }

    fn on_ipo_quoting_period(&mut self, _msg: IpoQuotingPeriod<'_>, _ts: Timestamp) {
        self.metrics.messages_processed += 1;
    }

    fn on_luld_auction_collar(&mut self, _msg: LuldAuctionCollar<'_>, _ts: Timestamp) {
        self.metrics.messages_processed += 1;
    }

    fn on_operational_halt(&mut self, _msg: OperationalHalt<'_>, _ts: Timestamp) {
        self.metrics.messages_processed += 1;
    }

    fn on_add_order(&mut self, msg: AddOrder<'_>, ts: Timestamp) {
        self.metrics.messages_processed += 1;
        let locate = msg.stock_locate();
        if !self.admitted(locate) {
            return;
        }
        self.apply_add(locate, msg.order_ref(), msg.side(), msg.price(), msg.shares(), ts);
    }

    fn on_add_order_mpid(&mut self, msg: AddOrderMpid<'_>, ts: Timestamp) {
        self.metrics.messages_processed += 1;
        let locate = msg.stock_locate();
        if !self.admitted(locate) {
            return;
        }
        self.apply_add(locate, msg.order_ref(), msg.side(), msg.price(), msg.shares(), ts);
    }

    fn on_order_executed(&mut self, msg: OrderExecuted<'_>, ts: Timestamp) {
        self.metrics.messages_processed += 1;
        let locate = msg.stock_locate();
        if !self.admitted(locate) {
            return;
        }
        self.apply_execution(
            locate,
            msg.order_ref(),
            msg.executed_shares(),
            msg.match_number(),
            None,
            ts,
        );
    }

    fn on_order_executed_with_price(&mut self, msg: OrderExecutedWithPrice<'_>, ts: Timestamp) {
        self.metrics.messages_processed += 1;
        let locate = msg.stock_locate();
        if !self.admitted(locate) {
            return;
        }
        self.apply_execution(
            locate,
            msg.order_ref(),
            msg.executed_shares(),
            msg.match_number(),
            Some(msg.execution_price()),
            ts,
        );
    }

    fn on_order_cancel(&mut self, msg: OrderCancel<'_>, ts: Timestamp) {
        self.metrics.messages_processed += 1;
        let locate = msg.stock_locate();
        if !self.admitted(locate) {
            return;
        }
        let started = self.sample_start();
        let (book, pool) = self.books.book_and_pool(locate);
        let old_bbo = snapshot::<E>(book);

        book.cancel_order(pool, msg.order_ref(), msg.cancelled_shares());

        self.sample_stop(started);
        if self.metrics_enabled {
            self.metrics.orders_cancelled += 1;
        }
        self.emit_bbo_diff(locate, old_bbo, ts);
    }

    fn on_order_delete(&mut self, msg: OrderDelete<'_>, ts: Timestamp) {
        self.metrics.messages_processed += 1;
        let locate = msg.stock_locate();
        if !self.admitted(locate) {
            return;
        }
        let started = self.sample_start();
        let (book, pool) = self.books.book_and_pool(locate);
        let old_bbo = snapshot::<E>(book);

        book.delete_order(pool, msg.order_ref());

        self.sample_stop(started);
        if self.metrics_enabled {
            self.metrics.orders_deleted += 1;
        }
        self.emit_bbo_diff(locate, old_bbo, ts);
    }

    fn on_order_replace(&mut self, msg: OrderReplace<'_>, ts: Timestamp) {
        self.metrics.messages_processed += 1;
        let locate = msg.stock_locate();
        if !self.admitted(locate) {
            return;
        }
        let started = self.sample_start();
        let (book, pool) = self.books.book_and_pool(locate);
        let old_bbo = snapshot::<E>(book);

        book.replace_order(
            pool,
            msg.original_order_ref(),
            msg.new_order_ref(),
            msg.shares(),
            msg.price(),
            ts,
        );

        self.sample_stop(started);
        if self.metrics_enabled {
            self.metrics.orders_replaced += 1;
        }
        self.emit_bbo_diff(locate, old_bbo, ts);
    }

    fn on_trade(&mut self, msg: Trade<'_>, ts: Timestamp) {
        self.metrics.messages_processed += 1;
        let locate = msg.stock_locate();
        if !self.admitted(locate) {
            return;
        }
        self.events.on_trade(&TradeEvent {
            stock_locate: locate,
            price: msg.price(),
            quantity: msg.shares(),
            order_ref: msg.order_ref(),
            match_number: msg.match_number(),
            side: Some(msg.side()),
            timestamp: ts,
        });
        if self.metrics_enabled {
            self.metrics.trades += 1;
        }
    }

    fn on_cross_trade(&mut self, msg: CrossTrade<'_>, ts: Timestamp) {
        self.metrics.messages_processed += 1;
        let locate = msg.stock_locate();
        if !self.admitted(locate) {
            return;
        }
        // The wire carries no buy/sell indicator for crosses.
        self.events.on_trade(&TradeEvent {
            stock_locate: locate,
            price: msg.cross_price(),
            quantity: msg.shares() as Quantity,
            order_ref: 0,
            match_number: msg.match_number(),
            side: None,
            timestamp: ts,
        });
        if self.metrics_enabled {
            self.metrics.trades += 1;
        }
    }

    fn on_broken_trade(&mut self, _msg: BrokenTrade<'_>, _ts: Timestamp) {
        self.metrics.messages_processed += 1;
    }

    fn on_noii(&mut self, _msg: Noii<'_>, _ts: Timestamp) {
        self.metrics.messages_processed += 1;
    }

    fn on_rpii(&mut self, _msg: Rpii<'_>, _ts: Timestamp) {
        self.metrics.messages_processed += 1;
    }

    fn on_parse_error(&mut self, _data: &[u8], _error: DecodeError) {}
}

/// Complete feed processor: decoder, per-symbol books, symbol
/// directory, sequence continuity, and metrics behind one byte-in /
/// event-out surface.
pub struct FeedHandler<E: FeedEvents = NullEvents> {
    parser: Parser,
    sequence: SequenceTracker,
    core: FeedCore<E>,
}

impl FeedHandler<NullEvents> {
    pub fn new() -> Self {
        Self::with_events(NullEvents)
    }
}

impl Default for FeedHandler<NullEvents> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: FeedEvents> FeedHandler<E> {
    pub fn with_events(events: E) -> Self {
        FeedHandler {
            parser: Parser::new(),
            sequence: SequenceTracker::new(),
            core: FeedCore::new(events),
        }
    }

    /// Process a slice of raw back-to-back ITCH messages. Returns
    /// bytes consumed; a truncated tail is left for the caller to
    /// complete and resubmit.
    pub fn process(&mut self, data: &[u8]) -> usize {
        self.parser.parse(data, &mut self.core)
    }

    /// Process one MoldUDP64 downstream packet. Returns the number of
    /// messages decoded out of it.
    pub fn process_moldudp64(&mut self, data: &[u8]) -> usize {
        if data.len() >= MOLD_HEADER_SIZE {
            let sequence =
                wire::be64(&data[MOLD_SEQUENCE_OFFSET..MOLD_SEQUENCE_OFFSET + 8]);
            let count = wire::be16(&data[MOLD_COUNT_OFFSET..MOLD_COUNT_OFFSET + 2]);
            self.sequence.observe(sequence, count);
        }
        self.parser.parse_moldudp64(data, &mut self.core)
    }

    /// Map a capture file read-only and replay it through `process`.
    pub fn process_file<P: AsRef<Path>>(&mut self, path: P) -> std::io::Result<usize> {
        let file = File::open(path.as_ref())?;
        // Safety: the mapping is read-only and lives only for this call.
        let mmap = unsafe { Mmap::map(&file)? };
        #[cfg(unix)]
        let _ = mmap.advise(memmap2::Advice::Sequential);
        debug!(path = %path.as_ref().display(), bytes = mmap.len(), "replaying mapped feed file");
        Ok(self.process(&mmap))
    }

    /// Pre-fault pool pages and materialize one book so the first
    /// messages of a session do not pay for page faults and cold maps.
    pub fn warmup(&mut self) {
        const WARM_ORDERS: usize = 10_000;
        {
            let pool = self.core.books.pool_mut();
            pool.warm();
            let held: Vec<u32> = (0..WARM_ORDERS).map(|_| pool.acquire()).collect();
            for slot in held {
                pool.get_mut(slot).price = 1;
                pool.release(slot);
            }
        }
        let _ = self.core.books.book_and_pool(1);
        debug!(pool_capacity = self.core.books.pool().capacity(), "warmup complete");
    }

    /// Restrict processing to a set of stock locates. An empty set
    /// admits everything.
    pub fn set_symbol_filter<I: IntoIterator<Item = StockLocate>>(&mut self, locates: I) {
        self.core.filter = locates.into_iter().collect();
        self.core.use_filter = !self.core.filter.is_empty();
    }

    pub fn clear_symbol_filter(&mut self) {
        self.core.filter.clear();
        self.core.use_filter = false;
    }

    /// Turn latency/operation accounting on or off. Enabling resets
    /// the previous run's numbers.
    pub fn enable_metrics(&mut self, enable: bool) {
        self.core.metrics_enabled = enable;
        if enable {
            self.core.metrics.reset();
            self.core.metrics.start_clock();
        }
    }

    pub fn book_manager(&self) -> &BookManager {
        &self.core.books
    }

    pub fn book_manager_mut(&mut self) -> &mut BookManager {
        &mut self.core.books
    }

    pub fn book(&self, locate: StockLocate) -> Option<&OrderBook> {
        self.core.books.book(locate)
    }

    pub fn pool(&self) -> &OrderPool {
        self.core.books.pool()
    }

    pub fn symbol_directory(&self) -> &SymbolDirectory {
        &self.core.directory
    }

    pub fn metrics(&self) -> &FeedMetrics {
        &self.core.metrics
    }

    pub fn parser_stats(&self) -> &ParserStats {
        self.parser.stats()
    }

    pub fn sequence_tracker(&self) -> &SequenceTracker {
        &self.sequence
    }

    pub fn events(&self) -> &E {
        &self.core.events
    }

    pub fn events_mut(&mut self) -> &mut E {
        &mut self.core.events
    }

    /// Drop all book state and accounting, keeping configuration
    /// (sink, filter, metrics switch).
    pub fn reset(&mut self) {
        self.core.books.clear();
        self.core.metrics.reset();
        self.parser.reset_stats();
        self.sequence.reset();
    }
}
