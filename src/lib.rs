/// ITCH Feed - NASDAQ TotalView-ITCH 5.0 Processing Core
///
/// Latency-sensitive market data processing for the ITCH 5.0 feed:
/// - Zero-copy big-endian message decoding (22 variants)
/// - MoldUDP64 packet framing with sequence continuity tracking
/// - Per-symbol price-time priority order books with O(1) id lookup
/// - Best bid/offer caching and diff-based update events
/// - Pooled order records, allocation-free steady-state hot path
/// - Latency histograms and throughput accounting

pub mod book;
pub mod decoder;
pub mod directory;
pub mod feed;
pub mod gap;
pub mod metrics;
pub mod order_index;
pub mod pool;
pub mod price_level;
pub mod protocol;
pub mod types;
pub mod wire;

pub use book::{Bbo, BookManager, DepthLevel, OrderBook};
pub use decoder::{DecodeError, MessageHandler, Parser, ParserStats, MOLD_HEADER_SIZE};
pub use directory::{SymbolDirectory, SymbolInfo};
pub use feed::{BboUpdateEvent, FeedEvents, FeedHandler, NullEvents, TradeEvent};
pub use gap::SequenceTracker;
pub use metrics::{FeedMetrics, LatencyHistogram};
pub use order_index::OrderIndex;
pub use pool::{Order, OrderPool, BLOCK_SIZE, NIL};
pub use price_level::PriceLevel;
pub use protocol::{message_size, MessageType};
pub use types::{OrderId, Price, Quantity, Side, StockLocate, Symbol, Timestamp, PRICE_SCALE};
