/// NASDAQ TotalView-ITCH 5.0 message layouts.
///
/// Every message is a fixed-size, byte-packed, big-endian record with a
/// 1-byte type tag at offset 0 and a common header of stock locate,
/// tracking number, and a 48-bit timestamp at offsets 1..11. Rather
/// than reinterpreting the buffer as packed structs, each message is a
/// borrowed view over the original bytes with per-field accessors that
/// decode by offset; this keeps the decode zero-copy without
/// unaligned-access hazards.

use crate::types::{OrderId, Price, Quantity, Side, StockLocate, Symbol, Timestamp};
use crate::wire;

/// The 22 message variants of ITCH 5.0, tagged by their wire byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum MessageType {
    // System / administrative
    SystemEvent = b'S',
    StockDirectory = b'R',
    StockTradingAction = b'H',
    RegShoRestriction = b'Y',
    MarketParticipantPosition = b'L',
    MwcbDeclineLevel = b'V',
    MwcbStatus = b'W',
    IpoQuotingPeriod = b'K',
    LuldAuctionCollar = b'J',
    OperationalHalt = b'h',
    // Order lifecycle
    AddOrder = b'A',
    AddOrderMpid = b'F',
    OrderExecuted = b'E',
    OrderExecutedWithPrice = b'C',
    OrderCancel = b'X',
    OrderDelete = b'D',
    OrderReplace = b'U',
    // Trades
    Trade = b'P',
    CrossTrade = b'Q',
    BrokenTrade = b'B',
    // Auctions
    Noii = b'I',
    Rpii = b'N',
}

impl MessageType {
    pub fn from_u8(b: u8) -> Option<Self> {
        match b {
            b'S' => Some(Self::SystemEvent),
            b'R' => Some(Self::StockDirectory),
            b'H' => Some(Self::StockTradingAction),
            b'Y' => Some(Self::RegShoRestriction),
            b'L' => Some(Self::MarketParticipantPosition),
            b'V' => Some(Self::MwcbDeclineLevel),
            b'W' => Some(Self::MwcbStatus),
            b'K' => Some(Self::IpoQuotingPeriod),
            b'J' => Some(Self::LuldAuctionCollar),
            b'h' => Some(Self::OperationalHalt),
            b'A' => Some(Self::AddOrder),
            b'F' => Some(Self::AddOrderMpid),
            b'E' => Some(Self::OrderExecuted),
            b'C' => Some(Self::OrderExecutedWithPrice),
            b'X' => Some(Self::OrderCancel),
            b'D' => Some(Self::OrderDelete),
            b'U' => Some(Self::OrderReplace),
            b'P' => Some(Self::Trade),
            b'Q' => Some(Self::CrossTrade),
            b'B' => Some(Self::BrokenTrade),
            b'I' => Some(Self::Noii),
            b'N' => Some(Self::Rpii),
            _ => None,
        }
    }
}

/// On-wire size for a type byte; 0 for bytes outside the table.
#[inline]
pub const fn message_size(kind: u8) -> usize {
    match kind {
        b'S' => SystemEvent::SIZE,
        b'R' => StockDirectory::SIZE,
        b'H' => StockTradingAction::SIZE,
        b'Y' => RegShoRestriction::SIZE,
        b'L' => MarketParticipantPosition::SIZE,
        b'V' => MwcbDeclineLevel::SIZE,
        b'W' => MwcbStatus::SIZE,
        b'K' => IpoQuotingPeriod::SIZE,
        b'J' => LuldAuctionCollar::SIZE,
        b'h' => OperationalHalt::SIZE,
        b'A' => AddOrder::SIZE,
        b'F' => AddOrderMpid::SIZE,
        b'E' => OrderExecuted::SIZE,
        b'C' => OrderExecutedWithPrice::SIZE,
        b'X' => OrderCancel::SIZE,
        b'D' => OrderDelete::SIZE,
        b'U' => OrderReplace::SIZE,
        b'P' => Trade::SIZE,
        b'Q' => CrossTrade::SIZE,
        b'B' => BrokenTrade::SIZE,
        b'I' => Noii::SIZE,
        b'N' => Rpii::SIZE,
        _ => 0,
    }
}

/// Defines a borrowed message view with the common ITCH header
/// accessors. The decoder guarantees `data.len() >= SIZE` before
/// constructing a view, so field reads index without re-checking.
macro_rules! message_view {
    ($(#[$doc:meta])* $name:ident, $size:expr) => {
        $(#[$doc])*
        #[derive(Clone, Copy)]
        pub struct $name<'a> {
            data: &'a [u8],
        }

        impl<'a> $name<'a> {
            pub const SIZE: usize = $size;

            #[inline]
            pub(crate) fn new(data: &'a [u8]) -> Self {
                debug_assert!(data.len() >= Self::SIZE);
                Self { data }
            }

            #[inline]
            pub fn stock_locate(&self) -> StockLocate {
                wire::be16(&self.data[1..3])
            }

            #[inline]
            pub fn tracking_number(&self) -> u16 {
                wire::be16(&self.data[3..5])
            }

            /// Nanoseconds since midnight.
            #[inline]
            pub fn timestamp(&self) -> Timestamp {
                wire::be48(&self.data[5..11])
            }

            /// The raw message bytes.
            #[inline]
            pub fn raw(&self) -> &'a [u8] {
                self.data
            }
        }
    };
}

// ---------------------------------------------------------------------------
// System / administrative messages
// ---------------------------------------------------------------------------

message_view!(
    /// System Event ('S', 12 bytes). Session-wide state transitions.
    SystemEvent,
    12
);

impl<'a> SystemEvent<'a> {
    pub const EVENT_START_OF_MESSAGES: u8 = b'O';
    pub const EVENT_START_SYSTEM_HOURS: u8 = b'S';
    pub const EVENT_START_MARKET_HOURS: u8 = b'Q';
    pub const EVENT_END_MARKET_HOURS: u8 = b'M';
    pub const EVENT_END_SYSTEM_HOURS: u8 = b'E';
    pub const EVENT_END_OF_MESSAGES: u8 = b'C';

    #[inline]
    pub fn event_code(&self) -> u8 {
        self.data[11]
    }
}

message_view!(
    /// Stock Directory ('R', 39 bytes). One per listed security at the
    /// start of the session; binds a stock locate to its symbol.
    StockDirectory,
    39
);

impl<'a> StockDirectory<'a> {
    #[inline]
    pub fn stock(&self) -> Symbol {
        Symbol::from_slice(&self.data[11..19])
    }

    #[inline]
    pub fn market_category(&self) -> u8 {
        self.data[19]
    }

    #[inline]
    pub fn financial_status(&self) -> u8 {
        self.data[20]
    }

    #[inline]
    pub fn round_lot_size(&self) -> u32 {
        wire::be32(&self.data[21..25])
    }

    #[inline]
    pub fn round_lots_only(&self) -> u8 {
        self.data[25]
    }

    #[inline]
    pub fn issue_classification(&self) -> u8 {
        self.data[26]
    }

    #[inline]
    pub fn issue_subtype(&self) -> [u8; 2] {
        [self.data[27], self.data[28]]
    }

    #[inline]
    pub fn authenticity(&self) -> u8 {
        self.data[29]
    }

    #[inline]
    pub fn short_sale_threshold(&self) -> u8 {
        self.data[30]
    }

    #[inline]
    pub fn ipo_flag(&self) -> u8 {
        self.data[31]
    }

    #[inline]
    pub fn luld_reference_price_tier(&self) -> u8 {
        self.data[32]
    }

    #[inline]
    pub fn etp_flag(&self) -> u8 {
        self.data[33]
    }

    #[inline]
    pub fn etp_leverage_factor(&self) -> u32 {
        wire::be32(&self.data[34..38])
    }

    #[inline]
    pub fn inverse_indicator(&self) -> u8 {
        self.data[38]
    }
}

message_view!(
    /// Stock Trading Action ('H', 25 bytes).
    StockTradingAction,
    25
);

impl<'a> StockTradingAction<'a> {
    pub const STATE_HALTED: u8 = b'H';
    pub const STATE_PAUSED: u8 = b'P';
    pub const STATE_QUOTATION_ONLY: u8 = b'Q';
    pub const STATE_TRADING: u8 = b'T';

    #[inline]
    pub fn stock(&self) -> Symbol {
        Symbol::from_slice(&self.data[11..19])
    }

    #[inline]
    pub fn trading_state(&self) -> u8 {
        self.data[19]
    }

    #[inline]
    pub fn reason(&self) -> [u8; 4] {
        [self.data[21], self.data[22], self.data[23], self.data[24]]
    }
}

message_view!(
    /// Reg SHO Short Sale Price Test Restriction ('Y', 20 bytes).
    RegShoRestriction,
    20
);

impl<'a> RegShoRestriction<'a> {
    #[inline]
    pub fn stock(&self) -> Symbol {
        Symbol::from_slice(&self.data[11..19])
    }

    #[inline]
    pub fn reg_sho_action(&self) -> u8 {
        self.data[19]
    }
}

message_view!(
    /// Market Participant Position ('L', 26 bytes).
    MarketParticipantPosition,
    26
);

impl<'a> MarketParticipantPosition<'a> {
    #[inline]
    pub fn mpid(&self) -> [u8; 4] {
        [self.data[11], self.data[12], self.data[13], self.data[14]]
    }

    #[inline]
    pub fn stock(&self) -> Symbol {
        Symbol::from_slice(&self.data[15..23])
    }

    #[inline]
    pub fn primary_market_maker(&self) -> u8 {
        self.data[23]
    }

    #[inline]
    pub fn market_maker_mode(&self) -> u8 {
        self.data[24]
    }

    #[inline]
    pub fn market_participant_state(&self) -> u8 {
        self.data[25]
    }
}

message_view!(
    /// Market-Wide Circuit Breaker Decline Level ('V', 35 bytes).
    /// Levels carry 8 implied decimals, unlike ordinary prices.
    MwcbDeclineLevel,
    35
);

impl<'a> MwcbDeclineLevel<'a> {
    #[inline]
    pub fn level1(&self) -> u64 {
        wire::be64(&self.data[11..19])
    }

    #[inline]
    pub fn level2(&self) -> u64 {
        wire::be64(&self.data[19..27])
    }

    #[inline]
    pub fn level3(&self) -> u64 {
        wire::be64(&self.data[27..35])
    }
}

message_view!(
    /// Market-Wide Circuit Breaker Status ('W', 12 bytes).
    MwcbStatus,
    12
);

impl<'a> MwcbStatus<'a> {
    #[inline]
    pub fn breached_level(&self) -> u8 {
        self.data[11]
    }
}

message_view!(
    /// IPO Quoting Period Update ('K', 28 bytes).
    IpoQuotingPeriod,
    28
);

impl<'a> IpoQuotingPeriod<'a> {
    #[inline]
    pub fn stock(&self) -> Symbol {
        Symbol::from_slice(&self.data[11..19])
    }

    /// Seconds since midnight.
    #[inline]
    pub fn quotation_release_time(&self) -> u32 {
        wire::be32(&self.data[19..23])
    }

    #[inline]
    pub fn quotation_release_qualifier(&self) -> u8 {
        self.data[23]
    }

    #[inline]
    pub fn ipo_price(&self) -> Price {
        wire::be32(&self.data[24..28]) as Price
    }
}

message_view!(
    /// LULD Auction Collar ('J', 35 bytes).
    LuldAuctionCollar,
    35
);

impl<'a> LuldAuctionCollar<'a> {
    #[inline]
    pub fn stock(&self) -> Symbol {
        Symbol::from_slice(&self.data[11..19])
    }

    #[inline]
    pub fn reference_price(&self) -> Price {
        wire::be32(&self.data[19..23]) as Price
    }

    #[inline]
    pub fn upper_collar_price(&self) -> Price {
        wire::be32(&self.data[23..27]) as Price
    }

    #[inline]
    pub fn lower_collar_price(&self) -> Price {
        wire::be32(&self.data[27..31]) as Price
    }

    #[inline]
    pub fn collar_extension(&self) -> u32 {
        wire::be32(&self.data[31..35])
    }
}

message_view!(
    /// Operational Halt ('h', 21 bytes).
    OperationalHalt,
    21
);

impl<'a> OperationalHalt<'a> {
    #[inline]
    pub fn stock(&self) -> Symbol {
        Symbol::from_slice(&self.data[11..19])
    }

    #[inline]
    pub fn market_code(&self) -> u8 {
        self.data[19]
    }

    #[inline]
    pub fn halt_action(&self) -> u8 {
        self.data[20]
    }
}

// ---------------------------------------------------------------------------
// Order lifecycle messages
// ---------------------------------------------------------------------------

message_view!(
    /// Add Order, no MPID attribution ('A', 36 bytes). Enters a new
    /// displayed order into the book.
    AddOrder,
    36
);

impl<'a> AddOrder<'a> {
    #[inline]
    pub fn order_ref(&self) -> OrderId {
        wire::be64(&self.data[11..19])
    }

    #[inline]
    pub fn side(&self) -> Side {
        Side::from_wire(self.data[19])
    }

    #[inline]
    pub fn shares(&self) -> Quantity {
        wire::be32(&self.data[20..24])
    }

    #[inline]
    pub fn stock(&self) -> Symbol {
        Symbol::from_slice(&self.data[24..32])
    }

    #[inline]
    pub fn price(&self) -> Price {
        wire::be32(&self.data[32..36]) as Price
    }
}

message_view!(
    /// Add Order with MPID attribution ('F', 40 bytes). Identical to
    /// 'A' with a trailing 4-byte participant id.
    AddOrderMpid,
    40
);

impl<'a> AddOrderMpid<'a> {
    #[inline]
    pub fn order_ref(&self) -> OrderId {
        wire::be64(&self.data[11..19])
    }

    #[inline]
    pub fn side(&self) -> Side {
        Side::from_wire(self.data[19])
    }

    #[inline]
    pub fn shares(&self) -> Quantity {
        wire::be32(&self.data[20..24])
    }

    #[inline]
    pub fn stock(&self) -> Symbol {
        Symbol::from_slice(&self.data[24..32])
    }

    #[inline]
    pub fn price(&self) -> Price {
        wire::be32(&self.data[32..36]) as Price
    }

    #[inline]
    pub fn attribution(&self) -> [u8; 4] {
        [self.data[36], self.data[37], self.data[38], self.data[39]]
    }
}

message_view!(
    /// Order Executed ('E', 31 bytes). Execution at the resting price.
    OrderExecuted,
    31
);

impl<'a> OrderExecuted<'a> {
    #[inline]
    pub fn order_ref(&self) -> OrderId {
        wire::be64(&self.data[11..19])
    }

    #[inline]
    pub fn executed_shares(&self) -> Quantity {
        wire::be32(&self.data[19..23])
    }

    #[inline]
    pub fn match_number(&self) -> u64 {
        wire::be64(&self.data[23..31])
    }
}

message_view!(
    /// Order Executed With Price ('C', 36 bytes). Execution at a price
    /// different from the resting order's displayed price.
    OrderExecutedWithPrice,
    36
);

impl<'a> OrderExecutedWithPrice<'a> {
    #[inline]
    pub fn order_ref(&self) -> OrderId {
        wire::be64(&self.data[11..19])
    }

    #[inline]
    pub fn executed_shares(&self) -> Quantity {
        wire::be32(&self.data[19..23])
    }

    #[inline]
    pub fn match_number(&self) -> u64 {
        wire::be64(&self.data[23..31])
    }

    #[inline]
    pub fn printable(&self) -> u8 {
        self.data[31]
    }

    #[inline]
    pub fn execution_price(&self) -> Price {
        wire::be32(&self.data[32..36]) as Price
    }
}

message_view!(
    /// Order Cancel ('X', 23 bytes). Partial reduction.
    OrderCancel,
    23
);

impl<'a> OrderCancel<'a> {
    #[inline]
    pub fn order_ref(&self) -> OrderId {
        wire::be64(&self.data[11..19])
    }

    #[inline]
    pub fn cancelled_shares(&self) -> Quantity {
        wire::be32(&self.data[19..23])
    }
}

message_view!(
    /// Order Delete ('D', 19 bytes). Full removal.
    OrderDelete,
    19
);

impl<'a> OrderDelete<'a> {
    #[inline]
    pub fn order_ref(&self) -> OrderId {
        wire::be64(&self.data[11..19])
    }
}

message_view!(
    /// Order Replace ('U', 35 bytes). Atomically retires the original
    /// order and enters a new one on the same side.
    OrderReplace,
    35
);

impl<'a> OrderReplace<'a> {
    #[inline]
    pub fn original_order_ref(&self) -> OrderId {
        wire::be64(&self.data[11..19])
    }

    #[inline]
    pub fn new_order_ref(&self) -> OrderId {
        wire::be64(&self.data[19..27])
    }

    #[inline]
    pub fn shares(&self) -> Quantity {
        wire::be32(&self.data[27..31])
    }

    #[inline]
    pub fn price(&self) -> Price {
        wire::be32(&self.data[31..35]) as Price
    }
}

// ---------------------------------------------------------------------------
// Trade messages
// ---------------------------------------------------------------------------

message_view!(
    /// Trade, non-cross ('P', 44 bytes). A fill against non-displayed
    /// liquidity; carries no book mutation.
    Trade,
    44
);

impl<'a> Trade<'a> {
    #[inline]
    pub fn order_ref(&self) -> OrderId {
        wire::be64(&self.data[11..19])
    }

    #[inline]
    pub fn side(&self) -> Side {
        Side::from_wire(self.data[19])
    }

    #[inline]
    pub fn shares(&self) -> Quantity {
        wire::be32(&self.data[20..24])
    }

    #[inline]
    pub fn stock(&self) -> Symbol {
        Symbol::from_slice(&self.data[24..32])
    }

    #[inline]
    pub fn price(&self) -> Price {
        wire::be32(&self.data[32..36]) as Price
    }

    #[inline]
    pub fn match_number(&self) -> u64 {
        wire::be64(&self.data[36..44])
    }
}

message_view!(
    /// Cross Trade ('Q', 40 bytes). Carries no buy/sell indicator.
    CrossTrade,
    40
);

impl<'a> CrossTrade<'a> {
    #[inline]
    pub fn shares(&self) -> u64 {
        wire::be64(&self.data[11..19])
    }

    #[inline]
    pub fn stock(&self) -> Symbol {
        Symbol::from_slice(&self.data[19..27])
    }

    #[inline]
    pub fn cross_price(&self) -> Price {
        wire::be32(&self.data[27..31]) as Price
    }

    #[inline]
    pub fn match_number(&self) -> u64 {
        wire::be64(&self.data[31..39])
    }

    #[inline]
    pub fn cross_type(&self) -> u8 {
        self.data[39]
    }
}

message_view!(
    /// Broken Trade ('B', 19 bytes).
    BrokenTrade,
    19
);

impl<'a> BrokenTrade<'a> {
    #[inline]
    pub fn match_number(&self) -> u64 {
        wire::be64(&self.data[11..19])
    }
}

// ---------------------------------------------------------------------------
// Auction messages
// ---------------------------------------------------------------------------

message_view!(
    /// Net Order Imbalance Indicator ('I', 50 bytes).
    Noii,
    50
);

impl<'a> Noii<'a> {
    #[inline]
    pub fn paired_shares(&self) -> u64 {
        wire::be64(&self.data[11..19])
    }

    #[inline]
    pub fn imbalance_shares(&self) -> u64 {
        wire::be64(&self.data[19..27])
    }

    #[inline]
    pub fn imbalance_direction(&self) -> u8 {
        self.data[27]
    }

    #[inline]
    pub fn stock(&self) -> Symbol {
        Symbol::from_slice(&self.data[28..36])
    }

    #[inline]
    pub fn far_price(&self) -> Price {
        wire::be32(&self.data[36..40]) as Price
    }

    #[inline]
    pub fn near_price(&self) -> Price {
        wire::be32(&self.data[40..44]) as Price
    }

    #[inline]
    pub fn current_reference_price(&self) -> Price {
        wire::be32(&self.data[44..48]) as Price
    }

    #[inline]
    pub fn cross_type(&self) -> u8 {
        self.data[48]
    }

    #[inline]
    pub fn price_variation_indicator(&self) -> u8 {
        self.data[49]
    }
}

message_view!(
    /// Retail Price Improvement Indicator ('N', 20 bytes).
    Rpii,
    20
);

impl<'a> Rpii<'a> {
    #[inline]
    pub fn stock(&self) -> Symbol {
        Symbol::from_slice(&self.data[11..19])
    }

    #[inline]
    pub fn interest_flag(&self) -> u8 {
        self.data[19]
    }
}
