/// Zero-copy ITCH 5.0 decoder.
///
/// The decoder peeks the type byte, looks up the fixed message size,
/// bounds-checks once, and hands the handler a borrowed typed view over
/// the original buffer; no message bytes are copied and nothing is
/// allocated on the per-message path. Dispatch is a dense match on the
/// type byte into a generic handler, so every call site is monomorphic.

use thiserror::Error;

use crate::protocol::{
    message_size, AddOrder, AddOrderMpid, BrokenTrade, CrossTrade, IpoQuotingPeriod,
    LuldAuctionCollar, MarketParticipantPosition, MwcbDeclineLevel, MwcbStatus, Noii,
    OperationalHalt, OrderCancel, OrderDelete, OrderExecuted, OrderExecutedWithPrice,
    OrderReplace, RegShoRestriction, Rpii, StockDirectory, StockTradingAction, SystemEvent,
    Trade,
};
use crate::types::Timestamp;
use crate::wire;

/// MoldUDP64 downstream header: 10-byte session, u64 sequence number,
/// u16 message count.
pub const MOLD_HEADER_SIZE: usize = 20;
pub const MOLD_SEQUENCE_OFFSET: usize = 10;
pub const MOLD_COUNT_OFFSET: usize = 18;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeError {
    #[error("unknown message type byte {0:#04x}")]
    UnknownType(u8),

    #[error("message truncated: need {need} bytes, have {have}")]
    Truncated { need: usize, have: usize },

    #[error("malformed MoldUDP64 frame: {len} bytes is shorter than the header")]
    MalformedFrame { len: usize },
}

/// Decode statistics, maintained by the decoder itself rather than by
/// handlers. Per-type counts are indexed by the raw type byte.
#[derive(Clone)]
pub struct ParserStats {
    pub messages_parsed: u64,
    pub bytes_processed: u64,
    pub parse_errors: u64,
    pub message_type_counts: [u64; 256],
}

impl ParserStats {
    pub fn new() -> Self {
        ParserStats {
            messages_parsed: 0,
            bytes_processed: 0,
            parse_errors: 0,
            message_type_counts: [0; 256],
        }
    }

    pub fn count_for(&self, kind: u8) -> u64 {
        self.message_type_counts[kind as usize]
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }
}

impl Default for ParserStats {
    fn default() -> Self {
        Self::new()
    }
}

/// Per-message entry points, one per ITCH variant. All methods default
/// to no-ops so a handler implements only what it consumes. The
/// decoder is generic over the handler, keeping dispatch free of
/// virtual calls.
#[allow(unused_variables)]
pub trait MessageHandler {
    // System / administrative
    fn on_system_event(&mut self, msg: SystemEvent<'_>, ts: Timestamp) {}
    fn on_stock_directory(&mut self, msg: StockDirectory<'_>, ts: Timestamp) {}
    fn on_stock_trading_action(&mut self, msg: StockTradingAction<'_>, ts: Timestamp) {}
    fn on_reg_sho_restriction(&mut self, msg: RegShoRestriction<'_>, ts: Timestamp) {}
    fn on_market_participant_position(&mut self, msg: MarketParticipantPosition<'_>, ts: Timestamp) {}
    fn on_mwcb_decline_level(&mut self, msg: MwcbDeclineLevel<'_>, ts: Timestamp) {}
    fn on_mwcb_status(&mut self, msg: MwcbStatus<'_>, ts: Timestamp) {}
    fn on_ipo_quoting_period(&mut self, msg: IpoQuotingPeriod<'_>, ts: Timestamp) {}
    fn on_luld_auction_collar(&mut self, msg: LuldAuctionCollar<'_>, ts: Timestamp) {}
    fn on_operational_halt(&mut self, msg: OperationalHalt<'_>, ts: Timestamp) {}

    // Order lifecycle
    fn on_add_order(&mut self, msg: AddOrder<'_>, ts: Timestamp) {}
    fn on_add_order_mpid(&mut self, msg: AddOrderMpid<'_>, ts: Timestamp) {}
    fn on_order_executed(&mut self, msg: OrderExecuted<'_>, ts: Timestamp) {}
    fn on_order_executed_with_price(&mut self, msg: OrderExecutedWithPrice<'_>, ts: Timestamp) {}
    fn on_order_cancel(&mut self, msg: OrderCancel<'_>, ts: Timestamp) {}
    fn on_order_delete(&mut self, msg: OrderDelete<'_>, ts: Timestamp) {}
    fn on_order_replace(&mut self, msg: OrderReplace<'_>, ts: Timestamp) {}

    // Trades
    fn on_trade(&mut self, msg: Trade<'_>, ts: Timestamp) {}
    fn on_cross_trade(&mut self, msg: CrossTrade<'_>, ts: Timestamp) {}
    fn on_broken_trade(&mut self, msg: BrokenTrade<'_>, ts: Timestamp) {}

    // Auctions
    fn on_noii(&mut self, msg: Noii<'_>, ts: Timestamp) {}
    fn on_rpii(&mut self, msg: Rpii<'_>, ts: Timestamp) {}

    fn on_parse_error(&mut self, data: &[u8], error: DecodeError) {}
}

pub struct Parser {
    stats: ParserStats,
}

impl Parser {
    pub fn new() -> Self {
        Parser {
            stats: ParserStats::new(),
        }
    }

    /// Decode one message from the front of `data`. Returns the bytes
    /// consumed: the message size on success, 1 for an unknown type
    /// byte (consumed so the caller can resync), and 0 when the buffer
    /// does not hold a complete message yet.
    #[inline]
    pub fn parse_message<H: MessageHandler>(&mut self, data: &[u8], handler: &mut H) -> usize {
        if data.is_empty() {
            return 0;
        }

        let kind = data[0];
        let size = message_size(kind);
        if size == 0 {
            self.stats.parse_errors += 1;
            handler.on_parse_error(data, DecodeError::UnknownType(kind));
            return 1;
        }
        if data.len() < size {
            return 0;
        }

        let ts = wire::be48(&data[5..11]);
        self.dispatch(kind, &data[..size], ts, handler);

        self.stats.messages_parsed += 1;
        self.stats.bytes_processed += size as u64;
        self.stats.message_type_counts[kind as usize] += 1;
        size
    }

    /// Decode back-to-back messages from offset 0 until the buffer is
    /// exhausted or a truncated tail remains. Returns bytes consumed.
    pub fn parse<H: MessageHandler>(&mut self, data: &[u8], handler: &mut H) -> usize {
        let mut offset = 0;
        while offset < data.len() {
            let consumed = self.parse_message(&data[offset..], handler);
            if consumed == 0 {
                break;
            }
            offset += consumed;
        }
        offset
    }

    /// Decode one MoldUDP64 downstream packet: a 20-byte header, then
    /// up to `count` length-prefixed messages. Returns the number of
    /// messages decoded; truncation stops the walk without error.
    pub fn parse_moldudp64<H: MessageHandler>(&mut self, data: &[u8], handler: &mut H) -> usize {
        if data.len() < MOLD_HEADER_SIZE {
            handler.on_parse_error(data, DecodeError::MalformedFrame { len: data.len() });
            return 0;
        }

        let count = wire::be16(&data[MOLD_COUNT_OFFSET..MOLD_COUNT_OFFSET + 2]);
        let mut offset = MOLD_HEADER_SIZE;
        let mut decoded = 0;

        for _ in 0..count {
            if offset + 2 > data.len() {
                break;
            }
            let body_len = wire::be16(&data[offset..offset + 2]) as usize;
            offset += 2;
            if offset + body_len > data.len() {
                handler.on_parse_error(
                    &data[offset..],
                    DecodeError::Truncated {
                        need: body_len,
                        have: data.len() - offset,
                    },
                );
                break;
            }
            if self.parse_message(&data[offset..offset + body_len], handler) > 0 {
                decoded += 1;
            }
            offset += body_len;
        }
        decoded
    }

    pub fn stats(&self) -> &ParserStats {
        &self.stats
    }

    pub fn reset_stats(&mut self) {
        self.stats.reset();
    }

    #[inline]
    fn dispatch<H: MessageHandler>(
        &mut self,
        kind: u8,
        data: &[u8],
        ts: Timestamp,
        handler: &mut H,
    ) {
        match kind {
            b'A' => handler.on_add_order(AddOrder::new(data), ts),
            b'F' => handler.on_add_order_mpid(AddOrderMpid::new(data), ts),
            b'E' => handler.on_order_executed(OrderExecuted::new(data), ts),
            b'C' => handler.on_order_executed_with_price(OrderExecutedWithPrice::new(data), ts),
            b'X' => handler.on_order_cancel(OrderCancel::new(data), ts),
            b'D' => handler.on_order_delete(OrderDelete::new(data), ts),
            b'U' => handler.on_order_replace(OrderReplace::new(data), ts),
            b'P' => handler.on_trade(Trade::new(data), ts),
            b'Q' => handler.on_cross_trade(CrossTrade::new(data), ts),
            b'B' => handler.on_broken_trade(BrokenTrade::new(data), ts),
            b'S' => handler.on_system_event(SystemEvent::new(data), ts),
            b'R' => handler.on_stock_directory(StockDirectory::new(data), ts),
            b'H' => handler.on_stock_trading_action(StockTradingAction::new(data), ts),
            b'Y' => handler.on_reg_sho_restriction(RegShoRestriction::new(data), ts),
            b'L' => handler.on_market_participant_position(MarketParticipantPosition::new(data), ts),
            b'V' => handler.on_mwcb_decline_level(MwcbDeclineLevel::new(data), ts),
            b'W' => handler.on_mwcb_status(MwcbStatus::new(data), ts),
            b'K' => handler.on_ipo_quoting_period(IpoQuotingPeriod::new(data), ts),
            b'J' => handler.on_luld_auction_collar(LuldAuctionCollar::new(data), ts),
            b'h' => handler.on_operational_halt(OperationalHalt::new(data), ts),
            b'I' => handler.on_noii(Noii::new(data), ts),
            b'N' => handler.on_rpii(Rpii::new(data), ts),
            _ => unreachable!("size table admits only known types"),
        }
    }
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::{put_be16, put_be48, put_be64};

    #[derive(Default)]
    struct CountingHandler {
        adds: usize,
        deletes: usize,
        system_events: usize,
        errors: Vec<DecodeError>,
        last_ts: Timestamp,
        last_order_ref: u64,
    }

    impl MessageHandler for CountingHandler {
        fn on_add_order(&mut self, msg: AddOrder<'_>, ts: Timestamp) {
            self.adds += 1;
            self.last_ts = ts;
            self.last_order_ref = msg.order_ref();
        }

        fn on_order_delete(&mut self, _msg: OrderDelete<'_>, _ts: Timestamp) {
            self.deletes += 1;
        }

        fn on_system_event(&mut self, _msg: SystemEvent<'_>, _ts: Timestamp) {
            self.system_events += 1;
        }

        fn on_parse_error(&mut self, _data: &[u8], error: DecodeError) {
            self.errors.push(error);
        }
    }

    fn add_order_bytes(order_ref: u64, ts: Timestamp) -> Vec<u8> {
        let mut buf = vec![0u8; AddOrder::SIZE];
        buf[0] = b'A';
        put_be16(&mut buf[1..3], 1);
        put_be48(&mut buf[5..11], ts);
        put_be64(&mut buf[11..19], order_ref);
        buf[19] = b'B';
        buf
    }

    #[test]
    fn test_decode_single_message() {
        let mut parser = Parser::new();
        let mut handler = CountingHandler::default();
        let msg = add_order_bytes(42, 12345);

        let consumed = parser.parse_message(&msg, &mut handler);
        assert_eq!(consumed, AddOrder::SIZE);
        assert_eq!(handler.adds, 1);
        assert_eq!(handler.last_order_ref, 42);
        assert_eq!(handler.last_ts, 12345);
        assert_eq!(parser.stats().messages_parsed, 1);
        assert_eq!(parser.stats().bytes_processed, AddOrder::SIZE as u64);
        assert_eq!(parser.stats().count_for(b'A'), 1);
    }

    #[test]
    fn test_incomplete_returns_zero() {
        let mut parser = Parser::new();
        let mut handler = CountingHandler::default();
        let msg = add_order_bytes(1, 0);

        assert_eq!(parser.parse_message(&msg[..10], &mut handler), 0);
        assert_eq!(handler.adds, 0);
        assert_eq!(parser.stats().messages_parsed, 0);
    }

    #[test]
    fn test_unknown_type_consumes_one_byte() {
        let mut parser = Parser::new();
        let mut handler = CountingHandler::default();
        let junk = [b'Z', 1, 2, 3];

        assert_eq!(parser.parse_message(&junk, &mut handler), 1);
        assert_eq!(parser.stats().parse_errors, 1);
        assert_eq!(handler.errors, vec![DecodeError::UnknownType(b'Z')]);
    }

    #[test]
    fn test_stream_decode_with_truncated_tail() {
        let mut parser = Parser::new();
        let mut handler = CountingHandler::default();

        let mut stream = Vec::new();
        stream.extend_from_slice(&add_order_bytes(1, 0));
        stream.extend_from_slice(&add_order_bytes(2, 0));
        stream.extend_from_slice(&add_order_bytes(3, 0)[..20]); // torn tail

        let consumed = parser.parse(&stream, &mut handler);
        assert_eq!(consumed, 2 * AddOrder::SIZE);
        assert_eq!(handler.adds, 2);
    }

    #[test]
    fn test_moldudp64_packet() {
        let mut parser = Parser::new();
        let mut handler = CountingHandler::default();

        let add = add_order_bytes(7, 100);
        let mut delete = vec![0u8; OrderDelete::SIZE];
        delete[0] = b'D';

        let mut packet = vec![0u8; MOLD_HEADER_SIZE];
        put_be64(&mut packet[MOLD_SEQUENCE_OFFSET..MOLD_SEQUENCE_OFFSET + 8], 1);
        put_be16(&mut packet[MOLD_COUNT_OFFSET..MOLD_COUNT_OFFSET + 2], 2);
        let mut len_prefix = [0u8; 2];
        put_be16(&mut len_prefix, add.len() as u16);
        packet.extend_from_slice(&len_prefix);
        packet.extend_from_slice(&add);
        put_be16(&mut len_prefix, delete.len() as u16);
        packet.extend_from_slice(&len_prefix);
        packet.extend_from_slice(&delete);
        packet.extend_from_slice(&[0xAA; 5]); // trailing noise is ignored

        assert_eq!(parser.parse_moldudp64(&packet, &mut handler), 2);
        assert_eq!(handler.adds, 1);
        assert_eq!(handler.deletes, 1);
    }

    #[test]
    fn test_moldudp64_short_packet() {
        let mut parser = Parser::new();
        let mut handler = CountingHandler::default();
        assert_eq!(parser.parse_moldudp64(&[0u8; 12], &mut handler), 0);
        assert_eq!(handler.errors, vec![DecodeError::MalformedFrame { len: 12 }]);
    }

    #[test]
    fn test_moldudp64_truncated_body_stops_early() {
        let mut parser = Parser::new();
        let mut handler = CountingHandler::default();

        let add = add_order_bytes(1, 0);
        let mut packet = vec![0u8; MOLD_HEADER_SIZE];
        put_be16(&mut packet[MOLD_COUNT_OFFSET..MOLD_COUNT_OFFSET + 2], 2);
        let mut len_prefix = [0u8; 2];
        put_be16(&mut len_prefix, add.len() as u16);
        packet.extend_from_slice(&len_prefix);
        packet.extend_from_slice(&add);
        // Second block declares 36 bytes but delivers 4.
        put_be16(&mut len_prefix, 36);
        packet.extend_from_slice(&len_prefix);
        packet.extend_from_slice(&[0u8; 4]);

        assert_eq!(parser.parse_moldudp64(&packet, &mut handler), 1);
        assert_eq!(handler.adds, 1);
        assert!(matches!(
            handler.errors.as_slice(),
            [DecodeError::Truncated { need: 36, have: 4 }]
        ));
    }

    #[test]
    fn test_system_message_dispatch() {
        let mut parser = Parser::new();
        let mut handler = CountingHandler::default();

        let mut sys = vec![0u8; SystemEvent::SIZE];
        sys[0] = b'S';
        put_be48(&mut sys[5..11], 999);
        sys[11] = b'O';
        parser.parse_message(&sys, &mut handler);
        assert_eq!(handler.system_events, 1);
        assert_eq!(parser.stats().count_for(b'S'), 1);
    }
}
