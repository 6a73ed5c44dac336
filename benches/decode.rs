/// Decode throughput and latency benchmarks.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use itch_feed::decoder::{MessageHandler, Parser, MOLD_HEADER_SIZE};
use itch_feed::wire::{put_be16, put_be32, put_be48, put_be64};

/// Handler that counts but performs no book work, isolating decode cost.
#[derive(Default)]
struct NullHandler {
    count: u64,
}

impl MessageHandler for NullHandler {
    fn on_add_order(&mut self, _msg: itch_feed::protocol::AddOrder<'_>, _ts: u64) {
        self.count += 1;
    }
}

fn add_order_bytes(id: u64, price: u32, ts: u64) -> Vec<u8> {
    let mut buf = vec![0u8; 36];
    buf[0] = b'A';
    put_be16(&mut buf[1..3], 1);
    put_be48(&mut buf[5..11], ts);
    put_be64(&mut buf[11..19], id);
    buf[19] = if id % 2 == 0 { b'B' } else { b'S' };
    put_be32(&mut buf[20..24], 100);
    buf[24..32].copy_from_slice(b"AAPL    ");
    put_be32(&mut buf[32..36], price);
    buf
}

fn message_stream(count: usize) -> Vec<u8> {
    let mut stream = Vec::with_capacity(count * 36);
    for i in 0..count {
        stream.extend_from_slice(&add_order_bytes(
            i as u64 + 1,
            1_500_000 + (i % 100) as u32,
            i as u64,
        ));
    }
    stream
}

fn bench_decode_throughput(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode_throughput");

    for msg_count in [1_000usize, 10_000, 100_000] {
        let stream = message_stream(msg_count);
        group.bench_with_input(
            BenchmarkId::from_parameter(msg_count),
            &msg_count,
            |b, _| {
                b.iter(|| {
                    let mut parser = Parser::new();
                    let mut handler = NullHandler::default();
                    parser.parse(black_box(&stream), &mut handler);
                    handler.count
                });
            },
        );
    }
    group.finish();
}

fn bench_decode_single_message(c: &mut Criterion) {
    let msg = add_order_bytes(42, 1_500_000, 1_000);
    let mut parser = Parser::new();
    let mut handler = NullHandler::default();

    c.bench_function("decode_single_add_order", |b| {
        b.iter(|| parser.parse_message(black_box(&msg), &mut handler))
    });
}

fn bench_decode_moldudp64(c: &mut Criterion) {
    // Typical downstream packet: a handful of messages per datagram.
    let bodies: Vec<Vec<u8>> = (0..8)
        .map(|i| add_order_bytes(i + 1, 1_500_000, i))
        .collect();
    let mut packet = vec![0u8; MOLD_HEADER_SIZE];
    put_be16(&mut packet[18..20], bodies.len() as u16);
    for body in &bodies {
        let mut len = [0u8; 2];
        put_be16(&mut len, body.len() as u16);
        packet.extend_from_slice(&len);
        packet.extend_from_slice(body);
    }

    let mut parser = Parser::new();
    let mut handler = NullHandler::default();
    c.bench_function("decode_moldudp64_packet", |b| {
        b.iter(|| parser.parse_moldudp64(black_box(&packet), &mut handler))
    });
}

criterion_group!(
    benches,
    bench_decode_throughput,
    bench_decode_single_message,
    bench_decode_moldudp64
);
criterion_main!(benches);
